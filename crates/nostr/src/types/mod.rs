// Distributed under the MIT software license

pub mod filter;
pub mod timestamp;

pub use self::filter::Filter;
pub use self::timestamp::{Clock, SystemClock, Timestamp};
