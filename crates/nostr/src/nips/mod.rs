// Distributed under the MIT software license

//! NIPs this workspace implements.

pub mod nip01;
pub mod nip10;
pub mod nip22;
pub mod nip34;
