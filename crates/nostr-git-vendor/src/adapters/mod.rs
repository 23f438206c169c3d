// Distributed under the MIT software license

//! One [`crate::api::GitServiceApi`] implementation per vendor (§4.D, §6).

pub(crate) mod http;

mod bitbucket;
mod gitea;
mod github;
mod gitlab;
mod native_relay;

pub use bitbucket::BitbucketAdapter;
pub use gitea::GiteaAdapter;
pub use github::GitHubAdapter;
pub use gitlab::GitLabAdapter;
pub use native_relay::NativeRelayAdapter;
