// Distributed under the MIT software license

//! Shared request/response plumbing for the REST-backed adapters.
//!
//! Grounded on the teacher corpus's GitHub client (`rust-lang-triagebot`'s
//! `github::client::GithubClient::send_req`): build the request, execute
//! it, and turn a non-2xx status into a tagged error before attempting
//! to decode the body.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::VendorError;

/// Minimal REST client shared by the GitHub/GitLab/Gitea/Bitbucket adapters.
pub(crate) struct RestClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) vendor: &'static str,
}

impl RestClient {
    pub(crate) fn new(vendor: &'static str, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            vendor,
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!(vendor = self.vendor, %method, %url, "vendor request");
        self.client.request(method, url)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, VendorError> {
        let resp = req.send().await.map_err(|e| VendorError::Transport {
            vendor: self.vendor,
            message: e.to_string(),
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| VendorError::Transport {
            vendor: self.vendor,
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(VendorError::Http {
                vendor: self.vendor,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| VendorError::Decode {
            vendor: self.vendor,
            message: e.to_string(),
        })
    }

    pub(crate) async fn send_bytes(&self, req: RequestBuilder) -> Result<Vec<u8>, VendorError> {
        let resp = req.send().await.map_err(|e| VendorError::Transport {
            vendor: self.vendor,
            message: e.to_string(),
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| VendorError::Transport {
            vendor: self.vendor,
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(VendorError::Http {
                vendor: self.vendor,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}
