// Distributed under the MIT software license

use thiserror::Error;

/// Vendor API error, tagged with the vendor it came from.
#[derive(Debug, Error)]
pub enum VendorError {
    /// The remote answered with a non-2xx status.
    #[error("{vendor} returned HTTP {status}: {body}")]
    Http {
        /// Vendor name (`github`, `gitlab`, `gitea`, `bitbucket`, `native-relay`).
        vendor: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Request could not be sent (DNS, TLS, connect, timeout).
    #[error("{vendor} transport error: {message}")]
    Transport {
        /// Vendor name.
        vendor: &'static str,
        /// Underlying transport error message.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("{vendor} returned unparseable response: {message}")]
    Decode {
        /// Vendor name.
        vendor: &'static str,
        /// Underlying deserialization error message.
        message: String,
    },
    /// The operation has no mapping on this vendor (e.g. REST `listIssues`
    /// against a native relay).
    #[error("{operation} is not supported by {vendor}")]
    NotSupported {
        /// Vendor name.
        vendor: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
    },
}
