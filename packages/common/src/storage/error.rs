use thiserror::Error;

/// Errors that can occur while talking to a blob store or its token endpoint.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested blob does not exist in the store.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The provider answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A credential could not be turned into an access token.
    #[error("credential rejected: {0}")]
    Credential(String),
}

impl StorageError {
    /// Build an `Upstream` error from a failed response, consuming its body as the message.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        if status == 404 {
            return Self::NotFound(message);
        }
        Self::Upstream { status, message }
    }
}
