use thiserror::Error;

/// Failures that can occur while answering a batch of questions.
///
/// The HTTP layer decides which of these are the caller's fault and which
/// are ours; nothing here is retried.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The document URL was unreachable or answered with a non-2xx status.
    #[error("{0}")]
    DocumentFetch(String),

    #[error("document exceeds the {limit} byte limit")]
    DocumentTooLarge { limit: u64 },

    /// The document was downloaded but is not readable as text.
    #[error("document could not be decoded as text: {0}")]
    DocumentDecode(String),

    /// Operator misconfiguration, e.g. a missing provider API key.
    #[error("configuration error: {0}")]
    Config(String),

    /// The chat-completion provider answered with a non-2xx status.
    #[error("provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedCompletion(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn document_fetch(msg: impl Into<String>) -> Self {
        Self::DocumentFetch(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the failure happened while obtaining the document, i.e.
    /// before any question was sent to the provider.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Self::DocumentFetch(_) | Self::DocumentTooLarge { .. } | Self::DocumentDecode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
