use thiserror::Error;

/// Errors surfaced at the identity provider boundary.
#[derive(Error, Debug, Clone)]
pub enum IdentityError {
    /// The provider could not be reached, or a subscription could not be
    /// established.
    #[error("identity provider unavailable: {message}")]
    Unavailable {
        /// Transport-level detail
        message: String,
    },

    /// The provider rejected the request (bad credentials, duplicate
    /// registration, unconfirmed account). The message is the provider's
    /// own and is passed through untouched.
    #[error("{message}")]
    Rejected {
        /// Provider-supplied rejection message
        message: String,
    },
}

impl IdentityError {
    /// Create an unavailability error
    pub fn unavailable(message: impl Into<String>) -> Self {
        IdentityError::Unavailable {
            message: message.into(),
        }
    }

    /// Create a rejection error carrying the provider's message
    pub fn rejected(message: impl Into<String>) -> Self {
        IdentityError::Rejected {
            message: message.into(),
        }
    }
}

/// Errors returned by credential operations. These are plain result values:
/// a failed sign-in is an expected outcome the caller renders, never a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The provider rejected the credentials. Displays as the provider's
    /// message, verbatim.
    #[error("{message}")]
    Rejected {
        /// Provider-supplied rejection message
        message: String,
    },

    /// The provider could not be reached to complete the operation.
    #[error("identity provider unavailable: {message}")]
    Unavailable {
        /// Transport-level detail
        message: String,
    },
}

impl CredentialError {
    /// The human-readable message for this error
    pub fn message(&self) -> &str {
        match self {
            CredentialError::Rejected { message } => message,
            CredentialError::Unavailable { message } => message,
        }
    }
}

impl From<IdentityError> for CredentialError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected { message } => CredentialError::Rejected { message },
            IdentityError::Unavailable { message } => CredentialError::Unavailable { message },
        }
    }
}

/// Errors from the authenticated resource client.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The server answered with a non-success status code
    #[error("API request failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The request could not be sent or the response could not be read
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// The response body was not the expected JSON shape
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),
}
