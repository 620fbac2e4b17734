use http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Not authenticated. Please login again.")]
    NotAuthenticated,

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("{0}")]
    Api(#[from] ApiFailure),

    #[error("{0}")]
    BadRequest(#[from] BadRequest),

    #[error("{0}")]
    NotFound(#[from] NotFound),

    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn bad_request(message: &str) -> Self {
        Error::BadRequest(BadRequest {
            message: message.to_string(),
        })
    }

    pub fn not_found(message: &str) -> Self {
        Error::NotFound(NotFound {
            message: message.to_string(),
        })
    }

    pub fn api(status: StatusCode, message: &str) -> Self {
        Error::Api(ApiFailure {
            status,
            message: message.to_string(),
        })
    }

    /// Credential failures are handled centrally and never alerted by callers.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::NotAuthenticated | Error::SessionExpired)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(ApiFailure { status, .. }) => Some(*status),
            Error::Request(e) => e.status(),
            Error::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Bad Request: {message}")]
pub struct BadRequest {
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Not found: {message}")]
pub struct NotFound {
    pub message: String,
}
