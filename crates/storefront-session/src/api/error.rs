use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - credentials rejected")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No valid session token - sign in again")]
    NoValidToken,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else if e.is_builder() {
            ApiError::InvalidRequest(e.to_string())
        } else {
            ApiError::NetworkError(e)
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            408 | 504 => ApiError::Timeout,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Message suitable for showing under a login or signup form
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid email or password".to_string(),
            ApiError::AccessDenied(_) => "This account is not allowed to sign in".to_string(),
            ApiError::Timeout => "Connection timed out. Please try again.".to_string(),
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::RateLimited => "Too many attempts. Please wait and try again.".to_string(),
            ApiError::NoValidToken => "Your session has expired. Please sign in again.".to_string(),
            other => format!("Request failed: {}", other),
        }
    }
}
