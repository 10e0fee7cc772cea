//! Standardized HTTP status descriptions shared by the registry and notifier

use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Describe a failed token request
    pub fn describe_auth_error(status: StatusCode, error_text: &str) -> String {
        match status.as_u16() {
            400 => "Invalid token request parameters".to_string(),
            401 => "Invalid credentials provided".to_string(),
            403 => "Access denied - insufficient permissions".to_string(),
            404 => "Authentication endpoint not found".to_string(),
            _ => format!("Token request failed (status {}): {}", status, error_text),
        }
    }

    /// Describe a failed registry read
    pub fn describe_registry_error(status: StatusCode, error_text: &str, operation: &str) -> String {
        match status.as_u16() {
            401 => format!("Unauthorized to perform {}: {}", operation, error_text),
            403 => format!("Forbidden: insufficient permissions for {}: {}", operation, error_text),
            404 => format!("Resource not found for {}: {}", operation, error_text),
            429 => format!("Rate limited during {}: {}", operation, error_text),
            500 => format!("Registry server error during {}: {}", operation, error_text),
            502 | 503 => format!("Registry unavailable during {}: {}", operation, error_text),
            _ => format!("{} failed (status {}): {}", operation, status, error_text),
        }
    }

    /// Short code for a transport-level failure, used in delivery logs
    pub fn transport_error_code(err: &reqwest::Error) -> &'static str {
        if err.is_timeout() {
            "TIMEOUT"
        } else if err.is_connect() {
            "ECONNREFUSED"
        } else if err.is_body() || err.is_decode() {
            "EBODY"
        } else {
            "EREQUEST"
        }
    }

    /// Notifications accept any 2xx or 3xx response
    pub fn is_delivered(status: StatusCode) -> bool {
        status.is_success() || status.is_redirection()
    }
}
