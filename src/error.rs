//! Error types returned by every layer of the client.

use serde_json::Value;

/// Errors from CAS API calls.
///
/// Every variant that originates from an HTTP response carries its status
/// and the raw JSON payload the server sent back.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The backend answered 401.
    #[error("not authenticated: {message}")]
    Authentication { message: String, body: Value },

    /// The backend answered 403.
    #[error("forbidden: {message}")]
    Forbidden { message: String, body: Value },

    /// The backend answered 404.
    #[error("not found: {message}")]
    NotFound { message: String, body: Value },

    /// Any other non-2xx status.
    #[error("API returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Value,
    },

    /// Transport failure before a response was received (DNS, connect, reset).
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The request could not be built (bad arguments, unserializable body).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A relation that is absent from the discovered API root.
    #[error("Link '{rel}' unavailable")]
    LinkUnavailable { rel: String },

    /// A relation that is absent from a specific resource.
    #[error("link '{rel}' not found in resource")]
    ResourceLinkMissing { rel: String },
}

impl ApiError {
    /// Build the typed error for a non-2xx response.
    ///
    /// `body` is the parsed error payload (an empty object when the server
    /// sent something that is not JSON). Its `message` field, when present,
    /// becomes the error message.
    pub fn from_status(status: u16, body: Value) -> Self {
        let server_message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        match status {
            401 => Self::Authentication {
                message: server_message.unwrap_or_else(|| "No autenticado".to_string()),
                body,
            },
            403 => Self::Forbidden {
                message: server_message.unwrap_or_else(|| "Sin permisos".to_string()),
                body,
            },
            404 => Self::NotFound {
                message: server_message.unwrap_or_else(|| "Recurso no encontrado".to_string()),
                body,
            },
            _ => Self::Status {
                status,
                message: server_message.unwrap_or_else(|| format!("Error {status}")),
                body,
            },
        }
    }

    /// HTTP status associated with the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw error payload returned by the server.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Authentication { body, .. }
            | Self::Forbidden { body, .. }
            | Self::NotFound { body, .. }
            | Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Network failures are the only errors worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Message suitable for a toast or inline error.
    ///
    /// Uses the server-provided message when there is one, otherwise a
    /// generic localized fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Status { message, .. } => message.clone(),
            Self::LinkUnavailable { rel } | Self::ResourceLinkMissing { rel } => {
                format!("Acción '{rel}' no disponible")
            }
            Self::Network { .. } | Self::Decode { .. } | Self::InvalidRequest { .. } => {
                "Error desconocido".to_string()
            }
        }
    }
}
