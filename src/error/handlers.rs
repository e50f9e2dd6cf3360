//! Shared handling of unsuccessful HTTP responses

use crate::error::RegistryError;
use crate::registry::transport::TransportResponse;

/// Turns rejected responses into errors that carry status and body
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Consume the response body for the error message.
    /// A body that cannot be read is reported in place of the text.
    pub async fn read_body(response: TransportResponse) -> (u16, String) {
        let status = response.status.as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read error response: {}>", e));
        (status, body)
    }

    pub async fn unexpected_status(response: TransportResponse) -> RegistryError {
        let (status, body) = Self::read_body(response).await;
        RegistryError::UnexpectedStatus { status, body }
    }

    /// Short human explanation of a registry status, used in log lines
    pub fn describe(status: u16) -> &'static str {
        match status {
            400 => "bad request, check digest format and data integrity",
            401 => "authentication required or token rejected",
            403 => "permission denied",
            404 => "repository, blob or upload session not found",
            405 => "operation not supported by this registry",
            409 => "conflict",
            413 => "payload too large",
            416 => "requested range not satisfiable",
            429 => "rate limited",
            500 => "registry server error",
            502 | 503 => "registry unavailable",
            507 => "registry out of storage",
            _ => "unexpected status",
        }
    }
}
