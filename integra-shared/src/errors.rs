//! Error types for the integration worker.

use std::any::Any;

use thiserror::Error;

use crate::messaging::MessagingError;

/// Crate-level error for handler and repository code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegraError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Messaging error: {0}")]
    Messaging(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Missing dependency: {0}")]
    MissingDependency(String),
    #[error("Unknown integration kind: {0}")]
    UnknownKind(String),
    #[error("Parameter {code} is not numeric: {value:?}")]
    NonNumericParameter { code: String, value: String },
    #[error("Operation {operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
    #[error("Handler panic: {0}")]
    Panic(String),
}

impl IntegraError {
    /// Missing-dependency error for the dispatcher precondition checks.
    pub fn missing_dependency(name: impl Into<String>) -> Self {
        Self::MissingDependency(name.into())
    }

    pub fn non_numeric_parameter(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NonNumericParameter {
            code: code.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for IntegraError {
    fn from(err: sqlx::Error) -> Self {
        IntegraError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for IntegraError {
    fn from(err: serde_json::Error) -> Self {
        IntegraError::Decode(err.to_string())
    }
}

impl From<MessagingError> for IntegraError {
    fn from(err: MessagingError) -> Self {
        IntegraError::Messaging(err.to_string())
    }
}

pub type IntegraResult<T> = Result<T, IntegraError>;

/// Renders the payload of a caught panic for logging and LogRecords.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = IntegraError::non_numeric_parameter("REMOVER_TRANSACAO_MINUTOS", "abc");
        let rendered = err.to_string();
        assert!(rendered.contains("REMOVER_TRANSACAO_MINUTOS"));
        assert!(rendered.contains("abc"));

        let err = IntegraError::Timeout {
            operation: "parameter.get_by_code".to_string(),
            seconds: 30,
        };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("static str panic");
        assert_eq!(panic_message(boxed.as_ref()), "static str panic");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned panic"));
        assert_eq!(panic_message(boxed.as_ref()), "owned panic");

        let boxed: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }

    #[test]
    fn sqlx_error_converts_to_database() {
        let err: IntegraError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, IntegraError::Database(_)));
    }
}
