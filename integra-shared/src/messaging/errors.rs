//! Structured error types for the messaging layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Broker connection error: {message}")]
    Connection { message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Message serialization error: {message}")]
    Serialization { message: String },

    #[error("Message deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl MessagingError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn queue_creation(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "declare", message)
    }

    pub fn consume(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "consume", message)
    }

    pub fn publish(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "publish", message)
    }

    pub fn ack(queue_name: impl Into<String>, delivery_tag: u64, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, format!("ack(tag={delivery_tag})"), message)
    }

    pub fn nack(
        queue_name: impl Into<String>,
        delivery_tag: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::queue_operation(queue_name, format!("nack(tag={delivery_tag})"), message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            MessagingError::deserialization(err.to_string())
        } else {
            MessagingError::serialization(err.to_string())
        }
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_operation_display_includes_all_parts() {
        let err = MessagingError::publish("log", "channel closed");
        let display = err.to_string();
        assert!(display.contains("log"));
        assert!(display.contains("publish"));
        assert!(display.contains("channel closed"));
    }

    #[test]
    fn ack_and_nack_carry_delivery_tag() {
        let err = MessagingError::ack("integracaoCron", 42, "broken pipe");
        assert!(err.to_string().contains("ack(tag=42)"));

        let err = MessagingError::nack("integracaoCron", 42, "broken pipe");
        assert!(err.to_string().contains("nack(tag=42)"));
    }

    #[test]
    fn serde_syntax_error_converts_to_deserialization() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let converted: MessagingError = err.into();
        assert!(matches!(converted, MessagingError::Deserialization { .. }));
    }
}
