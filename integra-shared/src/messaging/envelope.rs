//! Message-shape negotiation for the input queue.
//!
//! Producers have emitted four physical shapes over the years and all of
//! them remain accepted:
//!
//! 1. JSON object with a `type_message` string field
//! 2. JSON object with a `tipoIntegracao` string field
//! 3. A JSON string literal naming the kind
//! 4. Raw text, optionally wrapped in a single pair of `'` or `"` quotes
//!    (compatibility shim for a historical producer)
//!
//! For the object shapes the payload is the `dados` sub-object when present,
//! otherwise the whole object; the literal shapes carry an empty payload.

use serde_json::{Map, Value};
use thiserror::Error;

/// Closed set of integration kinds the dispatcher routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Promotion,
    ProductImport,
    PromotionNormalization,
    MoveHousekeeping,
    Unknown(String),
}

impl MessageKind {
    /// Maps a kind label to its [`MessageKind`]. Case-sensitive; both the
    /// lowercase and CamelCase producer spellings are accepted.
    pub fn from_label(label: &str) -> Self {
        match label {
            "promocao" | "Promocao" => MessageKind::Promotion,
            "produto" | "Produto" => MessageKind::ProductImport,
            "promocao_normalizacao" | "PromocaoNormalizacao" => {
                MessageKind::PromotionNormalization
            }
            "mover" | "productNetworkMain" | "product_network_main" => {
                MessageKind::MoveHousekeeping
            }
            other => MessageKind::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MessageKind::Promotion => "promocao",
            MessageKind::ProductImport => "produto",
            MessageKind::PromotionNormalization => "promocao_normalizacao",
            MessageKind::MoveHousekeeping => "mover",
            MessageKind::Unknown(label) => label,
        }
    }
}

/// A decoded message: the kind plus whatever payload the producer attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub kind: MessageKind,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("message body is not valid UTF-8")]
    NotUtf8,
    #[error("JSON envelope has neither type_message nor tipoIntegracao")]
    MissingKind,
    #[error("unsupported JSON envelope shape: {0}")]
    UnsupportedShape(&'static str),
}

/// Decodes a raw delivery body into an [`Envelope`].
pub fn decode(body: &[u8]) -> Result<Envelope, DecodeError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => decode_object(object),
        Ok(Value::String(label)) => Ok(Envelope {
            kind: MessageKind::from_label(&label),
            payload: Map::new(),
        }),
        Ok(Value::Array(_)) => Err(DecodeError::UnsupportedShape("array")),
        Ok(Value::Number(_)) => Err(DecodeError::UnsupportedShape("number")),
        Ok(Value::Bool(_)) => Err(DecodeError::UnsupportedShape("boolean")),
        Ok(Value::Null) => Err(DecodeError::UnsupportedShape("null")),
        Err(_) => decode_raw_text(body),
    }
}

fn decode_object(object: Map<String, Value>) -> Result<Envelope, DecodeError> {
    let label = object
        .get("type_message")
        .or_else(|| object.get("tipoIntegracao"))
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?
        .to_string();

    let payload = match object.get("dados").cloned() {
        Some(Value::Object(dados)) => dados,
        _ => object,
    };

    Ok(Envelope {
        kind: MessageKind::from_label(&label),
        payload,
    })
}

fn decode_raw_text(body: &[u8]) -> Result<Envelope, DecodeError> {
    let text = std::str::from_utf8(body).map_err(|_| DecodeError::NotUtf8)?;
    let label = strip_surrounding_quotes(text.trim());
    Ok(Envelope {
        kind: MessageKind::from_label(label),
        payload: Map::new(),
    })
}

/// Strips exactly one pair of matching surrounding quotes, if present.
fn strip_surrounding_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
