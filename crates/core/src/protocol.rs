//! Messages exchanged over an analysis channel.
//!
//! One [`AnalyzeRequest`] flows client to server, then a sequence of
//! [`ProgressEvent`] flows back. Exactly one `Complete` or `Error` ends the
//! sequence. Both ends decode through the functions here so an unexpected
//! frame is always an error and never silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::model::{ResultSet, SentimentLabel};

const EVENT_TYPES: [&str; 4] = ["info", "progress", "complete", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "columnName", default)]
    pub column_name: String,
    #[serde(rename = "csvData", default)]
    pub csv_data: String,
}

impl AnalyzeRequest {
    pub fn new(column_name: impl Into<String>, csv_data: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            csv_data: csv_data.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.column_name.is_empty() || self.csv_data.is_empty() {
            return Err(ProtocolError::InvalidRequest(
                "'columnName' and 'csvData' are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let request: Self = serde_json::from_str(frame)
            .map_err(|err| ProtocolError::InvalidRequest(err.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Info { message: String },
    Progress { progress: u8 },
    Complete { data: ResultSet },
    Error { message: String },
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Info { .. } => "info",
            Self::Progress { .. } => "progress",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Progress { progress } if *progress > 100 => {
                Err(ProtocolError::ProgressOutOfRange(u64::from(*progress)))
            }
            _ => Ok(()),
        }
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|err| ProtocolError::Malformed(err.to_string()))?;
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::Malformed("missing \"type\" tag".to_string()))?;
        if !EVENT_TYPES.contains(&tag) {
            return Err(ProtocolError::UnknownType(tag.to_string()));
        }
        if let Some(raw) = value.get("progress").and_then(Value::as_u64) {
            if tag == "progress" && raw > 100 {
                return Err(ProtocolError::ProgressOutOfRange(raw));
            }
        }
        let event: Self =
            serde_json::from_value(value).map_err(|err| ProtocolError::Malformed(err.to_string()))?;
        event.validate()?;
        Ok(event)
    }

    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

/// Body of the stateless single-text request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
