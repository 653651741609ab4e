use std::string::FromUtf8Error;

use thiserror::Error;

use crate::results::Filter;

/// Failure inside a classifier backend.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classifier request failed: {0}")]
    Request(String),
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("unrecognized message type: {0}")]
    UnknownType(String),
    #[error("progress out of range: {0}")]
    ProgressOutOfRange(u64),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("error parsing CSV: missing header row")]
    MissingHeader,
    #[error("error parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("classifier returned {actual} labels for a batch of {expected}")]
    BatchMismatch { expected: usize, actual: usize },
    #[error("output channel closed")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("page {requested} out of range (1..={total})")]
    PageOutOfRange { requested: usize, total: usize },
    #[error("no {0} results to export")]
    EmptyExport(Filter),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export is not valid utf-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
