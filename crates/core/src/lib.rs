mod analyzer;
mod error;
mod model;
pub mod protocol;
mod results;
pub mod tabular;

pub use analyzer::{
    progress_percent, AnalyzerConfig, BatchAnalyzer, Classifier, ProgressSink, SinkClosed,
    DEFAULT_BATCH_SIZE,
};
pub use error::{AnalyzeError, ClassifierError, ProtocolError, Result, ResultsError};
pub use model::{Record, ResultSet, SentimentLabel};
pub use protocol::{AnalyzeRequest, ErrorBody, ProgressEvent, TextRequest, TextResponse};
pub use results::{Filter, LabelCounts, Page, ResultsStore, PAGE_SIZE};
pub use tabular::DEFAULT_DELIMITER;
