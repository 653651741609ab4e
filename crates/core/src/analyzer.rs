use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AnalyzeError, ClassifierError, Result};
use crate::model::{Record, ResultSet, SentimentLabel};
use crate::protocol::{AnalyzeRequest, ProgressEvent};
use crate::tabular::{self, DEFAULT_DELIMITER};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Batch sentiment capability. Returns exactly one label per input, in order.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        batch: &[String],
    ) -> std::result::Result<Vec<SentimentLabel>, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn classify(
        &self,
        batch: &[String],
    ) -> std::result::Result<Vec<SentimentLabel>, ClassifierError> {
        (**self).classify(batch)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(
        &self,
        batch: &[String],
    ) -> std::result::Result<Vec<SentimentLabel>, ClassifierError> {
        (**self).classify(batch)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(
        &self,
        batch: &[String],
    ) -> std::result::Result<Vec<SentimentLabel>, ClassifierError> {
        (**self).classify(batch)
    }
}

/// Returned by a sink whose receiving side has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl From<SinkClosed> for AnalyzeError {
    fn from(_: SinkClosed) -> Self {
        AnalyzeError::ChannelClosed
    }
}

/// Destination for the events of one job.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent) -> std::result::Result<(), SinkClosed>;
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) -> std::result::Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub batch_size: usize,
    pub delimiter: u8,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

pub struct BatchAnalyzer<C> {
    classifier: C,
    config: AnalyzerConfig,
}

impl<C: Classifier> BatchAnalyzer<C> {
    pub fn new(classifier: C, config: AnalyzerConfig) -> Self {
        let config = AnalyzerConfig {
            batch_size: config.batch_size.max(1),
            ..config
        };
        Self { classifier, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs one job to its terminal event.
    ///
    /// On success `Complete` has been emitted and the row count is returned.
    /// Any other failure emits a single `Error` before returning it, except
    /// `ChannelClosed`, where nothing more can be delivered.
    pub fn run(&self, request: &AnalyzeRequest, sink: &mut dyn ProgressSink) -> Result<usize> {
        match self.analyze(request, sink) {
            Ok(results) => {
                let rows = results.len();
                sink.emit(ProgressEvent::Complete { data: results })?;
                info!(column = %request.column_name, rows, "analysis complete");
                Ok(rows)
            }
            Err(AnalyzeError::ChannelClosed) => {
                info!(column = %request.column_name, "output channel closed, stopping job");
                Err(AnalyzeError::ChannelClosed)
            }
            Err(err) => {
                warn!(column = %request.column_name, error = %err, "analysis failed");
                let _ = sink.emit(ProgressEvent::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn analyze(&self, request: &AnalyzeRequest, sink: &mut dyn ProgressSink) -> Result<ResultSet> {
        request.validate()?;
        let texts = tabular::extract_column(
            &request.csv_data,
            self.config.delimiter,
            &request.column_name,
        )?;
        let total = texts.len();
        sink.emit(ProgressEvent::info(format!(
            "Processing {total} texts from column '{}'...",
            request.column_name
        )))?;
        let mut results = Vec::with_capacity(total);
        for (batch_idx, batch) in texts.chunks(self.config.batch_size).enumerate() {
            let labels = self.classify_batch(batch)?;
            results.extend(
                batch
                    .iter()
                    .zip(labels)
                    .map(|(text, label)| Record::new(text.clone(), label)),
            );
            let percent = progress_percent(results.len(), total);
            debug!(batch = batch_idx, rows = results.len(), percent, "batch classified");
            sink.emit(ProgressEvent::Progress { progress: percent })?;
        }
        Ok(results)
    }

    /// Blank cells skip the classifier and read as `Unknown`.
    fn classify_batch(&self, batch: &[String]) -> Result<Vec<SentimentLabel>> {
        let pending = batch
            .iter()
            .filter(|text| !text.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>();
        let mut classified = if pending.is_empty() {
            Vec::new()
        } else {
            self.classifier.classify(&pending)?
        };
        if classified.len() != pending.len() {
            return Err(AnalyzeError::BatchMismatch {
                expected: pending.len(),
                actual: classified.len(),
            });
        }
        classified.reverse();
        let labels = batch
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    SentimentLabel::Unknown
                } else {
                    classified.pop().unwrap_or(SentimentLabel::Unknown)
                }
            })
            .collect();
        Ok(labels)
    }
}

pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = processed.min(total) * 100 / total;
    percent as u8
}
