use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use sentiflow_core::{ClassifierError, SentimentLabel};

/// Client for an HTTP inference endpoint speaking the
/// `{"inputs": [...]}` → `[[{"label", "score"}, ...], ...]` convention.
#[derive(Clone)]
pub struct RemoteClassifier {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    max_retries: usize,
}

impl RemoteClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        max_retries: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build classifier http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn classify(&self, batch: &[String]) -> Result<Vec<SentimentLabel>, ClassifierError> {
        let payload = json!({ "inputs": batch });
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let mut request = self.http.post(&self.endpoint).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            let response = match request.send() {
                Ok(resp) => resp,
                Err(err) => {
                    if attempt > self.max_retries {
                        return Err(ClassifierError::Request(err.to_string()));
                    }
                    sleep(backoff_delay(attempt, None));
                    continue;
                }
            };
            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
            {
                if attempt > self.max_retries {
                    return Err(ClassifierError::Request(format!(
                        "classifier returned {status} after {} retries",
                        self.max_retries
                    )));
                }
                let wait = backoff_delay(attempt, response.headers().get(RETRY_AFTER));
                warn!(%status, attempt, wait_secs = wait.as_secs(), "classifier busy, retrying");
                sleep(wait);
                continue;
            }
            let body = response
                .text()
                .map_err(|err| ClassifierError::Request(err.to_string()))?;
            if !status.is_success() {
                return Err(ClassifierError::Request(format!(
                    "classifier returned error (status {status}): {body}"
                )));
            }
            let value: Value = serde_json::from_str(&body)
                .map_err(|err| ClassifierError::InvalidResponse(err.to_string()))?;
            debug!(inputs = batch.len(), attempt, "classifier batch answered");
            return parse_predictions(&value);
        }
    }
}

/// Picks the top label per input. Accepts either one `{label, score}` object
/// per input or a list of candidates per input.
pub fn parse_predictions(value: &Value) -> Result<Vec<SentimentLabel>, ClassifierError> {
    let items = value
        .as_array()
        .ok_or_else(|| ClassifierError::InvalidResponse("expected a JSON array".to_string()))?;
    items.iter().map(top_label).collect()
}

fn top_label(item: &Value) -> Result<SentimentLabel, ClassifierError> {
    if let Some(label) = item.get("label").and_then(Value::as_str) {
        return Ok(map_label(label));
    }
    let candidates = item.as_array().ok_or_else(|| {
        ClassifierError::InvalidResponse(format!("unexpected prediction shape: {item}"))
    })?;
    let best = candidates
        .iter()
        .filter_map(|candidate| {
            let label = candidate.get("label").and_then(Value::as_str)?;
            let score = candidate.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            Some((label, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match best {
        Some((label, _)) => Ok(map_label(label)),
        None => Ok(SentimentLabel::Unknown),
    }
}

/// Maps model label names to sentiment labels.
pub fn map_label(raw: &str) -> SentimentLabel {
    match raw {
        "LABEL_0" => SentimentLabel::Negative,
        "LABEL_1" => SentimentLabel::Neutral,
        "LABEL_2" => SentimentLabel::Positive,
        other => SentimentLabel::from_label(other),
    }
}

fn backoff_delay(attempt: usize, retry_after: Option<&HeaderValue>) -> Duration {
    if let Some(value) = retry_after {
        if let Ok(text) = value.to_str() {
            if let Ok(secs) = text.parse::<u64>() {
                return Duration::from_secs(secs.clamp(1, 60));
            }
        }
    }
    let capped = attempt.min(5) as u32;
    Duration::from_secs(1u64 << capped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_label_names_map_to_sentiments() {
        assert_eq!(map_label("LABEL_0"), SentimentLabel::Negative);
        assert_eq!(map_label("LABEL_1"), SentimentLabel::Neutral);
        assert_eq!(map_label("LABEL_2"), SentimentLabel::Positive);
        assert_eq!(map_label("Positive"), SentimentLabel::Positive);
        assert_eq!(map_label("LABEL_3"), SentimentLabel::Unknown);
    }

    #[test]
    fn candidate_lists_pick_highest_score() {
        let value = json!([
            [{"label": "LABEL_0", "score": 0.1}, {"label": "LABEL_2", "score": 0.8}],
            [{"label": "LABEL_1", "score": 0.6}, {"label": "LABEL_0", "score": 0.4}]
        ]);
        assert_eq!(
            parse_predictions(&value).unwrap(),
            vec![SentimentLabel::Positive, SentimentLabel::Neutral]
        );
    }

    #[test]
    fn flat_predictions_are_accepted() {
        let value = json!([{"label": "negative", "score": 0.9}, {"label": "mixed", "score": 0.5}]);
        assert_eq!(
            parse_predictions(&value).unwrap(),
            vec![SentimentLabel::Negative, SentimentLabel::Unknown]
        );
    }

    #[test]
    fn non_array_body_is_invalid() {
        let err = parse_predictions(&json!({"error": "loading"})).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse(_)));
    }

    #[test]
    fn retry_after_header_wins_over_backoff() {
        let header = HeaderValue::from_static("3");
        assert_eq!(backoff_delay(1, Some(&header)), Duration::from_secs(3));
        assert_eq!(backoff_delay(2, None), Duration::from_secs(4));
        assert_eq!(backoff_delay(40, None), Duration::from_secs(32));
    }
}
