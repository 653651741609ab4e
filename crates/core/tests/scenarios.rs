use sentiflow_core::{
    AnalyzeRequest, AnalyzerConfig, BatchAnalyzer, Classifier, ClassifierError, Filter,
    ProgressEvent, Record, ResultsStore, SentimentLabel,
};

struct ReviewClassifier;

impl Classifier for ReviewClassifier {
    fn classify(&self, batch: &[String]) -> Result<Vec<SentimentLabel>, ClassifierError> {
        Ok(batch
            .iter()
            .map(|text| match text.as_str() {
                "great product" => SentimentLabel::Positive,
                "terrible" => SentimentLabel::Negative,
                _ => SentimentLabel::Neutral,
            })
            .collect())
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _batch: &[String]) -> Result<Vec<SentimentLabel>, ClassifierError> {
        Err(ClassifierError::Request("model crashed".to_string()))
    }
}

fn run(request: AnalyzeRequest) -> Vec<ProgressEvent> {
    let analyzer = BatchAnalyzer::new(ReviewClassifier, AnalyzerConfig::default());
    let mut events = Vec::new();
    let _ = analyzer.run(&request, &mut events);
    events
}

#[test]
fn review_column_is_classified_end_to_end() {
    let csv = "id,review,rating\n1,great product,5\n2,terrible,1\n3,,3\n";
    let events = run(AnalyzeRequest::new("review", csv));

    assert!(matches!(events.first(), Some(ProgressEvent::Info { .. })));
    let data = match events.last() {
        Some(ProgressEvent::Complete { data }) => data.clone(),
        other => panic!("expected complete, got {other:?}"),
    };
    assert_eq!(
        data,
        vec![
            Record::new("great product", SentimentLabel::Positive),
            Record::new("terrible", SentimentLabel::Negative),
            Record::new("", SentimentLabel::Unknown),
        ]
    );

    let mut store = ResultsStore::new();
    store.set_results(data);
    let counts = store.counts_by_label();
    assert_eq!(
        (counts.positive, counts.negative, counts.neutral),
        (1, 1, 0)
    );
    assert_eq!(store.filtered_view(Filter::Positive).len(), 1);
    assert_eq!(store.page(Filter::All, 1).unwrap().rows.len(), 3);
}

#[test]
fn missing_column_yields_single_error() {
    let events = run(AnalyzeRequest::new("comments", "id,review\n1,nice\n"));
    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Error { message } => assert!(message.starts_with("column not found")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn classifier_failure_discards_earlier_batches() {
    let analyzer = BatchAnalyzer::new(
        FailingClassifier,
        AnalyzerConfig {
            batch_size: 1,
            ..AnalyzerConfig::default()
        },
    );
    let mut events = Vec::new();
    assert!(analyzer
        .run(&AnalyzeRequest::new("review", "id,review\n1,a\n2,b\n"), &mut events)
        .is_err());
    let terminal = events.iter().filter(|event| event.is_terminal()).count();
    assert_eq!(terminal, 1);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Error { message }) if message.contains("model crashed")
    ));
}

#[test]
fn info_precedes_progress_for_single_batch_jobs() {
    let events = run(AnalyzeRequest::new("review", "review\ngreat product\n"));
    let kinds = events.iter().map(ProgressEvent::kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec!["info", "progress", "complete"]);
}
