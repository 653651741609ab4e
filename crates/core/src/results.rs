use std::fmt;

use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ResultsError;
use crate::model::{Record, ResultSet, SentimentLabel};

pub const PAGE_SIZE: usize = 50;

const EXPORT_HEADER: &str = "\"text\",\"sentiment\"\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Positive,
    Negative,
    Neutral,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Positive => "positive",
            Filter::Negative => "negative",
            Filter::Neutral => "neutral",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "all" => Some(Filter::All),
            "positive" => Some(Filter::Positive),
            "negative" => Some(Filter::Negative),
            "neutral" => Some(Filter::Neutral),
            _ => None,
        }
    }

    /// `Unknown` records only ever match `All`.
    pub fn matches(&self, label: SentimentLabel) -> bool {
        match self {
            Filter::All => true,
            Filter::Positive => label == SentimentLabel::Positive,
            Filter::Negative => label == SentimentLabel::Negative,
            Filter::Neutral => label == SentimentLabel::Neutral,
        }
    }

    pub fn export_filename(&self) -> String {
        format!("{}_results.csv", self.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unknown: usize,
}

impl LabelCounts {
    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub index: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub rows: Vec<&'a Record>,
}

/// Holds the delivered result set and derives views from it on demand.
///
/// The set itself is only ever replaced wholesale; filtering and paging never
/// touch it. The store also tracks the presentation cursor (filter and page).
#[derive(Debug, Clone)]
pub struct ResultsStore {
    results: ResultSet,
    filter: Filter,
    page: usize,
}

impl Default for ResultsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsStore {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            filter: Filter::All,
            page: 1,
        }
    }

    pub fn set_results(&mut self, results: ResultSet) {
        self.results = results;
        self.filter = Filter::All;
        self.page = 1;
    }

    pub fn results(&self) -> &[Record] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn counts_by_label(&self) -> LabelCounts {
        let mut counts = LabelCounts::default();
        for record in &self.results {
            match record.sentiment() {
                SentimentLabel::Positive => counts.positive += 1,
                SentimentLabel::Negative => counts.negative += 1,
                SentimentLabel::Neutral => counts.neutral += 1,
                SentimentLabel::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn filtered_view(&self, filter: Filter) -> Vec<&Record> {
        self.results
            .iter()
            .filter(|record| filter.matches(record.sentiment()))
            .collect()
    }

    pub fn total_pages(&self, filter: Filter) -> usize {
        let count = self
            .results
            .iter()
            .filter(|record| filter.matches(record.sentiment()))
            .count();
        pages_for(count)
    }

    /// One page of the filtered view. Index 0 or past the last page is an error.
    pub fn page(&self, filter: Filter, index: usize) -> Result<Page<'_>, ResultsError> {
        let view = self.filtered_view(filter);
        let total_pages = pages_for(view.len());
        if index == 0 || index > total_pages {
            return Err(ResultsError::PageOutOfRange {
                requested: index,
                total: total_pages,
            });
        }
        Ok(slice_page(view, index, total_pages))
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Switches the active filter and rewinds to the first page.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, index: usize) -> Result<(), ResultsError> {
        let total = self.total_pages(self.filter);
        if index == 0 || index > total {
            return Err(ResultsError::PageOutOfRange {
                requested: index,
                total,
            });
        }
        self.page = index;
        Ok(())
    }

    pub fn current_page(&self) -> Page<'_> {
        let view = self.filtered_view(self.filter);
        let total_pages = pages_for(view.len());
        slice_page(view, self.page.clamp(1, total_pages), total_pages)
    }

    /// Filtered view as CSV with a quoted `"text","sentiment"` header.
    pub fn export_csv(&self, filter: Filter) -> Result<String, ResultsError> {
        let view = self.filtered_view(filter);
        if view.is_empty() {
            return Err(ResultsError::EmptyExport(filter));
        }
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());
        for record in view {
            writer.write_record([record.text(), record.sentiment().as_str()])?;
        }
        let body = writer
            .into_inner()
            .map_err(|err| ResultsError::Io(err.into_error()))?;
        let mut out = String::from(EXPORT_HEADER);
        out.push_str(&String::from_utf8(body)?);
        Ok(out)
    }
}

fn pages_for(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

fn slice_page(view: Vec<&Record>, index: usize, total_pages: usize) -> Page<'_> {
    let filtered_count = view.len();
    let start = ((index - 1) * PAGE_SIZE).min(filtered_count);
    let end = (start + PAGE_SIZE).min(filtered_count);
    Page {
        index,
        total_pages,
        filtered_count,
        rows: view[start..end].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(labels: &[SentimentLabel]) -> ResultsStore {
        let mut store = ResultsStore::new();
        store.set_results(
            labels
                .iter()
                .enumerate()
                .map(|(idx, label)| Record::new(format!("row {idx}"), *label))
                .collect(),
        );
        store
    }

    #[test]
    fn unknown_only_shows_under_all() {
        let store = store_with(&[SentimentLabel::Unknown, SentimentLabel::Neutral]);
        assert_eq!(store.filtered_view(Filter::All).len(), 2);
        assert_eq!(store.filtered_view(Filter::Neutral).len(), 1);
        let counts = store.counts_by_label();
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn empty_view_is_a_single_empty_page() {
        let store = store_with(&[SentimentLabel::Negative]);
        assert_eq!(store.total_pages(Filter::Positive), 1);
        let page = store.page(Filter::Positive, 1).unwrap();
        assert!(page.rows.is_empty());
        assert!(store.page(Filter::Positive, 2).is_err());
    }

    #[test]
    fn page_zero_and_past_end_are_errors() {
        let store = store_with(&[SentimentLabel::Positive; 51]);
        assert_eq!(store.total_pages(Filter::All), 2);
        assert_eq!(store.page(Filter::All, 2).unwrap().rows.len(), 1);
        assert!(matches!(
            store.page(Filter::All, 3),
            Err(ResultsError::PageOutOfRange {
                requested: 3,
                total: 2
            })
        ));
        assert!(store.page(Filter::All, 0).is_err());
    }

    #[test]
    fn changing_filter_resets_page() {
        let mut store = store_with(&[SentimentLabel::Positive; 120]);
        store.set_page(3).unwrap();
        assert_eq!(store.current_page().rows.len(), 20);
        store.set_filter(Filter::Positive);
        assert_eq!(store.page_index(), 1);
        assert!(store.set_page(4).is_err());
        assert_eq!(store.page_index(), 1);
    }

    #[test]
    fn set_results_resets_cursor() {
        let mut store = store_with(&[SentimentLabel::Positive; 60]);
        store.set_filter(Filter::Positive);
        store.set_page(2).unwrap();
        store.set_results(vec![Record::new("x", SentimentLabel::Neutral)]);
        assert_eq!(store.filter(), Filter::All);
        assert_eq!(store.page_index(), 1);
    }

    #[test]
    fn export_quotes_only_when_needed() {
        let mut store = ResultsStore::new();
        store.set_results(vec![
            Record::new("plain", SentimentLabel::Positive),
            Record::new("a, b", SentimentLabel::Negative),
            Record::new("say \"hi\"", SentimentLabel::Neutral),
            Record::new("two\nlines", SentimentLabel::Unknown),
        ]);
        let csv = store.export_csv(Filter::All).unwrap();
        assert_eq!(
            csv,
            "\"text\",\"sentiment\"\nplain,positive\n\"a, b\",negative\n\"say \"\"hi\"\"\",neutral\n\"two\nlines\",unknown\n"
        );
    }

    #[test]
    fn empty_export_is_an_error() {
        let store = store_with(&[SentimentLabel::Negative]);
        assert!(matches!(
            store.export_csv(Filter::Positive),
            Err(ResultsError::EmptyExport(Filter::Positive))
        ));
    }

    #[test]
    fn export_filenames_follow_filter() {
        assert_eq!(Filter::All.export_filename(), "all_results.csv");
        assert_eq!(Filter::Neutral.export_filename(), "neutral_results.csv");
        assert_eq!(Filter::from_str("Positive"), Some(Filter::Positive));
        assert_eq!(Filter::from_str("unknown"), None);
    }
}
