use std::fmt::Write;

use sentiflow_core::{Filter, LabelCounts, Page};

const BAR_WIDTH: usize = 30;
const TEXT_WIDTH: usize = 72;

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub fn summary(counts: &LabelCounts) -> String {
    let mut out = format!(
        "{} rows: {} positive, {} negative, {} neutral",
        counts.total(),
        counts.positive,
        counts.negative,
        counts.neutral
    );
    if counts.unknown > 0 {
        let _ = write!(out, ", {} unknown", counts.unknown);
    }
    out
}

pub fn page_table(filter: Filter, page: &Page<'_>) -> String {
    let mut out = format!(
        "{filter} results, page {} of {} ({} rows)\n",
        page.index, page.total_pages, page.filtered_count
    );
    if page.rows.is_empty() {
        out.push_str("  (no rows)\n");
        return out;
    }
    for record in &page.rows {
        let _ = writeln!(
            out,
            "  {:<9} {}",
            record.sentiment().as_str(),
            clip(record.text())
        );
    }
    out
}

/// Single line, at most `TEXT_WIDTH` characters.
fn clip(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= TEXT_WIDTH {
        return flat;
    }
    let mut clipped: String = flat.chars().take(TEXT_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiflow_core::{Record, ResultsStore, SentimentLabel};

    #[test]
    fn bar_scales_with_percent() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", "-".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(BAR_WIDTH)));
        assert!(progress_bar(50).starts_with(&format!("[{}-", "#".repeat(15))));
    }

    #[test]
    fn summary_mentions_unknown_only_when_present() {
        let mut counts = LabelCounts {
            positive: 2,
            negative: 1,
            neutral: 0,
            unknown: 0,
        };
        assert_eq!(summary(&counts), "3 rows: 2 positive, 1 negative, 0 neutral");
        counts.unknown = 1;
        assert!(summary(&counts).ends_with(", 1 unknown"));
    }

    #[test]
    fn table_flattens_and_clips_text() {
        let long = "word ".repeat(40);
        let mut store = ResultsStore::new();
        store.set_results(vec![
            Record::new("multi\nline", SentimentLabel::Neutral),
            Record::new(long, SentimentLabel::Positive),
        ]);
        let page = store.page(Filter::All, 1).unwrap();
        let table = page_table(Filter::All, &page);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "all results, page 1 of 1 (2 rows)");
        assert_eq!(lines[1], "  neutral   multi line");
        assert!(lines[2].ends_with("..."));
        assert_eq!(lines.len(), 3);
    }
}
