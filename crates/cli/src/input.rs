//! Local checks on a dataset before any channel is opened.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use sentiflow_core::tabular;

pub fn read_dataset(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("no such file: {}", path.display());
    }
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if data.trim().is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(data)
}

pub fn columns(data: &str, delimiter: u8) -> Result<Vec<String>> {
    Ok(tabular::read_headers(data, delimiter)?)
}

/// Fails with the list of available columns when `column` is not a header.
pub fn require_column(data: &str, delimiter: u8, column: &str) -> Result<()> {
    if column.is_empty() {
        bail!("a column must be selected");
    }
    let headers = columns(data, delimiter)?;
    if headers.iter().any(|header| header == column) {
        return Ok(());
    }
    Err(anyhow!(
        "column '{column}' not found; available columns: {}",
        headers.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_non_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id,review\n1,fine\n").unwrap();
        let data = read_dataset(file.path()).unwrap();
        assert_eq!(columns(&data, b',').unwrap(), vec!["id", "review"]);
    }

    #[test]
    fn missing_and_empty_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(read_dataset(&missing)
            .unwrap_err()
            .to_string()
            .starts_with("no such file"));

        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "  \n").unwrap();
        assert!(read_dataset(&empty).unwrap_err().to_string().ends_with("is empty"));
    }

    #[test]
    fn unknown_column_lists_alternatives() {
        let err = require_column("id,review\n1,fine\n", b',', "comments").unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'comments' not found; available columns: id, review"
        );
        assert!(require_column("id,review\n", b',', "review").is_ok());
        assert!(require_column("id,review\n", b',', "").is_err());
    }

    #[test]
    fn semicolon_separated_file_needs_its_delimiter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id;review\n1;great\n").unwrap();
        let data = read_dataset(file.path()).unwrap();

        assert_eq!(columns(&data, b';').unwrap(), vec!["id", "review"]);
        assert!(require_column(&data, b';', "review").is_ok());

        assert_eq!(columns(&data, b',').unwrap(), vec!["id;review"]);
        assert!(require_column(&data, b',', "review").is_err());
    }
}
