use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sentiflow", version, about = "Streaming sentiment analysis client")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// WebSocket endpoint of the analysis service.
    #[arg(long, global = true)]
    pub server: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the header columns of a CSV file.
    Columns {
        file: PathBuf,
        /// Field delimiter; must match the service's `[analyzer] delimiter`.
        #[arg(long)]
        delimiter: Option<String>,
    },
    /// Stream a column of a CSV file through the service.
    Analyze {
        file: PathBuf,
        #[arg(long)]
        column: String,
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, action = ArgAction::SetTrue)]
        export: bool,
        #[arg(long = "out-dir", default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        delimiter: Option<String>,
    },
    /// Classify a single text.
    Text { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults() {
        let cli = Cli::try_parse_from(["sentiflow", "analyze", "reviews.csv", "--column", "review"])
            .unwrap();
        match cli.command {
            Command::Analyze {
                file,
                column,
                filter,
                page,
                export,
                out_dir,
                delimiter,
            } => {
                assert_eq!(file, PathBuf::from("reviews.csv"));
                assert_eq!(column, "review");
                assert_eq!(filter, "all");
                assert_eq!(page, 1);
                assert!(!export);
                assert_eq!(out_dir, PathBuf::from("."));
                assert!(delimiter.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn columns_accepts_a_delimiter() {
        let cli =
            Cli::try_parse_from(["sentiflow", "columns", "reviews.csv", "--delimiter", ";"])
                .unwrap();
        match cli.command {
            Command::Columns { delimiter, .. } => assert_eq!(delimiter.as_deref(), Some(";")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn column_is_required() {
        assert!(Cli::try_parse_from(["sentiflow", "analyze", "reviews.csv"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "sentiflow",
            "text",
            "hello",
            "--verbose",
            "--server",
            "ws://10.0.0.2:8000/ws/analyze/",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.server.as_deref(), Some("ws://10.0.0.2:8000/ws/analyze/"));
    }
}
