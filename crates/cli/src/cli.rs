//! Command line arguments.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use swissknife_core::{Operation, SummaryLength};

/// Convert, batch-convert, merge, split and summarize files with external tools.
#[derive(Parser, Debug)]
#[command(name = "swissknife")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose diagnostics on stderr (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: $SWISSKNIFE_CONFIG or the user config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert one file; formats come from the extensions.
    Convert {
        source: PathBuf,
        target: PathBuf,

        /// Keep the source file after a successful conversion.
        #[arg(long)]
        preserve_original: bool,

        /// Password for an encrypted source.
        #[arg(long)]
        password: Option<String>,

        /// Replace an existing target.
        #[arg(short, long)]
        force: bool,
    },

    /// Convert every file with one extension in a directory.
    BatchConvert {
        source_dir: PathBuf,
        target_dir: PathBuf,
        source_ext: String,
        target_ext: String,

        /// Run items concurrently.
        #[arg(long)]
        parallel: bool,

        /// Worker count for --parallel (default from config).
        #[arg(long)]
        workers: Option<usize>,

        /// Delete each source after its conversion succeeds.
        #[arg(long)]
        delete_originals: bool,

        /// Password applied to every encrypted source.
        #[arg(long)]
        password: Option<String>,

        /// Replace existing targets.
        #[arg(short, long)]
        force: bool,
    },

    /// Summarize a document or recording into <stem>_summary.txt.
    Summarize {
        file: PathBuf,

        /// short, medium or long.
        #[arg(short, long, default_value = "medium")]
        length: SummaryLength,
    },

    /// Merge PDFs in the given order.
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,

        /// Replace an existing output.
        #[arg(short, long)]
        force: bool,
    },

    /// Split a PDF by page ranges, e.g. "1-3,5,7-9".
    Split {
        input: PathBuf,
        ranges: String,

        /// Output directory (default: next to the input).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Replace existing parts.
        #[arg(short, long)]
        force: bool,
    },

    /// Show size, hash, format and conversion targets of a file.
    Info {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show the operation log.
    Logs {
        /// Only this operation: convert, batch_item, summarize, merge, split.
        #[arg(long)]
        operation: Option<Operation>,

        /// Only failed operations.
        #[arg(long)]
        failures: bool,

        /// Only entries at or after this RFC 3339 time.
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Show the most recent N entries.
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// One JSON object per line.
        #[arg(long)]
        json: bool,
    },

    /// Remove leftover staging directories.
    Cleanup {
        /// Age threshold (default from config).
        #[arg(long)]
        older_than_hours: Option<u64>,
    },

    /// Show the version and which external tools are available.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "swissknife",
            "-vv",
            "convert",
            "a.docx",
            "a.pdf",
            "--preserve-original",
            "--password",
            "pw",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert {
                preserve_original,
                password,
                force,
                ..
            } => {
                assert!(preserve_original);
                assert_eq!(password.as_deref(), Some("pw"));
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_merge_needs_two_inputs() {
        assert!(Cli::try_parse_from(["swissknife", "merge", "a.pdf", "-o", "out.pdf"]).is_err());
        assert!(
            Cli::try_parse_from(["swissknife", "merge", "a.pdf", "b.pdf", "-o", "out.pdf"]).is_ok()
        );
    }

    #[test]
    fn test_parse_logs_filters() {
        let cli = Cli::try_parse_from([
            "swissknife",
            "logs",
            "--operation",
            "split",
            "--failures",
            "--since",
            "2024-05-01T00:00:00Z",
        ])
        .unwrap();
        match cli.command {
            Commands::Logs {
                operation,
                failures,
                since,
                limit,
                ..
            } => {
                assert_eq!(operation, Some(Operation::Split));
                assert!(failures);
                assert!(since.is_some());
                assert_eq!(limit, 20);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_summary_length_parsing() {
        let cli = Cli::try_parse_from(["swissknife", "summarize", "talk.mp3", "-l", "long"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Summarize {
                length: SummaryLength::Long,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["swissknife", "summarize", "x.txt", "-l", "epic"]).is_err());
    }
}
