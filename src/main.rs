#![forbid(unsafe_code)]
//! # Theme Analysis CLI
//!
//! This is the command-line interface for the `theme_analysis` crate.
//! It extracts dominant themes, concept clusters, and potential research
//! gaps from `.txt` and `.md` documents and writes a JSON record plus a
//! human-readable report per document.
//!
//! ## Features
//! - Analyze a single file or every document under a directory.
//! - Batch mode with a combined theme ranking across the corpus.
//! - Configure the significant-term pool, context window, and
//!   co-occurrence window; supply an optional extra stopword list.
//! - Export the theme table as CSV or TSV in addition to the JSON record.
//!
//! ## Example
//! ```bash
//! cargo run --release -- path/to/docs --output-dir themes --combine
//! ```
//!
//! See `--help` for all available options.

use clap::Parser;
use log::error;
use std::path::Path;
use std::process;
use theme_analysis::{
    AnalysisOptions, ExportFormat, LanguageProfile, analyze_path, analyze_path_combined,
    load_stopwords, print_failed_files,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// File or directory to analyze
    path: String,

    /// Directory where JSON records and reports are written
    #[arg(long, default_value = "themes")]
    output_dir: String,

    /// Optional path to additional stopword file (.txt, one word per line)
    #[arg(long)]
    stopwords: Option<String>,

    /// Number of top-frequency terms used for contexts and co-occurrence
    #[arg(long, default_value_t = theme_analysis::DEFAULT_SIGNIFICANT_TERMS)]
    significant: usize,

    /// Context snippet radius in characters
    #[arg(long, default_value_t = theme_analysis::DEFAULT_CONTEXT_WINDOW)]
    context: usize,

    /// Co-occurrence proximity radius in characters
    #[arg(long, default_value_t = theme_analysis::DEFAULT_COOCCURRENCE_WINDOW)]
    window: usize,

    /// Extra export of the theme table (json = record only)
    #[arg(long, default_value = "json")]
    export_format: ExportFormat,

    /// If set, add a combined theme ranking across all documents
    #[arg(long, default_value_t = false)]
    combine: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut profile = LanguageProfile::default();
    if let Some(file) = &cli.stopwords {
        match load_stopwords(Path::new(file)) {
            Ok(extra) => profile = profile.with_extra_stopwords(extra),
            Err(e) => {
                error!("Error: {e}");
                process::exit(1);
            }
        }
    }
    let opts = AnalysisOptions {
        significant_terms: cli.significant,
        context_window: cli.context,
        cooccurrence_window: cli.window,
        export_format: cli.export_format,
    };
    let path = Path::new(&cli.path);
    let output_dir = Path::new(&cli.output_dir);

    if cli.combine {
        // Batch mode: analyze every document, then aggregate theme
        // frequencies across the corpus.
        match analyze_path_combined(path, output_dir, &profile, &opts) {
            Ok(batch) => {
                println!("{}", batch.summary);
                if !batch.failed_files.is_empty() {
                    print_failed_files(&batch.failed_files);
                }
            }
            Err(e) => {
                error!("Error: {e}");
                process::exit(1);
            }
        }
    } else {
        // Default mode: analyze each document separately and print results
        // per file.
        match analyze_path(path, output_dir, &profile, &opts) {
            Ok(run) => {
                for report in &run.reports {
                    println!("{}", report.summary);
                }
                if !run.failed_files.is_empty() {
                    print_failed_files(&run.failed_files);
                    process::exit(1);
                }
            }
            Err(e) => {
                error!("Error analyzing {}: {e}", cli.path);
                process::exit(1);
            }
        }
    }
}
