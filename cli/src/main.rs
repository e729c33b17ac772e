//! pagecrop CLI - build the training-guide text corpus
//!
//! Downloads both training guides, crops their pages and appends the text to
//! `data/extracted_text.jsonl`. Every extraction parameter is fixed; the only
//! flag controls the progress display.

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagecrop::pipeline::{self, ExtractionObserver};
use pagecrop::{DocumentSource, ExtractionConfig, HttpFetcher, PageRecord};

#[derive(Parser)]
#[command(name = "pagecrop")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Append the cropped page text of the training guides to the JSON Lines corpus",
    long_about = None
)]
struct Cli {
    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

/// Drives one progress bar per document.
struct ProgressObserver {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }
}

impl ExtractionObserver for ProgressObserver {
    fn document_start(&mut self, document: &DocumentSource, pages: usize) {
        if !self.enabled {
            return;
        }
        let pb = ProgressBar::new(pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_prefix(document.name.clone());
        self.bar = Some(pb);
    }

    fn page_extracted(&mut self, record: &PageRecord) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("page {}", record.page_number));
            pb.inc(1);
        }
    }

    fn document_end(&mut self, _document: &DocumentSource, written: usize) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("{} records", written));
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ExtractionConfig::training_guides();
    let fetcher = HttpFetcher::from_config(&config)?;
    let mut observer = ProgressObserver::new(!cli.no_progress);

    let summary = pipeline::run(&config, &fetcher, &mut observer)?;

    println!("\n{}", "Records appended:".green().bold());
    for doc in &summary.documents {
        println!(
            "  {} {}: {} ({} blank)",
            "├─".dimmed(),
            doc.name,
            doc.records,
            doc.blank_records
        );
    }
    println!(
        "  {} {}",
        "└─".dimmed(),
        config.output_path.display()
    );

    Ok(())
}
