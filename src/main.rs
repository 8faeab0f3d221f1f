use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod browser;
mod classifier;
mod config;
mod dashboard;
mod emotion;
mod error;
mod report;
mod scraper;
mod utils;
mod vectorizer;

use classifier::EmotionClassifier;
use config::AppConfig;
use report::EmotionReport;

#[derive(Parser)]
#[command(version, about = "Universal review scraper with emotion detection")]
struct Cli {
    /// JSON config file; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape reviews from a page and label each with an emotion
    Scrape {
        /// Reviews page URL; prompted for when omitted
        url: Option<String>,
        #[arg(long)]
        max_reviews: Option<usize>,
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Fetch the raw HTML instead of driving a browser
        #[arg(long = "static")]
        static_html: bool,
        /// Print results instead of opening the dashboard
        #[arg(long)]
        plain: bool,
        /// Don't write the results CSV
        #[arg(long)]
        no_save: bool,
    },
    /// Browse a previously saved results CSV
    Dashboard { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("review_emotions=info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Dashboard { file } => {
            let report = EmotionReport::load_csv(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            dashboard::run_dashboard(&report, &file.display().to_string())?;
        }
        Command::Scrape {
            url,
            max_reviews,
            model_dir,
            static_html,
            plain,
            no_save,
        } => {
            if let Some(max_reviews) = max_reviews {
                config.scraper.max_reviews = max_reviews;
            }
            if let Some(model_dir) = model_dir {
                config.model_dir = model_dir;
            }
            config.validate()?;

            let url = match url {
                Some(url) => url,
                None => prompt("Enter the URL of the reviews page: ")?,
            };
            let url = scraper::parse_url(&url)?;

            // Load the model first so a bad artifact fails before a long scrape
            let classifier = EmotionClassifier::load(&config.model_dir)
                .with_context(|| format!("loading model from {}", config.model_dir.display()))?;

            println!("Scraping reviews...");
            let outcome = if static_html {
                scraper::fetch_static(&url, &config.scraper)?
            } else {
                scraper::scrape_reviews(&url, &config.scraper)?
            };

            if outcome.reviews.is_empty() {
                warn!(stop = ?outcome.stop, "no reviews found");
                println!("No reviews found.");
                return Ok(());
            }
            println!("Scraped {} reviews.", outcome.reviews.len());

            let emotions = classifier.predict(&outcome.reviews)?;
            let report = EmotionReport::new(outcome.reviews, emotions)?;

            if !no_save {
                let path = report.save_timestamped(&config.output_dir)?;
                println!("Results saved to {}", path.display());
            }

            if plain || !io::stdout().is_terminal() {
                dashboard::print_plain(&report);
            } else {
                dashboard::run_dashboard(&report, url.as_str())?;
            }
            info!(rows = report.len(), "done");
        }
    }

    Ok(())
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?; // Ensure prompt is shown before input
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
