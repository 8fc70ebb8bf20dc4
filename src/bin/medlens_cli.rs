//! Command-line front end for one-off extraction, summaries and term explanations.
use std::io::Read as _;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use medlens::{
    config::{self, Config},
    extraction::{DocumentExtractor, DocumentReference, MediaKind},
    logging,
    processing::{MedicalPipeline, PipelineApi, SummaryMode, SummarySource},
};

#[derive(Parser)]
#[command(
    name = "medlens-cli",
    about = "Summarize medical documents and explain terms from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cleaned text recovered from a document.
    Extract {
        /// URL or local path of the document.
        location: String,
        /// Declared kind (`pdf`, `image`, or a MIME type).
        #[arg(long)]
        kind: Option<String>,
        /// Print the uncleaned text instead.
        #[arg(long)]
        raw: bool,
    },
    /// Summarize a document, pasted text, or stdin (`-`).
    Summarize {
        /// URL or local path of the document; `-` reads text from stdin.
        location: Option<String>,
        /// Declared kind (`pdf`, `image`, or a MIME type).
        #[arg(long)]
        kind: Option<String>,
        /// Summarize this text instead of a document.
        #[arg(long, conflicts_with = "location")]
        text: Option<String>,
        /// Override the configured summary mode (`auto`, `single_shot`, `chunked`).
        #[arg(long)]
        mode: Option<SummaryMode>,
        /// Emit the full JSON result instead of just the text.
        #[arg(long)]
        json: bool,
    },
    /// Explain a medical term in plain language.
    Explain {
        /// The term to explain.
        term: Vec<String>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing_stderr();

    match cli.command {
        Command::Extract {
            location,
            kind,
            raw,
        } => {
            let extractor = DocumentExtractor::from_settings(&config::get_config().pipeline);
            let reference = DocumentReference::new(location, MediaKind::from_declared(kind.as_deref()));
            let extracted = extractor
                .extract(&reference)
                .await
                .with_context(|| format!("failed to extract {}", reference.location))?;
            println!("{}", if raw { extracted.raw } else { extracted.cleaned });
        }
        Command::Summarize {
            location,
            kind,
            text,
            mode,
            json,
        } => {
            let source = summary_source(location, kind, text)?;
            let pipeline = MedicalPipeline::new(&config_with_mode(mode));
            let result = pipeline.summarize(source).await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("failed to encode result")?
                );
            } else {
                println!("{}", result.text);
            }
            if result.is_error() {
                std::process::exit(2);
            }
        }
        Command::Explain { term } => {
            let pipeline = MedicalPipeline::new(config::get_config());
            println!("{}", pipeline.explain(&term.join(" ")).await);
        }
    }
    Ok(())
}

fn config_with_mode(mode: Option<SummaryMode>) -> Config {
    let mut config = config::get_config().clone();
    if let Some(mode) = mode {
        config.pipeline.summary_mode = mode;
    }
    config
}

fn summary_source(
    location: Option<String>,
    kind: Option<String>,
    text: Option<String>,
) -> Result<SummarySource> {
    match (location.as_deref(), text) {
        (_, Some(text)) => Ok(SummarySource::Text(text)),
        (Some("-"), None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(SummarySource::Text(buffer))
        }
        (Some(location), None) => Ok(SummarySource::Document(DocumentReference::new(
            location,
            MediaKind::from_declared(kind.as_deref()),
        ))),
        (None, None) => bail!("provide a document location, `-` for stdin, or --text"),
    }
}
