use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;

use doclust::config::Config;
use doclust::embeddings::SharedEmbedder;
use doclust::extract::{process_files, supported_formats, UploadedFile};
use doclust::output::terminal;
use doclust::pipeline::{self, PipelineOptions};
use doclust::topics::TfIdfExtractor;

/// doclust: group documents into semantic clusters and label each one.
///
/// Documents are embedded with a local sentence model, partitioned with
/// k-means, and every cluster gets its three most characteristic terms.
#[derive(Parser)]
#[command(name = "doclust", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster documents given as arguments, files, or stdin lines
    Cluster {
        /// Number of clusters (2-20)
        #[arg(short, default_value = "2")]
        k: usize,

        /// Seed for k-means initialization (default: DOCLUST_SEED or 42)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON instead of coloured text
        #[arg(long)]
        json: bool,

        /// Read a document from a file (txt, pdf, docx, pptx, doc); repeatable
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,

        /// Documents as literal text
        texts: Vec<String>,
    },

    /// Show which file formats this build can read
    Formats,

    /// Download the sentence embedding model (~90 MB)
    DownloadModel,

    /// Run the HTTP clustering service
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: DOCLUST_PORT or 5000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: DOCLUST_BIND or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("doclust=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            k,
            seed,
            json,
            files,
            texts,
        } => {
            let config = Config::load()?;
            config.require_model()?;

            let (documents, warnings) = gather_documents(texts, &files)?;
            if !warnings.is_empty() && !json {
                terminal::display_file_errors(&warnings);
            }
            if documents.is_empty() && !warnings.is_empty() {
                anyhow::bail!("No documents extracted. Errors: {}", warnings.join("; "));
            }

            let options = PipelineOptions {
                seed: seed.unwrap_or(config.seed),
                ..PipelineOptions::default()
            };
            let embedder = SharedEmbedder::from_model_dir(config.embedding_dir());
            let extractor = TfIdfExtractor::default();

            let report = pipeline::run(&documents, k, &embedder, &extractor, &options).await?;

            if json {
                let body = serde_json::json!({
                    "clusters": report.clusters,
                    "excluded": report.excluded,
                    "warnings": warnings,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                terminal::display_report(&report);
            }
        }

        Commands::Formats => {
            terminal::display_formats(&supported_formats());
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading the sentence embedding model...");
            println!("  Destination: {}", model_dir.display());

            doclust::embeddings::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `doclust cluster -k 3 --file notes.txt ...`.");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if config.require_model().is_err() {
                tracing::warn!(
                    dir = %config.embedding_dir().display(),
                    "Embedding model not downloaded yet; /cluster will fail until it is"
                );
            }
            doclust::web::run_server(config).await?;
        }
    }

    Ok(())
}

/// Collect documents from literal arguments and files, or from stdin lines
/// when neither is given. Returns the documents and per-file errors.
fn gather_documents(texts: Vec<String>, files: &[PathBuf]) -> Result<(Vec<String>, Vec<String>)> {
    if texts.is_empty() && files.is_empty() {
        info!("Reading documents from stdin, one per line");
        let lines = std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<String>>>()?;
        return Ok((lines, Vec::new()));
    }

    let uploads = files
        .iter()
        .map(|path| UploadedFile::read(path))
        .collect::<Result<Vec<_>>>()?;
    let (extracted, warnings) = process_files(&uploads);

    let mut documents = texts;
    documents.extend(extracted);
    Ok((documents, warnings))
}
