use clap::{Parser, ValueEnum};
use quire::{Paginator, QuireConfig, QuireError, load_document_path};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Html,
}

/// Splits a JSON document into pages and prints them.
#[derive(Debug, Parser)]
#[command(name = "quire", version)]
struct Cli {
    /// Document tree as JSON.
    document: PathBuf,

    /// Page, layout and metrics settings as JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), QuireError> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => QuireConfig::from_path(path)?,
        None => QuireConfig::default(),
    };
    let source = load_document_path(&cli.document)?;
    let mut paginator = Paginator::from_config(&config)?;
    let pages = paginator.paginate(&source).await?;

    for (i, page) in pages.iter().enumerate() {
        println!("--- page {} ---", i + 1);
        match cli.format {
            Format::Text => println!("{}", page.text()),
            Format::Html => println!("{}", page.to_html()),
        }
    }
    Ok(())
}
