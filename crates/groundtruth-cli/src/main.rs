mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "groundtruth",
    version,
    about = "Extract metadata and body text from stored scientific article pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one stored page
    Extract {
        /// Path to the stored page (HTML)
        page: PathBuf,

        /// Source tag: arxiv, biorxiv, bmc, mdpi, medrxiv, nature
        #[arg(short, long)]
        source: String,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Record shape for JSON output: full (default) or parser
        #[arg(long, default_value = "full", value_parser = ["full", "parser"])]
        shape: String,

        /// Show where each field came from
        #[arg(long)]
        trace: bool,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Extract every page of a source directory into a batch artifact
    Batch {
        /// Source tag
        #[arg(short, long)]
        source: String,

        /// Page directory (default: <data_root>/<source>/html from the config)
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Directory that receives the `<uuid>.jsonl` artifact
        #[arg(long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Record shape: full (default) or parser
        #[arg(long, default_value = "full", value_parser = ["full", "parser"])]
        shape: String,

        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// List registered source tags
    Sources,
    /// Rewrite record paths of batch artifacts onto a new storage root
    Rebase {
        /// Directory holding `.jsonl` batch artifacts
        batch_dir: PathBuf,

        /// New storage root
        new_root: PathBuf,

        /// Replace each artifact by its rebased version when they agree
        #[arg(long)]
        replace: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            page,
            source,
            output,
            shape,
            trace,
            config,
        } => commands::extract::run(page, &source, &output, &shape, trace, config),
        Commands::Batch {
            source,
            input,
            out_dir,
            shape,
            workers,
            config,
        } => commands::batch::run(&source, input, out_dir, &shape, workers, config),
        Commands::Sources => commands::sources::list(),
        Commands::Rebase {
            batch_dir,
            new_root,
            replace,
        } => commands::rebase::run(&batch_dir, &new_root, replace),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
