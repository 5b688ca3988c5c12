// Entrypoint for the CLI application.
// - Parses the command line, installs logging and dispatches to the
//   library. Returns `anyhow::Result` so failures print with context.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedflow_tools::config::{CollectionRef, API_URL_ENV, DEFAULT_OUTPUT_DIR, SESSION_ENV};
use wedflow_tools::gallery::GalleryFetcher;
use wedflow_tools::publish::{self, SystemRunner};
use wedflow_tools::ui;

#[derive(Parser)]
#[command(
    name = "wedflow-tools",
    version,
    about = "Gallery download, commit/push and deploy helpers"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every image of a gallery and write image_urls.json
    Gallery {
        /// Listing endpoint, e.g. https://host/api/v1/collection_photos
        #[arg(long, env = API_URL_ENV)]
        base_url: String,

        /// Numeric collection id (`cid`)
        #[arg(long)]
        collection_id: u64,

        /// Collection key (`cuk`)
        #[arg(long)]
        collection_key: String,

        /// Gallery slug (`gs`); also the name of the output subdirectory
        #[arg(long)]
        gallery_name: String,

        /// PHPSESSID cookie value. Prompted for when missing.
        #[arg(long, env = SESSION_ENV, hide_env_values = true)]
        cookie: Option<String>,

        /// Output root directory
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Exit with status 1 if any page or image failed
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Disable the progress bar
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },

    /// Stage all changes, commit and push
    CommitPush {
        /// Repository directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Commit message. Prompted for when missing.
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Run the deployment CLI and exit with its status
    Deploy {
        /// Project directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Deploy a preview instead of production
        #[arg(long, default_value_t = false)]
        preview: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wedflow_tools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Gallery {
            base_url,
            collection_id,
            collection_key,
            gallery_name,
            cookie,
            output,
            strict,
            no_progress,
        } => {
            let session = ui::session_or_prompt(cookie)?;
            let collection =
                CollectionRef::new(base_url, collection_id, collection_key, gallery_name, session);
            let fetcher = GalleryFetcher::new()?.with_progress(ui::download_progress(!no_progress));
            let report = fetcher
                .fetch(&collection, &output)
                .with_context(|| format!("gallery run for {} failed", collection.gallery_name))?;

            println!("{}", ui::summary(&report));
            let code = ui::exit_code(&report, strict);
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::CommitPush { dir, message } => {
            let message = ui::message_or_prompt(message)?;
            let status = publish::commit_and_push(&mut SystemRunner, &dir, &message)
                .context("commit and push failed")?;
            print!("{status}");
            println!("All changes committed and pushed.");
        }
        Commands::Deploy { dir, preview } => {
            let code = publish::deploy(&mut SystemRunner, &dir, !preview)
                .context("could not start deployment")?;
            std::process::exit(code);
        }
    }
    Ok(())
}
