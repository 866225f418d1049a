use chrono::Utc;
use clap::{Parser, Subcommand};
use portfolio_digest::notify::{LinkedInCredentials, LinkedInNotifier, Notifier};
use portfolio_digest::pipeline::{self, SelectionOverrides, Workspace};
use portfolio_digest::types::Trigger;
use portfolio_digest::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Selection flags shared by commands that compute a delta.
#[derive(clap::Args, Clone)]
struct SelectionArgs {
    /// Maximum number of projects in the edition (overrides selection.max_items)
    #[arg(long)]
    max_items: Option<usize>,

    /// Only consider files changed within this many days; 0 disables (overrides selection.window_days)
    #[arg(long)]
    window_days: Option<u32>,
}

impl SelectionArgs {
    fn overrides(&self) -> SelectionOverrides {
        SelectionOverrides {
            max_items: self.max_items,
            window_days: self.window_days,
        }
    }
}

#[derive(Parser)]
#[command(name = "portfolio-digest")]
#[command(about = "Weekly newsletter from a portfolio of Markdown projects")]
#[command(long_about = "\
Weekly newsletter from a portfolio of Markdown projects

Every Markdown file under the content directory is a project. A build picks
the files that were never published or changed since, newest first, renders
them into one HTML edition and records what was sent.

Portfolio structure:

  portfolio/
  ├── docs/                        # content_dir: one .md per project
  │   ├── slowsia.md               # Optional YAML front matter (title, description, tags, url, image)
  │   └── carnet/
  │       └── 2024-carnet.md       # Subdirectories are scanned too
  └── img/                         # assets_dir: cover and inline images

Output:

  site/
  ├── index.html                   # Redirect to the latest edition
  └── newsletters/
      ├── newsletter_YYYYMMDD.html
      ├── latest.html
      ├── archives.html
      └── img/

Metadata resolution (first available wins):
  Title:       front matter → first heading → file name
  Description: front matter → start of the text
  Tags:        front matter → #hashtags in the text → content.default_tags
  Image:       front matter → first image in the body → asset named like the title

Run 'portfolio-digest gen-config' to generate a documented newsletter.toml.")]
#[command(version)]
struct Cli {
    /// Portfolio checkout holding the content and assets directories
    #[arg(long, env = "PORTFOLIO_DIR", default_value = "../portfolio", global = true)]
    portfolio: PathBuf,

    /// Publish directory
    #[arg(long, env = "OUTPUT_DIR", default_value = "site", global = true)]
    output: PathBuf,

    /// Directory holding the publication state files
    #[arg(long, default_value = ".newsletter-state", global = true)]
    state_dir: PathBuf,

    /// Configuration file (stock defaults when missing)
    #[arg(long, default_value = "newsletter.toml", global = true)]
    config: PathBuf,

    /// Log progress at info level (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List candidate files and what the next edition would contain
    Scan(SelectionArgs),
    /// Build, publish and record one edition
    Build {
        /// What started this run
        #[arg(long, value_enum, default_value_t = Trigger::Manual)]
        trigger: Trigger,

        /// Do not announce the edition, even when notify.linkedin is set
        #[arg(long)]
        no_notify: bool,

        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show the publication state
    Status,
    /// Print a stock newsletter.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = || {
        Workspace::load(&cli.portfolio, &cli.output, &cli.state_dir, &cli.config)
    };

    match &cli.command {
        Command::Scan(selection) => {
            let workspace = workspace()?.with_overrides(selection.overrides())?;
            println!("==> Scanning {}", workspace.content_root().display());
            let preview = pipeline::preview(&workspace, Utc::now())?;
            output::print_preview(&preview);
        }
        Command::Build {
            trigger,
            no_notify,
            selection,
        } => {
            let workspace = workspace()?.with_overrides(selection.overrides())?;
            let notifier = if *no_notify || !workspace.config.notify.linkedin {
                None
            } else {
                linkedin_notifier()
            };

            println!("==> Building edition from {}", workspace.content_root().display());
            let report = pipeline::run(
                &workspace,
                *trigger,
                Utc::now(),
                notifier.as_ref().map(|n| n as &dyn Notifier),
            )?;
            output::print_run_report(&report);
        }
        Command::Status => {
            let workspace = workspace()?;
            let tracker = pipeline::load_state(&workspace)?;
            output::print_status(&tracker, &workspace.state_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--verbose` forces info; otherwise `RUST_LOG`, defaulting to warn.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// The LinkedIn client, or `None` with a warning when credentials are missing.
fn linkedin_notifier() -> Option<LinkedInNotifier> {
    match LinkedInCredentials::from_env() {
        Ok(credentials) => Some(LinkedInNotifier::new(credentials)),
        Err(e) => {
            tracing::warn!(error = %e, "LinkedIn notification disabled");
            None
        }
    }
}
