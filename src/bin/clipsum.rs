//! CLI binary for clipsum.
//!
//! A thin shim over the library crate: load `.env`, build `AppConfig` once,
//! then hand one subcommand to the `Summarizer`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipsum::{
    AppConfig, Clipboard, NoopClipboard, Summarizer, SystemClipboard, WebpageOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the bookmarklet API on port 3000
  clipsum serve

  # Summarise a page or a local file to stdout
  clipsum summarize https://example.com/post --title "A post"
  clipsum summarize saved-page.html --copy

  # Summarise a paper and publish it to Notion
  clipsum ingest https://arxiv.org/pdf/1706.03762.pdf --parent-id 0123abcd...

  # List pages the Notion token can publish under
  clipsum pages

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY      Key for the webpage summariser
  OPENAI_MODEL        Model override (default: o4-mini)
  OPENAI_BASE_URL     OpenAI-compatible endpoint root
  VERTEX_PROJECT      Vertex AI project for the ingest flow
  VERTEX_LOCATION     Vertex AI region (default: us-central1)
  VERTEX_MODEL        Vertex model path
  VERTEX_API_KEY      Bearer token for Vertex AI
  NOTION_TOKEN        Default Notion integration token
  NOTION_PARENT_ID    Default parent page for ingested papers
  ENVIRONMENT         "production" disables clipboard copies
  PORT                Listen port for `serve` (default: 3000)

A `.env` file in the working directory is loaded first.
"#;

/// Summarise web pages and papers with a language model.
#[derive(Parser, Debug)]
#[command(
    name = "clipsum",
    version,
    about = "Summarise web pages and papers with a language model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CLIPSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CLIPSUM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8080. Default: 0.0.0.0:$PORT.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Summarise a URL or local HTML/PDF file as Markdown.
    Summarize {
        /// HTTP/HTTPS URL or local file path.
        input: String,

        /// Title used to frame the prompt.
        #[arg(long)]
        title: Option<String>,

        /// Copy the summary to the system clipboard.
        #[arg(long)]
        copy: bool,

        /// Print a JSON object instead of raw Markdown.
        #[arg(long)]
        json: bool,

        /// Model override for this run.
        #[arg(long)]
        model: Option<String>,
    },

    /// Extract structured fields from a paper and publish them to Notion.
    Ingest {
        /// HTTP/HTTPS URL of the paper (HTML or PDF).
        url: String,

        /// Parent page id. Default: $NOTION_PARENT_ID.
        #[arg(long)]
        parent_id: Option<String>,

        /// Notion token. Default: $NOTION_TOKEN.
        #[arg(long)]
        notion_key: Option<String>,
    },

    /// List Notion pages the token can publish under.
    Pages {
        /// Notion token. Default: $NOTION_TOKEN.
        #[arg(long)]
        notion_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; anything else is worth a warning later.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if matches!(cli.command, Command::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }

    let mut config = AppConfig::from_env();
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| config.listen_addr.clone());
            let summarizer = Summarizer::new(&config).context("Failed to start summariser")?;
            clipsum::server::serve(Arc::new(summarizer), &listen)
                .await
                .context("HTTP server failed")?;
        }

        Command::Summarize {
            input,
            title,
            copy,
            json,
            model,
        } => {
            if let Some(model) = model {
                config.summarize.model = model;
            }
            let clipboard: Arc<dyn Clipboard> = if copy {
                Arc::new(SystemClipboard)
            } else {
                Arc::new(NoopClipboard)
            };
            let summarizer = Summarizer::new(&config)?.with_clipboard(clipboard);

            let progress = (!cli.quiet && !json).then(|| spinner("Summarising…"));
            let outcome = summarizer.summarize_source(&input, title.as_deref()).await;
            if let Some(bar) = progress {
                bar.finish_and_clear();
            }
            let outcome = outcome.context("Summarisation failed")?;
            print_webpage_outcome(&outcome, json, copy, cli.quiet)?;
        }

        Command::Ingest {
            url,
            parent_id,
            notion_key,
        } => {
            let summarizer = Summarizer::new(&config)?;
            let progress = (!cli.quiet).then(|| spinner("Extracting fields…"));
            let outcome = summarizer
                .ingest(Some(&url), notion_key.as_deref(), parent_id.as_deref())
                .await;
            if let Some(bar) = progress {
                bar.finish_and_clear();
            }
            let outcome = outcome.context("Ingest failed")?;

            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
            );
            if !cli.quiet {
                match &outcome.publish_error {
                    None => eprintln!("{} Published '{}'", green("✔"), outcome.title),
                    Some(e) => eprintln!("{} Not published: {}", red("✘"), e),
                }
            }
        }

        Command::Pages { notion_key } => {
            let summarizer = Summarizer::new(&config)?;
            let pages = summarizer
                .list_pages(notion_key.as_deref())
                .await
                .context("Failed to list pages")?;
            for page in &pages {
                println!("{}  {}", page.id, page.title);
            }
            if !cli.quiet {
                eprintln!("{}", dim(&format!("{} pages", pages.len())));
            }
        }
    }

    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_webpage_outcome(
    outcome: &WebpageOutcome,
    json: bool,
    copy_requested: bool,
    quiet: bool,
) -> Result<()> {
    if json {
        let value = match outcome {
            WebpageOutcome::Summarised {
                summary,
                clipboard_copied,
            } => serde_json::json!({ "summary": summary, "clipboard_copied": clipboard_copied }),
            WebpageOutcome::Degraded { error, summary } => {
                serde_json::json!({ "error": error, "summary": summary })
            }
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise output")?
        );
        return Ok(());
    }

    let (summary, status) = match outcome {
        WebpageOutcome::Summarised {
            summary,
            clipboard_copied,
        } => {
            let status = match (copy_requested, clipboard_copied) {
                (true, true) => Some(format!("{} Copied to clipboard", green("✔"))),
                (true, false) => Some(format!("{} Clipboard copy failed", red("✘"))),
                _ => None,
            };
            (summary, status)
        }
        WebpageOutcome::Degraded { error, summary } => {
            (summary, Some(format!("{} {}", red("⚠"), error)))
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(summary.as_bytes())
        .context("Failed to write to stdout")?;
    if !summary.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    if let (Some(status), false) = (status, quiet) {
        eprintln!("{status}");
    }
    Ok(())
}
