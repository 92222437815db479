//! CLI binary for notion-research-buddy.
//!
//! A thin shim over the library crate: maps flags to `BuddyConfig`, then
//! either serves MCP on stdio (the default), serves the HTTP API, or runs a
//! single operation and prints its result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use notion_research_buddy::mcp::McpServer;
use notion_research_buddy::merge::DEFAULT_TITLE;
use notion_research_buddy::{
    http, is_error_message, render, BuddyConfig, BuddyError, CombineRequest, DiagramInput,
    ProcessProgressCallback, ProgressCallback, ResearchBuddy, Stage,
};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows a single `process` run.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("fetching page blocks…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Stop the spinner. Safe to call after `on_process_complete`.
    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_extracted(&self, _page_id: &str, chars: usize) {
        self.bar
            .println(format!("  {} read {}", green("✓"), dim(&format!("{chars} chars"))));
    }

    fn on_stage_start(&self, stage: Stage) {
        match stage {
            Stage::Refined => {
                self.bar.set_prefix("Refining");
                self.bar.set_message("cleaning notes…");
            }
            Stage::Diagrammed => {
                self.bar.set_prefix("Drawing");
                self.bar.set_message("generating diagram…");
            }
            Stage::Start | Stage::Done => {}
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        let label = match stage {
            Stage::Refined => "notes refined",
            Stage::Diagrammed => "diagram generated",
            Stage::Start | Stage::Done => return,
        };
        self.bar.println(format!("  {} {}", green("✓"), label));
        self.bar.set_prefix("Writing");
        self.bar.set_message("appending blocks…");
    }

    fn on_block_appended(&self, index: usize, total: usize) {
        self.bar.set_message(format!("appended {index}/{total} blocks"));
    }

    fn on_process_complete(&self, _page_id: &str) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve MCP tools on stdio (default)
  research-buddy

  # Serve the HTTP API on port 8000
  research-buddy http --bind 0.0.0.0:8000

  # Refine a page and append a diagram
  research-buddy process 0123456789abcdef0123456789abcdef

  # Print the text content of a page
  research-buddy read 0123456789abcdef0123456789abcdef

  # Merge diagrams from a JSON file ([{"label": "...", "mermaid_code": "..."}])
  research-buddy combine diagrams.json --title "Platform"

ENVIRONMENT VARIABLES:
  NOTION_API_KEY          Notion integration token
  GEMINI_API_KEY          Google Gemini API key (default provider)
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Refine Notion notes and draw Mermaid diagrams with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "research-buddy",
    version,
    about = "Refine Notion notes and draw Mermaid architecture diagrams with an LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Notion integration token.
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true, global = true)]
    notion_api_key: Option<String>,

    /// Notion API base URL.
    #[arg(long, env = "NOTION_BASE_URL", global = true,
          default_value = notion_research_buddy::config::DEFAULT_NOTION_BASE_URL)]
    notion_base_url: String,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER", global = true,
          default_value = notion_research_buddy::config::DEFAULT_PROVIDER)]
    provider: String,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL", global = true,
          default_value = notion_research_buddy::config::DEFAULT_MODEL)]
    model: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "BUDDY_TEMPERATURE", global = true, default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens per completion.
    #[arg(long, env = "BUDDY_MAX_TOKENS", global = true)]
    max_tokens: Option<usize>,

    /// Per-completion timeout in seconds.
    #[arg(long, env = "BUDDY_API_TIMEOUT", global = true, default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BUDDY_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BUDDY_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP tools over stdin/stdout.
    Mcp,
    /// Serve the HTTP API.
    Http {
        /// Address to listen on.
        #[arg(long, env = "BUDDY_BIND", default_value = http::DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Refine a page and append the results to it.
    Process {
        /// Notion page ID.
        page_id: String,
    },
    /// Print the text content of a page.
    Read {
        /// Notion page ID.
        page_id: String,
    },
    /// Merge diagrams listed in a JSON file ("-" for stdin).
    Combine {
        /// JSON array of {"label", "mermaid_code"} objects, or a
        /// {"diagrams", "title"} request body.
        file: PathBuf,
        /// Title of the combined diagram [default: the file's title, else "Unified Architecture"].
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Always stderr: in MCP mode stdout carries the JSON-RPC stream.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let command = cli.command.take().unwrap_or(Command::Mcp);
    let show_progress = matches!(command, Command::Process { .. }) && !cli.quiet;
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress: Option<ProgressCallback> = spinner
        .clone()
        .map(|s| s as Arc<dyn ProcessProgressCallback>);

    let config = build_config(&cli, progress)?;
    let buddy = ResearchBuddy::from_config(&config).context("Failed to initialise")?;

    match &command {
        Command::Mcp => McpServer::new(buddy)
            .serve_stdio()
            .await
            .context("MCP server failed")?,
        Command::Http { bind } => http::serve(Arc::new(buddy), *bind)
            .await
            .context("HTTP server failed")?,
        Command::Process { page_id } => {
            let result = buddy.process(page_id).await;
            // Warnings and failures never reach `on_process_complete`.
            if let Some(ref s) = spinner {
                s.finish();
            }
            print_outcome(result, cli.quiet)?;
        }
        Command::Read { page_id } => {
            let result = buddy.read(page_id).await;
            print_outcome(result, cli.quiet)?;
        }
        Command::Combine { file, title } => {
            let request = read_combine_request(file, title.as_deref())?;
            let result = buddy.combine(&request.diagrams, &request.title).await;
            print_outcome(result, cli.quiet)?;
        }
    }

    Ok(())
}

/// Map CLI args to `BuddyConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BuddyConfig> {
    let mut builder = BuddyConfig::builder()
        .notion_base_url(&cli.notion_base_url)
        .provider_name(&cli.provider)
        .model(&cli.model)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.notion_api_key {
        builder = builder.notion_api_key(key);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Load the merge request from `file` ("-" for stdin). An explicit `title`
/// overrides the one in the file.
fn read_combine_request(file: &Path, title: Option<&str>) -> Result<CombineRequest> {
    let text = if file.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diagrams from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read diagrams from {:?}", file))?
    };

    let mut request = parse_combine_request(&text)?;
    if let Some(title) = title {
        request.title = title.to_string();
    }
    Ok(request)
}

/// Parse a bare diagram array or a full `{"diagrams": [...], "title"?}` body.
fn parse_combine_request(text: &str) -> Result<CombineRequest> {
    if let Ok(diagrams) = serde_json::from_str::<Vec<DiagramInput>>(text) {
        return Ok(CombineRequest {
            diagrams,
            title: DEFAULT_TITLE.to_string(),
        });
    }
    serde_json::from_str(text).context("Diagrams file is not valid JSON")
}

/// Print the rendered result: stdout for successes and warnings, stderr +
/// non-zero exit for failures.
fn print_outcome(result: Result<String, BuddyError>, quiet: bool) -> Result<()> {
    let warning = matches!(&result, Err(e) if e.is_warning());
    let rendered = render(result);
    if is_error_message(&rendered) {
        anyhow::bail!("{}", red(&rendered));
    }
    if warning && !quiet {
        eprintln!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}
