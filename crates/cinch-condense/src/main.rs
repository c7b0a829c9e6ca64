//! Inspect and run context condensation from the command line.
//!
//! History files are JSON lines, one message per line:
//!
//! ```text
//! {"role":"system","content":"Fix the failing test","condensable":false}
//! {"role":"assistant","content":"cargo test","condensable":true,"event_id":1}
//! ```
//!
//! # Examples
//!
//! ```sh
//! # Show the prompt that would be sent for the next condensation
//! cinch-condense prompt --history history.jsonl --keep-recent 4
//!
//! # Validate a model reply
//! echo '{"action":"summarize","args":{"summary":"..."}}' | cinch-condense parse
//!
//! # Condense now and write the new history to stdout
//! cinch-condense run --history history.jsonl --max-tokens 32000 --force > condensed.jsonl
//! ```

use cinch_condense::action::Action;
use cinch_condense::config::CondenserConfig;
use cinch_condense::context::summarizer::{JsonMode, WORD_LIMIT, build_prompt};
use cinch_condense::context::{Condenser, parse_summary_response, select_range, splice};
use cinch_condense::events::LoggingHandler;
use cinch_condense::message::{Message, load_history};
use cinch_condense::{DEFAULT_MODEL, OpenRouterClient};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Inspect and run context condensation for agent histories.
#[derive(Parser)]
#[command(name = "cinch-condense", version)]
struct Cli {
    /// Log filter, e.g. "debug" or "cinch_condense=trace" (default: RUST_LOG or "info")
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the summarization prompt for the range that would be condensed
    Prompt {
        /// JSON-lines history file
        #[arg(long)]
        history: PathBuf,

        /// Word limit stated in the prompt
        #[arg(long, default_value_t = WORD_LIMIT)]
        word_limit: usize,

        /// Most recent events kept out of the summary
        #[arg(long, default_value_t = 10)]
        keep_recent: usize,

        /// Summarize every event instead of the selected range
        #[arg(long)]
        all: bool,
    },

    /// Validate a raw summarization reply and print the decoded action
    Parse {
        /// Read the reply from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Run one condensation cycle against OpenRouter
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON-lines history file
    #[arg(long)]
    history: PathBuf,

    /// Main model of the session
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Cheaper model used only for the summary
    #[arg(long)]
    summary_model: Option<String>,

    /// Context window of the main model, in tokens
    #[arg(long, default_value_t = 200_000)]
    max_tokens: usize,

    /// Fraction of the window that triggers condensation
    #[arg(long, default_value_t = 0.75)]
    warning_fraction: f64,

    /// Most recent events kept verbatim
    #[arg(long, default_value_t = 10)]
    keep_recent: usize,

    /// Word limit stated in the prompt
    #[arg(long, default_value_t = WORD_LIMIT)]
    word_limit: usize,

    /// Ask the provider for JSON output
    #[arg(long, value_enum, default_value_t = JsonModeArg::Off)]
    json_mode: JsonModeArg,

    /// Retries for transient transport errors
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Mark summaries as belonging to a delegated sub-session
    #[arg(long)]
    delegate: bool,

    /// Condense even when the history is under the threshold
    #[arg(long)]
    force: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum JsonModeArg {
    Off,
    Object,
    Schema,
}

impl From<JsonModeArg> for JsonMode {
    fn from(arg: JsonModeArg) -> Self {
        match arg {
            JsonModeArg::Off => JsonMode::Off,
            JsonModeArg::Object => JsonMode::Object,
            JsonModeArg::Schema => JsonMode::Schema,
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: Option<&Path>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn to_jsonl(events: &[Message]) -> Result<String, String> {
    let mut out = String::new();
    for event in events {
        let line =
            serde_json::to_string(event).map_err(|e| format!("failed to serialize event: {e}"))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

fn prompt(history: &Path, word_limit: usize, keep_recent: usize, all: bool) -> Result<String, String> {
    let events = load_history(history)?;
    if all {
        return Ok(build_prompt(&events, word_limit));
    }
    let range = select_range(&events, keep_recent)
        .ok_or_else(|| "no range of at least two condensable events is eligible".to_string())?;
    let span = range
        .slice(&events)
        .ok_or_else(|| format!("{range} not found in history"))?;
    eprintln!("  Selected {range} ({} events)", span.len());
    Ok(build_prompt(span, word_limit))
}

fn parse(file: Option<&Path>) -> Result<String, String> {
    let raw = read_input(file)?;
    let action = Action::Summarize(parse_summary_response(&raw).map_err(|e| e.to_string())?);
    serde_json::to_string_pretty(&action).map_err(|e| format!("failed to format action: {e}"))
}

async fn run(args: &RunArgs) -> Result<String, String> {
    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "OPENROUTER_KEY environment variable is not set".to_string())?;
    let events = load_history(&args.history)?;
    eprintln!(
        "  Loaded {} event(s) from {}",
        events.len(),
        args.history.display()
    );

    let mut config = CondenserConfig::new(&args.model)
        .with_max_tokens(args.max_tokens)
        .with_warning_fraction(args.warning_fraction)
        .with_keep_recent(args.keep_recent)
        .with_word_limit(args.word_limit)
        .with_retries(args.retries);
    config.summarizer.json_mode = args.json_mode.into();
    if let Some(model) = &args.summary_model {
        config = config.with_summary_model(model);
    }
    if args.delegate {
        config = config.delegate();
    }

    let client = OpenRouterClient::new(api_key)?;
    let handler = LoggingHandler;
    let mut condenser = Condenser::new(&client, config).with_event_handler(&handler);

    let outcome = if args.force {
        condenser.force_condense(&events).await
    } else {
        condenser.condense(&events).await
    };

    match outcome.map_err(|e| e.to_string())? {
        Some(condensation) => {
            eprintln!(
                "  Condensed {} into one summary (watermark {})",
                condensation.range,
                condensation.action.last_summarized_event_id.unwrap_or_default()
            );
            to_jsonl(&splice(&events, &condensation))
        }
        None => {
            eprintln!("  Nothing to condense; history unchanged");
            to_jsonl(&events)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let result = match &cli.command {
        Command::Prompt {
            history,
            word_limit,
            keep_recent,
            all,
        } => prompt(history, *word_limit, *keep_recent, *all),
        Command::Parse { file } => parse(file.as_deref()),
        Command::Run(args) => run(args).await,
    };

    match result {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
