//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use brandcast_core::{
    ContentPipeline, DEFAULT_REPURPOSE_CHANNELS, ProgressReporter, Repurposer, Stage,
    write_campaign, write_repurpose,
};
use brandcast_shared::{
    AppConfig, CampaignRequest, CampaignResult, Channel, ChannelOutcome, QualityVerdict,
    RepurposeResult, init_config, load_config, load_config_from, validate_api_keys,
    validate_llm_keys,
};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const DEFAULT_TONE: &str = "Professional but approachable";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Brandcast: research a topic once, publish it everywhere.
#[derive(Parser)]
#[command(
    name = "brandcast",
    version,
    about = "Generate researched, quality-checked campaign content for four channels.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.brandcast/brandcast.toml.
    #[arg(long, global = true, env = "BRANDCAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full campaign pipeline.
    Run {
        /// Brand description.
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        brand: String,

        /// Industry the brand operates in.
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        industry: String,

        /// Target audience.
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        audience: String,

        /// Campaign topic.
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        topic: String,

        /// Brand voice.
        #[arg(long, default_value = DEFAULT_TONE)]
        tone: String,

        /// Write campaign.json and per-channel Markdown under this directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Adapt an existing long-form piece to each channel.
    Repurpose {
        /// File holding the source content; `-` reads stdin.
        #[arg(short, long)]
        file: PathBuf,

        /// Channel to write for (repeatable). Defaults to twitter, linkedin and instagram.
        #[arg(short, long = "channel")]
        channels: Vec<Channel>,

        /// Write repurpose.json and per-channel Markdown under this directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "brandcast=info",
        1 => "brandcast=debug",
        _ => "brandcast=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            brand,
            industry,
            audience,
            topic,
            tone,
            out,
        } => {
            let request = CampaignRequest {
                brand_info: brand,
                industry,
                target_audience: audience,
                topic,
                brand_tone: tone,
            };
            cmd_run(&request, config_path.as_deref(), out.as_deref()).await
        }
        Command::Repurpose {
            file,
            channels,
            out,
        } => cmd_repurpose(&file, &channels, config_path.as_deref(), out.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    request: &CampaignRequest,
    config_path: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    // Validate API keys before doing anything
    let config = resolve_config(config_path)?;
    validate_api_keys(&config)?;

    let pipeline = ContentPipeline::from_config(&config)?;

    info!(
        brand = %request.brand_info,
        industry = %request.industry,
        topic = %request.topic,
        "starting campaign"
    );

    let start = Instant::now();
    let reporter = CliProgress::new();
    let result = pipeline.run(request, &reporter).await?;

    print_result(&result);

    if let Some(dir) = out {
        let run_dir = write_campaign(dir, &result)?;
        println!("  Report: {}", run_dir.display());
    }
    println!("  Time:   {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_repurpose(
    file: &Path,
    channels: &[Channel],
    config_path: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let content = read_source(file)?;
    let config = resolve_config(config_path)?;
    validate_llm_keys(&config)?;

    let repurposer = Repurposer::from_config(&config)?;
    let channels = if channels.is_empty() {
        DEFAULT_REPURPOSE_CHANNELS.to_vec()
    } else {
        channels.to_vec()
    };

    info!(source = %file.display(), chars = content.chars().count(), "starting repurpose");

    let start = Instant::now();
    let progress = CliProgress::new();
    progress.spinner.set_message("Analyzing and repurposing content");
    let result = repurposer.run(&content, &channels).await;
    progress.spinner.finish_and_clear();
    let result = result?;

    print_repurpose(&result);

    if let Some(dir) = out {
        let run_dir = write_repurpose(dir, &result)?;
        println!("  Report: {}", run_dir.display());
    }
    println!("  Time:   {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

fn read_source(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        return std::io::read_to_string(std::io::stdin())
            .map_err(|e| eyre!("failed to read stdin: {e}"));
    }
    std::fs::read_to_string(file).map_err(|e| eyre!("failed to read '{}': {e}", file.display()))
}

fn print_repurpose(result: &RepurposeResult) {
    println!();
    for post in &result.posts {
        println!("=== {} ===", post.channel);
        match (&post.content, &post.error) {
            (Some(content), _) => println!("{}", content.trim_end()),
            (None, Some(error)) => println!("  (failed: {error})"),
            (None, None) => println!("  (no content generated)"),
        }
        println!();
    }

    let failed = result.posts.iter().filter(|p| p.content.is_none()).count();
    println!("  Run:     {}", result.run_id);
    println!("  Source:  {} chars", result.analysis.source_chars);
    println!("  Posts:   {} written, {failed} failed", result.posts.len() - failed);
}

fn print_result(result: &CampaignResult) {
    println!();
    for outcome in &result.channels {
        println!("{}", outcome_summary(outcome));
        if outcome.content.is_empty() {
            println!("  (no content generated)");
        } else {
            println!("{}", outcome.content.trim_end());
        }
        println!();
    }

    println!("  Run:      {}", result.run_id);
    println!("  Sources:  {}", result.research_sources);
    println!("  Passes:   {}", result.quality_passes);
    println!(
        "  Approved: {}",
        if result.all_approved { "all channels" } else { "not all channels" }
    );
}

/// Channel header. The best score belongs to the selected draft; the last
/// verdict may belong to a later one.
fn outcome_summary(outcome: &ChannelOutcome) -> String {
    let verdict = &outcome.verdict;
    let score = outcome
        .best_score()
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.1}/10"));
    let pass = outcome
        .selected_pass
        .map_or_else(String::new, |p| format!(" (pass {p})"));

    format!(
        "=== {} ===\n  Best score:   {score}{pass}\n  Last verdict: {} {:.1}/10, {}{}\n",
        outcome.channel,
        verdict.recommendation,
        verdict.overall_score,
        if verdict.approved { "approved" } else { "not approved" },
        if verdict.fallback { " (evaluation unavailable)" } else { "" },
    )
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: Stage) {
        let message = match stage {
            Stage::Research => "Researching topic",
            Stage::Strategy => "Creating content strategy",
            Stage::Generate => "Writing channel drafts",
            Stage::QualityCheck => "Checking quality",
            Stage::Regenerate => "Revising drafts",
            Stage::Done => "Selecting best drafts",
        };
        self.spinner.set_message(message);
    }

    fn channel_evaluated(&self, verdict: &QualityVerdict, pass: u32) {
        self.spinner.set_message(format!(
            "Checking quality [pass {pass}] {}: {:.1}/10 {}",
            verdict.channel, verdict.overall_score, verdict.recommendation
        ));
    }

    fn done(&self, _result: &CampaignResult) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    if let Err(e) = validate_api_keys(&config) {
        println!("# warning: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_campaign_fields() {
        let cli = Cli::try_parse_from([
            "brandcast",
            "run",
            "--brand",
            "Acme Solar",
            "--industry",
            "energy",
            "--audience",
            "homeowners",
            "--topic",
            "rooftop solar",
        ])
        .unwrap();

        match cli.command {
            Command::Run { tone, out, .. } => {
                assert_eq!(tone, DEFAULT_TONE);
                assert!(out.is_none());
            }
            _ => panic!("expected run"),
        }

        assert!(Cli::try_parse_from(["brandcast", "run", "--brand", "Acme"]).is_err());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let parsed = Cli::try_parse_from([
            "brandcast",
            "run",
            "--brand",
            "",
            "--industry",
            "energy",
            "--audience",
            "homeowners",
            "--topic",
            "solar",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn repurpose_parses_repeated_channels() {
        let cli = Cli::try_parse_from([
            "brandcast",
            "repurpose",
            "--file",
            "post.md",
            "-c",
            "newsletter",
            "--channel",
            "LinkedIn",
        ])
        .unwrap();

        match cli.command {
            Command::Repurpose { file, channels, out } => {
                assert_eq!(file, PathBuf::from("post.md"));
                assert_eq!(channels, vec![Channel::Newsletter, Channel::LinkedIn]);
                assert!(out.is_none());
            }
            _ => panic!("expected repurpose"),
        }

        assert!(
            Cli::try_parse_from(["brandcast", "repurpose", "--file", "a.md", "-c", "fax"]).is_err()
        );
        assert!(Cli::try_parse_from(["brandcast", "repurpose"]).is_err());
    }

    #[test]
    fn summary_separates_best_score_from_last_verdict() {
        let outcome = ChannelOutcome {
            channel: Channel::Newsletter,
            content: "second draft".into(),
            selected_pass: Some(2),
            verdict: QualityVerdict {
                channel: Channel::Newsletter,
                rubric: Default::default(),
                overall_score: 5.0,
                recommendation: brandcast_shared::Recommendation::Revise,
                feedback: String::new(),
                approved: false,
                evaluation: String::new(),
                fallback: false,
            },
            attempts: vec![
                brandcast_shared::Attempt { pass: 1, content: "first draft".into(), score: 6.0 },
                brandcast_shared::Attempt { pass: 2, content: "second draft".into(), score: 7.0 },
                brandcast_shared::Attempt { pass: 3, content: "third draft".into(), score: 5.0 },
            ],
        };

        let summary = outcome_summary(&outcome);
        assert!(summary.contains("Best score:   7.0/10 (pass 2)"));
        assert!(summary.contains("Last verdict: REVISE 5.0/10, not approved"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["brandcast", "config", "show", "-vv", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }
}
