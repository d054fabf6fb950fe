//! CLI application entry point and configuration.
//!
//! This module provides the main CLI application logic, including argument parsing,
//! configuration loading, and command dispatch.

use crate::commands::{AnalyzeArgs, Cli, Commands, InitConfigArgs, OutputFormat};
use crate::error::{CliError, Result};
use chatlens_analysis::features::WEEKDAY_NAMES;
use chatlens_analysis::nlp::StopWords;
use chatlens_analysis::pipeline::load_sentiment_model_or_degraded;
use chatlens_analysis::{Pipeline, RunReport};
use chatlens_core::error::IntoCoreError;
use chatlens_core::ChatlensConfig;
use clap::Parser;
use std::fmt::Write as _;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main CLI application.
#[derive(Debug)]
pub struct App {
    /// Loaded configuration, before per-command overrides.
    pub config: ChatlensConfig,
    /// Parsed CLI arguments.
    pub cli: Cli,
}

impl App {
    /// Create a new application instance from command line arguments.
    pub fn new() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Create an application instance from already parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let config = Self::load_config(&cli)?;
        Ok(Self { config, cli })
    }

    /// Load configuration from file, or defaults when none is given.
    fn load_config(cli: &Cli) -> Result<ChatlensConfig> {
        let Some(config_path) = &cli.config else {
            return Ok(ChatlensConfig::default());
        };
        if !config_path.exists() {
            return Err(CliError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }
        Ok(ChatlensConfig::load(config_path)?)
    }

    /// Run the application.
    pub fn run(self) -> Result<()> {
        self.setup_logging();

        match &self.cli.command {
            Commands::Analyze(args) => self.handle_analyze(args),
            Commands::InitConfig(args) => self.handle_init_config(args),
        }
    }

    /// Set up logging based on verbosity level.
    ///
    /// `RUST_LOG` wins over both the flag and the configured level.
    fn setup_logging(&self) {
        let level = match self.cli.verbose {
            0 => self.config.logging.level.as_directive(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .ok(); // Ignore errors if a subscriber is already installed
    }

    fn handle_analyze(&self, args: &AnalyzeArgs) -> Result<()> {
        let config = effective_config(&self.config, args)?;

        let stopwords = match &config.lexical.stopwords_path {
            Some(path) => StopWords::from_file(path)?,
            None => StopWords::spanish(),
        };
        debug!("using {} stop words", stopwords.len());

        let transcript = std::fs::read_to_string(&args.transcript)
            .with_context(&format!("reading {}", args.transcript.display()))?;

        let model = load_sentiment_model_or_degraded(&config);
        let mut pipeline = Pipeline::with_default_segmenter(config, stopwords, model)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(pipeline.run(&transcript));
        info!(
            "analyzed {} ({} records)",
            args.transcript.display(),
            report.parse.records
        );

        let rendered = match args.format {
            OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            OutputFormat::Text => render_text(&report),
        };
        println!("{}", rendered);
        Ok(())
    }

    fn handle_init_config(&self, args: &InitConfigArgs) -> Result<()> {
        if args.output.exists() && !args.force {
            return Err(CliError::FileSystem(format!(
                "{} already exists (use --force to overwrite)",
                args.output.display()
            )));
        }
        self.config.save(&args.output)?;
        println!("wrote {}", args.output.display());
        Ok(())
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn effective_config(base: &ChatlensConfig, args: &AnalyzeArgs) -> Result<ChatlensConfig> {
    let mut config = base.clone();

    if let Some(path) = &args.stopwords {
        config.lexical.stopwords_path = Some(path.clone());
    }
    if let Some(dir) = &args.model_dir {
        config.sentiment.model_dir = dir.clone();
    }
    if let Some(top_n) = args.top_n {
        if top_n == 0 {
            return Err(CliError::Argument("--top-n must be at least 1".to_string()));
        }
        config.lexical.top_n = top_n;
        config.emoji.top_n = top_n;
    }
    if args.keep_first_record {
        config.parser.skip_first_record = false;
    }
    if let Some(workers) = args.workers {
        config.sentiment.max_workers = workers;
    }
    if let Some(secs) = args.timeout_secs {
        config.sentiment.run_timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Render a run report as plain-text tables.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let parse = &report.parse;
    let summary = &report.summary;

    let _ = writeln!(
        out,
        "Parsed {} records from {} lines ({} dropped, {} media omitted{})",
        parse.records,
        parse.total_lines,
        parse.dropped_lines,
        parse.media_filtered,
        if parse.header_skipped {
            ", header skipped"
        } else {
            ""
        }
    );
    let _ = writeln!(
        out,
        "Classified {} distinct emoji with {} model calls ({} degraded)",
        report.classifier.distinct_emoji,
        report.classifier.invocations,
        report.classifier.degraded.len()
    );

    for stats in &summary.per_sender_word_stats {
        let _ = writeln!(out, "\nTop words - {}", stats.sender);
        for entry in &stats.words {
            let _ = writeln!(out, "  {:<20} {}", entry.word, entry.count);
        }
    }

    for stats in &summary.per_sender_emoji_stats {
        let _ = writeln!(out, "\nTop emoji - {}", stats.sender);
        for entry in &stats.emoji {
            let _ = writeln!(out, "  {}  {}", entry.emoji, entry.count);
        }
    }

    let _ = writeln!(out, "\nEmoji sentiment totals");
    for totals in &summary.emoji_sentiment_totals {
        let _ = writeln!(
            out,
            "  {:<20} neg {:>8.2}  neu {:>8.2}  pos {:>8.2}",
            totals.sender, totals.negative, totals.neutral, totals.positive
        );
    }

    let _ = writeln!(out, "\nUnique words per sender");
    for entry in &summary.lexicon {
        let _ = writeln!(out, "  {:<20} {}", entry.sender, entry.unique_words);
    }

    let _ = writeln!(out, "\nMessages by weekday and season");
    for cell in &summary.activity.weekly {
        let day = WEEKDAY_NAMES
            .get(cell.day_of_week as usize)
            .copied()
            .unwrap_or("?");
        let _ = writeln!(out, "  {:<10} {:<7} {}", day, cell.season, cell.messages);
    }

    out
}

/// Parse command line arguments and run the application.
pub fn run() -> Result<()> {
    let app = App::new()?;
    app.run()
}
