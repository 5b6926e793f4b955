use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use vete::config::{DelayMode, DisplayConfig, RunConfig, DEFAULT_ROOT};
use vete::store::{retry, JobStore, RetryOutcome};
use vete::worker::CommandLauncher;
use vete::Vete;

#[derive(Parser, Debug)]
#[command(name = "vete")]
#[command(about = "Spawn processes to get work done")]
#[command(override_usage = "vete [options] [-- <command> [args...]]")]
#[command(disable_version_flag = true)]
struct Args {
    /// Progress bar width, in characters
    #[arg(short = 'b', long = "bar", value_name = "width", default_value_t = 20)]
    bar: usize,

    /// Character to use for progress bar
    #[arg(short = 'c', long = "char", value_name = "character", default_value = "•")]
    glyph: String,

    /// Delay mode (rand, task, numeric)
    #[arg(short = 'd', long, value_name = "mode")]
    delay: Option<String>,

    /// Remove directory used for job processing and quit
    #[arg(short = 'r', long)]
    reset: bool,

    /// Show version number
    #[arg(short = 'v', long = "version", short_alias = 'V')]
    show_version: bool,

    /// Set the number of workers (default is 1)
    #[arg(short = 'w', long, value_name = "count", default_value_t = 1)]
    workers: usize,

    /// Directory used for job processing
    #[arg(long, value_name = "dir", default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Seed jobs 1..=count into a fresh store when there is nothing to retry
    #[arg(short = 's', long, value_name = "count")]
    seed: Option<usize>,

    /// Summary output format
    #[arg(short = 'o', long, value_name = "format", default_value = "table")]
    output: OutputFormat,

    /// Command to run for each job; the job file path is appended
    #[arg(last = true, value_name = "command")]
    command: Vec<String>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn build_config(args: &Args) -> vete::Result<RunConfig> {
    let delay = match &args.delay {
        Some(mode) => DelayMode::parse(mode)?,
        None => DelayMode::None,
    };
    let display = DisplayConfig {
        bar_width: args.bar,
        ..DisplayConfig::default()
    }
    .with_glyph_str(&args.glyph)?;

    let config = RunConfig::new(&args.root, args.workers)
        .with_display(display)
        .with_delay(delay);
    config.validate()?;
    Ok(config)
}

/// Requeue failed jobs; with nothing to retry, optionally start over with
/// `seed` fresh jobs.
fn prepare_store(store: &JobStore, seed: Option<usize>) -> vete::Result<()> {
    match retry(store)? {
        RetryOutcome::Requeued(jobs) => {
            tracing::info!(count = jobs.len(), "Retrying failed jobs");
        }
        RetryOutcome::NothingToRetry => match seed {
            Some(count) => {
                store.initialize()?;
                for i in 1..=count {
                    store.enqueue(&i.to_string(), None)?;
                }
                tracing::info!(count, "Seeded jobs");
            }
            None if !store.exists() => store.initialize()?,
            None => {}
        },
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.show_version {
        println!("vete {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VETE_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => Args::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    if args.reset {
        JobStore::new(&config.root).reset()?;
        return Ok(());
    }

    let seed = args.seed;
    let mut vete = Vete::new(config)
        .setup(move |store| prepare_store(store, seed))
        .report(matches!(args.output, OutputFormat::Table));

    vete = match args.command.split_first() {
        Some((program, rest)) => vete.launcher(CommandLauncher::new(program, rest)),
        None => vete.perform(|_job| Ok(())),
    };

    let summary = vete.run()?;

    if let OutputFormat::Json = args.output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
