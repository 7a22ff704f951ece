/// Command-line rescue of a failing floppy disk

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use floppyrescue::io::AUTO_SOURCE;
use floppyrescue::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "flrescue",
    version,
    about = "Multi-pass raw rescue of failing floppy disks"
)]
struct Cli {
    /// Source device or image file (`auto` picks the platform default)
    #[arg(long, short, default_value = AUTO_SOURCE)]
    source: String,

    /// Number of full read passes
    #[arg(long, short, default_value_t = 2)]
    passes: usize,

    /// Archive comment; prompted for when omitted
    #[arg(long, short)]
    comment: Option<String>,

    /// Minutes to wait after the previous archive before scanning again (0 disables)
    #[arg(long, default_value_t = 3)]
    cooldown_minutes: u64,

    /// Directory archives are written to
    #[arg(long, short, default_value = "BAK")]
    output: PathBuf,

    /// List floppy-like devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    /// Disable ANSI colors in the health map
    #[arg(long)]
    no_color: bool,
}

fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Human => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to initialize logger: {err}"))?,
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to initialize JSON logger: {err}"))?,
    }
    Ok(())
}

/// Get the path to the comment history file
fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".flrescue_history");
        p
    })
}

/// Ask for the archive comment
///
/// Ctrl+C or Ctrl+D at the prompt leave the comment empty.
fn prompt_comment() -> Result<String> {
    let mut rl = DefaultEditor::new().context("failed to create line editor")?;
    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let comment = match rl.readline("Enter comment for archive: ") {
        Ok(line) => line.trim().to_string(),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
        Err(err) => return Err(err).context("failed to read comment"),
    };

    if !comment.is_empty() {
        let _ = rl.add_history_entry(comment.as_str());
        if let Some(history_path) = history_path() {
            let _ = rl.save_history(&history_path);
        }
    }
    Ok(comment)
}

fn list_devices(resolver: &dyn SourceResolver) -> Result<()> {
    let devices = resolver.list_devices()?;
    if devices.is_empty() {
        println!("No floppy-like devices found.");
        return Ok(());
    }

    println!("{:<24} {:>12} {:>6}", "Device", "Size", "FAT12");
    println!("{}", "-".repeat(44));
    for device in devices {
        let size = device
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:<24} {:>12} {:>6}",
            device.path.display(),
            size,
            if device.fat12 { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn run(cli: Cli, interrupt: Arc<AtomicBool>) -> Result<()> {
    let resolver = platform_resolver();
    if cli.list_devices {
        return list_devices(resolver.as_ref());
    }

    let config = RescueConfig::new()
        .with_pass_count(cli.passes)
        .with_output_dir(&cli.output)
        .with_cooldown(Duration::from_secs(cli.cooldown_minutes.saturating_mul(60)));
    let rescue = Rescue::new(config)?.with_interrupt(Arc::clone(&interrupt));

    let source = resolver.resolve(Some(cli.source.as_str()))?;

    match rescue.cooldown_gate().wait(&interrupt, &mut std::io::stdout()) {
        CooldownOutcome::NotRequired => {}
        CooldownOutcome::Waited(waited) => info!(waited_secs = waited.as_secs(), "cooldown finished"),
        CooldownOutcome::Skipped { remaining } => {
            info!(remaining_secs = remaining.as_secs(), "cooldown skipped")
        }
    }

    let comment = match cli.comment {
        Some(comment) => comment,
        None => prompt_comment()?,
    };

    println!(
        "[Multi-Pass Rescue] Target: {} | Total Passes: {}",
        source.display(),
        rescue.config().pass_count
    );
    println!("{}", "-".repeat(85));

    let outcome = rescue.run(&source, &comment, &mut ConsoleProgress::stdout())?;
    map::print_dashboard(&outcome, !cli.no_color).context("failed to print summary")?;
    Ok(())
}

/// Exit code for a failed run
fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(err) = err.downcast_ref::<RescueError>() else {
        return 1;
    };
    match err {
        e if e.is_fatal_open() => 2,
        RescueError::Hardware { .. } => 3,
        e if e.is_fatal_archival() => 4,
        RescueError::Unsupported(_) => 5,
        RescueError::Interrupted { .. } => 130,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_format) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupt);
    if let Err(err) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        error!(error = %err, "could not install Ctrl+C handler");
    }

    match run(cli, interrupt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!();
            eprintln!("Error: {err:#}");
            if let Some(rescue_err) = err.downcast_ref::<RescueError>() {
                for path in rescue_err.intermediates() {
                    eprintln!("  kept for manual recovery: {}", path.display());
                }
                if matches!(rescue_err, RescueError::Interrupted { .. }) {
                    eprintln!("No archive was written.");
                }
            }
            ExitCode::from(exit_code(&err))
        }
    }
}
