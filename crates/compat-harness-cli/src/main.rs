// crates/compat-harness-cli/src/main.rs
// ============================================================================
// Module: Compat Harness CLI Entry Point
// Description: Command dispatcher for module planning and dump inspection.
// Purpose: Provide a safe, offline CLI over the harness libraries.
// Dependencies: clap, compat-harness-config, compat-harness-core,
// compat-harness-wm, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The compat-harness CLI loads module repositories, prints shard plans and
//! device assignments, validates configuration, and inspects window-manager
//! dump files. Every command is synchronous file work; errors surface as one
//! stderr line and a failure exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use compat_harness_config::ConfigError;
use compat_harness_config::HarnessConfig;
use compat_harness_config::config_toml_example;
use compat_harness_core::ModuleRepo;
use compat_harness_core::RepoError;
use compat_harness_core::ShardError;
use compat_harness_core::ShardPlan;
use compat_harness_core::TestModule;
use compat_harness_wm::ComputedState;
use compat_harness_wm::FileDumpSource;
use compat_harness_wm::RetryPolicy;
use compat_harness_wm::WmError;
use compat_harness_wm::compute_state;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Command Tree
// ============================================================================

/// Top-level argument parser.
#[derive(Debug, Parser)]
#[command(name = "compat-harness", version, about = "Module planning and dump inspection")]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Module repository and shard planning commands.
    Modules {
        /// Selected modules subcommand.
        #[command(subcommand)]
        command: ModulesCommand,
    },
    /// Window-manager dump commands.
    Wm {
        /// Selected wm subcommand.
        #[command(subcommand)]
        command: WmCommand,
    },
    /// Configuration commands.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Module repository subcommands.
#[derive(Debug, Subcommand)]
enum ModulesCommand {
    /// Loads the repository and prints the surviving modules.
    List(ConfigArgs),
    /// Prints the runtime-balanced shard plan.
    Shard(ShardArgs),
    /// Prints per-device assignments including token modules.
    Assign(ConfigArgs),
}

/// Window-manager subcommands.
#[derive(Debug, Subcommand)]
enum WmCommand {
    /// Decodes a dump file and prints a snapshot report.
    Inspect(InspectArgs),
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Loads and validates the configuration.
    Validate(ConfigArgs),
    /// Prints the canonical example configuration.
    Example,
}

/// Shared config-path argument.
#[derive(Debug, Args)]
struct ConfigArgs {
    /// Path to compat-harness.toml (defaults to env/cwd resolution).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Arguments for `modules shard`.
#[derive(Debug, Args)]
struct ShardArgs {
    /// Shared config-path argument.
    #[command(flatten)]
    config: ConfigArgs,
    /// Overrides the configured shard count.
    #[arg(long)]
    shards: Option<usize>,
    /// Prints only the shard with this index.
    #[arg(long)]
    index: Option<usize>,
}

/// Arguments for `wm inspect`.
#[derive(Debug, Args)]
struct InspectArgs {
    /// Path to the dump file.
    #[arg(long)]
    dump: PathBuf,
    /// Prints the full snapshot instead of the summary report.
    #[arg(long)]
    full: bool,
    /// Optional config supplying dump size and retry limits.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Process entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // A failing stderr write leaves no channel to report on.
            let _ = write_stderr_line(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Parses arguments and dispatches the selected command.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Modules { command } => command_modules(command),
        Command::Wm { command } => command_wm(command),
        Command::Config { command } => command_config(command),
    }
}

// ============================================================================
// SECTION: Module Commands
// ============================================================================

/// Dispatches `modules` subcommands.
fn command_modules(command: ModulesCommand) -> CliResult<ExitCode> {
    match command {
        ModulesCommand::List(args) => {
            let (_, repo) = load_repo(args.config.as_deref())?;
            let report = ModuleListReport {
                modules: repo.modules().to_vec(),
                token_modules: repo.token_modules().to_vec(),
            };
            write_json(&report)?;
        }
        ModulesCommand::Shard(args) => {
            let (config, repo) = load_repo(args.config.config.as_deref())?;
            let shard_count = args.shards.unwrap_or(config.sharding.shard_count);
            let plan = ShardPlan::partition(repo.modules(), shard_count)?;
            let index = args.index.or(config.sharding.local_shard_index);
            match index {
                Some(index) => {
                    let Some(shard) = plan.shards.get(index) else {
                        return Err(CliError::new(format!(
                            "shard index {index} is out of range for {} shards",
                            plan.shard_count()
                        )));
                    };
                    write_json(shard)?;
                }
                None => write_json(&plan)?,
            }
        }
        ModulesCommand::Assign(args) => {
            let (config, repo) = load_repo(args.config.as_deref())?;
            let devices = config.device_slots();
            let plan = ShardPlan::partition(repo.modules(), config.sharding.shard_count)?;
            let assignments = plan.assign(repo.token_modules(), &devices)?;
            write_json(&assignments)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads the configuration and the module repository it describes.
fn load_repo(path: Option<&std::path::Path>) -> CliResult<(HarnessConfig, ModuleRepo)> {
    let config = HarnessConfig::load(path)?;
    let request = config.repo_request()?;
    let repo = ModuleRepo::load(&request)?;
    Ok((config, repo))
}

/// JSON report for `modules list`.
#[derive(Debug, Serialize)]
struct ModuleListReport {
    /// Plain modules in load order.
    modules: Vec<TestModule>,
    /// Token-requiring modules in load order.
    token_modules: Vec<TestModule>,
}

// ============================================================================
// SECTION: WM Commands
// ============================================================================

/// Dispatches `wm` subcommands.
fn command_wm(command: WmCommand) -> CliResult<ExitCode> {
    match command {
        WmCommand::Inspect(args) => {
            let policy = match args.config.as_deref() {
                Some(path) => {
                    let config = HarnessConfig::load(Some(path))?;
                    RetryPolicy {
                        retry_limit: config.wm.retry_limit,
                        retry_delay: Duration::from_millis(config.wm.retry_delay_ms),
                        max_dump_bytes: config.wm.max_dump_bytes,
                    }
                }
                // A file never turns valid on its own; read it once.
                None => RetryPolicy {
                    retry_limit: 1,
                    retry_delay: Duration::ZERO,
                    ..RetryPolicy::default()
                },
            };
            let mut source = FileDumpSource::new(args.dump);
            let computed = compute_state(&mut source, &policy)?;
            if args.full {
                write_json(&computed.state)?;
            } else {
                write_json(&snapshot_report(&computed))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// JSON summary for `wm inspect`.
#[derive(Debug, Serialize)]
struct SnapshotReport {
    /// Whether the snapshot is complete enough for assertions.
    valid: bool,
    /// Number of dump attempts performed.
    attempts: u32,
    /// Number of displays in the snapshot.
    displays: usize,
    /// Title of the focused window.
    focused_window: Option<String>,
    /// Component name of the focused application.
    focused_app: Option<String>,
    /// Title of the input-method window.
    input_method_window: Option<String>,
    /// Current rotation (0-3).
    rotation: i32,
    /// Titles of shown-and-visible windows, in z-order.
    visible_windows: Vec<String>,
}

/// Builds the summary report from a computed snapshot.
fn snapshot_report(computed: &ComputedState) -> SnapshotReport {
    SnapshotReport {
        valid: computed.is_valid(),
        attempts: computed.attempts,
        displays: computed.state.displays.len(),
        focused_window: computed.state.focused_window.clone(),
        focused_app: computed.state.focused_app.clone(),
        input_method_window: computed.state.input_method_window.clone(),
        rotation: computed.state.rotation,
        visible_windows: computed
            .state
            .visible_windows()
            .into_iter()
            .map(|window| window.title.clone())
            .collect(),
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches `config` subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            HarnessConfig::load(args.config.as_deref())?;
            write_stdout_line("config ok")?;
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Result alias for CLI command handlers.
type CliResult<T> = Result<T, CliError>;

/// Terminal error carrying the single line printed to stderr.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Message printed to stderr.
    message: String,
}

impl CliError {
    /// Creates a new CLI error.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ShardError> for CliError {
    fn from(err: ShardError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<WmError> for CliError {
    fn from(err: WmError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("output error: {err}"))
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("cannot render json: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(())
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
