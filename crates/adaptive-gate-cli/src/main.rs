// crates/adaptive-gate-cli/src/main.rs
// ============================================================================
// Module: Adaptive Gate CLI Entry Point
// Description: Command dispatcher for decisions, assignments, and config checks.
// Purpose: Provide a bounded, scriptable front end to the decision engine.
// Dependencies: clap, adaptive-gate-cli, adaptive-gate-config, adaptive-gate-core
// ============================================================================

//! ## Overview
//! The adaptive-gate CLI loads `adaptive-gate.toml`, wires model sources and
//! the audit sink, and runs one operation per invocation. Results are written
//! to stdout as canonical JSON; errors go to stderr with a failing exit code.
//! Context inputs are untrusted and size-limited.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use adaptive_gate_cli::t;
use adaptive_gate_cli::wiring::build_engine;
use adaptive_gate_config::AdaptiveGateConfig;
use adaptive_gate_core::DecisionContext;
use adaptive_gate_core::assign_variant;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a context document in bytes.
const MAX_CONTEXT_BYTES: usize = 1024 * 1024;
/// Path argument that selects stdin.
const STDIN_PATH: &str = "-";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "adaptive-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a decision context and print the decision.
    Decide(DecideCommand),
    /// Assign a context to an experiment variant.
    Assign(AssignCommand),
    /// Model source utilities.
    Model {
        /// Selected model subcommand.
        #[command(subcommand)]
        command: ModelCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Model subcommands.
#[derive(Subcommand, Debug)]
enum ModelCommand {
    /// Resolve the model through the configured sources.
    Resolve(ConfigArgs),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an adaptive-gate configuration file.
    Validate(ConfigArgs),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to adaptive-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Decision context input, inline or from a file.
#[derive(Args, Debug)]
struct ContextArgs {
    /// Inline context JSON object.
    #[arg(long, value_name = "JSON", conflicts_with = "context_file")]
    context: Option<String>,
    /// Context JSON file (`-` reads stdin).
    #[arg(long, value_name = "PATH")]
    context_file: Option<PathBuf>,
}

/// Arguments for `decide`.
#[derive(Args, Debug)]
struct DecideCommand {
    /// Config path arguments.
    #[command(flatten)]
    config: ConfigArgs,
    /// Context input arguments.
    #[command(flatten)]
    input: ContextArgs,
    /// Exit with status 2 when the decision rejects.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_on_reject: bool,
}

/// Arguments for `assign`.
#[derive(Args, Debug)]
struct AssignCommand {
    /// Config path arguments.
    #[command(flatten)]
    config: ConfigArgs,
    /// Context input arguments.
    #[command(flatten)]
    input: ContextArgs,
    /// Split specification overriding the configured one.
    #[arg(long, value_name = "SPEC")]
    split: Option<String>,
    /// Sticky field overriding the configured one (empty disables).
    #[arg(long, value_name = "FIELD")]
    sticky_field: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Exit status for a completed decision that rejected.
const REJECTED_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Decide(command) => command_decide(&command),
        Commands::Assign(command) => command_assign(&command),
        Commands::Model {
            command,
        } => match command {
            ModelCommand::Resolve(command) => command_model_resolve(&command),
        },
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
    }
}

/// Prints CLI help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `decide` command.
fn command_decide(command: &DecideCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let context = read_context(&command.input)?;
    let wired = build_engine(&config)
        .map_err(|err| CliError::new(t!("engine.build_failed", error = err)))?;
    let decision = wired
        .engine
        .make_decision(&context)
        .map_err(|err| CliError::new(t!("decide.failed", error = err)))?;
    write_canonical_json(&decision)?;
    if command.fail_on_reject && !decision.can_proceed {
        return Ok(ExitCode::from(REJECTED_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `assign` command.
fn command_assign(command: &AssignCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let context = read_context(&command.input)?;
    let mut settings = config.experiment.settings();
    if let Some(split) = &command.split {
        settings.split.clone_from(split);
    }
    if let Some(field) = &command.sticky_field {
        let field = field.trim();
        settings.sticky_field = (!field.is_empty()).then(|| field.to_string());
    }
    let assignment = assign_variant(&context, &settings.split, settings.sticky_field.as_deref())
        .map_err(|err| CliError::new(t!("assign.failed", error = err)))?;
    write_canonical_json(&assignment)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `model resolve` command.
fn command_model_resolve(command: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(command)?;
    let wired = build_engine(&config)
        .map_err(|err| CliError::new(t!("engine.build_failed", error = err)))?;
    let handle = wired
        .engine
        .reload_model()
        .map_err(|err| CliError::new(t!("model.resolve.failed", error = err)))?;
    let message = match handle {
        Some(handle) => {
            t!("model.resolve.ok", version = handle.version().as_str(), source = handle.source())
        }
        None => t!("model.resolve.none"),
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(command)?;
    write_stdout_line(&t!(
        "config.validate.ok",
        mode = config.engine.mode.as_str(),
        namespace = config.engine.namespace.trim(),
        goals = config.goals.len(),
        constraints = config.constraints.len(),
        risk_factors = config.risk_factors.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(args: &ConfigArgs) -> CliResult<AdaptiveGateConfig> {
    AdaptiveGateConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Errors returned by bounded reads.
#[derive(Debug)]
enum ReadLimitError {
    /// I/O failure.
    Io(std::io::Error),
    /// Input size exceeds the configured limit.
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads from a reader while enforcing a hard size limit.
fn read_limited(reader: impl Read, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size: 0,
        limit: max_bytes,
    })?;
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads a file (or stdin for `-`) while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    if path.as_os_str() == STDIN_PATH {
        return read_limited(std::io::stdin().lock(), max_bytes);
    }
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    if u64::try_from(max_bytes).is_ok_and(|limit| size > limit) {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    read_limited(file, max_bytes)
}

/// Reads the decision context from the inline flag or a file.
fn read_context(args: &ContextArgs) -> CliResult<DecisionContext> {
    let bytes = match (&args.context, &args.context_file) {
        (Some(inline), _) => {
            if inline.len() > MAX_CONTEXT_BYTES {
                return Err(CliError::new(t!(
                    "context.read_too_large",
                    path = "--context",
                    size = inline.len(),
                    limit = MAX_CONTEXT_BYTES
                )));
            }
            inline.as_bytes().to_vec()
        }
        (None, Some(path)) => {
            read_bytes_with_limit(path, MAX_CONTEXT_BYTES).map_err(|err| match err {
                ReadLimitError::Io(err) => CliError::new(t!(
                    "context.read_failed",
                    path = path.display(),
                    error = err
                )),
                ReadLimitError::TooLarge {
                    size,
                    limit,
                } => CliError::new(t!(
                    "context.read_too_large",
                    path = path.display(),
                    size = size,
                    limit = limit
                )),
            })?
        }
        (None, None) => return Err(CliError::new(t!("context.missing"))),
    };
    parse_context(&bytes)
}

/// Parses context bytes into a [`DecisionContext`].
fn parse_context(bytes: &[u8]) -> CliResult<DecisionContext> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| CliError::new(t!("context.parse_failed", error = err)))?;
    DecisionContext::from_value(value).ok_or_else(|| CliError::new(t!("context.not_object")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes canonical JSON to stdout followed by a newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
