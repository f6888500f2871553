mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "garage",
    version,
    about = "Tiered parking garage with one-step compaction"
)]
struct Cli {
    /// Path to the garage configuration file (defaults to ./garage.toml when present).
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute a session script (one command per line) from a file or stdin.
    Run {
        /// Script file; reads stdin when omitted or "-".
        script: Option<PathBuf>,
        /// Override the configured number of small spots.
        #[arg(long)]
        small: Option<u32>,
        /// Override the configured number of medium spots.
        #[arg(long)]
        medium: Option<u32>,
        /// Override the configured number of large spots.
        #[arg(long)]
        large: Option<u32>,
    },
    /// Quote the fee for a stay without touching any garage state.
    Fee {
        /// Vehicle size: small, medium or large.
        size: String,
        /// Elapsed hours.
        #[arg(allow_negative_numbers = true)]
        hours: f64,
    },
    /// Validate the configuration file and print the effective settings.
    CheckConfig,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GARAGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run {
            script,
            small,
            medium,
            large,
        } => commands::run::run(
            config_path,
            script.as_deref(),
            commands::run::CapacityOverride {
                small,
                medium,
                large,
            },
            json_output,
        ),
        Commands::Fee { size, hours } => commands::fee::run(config_path, &size, hours, json_output),
        Commands::CheckConfig => commands::check_config::run(config_path, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
