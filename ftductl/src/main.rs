//! ftDuino CLI
//!
//! Command-line interface for ftDuino boards attached over USB.

use anyhow::Result;
use clap::Parser;
use ftduino_core::{default_config_path, ProtocolRevision};
use ftduino_hardware::Discovery;
use ftductl::cli::{
    connect, generate_completion, handle_config, handle_device, handle_find, handle_list, Cli,
    Commands, OutputFormat,
};
use ftductl::config::CliConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // Build configuration using priority chain: defaults → file → env → CLI args
    let config = match build_config(&cli, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let output_format = OutputFormat::from_config(&config.output_format);
    let verbose = config.verbose;

    init_tracing(verbose);
    tracing::debug!("Configuration file: {}", config_path.display());
    tracing::debug!("Effective configuration: {:?}", config);

    let result = match cli.command {
        Commands::List => handle_list(&Discovery::with_link(config.link), &output_format),
        Commands::Find { identifier } => handle_find(
            &Discovery::with_link(config.link),
            &identifier,
            &output_format,
        ),
        Commands::Config { command } => {
            handle_config(command, &config, &config_path, &output_format)
        }
        Commands::Completion { shell } => {
            generate_completion(shell);
            Ok(())
        }
        Commands::Device(command) => connect(&config).and_then(|mut ftd| {
            let result = handle_device(&mut ftd, command, &output_format);
            ftd.close();
            result
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn build_config(cli: &Cli, config_path: &std::path::Path) -> Result<CliConfig> {
    let mut builder = CliConfig::builder()
        .with_config_file((!cli.no_config).then_some(config_path))?
        .with_env_overrides();

    if let Some(ref device) = cli.device {
        builder = builder.with_device(device)?;
    }
    if let Some(ref identifier) = cli.identifier {
        builder = builder.with_identifier(identifier)?;
    }
    if let Some(format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }
    if cli.legacy_motor {
        builder = builder.with_protocol(ProtocolRevision::Legacy);
    }

    builder.build()
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
