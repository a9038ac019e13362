mod cli;

use mediaprobe::batch::{self, OutputStyle};
use mediaprobe::config;
use mediaprobe_av::{check_tool, resolve_ffprobe, ProbeClient, ProbeOptions};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ProbeArgs};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaprobe=debug,mediaprobe_av=debug,mediaprobe_parser=debug,mediaprobe_core=debug"
                .to_string()
        } else {
            "mediaprobe=info,mediaprobe_av=warn,mediaprobe_parser=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_files(args, cli.config.as_deref()))
        }
        Commands::CheckTools { ffprobe } => check_tools(ffprobe.as_deref(), cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaprobe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn probe_files(args: ProbeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    args.apply_to(&mut config.probe);
    config::validate_config(&config)?;

    let client = ProbeClient::new(config.probe);
    tracing::debug!(
        "Probing {} file(s) with {} (format: {}, mode: {:?}, max concurrent: {})",
        args.files.len(),
        client.ffprobe_path().display(),
        client.config().output_format,
        client.config().mode,
        client.config().max_concurrent
    );

    // Ctrl+C terminates in-flight probes; the rest fail fast as cancelled.
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling probes");
            ctrl_c_cancel.cancel();
        }
    });

    let options = ProbeOptions::new().with_cancel(cancel);
    let report = batch::probe_files(&client, &args.files, &options).await;

    let style = if args.summary {
        OutputStyle::Summary
    } else {
        OutputStyle::Json
    };

    for (path, result) in &report.results {
        match result {
            Ok(probe) => println!("{}", batch::render(path, probe, style)?),
            Err(e) => eprintln!("{}: {}", path.display(), e),
        }
    }

    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed to probe",
            report.failed(),
            report.total()
        );
    }

    Ok(())
}

fn check_tools(ffprobe: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let program = resolve_ffprobe(ffprobe.or(config.probe.ffprobe_path.as_deref()));
    let tool = check_tool(&program);

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);

    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }

    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }

    println!();
    println!();

    if tool.available {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("{} is not available; install it or set FFPROBE_PATH", program.display())
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_probe_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_probe_config(&config);
        }
    }

    Ok(())
}

fn print_probe_config(config: &config::Config) {
    let probe = &config.probe;
    match &probe.ffprobe_path {
        Some(path) => println!("  ffprobe: {}", path.display()),
        None => println!("  ffprobe: (search PATH)"),
    }
    println!("  Output format: {}", probe.output_format);
    println!("  Mode: {:?}", probe.mode);
    println!("  Max concurrent: {}", probe.max_concurrent);
    println!("  Timeout: {}s", probe.timeout_secs);
}
