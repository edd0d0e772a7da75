//! thermocap - capture thermal frames and publish their statistics
//!
//! Reads camera credentials from the environment, captures a bounded number
//! of frames, then summarizes every measurement file the capture produced.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use tracing::{debug, error, info};

use thermocap::config::loader::CONFIG_ENV_VAR;
use thermocap::logging::{init_logging, DEBUG_ENV_VAR};
use thermocap::{handle_startup_error, Config, ConfigLoader, Credentials, RunReport};

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Camera hostname or IP
    ip: Option<String>,
    /// Frame target override
    frames: Option<u64>,
    /// Hard timeout override in seconds
    timeout_secs: Option<u64>,
    /// Data directory override
    data_dir: Option<PathBuf>,
    /// Only run the measurement pipeline
    skip_capture: bool,
    /// Enable debug logging
    debug: bool,
    help: bool,
    version: bool,
}

impl AppArgs {
    /// Parse command line arguments (without the program name)
    fn parse_from<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut app_args = AppArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    app_args.config_path = Some(PathBuf::from(value(&mut args, &arg)?));
                }
                "--ip" => {
                    app_args.ip = Some(value(&mut args, &arg)?);
                }
                "--frames" | "-n" => {
                    let raw = value(&mut args, &arg)?;
                    app_args.frames =
                        Some(raw.parse().with_context(|| format!("Invalid frame count '{}'", raw))?);
                }
                "--timeout" | "-t" => {
                    let raw = value(&mut args, &arg)?;
                    app_args.timeout_secs =
                        Some(raw.parse().with_context(|| format!("Invalid timeout '{}'", raw))?);
                }
                "--data-dir" => {
                    app_args.data_dir = Some(PathBuf::from(value(&mut args, &arg)?));
                }
                "--skip-capture" => app_args.skip_capture = true,
                "--debug" | "-d" => app_args.debug = true,
                "--help" | "-h" => app_args.help = true,
                "--version" | "-v" => app_args.version = true,
                other => anyhow::bail!("Unknown option: {}", other),
            }
        }

        Ok(app_args)
    }

    /// Apply command line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(ip) = &self.ip {
            config.camera.host = ip.clone();
        }
        if let Some(frames) = self.frames {
            config.capture.frame_target = frames;
        }
        if let Some(timeout) = self.timeout_secs {
            config.capture.hard_timeout_secs = timeout;
        }
        if let Some(dir) = &self.data_dir {
            config.pipeline.data_dir = dir.clone();
        }
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .with_context(|| format!("Missing value for {}", flag))
}

/// Print help information
fn print_help() {
    println!("thermocap - thermal camera capture and analysis");
    println!();
    println!("USAGE:");
    println!("    thermocap [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>     Path to configuration file");
    println!("        --ip <HOST>         Camera IP or hostname");
    println!("    -n, --frames <N>        Stop after a frame beyond N is reported");
    println!("    -t, --timeout <SECS>    Hard capture timeout");
    println!("        --data-dir <PATH>   Directory for measurement files");
    println!("        --skip-capture      Only process existing measurement files");
    println!("    -d, --debug             Enable debug logging");
    println!("    -h, --help              Print this help message");
    println!("    -v, --version           Print version information");
    println!();
    println!("ENVIRONMENT:");
    println!("    mobotuser              Camera user name (required for capture)");
    println!("    mobotpassword          Camera password (required for capture)");
    println!("    {:<22} Path to configuration file", CONFIG_ENV_VAR);
    println!("    {:<22} Enable debug logging (1 or true)", DEBUG_ENV_VAR);
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

fn load_configuration(args: &AppArgs) -> thermocap::Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => {
            debug!("Loading config from: {}", path.display());
            ConfigLoader::load_from_file(path)?
        }
        None => ConfigLoader::load()?,
    };
    args.apply(&mut config);
    thermocap::config::loader::validate_config(&config)?;
    Ok(config)
}

fn print_report(report: &RunReport) {
    for file in &report.pipeline.processed {
        println!("{}", file.path.display());
        println!("Data shape: ({}, {})", file.rows, file.cols);
        let stats = &file.summary.stats;
        for (label, value) in [
            ("mean_temperature", stats.mean),
            ("std_dev", stats.std_dev),
            ("min_temperature", stats.min),
            ("max_temperature", stats.max),
        ] {
            println!("{:30}: {:.6}", label, value);
        }
    }
    for skipped in &report.pipeline.skipped {
        println!("{} skipped ({}): {}", skipped.path.display(), skipped.kind, skipped.reason);
    }
}

async fn run(args: &AppArgs) -> thermocap::Result<RunReport> {
    let config = load_configuration(args)?;

    if args.skip_capture {
        info!("Skipping capture, processing {}", config.pipeline.data_dir.display());
        return thermocap::run_pipeline_only(&config);
    }

    // Fail before touching the camera
    let credentials = Credentials::from_env()?;
    thermocap::run(&config, &credentials).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match AppArgs::parse_from(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Failed to parse arguments: {:#}", e);
            print_help();
            process::exit(2);
        }
    };

    if args.help {
        print_help();
        return;
    }
    if args.version {
        println!("thermocap v{}", thermocap::VERSION);
        return;
    }

    init_logging(args.debug);

    match run(&args).await {
        Ok(report) => {
            print_report(&report);
            info!("Run {} complete", report.run_id);
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", handle_startup_error(&e));
            process::exit(1);
        }
    }
}
