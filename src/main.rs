mod cli;

use vconv::{config, JobController};
use vconv_av::{FfmpegEngine, FfmpegSettings, ToolRegistry};
use vconv_common::paths::{accepted_extensions, is_accepted_media_file};
use vconv_common::{JobState, ProgressEvent, ResolutionProfile};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vconv=trace,vconv_av=trace,vconv_common=trace".to_string()
        } else {
            "vconv=debug,vconv_av=debug,vconv_common=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            file,
            resolution,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&file, &resolution, json, cli.config.as_deref()))
        }
        Commands::Profiles => list_profiles(),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    file: &Path,
    resolution: &str,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    // File selection rules: the controller only checks for an empty path.
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    if !is_accepted_media_file(file) {
        anyhow::bail!(
            "Unsupported file type: {:?} (accepted: {})",
            file,
            accepted_extensions().join(", ")
        );
    }

    let config = config::load_config_or_default(config_path)?;

    let tools = ToolRegistry::discover(&config.tools);
    let engine = FfmpegEngine::new(tools, FfmpegSettings::from(&config.conversion));
    let controller = JobController::with_config(Arc::new(engine), &config.controller);

    // Subscribe before submitting so the first progress event is not missed.
    let mut progress = controller.subscribe();
    let handle = controller
        .submit(file, resolution)
        .await
        .with_context(|| format!("Could not start conversion of {:?}", file))?;

    if !json {
        println!(
            "Converting {} ({})",
            file.display(),
            handle.profile().label()
        );
    }

    let wait = handle.wait();
    tokio::pin!(wait);
    let mut cancel_requested = false;

    let final_state = loop {
        tokio::select! {
            state = &mut wait => break state,
            Some(event) = progress.recv() => print_progress(&event, json)?,
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                cancel_requested = true;
                if controller.cancel() {
                    eprintln!("Cancelling...");
                }
            }
        }
    };

    // Progress broadcast just before the terminal transition.
    while let Some(event) = progress.try_recv() {
        print_progress(&event, json)?;
    }

    let job = controller
        .current_state()
        .context("job disappeared from the controller")?;
    if json {
        println!("{}", serde_json::to_string(&job)?);
    }

    match final_state {
        JobState::Succeeded => {
            if !json {
                let output = job.output_path.as_deref().unwrap_or(Path::new(""));
                println!("\nConversion complete!");
                println!("Output: {}", output.display());
            }
            Ok(())
        }
        JobState::Failed(reason) => anyhow::bail!("Conversion failed: {}", reason),
        JobState::Cancelled => anyhow::bail!("Conversion cancelled"),
        other => anyhow::bail!("Conversion ended in unexpected state: {}", other),
    }
}

fn print_progress(event: &ProgressEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event.percent {
        Some(percent) => println!("  {:>5.1}%  ETA {}", percent, event.eta),
        None => println!("  ETA {}", event.eta),
    }
    Ok(())
}

fn list_profiles() -> Result<()> {
    println!("Available resolution profiles:\n");
    for profile in ResolutionProfile::ALL {
        let height = profile
            .target_height()
            .map(|h| format!("{h} px high"))
            .unwrap_or_else(|| "source resolution".to_string());
        println!("  {:<5} {:<14} {}", profile.identifier(), profile.label(), height);
    }
    println!("\nOmitting --resolution keeps the source resolution.");
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. ffmpeg is required for conversions; ffprobe enables ETA estimates.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let output_dir = config
        .conversion
        .output_dir
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "next to source".to_string());
    println!("  Output directory: {}", output_dir);
    println!("  Overwrite existing: {}", config.conversion.overwrite);
    println!("  Progress interval: {} ms", config.conversion.progress_interval_ms);
    println!("  Timeout: {} s", config.conversion.timeout_secs);
    println!("  History size: {}", config.controller.history_size);

    for warning in config.validate() {
        println!("  ⚠ {}", warning);
    }

    Ok(())
}
