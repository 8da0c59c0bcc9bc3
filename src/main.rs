mod cli;

use stickerforge::{
    config,
    params::{ConversionLimits, RawParams, UploadedFile},
    server, service,
};
use stickerforge_av::{check_tool, Transcoder};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Conversion knobs collected from the command line.
struct ConvertArgs {
    output: Option<PathBuf>,
    raw: RawParams,
    dry_run: bool,
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Stickerforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        "Uploads in {:?}, stickers in {:?}",
        config.storage.upload_dir,
        config.storage.output_dir
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stickerforge=trace,stickerforge_av=trace,tower_http=debug".to_string()
        } else {
            "stickerforge=debug,stickerforge_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert {
            input,
            output,
            max_duration,
            quality,
            speed,
            crop_start,
            crop_end,
            dry_run,
        } => {
            let raw = RawParams {
                max_duration: max_duration.map(|v| v.to_string()),
                quality: quality.map(|v| v.to_string()),
                speed: speed.map(|v| v.to_string()),
                crop_start: crop_start.map(|v| v.to_string()),
                crop_end: crop_end.map(|v| v.to_string()),
            };
            let args = ConvertArgs {
                output,
                raw,
                dry_run,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&input, args, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("stickerforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(input: &Path, args: ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if args.dry_run {
        let candidate = UploadedFile {
            filename: Some(filename),
            data: Default::default(),
        };
        let (upload, pipeline) = service::plan(
            Some(&candidate),
            &args.raw,
            &ConversionLimits::from(&config.conversion),
            &config.conversion.profile,
        )?;
        let output = args.output.unwrap_or_else(|| PathBuf::from("sticker.webp"));
        let argv = server::ffmpeg_transcoder(&config)
            .command(&pipeline, input, &output)
            .argv();

        println!("Request: {:?}", upload.request);
        println!("Filters: {}", pipeline.filter_chain());
        println!("\n[DRY RUN] Would run:\n  {}", argv.join(" "));
        return Ok(());
    }

    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;

    let transcoder: Arc<dyn Transcoder> = Arc::new(server::ffmpeg_transcoder(&config));
    let service = server::build_service(&config, transcoder)?;

    tracing::info!("Converting {:?}", input);
    let outcome = service
        .convert(Some(UploadedFile::new(filename, data)), args.raw)
        .await?;

    let stored = service.store().output_path(outcome.id);
    let location = match args.output {
        Some(dest) => {
            tokio::fs::copy(&stored, &dest)
                .await
                .with_context(|| format!("Failed to copy sticker to {:?}", dest))?;
            service.cleanup(outcome.id).await?;
            dest
        }
        None => stored,
    };

    println!("✓ Sticker created: {}", location.display());
    println!("  Id: {}", outcome.id);
    println!("  Size: {} KB ({} bytes)", outcome.size_kb, outcome.size_bytes);
    if outcome.warning {
        println!(
            "  ⚠ Larger than {} bytes; try a shorter clip or lower quality",
            config.conversion.size_warning_bytes
        );
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let program = config
        .tools
        .ffmpeg_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("ffmpeg"));

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
    } else {
        println!("ffmpeg is missing. Install it to enable conversions.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upload dir: {}", config.storage.upload_dir.display());
            println!("  Output dir: {}", config.storage.output_dir.display());
            match config.storage.retention_secs {
                Some(secs) => println!("  Retention: {}s", secs),
                None => println!("  Retention: disabled"),
            }
            println!(
                "  Max duration: {}s (default {}s)",
                config.conversion.max_duration_ceiling, config.conversion.default_max_duration
            );
            println!(
                "  Canvas: {}px @ {} fps",
                config.conversion.profile.canvas_size, config.conversion.profile.fps
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
