mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./stickerforge.toml",
        "~/.config/stickerforge/config.toml",
        "/etc/stickerforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let conversion = &config.conversion;
    if conversion.max_duration_ceiling == 0 {
        anyhow::bail!("conversion.max_duration_ceiling must be at least 1 second");
    }
    if conversion.default_max_duration > conversion.max_duration_ceiling {
        anyhow::bail!(
            "conversion.default_max_duration ({}) exceeds max_duration_ceiling ({})",
            conversion.default_max_duration,
            conversion.max_duration_ceiling
        );
    }
    if conversion.profile.canvas_size == 0 {
        anyhow::bail!("conversion.profile.canvas_size cannot be 0");
    }
    if conversion.profile.fps == 0 {
        anyhow::bail!("conversion.profile.fps cannot be 0");
    }
    if conversion.profile.compression_level > 6 {
        anyhow::bail!(
            "conversion.profile.compression_level must be 0-6, got {}",
            conversion.profile.compression_level
        );
    }

    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs cannot be 0");
    }

    if let Some(ref ffmpeg) = config.tools.ffmpeg_path {
        if !ffmpeg.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", ffmpeg);
        }
    }

    if let Some(retention) = config.storage.retention_secs {
        // Staged uploads are aged by mtime while ffmpeg may still be reading them.
        if retention < config.tools.timeout_secs {
            anyhow::bail!(
                "storage.retention_secs ({}) must be at least tools.timeout_secs ({})",
                retention,
                config.tools.timeout_secs
            );
        }
    }
    if config.storage.upload_dir == config.storage.output_dir {
        tracing::warn!(
            "Upload and output directories are the same ({:?})",
            config.storage.upload_dir
        );
    }

    Ok(())
}
