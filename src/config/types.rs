use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stickerforge_av::StickerProfile;
use stickerforge_common::{DEFAULT_MAX_DURATION, DEFAULT_QUALITY, DEFAULT_SIZE_WARNING_BYTES};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Entries may contain a single `*` wildcard
    /// (e.g. `https://*.netlify.app`). Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where uploads are staged while they are transcoded.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Where finished stickers wait for download.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Remove artifacts older than this many seconds. Unset keeps them until
    /// an explicit cleanup call.
    #[serde(default)]
    pub retention_secs: Option<u64>,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            retention_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Used when the form omits `max_duration`.
    #[serde(default = "default_max_duration")]
    pub default_max_duration: u32,

    /// Requested durations above this are clamped down.
    #[serde(default = "default_max_duration")]
    pub max_duration_ceiling: u32,

    #[serde(default = "default_quality")]
    pub default_quality: i64,

    /// Outputs larger than this are flagged with a warning.
    #[serde(default = "default_size_warning_bytes")]
    pub size_warning_bytes: u64,

    #[serde(default)]
    pub profile: StickerProfile,
}

fn default_max_duration() -> u32 {
    DEFAULT_MAX_DURATION
}
fn default_quality() -> i64 {
    DEFAULT_QUALITY
}
fn default_size_warning_bytes() -> u64 {
    DEFAULT_SIZE_WARNING_BYTES
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_max_duration: default_max_duration(),
            max_duration_ceiling: default_max_duration(),
            default_quality: default_quality(),
            size_warning_bytes: default_size_warning_bytes(),
            profile: StickerProfile::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg executable; otherwise looked up in `PATH`.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Hard wall-clock limit for one transcode.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
