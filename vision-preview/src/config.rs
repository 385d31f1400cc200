use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use vision_capture::SyntheticConfig;
use vision_frame::UVec2;
use vision_worker::WorkerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSection {
    #[serde(default)]
    pub device_index: u32,
    #[serde(default = "default_box_width")]
    pub box_width: u32,
    #[serde(default = "default_box_height")]
    pub box_height: u32,
    /// Zero disables the read deadline
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: u32,
    #[serde(default = "default_stall_backoff_ms")]
    pub stall_backoff_ms: u64,
    #[serde(default)]
    pub pin_core: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    V4l2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_box_width")]
    pub width: u32,
    #[serde(default = "default_box_height")]
    pub height: u32,
    #[serde(default = "default_channels")]
    pub channels: u8,
    #[serde(default = "default_device_count")]
    pub device_count: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub failure_rate: f64,
    /// Driver buffers for V4L2 devices
    #[serde(default = "default_buffers")]
    pub buffers: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewSection {
    /// Operation selected when the preview starts
    #[serde(default)]
    pub operation: Option<String>,
    /// Stop after this many seconds
    #[serde(default)]
    pub run_secs: Option<u64>,
    /// Flip between previewing and paused at this interval
    #[serde(default)]
    pub toggle_secs: Option<u64>,
    #[serde(default = "default_report_secs")]
    pub report_secs: u64,
    /// Treat a capture stall as fatal
    #[serde(default)]
    pub exit_on_stall: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            device_index: 0,
            box_width: default_box_width(),
            box_height: default_box_height(),
            read_timeout_ms: default_read_timeout_ms(),
            stall_threshold: default_stall_threshold(),
            stall_backoff_ms: default_stall_backoff_ms(),
            pin_core: None,
        }
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            width: default_box_width(),
            height: default_box_height(),
            channels: default_channels(),
            device_count: default_device_count(),
            fps: default_fps(),
            failure_rate: 0.0,
            buffers: default_buffers(),
        }
    }
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            operation: None,
            run_secs: None,
            toggle_secs: None,
            report_secs: default_report_secs(),
            exit_on_stall: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.box_width == 0 || self.worker.box_height == 0 {
            return Err(ConfigError::Invalid("display box must be non-empty".into()));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(ConfigError::Invalid("source size must be non-empty".into()));
        }
        if !matches!(self.source.channels, 1 | 3 | 4) {
            return Err(ConfigError::Invalid(format!(
                "source channels must be 1, 3 or 4, got {}",
                self.source.channels
            )));
        }
        if frame_interval(self.source.fps).is_none() {
            return Err(ConfigError::Invalid(format!(
                "source fps must be positive and finite, got {}",
                self.source.fps
            )));
        }
        if !(0.0..=1.0).contains(&self.source.failure_rate) {
            return Err(ConfigError::Invalid("failure_rate must be within [0, 1]".into()));
        }
        Ok(())
    }
}

impl WorkerSection {
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            device_index: self.device_index,
            display_bounds: UVec2::new(self.box_width, self.box_height),
            read_timeout: (self.read_timeout_ms > 0)
                .then(|| Duration::from_millis(self.read_timeout_ms)),
            join_reader_on_drop: false,
            stall_threshold: self.stall_threshold,
            stall_backoff: Duration::from_millis(self.stall_backoff_ms),
            pin_core: self.pin_core,
        }
    }
}

impl SourceSection {
    pub fn to_synthetic(&self) -> SyntheticConfig {
        SyntheticConfig {
            width: self.width,
            height: self.height,
            channels: self.channels,
            device_count: self.device_count,
            frame_interval: frame_interval(self.fps)
                .unwrap_or_else(|| Duration::from_secs_f64(1.0 / default_fps())),
            failure_rate: self.failure_rate,
        }
    }
}

/// Time between frames at `fps`, `None` when it cannot be represented
fn frame_interval(fps: f64) -> Option<Duration> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / fps).ok()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_box_width() -> u32 {
    640
}
fn default_box_height() -> u32 {
    480
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_stall_threshold() -> u32 {
    30
}
fn default_stall_backoff_ms() -> u64 {
    10
}
fn default_channels() -> u8 {
    3
}
fn default_device_count() -> u32 {
    1
}
fn default_fps() -> f64 {
    30.0
}
fn default_buffers() -> u32 {
    4
}
fn default_report_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".into()
}
