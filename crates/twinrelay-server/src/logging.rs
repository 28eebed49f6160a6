//! Tracing setup.
//!
//! Filters are built from a preset chosen on the command line, then refined
//! by per-target overrides such as `--log relay=debug`. `RUST_LOG` replaces
//! both when it is set.

use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Prefix shared by every log target of this crate.
const TARGET_ROOT: &str = "twinrelay";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format '{}', expected text or json", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Lifecycle, connections and failures.
    #[default]
    Production,
    /// Adds registry changes and per-request HTTP traces.
    Verbose,
    /// Every relayed frame, without keepalive noise.
    Debug,
    Trace,
    /// Warnings and errors only.
    Quiet,
}

impl LogPreset {
    /// Pick a preset from CLI flags. The quietest flag wins, then the most detailed.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "twinrelay::startup=info",
                "twinrelay::api=info",
                "twinrelay::ws=info",
                "twinrelay::ws::ping=off",
                "twinrelay::relay=info",
                "twinrelay::push=info",
                "twinrelay::registry=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["twinrelay=info", "twinrelay::ws::ping=off", "tower_http=info"],
            LogPreset::Debug => &["twinrelay=debug", "twinrelay::ws::ping=off", "tower_http=debug"],
            LogPreset::Trace => &["twinrelay=trace", "tower_http=trace"],
            LogPreset::Quiet => &["twinrelay=warn", "tower_http=error"],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Fully qualified target -> level.
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(preset: LogPreset, format: LogFormat) -> Self {
        Self {
            preset,
            overrides: BTreeMap::new(),
            format,
        }
    }

    /// Add overrides written as `target=level`, comma separated.
    /// Unparseable entries are ignored.
    pub fn with_overrides<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for spec in specs {
            for part in spec.as_ref().split(',') {
                let Some((target, level)) = part.split_once('=') else {
                    continue;
                };
                if let Ok(level) = Level::from_str(level.trim()) {
                    self.overrides.insert(qualify_target(target.trim()), level);
                }
            }
        }
        self
    }

    /// The filter string this configuration stands for.
    pub fn directives(&self) -> String {
        self.preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level.as_str().to_lowercase())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives()))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// `relay` -> `twinrelay::relay`; fully qualified and third-party targets pass through.
fn qualify_target(target: &str) -> String {
    if target == TARGET_ROOT || target.starts_with("twinrelay::") || target.starts_with("tower_http") {
        target.to_string()
    } else {
        format!("{}::{}", TARGET_ROOT, target)
    }
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());

    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init(),
    }
}
