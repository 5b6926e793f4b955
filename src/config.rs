use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{Result, VeteError};

/// Default directory holding the job store, relative to the working directory.
pub const DEFAULT_ROOT: &str = ".vete";

/// Unsigned decimal without a sign or exponent and without leading zeros on
/// the integer part (`0`, `12`, `.5`, `0.5`, `3.`).
pub const DECIMAL_PATTERN: &str = r"\A(?:0|[1-9]\d*|(?:0?\.|[1-9]\d*\.)\d*)\z";

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DECIMAL_PATTERN).expect("valid regex"));

/// How the live progress display is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Width of every progress bar, in characters
    pub bar_width: usize,
    /// Character used to paint bar segments
    pub glyph: char,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bar_width: 20,
            glyph: '•',
        }
    }
}

impl DisplayConfig {
    /// Take the first character of `glyph` as the bar character.
    pub fn with_glyph_str(mut self, glyph: &str) -> Result<Self> {
        self.glyph = glyph.chars().next().ok_or(VeteError::EmptyGlyph)?;
        Ok(self)
    }
}

/// Optional pause a worker takes before invoking the work hook.
///
/// Only the first `workers` jobs of a run are delayed, which staggers the
/// initial wave of workers instead of starting them all at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DelayMode {
    #[default]
    None,
    /// Random whole seconds in `[0, workers)`
    Random,
    /// `position` seconds
    Indexed,
    /// `position * secs` seconds
    Fixed(f64),
}

impl DelayMode {
    /// Parse a `--delay` argument: `rand`, `task`, or a positive decimal.
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "rand" => Ok(DelayMode::Random),
            "task" => Ok(DelayMode::Indexed),
            _ if DECIMAL_RE.is_match(mode) => {
                let secs: f64 = mode.parse().unwrap_or(0.0);
                if secs > 0.0 {
                    Ok(DelayMode::Fixed(secs))
                } else {
                    Err(VeteError::InvalidDelayTime(secs))
                }
            }
            _ => Err(VeteError::InvalidDelayMode(mode.to_string())),
        }
    }
}

impl std::fmt::Display for DelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelayMode::None => write!(f, "none"),
            DelayMode::Random => write!(f, "rand"),
            DelayMode::Indexed => write!(f, "task"),
            DelayMode::Fixed(secs) => write!(f, "{}", secs),
        }
    }
}

/// Everything a run needs, built once and handed to every component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory of the job store
    pub root: PathBuf,
    /// Number of worker slots (concurrency ceiling)
    pub workers: usize,
    pub display: DisplayConfig,
    pub delay: DelayMode,
    /// Redraw interval while waiting for the last workers to finish
    pub heartbeat_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            workers: 1,
            display: DisplayConfig::default(),
            delay: DelayMode::None,
            heartbeat_interval: Duration::from_millis(300),
        }
    }
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            root: root.into(),
            workers,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    pub fn with_delay(mut self, delay: DelayMode) -> Self {
        self.delay = delay;
        self
    }

    /// Reject configurations no run can be started with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(VeteError::NoWorkers);
        }
        Ok(())
    }

    /// Width of the slot-number column (digits in the worker count).
    pub fn label_width(&self) -> usize {
        self.workers.to_string().len()
    }
}
