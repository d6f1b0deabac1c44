//! Console output lines and print sinks.
//!
//! Every line printed by the console is timestamped, tagged with a source and
//! handed to each registered print callback whose output level admits it.
//! Lines are also mirrored to `bevy::log`.

use std::fmt;

use bevy::prelude::*;
use chrono::{DateTime, Local};

/// Maximum number of print callbacks a console accepts.
pub const MAX_PRINT_CALLBACKS: usize = 4;

/// Verbosity of a printed line, and the threshold of a print callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputLevel {
    #[default]
    Standard = 0,
    AddInfo = 1,
    Debug = 2,
}

impl OutputLevel {
    /// Convert from an integer, clamping out-of-range values.
    pub fn from_i32_clamped(level: i32) -> Self {
        match level {
            i32::MIN..=0 => OutputLevel::Standard,
            1 => OutputLevel::AddInfo,
            _ => OutputLevel::Debug,
        }
    }
}

/// A single formatted console line.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub level: OutputLevel,
    /// Short tag naming the subsystem that printed the line.
    pub source: String,
    pub message: String,
    /// Whether the line should be rendered emphasised.
    pub highlighted: bool,
    pub timestamp: DateTime<Local>,
}

impl ConsoleLine {
    pub fn new(level: OutputLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            highlighted: false,
            timestamp: Local::now(),
        }
    }

    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }
}

/// Formats as `[HH:MM:SS][source]: message`.
impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}]: {}",
            self.timestamp.format("%H:%M:%S"),
            self.source,
            self.message
        )
    }
}

/// Type alias for print callback functions.
pub type PrintCallback = Box<dyn Fn(&ConsoleLine) + Send + Sync>;

struct PrintSink {
    level: OutputLevel,
    callback: PrintCallback,
}

/// The registered print callbacks.
#[derive(Default)]
pub struct PrintSinks {
    sinks: Vec<PrintSink>,
}

impl PrintSinks {
    /// Register a callback. Returns its index, or `None` when all
    /// [`MAX_PRINT_CALLBACKS`] slots are taken.
    pub fn register(&mut self, level: OutputLevel, callback: PrintCallback) -> Option<usize> {
        if self.sinks.len() >= MAX_PRINT_CALLBACKS {
            return None;
        }
        self.sinks.push(PrintSink { level, callback });
        Some(self.sinks.len() - 1)
    }

    /// Change the threshold of a registered callback.
    pub fn set_level(&mut self, index: usize, level: OutputLevel) -> bool {
        match self.sinks.get_mut(index) {
            Some(sink) => {
                sink.level = level;
                true
            }
            None => false,
        }
    }

    pub fn level(&self, index: usize) -> Option<OutputLevel> {
        self.sinks.get(index).map(|sink| sink.level)
    }

    /// Deliver a line to every callback whose threshold admits it.
    pub fn dispatch(&self, line: &ConsoleLine) {
        for sink in &self.sinks {
            if line.level <= sink.level {
                (sink.callback)(line);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for PrintSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|sink| sink.level))
            .finish()
    }
}

/// Mirror a console line to `bevy::log`.
pub(crate) fn log_line(line: &ConsoleLine) {
    match line.level {
        OutputLevel::Standard => info!("[{}]: {}", line.source, line.message),
        OutputLevel::AddInfo => debug!("[{}]: {}", line.source, line.message),
        OutputLevel::Debug => trace!("[{}]: {}", line.source, line.message),
    }
}
