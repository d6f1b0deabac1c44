//! Console settings.
//!
//! Inserted as a resource before [`ConsolePlugin`](crate::ConsolePlugin) is
//! added to customise the console it builds. With the `persist` feature the
//! settings can be loaded from and saved to RON.

use std::path::PathBuf;

use bevy::prelude::*;

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

use crate::core::{AccessLevel, CommandFlags, OutputLevel, DEFAULT_MAX_CLIENTS};

/// Startup settings of the console.
#[derive(Resource, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize), serde(default))]
pub struct ConsoleSettings {
    /// Context flags of the commands this console can see.
    pub flag_mask: CommandFlags,
    /// Access level of the invoker.
    pub access_level: AccessLevel,
    /// Store queueable commands instead of running them.
    pub store_commands: bool,
    /// Allow commands flagged `TEST`.
    pub test_commands: bool,
    /// Number of client slots a victim of `all` expands to.
    pub max_clients: usize,
    /// Directories searched for scripts. The first one is the save path.
    pub search_paths: Vec<PathBuf>,
    /// Script executed on startup, if it exists.
    pub settings_script: Option<String>,
    /// Lowest priority of lines forwarded as output messages.
    pub output_level: OutputLevel,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            flag_mask: CommandFlags::SERVER,
            access_level: AccessLevel::Admin,
            store_commands: false,
            test_commands: false,
            max_clients: DEFAULT_MAX_CLIENTS,
            search_paths: vec![PathBuf::from(".")],
            settings_script: Some("settings.cfg".to_string()),
            output_level: OutputLevel::Standard,
        }
    }
}

impl ConsoleSettings {
    /// Settings for a client console.
    pub fn client() -> Self {
        Self {
            flag_mask: CommandFlags::CLIENT,
            ..Self::default()
        }
    }

    pub fn flag_mask(mut self, mask: CommandFlags) -> Self {
        self.flag_mask = mask;
        self
    }

    pub fn search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn settings_script(mut self, script: Option<String>) -> Self {
        self.settings_script = script;
        self
    }
}
