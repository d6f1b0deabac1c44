//! Persistence layer for console configuration.
//!
//! Provides RON-based save/load for [`ConsoleSettings`] and writes variables
//! flagged `SAVE` as a replayable config script.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use thiserror::Error;

use crate::core::{
    escape, CommandFlags, Console, ConsoleCommand, OutputLevel, VariableValue, CONSOLE_SOURCE,
};
use crate::settings::ConsoleSettings;

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "console.ron";

/// Default file written by `save_config`.
pub const DEFAULT_CONFIG_SCRIPT: &str = "settings.cfg";

/// Errors that can occur during config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error for '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl ConsoleSettings {
    /// Load settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        ron::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save settings to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let contents = ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        write_creating_parents(path.as_ref(), &contents)
    }

    /// Load settings from file, returning defaults if it is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

fn write_creating_parents(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }

    fs::write(path, contents).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Render every variable flagged `SAVE` as a command line, in registration
/// order.
pub fn config_script(console: &Console) -> String {
    let mut script = String::new();
    for (_, var) in console.variables().iter() {
        if !var.get_flags().contains(CommandFlags::SAVE) {
            continue;
        }
        let line = match var.value() {
            VariableValue::Int(value) => format!("{} {}", var.name(), value),
            VariableValue::Str(value) => format!("{} \"{}\"", var.name(), escape(value)),
            VariableValue::Color(value) => format!("{} {}", var.name(), value),
        };
        script.push_str(&line);
        script.push('\n');
    }
    script
}

/// Write the config script of `console` to `path`.
pub fn write_config(console: &Console, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    write_creating_parents(path.as_ref(), &config_script(console))
}

/// Resource tracking the settings file path.
#[derive(Resource, Debug, Clone)]
pub struct SettingsPath(pub String);

impl Default for SettingsPath {
    fn default() -> Self {
        Self(DEFAULT_SETTINGS_FILE.to_string())
    }
}

/// Register persistence-related commands.
pub fn register_persist_commands(console: &mut Console) {
    console.register(
        ConsoleCommand::new("save_config", "?r[file]", |result, console, _world| {
            let path = match result.get_string(0) {
                "" => DEFAULT_CONFIG_SCRIPT,
                path => path,
            };
            match write_config(console, path) {
                Ok(()) => console.print(
                    OutputLevel::Standard,
                    CONSOLE_SOURCE,
                    &format!("saved config to '{path}'"),
                ),
                Err(e) => {
                    error!("Failed to save config: {}", e);
                    console.print(
                        OutputLevel::Standard,
                        CONSOLE_SOURCE,
                        &format!("failed to save config to '{path}'"),
                    );
                }
            }
        })
        .flags(CommandFlags::SERVER | CommandFlags::CLIENT)
        .help("Write all saved variables to a config script"),
    );
}

/// System to load settings on startup.
pub fn load_settings_on_startup(world: &mut World) {
    let path = world
        .get_resource::<SettingsPath>()
        .map(|path| path.0.clone())
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());

    if !Path::new(&path).exists() {
        info!("No settings file found at '{}', using defaults", path);
        return;
    }

    match ConsoleSettings::load(&path) {
        Ok(settings) => {
            info!("Loading settings from '{}'", path);
            world.resource_scope(|world, mut console: Mut<Console>| {
                console.apply_settings(&settings, world);
            });
            world.insert_resource(settings);
        }
        Err(e) => {
            error!("Failed to load settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bevy::prelude::World;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::core::{AccessLevel, ConfigVar, Origin};

    #[test]
    fn test_settings_roundtrip() {
        let settings = ConsoleSettings {
            access_level: AccessLevel::Helper,
            max_clients: 16,
            ..ConsoleSettings::client()
        };

        let temp = NamedTempFile::new().unwrap();
        settings.save(temp.path()).unwrap();

        let loaded = ConsoleSettings::load(temp.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_settings_load_missing() {
        assert!(matches!(
            ConsoleSettings::load("nonexistent_file.ron"),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(
            ConsoleSettings::load_or_default("nonexistent_file.ron"),
            ConsoleSettings::default()
        );
    }

    #[test]
    fn test_settings_parse_partial_ron() {
        let ron_content = r#"(
    max_clients: 8,
    test_commands: true,
)"#;

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(ron_content.as_bytes()).unwrap();
        temp.flush().unwrap();

        let settings = ConsoleSettings::load(temp.path()).unwrap();
        assert_eq!(settings.max_clients, 8);
        assert!(settings.test_commands);
        assert_eq!(settings.flag_mask, CommandFlags::SERVER);
    }

    #[test]
    fn test_config_script() {
        let mut console = Console::new();
        console.register_var(
            ConfigVar::string("sv_name", "my \"quoted\" server")
                .flags(CommandFlags::SERVER | CommandFlags::SAVE),
        );
        console.register_var(ConfigVar::int("sv_port", 8303).flags(CommandFlags::SERVER | CommandFlags::SAVE));
        console.register_var(ConfigVar::int("sv_tick", 50).flags(CommandFlags::SERVER));

        assert_eq!(
            config_script(&console),
            "sv_name \"my \\\"quoted\\\" server\"\nsv_port 8303\n"
        );
    }

    #[test]
    fn test_written_config_replays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.cfg");

        let mut console = Console::new();
        console.register_var(
            ConfigVar::string("sv_name", "a;b #c").flags(CommandFlags::SERVER | CommandFlags::SAVE),
        );
        write_config(&console, &path).unwrap();

        let mut fresh = Console::new();
        let id = fresh.register_var(
            ConfigVar::string("sv_name", "").flags(CommandFlags::SERVER | CommandFlags::SAVE),
        );
        let mut world = World::new();
        assert!(fresh.execute_file(
            path.to_str().unwrap(),
            Origin::Console,
            true,
            crate::core::StorageLocation::Absolute,
            &mut world,
        ));
        assert_eq!(fresh.variables().get(id).and_then(|v| v.as_str()), Some("a;b #c"));
    }
}
