//! A command console engine for multiplayer Bevy games.
//!
//! Modelled on the consoles of classic multiplayer servers, bevy_console_engine
//! provides:
//!
//! - **Commands** with compact format specs (`v[id] ?r[reason]`)
//! - **Access levels** for remote-console users and chat commands
//! - **Stroke commands** (`+name`) that act on key press and release
//! - **Temporary commands** registered per map and dropped in bulk
//! - **Chaining** interceptors around existing commands
//! - **Config variables** (int, string, colour) bound to commands
//! - **Scripts** executed line by line with a recursion guard
//!
//! # Features
//!
//! - `persist` (default): RON settings and a `save_config` command
//! - `terminal`: stdin/stdout backend for dedicated servers
//! - `full`: Enable persist + terminal
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_console_engine::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(ConsolePlugin)
//!         .add_systems(Startup, setup_console)
//!         .run();
//! }
//!
//! fn setup_console(mut console: ResMut<Console>) {
//!     console.register_var(
//!         ConfigVar::int("sv_max_clients", 64)
//!             .range(1, 64)
//!             .flags(CommandFlags::SERVER | CommandFlags::SAVE),
//!     );
//!
//!     console.register(
//!         ConsoleCommand::new("kick", "v[id] ?r[reason]", |result, console, _world| {
//!             if let Some(slot) = result.victim_slot() {
//!                 console.print_standard("server", &format!("kicked {slot}"));
//!             }
//!         })
//!         .flags(CommandFlags::SERVER)
//!         .help("Kick a player"),
//!     );
//! }
//! ```

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

// Core module (always available, zero optional deps)
pub mod core;

pub mod settings;

// Re-export core types at crate root for convenience
pub use crate::core::{
    AccessLevel, ArgKind, CommandCallback, CommandDescriptor, CommandFlags, CommandHandler,
    CommandId, CommandRegistry, CommandResult, ConfigStore, ConfigVar, Console, ConsoleCommand,
    ConsoleEventsPlugin, ConsoleInputEvent, ConsoleLine, ConsoleOutputEvent, ConsoleStrokeEvent,
    DispatchError, FileStorage, FormatSpec, MemoryStorage, Origin, OutputLevel, ScriptStorage,
    StorageLocation, Stroke, Victim,
};
pub use settings::ConsoleSettings;

// Terminal backend (feature-gated)
#[cfg(feature = "terminal")]
pub mod terminal;

// Persistence module (feature-gated)
#[cfg(feature = "persist")]
pub mod persist;

#[cfg(feature = "persist")]
pub use persist::{ConfigError, SettingsPath};

#[cfg(feature = "terminal")]
pub use terminal::{TerminalConfig, TerminalPlugin};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::{
        AccessLevel, CommandFlags, CommandResult, ConfigVar, Console, ConsoleCommand,
        ConsoleInputEvent, ConsoleOutputEvent, ConsoleStrokeEvent, Origin, OutputLevel,
        StorageLocation, Stroke, Victim, split_commands, tokenize,
    };
    pub use crate::{ConsolePlugin, ConsoleSettings};
}

/// Main console plugin.
///
/// Builds the [`Console`] resource from the [`ConsoleSettings`] resource, or
/// from defaults if none was inserted.
///
/// # Configuration
///
/// ```ignore
/// App::new()
///     .insert_resource(ConsoleSettings::client())
///     .add_plugins(ConsolePlugin);
/// ```
///
/// Command handlers run while the console is taken out of the world, so they
/// must use the `&mut Console` they receive instead of `Res<Console>`.
#[derive(Default)]
pub struct ConsolePlugin;

impl Plugin for ConsolePlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world()
            .get_resource::<ConsoleSettings>()
            .cloned()
            .unwrap_or_default();

        let output = ConsoleOutputBuffer::default();
        let mut console = Console::from_settings(&settings);
        let sink = output.clone();
        if console
            .register_settings_print_callback(settings.output_level, move |line| {
                sink.push(line.clone())
            })
            .is_none()
        {
            warn!("Console: No print callback slot left for console output messages");
        }

        #[cfg(feature = "persist")]
        persist::register_persist_commands(&mut console);

        app.insert_resource(settings)
            .insert_resource(console)
            .insert_resource(output)
            .init_resource::<PendingLines>()
            .add_plugins(crate::core::ConsoleEventsPlugin);

        // Persistence (feature-gated)
        #[cfg(feature = "persist")]
        {
            app.init_resource::<persist::SettingsPath>().add_systems(
                Startup,
                persist::load_settings_on_startup.before(exec_settings_script),
            );
        }

        app.add_systems(Startup, exec_settings_script);

        // Process console input (three-stage pipeline)
        // 1. collect_console_input: Read input messages into the pending queue
        // 2. execute_pending_lines: Execute lines with exclusive World access
        // 3. send_pending_outputs: Forward printed lines as output messages
        app.add_systems(
            Update,
            (collect_console_input, execute_pending_lines, send_pending_outputs).chain(),
        );

        // Terminal backend (feature-gated)
        #[cfg(feature = "terminal")]
        {
            app.add_plugins(terminal::TerminalPlugin);
        }
    }
}

/// Lines printed by the console, waiting to be sent as
/// [`ConsoleOutputEvent`] messages.
#[derive(Resource, Clone, Default)]
pub struct ConsoleOutputBuffer(Arc<Mutex<Vec<ConsoleLine>>>);

impl ConsoleOutputBuffer {
    fn push(&self, line: ConsoleLine) {
        match self.0.lock() {
            Ok(mut lines) => lines.push(line),
            Err(_) => warn!("Console: Output buffer lock poisoned, dropping line"),
        }
    }

    /// Take every buffered line, oldest first.
    pub fn drain(&self) -> Vec<ConsoleLine> {
        self.0
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }
}

/// A line waiting for execution.
#[derive(Debug, Clone)]
enum PendingLine {
    Line {
        line: String,
        origin: Origin,
        interpret_semicolons: bool,
    },
    Stroke {
        line: String,
        stroke: Stroke,
    },
}

/// Resource that holds lines waiting for execution.
#[derive(Resource, Default)]
struct PendingLines(Vec<PendingLine>);

/// Exclusive system executing the settings script once on startup.
fn exec_settings_script(world: &mut World) {
    let script = world
        .get_resource::<ConsoleSettings>()
        .and_then(|settings| settings.settings_script.clone());
    let Some(script) = script else {
        return;
    };

    world.resource_scope(|world, mut console: Mut<Console>| {
        console.execute_file(&script, Origin::ServerConfig, false, StorageLocation::All, world);
    });
}

/// System that collects input messages for execution.
fn collect_console_input(
    mut input_events: MessageReader<ConsoleInputEvent>,
    mut stroke_events: MessageReader<ConsoleStrokeEvent>,
    mut pending: ResMut<PendingLines>,
) {
    for event in input_events.read() {
        pending.0.push(PendingLine::Line {
            line: event.line.clone(),
            origin: event.origin,
            interpret_semicolons: event.interpret_semicolons,
        });
    }
    for event in stroke_events.read() {
        pending.0.push(PendingLine::Stroke {
            line: event.line.clone(),
            stroke: event.stroke,
        });
    }
}

/// Exclusive system that executes pending lines with full World access.
fn execute_pending_lines(world: &mut World) {
    let pending = std::mem::take(&mut world.resource_mut::<PendingLines>().0);
    if pending.is_empty() {
        return;
    }

    world.resource_scope(|world, mut console: Mut<Console>| {
        for entry in pending {
            match entry {
                PendingLine::Line {
                    line,
                    origin,
                    interpret_semicolons,
                } => console.execute_line_with(&line, origin, interpret_semicolons, world),
                PendingLine::Stroke { line, stroke } => {
                    console.execute_line_stroked(stroke, &line, Origin::Console, true, world)
                }
            }
        }
    });
}

/// System that sends buffered output lines.
fn send_pending_outputs(
    output: Res<ConsoleOutputBuffer>,
    mut output_events: MessageWriter<ConsoleOutputEvent>,
) {
    for line in output.drain() {
        output_events.write(ConsoleOutputEvent::new(line));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// Test resource to track command execution.
    #[derive(Resource, Default)]
    struct TestCommandExecuted {
        count: usize,
        last_args: Vec<String>,
        victims: Vec<Victim>,
    }

    /// Test resource collecting output messages.
    #[derive(Resource, Default)]
    struct CollectedOutput(Vec<String>);

    fn collect_output(
        mut events: MessageReader<ConsoleOutputEvent>,
        mut collected: ResMut<CollectedOutput>,
    ) {
        for event in events.read() {
            collected.0.push(event.message().to_string());
        }
    }

    fn test_app(settings: ConsoleSettings) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(settings);
        app.add_plugins(ConsolePlugin);
        app.init_resource::<TestCommandExecuted>();
        app.init_resource::<CollectedOutput>();
        app.add_systems(Update, collect_output.after(send_pending_outputs));
        app
    }

    fn quiet_settings() -> ConsoleSettings {
        ConsoleSettings::default().settings_script(None)
    }

    fn register_test_command(app: &mut App, name: &str, params: &str, flags: CommandFlags) {
        app.world_mut().resource_mut::<Console>().register(
            ConsoleCommand::new(name, params, |result, _console, world| {
                let mut tracker = world.resource_mut::<TestCommandExecuted>();
                tracker.count += 1;
                tracker.last_args = result.arguments().map(String::from).collect();
                tracker.victims.push(result.victim());
            })
            .flags(flags),
        );
    }

    /// Helper to queue a line directly for testing.
    fn queue_line(app: &mut App, line: &str, origin: Origin) {
        app.world_mut()
            .resource_mut::<PendingLines>()
            .0
            .push(PendingLine::Line {
                line: line.to_string(),
                origin,
                interpret_semicolons: true,
            });
    }

    fn executed(app: &App) -> &TestCommandExecuted {
        app.world().resource::<TestCommandExecuted>()
    }

    #[test]
    fn test_command_execution() {
        let mut app = test_app(quiet_settings());
        register_test_command(&mut app, "test_cmd", "s s", CommandFlags::SERVER);
        app.update();

        queue_line(&mut app, "test_cmd arg1 \"arg 2\"", Origin::Console);
        app.update();

        let tracker = executed(&app);
        assert_eq!(tracker.count, 1, "Command should have been executed once");
        assert_eq!(tracker.last_args, vec!["arg1", "arg 2"]);
    }

    #[test]
    fn test_multiple_commands_semicolon() {
        let mut app = test_app(quiet_settings());
        register_test_command(&mut app, "inc", "?r", CommandFlags::SERVER);
        app.update();

        queue_line(&mut app, "inc; inc # inc", Origin::Console);
        app.update();

        assert_eq!(executed(&app).count, 2);
    }

    #[test]
    fn test_input_messages() {
        let mut app = test_app(quiet_settings());
        register_test_command(&mut app, "say", "r", CommandFlags::SERVER);
        app.update();

        app.world_mut()
            .resource_mut::<Messages<ConsoleInputEvent>>()
            .write(ConsoleInputEvent::new("say a; b").raw());
        app.update();

        let tracker = executed(&app);
        assert_eq!(tracker.count, 1);
        assert_eq!(tracker.last_args, vec!["a; b"]);
    }

    #[test]
    fn test_output_messages() {
        let mut app = test_app(quiet_settings());
        app.update();

        queue_line(&mut app, "echo hello; nope", Origin::Console);
        app.update();

        assert_eq!(
            app.world().resource::<CollectedOutput>().0,
            vec!["hello", "No such command: nope."]
        );
    }

    #[test]
    fn test_stroke_messages() {
        let mut app = test_app(ConsoleSettings::client().settings_script(None));
        app.world_mut()
            .resource_mut::<Console>()
            .register_var(ConfigVar::int("cl_zoom", 0).flags(CommandFlags::CLIENT));
        app.update();

        app.world_mut()
            .resource_mut::<Messages<ConsoleStrokeEvent>>()
            .write(ConsoleStrokeEvent::press("+toggle cl_zoom 3 0"));
        app.update();
        let zoom = |app: &App| {
            app.world()
                .resource::<Console>()
                .variables()
                .by_name("cl_zoom")
                .and_then(|v| v.as_int())
        };
        assert_eq!(zoom(&app), Some(3));

        app.world_mut()
            .resource_mut::<Messages<ConsoleStrokeEvent>>()
            .write(ConsoleStrokeEvent::release("+toggle cl_zoom 3 0"));
        app.update();
        assert_eq!(zoom(&app), Some(0));
    }

    #[test]
    fn test_remote_console_access() {
        let mut app = test_app(quiet_settings());
        register_test_command(&mut app, "ban", "v ?r", CommandFlags::SERVER);
        app.update();

        app.world_mut()
            .resource_mut::<Console>()
            .set_access_level(AccessLevel::Moderator);
        queue_line(&mut app, "ban 3 griefing", Origin::Client(1));
        app.update();
        assert_eq!(executed(&app).count, 0);
        assert_eq!(
            app.world().resource::<CollectedOutput>().0,
            vec!["Access for command ban denied."]
        );

        app.world_mut()
            .resource_mut::<Console>()
            .set_access_level(AccessLevel::Admin);
        queue_line(&mut app, "ban 3 griefing", Origin::Client(1));
        app.update();
        assert_eq!(executed(&app).victims, vec![Victim::Slot(3)]);
    }

    #[test]
    fn test_victim_all_broadcast() {
        let mut app = test_app(quiet_settings());
        register_test_command(&mut app, "kill", "v", CommandFlags::SERVER);
        app.update();

        queue_line(&mut app, "kill all", Origin::Console);
        app.update();

        let tracker = executed(&app);
        assert_eq!(tracker.count, 64);
        assert_eq!(tracker.victims.first(), Some(&Victim::Slot(0)));
        assert_eq!(tracker.victims.last(), Some(&Victim::Slot(63)));
    }

    #[test]
    fn test_settings_script_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.cfg"),
            "sv_name \"test server\"\nsv_gravity 5\n",
        )
        .unwrap();

        let mut app = test_app(ConsoleSettings::default().search_paths([dir.path()]));
        {
            let mut console = app.world_mut().resource_mut::<Console>();
            console.register_var(ConfigVar::string("sv_name", "").flags(CommandFlags::SERVER));
            console.register_var(
                ConfigVar::int("sv_gravity", 1).flags(CommandFlags::SERVER | CommandFlags::GAME),
            );
        }
        app.update();
        app.update();

        let console = app.world().resource::<Console>();
        assert_eq!(
            console.variables().by_name("sv_name").and_then(|v| v.as_str()),
            Some("test server")
        );
        // map-only settings are refused from config files
        assert_eq!(console.variables().by_name("sv_gravity").and_then(|v| v.as_int()), Some(1));
        assert!(
            app.world()
                .resource::<CollectedOutput>()
                .0
                .contains(&"Command 'sv_gravity' cannot be executed from a non-map config file.".to_string())
        );
    }

    #[test]
    fn test_exec_recursion_guard() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loop.cfg"), "inc\nexec loop.cfg\ninc\n").unwrap();

        let mut app = test_app(
            ConsoleSettings::default()
                .search_paths([dir.path()])
                .settings_script(None),
        );
        register_test_command(&mut app, "inc", "", CommandFlags::SERVER);
        app.update();

        queue_line(&mut app, "exec loop.cfg", Origin::Console);
        app.update();

        assert_eq!(executed(&app).count, 2);
    }

    #[test]
    fn test_stored_commands_replay() {
        let mut app = test_app(quiet_settings());
        register_test_command(
            &mut app,
            "sv_map",
            "s",
            CommandFlags::SERVER | CommandFlags::STORE,
        );
        app.update();

        app.world_mut().resource_scope(|world, mut console: Mut<Console>| {
            console.set_store_commands(true, world);
        });
        queue_line(&mut app, "sv_map one; sv_map two; sv_map three", Origin::Console);
        app.update();
        assert_eq!(executed(&app).count, 0);

        app.world_mut().resource_scope(|world, mut console: Mut<Console>| {
            console.set_store_commands(false, world);
        });
        let tracker = executed(&app);
        assert_eq!(tracker.count, 3);
        assert_eq!(tracker.last_args, vec!["three"]);
    }

    #[test]
    fn test_temporary_commands_per_map() {
        let mut app = test_app(quiet_settings());
        app.update();

        let mut console = app.world_mut().resource_mut::<Console>();
        for i in 0..10 {
            console.register_temporary(&format!("zone_{i}"), "i", CommandFlags::SERVER, "");
        }
        let capacity = console.registry().temporary_capacity();
        console.deregister_all_temporary();
        for i in (0..10).rev() {
            console.register_temporary(&format!("tele_{i}"), "i", CommandFlags::SERVER, "");
        }

        assert_eq!(console.registry().temporary_capacity(), capacity);
        let names: Vec<_> = console
            .possible_commands("", CommandFlags::SERVER, true)
            .map(String::from)
            .collect();
        assert_eq!(names, (0..10).map(|i| format!("tele_{i}")).collect::<Vec<_>>());
    }

    #[cfg(feature = "persist")]
    #[test]
    fn test_save_config_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.cfg");

        let mut app = test_app(quiet_settings());
        app.world_mut().resource_mut::<Console>().register_var(
            ConfigVar::int("sv_port", 8303).flags(CommandFlags::SERVER | CommandFlags::SAVE),
        );
        app.update();

        queue_line(
            &mut app,
            &format!("sv_port 8304; save_config {}", path.display()),
            Origin::Console,
        );
        app.update();

        assert_eq!(fs::read_to_string(&path).unwrap(), "sv_port 8304\n");
    }

    #[cfg(feature = "persist")]
    #[test]
    fn test_settings_file_output_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.ron");
        ConsoleSettings {
            output_level: OutputLevel::Debug,
            ..quiet_settings()
        }
        .save(&path)
        .unwrap();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(SettingsPath(path.display().to_string()));
        app.insert_resource(quiet_settings());
        app.add_plugins(ConsolePlugin);
        app.init_resource::<CollectedOutput>();
        app.add_systems(Update, collect_output.after(send_pending_outputs));
        app.update();

        assert_eq!(
            app.world().resource::<ConsoleSettings>().output_level,
            OutputLevel::Debug
        );
        assert_eq!(
            app.world().resource::<Console>().print_output_level(0),
            Some(OutputLevel::Debug)
        );

        app.world()
            .resource::<Console>()
            .print(OutputLevel::Debug, "test", "debug line");
        app.update();
        assert!(
            app.world()
                .resource::<CollectedOutput>()
                .0
                .contains(&"debug line".to_string())
        );
    }
}
