//! Terminal console demo.
//!
//! Runs a headless "server" administered from stdin/stdout.
//!
//! Run with: `cargo run --example terminal --features terminal`
//!
//! Try:
//! - `sv_name` - Show the server name
//! - `sv_name "My Server"` - Set it
//! - `toggle sv_pause 0 1` - Flip a variable
//! - `kick all spamming` - Run a command once per client slot
//! - `cmdlist` - List user-level commands
//! - `shutdown` - Exit the application

use bevy::prelude::*;
use bevy_console_engine::prelude::*;

fn main() {
    println!("=== Terminal Console Demo ===");
    println!("Type commands and press Enter. Type 'shutdown' to exit.");
    println!();

    use std::io::Write;
    let _ = std::io::stdout().flush();

    App::new()
        .add_plugins(MinimalPlugins)
        .insert_resource(ConsoleSettings::default().settings_script(None))
        .add_plugins(ConsolePlugin)
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut console: ResMut<Console>) {
    console.register_var(
        ConfigVar::string("sv_name", "unnamed server")
            .flags(CommandFlags::SERVER | CommandFlags::SAVE)
            .help("Server name"),
    );

    console.register_var(
        ConfigVar::int("sv_pause", 0)
            .range(0, 1)
            .flags(CommandFlags::SERVER)
            .help("Pause the game"),
    );

    console.register(
        ConsoleCommand::new("kick", "v[id] ?r[reason]", |result, console, _world| {
            if let Some(slot) = result.victim_slot() {
                let reason = match result.get_string(1) {
                    "" => "no reason given",
                    reason => reason,
                };
                console.print_standard("server", &format!("kicked client {slot} ({reason})"));
            }
        })
        .flags(CommandFlags::SERVER)
        .help("Kick a player"),
    );

    console.register(
        ConsoleCommand::new("shutdown", "?r[reason]", |_result, _console, _world| {
            std::process::exit(0);
        })
        .flags(CommandFlags::SERVER)
        .help("Shut down the server"),
    );
}
