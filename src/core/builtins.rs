//! Built-in console commands.

use bevy::prelude::*;

use super::command::ConsoleCommand;
use super::console::{Console, CONSOLE_SOURCE};
use super::flags::CommandFlags;
use super::output::OutputLevel;
use super::permissions::AccessLevel;
use super::result::{CommandResult, Origin};
use super::storage::StorageLocation;
use super::tokenizer::escape;
use super::variables::VariableValue;

/// Lines printed by `access_status` stay below this many bytes.
pub const ACCESS_STATUS_LINE_LIMIT: usize = 240;

pub(crate) fn register_builtins(console: &mut Console) {
    console.register(
        ConsoleCommand::new("echo", "r[text]", |result, console, _world| {
            console.print(OutputLevel::Standard, CONSOLE_SOURCE, result.get_string(0));
        })
        .flags(CommandFlags::SERVER)
        .help("Echo the text"),
    );

    console.register(
        ConsoleCommand::new("exec", "r[file]", |result, console, world| {
            console.execute_file(
                result.get_string(0),
                Origin::Console,
                true,
                StorageLocation::All,
                world,
            );
        })
        .flags(CommandFlags::SERVER | CommandFlags::CLIENT)
        .help("Execute the specified file"),
    );

    console.register(
        ConsoleCommand::new("toggle", "s[config-option] i[value 1] i[value 2]", toggle)
            .flags(CommandFlags::SERVER | CommandFlags::CLIENT)
            .help("Toggle config value"),
    );

    console.register(
        ConsoleCommand::new("+toggle", "s[config-option] i[value 1] i[value 2]", stroke_toggle)
            .flags(CommandFlags::CLIENT)
            .help("Toggle config value via keypress"),
    );

    console.register(
        ConsoleCommand::new("access_level", "s[command] ?i[accesslevel]", access_level)
            .flags(CommandFlags::SERVER)
            .help("Specify command accessibility (admin = 0, moderator = 1, helper = 2, all = 3)"),
    );

    console.register(
        ConsoleCommand::new("access_status", "i[accesslevel]", |result, console, _world| {
            let level = AccessLevel::from_i32_clamped(result.get_integer(0));
            print_access_status(console, level);
        })
        .flags(CommandFlags::SERVER)
        .help("List all commands which are accessible for admin = 0, moderator = 1, helper = 2, all = 3"),
    );

    console.register(
        ConsoleCommand::new("cmdlist", "", |_result, console, _world| {
            print_access_status(console, AccessLevel::User);
        })
        .flags(CommandFlags::SERVER | CommandFlags::CHAT)
        .help("List all commands which are accessible for users"),
    );
}

/// `toggle name a b`: set the variable to `a`, or to `b` if it already is `a`.
fn toggle(result: &CommandResult, console: &mut Console, world: &mut World) {
    let name = result.get_string(0);
    let Some(line) = toggled_line(console, name, result) else {
        return;
    };
    console.execute_line(&line, Origin::Console, world);
}

fn toggled_line(console: &Console, name: &str, result: &CommandResult) -> Option<String> {
    let Some(desc) = console.registry().get_by_name(name, console.flag_mask()) else {
        console.print(
            OutputLevel::Standard,
            CONSOLE_SOURCE,
            &format!("No such command: '{name}'."),
        );
        return None;
    };

    let var = desc
        .toggle_target()
        .and_then(|id| console.variables().get(id));
    let Some(var) = var else {
        console.print(
            OutputLevel::Standard,
            CONSOLE_SOURCE,
            &format!("Invalid command: '{name}'."),
        );
        return None;
    };

    let line = match var.value() {
        VariableValue::Int(current) => {
            let first = result.get_integer(1);
            let value = if *current == first { result.get_integer(2) } else { first };
            format!("{} {}", desc.name(), value)
        }
        VariableValue::Str(current) => {
            let first = result.get_string(1);
            let value = if current == first { result.get_string(2) } else { first };
            format!("{} \"{}\"", desc.name(), escape(value))
        }
        VariableValue::Color(current) => {
            let first = var.pack_color_token(result.get_string(1));
            let value = if *current == first {
                var.pack_color_token(result.get_string(2))
            } else {
                first
            };
            format!("{} {}", desc.name(), value)
        }
    };
    Some(line)
}

/// `+toggle name a b`: integer variables only, `a` while pressed and `b`
/// once released.
fn stroke_toggle(result: &CommandResult, console: &mut Console, world: &mut World) {
    let name = result.get_string(1);
    let line = match console.registry().get_by_name(name, console.flag_mask()) {
        None => Err(format!("No such command: '{name}'.")),
        Some(desc) => match desc.toggle_target().and_then(|id| console.variables().get(id)) {
            Some(var) if var.as_int().is_some() => {
                let value = if result.get_integer(0) == 0 {
                    result.get_integer(3)
                } else {
                    result.get_integer(2)
                };
                Ok(format!("{} {}", desc.name(), value))
            }
            _ => Err(format!("Invalid command: '{name}'.")),
        },
    };

    match line {
        Ok(line) => console.execute_line(&line, Origin::Console, world),
        Err(message) => console.print(OutputLevel::Standard, CONSOLE_SOURCE, &message),
    }
}

/// `access_level name [level]`: show or set who may run a command.
fn access_level(result: &CommandResult, console: &mut Console, _world: &mut World) {
    let name = result.get_string(0);
    let Some(id) = console.registry().find(name, CommandFlags::SERVER) else {
        console.print(
            OutputLevel::Standard,
            CONSOLE_SOURCE,
            &format!("No such command: '{name}'."),
        );
        return;
    };

    let setting = result.num_arguments() == 2;
    let Some(desc) = console.registry_mut().get_mut(id) else {
        return;
    };
    if setting {
        desc.set_access_level(AccessLevel::from_i32_clamped(result.get_integer(1)));
    }
    let level = desc.access_level();
    let name = desc.name().to_string();

    let verb = if setting { "is now" } else { "is" };
    let state = |enabled: bool| if enabled { "enabled" } else { "disabled" };
    for (role, required) in [
        ("moderator", AccessLevel::Moderator),
        ("helper", AccessLevel::Helper),
        ("user", AccessLevel::User),
    ] {
        console.print(
            OutputLevel::Standard,
            CONSOLE_SOURCE,
            &format!("{role} access for '{name}' {verb} {}", state(level >= required)),
        );
    }
}

/// Print the names of the commands `level` may run, comma separated and
/// wrapped below [`ACCESS_STATUS_LINE_LIMIT`] bytes.
fn print_access_status(console: &Console, level: AccessLevel) {
    let names: Vec<&str> = console
        .registry()
        .commands_for_access(level, console.flag_mask())
        .map(|desc| desc.name())
        .collect();

    let mut line = String::new();
    for name in names {
        if !line.is_empty() && line.len() + name.len() + 2 >= ACCESS_STATUS_LINE_LIMIT {
            console.print(OutputLevel::Standard, CONSOLE_SOURCE, &line);
            line.clear();
        }
        if !line.is_empty() {
            line.push_str(", ");
        }
        line.push_str(name);
    }
    if !line.is_empty() {
        console.print(OutputLevel::Standard, CONSOLE_SOURCE, &line);
    }
}
