//! Terminal backend for dedicated servers.
//!
//! Reads console lines from stdin and prints every console output line to
//! stdout, so a headless server can be administered from its terminal.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use bevy::prelude::*;

use crate::core::{ConsoleInputEvent, ConsoleOutputEvent, OutputLevel};

/// Plugin that adds terminal (stdin/stdout) console support.
pub struct TerminalPlugin;

impl Plugin for TerminalPlugin {
    fn build(&self, app: &mut App) {
        let (sender, receiver) = mpsc::channel();
        let _handle = spawn_stdin_reader(sender);

        app.insert_resource(StdinReceiver(Mutex::new(receiver)))
            .init_resource::<TerminalConfig>()
            .add_systems(Update, (read_stdin, write_stdout));
    }
}

/// Configuration for terminal behavior.
#[derive(Resource)]
pub struct TerminalConfig {
    /// Whether to use colored output (ANSI escape codes).
    pub colored: bool,
    /// Whether to prefix lines with their timestamp and source.
    pub timestamps: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            colored: false,
            timestamps: true,
        }
    }
}

#[derive(Resource)]
struct StdinReceiver(Mutex<Receiver<String>>);

fn spawn_stdin_reader(sender: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let handle = stdin.lock();

        for line in handle.lines().map_while(Result::ok) {
            let text = line.trim().to_string();
            if !text.is_empty() && sender.send(text).is_err() {
                break;
            }
        }
    })
}

fn read_stdin(receiver: Res<StdinReceiver>, mut events: MessageWriter<ConsoleInputEvent>) {
    let Ok(rx) = receiver.0.lock() else {
        warn!("Console: stdin receiver lock poisoned");
        return;
    };
    while let Ok(line) = rx.try_recv() {
        events.write(ConsoleInputEvent::new(line));
    }
}

fn write_stdout(mut events: MessageReader<ConsoleOutputEvent>, config: Res<TerminalConfig>) {
    let mut stdout = io::stdout().lock();
    for event in events.read() {
        let text = if config.timestamps {
            event.formatted()
        } else {
            event.message().to_string()
        };

        let written = if config.colored {
            writeln!(stdout, "{}{}\x1b[0m", color_code(event), text)
        } else {
            writeln!(stdout, "{}", text)
        };
        if written.is_err() {
            return;
        }
    }
    let _ = stdout.flush();
}

fn color_code(event: &ConsoleOutputEvent) -> &'static str {
    if event.line.highlighted {
        return "\x1b[33m";
    }
    match event.level() {
        OutputLevel::Standard => "\x1b[0m",
        OutputLevel::AddInfo => "\x1b[36m",
        OutputLevel::Debug => "\x1b[90m",
    }
}
