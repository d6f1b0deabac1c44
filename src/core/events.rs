//! Console messages for communication with the rest of the app.
//!
//! - Input: lines to execute, from config, remote console or key binds
//! - Output: every printed console line

use bevy::prelude::*;

use super::output::{ConsoleLine, OutputLevel};
use super::result::{Origin, Stroke};

/// Message sent to execute a line.
///
/// The line runs through both stroke passes.
///
/// # Examples
///
/// ```ignore
/// fn forward_rcon(mut input: MessageWriter<ConsoleInputEvent>) {
///     input.write(ConsoleInputEvent::new("kick 3 spamming").from_client(7));
/// }
/// ```
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ConsoleInputEvent {
    /// The raw line to execute.
    pub line: String,
    /// Where the line came from.
    pub origin: Origin,
    /// Whether `;` separates sub-commands.
    pub interpret_semicolons: bool,
}

impl ConsoleInputEvent {
    /// Create a console-originated input event.
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            origin: Origin::Console,
            interpret_semicolons: true,
        }
    }

    /// Mark the line as sent by a client.
    pub fn from_client(mut self, client_id: usize) -> Self {
        self.origin = Origin::Client(client_id);
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Treat `;` as part of the arguments.
    pub fn raw(mut self) -> Self {
        self.interpret_semicolons = false;
        self
    }
}

/// Message sent by key binds: one stroke pass of a line.
///
/// A bind sends [`Stroke::Press`] when its key goes down and
/// [`Stroke::Release`] when it comes back up.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ConsoleStrokeEvent {
    pub line: String,
    pub stroke: Stroke,
}

impl ConsoleStrokeEvent {
    pub fn press(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            stroke: Stroke::Press,
        }
    }

    pub fn release(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            stroke: Stroke::Release,
        }
    }
}

/// Message carrying a printed console line.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ConsoleOutputEvent {
    pub line: ConsoleLine,
}

impl ConsoleOutputEvent {
    pub fn new(line: ConsoleLine) -> Self {
        Self { line }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.line.message
    }

    #[inline]
    pub fn level(&self) -> OutputLevel {
        self.line.level
    }

    /// The line as `[HH:MM:SS][source]: message`.
    pub fn formatted(&self) -> String {
        self.line.to_string()
    }
}

/// Plugin that registers all console messages.
pub struct ConsoleEventsPlugin;

impl Plugin for ConsoleEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ConsoleInputEvent>()
            .add_message::<ConsoleStrokeEvent>()
            .add_message::<ConsoleOutputEvent>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_input_event() {
        let event = ConsoleInputEvent::new("sv_map dm1");
        assert_eq!(event.line, "sv_map dm1");
        assert_eq!(event.origin, Origin::Console);
        assert!(event.interpret_semicolons);

        let event = ConsoleInputEvent::new("say a; b").from_client(3).raw();
        assert_eq!(event.origin, Origin::Client(3));
        assert!(!event.interpret_semicolons);
    }

    #[test]
    fn test_console_output_event() {
        let event = ConsoleOutputEvent::new(ConsoleLine::new(OutputLevel::AddInfo, "server", "hello"));
        assert_eq!(event.message(), "hello");
        assert_eq!(event.level(), OutputLevel::AddInfo);
        assert!(event.formatted().ends_with("[server]: hello"));
    }
}
