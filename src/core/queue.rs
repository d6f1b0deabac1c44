//! Deferred execution queue.
//!
//! While command storing is active, invocations of commands flagged
//! [`CommandFlags::STORE`](super::CommandFlags::STORE) are snapshotted here
//! instead of running. They are replayed in append order when storing is
//! turned off.

use bevy::prelude::*;

use super::command::CommandCallback;
use super::console::Console;
use super::result::CommandResult;

/// A validated invocation waiting to be replayed.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    callback: Option<CommandCallback>,
    result: CommandResult,
}

impl QueueEntry {
    pub fn new(callback: Option<CommandCallback>, result: CommandResult) -> Self {
        Self { callback, result }
    }

    #[inline]
    pub fn result(&self) -> &CommandResult {
        &self.result
    }

    /// Run the snapshotted callback with the snapshotted arguments.
    pub fn invoke(&self, console: &mut Console, world: &mut World) {
        match &self.callback {
            Some(callback) => callback.invoke(&self.result, console, world),
            None => debug!("Console: stored command '{}' has no callback", self.result.command()),
        }
    }
}

/// FIFO buffer of stored invocations.
#[derive(Debug, Default)]
pub struct ExecutionQueue {
    entries: Vec<QueueEntry>,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push(entry);
    }

    /// Remove and return every entry, oldest first.
    pub fn take(&mut self) -> Vec<QueueEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Iterate over the stored entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
