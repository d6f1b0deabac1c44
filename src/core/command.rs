//! Console commands and their descriptors.
//!
//! A [`ConsoleCommand`] is what callers build and register. The registry
//! stores it as a [`CommandDescriptor`], whose callback may later be wrapped
//! by chain interceptors.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;

use super::args::FormatSpec;
use super::chain::{ChainLink, ChainNext};
use super::console::Console;
use super::flags::CommandFlags;
use super::permissions::AccessLevel;
use super::result::CommandResult;
use super::variables::VariableId;

/// Type alias for command handler functions.
///
/// Handlers receive:
/// - `result`: The parsed invocation
/// - `console`: The console, for printing and nested execution
/// - `world`: Mutable access to the Bevy world
pub type CommandHandler = Arc<dyn Fn(&CommandResult, &mut Console, &mut World) + Send + Sync>;

/// What runs when a command is invoked.
#[derive(Clone)]
pub enum CommandCallback {
    /// Set or show a config variable.
    Variable(VariableId),
    /// An external handler.
    Handler(CommandHandler),
    /// An interceptor wrapping an older callback.
    Chain(Arc<ChainLink>),
}

impl CommandCallback {
    /// Run the callback.
    pub fn invoke(&self, result: &CommandResult, console: &mut Console, world: &mut World) {
        match self {
            CommandCallback::Variable(id) => console.run_variable(*id, result),
            CommandCallback::Handler(handler) => handler(result, console, world),
            CommandCallback::Chain(link) => {
                (link.interceptor())(result, console, world, ChainNext::new(link.next()))
            }
        }
    }

    /// Number of interceptors wrapped around the innermost callback.
    pub fn chain_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let CommandCallback::Chain(link) = current {
            depth += 1;
            match link.next() {
                Some(next) => current = next,
                None => break,
            }
        }
        depth
    }
}

impl fmt::Debug for CommandCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandCallback::Variable(id) => f.debug_tuple("Variable").field(id).finish(),
            CommandCallback::Handler(_) => f.write_str("Handler(..)"),
            CommandCallback::Chain(link) => f.debug_tuple("Chain").field(&link.next()).finish(),
        }
    }
}

/// A console command ready for registration.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::{CommandFlags, ConsoleCommand};
///
/// let kick = ConsoleCommand::new("kick", "v[id] ?r[reason]", |result, console, _world| {
///     let reason = result.get_string(1);
///     console.print_standard("server", &format!("kicked {:?}: {reason}", result.victim()));
/// })
/// .flags(CommandFlags::SERVER)
/// .help("Kick a player");
///
/// assert_eq!(kick.name(), "kick");
/// ```
pub struct ConsoleCommand {
    name: String,
    params: String,
    help: String,
    flags: CommandFlags,
    handler: CommandHandler,
}

impl ConsoleCommand {
    /// Create a new command with the given name, format spec and handler.
    pub fn new<F>(name: impl Into<String>, params: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandResult, &mut Console, &mut World) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: params.into(),
            help: String::new(),
            flags: CommandFlags::NONE,
            handler: Arc::new(handler),
        }
    }

    /// Set the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the context flags.
    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn get_flags(&self) -> CommandFlags {
        self.flags
    }

    pub(crate) fn into_parts(self) -> (String, String, String, CommandFlags, CommandHandler) {
        (self.name, self.params, self.help, self.flags, self.handler)
    }
}

impl fmt::Debug for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleCommand")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A registered command.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub(crate) name: String,
    pub(crate) params: FormatSpec,
    pub(crate) help: String,
    pub(crate) flags: CommandFlags,
    pub(crate) access: AccessLevel,
    pub(crate) callback: Option<CommandCallback>,
    pub(crate) temporary: bool,
    pub(crate) toggle: Option<VariableId>,
}

impl CommandDescriptor {
    pub(crate) fn new(
        name: String,
        params: &str,
        help: String,
        flags: CommandFlags,
        callback: Option<CommandCallback>,
    ) -> Self {
        Self {
            name,
            params: FormatSpec::parse(params),
            help,
            flags,
            access: AccessLevel::Admin,
            callback,
            temporary: false,
            toggle: None,
        }
    }

    /// Get the command name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the argument format spec.
    #[inline]
    pub fn params(&self) -> &FormatSpec {
        &self.params
    }

    /// Get the help text.
    #[inline]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Get the context flags.
    #[inline]
    pub fn flags(&self) -> CommandFlags {
        self.flags
    }

    /// Get the least privileged level allowed to run this command.
    #[inline]
    pub fn access_level(&self) -> AccessLevel {
        self.access
    }

    /// Set the access level.
    #[inline]
    pub fn set_access_level(&mut self, level: AccessLevel) {
        self.access = level;
    }

    /// Get the callback. Temporary commands have none.
    #[inline]
    pub fn callback(&self) -> Option<&CommandCallback> {
        self.callback.as_ref()
    }

    /// Check if this is a temporary (per-map) command.
    #[inline]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// The variable this command toggles, if it declares one.
    #[inline]
    pub fn toggle_target(&self) -> Option<VariableId> {
        self.toggle
    }

    /// Check if this is a key stroke command (`+name`).
    #[inline]
    pub fn is_stroke_command(&self) -> bool {
        self.name.starts_with('+')
    }

    /// Wrap the callback with an interceptor.
    pub(crate) fn wrap_callback(&mut self, link: impl FnOnce(Option<CommandCallback>) -> ChainLink) {
        let next = self.callback.take();
        self.callback = Some(CommandCallback::Chain(Arc::new(link(next))));
    }
}
