//! The console resource.
//!
//! [`Console`] owns the command registry, the config variables, the
//! execution queue and the print sinks. Command handlers receive it mutably
//! together with the [`World`], so they can print, register and execute
//! further lines.

use std::fmt;

use bevy::prelude::*;

use crate::settings::ConsoleSettings;

use super::builtins::register_builtins;
use super::chain::{ChainLink, ChainNext};
use super::command::{CommandCallback, CommandDescriptor, ConsoleCommand};
use super::flags::CommandFlags;
use super::output::{log_line, ConsoleLine, OutputLevel, PrintSinks};
use super::permissions::AccessLevel;
use super::queue::ExecutionQueue;
use super::registry::{CommandId, CommandRegistry};
use super::result::{CommandResult, Origin, DEFAULT_MAX_CLIENTS};
use super::storage::{FileStorage, ScriptStorage};
use super::variables::{ConfigStore, ConfigVar, VariableId};

/// Source tag of lines printed by the console itself.
pub const CONSOLE_SOURCE: &str = "console";

/// What the audit hook learns about an invocation.
#[derive(Debug, Clone, Copy)]
pub struct AuditRecord<'a> {
    /// The invoking client, if any.
    pub client_id: Option<usize>,
    /// The active flag mask.
    pub flag_mask: CommandFlags,
    /// The command name as registered.
    pub command: &'a str,
    pub result: &'a CommandResult,
}

/// Type alias for audit hook functions.
pub type AuditHook = Box<dyn Fn(&AuditRecord<'_>) + Send + Sync>;

/// The command console.
///
/// # Examples
///
/// ```
/// use bevy::prelude::*;
/// use bevy_console_engine::core::{CommandFlags, ConfigVar, Console, Origin};
///
/// let mut console = Console::default();
/// let mut world = World::new();
///
/// console.register_var(ConfigVar::int("sv_spectator_slots", 0).range(0, 64).flags(CommandFlags::SERVER));
/// console.execute_line("sv_spectator_slots 100", Origin::Console, &mut world);
///
/// assert_eq!(console.variables().by_name("sv_spectator_slots").and_then(|v| v.as_int()), Some(64));
/// ```
#[derive(Resource)]
pub struct Console {
    pub(crate) registry: CommandRegistry,
    pub(crate) variables: ConfigStore,
    pub(crate) queue: ExecutionQueue,
    pub(crate) flag_mask: CommandFlags,
    pub(crate) access_level: AccessLevel,
    pub(crate) store_commands: bool,
    pub(crate) test_commands: bool,
    pub(crate) cheated: bool,
    pub(crate) max_clients: usize,
    pub(crate) exec_stack: Vec<String>,
    pub(crate) storage: Box<dyn ScriptStorage>,
    print_sinks: PrintSinks,
    pub(crate) output_sink: Option<usize>,
    pub(crate) audit_hook: Option<AuditHook>,
}

impl Default for Console {
    fn default() -> Self {
        let mut console = Self {
            registry: CommandRegistry::new(),
            variables: ConfigStore::new(),
            queue: ExecutionQueue::new(),
            flag_mask: CommandFlags::SERVER,
            access_level: AccessLevel::Admin,
            store_commands: false,
            test_commands: false,
            cheated: false,
            max_clients: DEFAULT_MAX_CLIENTS,
            exec_stack: Vec::new(),
            storage: Box::new(FileStorage::default()),
            print_sinks: PrintSinks::default(),
            output_sink: None,
            audit_hook: None,
        };
        register_builtins(&mut console);
        console
    }
}

impl Console {
    /// Create a console with the built-in commands registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console configured from `settings`.
    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        let mut console = Self::default();
        console.configure(settings);
        console.store_commands = settings.store_commands;
        console
    }

    /// Reconfigure the console. Registered commands and variables are kept.
    ///
    /// Turning `store_commands` off replays the stored commands, as
    /// [`Console::set_store_commands`] does.
    pub fn apply_settings(&mut self, settings: &ConsoleSettings, world: &mut World) {
        self.configure(settings);
        self.set_store_commands(settings.store_commands, world);
    }

    fn configure(&mut self, settings: &ConsoleSettings) {
        self.flag_mask = settings.flag_mask;
        self.access_level = settings.access_level;
        self.test_commands = settings.test_commands;
        self.max_clients = settings.max_clients.max(1);
        self.storage = Box::new(FileStorage::new(settings.search_paths.iter().cloned()));
        if let Some(index) = self.output_sink {
            self.print_sinks.set_level(index, settings.output_level);
        }
    }

    // Registration

    /// Register a command, replacing an existing one with the same name.
    pub fn register(&mut self, command: ConsoleCommand) -> CommandId {
        let (name, params, help, flags, handler) = command.into_parts();
        let (id, _) = self.registry.register(
            &name,
            &params,
            &help,
            flags,
            CommandCallback::Handler(handler),
            None,
        );
        id
    }

    /// Register a config variable and the command bound to it.
    ///
    /// The bound command sets the variable when given an argument and
    /// prints its value otherwise. It can be used with `toggle`.
    pub fn register_var(&mut self, var: ConfigVar) -> VariableId {
        let name = var.name().to_string();
        let help = var.get_help().to_string();
        let flags = var.get_flags();
        let params = var.params();

        let (id, is_new) = self.variables.insert(var);
        if !is_new {
            warn!("Console: Overwriting existing variable '{}'", name);
        }
        self.registry
            .register(&name, params, &help, flags, CommandCallback::Variable(id), Some(id));
        id
    }

    /// Register a temporary command. Temporary commands have no callback and
    /// are removed in bulk with [`Console::deregister_all_temporary`].
    pub fn register_temporary(
        &mut self,
        name: &str,
        params: &str,
        flags: CommandFlags,
        help: &str,
    ) -> CommandId {
        self.registry.register_temporary(name, params, flags, help)
    }

    pub fn deregister_temporary(&mut self, name: &str) -> bool {
        self.registry.deregister_temporary(name)
    }

    pub fn deregister_all_temporary(&mut self) {
        self.registry.deregister_all_temporary();
    }

    /// Wrap the callback of `name` with an interceptor.
    ///
    /// The interceptor runs instead of the current callback and may forward
    /// to it through the [`ChainNext`] it receives. Returns `false`, after
    /// printing a debug line, if there is no such command.
    pub fn chain<F>(&mut self, name: &str, interceptor: F) -> bool
    where
        F: Fn(&CommandResult, &mut Console, &mut World, ChainNext<'_>) + Send + Sync + 'static,
    {
        let chained = self
            .registry
            .chain(name, self.flag_mask, |next| ChainLink::new(interceptor, next));
        if !chained {
            self.print(
                OutputLevel::Debug,
                CONSOLE_SOURCE,
                &format!("failed to chain '{name}'"),
            );
        }
        chained
    }

    // Lookup

    #[inline]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    #[inline]
    pub fn variables(&self) -> &ConfigStore {
        &self.variables
    }

    #[inline]
    pub fn variables_mut(&mut self) -> &mut ConfigStore {
        &mut self.variables
    }

    /// Find a command by name among those of the given lifetime.
    pub fn command_info(
        &self,
        name: &str,
        mask: CommandFlags,
        temporary: bool,
    ) -> Option<&CommandDescriptor> {
        self.registry
            .iter()
            .map(|(_, desc)| desc)
            .find(|desc| {
                desc.flags().intersects(mask)
                    && desc.is_temporary() == temporary
                    && desc.name().eq_ignore_ascii_case(name)
            })
    }

    /// Names containing `pattern`, case-insensitive, in name order.
    pub fn possible_commands<'a>(
        &'a self,
        pattern: &'a str,
        mask: CommandFlags,
        temporary: bool,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.registry.possible_commands(pattern, mask, temporary)
    }

    // State

    #[inline]
    pub fn flag_mask(&self) -> CommandFlags {
        self.flag_mask
    }

    #[inline]
    pub fn set_flag_mask(&mut self, mask: CommandFlags) {
        self.flag_mask = mask;
    }

    #[inline]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Set the level of the invoker for the following lines.
    #[inline]
    pub fn set_access_level(&mut self, level: AccessLevel) {
        self.access_level = level;
    }

    #[inline]
    pub fn test_commands_enabled(&self) -> bool {
        self.test_commands
    }

    #[inline]
    pub fn set_test_commands(&mut self, enabled: bool) {
        self.test_commands = enabled;
    }

    /// Whether a `TEST` command was ever run. Never resets.
    #[inline]
    pub fn is_cheated(&self) -> bool {
        self.cheated
    }

    #[inline]
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    pub fn set_max_clients(&mut self, max_clients: usize) {
        self.max_clients = max_clients.max(1);
    }

    /// Replace the script storage.
    pub fn set_storage(&mut self, storage: impl ScriptStorage + 'static) {
        self.storage = Box::new(storage);
    }

    /// Install the audit hook, called for every invocation of a command not
    /// flagged `NON_HISTORIC`.
    pub fn set_audit_hook<F>(&mut self, hook: F)
    where
        F: Fn(&AuditRecord<'_>) + Send + Sync + 'static,
    {
        self.audit_hook = Some(Box::new(hook));
    }

    pub fn clear_audit_hook(&mut self) {
        self.audit_hook = None;
    }

    // Storing

    #[inline]
    pub fn is_storing_commands(&self) -> bool {
        self.store_commands
    }

    #[inline]
    pub fn stored_commands(&self) -> &ExecutionQueue {
        &self.queue
    }

    /// Turn command storing on or off.
    ///
    /// Turning it off replays every stored invocation once, oldest first,
    /// and empties the queue.
    pub fn set_store_commands(&mut self, store: bool, world: &mut World) {
        self.store_commands = store;
        if store {
            return;
        }

        for entry in self.queue.take() {
            entry.invoke(self, world);
        }
    }

    // Variables

    /// Run the command bound to a config variable.
    pub(crate) fn run_variable(&mut self, id: VariableId, result: &CommandResult) {
        let Some(var) = self.variables.get_mut(id) else {
            warn!("Console: Variable {:?} of '{}' is gone", id, result.command());
            return;
        };
        for line in var.apply(result) {
            self.print(OutputLevel::Standard, CONSOLE_SOURCE, &line);
        }
    }

    /// Undo map-script changes to server game settings.
    pub fn reset_game_settings(&mut self) -> usize {
        let restored = self.variables.reset_game_settings();
        debug!("Console: Restored {} game settings", restored);
        restored
    }

    // Output

    /// Register a print callback receiving every line at or below `level`.
    ///
    /// Returns the callback index, or `None` if all slots are taken.
    pub fn register_print_callback<F>(&mut self, level: OutputLevel, callback: F) -> Option<usize>
    where
        F: Fn(&ConsoleLine) + Send + Sync + 'static,
    {
        self.print_sinks.register(level, Box::new(callback))
    }

    /// Change the output level of a registered print callback.
    pub fn set_print_output_level(&mut self, index: usize, level: OutputLevel) -> bool {
        self.print_sinks.set_level(index, level)
    }

    #[inline]
    pub fn print_output_level(&self, index: usize) -> Option<OutputLevel> {
        self.print_sinks.level(index)
    }

    /// Register the print callback whose level follows
    /// [`ConsoleSettings::output_level`] whenever settings are applied.
    pub fn register_settings_print_callback<F>(
        &mut self,
        level: OutputLevel,
        callback: F,
    ) -> Option<usize>
    where
        F: Fn(&ConsoleLine) + Send + Sync + 'static,
    {
        let index = self.register_print_callback(level, callback)?;
        self.output_sink = Some(index);
        Some(index)
    }

    /// Print a line.
    pub fn print(&self, level: OutputLevel, source: &str, message: &str) {
        self.print_line(ConsoleLine::new(level, source, message));
    }

    /// Print a standard line.
    pub fn print_standard(&self, source: &str, message: &str) {
        self.print(OutputLevel::Standard, source, message);
    }

    /// Print an emphasised line.
    pub fn print_highlighted(&self, level: OutputLevel, source: &str, message: &str) {
        self.print_line(ConsoleLine::new(level, source, message).highlighted(true));
    }

    fn print_line(&self, line: ConsoleLine) {
        log_line(&line);
        self.print_sinks.dispatch(&line);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("commands", &self.registry.len())
            .field("variables", &self.variables.len())
            .field("flag_mask", &self.flag_mask)
            .field("access_level", &self.access_level)
            .field("store_commands", &self.store_commands)
            .field("queued", &self.queue.len())
            .field("print_sinks", &self.print_sinks)
            .finish_non_exhaustive()
    }
}
