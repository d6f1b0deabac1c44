//! Command registry.
//!
//! Commands are kept in name order (case-sensitive, byte-wise) so listings
//! and completions are deterministic. Permanent commands live for the whole
//! session. Temporary commands belong to the loaded map and sit in a slab
//! whose slots are recycled: deregistered slots go on a free stack, and
//! dropping every temporary command just rewinds the slab.

use super::command::{CommandCallback, CommandDescriptor};
use super::flags::CommandFlags;
use super::permissions::AccessLevel;
use super::variables::VariableId;

/// Maximum byte length of a temporary command name.
pub const TEMP_NAME_LENGTH: usize = 32;
/// Maximum byte length of a temporary command's help text.
pub const TEMP_HELP_LENGTH: usize = 96;
/// Maximum byte length of a temporary command's format spec.
pub const TEMP_PARAMS_LENGTH: usize = 96;

/// Identifies a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Permanent(usize),
    Temporary(usize),
}

fn truncated(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Slab of temporary command slots.
#[derive(Debug, Default)]
struct TempArena {
    slots: Vec<CommandDescriptor>,
    used: usize,
    free: Vec<usize>,
}

impl TempArena {
    fn alloc(&mut self, name: &str, params: &str, help: &str, flags: CommandFlags) -> usize {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.used < self.slots.len() => {
                self.used += 1;
                self.used - 1
            }
            None => {
                self.slots.push(CommandDescriptor::new(
                    String::with_capacity(TEMP_NAME_LENGTH),
                    "",
                    String::with_capacity(TEMP_HELP_LENGTH),
                    CommandFlags::NONE,
                    None,
                ));
                self.used += 1;
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.name.clear();
        slot.name.push_str(truncated(name, TEMP_NAME_LENGTH));
        slot.help.clear();
        slot.help.push_str(truncated(help, TEMP_HELP_LENGTH));
        slot.params = super::args::FormatSpec::parse(truncated(params, TEMP_PARAMS_LENGTH));
        slot.flags = flags;
        slot.access = AccessLevel::Admin;
        slot.callback = None;
        slot.temporary = true;
        slot.toggle = None;
        index
    }

    fn release(&mut self, index: usize) {
        self.free.push(index);
    }

    fn reset(&mut self) {
        self.used = 0;
        self.free.clear();
    }
}

/// Central registry for console commands.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::{CommandFlags, CommandRegistry};
///
/// let mut registry = CommandRegistry::new();
/// registry.register_temporary("tune_zone", "i s f", CommandFlags::SERVER, "Tune a zone");
/// registry.register_temporary("say_team", "r", CommandFlags::SERVER, "");
///
/// let names: Vec<_> = registry.iter().map(|(_, c)| c.name()).collect();
/// assert_eq!(names, ["say_team", "tune_zone"]);
///
/// registry.deregister_all_temporary();
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct CommandRegistry {
    permanent: Vec<CommandDescriptor>,
    temporary: TempArena,
    order: Vec<CommandId>,
}

fn resolve<'a>(
    permanent: &'a [CommandDescriptor],
    temporary: &'a TempArena,
    id: CommandId,
) -> &'a CommandDescriptor {
    match id {
        CommandId::Permanent(i) => &permanent[i],
        CommandId::Temporary(i) => &temporary.slots[i],
    }
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_sorted(&mut self, id: CommandId) {
        let (permanent, temporary) = (&self.permanent, &self.temporary);
        let name = resolve(permanent, temporary, id).name();
        let pos = self
            .order
            .partition_point(|&other| resolve(permanent, temporary, other).name() < name);
        self.order.insert(pos, id);
    }

    /// Register or update a permanent command.
    ///
    /// A permanent command with the same name (case-insensitive) and an
    /// overlapping flag set is updated in place and keeps its access level.
    /// Chat commands always get the `User` level. Returns the id and whether
    /// the command is new.
    pub fn register(
        &mut self,
        name: &str,
        params: &str,
        help: &str,
        flags: CommandFlags,
        callback: CommandCallback,
        toggle: Option<VariableId>,
    ) -> (CommandId, bool) {
        let existing = self.order.iter().copied().find(|&id| {
            let desc = self.descriptor(id);
            !desc.temporary && desc.flags.intersects(flags) && desc.name.eq_ignore_ascii_case(name)
        });

        let (id, is_new) = match existing {
            Some(CommandId::Permanent(index)) => {
                bevy::log::debug!("Console: Overwriting existing command '{}'", name);
                let desc = &mut self.permanent[index];
                let renamed = desc.name != name;
                desc.name = name.to_string();
                desc.params = super::args::FormatSpec::parse(params);
                desc.help = help.to_string();
                desc.flags = flags;
                desc.callback = Some(callback);
                desc.toggle = toggle;

                let id = CommandId::Permanent(index);
                if renamed {
                    self.order.retain(|&other| other != id);
                    self.insert_sorted(id);
                }
                (id, false)
            }
            _ => {
                let mut desc = CommandDescriptor::new(
                    name.to_string(),
                    params,
                    help.to_string(),
                    flags,
                    Some(callback),
                );
                desc.toggle = toggle;
                self.permanent.push(desc);
                let id = CommandId::Permanent(self.permanent.len() - 1);
                self.insert_sorted(id);
                (id, true)
            }
        };

        if flags.contains(CommandFlags::CHAT) {
            self.descriptor_mut(id).access = AccessLevel::User;
        }
        (id, is_new)
    }

    /// Register a temporary command.
    ///
    /// Strings are cut to [`TEMP_NAME_LENGTH`], [`TEMP_HELP_LENGTH`] and
    /// [`TEMP_PARAMS_LENGTH`] bytes. Temporary commands have no callback.
    pub fn register_temporary(
        &mut self,
        name: &str,
        params: &str,
        flags: CommandFlags,
        help: &str,
    ) -> CommandId {
        let index = self.temporary.alloc(name, params, help, flags);
        let id = CommandId::Temporary(index);
        self.insert_sorted(id);
        id
    }

    /// Remove one temporary command by exact name.
    ///
    /// Returns `false` if there is no such temporary command.
    pub fn deregister_temporary(&mut self, name: &str) -> bool {
        let pos = self.order.iter().position(|&id| {
            matches!(id, CommandId::Temporary(_)) && self.descriptor(id).name == name
        });

        match pos {
            Some(pos) => {
                if let CommandId::Temporary(index) = self.order.remove(pos) {
                    self.temporary.release(index);
                }
                true
            }
            None => false,
        }
    }

    /// Remove every temporary command and rewind the slab.
    pub fn deregister_all_temporary(&mut self) {
        self.order.retain(|id| matches!(id, CommandId::Permanent(_)));
        self.temporary.reset();
    }

    /// Find the first command, in name order, whose flags intersect `mask`
    /// and whose name matches case-insensitively.
    pub fn find(&self, name: &str, mask: CommandFlags) -> Option<CommandId> {
        self.order.iter().copied().find(|&id| {
            let desc = self.descriptor(id);
            desc.flags.intersects(mask) && desc.name.eq_ignore_ascii_case(name)
        })
    }

    /// Get a command by id.
    pub fn get(&self, id: CommandId) -> Option<&CommandDescriptor> {
        if !self.order.contains(&id) {
            return None;
        }
        Some(self.descriptor(id))
    }

    /// Get a mutable command by id.
    pub fn get_mut(&mut self, id: CommandId) -> Option<&mut CommandDescriptor> {
        if !self.order.contains(&id) {
            return None;
        }
        Some(self.descriptor_mut(id))
    }

    /// Find a command by name and mask.
    pub fn get_by_name(&self, name: &str, mask: CommandFlags) -> Option<&CommandDescriptor> {
        self.find(name, mask).map(|id| self.descriptor(id))
    }

    fn descriptor(&self, id: CommandId) -> &CommandDescriptor {
        resolve(&self.permanent, &self.temporary, id)
    }

    fn descriptor_mut(&mut self, id: CommandId) -> &mut CommandDescriptor {
        match id {
            CommandId::Permanent(i) => &mut self.permanent[i],
            CommandId::Temporary(i) => &mut self.temporary.slots[i],
        }
    }

    /// Iterate over all commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &CommandDescriptor)> {
        self.order.iter().map(|&id| (id, self.descriptor(id)))
    }

    /// Get the number of registered commands.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of slots backing temporary commands, live or recycled.
    pub fn temporary_capacity(&self) -> usize {
        self.temporary.slots.len()
    }

    /// Number of live temporary commands.
    pub fn temporary_count(&self) -> usize {
        self.order
            .iter()
            .filter(|id| matches!(id, CommandId::Temporary(_)))
            .count()
    }

    /// Names containing `pattern` (case-insensitive), among commands whose
    /// flags intersect `mask` and whose lifetime matches `temporary`.
    pub fn possible_commands<'a>(
        &'a self,
        pattern: &'a str,
        mask: CommandFlags,
        temporary: bool,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let pattern = pattern.to_lowercase();
        self.iter()
            .filter(move |(_, desc)| {
                desc.flags.intersects(mask)
                    && desc.temporary == temporary
                    && desc.name.to_lowercase().contains(&pattern)
            })
            .map(|(_, desc)| desc.name())
    }

    /// Commands whose flags intersect `mask` and that an invoker at `level`
    /// may run.
    pub fn commands_for_access(
        &self,
        level: AccessLevel,
        mask: CommandFlags,
    ) -> impl Iterator<Item = &CommandDescriptor> {
        self.iter()
            .map(|(_, desc)| desc)
            .filter(move |desc| desc.flags.intersects(mask) && level.permits(desc.access))
    }

    /// Wrap the callback of the command `name` with a chain link.
    ///
    /// Returns `false` if no command matches.
    pub(crate) fn chain(
        &mut self,
        name: &str,
        mask: CommandFlags,
        link: impl FnOnce(Option<CommandCallback>) -> super::chain::ChainLink,
    ) -> bool {
        match self.find(name, mask) {
            Some(id) => {
                self.descriptor_mut(id).wrap_callback(link);
                true
            }
            None => false,
        }
    }
}
