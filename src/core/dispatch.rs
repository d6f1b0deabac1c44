//! Dispatch engine.
//!
//! Every line runs twice, once per [`Stroke`]. Commands whose name starts
//! with `+` receive the stroke as their first argument and run on both
//! passes; all other commands only run on the press.
//!
//! Per sub-command the engine looks the command up, checks the origin's
//! context and the invoker's access level, validates the arguments, resolves
//! the victim and then either stores the invocation or runs it.

use bevy::prelude::*;

use super::command::CommandCallback;
use super::console::{AuditRecord, Console, CONSOLE_SOURCE};
use super::error::DispatchError;
use super::flags::CommandFlags;
use super::output::OutputLevel;
use super::queue::QueueEntry;
use super::result::{CommandResult, Origin, Stroke, Victim};
use super::storage::StorageLocation;
use super::tokenizer::{split_commands, tokenize, TokenizedCommand};

/// Prefix forcing semicolon interpretation for the rest of the line.
pub const MULTI_COMMAND_PREFIX: &str = "mc;";

/// A command that passed every check, ready to run or be stored.
struct Invocation {
    name: String,
    flags: CommandFlags,
    callback: Option<CommandCallback>,
    result: CommandResult,
}

impl Console {
    /// Execute a line with `;` separating sub-commands.
    pub fn execute_line(&mut self, line: &str, origin: Origin, world: &mut World) {
        self.execute_line_with(line, origin, true, world);
    }

    /// Execute a line, choosing whether `;` separates sub-commands.
    ///
    /// A line starting with `mc;` always has its semicolons interpreted.
    pub fn execute_line_with(
        &mut self,
        line: &str,
        origin: Origin,
        interpret_semicolons: bool,
        world: &mut World,
    ) {
        self.execute_line_stroked(Stroke::Press, line, origin, interpret_semicolons, world);
        self.execute_line_stroked(Stroke::Release, line, origin, interpret_semicolons, world);
    }

    /// Execute a line with a temporarily replaced flag mask.
    pub fn execute_line_flag(
        &mut self,
        line: &str,
        mask: CommandFlags,
        origin: Origin,
        world: &mut World,
    ) {
        let previous = std::mem::replace(&mut self.flag_mask, mask);
        self.execute_line(line, origin, world);
        self.flag_mask = previous;
    }

    /// Run one stroke pass over a line.
    pub fn execute_line_stroked(
        &mut self,
        stroke: Stroke,
        line: &str,
        origin: Origin,
        interpret_semicolons: bool,
        world: &mut World,
    ) {
        let (line, interpret_semicolons) = match line.strip_prefix(MULTI_COMMAND_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, interpret_semicolons),
        };

        for part in split_commands(line, interpret_semicolons) {
            let outcome = match part {
                Ok(part) => match tokenize(part) {
                    Some(command) => self.dispatch(stroke, command, origin, world),
                    None => Ok(()),
                },
                Err(err) => Err(DispatchError::from(err)),
            };

            if let Err(err) = outcome {
                self.report(stroke, &err);
            }
        }
    }

    fn report(&self, stroke: Stroke, err: &DispatchError) {
        if err.press_only() && !stroke.is_press() {
            return;
        }
        debug!("Console: {} ({})", err, err.error_code());
        self.print(OutputLevel::Standard, CONSOLE_SOURCE, &err.to_string());
    }

    fn dispatch(
        &mut self,
        stroke: Stroke,
        command: TokenizedCommand<'_>,
        origin: Origin,
        world: &mut World,
    ) -> Result<(), DispatchError> {
        let Some(invocation) = self.prepare(stroke, command, origin)? else {
            return Ok(());
        };

        if self.store_commands && invocation.flags.contains(CommandFlags::STORE) {
            for result in self.expand_victims(invocation.result) {
                self.queue.push(QueueEntry::new(invocation.callback.clone(), result));
            }
            return Ok(());
        }

        if invocation.flags.contains(CommandFlags::TEST) && !self.test_commands {
            debug!("Console: Dropping test command '{}'", invocation.name);
            return Ok(());
        }

        if !invocation.flags.contains(CommandFlags::NON_HISTORIC) {
            if let Some(hook) = &self.audit_hook {
                hook(&AuditRecord {
                    client_id: origin.client_id(),
                    flag_mask: self.flag_mask,
                    command: &invocation.name,
                    result: &invocation.result,
                });
            }
        }

        match &invocation.callback {
            Some(callback) => {
                for result in self.expand_victims(invocation.result) {
                    callback.invoke(&result, self, world);
                }
            }
            None => debug!("Console: '{}' has no callback", invocation.name),
        }

        if invocation.flags.contains(CommandFlags::TEST) {
            self.cheated = true;
        }
        Ok(())
    }

    /// Look up, check and parse one sub-command.
    ///
    /// Returns `None` when the command has nothing to do on this stroke.
    fn prepare(
        &self,
        stroke: Stroke,
        command: TokenizedCommand<'_>,
        origin: Origin,
    ) -> Result<Option<Invocation>, DispatchError> {
        let desc = self
            .registry
            .get_by_name(command.name, self.flag_mask)
            .ok_or_else(|| DispatchError::UnknownCommand(command.name.to_string()))?;

        match origin {
            Origin::Map if !desc.flags().contains(CommandFlags::GAME) => {
                return Err(DispatchError::NotMapInvocable(desc.name().to_string()));
            }
            Origin::ServerConfig if desc.flags().contains(CommandFlags::GAME) => {
                return Err(DispatchError::MapOnly(desc.name().to_string()));
            }
            _ => {}
        }

        if !self.access_level.permits(desc.access_level()) {
            return Err(DispatchError::AccessDenied(desc.name().to_string()));
        }

        let is_stroke_command = desc.is_stroke_command();
        if !stroke.is_press() && !is_stroke_command {
            return Ok(None);
        }

        let mut result = CommandResult::new(command.name, origin);
        if is_stroke_command {
            result.push_argument(stroke.as_arg());
        }
        desc.params()
            .extract(command.tail, &mut result, self.max_clients)
            .map_err(|source| DispatchError::Usage {
                name: desc.name().to_string(),
                params: desc.params().to_string(),
                source,
            })?;

        if result.victim() == Victim::Me {
            result.set_victim(origin.client_id().map_or(Victim::None, Victim::Slot));
        }

        Ok(Some(Invocation {
            name: desc.name().to_string(),
            flags: desc.flags(),
            callback: desc.callback().cloned(),
            result,
        }))
    }

    /// One result per targeted slot for a victim of `all`.
    fn expand_victims(&self, result: CommandResult) -> Vec<CommandResult> {
        if result.victim() != Victim::All {
            return vec![result];
        }
        (0..self.max_clients)
            .map(|slot| {
                let mut targeted = result.clone();
                targeted.set_victim(Victim::Slot(slot));
                targeted
            })
            .collect()
    }

    /// Execute every line of a script.
    ///
    /// A script already being executed further up the call chain is skipped.
    /// Lines run with semicolons interpreted.
    pub fn execute_file(
        &mut self,
        name: &str,
        origin: Origin,
        log_failure: bool,
        location: StorageLocation,
        world: &mut World,
    ) -> bool {
        if self.exec_stack.iter().any(|running| running == name) {
            debug!("Console: Skipping recursive execution of '{}'", name);
            return false;
        }

        let lines = match self.storage.read_lines(name, location) {
            Ok(lines) => lines,
            Err(err) => {
                if log_failure {
                    self.print(OutputLevel::Standard, CONSOLE_SOURCE, &format!("failed to open '{name}'"));
                }
                debug!("Console: {}", err);
                return false;
            }
        };

        self.print(OutputLevel::Standard, CONSOLE_SOURCE, &format!("executing '{name}'"));
        self.exec_stack.push(name.to_string());
        for line in &lines {
            self.execute_line(line, origin, world);
        }
        self.exec_stack.pop();
        true
    }

    /// Execute command-line arguments.
    ///
    /// `-f <file>` executes a script by absolute path, `-s` and `--silent`
    /// are skipped, and anything else is executed as a line.
    pub fn execute_arguments<S: AsRef<str>>(&mut self, args: &[S], world: &mut World) {
        let mut args = args.iter().map(AsRef::as_ref);
        while let Some(arg) = args.next() {
            match arg {
                "-f" => {
                    if let Some(file) = args.next() {
                        self.execute_file(file, Origin::Console, true, StorageLocation::Absolute, world);
                    }
                }
                "-s" | "--silent" => {}
                line => self.execute_line(line, Origin::Console, world),
            }
        }
    }

    /// Check that every sub-command of `line` names a known command and has
    /// valid arguments. A single trailing `;` is allowed.
    pub fn line_is_valid(&self, line: &str) -> bool {
        if line.is_empty() {
            return false;
        }
        let line = line.strip_suffix(';').unwrap_or(line);

        split_commands(line, true).all(|part| {
            let Ok(part) = part else { return false };
            let Some(command) = tokenize(part) else { return false };
            let Some(desc) = self.registry.get_by_name(command.name, self.flag_mask) else {
                return false;
            };
            let mut result = CommandResult::new(command.name, Origin::Console);
            desc.params()
                .extract(command.tail, &mut result, self.max_clients)
                .is_ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::{AccessLevel, ConsoleCommand, MemoryStorage};

    type Calls = Arc<Mutex<Vec<(String, Vec<String>, Victim)>>>;

    fn recorder(console: &mut Console, name: &str, params: &str, flags: CommandFlags) -> Calls {
        let calls: Calls = Arc::default();
        let sink = calls.clone();
        console.register(
            ConsoleCommand::new(name, params, move |result, _, _| {
                sink.lock().unwrap().push((
                    result.command().to_string(),
                    result.arguments().map(String::from).collect(),
                    result.victim(),
                ));
            })
            .flags(flags),
        );
        calls
    }

    fn capture(console: &mut Console) -> Arc<Mutex<Vec<String>>> {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        console.register_print_callback(OutputLevel::Debug, move |line| {
            sink.lock().unwrap().push(line.message.clone());
        });
        lines
    }

    fn args(calls: &Calls) -> Vec<Vec<String>> {
        calls.lock().unwrap().iter().map(|(_, args, _)| args.clone()).collect()
    }

    #[test]
    fn test_semicolon_split() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "say", "r", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_line("say hi; say bye", Origin::Console, &mut world);
        assert_eq!(args(&calls), vec![vec!["hi"], vec!["bye"]]);
    }

    #[test]
    fn test_semicolons_not_interpreted() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "say", "r", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_line_with("say hi; say bye", Origin::Console, false, &mut world);
        assert_eq!(args(&calls), vec![vec!["hi; say bye"]]);

        console.execute_line_with("mc;say a;say b", Origin::Console, false, &mut world);
        assert_eq!(args(&calls).len(), 3);
    }

    #[test]
    fn test_unknown_command_reported_once() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        let mut world = World::new();

        console.execute_line("frobnicate 1", Origin::Console, &mut world);
        assert_eq!(*lines.lock().unwrap(), vec!["No such command: frobnicate."]);
    }

    #[test]
    fn test_usage_error_keeps_siblings() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        let calls = recorder(&mut console, "kick", "v[id] ?r[reason]", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_line("kick; kick 3", Origin::Console, &mut world);
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["Invalid arguments... Usage: kick v[id] ?r[reason]"]
        );
        assert_eq!(calls.lock().unwrap()[0].2, Victim::Slot(3));
    }

    #[test]
    fn test_unterminated_quote_aborts_rest() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "say", "r", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_line("say one; say \"two; say three", Origin::Console, &mut world);
        assert_eq!(args(&calls), vec![vec!["one"]]);
    }

    #[test]
    fn test_access_levels() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        let calls = recorder(&mut console, "mute", "v", CommandFlags::SERVER);
        let id = console.registry().find("mute", CommandFlags::SERVER).unwrap();
        console
            .registry_mut()
            .get_mut(id)
            .unwrap()
            .set_access_level(AccessLevel::Helper);
        let mut world = World::new();

        for level in [AccessLevel::Admin, AccessLevel::Moderator, AccessLevel::Helper] {
            console.set_access_level(level);
            console.execute_line("mute 1", Origin::Client(0), &mut world);
        }
        assert_eq!(calls.lock().unwrap().len(), 3);

        console.set_access_level(AccessLevel::User);
        console.execute_line("mute 1", Origin::Client(0), &mut world);
        assert_eq!(calls.lock().unwrap().len(), 3);
        assert_eq!(*lines.lock().unwrap(), vec!["Access for command mute denied."]);
    }

    #[test]
    fn test_context_policy() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        let plain = recorder(&mut console, "shutdown", "", CommandFlags::SERVER);
        let game = recorder(&mut console, "tune", "s f", CommandFlags::SERVER | CommandFlags::GAME);
        let mut world = World::new();

        console.execute_line("shutdown", Origin::Map, &mut world);
        console.execute_line("tune gravity 0.5", Origin::ServerConfig, &mut world);
        assert!(plain.lock().unwrap().is_empty());
        assert!(game.lock().unwrap().is_empty());
        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "Command 'shutdown' cannot be executed from a map.",
                "Command 'tune' cannot be executed from a non-map config file.",
            ]
        );

        console.execute_line("tune gravity 0.5", Origin::Map, &mut world);
        assert_eq!(game.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stroke_commands_run_twice() {
        let mut console = Console::new();
        console.set_flag_mask(CommandFlags::CLIENT);
        let stroke = recorder(&mut console, "+fire", "", CommandFlags::CLIENT);
        let plain = recorder(&mut console, "kill", "", CommandFlags::CLIENT);
        let mut world = World::new();

        console.execute_line("+fire; kill", Origin::Console, &mut world);
        assert_eq!(args(&stroke), vec![vec!["1"], vec!["0"]]);
        assert_eq!(plain.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_victim_me_resolves_to_invoker() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "kill", "?i v", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_line("kill", Origin::Client(12), &mut world);
        console.execute_line("kill", Origin::Console, &mut world);
        let victims: Vec<_> = calls.lock().unwrap().iter().map(|c| c.2).collect();
        assert_eq!(victims, vec![Victim::Slot(12), Victim::None]);
    }

    #[test]
    fn test_victim_all_expands() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "kill", "v", CommandFlags::SERVER);
        let audits = Arc::new(Mutex::new(0));
        let audit_count = audits.clone();
        console.set_audit_hook(move |_| *audit_count.lock().unwrap() += 1);
        let mut world = World::new();

        console.execute_line("kill all", Origin::Console, &mut world);
        let victims: Vec<_> = calls.lock().unwrap().iter().map(|c| c.2).collect();
        assert_eq!(victims, (0..64).map(Victim::Slot).collect::<Vec<_>>());
        assert_eq!(*audits.lock().unwrap(), 1);
    }

    #[test]
    fn test_audit_hook_skips_non_historic() {
        let mut console = Console::new();
        recorder(&mut console, "rcon_login", "r", CommandFlags::SERVER | CommandFlags::NON_HISTORIC);
        recorder(&mut console, "ban", "v", CommandFlags::SERVER);
        let audited = Arc::new(Mutex::new(Vec::new()));
        let sink = audited.clone();
        console.set_audit_hook(move |record| {
            sink.lock()
                .unwrap()
                .push((record.client_id, record.command.to_string()));
        });
        let mut world = World::new();

        console.execute_line("rcon_login secret; ban 4", Origin::Client(2), &mut world);
        assert_eq!(*audited.lock().unwrap(), vec![(Some(2), "ban".to_string())]);
    }

    #[test]
    fn test_test_commands() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "tele", "", CommandFlags::SERVER | CommandFlags::TEST);
        let mut world = World::new();

        console.execute_line("tele", Origin::Console, &mut world);
        assert!(calls.lock().unwrap().is_empty());
        assert!(!console.is_cheated());

        console.set_test_commands(true);
        console.execute_line("tele", Origin::Console, &mut world);
        console.set_test_commands(false);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(console.is_cheated());
    }

    #[test]
    fn test_store_and_replay() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "sv_map", "r", CommandFlags::SERVER | CommandFlags::STORE);
        let mut world = World::new();

        console.set_store_commands(true, &mut world);
        console.execute_line("sv_map a; sv_map b; sv_map c", Origin::Console, &mut world);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(console.stored_commands().len(), 3);

        console.set_store_commands(false, &mut world);
        assert_eq!(args(&calls), vec![vec!["a"], vec!["b"], vec!["c"]]);
        assert!(console.stored_commands().is_empty());

        console.set_store_commands(false, &mut world);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_execute_file_recursion_guard() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        let calls = recorder(&mut console, "say", "r", CommandFlags::SERVER);
        console.set_storage(
            MemoryStorage::new()
                .with_script("a.cfg", "say a1\nexec b.cfg\nsay a2")
                .with_script("b.cfg", "say b1\nexec a.cfg\nsay b2"),
        );
        let mut world = World::new();

        assert!(console.execute_file("a.cfg", Origin::Console, true, StorageLocation::All, &mut world));
        assert_eq!(
            args(&calls),
            vec![vec!["a1"], vec!["b1"], vec!["b2"], vec!["a2"]]
        );
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["executing 'a.cfg'", "executing 'b.cfg'"]
        );
    }

    #[test]
    fn test_execute_file_missing() {
        let mut console = Console::new();
        let lines = capture(&mut console);
        console.set_storage(MemoryStorage::new());
        let mut world = World::new();

        assert!(!console.execute_file("gone.cfg", Origin::Console, false, StorageLocation::All, &mut world));
        assert!(lines.lock().unwrap().is_empty());
        assert!(!console.execute_file("gone.cfg", Origin::Console, true, StorageLocation::All, &mut world));
        assert_eq!(*lines.lock().unwrap(), vec!["failed to open 'gone.cfg'"]);
    }

    #[test]
    fn test_execute_arguments() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "say", "r", CommandFlags::SERVER);
        let mut world = World::new();

        console.execute_arguments(&["-s", "say one", "--silent", "say two"], &mut world);
        assert_eq!(args(&calls), vec![vec!["one"], vec!["two"]]);
    }

    #[test]
    fn test_execute_line_flag_restores_mask() {
        let mut console = Console::new();
        let calls = recorder(&mut console, "whisper", "r", CommandFlags::CHAT);
        let mut world = World::new();

        console.execute_line("whisper hi", Origin::Client(1), &mut world);
        assert!(calls.lock().unwrap().is_empty());

        console.execute_line_flag("whisper hi", CommandFlags::CHAT, Origin::Client(1), &mut world);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(console.flag_mask(), CommandFlags::SERVER);
    }

    #[test]
    fn test_line_is_valid() {
        let mut console = Console::new();
        recorder(&mut console, "kick", "v ?r", CommandFlags::SERVER);

        assert!(console.line_is_valid("kick 1 spam; echo hi"));
        assert!(console.line_is_valid("kick 1;"));
        assert!(!console.line_is_valid("kick 1;;"));
        assert!(!console.line_is_valid("kick 1; "));
        assert!(!console.line_is_valid(""));
        assert!(!console.line_is_valid("kick"));
        assert!(!console.line_is_valid("kick 1; nope"));
        assert!(!console.line_is_valid("echo \"open"));
    }
}
