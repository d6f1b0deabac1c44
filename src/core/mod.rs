//! Core console engine with zero optional dependencies.
//!
//! This module provides the fundamental building blocks:
//! - [`Console`] - The console resource: registration, dispatch, output
//! - [`CommandRegistry`] - Sorted command storage with a temporary slab
//! - [`FormatSpec`] - Argument format specs and validation
//! - [`ConfigVar`] - Int, string and colour variables bound to commands
//! - [`tokenize`] / [`split_commands`] - Line tokenizer
//! - Messages for communication between layers

mod args;
mod builtins;
mod chain;
mod color;
mod command;
mod console;
mod dispatch;
mod error;
mod events;
mod flags;
mod output;
mod permissions;
mod queue;
mod registry;
mod result;
mod storage;
mod tokenizer;
mod variables;

pub use args::{ArgKind, Directive, FormatSpec};
pub use builtins::ACCESS_STATUS_LINE_LIMIT;
pub use chain::{ChainInterceptor, ChainLink, ChainNext};
pub use color::{pack_hsla, parse_color, unclamp_lighting, unpack_hsla, DARKEST_LIGHTNESS};
pub use command::{CommandCallback, CommandDescriptor, CommandHandler, ConsoleCommand};
pub use console::{AuditHook, AuditRecord, Console, CONSOLE_SOURCE};
pub use dispatch::MULTI_COMMAND_PREFIX;
pub use error::{DispatchError, StorageError, TokenizeError, ValidationError};
pub use events::{ConsoleEventsPlugin, ConsoleInputEvent, ConsoleOutputEvent, ConsoleStrokeEvent};
pub use flags::CommandFlags;
pub use output::{ConsoleLine, OutputLevel, PrintCallback, PrintSinks, MAX_PRINT_CALLBACKS};
pub use permissions::AccessLevel;
pub use queue::{ExecutionQueue, QueueEntry};
pub use registry::{
    CommandId, CommandRegistry, TEMP_HELP_LENGTH, TEMP_NAME_LENGTH, TEMP_PARAMS_LENGTH,
};
pub use result::{
    parse_float_prefix, parse_int_prefix, CommandResult, Origin, Stroke, Victim,
    DEFAULT_MAX_CLIENTS,
};
pub use storage::{script_lines, FileStorage, MemoryStorage, ScriptStorage, StorageLocation};
pub use tokenizer::{escape, split_commands, tokenize, Subcommands, TokenizedCommand};
pub use variables::{ConfigStore, ConfigVar, VariableId, VariableKind, VariableValue};
