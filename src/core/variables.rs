//! Config variables bound to console commands.
//!
//! Every [`ConfigVar`] registered with the console gets a command of the same
//! name. Invoking it with an argument sets the value; invoking it bare prints
//! the current value. Three kinds exist: integers with an optional range,
//! strings with a maximum length, and packed HSL colours.

use std::fmt;

use bevy::color::Srgba;

use super::color::{DARKEST_LIGHTNESS, pack_hsla, parse_color, unclamp_lighting, unpack_hsla};
use super::flags::CommandFlags;
use super::result::{CommandResult, Origin};

/// Handle of a variable inside a [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    /// Index of the variable in its store.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Current, default or remembered value of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Int(i32),
    Str(String),
    /// Packed HSL(A).
    Color(u32),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Int(v) => write!(f, "{v}"),
            VariableValue::Str(s) => f.write_str(s),
            VariableValue::Color(c) => write!(f, "{c}"),
        }
    }
}

/// Constraints of a variable, by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Clamped to `min..=max` when `min != max`. A `max` of 0 means no upper bound.
    Int { min: i32, max: i32 },
    /// At most `max_len` bytes, cut on a character boundary.
    Str { max_len: usize },
    /// `light` colours never go darker than half lightness.
    Color { light: bool, alpha: bool },
}

/// A config variable.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::{CommandFlags, ConfigVar, VariableValue};
///
/// let var = ConfigVar::int("sv_max_clients", 64)
///     .range(1, 64)
///     .flags(CommandFlags::SERVER | CommandFlags::SAVE)
///     .help("Maximum number of clients");
///
/// assert_eq!(var.name(), "sv_max_clients");
/// assert_eq!(var.value(), &VariableValue::Int(64));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigVar {
    name: String,
    help: String,
    flags: CommandFlags,
    kind: VariableKind,
    value: VariableValue,
    default: VariableValue,
    old: VariableValue,
}

impl ConfigVar {
    fn new(name: impl Into<String>, kind: VariableKind, default: VariableValue) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            flags: CommandFlags::NONE,
            kind,
            value: default.clone(),
            old: default.clone(),
            default,
        }
    }

    /// An unbounded integer variable.
    pub fn int(name: impl Into<String>, default: i32) -> Self {
        Self::new(name, VariableKind::Int { min: 0, max: 0 }, VariableValue::Int(default))
    }

    /// A string variable limited to 255 bytes.
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(
            name,
            VariableKind::Str { max_len: 255 },
            VariableValue::Str(default.into()),
        )
    }

    /// A packed HSL colour variable.
    pub fn color(name: impl Into<String>, default: u32) -> Self {
        Self::new(
            name,
            VariableKind::Color { light: false, alpha: false },
            VariableValue::Color(default),
        )
    }

    /// Set the integer range. Has no effect on other kinds.
    pub fn range(mut self, min: i32, max: i32) -> Self {
        if let VariableKind::Int { .. } = self.kind {
            self.kind = VariableKind::Int { min, max };
        }
        self
    }

    /// Set the maximum string length in bytes. Has no effect on other kinds.
    pub fn max_len(mut self, max_len: usize) -> Self {
        if let VariableKind::Str { .. } = self.kind {
            self.kind = VariableKind::Str { max_len };
            if let VariableValue::Str(s) = &mut self.value {
                truncate_on_char_boundary(s, max_len);
            }
        }
        self
    }

    /// Mark a colour as light. Has no effect on other kinds.
    pub fn light(mut self) -> Self {
        if let VariableKind::Color { alpha, .. } = self.kind {
            self.kind = VariableKind::Color { light: true, alpha };
        }
        self
    }

    /// Give a colour an alpha channel. Has no effect on other kinds.
    pub fn alpha(mut self) -> Self {
        if let VariableKind::Color { light, .. } = self.kind {
            self.kind = VariableKind::Color { light, alpha: true };
        }
        self
    }

    /// Set the flags of the variable and its command.
    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn get_help(&self) -> &str {
        &self.help
    }

    #[inline]
    pub fn get_flags(&self) -> CommandFlags {
        self.flags
    }

    #[inline]
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    #[inline]
    pub fn default_value(&self) -> &VariableValue {
        &self.default
    }

    /// The value last set from outside a map script.
    #[inline]
    pub fn old_value(&self) -> &VariableValue {
        &self.old
    }

    /// Check if the value differs from the default.
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }

    /// Format spec of the bound command.
    pub fn params(&self) -> &'static str {
        match self.kind {
            VariableKind::Int { .. } => "?i",
            VariableKind::Str { .. } => "?r",
            VariableKind::Color { .. } => "?i",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self.value {
            VariableValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            VariableValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<u32> {
        match self.value {
            VariableValue::Color(c) => Some(c),
            _ => None,
        }
    }

    /// Clamp an integer the way the bound command does.
    pub fn clamp_int(&self, value: i32) -> i32 {
        match self.kind {
            VariableKind::Int { min, max } if min != max => {
                let value = value.max(min);
                if max != 0 { value.min(max) } else { value }
            }
            _ => value,
        }
    }

    /// Pack a colour token the way the bound command stores it.
    pub fn pack_color_token(&self, token: &str) -> u32 {
        let (light, alpha) = match self.kind {
            VariableKind::Color { light, alpha } => (light, alpha),
            _ => (false, false),
        };
        let darkest = if light { DARKEST_LIGHTNESS } else { 0.0 };
        pack_hsla(parse_color(token, light), darkest, alpha)
    }

    /// Set the value from the first argument of `result`.
    ///
    /// Values set from a map script are not remembered, so they can be
    /// undone by [`ConfigStore::reset_game_settings`].
    pub fn set_from_result(&mut self, result: &CommandResult) {
        let value = match self.kind {
            VariableKind::Int { .. } => VariableValue::Int(self.clamp_int(result.get_integer(0))),
            VariableKind::Str { max_len } => {
                let mut s = result.get_string(0).to_string();
                truncate_on_char_boundary(&mut s, max_len);
                VariableValue::Str(s)
            }
            VariableKind::Color { .. } => VariableValue::Color(self.pack_color_token(result.get_string(0))),
        };

        if result.origin() != Origin::Map {
            self.old = value.clone();
        }
        self.value = value;
    }

    /// Lines printed when the bound command is invoked without arguments.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!("Value: {}", self.value)];

        if let (VariableValue::Color(packed), VariableKind::Color { light, alpha }) =
            (&self.value, self.kind)
        {
            let mut hsl = unpack_hsla(*packed, true);
            if light {
                hsl = unclamp_lighting(hsl);
            }
            lines.push(format!(
                "H: {}°, S: {}%, L: {}%",
                hsl.hue.round() as i32,
                (hsl.saturation * 100.0).round() as i32,
                (hsl.lightness * 100.0).round() as i32
            ));

            let rgb = Srgba::from(hsl);
            let [r, g, b] = [rgb.red, rgb.green, rgb.blue].map(|c| (c * 255.0).round() as u32);
            lines.push(format!(
                "R: {r}, G: {g}, B: {b}, #{:06X}",
                (r << 16) | (g << 8) | b
            ));

            if alpha {
                lines.push(format!("A: {}%", (hsl.alpha * 100.0).round() as i32));
            }
        }
        lines
    }

    /// Run the bound command: set with an argument, describe without.
    ///
    /// Returns the lines to print.
    pub fn apply(&mut self, result: &CommandResult) -> Vec<String> {
        if result.num_arguments() > 0 {
            self.set_from_result(result);
            Vec::new()
        } else {
            self.describe()
        }
    }

    /// Restore the remembered value.
    pub fn restore_old_value(&mut self) -> bool {
        if self.value == self.old {
            return false;
        }
        self.value = self.old.clone();
        true
    }
}

fn truncate_on_char_boundary(s: &mut String, max_len: usize) {
    if s.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// Storage for all config variables.
#[derive(Debug, Default)]
pub struct ConfigStore {
    vars: Vec<ConfigVar>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, replacing one with the same name (case-insensitive).
    ///
    /// Returns the id and whether the variable is new.
    pub fn insert(&mut self, var: ConfigVar) -> (VariableId, bool) {
        let existing = self
            .vars
            .iter()
            .position(|v| v.name.eq_ignore_ascii_case(&var.name));
        if let Some(index) = existing {
            self.vars[index] = var;
            (VariableId(index), false)
        } else {
            self.vars.push(var);
            (VariableId(self.vars.len() - 1), true)
        }
    }

    #[inline]
    pub fn get(&self, id: VariableId) -> Option<&ConfigVar> {
        self.vars.get(id.0)
    }

    #[inline]
    pub fn get_mut(&mut self, id: VariableId) -> Option<&mut ConfigVar> {
        self.vars.get_mut(id.0)
    }

    /// Look a variable up by name (case-insensitive).
    pub fn id_of(&self, name: &str) -> Option<VariableId> {
        self.vars
            .iter()
            .position(|v| v.name.eq_ignore_ascii_case(name))
            .map(VariableId)
    }

    pub fn by_name(&self, name: &str) -> Option<&ConfigVar> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &ConfigVar)> {
        self.vars.iter().enumerate().map(|(i, v)| (VariableId(i), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Undo map-script changes to server game settings.
    ///
    /// Every variable flagged both `SERVER` and `GAME` gets its remembered
    /// value back. Returns how many changed.
    pub fn reset_game_settings(&mut self) -> usize {
        let game = CommandFlags::SERVER | CommandFlags::GAME;
        self.vars
            .iter_mut()
            .filter(|v| v.flags.contains(game))
            .map(ConfigVar::restore_old_value)
            .filter(|&changed| changed)
            .count()
    }
}
