//! Parsed invocation results.
//!
//! A [`CommandResult`] is built for every dispatched sub-command and handed
//! to the command's callback. Arguments are kept as strings and interpreted
//! lazily by the getters.

use bevy::color::Hsla;

use super::color::parse_color;

/// Default number of client slots.
pub const DEFAULT_MAX_CLIENTS: usize = 64;

/// Where a command line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// The local console or a key binding; not a client.
    #[default]
    Console,
    /// A connected client (rcon or chat), by slot.
    Client(usize),
    /// A map script. May only run map-invocable commands.
    Map,
    /// A plain (non-map) config file. May not run map-only commands.
    ServerConfig,
}

impl Origin {
    /// Client slot of this origin, if it is a client.
    #[inline]
    pub fn client_id(self) -> Option<usize> {
        match self {
            Origin::Client(id) => Some(id),
            _ => None,
        }
    }

    /// Whether the line came from a map script.
    #[inline]
    pub fn is_map(self) -> bool {
        self == Origin::Map
    }
}

/// Client slot(s) targeted by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Victim {
    /// No victim argument.
    #[default]
    None,
    /// The invoking client, resolved at dispatch time.
    Me,
    /// Every client slot.
    All,
    /// An explicit client slot.
    Slot(usize),
}

impl Victim {
    /// Interpret a victim token.
    ///
    /// Numbers are clamped to `0..max_clients`; non-numbers read as 0.
    pub fn parse(token: &str, max_clients: usize) -> Self {
        match token {
            "me" => Victim::Me,
            "all" => Victim::All,
            _ => {
                let last = max_clients.saturating_sub(1) as i64;
                Victim::Slot((parse_int_prefix(token) as i64).clamp(0, last) as usize)
            }
        }
    }
}

/// Key stroke of a dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stroke {
    Press,
    Release,
}

impl Stroke {
    /// The synthetic argument passed to `+` commands.
    #[inline]
    pub fn as_arg(self) -> &'static str {
        match self {
            Stroke::Press => "1",
            Stroke::Release => "0",
        }
    }

    #[inline]
    pub fn is_press(self) -> bool {
        self == Stroke::Press
    }
}

/// `atoi`-style parse: leading whitespace, optional sign, then digits.
///
/// Returns 0 when no digits follow; saturates on overflow.
pub fn parse_int_prefix(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// `atof`-style parse: the longest numeric prefix, or 0.0.
pub fn parse_float_prefix(s: &str) -> f32 {
    let s = s.trim_start();
    let candidate_len = s
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        .count();

    (1..=candidate_len)
        .rev()
        .find_map(|end| s[..end].parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// The parsed form of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    command: String,
    args: Vec<String>,
    victim: Victim,
    origin: Origin,
}

impl CommandResult {
    /// Create an empty result for a command invoked from `origin`.
    pub fn new(command: impl Into<String>, origin: Origin) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            victim: Victim::None,
            origin,
        }
    }

    /// The command name as typed.
    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Where the invocation came from.
    #[inline]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Number of extracted arguments.
    #[inline]
    pub fn num_arguments(&self) -> usize {
        self.args.len()
    }

    /// Append an argument.
    pub fn push_argument(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// Iterate over the arguments.
    pub fn arguments(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(String::as_str)
    }

    /// Get an argument, or `""` when out of range.
    #[inline]
    pub fn get_string(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    /// Get an argument as an integer (`atoi` semantics), or 0.
    pub fn get_integer(&self, index: usize) -> i32 {
        self.args.get(index).map(|s| parse_int_prefix(s)).unwrap_or(0)
    }

    /// Get an argument as a float (`atof` semantics), or 0.0.
    pub fn get_float(&self, index: usize) -> f32 {
        self.args.get(index).map(|s| parse_float_prefix(s)).unwrap_or(0.0)
    }

    /// Get an argument as a colour. Missing arguments read as black.
    pub fn get_color(&self, index: usize, light: bool) -> Hsla {
        match self.args.get(index) {
            Some(token) => parse_color(token, light),
            None => Hsla::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    /// The victim of this invocation.
    #[inline]
    pub fn victim(&self) -> Victim {
        self.victim
    }

    /// Whether a victim was given (or defaulted).
    #[inline]
    pub fn has_victim(&self) -> bool {
        self.victim != Victim::None
    }

    /// Set the victim.
    #[inline]
    pub fn set_victim(&mut self, victim: Victim) {
        self.victim = victim;
    }

    /// The targeted client slot, once the victim has been resolved.
    #[inline]
    pub fn victim_slot(&self) -> Option<usize> {
        match self.victim {
            Victim::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    pub(crate) fn truncate_arguments(&mut self, len: usize) {
        self.args.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefix() {
        assert_eq!(parse_int_prefix("42"), 42);
        assert_eq!(parse_int_prefix("  -17abc"), -17);
        assert_eq!(parse_int_prefix("+8"), 8);
        assert_eq!(parse_int_prefix("abc"), 0);
        assert_eq!(parse_int_prefix(""), 0);
        assert_eq!(parse_int_prefix("99999999999"), i32::MAX);
        assert_eq!(parse_int_prefix("-99999999999"), i32::MIN);
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(parse_float_prefix("1.5"), 1.5);
        assert_eq!(parse_float_prefix("-2.25xyz"), -2.25);
        assert_eq!(parse_float_prefix("3e2"), 300.0);
        assert_eq!(parse_float_prefix("nope"), 0.0);
    }

    #[test]
    fn test_victim_parse() {
        assert_eq!(Victim::parse("me", 64), Victim::Me);
        assert_eq!(Victim::parse("all", 64), Victim::All);
        assert_eq!(Victim::parse("12", 64), Victim::Slot(12));
        assert_eq!(Victim::parse("200", 64), Victim::Slot(63));
        assert_eq!(Victim::parse("-4", 64), Victim::Slot(0));
        assert_eq!(Victim::parse("bob", 64), Victim::Slot(0));
    }

    #[test]
    fn test_result_getters() {
        let mut result = CommandResult::new("tune", Origin::Console);
        result.push_argument("gravity");
        result.push_argument("0.5");
        result.push_argument("7");

        assert_eq!(result.num_arguments(), 3);
        assert_eq!(result.get_string(0), "gravity");
        assert_eq!(result.get_float(1), 0.5);
        assert_eq!(result.get_integer(2), 7);
        assert_eq!(result.get_string(9), "");
        assert_eq!(result.get_integer(9), 0);
        assert!(!result.has_victim());
    }

    #[test]
    fn test_stroke_args() {
        assert_eq!(Stroke::Press.as_arg(), "1");
        assert_eq!(Stroke::Release.as_arg(), "0");
        assert!(Stroke::Press.is_press());
    }
}
