//! Format specs and argument extraction.
//!
//! A format spec is a compact string such as `v[id] ?r[reason]`. Each letter
//! is one positional argument:
//!
//! | Letter | Argument |
//! |--------|----------|
//! | `i`    | integer  |
//! | `f`    | float    |
//! | `s`    | whitespace-delimited string |
//! | `r`    | rest of the line, verbatim |
//! | `v`    | victim: `me`, `all` or a client slot |
//!
//! A `?` makes every following argument optional. A bracketed `[hint]` after
//! a letter names the argument for help output and has no effect on parsing.

use std::fmt;

use super::error::ValidationError;
use super::result::{CommandResult, Victim};
use super::tokenizer::{is_space, skip_spaces};

/// Kind of a single format directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Int,
    Float,
    Str,
    Rest,
    Victim,
}

impl ArgKind {
    fn from_letter(letter: char) -> Self {
        match letter {
            'i' => ArgKind::Int,
            'f' => ArgKind::Float,
            'r' => ArgKind::Rest,
            'v' => ArgKind::Victim,
            // Anything else reads like a plain string
            _ => ArgKind::Str,
        }
    }
}

/// One directive of a format spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: ArgKind,
    pub optional: bool,
    pub hint: Option<String>,
}

/// A parsed format spec.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::{ArgKind, FormatSpec};
///
/// let spec = FormatSpec::parse("v[id] ?r[reason]");
/// assert_eq!(spec.len(), 2);
/// assert_eq!(spec.directives()[0].kind, ArgKind::Victim);
/// assert!(spec.directives()[1].optional);
/// assert_eq!(spec.as_str(), "v[id] ?r[reason]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSpec {
    source: String,
    directives: Vec<Directive>,
}

impl FormatSpec {
    /// Parse a format spec string. Parsing never fails.
    pub fn parse(spec: &str) -> Self {
        let mut directives: Vec<Directive> = Vec::new();
        let mut optional = false;
        let mut chars = spec.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '?' => optional = true,
                '[' => {
                    let body = &spec[pos + 1..];
                    let len = body.find(']').unwrap_or(body.len());
                    if let Some(last) = directives.last_mut() {
                        last.hint = Some(body[..len].to_string());
                    }
                    // Skip the hint body and its closing bracket
                    while chars.next_if(|&(p, _)| p <= pos + len + 1).is_some() {}
                }
                letter => directives.push(Directive {
                    kind: ArgKind::from_letter(letter),
                    optional,
                    hint: None,
                }),
            }
        }

        Self {
            source: spec.to_string(),
            directives,
        }
    }

    /// The spec as written.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parsed directives.
    #[inline]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Number of directives.
    #[inline]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether the spec takes no arguments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Number of arguments that must be present.
    pub fn required(&self) -> usize {
        self.directives.iter().filter(|d| !d.optional).count()
    }

    /// Extract the arguments of `tail` into `result`.
    ///
    /// Arguments already present in `result` (such as a stroke flag) are kept
    /// and the extracted ones are appended after them. On failure `result`
    /// keeps only those prior arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use bevy_console_engine::core::{CommandResult, FormatSpec, Origin};
    ///
    /// let spec = FormatSpec::parse("s[x]");
    /// let mut result = CommandResult::new("say", Origin::Console);
    /// spec.extract(r#""a\"b""#, &mut result, 64).unwrap();
    /// assert_eq!(result.get_string(0), "a\"b");
    /// ```
    pub fn extract(
        &self,
        tail: &str,
        result: &mut CommandResult,
        max_clients: usize,
    ) -> Result<(), ValidationError> {
        let preset = result.num_arguments();
        result.set_victim(Victim::None);

        let outcome = self.extract_inner(tail, result, max_clients);
        if outcome.is_err() {
            result.truncate_arguments(preset);
            result.set_victim(Victim::None);
        }
        outcome
    }

    fn extract_inner(
        &self,
        tail: &str,
        result: &mut CommandResult,
        max_clients: usize,
    ) -> Result<(), ValidationError> {
        let mut rest = tail;

        for (index, directive) in self.directives.iter().enumerate() {
            rest = skip_spaces(rest);

            if rest.is_empty() {
                if !directive.optional {
                    return Err(ValidationError::MissingArgument { index });
                }
                // An omitted optional victim targets the invoker
                if self.directives[index..].iter().any(|d| d.kind == ArgKind::Victim) {
                    result.set_victim(Victim::Me);
                }
                return Ok(());
            }

            let quoted = rest.starts_with('"');
            let token = if let Some(body) = rest.strip_prefix('"') {
                let (token, after) = read_quoted(body)?;
                rest = after;
                token
            } else if directive.kind == ArgKind::Rest {
                let token = rest.to_string();
                rest = "";
                token
            } else {
                let end = rest.bytes().position(is_space).unwrap_or(rest.len());
                let token = rest[..end].to_string();
                rest = &rest[end..];
                token
            };

            if directive.kind == ArgKind::Victim && !quoted {
                result.set_victim(Victim::parse(&token, max_clients));
            }
            result.push_argument(token);

            if directive.kind == ArgKind::Rest {
                break;
            }
        }

        Ok(())
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Read a quoted token whose opening quote was already consumed.
///
/// Returns the unescaped token and the text after the closing quote.
fn read_quoted(input: &str) -> Result<(String, &str), ValidationError> {
    let mut token = String::new();
    let mut chars = input.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '"' => return Ok((token, &input[pos + 1..])),
            '\\' => {
                let escaped = input[pos + 1..].chars().next();
                match escaped {
                    Some(e @ ('"' | '\\')) => {
                        token.push(e);
                        chars.next();
                    }
                    _ => token.push(c),
                }
            }
            _ => token.push(c),
        }
    }

    Err(ValidationError::UnterminatedQuote)
}
