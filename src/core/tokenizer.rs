//! Line tokenizer for console input.
//!
//! Splits a compound line into sub-commands on unquoted `;`, drops `#`
//! comments, and cuts each sub-command into a command name and a raw
//! argument tail. Argument extraction is left to the format-spec validator
//! because only the matched command knows how its tail should be read.

use super::error::TokenizeError;

/// Characters treated as token separators.
#[inline]
pub(crate) fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

/// Skip leading console whitespace.
#[inline]
pub(crate) fn skip_spaces(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\n', '\r'])
}

/// A sub-command cut into its name and argument tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCommand<'a> {
    /// The command name (first whitespace-delimited token).
    pub name: &'a str,
    /// Everything after the first run of whitespace, unmodified.
    pub tail: &'a str,
    /// The raw sub-command.
    pub raw: &'a str,
}

/// Cut a single sub-command into name and argument tail.
///
/// Returns `None` for blank input.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::tokenize;
///
/// let cmd = tokenize("  kick 3 \"spamming chat\"").unwrap();
/// assert_eq!(cmd.name, "kick");
/// assert_eq!(cmd.tail, "3 \"spamming chat\"");
/// ```
pub fn tokenize(input: &str) -> Option<TokenizedCommand<'_>> {
    let start = skip_spaces(input);
    if start.is_empty() {
        return None;
    }

    let name_len = start.bytes().position(is_space).unwrap_or(start.len());
    let (name, rest) = start.split_at(name_len);

    Some(TokenizedCommand {
        name,
        tail: skip_spaces(rest),
        raw: input,
    })
}

/// Iterator over the sub-commands of a line.
///
/// Created by [`split_commands`]. Yields each sub-command lazily so that a
/// parse error in a later part does not affect parts already yielded.
#[derive(Debug, Clone)]
pub struct Subcommands<'a> {
    rest: Option<&'a str>,
    offset: usize,
    interpret_semicolons: bool,
}

impl<'a> Iterator for Subcommands<'a> {
    type Item = Result<&'a str, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let input = self.rest.take()?;
        let bytes = input.as_bytes();

        let mut in_quote = false;
        let mut quote_start = 0;
        let mut end = bytes.len();
        let mut next_part = None;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'"' => {
                    in_quote = !in_quote;
                    quote_start = i;
                }
                b'\\' => {
                    // outside quotes only \" is an escape
                    match bytes.get(i + 1) {
                        Some(b'"') => i += 1,
                        Some(b'\\') if in_quote => i += 1,
                        _ => {}
                    }
                }
                b';' if !in_quote && self.interpret_semicolons => {
                    end = i;
                    next_part = Some(i + 1);
                    break;
                }
                b'#' if !in_quote && self.interpret_semicolons => {
                    end = i;
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        if in_quote {
            return Some(Err(TokenizeError::UnterminatedQuote {
                position: self.offset + quote_start,
            }));
        }

        if let Some(next) = next_part {
            self.rest = Some(&input[next..]);
            self.offset += next;
        }

        Some(Ok(&input[..end]))
    }
}

/// Split a line into sub-commands.
///
/// With `interpret_semicolons` set, an unquoted `;` separates sub-commands and
/// an unquoted `#` starts a comment running to the end of the line. Without
/// it the whole line is one sub-command. `\"` never opens or closes a quote,
/// and inside quotes `\\` is an escape too. An unterminated quote yields an
/// error for the part containing it.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::split_commands;
///
/// let parts: Vec<_> = split_commands("echo hi; echo bye # done", true)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(parts, vec!["echo hi", " echo bye "]);
///
/// let parts: Vec<_> = split_commands(r#"say "a; b""#, true)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(parts, vec![r#"say "a; b""#]);
/// ```
pub fn split_commands(input: &str, interpret_semicolons: bool) -> Subcommands<'_> {
    Subcommands {
        rest: Some(input),
        offset: 0,
        interpret_semicolons,
    }
}

/// Escape backslashes and double quotes for use inside a quoted argument.
///
/// # Examples
///
/// ```
/// use bevy_console_engine::core::escape;
///
/// assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
/// ```
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str, semicolons: bool) -> Vec<&str> {
        split_commands(input, semicolons)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_tokenize_simple() {
        let cmd = tokenize("echo hello world").unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.tail, "hello world");
    }

    #[test]
    fn test_tokenize_no_args() {
        let cmd = tokenize("shutdown").unwrap();
        assert_eq!(cmd.name, "shutdown");
        assert!(cmd.tail.is_empty());
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(tokenize("").is_none());
        assert!(tokenize(" \t ").is_none());
    }

    #[test]
    fn test_tokenize_tail_is_unmodified() {
        let cmd = tokenize("say   \"hello   world\"  ").unwrap();
        assert_eq!(cmd.name, "say");
        assert_eq!(cmd.tail, "\"hello   world\"  ");
    }

    #[test]
    fn test_split_semicolons() {
        assert_eq!(split("echo hi; echo bye", true), vec!["echo hi", " echo bye"]);
    }

    #[test]
    fn test_split_disabled() {
        assert_eq!(split("a; b # c", false), vec!["a; b # c"]);
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split("a; b # c; d", true), vec!["a", " b "]);
    }

    #[test]
    fn test_split_quoted_separators() {
        assert_eq!(
            split(r#"say "x; y # z"; echo ok"#, true),
            vec![r#"say "x; y # z""#, " echo ok"]
        );
    }

    #[test]
    fn test_split_escaped_quote() {
        // \" does not close the string
        assert_eq!(
            split(r#"echo "a\"b; c"; quit"#, true),
            vec![r#"echo "a\"b; c""#, " quit"]
        );
    }

    #[test]
    fn test_split_escaped_backslash_before_quote() {
        // inside quotes \\" is an escaped backslash followed by a closing quote
        assert_eq!(
            split(r#"echo "test\\"; quit"#, true),
            vec![r#"echo "test\\""#, " quit"]
        );
    }

    #[test]
    fn test_split_backslash_outside_quotes() {
        // outside quotes the second backslash escapes the quote
        assert_eq!(
            split(r#"echo \\"; quit"#, true),
            vec![r#"echo \\""#, " quit"]
        );
    }

    #[test]
    fn test_split_unterminated_quote() {
        let parts: Vec<_> = split_commands(r#"echo ok; say "oops"#, true).collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], Ok("echo ok"));
        assert_eq!(
            parts[1],
            Err(TokenizeError::UnterminatedQuote { position: 13 })
        );
    }

    #[test]
    fn test_split_trailing_separator() {
        assert_eq!(split("echo a;", true), vec!["echo a", ""]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
