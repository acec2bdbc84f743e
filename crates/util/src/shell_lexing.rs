//! # Shell-like Lexing Utilities
//!
//! Tokenizes command-line input with shell-style word splitting: single and
//! double quotes group words, backslashes escape the next character, and the
//! returned tokens carry the *resolved* text — quote characters are removed
//! and escapes applied. The command parser relies on this so that
//! `"add login"` arrives as the single token `add login`.

/// Split input into shell-style words.
///
/// Quoted segments (single or double) keep their whitespace and lose their
/// quotes; a backslash outside single quotes escapes the following
/// character. An unterminated quote runs to the end of input rather than
/// failing — dispatch input is interactive and best-effort.
///
/// # Example
/// ```rust
/// use speckit_util::shell_lexing::split_shell_words;
///
/// let words = split_shell_words("spec \"add login\" --template=default");
/// assert_eq!(words, vec!["spec", "add login", "--template=default"]);
/// ```
pub fn split_shell_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        // Skip inter-word whitespace.
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        let mut in_single = false;
        let mut in_double = false;

        while let Some(&c) = chars.peek() {
            if c == '\\' && !in_single {
                chars.next();
                // Trailing backslash is kept literally.
                match chars.next() {
                    Some(escaped) => word.push(escaped),
                    None => word.push('\\'),
                }
                continue;
            }
            if c == '\'' && !in_double {
                in_single = !in_single;
                chars.next();
                continue;
            }
            if c == '"' && !in_single {
                in_double = !in_double;
                chars.next();
                continue;
            }
            if c.is_whitespace() && !in_single && !in_double {
                break;
            }
            word.push(c);
            chars.next();
        }

        words.push(word);
    }

    words
}
