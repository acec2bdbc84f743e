//! Command-line parsing: two grammars plus scalar coercion.
//!
//! Slash-prefixed input (`/spec "add login" --template=default`) is parsed
//! into a name, positional args, and keyword args; plain input is parsed as
//! name plus positionals only. Parsing is a pure function of the text — the
//! registry is never consulted here.

use serde_json::{Map as JsonMap, Number, Value};
use speckit_util::split_shell_words;

/// Sentinel introducing the flag-style grammar.
const COMMAND_PREFIX: char = '/';

/// Structured result of parsing one line of input.
///
/// Transient: created per parse call, consumed once by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<Value>,
    pub kwargs: JsonMap<String, Value>,
    pub raw_input: String,
}

/// Parse a line of input into an [`Invocation`].
///
/// Empty or whitespace-only input parses to `None`, as does a bare sentinel
/// with no command name.
pub fn parse_command_line(text: &str) -> Option<Invocation> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.strip_prefix(COMMAND_PREFIX) {
        Some(rest) => parse_prefixed(rest, trimmed),
        None => parse_plain(trimmed),
    }
}

/// Flag-style grammar: `name [positional|--key=value|--key [value]|-k [value]]*`.
fn parse_prefixed(body: &str, raw_input: &str) -> Option<Invocation> {
    let tokens = split_shell_words(body);
    let (name, rest) = tokens.split_first()?;

    let mut args = Vec::new();
    let mut kwargs = JsonMap::new();
    let mut index = 0;

    while index < rest.len() {
        let token = &rest[index];

        if let Some(flag) = token.strip_prefix("--").filter(|_| looks_like_flag(token)) {
            if let Some((key, value)) = flag.split_once('=') {
                kwargs.insert(key.to_string(), coerce_scalar(value));
            } else {
                index += consume_flag_value(flag, rest.get(index + 1), &mut kwargs);
            }
        } else if let Some(flag) = token.strip_prefix('-').filter(|_| looks_like_flag(token)) {
            index += consume_flag_value(flag, rest.get(index + 1), &mut kwargs);
        } else {
            args.push(coerce_scalar(token));
        }

        index += 1;
    }

    Some(Invocation {
        name: name.clone(),
        args,
        kwargs,
        raw_input: raw_input.to_string(),
    })
}

/// Plain grammar: name followed by positional args only.
fn parse_plain(text: &str) -> Option<Invocation> {
    let tokens = split_shell_words(text);
    let (name, rest) = tokens.split_first()?;

    Some(Invocation {
        name: name.clone(),
        args: rest.iter().map(|token| coerce_scalar(token)).collect(),
        kwargs: JsonMap::new(),
        raw_input: text.to_string(),
    })
}

/// Bind a valueless flag token: consume the following token as its value
/// when one exists and does not itself look like a flag, else record a
/// boolean presence flag. Returns how many extra tokens were consumed.
fn consume_flag_value(key: &str, next: Option<&String>, kwargs: &mut JsonMap<String, Value>) -> usize {
    match next {
        Some(token) if !looks_like_flag(token) => {
            kwargs.insert(key.to_string(), coerce_scalar(token));
            1
        }
        _ => {
            kwargs.insert(key.to_string(), Value::Bool(true));
            0
        }
    }
}

/// Whether a token is a flag rather than a value.
///
/// A dash-led token whose remainder parses as a number (`-5`, `-2.5`) is a
/// value: rejecting it would make negative numeric arguments
/// inexpressible. Everything else starting with a dash is a flag.
fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !is_numeric(token)
}

fn is_numeric(token: &str) -> bool {
    token.parse::<i64>().is_ok() || token.parse::<f64>().is_ok()
}

/// Coerce a raw token into a typed scalar.
///
/// Order matters: boolean and null forms are checked before numbers, and
/// integers (no decimal point) before floats; anything else stays a string.
pub fn coerce_scalar(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if !raw.contains('.') {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Number(Number::from(int));
        }
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_whitespace_input_parse_to_none() {
        assert!(parse_command_line("").is_none());
        assert!(parse_command_line("   \t ").is_none());
        assert!(parse_command_line("/").is_none());
    }

    #[test]
    fn prefixed_grammar_separates_positionals_and_flags() {
        let invocation = parse_command_line("/spec \"add login\" --template=default").expect("parse");
        assert_eq!(invocation.name, "spec");
        assert_eq!(invocation.args, vec![json!("add login")]);
        assert_eq!(invocation.kwargs.get("template"), Some(&json!("default")));
        assert_eq!(invocation.raw_input, "/spec \"add login\" --template=default");
    }

    #[test]
    fn coercion_covers_bool_int_float_and_null() {
        let invocation = parse_command_line("/x --flag=true --n=3 --f=2.5 --s=none").expect("parse");
        assert_eq!(invocation.kwargs.get("flag"), Some(&json!(true)));
        assert_eq!(invocation.kwargs.get("n"), Some(&json!(3)));
        assert_eq!(invocation.kwargs.get("f"), Some(&json!(2.5)));
        assert_eq!(invocation.kwargs.get("s"), Some(&Value::Null));
    }

    #[test]
    fn coercion_order_prefers_bool_and_null_over_string() {
        assert_eq!(coerce_scalar("TRUE"), json!(true));
        assert_eq!(coerce_scalar("False"), json!(false));
        assert_eq!(coerce_scalar("NULL"), Value::Null);
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("4.2"), json!(4.2));
        assert_eq!(coerce_scalar("hello"), json!("hello"));
        // A dotted token never coerces to an integer.
        assert_eq!(coerce_scalar("1.0"), json!(1.0));
    }

    #[test]
    fn long_flag_consumes_following_value_token() {
        let invocation = parse_command_line("/spec --template default extra").expect("parse");
        assert_eq!(invocation.kwargs.get("template"), Some(&json!("default")));
        assert_eq!(invocation.args, vec![json!("extra")]);
    }

    #[test]
    fn long_flag_before_another_flag_is_a_presence_flag() {
        let invocation = parse_command_line("/spec --force --template=default").expect("parse");
        assert_eq!(invocation.kwargs.get("force"), Some(&json!(true)));
        assert_eq!(invocation.kwargs.get("template"), Some(&json!("default")));
    }

    #[test]
    fn short_flags_follow_the_same_value_rule() {
        let invocation = parse_command_line("/spec -t default -v").expect("parse");
        assert_eq!(invocation.kwargs.get("t"), Some(&json!("default")));
        assert_eq!(invocation.kwargs.get("v"), Some(&json!(true)));
    }

    #[test]
    fn dash_led_numbers_are_values_not_flags() {
        let invocation = parse_command_line("/move -5 --offset -2.5").expect("parse");
        assert_eq!(invocation.args, vec![json!(-5)]);
        assert_eq!(invocation.kwargs.get("offset"), Some(&json!(-2.5)));
    }

    #[test]
    fn plain_grammar_produces_positionals_only() {
        let invocation = parse_command_line("deploy web 3 true").expect("parse");
        assert_eq!(invocation.name, "deploy");
        assert_eq!(invocation.args, vec![json!("web"), json!(3), json!(true)]);
        assert!(invocation.kwargs.is_empty());
    }

    #[test]
    fn quoted_values_keep_spaces_through_flags() {
        let invocation = parse_command_line("/spec --msg=\"a b c\"").expect("parse");
        assert_eq!(invocation.kwargs.get("msg"), Some(&json!("a b c")));
    }
}
