// ABOUTME: Reader — parses source text into a single AST value via nom combinators

use crate::error::LispError;
use crate::value::{LMap, MapKey, Value};
use nom::branch::alt;
use nom::bytes::complete::{escaped, take_while1};
use nom::character::complete::{char, none_of, one_of};
use nom::error::{ErrorKind, ParseError};
use nom::{Err as NomErr, IResult, Parser};
use std::rc::Rc;

/// The seven bracket/sigil characters (plus `"` and `;`) that bound an atom
/// token; everything else accumulates into a symbol/number/keyword.
fn is_special(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '"' | '`' | ';' | '~' | '^' | '@'
    )
}

/// What went wrong while parsing, tagged with enough information for
/// `to_lisp_error` to reconstruct the right `LispError` variant at the
/// top-level entry points. `remaining` is always a suffix of the original
/// buffer passed to `read_str`/`read_all`, so its length difference against
/// the original is a valid byte offset.
enum Detail {
    /// A generic nom combinator failure (bad bracket, unexpected char).
    Generic,
    /// A specific structural complaint with its own message.
    Message(String),
    /// Input ran out before a construct (currently: a string literal) closed.
    Eof,
    /// A builtin-level failure that carries no source position, e.g. an
    /// unparseable numeric literal.
    Host(String),
}

struct PErr<'a> {
    remaining: &'a str,
    detail: Detail,
}

impl<'a> ParseError<&'a str> for PErr<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        PErr {
            remaining: input,
            detail: Detail::Generic,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, O> = IResult<&'a str, O, PErr<'a>>;

fn fail<'a, O>(remaining: &'a str, detail: Detail) -> PResult<'a, O> {
    Err(NomErr::Failure(PErr { remaining, detail }))
}

fn to_lisp_error(original: &str, e: NomErr<PErr>) -> LispError {
    let pe = match e {
        NomErr::Error(pe) | NomErr::Failure(pe) => pe,
        NomErr::Incomplete(_) => return LispError::Eof,
    };
    match pe.detail {
        Detail::Eof => LispError::Eof,
        Detail::Host(message) => LispError::Host(message),
        Detail::Generic => {
            let offset = original.len() - pe.remaining.len();
            LispError::syntax(offset, "unexpected input")
        }
        Detail::Message(message) => {
            let offset = original.len() - pe.remaining.len();
            LispError::syntax(offset, message)
        }
    }
}

fn wrap(head: &str, form: Value) -> Value {
    Value::list(vec![Value::symbol(head), form])
}

fn looks_numeric(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => matches!(chars.next(), Some(c2) if c2.is_ascii_digit()),
        _ => false,
    }
}

/// Classifies an already-scanned atom token. The token is guaranteed
/// non-empty by `take_while1`, so the only failure mode left is a numeric-
/// looking token that doesn't actually parse as an `i64`.
fn atom_to_value(s: &str) -> Result<Value, LispError> {
    match s {
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        "nil" => Ok(Value::Nil),
        _ if s.starts_with(':') => Ok(Value::Keyword(s[1..].into())),
        _ if looks_numeric(s) => s
            .parse::<i64>()
            .map(Value::Number)
            .map_err(|e| LispError::host(format!("invalid number literal '{s}': {e}"))),
        _ => Ok(Value::symbol(s)),
    }
}

fn ws_chunk(input: &str) -> PResult<'_, ()> {
    nom::combinator::value((), take_while1(|c: char| c.is_whitespace() || c == ',')).parse(input)
}

fn line_comment(input: &str) -> PResult<'_, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = nom::bytes::complete::take_while(|c: char| c != '\n')(input)?;
    Ok((input, ()))
}

/// Whitespace, commas (treated as whitespace), and `;`-to-end-of-line
/// comments, repeated until none remain.
fn ws_and_comments(input: &str) -> PResult<'_, ()> {
    let (input, _) = nom::multi::many0(alt((ws_chunk, line_comment))).parse(input)?;
    Ok((input, ()))
}

fn parse_atom(input: &str) -> PResult<'_, Value> {
    let (rest, text) =
        take_while1(|c: char| !is_special(c) && !c.is_whitespace() && c != ',').parse(input)?;
    match atom_to_value(text) {
        Ok(v) => Ok((rest, v)),
        Err(LispError::Host(msg)) => fail(input, Detail::Host(msg)),
        Err(_) => fail(input, Detail::Generic),
    }
}

fn decode_string_escapes(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A double-quoted string with `\n`/`\\`/`\"` escapes. Mirrors the escaped/
/// closing-quote shape of a conventional reader's string literal, built from
/// `escaped` over the non-quote non-backslash run plus the three supported
/// escape characters.
fn parse_string(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('"')(input)?;
    if let Ok((rest, _)) = char::<_, PErr<'_>>('"').parse(input) {
        return Ok((rest, Value::string("")));
    }
    let escaped_content: PResult<'_, &str> =
        escaped(none_of("\"\\"), '\\', one_of("\"\\n")).parse(input);
    let (after_content, content) = match escaped_content {
        Ok(ok) => ok,
        Err(_) => return fail(input, Detail::Eof),
    };
    match char::<_, PErr<'_>>('"').parse(after_content) {
        Ok((rest, _)) => Ok((rest, Value::string(decode_string_escapes(content)))),
        Err(_) => fail(after_content, Detail::Eof),
    }
}

/// Shared bracket-list reader for `()`, `[]`, `{}`: skip whitespace/comments,
/// stop at the closing bracket, otherwise read one more form. Running out of
/// input before the close is a syntax error (the bracket depth is never
/// reported as `Eof` — only an unterminated string is).
fn parse_bracketed<'a>(input: &'a str, open: char, close: char) -> PResult<'a, Vec<Value>> {
    let (mut rest, _) = char(open)(input)?;
    let mut items = Vec::new();
    loop {
        let (after_ws, _) = ws_and_comments(rest)?;
        rest = after_ws;
        if let Ok((after_close, _)) = char::<_, PErr<'_>>(close).parse(rest) {
            return Ok((after_close, items));
        }
        if rest.is_empty() {
            return fail(
                rest,
                Detail::Message(format!("unexpected end of input, expected '{close}'")),
            );
        }
        let (after_form, form) = parse_form(rest)?;
        items.push(form);
        rest = after_form;
    }
}

fn parse_list(input: &str) -> PResult<'_, Value> {
    let (rest, items) = parse_bracketed(input, '(', ')')?;
    Ok((rest, Value::list(items)))
}

fn parse_vector(input: &str) -> PResult<'_, Value> {
    let (rest, items) = parse_bracketed(input, '[', ']')?;
    Ok((rest, Value::vector(items)))
}

fn parse_map(input: &str) -> PResult<'_, Value> {
    let (rest, items) = parse_bracketed(input, '{', '}')?;
    if items.len() % 2 != 0 {
        return fail(
            input,
            Detail::Message("map literal requires an even number of forms".into()),
        );
    }
    let mut map = LMap::new();
    for pair in items.chunks(2) {
        let key = MapKey::from_value(&pair[0]).map_err(|_| {
            NomErr::Failure(PErr {
                remaining: input,
                detail: Detail::Message("map keys must be strings or keywords".into()),
            })
        })?;
        map.insert(key, pair[1].clone());
    }
    Ok((rest, Value::Map(Rc::new(map))))
}

fn parse_quote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('\'')(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, form) = parse_form(input)?;
    Ok((input, wrap("quote", form)))
}

fn parse_quasiquote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('`')(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, form) = parse_form(input)?;
    Ok((input, wrap("quasiquote", form)))
}

/// `~` and `~@` share a sigil prefix, so this one parser handles both:
/// `~@form` reads as `(splice-unquote form)`, plain `~form` as `(unquote form)`.
fn parse_unquote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('~')(input)?;
    if let Ok((input, _)) = char::<_, PErr<'_>>('@').parse(input) {
        let (input, _) = ws_and_comments(input)?;
        let (input, form) = parse_form(input)?;
        return Ok((input, wrap("splice-unquote", form)));
    }
    let (input, _) = ws_and_comments(input)?;
    let (input, form) = parse_form(input)?;
    Ok((input, wrap("unquote", form)))
}

fn parse_deref(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('@')(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, form) = parse_form(input)?;
    Ok((input, wrap("deref", form)))
}

/// `^meta form` reads the metadata form first but produces
/// `(with-meta form meta)` — the form, not the metadata, leads the list.
fn parse_meta(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('^')(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, meta) = parse_form(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, form) = parse_form(input)?;
    Ok((input, Value::list(vec![Value::symbol("with-meta"), form, meta])))
}

fn parse_form(input: &str) -> PResult<'_, Value> {
    let (input, _) = ws_and_comments(input)?;
    alt((
        parse_meta,
        parse_quote,
        parse_quasiquote,
        parse_unquote,
        parse_deref,
        parse_list,
        parse_vector,
        parse_map,
        parse_string,
        parse_atom,
    ))
    .parse(input)
}

/// Parses one top-level form out of `input`. Empty or comment-only input
/// yields `LispError::NoInput` (the REPL swallows this silently); trailing
/// text after the first form is a syntax error.
pub fn read_str(input: &str) -> Result<Value, LispError> {
    let (leading_ws, _) = ws_and_comments(input).unwrap_or((input, ()));
    if leading_ws.is_empty() {
        return Err(LispError::NoInput);
    }
    let (rest, value) = parse_form(input).map_err(|e| to_lisp_error(input, e))?;
    let (rest, _) = ws_and_comments(rest).unwrap_or((rest, ()));
    if !rest.is_empty() {
        let offset = input.len() - rest.len();
        return Err(LispError::syntax(offset, "unexpected trailing input"));
    }
    Ok(value)
}

/// Parses every top-level form out of `input` in order; used to load a whole
/// file of forms rather than one REPL line at a time.
pub fn read_all(input: &str) -> Result<Vec<Value>, LispError> {
    let mut forms = Vec::new();
    let mut rest = input;
    loop {
        let (after_ws, _) = ws_and_comments(rest).unwrap_or((rest, ()));
        if after_ws.is_empty() {
            return Ok(forms);
        }
        let (next_rest, form) = parse_form(rest).map_err(|e| to_lisp_error(input, e))?;
        forms.push(form);
        rest = next_rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert!(matches!(read_str("42"), Ok(Value::Number(42))));
        assert!(matches!(read_str("-42"), Ok(Value::Number(-42))));
        assert!(matches!(read_str("0"), Ok(Value::Number(0))));
    }

    #[test]
    fn booleans_and_nil() {
        assert!(matches!(read_str("true"), Ok(Value::Boolean(true))));
        assert!(matches!(read_str("false"), Ok(Value::Boolean(false))));
        assert!(matches!(read_str("nil"), Ok(Value::Nil)));
    }

    #[test]
    fn symbols_and_operators() {
        assert!(matches!(read_str("foo-bar"), Ok(Value::Symbol(s)) if &*s == "foo-bar"));
        assert!(matches!(read_str("+"), Ok(Value::Symbol(s)) if &*s == "+"));
        assert!(matches!(read_str(">="), Ok(Value::Symbol(s)) if &*s == ">="));
    }

    #[test]
    fn keywords() {
        assert!(matches!(read_str(":foo"), Ok(Value::Keyword(s)) if &*s == "foo"));
    }

    #[test]
    fn strings_with_escapes() {
        assert!(matches!(read_str(r#""hello""#), Ok(Value::String(s)) if &*s == "hello"));
        assert!(matches!(read_str(r#""a\nb""#), Ok(Value::String(s)) if &*s == "a\nb"));
        assert!(matches!(read_str(r#""a\"b""#), Ok(Value::String(s)) if &*s == "a\"b"));
        assert!(matches!(read_str(r#""a\\b""#), Ok(Value::String(s)) if &*s == "a\\b"));
    }

    #[test]
    fn unterminated_string_is_eof() {
        assert!(matches!(read_str("\"abc"), Err(LispError::Eof)));
    }

    #[test]
    fn lists_vectors_maps() {
        match read_str("(1 2 3)") {
            Ok(Value::List(items)) => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
        match read_str("[1 2 3]") {
            Ok(Value::Vector(items)) => assert_eq!(items.len(), 3),
            other => panic!("expected vector, got {other:?}"),
        }
        match read_str("{:a 1 :b 2}") {
            Ok(Value::Map(m)) => assert_eq!(m.len(), 2),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn empty_list_is_not_nil() {
        match read_str("()") {
            Ok(Value::List(items)) => assert!(items.is_empty()),
            other => panic!("expected empty list, got {other:?}"),
        }
    }

    #[test]
    fn odd_map_literal_is_syntax_error() {
        assert!(matches!(read_str("{:a}"), Err(LispError::Syntax { .. })));
    }

    #[test]
    fn unclosed_list_is_eof() {
        assert!(matches!(read_str("(1 2"), Err(LispError::Syntax { .. })));
    }

    #[test]
    fn reader_macros() {
        match read_str("'x") {
            Ok(Value::List(items)) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[0], Value::Symbol(s) if &**s == "quote"));
            }
            other => panic!("expected quote form, got {other:?}"),
        }
        match read_str("`x") {
            Ok(Value::List(items)) => assert!(matches!(&items[0], Value::Symbol(s) if &**s == "quasiquote")),
            other => panic!("expected quasiquote form, got {other:?}"),
        }
        match read_str("~x") {
            Ok(Value::List(items)) => assert!(matches!(&items[0], Value::Symbol(s) if &**s == "unquote")),
            other => panic!("expected unquote form, got {other:?}"),
        }
        match read_str("~@x") {
            Ok(Value::List(items)) => assert!(matches!(&items[0], Value::Symbol(s) if &**s == "splice-unquote")),
            other => panic!("expected splice-unquote form, got {other:?}"),
        }
        match read_str("@x") {
            Ok(Value::List(items)) => assert!(matches!(&items[0], Value::Symbol(s) if &**s == "deref")),
            other => panic!("expected deref form, got {other:?}"),
        }
    }

    #[test]
    fn with_meta_reverses_read_order() {
        match read_str("^:k x") {
            Ok(Value::List(items)) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[0], Value::Symbol(s) if &**s == "with-meta"));
                assert!(matches!(&items[1], Value::Symbol(s) if &**s == "x"));
                assert!(matches!(&items[2], Value::Keyword(s) if &**s == "k"));
            }
            other => panic!("expected with-meta form, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        assert!(matches!(read_str("; hi\n42"), Ok(Value::Number(42))));
        match read_str("(1 2 ; comment\n 3)") {
            Ok(Value::List(items)) => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn blank_or_comment_only_is_no_input() {
        assert!(matches!(read_str("   "), Err(LispError::NoInput)));
        assert!(matches!(read_str("; just a comment"), Err(LispError::NoInput)));
    }

    #[test]
    fn trailing_input_is_an_error() {
        assert!(read_str("1 2").is_err());
    }

    #[test]
    fn read_all_collects_every_top_level_form() {
        let forms = read_all("1 (+ 1 2)\n; comment\n\"three\"").unwrap();
        assert_eq!(forms.len(), 3);
        assert!(matches!(forms[0], Value::Number(1)));
        assert!(matches!(forms[2], Value::String(ref s) if &**s == "three"));
    }

    #[test]
    fn read_all_of_blank_input_is_empty() {
        assert_eq!(read_all("   ; nothing here").unwrap().len(), 0);
    }
}
