//! Whitespace, identifiers, keywords and bracket-balanced text.
//!
//! Types, default values and bodies are never parsed structurally: the
//! generator only needs their text, so they are taken as balanced runs up to a
//! context-dependent stop.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, multispace1, satisfy},
    combinator::{not, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{delimited, terminated},
    IResult, Parser,
};

pub type PResult<'a, T> = IResult<&'a str, T>;

/// Get current position in the original input
pub fn position(full: &str, current: &str) -> usize {
    full.len() - current.len()
}

/// 1-based line and column of a byte offset.
pub fn line_col(full: &str, offset: usize) -> (usize, usize) {
    let before = &full[..offset.min(full.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

pub fn fail<T>(input: &str) -> PResult<'_, T> {
    Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)))
}

// =============================================================================
// Whitespace and Comments
// =============================================================================

/// Skip whitespace and comments
pub fn ws(input: &str) -> PResult<'_, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), line_comment),
            value((), block_comment),
        ))),
    )
    .parse(input)
}

fn line_comment(input: &str) -> PResult<'_, &str> {
    recognize((tag("//"), take_while(|c| c != '\n'))).parse(input)
}

fn block_comment(input: &str) -> PResult<'_, &str> {
    recognize((tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

// =============================================================================
// Basic Elements
// =============================================================================

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Identifier text without leading whitespace; backticks are stripped.
pub fn raw_identifier(input: &str) -> PResult<'_, &str> {
    alt((
        delimited(char('`'), take_while1(is_ident_char), char('`')),
        verify(take_while1(is_ident_char), |word: &str| {
            !word.starts_with(|c: char| c.is_ascii_digit())
        }),
    ))
    .parse(input)
}

/// Parse an identifier
pub fn identifier(input: &str) -> PResult<'_, String> {
    let (input, _) = ws(input)?;
    let (input, word) = raw_identifier(input)?;
    Ok((input, word.to_string()))
}

/// Parse a keyword
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        terminated(tag(kw), not(satisfy(is_ident_char))).parse(input)
    }
}

/// Parse a symbol with whitespace
pub fn symbol<'a>(sym: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        tag(sym).parse(input)
    }
}

// =============================================================================
// Balanced Text
// =============================================================================

/// Where a balanced scan ends. Unbalanced closing brackets always end it.
#[derive(Debug, Clone, Copy)]
pub struct Stop {
    pub chars: &'static [char],
    pub words: &'static [&'static str],
    pub newline: bool,
    /// Count `<`/`>` as brackets; only sound in type position.
    pub angles: bool,
}

impl Stop {
    pub const TYPE_ANNOTATION: Stop = Stop {
        chars: &['=', '{', ';', ','],
        words: &[],
        newline: true,
        angles: true,
    };
    pub const PARAM_TYPE: Stop = Stop {
        chars: &[',', '='],
        words: &[],
        newline: false,
        angles: true,
    };
    pub const PARAM_DEFAULT: Stop = Stop {
        chars: &[','],
        words: &[],
        newline: false,
        angles: false,
    };
    pub const RETURN_TYPE: Stop = Stop {
        chars: &['{', ';'],
        words: &["where"],
        newline: true,
        angles: true,
    };
    pub const EXPRESSION: Stop = Stop {
        chars: &[';'],
        words: &[],
        newline: true,
        angles: false,
    };
    pub const INHERITANCE: Stop = Stop {
        chars: &['{'],
        words: &["where"],
        newline: false,
        angles: true,
    };
    pub const DECL_WHERE: Stop = Stop {
        chars: &['{'],
        words: &[],
        newline: false,
        angles: true,
    };
    pub const FUNC_WHERE: Stop = Stop {
        chars: &['{', ';'],
        words: &[],
        newline: true,
        angles: true,
    };
    pub const STATEMENT: Stop = Stop {
        chars: &[';'],
        words: &[],
        newline: true,
        angles: false,
    };
    pub const ENCLOSED: Stop = Stop {
        chars: &[],
        words: &[],
        newline: false,
        angles: false,
    };
    pub const ENCLOSED_ANGLES: Stop = Stop {
        chars: &[],
        words: &[],
        newline: false,
        angles: true,
    };
    pub const LIST_ITEM: Stop = Stop {
        chars: &[','],
        words: &[],
        newline: false,
        angles: false,
    };
    pub const TYPE_LIST_ITEM: Stop = Stop {
        chars: &[','],
        words: &[],
        newline: false,
        angles: true,
    };
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(is_ident_char))
}

/// Length of the string literal `text` starts with, stopping at a line break
/// for unterminated literals.
fn string_len(text: &str) -> usize {
    if let Some(body) = text.strip_prefix("\"\"\"") {
        return body.find("\"\"\"").map_or(text.len(), |end| end + 6);
    }
    let mut escaped = false;
    for (index, ch) in text.char_indices().skip(1) {
        match ch {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return index + 1,
            '\n' => return index,
            _ => escaped = false,
        }
    }
    text.len()
}

/// Length of the comment `text` starts with, if it starts with one. Line
/// comments end before their line break.
fn comment_len(text: &str) -> Option<usize> {
    if text.starts_with("//") {
        return Some(text.find('\n').unwrap_or(text.len()));
    }
    if let Some(body) = text.strip_prefix("/*") {
        return Some(body.find("*/").map_or(text.len(), |end| end + 4));
    }
    None
}

/// Walk `text`, calling `visit(offset, rest, depth)` for every character
/// outside strings and comments, before the character adjusts the depth.
/// The walk ends when `visit` returns `true` or at an unbalanced closer;
/// returns the offset it ended at.
fn walk(text: &str, angles: bool, mut visit: impl FnMut(usize, &str, usize) -> bool) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut index = 0;
    while index < text.len() {
        let rest = &text[index..];
        if rest.starts_with('"') {
            index += string_len(rest);
            continue;
        }
        if let Some(len) = comment_len(rest) {
            index += len;
            continue;
        }
        if visit(index, rest, depth) {
            return index;
        }
        let is_arrow = index > 0 && bytes[index - 1] == b'-';
        match bytes[index] {
            b'(' | b'[' | b'{' => depth += 1,
            b'<' if angles => depth += 1,
            b')' | b']' | b'}' => match depth.checked_sub(1) {
                Some(outer) => depth = outer,
                None => return index,
            },
            b'>' if angles && !is_arrow => match depth.checked_sub(1) {
                Some(outer) => depth = outer,
                None => return index,
            },
            _ => {}
        }
        index += rest.chars().next().map_or(1, char::len_utf8);
    }
    text.len()
}

/// Split `input` at the first stop outside brackets, strings and comments.
/// Returns `(rest, scanned)`; the scanned text may be empty.
pub fn scan(input: &str, stop: Stop) -> (&str, &str) {
    let mut word_start = true;
    let end = walk(input, stop.angles, |_, rest, depth| {
        let Some(ch) = rest.chars().next() else {
            return true;
        };
        let at_word = word_start;
        word_start = !is_ident_char(ch);
        depth == 0
            && ((stop.newline && ch == '\n')
                || stop.chars.contains(&ch)
                || (at_word && stop.words.iter().any(|word| starts_with_word(rest, word))))
    });
    (&input[end..], &input[..end])
}

/// Balanced text up to a stop, trimmed; fails when nothing was scanned.
pub fn balanced<'a>(stop: Stop) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        let (rest, text) = scan(input, stop);
        let text = text.trim();
        if text.is_empty() {
            return fail(input);
        }
        Ok((rest, text))
    }
}

fn enclosed<'a>(
    open: char,
    close: char,
    stop: Stop,
) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        let (input, _) = char(open).parse(input)?;
        let (input, inner) = scan(input, stop);
        let (input, _) = char(close).parse(input)?;
        Ok((input, inner))
    }
}

/// `{ ... }`, returning the text between the braces.
pub fn braced(input: &str) -> PResult<'_, &str> {
    enclosed('{', '}', Stop::ENCLOSED)(input)
}

/// `( ... )`, returning the text between the parentheses.
pub fn parenthesized(input: &str) -> PResult<'_, &str> {
    enclosed('(', ')', Stop::ENCLOSED)(input)
}

/// `<...>` generic parameter clause, returned with its brackets.
pub fn generic_clause(input: &str) -> PResult<'_, String> {
    let (input, inner) = enclosed('<', '>', Stop::ENCLOSED_ANGLES)(input)?;
    Ok((input, format!("<{}>", inner.trim())))
}

/// Skip one statement; always consumes at least one character of non-empty
/// input.
pub fn skip_statement(input: &str) -> &str {
    let (rest, text) = scan(input, Stop::STATEMENT);
    if !text.is_empty() {
        return rest;
    }
    let mut chars = input.chars();
    chars.next();
    chars.as_str()
}

/// Comma-separated items at bracket depth zero, trimmed, empties dropped.
pub fn split_top_level(mut text: &str, angles: bool) -> Vec<&str> {
    let stop = if angles {
        Stop::TYPE_LIST_ITEM
    } else {
        Stop::LIST_ITEM
    };
    let mut items = Vec::new();
    loop {
        let (rest, item) = scan(text, stop);
        let item = item.trim();
        if !item.is_empty() {
            items.push(item);
        }
        match rest.strip_prefix(',') {
            Some(next) => text = next,
            None => return items,
        }
    }
}

/// Identifier-like words at bracket depth zero, in order.
pub fn top_level_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut last_depth = 0;
    let end = walk(text, false, |index, rest, depth| {
        let is_word_char = rest.starts_with(is_ident_char);
        match (word_start, is_word_char && depth == 0) {
            (None, true) => word_start = Some(index),
            (Some(start), false) => {
                words.push(&text[start..index]);
                word_start = None;
            }
            _ => {}
        }
        last_depth = depth;
        false
    });
    if let Some(start) = word_start {
        if last_depth == 0 {
            words.push(&text[start..end]);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_stops_outside_brackets() {
        let (rest, ty) = scan("[String: (Int) -> Void] = [:]\n", Stop::TYPE_ANNOTATION);
        assert_eq!(ty, "[String: (Int) -> Void] ");
        assert_eq!(rest, "= [:]\n");

        let (rest, ty) = scan("Result<Int, Error>, next", Stop::PARAM_TYPE);
        assert_eq!(ty, "Result<Int, Error>");
        assert_eq!(rest, ", next");
    }

    #[test]
    fn scan_skips_strings_and_comments() {
        let (rest, text) = scan("\"a;b\" // c;\nnext", Stop::EXPRESSION);
        assert_eq!(text, "\"a;b\" // c;");
        assert_eq!(rest, "\nnext");
    }

    #[test]
    fn return_type_stops_at_arrow_free_brace() {
        let (rest, ty) = scan("(Int) -> Bool { body }", Stop::RETURN_TYPE);
        assert_eq!(ty.trim(), "(Int) -> Bool");
        assert_eq!(rest, "{ body }");
    }

    #[test]
    fn splits_nested_lists() {
        assert_eq!(
            split_top_level("A, B<C, D>, E", true),
            vec!["A", "B<C, D>", "E"]
        );
        assert_eq!(
            split_top_level(r#"targetType: .class, attributeNames: ["A", "B"]"#, false),
            vec!["targetType: .class", r#"attributeNames: ["A", "B"]"#]
        );
    }

    #[test]
    fn words_ignore_nested_bodies() {
        assert_eq!(
            top_level_words(" get async throws { try await load() } "),
            vec!["get", "async", "throws"]
        );
        assert_eq!(
            top_level_words("get { _value } set { _value = newValue }"),
            vec!["get", "set"]
        );
    }

    #[test]
    fn keyword_requires_word_boundary() {
        assert!(keyword("var")(" variable").is_err());
        assert_eq!(keyword("var")(" var x"), Ok((" x", "var")));
    }

    #[test]
    fn generic_clause_keeps_constraints() {
        assert_eq!(
            generic_clause("<T: Decodable>(x: T)"),
            Ok(("(x: T)", "<T: Decodable>".to_string()))
        );
    }
}
