//! Token types for the Logos-based section lexer.

use logos::Logos;

/// Line-level tokens of the flat output grammar.
///
/// Section markers win over plain lines of the same length through their
/// higher priority; a line with anything else on it is a [`Token::Line`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[\r\n]+")]
pub enum Token<'src> {
    /// Section start marker (e.g. `[STREAM]`), yielding the section name.
    #[regex(r"[ \t]*\[[A-Za-z0-9_]+\][ \t]*", |lex| section_name(lex.slice(), 1), priority = 10)]
    Open(&'src str),

    /// Section end marker (e.g. `[/STREAM]`), yielding the section name.
    #[regex(r"[ \t]*\[/[A-Za-z0-9_]+\][ \t]*", |lex| section_name(lex.slice(), 2), priority = 10)]
    Close(&'src str),

    /// Any other non-empty line.
    #[regex(r"[^\r\n]+", |lex| lex.slice(), priority = 1)]
    Line(&'src str),
}

/// Strip the brackets (and the `/` of an end marker) from a marker slice.
fn section_name(slice: &str, prefix_len: usize) -> &str {
    let marker = slice.trim();
    &marker[prefix_len..marker.len() - 1]
}
