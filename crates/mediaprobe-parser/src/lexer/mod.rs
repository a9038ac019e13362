//! Logos-based lexer for flat probe output.
//!
//! The flat writer prints one item per line: a section start marker, a
//! section end marker, or a `key=value` field. The lexer classifies lines;
//! pairing markers into sections is left to the parser.

mod token;
pub use token::Token;

use logos::Logos;

/// Iterator over the tokens of one output document.
///
/// Input the grammar cannot classify (a stray carriage return, for
/// instance) is skipped.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, Token<'src>>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the full tool output.
    pub fn new(input: &'src str) -> Self {
        Self {
            inner: Token::lexer(input),
        }
    }

    /// The original input.
    pub fn input(&self) -> &'src str {
        self.inner.source()
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(token) => return Some(token),
                Err(()) => {
                    tracing::trace!(span = ?self.inner.span(), "skipping unrecognized input");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_tokens() {
        let tokens: Vec<_> = Lexer::new("[CHAPTER]\nid=1\n\n[/CHAPTER]").collect();
        assert_eq!(
            tokens,
            vec![Token::Open("CHAPTER"), Token::Line("id=1"), Token::Close("CHAPTER")]
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(Lexer::new("").count(), 0);
        assert_eq!(Lexer::new("\n\r\n").count(), 0);
    }
}
