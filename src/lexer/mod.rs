//! Lexical analysis (C3 half).
//!
//! Converts raw ADL source text into a flat token stream. Whitespace is
//! insignificant except as a separator; line comments (`#` to end of line)
//! are captured rather than discarded so the formatter can preserve them and
//! the linter can parse suppression directives out of them.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;
use tokens::keyword_or_primitive;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    pending_comments: Vec<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
            pending_comments: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn here(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Tokenizes the whole source. Returns every token through `Eof` on
    /// success, or the first lexical diagnostic encountered. Recovery is not
    /// attempted; the caller receives a single diagnostic per failed parse.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments(&mut tokens);
            let (line, column) = self.here();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    SourceLocation::point(line, column),
                ));
                break;
            };
            let token = self.lex_one(c, line, column)?;
            if !self.pending_comments.is_empty() {
                let mut tok = token;
                tok.leading_comments = std::mem::take(&mut self.pending_comments);
                tokens.push(tok);
            } else {
                tokens.push(token);
            }
            self.attach_trailing_comment(tokens.last_mut().unwrap());
        }
        Ok(tokens)
    }

    fn attach_trailing_comment(&mut self, token: &mut Token) {
        // Look ahead without consuming: only same-line whitespace then `#`.
        let mut i = self.pos;
        while matches!(self.chars.get(i), Some(' ') | Some('\t')) {
            i += 1;
        }
        if self.chars.get(i) == Some(&'#') {
            let start = i;
            while !matches!(self.chars.get(i), None | Some('\n')) {
                i += 1;
            }
            let text: String = self.chars[start..i].iter().collect();
            // Consume it for real, advancing position/line/column state.
            while self.pos < i {
                self.advance();
            }
            token.trailing_comment = Some(text.trim_start_matches('#').trim().to_string());
        }
    }

    fn skip_whitespace_and_comments(&mut self, _tokens: &mut [Token]) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    let start = self.pos;
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                    let text: String = self.chars[start..self.pos].iter().collect();
                    self.pending_comments
                        .push(text.trim_start_matches('#').trim().to_string());
                }
                _ => break,
            }
        }
    }

    fn lex_one(&mut self, c: char, line: usize, column: usize) -> Result<Token, Diagnostic> {
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.lex_identifier(line, column));
        }
        if c.is_ascii_digit() {
            return Ok(self.lex_number(line, column));
        }
        let simple = |len: usize| SourceLocation::new(line, column, line, column + len);
        macro_rules! single {
            ($kind:expr) => {{
                self.advance();
                Ok(Token::new($kind, simple(1)))
            }};
        }
        match c {
            '{' => single!(TokenKind::LBrace),
            '}' => single!(TokenKind::RBrace),
            '[' => single!(TokenKind::LBracket),
            ']' => single!(TokenKind::RBracket),
            '(' => single!(TokenKind::LParen),
            ')' => single!(TokenKind::RParen),
            ',' => single!(TokenKind::Comma),
            ':' => single!(TokenKind::Colon),
            '?' => single!(TokenKind::Question),
            '|' => single!(TokenKind::Pipe),
            '/' => single!(TokenKind::Slash),
            '.' => {
                if self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Ok(Token::new(TokenKind::DotDot, simple(2)))
                } else {
                    self.advance();
                    Ok(Token::new(TokenKind::Dot, simple(1)))
                }
            }
            other => {
                self.advance();
                Err(Diagnostic::new(
                    Code::UnexpectedChar,
                    format!("unexpected character `{}`", other),
                    SourceLocation::point(line, column),
                ))
            }
        }
    }

    fn lex_identifier(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let loc = SourceLocation::new(line, column, self.line, self.column);
        let kind = keyword_or_primitive(&text).unwrap_or(TokenKind::Identifier(text));
        Token::new(kind, loc)
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let value: u64 = text.parse().unwrap_or(0);
        let loc = SourceLocation::new(line, column, self.line, self.column);
        Token::new(TokenKind::Number(value), loc)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_minimal_agent() {
        let src = "agent A { name: string }";
        let toks = tokenize(src).unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Agent,
                TokenKind::Identifier("A".into()),
                TokenKind::LBrace,
                TokenKind::Identifier("name".into()),
                TokenKind::Colon,
                TokenKind::PrimString,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_dotdot_is_one_token() {
        let toks = tokenize("(0..120)").unwrap();
        assert!(toks.iter().any(|t| t.kind == TokenKind::DotDot));
    }

    #[test]
    fn unexpected_char_is_single_diagnostic() {
        let err = tokenize("agent A { x: $ }").unwrap_err();
        assert_eq!(err.code, Code::UnexpectedChar);
    }

    #[test]
    fn line_comment_is_captured_not_dropped() {
        let toks = tokenize("# hello\nenum E { a }").unwrap();
        assert_eq!(toks[0].leading_comments, vec!["hello".to_string()]);
    }
}
