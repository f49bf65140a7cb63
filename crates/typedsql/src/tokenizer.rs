//! Tokenizer for caller-supplied SQL fragments.
//!
//! This is not a SQL parser. It splits a fragment into comments, symbols, names,
//! numbers, string literals and `?` placeholders so that placeholders can be
//! located (and never confused with a `?` inside a string or comment), and so
//! that garbage input is rejected before it is spliced into generated SQL.

use crate::error::{SqlGenError, SqlGenResult};
use serde::Serialize;

/// Two-character symbols, matched before single characters.
const SYMBOLS2: [&str; 7] = ["=>", ":=", "!=", "<=", ">=", "<>", "||"];
const SYMBOLS1: [char; 13] = ['(', ')', ',', '+', '-', '/', '*', ';', '.', '%', '=', '>', '<'];

pub const DEFAULT_MAX_TOKENS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `-- ...` or `/* ... */`
    Comment,
    Symbol,
    /// Identifier or keyword.
    Name,
    /// `"..."` identifier.
    QuotedName,
    Number,
    /// `'...'` literal.
    String,
    /// `?`
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column (in characters) of the first character.
    pub column: usize,
    /// Byte range in the source.
    pub start: usize,
    pub end: usize,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, f: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&f) {
            self.bump();
        }
    }
}

/// Tokenize `sql` with the default token limit.
pub fn tokenize(sql: &str) -> SqlGenResult<Vec<Token>> {
    tokenize_with_limit(sql, DEFAULT_MAX_TOKENS)
}

/// Tokenize `sql`, failing with [`SqlGenError::TooManyTokens`] past `max_tokens`.
pub fn tokenize_with_limit(sql: &str, max_tokens: usize) -> SqlGenResult<Vec<Token>> {
    let mut s = Scanner::new(sql);
    let mut tokens = Vec::new();

    while let Some(c) = s.peek() {
        if c.is_whitespace() {
            s.bump();
            continue;
        }

        let (start, line, column) = (s.pos, s.line, s.column);
        let kind = match (c, s.peek2()) {
            ('-', Some('-')) => {
                s.bump_while(|c| c != '\n');
                TokenKind::Comment
            }
            ('/', Some('*')) => {
                s.bump();
                s.bump();
                loop {
                    if s.rest().starts_with("*/") {
                        s.bump();
                        s.bump();
                        break;
                    }
                    if s.bump().is_none() {
                        return Err(SqlGenError::UnterminatedComment { line, column });
                    }
                }
                TokenKind::Comment
            }
            ('\'', _) => {
                s.bump();
                loop {
                    match s.bump() {
                        Some('\'') if s.peek() == Some('\'') => {
                            s.bump();
                        }
                        Some('\'') => break,
                        Some(_) => {}
                        None => return Err(SqlGenError::UnterminatedString { line, column }),
                    }
                }
                TokenKind::String
            }
            ('"', _) => {
                s.bump();
                loop {
                    match s.bump() {
                        Some('"') if s.peek() == Some('"') => {
                            s.bump();
                        }
                        Some('"') => break,
                        Some('\n') | None => {
                            return Err(SqlGenError::InvalidCharacter { line, column, ch: '"' });
                        }
                        Some(_) => {}
                    }
                }
                TokenKind::QuotedName
            }
            ('?', _) => {
                s.bump();
                TokenKind::Placeholder
            }
            (c, _) if c.is_ascii_alphabetic() || c == '_' => {
                s.bump_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'));
                TokenKind::Name
            }
            (c, _) if c.is_ascii_digit() => {
                scan_number(&mut s);
                TokenKind::Number
            }
            _ => {
                let rest = s.rest();
                if let Some(len) = SYMBOLS2.iter().find(|sym| rest.starts_with(**sym)).map(|sym| sym.len()) {
                    for _ in 0..len {
                        s.bump();
                    }
                } else if SYMBOLS1.contains(&c) {
                    s.bump();
                } else {
                    return Err(SqlGenError::InvalidCharacter { line, column, ch: c });
                }
                TokenKind::Symbol
            }
        };

        if tokens.len() == max_tokens {
            return Err(SqlGenError::TooManyTokens(max_tokens));
        }
        tokens.push(Token {
            kind,
            text: sql[start..s.pos].to_string(),
            line,
            column,
            start,
            end: s.pos,
        });
    }

    tracing::trace!(tokens = tokens.len(), "tokenized raw SQL fragment");
    Ok(tokens)
}

fn scan_number(s: &mut Scanner<'_>) {
    s.bump_while(|c| c.is_ascii_digit());
    if s.peek() == Some('.') && s.peek2().is_some_and(|c| c.is_ascii_digit()) {
        s.bump();
        s.bump_while(|c| c.is_ascii_digit());
    }
    if matches!(s.peek(), Some('e' | 'E')) {
        let mut look = s.rest().chars().skip(1);
        let next = look.next();
        let exp_ok = match next {
            Some('+' | '-') => look.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        if exp_ok {
            s.bump();
            if matches!(s.peek(), Some('+' | '-')) {
                s.bump();
            }
            s.bump_while(|c| c.is_ascii_digit());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(sql: &str) -> Vec<(TokenKind, String)> {
        tokenize(sql)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn comment_then_symbols_with_positions() {
        let tokens = tokenize("-- comment\n(a,b)").unwrap();
        let got: Vec<(TokenKind, &str, usize, usize)> = tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str(), t.line, t.column))
            .collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::Comment, "-- comment", 1, 1),
                (TokenKind::Symbol, "(", 2, 1),
                (TokenKind::Name, "a", 2, 2),
                (TokenKind::Symbol, ",", 2, 3),
                (TokenKind::Name, "b", 2, 4),
                (TokenKind::Symbol, ")", 2, 5),
            ]
        );
    }

    #[test]
    fn two_char_symbols_win() {
        let symbols: Vec<String> = kinds_and_text("a<=b <> c := d => e != f >= g || h < i")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Symbol)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(symbols, vec!["<=", "<>", ":=", "=>", "!=", ">=", "||", "<"]);
    }

    #[test]
    fn block_comment_spans_lines() {
        let tokens = tokenize("x /* a\n b */ y").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].text, "/* a\n b */");
        assert_eq!((tokens[2].line, tokens[2].column), (2, 7));
    }

    #[test]
    fn unterminated_comment_fails() {
        assert_eq!(
            tokenize("a\n  /* never closed").unwrap_err(),
            SqlGenError::UnterminatedComment { line: 2, column: 3 }
        );
    }

    #[test]
    fn invalid_character_reports_position() {
        assert_eq!(
            tokenize("a = 1\nb @ 2").unwrap_err(),
            SqlGenError::InvalidCharacter {
                line: 2,
                column: 3,
                ch: '@'
            }
        );
        assert!(matches!(
            tokenize("a : b").unwrap_err(),
            SqlGenError::InvalidCharacter { ch: ':', .. }
        ));
    }

    #[test]
    fn strings_hide_placeholders_and_comments() {
        let got = kinds_and_text("x = 'it''s -- ?' AND y = ?");
        assert_eq!(
            got,
            vec![
                (TokenKind::Name, "x".to_string()),
                (TokenKind::Symbol, "=".to_string()),
                (TokenKind::String, "'it''s -- ?'".to_string()),
                (TokenKind::Name, "AND".to_string()),
                (TokenKind::Name, "y".to_string()),
                (TokenKind::Symbol, "=".to_string()),
                (TokenKind::Placeholder, "?".to_string()),
            ]
        );
        assert!(matches!(
            tokenize("'open").unwrap_err(),
            SqlGenError::UnterminatedString { line: 1, column: 1 }
        ));
    }

    #[test]
    fn numbers_and_quoted_names() {
        let got = kinds_and_text(r#"1.5e-3 + 10 . "Mixed Case""#);
        assert_eq!(got[0], (TokenKind::Number, "1.5e-3".to_string()));
        assert_eq!(got[2], (TokenKind::Number, "10".to_string()));
        assert_eq!(got[3], (TokenKind::Symbol, ".".to_string()));
        assert_eq!(got[4], (TokenKind::QuotedName, r#""Mixed Case""#.to_string()));
    }

    #[test]
    fn token_limit() {
        assert_eq!(tokenize_with_limit("a b c", 3).unwrap().len(), 3);
        assert_eq!(
            tokenize_with_limit("a b c d", 3).unwrap_err(),
            SqlGenError::TooManyTokens(3)
        );
    }

    #[test]
    fn byte_ranges_cover_text() {
        let sql = "émoji = ?";
        let err = tokenize(sql).unwrap_err();
        assert!(matches!(err, SqlGenError::InvalidCharacter { ch: 'é', .. }));

        let sql = "name = ?";
        for t in tokenize(sql).unwrap() {
            assert_eq!(&sql[t.start..t.end], t.text);
        }
    }
}
