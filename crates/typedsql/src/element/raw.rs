use crate::bind::BindVariable;
use crate::code::normalize_fragment_keeping;
use crate::error::{SqlGenError, SqlGenResult};
use crate::tokenizer::{DEFAULT_MAX_TOKENS, Token, TokenKind, tokenize_with_limit};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawPart {
    Text(String),
    /// A string literal spanning lines, written without re-indentation.
    Literal(String),
    /// Index into [`RawSql::binds`].
    Bind(usize),
}

/// A caller-supplied SQL fragment with `?` placeholders.
///
/// The fragment is tokenized once at construction: that rejects characters and
/// unterminated comments/strings that have no business in generated SQL, and
/// finds the real placeholders (a `?` inside a string literal or comment is
/// text). The i-th placeholder is bound to the i-th variable.
///
/// Indentation is normalized outside string literals only; a literal spanning
/// lines keeps its exact value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSql {
    text: String,
    parts: Vec<RawPart>,
    binds: Vec<BindVariable>,
    token_count: usize,
    ends_in_line_comment: bool,
}

/// Byte ranges of the string literals in `tokens` that span lines.
fn multi_line_literals(tokens: &[Token]) -> Vec<Range<usize>> {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::String && t.text.contains('\n'))
        .map(|t| t.start..t.end)
        .collect()
}

impl RawSql {
    pub fn parse(sql: &str, binds: Vec<BindVariable>) -> SqlGenResult<Self> {
        Self::parse_with_limit(sql, binds, DEFAULT_MAX_TOKENS)
    }

    pub fn parse_with_limit(
        sql: &str,
        binds: Vec<BindVariable>,
        max_tokens: usize,
    ) -> SqlGenResult<Self> {
        let tokens = tokenize_with_limit(sql, max_tokens)?;
        let literals = multi_line_literals(&tokens);
        let (text, _) = normalize_fragment_keeping(sql, &literals);

        // Offsets in `text` moved with normalization; tokenizing the result
        // again gives spans that index it directly.
        let tokens = tokenize_with_limit(&text, max_tokens)?;

        let mut parts = Vec::new();
        let mut last = 0;
        let mut placeholders = 0;
        for token in &tokens {
            let part = match token.kind {
                TokenKind::Placeholder => {
                    placeholders += 1;
                    RawPart::Bind(placeholders - 1)
                }
                TokenKind::String if token.text.contains('\n') => {
                    RawPart::Literal(token.text.clone())
                }
                _ => continue,
            };
            if token.start > last {
                parts.push(RawPart::Text(text[last..token.start].to_string()));
            }
            parts.push(part);
            last = token.end;
        }
        if last < text.len() {
            parts.push(RawPart::Text(text[last..].to_string()));
        }

        if placeholders != binds.len() {
            return Err(SqlGenError::BindCountMismatch {
                placeholders,
                binds: binds.len(),
            });
        }

        let ends_in_line_comment = tokens
            .last()
            .is_some_and(|t| t.kind == TokenKind::Comment && t.text.starts_with("--"));

        Ok(Self {
            text,
            parts,
            binds,
            token_count: tokens.len(),
            ends_in_line_comment,
        })
    }

    /// The normalized fragment text, placeholders included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn binds(&self) -> &[BindVariable] {
        &self.binds
    }

    /// Number of tokens in the fragment.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Whether the fragment ends in a `--` comment, which would swallow
    /// anything written after it on the same line.
    pub fn ends_in_line_comment(&self) -> bool {
        self.ends_in_line_comment
    }

    pub(crate) fn parts(&self) -> &[RawPart] {
        &self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindName;
    use crate::value::TypeTag;

    fn var(name: &str) -> BindVariable {
        BindVariable::new(BindName::of(name).unwrap(), TypeTag::Int)
    }

    #[test]
    fn splits_on_real_placeholders() {
        let raw = RawSql::parse("  a = ? AND b = '?' -- ?\n  OR c = ?", vec![var("x"), var("y")])
            .unwrap();
        assert_eq!(raw.text(), "a = ? AND b = '?' -- ?\nOR c = ?");
        assert_eq!(
            raw.parts(),
            &[
                RawPart::Text("a = ".into()),
                RawPart::Bind(0),
                RawPart::Text(" AND b = '?' -- ?\nOR c = ".into()),
                RawPart::Bind(1),
            ]
        );
    }

    #[test]
    fn placeholder_count_must_match() {
        assert_eq!(
            RawSql::parse("a = ? OR b = ?", vec![var("x")]).unwrap_err(),
            SqlGenError::BindCountMismatch {
                placeholders: 2,
                binds: 1
            }
        );
        assert!(RawSql::parse("a = 1", vec![var("x")]).is_err());
    }

    #[test]
    fn tokenizer_errors_surface() {
        assert!(RawSql::parse("a = 'open", vec![]).unwrap_err().is_tokenizer_error());
        assert_eq!(
            RawSql::parse_with_limit("a b c", vec![], 2).unwrap_err(),
            SqlGenError::TooManyTokens(2)
        );
    }

    #[test]
    fn literal_spanning_lines_keeps_its_value() {
        let raw = RawSql::parse(
            "    a = 'line1\n  line2  \nline3'\n      OR b = ?",
            vec![var("x")],
        )
        .unwrap();
        assert_eq!(raw.text(), "a = 'line1\n  line2  \nline3'\nOR b = ?");
        assert_eq!(
            raw.parts(),
            &[
                RawPart::Text("a = ".into()),
                RawPart::Literal("'line1\n  line2  \nline3'".into()),
                RawPart::Text("\nOR b = ".into()),
                RawPart::Bind(0),
            ]
        );
    }

    #[test]
    fn non_ascii_whitespace_is_not_indentation() {
        let raw = RawSql::parse("a = 1\n\u{a0}OR b = 2\n OR c = 3", vec![]).unwrap();
        assert_eq!(raw.text(), "a = 1\n\u{a0}OR b = 2\n OR c = 3");
    }

    #[test]
    fn trailing_line_comment_is_flagged() {
        assert!(RawSql::parse("x -- note", vec![]).unwrap().ends_in_line_comment());
        assert!(!RawSql::parse("x -- note\n+ 1", vec![]).unwrap().ends_in_line_comment());
        assert!(!RawSql::parse("x /* note */", vec![]).unwrap().ends_in_line_comment());
    }

    #[test]
    fn counts_tokens() {
        assert_eq!(RawSql::parse("a = b AND c = d", vec![]).unwrap().token_count(), 7);
    }
}
