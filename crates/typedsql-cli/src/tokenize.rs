use crate::cli::TokenizeArgs;
use crate::config::ProjectConfig;
use crate::input::{read_source, source_label};
use std::fmt::Write;
use typedsql::tokenizer::tokenize_with_limit;
use typedsql::{Token, TokenKind};

pub fn run(args: TokenizeArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config)?;
    let sql = read_source(args.file.as_deref())?;
    let label = source_label(args.file.as_deref());

    let tokens = tokenize_with_limit(&sql, project.render().max_tokens)
        .map_err(|e| anyhow::anyhow!("{label}: {e}"))?;
    tracing::debug!(
        source = %label,
        config = ?project.config_path,
        tokens = tokens.len(),
        "tokenized input"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        print!("{}", format_table(&tokens));
    }
    Ok(())
}

fn kind_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Comment => "comment",
        TokenKind::Symbol => "symbol",
        TokenKind::Name => "name",
        TokenKind::QuotedName => "quoted_name",
        TokenKind::Number => "number",
        TokenKind::String => "string",
        TokenKind::Placeholder => "placeholder",
    }
}

/// One line per token: `line:column  kind  text`, with newlines in the text
/// shown as `\n`.
fn format_table(tokens: &[Token]) -> String {
    let positions: Vec<String> = tokens
        .iter()
        .map(|t| format!("{}:{}", t.line, t.column))
        .collect();
    let pos_width = positions.iter().map(String::len).max().unwrap_or(0);
    let kind_width = tokens
        .iter()
        .map(|t| kind_label(t.kind).len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (token, pos) in tokens.iter().zip(&positions) {
        let _ = writeln!(
            out,
            "{pos:<pos_width$}  {:<kind_width$}  {}",
            kind_label(token.kind),
            token.text.replace('\n', "\\n")
        );
    }
    let _ = writeln!(out, "{} token(s)", tokens.len());
    out
}
