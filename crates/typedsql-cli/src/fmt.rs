use crate::cli::FmtArgs;
use crate::config::ProjectConfig;
use crate::input::{read_source, source_label};
use typedsql::tokenizer::tokenize_with_limit;
use typedsql::{CodeBuilder, CodeIdent, RenderConfig, TokenKind};

pub fn run(args: FmtArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config)?;
    let sql = read_source(args.file.as_deref())?;
    let label = source_label(args.file.as_deref());

    let out = format_fragment(&sql, project.render(), args.extra_indent)
        .map_err(|e| anyhow::anyhow!("{label}: {e}"))?;
    tracing::debug!(source = %label, config = ?project.config_path, "formatted fragment");
    print!("{out}");
    Ok(())
}

/// Lay out `sql` the way the renderer embeds a raw fragment in a clause body:
/// one indent level in, continuation lines one column further plus
/// `extra_indent`. String literals spanning lines are left as written.
fn format_fragment(
    sql: &str,
    config: &RenderConfig,
    extra_indent: usize,
) -> typedsql::SqlGenResult<String> {
    let literals: Vec<_> = tokenize_with_limit(sql, config.max_tokens)?
        .into_iter()
        .filter(|t| t.kind == TokenKind::String && t.text.contains('\n'))
        .map(|t| t.start..t.end)
        .collect();

    let mut b = CodeBuilder::new(config.placeholder);
    b.push_indent(CodeIdent::simple(config.indent_str()));
    b.wrap_keeping(sql, &literals, extra_indent);
    b.pop_indent();
    b.append_line();
    let (text, _) = b.finish();
    Ok(text)
}
