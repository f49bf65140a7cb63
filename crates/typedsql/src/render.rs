//! Render query trees into SQL text.
//!
//! Every node implements [`Render`], writing itself into a [`CodeBuilder`].
//! The [`Renderer`] owns what rendering needs beyond the tree: the literal
//! registry, the SQL templates of built-ins and comparison operators, and the
//! layout configuration.
//!
//! Layout is fixed: each clause keyword on its own line, one list item per
//! line, items indented one level, later items led by `, ` (or `AND ` in
//! `WHERE`) right-aligned into the indentation.
//!
//! ```text
//! SELECT
//!     o.id
//!   , o.total
//! FROM
//!     orders o
//! WHERE
//!     o.status = ?
//! AND o.total > 100
//! ```

use crate::builtin::{BuiltInFunction, ConditionOperator};
use crate::code::{CodeBuilder, CodeIdent};
use crate::config::RenderConfig;
use crate::element::{
    ColumnRef, Condition, Expr, FromElement, FunctionCall, RawPart, RawSql, Select, SelectColumn,
};
use crate::error::{SqlGenError, SqlGenResult};
use crate::literal::LiteralRegistry;
use crate::name::NamePath;
use crate::statement::Statement;
use std::collections::HashMap;
use std::sync::Arc;

/// Rendered for a condition that is always true.
pub const ALWAYS_TRUE: &str = "1=1";
/// Rendered for an `OR` without branches.
pub const ALWAYS_FALSE: &str = "1=0";
/// Rendered for a `FROM` list without elements.
pub const DUAL: &str = "dual";

/// Per-render state: the renderer and the `FROM` lists of the selects being
/// rendered, innermost last.
pub(crate) struct RenderContext<'a> {
    renderer: &'a Renderer,
    scopes: Vec<&'a [FromElement]>,
}

impl<'a> RenderContext<'a> {
    fn new(renderer: &'a Renderer) -> Self {
        Self {
            renderer,
            scopes: Vec::new(),
        }
    }

    /// Qualifier to print in front of `column`, if any.
    ///
    /// A written qualifier is looked up from the innermost select outwards and
    /// replaced by the matching element's alias; one that matches nothing is
    /// kept verbatim. A bare column is qualified only when the innermost select
    /// reads from exactly one element.
    fn qualifier_for(&self, column: &ColumnRef) -> Option<NamePath> {
        match column.table() {
            None => match self.scopes.last().copied() {
                Some([only]) => only.qualifier(),
                _ => None,
            },
            Some(written) => Some(
                self.scopes
                    .iter()
                    .rev()
                    .flat_map(|scope| scope.iter())
                    .find(|element| element.resolves(written))
                    .and_then(FromElement::qualifier)
                    .unwrap_or_else(|| written.clone()),
            ),
        }
    }
}

/// A node that can write itself as SQL.
pub(crate) trait Render {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()>;
}

/// Statement factory: turns query trees into [`Statement`]s.
///
/// A renderer is immutable once configured and can be shared between threads.
///
/// # Example
/// ```ignore
/// use typedsql::{Renderer, select};
///
/// let query = select().from("orders", "o").column("id").build()?;
/// let stmt = Renderer::new().render(&query)?;
/// assert_eq!(stmt.sql(), "SELECT\n    o.id\nFROM\n    orders o\n");
/// # Ok::<(), typedsql::SqlGenError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<LiteralRegistry>,
    config: RenderConfig,
    functions: HashMap<BuiltInFunction, String>,
    operators: HashMap<ConditionOperator, String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Renderer with the default configuration, literal handlers and templates.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(LiteralRegistry::with_defaults()),
            config: RenderConfig::default(),
            functions: BuiltInFunction::ALL
                .iter()
                .map(|f| (*f, f.spec().template.to_string()))
                .collect(),
            operators: ConditionOperator::ALL
                .iter()
                .map(|op| (*op, op.template().to_string()))
                .collect(),
        }
    }

    pub fn with_config(config: RenderConfig) -> SqlGenResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn with_registry(mut self, registry: Arc<LiteralRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Override the SQL template of a built-in function.
    pub fn with_template(mut self, builtin: BuiltInFunction, template: impl Into<String>) -> Self {
        self.functions.insert(builtin, template.into());
        self
    }

    /// Override the SQL template of a comparison operator.
    pub fn with_operator_template(
        mut self,
        op: ConditionOperator,
        template: impl Into<String>,
    ) -> Self {
        self.operators.insert(op, template.into());
        self
    }

    pub fn registry(&self) -> &Arc<LiteralRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn template(&self, builtin: BuiltInFunction) -> &str {
        self.functions
            .get(&builtin)
            .map(String::as_str)
            .unwrap_or(builtin.spec().template)
    }

    fn operator_template(&self, op: ConditionOperator) -> &str {
        self.operators
            .get(&op)
            .map(String::as_str)
            .unwrap_or(op.template())
    }

    fn builder(&self) -> CodeBuilder {
        CodeBuilder::new(self.config.placeholder)
    }

    /// Render a complete select.
    pub fn render(&self, select: &Select) -> SqlGenResult<Statement> {
        self.render_node(select)
    }

    /// Render a condition on its own, e.g. to splice into hand-written SQL.
    pub fn render_condition(&self, condition: &Condition) -> SqlGenResult<Statement> {
        self.render_node(condition)
    }

    /// Render an expression on its own.
    pub fn render_expr(&self, expr: &Expr) -> SqlGenResult<Statement> {
        self.render_node(expr)
    }

    fn render_node(&self, node: &impl Render) -> SqlGenResult<Statement> {
        let mut ctx = RenderContext::new(self);
        let mut b = self.builder();
        node.render(&mut ctx, &mut b)?;
        let (sql, binds, variables) = b.into_parts();
        tracing::debug!(sql = %sql, binds = binds.len(), "rendered statement");
        Ok(Statement::new(sql, binds, variables))
    }
}

enum Slot<'t> {
    Text(&'t str),
    Arg(usize),
    /// `{*}`: every argument, comma separated.
    All,
}

fn parse_template(template: &str) -> Vec<Slot<'_>> {
    let mut slots = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        let slot = match &rest[open + 1..close] {
            "*" => Slot::All,
            inner => match inner.parse::<usize>() {
                Ok(n) => Slot::Arg(n),
                Err(_) => {
                    slots.push(Slot::Text(&rest[..=close]));
                    rest = &rest[close + 1..];
                    continue;
                }
            },
        };
        if open > 0 {
            slots.push(Slot::Text(&rest[..open]));
        }
        slots.push(slot);
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        slots.push(Slot::Text(rest));
    }
    slots
}

/// Fill `slots` with already rendered arguments.
fn fill(
    name: &str,
    slots: &[Slot<'_>],
    args: &[CodeBuilder],
    b: &mut CodeBuilder,
) -> SqlGenResult<()> {
    for slot in slots {
        match slot {
            Slot::Text(text) => {
                b.append(text);
            }
            Slot::Arg(n) => {
                let arg = args.get(*n).ok_or_else(|| {
                    SqlGenError::mismatch(name, format!("template slot {{{n}}} has no argument"))
                })?;
                b.embed(arg.clone())?;
            }
            Slot::All => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        b.append(", ");
                    }
                    b.embed(arg.clone())?;
                }
            }
        }
    }
    Ok(())
}

/// Apply a template to rendered arguments.
///
/// A template with slots `{0}` and `{1}` only, given more than two
/// arguments, folds left: `{0}||{1}` over `a, b, c` is `a||b||c`.
fn apply_template(
    name: &str,
    template: &str,
    args: Vec<CodeBuilder>,
    b: &mut CodeBuilder,
) -> SqlGenResult<()> {
    let slots = parse_template(template);
    let binary = slots.iter().all(|s| matches!(s, Slot::Text(_) | Slot::Arg(0 | 1)))
        && slots.iter().any(|s| matches!(s, Slot::Arg(1)));

    if !binary || args.len() <= 2 {
        return fill(name, &slots, &args, b);
    }

    let mut args = args.into_iter();
    let Some(mut acc) = args.next() else {
        return Ok(());
    };
    for next in args {
        let mut folded = b.sibling();
        fill(name, &slots, &[acc, next], &mut folded)?;
        acc = folded;
    }
    b.embed(acc)?;
    Ok(())
}

fn render_args<'a>(
    ctx: &mut RenderContext<'a>,
    args: &'a [Expr],
    parenthesize_operators: bool,
    b: &CodeBuilder,
) -> SqlGenResult<Vec<CodeBuilder>> {
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        let mut out = b.sibling();
        if parenthesize_operators && arg.is_operator() {
            out.append("(");
            arg.render(ctx, &mut out)?;
            out.append(")");
        } else {
            arg.render(ctx, &mut out)?;
        }
        rendered.push(out);
    }
    Ok(rendered)
}

impl Render for Expr {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        match self {
            Expr::Literal(value) => {
                let text = ctx.renderer.registry.literal_text(value)?;
                b.append(&text);
            }
            Expr::Column(column) => column.render(ctx, b)?,
            Expr::Bind(variable) => {
                b.append_bind(variable)?;
            }
            Expr::Function(call) => call.render(ctx, b)?,
            Expr::Raw { sql, .. } => sql.render(ctx, b)?,
        }
        Ok(())
    }
}

impl Render for ColumnRef {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        match ctx.qualifier_for(self) {
            Some(qualifier) => {
                b.append_name(&qualifier.to_sql())
                    .append(".")
                    .append(&self.column().to_sql());
            }
            None => {
                b.append_name(&self.column().to_sql());
            }
        }
        Ok(())
    }
}

impl Render for FunctionCall {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        let builtin = self.builtin();
        let args = render_args(ctx, self.args(), builtin.spec().is_operator, b)?;
        apply_template(builtin.name(), ctx.renderer.template(builtin), args, b)
    }
}

impl Render for RawSql {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        let max_tokens = ctx.renderer.config.max_tokens;
        if self.token_count() > max_tokens {
            return Err(SqlGenError::TooManyTokens(max_tokens));
        }
        b.wrapped(0, |b| {
            for part in self.parts() {
                match part {
                    RawPart::Text(text) => {
                        b.append(text);
                    }
                    RawPart::Literal(text) => {
                        b.append_verbatim(text);
                    }
                    RawPart::Bind(i) => {
                        b.append_bind(&self.binds()[*i])?;
                    }
                }
            }
            Ok::<_, SqlGenError>(())
        })?;
        if self.ends_in_line_comment() {
            b.break_before_next();
        }
        Ok(())
    }
}

impl Render for Condition {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        if self.is_empty() {
            b.append(ALWAYS_TRUE);
            return Ok(());
        }
        match self {
            Condition::Compare { left, op, right } => {
                let args = render_args(ctx, std::slice::from_ref(left), false, b)?
                    .into_iter()
                    .chain(render_args(ctx, std::slice::from_ref(right), false, b)?)
                    .collect();
                apply_template(op.name(), ctx.renderer.operator_template(*op), args, b)?;
            }
            Condition::IsNull { expr, negated } => {
                expr.render(ctx, b)?;
                b.append(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Condition::And(_) | Condition::Or(_) => {
                let joiner = if matches!(self, Condition::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                match self.live_children().as_slice() {
                    [] => {
                        b.append(ALWAYS_FALSE);
                    }
                    [only] => only.render(ctx, b)?,
                    children => {
                        b.append("(");
                        for (i, child) in children.iter().enumerate() {
                            if i > 0 {
                                b.append(joiner);
                            }
                            child.render(ctx, b)?;
                        }
                        b.append(")");
                    }
                }
            }
            Condition::Not(inner) => {
                if inner.is_parenthesized() {
                    b.append("NOT ");
                    inner.render(ctx, b)?;
                } else {
                    b.append("NOT (");
                    inner.render(ctx, b)?;
                    b.append(")");
                }
            }
            Condition::Raw(sql) => sql.render(ctx, b)?,
            Condition::Empty => {
                b.append(ALWAYS_TRUE);
            }
        }
        Ok(())
    }
}

impl Render for SelectColumn {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        self.expr().render(ctx, b)?;
        if let Some(alias) = self.alias() {
            b.append(" ").append(&alias.to_sql());
        }
        Ok(())
    }
}

impl Render for FromElement {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        match self {
            FromElement::Table { name, .. } => {
                b.append_name(&name.to_sql());
            }
            FromElement::Subselect { select, .. } => {
                let mut inner = b.sibling();
                select.render(ctx, &mut inner)?;
                b.append("(").append_line();
                b.push_indent(CodeIdent::spaces(ctx.renderer.config.indent));
                b.embed(inner)?;
                b.pop_indent();
                b.append(")");
            }
            FromElement::Raw { sql, .. } => sql.render(ctx, b)?,
        }
        if let Some(alias) = self.alias() {
            b.append(" ").append(&alias.to_sql());
        }
        Ok(())
    }
}

/// Write `items` one per line, the first led by `first`, the rest by `sep`.
fn render_list<'a, T: Render>(
    ctx: &mut RenderContext<'a>,
    b: &mut CodeBuilder,
    items: impl IntoIterator<Item = &'a T>,
    first: &str,
    sep: &str,
) -> SqlGenResult<()>
where
    T: 'a,
{
    let rest = ctx.renderer.config.indent_str();
    for (i, item) in items.into_iter().enumerate() {
        let lead = if i == 0 { first } else { sep };
        b.push_indent(CodeIdent::first_line(lead, rest.as_str()));
        item.render(ctx, b)?;
        b.append_line();
        b.pop_indent();
    }
    Ok(())
}

impl Render for Select {
    fn render<'a>(&'a self, ctx: &mut RenderContext<'a>, b: &mut CodeBuilder) -> SqlGenResult<()> {
        ctx.scopes.push(self.from());
        let result = render_select(self, ctx, b);
        ctx.scopes.pop();
        result
    }
}

fn render_select<'a>(
    select: &'a Select,
    ctx: &mut RenderContext<'a>,
    b: &mut CodeBuilder,
) -> SqlGenResult<()> {
    let indent = ctx.renderer.config.indent;
    let lead = ctx.renderer.config.indent_str();
    let comma = format!("{}, ", " ".repeat(indent.saturating_sub(2)));

    b.append("SELECT").append_line();
    render_list(ctx, b, select.columns(), &lead, &comma)?;

    b.append("FROM").append_line();
    if select.from().is_empty() {
        b.push_indent(CodeIdent::spaces(indent));
        b.append(DUAL).append_line();
        b.pop_indent();
    } else {
        render_list(ctx, b, select.from(), &lead, &comma)?;
    }

    let items = select.condition().where_items();
    if !items.is_empty() {
        let and = format!("{:<indent$}", "AND ");
        b.append("WHERE").append_line();
        render_list(ctx, b, items, &lead, &and)?;
    }
    Ok(())
}
