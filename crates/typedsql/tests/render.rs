use std::collections::HashMap;
use std::sync::Arc;

use typedsql::literal::{DomainHandler, IntHandler};
use typedsql::{
    BindName, BindVariable, BuiltInFunction, Condition, DomainTag, Expr, LiteralRegistry,
    PlaceholderStyle, RenderConfig, Renderer, SqlGenError, TypeTag, Value, select,
};

fn name(s: &str) -> BindName {
    BindName::of(s).unwrap()
}

#[test]
fn subselect_is_indented_and_binds_are_shared() {
    let limit = BindVariable::new(name("limit"), TypeTag::Int);

    let inner = select()
        .from("orders", "o")
        .column("customer_id")
        .try_where(
            Expr::typed_column("total", TypeTag::Int)
                .and_then(|total| total.gt(Expr::bind(limit.clone()))),
        )
        .build()
        .unwrap();

    let outer = select()
        .from_select(inner, "big")
        .from("customers", "c")
        .column("c.name")
        .try_where(Expr::column("big.customer_id").and_then(|l| l.eq(Expr::column("c.id")?)))
        .try_where(
            Expr::typed_column("c.credit", TypeTag::Int)
                .and_then(|credit| credit.lt(Expr::bind(limit))),
        )
        .build()
        .unwrap();

    let stmt = Renderer::new().render(&outer).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
    c.name
FROM
    (
        SELECT
            o.customer_id
        FROM
            orders o
        WHERE
            o.total > ?
    ) big
  , customers c
WHERE
    big.customer_id = c.id
AND c.credit < ?
"
    );
    assert_eq!(stmt.binds().len(), 1);
    assert_eq!(stmt.binds()[0].name, name("LIMIT"));
    assert_eq!(stmt.binds()[0].positions, vec![1, 2]);
    assert_eq!(stmt.placeholder_count(), 2);
}

#[test]
fn conflicting_values_across_subselect_fail_at_render() {
    let inner = select()
        .from_table("orders")
        .column("id")
        .try_where(Expr::typed_column("total", TypeTag::Int).and_then(|t| {
            t.gt(Expr::bind(BindVariable::of_value(name("limit"), 10i64)))
        }))
        .build()
        .unwrap();
    let outer = select()
        .from_select(inner, "x")
        .column("id")
        .try_where(Expr::typed_column("id", TypeTag::Int).and_then(|t| {
            t.lt(Expr::bind(BindVariable::of_value(name("limit"), 20i64)))
        }))
        .build()
        .unwrap();

    let err = Renderer::new().render(&outer).unwrap_err();
    assert!(matches!(err, SqlGenError::ValueConflict { ref name, .. } if name == "LIMIT"));
    assert!(err.is_conflict());
}

#[test]
fn raw_fragments_keep_bind_order() {
    let n = BindVariable::of_value(name("n"), 3i64);
    let flag = BindVariable::new(name("flag"), TypeTag::Bool);
    let query = select()
        .from_raw("generate_series(1, ?)", Some("g"), vec![n])
        .column_raw("count(*)", Some("n"), vec![])
        .where_raw("a = 1\n  OR b = ?", vec![flag])
        .build()
        .unwrap();

    let stmt = Renderer::new().render(&query).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
    count(*) n
FROM
    generate_series(1, ?) g
WHERE
    a = 1
     OR b = ?
"
    );
    assert_eq!(stmt.binds()[0].name, name("N"));
    assert_eq!(stmt.binds()[0].positions, vec![1]);
    assert_eq!(stmt.binds()[1].name, name("FLAG"));
    assert_eq!(stmt.binds()[1].positions, vec![2]);
}

#[test]
fn raw_fragment_bind_count_is_checked() {
    let err = select()
        .column("a")
        .where_raw("a = ? AND b = ?", vec![BindVariable::new(name("x"), TypeTag::Int)])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SqlGenError::BindCountMismatch {
            placeholders: 2,
            binds: 1
        }
    );
}

#[test]
fn functions_aliases_and_boolean_conditions() {
    let pattern = BindVariable::new(name("pattern"), TypeTag::Text);
    let label = Expr::call(
        BuiltInFunction::StringConcat,
        vec![
            Expr::typed_column("first_name", TypeTag::Text).unwrap(),
            Expr::literal(" "),
            Expr::typed_column("last_name", TypeTag::Text).unwrap(),
        ],
    )
    .unwrap();
    let upper = Expr::call(BuiltInFunction::Upper, vec![label.clone()]).unwrap();

    let query = select()
        .from("people", "p")
        .expr_aliased(upper, "label")
        .where_(Condition::or([
            label.like(Expr::bind(pattern)).unwrap(),
            Condition::not(Expr::column("email").unwrap().is_null()),
        ]))
        .build()
        .unwrap();

    let stmt = Renderer::new().render(&query).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
    UPPER(p.first_name||' '||p.last_name) label
FROM
    people p
WHERE
    (p.first_name||' '||p.last_name LIKE ? OR NOT (p.email IS NULL))
"
    );
}

#[test]
fn always_true_conditions_are_dropped_from_where() {
    let x = Expr::typed_column("x", TypeTag::Int).unwrap();
    let query = select()
        .from_table("t")
        .column("x")
        .try_where(x.clone().eq(x))
        .where_(Condition::Empty)
        .build()
        .unwrap();
    let stmt = Renderer::new().render(&query).unwrap();
    assert_eq!(stmt.sql(), "SELECT\n    t.x\nFROM\n    t\n");
}

#[test]
fn dollar_placeholders_and_bind_params() {
    let config = RenderConfig::from_toml_str("placeholder = \"dollar\"\nindent = 2").unwrap();
    let renderer = Renderer::with_config(config).unwrap();
    assert_eq!(renderer.config().placeholder, PlaceholderStyle::Dollar);

    let id = BindVariable::new(name("id"), TypeTag::Int);
    let status = BindVariable::of_value(name("status"), "open");
    let query = select()
        .from("tickets", "t")
        .column("id")
        .column("title")
        .try_where(Expr::typed_column("id", TypeTag::Int).and_then(|c| c.eq(Expr::bind(id))))
        .try_where(
            Expr::typed_column("status", TypeTag::Text).and_then(|c| c.eq(Expr::bind(status))),
        )
        .build()
        .unwrap();

    let stmt = renderer.render(&query).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
  t.id
, t.title
FROM
  tickets t
WHERE
  t.id = $1
AND t.status = $2
"
    );

    let registry = LiteralRegistry::with_defaults();
    assert_eq!(
        stmt.bind_params(&registry, &HashMap::new()).unwrap_err(),
        SqlGenError::UnboundVariable("ID".into())
    );

    let mut overrides = HashMap::new();
    overrides.insert(name("id"), Value::Int(42));
    let params = stmt.bind_params(&registry, &overrides).unwrap();
    assert_eq!(params.len(), 2);
    assert!(params.as_refs().is_ok());
}

#[test]
fn domain_values_need_a_registered_handler() {
    const ORDER_ID: DomainTag = DomainTag::new("order_id");
    let value = Value::domain(ORDER_ID, 42i64);
    let expr = Expr::literal(value.clone());

    let err = Renderer::new().render_expr(&expr).unwrap_err();
    assert_eq!(err, SqlGenError::NoHandlerForType(TypeTag::Domain(ORDER_ID)));

    let registry = LiteralRegistry::with_defaults();
    registry.register(TypeTag::Domain(ORDER_ID), DomainHandler::new("BIGINT", IntHandler));
    let renderer = Renderer::new().with_registry(Arc::new(registry));
    assert_eq!(renderer.render_expr(&expr).unwrap().sql(), "42");
    assert_eq!(
        renderer.registry().sql_type(TypeTag::Domain(ORDER_ID)).unwrap(),
        "BIGINT"
    );
}

#[test]
fn literals_of_every_builtin_type() {
    let renderer = Renderer::new();
    let render = |v: Value| renderer.render_expr(&Expr::literal(v)).unwrap().sql().to_string();

    assert_eq!(render(Value::Bool(true)), "TRUE");
    assert_eq!(render(Value::Int(-5)), "-5");
    assert_eq!(render(Value::from("it's\nok")), "'it''s'||CHR(10)||'ok'");
    let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(render(Value::from(date)), "DATE '2024-02-29'");
    let ts = date.and_hms_opt(13, 5, 9).unwrap();
    assert_eq!(render(Value::from(ts)), "TIMESTAMP '2024-02-29 13:05:09'");
}

#[test]
fn empty_or_matches_nothing() {
    let query = select()
        .from_table("t")
        .column("x")
        .where_(Condition::or([]))
        .build()
        .unwrap();
    let stmt = Renderer::new().render(&query).unwrap();
    assert_eq!(stmt.sql(), "SELECT\n    t.x\nFROM\n    t\nWHERE\n    1=0\n");
}

#[test]
fn raw_literal_spanning_lines_keeps_its_value() {
    let inner = select()
        .from_table("t")
        .column("x")
        .where_raw("a = 'line1\n  line2'", vec![])
        .build()
        .unwrap();
    let outer = select().from_select(inner, "s").column("x").build().unwrap();

    let stmt = Renderer::new().render(&outer).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
    s.x
FROM
    (
        SELECT
            t.x
        FROM
            t
        WHERE
            a = 'line1
  line2'
    ) s
"
    );
}

#[test]
fn raw_fragment_ending_in_line_comment() {
    let query = select()
        .from_table("t")
        .column_raw("x -- note", Some("n"), vec![])
        .where_raw("a = 1 -- keep", vec![])
        .try_where(Expr::typed_column("b", TypeTag::Int).and_then(|b| b.eq(Expr::literal(2i64))))
        .build()
        .unwrap();
    let stmt = Renderer::new().render(&query).unwrap();
    assert_eq!(
        stmt.sql(),
        "\
SELECT
    x -- note
     n
FROM
    t
WHERE
    a = 1 -- keep
AND t.b = 2
"
    );

    let cond = Condition::eq(Expr::raw("x -- note", vec![]).unwrap(), Expr::literal(1i64)).unwrap();
    let stmt = Renderer::new().render_condition(&cond).unwrap();
    assert_eq!(stmt.sql(), "x -- note\n = 1");
}

#[test]
fn raw_fragment_with_non_ascii_whitespace() {
    let cond = Condition::raw("a = 1\n\u{a0}OR b = 2\n OR c = 3", vec![]).unwrap();
    let stmt = Renderer::new().render_condition(&cond).unwrap();
    assert_eq!(stmt.sql(), "a = 1\n \u{a0}OR b = 2\n  OR c = 3");
}

#[test]
fn renderer_token_limit_applies_to_raw_fragments() {
    let query = select()
        .from_table("t")
        .column("x")
        .where_raw("a = b AND c = d", vec![])
        .build()
        .unwrap();
    let config = RenderConfig {
        max_tokens: 2,
        ..RenderConfig::default()
    };
    let err = Renderer::with_config(config).unwrap().render(&query).unwrap_err();
    assert_eq!(err, SqlGenError::TooManyTokens(2));
    assert!(Renderer::new().render(&query).is_ok());
}
