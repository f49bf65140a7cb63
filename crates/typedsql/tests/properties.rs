use proptest::prelude::*;

use typedsql::{
    BindName, BindVariable, Condition, Expr, Renderer, TypeTag, TokenKind, escape_text_literal,
    tokenize, unescape_text_literal,
};

proptest! {
    #[test]
    fn text_escaping_round_trips(s in any::<String>()) {
        let literal = escape_text_literal(&s);
        prop_assert!(!literal.contains('\n'));
        prop_assert_eq!(unescape_text_literal(&literal), Some(s));
    }

    #[test]
    fn bind_names_normalize(s in "[a-zA-Z][a-zA-Z0-9_]{0,12}") {
        let canonical = BindName::of(&s.to_uppercase()).unwrap();
        prop_assert_eq!(BindName::of(&s).unwrap(), canonical.clone());
        prop_assert_eq!(BindName::of(&format!("  {s}\t")).unwrap(), canonical);
    }

    /// Every placeholder gets exactly one position and positions are 1..=N,
    /// however often each variable is repeated.
    #[test]
    fn bind_positions_cover_every_marker(uses in prop::collection::vec(0usize..4, 1..24)) {
        let conditions: Vec<Condition> = uses
            .iter()
            .enumerate()
            .map(|(i, var)| {
                let bind = BindVariable::new(BindName::of(&format!("v{var}")).unwrap(), TypeTag::Int);
                Expr::typed_column(format!("c{i}"), TypeTag::Int)
                    .unwrap()
                    .eq(Expr::bind(bind))
                    .unwrap()
            })
            .collect();
        let stmt = Renderer::new().render_condition(&Condition::and(conditions)).unwrap();

        let markers = stmt.sql().matches('?').count();
        prop_assert_eq!(markers, uses.len());
        prop_assert_eq!(stmt.placeholder_count(), uses.len());

        let mut positions: Vec<usize> = stmt
            .binds()
            .iter()
            .flat_map(|b| b.positions.iter().copied())
            .collect();
        positions.sort_unstable();
        prop_assert_eq!(positions, (1..=uses.len()).collect::<Vec<_>>());

        let mut distinct = uses.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(stmt.binds().len(), distinct.len());
    }

    #[test]
    fn tokenizer_splits_simple_words(words in prop::collection::vec("[a-z_][a-z0-9_]{0,8}", 1..30)) {
        let sql = words.join(" \n ");
        let tokens = tokenize(&sql).unwrap();
        prop_assert_eq!(tokens.len(), words.len());
        for (token, word) in tokens.iter().zip(&words) {
            prop_assert_eq!(token.kind, TokenKind::Name);
            prop_assert_eq!(&token.text, word);
        }
    }
}
