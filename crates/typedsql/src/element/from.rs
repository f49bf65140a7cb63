use super::raw::RawSql;
use super::select::Select;
use crate::bind::BindVariable;
use crate::error::SqlGenResult;
use crate::name::{IntoNamePath, NamePath, SimpleName};
use std::sync::Arc;

/// One entry of a `FROM` list.
#[derive(Debug, Clone, PartialEq)]
pub enum FromElement {
    Table {
        name: NamePath,
        alias: Option<SimpleName>,
    },
    /// Nested select; SQL requires an alias here.
    Subselect {
        select: Arc<Select>,
        alias: SimpleName,
    },
    Raw {
        sql: Arc<RawSql>,
        alias: Option<SimpleName>,
    },
}

impl FromElement {
    pub fn table(name: impl IntoNamePath) -> SqlGenResult<Self> {
        Ok(FromElement::Table {
            name: name.into_name_path()?,
            alias: None,
        })
    }

    pub fn aliased(name: impl IntoNamePath, alias: &str) -> SqlGenResult<Self> {
        Ok(FromElement::Table {
            name: name.into_name_path()?,
            alias: Some(SimpleName::parse(alias)?),
        })
    }

    pub fn subselect(select: Select, alias: &str) -> SqlGenResult<Self> {
        Ok(FromElement::Subselect {
            select: Arc::new(select),
            alias: SimpleName::parse(alias)?,
        })
    }

    pub fn raw(sql: &str, alias: Option<&str>, binds: Vec<BindVariable>) -> SqlGenResult<Self> {
        Ok(FromElement::Raw {
            sql: Arc::new(RawSql::parse(sql, binds)?),
            alias: alias.map(SimpleName::parse).transpose()?,
        })
    }

    pub fn alias(&self) -> Option<&SimpleName> {
        match self {
            FromElement::Table { alias, .. } | FromElement::Raw { alias, .. } => alias.as_ref(),
            FromElement::Subselect { alias, .. } => Some(alias),
        }
    }

    /// The name columns of this element are qualified with: the alias when
    /// there is one, otherwise the table name.
    pub fn qualifier(&self) -> Option<NamePath> {
        match (self.alias(), self) {
            (Some(alias), _) => Some(NamePath::from_simple(alias.clone())),
            (None, FromElement::Table { name, .. }) => Some(name.clone()),
            (None, _) => None,
        }
    }

    /// Whether a column qualifier written by the caller refers to this element,
    /// either through its alias or through (a suffix of) its table name.
    pub fn resolves(&self, qualifier: &NamePath) -> bool {
        let by_alias = self
            .alias()
            .is_some_and(|alias| qualifier.segments() == std::slice::from_ref(alias));
        let by_name = matches!(self, FromElement::Table { name, .. } if name.matches(qualifier));
        by_alias || by_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifier_prefers_alias() {
        let plain = FromElement::table("Sales.Orders").unwrap();
        assert_eq!(plain.qualifier().unwrap().to_sql(), "sales.orders");

        let aliased = FromElement::aliased("Sales.Orders", "O").unwrap();
        assert_eq!(aliased.qualifier().unwrap().to_sql(), "o");

        let raw = FromElement::raw("generate_series(1, 3)", None, vec![]).unwrap();
        assert!(raw.qualifier().is_none());
    }

    #[test]
    fn resolves_by_alias_or_name_suffix() {
        let el = FromElement::aliased("sales.orders", "o").unwrap();
        assert!(el.resolves(&NamePath::parse("o").unwrap()));
        assert!(el.resolves(&NamePath::parse("orders").unwrap()));
        assert!(el.resolves(&NamePath::parse("SALES.ORDERS").unwrap()));
        assert!(!el.resolves(&NamePath::parse("hr.orders").unwrap()));
        assert!(!el.resolves(&NamePath::parse("x").unwrap()));
    }
}
