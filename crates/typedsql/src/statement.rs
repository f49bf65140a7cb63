//! The render artifact handed to the execution layer.

use crate::bind::{BindName, BindVariable, BindWithPosition};
use crate::error::{SqlGenError, SqlGenResult};
use crate::literal::LiteralRegistry;
use crate::params::PgParams;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;

/// SQL text plus its bind variables.
///
/// `binds` lists every distinct variable once, in order of first appearance,
/// with all of its placeholder positions; `variables` holds the merged variable
/// (including any captured value) for each entry of `binds`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    sql: String,
    binds: Vec<BindWithPosition>,
    variables: Vec<BindVariable>,
}

impl Statement {
    pub(crate) fn new(sql: String, binds: Vec<BindWithPosition>, variables: Vec<BindVariable>) -> Self {
        Self {
            sql,
            binds,
            variables,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindWithPosition] {
        &self.binds
    }

    pub fn variables(&self) -> &[BindVariable] {
        &self.variables
    }

    /// Number of placeholder markers in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.binds.iter().map(|b| b.positions.len()).sum()
    }

    /// Value captured for `name` at construction time, if any.
    pub fn value_of(&self, name: &BindName) -> Option<&Value> {
        self.variables
            .iter()
            .find(|v| v.name() == name)
            .and_then(BindVariable::value)
    }

    /// Build positional parameters for execution.
    ///
    /// Each variable's value comes from `overrides` when present there,
    /// otherwise from the value captured in the query. Values are encoded by
    /// the registry handler for the variable's type at every position.
    pub fn bind_params(
        &self,
        registry: &LiteralRegistry,
        overrides: &HashMap<BindName, Value>,
    ) -> SqlGenResult<PgParams> {
        let mut params = PgParams::with_len(self.placeholder_count());
        for (bind, variable) in self.binds.iter().zip(&self.variables) {
            let value = overrides
                .get(&bind.name)
                .or(variable.value())
                .ok_or_else(|| SqlGenError::UnboundVariable(bind.name.to_string()))?;
            if !bind.type_tag.is_instance(value) {
                return Err(SqlGenError::TypeConflict {
                    name: bind.name.to_string(),
                    existing: bind.type_tag,
                    incoming: value.type_tag(),
                });
            }
            for &position in &bind.positions {
                registry.bind(&mut params, position, bind.type_tag, Some(value))?;
            }
        }
        Ok(params)
    }

    pub fn into_parts(self) -> (String, Vec<BindWithPosition>) {
        (self.sql, self.binds)
    }
}
