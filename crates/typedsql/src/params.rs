//! Parameter storage for the execution layer.
//!
//! Rendering produces placeholder positions; executing a statement needs one
//! `tokio-postgres` parameter per position. Literal handlers write parameters
//! through the [`ParamSink`] trait so they never depend on a concrete driver
//! type, and [`PgParams`] is the sink that hands them to `tokio-postgres`.

use crate::error::{SqlGenError, SqlGenResult};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// One parameter value. Values are shared, so cloning a filled [`PgParams`]
/// copies pointers only.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    pub fn new<T>(value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// The value in the shape `tokio_postgres::Client::query` takes.
    pub fn to_sql_ref(&self) -> &(dyn ToSql + Sync) {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Param({:?})", self.0)
    }
}

/// Destination for bound parameters, addressed by 1-based placeholder position.
pub trait ParamSink {
    fn set(&mut self, position: usize, param: Param);
}

/// Positional parameters ready for `tokio-postgres`.
#[derive(Clone, Debug, Default)]
pub struct PgParams {
    slots: Vec<Option<Param>>,
}

impl PgParams {
    /// Create a sink for a statement with `count` placeholders.
    pub fn with_len(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parameter bound at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&Param> {
        position
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    /// Parameters in position order, for `tokio-postgres`.
    ///
    /// Fails with [`SqlGenError::UnboundVariable`] naming the first empty slot.
    pub fn as_refs(&self) -> SqlGenResult<Vec<&(dyn ToSql + Sync)>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.as_ref()
                    .map(Param::to_sql_ref)
                    .ok_or_else(|| SqlGenError::UnboundVariable(format!("position {}", i + 1)))
            })
            .collect()
    }
}

impl ParamSink for PgParams {
    fn set(&mut self, position: usize, param: Param) {
        if position == 0 {
            return;
        }
        if self.slots.len() < position {
            self.slots.resize(position, None);
        }
        self.slots[position - 1] = Some(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_and_addresses_by_position() {
        let mut params = PgParams::with_len(1);
        params.set(3, Param::new(7i64));
        assert_eq!(params.len(), 3);
        assert!(params.get(3).is_some());
        assert!(params.get(1).is_none());
        assert!(params.get(0).is_none());
    }

    #[test]
    fn as_refs_requires_every_position() {
        let mut params = PgParams::with_len(2);
        params.set(1, Param::new("a".to_string()));
        assert!(params.as_refs().is_err());
        params.set(2, Param::new(1i64));
        assert_eq!(params.as_refs().unwrap().len(), 2);
    }
}
