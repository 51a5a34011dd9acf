//! Raw result rows.

use crate::error::{OrmError, OrmResult};
use crate::value::{SqlValue, Value};

/// One result row as returned by an [`Executor`](crate::Executor).
///
/// Cells are addressed by their 1-based ordinal, the way SQL numbers
/// select-list columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    values: Vec<Value>,
}

impl RawRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Borrow the cell at a 1-based ordinal.
    pub fn value(&self, ordinal: usize) -> OrmResult<&Value> {
        ordinal
            .checked_sub(1)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| {
                OrmError::data_access(format!(
                    "column ordinal {} out of range (row has {} columns)",
                    ordinal,
                    self.values.len()
                ))
            })
    }

    /// Read and convert the cell at a 1-based ordinal.
    pub fn get<V: SqlValue>(&self, ordinal: usize) -> OrmResult<V> {
        let value = self.value(ordinal)?.clone();
        V::from_value(value).map_err(|message| OrmError::decode(format!("#{ordinal}"), message))
    }
}

impl From<Vec<Value>> for RawRow {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for RawRow {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_one_based() {
        let row = RawRow::new(vec![Value::BigInt(1), Value::Text("a".into())]);
        assert_eq!(row.get::<i64>(1).unwrap(), 1);
        assert_eq!(row.get::<String>(2).unwrap(), "a");
    }

    #[test]
    fn out_of_range_is_data_access() {
        let row = RawRow::new(vec![Value::Null]);
        assert!(row.get::<Option<i32>>(0).unwrap_err().is_data_access());
        assert!(row.get::<Option<i32>>(2).unwrap_err().is_data_access());
    }

    #[test]
    fn type_mismatch_is_decode() {
        let row = RawRow::new(vec![Value::Text("x".into())]);
        let err = row.get::<i64>(1).unwrap_err();
        assert!(matches!(err, OrmError::Decode { .. }));
    }
}
