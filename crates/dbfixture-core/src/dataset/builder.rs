use dbfixture_store::TableId;
use serde_json::Value;

use super::{ColumnPredicate, Dataset, Row};
use crate::error::{FixtureError, FixtureResult};

/// Fluent row-by-row construction of a [`Dataset`].
///
/// ```ignore
/// let expected = expected_dataset()
///     .row_for("simple_table")
///     .col("id", equal_to(3))
///     .col("description", equal_to("description"))
///     .build()?;
/// ```
///
/// Misuse is reported by [`DatasetBuilder::build`], not at the call that
/// caused it.
#[derive(Debug)]
pub struct DatasetBuilder<C> {
    dataset: Dataset<C>,
    current: Option<Row<C>>,
    error: Option<FixtureError>,
}

impl<C> Default for DatasetBuilder<C> {
    fn default() -> Self {
        Self {
            dataset: Dataset::new(),
            current: None,
            error: None,
        }
    }
}

impl<C> DatasetBuilder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the open row, if any, and open a new one for `table`
    /// (`name` or `owner.name`).
    pub fn row_for(mut self, table: &str) -> Self {
        self.close_row();
        match TableId::parse(table) {
            Ok(id) => self.current = Some(Row::new(id)),
            Err(err) => self.fail(err.to_string()),
        }
        self
    }

    pub fn col(mut self, name: &str, value: impl Into<C>) -> Self {
        if name.trim().is_empty() {
            self.fail("column name must not be empty");
            return self;
        }
        match self.current.as_mut() {
            Some(row) => row.insert(name, value.into()),
            None => self.fail(format!("column '{name}' added before any row_for()")),
        }
        self
    }

    pub fn build(mut self) -> FixtureResult<Dataset<C>> {
        self.close_row();
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.dataset),
        }
    }

    fn close_row(&mut self) {
        if let Some(row) = self.current.take() {
            self.dataset.push(row);
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(FixtureError::InvalidDataset(message.into()));
        }
    }
}

/// Builder for expectations.
pub fn expected_dataset() -> DatasetBuilder<ColumnPredicate> {
    DatasetBuilder::new()
}

/// Builder for rows to insert.
pub fn seed_dataset() -> DatasetBuilder<Value> {
    DatasetBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::predicate::{any_value, equal_to};
    use serde_json::json;

    #[test]
    fn builds_rows_in_order() {
        let ds = seed_dataset()
            .row_for("orders")
            .col("id", 1)
            .row_for("order_items")
            .col("order_id", 1)
            .row_for("orders")
            .col("id", 2)
            .build()
            .unwrap();

        assert_eq!(ds.rows_for("orders").len(), 2);
        assert_eq!(ds.rows_for("orders")[1].get("ID"), Some(&json!(2)));
        assert_eq!(ds.rows_for("order_items").len(), 1);
    }

    #[test]
    fn row_without_columns_is_kept_as_empty() {
        let ds = seed_dataset().row_for("audit_log").build().unwrap();
        assert_eq!(ds.row_count(), 1);
        assert!(ds.rows_for("audit_log")[0].is_empty());
    }

    #[test]
    fn expected_values_convert_to_equality() {
        let ds = expected_dataset()
            .row_for("t")
            .col("id", json!(3))
            .col("any", any_value())
            .col("eq", equal_to("x"))
            .build()
            .unwrap();
        let row = &ds.rows_for("t")[0];
        assert_eq!(row.get("id").unwrap().description(), "3");
        assert_eq!(row.get("any").unwrap().description(), "ANYTHING");
    }

    #[test]
    fn column_before_row_is_rejected() {
        let err = seed_dataset().col("id", 1).build().unwrap_err();
        assert!(matches!(err, FixtureError::InvalidDataset(_)));
    }

    #[test]
    fn empty_column_name_is_rejected() {
        let err = seed_dataset().row_for("t").col(" ", 1).build().unwrap_err();
        assert!(matches!(err, FixtureError::InvalidDataset(_)));
    }

    #[test]
    fn malformed_table_name_is_rejected() {
        let err = seed_dataset().row_for("a.b.c").build().unwrap_err();
        assert!(matches!(err, FixtureError::InvalidDataset(_)));
    }
}
