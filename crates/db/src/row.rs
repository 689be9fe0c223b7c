use serde_json::{Number, Value};

use crate::error::DbError;

/// One result row: column names mapped to values, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of the named column, if the row has it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Remove and return the named column's value.
    pub fn take(&mut self, column: &str) -> Option<Value> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Decode a driver row column by column.
    pub fn from_postgres(row: &tokio_postgres::Row) -> Result<Self, DbError> {
        let mut columns = Vec::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            columns.push((column.name().to_string(), extract_value(row, idx)?));
        }
        Ok(Self { columns })
    }
}

fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<Value, DbError> {
    let column = &row.columns()[idx];
    let value = match column.type_().name() {
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(Value::from),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(Value::from),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(Value::from),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number),
        "float8" => row
            .try_get::<_, Option<f64>>(idx)?
            .and_then(Number::from_f64)
            .map(Value::Number),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx)?,
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        other => {
            return Err(DbError::Decode {
                column: column.name().to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_by_column_name() {
        let row = Row::new(vec![
            ("bookid".to_string(), json!(1)),
            ("title".to_string(), json!("Dune")),
        ]);
        assert_eq!(row.get("title"), Some(&json!("Dune")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get("bookid"), Some(&json!(1)));
    }

    #[test]
    fn take_removes_column() {
        let mut row = Row::new(vec![("json".to_string(), json!([1, 2]))]);
        assert_eq!(row.take("json"), Some(json!([1, 2])));
        assert!(row.is_empty());
        assert_eq!(row.take("json"), None);
    }
}
