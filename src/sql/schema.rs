use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::types::{DataType, Row, Value},
};

/// A named, typed, immutable relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub description: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Column schema definition, inferred when the table is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
    pub description: Option<String>,
}

impl Table {
    /// Builds a table from positional rows, inferring each column's type.
    ///
    /// Cells are coerced to their column's type: integers in a float column
    /// become floats, and numbers in a column that also holds text become text.
    pub fn new(name: impl Into<String>, columns: &[&str], rows: Vec<Row>) -> Result<Self> {
        let name = name.into();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::Internal(format!(
                    "table {} row {} has {} values, expected {}",
                    name,
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }

        let mut table = Table {
            name,
            description: None,
            columns: columns
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    datatype: DataType::Null,
                    nullable: false,
                    description: None,
                })
                .collect(),
            rows,
        };
        table.infer_types();
        Ok(table)
    }

    /// Builds a table from uniformly keyed records. The first record fixes the
    /// column order; every other record must carry the same keys.
    pub fn from_records<K: Into<String>>(
        name: impl Into<String>,
        records: Vec<Vec<(K, Value)>>,
    ) -> Result<Self> {
        let name = name.into();
        let records = records
            .into_iter()
            .map(|r| r.into_iter().map(|(k, v)| (k.into(), v)).collect::<Vec<(String, Value)>>())
            .collect::<Vec<_>>();

        let columns = match records.first() {
            Some(first) => first.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>(),
            None => {
                return Err(Error::Internal(format!(
                    "table {} has no records to infer columns from",
                    name
                )))
            }
        };

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            if record.len() != columns.len() {
                return Err(Error::Internal(format!(
                    "table {} record {} has mismatched keys",
                    name, i
                )));
            }
            let mut row = vec![Value::Null; columns.len()];
            for (key, value) in record {
                match columns.iter().position(|c| *c == key) {
                    Some(pos) => row[pos] = value,
                    None => {
                        return Err(Error::Internal(format!(
                            "table {} record {} has unexpected key {}",
                            name, i, key
                        )))
                    }
                }
            }
            rows.push(row);
        }

        let columns = columns.iter().map(String::as_str).collect::<Vec<_>>();
        Self::new(name, &columns, rows)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a description to a column, ignoring unknown names
    pub fn describe_column(mut self, column: &str, description: impl Into<String>) -> Self {
        if let Some(pos) = self.get_col_index(column) {
            self.columns[pos].description = Some(description.into());
        }
        self
    }

    /// Returns the column index for a given column name (case-insensitive)
    pub fn get_col_index(&self, col_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(col_name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn infer_types(&mut self) {
        for (pos, column) in self.columns.iter_mut().enumerate() {
            let mut datatype = DataType::Null;
            let mut nullable = false;
            for row in self.rows.iter() {
                datatype = match (datatype, row[pos].datatype()) {
                    (dt, None) => {
                        nullable = true;
                        dt
                    }
                    (DataType::Null, Some(dt)) => dt,
                    (DataType::String, _) | (_, Some(DataType::String)) => DataType::String,
                    (DataType::Float, _) | (_, Some(DataType::Float)) => DataType::Float,
                    (dt, Some(_)) => dt,
                };
            }
            column.datatype = datatype;
            column.nullable = nullable;

            for row in self.rows.iter_mut() {
                let cell = &mut row[pos];
                // numbers in text columns keep their own type
                if let (DataType::Float, Value::Integer(i)) = (datatype, &*cell) {
                    *cell = Value::Float(*i as f64);
                }
            }
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::String => "STRING",
            DataType::Null => "NULL",
        })
    }
}

/// Renders the schema listing: one line per column with type and description
impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} rows)", self.name, self.rows.len())?;
        if let Some(desc) = &self.description {
            write!(f, " - {}", desc)?;
        }
        for column in &self.columns {
            write!(f, "\n  {} {}", column.name, column.datatype)?;
            if column.nullable {
                write!(f, " NULL")?;
            }
            if let Some(desc) = &column.description {
                write!(f, " - {}", desc)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::{
        error::Result,
        sql::types::{DataType, Value},
    };

    #[test]
    fn test_table_type_inference() -> Result<()> {
        let table = Table::new(
            "t",
            &["a", "b", "c", "d"],
            vec![
                vec![Value::Integer(1), Value::Integer(2), Value::from("x"), Value::Null],
                vec![Value::Integer(3), Value::Float(2.5), Value::Integer(7), Value::Null],
                vec![Value::Null, Value::Integer(4), Value::from("y"), Value::Null],
            ],
        )?;

        let types = table.columns.iter().map(|c| c.datatype).collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![DataType::Integer, DataType::Float, DataType::String, DataType::Null]
        );
        assert!(table.columns[0].nullable);
        assert!(!table.columns[1].nullable);
        // integers widen in float columns, numbers stay numbers in text columns
        assert_eq!(table.rows[0][1], Value::Float(2.0));
        assert_eq!(table.rows[1][2], Value::Integer(7));
        Ok(())
    }

    #[test]
    fn test_table_from_records() -> Result<()> {
        let table = Table::from_records(
            "orders",
            vec![
                vec![("id", Value::Integer(1)), ("status", Value::from("success"))],
                vec![("status", Value::from("failed")), ("id", Value::Integer(2))],
            ],
        )?;
        assert_eq!(table.column_names(), vec!["id", "status"]);
        assert_eq!(table.rows[1], vec![Value::Integer(2), Value::from("failed")]);
        assert_eq!(table.get_col_index("STATUS"), Some(1));

        let bad = Table::from_records(
            "orders",
            vec![
                vec![("id", Value::Integer(1))],
                vec![("code", Value::Integer(2))],
            ],
        );
        assert!(bad.is_err());
        Ok(())
    }
}
