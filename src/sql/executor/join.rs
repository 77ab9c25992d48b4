use std::collections::HashMap;

use tracing::warn;

use crate::{
    error::{Error, Result},
    sql::{
        catalog::TableProvider,
        executor::{Context, Field, KeyValue, ResultSet},
        parser::ast::{ColumnRef, JoinType, TableRef},
        schema::Table,
        types::{Row, Value},
    },
};

use super::Executor;

/// Hash Join executor - equality join of the running result with a catalog
/// table on a single key pair.
///
/// The joined table is hashed on its key column, then the running result is
/// looked up row by row, so output rows keep the left row order and, within one
/// left row, the right table order. NULL keys never match.
pub struct HashJoin<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    table: TableRef,
    join_type: JoinType,
    left: ColumnRef,
    right: ColumnRef,
}

impl<T: TableProvider> HashJoin<T> {
    pub fn new(
        source: Box<dyn Executor<T>>,
        table: TableRef,
        join_type: JoinType,
        left: ColumnRef,
        right: ColumnRef,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table,
            join_type,
            left,
            right,
        })
    }
}

impl<T: TableProvider> Executor<T> for HashJoin<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let HashJoin {
            source,
            table,
            join_type,
            left,
            right,
        } = *self;
        let lhs = source.execute(ctx)?;
        let rhs = ctx.provider.must_get_table(&table.name)?;
        let binding = table.binding().to_string();

        let (lkey, rkey) = key_columns(&table, left, right, &lhs, &rhs);
        let lpos = lhs.resolve(&lkey).map_err(|err| match err {
            Error::UnknownColumn(col) => Error::JoinKeyNotFound(col),
            err => err,
        })?;
        let rpos = match &rkey.table {
            Some(table) if *table != binding => None,
            _ => rhs.get_col_index(&rkey.name),
        }
        .ok_or_else(|| Error::JoinKeyNotFound(rkey.to_string()))?;

        // Numeric keys only when both sides are numeric, otherwise compare
        // the textual forms.
        let textual = !(lhs.columns[lpos].datatype.is_numeric() && rhs.columns[rpos].datatype.is_numeric());

        let mut buckets: HashMap<KeyValue, Vec<usize>> = HashMap::new();
        for (i, row) in rhs.rows.iter().enumerate() {
            if row[rpos].is_null() {
                continue;
            }
            buckets.entry(KeyValue::new(&row[rpos], textual)).or_default().push(i);
        }

        let mut columns = lhs.columns;
        columns.extend(rhs.columns.iter().map(|c| Field {
            binding: Some(binding.clone()),
            name: c.name.clone(),
            datatype: c.datatype,
        }));

        let cap = ctx.config.max_join_rows;
        let width = rhs.columns.len();
        let mut rows: Vec<Row> = Vec::new();
        let mut capped = false;
        'rows: for lrow in lhs.rows {
            let matches = match &lrow[lpos] {
                Value::Null => None,
                key => buckets.get(&KeyValue::new(key, textual)),
            };
            let outputs: Vec<Row> = match (matches, join_type) {
                (Some(indexes), _) => indexes
                    .iter()
                    .map(|&i| lrow.iter().chain(rhs.rows[i].iter()).cloned().collect())
                    .collect(),
                (None, JoinType::Left) => {
                    let mut row = lrow;
                    row.extend(std::iter::repeat_n(Value::Null, width));
                    vec![row]
                }
                (None, JoinType::Inner) => continue,
            };
            for row in outputs {
                if rows.len() >= cap {
                    capped = true;
                    break 'rows;
                }
                rows.push(row);
            }
        }

        if capped {
            warn!(table = %table.name, cap, "join result capped");
            ctx.notices
                .push(format!("join with {} truncated to {} rows", table.name, cap));
        }
        Ok(ResultSet { columns, rows })
    }
}

/// Splits the ON condition into (running result key, joined table key).
/// Either side of `=` may name the joined table.
fn key_columns(
    table: &TableRef,
    left: ColumnRef,
    right: ColumnRef,
    lhs: &ResultSet,
    rhs: &Table,
) -> (ColumnRef, ColumnRef) {
    let binding = table.binding();
    let names_target = |col: &ColumnRef| match &col.table {
        Some(table) => table == binding,
        None => rhs.get_col_index(&col.name).is_some() && lhs.resolve(col).is_err(),
    };
    if !names_target(&right) && names_target(&left) {
        (right, left)
    } else {
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::EngineConfig,
        error::{ErrorKind, Result},
        sql::{
            catalog::Catalog,
            executor::{Context, ResultSet},
            parser::Parser,
            plan::Plan,
            schema::Table,
            types::Value,
        },
    };

    fn catalog() -> Result<Arc<Catalog>> {
        let orders = Table::new(
            "orders",
            &["id", "status"],
            vec![
                vec![Value::Integer(1), Value::from("success")],
                vec![Value::Integer(2), Value::from("failed")],
                vec![Value::Integer(3), Value::from("success")],
            ],
        )?;
        let payments = Table::new(
            "payments",
            &["order_id", "amount"],
            vec![
                vec![Value::Integer(1), Value::Float(10.0)],
                vec![Value::Integer(3), Value::Float(7.5)],
                vec![Value::Integer(1), Value::Float(2.5)],
                vec![Value::Null, Value::Float(1.0)],
            ],
        )?;
        let refunds = Table::new(
            "refunds",
            &["order_id", "reason"],
            vec![
                vec![Value::from("1"), Value::from("duplicate")],
                vec![Value::from("3"), Value::from("fraud")],
            ],
        )?;
        Ok(Arc::new(Catalog::from_tables(vec![orders, payments, refunds])?))
    }

    fn run_with(sql: &str, config: &EngineConfig) -> Result<(ResultSet, Vec<String>)> {
        let catalog = catalog()?;
        let mut ctx = Context::new(&catalog, config);
        let rs = Plan::build(Parser::new(sql).parse()?)?.execute(&mut ctx)?;
        Ok((rs, ctx.notices))
    }

    fn run(sql: &str) -> Result<ResultSet> {
        Ok(run_with(sql, &EngineConfig::default())?.0)
    }

    #[test]
    fn test_inner_join_counts_matching_pairs() -> Result<()> {
        let rs = run("SELECT * FROM orders o INNER JOIN payments p ON o.id = p.order_id")?;
        assert_eq!(rs.column_names(), vec!["id", "status", "order_id", "amount"]);
        // order 1 has two payments, order 3 one, order 2 none
        assert_eq!(
            rs.rows,
            vec![
                vec![Value::Integer(1), Value::from("success"), Value::Integer(1), Value::Float(10.0)],
                vec![Value::Integer(1), Value::from("success"), Value::Integer(1), Value::Float(2.5)],
                vec![Value::Integer(3), Value::from("success"), Value::Integer(3), Value::Float(7.5)],
            ]
        );

        // the key pair may be written either way round
        let swapped = run("SELECT * FROM orders o JOIN payments p ON p.order_id = o.id")?;
        assert_eq!(swapped.rows, rs.rows);
        Ok(())
    }

    #[test]
    fn test_left_join_keeps_every_left_row() -> Result<()> {
        let rs = run("SELECT o.id, p.amount FROM orders o LEFT JOIN payments p ON o.id = p.order_id")?;
        assert_eq!(
            rs.rows,
            vec![
                vec![Value::Integer(1), Value::Float(10.0)],
                vec![Value::Integer(1), Value::Float(2.5)],
                vec![Value::Integer(2), Value::Null],
                vec![Value::Integer(3), Value::Float(7.5)],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_join_textual_keys() -> Result<()> {
        // integer ids meet their text form
        let rs = run("SELECT id, reason FROM orders o JOIN refunds r ON o.id = r.order_id")?;
        assert_eq!(
            rs.rows,
            vec![
                vec![Value::Integer(1), Value::from("duplicate")],
                vec![Value::Integer(3), Value::from("fraud")],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_join_chaining_and_ambiguity() -> Result<()> {
        let rs = run(
            "SELECT o.id, p.amount, r.reason FROM orders o \
             JOIN payments p ON o.id = p.order_id \
             LEFT JOIN refunds r ON p.order_id = r.order_id",
        )?;
        assert_eq!(rs.rows.len(), 3);
        assert_eq!(rs.rows[1], vec![Value::Integer(1), Value::Float(2.5), Value::from("duplicate")]);

        let err = run("SELECT order_id FROM orders o JOIN payments p ON o.id = p.order_id JOIN refunds r ON o.id = r.order_id")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousColumn);
        Ok(())
    }

    #[test]
    fn test_join_key_not_found() -> Result<()> {
        let err = run("SELECT * FROM orders o JOIN payments p ON o.missing = p.order_id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JoinKeyNotFound);
        let err = run("SELECT * FROM orders o JOIN payments p ON o.id = p.missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JoinKeyNotFound);
        let err = run("SELECT * FROM orders o JOIN nowhere n ON o.id = n.id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTable);
        Ok(())
    }

    #[test]
    fn test_join_intermediate_cap() -> Result<()> {
        let config = EngineConfig::builder().max_result_rows(1).max_join_rows(2).build()?;
        let (rs, notices) = run_with("SELECT * FROM orders o JOIN payments p ON o.id = p.order_id", &config)?;
        assert_eq!(rs.rows.len(), 2);
        assert_eq!(notices, vec!["join with payments truncated to 2 rows".to_string()]);
        Ok(())
    }
}
