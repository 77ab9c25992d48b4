use crate::{
    error::Result,
    sql::{
        catalog::TableProvider,
        executor::{Context, Field, ResultSet, predicate},
        parser::ast::{ColumnRef, OrderDirection, Predicate, TableRef},
    },
};

use super::Executor;

/// Table scan executor. Copies the catalog table into a working table whose
/// columns are bound to the table's alias.
pub struct Scan {
    table: TableRef,
}

impl Scan {
    pub fn new(table: TableRef) -> Box<Self> {
        Box::new(Self { table })
    }
}

impl<T: TableProvider> Executor<T> for Scan {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let table = ctx.provider.must_get_table(&self.table.name)?;
        let binding = self.table.binding().to_string();
        Ok(ResultSet {
            columns: table
                .columns
                .iter()
                .map(|c| Field {
                    binding: Some(binding.clone()),
                    name: c.name.clone(),
                    datatype: c.datatype,
                })
                .collect(),
            rows: table.rows.clone(),
        })
    }
}

/// WHERE executor - keeps matching rows in input order
pub struct Filter<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    predicate: Predicate,
}

impl<T: TableProvider> Filter<T> {
    pub fn new(source: Box<dyn Executor<T>>, predicate: Predicate) -> Box<Self> {
        Box::new(Self { source, predicate })
    }
}

impl<T: TableProvider> Executor<T> for Filter<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let ResultSet { columns, rows } = self.source.execute(ctx)?;
        let rs = ResultSet { columns, rows: Vec::new() };
        let compiled = predicate::compile(&self.predicate, &rs)?;
        Ok(ResultSet {
            rows: rows.into_iter().filter(|row| compiled.evaluate(row)).collect(),
            ..rs
        })
    }
}

/// ORDER BY executor - stable sort on a single column
pub struct Order<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    column: ColumnRef,
    direction: OrderDirection,
}

impl<T: TableProvider> Order<T> {
    pub fn new(source: Box<dyn Executor<T>>, column: ColumnRef, direction: OrderDirection) -> Box<Self> {
        Box::new(Self {
            source,
            column,
            direction,
        })
    }
}

impl<T: TableProvider> Executor<T> for Order<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let mut rs = self.source.execute(ctx)?;
        let pos = rs.resolve(&self.column)?;

        // Numbers and numeric text by value, other text lexicographically.
        // Equal keys keep their order.
        rs.rows.sort_by(|a, b| {
            let ordering = a[pos].sort_cmp(&b[pos]);
            match self.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
        Ok(rs)
    }
}

/// Projection executor - selects columns in the requested order
pub struct Projection<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    columns: Vec<(ColumnRef, Option<String>)>,
}

impl<T: TableProvider> Projection<T> {
    pub fn new(source: Box<dyn Executor<T>>, columns: Vec<(ColumnRef, Option<String>)>) -> Box<Self> {
        Box::new(Self { source, columns })
    }
}

impl<T: TableProvider> Executor<T> for Projection<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let rs = self.source.execute(ctx)?;

        let mut positions = Vec::with_capacity(self.columns.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        for (col, alias) in &self.columns {
            let pos = rs.resolve(col)?;
            let mut field = rs.columns[pos].clone();
            if let Some(alias) = alias {
                field.name = alias.clone();
                field.binding = None;
            }
            positions.push(pos);
            columns.push(field);
        }

        let rows = rs
            .rows
            .into_iter()
            .map(|row| positions.iter().map(|&pos| row[pos].clone()).collect())
            .collect();
        Ok(ResultSet { columns, rows })
    }
}

/// LIMIT executor - keeps the first N rows
pub struct Limit<T: TableProvider> {
    source: Box<dyn Executor<T>>,
    limit: usize,
}

impl<T: TableProvider> Limit<T> {
    pub fn new(source: Box<dyn Executor<T>>, limit: usize) -> Box<Self> {
        Box::new(Self { source, limit })
    }
}

impl<T: TableProvider> Executor<T> for Limit<T> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        let mut rs = self.source.execute(ctx)?;
        rs.rows.truncate(self.limit);
        Ok(rs)
    }
}
