use crate::{
    config::EngineConfig,
    error::{Error, Result},
    sql::{
        catalog::TableProvider,
        executor::{
            agg::Aggregate,
            join::HashJoin,
            query::{Filter, Limit, Order, Projection, Scan},
        },
        parser::ast::ColumnRef,
        plan::Node,
        types::{DataType, Row, Value},
    },
};

mod agg;
mod join;
pub mod predicate;
mod query;

/// Query operator. Each executor consumes its source and returns a fresh
/// working table; catalog tables are only ever read.
pub trait Executor<T: TableProvider> {
    fn execute(self: Box<Self>, ctx: &mut Context<'_, T>) -> Result<ResultSet>;
}

/// Builds an executor from a plan node
impl<T: TableProvider + 'static> dyn Executor<T> {
    pub fn build(node: Node) -> Box<dyn Executor<T>> {
        match node {
            Node::Scan { table } => Scan::new(table),
            Node::Join {
                source,
                table,
                join_type,
                left,
                right,
            } => HashJoin::new(Self::build(*source), table, join_type, left, right),
            Node::Filter { source, predicate } => Filter::new(Self::build(*source), predicate),
            Node::Aggregate {
                source,
                group_by,
                aggregates,
            } => Aggregate::new(Self::build(*source), group_by, aggregates),
            Node::Order {
                source,
                column,
                direction,
            } => Order::new(Self::build(*source), column, direction),
            Node::Projection { source, columns } => Projection::new(Self::build(*source), columns),
            Node::Limit { source, limit } => Limit::new(Self::build(*source), limit),
        }
    }
}

/// Per-query execution state
pub struct Context<'a, T: TableProvider> {
    pub provider: &'a T,
    pub config: &'a EngineConfig,
    /// Informational notices gathered while executing, e.g. truncation
    pub notices: Vec<String>,
}

impl<'a, T: TableProvider> Context<'a, T> {
    pub fn new(provider: &'a T, config: &'a EngineConfig) -> Self {
        Self {
            provider,
            config,
            notices: Vec::new(),
        }
    }
}

/// Column of a working table
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Alias or table name the column came from; None for computed columns
    pub binding: Option<String>,
    pub name: String,
    pub datatype: DataType,
}

/// Working table passed between executors
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<Field>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Resolves a column reference to its position.
    ///
    /// A qualified reference must match both binding and name. A bare name
    /// must match exactly one column, otherwise it is ambiguous.
    pub fn resolve(&self, col: &ColumnRef) -> Result<usize> {
        let mut candidates = self.columns.iter().enumerate().filter(|(_, f)| {
            f.name.eq_ignore_ascii_case(&col.name)
                && match &col.table {
                    Some(table) => f.binding.as_deref() == Some(table.as_str()),
                    None => true,
                }
        });
        match (candidates.next(), candidates.next()) {
            (Some((pos, _)), None) => Ok(pos),
            (Some(_), Some(_)) => Err(Error::AmbiguousColumn(col.to_string())),
            (None, _) => Err(Error::UnknownColumn(col.to_string())),
        }
    }

    /// Output column names; names shared by several columns are qualified
    /// with their binding.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|f| {
                let shared = self
                    .columns
                    .iter()
                    .filter(|other| other.name.eq_ignore_ascii_case(&f.name))
                    .count()
                    > 1;
                match (&f.binding, shared) {
                    (Some(binding), true) => format!("{}.{}", binding, f.name),
                    _ => f.name.clone(),
                }
            })
            .collect()
    }
}

/// Hashable form of a value, used for join keys and group keys.
///
/// Numbers hash by their f64 bits so that 1 and 1.0 meet; in textual mode
/// every value is keyed by its display form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Null,
    Number(u64),
    Text(String),
}

impl KeyValue {
    pub fn new(value: &Value, textual: bool) -> Self {
        match (value, value.as_f64()) {
            (Value::Null, _) => KeyValue::Null,
            (_, Some(n)) if !textual => {
                // -0.0 and 0.0 are the same key
                let n = if n == 0.0 { 0.0 } else { n };
                KeyValue::Number(n.to_bits())
            }
            (v, _) => KeyValue::Text(v.to_string()),
        }
    }
}
