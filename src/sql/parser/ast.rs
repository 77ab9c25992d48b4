use std::fmt::Display;

/// Parsed SELECT statement. Only reads are representable.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub projection: Projection,
    pub predicate: Option<Predicate>,
    /// GROUP BY columns (empty means no grouping)
    pub group_by: Vec<ColumnRef>,
    pub order_by: Option<(ColumnRef, OrderDirection)>,
    pub limit: Option<usize>,
}

impl Statement {
    /// Table references in scope, base table first then joins in order
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        std::iter::once(&self.from).chain(self.joins.iter().map(|j| &j.table))
    }
}

/// Table reference in FROM or JOIN, with an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Name that qualified column references bind to
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `{INNER|LEFT} JOIN table ON left = right`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
}

/// Sort direction (ascending or descending)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Column reference after alias normalization.
///
/// `name` is always the bare column name. `table` holds the binding
/// (alias or table name) the reference was qualified with, if any, so that
/// later stages can tell apart equally named columns of joined tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Wildcard,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// Column with an optional output alias
    Column(ColumnRef, Option<String>),
    /// Aggregate call with an optional output alias
    Aggregate(AggregateCall, Option<String>),
}

/// Aggregate function applied to a column, or to every row for `COUNT(*)`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub func: AggregateFunc,
    /// None stands for `*`
    pub column: Option<ColumnRef>,
}

impl AggregateCall {
    /// Default output column name, e.g. `sum(amount)`
    pub fn output_name(&self) -> String {
        match &self.column {
            Some(col) => format!("{}({})", self.func, col.name),
            None => format!("{}(*)", self.func),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "count" => Self::Count,
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }
}

impl Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        })
    }
}

/// Boolean condition tree for WHERE
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: ColumnRef,
        op: Operator,
        operand: Operand,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    /// Literal set for IN / NOT IN
    List(Vec<Literal>),
    Column(ColumnRef),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    In,
    NotIn,
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        })
    }
}

/// Constant values in queries
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
}
