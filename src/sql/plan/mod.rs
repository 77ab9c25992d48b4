use crate::{
    error::Result,
    sql::{
        catalog::TableProvider,
        executor::{Context, Executor, ResultSet},
        parser::ast::{AggregateCall, ColumnRef, JoinType, OrderDirection, Predicate, Statement, TableRef},
    },
};

mod planner;

pub use planner::Planner;

/// Execution plan node. Nodes nest through `source`, innermost first.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Reads a catalog table
    Scan { table: TableRef },
    /// Equality join of the running result with a catalog table
    Join {
        source: Box<Node>,
        table: TableRef,
        join_type: JoinType,
        left: ColumnRef,
        right: ColumnRef,
    },
    Filter {
        source: Box<Node>,
        predicate: Predicate,
    },
    /// GROUP BY buckets; empty `aggregates` sums the remaining numeric columns
    Aggregate {
        source: Box<Node>,
        group_by: Vec<ColumnRef>,
        aggregates: Vec<(AggregateCall, Option<String>)>,
    },
    Order {
        source: Box<Node>,
        column: ColumnRef,
        direction: OrderDirection,
    },
    /// Selected columns with their output names
    Projection {
        source: Box<Node>,
        columns: Vec<(ColumnRef, Option<String>)>,
    },
    Limit {
        source: Box<Node>,
        limit: usize,
    },
}

/// Execution plan
#[derive(Debug, PartialEq)]
pub struct Plan(pub Node);

impl Plan {
    /// Builds a plan from a parsed statement
    pub fn build(stmt: Statement) -> Result<Self> {
        Planner::new().build(stmt)
    }

    /// Runs the plan against the context's table provider
    pub fn execute<T: TableProvider + 'static>(self, ctx: &mut Context<'_, T>) -> Result<ResultSet> {
        <dyn Executor<T>>::build(self.0).execute(ctx)
    }
}
