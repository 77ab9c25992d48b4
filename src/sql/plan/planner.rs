use tracing::debug;

use crate::{
    error::Result,
    sql::{
        parser::ast::{self, ColumnRef, Projection, SelectItem},
        plan::{Node, Plan},
    },
};

/// Query planner - converts a statement into a chain of plan nodes.
///
/// The chain is fixed: scan, joins in written order, filter, aggregate,
/// order, projection, limit. Joins run before the filter so WHERE can see
/// joined columns, and ordering runs before projection so ORDER BY can use
/// columns that are not selected.
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self {}
    }

    /// Builds an execution plan from a statement
    pub fn build(&mut self, stmt: ast::Statement) -> Result<Plan> {
        let node = self.build_statement(stmt)?;
        debug!(plan = ?node, "built query plan");
        Ok(Plan(node))
    }

    fn build_statement(&self, stmt: ast::Statement) -> Result<Node> {
        let ast::Statement {
            from,
            joins,
            projection,
            predicate,
            group_by,
            order_by,
            limit,
        } = stmt;

        let mut node = Node::Scan { table: from };

        for join in joins {
            node = Node::Join {
                source: Box::new(node),
                table: join.table,
                join_type: join.join_type,
                left: join.left,
                right: join.right,
            };
        }

        if let Some(predicate) = predicate {
            node = Node::Filter {
                source: Box::new(node),
                predicate,
            };
        }

        let items = match projection {
            Projection::Wildcard => None,
            Projection::Items(items) => Some(items),
        };

        let aggregates = items
            .iter()
            .flatten()
            .filter_map(|item| match item {
                SelectItem::Aggregate(call, alias) => Some((call.clone(), alias.clone())),
                SelectItem::Column(..) => None,
            })
            .collect::<Vec<_>>();
        if !group_by.is_empty() || !aggregates.is_empty() {
            node = Node::Aggregate {
                source: Box::new(node),
                group_by,
                aggregates,
            };
        }

        if let Some((column, direction)) = order_by {
            node = Node::Order {
                source: Box::new(node),
                column: self.resolve_output_alias(column, items.as_deref()),
                direction,
            };
        }

        if let Some(items) = items {
            node = Node::Projection {
                source: Box::new(node),
                columns: items
                    .into_iter()
                    .map(|item| match item {
                        SelectItem::Column(col, alias) => (col, alias),
                        // the aggregate node already emits the output name
                        SelectItem::Aggregate(call, alias) => {
                            (ColumnRef::bare(alias.unwrap_or_else(|| call.output_name())), None)
                        }
                    })
                    .collect(),
            };
        }

        if let Some(limit) = limit {
            node = Node::Limit {
                source: Box::new(node),
                limit,
            };
        }

        Ok(node)
    }

    /// ORDER BY may name a column by its output alias; map it back to the
    /// underlying column since ordering runs before projection.
    fn resolve_output_alias(&self, column: ColumnRef, items: Option<&[SelectItem]>) -> ColumnRef {
        if column.table.is_some() {
            return column;
        }
        items
            .into_iter()
            .flatten()
            .find_map(|item| match item {
                SelectItem::Column(col, Some(alias)) if *alias == column.name => Some(col.clone()),
                _ => None,
            })
            .unwrap_or(column)
    }
}
