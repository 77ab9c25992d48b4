//! Query façade.
//!
//! [`QueryEngine`] is the single entry point: it parses a query, checks the
//! referenced tables against the catalog, runs the plan and caps the result.
//! [`QueryEngine::execute`] never fails; every error is turned into a
//! [`QueryOutcome`] carrying the diagnostic text and its [`ErrorKind`].
//!
//! A panic during evaluation is caught and reported as
//! `InternalEvaluationError`, but the process panic hook still runs first.
//! The default hook prints to stderr; embedders that want it silent call
//! [`install_panic_hook`], which routes panic reports to `tracing` instead.

use std::{
    collections::VecDeque,
    fmt::Display,
    panic::{self, AssertUnwindSafe},
};

use comfy_table::{Cell, ContentArrangement, Table};
use tracing::{debug, error, info, warn};

use crate::{
    config::EngineConfig,
    error::{Error, ErrorKind, Result},
    sql::{
        catalog::TableProvider,
        executor::Context,
        parser::Parser,
        plan::Plan,
        types::Row,
    },
};

/// Replaces the process panic hook with one that logs through `tracing`.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        error!(panic = %info, "panic during query evaluation");
    }));
}

/// Lifecycle of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Received,
    Parsed,
    Validated,
    Executed,
    Succeeded,
    Failed,
}

/// Output table of one query
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for ResultTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table
            .set_content_arrangement(ContentArrangement::Dynamic)
            .load_preset(comfy_table::presets::UTF8_FULL)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

        if !self.columns.is_empty() {
            table.set_header(self.columns.iter().map(Cell::new));
        }
        for row in &self.rows {
            table.add_row(row.iter().map(|v| Cell::new(v.to_string())));
        }
        write!(f, "{}", table)
    }
}

/// Successful query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub table: ResultTable,
    /// Informational message: row count or notices such as truncation
    pub message: String,
    /// Whether the result was cut at `max_result_rows`
    pub truncated: bool,
}

/// Outcome of a query as handed to callers: a table and message, or no table
/// and a diagnostic with its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub table: Option<ResultTable>,
    pub message: String,
    pub error: Option<ErrorKind>,
    pub state: QueryState,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.state == QueryState::Succeeded
    }
}

/// Read-only SQL engine over a table provider.
///
/// The provider is never mutated, so an engine over an `Arc<Catalog>` can be
/// cloned or shared between threads freely.
#[derive(Debug, Clone)]
pub struct QueryEngine<T: TableProvider> {
    provider: T,
    config: EngineConfig,
}

impl<T: TableProvider + 'static> QueryEngine<T> {
    pub fn new(provider: T) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    pub fn with_config(provider: T, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &T {
        &self.provider
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a session that keeps a query history
    pub fn session(self) -> Session<T> {
        Session::new(self)
    }

    /// Runs a query and returns its result or the first error
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let mut state = QueryState::Received;
        self.run(sql, &mut state)
    }

    /// Runs a query and converts any failure into a diagnostic outcome
    pub fn execute(&self, sql: &str) -> QueryOutcome {
        let mut state = QueryState::Received;
        match self.run(sql, &mut state) {
            Ok(result) => {
                info!(rows = result.table.len(), truncated = result.truncated, "query succeeded");
                QueryOutcome {
                    table: Some(result.table),
                    message: result.message,
                    error: None,
                    state: QueryState::Succeeded,
                }
            }
            Err(err) => {
                warn!(reached = ?state, kind = %err.kind(), error = %err, "query failed");
                QueryOutcome {
                    table: None,
                    message: err.to_string(),
                    error: Some(err.kind()),
                    state: QueryState::Failed,
                }
            }
        }
    }

    /// Drives one query through its states. `state` is left at the last
    /// state reached, so failures can be attributed to a stage.
    fn run(&self, sql: &str, state: &mut QueryState) -> Result<QueryResult> {
        debug!(sql, "query received");
        let stmt = Parser::new(sql).parse()?;
        *state = QueryState::Parsed;

        for table in stmt.tables() {
            self.provider.must_get_table(&table.name)?;
        }
        *state = QueryState::Validated;
        debug!(tables = stmt.tables().count(), "query validated");

        let plan = Plan::build(stmt)?;
        let mut ctx = Context::new(&self.provider, &self.config);
        let rs = panic::catch_unwind(AssertUnwindSafe(|| plan.execute(&mut ctx)))
            .map_err(|payload| {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "query evaluation panicked".into());
                Error::Internal(msg)
            })??;
        *state = QueryState::Executed;

        let columns = rs.column_names();
        let mut rows = rs.rows;
        let mut notices = ctx.notices;
        let cap = self.config.max_result_rows;
        let truncated = rows.len() > cap;
        if truncated {
            warn!(rows = rows.len(), cap, "result truncated");
            rows.truncate(cap);
            notices.push(format!("result truncated to {} rows", cap));
        }

        let mut message = match rows.len() {
            1 => "1 row returned".to_string(),
            n => format!("{} rows returned", n),
        };
        if !notices.is_empty() {
            message = format!("{} ({})", message, notices.join("; "));
        }

        Ok(QueryResult {
            table: ResultTable { columns, rows },
            message,
            truncated,
        })
    }
}

/// One executed query as remembered by a [`Session`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub sql: String,
    pub error: Option<ErrorKind>,
    /// Outcome message of the query
    pub summary: String,
}

/// Engine session keeping the most recent queries
pub struct Session<T: TableProvider> {
    engine: QueryEngine<T>,
    history: VecDeque<HistoryEntry>,
}

impl<T: TableProvider + 'static> Session<T> {
    pub fn new(engine: QueryEngine<T>) -> Self {
        Self {
            engine,
            history: VecDeque::new(),
        }
    }

    pub fn engine(&self) -> &QueryEngine<T> {
        &self.engine
    }

    /// Executes a query and records it in the history
    pub fn execute(&mut self, sql: &str) -> QueryOutcome {
        let outcome = self.engine.execute(sql);

        let size = self.engine.config().history_size;
        if size > 0 {
            while self.history.len() >= size {
                self.history.pop_front();
            }
            self.history.push_back(HistoryEntry {
                sql: sql.trim().to_string(),
                error: outcome.error,
                summary: outcome.message.clone(),
            });
        }
        outcome
    }

    /// Recorded queries, oldest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::thread;

    use super::{QueryEngine, QueryState};
    use crate::{
        config::EngineConfig,
        error::{Error, ErrorKind, Result},
        sql::{
            catalog::{Catalog, TableProvider},
            schema::Table,
            types::Value,
        },
    };

    fn catalog() -> Result<Arc<Catalog>> {
        let orders = Table::new(
            "orders",
            &["id", "status", "amount"],
            vec![
                vec![Value::Integer(1), Value::from("success"), Value::Integer(100)],
                vec![Value::Integer(2), Value::from("failed"), Value::Integer(50)],
            ],
        )?;
        let payments = Table::new(
            "payments",
            &["order_id", "paid"],
            vec![vec![Value::Integer(1), Value::Float(100.0)]],
        )?;
        let events = Table::new(
            "events",
            &["seq"],
            (0..1500).map(|i| vec![Value::Integer(i)]).collect(),
        )?;
        Ok(Arc::new(Catalog::from_tables(vec![orders, payments, events])?))
    }

    fn engine() -> Result<QueryEngine<Arc<Catalog>>> {
        Ok(QueryEngine::new(catalog()?))
    }

    #[test]
    fn test_filter_example() -> Result<()> {
        let result = engine()?.query("SELECT id, amount FROM orders WHERE status = 'success'")?;
        assert_eq!(result.table.columns, vec!["id", "amount"]);
        assert_eq!(result.table.rows, vec![vec![Value::Integer(1), Value::Integer(100)]]);
        assert_eq!(result.message, "1 row returned");
        assert!(!result.truncated);
        Ok(())
    }

    #[test]
    fn test_wildcard_equals_base_table() -> Result<()> {
        let catalog = catalog()?;
        let engine = QueryEngine::new(catalog.clone());
        let result = engine.query("select * from ORDERS")?;
        let orders = catalog.get_table("orders").ok_or(Error::UnknownTable("orders".into()))?;
        assert_eq!(result.table.columns, orders.column_names());
        assert_eq!(result.table.rows, orders.rows);
        Ok(())
    }

    #[test]
    fn test_join_example() -> Result<()> {
        let result = engine()?.query("SELECT * FROM orders o INNER JOIN payments p ON o.id = p.order_id")?;
        assert_eq!(result.table.columns, vec!["id", "status", "amount", "order_id", "paid"]);
        assert_eq!(
            result.table.rows,
            vec![vec![
                Value::Integer(1),
                Value::from("success"),
                Value::Integer(100),
                Value::Integer(1),
                Value::Float(100.0),
            ]]
        );
        Ok(())
    }

    #[test]
    fn test_mutations_are_denied() -> Result<()> {
        let engine = engine()?;
        for sql in [
            "DELETE FROM orders WHERE id = 1",
            "UPDATE orders SET status = 'x'",
            "insert into orders values (3)",
            "DROP TABLE orders",
            "SELECT * FROM orders; DROP TABLE orders",
        ] {
            let outcome = engine.execute(sql);
            assert_eq!(outcome.error, Some(ErrorKind::PermissionDenied), "{}", sql);
            assert_eq!(outcome.table, None);
            assert_eq!(outcome.state, QueryState::Failed);
        }
        // the catalog is untouched
        assert_eq!(engine.query("SELECT id FROM orders")?.table.len(), 2);
        Ok(())
    }

    #[test]
    fn test_errors_become_diagnostics() -> Result<()> {
        let engine = engine()?;
        let outcome = engine.execute("SELECT * FROM missing");
        assert_eq!(outcome.error, Some(ErrorKind::UnknownTable));
        assert_eq!(outcome.message, "table missing does not exist");

        let outcome = engine.execute("SELECT nope FROM orders");
        assert_eq!(outcome.error, Some(ErrorKind::UnknownColumn));

        let outcome = engine.execute("SELECT * FROM orders WHERE id IN (1, 2");
        assert_eq!(outcome.error, Some(ErrorKind::MalformedClause));

        let outcome = engine.execute("EXPLAIN SELECT 1");
        assert_eq!(outcome.error, Some(ErrorKind::UnsupportedSyntax));
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let engine = engine()?;
        let sql = "SELECT o.id, p.paid FROM orders o LEFT JOIN payments p ON o.id = p.order_id ORDER BY id DESC";
        let first = engine.execute(sql);
        assert!(first.is_success());
        assert_eq!(first, engine.execute(sql));
        Ok(())
    }

    #[test]
    fn test_result_cap() -> Result<()> {
        let engine = engine()?;
        let result = engine.query("SELECT * FROM events")?;
        assert_eq!(result.table.len(), 1000);
        assert!(result.truncated);
        assert_eq!(result.message, "1000 rows returned (result truncated to 1000 rows)");

        // LIMIT below the cap is not a truncation
        let result = engine.query("SELECT * FROM events LIMIT 1200")?;
        assert_eq!(result.table.len(), 1000);
        let result = engine.query("SELECT * FROM events LIMIT 10")?;
        assert!(!result.truncated);

        let config = EngineConfig::builder().max_result_rows(5).build()?;
        let engine = QueryEngine::with_config(catalog()?, config);
        assert_eq!(engine.query("SELECT * FROM events")?.table.len(), 5);
        Ok(())
    }

    #[test]
    fn test_session_history() -> Result<()> {
        let config = EngineConfig::builder().history_size(2).build()?;
        let mut session = QueryEngine::with_config(catalog()?, config).session();
        session.execute("SELECT * FROM orders");
        session.execute("DELETE FROM orders");
        session.execute("  SELECT id FROM orders WHERE amount > 60  ");

        let history = session.history().collect::<Vec<_>>();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sql, "DELETE FROM orders");
        assert_eq!(history[0].error, Some(ErrorKind::PermissionDenied));
        assert_eq!(history[1].sql, "SELECT id FROM orders WHERE amount > 60");
        assert_eq!(history[1].summary, "1 row returned");
        Ok(())
    }

    #[test]
    fn test_render_grid() -> Result<()> {
        let result = engine()?.query("SELECT id, status FROM orders")?;
        let grid = result.table.to_string();
        assert!(grid.contains("status"));
        assert!(grid.contains("success"));
        assert!(grid.contains("failed"));
        Ok(())
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_shared_between_threads() -> Result<()> {
        assert_send_sync::<Catalog>();
        assert_send_sync::<QueryEngine<Arc<Catalog>>>();

        let engine = Arc::new(engine()?);
        let sql = "SELECT o.id, p.paid FROM orders o LEFT JOIN payments p ON o.id = p.order_id";
        let handles = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.execute(sql))
            })
            .collect::<Vec<_>>();
        let outcomes = handles
            .into_iter()
            .map(|h| h.join().map_err(|_| Error::Internal("query thread panicked".into())))
            .collect::<Result<Vec<_>>>()?;

        let expected = engine.execute(sql);
        assert!(expected.is_success());
        assert_eq!(outcomes, vec![expected.clone(), expected]);
        Ok(())
    }

    /// Provider that hands out a table once, then panics
    struct VanishingProvider {
        catalog: Arc<Catalog>,
        calls: AtomicUsize,
    }

    impl TableProvider for VanishingProvider {
        fn get_table(&self, table_name: &str) -> Option<Arc<Table>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                panic!("table {} vanished", table_name);
            }
            self.catalog.get_table(table_name)
        }
    }

    #[test]
    fn test_panic_becomes_internal_error() -> Result<()> {
        let engine = QueryEngine::new(VanishingProvider {
            catalog: catalog()?,
            calls: AtomicUsize::new(0),
        });
        // validation sees the table, the scan panics
        let outcome = engine.execute("SELECT * FROM orders");
        assert_eq!(outcome.error, Some(ErrorKind::InternalEvaluationError));
        assert_eq!(outcome.state, QueryState::Failed);
        assert_eq!(outcome.message, "internal evaluation error: table orders vanished");
        assert_eq!(outcome.table, None);
        Ok(())
    }
}
