use std::{collections::BTreeMap, sync::Arc};

use tracing::info;

use crate::{
    error::{Error, Result},
    sql::schema::Table,
};

/// Source of tables for query execution.
///
/// The engine only ever reads through this trait, so any provider must hand
/// out tables that stay unchanged for the duration of a query.
pub trait TableProvider {
    fn get_table(&self, table_name: &str) -> Option<Arc<Table>>;

    /// Returns table info, returns error if table doesn't exist
    fn must_get_table(&self, table_name: &str) -> Result<Arc<Table>> {
        self.get_table(table_name)
            .ok_or_else(|| Error::UnknownTable(table_name.to_string()))
    }
}

/// Fixed set of named tables, keyed case-insensitively.
///
/// Populated once and never mutated afterwards; wrap it in an `Arc` to share
/// it between threads.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Arc<Table>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog, rejecting tables whose names collide ignoring case
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let mut catalog = Self::new();
        for table in tables {
            let key = table.name.to_lowercase();
            if catalog.tables.contains_key(&key) {
                return Err(Error::Internal(format!(
                    "table {} is defined twice",
                    table.name
                )));
            }
            catalog.tables.insert(key, Arc::new(table));
        }
        info!(tables = catalog.tables.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.values().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Schema listing of every table, in name order
    pub fn describe(&self) -> String {
        self.tables
            .values()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Encodes the catalog as a bincode snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let tables = self.tables.values().map(|t| t.as_ref()).collect::<Vec<&Table>>();
        Ok(bincode::serialize(&tables)?)
    }

    /// Restores a catalog from a snapshot produced by [`Catalog::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let tables: Vec<Table> = bincode::deserialize(bytes)?;
        Self::from_tables(tables)
    }
}

impl TableProvider for Catalog {
    fn get_table(&self, table_name: &str) -> Option<Arc<Table>> {
        self.tables.get(&table_name.to_lowercase()).cloned()
    }
}

impl<T: TableProvider + ?Sized> TableProvider for Arc<T> {
    fn get_table(&self, table_name: &str) -> Option<Arc<Table>> {
        self.as_ref().get_table(table_name)
    }
}
