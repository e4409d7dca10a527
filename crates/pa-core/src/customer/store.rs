//! Customer record storage

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::customer::Customer;
use crate::{Error, Result};

/// Lookup of customer records by identifier
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Find a customer by id
    async fn find(&self, id: &str) -> Result<Option<Customer>>;

    /// Insert or replace a customer record
    async fn upsert(&self, customer: &Customer) -> Result<()>;

    /// Number of stored customers
    async fn count(&self) -> Result<usize>;
}

/// SQLite-based customer store
pub struct SqliteCustomerStore {
    conn: Mutex<Connection>,
}

impl SqliteCustomerStore {
    /// Open (or create) the database at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Opening customer database at: {}", db_path.display());
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        info!("Customer store initialized: {}", db_path.display());
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("customer database lock poisoned".to_string()))
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        self.connection()?.execute(
            "CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                phone_number TEXT NOT NULL,
                profile TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for SqliteCustomerStore {
    async fn find(&self, id: &str) -> Result<Option<Customer>> {
        let row = {
            let conn = self.connection()?;
            let mut stmt =
                conn.prepare("SELECT id, phone_number, profile FROM customers WHERE id = ?1")?;

            let result = stmt.query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            });

            match result {
                Ok(row) => Some(row),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(Error::from(e)),
            }
        };

        match row {
            Some((id, phone_number, profile)) => {
                let profile: Map<String, Value> = serde_json::from_str(&profile)?;
                Ok(Some(Customer {
                    id,
                    phone_number,
                    profile,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, customer: &Customer) -> Result<()> {
        let profile = serde_json::to_string(&customer.profile)?;
        self.connection()?.execute(
            "INSERT OR REPLACE INTO customers (id, phone_number, profile) VALUES (?1, ?2, ?3)",
            params![customer.id, customer.phone_number, profile],
        )?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 =
            self.connection()?
                .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// In-memory customer store
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustomerStore {
    customers: Arc<RwLock<HashMap<String, Customer>>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `customers`
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let map = customers.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            customers: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn upsert(&self, customer: &Customer) -> Result<()> {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.customers.read().await.len())
    }
}
