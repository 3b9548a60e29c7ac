//! Persistence boundary: attendance sheets are opaque JSON documents behind a
//! keyed get/put store. MySQL backs production; tests run on the in-memory
//! implementation.

pub mod defaults;
pub mod records;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait KeyedStore: Send + Sync {
    async fn get_json(&self, key: &str) -> Result<Option<Value>>;
    async fn put_json(&self, key: &str, value: Value) -> Result<()>;
}

/// Document key for one employee's month.
pub fn sheet_key(employee_id: u64, year: i32, month: u32) -> String {
    format!("attendance:{}:{}-{:02}", employee_id, year, month)
}

/// MySQL-backed store over the `kv_documents` table
/// (`doc_key VARCHAR(191) PRIMARY KEY, doc_value LONGTEXT`).
#[derive(Clone)]
pub struct MySqlKeyedStore {
    pool: MySqlPool,
}

impl MySqlKeyedStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyedStore for MySqlKeyedStore {
    async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        let raw = sqlx::query_scalar::<_, String>(
            r#"SELECT doc_value FROM kv_documents WHERE doc_key = ?"#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching document {key}"))?;

        match raw {
            Some(text) => {
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("document {key} holds invalid JSON"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put_json(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        sqlx::query(
            r#"
            INSERT INTO kv_documents (doc_key, doc_value)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE doc_value = VALUES(doc_value)
            "#,
        )
        .bind(key)
        .bind(text)
        .execute(&self.pool)
        .await
        .with_context(|| format!("storing document {key}"))?;
        Ok(())
    }
}

/// In-memory store used by the test suites.
#[derive(Default)]
pub struct MemoryKeyedStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryKeyedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyedStore for MemoryKeyedStore {
    async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.docs.lock().expect("store poisoned").get(key).cloned())
    }

    async fn put_json(&self, key: &str, value: Value) -> Result<()> {
        self.docs
            .lock()
            .expect("store poisoned")
            .insert(key.to_owned(), value);
        Ok(())
    }
}
