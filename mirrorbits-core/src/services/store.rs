// src/services/store.rs
//! Metadata store client.
//!
//! - Owns a single SQLite connection; this is the only writer in the process.
//! - Models the key families the redirector daemon shares with us: field maps
//!   (`hashes`), ordered lists (`lists`), membership sets (`sets`) and a
//!   notification outbox (`notifications`) that stands in for pub/sub.
//! - Every write goes through [`Store::atomically`]: one IMMEDIATE transaction,
//!   committed only when the closure returns `Ok`.
//! - No retries. Any SQLite failure is returned to the caller.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// A record as stored: field name -> value.
pub type FieldMap = BTreeMap<String, String>;

/// One published message, as seen by subscribers tailing the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub channel: String,
    pub payload: String,
    pub published_at: String,
}

pub struct Store {
    pub(crate) db: Connection,
    writes: u64,
}

impl Store {
    /// Open/create the store and ensure schema.
    ///
    /// - Creates the parent directory if missing.
    /// - Enables WAL so the daemon can keep reading while we write.
    /// - `busy_timeout` bounds how long we wait for another writer's lock.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(path)?;
        db.busy_timeout(busy_timeout)?;
        Self::init(db)
    }

    /// Private, non-persistent store. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS hashes (
              key    TEXT NOT NULL,
              field  TEXT NOT NULL,
              value  TEXT NOT NULL,
              PRIMARY KEY (key, field)
            );

            CREATE TABLE IF NOT EXISTS lists (
              seq    INTEGER PRIMARY KEY AUTOINCREMENT,  -- defines list order
              key    TEXT NOT NULL,
              value  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_lists_key ON lists(key, seq);

            CREATE TABLE IF NOT EXISTS sets (
              key    TEXT NOT NULL,
              member TEXT NOT NULL,
              PRIMARY KEY (key, member)
            );

            CREATE TABLE IF NOT EXISTS notifications (
              id            INTEGER PRIMARY KEY AUTOINCREMENT,
              channel       TEXT NOT NULL,
              payload       TEXT NOT NULL,
              published_at  TEXT NOT NULL   -- RFC3339 UTC
            );
            "#,
        )?;
        Ok(Self { db, writes: 0 })
    }

    pub fn hgetall(&self, key: &str) -> Result<FieldMap> {
        hgetall(&self.db, key)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        exists(&self.db, key)
    }

    pub fn lrange(&self, key: &str) -> Result<Vec<String>> {
        lrange(&self.db, key)
    }

    pub fn smembers(&self, key: &str) -> Result<Vec<String>> {
        smembers(&self.db, key)
    }

    /// Messages published after `after_id`, oldest first.
    pub fn notifications_since(&self, after_id: i64) -> Result<Vec<Notification>> {
        let mut stmt = self.db.prepare(
            "SELECT id, channel, payload, published_at
             FROM notifications
             WHERE id > ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map([after_id], |r| {
            Ok(Notification {
                id: r.get(0)?,
                channel: r.get(1)?,
                payload: r.get(2)?,
                published_at: r.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Number of write commands committed through this handle.
    pub fn committed_writes(&self) -> u64 {
        self.writes
    }

    /// Run `f` as one atomic unit.
    ///
    /// Either every command issued on the batch is applied or none is. The
    /// transaction takes the write lock up front, so batches from concurrent
    /// processes never interleave.
    pub fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Batch<'_>) -> Result<T>,
    {
        let tx = self
            .db
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let batch = Batch {
            tx,
            commands: Cell::new(0),
        };
        let value = f(&batch)?;
        let commands = batch.commands.get();
        batch.tx.commit()?;
        self.writes += commands;
        tracing::debug!(commands, "store batch committed");
        Ok(value)
    }
}

/// Write handle scoped to one transaction. Dropping it without commit rolls back.
pub struct Batch<'a> {
    tx: Transaction<'a>,
    commands: Cell<u64>,
}

impl Batch<'_> {
    fn count(&self) {
        self.commands.set(self.commands.get() + 1);
    }

    /// Overwrite the named fields of `key`; other fields are left untouched.
    pub fn hset(&self, key: &str, fields: &FieldMap) -> Result<()> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO hashes(key, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(key, field) DO UPDATE SET value = excluded.value",
        )?;
        for (field, value) in fields {
            stmt.execute((key, field, value))?;
        }
        self.count();
        Ok(())
    }

    /// Delete every family stored under each key.
    pub fn del<K: AsRef<str>>(&self, keys: &[K]) -> Result<()> {
        for key in keys {
            let key = key.as_ref();
            self.tx.execute("DELETE FROM hashes WHERE key = ?1", [key])?;
            self.tx.execute("DELETE FROM lists WHERE key = ?1", [key])?;
            self.tx.execute("DELETE FROM sets WHERE key = ?1", [key])?;
        }
        self.count();
        Ok(())
    }

    /// Append `value` at the tail of list `key`.
    pub fn rpush(&self, key: &str, value: &str) -> Result<()> {
        self.tx
            .execute("INSERT INTO lists(key, value) VALUES (?1, ?2)", (key, value))?;
        self.count();
        Ok(())
    }

    /// Remove every occurrence of `value` from list `key`.
    pub fn lrem(&self, key: &str, value: &str) -> Result<usize> {
        let n = self
            .tx
            .execute("DELETE FROM lists WHERE key = ?1 AND value = ?2", (key, value))?;
        self.count();
        Ok(n)
    }

    pub fn sadd(&self, key: &str, member: &str) -> Result<()> {
        self.tx.execute(
            "INSERT OR IGNORE INTO sets(key, member) VALUES (?1, ?2)",
            (key, member),
        )?;
        self.count();
        Ok(())
    }

    pub fn srem(&self, key: &str, member: &str) -> Result<()> {
        self.tx
            .execute("DELETE FROM sets WHERE key = ?1 AND member = ?2", (key, member))?;
        self.count();
        Ok(())
    }

    /// Queue a notification; subscribers only see it once the batch commits.
    pub fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        self.tx.execute(
            "INSERT INTO notifications(channel, payload, published_at) VALUES (?1, ?2, ?3)",
            (channel, payload, Utc::now().to_rfc3339()),
        )?;
        tracing::debug!(channel, payload, "publish");
        self.count();
        Ok(())
    }

    pub fn hgetall(&self, key: &str) -> Result<FieldMap> {
        hgetall(&self.tx, key)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        exists(&self.tx, key)
    }

    pub fn smembers(&self, key: &str) -> Result<Vec<String>> {
        smembers(&self.tx, key)
    }
}

// ---------- shared read helpers ----------

fn hgetall(db: &Connection, key: &str) -> Result<FieldMap> {
    let mut stmt = db.prepare_cached("SELECT field, value FROM hashes WHERE key = ?1")?;
    let rows = stmt.query_map([key], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = FieldMap::new();
    for r in rows {
        let (field, value) = r?;
        out.insert(field, value);
    }
    Ok(out)
}

fn exists(db: &Connection, key: &str) -> Result<bool> {
    let hit: Option<i64> = db
        .query_row(
            "SELECT 1 WHERE EXISTS (SELECT 1 FROM hashes WHERE key = ?1)
                         OR EXISTS (SELECT 1 FROM lists WHERE key = ?1)
                         OR EXISTS (SELECT 1 FROM sets WHERE key = ?1)",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn lrange(db: &Connection, key: &str) -> Result<Vec<String>> {
    let mut stmt = db.prepare_cached("SELECT value FROM lists WHERE key = ?1 ORDER BY seq")?;
    let rows = stmt.query_map([key], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn smembers(db: &Connection, key: &str) -> Result<Vec<String>> {
    let mut stmt = db.prepare_cached("SELECT member FROM sets WHERE key = ?1 ORDER BY member")?;
    let rows = stmt.query_map([key], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
