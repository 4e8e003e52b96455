// src/services/repository.rs
//! Mirror repository: every mutation of mirror records and their file
//! associations, each one a single store transaction that also publishes the
//! matching notifications.

use chrono::Utc;
use std::str::FromStr;

use crate::error::{AdminError, Result};
use crate::services::keys;
use crate::services::mirror::MirrorRecord;
use crate::services::resolver;
use crate::services::store::{FieldMap, Store};

/// Which mirrors `list` shows. Set filters combine with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    pub enabled_only: bool,
    pub disabled_only: bool,
    pub down_only: bool,
}

impl ListFilter {
    fn accepts(&self, m: &MirrorRecord) -> bool {
        !(self.enabled_only && !m.enabled)
            && !(self.disabled_only && m.enabled)
            && !(self.down_only && m.up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Mirmon,
}

impl FromStr for ExportFormat {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mirmon" => Ok(ExportFormat::Mirmon),
            other => Err(AdminError::Usage(format!(
                "Unsupported format {other:?}. Available formats: mirmon"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub rsync: bool,
    pub http: bool,
    pub ftp: bool,
    pub include_disabled: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mirmon,
            rsync: true,
            http: true,
            ftp: true,
            include_disabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub country: String,
    pub url: String,
    pub email: String,
}

impl std::fmt::Display for ExportRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.country, self.url, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    pub id: String,
    pub files: usize,
}

pub struct Repository {
    store: Store,
}

impl Repository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        self.store.lrange(keys::MIRRORS)
    }

    pub fn resolve_one(&self, query: &str) -> Result<String> {
        resolver::resolve_one(&self.store, query)
    }

    pub fn fetch(&self, id: &str) -> Result<MirrorRecord> {
        let fields = self.store.hgetall(&keys::mirror(id))?;
        if fields.is_empty() {
            return Err(AdminError::NotFound(id.to_string()));
        }
        let mut rec = MirrorRecord::from_fields(&fields);
        rec.id = id.to_string();
        Ok(rec)
    }

    /// Insert a new mirror. New mirrors are always born disabled and down,
    /// whatever the caller put in `enabled`/`up`.
    pub fn create(&mut self, mut record: MirrorRecord) -> Result<MirrorRecord> {
        validate_identifier(&record.id)?;
        if record.endpoints.http.is_empty() {
            return Err(AdminError::MissingHttp);
        }
        record.enabled = false;
        record.up = false;
        record.state_since = Utc::now().timestamp();

        let key = keys::mirror(&record.id);
        let fields = record.to_fields();
        self.store.atomically(|b| {
            if b.exists(&key)? {
                return Err(AdminError::AlreadyExists(record.id.clone()));
            }
            b.hset(&key, &fields)?;
            b.rpush(keys::MIRRORS, &record.id)?;
            b.publish(keys::MIRROR_UPDATE, &record.id)
        })?;
        tracing::info!(mirror = %record.id, "mirror created");
        Ok(record)
    }

    /// Flip operator intent. Liveness (`up`, `stateSince`) is left alone.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        let key = keys::mirror(id);
        let mut fields = FieldMap::new();
        fields.insert("enabled".into(), if enabled { "1" } else { "0" }.into());
        self.store.atomically(|b| {
            if !b.exists(&key)? {
                return Err(AdminError::NotFound(id.to_string()));
            }
            b.hset(&key, &fields)?;
            b.publish(keys::MIRROR_UPDATE, id)
        })?;
        tracing::info!(mirror = id, enabled, "mirror state changed");
        Ok(())
    }

    /// Write back every operator-editable field, keyed by `record.id`.
    pub fn update(&mut self, record: &MirrorRecord) -> Result<()> {
        let key = keys::mirror(&record.id);
        let fields = record.editable_fields();
        self.store.atomically(|b| {
            if !b.exists(&key)? {
                return Err(AdminError::NotFound(record.id.clone()));
            }
            b.hset(&key, &fields)?;
            b.publish(keys::MIRROR_UPDATE, &record.id)
        })?;
        tracing::info!(mirror = %record.id, "mirror updated");
        Ok(())
    }

    /// Retire a mirror and every file association it holds.
    ///
    /// The mirror is disabled first so the daemon stops routing to it. The
    /// cleanup itself is one transaction: on failure nothing is removed.
    pub fn remove(&mut self, id: &str) -> Result<RemoveReport> {
        if self.store.exists(&keys::mirror(id))? {
            self.set_enabled(id, false)?;
        }

        let mirror_key = keys::mirror(id);
        let files_key = keys::mirror_files(id);
        let tmp_key = keys::mirror_files_tmp(id);
        let handled_key = keys::handled_files(id);

        let files = self.store.atomically(|b| {
            let files = b.smembers(&files_key)?;
            for file in &files {
                b.del(&[keys::file_info(id, file)])?;
                b.srem(&keys::file_mirrors(file), id)?;
                b.publish(keys::MIRROR_FILE_UPDATE, &format!("{id} {file}"))?;
            }
            b.del(&[&mirror_key, &files_key, &tmp_key, &handled_key])?;
            b.lrem(keys::MIRRORS, id)?;
            b.publish(keys::MIRROR_UPDATE, id)?;
            Ok(files.len())
        })?;
        tracing::info!(mirror = id, files, "mirror removed");
        Ok(RemoveReport {
            id: id.to_string(),
            files,
        })
    }

    /// Full records in list order.
    pub fn list(&self, filter: ListFilter) -> Result<Vec<MirrorRecord>> {
        let mut out = Vec::new();
        for id in self.ids()? {
            match self.fetch(&id) {
                Ok(rec) if filter.accepts(&rec) => out.push(rec),
                Ok(_) => {}
                Err(AdminError::NotFound(_)) => {
                    tracing::warn!(mirror = %id, "listed mirror has no record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Project mirrors to export rows, keeping the rsync, http, ftp order.
    pub fn export(&self, opts: &ExportOptions) -> Result<Vec<ExportRow>> {
        match opts.format {
            ExportFormat::Mirmon => {}
        }
        let mut rows = Vec::new();
        for m in self.list(ListFilter::default())? {
            if !opts.include_disabled && !m.enabled {
                continue;
            }
            let country = m.geo.primary_country().unwrap_or("--").to_string();
            let candidates = [
                (opts.rsync, &m.endpoints.rsync),
                (opts.http, &m.endpoints.http),
                (opts.ftp, &m.endpoints.ftp),
            ];
            for (wanted, url) in candidates {
                if wanted && !url.is_empty() {
                    rows.push(ExportRow {
                        country: country.clone(),
                        url: url.clone(),
                        email: m.admin.email.clone(),
                    });
                }
            }
        }
        Ok(rows)
    }
}

pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(AdminError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}
