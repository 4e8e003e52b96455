// src/services/edit.rs
//! Interactive edit workflow.
//!
//! fetch → render (TOML) → stage in a temp file → external editor →
//! digest compare → parse → normalize → commit.
//!
//! An unchanged file (same BLAKE3 digest before and after the editor) is an
//! abort with zero store writes. The staged file is a `NamedTempFile`, so it is
//! removed on every exit path when it goes out of scope.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{AdminError, Result};
use crate::services::mirror::MirrorRecord;
use crate::services::repository::Repository;
use crate::utils::urls;

const HEADER: &str = "# You can now edit this mirror configuration.\n\
                      # Just save and quit when you're done.\n";

/// Something that lets a human (or a test) modify a staged file in place.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

/// The operator's `$EDITOR`, run in the foreground on our terminal.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Accepts a program path, spaces included, or a command line such as
    /// `"code --wait"`. A value naming an existing file is always taken as
    /// one program; anything else is split on whitespace. No shell quoting.
    pub fn new(command: &str) -> Result<Self> {
        let whole = command.trim();
        if !whole.is_empty() && Path::new(whole).is_file() {
            return Ok(Self {
                program: whole.to_string(),
                args: Vec::new(),
            });
        }
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| AdminError::Configuration("empty editor command".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn from_env() -> Result<Self> {
        match std::env::var("EDITOR") {
            Ok(cmd) if !cmd.trim().is_empty() => Self::new(&cmd),
            _ => Err(AdminError::Configuration(
                "environment variable $EDITOR not set".into(),
            )),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| AdminError::Editor(format!("cannot run {}: {e}", self.program)))?;
        if !status.success() {
            return Err(AdminError::Editor(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing changed; nothing was written.
    Aborted,
    Committed(String),
}

// ---------- editable document ----------

/// Human-facing view of a mirror. Identifier and liveness are not part of it.
/// Scalars come before tables so the TOML serializer can emit them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorDocument {
    pub http: String,
    pub rsync: String,
    pub ftp: String,
    pub enabled: bool,
    pub score: i64,
    pub custom_data: String,
    pub sponsor: SponsorSection,
    pub admin: AdminSection,
    pub scope: ScopeSection,
    pub geo: GeoSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SponsorSection {
    pub name: String,
    pub url: String,
    pub logo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminSection {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeSection {
    pub continent_only: bool,
    pub country_only: bool,
    pub as_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoSection {
    pub latitude: f64,
    pub longitude: f64,
    pub continent_code: String,
    pub country_codes: String,
    pub asnum: u32,
}

impl From<&MirrorRecord> for MirrorDocument {
    fn from(m: &MirrorRecord) -> Self {
        Self {
            http: m.endpoints.http.clone(),
            rsync: m.endpoints.rsync.clone(),
            ftp: m.endpoints.ftp.clone(),
            enabled: m.enabled,
            score: m.score,
            custom_data: m.custom_data.clone(),
            sponsor: SponsorSection {
                name: m.sponsor.name.clone(),
                url: m.sponsor.url.clone(),
                logo: m.sponsor.logo_url.clone(),
            },
            admin: AdminSection {
                name: m.admin.name.clone(),
                email: m.admin.email.clone(),
            },
            scope: ScopeSection {
                continent_only: m.scope.continent_only,
                country_only: m.scope.country_only,
                as_only: m.scope.as_only,
            },
            geo: GeoSection {
                latitude: widen(m.geo.latitude),
                longitude: widen(m.geo.longitude),
                continent_code: m.geo.continent_code.clone(),
                country_codes: m.geo.country_codes.clone(),
                asnum: m.geo.asnum,
            },
        }
    }
}

impl MirrorDocument {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AdminError::Parse(e.to_string()))
    }

    /// Normalize and copy the document onto `record`. Identifier and liveness
    /// are kept from `record`.
    pub fn apply_to(self, record: &mut MirrorRecord) -> Result<()> {
        if self.http.trim().is_empty() {
            return Err(AdminError::MissingHttp);
        }
        record.endpoints.http = urls::normalize_http(&self.http)?;
        record.endpoints.rsync = urls::normalize_optional("rsync", &self.rsync)?;
        record.endpoints.ftp = urls::normalize_optional("FTP", &self.ftp)?;
        record.enabled = self.enabled;
        record.score = self.score;
        record.custom_data = self.custom_data;
        record.sponsor.name = self.sponsor.name;
        record.sponsor.url = self.sponsor.url;
        record.sponsor.logo_url = self.sponsor.logo;
        record.admin.name = self.admin.name;
        record.admin.email = self.admin.email;
        record.scope.continent_only = self.scope.continent_only;
        record.scope.country_only = self.scope.country_only;
        record.scope.as_only = self.scope.as_only;
        record.geo.latitude = self.geo.latitude as f32;
        record.geo.longitude = self.geo.longitude as f32;
        record.geo.continent_code = self.geo.continent_code.trim().to_uppercase();
        record.geo.country_codes = normalize_country_codes(&self.geo.country_codes);
        record.geo.asnum = self.geo.asnum;
        Ok(())
    }
}

/// f32 -> f64 through the shortest decimal form, so `48.85` stays `48.85`
/// in the editor instead of `48.849998474121094`.
fn widen(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

/// `"fr, de  be"` -> `"FR DE BE"`.
pub fn normalize_country_codes(raw: &str) -> String {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Editable text for `record`, header comment included.
pub fn render(record: &MirrorRecord) -> Result<String> {
    let body = toml::to_string_pretty(&MirrorDocument::from(record))
        .map_err(|e| AdminError::Parse(format!("cannot render mirror: {e}")))?;
    Ok(format!("{HEADER}# Mirror: {}\n\n{body}", record.id))
}

fn digest_file(path: &Path) -> Result<blake3::Hash> {
    Ok(blake3::hash(&fs::read(path)?))
}

// ---------- workflow ----------

/// Run one edit session for the mirror matching `query`.
pub fn edit_mirror(repo: &mut Repository, query: &str, editor: &dyn Editor) -> Result<EditOutcome> {
    let id = repo.resolve_one(query)?;
    let current = repo.fetch(&id)?;

    let mut staged = tempfile::Builder::new()
        .prefix("mirrorbits-edit-")
        .suffix(".toml")
        .tempfile()?;
    staged.write_all(render(&current)?.as_bytes())?;
    staged.flush()?;

    let before = digest_file(staged.path())?;
    editor.edit(staged.path())?;
    let after = digest_file(staged.path())?;
    if before == after {
        tracing::debug!(mirror = %id, "edit session left the file untouched");
        return Ok(EditOutcome::Aborted);
    }

    let text = fs::read_to_string(staged.path())?;
    let mut updated = current;
    MirrorDocument::parse(&text)?.apply_to(&mut updated)?;
    repo.update(&updated)?;
    Ok(EditOutcome::Committed(id))
}
