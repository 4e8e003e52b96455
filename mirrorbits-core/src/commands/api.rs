// src/commands/api.rs
use clap::{CommandFactory, Parser};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

use crate::commands::args::{AddArgs, ExportArgs, ListArgs, NoArgs, TargetArgs};
use crate::commands::helpers::{render_table, state_cell};
use crate::commands::verb::{help_text, Verb};
use crate::config::{CoreConfig, StoreConfig};
use crate::error::{AdminError, Result};
use crate::services::edit::{edit_mirror, EditOutcome, Editor, ExternalEditor};
use crate::services::geo::{GeoLocator, GeoLookup, TableGeoLocator};
use crate::services::keys;
use crate::services::mirror::{Admin, Endpoints, GeoInfo, MirrorRecord, Scope, Sponsor};
use crate::services::repository::{self, ExportFormat, ExportOptions, ListFilter, Repository};
use crate::services::scan::{DaemonScanner, Scanner};
use crate::services::signal::{self, ControlSignal, PidFile};
use crate::services::store::Store;
use crate::utils::logbook::Logbook;
use crate::utils::urls;

pub struct Commands {
    config: CoreConfig,
    repo: Option<Repository>, // opened on first use
    geo: Box<dyn GeoLocator>,
    scanner: Box<dyn Scanner>,
    editor: Option<Box<dyn Editor>>, // None -> $EDITOR at edit time
    logbook: Logbook,
}

impl Commands {
    /// Wire the shipped collaborators from `config`. Nothing is opened yet.
    pub fn new(config: CoreConfig) -> Self {
        let geo = TableGeoLocator::new(config.geo.hosts.clone());
        let logbook = if config.logbook.enabled {
            Logbook::new(config.logbook.path.clone())
        } else {
            Logbook::disabled()
        };
        Self {
            config,
            repo: None,
            geo: Box::new(geo),
            scanner: Box::new(DaemonScanner),
            editor: None,
            logbook,
        }
    }

    pub fn with_repository(mut self, repo: Repository) -> Self {
        self.repo = Some(repo);
        self
    }

    pub fn with_geo(mut self, geo: impl GeoLocator + 'static) -> Self {
        self.geo = Box::new(geo);
        self
    }

    pub fn with_scanner(mut self, scanner: impl Scanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    pub fn with_editor(mut self, editor: impl Editor + 'static) -> Self {
        self.editor = Some(Box::new(editor));
        self
    }

    pub fn with_logbook(mut self, logbook: Logbook) -> Self {
        self.logbook = logbook;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn repository(&mut self) -> Result<&mut Repository> {
        open_repo(&mut self.repo, &self.config.store)
    }

    /// Run one command line (verb first, no program name).
    ///
    /// Help, argument errors and resolver outcomes are printed to `err` and
    /// count as success. Everything else comes back as an error for the
    /// caller to turn into an exit status.
    pub fn dispatch(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<()> {
        let Some((first, rest)) = args.split_first() else {
            writeln!(err, "{}", help_text())?;
            return Ok(());
        };
        let Some(verb) = Verb::lookup(first) else {
            writeln!(err, "Error: Command not found: {first}")?;
            writeln!(err, "{}", help_text())?;
            return Ok(());
        };

        match self.execute(verb, rest, out, err) {
            Ok(()) => Ok(()),
            Err(e) if !e.is_fatal() => {
                report(&e, err)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run `verb` with its own arguments. Errors are returned untouched.
    pub fn execute(
        &mut self,
        verb: Verb,
        args: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<()> {
        match verb {
            Verb::Help => {
                writeln!(err, "{}", help_text())?;
                Ok(())
            }
            Verb::Add => match parse::<AddArgs>(verb, args, err)? {
                Some(a) => self.add(a, out, err),
                None => Ok(()),
            },
            Verb::List => match parse::<ListArgs>(verb, args, err)? {
                Some(a) => self.list(a, out),
                None => Ok(()),
            },
            Verb::Export => match parse::<ExportArgs>(verb, args, err)? {
                Some(a) => self.export(a, out),
                None => Ok(()),
            },
            Verb::Edit => match parse::<TargetArgs>(verb, args, err)? {
                Some(a) => self.edit(&a.identifier, out),
                None => Ok(()),
            },
            Verb::Enable | Verb::Disable => match parse::<TargetArgs>(verb, args, err)? {
                Some(a) => self.set_enabled(&a.identifier, verb == Verb::Enable, out),
                None => Ok(()),
            },
            Verb::Remove => match parse::<TargetArgs>(verb, args, err)? {
                Some(a) => self.remove(&a.identifier, out),
                None => Ok(()),
            },
            Verb::Scan => match parse::<TargetArgs>(verb, args, err)? {
                Some(a) => self.scan(&a.identifier, out),
                None => Ok(()),
            },
            Verb::Refresh => match parse::<NoArgs>(verb, args, err)? {
                Some(_) => self.refresh(out),
                None => Ok(()),
            },
            Verb::Reload | Verb::Upgrade => match parse::<NoArgs>(verb, args, err)? {
                Some(_) => {
                    let control = if verb == Verb::Reload {
                        ControlSignal::Reload
                    } else {
                        ControlSignal::Upgrade
                    };
                    self.signal(control)
                }
                None => Ok(()),
            },
            Verb::Version => match parse::<NoArgs>(verb, args, err)? {
                Some(_) => version(out),
                None => Ok(()),
            },
        }
    }

    // ---------- verbs ----------

    pub fn add(&mut self, a: AddArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<()> {
        repository::validate_identifier(&a.identifier)?;
        let http = match a.http.as_deref() {
            Some(h) if !h.trim().is_empty() => urls::normalize_http(h)?,
            _ => return Err(AdminError::MissingHttp),
        };
        let rsync = urls::normalize_optional("rsync", &a.rsync)?;
        let ftp = urls::normalize_optional("FTP", &a.ftp)?;

        let repo = open_repo(&mut self.repo, &self.config.store)?;
        if repo.store().exists(&keys::mirror(&a.identifier))? {
            return Err(AdminError::AlreadyExists(a.identifier));
        }

        let lookup = urls::host_of(&http)
            .map(|host| self.geo.locate(&host))
            .unwrap_or_else(GeoLookup::default);
        if lookup.multiple_addresses {
            writeln!(
                err,
                "Warning: the hostname returned more than one address! This is highly unreliable."
            )?;
        }
        let geo = match lookup.info {
            Some(info) => info,
            None => {
                writeln!(
                    err,
                    "Warning: unable to guess the geographic location of {}",
                    a.identifier
                )?;
                GeoInfo::default()
            }
        };

        let created = repo.create(MirrorRecord {
            id: a.identifier,
            endpoints: Endpoints { http, rsync, ftp },
            sponsor: Sponsor {
                name: a.sponsor_name,
                url: a.sponsor_url,
                logo_url: a.sponsor_logo,
            },
            admin: Admin {
                name: a.admin_name,
                email: a.admin_email,
            },
            custom_data: a.custom_data,
            scope: Scope {
                continent_only: a.continent_only,
                country_only: a.country_only,
                as_only: a.as_only,
            },
            score: a.score,
            geo,
            ..MirrorRecord::default()
        })?;

        self.logbook.record(
            "add",
            &created.id,
            json!({
                "http": created.endpoints.http,
                "rsync": created.endpoints.rsync,
                "ftp": created.endpoints.ftp,
                "country_codes": created.geo.country_codes,
            }),
        );
        writeln!(out, "Mirror added successfully")?;
        Ok(())
    }

    pub fn list(&mut self, a: ListArgs, out: &mut dyn Write) -> Result<()> {
        let filter = ListFilter {
            enabled_only: a.enabled,
            disabled_only: a.disabled,
            down_only: a.down,
        };
        let mirrors = self.repository()?.list(filter)?;

        let mut header = vec!["Identifier".to_string()];
        let columns = [
            (a.http, "HTTP"),
            (a.rsync, "RSYNC"),
            (a.ftp, "FTP"),
            (a.state, "STATE"),
        ];
        for (wanted, title) in columns {
            if wanted {
                header.push(title.to_string());
            }
        }
        let mut rows = vec![header];
        for m in &mirrors {
            let mut row = vec![m.id.clone()];
            if a.http {
                row.push(m.endpoints.http.clone());
            }
            if a.rsync {
                row.push(m.endpoints.rsync.clone());
            }
            if a.ftp {
                row.push(m.endpoints.ftp.clone());
            }
            if a.state {
                row.push(state_cell(m));
            }
            rows.push(row);
        }
        out.write_all(render_table(&rows).as_bytes())?;
        Ok(())
    }

    pub fn export(&mut self, a: ExportArgs, out: &mut dyn Write) -> Result<()> {
        let opts = ExportOptions {
            format: a.format.parse::<ExportFormat>()?,
            rsync: a.rsync,
            http: a.http,
            ftp: a.ftp,
            include_disabled: a.disabled,
        };
        for row in self.repository()?.export(&opts)? {
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    pub fn edit(&mut self, query: &str, out: &mut dyn Write) -> Result<()> {
        // Checked before anything touches the store.
        let env_editor;
        let editor: &dyn Editor = match &self.editor {
            Some(e) => &**e,
            None => {
                env_editor = ExternalEditor::from_env()?;
                &env_editor
            }
        };

        let repo = open_repo(&mut self.repo, &self.config.store)?;
        match edit_mirror(repo, query, editor)? {
            EditOutcome::Aborted => writeln!(out, "Aborted")?,
            EditOutcome::Committed(id) => {
                self.logbook.record("edit", &id, json!({}));
                writeln!(out, "Mirror edited successfully")?;
            }
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, query: &str, enabled: bool, out: &mut dyn Write) -> Result<()> {
        let repo = self.repository()?;
        let id = repo.resolve_one(query)?;
        repo.set_enabled(&id, enabled)?;
        if enabled {
            self.logbook.record("enable", &id, json!({}));
            writeln!(out, "Mirror enabled successfully")?;
        } else {
            self.logbook.record("disable", &id, json!({}));
            writeln!(out, "Mirror disabled successfully")?;
        }
        Ok(())
    }

    pub fn remove(&mut self, query: &str, out: &mut dyn Write) -> Result<()> {
        let repo = self.repository()?;
        let id = repo.resolve_one(query)?;
        let report = repo.remove(&id)?;
        self.logbook
            .record("remove", &report.id, json!({ "files": report.files }));
        writeln!(out, "Mirror removed successfully")?;
        Ok(())
    }

    pub fn scan(&mut self, query: &str, out: &mut dyn Write) -> Result<()> {
        let repo = open_repo(&mut self.repo, &self.config.store)?;
        if !repo.store().exists(keys::FILES)? {
            return Err(AdminError::NotIndexed);
        }
        let id = repo.resolve_one(query)?;
        let mirror = repo.fetch(&id)?;
        writeln!(out, "Scanning {id}...")?;
        self.scanner.scan_mirror(repo.store_mut(), &mirror)
    }

    pub fn refresh(&mut self, out: &mut dyn Write) -> Result<()> {
        let repo = open_repo(&mut self.repo, &self.config.store)?;
        writeln!(out, "Refreshing the local repository...")?;
        self.scanner.refresh_source(repo.store_mut())
    }

    pub fn signal(&self, control: ControlSignal) -> Result<()> {
        let pid_file = PidFile::new(&self.config.daemon.pid_file);
        signal::send(&pid_file, control)?;
        Ok(())
    }
}

fn open_repo<'a>(slot: &'a mut Option<Repository>, cfg: &StoreConfig) -> Result<&'a mut Repository> {
    let repo = match slot.take() {
        Some(repo) => repo,
        None => Repository::new(Store::open(
            &cfg.path,
            Duration::from_millis(cfg.busy_timeout_ms),
        )?),
    };
    Ok(slot.insert(repo))
}

/// Parse a verb's own arguments. clap failures (including `--help`) print
/// the verb's usage to `err` and yield `None`.
fn parse<T: Parser>(verb: Verb, args: &[String], err: &mut dyn Write) -> Result<Option<T>> {
    let command = T::command()
        .name(verb.name())
        .bin_name(format!("mirrorbits {}", verb.name()))
        .about(verb.description())
        .override_usage(format!("mirrorbits {} {}", verb.name(), verb.signature()))
        .no_binary_name(true);
    let parsed = command
        .try_get_matches_from(args)
        .and_then(|matches| T::from_arg_matches(&matches));
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            write!(err, "{}", e.render())?;
            Ok(None)
        }
    }
}

/// How a non-fatal error reads on the terminal.
fn report(e: &AdminError, err: &mut dyn Write) -> Result<()> {
    match e {
        AdminError::NoMatch(query) => writeln!(err, "No match for {query}")?,
        AdminError::Ambiguous { candidates, .. } => {
            for candidate in candidates {
                writeln!(err, "{candidate}")?;
            }
        }
        AdminError::NoRunningInstance | AdminError::Signal { .. } => {
            tracing::error!("{e}");
        }
        other => writeln!(err, "{other}")?,
    }
    Ok(())
}

fn version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Version: mirrorbits {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        out,
        "OS/Arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )?;
    Ok(())
}
