use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use mirrorbits_core::services::edit::{edit_mirror, EditOutcome, Editor};
use mirrorbits_core::services::keys;
use mirrorbits_core::services::mirror::{Endpoints, GeoInfo, MirrorRecord};
use mirrorbits_core::services::repository::Repository;
use mirrorbits_core::services::store::{FieldMap, Store};
use mirrorbits_core::{AdminError, Result};

// ----------------------- Test editors -----------------------

/// Saves without touching anything.
struct Untouched;

impl Editor for Untouched {
    fn edit(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Applies a text substitution, like an operator would.
struct Substitute {
    from: &'static str,
    to: &'static str,
}

impl Editor for Substitute {
    fn edit(&self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        assert!(text.contains(self.from), "{} not in:\n{text}", self.from);
        fs::write(path, text.replace(self.from, self.to))?;
        Ok(())
    }
}

/// Remembers the staged path, then crashes.
struct Crashing {
    seen: RefCell<Option<PathBuf>>,
}

impl Editor for Crashing {
    fn edit(&self, path: &Path) -> Result<()> {
        *self.seen.borrow_mut() = Some(path.to_path_buf());
        Err(AdminError::Editor("killed by signal 9".into()))
    }
}

// ----------------------- Fixtures -----------------------

fn repo() -> Repository {
    let mut repo = Repository::new(Store::open_in_memory().unwrap());
    repo.create(MirrorRecord {
        id: "mirror.example.org".into(),
        endpoints: Endpoints {
            http: "http://mirror.example.org/pub".into(),
            ..Endpoints::default()
        },
        geo: GeoInfo {
            continent_code: "EU".into(),
            country_codes: "FR".into(),
            ..GeoInfo::default()
        },
        ..MirrorRecord::default()
    })
    .unwrap();

    let mut live = FieldMap::new();
    live.insert("up".into(), "1".into());
    live.insert("stateSince".into(), "1650000000".into());
    repo.store_mut()
        .atomically(|b| b.hset(&keys::mirror("mirror.example.org"), &live))
        .unwrap();
    repo
}

// ----------------------- Tests -----------------------

#[test]
fn unchanged_file_aborts_without_writes() {
    let mut repo = repo();
    let writes = repo.store().committed_writes();
    let last = repo.store().notifications_since(0).unwrap().len();

    let outcome = edit_mirror(&mut repo, "mirror", &Untouched).unwrap();
    assert_eq!(outcome, EditOutcome::Aborted);
    assert_eq!(repo.store().committed_writes(), writes);
    assert_eq!(repo.store().notifications_since(0).unwrap().len(), last);
}

#[test]
fn country_codes_are_normalized_on_commit() {
    let mut repo = repo();
    let editor = Substitute {
        from: "country_codes = \"FR\"",
        to: "country_codes = \"fr, DE\"",
    };
    let outcome = edit_mirror(&mut repo, "mirror.example", &editor).unwrap();
    assert_eq!(outcome, EditOutcome::Committed("mirror.example.org".into()));

    let m = repo.fetch("mirror.example.org").unwrap();
    assert_eq!(m.geo.country_codes, "FR DE");
    assert_eq!(
        repo.store().notifications_since(0).unwrap().last().map(|n| n.payload.clone()),
        Some("mirror.example.org".into())
    );
}

#[test]
fn edit_never_touches_liveness() {
    let mut repo = repo();
    let editor = Substitute {
        from: "score = 0",
        to: "score = 25",
    };
    edit_mirror(&mut repo, "mirror", &editor).unwrap();

    let m = repo.fetch("mirror.example.org").unwrap();
    assert_eq!(m.score, 25);
    assert!(m.up);
    assert_eq!(m.state_since, 1_650_000_000);
}

#[test]
fn missing_liveness_fields_stay_missing() {
    let mut repo = repo();
    let key = keys::mirror("mirror.example.org");
    let editable = repo.fetch("mirror.example.org").unwrap().editable_fields();
    repo.store_mut()
        .atomically(|b| {
            b.del(&[&key])?;
            b.hset(&key, &editable)
        })
        .unwrap();
    let stored = repo.store().hgetall(&key).unwrap();
    assert!(!stored.contains_key("up") && !stored.contains_key("stateSince"));

    let editor = Substitute {
        from: "score = 0",
        to: "score = 3",
    };
    edit_mirror(&mut repo, "mirror", &editor).unwrap();

    let stored = repo.store().hgetall(&key).unwrap();
    assert_eq!(stored.get("score").map(String::as_str), Some("3"));
    assert!(!stored.contains_key("up"), "{stored:?}");
    assert!(!stored.contains_key("stateSince"), "{stored:?}");
}

#[test]
fn edited_urls_are_normalized() {
    let mut repo = repo();
    let editor = Substitute {
        from: "http = \"http://mirror.example.org/pub\"",
        to: "http = \"HTTPS://Mirror.Example.org/pub/\"",
    };
    edit_mirror(&mut repo, "mirror", &editor).unwrap();
    assert_eq!(
        repo.fetch("mirror.example.org").unwrap().endpoints.http,
        "https://mirror.example.org/pub"
    );
}

#[test]
fn unparseable_edit_writes_nothing() {
    let mut repo = repo();
    let before = repo.fetch("mirror.example.org").unwrap();
    let writes = repo.store().committed_writes();

    let editor = Substitute {
        from: "score = 0",
        to: "score = \"lots\"",
    };
    let err = edit_mirror(&mut repo, "mirror", &editor).unwrap_err();
    assert!(matches!(err, AdminError::Parse(_)), "got {err:?}");
    assert_eq!(repo.store().committed_writes(), writes);
    assert_eq!(repo.fetch("mirror.example.org").unwrap(), before);
}

#[test]
fn clearing_http_is_rejected() {
    let mut repo = repo();
    let editor = Substitute {
        from: "http = \"http://mirror.example.org/pub\"",
        to: "http = \"\"",
    };
    assert!(matches!(
        edit_mirror(&mut repo, "mirror", &editor),
        Err(AdminError::MissingHttp)
    ));
}

#[test]
fn staged_file_is_removed_after_editor_failure() {
    let mut repo = repo();
    let editor = Crashing {
        seen: RefCell::new(None),
    };
    let err = edit_mirror(&mut repo, "mirror", &editor).unwrap_err();
    assert!(matches!(err, AdminError::Editor(_)));

    let staged = editor.seen.borrow().clone().expect("editor was invoked");
    assert!(!staged.exists(), "{} left behind", staged.display());
}

#[test]
fn ambiguous_target_never_opens_the_editor() {
    let mut repo = repo();
    repo.create(MirrorRecord {
        id: "mirror2.example.org".into(),
        endpoints: Endpoints {
            http: "http://mirror2.example.org".into(),
            ..Endpoints::default()
        },
        ..MirrorRecord::default()
    })
    .unwrap();
    let editor = Crashing {
        seen: RefCell::new(None),
    };
    assert!(matches!(
        edit_mirror(&mut repo, "mirror", &editor),
        Err(AdminError::Ambiguous { .. })
    ));
    assert!(editor.seen.borrow().is_none());
}
