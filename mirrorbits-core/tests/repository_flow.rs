use mirrorbits_core::services::keys;
use mirrorbits_core::services::mirror::{Admin, Endpoints, GeoInfo, MirrorRecord};
use mirrorbits_core::services::repository::{ExportOptions, ListFilter, Repository};
use mirrorbits_core::services::store::{FieldMap, Store};
use mirrorbits_core::AdminError;

fn mirror(id: &str, http: &str, rsync: &str, ftp: &str, country: &str) -> MirrorRecord {
    MirrorRecord {
        id: id.into(),
        endpoints: Endpoints {
            http: http.into(),
            rsync: rsync.into(),
            ftp: ftp.into(),
        },
        admin: Admin {
            name: "ops".into(),
            email: format!("ops@{id}"),
        },
        geo: GeoInfo {
            country_codes: country.into(),
            ..GeoInfo::default()
        },
        ..MirrorRecord::default()
    }
}

fn repo() -> Repository {
    Repository::new(Store::open_in_memory().expect("in-memory store"))
}

#[test]
fn new_mirrors_are_disabled_and_down() -> anyhow::Result<()> {
    let mut repo = repo();
    let mut rec = mirror("m1", "http://m1.example.org", "", "", "FR");
    rec.enabled = true;
    rec.up = true;
    repo.create(rec)?;

    let listed = repo.list(ListFilter::default())?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "m1");
    assert!(!listed[0].enabled);
    assert!(!listed[0].up);
    assert!(listed[0].state_since > 0);

    let sent = repo.store().notifications_since(0)?;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, keys::MIRROR_UPDATE);
    assert_eq!(sent[0].payload, "m1");
    Ok(())
}

#[test]
fn duplicate_create_leaves_store_untouched() -> anyhow::Result<()> {
    let mut repo = repo();
    repo.create(mirror("m1", "http://m1.example.org", "", "", "FR"))?;
    let writes = repo.store().committed_writes();
    let before = repo.fetch("m1")?;

    let err = repo
        .create(mirror("m1", "http://other.example.org", "", "", "DE"))
        .unwrap_err();
    assert!(matches!(err, AdminError::AlreadyExists(ref id) if id == "m1"));

    assert_eq!(repo.store().committed_writes(), writes);
    assert_eq!(repo.fetch("m1")?, before);
    assert_eq!(repo.ids()?, vec!["m1"]);
    Ok(())
}

#[test]
fn enable_and_disable_keep_liveness() -> anyhow::Result<()> {
    let mut repo = repo();
    repo.create(mirror("m1", "http://m1.example.org", "", "", "FR"))?;

    // The daemon marks the mirror up at some point.
    let mut live = FieldMap::new();
    live.insert("up".into(), "1".into());
    live.insert("stateSince".into(), "1700000000".into());
    repo.store_mut()
        .atomically(|b| b.hset(&keys::mirror("m1"), &live))?;

    repo.set_enabled("m1", true)?;
    let m = repo.fetch("m1")?;
    assert!(m.enabled);
    assert!(m.up);
    assert_eq!(m.state_since, 1_700_000_000);

    repo.set_enabled("m1", false)?;
    let m = repo.fetch("m1")?;
    assert!(!m.enabled);
    assert!(m.up);
    assert_eq!(m.state_since, 1_700_000_000);
    Ok(())
}

#[test]
fn enabling_an_unknown_mirror_fails() {
    let mut repo = repo();
    assert!(matches!(
        repo.set_enabled("ghost", true),
        Err(AdminError::NotFound(_))
    ));
}

#[test]
fn remove_clears_every_association() -> anyhow::Result<()> {
    let mut repo = repo();
    repo.create(mirror("m1", "http://m1.example.org", "", "", "FR"))?;
    repo.create(mirror("m2", "http://m2.example.org", "", "", "DE"))?;
    repo.store_mut().atomically(|b| {
        for f in ["/iso/a.iso", "/iso/b.iso"] {
            for id in ["m1", "m2"] {
                b.sadd(&keys::mirror_files(id), f)?;
                b.sadd(&keys::file_mirrors(f), id)?;
                let mut info = FieldMap::new();
                info.insert("size".into(), "42".into());
                b.hset(&keys::file_info(id, f), &info)?;
            }
        }
        b.sadd(&keys::handled_files("m1"), "/iso/a.iso")
    })?;
    let seen = repo.store().notifications_since(0)?.last().map(|n| n.id).unwrap_or(0);

    let report = repo.remove("m1")?;
    assert_eq!(report.files, 2);

    assert_eq!(repo.ids()?, vec!["m2"]);
    assert!(!repo.store().exists(&keys::mirror("m1"))?);
    assert!(!repo.store().exists(&keys::mirror_files("m1"))?);
    assert!(!repo.store().exists(&keys::handled_files("m1"))?);
    for f in ["/iso/a.iso", "/iso/b.iso"] {
        assert_eq!(repo.store().smembers(&keys::file_mirrors(f))?, vec!["m2"]);
        assert!(!repo.store().exists(&keys::file_info("m1", f))?);
        assert!(repo.store().exists(&keys::file_info("m2", f))?);
    }

    let sent = repo.store().notifications_since(seen)?;
    let file_updates: Vec<_> = sent
        .iter()
        .filter(|n| n.channel == keys::MIRROR_FILE_UPDATE)
        .map(|n| n.payload.as_str())
        .collect();
    assert_eq!(file_updates.len(), 2);
    assert!(file_updates.contains(&"m1 /iso/a.iso"));
    assert_eq!(sent.last().map(|n| n.payload.as_str()), Some("m1"));
    Ok(())
}

#[test]
fn mirmon_export_order_and_filters() -> anyhow::Result<()> {
    let mut repo = repo();
    repo.create(mirror(
        "full",
        "http://full.example.org",
        "rsync://full.example.org/pub",
        "ftp://full.example.org/pub",
        "FR DE",
    ))?;
    repo.create(mirror("web", "http://web.example.org", "", "", ""))?;
    repo.set_enabled("full", true)?;

    let rows = repo.export(&ExportOptions::default())?;
    let lines: Vec<String> = rows.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "FR rsync://full.example.org/pub ops@full",
            "FR http://full.example.org ops@full",
            "FR ftp://full.example.org/pub ops@full",
            "-- http://web.example.org ops@web",
        ]
    );

    let enabled_http_only = ExportOptions {
        rsync: false,
        ftp: false,
        include_disabled: false,
        ..ExportOptions::default()
    };
    let rows = repo.export(&enabled_http_only)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url, "http://full.example.org");
    Ok(())
}
