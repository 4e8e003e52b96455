// src/services/scan.rs
//! Scanner seam. Crawling mirrors and indexing the local repository belong to
//! the daemon; the admin tool only validates the request and hands it over.

use crate::error::{AdminError, Result};
use crate::services::keys;
use crate::services::mirror::MirrorRecord;
use crate::services::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMethod {
    Rsync,
    Ftp,
}

impl ScanMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMethod::Rsync => "rsync",
            ScanMethod::Ftp => "ftp",
        }
    }

    /// rsync when available, FTP otherwise.
    pub fn pick(mirror: &MirrorRecord) -> Result<(ScanMethod, &str)> {
        if !mirror.endpoints.rsync.is_empty() {
            Ok((ScanMethod::Rsync, &mirror.endpoints.rsync))
        } else if !mirror.endpoints.ftp.is_empty() {
            Ok((ScanMethod::Ftp, &mirror.endpoints.ftp))
        } else {
            Err(AdminError::NoSyncMethod)
        }
    }
}

pub trait Scanner {
    fn scan_mirror(&self, store: &mut Store, mirror: &MirrorRecord) -> Result<()>;
    fn refresh_source(&self, store: &mut Store) -> Result<()>;
}

/// Queues scan and refresh requests on the daemon's request channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonScanner;

impl Scanner for DaemonScanner {
    fn scan_mirror(&self, store: &mut Store, mirror: &MirrorRecord) -> Result<()> {
        let (method, url) = ScanMethod::pick(mirror)?;
        let payload = format!("{} {} {}", mirror.id, method.as_str(), url);
        store.atomically(|b| b.publish(keys::SCAN_REQUEST, &payload))?;
        tracing::info!(mirror = %mirror.id, method = method.as_str(), "scan requested");
        Ok(())
    }

    fn refresh_source(&self, store: &mut Store) -> Result<()> {
        store.atomically(|b| b.publish(keys::REFRESH_REQUEST, "local"))?;
        tracing::info!("refresh requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mirror::Endpoints;

    fn mirror(rsync: &str, ftp: &str) -> MirrorRecord {
        MirrorRecord {
            id: "m1".into(),
            endpoints: Endpoints {
                http: "http://m1".into(),
                rsync: rsync.into(),
                ftp: ftp.into(),
            },
            ..MirrorRecord::default()
        }
    }

    #[test]
    fn prefers_rsync_then_ftp() {
        let m = mirror("rsync://m1/pub", "ftp://m1/pub");
        assert_eq!(ScanMethod::pick(&m).unwrap().0, ScanMethod::Rsync);
        let m = mirror("", "ftp://m1/pub");
        assert_eq!(ScanMethod::pick(&m).unwrap(), (ScanMethod::Ftp, "ftp://m1/pub"));
        assert!(matches!(
            ScanMethod::pick(&mirror("", "")),
            Err(AdminError::NoSyncMethod)
        ));
    }

    #[test]
    fn requests_are_published() {
        let mut store = Store::open_in_memory().unwrap();
        DaemonScanner
            .scan_mirror(&mut store, &mirror("rsync://m1/pub", ""))
            .unwrap();
        DaemonScanner.refresh_source(&mut store).unwrap();
        let sent = store.notifications_since(0).unwrap();
        assert_eq!(sent[0].channel, keys::SCAN_REQUEST);
        assert_eq!(sent[0].payload, "m1 rsync rsync://m1/pub");
        assert_eq!(sent[1].channel, keys::REFRESH_REQUEST);
    }
}
