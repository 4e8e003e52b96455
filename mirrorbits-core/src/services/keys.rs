// src/services/keys.rs
//! Key layout shared with the redirector daemon and the scanners.

/// Ordered list of every mirror identifier.
pub const MIRRORS: &str = "MIRRORS";

/// Set of files in the local repository; present once `refresh` has run.
pub const FILES: &str = "FILES";

/// Channel carrying a mirror identifier whenever its record changes.
pub const MIRROR_UPDATE: &str = "mirror_update";

/// Channel carrying `"<id> <file>"` whenever a file association changes.
pub const MIRROR_FILE_UPDATE: &str = "file_update";

/// Channel asking the daemon's scanner to (re-)scan a mirror.
pub const SCAN_REQUEST: &str = "scan_request";

/// Channel asking the daemon to re-index the local repository.
pub const REFRESH_REQUEST: &str = "refresh_request";

pub fn mirror(id: &str) -> String {
    format!("MIRROR_{id}")
}

pub fn mirror_files(id: &str) -> String {
    format!("MIRROR_{id}_FILES")
}

pub fn mirror_files_tmp(id: &str) -> String {
    format!("MIRROR_{id}_FILES_TMP")
}

pub fn handled_files(id: &str) -> String {
    format!("HANDLEDFILES_{id}")
}

pub fn file_info(id: &str, file: &str) -> String {
    format!("FILEINFO_{id}_{file}")
}

pub fn file_mirrors(file: &str) -> String {
    format!("FILEMIRRORS_{file}")
}
