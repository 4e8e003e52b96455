use std::fs;

use mirrorbits_core::services::signal::{send, ControlSignal, PidFile};
use mirrorbits_core::AdminError;

#[test]
fn missing_pid_file_means_no_instance() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = PidFile::new(dir.path().join("mirrorbits.pid"));
    assert!(pid_file.running_pid().unwrap().is_none());
    assert!(matches!(
        send(&pid_file, ControlSignal::Reload),
        Err(AdminError::NoRunningInstance)
    ));
}

#[test]
fn garbage_or_non_positive_pids_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirrorbits.pid");
    let pid_file = PidFile::new(&path);

    for content in ["", "not a pid\n", "0", "-12"] {
        fs::write(&path, content).unwrap();
        assert!(pid_file.running_pid().unwrap().is_none(), "{content:?}");
        assert!(matches!(
            send(&pid_file, ControlSignal::Upgrade),
            Err(AdminError::NoRunningInstance)
        ));
    }
}

#[test]
fn stale_pid_is_not_signaled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirrorbits.pid");
    // Above any real pid_max.
    fs::write(&path, format!("{}\n", i32::MAX)).unwrap();
    let pid_file = PidFile::new(&path);
    assert!(pid_file.running_pid().unwrap().is_none());
    assert!(matches!(
        send(&pid_file, ControlSignal::Reload),
        Err(AdminError::NoRunningInstance)
    ));
}

#[test]
fn live_pid_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirrorbits.pid");
    fs::write(&path, std::process::id().to_string()).unwrap();
    let pid = PidFile::new(&path).running_pid().unwrap();
    assert_eq!(pid.map(|p| p.as_raw()), Some(std::process::id() as i32));
}

#[test]
fn signal_names() {
    assert_eq!(ControlSignal::Reload.as_str(), "reload-configuration");
    assert_eq!(ControlSignal::Upgrade.as_str(), "begin-seamless-upgrade");
    assert_eq!(
        ControlSignal::Upgrade.as_signal(),
        nix::sys::signal::Signal::SIGUSR2
    );
}
