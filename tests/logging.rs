use std::{fs, thread::sleep, time::Duration};

use foxy_jumpscare::logging;
use foxy_jumpscare::scheduler::TriggerScheduler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jumpscare_log.txt");

    tracing::subscriber::with_default(logging::subscriber(true, Some(&path), false), || {
        tracing::info!("Jumpscare daemon starting");
        tracing::debug!("Roll: 42");
    });

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("Jumpscare daemon starting"));
    assert!(contents.contains("Roll: 42"));
}

#[test]
#[serial]
fn release_level_still_records_rolls() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jumpscare_log.txt");
    let mut scheduler = TriggerScheduler::with_rng(
        Duration::from_millis(1000),
        10_000,
        StdRng::seed_from_u64(5),
    );

    tracing::subscriber::with_default(logging::subscriber(false, Some(&path), false), || {
        for _ in 0..3 {
            scheduler.tick();
        }
        tracing::debug!("frame decoded");
    });

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(path).unwrap();
    assert_eq!(contents.matches("Roll: ").count(), 3, "log was: {contents}");
    assert!(!contents.contains("frame decoded"));
}

#[test]
#[serial]
fn appends_across_runs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jumpscare_log.txt");
    fs::write(&path, "earlier run\n").unwrap();

    tracing::subscriber::with_default(logging::subscriber(false, Some(&path), false), || {
        tracing::info!("later run");
    });

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.starts_with("earlier run\n"));
    assert!(contents.contains("later run"));
}

#[test]
#[serial]
fn unwritable_location_is_not_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "").unwrap();
    let path = blocker.join("jumpscare_log.txt");

    assert!(logging::file_appender(&path).is_none());
    tracing::subscriber::with_default(logging::subscriber(true, Some(&path), false), || {
        tracing::error!("still fine");
    });
}

#[test]
#[serial]
fn init_without_file_creates_no_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jumpscare_log.txt");

    logging::init(false, None, false);
    logging::init(false, None, false);
    tracing::info!("test");

    sleep(Duration::from_millis(100));

    assert!(!path.exists(), "log file should not be created");
}
