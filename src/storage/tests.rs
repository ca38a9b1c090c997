//! Tests for the storage backends.
//!
//! The contract checks run against every backend; layout checks pin down the
//! on-disk / in-store format other deployments depend on.

use super::*;
use std::fs;
use tempfile::TempDir;

fn fs_driver() -> (TempDir, FilesystemDriver) {
    let temp_dir = TempDir::new().unwrap();
    let driver = FilesystemDriver::new(temp_dir.path(), DEFAULT_PREFIX).unwrap();
    (temp_dir, driver)
}

fn kv_driver() -> KeyValueDriver<MemoryStore> {
    KeyValueDriver::with_default_prefix(MemoryStore::new())
}

fn check_owner_contract(driver: &dyn StorageDriver) {
    assert_eq!(driver.get_owner("name", "subject").unwrap(), None);

    driver.set_owner("name", "subject", 4242).unwrap();
    assert_eq!(driver.get_owner("name", "subject").unwrap(), Some(4242));

    driver.set_owner("name", "subject", 4343).unwrap();
    assert_eq!(driver.get_owner("name", "subject").unwrap(), Some(4343));

    driver.clear_owner("name", "subject").unwrap();
    assert_eq!(driver.get_owner("name", "subject").unwrap(), None);

    // Clearing twice is not an error.
    driver.clear_owner("name", "subject").unwrap();
}

fn check_threads_contract(driver: &dyn StorageDriver) {
    driver.set_threads("name", &[]).unwrap();
    assert!(driver.get_threads("name").unwrap().is_empty());

    driver.set_threads("name", &[1111, 2222]).unwrap();
    let mut threads = driver.get_threads("name").unwrap();
    threads.sort_unstable();
    assert_eq!(threads, vec![1111, 2222]);

    driver.set_threads("name", &[1111, 2222, 3333]).unwrap();
    let mut threads = driver.get_threads("name").unwrap();
    threads.sort_unstable();
    assert_eq!(threads, vec![1111, 2222, 3333]);

    driver.set_threads("name", &[]).unwrap();
    assert!(driver.get_threads("name").unwrap().is_empty());
}

fn check_subjects_contract(driver: &dyn StorageDriver) {
    assert!(driver.get_subjects("name").unwrap().is_empty());

    driver.set_owner("name", "subject-1", 11).unwrap();
    driver.set_owner("name", "subject-2", 22).unwrap();
    driver.set_owner("other", "subject-3", 33).unwrap();
    driver.set_threads("name", &[11, 22]).unwrap();

    let subjects: Vec<_> = driver.get_subjects("name").unwrap().into_iter().collect();
    assert_eq!(subjects, vec!["subject-1", "subject-2"]);

    driver.clear_owner("name", "subject-1").unwrap();
    let subjects: Vec<_> = driver.get_subjects("name").unwrap().into_iter().collect();
    assert_eq!(subjects, vec!["subject-2"]);
}

fn check_names_are_sanitized(driver: &dyn StorageDriver) {
    driver.set_owner("Convert Queue", "Video.MP4", 77).unwrap();

    assert_eq!(driver.get_owner("convert-queue", "video-mp4").unwrap(), Some(77));
    let subjects: Vec<_> = driver
        .get_subjects("CONVERT queue")
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(subjects, vec!["video-mp4"]);
}

#[test]
fn filesystem_owner_contract() {
    let (_temp_dir, driver) = fs_driver();
    check_owner_contract(&driver);
}

#[test]
fn filesystem_threads_contract() {
    let (_temp_dir, driver) = fs_driver();
    check_threads_contract(&driver);
}

#[test]
fn filesystem_subjects_contract() {
    let (_temp_dir, driver) = fs_driver();
    check_subjects_contract(&driver);
}

#[test]
fn filesystem_sanitizes_names() {
    let (_temp_dir, driver) = fs_driver();
    check_names_are_sanitized(&driver);
}

#[test]
fn kv_owner_contract() {
    check_owner_contract(&kv_driver());
}

#[test]
fn kv_threads_contract() {
    check_threads_contract(&kv_driver());
}

#[test]
fn kv_subjects_contract() {
    check_subjects_contract(&kv_driver());
}

#[test]
fn kv_sanitizes_names() {
    check_names_are_sanitized(&kv_driver());
}

#[test]
fn filesystem_layout_matches_documented_format() {
    let (temp_dir, driver) = fs_driver();

    driver.set_threads("convert", &[101, 102]).unwrap();
    driver.set_owner("convert", "video.mp4", 101).unwrap();

    let roster = temp_dir.path().join("proc-man-convert.loc");
    let owner = temp_dir.path().join("proc-man-convert-video-mp4.loc");
    assert_eq!(fs::read_to_string(&roster).unwrap(), "101\n102");
    assert_eq!(fs::read_to_string(&owner).unwrap(), "101");
    assert_eq!(driver.roster_path("convert"), roster);
    assert_eq!(driver.owner_path("convert", "video.mp4"), owner);
}

#[test]
fn filesystem_empty_roster_removes_file() {
    let (temp_dir, driver) = fs_driver();
    let roster = temp_dir.path().join("proc-man-convert.loc");

    driver.set_threads("convert", &[5]).unwrap();
    assert!(roster.exists());

    driver.set_threads("convert", &[]).unwrap();
    assert!(!roster.exists());
}

#[test]
fn filesystem_reads_tolerate_garbage() {
    let (temp_dir, driver) = fs_driver();
    fs::write(
        temp_dir.path().join("proc-man-convert.loc"),
        "101\r\n\nnot-a-pid\n0\n102\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("proc-man-convert-a.loc"), "garbage").unwrap();

    assert_eq!(driver.get_threads("convert").unwrap(), vec![101, 102]);
    assert_eq!(driver.get_owner("convert", "a").unwrap(), None);
}

#[test]
fn filesystem_prefix_isolates_deployments() {
    let temp_dir = TempDir::new().unwrap();
    let blue = FilesystemDriver::new(temp_dir.path(), "Blue Team").unwrap();
    let green = FilesystemDriver::new(temp_dir.path(), "green").unwrap();

    blue.set_threads("convert", &[1]).unwrap();
    blue.set_owner("convert", "x", 1).unwrap();

    assert!(green.get_threads("convert").unwrap().is_empty());
    assert!(green.get_subjects("convert").unwrap().is_empty());
    assert!(temp_dir.path().join("blue-team-convert.loc").exists());
}

#[test]
fn filesystem_extended_domain_roster_reads_as_subject() {
    let (_temp_dir, driver) = fs_driver();

    driver.set_threads("a-b", &[7]).unwrap();

    let subjects: Vec<_> = driver.get_subjects("a").unwrap().into_iter().collect();
    assert_eq!(subjects, vec!["b"]);
    assert_eq!(driver.get_owner("a", "b").unwrap(), Some(7));
    assert_eq!(driver.owner_path("a", "b"), driver.roster_path("a-b"));
}

#[test]
fn filesystem_mutex_file_outlives_records() {
    let (temp_dir, driver) = fs_driver();
    let mutex = temp_dir.path().join("proc-man-convert.mutex");

    {
        let _section = driver.exclusive("convert").unwrap();
        driver.set_threads("convert", &[5]).unwrap();
        driver.set_threads("convert", &[]).unwrap();
    }

    let names: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["proc-man-convert.mutex"]);
    assert_eq!(fs::metadata(&mutex).unwrap().len(), 0);
}

#[test]
fn filesystem_prefix_is_sanitized() {
    let temp_dir = TempDir::new().unwrap();
    let driver = FilesystemDriver::new(temp_dir.path(), "Nightly Jobs").unwrap();

    assert_eq!(driver.prefix(), "nightly-jobs");
    assert!(driver.describe().contains("nightly-jobs"));
}

#[test]
fn filesystem_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("locks").join("procman");

    let driver = FilesystemDriver::new(&dir, DEFAULT_PREFIX).unwrap();

    assert!(dir.is_dir());
    assert_eq!(driver.dir(), dir.as_path());
}

#[test]
fn filesystem_rejects_empty_prefix() {
    let temp_dir = TempDir::new().unwrap();
    assert!(FilesystemDriver::new(temp_dir.path(), "***").is_err());
}

#[test]
fn filesystem_exclusive_section_is_reentrant_after_drop() {
    let (temp_dir, driver) = fs_driver();

    let section = driver.exclusive("convert").unwrap();
    assert!(section.is_some());
    assert!(temp_dir.path().join("proc-man-convert.mutex").exists());
    drop(section);

    // The mutex file must not show up as a subject or a roster.
    assert!(driver.get_subjects("convert").unwrap().is_empty());
    assert!(driver.get_threads("convert").unwrap().is_empty());

    let again = driver.exclusive("convert").unwrap();
    assert!(again.is_some());
}

#[test]
fn filesystem_exclusive_section_serialises_threads() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let (_temp_dir, driver) = fs_driver();
    let inside = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    // flock locks belong to the open file description, so separate handles
    // opened by separate threads exclude each other like separate processes.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let driver = driver.clone();
            let inside = Arc::clone(&inside);
            let overlaps = Arc::clone(&overlaps);
            std::thread::spawn(move || {
                for _ in 0..5 {
                    let _section = driver.exclusive("convert").unwrap();
                    if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn kv_layout_matches_documented_format() {
    let store = MemoryStore::new();
    let driver = KeyValueDriver::new(store.clone(), "proc-man").unwrap();

    driver.set_threads("convert", &[101, 102]).unwrap();
    driver.set_owner("convert", "video.mp4", 101).unwrap();

    assert_eq!(
        store.get("proc-man:convert").unwrap().as_deref(),
        Some("101,102")
    );
    assert_eq!(
        store.get("proc-man:convert:video-mp4").unwrap().as_deref(),
        Some("101")
    );

    driver.set_threads("convert", &[]).unwrap();
    assert_eq!(store.get("proc-man:convert").unwrap(), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn kv_subject_scan_ignores_similar_domains() {
    let driver = kv_driver();

    driver.set_owner("convert", "a", 1).unwrap();
    driver.set_owner("convert-x", "b", 2).unwrap();
    driver.set_threads("convert-x", &[2]).unwrap();

    let subjects: Vec<_> = driver.get_subjects("convert").unwrap().into_iter().collect();
    assert_eq!(subjects, vec!["a"]);
}

#[test]
fn kv_driver_exposes_store_and_prefix() {
    let driver = KeyValueDriver::new(MemoryStore::new(), "Nightly Jobs").unwrap();
    assert_eq!(driver.prefix(), "nightly-jobs");

    driver.set_owner("convert", "a", 9).unwrap();
    assert_eq!(
        driver.store().get("nightly-jobs:convert:a").unwrap().as_deref(),
        Some("9")
    );
    assert_eq!(kv_driver().prefix(), DEFAULT_PREFIX);
}

#[test]
fn kv_has_no_exclusive_section() {
    assert!(kv_driver().exclusive("convert").unwrap().is_none());
}

#[test]
fn memory_store_keys_use_glob_patterns() {
    let store = MemoryStore::new();
    store.set("p:d:one", "1").unwrap();
    store.set("p:d:two", "2").unwrap();
    store.set("p:e:three", "3").unwrap();

    let mut keys = store.keys("p:d:*").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["p:d:one", "p:d:two"]);
}

#[test]
fn boxed_driver_delegates() {
    let boxed: Box<dyn StorageDriver> = Box::new(kv_driver());
    boxed.set_owner("d", "s", 9).unwrap();
    assert_eq!(boxed.get_owner("d", "s").unwrap(), Some(9));
    assert!(boxed.describe().contains("proc-man"));
}

#[test]
fn format_and_parse_roster() {
    assert_eq!(format_roster(&[3, 0, 4], ","), "3,4");
    assert_eq!(parse_roster("3,,x,4", ','), vec![3, 4]);
    assert_eq!(parse_pid(" 12 \n"), Some(12));
    assert_eq!(parse_pid("0"), None);
}
