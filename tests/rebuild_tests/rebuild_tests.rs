//! Tests for list compaction
//!
//! These tests verify:
//! - Rebuild preserves the sequence
//! - Rebuilt files use contiguous slots with the root first
//! - Rebuild is idempotent
//! - A failed rebuild leaves the original file in place and no temp file
//! - rebuild_on_close compacts on close and on drop

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use btree_list::{BTreeList, Config};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(rebuild_on_close: bool) -> Config {
    Config::builder()
        .order(2)
        .growth_batch(16)
        .rebuild_on_close(rebuild_on_close)
        .build()
}

/// A list with holes: many nodes freed by extracts after a large build
fn setup_fragmented_list(rebuild_on_close: bool) -> (TempDir, BTreeList<u32>, Vec<u32>) {
    let temp_dir = TempDir::new().unwrap();
    let mut list = BTreeList::create_from_iter(
        temp_dir.path().join("frag.btl"),
        config(rebuild_on_close),
        0..400,
    )
    .unwrap();

    let mut model: Vec<u32> = (0..400).collect();
    for i in 0..300 {
        let index = (i * 31) % model.len();
        model.remove(index);
        list.extract(index as u64).unwrap();
    }

    (temp_dir, list, model)
}

fn dir_entries(dir: &Path) -> Vec<std::ffi::OsString> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Rebuild Tests
// =============================================================================

#[test]
fn test_rebuild_preserves_sequence() {
    let (_temp, mut list, model) = setup_fragmented_list(false);

    list.rebuild().unwrap();

    assert_eq!(list.to_vec().unwrap(), model);
    list.verify().unwrap();
}

#[test]
fn test_rebuild_packs_slots() {
    let (_temp, mut list, _model) = setup_fragmented_list(false);
    let before = list.stats();
    assert!(before.allocated_slots > before.live_slots);

    list.rebuild().unwrap();

    let stats = list.verify().unwrap();
    let after = list.stats();
    assert_eq!(stats.max_slot + 1, stats.node_count);
    assert_eq!(after.allocated_slots, after.live_slots);
    assert_eq!(after.capacity_slots, after.live_slots);
    assert!(after.file_bytes < before.file_bytes);
}

#[test]
fn test_rebuild_is_idempotent() {
    let (_temp, mut list, model) = setup_fragmented_list(false);

    list.rebuild().unwrap();
    let first = (list.verify().unwrap(), list.stats());
    list.rebuild().unwrap();
    let second = (list.verify().unwrap(), list.stats());

    assert_eq!(first, second);
    assert_eq!(list.to_vec().unwrap(), model);
}

#[test]
fn test_list_keeps_working_after_rebuild() {
    let (_temp, mut list, mut model) = setup_fragmented_list(false);
    list.rebuild().unwrap();

    for v in 0..50 {
        model.insert(v as usize, 5000 + v);
        list.insert(v as u64, 5000 + v).unwrap();
    }
    model.remove(3);
    list.extract(3).unwrap();

    assert_eq!(list.to_vec().unwrap(), model);
    list.verify().unwrap();
}

#[test]
fn test_rebuild_of_empty_list() {
    let temp_dir = TempDir::new().unwrap();
    let mut list: BTreeList<u32> =
        BTreeList::create(temp_dir.path().join("empty.btl"), config(false)).unwrap();

    list.rebuild().unwrap();

    let stats = list.verify().unwrap();
    assert_eq!(stats.node_count, 1);
    assert!(list.is_empty());
}

#[test]
fn test_rebuild_leaves_no_temp_file() {
    let (temp, mut list, _model) = setup_fragmented_list(false);

    list.rebuild().unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("frag.btl")]);
}

// =============================================================================
// Rebuild On Close Tests
// =============================================================================

#[test]
fn test_rebuild_on_close() {
    let (temp, list, model) = setup_fragmented_list(true);
    let path = temp.path().join("frag.btl");
    let fragmented_len = list.stats().file_bytes;

    list.close().unwrap();

    assert!(fs::metadata(&path).unwrap().len() < fragmented_len);
    let reopened: BTreeList<u32> = BTreeList::open(&path, config(false)).unwrap();
    let stats = reopened.verify().unwrap();
    assert_eq!(stats.max_slot + 1, stats.node_count);
    assert_eq!(reopened.to_vec().unwrap(), model);
}

#[test]
fn test_rebuild_on_drop() {
    let (temp, list, model) = setup_fragmented_list(true);
    let path = temp.path().join("frag.btl");

    drop(list);

    let reopened: BTreeList<u32> = BTreeList::open(&path, config(false)).unwrap();
    let stats = reopened.stats();
    assert_eq!(stats.allocated_slots, stats.live_slots);
    assert_eq!(reopened.to_vec().unwrap(), model);
}

#[test]
fn test_close_without_rebuild_keeps_free_slots() {
    let (temp, list, _model) = setup_fragmented_list(false);
    let path = temp.path().join("frag.btl");
    let before = list.stats();

    list.close().unwrap();

    let reopened: BTreeList<u32> = BTreeList::open(&path, config(false)).unwrap();
    assert_eq!(reopened.stats(), before);
}

#[test]
fn test_changes_after_rebuild_reach_the_file() {
    let (temp, mut list, mut model) = setup_fragmented_list(false);
    let path = temp.path().join("frag.btl");

    list.rebuild().unwrap();
    assert_eq!(list.path(), path.as_path());

    list.insert(0, 1000).unwrap();
    model.insert(0, 1000);
    list.set(50, 2000).unwrap();
    model[50] = 2000;
    list.close().unwrap();

    let reopened: BTreeList<u32> = BTreeList::open(&path, config(false)).unwrap();
    assert_eq!(reopened.to_vec().unwrap(), model);
}

// =============================================================================
// Failed Rebuild Tests
// =============================================================================

#[test]
fn test_failed_rebuild_removes_temp_file() {
    let (temp, mut list, model) = setup_fragmented_list(false);
    let path = temp.path().join("frag.btl");

    // Packed layout: 4 KiB header, 4 KiB blocks, root in slot 0 and its
    // first child in slot 1.
    list.rebuild().unwrap();
    list.flush().unwrap();
    let before = list.stats();

    // Top byte of slot 1's element count: the child can no longer be read
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(2 * 4096 + 7)).unwrap();
    file.write_all(&[0xFF]).unwrap();
    drop(file);

    assert!(list.rebuild().is_err());

    assert_eq!(dir_entries(temp.path()), vec![std::ffi::OsString::from("frag.btl")]);
    assert_eq!(list.path(), path.as_path());
    assert_eq!(list.stats(), before);
    assert_eq!(list.len(), model.len() as u64);
}

