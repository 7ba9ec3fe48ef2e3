//! Tests for list file persistence
//!
//! These tests verify:
//! - Round trips through close / reopen
//! - Drop persists like close
//! - Detection of corrupt, truncated and incompatible files
//! - Bulk constructors

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use btree_list::{BTreeList, Config, ListError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(order: usize) -> Config {
    Config::builder().order(order).growth_batch(4).build()
}

fn setup_saved_list(values: impl IntoIterator<Item = u64>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("saved.btl");

    let list = BTreeList::create_from_iter(&path, config(3), values).unwrap();
    list.close().unwrap();

    (temp_dir, path)
}

fn overwrite_byte(path: &Path, offset: u64, value: u8) {
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[value]).unwrap();
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_preserves_sequence() {
    let values: Vec<u64> = (0..500).map(|v| v * v).collect();
    let (_temp, path) = setup_saved_list(values.clone());

    let list: BTreeList<u64> = BTreeList::open(&path, config(3)).unwrap();

    assert_eq!(list.len(), 500);
    assert_eq!(list.to_vec().unwrap(), values);
    list.verify().unwrap();
}

#[test]
fn test_changes_after_reopen_persist() {
    let (_temp, path) = setup_saved_list(0..100);

    {
        let mut list: BTreeList<u64> = BTreeList::open(&path, config(3)).unwrap();
        list.extract(0).unwrap();
        list.insert(50, 9999).unwrap();
        list.set(10, 7).unwrap();
        list.close().unwrap();
    }

    let list: BTreeList<u64> = BTreeList::open(&path, config(3)).unwrap();
    let mut expected: Vec<u64> = (1..100).collect();
    expected.insert(50, 9999);
    expected[10] = 7;

    assert_eq!(list.to_vec().unwrap(), expected);
    list.verify().unwrap();
}

#[test]
fn test_drop_persists_like_close() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dropped.btl");

    {
        let mut list: BTreeList<u64> = BTreeList::open(&path, config(2)).unwrap();
        for v in 0..40 {
            list.push(v).unwrap();
        }
    }

    let list: BTreeList<u64> = BTreeList::open(&path, config(2)).unwrap();
    assert_eq!(list.to_vec().unwrap(), (0..40).collect::<Vec<_>>());
}

#[test]
fn test_open_creates_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fresh.btl");

    let list: BTreeList<u32> = BTreeList::open_or_create(&path, 4).unwrap();

    assert!(path.exists());
    assert!(list.is_empty());
    assert_eq!(list.config().order, 4);
}

#[test]
fn test_create_replaces_existing_file() {
    let (_temp, path) = setup_saved_list(0..10);

    let list: BTreeList<u64> = BTreeList::create(&path, config(3)).unwrap();

    assert!(list.is_empty());
}

// =============================================================================
// Bulk Constructor Tests
// =============================================================================

#[test]
fn test_create_with_size_uses_default() {
    let temp_dir = TempDir::new().unwrap();

    let list: BTreeList<i32> =
        BTreeList::create_with_size(temp_dir.path().join("zeros.btl"), config(3), 77).unwrap();

    assert_eq!(list.len(), 77);
    assert!(list.iter().all(|v| v.unwrap() == 0));
    list.verify().unwrap();
}

#[test]
fn test_create_filled() {
    let temp_dir = TempDir::new().unwrap();

    let list: BTreeList<[u8; 3]> =
        BTreeList::create_filled(temp_dir.path().join("filled.btl"), config(2), 12, *b"abc")
            .unwrap();

    assert_eq!(list.to_vec().unwrap(), vec![*b"abc"; 12]);
}

#[test]
fn test_tuple_elements_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pairs.btl");
    let pairs: Vec<(u32, f64)> = (0..30).map(|v| (v, v as f64 / 2.0)).collect();

    BTreeList::create_from_iter(&path, config(3), pairs.clone())
        .unwrap()
        .close()
        .unwrap();

    let list: BTreeList<(u32, f64)> = BTreeList::open(&path, config(3)).unwrap();
    assert_eq!(list.to_vec().unwrap(), pairs);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_open_rejects_other_element_type() {
    let (_temp, path) = setup_saved_list(0..10);

    let result: btree_list::Result<BTreeList<u32>> = BTreeList::open(&path, config(3));

    assert!(matches!(result, Err(ListError::Incompatible(_))));
}

#[test]
fn test_open_rejects_other_order() {
    let (_temp, path) = setup_saved_list(0..10);

    let result: btree_list::Result<BTreeList<u64>> = BTreeList::open(&path, config(5));

    assert!(matches!(result, Err(ListError::Incompatible(_))));
}

#[test]
fn test_open_rejects_bad_magic() {
    let (_temp, path) = setup_saved_list(0..10);
    overwrite_byte(&path, 0, b'X');

    let result: btree_list::Result<BTreeList<u64>> = BTreeList::open(&path, config(3));

    assert!(matches!(result, Err(ListError::CorruptFile(_))));
}

#[test]
fn test_open_detects_header_bit_flip() {
    let (_temp, path) = setup_saved_list(0..10);
    // Inside total_size
    overwrite_byte(&path, 54, 0xFF);

    let result: btree_list::Result<BTreeList<u64>> = BTreeList::open(&path, config(3));

    match result {
        Err(ListError::CorruptFile(msg)) => assert!(msg.contains("checksum")),
        other => panic!("expected checksum failure, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn test_open_rejects_truncated_file() {
    let (_temp, path) = setup_saved_list(0..200);

    let file = OpenOptions::new().write(true).open(&path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len / 2).unwrap();
    drop(file);

    let result: btree_list::Result<BTreeList<u64>> = BTreeList::open(&path, config(3));

    assert!(matches!(result, Err(ListError::CorruptFile(_))));
}

#[test]
fn test_open_rejects_tiny_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tiny.btl");
    fs::write(&path, b"BTLS").unwrap();

    let result: btree_list::Result<BTreeList<u64>> = BTreeList::open(&path, config(3));

    assert!(matches!(result, Err(ListError::CorruptFile(_))));
}

#[test]
fn test_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let bad = Config::builder().order(1).build();

    let result: btree_list::Result<BTreeList<u64>> =
        BTreeList::open(temp_dir.path().join("bad.btl"), bad);

    assert!(matches!(result, Err(ListError::Config(_))));
}
