//! Tests for BTreeList positional operations
//!
//! These tests verify:
//! - Insert / extract / get / set against expected sequences
//! - Split and merge behavior across several tree heights
//! - Empty-list boundaries
//! - Vec-style panics on out-of-range positions

use btree_list::{BTreeList, Config};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn small_config(order: usize) -> Config {
    Config::builder().order(order).growth_batch(8).build()
}

fn setup_temp_list(order: usize) -> (TempDir, BTreeList<i64>) {
    let temp_dir = TempDir::new().unwrap();
    let list = BTreeList::create(temp_dir.path().join("list.btl"), small_config(order)).unwrap();
    (temp_dir, list)
}

fn setup_list_from(order: usize, values: impl IntoIterator<Item = i64>) -> (TempDir, BTreeList<i64>) {
    let temp_dir = TempDir::new().unwrap();
    let list =
        BTreeList::create_from_iter(temp_dir.path().join("list.btl"), small_config(order), values)
            .unwrap();
    (temp_dir, list)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_list_is_empty() {
    let (_temp, list) = setup_temp_list(3);

    assert_eq!(list.len(), 0);
    assert!(list.is_empty());
    assert!(list.to_vec().unwrap().is_empty());

    let stats = list.verify().unwrap();
    assert_eq!(stats.height, 1);
    assert_eq!(stats.node_count, 1);
}

#[test]
fn test_push_get() {
    let (_temp, mut list) = setup_temp_list(3);

    for v in 0..100 {
        list.push(v * 10).unwrap();
    }

    assert_eq!(list.len(), 100);
    for i in 0..100 {
        assert_eq!(list.get(i).unwrap(), i as i64 * 10);
    }
    list.verify().unwrap();
}

#[test]
fn test_insert_front_reverses() {
    let (_temp, mut list) = setup_temp_list(2);

    for v in 0..50 {
        list.insert(0, v).unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), (0..50).rev().collect::<Vec<_>>());
    list.verify().unwrap();
}

#[test]
fn test_insert_middle() {
    let (_temp, mut list) = setup_list_from(3, [1, 2, 4, 5]);

    list.insert(2, 3).unwrap();

    assert_eq!(list.to_vec().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_set_returns_previous_value() {
    let (_temp, mut list) = setup_list_from(3, 0..30);

    let old = list.set(17, -17).unwrap();

    assert_eq!(old, 17);
    assert_eq!(list.get(17).unwrap(), -17);
    assert_eq!(list.len(), 30);
}

#[test]
fn test_set_every_position_across_levels() {
    let (_temp, mut list) = setup_list_from(2, 0..64);

    for i in 0..64 {
        list.set(i, 1000 + i as i64).unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), (1000..1064).collect::<Vec<_>>());
    list.verify().unwrap();
}

#[test]
fn test_element_mut_edits_in_place() {
    let (_temp, mut list) = setup_list_from(3, 0..40);

    {
        let mut element = list.element_mut(25).unwrap();
        let value = element.get();
        element.set(value * 2);
    }

    assert_eq!(list.get(25).unwrap(), 50);
    assert_eq!(list.len(), 40);
}

#[test]
fn test_iter_matches_get() {
    let (_temp, list) = setup_list_from(3, (0..200).map(|v| v * 3));

    let collected: Vec<i64> = list.iter().map(|v| v.unwrap()).collect();
    let reversed: Vec<i64> = list.iter().rev().map(|v| v.unwrap()).collect();

    assert_eq!(collected.len(), 200);
    assert_eq!(collected[199], 597);
    assert_eq!(reversed.first(), collected.last());
}

// =============================================================================
// Extract Tests
// =============================================================================

#[test]
fn test_extract_scenario_order_three() {
    let (_temp, mut list) = setup_list_from(3, 1..=13);

    let positions = [5, 0, 6, 0, 1, 1, 0, 0, 2, 2, 0, 0];
    let extracted: Vec<i64> = positions
        .iter()
        .map(|&i| {
            let value = list.extract(i).unwrap();
            list.verify().unwrap();
            value
        })
        .collect();

    assert_eq!(extracted, vec![6, 1, 9, 2, 4, 5, 3, 7, 11, 12, 8, 10]);
    assert_eq!(list.len(), 1);
    assert_eq!(list.get(0).unwrap(), 13);
}

#[test]
fn test_insert_then_extract_on_empty_list() {
    let (_temp, mut list) = setup_temp_list(3);

    list.insert(0, 42).unwrap();
    assert_eq!(list.extract(0).unwrap(), 42);

    assert!(list.is_empty());
    let stats = list.verify().unwrap();
    assert_eq!(stats.node_count, 1);
    assert_eq!(stats.element_count, 0);
}

#[test]
fn test_extract_everything_from_back() {
    let (_temp, mut list) = setup_list_from(2, 0..100);

    for expected in (0..100).rev() {
        let last = list.len() - 1;
        assert_eq!(list.extract(last).unwrap(), expected);
    }

    assert!(list.is_empty());
    assert_eq!(list.stats().live_slots, 1);
}

#[test]
fn test_extract_internal_elements() {
    let (_temp, mut list) = setup_list_from(2, 0..31);
    let mut model: Vec<i64> = (0..31).collect();

    // Middle positions hit separators in internal nodes as well as leaves.
    for _ in 0..20 {
        let index = model.len() / 2;
        assert_eq!(list.extract(index as u64).unwrap(), model.remove(index));
        list.verify().unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), model);
}

#[test]
fn test_mixed_growth_and_shrink() {
    let (_temp, mut list) = setup_temp_list(3);
    let mut model = Vec::new();

    for round in 0..5i64 {
        for v in 0..60 {
            let index = (v as usize * 13 + round as usize) % (model.len() + 1);
            model.insert(index, round * 100 + v);
            list.insert(index as u64, round * 100 + v).unwrap();
        }
        for v in 0..40 {
            let index = (v * 7) % model.len();
            assert_eq!(list.extract(index as u64).unwrap(), model.remove(index));
        }
        list.verify().unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), model);
}

// =============================================================================
// Bounds Tests
// =============================================================================

#[test]
#[should_panic(expected = "insertion index (is 2) should be <= len (is 1)")]
fn test_insert_past_end_panics() {
    let (_temp, mut list) = setup_list_from(3, [7]);
    let _ = list.insert(2, 1);
}

#[test]
#[should_panic(expected = "removal index (is 0) should be < len (is 0)")]
fn test_extract_from_empty_panics() {
    let (_temp, mut list) = setup_temp_list(3);
    let _ = list.extract(0);
}

#[test]
#[should_panic(expected = "index out of bounds: the len is 3 but the index is 3")]
fn test_get_out_of_range_panics() {
    let (_temp, list) = setup_list_from(3, [1, 2, 3]);
    let _ = list.get(3);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn test_set_out_of_range_panics() {
    let (_temp, mut list) = setup_list_from(3, [1, 2, 3]);
    let _ = list.set(10, 0);
}
