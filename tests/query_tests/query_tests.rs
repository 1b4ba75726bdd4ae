//! Query Tests
//!
//! Prefix and exact matching, both as pure matchers and as engine scans.

use slotdb::query::{check_arity, exact_match, prefix_match, trim_padding};
use slotdb::{Config, DbError, Engine, Field, Operator, Schema};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn criteria(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

/// Fred/Paris, (deleted), Fred/Oslo, Freddy/Rome
fn setup_hotels() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("hotels.db"))
        .build();
    let schema = Schema::new(vec![Field::new("name", 10), Field::new("loc", 10)]).unwrap();
    let engine = Engine::create_new(config, schema).unwrap();

    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    engine.create(&strings(&["Wilma", "Rome"])).unwrap();
    engine.create(&strings(&["Fred", "Oslo"])).unwrap();
    engine.create(&strings(&["Freddy", "Rome"])).unwrap();

    let cookie = engine.lock(2).unwrap();
    engine.delete(2, cookie).unwrap();

    (temp_dir, engine)
}

// =============================================================================
// Matcher Tests
// =============================================================================

#[test]
fn test_prefix_match() {
    let record = strings(&["Freddy", "Rome"]);

    assert!(prefix_match(&record, &criteria(&[Some("Fred"), None])));
    assert!(prefix_match(&record, &criteria(&[Some(""), Some("Ro")])));
    assert!(!prefix_match(&record, &criteria(&[Some("fred"), None])));
    assert!(!prefix_match(&record, &criteria(&[Some("Fred"), Some("Oslo")])));
}

#[test]
fn test_all_null_criteria_match_everything() {
    let record = strings(&["Anything", "Anywhere"]);
    let all_null = criteria(&[None, None]);

    assert!(prefix_match(&record, &all_null));
    assert!(exact_match(&record, &all_null, Operator::And));
}

#[test]
fn test_all_null_or_matches_nothing() {
    let record = strings(&["Anything", "Anywhere"]);

    assert!(!exact_match(&record, &criteria(&[None, None]), Operator::Or));
}

#[test]
fn test_exact_and() {
    let record = strings(&["Fred", "Paris"]);

    assert!(exact_match(&record, &criteria(&[Some("Fred"), Some("Paris")]), Operator::And));
    assert!(exact_match(&record, &criteria(&[Some("Fred"), None]), Operator::And));
    assert!(!exact_match(&record, &criteria(&[Some("Fre"), None]), Operator::And));
    assert!(!exact_match(&record, &criteria(&[Some("Fred"), Some("Oslo")]), Operator::And));
}

#[test]
fn test_exact_or() {
    let record = strings(&["Fred", "Paris"]);

    assert!(exact_match(&record, &criteria(&[Some("Nobody"), Some("Paris")]), Operator::Or));
    assert!(!exact_match(&record, &criteria(&[Some("Nobody"), Some("Oslo")]), Operator::Or));
}

#[test]
fn test_exact_trims_stored_value_only() {
    let record = strings(&["  Fred  ", "Paris\t"]);

    assert!(exact_match(&record, &criteria(&[Some("Fred"), Some("Paris")]), Operator::And));
    // Criteria are not trimmed
    assert!(!exact_match(&record, &criteria(&[Some(" Fred"), None]), Operator::And));
}

#[test]
fn test_trim_padding() {
    assert_eq!(trim_padding("  Fred \u{1}"), "Fred");
    assert_eq!(trim_padding("Fred Flint"), "Fred Flint");
    assert_eq!(trim_padding("   "), "");
}

#[test]
fn test_check_arity() {
    assert!(check_arity(2, &criteria(&[None, None])).is_ok());
    assert!(matches!(
        check_arity(2, &criteria(&[None])),
        Err(DbError::FieldCount {
            expected: 2,
            actual: 1
        })
    ));
}

// =============================================================================
// Engine Scan Tests
// =============================================================================

#[test]
fn test_find_prefix_skips_deleted() {
    let (_temp, engine) = setup_hotels();

    let result = engine.find(&criteria(&[Some("Fred"), None])).unwrap();

    assert_eq!(result, vec![1, 3, 4]);
}

#[test]
fn test_find_all_null_returns_every_live_record() {
    let (_temp, engine) = setup_hotels();

    let result = engine.find(&criteria(&[None, None])).unwrap();

    assert_eq!(result, vec![1, 3, 4]);
}

#[test]
fn test_find_exact_and() {
    let (_temp, engine) = setup_hotels();

    let result = engine
        .find_exact(&criteria(&[Some("Fred"), None]), Operator::And)
        .unwrap();
    assert_eq!(result, vec![1, 3]);

    let result = engine
        .find_exact(&criteria(&[Some("Fred"), Some("Oslo")]), Operator::And)
        .unwrap();
    assert_eq!(result, vec![3]);
}

#[test]
fn test_find_exact_or() {
    let (_temp, engine) = setup_hotels();

    let result = engine
        .find_exact(&criteria(&[Some("Freddy"), Some("Paris")]), Operator::Or)
        .unwrap();

    assert_eq!(result, vec![1, 4]);
}

#[test]
fn test_find_exact_deleted_record_never_matches() {
    let (_temp, engine) = setup_hotels();

    let result = engine
        .find_exact(&criteria(&[Some("Wilma"), None]), Operator::And)
        .unwrap();

    assert!(result.is_empty());
}

#[test]
fn test_find_wrong_arity() {
    let (_temp, engine) = setup_hotels();

    let result = engine.find(&criteria(&[Some("Fred")]));
    assert!(matches!(result, Err(DbError::FieldCount { .. })));

    let result = engine.find_exact(&criteria(&[None, None, None]), Operator::Or);
    assert!(matches!(result, Err(DbError::FieldCount { .. })));
}

#[test]
fn test_find_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("empty.db"))
        .build();
    let schema = Schema::new(vec![Field::new("name", 10)]).unwrap();
    let engine = Engine::create_new(config, schema).unwrap();

    assert!(engine.find(&criteria(&[None])).unwrap().is_empty());
}
