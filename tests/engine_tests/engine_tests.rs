//! Tests for Engine
//!
//! These tests verify:
//! - Record operations (read/create/update/delete)
//! - Lock authorization of mutations
//! - Command execution through the `Database` trait
//! - Engine lifecycle (create/open/close)

use std::fs;
use std::path::Path;

use slotdb::protocol::{Command, Reply};
use slotdb::{Config, Cookie, Database, DbError, Engine, Field, FieldOverflow, LockFault, Schema};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn hotel_schema() -> Schema {
    Schema::new(vec![Field::new("name", 10), Field::new("loc", 10)]).unwrap()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn setup_with_policy(policy: FieldOverflow) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("hotels.db"))
        .field_overflow(policy)
        .build();
    let engine = Engine::create_new(config, hotel_schema()).unwrap();
    (temp_dir, engine)
}

fn setup_temp_engine() -> (TempDir, Engine) {
    setup_with_policy(FieldOverflow::Reject)
}

/// Three records, the second one deleted
fn setup_with_deleted_record() -> (TempDir, Engine) {
    let (temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    engine.create(&strings(&["Wilma", "Rome"])).unwrap();
    engine.create(&strings(&["Fred", "Oslo"])).unwrap();

    let cookie = engine.lock(2).unwrap();
    engine.delete(2, cookie).unwrap();
    (temp, engine)
}

fn file_bytes(engine: &Engine) -> Vec<u8> {
    fs::read(&engine.config().db_path).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_create_new_then_reopen() {
    let (temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    engine.close().unwrap();

    let engine = Engine::open_path(&temp.path().join("hotels.db")).unwrap();

    assert_eq!(**engine.schema(), hotel_schema());
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Paris"]));
}

#[test]
fn test_open_missing_file() {
    let result = Engine::open_path(Path::new("/definitely/not/here.db"));
    assert!(matches!(result, Err(DbError::Io(_))));
}

#[test]
fn test_open_foreign_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("foreign.db");
    fs::write(&path, b"PK\x03\x04 definitely a zip").unwrap();

    let result = Engine::open_path(&path);
    assert!(matches!(result, Err(DbError::InvalidFormat(_))));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_create_and_read() {
    let (_temp, engine) = setup_temp_engine();

    let rec_no = engine.create(&strings(&["Fred", "Paris"])).unwrap();

    assert_eq!(rec_no, 1);
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Paris"]));
    assert_eq!(engine.record_count(), 1);
}

#[test]
fn test_create_does_not_lock() {
    let (_temp, engine) = setup_temp_engine();

    let rec_no = engine.create(&strings(&["Fred", "Paris"])).unwrap();

    assert!(!engine.is_locked(rec_no));
}

#[test]
fn test_read_deleted_record() {
    let (_temp, engine) = setup_with_deleted_record();

    assert!(matches!(engine.read(2), Err(DbError::RecordNotFound(2))));
}

#[test]
fn test_read_out_of_range() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();

    assert!(matches!(engine.read(0), Err(DbError::RecordNotFound(0))));
    assert!(matches!(engine.read(99), Err(DbError::RecordNotFound(99))));
}

#[test]
fn test_create_wrong_arity() {
    let (_temp, engine) = setup_temp_engine();

    let result = engine.create(&strings(&["Fred"]));

    assert!(matches!(result, Err(DbError::FieldCount { .. })));
    assert_eq!(engine.record_count(), 0);
}

#[test]
fn test_create_reuses_deleted_slot() {
    let (_temp, engine) = setup_with_deleted_record();

    let rec_no = engine.create(&strings(&["Barney", "Lima"])).unwrap();

    assert_eq!(rec_no, 2);
    assert_eq!(engine.record_count(), 3);
    assert_eq!(engine.read(2).unwrap(), strings(&["Barney", "Lima"]));
}

#[test]
fn test_visible_count_drift() {
    let (temp, engine) = setup_with_deleted_record();
    assert_eq!(engine.visible_count(), 2);

    engine.create(&strings(&["Barney", "Lima"])).unwrap();

    // Three live records, but the deleted counter was not decremented
    assert_eq!(engine.visible_count(), 2);
    engine.close().unwrap();

    let engine = Engine::open_path(&temp.path().join("hotels.db")).unwrap();
    assert_eq!(engine.visible_count(), 3);
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_with_lock() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();

    let cookie = engine.lock(1).unwrap();
    engine.update(1, &strings(&["Fred", "Berlin"]), cookie).unwrap();
    engine.unlock(1, cookie).unwrap();

    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Berlin"]));
}

#[test]
fn test_update_shorter_value_clears_old_bytes() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Frederick", "Paris"])).unwrap();

    let cookie = engine.lock(1).unwrap();
    engine.update(1, &strings(&["Al", "Rome"]), cookie).unwrap();

    assert_eq!(engine.read(1).unwrap(), strings(&["Al", "Rome"]));
}

#[test]
fn test_update_with_wrong_cookie_leaves_record_unchanged() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();
    let before = file_bytes(&engine);

    let wrong = Cookie::from_raw(cookie.as_raw().wrapping_add(1));
    let result = engine.update(1, &strings(&["Evil", "Nowhere"]), wrong);

    match result {
        Err(DbError::LockOwnership { rec_no, fault }) => {
            assert_eq!(rec_no, 1);
            assert_eq!(fault, LockFault::CookieMismatch);
        }
        other => panic!("Expected LockOwnership, got {:?}", other),
    }
    assert_eq!(file_bytes(&engine), before);
    assert!(engine.is_locked(1));
}

#[test]
fn test_update_without_lock() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();

    let result = engine.update(1, &strings(&["Evil", "Nowhere"]), Cookie::from_raw(7));

    assert!(matches!(
        result,
        Err(DbError::LockOwnership {
            fault: LockFault::NotLocked,
            ..
        })
    ));
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Paris"]));
}

#[test]
fn test_update_deleted_record() {
    let (_temp, engine) = setup_with_deleted_record();

    let result = engine.update(2, &strings(&["A", "B"]), Cookie::from_raw(1));

    assert!(matches!(result, Err(DbError::RecordNotFound(2))));
}

#[test]
fn test_update_overflow_rejected() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();

    let result = engine.update(1, &strings(&["A name far too long", "Paris"]), cookie);

    assert!(matches!(result, Err(DbError::FieldTooLong { .. })));
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Paris"]));
}

#[test]
fn test_update_overflow_truncated() {
    let (_temp, engine) = setup_with_policy(FieldOverflow::Truncate);
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();

    engine
        .update(1, &strings(&["A name far too long", "Paris"]), cookie)
        .unwrap();

    assert_eq!(engine.read(1).unwrap(), strings(&["A name far", "Paris"]));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_releases_lock() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();

    engine.delete(1, cookie).unwrap();

    assert!(!engine.is_locked(1));
    assert_eq!(engine.locked_count(), 0);
    assert!(matches!(engine.lock(1), Err(DbError::RecordNotFound(1))));
}

#[test]
fn test_delete_with_wrong_cookie() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();

    let wrong = Cookie::from_raw(cookie.as_raw() ^ 0xFF);
    let result = engine.delete(1, wrong);

    assert!(matches!(result, Err(DbError::LockOwnership { .. })));
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Paris"]));
}

#[test]
fn test_delete_twice() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();
    let cookie = engine.lock(1).unwrap();
    engine.delete(1, cookie).unwrap();

    assert!(matches!(
        engine.delete(1, cookie),
        Err(DbError::RecordNotFound(1))
    ));
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_read() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();

    let reply = engine.execute(Command::Read { rec_no: 1 }).unwrap();

    assert_eq!(reply, Reply::Record(strings(&["Fred", "Paris"])));
}

#[test]
fn test_execute_lock_update_unlock() {
    let (_temp, engine) = setup_temp_engine();
    engine.create(&strings(&["Fred", "Paris"])).unwrap();

    let cookie = match engine.execute(Command::Lock { rec_no: 1 }).unwrap() {
        Reply::Locked(cookie) => cookie,
        other => panic!("Expected Locked, got {:?}", other),
    };

    let reply = engine
        .execute(Command::Update {
            rec_no: 1,
            fields: strings(&["Fred", "Oslo"]),
            cookie,
        })
        .unwrap();
    assert_eq!(reply, Reply::Done);

    let reply = engine
        .execute(Command::Unlock { rec_no: 1, cookie })
        .unwrap();
    assert_eq!(reply, Reply::Done);
    assert_eq!(engine.read(1).unwrap(), strings(&["Fred", "Oslo"]));
}

#[test]
fn test_execute_schema_and_ping() {
    let (_temp, engine) = setup_temp_engine();

    let reply = engine.execute(Command::Schema).unwrap();
    assert_eq!(reply, Reply::Schema(hotel_schema().fields().to_vec()));

    assert_eq!(engine.execute(Command::Ping).unwrap(), Reply::Pong);
}

#[test]
fn test_execute_create_reports_number() {
    let (_temp, engine) = setup_with_deleted_record();

    let reply = engine
        .execute(Command::Create {
            fields: strings(&["Barney", "Lima"]),
        })
        .unwrap();

    assert_eq!(reply, Reply::Created(2));
}
