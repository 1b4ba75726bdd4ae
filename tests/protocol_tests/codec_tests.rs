//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use slotdb::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Failure, Reply,
    Response, Status, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use slotdb::{Cookie, DbError, Field, LockFault, Operator};

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_command_header() {
    let cmd = Command::Lock { rec_no: 5 };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded[0], CommandType::Lock as u8);
    let len = u32::from_be_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]);
    assert_eq!(len as usize, encoded.len() - HEADER_SIZE);
}

#[test]
fn test_encode_decode_update() {
    let cmd = Command::Update {
        rec_no: 3,
        fields: vec!["Fred".to_string(), "Zürich".to_string()],
        cookie: Cookie::from_raw(0xDEAD_BEEF),
    };
    let encoded = encode_command(&cmd).unwrap();
    let decoded = decode_command(&encoded).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_find_exact_with_nulls() {
    let cmd = Command::FindExact {
        criteria: vec![None, Some("Paris".to_string())],
        operator: Operator::Or,
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    match decoded {
        Command::FindExact { criteria, operator } => {
            assert_eq!(criteria, vec![None, Some("Paris".to_string())]);
            assert_eq!(operator, Operator::Or);
        }
        other => panic!("Expected FIND_EXACT command, got {:?}", other),
    }
}

#[test]
fn test_unit_commands() {
    for cmd in [Command::Ping, Command::Schema] {
        let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();
        assert_eq!(decoded, cmd);
    }
}

#[test]
fn test_command_type_bytes() {
    assert_eq!(CommandType::from_byte(0x01), Some(CommandType::Read));
    assert_eq!(CommandType::from_byte(0x0A), Some(CommandType::Ping));
    assert_eq!(CommandType::from_byte(0x00), None);
    assert_eq!(CommandType::from_byte(0xFF), None);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_record_reply() {
    let resp = Response::Ok(Reply::Record(vec!["Fred".to_string(), "Paris".to_string()]));
    let encoded = encode_response(&resp).unwrap();

    assert_eq!(encoded[0], Status::Ok as u8);
    assert_eq!(decode_response(&encoded).unwrap(), resp);
}

#[test]
fn test_encode_decode_schema_reply() {
    let resp = Response::Ok(Reply::Schema(vec![Field::new("name", 10), Field::new("loc", 10)]));

    assert_eq!(decode_response(&encode_response(&resp).unwrap()).unwrap(), resp);
}

#[test]
fn test_failure_status_codes() {
    let not_found = Response::Failed(Failure::RecordNotFound(4));
    let denied = Response::Failed(Failure::LockOwnership {
        rec_no: 4,
        fault: LockFault::CookieMismatch,
    });
    let error = Response::error("disk on fire");

    assert_eq!(encode_response(&not_found).unwrap()[0], Status::NotFound as u8);
    assert_eq!(encode_response(&denied).unwrap()[0], Status::Denied as u8);
    assert_eq!(encode_response(&error).unwrap()[0], Status::Error as u8);
}

#[test]
fn test_response_from_domain_error() {
    let resp = Response::from(Err::<Reply, DbError>(DbError::FieldTooLong {
        field: "name".to_string(),
        len: 12,
        max: 10,
    }));

    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();
    match decoded {
        Response::Failed(failure) => {
            let err = DbError::from(failure);
            assert!(matches!(err, DbError::FieldTooLong { len: 12, max: 10, .. }));
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_lock_fault_survives_the_wire() {
    let resp = Response::from(Err::<Reply, DbError>(DbError::lock_ownership(
        7,
        LockFault::NotLocked,
    )));

    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();
    match decoded {
        Response::Failed(failure) => assert!(matches!(
            DbError::from(failure),
            DbError::LockOwnership {
                rec_no: 7,
                fault: LockFault::NotLocked
            }
        )),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_transport_failure_survives_the_wire() {
    let resp = Response::from(Err::<Reply, DbError>(DbError::Transport(
        "session 1 is detached".to_string(),
    )));

    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();
    match decoded {
        Response::Failed(failure) => match DbError::from(failure) {
            DbError::Transport(message) => assert_eq!(message, "session 1 is detached"),
            other => panic!("Expected Transport, got {:?}", other),
        },
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_invalid_format_survives_the_wire() {
    let resp = Response::from(Err::<Reply, DbError>(DbError::InvalidFormat(
        "unknown record status 0x42".to_string(),
    )));

    assert_eq!(encode_response(&resp).unwrap()[0], Status::Error as u8);
    match decode_response(&encode_response(&resp).unwrap()).unwrap() {
        Response::Failed(failure) => {
            assert!(matches!(DbError::from(failure), DbError::InvalidFormat(_)))
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[test]
fn test_other_server_errors_become_transport() {
    let err = DbError::from(Failure::Server("disk on fire".to_string()));

    assert!(err.is_transport());
    assert!(!matches!(err, DbError::Io(_)));
}

// =============================================================================
// Malformed Frame Tests
// =============================================================================

#[test]
fn test_decode_incomplete_header() {
    let result = decode_command(&[0x01, 0x00]);
    assert!(matches!(result, Err(DbError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let mut encoded = encode_command(&Command::Read { rec_no: 1 }).unwrap();
    encoded.pop();

    assert!(matches!(decode_command(&encoded), Err(DbError::Protocol(_))));
}

#[test]
fn test_decode_unknown_command_type() {
    let mut encoded = encode_command(&Command::Ping).unwrap();
    encoded[0] = 0x7F;

    assert!(matches!(decode_command(&encoded), Err(DbError::Protocol(_))));
}

#[test]
fn test_decode_header_payload_mismatch() {
    let mut encoded = encode_command(&Command::Read { rec_no: 1 }).unwrap();
    encoded[0] = CommandType::Delete as u8;

    assert!(matches!(decode_command(&encoded), Err(DbError::Protocol(_))));
}

#[test]
fn test_decode_status_mismatch() {
    let mut encoded = encode_response(&Response::Ok(Reply::Done)).unwrap();
    encoded[0] = Status::Denied as u8;

    assert!(matches!(decode_response(&encoded), Err(DbError::Protocol(_))));
}

#[test]
fn test_oversized_length_rejected() {
    let mut frame = vec![CommandType::Ping as u8];
    frame.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    assert!(matches!(
        read_command(&mut Cursor::new(frame)),
        Err(DbError::Protocol(_))
    ));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_several_commands() {
    let commands = vec![
        Command::Lock { rec_no: 2 },
        Command::Delete {
            rec_no: 2,
            cookie: Cookie::from_raw(99),
        },
        Command::Ping,
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }

    // Clean end of stream surfaces as an I/O error
    assert!(matches!(read_command(&mut cursor), Err(DbError::Io(_))));
}

#[test]
fn test_stream_response() {
    let resp = Response::Ok(Reply::Matches(vec![1, 3]));

    let mut buffer = Vec::new();
    write_response(&mut buffer, &resp).unwrap();

    assert_eq!(read_response(&mut Cursor::new(buffer)).unwrap(), resp);
}
