//! Record File
//!
//! Positional access to the fixed-width record slots of a database file.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DbError, Result};
use crate::schema::{Schema, STATUS_SIZE};

use super::{field, RecNo, SlotStatus, DELETED, VALID};

/// Owner of the database file handle and the slot counters
///
/// Every method positions the file itself; callers never rely on the
/// current file offset. All methods take `&mut self`, so sharing a
/// `RecordFile` between threads requires an outer lock.
pub struct RecordFile {
    /// Path the file was opened from
    path: PathBuf,

    /// Read/write handle on the database file
    file: File,

    /// Layout parsed from the header
    schema: Arc<Schema>,

    /// Number of slots in the file, deleted ones included
    num_records: RecNo,

    /// Slots marked deleted (see `insert` for why this can lag behind)
    deleted_count: RecNo,
}

impl RecordFile {
    /// Open an existing database file
    ///
    /// Validates the header, derives the slot count from the file length
    /// and counts deleted slots.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let schema = {
            let mut reader = BufReader::new(&file);
            Schema::read_from(&mut reader)?
        };

        let file_len = file.metadata()?.len();
        let header_len = schema.header_length() as u64;
        let record_len = schema.record_length() as u64;
        let data_len = file_len.saturating_sub(header_len);

        let remainder = data_len % record_len;
        if remainder != 0 {
            tracing::warn!(
                "{}: ignoring {} trailing bytes of a partial record",
                path.display(),
                remainder
            );
        }

        let num_records = RecNo::try_from(data_len / record_len).map_err(|_| {
            DbError::InvalidFormat(format!("{} holds too many records", path.display()))
        })?;

        let deleted_count = count_deleted(&mut file, &schema, num_records)?;

        tracing::info!(
            "Opened {}: {} fields, {} records ({} deleted)",
            path.display(),
            schema.field_count(),
            num_records,
            deleted_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            schema: Arc::new(schema),
            num_records,
            deleted_count,
        })
    }

    /// Create a new, empty database file with the given schema
    ///
    /// Fails if the file already exists.
    pub fn create(path: &Path, schema: Schema) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        file.write_all(&schema.encode())?;
        file.sync_all()?;

        tracing::info!(
            "Created {} with {} fields",
            path.display(),
            schema.field_count()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            schema: Arc::new(schema),
            num_records: 0,
            deleted_count: 0,
        })
    }

    /// Read the values of a non-deleted record
    pub fn read(&mut self, rec_no: RecNo) -> Result<Vec<String>> {
        self.check_exists(rec_no)?;

        let mut slot = vec![0u8; self.schema.record_length()];
        self.file.seek(SeekFrom::Start(self.slot_offset(rec_no)))?;
        self.file.read_exact(&mut slot)?;

        if SlotStatus::from_byte(slot[0])? == SlotStatus::Deleted {
            return Err(DbError::RecordNotFound(rec_no));
        }

        Ok(field::decode_fields(&self.schema, &slot[STATUS_SIZE..]))
    }

    /// Status of an existing slot
    pub fn status(&mut self, rec_no: RecNo) -> Result<SlotStatus> {
        self.check_exists(rec_no)?;

        let mut byte = [0u8; 1];
        self.file.seek(SeekFrom::Start(self.slot_offset(rec_no)))?;
        self.file.read_exact(&mut byte)?;
        SlotStatus::from_byte(byte[0])
    }

    /// Fail with `RecordNotFound` unless the slot exists and is valid
    pub fn ensure_live(&mut self, rec_no: RecNo) -> Result<()> {
        match self.status(rec_no)? {
            SlotStatus::Valid => Ok(()),
            SlotStatus::Deleted => Err(DbError::RecordNotFound(rec_no)),
        }
    }

    /// Overwrite the field area of a slot, leaving its status byte alone
    ///
    /// `area` must come from `field::encode_fields` for this schema.
    pub fn raw_write(&mut self, rec_no: RecNo, area: &[u8]) -> Result<()> {
        debug_assert_eq!(area.len(), self.schema.record_length() - STATUS_SIZE);

        let offset = self.slot_offset(rec_no) + STATUS_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(area)?;
        Ok(())
    }

    /// Flag a slot as deleted
    pub fn mark_deleted(&mut self, rec_no: RecNo) -> Result<()> {
        self.check_exists(rec_no)?;

        self.file.seek(SeekFrom::Start(self.slot_offset(rec_no)))?;
        self.file.write_all(&[DELETED])?;
        self.deleted_count += 1;
        Ok(())
    }

    /// Store a new record in the lowest deleted slot, or append one
    ///
    /// Reusing a slot does not decrement the deleted counter, so
    /// `visible_count` under-reports until the file is reopened.
    pub fn insert(&mut self, area: &[u8]) -> Result<RecNo> {
        let rec_no = match self.first_deleted()? {
            Some(rec_no) => rec_no,
            None => self.num_records.checked_add(1).ok_or_else(|| {
                DbError::InvalidFormat(format!("{} is full", self.path.display()))
            })?,
        };

        let mut slot = Vec::with_capacity(self.schema.record_length());
        slot.push(VALID);
        slot.extend_from_slice(area);

        self.file.seek(SeekFrom::Start(self.slot_offset(rec_no)))?;
        self.file.write_all(&slot)?;

        if rec_no > self.num_records {
            self.num_records = rec_no;
        }

        Ok(rec_no)
    }

    /// Flush file contents to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of slots, deleted ones included
    pub fn record_count(&self) -> RecNo {
        self.num_records
    }

    pub fn deleted_count(&self) -> RecNo {
        self.deleted_count
    }

    /// Slots minus the deleted counter
    pub fn visible_count(&self) -> RecNo {
        self.num_records.saturating_sub(self.deleted_count)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_exists(&self, rec_no: RecNo) -> Result<()> {
        if rec_no == 0 || rec_no > self.num_records {
            return Err(DbError::RecordNotFound(rec_no));
        }
        Ok(())
    }

    /// Byte offset of a slot; valid for `num_records + 1` too
    fn slot_offset(&self, rec_no: RecNo) -> u64 {
        self.schema.header_length() as u64
            + (rec_no as u64 - 1) * self.schema.record_length() as u64
    }

    fn first_deleted(&mut self) -> Result<Option<RecNo>> {
        for rec_no in 1..=self.num_records {
            if self.status(rec_no)? == SlotStatus::Deleted {
                return Ok(Some(rec_no));
            }
        }
        Ok(None)
    }
}

fn count_deleted(file: &mut File, schema: &Schema, num_records: RecNo) -> Result<RecNo> {
    file.seek(SeekFrom::Start(schema.header_length() as u64))?;
    let mut reader = BufReader::new(file);
    let mut slot = vec![0u8; schema.record_length()];
    let mut deleted = 0;

    for _ in 0..num_records {
        reader.read_exact(&mut slot)?;
        if SlotStatus::from_byte(slot[0])? == SlotStatus::Deleted {
            deleted += 1;
        }
    }

    Ok(deleted)
}
