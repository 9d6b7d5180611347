//! Integration tests for the journal file format and engine.

use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::TempDir;
use tsjournal::{
    lock, ByteCodec, Codec, Float64Codec, Int64Codec, Journal, JournalError, Values, HEADER_SIZE,
};

const EPOCH: i64 = 1449240543;
const INTERVAL: i64 = 60;
const ALIGNED_EPOCH: i64 = 1449240540;

fn int64_journal(dir: &TempDir, name: &str) -> Journal {
    Journal::create(
        dir.path().join(name),
        INTERVAL,
        Codec::Int64(Int64Codec),
        &[],
    )
    .unwrap()
}

fn file_size(journal: &Journal) -> u64 {
    fs::metadata(journal.path()).unwrap().len()
}

#[test]
fn test_create_then_open_preserves_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("header.tsj");
    let meta = [0x1BADB002, -77, 0, 9_223_372_036_854_775_806];

    {
        let journal = Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &meta).unwrap();
        assert_eq!(journal.len(), 0);
        journal.close().unwrap();
    }

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.meta(), meta);
    assert_eq!(journal.width(), 8);
    assert_eq!(journal.interval(), INTERVAL);
    assert_eq!(journal.codec().type_tag(), 0x11);
    assert_eq!(journal.epoch(), 0);
    assert_eq!(journal.len(), 0);
    assert!(journal.is_empty());
    assert!(!journal.is_readonly());
    journal.close().unwrap();
}

#[test]
fn test_short_meta_is_zero_padded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short_meta.tsj");

    Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &[7, 11])
        .unwrap()
        .close()
        .unwrap();

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.meta(), [7, 11, 0, 0]);
}

#[test]
fn test_first_write_aligns_epoch() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "epoch.tsj");

    journal
        .write(EPOCH, &Values::Int64(vec![1, 2, 3]))
        .unwrap();

    assert_eq!(journal.epoch(), ALIGNED_EPOCH);
    assert_eq!(journal.epoch() % INTERVAL, 0);
    assert_eq!(journal.len(), 3);
    assert_eq!(journal.last(), Some(ALIGNED_EPOCH + 2 * INTERVAL));
}

#[test]
fn test_epoch_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reopen.tsj");

    {
        let mut journal =
            Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &[]).unwrap();
        journal.write(EPOCH, &Values::Int64(vec![10, 20])).unwrap();
        journal.sync().unwrap();
        journal.close().unwrap();
    }

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.epoch(), ALIGNED_EPOCH);
    assert_eq!(journal.len(), 2);
    assert_eq!(journal.read(EPOCH, 2).unwrap(), Values::Int64(vec![10, 20]));
}

#[test]
fn test_gap_write_and_null_fill() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "gap.tsj");

    let first: Vec<i64> = (0..10).map(|i| i * 100).collect();
    journal.write(EPOCH, &Values::Int64(first.clone())).unwrap();
    assert_eq!(file_size(&journal), HEADER_SIZE as u64 + 10 * 8);

    let second: Vec<i64> = (0..10).map(|i| i * 1000 + 7).collect();
    journal
        .write(EPOCH + 20 * INTERVAL, &Values::Int64(second.clone()))
        .unwrap();
    assert_eq!(file_size(&journal), HEADER_SIZE as u64 + 30 * 8);
    assert_eq!(journal.len(), 30);

    // A slot inside the gap decodes to the int64 null sentinel.
    assert_eq!(
        journal.read(EPOCH + 19 * INTERVAL, 1).unwrap(),
        Values::Int64(vec![i64::MIN])
    );

    // Both written ranges read back unchanged.
    assert_eq!(journal.read(EPOCH, 10).unwrap(), Values::Int64(first));
    assert_eq!(
        journal.read(EPOCH + 20 * INTERVAL, 10).unwrap(),
        Values::Int64(second)
    );

    assert_eq!(journal.last(), Some(ALIGNED_EPOCH + 29 * INTERVAL));
}

#[test]
fn test_dense_layout_has_no_byte_holes() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "dense.tsj");

    journal.write(EPOCH, &Values::Int64(vec![1])).unwrap();
    journal
        .write(EPOCH + 5 * INTERVAL, &Values::Int64(vec![2, 3]))
        .unwrap();
    journal
        .write(EPOCH + 2 * INTERVAL, &Values::Int64(vec![4]))
        .unwrap();

    assert_eq!(
        file_size(&journal),
        HEADER_SIZE as u64 + journal.len() * 8
    );

    // Every slot between epoch and the last write is readable.
    let all = journal.read(EPOCH, journal.len() as usize).unwrap();
    assert_eq!(
        all,
        Values::Int64(vec![1, i64::MIN, 4, i64::MIN, i64::MIN, 2, 3])
    );
}

#[test]
fn test_overwrite_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "overwrite.tsj");

    journal
        .write(EPOCH, &Values::Int64(vec![1, 2, 3]))
        .unwrap();
    journal
        .write(EPOCH, &Values::Int64(vec![9, 8, 7, 6]))
        .unwrap();

    assert_eq!(journal.len(), 4);
    assert_eq!(file_size(&journal), HEADER_SIZE as u64 + 4 * 8);
    assert_eq!(
        journal.read(EPOCH, 4).unwrap(),
        Values::Int64(vec![9, 8, 7, 6])
    );
}

#[test]
fn test_overwrite_in_the_middle() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "middle.tsj");

    journal
        .write(EPOCH, &Values::Int64((0..10).collect()))
        .unwrap();
    journal
        .write(EPOCH + 4 * INTERVAL, &Values::Int64(vec![-4, -5]))
        .unwrap();

    assert_eq!(journal.len(), 10);
    assert_eq!(
        journal.read(EPOCH, 10).unwrap(),
        Values::Int64(vec![0, 1, 2, 3, -4, -5, 6, 7, 8, 9])
    );
}

#[test]
fn test_empty_write_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "empty.tsj");

    journal.write(EPOCH, &Values::Int64(vec![])).unwrap();

    assert_eq!(journal.epoch(), 0);
    assert!(journal.is_empty());
    assert_eq!(journal.last(), None);
    assert_eq!(file_size(&journal), HEADER_SIZE as u64);
}

#[test]
fn test_write_before_epoch_is_out_of_range() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "range.tsj");

    journal.write(EPOCH, &Values::Int64(vec![1])).unwrap();

    let err = journal
        .write(EPOCH - 10 * INTERVAL, &Values::Int64(vec![2]))
        .unwrap_err();
    assert!(matches!(err, JournalError::OutOfRange { .. }));

    let err = journal.read(EPOCH - INTERVAL, 1).unwrap_err();
    assert!(matches!(err, JournalError::OutOfRange { .. }));
}

#[test]
fn test_read_past_eof_is_short() {
    let dir = TempDir::new().unwrap();
    let mut journal = int64_journal(&dir, "eof.tsj");

    journal
        .write(EPOCH, &Values::Int64(vec![5, 6, 7]))
        .unwrap();

    let values = journal.read(EPOCH, 100).unwrap();
    assert_eq!(values, Values::Int64(vec![5, 6, 7]));

    let values = journal.read(EPOCH + 50 * INTERVAL, 10).unwrap();
    assert!(values.is_empty());
}

#[test]
fn test_read_from_empty_journal_is_empty() {
    let dir = TempDir::new().unwrap();
    let journal = int64_journal(&dir, "fresh.tsj");

    let values = journal.read(EPOCH, 4).unwrap();
    assert!(values.is_empty());
}

#[test]
fn test_float64_journal_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("floats.tsj");
    let data = vec![3.14159, 6.28, 2.71828, 1.61803];

    {
        let mut journal =
            Journal::create(&path, INTERVAL, Codec::Float64(Float64Codec), &[]).unwrap();
        journal.write(EPOCH, &Values::Float64(data.clone())).unwrap();
        journal
            .write(EPOCH + 6 * INTERVAL, &Values::Float64(vec![0.5]))
            .unwrap();
        journal.close().unwrap();
    }

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.codec().type_tag(), 0x10);

    match journal.read(EPOCH, 4).unwrap() {
        Values::Float64(read) => {
            for (a, b) in data.iter().zip(&read) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
        other => panic!("expected float64 values, got {other:?}"),
    }

    // The gap slots decode to NaN, the float null sentinel.
    match journal.read(EPOCH + 4 * INTERVAL, 2).unwrap() {
        Values::Float64(nulls) => {
            assert!(nulls.iter().all(|v| v.is_nan()));
        }
        other => panic!("expected float64 values, got {other:?}"),
    }
}

#[test]
fn test_byte_blob_journal_with_user_null() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blobs.tsj");

    let mut journal = Journal::create(
        &path,
        INTERVAL,
        Codec::Bytes(ByteCodec::new(2, b"--")),
        &[],
    )
    .unwrap();
    // A user null that is neither zeros nor "NULL" gets the opaque tag.
    assert_eq!(journal.codec().type_tag(), 0x0F);

    let groups = vec![b"AA".to_vec(), b"BB".to_vec()];
    journal.write(EPOCH, &Values::Bytes(groups.clone())).unwrap();
    journal
        .write(EPOCH + 3 * INTERVAL, &Values::Bytes(vec![b"CC".to_vec()]))
        .unwrap();

    assert_eq!(
        journal.read(EPOCH, 4).unwrap(),
        Values::Bytes(vec![
            b"AA".to_vec(),
            b"BB".to_vec(),
            b"--".to_vec(),
            b"CC".to_vec(),
        ])
    );
    journal.close().unwrap();

    // The user null is not recorded in the header; reopening falls back
    // to the NULL-text sentinel truncated to the sample width.
    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.codec().null(), b"NU".to_vec());
    assert_eq!(journal.len(), 4);
}

#[test]
fn test_corrupt_payload_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.tsj");

    Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &[])
        .unwrap()
        .close()
        .unwrap();

    // Grow the payload to 3 bytes, which no width-8 sample layout allows.
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0xDE, 0xAD, 0xBE]).unwrap();
    drop(file);

    let result = Journal::open(&path);
    assert!(matches!(result, Err(JournalError::Corrupt { .. })));
}

#[test]
fn test_foreign_file_is_not_a_journal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("foreign.tsj");
    fs::write(&path, [0x55u8; 64]).unwrap();

    let result = Journal::open(&path);
    assert!(matches!(result, Err(JournalError::NotAJournal(_))));
}

#[test]
fn test_open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let result = Journal::open(dir.path().join("missing.tsj"));
    assert!(matches!(result, Err(JournalError::Io(_))));
}

#[cfg(unix)]
#[test]
fn test_readonly_journal_rejects_writes() {
    use std::os::unix::fs::PermissionsExt;

    // File permissions do not bind root; the fallback cannot trigger.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readonly.tsj");

    {
        let mut journal =
            Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &[]).unwrap();
        journal.write(EPOCH, &Values::Int64(vec![1, 2])).unwrap();
        journal.close().unwrap();
    }

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o444);
    fs::set_permissions(&path, perms).unwrap();

    let mut journal = Journal::open(&path).unwrap();
    assert!(journal.is_readonly());

    let err = journal.write(EPOCH, &Values::Int64(vec![3])).unwrap_err();
    assert!(matches!(err, JournalError::ReadOnly));

    // Reads still work under the shared lock.
    assert_eq!(journal.read(EPOCH, 2).unwrap(), Values::Int64(vec![1, 2]));
}

#[test]
fn test_open_journal_holds_exclusive_lock() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("locked.tsj");
    let journal = Journal::create(&path, INTERVAL, Codec::Int64(Int64Codec), &[]).unwrap();

    let outsider = fs::File::open(&path).unwrap();
    assert!(matches!(
        lock::try_exclusive(&outsider).unwrap_err(),
        JournalError::LockBusy
    ));
    assert!(matches!(
        lock::try_shared(&outsider).unwrap_err(),
        JournalError::LockBusy
    ));

    journal.close().unwrap();
    lock::try_exclusive(&outsider).unwrap();
}
