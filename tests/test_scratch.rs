//! Integration tests for scratch-file buffering.
//!
//! Exercises every memory policy through the public buffer API and through
//! streams, including temp files in an explicit directory.

use pdf_cos::io::{MemoryUsageSetting, ScratchFile, PAGE_SIZE};
use pdf_cos::{CosDocument, Error, Object};
use std::io::{Read, Seek, SeekFrom, Write};

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

#[test]
fn test_temp_file_only_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let setting = MemoryUsageSetting::temp_file_only().with_temp_dir(dir.path());
    let scratch = ScratchFile::new(setting).unwrap();

    let data = sample(10 * PAGE_SIZE + 123);
    let mut buffer = scratch.create_buffer().unwrap();
    Write::write_all(&mut buffer, &data).unwrap();
    assert_eq!(buffer.len(), data.len() as u64);
    assert_eq!(scratch.pages_in_use(), 11);

    Seek::seek(&mut buffer, SeekFrom::Start(0)).unwrap();
    let mut out = Vec::new();
    Read::read_to_end(&mut buffer, &mut out).unwrap();
    assert_eq!(out, data);

    buffer.close();
    assert_eq!(scratch.pages_in_use(), 0);
    scratch.close().unwrap();
}

#[test]
fn test_mixed_policy_round_trip() {
    let scratch = ScratchFile::new(MemoryUsageSetting::mixed(2 * PAGE_SIZE as i64)).unwrap();
    let data = sample(5 * PAGE_SIZE);
    let mut buffer = scratch.create_buffer().unwrap();
    Write::write_all(&mut buffer, &data).unwrap();

    // read back across the memory/disk boundary
    Seek::seek(&mut buffer, SeekFrom::Start(PAGE_SIZE as u64 + 10)).unwrap();
    let mut out = vec![0u8; 2 * PAGE_SIZE];
    Read::read_exact(&mut buffer, &mut out).unwrap();
    assert_eq!(out, &data[PAGE_SIZE + 10..3 * PAGE_SIZE + 10]);
    scratch.close().unwrap();
}

#[test]
fn test_storage_limit_reported() {
    let scratch =
        ScratchFile::new(MemoryUsageSetting::mixed_with_limit(PAGE_SIZE as i64, 3 * PAGE_SIZE as i64))
            .unwrap();
    let stream = pdf_cos::Stream::with_scratch_file(scratch.clone());

    let err = stream.set_raw_data(&sample(4 * PAGE_SIZE)).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { .. }), "got {:?}", err);
    // the failed writer released the stream
    assert!(!stream.is_writing());
    scratch.close().unwrap();
}

#[test]
fn test_document_close_releases_pages() {
    let dir = tempfile::tempdir().unwrap();
    let setting = MemoryUsageSetting::mixed(PAGE_SIZE as i64).with_temp_dir(dir.path());
    let mut doc = CosDocument::with_memory_setting(setting);

    let streams: Vec<_> = (0..4).map(|_| doc.create_stream()).collect();
    for (i, stream) in streams.iter().enumerate() {
        stream
            .set_data(&sample(3 * PAGE_SIZE + i), Object::name("RunLengthDecode"))
            .unwrap();
    }
    assert!(doc.scratch_file().pages_in_use() > 0);

    doc.close().unwrap();
    assert!(doc.scratch_file().is_closed());
    for stream in &streams {
        assert!(matches!(stream.to_decoded_bytes(), Err(Error::ClosedResource(_))));
    }
}

#[test]
fn test_buffers_share_one_store() {
    let scratch = ScratchFile::main_memory_only();
    let mut a = scratch.create_buffer().unwrap();
    let mut b = scratch.create_buffer().unwrap();
    Write::write_all(&mut a, &sample(PAGE_SIZE * 2)).unwrap();
    Write::write_all(&mut b, b"short").unwrap();
    assert_eq!(scratch.pages_in_use(), 3);

    a.close();
    // freed pages are reused
    Write::write_all(&mut b, &sample(PAGE_SIZE)).unwrap();
    assert_eq!(scratch.pages_in_use(), 2);
    assert_eq!(b.to_vec().unwrap().len(), PAGE_SIZE + 5);
}
