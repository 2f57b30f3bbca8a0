//! Integration tests for the document object store.

use pdf_cos::object::{Array, Dictionary, Object, ObjectKey};
use pdf_cos::xref::XRefEntry;
use pdf_cos::{CosDocument, Error, MemoryUsageSetting};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_forward_reference_resolution() {
    init_logging();
    let mut doc = CosDocument::new();

    // a page refers to its contents before they are loaded
    let contents_key = ObjectKey::new(5, 0);
    let mut page = Dictionary::new();
    page.set_name("Type", "Page");
    page.set("Contents", doc.get_object_from_pool(contents_key));
    let page_ref = doc.add_object(page);

    let contents = doc.create_stream();
    contents.set_raw_data(b"BT ET").unwrap();
    doc.get_object_from_pool(contents_key)
        .set_object(Object::Stream(contents.clone()));

    let resolved = page_ref
        .get_object()
        .as_dict()
        .and_then(|d| d.get_stream("Contents"))
        .unwrap();
    assert!(resolved.ptr_eq(&contents));
    assert_eq!(resolved.to_raw_bytes().unwrap(), b"BT ET");
    doc.close().unwrap();
}

#[test]
fn test_self_referencing_objects_released_on_close() {
    let mut doc = CosDocument::new();
    let parent = doc.get_object_from_pool(ObjectKey::new(1, 0));
    let child = doc.get_object_from_pool(ObjectKey::new(2, 0));

    let mut parent_dict = Dictionary::new();
    parent_dict.set("Kids", Array::from(vec![Object::from(child.clone())]));
    parent.set_object(parent_dict.into());
    let mut child_dict = Dictionary::new();
    child_dict.set("Parent", parent.clone());
    child.set_object(child_dict.into());

    doc.close().unwrap();
    assert!(!parent.is_resolved());
    assert!(!child.is_resolved());
}

#[test]
fn test_xref_merge_and_numbering() {
    let mut doc = CosDocument::new();
    doc.add_xref_table([
        (ObjectKey::new(1, 0), XRefEntry::Offset(15)),
        (ObjectKey::new(40, 0), XRefEntry::Compressed { stream_number: 3, index: 0 }),
    ]);
    doc.add_xref_table([(ObjectKey::new(1, 0), XRefEntry::Offset(900))]);

    assert_eq!(doc.xref_table().get(&ObjectKey::new(1, 0)), Some(&XRefEntry::Offset(900)));
    assert_eq!(doc.add_object(true).key(), ObjectKey::new(41, 0));
    doc.close().unwrap();
}

#[test]
fn test_stream_with_dictionary_copy() {
    let mut doc = CosDocument::new();
    let mut dict = Dictionary::new();
    dict.set_name("Subtype", "XML");
    let stream = doc.create_stream_with_dictionary(&dict);
    stream.set_raw_data(b"<x/>").unwrap();

    // the stream owns its own copy
    dict.set_name("Subtype", "Other");
    assert_eq!(stream.get_name("Subtype").map(|n| n.as_str().to_string()).as_deref(), Some("XML"));
    assert_eq!(stream.get_int("Length", 0), 4);
    doc.close().unwrap();
}

#[test]
fn test_save_with_streams_and_temp_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let setting = MemoryUsageSetting::temp_file_only().with_temp_dir(dir.path());
    let mut doc = CosDocument::with_memory_setting(setting);
    doc.set_version(1.7);

    let stream = doc.create_stream();
    stream.set_data(&b"q 1 0 0 1 0 0 cm Q\n".repeat(100), Object::name("FlateDecode")).unwrap();
    let raw_len = stream.raw_length().unwrap();
    let stream_ref = doc.add_object(stream);

    let mut info = Dictionary::new();
    info.set_string("Title", &b"Scratch (test)"[..]);
    let info_ref = doc.add_object(info);
    doc.set_info(info_ref);
    doc.trailer_mut().set("Root", stream_ref);

    let path = dir.path().join("out.pdf");
    let file = std::fs::File::create(&path).unwrap();
    let written = doc.save(std::io::BufWriter::new(file)).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, written);

    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("%PDF-1.7"));
    assert!(text.contains(&format!("/Length {}", raw_len)));
    assert!(text.contains("/Title (Scratch \\(test\\))"));
    assert!(text.contains("/Info 2 0 R"));
    doc.close().unwrap();
}

#[test]
fn test_double_close_and_use_after_close() {
    let mut doc = CosDocument::blank();
    let stream = doc.create_stream();
    stream.set_raw_data(b"abc").unwrap();

    doc.close().unwrap();
    doc.close().unwrap();
    assert!(matches!(stream.create_raw_reader(), Err(Error::ClosedResource(_))));
    assert!(matches!(stream.create_raw_writer(), Err(Error::ClosedResource(_))));
    assert!(matches!(doc.save(Vec::new()), Err(Error::ClosedResource(_))));
}
