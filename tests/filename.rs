use std::collections::HashSet;

use upload_behavior::error::PlacementError;
use upload_behavior::models::StoredFile;
use upload_behavior::services::NamePolicy;
use upload_behavior::services::filename::{generate_file_name, name_for, sanitize_file_name};

#[test]
fn generated_names_keep_the_lowercased_extension() {
    let file = StoredFile::from_bytes("Holiday Photo.JPG", vec![1, 2, 3]);
    let name = name_for(&file, &NamePolicy::Generate).unwrap();

    assert!(name.ends_with(".jpg"), "unexpected name {name}");
    assert!(!name.contains("Holiday"));
    let token = name.trim_end_matches(".jpg");
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generated_names_are_unique() {
    let names: HashSet<String> = (0..1000).map(|_| generate_file_name("png")).collect();
    assert_eq!(names.len(), 1000);
}

#[test]
fn generated_name_without_extension_has_no_dot() {
    let file = StoredFile::from_bytes("README", vec![]);
    let name = name_for(&file, &NamePolicy::Generate).unwrap();
    assert!(!name.contains('.'));
    assert!(!name.is_empty());
}

#[test]
fn sanitize_replaces_unsafe_characters() {
    assert_eq!(
        sanitize_file_name("#my  unsaf&filename?\".png"),
        "-my--unsaf-filename--.png"
    );
    assert_eq!(sanitize_file_name("report 2024.pdf"), "report-2024.pdf");
    assert_eq!(sanitize_file_name("../../etc/passwd"), "..-..-etc-passwd");
}

#[test]
fn sanitize_is_idempotent() {
    let once = sanitize_file_name("a b/c\\d'e.txt");
    assert_eq!(sanitize_file_name(&once), once);
}

#[test]
fn sanitize_rejects_dot_only_names() {
    let file = StoredFile::from_bytes("..", vec![]);
    assert!(matches!(
        name_for(&file, &NamePolicy::Sanitize),
        Err(PlacementError::EmptyFileName)
    ));
}

#[test]
fn custom_generator_receives_the_upload() {
    let policy = NamePolicy::Custom(std::sync::Arc::new(|file: &StoredFile| {
        format!("custom-{}.{}", file.size_bytes(), file.extension())
    }));
    let file = StoredFile::from_bytes("doc.TXT", b"hello".to_vec());

    assert_eq!(name_for(&file, &policy).unwrap(), "custom-5.txt");
}

#[test]
fn empty_custom_name_is_rejected() {
    let policy = NamePolicy::Custom(std::sync::Arc::new(|_: &StoredFile| String::new()));
    let file = StoredFile::from_bytes("doc.txt", vec![]);

    assert!(matches!(
        name_for(&file, &policy),
        Err(PlacementError::EmptyFileName)
    ));
}
