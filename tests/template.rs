use std::collections::HashMap;

use serde_json::json;
use upload_behavior::error::PlacementError;
use upload_behavior::models::{Scenario, UploadTarget};
use upload_behavior::services::AliasMap;
use upload_behavior::services::template::{has_placeholders, resolve};

#[test]
fn resolves_every_placeholder_from_record_fields() {
    let record = UploadTarget::new(Scenario::Insert)
        .with_field("id", 42)
        .with_field("category", "avatars");

    assert_eq!(
        resolve("upload/{category}/{id}/{id}", &record),
        "upload/avatars/42/42"
    );
}

#[test]
fn leaves_unknown_or_non_scalar_placeholders_literal() {
    let record = UploadTarget::new(Scenario::Insert)
        .with_field("tags", json!(["a", "b"]))
        .with_field("owner", json!(null));

    let resolved = resolve("upload/{id}/{tags}/{owner}", &record);

    assert_eq!(resolved, "upload/{id}/{tags}/{owner}");
    assert!(has_placeholders(&resolved));
}

#[test]
fn resolves_late_once_the_id_is_known() {
    let mut record = UploadTarget::new(Scenario::Insert);
    let template = "@webroot/upload/{id}";
    assert_eq!(resolve(template, &record), template);

    record = record.with_field("id", 7);
    assert_eq!(resolve(template, &record), "@webroot/upload/7");
}

#[test]
fn resolving_twice_changes_nothing() {
    let record = UploadTarget::new(Scenario::Insert)
        .with_field("id", 42)
        .with_field("category", "avatars");

    let full = resolve("upload/{category}/{id}", &record);
    assert_eq!(resolve(&full, &record), full);

    let partial = resolve("upload/{category}/{owner}/{id}", &record);
    assert_eq!(partial, "upload/avatars/{owner}/42");
    assert_eq!(resolve(&partial, &record), partial);
}

#[test]
fn template_without_placeholders_is_unchanged() {
    let record = UploadTarget::new(Scenario::Default);
    assert_eq!(resolve("static/files", &record), "static/files");
    assert!(!has_placeholders("static/files"));
}

#[test]
fn expands_leading_alias() {
    let aliases = AliasMap::new(HashMap::from([
        ("@webroot".to_string(), "/srv/app/public/".to_string()),
        ("web".to_string(), "https://cdn.example.com".to_string()),
    ]));

    assert_eq!(
        aliases.expand("@webroot/upload/7"),
        "/srv/app/public/upload/7"
    );
    assert_eq!(
        aliases.expand("@web/upload/7"),
        "https://cdn.example.com/upload/7"
    );
    assert_eq!(aliases.expand("relative/upload"), "relative/upload");
}

#[test]
fn unknown_alias_is_a_configuration_error() {
    let aliases = AliasMap::new(HashMap::new());

    assert!(aliases.check("plain/{id}").is_ok());
    assert!(matches!(
        aliases.check("@missing/{id}"),
        Err(PlacementError::Configuration(_))
    ));
}
