use serde_json::{Map, json};
use upload_behavior::error::PlacementError;
use upload_behavior::models::{PlacementConfig, Scenario, ThumbnailProfile, UploadTarget};
use upload_behavior::services::PlacementPlanner;
use upload_behavior::services::planner::thumb_file_name;

fn image_config() -> PlacementConfig {
    PlacementConfig::new("image", "@webroot/upload/user/{id}", "@web/upload/user/{id}")
        .with_alias("@webroot", "/srv/public")
        .with_alias("@web", "https://example.com")
        .with_thumbs([
            ThumbnailProfile::new("thumb", Some(400), None),
            ThumbnailProfile::new("preview", Some(200), Some(200)),
        ])
}

fn stored_record(file_name: &str) -> UploadTarget {
    let mut fields = Map::new();
    fields.insert("id".to_string(), json!(5));
    fields.insert("image".to_string(), json!(file_name));
    UploadTarget::persisted(fields)
}

#[test]
fn places_primary_file_under_resolved_directory() {
    let planner = PlacementPlanner::new(image_config()).unwrap();
    let record = stored_record("x.jpg");

    let placement = planner.primary(&record, "image").unwrap();

    assert_eq!(
        placement.absolute_path.to_string_lossy(),
        "/srv/public/upload/user/5/x.jpg"
    );
    assert_eq!(placement.public_url, "https://example.com/upload/user/5/x.jpg");
}

#[test]
fn thumbnail_names_are_distinct_per_profile() {
    let planner = PlacementPlanner::new(image_config()).unwrap();
    let record = stored_record("x.jpg");

    let thumb = planner.thumb_upload_path(&record, "image", "thumb", false).unwrap();
    let preview = planner.thumb_upload_path(&record, "image", "preview", false).unwrap();

    assert_eq!(thumb.file_name().unwrap(), "thumb-x.jpg");
    assert_eq!(preview.file_name().unwrap(), "preview-x.jpg");
    assert_ne!(thumb, preview);
    assert_eq!(thumb_file_name("x.jpg", "thumb"), "thumb-x.jpg");
}

#[test]
fn thumbnails_use_their_own_location_when_configured() {
    let config = image_config().with_thumb_location("@webroot/thumbs/{id}", "@web/thumbs/{id}");
    let planner = PlacementPlanner::new(config).unwrap();
    let record = stored_record("x.jpg");

    let thumb = planner.thumbnail(&record, "image", "thumb").unwrap();

    assert_eq!(
        thumb.absolute_path.to_string_lossy(),
        "/srv/public/thumbs/5/thumb-x.jpg"
    );
    assert_eq!(thumb.public_url, "https://example.com/thumbs/5/thumb-x.jpg");
}

#[test]
fn old_and_new_file_names_are_distinguished() {
    let planner = PlacementPlanner::new(image_config()).unwrap();
    let mut record = stored_record("old.jpg");
    record = record.with_field("image", "new.jpg");

    let old = planner.upload_path(&record, "image", true).unwrap();
    let new = planner.upload_path(&record, "image", false).unwrap();

    assert!(old.ends_with("old.jpg"));
    assert!(new.ends_with("new.jpg"));
    // URLs always describe what is persisted.
    assert!(planner.upload_url(&record, "image").unwrap().ends_with("/old.jpg"));
}

#[test]
fn nothing_is_placed_without_a_file_name() {
    let planner = PlacementPlanner::new(image_config()).unwrap();
    let record = UploadTarget::new(Scenario::Insert).with_field("image", "");

    assert!(planner.upload_path(&record, "image", false).is_none());
    assert!(planner.upload_url(&record, "image").is_none());
    assert!(planner.thumb_upload_path(&record, "image", "thumb", false).is_none());
}

#[test]
fn placeholder_thumbnail_sits_next_to_the_asset() {
    let config = image_config().with_placeholder("@webroot/img/none.png", "@web/img/none.png");
    let planner = PlacementPlanner::new(config).unwrap();

    let thumb = planner.placeholder_thumb("preview").unwrap();

    assert_eq!(
        thumb.absolute_path.to_string_lossy(),
        "/srv/public/img/preview-none.png"
    );
    assert_eq!(thumb.public_url, "https://example.com/img/preview-none.png");
}

#[test]
fn placeholder_url_without_directory_stays_relative() {
    let planner = PlacementPlanner::new(image_config().with_placeholder("/srv/none.png", "none.png"))
        .unwrap();
    assert_eq!(
        planner.placeholder_thumb("preview").unwrap().public_url,
        "./preview-none.png"
    );

    let planner =
        PlacementPlanner::new(image_config().with_placeholder("/srv/none.png", "/none.png"))
            .unwrap();
    assert_eq!(
        planner.placeholder_thumb("preview").unwrap().public_url,
        "/preview-none.png"
    );
}

#[test]
fn unknown_alias_in_template_is_rejected() {
    let config = PlacementConfig::new("file", "@nowhere/{id}", "/files/{id}");

    assert!(matches!(
        PlacementPlanner::new(config),
        Err(PlacementError::Configuration(_))
    ));
}
