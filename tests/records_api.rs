mod common;

use common::{jpeg_bytes, sha256, spawn_app, upload_form};
use reqwest::{StatusCode, multipart};
use upload_behavior::handlers::RecordView;
use upload_behavior::models::ThumbnailProfile;

#[tokio::test]
async fn create_stores_the_upload_and_serves_it() {
    let app = spawn_app(|config| config).await;
    let client = reqwest::Client::new();
    let content = b"plain text attachment".to_vec();

    let form = upload_form("doc.txt", content.clone(), "text/plain").text("title", "Report");
    let response = client
        .post(format!("{}/api/records", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create record");

    assert_eq!(response.status(), StatusCode::CREATED);
    let view: RecordView = response.json().await.expect("Failed to parse response");
    assert_eq!(view.fields["title"], "Report");

    let stored = view.fields["file"].as_str().unwrap();
    assert!(stored.ends_with(".txt"));
    let url = view.url.unwrap();
    assert_eq!(url, format!("/uploads/records/{}/{stored}", view.id));

    let served = client
        .get(format!("{}{url}", app.address))
        .send()
        .await
        .expect("Failed to fetch upload");
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(sha256(&served.bytes().await.unwrap()), sha256(&content));
}

#[tokio::test]
async fn client_cannot_choose_the_id_or_file_name() {
    let app = spawn_app(|config| config).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new()
        .text("id", "999")
        .text("file", "../../etc/passwd");
    let response = client
        .post(format!("{}/api/records", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create record");

    assert_eq!(response.status(), StatusCode::CREATED);
    let view: RecordView = response.json().await.unwrap();
    assert_ne!(view.id, 999);
    assert!(view.fields.get("file").is_none());
    assert!(view.url.is_none());
}

#[tokio::test]
async fn update_replaces_and_delete_removes_files() {
    let app = spawn_app(|config| {
        config.with_thumbs([ThumbnailProfile::new("thumb", Some(100), Some(100))])
    })
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/records", app.address))
        .multipart(upload_form("a.jpg", jpeg_bytes(300, 200), "image/jpeg"))
        .send()
        .await
        .unwrap();
    let created: RecordView = response.json().await.unwrap();
    let first = created.fields["file"].as_str().unwrap().to_string();
    let record_dir = app.root.join(&format!("records/{}", created.id));
    assert!(record_dir.join(&first).exists());
    assert!(record_dir.join(format!("thumb-{first}")).exists());
    assert!(created.thumbnails["thumb"].is_some());

    let response = client
        .put(format!("{}/api/records/{}", app.address, created.id))
        .multipart(upload_form("b.jpg", jpeg_bytes(120, 120), "image/jpeg"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: RecordView = response.json().await.unwrap();
    let second = updated.fields["file"].as_str().unwrap().to_string();
    assert_ne!(first, second);
    assert!(!record_dir.join(&first).exists());
    assert!(!record_dir.join(format!("thumb-{first}")).exists());
    assert!(record_dir.join(&second).exists());

    let response = client
        .delete(format!("{}/api/records/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!record_dir.join(&second).exists());
    assert!(!record_dir.join(format!("thumb-{second}")).exists());

    let response = client
        .get(format!("{}/api/records/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_without_file_keeps_the_upload() {
    let app = spawn_app(|config| config).await;
    let client = reqwest::Client::new();

    let created: RecordView = client
        .post(format!("{}/api/records", app.address))
        .multipart(upload_form("a.txt", b"a".to_vec(), "text/plain"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let updated: RecordView = client
        .put(format!("{}/api/records/{}", app.address, created.id))
        .multipart(multipart::Form::new().text("title", "renamed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(updated.fields["title"], "renamed");
    assert_eq!(updated.fields["file"], created.fields["file"]);
    assert_eq!(updated.url, created.url);
}

#[tokio::test]
async fn thumbnail_over_memory_limit_keeps_the_upload() {
    let app = spawn_app(|mut config| {
        config.memory_limit = Some(4096);
        config.with_thumbs([ThumbnailProfile::new("thumb", Some(50), Some(50))])
    })
    .await;
    let client = reqwest::Client::new();

    // The save itself succeeds; only the thumbnail exceeds the limit.
    let response = client
        .post(format!("{}/api/records", app.address))
        .multipart(upload_form("big.jpg", jpeg_bytes(512, 512), "image/jpeg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let view: RecordView = response.json().await.unwrap();
    assert!(view.url.is_some());
    assert!(view.thumbnails["thumb"].is_none());
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let app = spawn_app(|config| config).await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/records/12345", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
