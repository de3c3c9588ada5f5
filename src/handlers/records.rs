//! # Record Handlers
//!
//! A small record store exercising the attachment lifecycle over HTTP. Each
//! record is a flat set of text fields plus the managed file attribute:
//!
//! 1. `POST /api/records` inserts a record (scenario `insert`)
//! 2. `PUT /api/records/{id}` updates it, replacing the file when one is sent
//!    (scenario `update`)
//! 3. `GET /api/records/{id}` shows its fields, file URL and thumbnail URLs
//! 4. `DELETE /api/records/{id}` deletes it together with its files
//!
//! Requests are multipart forms. The part named after the managed attribute is
//! the upload when it carries a filename; every other part is a text field.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AppState, HostRecord, Scenario, StoredFile, UploadTarget};

/// Field holding the record identifier. Never writable by clients.
const ID_FIELD: &str = "id";

/// Response describing one record.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordView {
    pub id: u64,
    pub fields: Map<String, Value>,
    /// URL of the stored file, if any.
    pub url: Option<String>,
    /// Thumbnail URL per profile, falling back to the placeholder when set.
    pub thumbnails: BTreeMap<String, Option<String>>,
}

/// Text fields and the optional upload of one request.
struct RecordForm {
    fields: Vec<(String, String)>,
    upload: Option<StoredFile>,
}

async fn read_form(multipart: &mut Multipart, attribute: &str) -> AppResult<RecordForm> {
    let mut form = RecordForm {
        fields: Vec::new(),
        upload: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!(error = %e, "Error reading multipart form");
        AppError::BadRequest("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(file_name) if name == attribute => {
                let data = field.bytes().await.map_err(|e| {
                    error!(error = %e, "Error reading file data");
                    AppError::BadRequest("Error reading file")
                })?;
                debug!(%file_name, size = data.len(), "Upload received");
                form.upload = Some(StoredFile::from_bytes(file_name, data.to_vec()));
            }
            Some(_) => {
                warn!(field_name = %name, "Unexpected file part in multipart form");
            }
            None if name.is_empty() || name == ID_FIELD => {
                warn!(field_name = %name, "Ignoring protected field");
            }
            None => {
                let text = field.text().await.map_err(|e| {
                    error!(error = %e, field_name = %name, "Error reading text field");
                    AppError::BadRequest("Error reading field")
                })?;
                form.fields.push((name, text));
            }
        }
    }

    Ok(form)
}

fn record_id(record: &UploadTarget) -> u64 {
    record.id().and_then(Value::as_u64).unwrap_or_default()
}

async fn record_view(state: &AppState, record: &UploadTarget) -> AppResult<RecordView> {
    let behavior = &state.behavior;
    let attribute = behavior.attribute();

    let mut thumbnails = BTreeMap::new();
    for profile in &behavior.config().thumbs {
        let url = behavior
            .thumb_upload_url(record, attribute, &profile.name)
            .await?;
        thumbnails.insert(profile.name.clone(), url);
    }

    Ok(RecordView {
        id: record_id(record),
        fields: record.fields().clone(),
        url: behavior.upload_url(record, attribute),
        thumbnails,
    })
}

/// Creates a record, storing its upload.
///
/// POST /api/records MultipartForm
///
/// # Returns
///
/// - `201 Created` with [`RecordView`] - Record and file stored
/// - `400 Bad Request` - Malformed form or unusable file name
/// - `413 Payload Too Large` - Upload or image exceeds the configured limits
/// - `500 Internal Server Error` - Storage error
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    debug!("Processing record creation");
    let behavior = &state.behavior;
    let form = read_form(&mut multipart, behavior.attribute()).await?;

    let mut record = UploadTarget::new(Scenario::Insert);
    for (name, value) in form.fields {
        record.set_attribute(&name, Value::String(value));
    }

    let mut cycle = behavior.begin_cycle();
    cycle.before_validate(&mut record, form.upload)?;
    cycle.before_save(&mut record).await?;

    let id = state.allocate_id();
    record.set_attribute(ID_FIELD, json!(id));
    record.mark_persisted();

    cycle.after_save(&record).await?;

    let view = record_view(&state, &record).await?;
    state
        .records
        .insert(id, Arc::new(tokio::sync::Mutex::new(record)));

    info!(id, "Record created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Updates a record's text fields and, if a file is sent, replaces its upload.
///
/// PUT /api/records/{id} MultipartForm
///
/// # Returns
///
/// - `200 OK` with [`RecordView`] - Record updated
/// - `404 Not Found` - No record with this id
#[instrument(skip_all, fields(id = id, request_id = %uuid::Uuid::new_v4()))]
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    debug!("Processing record update");
    let lock = state.record(id).ok_or(AppError::NotFound("Record not found"))?;
    let behavior = &state.behavior;
    let form = read_form(&mut multipart, behavior.attribute()).await?;

    let mut stored = lock.lock().await;
    let mut record = stored.clone();
    record.set_scenario(Scenario::Update);
    for (name, value) in form.fields {
        record.set_attribute(&name, Value::String(value));
    }

    let mut cycle = behavior.begin_cycle();
    cycle.before_validate(&mut record, form.upload)?;
    cycle.before_save(&mut record).await?;

    // The stored record only changes once the new file is on disk.
    record.mark_persisted();
    cycle.after_save(&record).await?;
    *stored = record;

    let view = record_view(&state, &stored).await?;
    info!(id, "Record updated");
    Ok(Json(view))
}

/// Shows a record.
///
/// GET /api/records/{id}
///
/// Missing thumbnails are generated here when the behavior defers them to the
/// first request.
#[instrument(skip_all, fields(id = id, request_id = %uuid::Uuid::new_v4()))]
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<impl IntoResponse> {
    let lock = state.record(id).ok_or(AppError::NotFound("Record not found"))?;
    let record = lock.lock().await;

    Ok(Json(record_view(&state, &record).await?))
}

/// Deletes a record and its files.
///
/// DELETE /api/records/{id}
///
/// # Returns
///
/// - `204 No Content` - Record deleted
/// - `404 Not Found` - No record with this id
#[instrument(skip_all, fields(id = id, request_id = %uuid::Uuid::new_v4()))]
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<impl IntoResponse> {
    let (_, lock) = state
        .records
        .remove(&id)
        .ok_or(AppError::NotFound("Record not found"))?;
    let record = lock.lock().await;

    let removed = state.behavior.after_delete(&*record).await?;
    info!(id, removed, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}
