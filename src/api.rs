use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::records::{ComposeOutcome, ProcessError, SettingsPatch};
use crate::{ingest, package, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSummary {
    pub sku: String,
    pub action: String,
    pub title: String,
    pub price: String,
    pub filename: String,
    pub approved: bool,
    pub status: String,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapPhotoRequest {
    pub filename: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ComposeQuery {
    /// Recompose the record automatically after the edit (debounced).
    #[serde(default)]
    pub auto: bool,
}

fn process_err(e: ProcessError) -> (StatusCode, String) {
    match e {
        ProcessError::NoTemplate => (StatusCode::BAD_REQUEST, e.to_string()),
        ProcessError::BadIndex(_) => (StatusCode::NOT_FOUND, e.to_string()),
    }
}

#[utoipa::path(get, path = "/health", tag = "cardgen", responses((status=200, body=HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".into() })
}

#[utoipa::path(
    post,
    path = "/template",
    tag = "cardgen",
    request_body(content = String, content_type = "multipart/form-data"),
    responses((status=200), (status=400, description="Not a decodable image"))
)]
pub async fn upload_template(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        st.assets
            .set_template(&bytes)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        return Ok(StatusCode::OK);
    }
    Err((StatusCode::BAD_REQUEST, "no template file in request".into()))
}

#[utoipa::path(
    post,
    path = "/photos",
    tag = "cardgen",
    request_body(content = String, content_type = "multipart/form-data"),
    responses((status=200, body=CountResponse))
)]
pub async fn upload_photos(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut count = 0;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        // Same-named uploads supersede earlier bytes.
        st.assets.put_photo(name, bytes.to_vec());
        count += 1;
    }
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(get, path = "/photos", tag = "cardgen", responses((status=200, body=[String])))]
pub async fn list_photos(State(st): State<AppState>) -> impl IntoResponse {
    Json(st.assets.photo_names())
}

#[utoipa::path(
    post,
    path = "/records",
    tag = "cardgen",
    request_body(content = String, content_type = "text/csv"),
    responses((status=200, body=CountResponse), (status=400, description="Malformed CSV"))
)]
pub async fn load_records(
    State(st): State<AppState>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let records =
        ingest::parse_records(&body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let count = records.len();
    st.processor.load_records(records);
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(get, path = "/records", tag = "cardgen", responses((status=200, body=[RecordSummary])))]
pub async fn list_records(State(st): State<AppState>) -> impl IntoResponse {
    let summaries: Vec<RecordSummary> = st
        .processor
        .snapshot()
        .into_iter()
        .map(|r| RecordSummary {
            sku: r.sku,
            action: r.action,
            title: r.title,
            price: r.price,
            filename: r.filename,
            approved: r.approved,
            status: r.status.to_string(),
            output: r.result.map(|res| res.filename),
        })
        .collect();
    Json(summaries)
}

#[utoipa::path(
    post,
    path = "/compose",
    tag = "cardgen",
    responses((status=200), (status=400, description="No template loaded"))
)]
pub async fn compose_all(
    State(st): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    st.processor.compose_all().await.map_err(process_err)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/records/{index}/compose",
    tag = "cardgen",
    params(("index" = usize, Path, description = "Record index")),
    responses((status=200, body=serde_json::Value), (status=404))
)]
pub async fn compose_one(
    State(st): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = st.processor.compose_one(index).await.map_err(process_err)?;
    let outcome = match outcome {
        ComposeOutcome::Ran => "ran",
        ComposeOutcome::Skipped => "skipped",
    };
    Ok(Json(serde_json::json!({ "outcome": outcome })))
}

#[utoipa::path(
    patch,
    path = "/records/{index}/settings",
    tag = "cardgen",
    params(("index" = usize, Path, description = "Record index"), ComposeQuery),
    request_body = SettingsPatch,
    responses((status=200), (status=404))
)]
pub async fn update_settings(
    State(st): State<AppState>,
    Path(index): Path<usize>,
    Query(q): Query<ComposeQuery>,
    Json(patch): Json<SettingsPatch>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    st.processor
        .update_settings(index, patch, q.auto)
        .map_err(process_err)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    patch,
    path = "/records/{index}/photo",
    tag = "cardgen",
    params(("index" = usize, Path, description = "Record index")),
    request_body = SwapPhotoRequest,
    responses((status=200), (status=404))
)]
pub async fn swap_photo(
    State(st): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<SwapPhotoRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    st.processor
        .swap_photo(index, req.filename)
        .map_err(process_err)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    patch,
    path = "/records/{index}/approve",
    tag = "cardgen",
    params(("index" = usize, Path, description = "Record index")),
    request_body = ApproveRequest,
    responses((status=200), (status=404))
)]
pub async fn set_approved(
    State(st): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    st.processor
        .set_approved(index, req.approved)
        .map_err(process_err)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/records/{index}/image",
    tag = "cardgen",
    params(("index" = usize, Path, description = "Record index")),
    responses(
        (status=200, description="Composed card", content_type="image/jpeg"),
        (status=404, description="No result for this record")
    )
)]
pub async fn record_image(
    State(st): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = st.processor.record(index).map_err(process_err)?;
    let result = record.result.ok_or((
        StatusCode::NOT_FOUND,
        format!("record {index} has no composed image"),
    ))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], result.bytes))
}

#[utoipa::path(
    get,
    path = "/bundle",
    tag = "cardgen",
    responses((status=200, description="ZIP with images and reports", content_type="application/zip"))
)]
pub async fn download_bundle(
    State(st): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let records = st.processor.snapshot();
    let zip = package::bundle(&records)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"catalog_images.zip\"".to_string(),
            ),
        ],
        zip,
    ))
}
