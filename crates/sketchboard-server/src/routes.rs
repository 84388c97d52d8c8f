//! HTTP routes.
//!
//! Canvas endpoints live under `/api/v1/canvas`. Every mutation is a
//! load-modify-save of one canvas through [`AppState::update_canvas`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, patch, post};
use serde::Serialize;
use sketchboard_core::request::{
    EraseRequest, ImageUploadProps, ImageUrlRequest, InitCanvasRequest, PatchImageRequest, ShapeRequest, TextRequest,
};
use sketchboard_core::{ASSET_URL_PREFIX, ElementId, ImageFormat, Scene, Shape, StorageError, ValidationError, erase};
use sketchboard_render::{DecodedImage, prefetch_images, render_document};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let canvas = Router::new()
        .route("/", get(index))
        .route("/all", get(list_canvases))
        .route("/init", post(init_canvas))
        .route("/add/shape", post(add_shape))
        .route("/add/text", post(add_text))
        .route("/add/image-url", post(add_image_url))
        .route("/add/image-upload", post(add_image_upload).layer(upload_limit))
        .route("/erase", post(erase_elements))
        .route("/image", patch(patch_image))
        .route("/export/{canvas_id}", get(export_canvas))
        .route("/assets/{name}", get(get_asset))
        .route("/{canvas_id}", get(get_canvas))
        .route("/{canvas_id}/elements/{element_id}", delete(delete_element));

    Router::new()
        .nest("/api/v1/canvas", canvas)
        // Stored image urls are root-relative.
        .route("/assets/{name}", get(get_asset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSummary {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub updated_at: u64,
}

impl From<&Scene> for CanvasSummary {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id().to_string(),
            name: scene.name().to_string(),
            width: scene.width(),
            height: scene.height(),
            updated_at: scene.updated_at_ms(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedResponse {
    pub element_id: ElementId,
    pub canvas: Scene,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EraseResponse {
    pub trimmed: usize,
    pub removed: Vec<ElementId>,
    pub canvas: Scene,
}

/// `GET /api/v1/canvas`
async fn index() -> &'static str {
    "Sketchboard canvas API"
}

/// `GET /api/v1/canvas/all`: newest first.
async fn list_canvases(State(state): State<AppState>) -> ApiResult<Json<Vec<CanvasSummary>>> {
    let ids = state.storage.list().await?;
    let mut summaries = Vec::with_capacity(ids.len());
    for id in ids {
        match state.storage.load(&id).await {
            Ok(scene) => summaries.push(CanvasSummary::from(&scene)),
            // Deleted between list and load.
            Err(StorageError::NotFound(_)) => {}
            Err(StorageError::Serialization(e)) => warn!(canvas_id = %id, error = %e, "skipping unreadable canvas"),
            Err(e) => return Err(e.into()),
        }
    }
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(Json(summaries))
}

/// `POST /api/v1/canvas/init`
async fn init_canvas(
    State(state): State<AppState>,
    payload: Result<Json<InitCanvasRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Scene>)> {
    let (name, width, height) = json_body(payload)?.into_parts()?;
    let scene = state.create_canvas(Scene::new(name, width, height)?).await?;
    info!(canvas_id = scene.id(), width, height, "canvas created");
    Ok((StatusCode::CREATED, Json(scene)))
}

/// `GET /api/v1/canvas/{canvas_id}`
async fn get_canvas(State(state): State<AppState>, Path(canvas_id): Path<String>) -> ApiResult<Json<Scene>> {
    Ok(Json(state.storage.load(&canvas_id).await?))
}

async fn append(state: &AppState, canvas_id: &str, shape: Shape) -> ApiResult<(StatusCode, Json<AddedResponse>)> {
    let kind = shape.kind();
    let (canvas, element_id) = state
        .update_canvas(canvas_id, move |scene| Ok(scene.append(shape)?))
        .await?;
    info!(canvas_id, element_id = element_id.get(), kind, "element added");
    Ok((StatusCode::CREATED, Json(AddedResponse { element_id, canvas })))
}

/// `POST /api/v1/canvas/add/shape`
async fn add_shape(
    State(state): State<AppState>,
    payload: Result<Json<ShapeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddedResponse>)> {
    let (canvas_id, shape) = json_body(payload)?.into_parts()?;
    append(&state, &canvas_id, shape).await
}

/// `POST /api/v1/canvas/add/text`
async fn add_text(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddedResponse>)> {
    let (canvas_id, shape) = json_body(payload)?.into_parts()?;
    append(&state, &canvas_id, shape).await
}

/// `POST /api/v1/canvas/add/image-url`
async fn add_image_url(
    State(state): State<AppState>,
    payload: Result<Json<ImageUrlRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddedResponse>)> {
    let (canvas_id, shape) = json_body(payload)?.into_parts()?;
    append(&state, &canvas_id, shape).await
}

/// `POST /api/v1/canvas/add/image-upload`
///
/// Multipart fields: `canvasId`, `file`, optional `type` (must be `image`)
/// and optional `props` (JSON placement).
async fn add_image_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<AddedResponse>)> {
    let mut canvas_id = None;
    let mut file = None;
    let mut props = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "canvasId" => canvas_id = Some(field.text().await.map_err(multipart_error)?),
            "file" => file = Some(field.bytes().await.map_err(multipart_error)?),
            "props" => props = Some(field.text().await.map_err(multipart_error)?),
            "type" => {
                let found = field.text().await.map_err(multipart_error)?;
                if found != "image" {
                    return Err(ValidationError::UnexpectedType { expected: "image", found }.into());
                }
            }
            other => debug!(field = other, "ignoring multipart field"),
        }
    }

    let canvas_id = canvas_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ValidationError::MissingField("canvasId"))?;
    let file = file.filter(|f| !f.is_empty()).ok_or(ValidationError::MissingField("file"))?;
    let props = ImageUploadProps::parse(props.as_deref())?;

    let format = ImageFormat::from_magic_bytes(&file)
        .ok_or_else(|| ValidationError::InvalidProps("file is not a PNG, JPEG or WebP image".into()))?;
    let size = DecodedImage::decode(&file)
        .map(|image| (image.width(), image.height()))
        .map_err(|e| ValidationError::InvalidProps(format!("unreadable image: {e}")))?;

    let scene = state.storage.load(&canvas_id).await?;
    let mut image = props.into_image(Some(format), Some(size), (scene.width(), scene.height()))?;

    // Only store bytes for a request that is otherwise valid.
    image.url = state.assets.put(file.to_vec(), Some(format)).await?;
    debug!(canvas_id = %canvas_id, url = %image.url, bytes = file.len(), "image uploaded");
    append(&state, &canvas_id, Shape::Image(image)).await
}

/// `POST /api/v1/canvas/erase`
async fn erase_elements(
    State(state): State<AppState>,
    payload: Result<Json<EraseRequest>, JsonRejection>,
) -> ApiResult<Json<EraseResponse>> {
    let (canvas_id, points, eraser_size) = json_body(payload)?.into_parts()?;
    let (canvas, outcome) = state
        .update_canvas(&canvas_id, move |scene| {
            let (erased, outcome) = erase(scene, &points, eraser_size)?;
            *scene = erased;
            Ok(outcome)
        })
        .await?;
    info!(
        canvas_id = %canvas_id,
        trimmed = outcome.trimmed,
        removed = outcome.removed.len(),
        "erase applied"
    );
    Ok(Json(EraseResponse {
        trimmed: outcome.trimmed,
        removed: outcome.removed,
        canvas,
    }))
}

/// `PATCH /api/v1/canvas/image`
async fn patch_image(
    State(state): State<AppState>,
    payload: Result<Json<PatchImageRequest>, JsonRejection>,
) -> ApiResult<Json<Scene>> {
    let (canvas_id, element_id, props) = json_body(payload)?.into_parts()?;
    let (canvas, ()) = state
        .update_canvas(&canvas_id, move |scene| Ok(scene.patch_properties(element_id, &props)?))
        .await?;
    info!(canvas_id = %canvas_id, element_id = element_id.get(), "image patched");
    Ok(Json(canvas))
}

/// `DELETE /api/v1/canvas/{canvas_id}/elements/{element_id}`
async fn delete_element(
    State(state): State<AppState>,
    Path((canvas_id, element_id)): Path<(String, u64)>,
) -> ApiResult<Json<Scene>> {
    let element_id = ElementId::from(element_id);
    let (canvas, removed) = state
        .update_canvas(&canvas_id, move |scene| Ok(scene.remove(element_id)?))
        .await?;
    info!(canvas_id = %canvas_id, element_id = element_id.get(), kind = removed.kind(), "element removed");
    Ok(Json(canvas))
}

/// File name for an exported canvas.
fn export_filename(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "canvas.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

/// `GET /api/v1/canvas/export/{canvas_id}`
async fn export_canvas(State(state): State<AppState>, Path(canvas_id): Path<String>) -> ApiResult<Response> {
    let scene = state.storage.load(&canvas_id).await?;
    let images = prefetch_images(&scene, state.fetcher.as_ref()).await;
    let bytes = render_document(&scene, &images)?;
    info!(canvas_id = %canvas_id, elements = scene.len(), bytes = bytes.len(), "canvas exported");

    let disposition = format!("attachment; filename=\"{}\"", export_filename(scene.name()));
    Ok((
        [(CONTENT_TYPE, "application/pdf".to_string()), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response())
}

/// `GET /assets/{name}`
async fn get_asset(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Response> {
    let bytes = state.assets.get(&format!("{ASSET_URL_PREFIX}{name}")).await?;
    let mime = ImageFormat::from_magic_bytes(&bytes).map_or("application/octet-stream", |f| f.mime_type());
    Ok((
        [(CONTENT_TYPE, mime), (CACHE_CONTROL, "public, max-age=31536000, immutable")],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use sketchboard_core::{MemoryAssetStore, MemoryStorage};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "sketchboard-test-boundary";

    fn app() -> Router {
        router(AppState::in_memory())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn create_canvas(app: &Router, name: &str) -> String {
        let (status, body) = send_json(
            app,
            Method::POST,
            "/api/v1/canvas/init",
            json!({ "name": name, "width": 400, "height": 300 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn add_rectangle(app: &Router, canvas_id: &str) -> u64 {
        let (status, body) = send_json(
            app,
            Method::POST,
            "/api/v1/canvas/add/shape",
            json!({
                "canvasId": canvas_id,
                "type": "rectangle",
                "props": { "x": 10, "y": 10, "width": 50, "height": 30, "color": "#000" }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["elementId"].as_u64().unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart_request(fields: &[(&str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            if *name == "file" {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"file\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n",
                );
            } else {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/canvas/add/image-upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn pdf_operators(bytes: &[u8]) -> (usize, Vec<String>) {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        let page_id = *pages.values().next().unwrap();
        let content = lopdf::content::Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        (pages.len(), content.operations.into_iter().map(|op| op.operator).collect())
    }

    #[tokio::test]
    async fn test_init_and_load() {
        let app = app();
        let id = create_canvas(&app, "Board").await;

        let (status, body) = get(&app, &format!("/api/v1/canvas/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        let scene: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(scene["name"], "Board");
        assert_eq!(scene["width"], 400);
        assert_eq!(scene["elements"], json!([]));
    }

    #[tokio::test]
    async fn test_init_requires_dimensions() {
        let app = app();
        let (status, body) = send_json(&app, Method::POST, "/api/v1/canvas/init", json!({ "name": "x", "width": 10 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("height"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/canvas/add/shape")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_canvas_is_not_found() {
        let app = app();
        let (status, _) = get(&app, "/api/v1/canvas/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/add/text",
            json!({ "canvasId": "does-not-exist", "type": "text", "props": { "x": 0, "y": 0, "text": "hi" } }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_shape_validation() {
        let app = app();
        let id = create_canvas(&app, "Board").await;

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/add/shape",
            json!({ "canvasId": id, "type": "triangle", "props": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("triangle"));

        let (_, body) = get(&app, &format!("/api/v1/canvas/{id}")).await;
        let scene: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(scene["elements"], json!([]));
    }

    #[tokio::test]
    async fn test_erase_removes_struck_rectangle() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let rect_id = add_rectangle(&app, &id).await;
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/add/shape",
            json!({
                "canvasId": id,
                "type": "path",
                "props": { "points": [{ "x": 200, "y": 200 }, { "x": 210, "y": 200 }] }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/erase",
            json!({ "canvasId": id, "erasedPoints": [{ "x": 30, "y": 20 }], "eraserSize": 2 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], json!([rect_id]));
        assert_eq!(body["canvas"]["elements"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_erase_rejects_negative_size() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/erase",
            json!({ "canvasId": id, "erasedPoints": [], "eraserSize": -5 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_image() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/add/image-url",
            json!({
                "canvasId": id,
                "type": "image",
                "props": { "url": "https://example.com/cat.png", "width": 100, "height": 80 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let image_id = body["elementId"].as_u64().unwrap();

        let (status, body) = send_json(
            &app,
            Method::PATCH,
            "/api/v1/canvas/image",
            json!({ "canvasId": id, "elementId": image_id, "props": { "x": 25, "width": 50 } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let props = &body["elements"][0]["shape"]["props"];
        assert_eq!(props["x"], 25.0);
        assert_eq!(props["width"], 50.0);
        assert_eq!(props["height"], 80.0);

        let (status, _) = send_json(
            &app,
            Method::PATCH,
            "/api/v1/canvas/image",
            json!({ "canvasId": id, "elementId": 999, "props": { "x": 1 } }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_rejects_non_image() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let rect_id = add_rectangle(&app, &id).await;
        let (status, _) = send_json(
            &app,
            Method::PATCH,
            "/api/v1/canvas/image",
            json!({ "canvasId": id, "elementId": rect_id, "props": { "x": 1 } }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_element() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let rect_id = add_rectangle(&app, &id).await;
        let uri = format!("/api/v1/canvas/{id}/elements/{rect_id}");

        let request = Request::builder().method(Method::DELETE).uri(&uri).body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder().method(Method::DELETE).uri(&uri).body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let app = app();
        let first = create_canvas(&app, "First").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = create_canvas(&app, "Second").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        add_rectangle(&app, &first).await;

        let (status, body) = get(&app, "/api/v1/canvas/all").await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_slice(&body).unwrap();
        let ids: Vec<_> = list.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
        assert_eq!(ids, [first.as_str(), second.as_str()]);
    }

    #[tokio::test]
    async fn test_export_pdf() {
        let app = app();
        let id = create_canvas(&app, "My Board").await;
        add_rectangle(&app, &id).await;
        // Unreachable image: skipped, export still succeeds.
        send_json(
            &app,
            Method::POST,
            "/api/v1/canvas/add/image-url",
            json!({
                "canvasId": id,
                "type": "image",
                "props": { "url": "/assets/missing.png", "width": 10, "height": 10 }
            }),
        )
        .await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri(format!("/api/v1/canvas/export/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"My Board.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let (pages, operators) = pdf_operators(&bytes);
        assert_eq!(pages, 1);
        assert!(operators.iter().any(|op| op == "re"));
        assert!(!operators.iter().any(|op| op == "Do"));
    }

    #[tokio::test]
    async fn test_image_upload_round_trip() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let image = png(8, 6);

        let request = multipart_request(&[
            ("canvasId", id.as_bytes()),
            ("type", b"image"),
            ("props", br#"{ "x": 5, "y": 7 }"#),
            ("file", &image),
        ]);
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        let props = &body["canvas"]["elements"][0]["shape"]["props"];
        assert_eq!(props["width"], 8.0);
        assert_eq!(props["height"], 6.0);
        assert_eq!(props["x"], 5.0);
        assert_eq!(props["format"], "png");

        let url = props["url"].as_str().unwrap();
        let (status, served) = get(&app, url).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served, image);

        let (_, pdf) = get(&app, &format!("/api/v1/canvas/export/{id}")).await;
        let (_, operators) = pdf_operators(&pdf);
        assert_eq!(operators.iter().filter(|op| *op == "Do").count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_stores_nothing() {
        let assets = Arc::new(MemoryAssetStore::new());
        let state = AppState::new(
            Arc::new(MemoryStorage::new()),
            assets.clone(),
            Duration::from_secs(1),
            crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        )
        .unwrap();
        let app = router(state);
        let id = create_canvas(&app, "Board").await;
        let image = png(4, 4);

        let request = multipart_request(&[
            ("canvasId", id.as_bytes()),
            ("props", br#"{ "width": -5 }"#),
            ("file", &image),
        ]);
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = multipart_request(&[("canvasId", b"no-such-canvas"), ("file", &image)]);
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn test_upload_larger_than_canvas_is_shrunk() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let image = png(800, 200);

        let request = multipart_request(&[("canvasId", id.as_bytes()), ("file", &image)]);
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        let props = &body["canvas"]["elements"][0]["shape"]["props"];
        assert_eq!(props["width"], 400.0);
        assert_eq!(props["height"], 100.0);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let request = multipart_request(&[("canvasId", id.as_bytes()), ("file", b"plain text")]);
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_requires_file() {
        let app = app();
        let id = create_canvas(&app, "Board").await;
        let request = multipart_request(&[("canvasId", id.as_bytes())]);
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("file"));
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Q3 plan"), "Q3 plan.pdf");
        assert_eq!(export_filename("../etc"), "___etc.pdf");
        assert_eq!(export_filename("   "), "canvas.pdf");
    }
}
