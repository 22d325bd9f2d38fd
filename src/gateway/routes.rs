use crate::cache::CachedRequirement;
use crate::detector::{self, DetectedRequirement};
use crate::fitter::{self, output_filename, FitRequest, OutputEncoding};
use crate::gateway::auth;
use crate::gateway::protocol::*;
use crate::gateway::server::GatewayState;
use crate::prefs::{site_key, Preferences};

use axum::{
    extract::{
        multipart::Field, ConnectInfo, DefaultBodyLimit, Json, Multipart, Path, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorBody>);

/// Build all routes for the gateway.
pub fn build_routes(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body = state.max_input_bytes;

    Router::new()
        // Health
        .route("/api/health", get(health_handler))
        .route("/api/info", get(info_handler))
        // Detection ("updateRequirements" / "getRequirements")
        .route("/api/detect", post(detect_handler))
        .route(
            "/api/requirements/{tab_id}",
            get(requirements_get_handler).delete(requirements_delete_handler),
        )
        // Fitting (resize requests)
        .route("/api/fit", post(fit_json_handler))
        .route("/api/fit/upload", post(fit_upload_handler))
        // Preferences
        .route("/api/prefs", get(prefs_get_handler).put(prefs_put_handler))
        .route("/api/prefs/sites/{site}", get(site_pref_get_handler).put(site_pref_put_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Auth
// ============================================================================

async fn auth_middleware(
    State(state): State<GatewayState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    // Health stays open for probes.
    if request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(auth::extract_bearer_token);

    if auth::authorize_request(&state.auth, bearer, auth::is_local_request(&addr)) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("unauthorized", "missing or invalid token")),
        )
            .into_response()
    }
}

// ============================================================================
// Health
// ============================================================================

async fn health_handler(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime,
    })
}

async fn info_handler(State(state): State<GatewayState>) -> Json<GatewayInfo> {
    let uptime = state.start_time.elapsed().as_secs();
    let config = state.config.read().await;
    Json(GatewayInfo {
        version: state.version.clone(),
        uptime_seconds: uptime,
        cached_requirements: state.cache.len(),
        default_encoding: config.fitter.default_encoding.to_string(),
    })
}

// ============================================================================
// Detection
// ============================================================================

async fn detect_handler(
    State(state): State<GatewayState>,
    Json(req): Json<DetectRequest>,
) -> Json<DetectResponse> {
    let text = detector::normalize_text(&req.text);
    let detected = detector::detect(&text);

    if let (Some(tab_id), Some(requirement)) = (req.tab_id.as_deref(), detected) {
        debug!("Caching detected requirement for tab {tab_id}");
        state.cache.update(tab_id, requirement);
    }

    Json(DetectResponse { detected })
}

async fn requirements_get_handler(
    State(state): State<GatewayState>,
    Path(tab_id): Path<String>,
) -> Result<Json<CachedRequirement>, StatusCode> {
    state
        .cache
        .get(&tab_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn requirements_delete_handler(
    State(state): State<GatewayState>,
    Path(tab_id): Path<String>,
) -> StatusCode {
    if state.cache.evict(&tab_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Fitting
// ============================================================================

async fn fit_json_handler(
    State(state): State<GatewayState>,
    Json(body): Json<FitRequestBody>,
) -> Result<Json<FitResponseBody>, ApiError> {
    let encoding = resolve_encoding(&state, body.encoding.as_deref())?;
    let image = decode_image_payload(&body.image).map_err(|e| bad_request(&e))?;
    if image.len() > state.max_input_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorBody::new("payloadTooLarge", "image exceeds upload limit")),
        ));
    }
    run_fit(
        image,
        body.width,
        body.height,
        body.max_size_kb,
        encoding,
        body.filename,
    )
    .await
}

async fn fit_upload_handler(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<Json<FitResponseBody>, ApiError> {
    let mut image: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut max_size_kb: Option<u32> = None;
    let mut encoding_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                filename = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("failed to read image field: {e}")))?;
                image = Some(bytes.to_vec());
            }
            "width" => width = Some(numeric_field(field, "width").await?),
            "height" => height = Some(numeric_field(field, "height").await?),
            "maxSizeKB" => max_size_kb = Some(numeric_field(field, "maxSizeKB").await?),
            "encoding" => {
                encoding_field = Some(field.text().await.map_err(|e| {
                    bad_request(&format!("failed to read encoding field: {e}"))
                })?);
            }
            other => debug!("Ignoring unknown multipart field '{other}'"),
        }
    }

    let encoding = resolve_encoding(&state, encoding_field.as_deref())?;
    let image = image.ok_or_else(|| bad_request("missing 'image' field"))?;
    let width = width.ok_or_else(|| bad_request("missing 'width' field"))?;
    let height = height.ok_or_else(|| bad_request("missing 'height' field"))?;

    run_fit(image, width, height, max_size_kb, encoding, filename).await
}

/// Shared fit path: validate, run the CPU-bound pipeline off the reactor,
/// verify the output, and shape the response.
async fn run_fit(
    image: Vec<u8>,
    width: u32,
    height: u32,
    max_size_kb: Option<u32>,
    encoding: OutputEncoding,
    filename: Option<String>,
) -> Result<Json<FitResponseBody>, ApiError> {
    if width == 0 || height == 0 {
        return Err(bad_request("width and height must be positive"));
    }
    if image.is_empty() {
        return Err(bad_request("image payload is empty"));
    }

    let job = Uuid::new_v4();
    info!(
        "Fit job {job}: {}x{}, budget {:?} KB, encoding {}, {} input bytes",
        width,
        height,
        max_size_kb,
        encoding,
        image.len()
    );

    let request = FitRequest {
        image,
        width,
        height,
        max_size_kb,
        encoding,
    };

    let result = tokio::task::spawn_blocking(move || {
        let result = fitter::fit(&request)?;
        let requirement = DetectedRequirement {
            width: Some(request.width),
            height: Some(request.height),
            max_size_kb: request.max_size_kb,
        };
        fitter::verify(&result.bytes, &requirement)?;
        Ok::<_, fitter::FitError>(result)
    })
    .await
    .map_err(|e| {
        error!("Fit job {job} aborted: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("internal", "fit task failed")),
        )
    })?
    .map_err(|e| {
        let (status, kind) = fit_error_parts(&e);
        info!("Fit job {job} failed ({kind}): {e}");
        (status, Json(ErrorBody::new(kind, e.to_string())))
    })?;

    info!(
        "Fit job {job} done: {} bytes at quality {:.2} after {} compression steps",
        result.size_bytes(),
        result.quality,
        result.iterations
    );

    Ok(Json(FitResponseBody {
        image: encode_image_payload(&result.bytes),
        filename: output_filename(filename.as_deref().unwrap_or(""), encoding),
        size_bytes: result.size_bytes(),
        quality: result.quality,
        iterations: result.iterations,
    }))
}

// ============================================================================
// Preferences
// ============================================================================

async fn prefs_get_handler(State(state): State<GatewayState>) -> Json<Preferences> {
    Json(state.prefs.snapshot())
}

async fn prefs_put_handler(
    State(state): State<GatewayState>,
    Json(prefs): Json<Preferences>,
) -> Result<Json<Preferences>, ApiError> {
    state
        .prefs
        .replace(prefs.clone())
        .map_err(|e| internal_error(&format!("failed to persist preferences: {e:#}")))?;
    Ok(Json(prefs))
}

async fn site_pref_get_handler(
    State(state): State<GatewayState>,
    Path(site): Path<String>,
) -> Json<SitePrefResponse> {
    let key = site_key(&site);
    let prefs = state.prefs.snapshot();
    let floating_enabled = prefs.floating_enabled_for(&key);
    Json(SitePrefResponse {
        site: key,
        floating_enabled,
    })
}

async fn site_pref_put_handler(
    State(state): State<GatewayState>,
    Path(site): Path<String>,
    Json(body): Json<SitePrefBody>,
) -> Result<Json<Preferences>, ApiError> {
    let key = site_key(&site);
    let updated = state
        .prefs
        .set_site_override(&key, body.enabled)
        .map_err(|e| internal_error(&format!("failed to persist preferences: {e:#}")))?;
    Ok(Json(updated))
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_encoding(
    state: &GatewayState,
    requested: Option<&str>,
) -> Result<OutputEncoding, ApiError> {
    match requested {
        Some(s) => s.parse().map_err(|e: String| bad_request(&e)),
        None => Ok(state.default_encoding),
    }
}

async fn numeric_field(field: Field<'_>, name: &str) -> Result<u32, ApiError> {
    let text = field
        .text()
        .await
        .map_err(|e| bad_request(&format!("failed to read field '{name}': {e}")))?;
    text.trim()
        .parse()
        .map_err(|_| bad_request(&format!("field '{name}' must be a positive integer")))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new("badRequest", message)),
    )
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("internal", message)),
    )
}
