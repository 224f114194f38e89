// GET /supported-formats: which upload formats this build can decode.

use axum::response::IntoResponse;
use axum::Json;

use crate::extract::supported_formats as compiled_formats;

pub async fn supported_formats() -> impl IntoResponse {
    Json(compiled_formats())
}
