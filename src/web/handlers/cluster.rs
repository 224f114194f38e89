// POST /cluster: cluster pasted documents or uploaded files.
//
// Accepts either a JSON body `{ "documents": [...], "clusters": k }` or a
// multipart form with one or more `files` parts and an optional `clusters`
// field. Files that fail to extract are reported back as `warnings`.
//
// Returns 200 with the clusters on success, 400 for bad input and 500 when
// the model or the numeric stages fail.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::extract::{process_files, UploadedFile};
use crate::pipeline;
use crate::pipeline::MIN_CLUSTERS;
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
struct ClusterRequest {
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default)]
    clusters: Option<Value>,
}

/// Documents gathered from the request body, before validation.
struct Submission {
    documents: Vec<String>,
    k: usize,
    warnings: Vec<String>,
}

pub async fn cluster(State(state): State<AppState>, request: Request) -> Response {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let submission = if content_type.starts_with("multipart/form-data") {
        match Multipart::from_request(request, &state).await {
            Ok(multipart) => from_multipart(multipart).await,
            Err(rejection) => Err(api_error(StatusCode::BAD_REQUEST, &rejection.body_text())),
        }
    } else if content_type.starts_with("application/json") {
        match Json::<ClusterRequest>::from_request(request, &state).await {
            Ok(Json(body)) => from_json(body),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "Unreadable JSON body");
                Err(api_error(StatusCode::BAD_REQUEST, "No JSON received"))
            }
        }
    } else {
        Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please provide either documents or files",
        ))
    };

    let submission = match submission {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    info!(
        documents = submission.documents.len(),
        k = submission.k,
        "Clustering request"
    );

    match pipeline::run(
        &submission.documents,
        submission.k,
        state.embedder.as_ref(),
        state.extractor.as_ref(),
        &state.options,
    )
    .await
    {
        Ok(report) => Json(serde_json::json!({
            "clusters": report.clusters,
            "excluded": report.excluded,
            "warnings": submission.warnings,
            "success": true,
        }))
        .into_response(),
        Err(e) if e.is_validation() => api_error(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            error!(stage = %e.stage, error = %e, "Clustering failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Clustering failed: {e}"),
            )
        }
    }
}

fn from_json(body: ClusterRequest) -> Result<Submission, Response> {
    if body.documents.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please enter at least one document",
        ));
    }

    Ok(Submission {
        documents: body.documents,
        k: parse_cluster_count(body.clusters.as_ref())?,
        warnings: Vec::new(),
    })
}

async fn from_multipart(mut multipart: Multipart) -> Result<Submission, Response> {
    let mut files = Vec::new();
    let mut clusters = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(api_error(StatusCode::BAD_REQUEST, &e.body_text())),
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("files") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?;
                files.push(UploadedFile::new(name, bytes.to_vec()));
            }
            Some("clusters") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?;
                clusters = Some(Value::String(text));
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please provide either documents or files",
        ));
    }

    let k = parse_cluster_count(clusters.as_ref())?;
    let file_count = files.len();

    // PDF and archive decoding is CPU-bound.
    let (documents, warnings) = tokio::task::spawn_blocking(move || process_files(&files))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Clustering failed: {e}"),
            )
        })?;

    if !warnings.is_empty() {
        warn!(warnings = ?warnings, "File processing warnings");
    }

    if documents.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            &format!("No documents extracted. Errors: {}", warnings.join("; ")),
        ));
    }

    info!(
        documents = documents.len(),
        files = file_count,
        "Extracted documents from files"
    );

    Ok(Submission {
        documents,
        k,
        warnings,
    })
}

/// Read `clusters` as a whole number, from a JSON number or a string.
/// Absent means the minimum.
fn parse_cluster_count(value: Option<&Value>) -> Result<usize, Response> {
    let parsed = match value {
        None | Some(Value::Null) => Some(MIN_CLUSTERS as u64),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    parsed
        .and_then(|k| usize::try_from(k).ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "Number of clusters must be a whole number",
            )
        })
}
