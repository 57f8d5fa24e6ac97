//! Ingestion endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{IngestRequest, IngestResponse};

/// POST /api/ingest - ingest raw plain text
pub async fn ingest_text(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    let document = state.engine().ingest(&request.title, &request.text).await?;

    Ok(Json(IngestResponse {
        document_id: document.id,
        title: document.title,
        chunk_count: document.chunk_count,
    }))
}

/// POST /api/ingest/upload - ingest plain-text files via multipart
pub async fn ingest_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<IngestResponse>>> {
    let mut responses = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("invalid multipart body: {}", e)))?
    {
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload.txt".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_request(format!("failed to read upload: {}", e)))?;

        let text = String::from_utf8(data.to_vec())
            .map_err(|_| Error::ingestion(format!("'{}' is not valid UTF-8 text", filename)))?;

        let document = state.engine().ingest(&filename, &text).await?;
        responses.push(IngestResponse {
            document_id: document.id,
            title: document.title,
            chunk_count: document.chunk_count,
        });
    }

    if responses.is_empty() {
        return Err(Error::invalid_request("no files in upload"));
    }

    Ok(Json(responses))
}
