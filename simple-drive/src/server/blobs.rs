use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simple_drive_core::Error;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct BlobCreateRequest {
    pub id: String,
    /// Base64 encoded payload.
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct BlobCreateResponse {
    pub id: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub storage_backend: String,
}

#[derive(Debug, Serialize)]
pub struct BlobResponse {
    pub id: String,
    pub data: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn create_blob(
    State(state): State<AppState>,
    Json(request): Json<BlobCreateRequest>,
) -> Result<(StatusCode, Json<BlobCreateResponse>), ApiError> {
    if request.id.is_empty() {
        return Err(ApiError(Error::InvalidPayload(
            "blob id cannot be empty".to_string(),
        )));
    }

    let data = decode_payload(&request.data)?;

    let metadata = state.service.create_blob(&request.id, &data).await?;

    Ok((
        StatusCode::CREATED,
        Json(BlobCreateResponse {
            id: metadata.id,
            size: metadata.size,
            created_at: metadata.created_at,
            storage_backend: metadata.storage_backend,
        }),
    ))
}

pub async fn get_blob(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
) -> Result<Json<BlobResponse>, ApiError> {
    let (data, metadata) = state.service.get_blob(&blob_id).await?;

    Ok(Json(BlobResponse {
        id: metadata.id,
        data: base64::encode(&data),
        size: metadata.size,
        created_at: metadata.created_at,
    }))
}

fn decode_payload(data: &str) -> Result<Vec<u8>, ApiError> {
    if data.is_empty() {
        return Err(ApiError(Error::InvalidPayload(
            "base64 payload cannot be empty".to_string(),
        )));
    }

    base64::decode(data)
        .map_err(|err| ApiError(Error::InvalidPayload(format!("invalid base64 payload: {err}"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload_round_trips() {
        let decoded = decode_payload(&base64::encode(b"Hello World")).unwrap();
        assert_eq!(decoded, b"Hello World");
    }

    #[test]
    fn test_decode_payload_rejects_empty_input() {
        assert!(decode_payload("").is_err());
    }

    #[test]
    fn test_decode_payload_rejects_invalid_input() {
        assert!(decode_payload("not base64!!").is_err());
    }
}
