use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use scribe_core::CoreError;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;

/// 5 MB upload limit for post images
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Subdirectory (and reference prefix) for post images.
const POSTS_DIR: &str = "posts";

/// On-disk storage for images attached to posts.
///
/// Each image is stored as a single flat file at `{media_dir}/posts/{uuid}`
/// and referenced from the post as `posts/{uuid}`.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(media_dir: PathBuf) -> Result<Self> {
        let dir = media_dir.join(POSTS_DIR);
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Store a blob and return its reference.
    pub async fn save(&self, bytes: &[u8]) -> Result<String> {
        let file_id = Uuid::new_v4().to_string();
        let path = self.dir.join(&file_id);

        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(format!("{}/{}", POSTS_DIR, file_id))
    }

    /// Read a stored image by file name. Names that are not UUIDs are
    /// refused so a request can never escape the storage directory.
    pub async fn read(&self, file_id: &str) -> Result<Option<Vec<u8>>> {
        if file_id.parse::<Uuid>().is_err() {
            return Ok(None);
        }

        match fs::read(self.dir.join(file_id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Decode and store an optional base64 image from a post form.
pub(crate) async fn store_upload(
    state: &AppState,
    image: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let Some(encoded) = image.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let bytes = B64
        .decode(encoded)
        .map_err(|_| ApiError::BadRequest("image is not valid base64".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("image is empty".into()));
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::TooLarge);
    }

    let reference = state.images.save(&bytes).await.map_err(|e| {
        error!("Failed to store image: {}", e);
        ApiError::Internal(e)
    })?;
    Ok(Some(reference))
}

/// GET /media/posts/{file_id}
pub async fn serve_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .images
        .read(&file_id)
        .await?
        .ok_or_else(|| CoreError::not_found("image", &file_id))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
