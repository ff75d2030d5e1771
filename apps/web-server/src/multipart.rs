//! Multipart post form parsing.

use actix_multipart::{Field, Multipart};
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};

use folio_core::validation::{CONTENT, FEATURED_IMAGE, PostInput, TITLE, UploadedFile};

use crate::middleware::error::AppError;

/// Upper bound for a single text field.
const MAX_TEXT_BYTES: usize = 1024 * 1024;

/// Read the post form out of a multipart body.
///
/// Unknown fields are skipped. The image is buffered up to `max_image_bytes`;
/// anything past that is drained but still counted, so validation can report
/// the real size.
pub async fn read_post_input(
    mut payload: Multipart,
    max_image_bytes: usize,
) -> Result<PostInput, AppError> {
    let mut input = PostInput::default();

    while let Some(field) = payload.try_next().await.map_err(malformed)? {
        let name = field.name().to_string();
        match name.as_str() {
            TITLE => input.title = Some(read_text(field).await?),
            CONTENT => input.content = Some(read_text(field).await?),
            FEATURED_IMAGE => input.featured_image = Some(read_file(field, max_image_bytes).await?),
            other => {
                tracing::debug!(field = other, "Skipping unknown form field");
                drain(field).await?;
            }
        }
    }

    Ok(input)
}

async fn read_text(mut field: Field) -> Result<String, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        if buf.len() + chunk.len() > MAX_TEXT_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "The {} field is too large.",
                field.name()
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn read_file(mut field: Field, max_bytes: usize) -> Result<UploadedFile, AppError> {
    let file_name = field
        .content_disposition()
        .get_filename()
        .map(str::to_string)
        .filter(|name| !name.trim().is_empty());
    let content_type = field.content_type().map(|mime| mime.to_string());

    let mut buf = BytesMut::new();
    let mut size = 0usize;
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        size = size.saturating_add(chunk.len());
        if buf.len() < max_bytes {
            let room = max_bytes - buf.len();
            buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        size,
        bytes: Bytes::from(buf),
    })
}

async fn drain(mut field: Field) -> Result<(), AppError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

fn malformed(err: actix_multipart::MultipartError) -> AppError {
    tracing::warn!(error = %err, "Failed to read multipart payload");
    AppError::BadRequest("Malformed form data".to_string())
}
