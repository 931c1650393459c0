//! Signing Routes
//!
//! Endpoints:
//! - POST /sign - Stamp the uploaded PDF and return it as `signed.pdf`
//! - POST /api/sign - Same handler, for clients that prefix the API path
//!
//! Multipart fields:
//! - `file` (required) - the PDF, filename must end in `.pdf`
//! - `signerName` - signer identifier, reduced to at most 3 initials
//! - `displayName` - written as the document title when non-empty

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use uuid::Uuid;

use crate::config::StampConfig;
use crate::error::{AppError, Result};
use crate::stamp::StampRequest;
use crate::state::AppState;

/// Initials used when the signer name has no letters
pub const DEFAULT_INITIALS: &str = "AA";

/// Maximum number of initials kept from the signer name
pub const MAX_INITIALS: usize = 3;

/// Download name of the stamped document
pub const SIGNED_FILE_NAME: &str = "signed.pdf";

// ============================================================================
// Router
// ============================================================================

/// Create the signing router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign", post(sign_pdf))
        .route("/api/sign", post(sign_pdf))
}

// ============================================================================
// Handlers
// ============================================================================

/// Fields collected from the multipart upload
#[derive(Default)]
struct SignForm {
    file: Option<UploadedFile>,
    signer_name: String,
    display_name: String,
}

struct UploadedFile {
    name: String,
    data: Vec<u8>,
}

/// POST /sign
async fn sign_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let request_id = Uuid::new_v4();

    // A body that is not multipart carries no upload at all
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(request_id = %request_id, "Not a multipart body: {}", rejection);
        AppError::MissingFile
    })?;
    let form = read_form(multipart).await?;

    let file = form.file.ok_or(AppError::MissingFile)?;
    if !is_pdf_file_name(&file.name) {
        return Err(AppError::InvalidFileType(file.name));
    }

    let text = stamp_text(&state.config().stamp, &form.signer_name);
    let mut request = StampRequest::new(text);
    let title = form.display_name.trim();
    if !title.is_empty() {
        request = request.with_title(title);
    }

    tracing::info!(
        request_id = %request_id,
        file_name = %file.name,
        size = file.data.len(),
        stamp_text = %request.text,
        "Signing upload"
    );

    let span = tracing::info_span!("stamp", request_id = %request_id);
    let worker_state = state.clone();
    let signed = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        worker_state.stamper().stamp(&file.data, &request)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Stamping task failed: {}", e)))??;

    tracing::info!(
        request_id = %request_id,
        pages = signed.page_count,
        size = signed.data.len(),
        "Signed PDF ready"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SIGNED_FILE_NAME),
            ),
        ],
        signed.data,
    )
        .into_response())
}

/// Drain the multipart stream, keeping the fields the handler understands
async fn read_form(mut multipart: Multipart) -> Result<SignForm> {
    let mut form = SignForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                // A plain text part named `file` is not an upload
                let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
                    tracing::debug!("Ignoring 'file' field without a filename");
                    continue;
                };
                if form.file.is_some() {
                    tracing::debug!("Ignoring extra upload '{}'", file_name);
                    continue;
                }
                let data = field.bytes().await.map_err(multipart_error)?;
                tracing::debug!("Read {} bytes for '{}'", data.len(), file_name);
                form.file = Some(UploadedFile {
                    name: file_name,
                    data: data.to_vec(),
                });
            }
            "signerName" => form.signer_name = field.text().await.map_err(multipart_error)?,
            "displayName" => form.display_name = field.text().await.map_err(multipart_error)?,
            other => tracing::debug!("Ignoring unknown multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether the uploaded filename names a PDF
fn is_pdf_file_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

/// Reduce a signer name to uppercase initials
///
/// Keeps alphabetic characters only, uppercases them and truncates to
/// [`MAX_INITIALS`], falling back to [`DEFAULT_INITIALS`].
pub fn derive_initials(signer_name: &str) -> String {
    let initials: String = signer_name
        .trim()
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .take(MAX_INITIALS)
        .collect();

    if initials.is_empty() {
        DEFAULT_INITIALS.to_string()
    } else {
        initials
    }
}

/// The full text stamped onto each page
pub fn stamp_text(config: &StampConfig, signer_name: &str) -> String {
    let signer = match &config.fixed_signer {
        Some(fixed) => fixed.clone(),
        None => derive_initials(signer_name),
    };
    format!("{}{}", config.label_prefix, signer)
}
