use crate::command::is_pdf_file;
use crate::error::{AppError, AppResult};
use crate::options::PrintOptions;
use crate::printer::Printer;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub struct AppState {
    pub printer: Arc<dyn Printer>,
}

/// Runs a blocking printer call off the async runtime.
async fn blocking<T, F>(printer: Arc<dyn Printer>, f: F) -> AppResult<T>
where
    F: FnOnce(&dyn Printer) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(printer.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("printer task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Print an uploaded PDF (multipart form)
pub async fn print_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file_data: Option<(String, Bytes)> = None;
    let mut options = PrintOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::InvalidRequest(format!("Failed to parse multipart data: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let filename = field
                .file_name()
                .ok_or_else(|| AppError::InvalidRequest("No filename provided".to_string()))?
                .to_string();
            let content_type = field.content_type().map(str::to_string);

            let data = field.bytes().await.map_err(|e| {
                AppError::InvalidRequest(format!("Failed to read file data: {}", e))
            })?;

            info!("Received file: {} ({} bytes)", filename, data.len());
            file_data = Some((upload_file_name(&filename, content_type.as_deref()), data));
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::InvalidRequest(format!("Failed to read field {}: {}", name, e))
            })?;
            apply_form_field(&mut options, &name, value)?;
        }
    }

    let (filename, data) = file_data.ok_or(AppError::NoFileProvided)?;
    submit(state, &filename, data, options).await
}

#[derive(Debug, Deserialize)]
pub struct Base64PrintRequest {
    #[serde(default)]
    pub filename: Option<String>,
    /// Base64-encoded PDF bytes.
    pub document: String,
    #[serde(default)]
    pub options: PrintOptions,
}

/// Print a base64-encoded PDF sent as JSON
pub async fn print_base64_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Base64PrintRequest>,
) -> AppResult<Json<Value>> {
    let data = base64::engine::general_purpose::STANDARD
        .decode(request.document.trim())
        .map_err(|e| AppError::InvalidRequest(format!("Invalid base64 document: {}", e)))?;

    let filename = upload_file_name(
        request.filename.as_deref().unwrap_or("document.pdf"),
        None,
    );
    submit(state, &filename, Bytes::from(data), request.options).await
}

async fn submit(
    state: Arc<AppState>,
    filename: &str,
    data: Bytes,
    options: PrintOptions,
) -> AppResult<Json<Value>> {
    let job = Uuid::new_v4();

    // Kept alive until the print call returns.
    let temp_dir = tempfile::tempdir()?;
    let input_path = store_upload(temp_dir.path(), job, filename, &data).await?;

    let printer_name = options.printer_name().map(str::to_string);
    info!("Job {}: printing {} ({:?})", job, filename, printer_name);

    let path = input_path.clone();
    let result = blocking(state.printer.clone(), move |printer| {
        printer.print(&path, options)
    })
    .await;

    if let Err(e) = &result {
        error!("Job {} failed: {}", job, e);
    }
    result?;

    Ok(Json(json!({
        "status": "printed",
        "job": job.to_string(),
        "printer": printer_name,
    })))
}

/// Writes the upload into `dir` under a name derived from the job id only.
/// The client's name decides the `.pdf` suffix and nothing else.
async fn store_upload(
    dir: &Path,
    job: Uuid,
    filename: &str,
    data: &Bytes,
) -> AppResult<PathBuf> {
    let path = dir.join(stored_file_name(job, filename));
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// A non-PDF upload keeps a bare job id so extension validation rejects it.
fn stored_file_name(job: Uuid, filename: &str) -> String {
    if is_pdf_file(filename) {
        format!("{}.pdf", job)
    } else {
        job.to_string()
    }
}

/// Base name of an uploaded file, used for logging and the `.pdf` check.
/// A PDF-typed upload without a `.pdf` name gets the suffix so it passes
/// extension validation.
fn upload_file_name(filename: &str, content_type: Option<&str>) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| is_plain_file_name(name))
        .unwrap_or("document");

    let is_pdf_upload = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|ct| ct.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false);

    if is_pdf_upload && !is_pdf_file(base) {
        format!("{}.pdf", base)
    } else {
        base.to_string()
    }
}

/// One normal path component with no drive or stream separator.
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(':') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn apply_form_field(options: &mut PrintOptions, name: &str, value: String) -> AppResult<()> {
    match name {
        "printer" => options.printer = Some(value),
        "copies" => {
            options.copies = value.trim().parse().map_err(|_| {
                AppError::InvalidRequest(format!("Invalid copies value: {}", value))
            })?;
        }
        "silent" => options.silent = parse_flag(&value),
        "pageRange" => options.page_range = Some(value),
        "orientation" => options.orientation = value.parse().ok(),
        "scaling" => options.scaling = value.parse().ok(),
        "colorMode" => options.color_mode = value.parse().ok(),
        "duplex" => options.duplex = value.parse().ok(),
        "bin" => options.bin = Some(value),
        "paperSize" => options.paper_size = Some(value),
        "showDialog" => options.show_dialog = parse_flag(&value),
        _ => {
            // Ignore unknown fields
        }
    }
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

/// List printers known to the system
pub async fn printers_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let printers = blocking(state.printer.clone(), |printer| printer.list_printers()).await?;
    Ok(Json(json!({ "printers": printers })))
}

/// System default printer
pub async fn default_printer_handler(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Value>> {
    let name = blocking(state.printer.clone(), |printer| printer.default_printer()).await?;
    Ok(Json(json!({ "printer": name })))
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Locating SumatraPDF touches the filesystem.
    let printer = state.printer.clone();
    let sumatra_available = tokio::task::spawn_blocking(move || printer.is_available())
        .await
        .unwrap_or(false);

    Json(json!({
        "status": "healthy",
        "service": "pdfprint",
        "sumatra_available": sumatra_available,
    }))
}

/// Information endpoint
pub async fn info_handler() -> impl IntoResponse {
    Json(json!({
        "service": "pdfprint",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "print": {
                "path": "/print",
                "method": "POST",
                "description": "Print an uploaded PDF through SumatraPDF.",
                "content_type": "multipart/form-data",
                "fields": {
                    "file": "The PDF to print (required)",
                    "printer": "Printer name (optional, defaults to the system default printer)",
                    "copies": "Number of copies (optional)",
                    "silent": "Boolean - suppress SumatraPDF dialogs (optional)",
                    "pageRange": "Pages to print (optional, e.g. '1-3,5')",
                    "orientation": "portrait | landscape (optional)",
                    "scaling": "noscale | shrink | fit (optional)",
                    "colorMode": "color | monochrome (optional)",
                    "duplex": "duplex | duplexshort | duplexlong | simplex (optional)",
                    "bin": "Paper tray (optional)",
                    "paperSize": "Paper size (optional, e.g. 'A4', 'letter')",
                    "showDialog": "Boolean - open the print dialog instead (optional)"
                }
            },
            "print_base64": {
                "path": "/print/base64",
                "method": "POST",
                "description": "Print a base64-encoded PDF.",
                "content_type": "application/json",
                "fields": {
                    "document": "Base64 PDF bytes (required)",
                    "filename": "File name (optional)",
                    "options": "Print options object (optional)"
                }
            },
            "printers": {
                "path": "/printers",
                "method": "GET",
                "description": "List installed printers"
            },
            "default_printer": {
                "path": "/printers/default",
                "method": "GET",
                "description": "System default printer"
            },
            "health": {
                "path": "/health",
                "method": "GET",
                "description": "Health check endpoint"
            }
        }
    }))
}
