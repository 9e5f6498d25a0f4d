use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the printing library.
#[derive(Error, Debug)]
pub enum PrintError {
    #[error("SumatraPDF not found")]
    SumatraNotFound,

    #[error("printer not found: {0}")]
    PrinterNotFound(String),

    #[error("PDF file not found: {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("invalid PDF file: {}", .0.display())]
    InvalidPdf(PathBuf),

    #[error("print operation failed: {detail}, output: {output}")]
    PrintFailed {
        detail: String,
        output: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Not produced by any current path; options are normalized or dropped instead.
    #[error("invalid print options: {0}")]
    InvalidOptions(String),

    #[error("failed to get default printer: {0}")]
    DefaultPrinter(#[source] std::io::Error),

    #[error("failed to query printers: {0}")]
    Spooler(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrintError>;

/// Errors surfaced by the HTTP print service.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("No file provided")]
    NoFileProvided,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Print(err) => match err {
                PrintError::SumatraNotFound => StatusCode::SERVICE_UNAVAILABLE,
                PrintError::PrinterNotFound(_) => StatusCode::NOT_FOUND,
                PrintError::FileNotFound { .. }
                | PrintError::InvalidPdf(_)
                | PrintError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
                PrintError::PrintFailed { .. } => StatusCode::BAD_GATEWAY,
                PrintError::DefaultPrinter(_) | PrintError::Spooler(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::NoFileProvided => StatusCode::BAD_REQUEST,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_messages_carry_context() {
        let err = PrintError::PrinterNotFound("HP LaserJet".to_string());
        assert_eq!(err.to_string(), "printer not found: HP LaserJet");

        let err = PrintError::PrintFailed {
            detail: "exit code: 1".to_string(),
            output: "no such printer".to_string(),
            source: None,
        };
        assert!(err.to_string().contains("no such printer"));
    }

    #[test]
    fn test_app_error_status_mapping() {
        let cases = [
            (AppError::from(PrintError::SumatraNotFound), StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::from(PrintError::PrinterNotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(PrintError::InvalidPdf(PathBuf::from("a.txt"))),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(PrintError::PrintFailed {
                    detail: "exit code: 2".into(),
                    output: String::new(),
                    source: None,
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::NoFileProvided, StatusCode::BAD_REQUEST),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
        }
    }
}
