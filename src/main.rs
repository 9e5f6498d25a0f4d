use anyhow::Context;
use pdfprint::app::build_router;
use pdfprint::handlers::AppState;
use pdfprint::{Config, PdfPrinter, Printer, SharedConfig};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfprint=info,tower_http=info".into()),
        )
        .init();

    let config = match std::env::var("SUMATRA_PATH") {
        Ok(path) if !path.is_empty() => SharedConfig::new(Config::new().with_sumatra_path(&path))
            .with_context(|| format!("SUMATRA_PATH={} does not exist", path))?,
        _ => SharedConfig::default(),
    };

    let printer = PdfPrinter::new(config);
    if !printer.is_available() {
        warn!("SumatraPDF was not found; print requests will fail until it is installed");
    }

    let state = Arc::new(AppState {
        printer: Arc::new(printer),
    });
    let app = build_router(state);

    let addr = std::env::var("PDFPRINT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("PDFPrint server running on http://{}", addr);
    info!("API documentation: http://{}/info", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
