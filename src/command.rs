//! SumatraPDF command-line construction.

use crate::error::{PrintError, Result};
use crate::options::PrintOptions;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// True if `path` exists and is not a directory.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.is_dir())
        .unwrap_or(false)
}

/// True if the file extension is `.pdf`, ignoring case.
pub fn is_pdf_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Builds the SumatraPDF argument list for printing `pdf_path`.
///
/// An empty `printer_name` targets the system default printer. The
/// absolute PDF path is always the last argument and is passed through
/// as an `OsString`, so non-UTF-8 names reach SumatraPDF unchanged.
pub fn build_print_command(
    pdf_path: &Path,
    printer_name: &str,
    options: &PrintOptions,
) -> Result<Vec<OsString>> {
    if !file_exists(pdf_path) {
        return Err(PrintError::FileNotFound {
            path: pdf_path.to_path_buf(),
            source: None,
        });
    }

    if !is_pdf_file(pdf_path) {
        return Err(PrintError::InvalidPdf(pdf_path.to_path_buf()));
    }

    let absolute = std::path::absolute(pdf_path).map_err(|e| PrintError::FileNotFound {
        path: pdf_path.to_path_buf(),
        source: Some(e),
    })?;

    let mut args: Vec<OsString> = Vec::new();

    if options.show_dialog {
        // Dialog mode ignores every other option.
        args.push("-print-dialog".into());
        args.push("-exit-when-done".into());
    } else {
        if printer_name.is_empty() {
            args.push("-print-to-default".into());
        } else {
            args.push("-print-to".into());
            args.push(printer_name.into());
        }

        if options.silent {
            args.push("-silent".into());
        }

        let settings = print_settings(options);
        if !settings.is_empty() {
            args.push("-print-settings".into());
            args.push(settings.join(",").into());
        }
    }

    args.push(absolute.into_os_string());

    debug!("SumatraPDF arguments: {:?}", args);
    Ok(args)
}

/// Entries of the `-print-settings` value, in SumatraPDF's expected order.
///
/// Values are joined verbatim; a comma inside a page range, tray or paper
/// name is indistinguishable from a separator.
fn print_settings(options: &PrintOptions) -> Vec<String> {
    let mut settings = Vec::new();

    if let Some(range) = non_empty(&options.page_range) {
        settings.push(range.to_string());
    }
    if let Some(orientation) = options.orientation {
        settings.push(orientation.as_str().to_string());
    }
    if let Some(scaling) = options.scaling {
        settings.push(scaling.as_str().to_string());
    }
    if let Some(color) = options.color_mode {
        settings.push(color.as_str().to_string());
    }
    if let Some(duplex) = options.duplex {
        settings.push(duplex.as_str().to_string());
    }
    if let Some(bin) = non_empty(&options.bin) {
        settings.push(bin.to_string());
    }
    if let Some(paper) = non_empty(&options.paper_size) {
        settings.push(format!("paper={}", paper));
    }
    if options.copies > 1 {
        settings.push(format!("{}x", options.copies));
    }

    settings
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
