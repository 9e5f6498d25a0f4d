//! Print PDF files on Windows through SumatraPDF.
//!
//! ```no_run
//! use pdfprint::{PdfPrinter, PrintOptions, Printer, SharedConfig};
//! use std::path::Path;
//!
//! let printer = PdfPrinter::new(SharedConfig::default());
//! let options = PrintOptions::new()
//!     .printer("HP LaserJet")
//!     .silent(true)
//!     .copies(2)
//!     .paper_size("A4");
//! printer.print(Path::new("document.pdf"), options)?;
//! # Ok::<(), pdfprint::PrintError>(())
//! ```

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod handlers;
pub mod locator;
pub mod options;
pub mod printer;
pub mod runner;
pub mod spooler;

pub use command::build_print_command;
pub use config::{Config, SharedConfig};
pub use error::{PrintError, Result};
pub use locator::{ExecutableLocator, ResolveStrategy};
pub use options::{ColorMode, DuplexMode, Orientation, PrintOptions, Scaling};
pub use printer::{
    default_printer, list_printers, print, print_to_default, PdfPrinter, PdfPrinterBuilder,
    Printer,
};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use spooler::{PrinterSystem, SystemSpooler};
