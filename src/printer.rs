use crate::command::{build_print_command, file_exists};
use crate::config::{Config, SharedConfig};
use crate::error::{PrintError, Result};
use crate::locator::{ExecutableLocator, ResolveStrategy};
use crate::options::PrintOptions;
use crate::runner::{CommandRunner, SystemRunner};
use crate::spooler::{PrinterSystem, SystemSpooler};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operations offered by a PDF printer.
pub trait Printer: Send + Sync {
    /// Prints `pdf_path` with the given options.
    fn print(&self, pdf_path: &Path, options: PrintOptions) -> Result<()>;

    /// Prints silently to the system default printer.
    fn print_to_default(&self, pdf_path: &Path) -> Result<()>;

    fn list_printers(&self) -> Result<Vec<String>>;

    fn default_printer(&self) -> Result<String>;

    /// Whether a SumatraPDF executable can currently be used.
    fn is_available(&self) -> bool;
}

/// Prints PDF files through SumatraPDF.
///
/// The executable path is resolved on first use and cached for the life of
/// the printer; a new printer resolves again.
pub struct PdfPrinter {
    config: SharedConfig,
    locator: ExecutableLocator,
    spooler: Arc<dyn PrinterSystem>,
    runner: Arc<dyn CommandRunner>,
    sumatra_path: RwLock<Option<PathBuf>>,
}

impl PdfPrinter {
    /// Printer backed by the system spooler and process launcher.
    pub fn new(config: SharedConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> PdfPrinterBuilder {
        PdfPrinterBuilder::default()
    }

    pub fn config(&self) -> Config {
        self.config.get()
    }

    /// Validates and stores a new configuration, forgetting any cached
    /// executable path.
    pub fn set_config(&self, config: Config) -> Result<()> {
        self.config.set(config)?;
        *self.sumatra_path.write() = None;
        Ok(())
    }

    fn resolve_sumatra(&self) -> Result<PathBuf> {
        if let Some(path) = self.sumatra_path.read().clone() {
            return Ok(path);
        }

        let path = self.locator.locate()?;
        info!("Using SumatraPDF at {}", path.display());
        *self.sumatra_path.write() = Some(path.clone());
        Ok(path)
    }
}

impl Printer for PdfPrinter {
    fn print(&self, pdf_path: &Path, mut options: PrintOptions) -> Result<()> {
        options.copies = options.effective_copies();

        let sumatra = self.resolve_sumatra()?;

        let printer = match options.printer_name() {
            Some(name) => name.to_string(),
            None => self
                .spooler
                .default_printer()
                .map_err(PrintError::DefaultPrinter)?,
        };

        if !self.spooler.printer_exists(&printer) {
            return Err(PrintError::PrinterNotFound(printer));
        }

        let args = build_print_command(pdf_path, &printer, &options)?;

        info!("Printing {} on {}", pdf_path.display(), printer);
        let result = self
            .runner
            .run(&sumatra, &args)
            .map_err(|e| PrintError::PrintFailed {
                detail: format!("failed to launch {}: {}", sumatra.display(), e),
                output: String::new(),
                source: Some(e),
            })?;

        if !result.success() {
            let detail = match result.exit_code {
                Some(code) => format!("exit code: {}", code),
                None => "terminated by signal".to_string(),
            };
            warn!("SumatraPDF failed printing {}: {}", pdf_path.display(), detail);
            return Err(PrintError::PrintFailed {
                detail,
                output: result.output,
                source: None,
            });
        }

        debug!("Print job for {} completed", pdf_path.display());
        Ok(())
    }

    fn print_to_default(&self, pdf_path: &Path) -> Result<()> {
        self.print(pdf_path, PrintOptions::new().silent(true))
    }

    fn list_printers(&self) -> Result<Vec<String>> {
        self.spooler.list_printers().map_err(PrintError::Spooler)
    }

    fn default_printer(&self) -> Result<String> {
        self.spooler
            .default_printer()
            .map_err(PrintError::DefaultPrinter)
    }

    fn is_available(&self) -> bool {
        match self.sumatra_path.read().as_deref() {
            Some(path) => file_exists(path),
            None => self.locator.locate().is_ok(),
        }
    }
}

/// Assembles a [`PdfPrinter`] with custom collaborators.
#[derive(Default)]
pub struct PdfPrinterBuilder {
    config: Option<SharedConfig>,
    spooler: Option<Arc<dyn PrinterSystem>>,
    runner: Option<Arc<dyn CommandRunner>>,
    strategies: Option<Vec<Box<dyn ResolveStrategy>>>,
}

impl PdfPrinterBuilder {
    pub fn config(mut self, config: SharedConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn spooler(mut self, spooler: Arc<dyn PrinterSystem>) -> Self {
        self.spooler = Some(spooler);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Replaces the default configured/well-known/PATH resolution order.
    pub fn strategies(mut self, strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Builds the printer and makes a first attempt at locating SumatraPDF.
    pub fn build(self) -> PdfPrinter {
        let config = self.config.unwrap_or_default();
        let locator = match self.strategies {
            Some(strategies) => ExecutableLocator::with_strategies(strategies),
            None => ExecutableLocator::new(config.clone()),
        };

        let sumatra_path = match locator.locate() {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("SumatraPDF not located yet: {}", e);
                None
            }
        };

        PdfPrinter {
            config,
            locator,
            spooler: self
                .spooler
                .unwrap_or_else(|| Arc::new(SystemSpooler)),
            runner: self.runner.unwrap_or_else(|| Arc::new(SystemRunner)),
            sumatra_path: RwLock::new(sumatra_path),
        }
    }
}

/// Prints with a fresh printer over the default configuration.
pub fn print(pdf_path: impl AsRef<Path>, options: PrintOptions) -> Result<()> {
    PdfPrinter::new(SharedConfig::default()).print(pdf_path.as_ref(), options)
}

/// Prints silently to the default printer with a fresh printer.
pub fn print_to_default(pdf_path: impl AsRef<Path>) -> Result<()> {
    PdfPrinter::new(SharedConfig::default()).print_to_default(pdf_path.as_ref())
}

pub fn list_printers() -> Result<Vec<String>> {
    PdfPrinter::new(SharedConfig::default()).list_printers()
}

pub fn default_printer() -> Result<String> {
    PdfPrinter::new(SharedConfig::default()).default_printer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::WellKnownPaths;
    use crate::runner::{CommandOutput, RecordingRunner};
    use crate::spooler::FakeSpooler;
    use std::io;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        exe: PathBuf,
        pdf: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let exe = dir.path().join("SumatraPDF.exe");
            let pdf = dir.path().join("document.pdf");
            std::fs::write(&exe, b"").unwrap();
            std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
            Self { dir, exe, pdf }
        }

        fn printer(&self, spooler: FakeSpooler, runner: &RecordingRunner) -> PdfPrinter {
            let config = SharedConfig::new(Config::new().with_sumatra_path(&self.exe)).unwrap();
            PdfPrinter::builder()
                .config(config)
                .spooler(Arc::new(spooler))
                .runner(Arc::new(runner.clone()))
                .build()
        }

        fn absolute_pdf(&self) -> String {
            std::path::absolute(&self.pdf)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        }
    }

    fn office() -> FakeSpooler {
        FakeSpooler::with_printers(&["HP LaserJet", "Office"], Some("Office"))
    }

    #[test]
    fn test_print_to_named_printer() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        let options = PrintOptions::new().printer("HP LaserJet").silent(true).copies(2);
        printer.print(&fx.pdf, options).unwrap();

        let runs = runner.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].program, fx.exe);
        assert_eq!(
            runs[0].arg_strings(),
            vec![
                "-print-to".to_string(),
                "HP LaserJet".to_string(),
                "-silent".to_string(),
                "-print-settings".to_string(),
                "2x".to_string(),
                fx.absolute_pdf(),
            ]
        );
    }

    #[test]
    fn test_copies_below_one_print_once() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        printer
            .print(&fx.pdf, PrintOptions::new().printer("Office").copies(-4))
            .unwrap();

        let runs = runner.runs();
        let args = runs[0].arg_strings();
        assert_eq!(args, vec!["-print-to".to_string(), "Office".to_string(), fx.absolute_pdf()]);
    }

    #[test]
    fn test_falls_back_to_default_printer() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        printer.print_to_default(&fx.pdf).unwrap();

        let runs = runner.runs();
        let args = runs[0].arg_strings();
        assert_eq!(&args[..3], &["-print-to", "Office", "-silent"]);
    }

    #[test]
    fn test_default_printer_failure_is_wrapped() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(FakeSpooler::with_printers(&["Office"], None), &runner);

        let err = printer.print(&fx.pdf, PrintOptions::new()).unwrap_err();
        assert!(matches!(err, PrintError::DefaultPrinter(_)));
        assert!(err.to_string().starts_with("failed to get default printer"));
        assert!(runner.runs().is_empty());
    }

    #[test]
    fn test_unknown_printer_is_rejected() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        let err = printer
            .print(&fx.pdf, PrintOptions::new().printer("Kitchen"))
            .unwrap_err();
        match err {
            PrintError::PrinterNotFound(name) => assert_eq!(name, "Kitchen"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(runner.runs().is_empty());
    }

    #[test]
    fn test_printer_match_ignores_case() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        printer
            .print(&fx.pdf, PrintOptions::new().printer("hp laserjet"))
            .unwrap();
        assert_eq!(runner.runs()[0].arg_strings()[1], "hp laserjet");
    }

    #[test]
    fn test_command_errors_propagate() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        let missing = fx.dir.path().join("missing.pdf");
        let err = printer.print(&missing, PrintOptions::new()).unwrap_err();
        assert!(matches!(err, PrintError::FileNotFound { .. }));

        let text = fx.dir.path().join("notes.txt");
        std::fs::write(&text, b"hello").unwrap();
        let err = printer.print(&text, PrintOptions::new()).unwrap_err();
        assert!(matches!(err, PrintError::InvalidPdf(_)));
    }

    #[test]
    fn test_non_zero_exit_is_print_failed_with_output() {
        let fx = Fixture::new();
        let runner = RecordingRunner::replying(Ok(CommandOutput {
            exit_code: Some(1),
            output: "printer offline".to_string(),
        }));
        let printer = fx.printer(office(), &runner);

        let err = printer.print_to_default(&fx.pdf).unwrap_err();
        match &err {
            PrintError::PrintFailed { output, detail, .. } => {
                assert_eq!(output, "printer offline");
                assert_eq!(detail, "exit code: 1");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("printer offline"));
    }

    #[test]
    fn test_launch_failure_is_print_failed() {
        let fx = Fixture::new();
        let runner = RecordingRunner::replying(Err(io::ErrorKind::PermissionDenied));
        let printer = fx.printer(office(), &runner);

        let err = printer.print_to_default(&fx.pdf).unwrap_err();
        match err {
            PrintError::PrintFailed { source, .. } => {
                assert_eq!(source.unwrap().kind(), io::ErrorKind::PermissionDenied)
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_sumatra_stops_before_printing() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = PdfPrinter::builder()
            .spooler(Arc::new(office()))
            .runner(Arc::new(runner.clone()))
            .strategies(vec![Box::new(WellKnownPaths::new([fx
                .dir
                .path()
                .join("absent.exe")
                .to_string_lossy()
                .into_owned()]))])
            .build();

        assert!(!printer.is_available());
        let err = printer.print_to_default(&fx.pdf).unwrap_err();
        assert!(matches!(err, PrintError::SumatraNotFound));
        assert!(runner.runs().is_empty());
    }

    #[test]
    fn test_located_path_is_cached() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);
        assert!(printer.is_available());

        std::fs::remove_file(&fx.exe).unwrap();

        assert!(!printer.is_available());
        printer.print_to_default(&fx.pdf).unwrap();
        assert_eq!(runner.runs()[0].program, fx.exe);
    }

    #[test]
    fn test_late_install_is_picked_up() {
        let fx = Fixture::new();
        let late = fx.dir.path().join("late").join("SumatraPDF.exe");
        let runner = RecordingRunner::succeeding();
        let printer = PdfPrinter::builder()
            .spooler(Arc::new(office()))
            .runner(Arc::new(runner.clone()))
            .strategies(vec![Box::new(WellKnownPaths::new([late
                .to_string_lossy()
                .into_owned()]))])
            .build();
        assert!(!printer.is_available());

        std::fs::create_dir_all(late.parent().unwrap()).unwrap();
        std::fs::write(&late, b"").unwrap();

        assert!(printer.is_available());
        printer.print_to_default(&fx.pdf).unwrap();
        assert_eq!(runner.runs()[0].program, late);
    }

    #[test]
    fn test_set_config_validates_and_resets_cache() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        let err = printer
            .set_config(Config::new().with_sumatra_path(fx.dir.path().join("nope.exe")))
            .unwrap_err();
        assert!(matches!(err, PrintError::SumatraNotFound));
        assert_eq!(printer.config().sumatra_path(), Some(fx.exe.as_path()));

        let other = fx.dir.path().join("Other.exe");
        std::fs::write(&other, b"").unwrap();
        printer
            .set_config(Config::new().with_sumatra_path(&other))
            .unwrap();
        printer.print_to_default(&fx.pdf).unwrap();
        assert_eq!(runner.runs()[0].program, other);
    }

    #[test]
    fn test_queries_delegate_to_spooler() {
        let fx = Fixture::new();
        let runner = RecordingRunner::succeeding();
        let printer = fx.printer(office(), &runner);

        assert_eq!(printer.list_printers().unwrap(), vec!["HP LaserJet", "Office"]);
        assert_eq!(printer.default_printer().unwrap(), "Office");

        let broken = fx.printer(
            FakeSpooler {
                fail_listing: true,
                ..office()
            },
            &runner,
        );
        assert!(matches!(broken.list_printers(), Err(PrintError::Spooler(_))));
    }
}
