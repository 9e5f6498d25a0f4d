//! Queries against the operating system's print subsystem.

use std::io;
use std::process::{Command, Stdio};
use tracing::warn;

/// Printer enumeration and default-printer lookup.
pub trait PrinterSystem: Send + Sync {
    /// Names of all printers known to the system.
    fn list_printers(&self) -> io::Result<Vec<String>>;

    /// Name of the system default printer.
    fn default_printer(&self) -> io::Result<String>;

    /// Case-insensitive membership test against [`list_printers`](Self::list_printers).
    /// An enumeration failure counts as absent.
    fn printer_exists(&self, name: &str) -> bool {
        match self.list_printers() {
            Ok(printers) => {
                let wanted = name.to_lowercase();
                printers.iter().any(|p| p.to_lowercase() == wanted)
            }
            Err(e) => {
                warn!("Failed to enumerate printers: {}", e);
                false
            }
        }
    }
}

/// The Windows spooler, queried through `wmic` and `GetDefaultPrinterW`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpooler;

impl PrinterSystem for SystemSpooler {
    fn list_printers(&self) -> io::Result<Vec<String>> {
        let output = Command::new("wmic")
            .args(["printer", "get", "name"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "wmic exited with {}",
                output.status
            )));
        }

        Ok(parse_printer_list(&decode_output(&output.stdout)))
    }

    fn default_printer(&self) -> io::Result<String> {
        query_default_printer()
    }
}

/// Decodes utility output that may be UTF-16LE with a byte-order mark.
pub fn decode_output(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// One printer per line; blank lines and the `Name` header are dropped.
pub fn parse_printer_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "Name")
        .map(str::to_string)
        .collect()
}

#[cfg(windows)]
fn query_default_printer() -> io::Result<String> {
    #[link(name = "winspool")]
    extern "system" {
        fn GetDefaultPrinterW(buffer: *mut u16, size: *mut u32) -> i32;
    }

    const ERROR_INSUFFICIENT_BUFFER: i32 = 122;

    let mut size: u32 = 0;
    // SAFETY: a null buffer with a zero size only reports the required length.
    let ok = unsafe { GetDefaultPrinterW(std::ptr::null_mut(), &mut size) };
    if ok == 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(ERROR_INSUFFICIENT_BUFFER) {
            return Err(err);
        }
    }

    let mut buffer = vec![0u16; size as usize];
    // SAFETY: `buffer` holds exactly `size` UTF-16 units.
    let ok = unsafe { GetDefaultPrinterW(buffer.as_mut_ptr(), &mut size) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    let len = buffer.iter().position(|&unit| unit == 0).unwrap_or(buffer.len());
    Ok(String::from_utf16_lossy(&buffer[..len]).trim().to_string())
}

#[cfg(not(windows))]
fn query_default_printer() -> io::Result<String> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "default printer lookup is only available on Windows",
    ))
}

/// In-memory printer list for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct FakeSpooler {
    pub printers: Vec<String>,
    pub default: Option<String>,
    pub fail_listing: bool,
}

#[cfg(test)]
impl FakeSpooler {
    pub fn with_printers(printers: &[&str], default: Option<&str>) -> Self {
        Self {
            printers: printers.iter().map(|p| p.to_string()).collect(),
            default: default.map(str::to_string),
            fail_listing: false,
        }
    }
}

#[cfg(test)]
impl PrinterSystem for FakeSpooler {
    fn list_printers(&self) -> io::Result<Vec<String>> {
        if self.fail_listing {
            return Err(io::Error::other("spooler unavailable"));
        }
        Ok(self.printers.clone())
    }

    fn default_printer(&self) -> io::Result<String> {
        self.default
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no default printer"))
    }
}
