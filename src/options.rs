use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a string is not one of an option's recognized tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized option value: {0}")]
pub struct UnknownOption(pub String);

macro_rules! settings_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Token emitted into the SumatraPDF settings list.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(UnknownOption(other.to_string())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

settings_enum!(
    /// Paper orientation.
    Orientation {
        Portrait => "portrait",
        Landscape => "landscape",
    }
);

settings_enum!(
    /// How pages are scaled onto the paper.
    Scaling {
        NoScale => "noscale",
        Shrink => "shrink",
        Fit => "fit",
    }
);

settings_enum!(
    ColorMode {
        Color => "color",
        Monochrome => "monochrome",
    }
);

settings_enum!(
    /// Double-sided printing mode.
    DuplexMode {
        Duplex => "duplex",
        DuplexShort => "duplexshort",
        DuplexLong => "duplexlong",
        Simplex => "simplex",
    }
);

/// Parses a raw token, dropping anything unrecognized.
fn lenient<T: FromStr>(value: &str) -> Option<T> {
    value.parse().ok()
}

fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(lenient))
}

/// Options for a single print job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintOptions {
    /// Target printer; `None` or empty selects the system default.
    pub printer: Option<String>,
    /// Number of copies. Anything below 1 is printed once.
    pub copies: i32,
    /// Suppress SumatraPDF's own progress and error UI.
    pub silent: bool,
    /// Page selection such as `1-3,5`, passed through unchecked.
    pub page_range: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub orientation: Option<Orientation>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub scaling: Option<Scaling>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub color_mode: Option<ColorMode>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub duplex: Option<DuplexMode>,
    /// Paper tray selector, e.g. `bin=2`, passed through unchecked.
    pub bin: Option<String>,
    /// Paper size name such as `A4` or `letter`.
    pub paper_size: Option<String>,
    /// Open the interactive print dialog instead of printing directly.
    pub show_dialog: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            printer: None,
            copies: 1,
            silent: false,
            page_range: None,
            orientation: None,
            scaling: None,
            color_mode: None,
            duplex: None,
            bin: None,
            paper_size: None,
            show_dialog: false,
        }
    }
}

impl PrintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printer(mut self, name: impl Into<String>) -> Self {
        self.printer = Some(name.into());
        self
    }

    pub fn copies(mut self, copies: i32) -> Self {
        self.copies = copies;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn page_range(mut self, range: impl Into<String>) -> Self {
        self.page_range = Some(range.into());
        self
    }

    pub fn orientation(mut self, value: &str) -> Self {
        self.orientation = lenient(value);
        self
    }

    pub fn scaling(mut self, value: &str) -> Self {
        self.scaling = lenient(value);
        self
    }

    pub fn color_mode(mut self, value: &str) -> Self {
        self.color_mode = lenient(value);
        self
    }

    pub fn duplex(mut self, value: &str) -> Self {
        self.duplex = lenient(value);
        self
    }

    pub fn bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = Some(bin.into());
        self
    }

    pub fn paper_size(mut self, size: impl Into<String>) -> Self {
        self.paper_size = Some(size.into());
        self
    }

    pub fn show_dialog(mut self, show: bool) -> Self {
        self.show_dialog = show;
        self
    }

    /// Explicit printer name, ignoring an empty string.
    pub fn printer_name(&self) -> Option<&str> {
        self.printer.as_deref().filter(|name| !name.is_empty())
    }

    /// Copy count clamped to at least one.
    pub fn effective_copies(&self) -> i32 {
        self.copies.max(1)
    }
}
