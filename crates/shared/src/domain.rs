use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProfileId);
id_newtype!(PlateId);

/// Which printer-control process sits behind the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The primary printing engine (snake_case JSON REST API).
    #[default]
    Engine,
    /// The alternate control daemon (PascalCase JSON, GET-driven control).
    Daemon,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Engine => "engine",
            BackendKind::Daemon => "daemon",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engine" => Ok(BackendKind::Engine),
            "daemon" => Ok(BackendKind::Daemon),
            other => Err(format!(
                "unknown backend {other:?}; expected \"engine\" or \"daemon\""
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FileLocation {
    #[default]
    Local,
    Usb,
}

impl FileLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            FileLocation::Local => "Local",
            FileLocation::Usb => "Usb",
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(FileLocation::Local),
            "usb" => Ok(FileLocation::Usb),
            other => Err(format!("unknown file location {other:?}")),
        }
    }
}

/// Projector patterns used while calibrating the light engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayTest {
    White,
    Blank,
    Grid,
    Dimensions,
}

impl DisplayTest {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayTest::White => "white",
            DisplayTest::Blank => "blank",
            DisplayTest::Grid => "grid",
            DisplayTest::Dimensions => "dimensions",
        }
    }
}
