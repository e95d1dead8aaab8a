//! Target database engine and version.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::EnumString;
use thiserror::Error;

/// Database engine family the migration plan targets.
///
/// Unrecognized names parse into [`EngineKind::Other`]; rules that need a
/// version threshold report "unknown engine behavior" for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum EngineKind {
    #[strum(serialize = "postgres", serialize = "postgresql", serialize = "pg")]
    Postgres,
    #[strum(serialize = "mysql")]
    MySql,
    #[strum(serialize = "mariadb")]
    MariaDb,
    #[strum(default)]
    Other(String),
}

impl EngineKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Other(name) => name,
        }
    }

    /// MySQL and MariaDB share the simplified blocking/non-blocking lock model.
    pub fn is_mysql_family(&self) -> bool {
        matches!(self, Self::MySql | Self::MariaDb)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EngineKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// `major.minor.patch` engine version. Missing components default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub const fn major(major: u32) -> Self {
        Self::new(major, 0, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid engine version '{0}': expected MAJOR[.MINOR[.PATCH]]")]
pub struct VersionParseError(pub String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(err());
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| err())?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Session time zones that make timestamp/timestamptz conversions metadata-only.
const UTC_ZONES: &[&str] = &["utc", "etc/utc", "uct", "etc/uct", "zulu", "etc/zulu"];

/// Engine context for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Engine {
    kind: EngineKind,
    version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

impl Engine {
    pub fn new(kind: EngineKind, version: Version) -> Self {
        Self {
            kind,
            version,
            time_zone: None,
        }
    }

    pub fn postgres(major: u32) -> Self {
        Self::new(EngineKind::Postgres, Version::major(major))
    }

    pub fn mysql(major: u32, minor: u32, patch: u32) -> Self {
        Self::new(EngineKind::MySql, Version::new(major, minor, patch))
    }

    pub fn mariadb(major: u32, minor: u32, patch: u32) -> Self {
        Self::new(EngineKind::MariaDb, Version::new(major, minor, patch))
    }

    /// Record the session time zone migrations run under.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn kind(&self) -> &EngineKind {
        &self.kind
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    pub fn is_postgres(&self) -> bool {
        self.kind == EngineKind::Postgres
    }

    /// Whether the session time zone is known to be UTC.
    pub fn is_utc_session(&self) -> bool {
        self.time_zone
            .as_deref()
            .is_some_and(|tz| UTC_ZONES.contains(&tz.trim().to_lowercase().as_str()))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.version)
    }
}
