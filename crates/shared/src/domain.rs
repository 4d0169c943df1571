use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Display tone of a severity tag; views map it to their own colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTone {
    Informational,
    Positive,
    Negative,
}

impl Severity {
    pub fn tone(self) -> SeverityTone {
        match self {
            Self::Info => SeverityTone::Informational,
            Self::Success => SeverityTone::Positive,
            Self::Error => SeverityTone::Negative,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line of activity history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl LogEntry {
    pub fn new(severity: Severity, event: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            severity,
            event: event.into(),
            filename,
        }
    }

    pub fn info(event: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(Severity::Info, event, Some(filename.into()))
    }

    pub fn success(event: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(Severity::Success, event, Some(filename.into()))
    }

    pub fn error(event: impl Into<String>) -> Self {
        Self::new(Severity::Error, event, None)
    }

    pub fn error_for(event: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(Severity::Error, event, Some(filename.into()))
    }
}

/// IOF XML v3 document kinds accepted by the results service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XmlFileKind {
    StartList,
    ResultList,
}

impl XmlFileKind {
    pub fn root_element(self) -> &'static [u8] {
        match self {
            Self::StartList => b"StartList",
            Self::ResultList => b"ResultList",
        }
    }

    pub fn from_root_element(name: &[u8]) -> Option<Self> {
        [Self::StartList, Self::ResultList]
            .into_iter()
            .find(|kind| kind.root_element() == name)
    }

    /// Path on the results API the document is posted to.
    pub fn upload_path(self) -> &'static str {
        match self {
            Self::StartList => "/start-lists",
            Self::ResultList => "/results",
        }
    }
}

impl fmt::Display for XmlFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartList => f.write_str("StartList"),
            Self::ResultList => f.write_str("ResultList"),
        }
    }
}
