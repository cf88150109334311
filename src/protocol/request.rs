//! Outbound requests and their wire rendering

use std::fmt;

use serde::Serialize;

use crate::error::{BuildClientError, Result};

/// Validated single-line request argument
///
/// Requests are written verbatim, so a payload must not contain line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    /// Wrap an already-serialized job description
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the payload is empty or contains `\n` or `\r`
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(BuildClientError::invalid_request("payload is empty"));
        }
        check_single_line(&raw)?;
        Ok(Self(raw))
    }

    /// Serialize a job description as compact JSON
    ///
    /// # Errors
    /// Returns `Json` if serialization fails
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        // Compact serde_json output escapes control characters inside strings.
        Self::new(serde_json::to_string(value)?)
    }

    /// Get the payload as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Payload {
    type Error = BuildClientError;

    fn try_from(raw: &str) -> Result<Self> {
        Self::new(raw)
    }
}

impl TryFrom<String> for Payload {
    type Error = BuildClientError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl TryFrom<&serde_json::Value> for Payload {
    type Error = BuildClientError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        Self::json(value)
    }
}

/// One protocol request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask which output format the companion selects for a job
    Format(Payload),
    /// Ask whether the companion can build a job
    Support(Payload),
    /// Submit a job
    Start(Payload),
    /// Poll the current job
    Wait,
    /// Fetch the next detail of a finished task
    Cont,
    /// Abandon the in-flight job
    Reset,
    /// Tell the companion to exit
    Fin,
}

impl Request {
    /// Request keyword as written on the wire
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Format(_) => "FORMAT",
            Self::Support(_) => "SUPPORT",
            Self::Start(_) => "START",
            Self::Wait => "WAIT",
            Self::Cont => "CONT",
            Self::Reset => "RESET",
            Self::Fin => "FIN",
        }
    }

    /// Payload argument, if the request carries one
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Format(p) | Self::Support(p) | Self::Start(p) => Some(p),
            Self::Wait | Self::Cont | Self::Reset | Self::Fin => None,
        }
    }

    /// Render as `<KEYWORD>[ <payload>]`, without line terminator
    #[must_use]
    pub fn to_line(&self) -> String {
        match self.payload() {
            Some(payload) => format!("{} {}", self.keyword(), payload.as_str()),
            None => self.keyword().to_string(),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Reject text that would span more than one protocol line
///
/// # Errors
/// Returns `InvalidRequest` if `line` contains `\n` or `\r`
pub fn check_single_line(line: &str) -> Result<()> {
    if line.contains(['\n', '\r']) {
        return Err(BuildClientError::invalid_request(format!(
            "line breaks are not allowed in a request: {line:?}"
        )));
    }
    Ok(())
}
