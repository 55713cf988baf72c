//! Event severity.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity of a log event, ordered from least to most severe.
///
/// The discriminant is the numeric form written by level columns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Level {
    #[strum(to_string = "Verbose", serialize = "verbose", serialize = "trace")]
    #[serde(alias = "verbose", alias = "trace")]
    Verbose = 0,
    #[strum(to_string = "Debug", serialize = "debug")]
    #[serde(alias = "debug")]
    Debug = 1,
    #[strum(to_string = "Information", serialize = "info")]
    #[serde(alias = "information", alias = "info")]
    Information = 2,
    #[strum(to_string = "Warning", serialize = "warn")]
    #[serde(alias = "warning", alias = "warn")]
    Warning = 3,
    #[strum(to_string = "Error", serialize = "error")]
    #[serde(alias = "error")]
    Error = 4,
    #[strum(to_string = "Fatal", serialize = "fatal")]
    #[serde(alias = "fatal")]
    Fatal = 5,
}

impl Level {
    /// Numeric rendering (`Verbose` = 0 ... `Fatal` = 5).
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
