//! Resolution profile table.
//!
//! A profile names a target output size class. The table is fixed: clients
//! refer to profiles by identifier (`Same`, `Sd`, `Hsd`, `Hd`, `Hdd`) and any
//! other identifier is rejected as invalid input before a job is created.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Target output size class for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionProfile {
    /// Keep the source dimensions.
    #[default]
    #[serde(rename = "Same")]
    Unchanged,
    /// 480 lines.
    Sd,
    /// 600 lines.
    Hsd,
    /// 720 lines.
    Hd,
    /// 900 lines.
    Hdd,
}

impl ResolutionProfile {
    /// Every profile, in ascending size order with `Unchanged` first.
    pub const ALL: [ResolutionProfile; 5] = [
        ResolutionProfile::Unchanged,
        ResolutionProfile::Sd,
        ResolutionProfile::Hsd,
        ResolutionProfile::Hd,
        ResolutionProfile::Hdd,
    ];

    /// Resolve a client-supplied identifier.
    ///
    /// Matching is ASCII case-insensitive and ignores surrounding whitespace.
    /// An empty identifier means "no selection" and resolves to
    /// [`ResolutionProfile::Unchanged`].
    ///
    /// # Examples
    ///
    /// ```
    /// use vconv_common::ResolutionProfile;
    ///
    /// assert_eq!(ResolutionProfile::resolve("Hd").unwrap(), ResolutionProfile::Hd);
    /// assert_eq!(ResolutionProfile::resolve("").unwrap(), ResolutionProfile::Unchanged);
    /// assert!(ResolutionProfile::resolve("4k").is_err());
    /// ```
    pub fn resolve(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(ResolutionProfile::Unchanged);
        }

        Self::ALL
            .into_iter()
            .find(|p| p.identifier().eq_ignore_ascii_case(identifier))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "unknown resolution '{identifier}' (expected one of: {})",
                    Self::identifiers().join(", ")
                ))
            })
    }

    /// The identifier clients use to select this profile.
    pub const fn identifier(self) -> &'static str {
        match self {
            ResolutionProfile::Unchanged => "Same",
            ResolutionProfile::Sd => "Sd",
            ResolutionProfile::Hsd => "Hsd",
            ResolutionProfile::Hd => "Hd",
            ResolutionProfile::Hdd => "Hdd",
        }
    }

    /// Human-readable label for menus and listings.
    pub const fn label(self) -> &'static str {
        match self {
            ResolutionProfile::Unchanged => "Keep original",
            ResolutionProfile::Sd => "480p",
            ResolutionProfile::Hsd => "600p",
            ResolutionProfile::Hd => "720p",
            ResolutionProfile::Hdd => "900p",
        }
    }

    /// Output height in lines, or `None` when the source size is kept.
    pub const fn target_height(self) -> Option<u32> {
        match self {
            ResolutionProfile::Unchanged => None,
            ResolutionProfile::Sd => Some(480),
            ResolutionProfile::Hsd => Some(600),
            ResolutionProfile::Hd => Some(720),
            ResolutionProfile::Hdd => Some(900),
        }
    }

    /// All valid identifiers, in table order.
    pub fn identifiers() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.identifier()).collect()
    }
}

impl fmt::Display for ResolutionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ResolutionProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}
