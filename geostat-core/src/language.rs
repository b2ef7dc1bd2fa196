use crate::error::GeostatError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Display language of titles, labels and API responses.
///
/// Georgian is the primary language of the site; English is secondary.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "ge")]
    Georgian,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Code sent to the statistics API as the `lang` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Georgian => "ge",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = GeostatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ge" | "ka" | "georgian" => Ok(Language::Georgian),
            "en" | "english" => Ok(Language::English),
            other => Err(GeostatError::UnknownLanguage(other.to_string())),
        }
    }
}
