use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half of a dataset to request.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Year-keyed observation rows
    Data,
    /// Variable / value-label descriptions
    Metadata,
}

impl DataKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            DataKind::Data => "data",
            DataKind::Metadata => "metadata",
        }
    }
}

/// Identifies one request against the statistics API. Also the cache key.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub dataset: String,
    pub kind: DataKind,
    pub language: Language,
    pub year: Option<i32>,
}

impl RequestKey {
    pub fn data(dataset: &str, language: Language) -> Self {
        RequestKey {
            dataset: dataset.to_string(),
            kind: DataKind::Data,
            language,
            year: None,
        }
    }

    pub fn metadata(dataset: &str, language: Language) -> Self {
        RequestKey {
            dataset: dataset.to_string(),
            kind: DataKind::Metadata,
            language,
            year: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Unescaped `{dataset}/{kind}?lang={code}[&year=Y]`, for logs and display.
    pub fn path_and_query(&self) -> String {
        let mut path = format!(
            "{}/{}?lang={}",
            self.dataset.trim_matches('/'),
            self.kind.as_path(),
            self.language.code()
        );
        if let Some(year) = self.year {
            path.push_str(&format!("&year={}", year));
        }
        path
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_and_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query() {
        let key = RequestKey::data("water-abstraction", Language::English);
        assert_eq!(key.path_and_query(), "water-abstraction/data?lang=en");

        let key = RequestKey::metadata("/forest-fires/", Language::Georgian).with_year(2020);
        assert_eq!(key.path_and_query(), "forest-fires/metadata?lang=ge&year=2020");
    }

    #[test]
    fn test_keys_differ_by_language() {
        let ge = RequestKey::data("waste", Language::Georgian);
        let en = RequestKey::data("waste", Language::English);
        assert_ne!(ge, en);
    }
}
