//! Storefront display languages.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A supported display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish (Chile). The base language of the catalog data.
    #[default]
    Es,
    /// Korean.
    Ko,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Self; 2] = [Self::Es, Self::Ko];

    /// The short language tag (`es`, `ko`).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::Ko => "ko",
        }
    }

    /// The BCP 47 locale used for number formatting.
    #[must_use]
    pub const fn locale(self) -> &'static str {
        match self {
            Self::Es => "es-CL",
            Self::Ko => "ko-KR",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" | "es-cl" => Ok(Self::Es),
            "ko" | "ko-kr" => Ok(Self::Ko),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("es".parse::<Language>().unwrap(), Language::Es);
        assert_eq!("KO".parse::<Language>().unwrap(), Language::Ko);
        assert_eq!("es-CL".parse::<Language>().unwrap(), Language::Es);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Ko).unwrap(), "\"ko\"");
        let parsed: Language = serde_json::from_str("\"es\"").unwrap();
        assert_eq!(parsed, Language::Es);
    }
}
