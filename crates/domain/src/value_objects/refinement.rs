//! Refinement modes selecting a prompt template

use std::fmt;

use serde::{Deserialize, Serialize};

/// How dictated text should be rewritten
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "language")]
pub enum RefinementMode {
    /// Fix punctuation, casing and filler words only
    #[default]
    Clean,
    /// Rewrite in a formal register
    Formal,
    /// Rewrite in a relaxed register
    Casual,
    /// Condense into a short summary
    Summarize,
    /// Restructure into bullet points
    Bullets,
    /// Translate into the given language
    Translate(String),
}

impl fmt::Display for RefinementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Formal => write!(f, "formal"),
            Self::Casual => write!(f, "casual"),
            Self::Summarize => write!(f, "summarize"),
            Self::Bullets => write!(f, "bullets"),
            Self::Translate(lang) => write!(f, "translate:{lang}"),
        }
    }
}

impl std::str::FromStr for RefinementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(lang) = s.strip_prefix("translate:") {
            let lang = lang.trim();
            if lang.is_empty() {
                return Err("translate mode needs a target language".to_string());
            }
            return Ok(Self::Translate(lang.to_string()));
        }

        match s.to_lowercase().as_str() {
            "clean" => Ok(Self::Clean),
            "formal" => Ok(Self::Formal),
            "casual" => Ok(Self::Casual),
            "summarize" | "summary" => Ok(Self::Summarize),
            "bullets" => Ok(Self::Bullets),
            _ => Err(format!("Invalid refinement mode: {s}")),
        }
    }
}
