use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Display language of the client.
///
/// Drives both the fixed conversational texts and number formatting
/// (digit grouping and magnitude unit labels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Polish,
}

impl Locale {
    // ── Conversation texts ──────────────────────────────────────────

    /// Assistant reply appended when a chat request fails.
    pub fn chat_failure(&self) -> &'static str {
        match self {
            Locale::English => "Sorry, a connection error occurred.",
            Locale::Polish => "Przepraszam, wystąpił błąd połączenia.",
        }
    }

    /// User-side placeholder for a trend analysis request.
    pub fn trend_request(&self) -> &'static str {
        match self {
            Locale::English => "Run a trend analysis for this company.",
            Locale::Polish => "Przeprowadź analizę trendów dla tej firmy.",
        }
    }

    /// Markdown heading prefixed to a trend analysis reply.
    pub fn trend_heading(&self) -> &'static str {
        match self {
            Locale::English => "**Trend Analysis:**",
            Locale::Polish => "**Analiza Trendów:**",
        }
    }

    /// Assistant reply appended when a trend analysis fails.
    pub fn trend_failure(&self) -> &'static str {
        match self {
            Locale::English => "The trend analysis could not be completed.",
            Locale::Polish => "Nie udało się przeprowadzić analizy trendów.",
        }
    }

    /// Notice rendered in place of a chart of an unknown kind.
    pub fn unsupported_chart(&self, kind: &str) -> String {
        match self {
            Locale::English => format!("Unsupported chart type: {kind}"),
            Locale::Polish => format!("Nieobsługiwany typ wykresu: {kind}"),
        }
    }

    // ── Number conventions ──────────────────────────────────────────

    pub fn billions_unit(&self) -> &'static str {
        match self {
            Locale::English => "bn",
            Locale::Polish => "mld",
        }
    }

    pub fn millions_unit(&self) -> &'static str {
        match self {
            Locale::English => "mn",
            Locale::Polish => "mln",
        }
    }

    pub fn thousands_unit(&self) -> &'static str {
        match self {
            Locale::English => "k",
            Locale::Polish => "tys",
        }
    }

    /// Thousands separator. Polish uses a no-break space.
    pub fn group_separator(&self) -> &'static str {
        match self {
            Locale::English => ",",
            Locale::Polish => "\u{a0}",
        }
    }

    /// Fewest integer digits before grouping kicks in (Polish leaves
    /// four-digit numbers ungrouped).
    pub fn min_grouping_digits(&self) -> usize {
        match self {
            Locale::English => 4,
            Locale::Polish => 5,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::English => write!(f, "en"),
            Locale::Polish => write!(f, "pl"),
        }
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::English),
            "pl" | "pl-pl" | "polish" => Ok(Locale::Polish),
            other => Err(CoreError::ValidationError(format!(
                "Unknown locale '{other}': expected 'en' or 'pl'"
            ))),
        }
    }
}
