use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const MAX_NAME_LEN: usize = 200;
const MAX_TICKER_LEN: usize = 10;
const MAX_INDUSTRY_LEN: usize = 100;

/// A company tracked by the analysis service.
///
/// The client only ever holds a read-only snapshot; refresh it through the
/// backend after any change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,

    #[serde(default)]
    pub ticker: Option<String>,

    #[serde(default)]
    pub industry: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,

    /// Present on detail responses only.
    #[serde(default)]
    pub reports: Vec<Report>,

    /// Count reported by listing endpoints, which carry no report list.
    /// Read it through `report_count()`.
    #[serde(default)]
    pub reports_count: usize,
}

impl Company {
    /// Number of reports the company has.
    ///
    /// Counts `reports` when the snapshot carries them; listing snapshots
    /// send no report list, so the wire counter is used there.
    #[must_use]
    pub fn report_count(&self) -> usize {
        if self.reports.is_empty() {
            self.reports_count
        } else {
            self.reports.len()
        }
    }

    /// Trend analysis compares reports, so it needs at least two.
    #[must_use]
    pub fn supports_trend_analysis(&self) -> bool {
        self.report_count() > 1
    }
}

/// A financial report document attached to a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,

    #[serde(default)]
    pub company_id: Option<i64>,

    pub filename: String,

    #[serde(default)]
    pub report_type: Option<String>,

    /// Human-readable period, e.g. "Q3 2024".
    #[serde(default)]
    pub report_period: Option<String>,

    #[serde(default)]
    pub report_year: Option<i32>,

    #[serde(default)]
    pub report_quarter: Option<u8>,

    pub upload_date: NaiveDateTime,

    /// Size in bytes.
    pub file_size: u64,

    #[serde(default)]
    pub status: Option<String>,
}

impl Report {
    /// Period label when known, otherwise the filename.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.report_period
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.filename)
    }

    #[must_use]
    pub fn size_megabytes(&self) -> f64 {
        self.file_size as f64 / 1024.0 / 1024.0
    }
}

/// Response of the report upload endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedReport {
    pub id: i64,
    pub company_id: i64,

    #[serde(default)]
    pub company_name: Option<String>,

    pub filename: String,

    #[serde(default)]
    pub report_type: Option<String>,

    #[serde(default)]
    pub report_period: Option<String>,

    pub upload_date: NaiveDateTime,
    pub file_size: u64,

    #[serde(default)]
    pub status: Option<String>,
}

/// Form data for creating a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check the field limits the backend enforces, before sending.
    pub fn validate(&self) -> Result<(), CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "Company name must not be empty".into(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::ValidationError(format!(
                "Company name exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if let Some(ticker) = &self.ticker {
            if ticker.chars().count() > MAX_TICKER_LEN {
                return Err(CoreError::ValidationError(format!(
                    "Ticker '{ticker}' exceeds {MAX_TICKER_LEN} characters"
                )));
            }
        }
        if let Some(industry) = &self.industry {
            if industry.chars().count() > MAX_INDUSTRY_LEN {
                return Err(CoreError::ValidationError(format!(
                    "Industry exceeds {MAX_INDUSTRY_LEN} characters"
                )));
            }
        }
        Ok(())
    }
}
