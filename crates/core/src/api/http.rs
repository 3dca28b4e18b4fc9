use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::{ChatBackend, CompanyBackend};
use crate::errors::CoreError;
use crate::models::chat::{AnalysisResponse, ChatReply, ChatRequest, HistoryEntry};
use crate::models::company::{Company, NewCompany, UploadedReport};
use crate::models::settings::ClientSettings;

const PDF_MIME: &str = "application/pdf";

/// JSON-over-HTTP client for the analysis service.
///
/// - **Chat**: `/chat/`, `/chat/history/{id}`, `/chat/analyze/{id}`, `/chat/session/{id}`
/// - **Companies**: `/companies/`, `/companies/{id}`
/// - **Reports**: `/reports/upload`, `/reports/auto-upload`, `/reports/{id}` (multipart uploads)
///
/// Every request is bounded by the configured timeout; an expired request
/// surfaces as `CoreError::Network` like any other transport failure.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.base_url().to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `path` plus one percent-encoded segment, for ids the backend issues
    /// as free-form strings.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| CoreError::ValidationError(format!("Invalid API URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| {
                CoreError::ValidationError(format!("API URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn parse<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, CoreError> {
        let resp = Self::ensure_success(resp).await?;
        resp.json::<T>().await.map_err(|e| {
            CoreError::Deserialization(format!("Failed to parse {what} response: {e}"))
        })
    }

    async fn ensure_success(resp: Response) -> Result<Response, CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CoreError::Api {
            status: status.as_u16(),
            message: error_detail(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            }),
        })
    }

    fn pdf_part(filename: &str, bytes: Vec<u8>) -> Result<Part, CoreError> {
        Ok(Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(PDF_MIME)?)
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(&ClientSettings::default())
    }
}

// ── Error body ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull the `detail` message out of an error body, if there is one.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ChatBackend for HttpBackend {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, CoreError> {
        tracing::debug!(
            company_id = request.company_id,
            resumed = request.session_id.is_some(),
            "POST /chat/"
        );
        let resp = self
            .client
            .post(self.url("/chat/"))
            .json(request)
            .send()
            .await?;
        Self::parse(resp, "chat").await
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        tracing::debug!(session_id, "GET /chat/history");
        let resp = self
            .client
            .get(self.url_with_segment("/chat/history", session_id)?)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::SessionNotFound(session_id.to_string()));
        }
        Self::parse(resp, "chat history").await
    }

    async fn analyze(&self, company_id: i64) -> Result<AnalysisResponse, CoreError> {
        tracing::debug!(company_id, "POST /chat/analyze");
        let resp = self
            .client
            .post(self.url(&format!("/chat/analyze/{company_id}")))
            .send()
            .await?;
        Self::parse(resp, "trend analysis").await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), CoreError> {
        tracing::debug!(session_id, "DELETE /chat/session");
        let resp = self
            .client
            .delete(self.url_with_segment("/chat/session", session_id)?)
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl CompanyBackend for HttpBackend {
    async fn list_companies(&self) -> Result<Vec<Company>, CoreError> {
        let resp = self.client.get(self.url("/companies/")).send().await?;
        Self::parse(resp, "company list").await
    }

    async fn get_company(&self, company_id: i64) -> Result<Company, CoreError> {
        let resp = self
            .client
            .get(self.url(&format!("/companies/{company_id}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::CompanyNotFound(company_id));
        }
        Self::parse(resp, "company").await
    }

    async fn create_company(&self, company: &NewCompany) -> Result<Company, CoreError> {
        company.validate()?;
        let resp = self
            .client
            .post(self.url("/companies/"))
            .json(company)
            .send()
            .await?;
        Self::parse(resp, "company").await
    }

    async fn delete_company(&self, company_id: i64) -> Result<(), CoreError> {
        let resp = self
            .client
            .delete(self.url(&format!("/companies/{company_id}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::CompanyNotFound(company_id));
        }
        Self::ensure_success(resp).await?;
        Ok(())
    }

    async fn upload_report(
        &self,
        company_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        let form = Form::new()
            .part("file", Self::pdf_part(filename, bytes)?)
            .text("company_id", company_id.to_string());
        let resp = self
            .client
            .post(self.url("/reports/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::parse(resp, "report upload").await
    }

    async fn auto_upload_report(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        let form = Form::new().part("file", Self::pdf_part(filename, bytes)?);
        let resp = self
            .client
            .post(self.url("/reports/auto-upload"))
            .multipart(form)
            .send()
            .await?;
        Self::parse(resp, "report upload").await
    }

    async fn delete_report(&self, report_id: i64) -> Result<(), CoreError> {
        let resp = self
            .client
            .delete(self.url(&format!("/reports/{report_id}")))
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }
}

