use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::chat::{AnalysisResponse, ChatReply, ChatRequest, HistoryEntry};
use crate::models::company::{Company, NewCompany, UploadedReport};

/// Chat endpoints of the analysis service.
///
/// The controller only talks to this trait, so tests and alternative
/// transports plug in without touching conversation logic.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat/`. A `None` session id asks the backend to open one.
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, CoreError>;

    /// `GET /chat/history/{session_id}`, oldest first.
    /// Returns `CoreError::SessionNotFound` when the backend no longer knows the session.
    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, CoreError>;

    /// `POST /chat/analyze/{company_id}`.
    async fn analyze(&self, company_id: i64) -> Result<AnalysisResponse, CoreError>;

    /// `DELETE /chat/session/{session_id}`.
    async fn delete_session(&self, session_id: &str) -> Result<(), CoreError>;
}

/// Company and report endpoints. Plain CRUD, no client-side state.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CompanyBackend: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>, CoreError>;

    /// Company detail including its reports.
    /// Returns `CoreError::CompanyNotFound` for an unknown id.
    async fn get_company(&self, company_id: i64) -> Result<Company, CoreError>;

    async fn create_company(&self, company: &NewCompany) -> Result<Company, CoreError>;

    async fn delete_company(&self, company_id: i64) -> Result<(), CoreError>;

    /// Upload a PDF report for a known company.
    async fn upload_report(
        &self,
        company_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError>;

    /// Upload a PDF and let the backend work out which company it belongs to.
    async fn auto_upload_report(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError>;

    async fn delete_report(&self, report_id: i64) -> Result<(), CoreError>;
}
