pub mod api;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

use std::sync::Arc;

use api::traits::{ChatBackend, CompanyBackend};
use models::{
    chart::ChartView,
    chat::ChatMessage,
    company::{Company, NewCompany, UploadedReport},
    settings::ClientSettings,
};
use services::{
    chart_service::ChartService,
    chat_controller::{ChatController, ChatOutcome, InitOutcome},
};
use storage::{session_store::SessionStore, traits::KeyValueStore};

use errors::CoreError;

/// Main entry point for the finchat core library.
///
/// Holds the open company snapshot, its conversation and the services
/// needed to talk about it. Company and report management is passed
/// straight to the backend; after any change the snapshot is refreshed.
#[must_use]
pub struct FinChat {
    settings: ClientSettings,
    companies: Arc<dyn CompanyBackend>,
    controller: ChatController,
    chart_service: ChartService,
    company: Option<Company>,
}

impl std::fmt::Debug for FinChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinChat")
            .field("api_base_url", &self.settings.api_base_url)
            .field("company", &self.company.as_ref().map(|c| c.id))
            .field("chat", &self.controller)
            .finish()
    }
}

impl FinChat {
    /// Connect to the HTTP backend from `settings`, persisting sessions in
    /// the configured store file (native only). An unusable store file is
    /// set aside and the client starts without remembered sessions.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn connect(settings: ClientSettings) -> Result<Self, CoreError> {
        settings.validate()?;
        let backend = Arc::new(api::http::HttpBackend::new(&settings));
        let store = storage::file::FileStore::open_or_reset(settings.resolved_session_store_path())?;
        Ok(Self::with_backends(
            settings,
            backend.clone(),
            backend,
            Box::new(store),
        ))
    }

    /// Assemble from explicit parts. Use this for custom transports or
    /// stores (WASM, tests).
    pub fn with_backends(
        settings: ClientSettings,
        chat: Arc<dyn ChatBackend>,
        companies: Arc<dyn CompanyBackend>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let locale = settings.locale;
        Self {
            controller: ChatController::new(chat, SessionStore::new(store), locale),
            chart_service: ChartService::new(locale),
            companies,
            settings,
            company: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // ── Company ─────────────────────────────────────────────────────

    /// Load a company and open (or resume) its conversation.
    pub async fn open_company(&mut self, company_id: i64) -> Result<InitOutcome, CoreError> {
        let company = self.companies.get_company(company_id).await?;
        self.company = Some(company);
        Ok(self.controller.initialize(company_id).await)
    }

    /// Re-fetch the open company's snapshot.
    pub async fn refresh_company(&mut self) -> Result<&Company, CoreError> {
        let id = self.active_company_id()?;
        let company = self.companies.get_company(id).await?;
        Ok(self.company.insert(company))
    }

    /// Snapshot of the open company, if any.
    #[must_use]
    pub fn company(&self) -> Option<&Company> {
        self.company.as_ref()
    }

    /// Trend analysis is only offered once the company has two reports.
    #[must_use]
    pub fn can_analyze_trends(&self) -> bool {
        self.company
            .as_ref()
            .is_some_and(Company::supports_trend_analysis)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, CoreError> {
        self.companies.list_companies().await
    }

    pub async fn create_company(&self, company: &NewCompany) -> Result<Company, CoreError> {
        company.validate()?;
        self.companies.create_company(company).await
    }

    /// Delete a company and drop its conversation.
    pub async fn delete_company(&mut self, company_id: i64) -> Result<(), CoreError> {
        self.companies.delete_company(company_id).await?;
        if let Err(e) = self.controller.clear_session(company_id).await {
            tracing::warn!(company_id, "Session cleanup after company deletion failed: {e}");
        }
        if self.company.as_ref().is_some_and(|c| c.id == company_id) {
            self.company = None;
        }
        Ok(())
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Upload a PDF report for the open company and refresh its snapshot.
    pub async fn upload_report(
        &mut self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        let id = self.active_company_id()?;
        validate_pdf_name(filename)?;
        let uploaded = self.companies.upload_report(id, filename, bytes).await?;
        self.refresh_company().await?;
        Ok(uploaded)
    }

    /// Upload a PDF and let the backend pick the company.
    pub async fn auto_upload_report(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        validate_pdf_name(filename)?;
        self.companies.auto_upload_report(filename, bytes).await
    }

    /// Delete a report of the open company and refresh its snapshot.
    pub async fn delete_report(&mut self, report_id: i64) -> Result<(), CoreError> {
        self.active_company_id()?;
        self.companies.delete_report(report_id).await?;
        self.refresh_company().await?;
        Ok(())
    }

    // ── Chat ────────────────────────────────────────────────────────

    /// Send a message in the open company's conversation.
    pub async fn send_message(&self, text: &str) -> ChatOutcome {
        self.controller.send_message(text).await
    }

    /// Request a trend analysis for the open company.
    /// Fails with a validation error while it has fewer than two reports.
    pub async fn analyze_trends(&self) -> Result<ChatOutcome, CoreError> {
        let id = self.active_company_id()?;
        if !self.can_analyze_trends() {
            return Err(CoreError::ValidationError(
                "Trend analysis needs at least two reports".into(),
            ));
        }
        Ok(self.controller.analyze_trends(id).await)
    }

    /// End the open company's conversation.
    pub async fn clear_session(&self) -> Result<(), CoreError> {
        let id = self.active_company_id()?;
        self.controller.clear_session(id).await
    }

    /// The message log, in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.controller.messages()
    }

    #[must_use]
    pub fn is_chat_busy(&self) -> bool {
        self.controller.is_in_flight()
    }

    #[must_use]
    pub fn chat(&self) -> &ChatController {
        &self.controller
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Chart view for a message, or `None` if it carries no chart.
    #[must_use]
    pub fn render_chart(&self, message: &ChatMessage) -> Option<ChartView> {
        self.chart_service.render(message.chart.as_ref())
    }

    #[must_use]
    pub fn chart_service(&self) -> &ChartService {
        &self.chart_service
    }

    // ── Internal ────────────────────────────────────────────────────

    fn active_company_id(&self) -> Result<i64, CoreError> {
        self.company
            .as_ref()
            .map(|c| c.id)
            .ok_or(CoreError::NoActiveCompany)
    }
}

fn validate_pdf_name(filename: &str) -> Result<(), CoreError> {
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(CoreError::ValidationError(format!(
            "Only PDF reports are accepted, got '{filename}'"
        )));
    }
    Ok(())
}
