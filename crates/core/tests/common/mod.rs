// ═══════════════════════════════════════════════════════════════════
// Shared test doubles — in-memory chat and company backends
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use finchat_core::api::traits::{ChatBackend, CompanyBackend};
use finchat_core::errors::CoreError;
use finchat_core::models::chat::{
    AnalysisResponse, ChatReply, ChatRequest, ChatRole, HistoryEntry,
};
use finchat_core::models::company::{Company, NewCompany, Report, UploadedReport};

/// What the mock answers to the next chat request.
#[derive(Clone)]
pub enum Scripted {
    Text(String),
    /// `(has_chart, chart_data)` exactly as the backend would send them.
    WithChart(String, bool, serde_json::Value),
    Fail(String),
}

/// Chat backend scripted per test.
///
/// Issues a fresh uuid session id when the request carries none, echoes
/// the request's id otherwise. Unknown ids in `fetch_history` are
/// reported as `SessionNotFound`.
#[derive(Default)]
pub struct MockChatBackend {
    replies: Mutex<VecDeque<Scripted>>,
    histories: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    analysis: Mutex<Option<Result<serde_json::Value, String>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub analyzed: Mutex<Vec<i64>>,
    pub deleted: Mutex<Vec<String>>,
    fail_delete: Mutex<bool>,
    gate: Option<Arc<Notify>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every chat/analysis request waits for `release()` before answering.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Text(text.to_string()));
        self
    }

    pub fn reply_with_chart(self, text: &str, has_chart: bool, chart: serde_json::Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::WithChart(text.to_string(), has_chart, chart));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
        self
    }

    pub fn history(self, session_id: &str, entries: Vec<(ChatRole, &str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(role, content)| HistoryEntry {
                role,
                content: content.to_string(),
                timestamp: None,
            })
            .collect();
        self.histories
            .lock()
            .unwrap()
            .insert(session_id.to_string(), entries);
        self
    }

    pub fn analysis(self, result: serde_json::Value) -> Self {
        *self.analysis.lock().unwrap() = Some(Ok(result));
        self
    }

    pub fn analysis_fails(self) -> Self {
        *self.analysis.lock().unwrap() = Some(Err("analysis service down".into()));
        self
    }

    pub fn delete_fails(self) -> Self {
        *self.fail_delete.lock().unwrap() = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, CoreError> {
        self.requests.lock().unwrap().push(request.clone());
        self.wait_for_gate().await;

        let scripted = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Text("ok".into()));
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let reply = match scripted {
            Scripted::Text(text) => ChatReply::text(session_id, text),
            Scripted::WithChart(text, has_chart, chart) => {
                let mut reply = ChatReply::text(session_id, text);
                reply.has_chart = has_chart;
                reply.chart_data = Some(chart);
                reply
            }
            Scripted::Fail(message) => return Err(CoreError::Network(message)),
        };

        // Like the real service: history keeps text only.
        let mut histories = self.histories.lock().unwrap();
        let history = histories.entry(reply.session_id.clone()).or_default();
        history.push(HistoryEntry {
            role: ChatRole::User,
            content: request.message.clone(),
            timestamp: None,
        });
        history.push(HistoryEntry {
            role: ChatRole::Assistant,
            content: reply.response.clone(),
            timestamp: None,
        });
        Ok(reply)
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        self.histories
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))
    }

    async fn analyze(&self, company_id: i64) -> Result<AnalysisResponse, CoreError> {
        self.analyzed.lock().unwrap().push(company_id);
        self.wait_for_gate().await;

        let scripted = self.analysis.lock().unwrap().clone();
        match scripted {
            Some(Ok(result)) => Ok(AnalysisResponse::from_result(result)),
            Some(Err(message)) => Err(CoreError::Api {
                status: 500,
                message,
            }),
            None => Ok(AnalysisResponse::from_result(
                serde_json::json!({ "analysis": "Revenue is growing." }),
            )),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), CoreError> {
        self.deleted.lock().unwrap().push(session_id.to_string());
        if *self.fail_delete.lock().unwrap() {
            return Err(CoreError::Network("connection refused".into()));
        }
        self.histories.lock().unwrap().remove(session_id);
        Ok(())
    }
}

// ── Companies ───────────────────────────────────────────────────────

pub fn report(id: i64, period: Option<&str>, filename: &str) -> Report {
    Report {
        id,
        company_id: None,
        filename: filename.to_string(),
        report_type: None,
        report_period: period.map(str::to_string),
        report_year: None,
        report_quarter: None,
        upload_date: NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        file_size: 2 * 1024 * 1024,
        status: Some("processed".into()),
    }
}

pub fn company(id: i64, name: &str, reports: Vec<Report>) -> Company {
    Company {
        id,
        name: name.to_string(),
        ticker: None,
        industry: None,
        description: Some(format!("{name} description")),
        created_at: None,
        updated_at: None,
        reports_count: reports.len(),
        reports,
    }
}

/// Company backend over an in-memory map.
#[derive(Default)]
pub struct MockCompanyBackend {
    pub companies: Mutex<HashMap<i64, Company>>,
    next_id: Mutex<i64>,
}

impl MockCompanyBackend {
    pub fn new() -> Self {
        Self {
            companies: Mutex::new(HashMap::new()),
            next_id: Mutex::new(100),
        }
    }

    pub fn with_company(self, company: Company) -> Self {
        self.companies.lock().unwrap().insert(company.id, company);
        self
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    fn uploaded(&self, company_id: i64, filename: &str, size: usize) -> Result<UploadedReport, CoreError> {
        let id = self.next_id();
        let mut companies = self.companies.lock().unwrap();
        let company = companies
            .get_mut(&company_id)
            .ok_or(CoreError::CompanyNotFound(company_id))?;
        let mut new_report = report(id, None, filename);
        new_report.file_size = size as u64;
        company.reports.push(new_report.clone());
        company.reports_count = company.reports.len();
        Ok(UploadedReport {
            id,
            company_id,
            company_name: Some(company.name.clone()),
            filename: filename.to_string(),
            report_type: None,
            report_period: None,
            upload_date: new_report.upload_date,
            file_size: size as u64,
            status: Some("processed".into()),
        })
    }
}

#[async_trait]
impl CompanyBackend for MockCompanyBackend {
    async fn list_companies(&self) -> Result<Vec<Company>, CoreError> {
        let mut list: Vec<Company> = self.companies.lock().unwrap().values().cloned().collect();
        list.sort_by_key(|c| c.id);
        Ok(list)
    }

    async fn get_company(&self, company_id: i64) -> Result<Company, CoreError> {
        self.companies
            .lock()
            .unwrap()
            .get(&company_id)
            .cloned()
            .ok_or(CoreError::CompanyNotFound(company_id))
    }

    async fn create_company(&self, new: &NewCompany) -> Result<Company, CoreError> {
        let id = self.next_id();
        let mut created = company(id, &new.name, vec![]);
        created.ticker = new.ticker.clone();
        created.industry = new.industry.clone();
        created.description = new.description.clone();
        self.companies.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn delete_company(&self, company_id: i64) -> Result<(), CoreError> {
        self.companies
            .lock()
            .unwrap()
            .remove(&company_id)
            .map(|_| ())
            .ok_or(CoreError::CompanyNotFound(company_id))
    }

    async fn upload_report(
        &self,
        company_id: i64,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        self.uploaded(company_id, filename, bytes.len())
    }

    async fn auto_upload_report(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedReport, CoreError> {
        let first = self
            .companies
            .lock()
            .unwrap()
            .keys()
            .min()
            .copied()
            .ok_or_else(|| CoreError::Api {
                status: 422,
                message: "No matching company".into(),
            })?;
        self.uploaded(first, filename, bytes.len())
    }

    async fn delete_report(&self, report_id: i64) -> Result<(), CoreError> {
        let mut companies = self.companies.lock().unwrap();
        for company in companies.values_mut() {
            if let Some(pos) = company.reports.iter().position(|r| r.id == report_id) {
                company.reports.remove(pos);
                company.reports_count = company.reports.len();
                return Ok(());
            }
        }
        Err(CoreError::Api {
            status: 404,
            message: "Report not found".into(),
        })
    }
}
