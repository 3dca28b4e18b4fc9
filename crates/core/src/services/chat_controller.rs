use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::traits::ChatBackend;
use crate::errors::CoreError;
use crate::models::chat::{ChatMessage, ChatRequest};
use crate::models::locale::Locale;
use crate::storage::session_store::SessionStore;

/// Result of a chat operation, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Nothing happened: empty input, no open company, or a request was
    /// already in flight.
    Ignored,
    /// The backend answered and its reply was appended.
    Delivered,
    /// The request failed and the fixed fallback reply was appended.
    Fallback,
    /// The conversation was reset or switched while the request was
    /// pending; the reply was dropped.
    Discarded,
}

/// How `initialize` left the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No stored session: empty log.
    Fresh,
    /// Stored session resumed with this many history entries.
    Resumed(usize),
    /// Stored session rejected by the backend; mapping forgotten, empty log.
    Reset,
}

/// Conversation state for the open company.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub company_id: Option<i64>,
    pub log: Vec<ChatMessage>,
    pub session_id: Option<String>,
    pub in_flight: bool,
    /// Bumped whenever the conversation is replaced, so late replies for
    /// an older conversation can be recognised.
    epoch: u64,
}

/// Drives one company's conversation with the analysis service.
///
/// All operations take `&self`; the state sits behind a mutex that is never
/// held across an await. At most one chat or analysis request is in flight:
/// a second call made meanwhile returns `ChatOutcome::Ignored` without
/// touching the log. User messages are appended before the request goes out
/// and are never rolled back; the reply (or the fallback text) is appended
/// after it resolves.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    sessions: Mutex<SessionStore>,
    state: Mutex<SessionState>,
    locale: Locale,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, sessions: SessionStore, locale: Locale) -> Self {
        Self {
            backend,
            sessions: Mutex::new(sessions),
            state: Mutex::new(SessionState::default()),
            locale,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Snapshot of the message log, in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().log.clone()
    }

    /// Copy of the whole conversation state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.state().log.len()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.state().session_id.clone()
    }

    #[must_use]
    pub fn company_id(&self) -> Option<i64> {
        self.state().company_id
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.state().in_flight
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Session id persisted for a company, read straight from the store.
    pub fn stored_session(&self, company_id: i64) -> Result<Option<String>, CoreError> {
        self.sessions().resolve(company_id)
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Open the conversation for `company_id`, resuming its stored session.
    ///
    /// A stored session whose history cannot be fetched is forgotten and
    /// the conversation starts empty. History carries no charts.
    pub async fn initialize(&self, company_id: i64) -> InitOutcome {
        let epoch = {
            let mut state = self.state();
            state.epoch += 1;
            state.company_id = Some(company_id);
            state.log.clear();
            state.session_id = None;
            state.in_flight = false;
            state.epoch
        };

        let stored = match self.sessions().resolve(company_id) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(company_id, "Could not read stored chat session: {e}");
                None
            }
        };
        let Some(session_id) = stored else {
            tracing::debug!(company_id, "No stored chat session");
            return InitOutcome::Fresh;
        };

        // History loading counts as in flight so nothing is sent into a log
        // that is about to be replaced.
        let guard = {
            let mut state = self.state();
            if state.epoch != epoch {
                return InitOutcome::Fresh;
            }
            state.session_id = Some(session_id.clone());
            state.in_flight = true;
            InFlightGuard::new(&self.state, epoch)
        };

        let result = self.backend.fetch_history(&session_id).await;

        let outcome = match result {
            Ok(entries) => {
                let count = entries.len();
                let mut state = self.state();
                if state.epoch == epoch {
                    state.log = entries.into_iter().map(ChatMessage::from).collect();
                    tracing::info!(company_id, session_id = %session_id, messages = count, "Resumed chat session");
                }
                InitOutcome::Resumed(count)
            }
            Err(e) => {
                tracing::warn!(company_id, session_id = %session_id, "Chat history unavailable, starting fresh: {e}");
                self.forget_if_current(company_id, &session_id);
                let mut state = self.state();
                if state.epoch == epoch {
                    state.log.clear();
                    state.session_id = None;
                }
                InitOutcome::Reset
            }
        };
        drop(guard);
        outcome
    }

    /// Send a user message and append the reply.
    ///
    /// Whitespace-only text, no open company, or a request already in flight
    /// make this a no-op. The first successful reply of a conversation binds
    /// the backend-issued session id to the company. On failure a fixed
    /// apology is appended instead and the session id is left untouched.
    pub async fn send_message(&self, text: &str) -> ChatOutcome {
        if text.trim().is_empty() {
            return ChatOutcome::Ignored;
        }

        let (request, epoch, guard) = {
            let mut state = self.state();
            let Some(company_id) = state.company_id else {
                tracing::warn!("send_message called with no company open");
                return ChatOutcome::Ignored;
            };
            if state.in_flight {
                tracing::debug!(company_id, "Chat request already in flight, ignoring message");
                return ChatOutcome::Ignored;
            }
            state.log.push(ChatMessage::user(text));
            state.in_flight = true;
            let request = ChatRequest {
                message: text.to_string(),
                company_id,
                session_id: state.session_id.clone(),
            };
            (request, state.epoch, InFlightGuard::new(&self.state, state.epoch))
        };

        let result = self.backend.send_message(&request).await;

        let mut state = self.state();
        let outcome = if state.epoch != epoch {
            tracing::debug!(company_id = request.company_id, "Conversation changed, dropping chat reply");
            ChatOutcome::Discarded
        } else {
            match result {
                Ok(reply) => {
                    if request.session_id.is_none() {
                        self.adopt_session(&mut state, request.company_id, &reply.session_id);
                    }
                    let chart = reply.chart();
                    state
                        .log
                        .push(ChatMessage::assistant(reply.response).with_chart(chart));
                    ChatOutcome::Delivered
                }
                Err(e) => {
                    tracing::warn!(company_id = request.company_id, "Chat request failed: {e}");
                    state.log.push(ChatMessage::assistant(self.locale.chat_failure()));
                    ChatOutcome::Fallback
                }
            }
        };
        drop(state);
        drop(guard);
        outcome
    }

    /// Ask the backend for a trend analysis across the company's reports.
    ///
    /// Shares the in-flight exclusion with `send_message` and, like it, is a
    /// no-op unless `company_id` is the open conversation's company. Whether
    /// the company has enough reports is the caller's check. No session id
    /// is involved.
    pub async fn analyze_trends(&self, company_id: i64) -> ChatOutcome {
        let (epoch, guard) = {
            let mut state = self.state();
            if state.company_id != Some(company_id) {
                tracing::warn!(
                    company_id,
                    open_company = ?state.company_id,
                    "Trend analysis requested for a company that is not open"
                );
                return ChatOutcome::Ignored;
            }
            if state.in_flight {
                tracing::debug!(company_id, "Request already in flight, ignoring trend analysis");
                return ChatOutcome::Ignored;
            }
            state.log.push(ChatMessage::user(self.locale.trend_request()));
            state.in_flight = true;
            (state.epoch, InFlightGuard::new(&self.state, state.epoch))
        };

        let result = self.backend.analyze(company_id).await;

        let mut state = self.state();
        let outcome = if state.epoch != epoch {
            ChatOutcome::Discarded
        } else {
            match result {
                Ok(analysis) => {
                    let content = format!(
                        "{}\n\n{}",
                        self.locale.trend_heading(),
                        analysis.analysis_text()
                    );
                    state.log.push(ChatMessage::assistant(content));
                    ChatOutcome::Delivered
                }
                Err(e) => {
                    tracing::warn!(company_id, "Trend analysis failed: {e}");
                    state.log.push(ChatMessage::assistant(self.locale.trend_failure()));
                    ChatOutcome::Fallback
                }
            }
        };
        drop(state);
        drop(guard);
        outcome
    }

    /// End the company's conversation: forget the stored session, empty the
    /// log and ask the backend to delete the session.
    ///
    /// Local state is reset even when the backend call fails; the backend
    /// error is still returned.
    pub async fn clear_session(&self, company_id: i64) -> Result<(), CoreError> {
        let session_id = {
            let mut state = self.state();
            let mut session_id = None;
            if state.company_id == Some(company_id) {
                session_id = state.session_id.take();
                state.epoch += 1;
                state.log.clear();
                state.in_flight = false;
            }
            session_id
        };

        let stored = {
            let mut sessions = self.sessions();
            let stored = sessions.resolve(company_id).unwrap_or_else(|e| {
                tracing::warn!(company_id, "Could not read stored chat session: {e}");
                None
            });
            if let Err(e) = sessions.forget(company_id) {
                tracing::warn!(company_id, "Could not forget chat session: {e}");
            }
            stored
        };

        match session_id.or(stored) {
            Some(session_id) => self.backend.delete_session(&session_id).await,
            None => Ok(()),
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    fn adopt_session(&self, state: &mut SessionState, company_id: i64, session_id: &str) {
        state.session_id = Some(session_id.to_string());
        if let Err(e) = self.sessions().bind(company_id, session_id) {
            tracing::warn!(company_id, session_id, "Could not persist chat session: {e}");
        }
    }

    /// Forget the stored mapping only if it still points at `session_id`.
    fn forget_if_current(&self, company_id: i64, session_id: &str) {
        let mut sessions = self.sessions();
        match sessions.resolve(company_id) {
            Ok(Some(current)) if current == session_id => {
                if let Err(e) = sessions.forget(company_id) {
                    tracing::warn!(company_id, "Could not forget chat session: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(company_id, "Could not read stored chat session: {e}"),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ChatController")
            .field("company_id", &state.company_id)
            .field("messages", &state.log.len())
            .field("session_id", &state.session_id)
            .field("in_flight", &state.in_flight)
            .field("locale", &self.locale)
            .finish()
    }
}

/// Clears the in-flight flag when dropped, including when the owning
/// future is cancelled. Does nothing if the conversation moved on.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    epoch: u64,
}

impl<'a> InFlightGuard<'a> {
    fn new(state: &'a Mutex<SessionState>, epoch: u64) -> Self {
        Self { state, epoch }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.epoch == self.epoch {
            state.in_flight = false;
        }
    }
}
