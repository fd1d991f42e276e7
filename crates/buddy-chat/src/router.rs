//! Query router: central coordinator for one user message.
//!
//! Classifies the message with the completion client, resolves a place
//! query with carry-forward from history, searches, and writes the reply.
//! Client failures never escape as errors; they become an apology plus an
//! [`ErrorKind`] tag on the response.

use std::sync::Arc;

use serde::Serialize;

use buddy_core::config::SearchConfig;
use buddy_core::{
    ErrorKind, IntentKind, PlaceQuery, PlaceResult, QueryHints, QueryIntent, SessionId,
    TravelConfig, Turn,
};
use buddy_llm::{CompletionClient, CompletionRequest, LlmError};
use buddy_places::PlaceSearch;

use crate::context::{QueryResolver, Resolution};
use crate::error::ChatError;
use crate::intent::{classification_schema, parse_classification};
use crate::prompt;
use crate::store::SessionStore;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Router settings taken from [`TravelConfig`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Turns of history sent as context with each completion request.
    pub max_history_turns: usize,
    pub classification_max_tokens: u32,
    pub search: SearchConfig,
}

impl RouterConfig {
    pub fn from_config(config: &TravelConfig) -> Self {
        Self {
            max_history_turns: config.session.max_history_turns,
            classification_max_tokens: config.completion.classification_max_tokens,
            search: config.search.clone(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::from_config(&TravelConfig::default())
    }
}

/// What the UI shell receives for one user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterResponse {
    pub session_id: SessionId,
    /// Prose for the user. Never empty.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places: Option<Vec<PlaceResult>>,
    /// The place query that was constructed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<PlaceQuery>,
    /// `None` when classification failed or the reply was repeated.
    pub intent: Option<IntentKind>,
    pub error: Option<ErrorKind>,
    /// The message repeated the previous one and the earlier reply was
    /// returned without new client calls.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
}

/// Reply assembled by one routing pass, before it is stored.
struct Reply {
    text: String,
    places: Vec<PlaceResult>,
    query: Option<PlaceQuery>,
    /// Recorded on the stored turn when the search actually ran.
    executed: bool,
    /// Place query fields known at this point, carried into later turns.
    fields: Option<QueryHints>,
    intent: Option<IntentKind>,
    error: Option<ErrorKind>,
}

impl Reply {
    fn text(text: String, intent: Option<IntentKind>, error: Option<ErrorKind>) -> Self {
        Self {
            text,
            places: Vec::new(),
            query: None,
            executed: false,
            fields: None,
            intent,
            error,
        }
    }

    fn with_fields(mut self, fields: QueryHints) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Routes user messages to the completion and place clients.
pub struct QueryRouter {
    completion: Arc<dyn CompletionClient>,
    places: Arc<dyn PlaceSearch>,
    store: Arc<SessionStore>,
    resolver: QueryResolver,
    config: RouterConfig,
}

impl QueryRouter {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        places: Arc<dyn PlaceSearch>,
        store: Arc<SessionStore>,
        config: RouterConfig,
    ) -> Self {
        Self {
            completion,
            places,
            store,
            resolver: QueryResolver::new(config.search.clone()),
            config,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn places(&self) -> &Arc<dyn PlaceSearch> {
        &self.places
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Handle one user message for `session_id`.
    ///
    /// Only input validation fails; every client failure is reported in
    /// the response's `error` field.
    pub async fn handle_message(
        &self,
        session_id: &SessionId,
        message: &str,
    ) -> Result<RouterResponse, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }

        if let Some(previous) = self.store.duplicate_reply(session_id, message) {
            tracing::info!(session = %session_id, "Repeated message, returning previous reply");
            return Ok(RouterResponse {
                session_id: session_id.clone(),
                text: previous.content,
                places: previous.places,
                query: previous.query,
                intent: None,
                error: None,
                repeated: true,
            });
        }

        let user_turn = Turn::user(message);
        let history = self
            .store
            .history(session_id, self.config.max_history_turns);

        let reply = self.route(session_id, message, &history).await;

        if let Some(kind) = reply.error {
            tracing::warn!(session = %session_id, error_kind = %kind, "Request degraded");
        }

        let text = if reply.text.trim().is_empty() {
            prompt::REPLY_APOLOGY.to_string()
        } else {
            reply.text
        };

        let mut assistant_turn = Turn::assistant(text.clone()).with_places(reply.places.clone());
        if reply.executed {
            if let Some(query) = &reply.query {
                assistant_turn = assistant_turn.with_query(query.clone());
            }
        }
        if let Some(fields) = reply.fields {
            assistant_turn = assistant_turn.with_fields(fields);
        }
        self.store
            .append_exchange(session_id, user_turn, assistant_turn);

        Ok(RouterResponse {
            session_id: session_id.clone(),
            text,
            places: if reply.places.is_empty() {
                None
            } else {
                Some(reply.places)
            },
            query: reply.query,
            intent: reply.intent,
            error: reply.error,
            repeated: false,
        })
    }

    async fn route(&self, session_id: &SessionId, message: &str, history: &[Turn]) -> Reply {
        let intent = match self.classify(message, history).await {
            Ok(intent) => intent,
            Err(reason) => {
                tracing::error!(
                    session = %session_id,
                    error_kind = %ErrorKind::ClassificationFailure,
                    reason = %reason,
                    "Intent classification failed"
                );
                return Reply::text(
                    prompt::CLASSIFICATION_APOLOGY.to_string(),
                    None,
                    Some(ErrorKind::ClassificationFailure),
                );
            }
        };

        let kind = intent.kind();
        tracing::info!(session = %session_id, intent = ?kind, "Message classified");

        let hints = match intent {
            QueryIntent::GeneralChat => return self.general_chat(message, history).await,
            QueryIntent::NewQuery(hints) | QueryIntent::FollowUp(hints) => hints,
        };

        let carried = self.store.carried_fields(session_id);
        let fields = self.resolver.merge(&hints, &carried);
        let preference = self.store.radius_preference(session_id);
        match self.resolver.resolve(&fields, preference) {
            Resolution::Ready(query) => {
                self.search_and_summarize(message, history, kind, query)
                    .await
                    .with_fields(fields)
            }
            Resolution::Missing(missing) => {
                tracing::debug!(session = %session_id, ?missing, "Place query incomplete, asking user");
                let request = CompletionRequest::new(prompt::clarification_message(message, &missing))
                    .with_system(prompt::system_prompt(fields.category))
                    .with_history(history);
                let reply = match self.completion.complete(request).await {
                    Ok(c) => Reply::text(c.text, Some(kind), None),
                    Err(e) => reply_failed(e, Some(kind)),
                };
                reply.with_fields(fields)
            }
        }
    }

    async fn classify(&self, message: &str, history: &[Turn]) -> Result<QueryIntent, String> {
        let request = CompletionRequest::new(message)
            .with_system(prompt::classification_prompt())
            .with_history(history)
            .with_output_schema(classification_schema())
            .with_temperature(0.0)
            .with_max_tokens(self.config.classification_max_tokens);

        let completion = self
            .completion
            .complete(request)
            .await
            .map_err(|e| e.to_string())?;
        let structured = completion
            .structured
            .ok_or_else(|| "completion returned no structured output".to_string())?;
        parse_classification(&structured).map_err(|e| e.to_string())
    }

    async fn general_chat(&self, message: &str, history: &[Turn]) -> Reply {
        let request = CompletionRequest::new(message)
            .with_system(prompt::system_prompt(None))
            .with_history(history);
        match self.completion.complete(request).await {
            Ok(c) => Reply::text(c.text, Some(IntentKind::GeneralChat), None),
            Err(e) => reply_failed(e, Some(IntentKind::GeneralChat)),
        }
    }

    async fn search_and_summarize(
        &self,
        message: &str,
        history: &[Turn],
        kind: IntentKind,
        query: PlaceQuery,
    ) -> Reply {
        tracing::info!(
            category = %query.category,
            location = %query.location,
            radius_m = query.radius_m,
            "Searching places"
        );

        let places = match self.places.search(&query).await {
            Ok(places) => places,
            Err(e) => {
                tracing::error!(
                    error_kind = %ErrorKind::SearchFailure,
                    error = %e,
                    "Place search failed"
                );
                let request = CompletionRequest::new(prompt::search_failure_message(
                    message,
                    &query,
                    &e.to_string(),
                ))
                .with_system(prompt::system_prompt(Some(query.category)))
                .with_history(history);
                let text = match self.completion.complete(request).await {
                    Ok(c) if !c.text.trim().is_empty() => c.text,
                    Ok(_) => prompt::search_failure_fallback(&query),
                    Err(e) => {
                        tracing::warn!(error = %e, "Apology generation failed");
                        prompt::search_failure_fallback(&query)
                    }
                };
                return Reply {
                    text,
                    places: Vec::new(),
                    query: Some(query),
                    executed: false,
                    fields: None,
                    intent: Some(kind),
                    error: Some(ErrorKind::SearchFailure),
                };
            }
        };

        if places.is_empty() {
            return self.empty_results(message, history, kind, query).await;
        }

        let request = CompletionRequest::new(prompt::summary_message(message, &query, &places))
            .with_system(prompt::system_prompt(Some(query.category)))
            .with_history(history);
        let (text, error) = match self.completion.complete(request).await {
            Ok(c) => (c.text, None),
            Err(e) => {
                log_summarization_failure(&e);
                (
                    prompt::RESULTS_APOLOGY.to_string(),
                    Some(ErrorKind::SummarizationFailure),
                )
            }
        };

        Reply {
            text,
            places,
            query: Some(query),
            executed: true,
            fields: None,
            intent: Some(kind),
            error,
        }
    }

    async fn empty_results(
        &self,
        message: &str,
        history: &[Turn],
        kind: IntentKind,
        query: PlaceQuery,
    ) -> Reply {
        tracing::info!(category = %query.category, location = %query.location, "No places found");
        let request = CompletionRequest::new(prompt::empty_results_message(message, &query))
            .with_system(prompt::system_prompt(Some(query.category)))
            .with_history(history);
        let (text, error) = match self.completion.complete(request).await {
            Ok(c) if !c.text.trim().is_empty() => (c.text, None),
            Ok(_) => (prompt::empty_results_fallback(&query), None),
            Err(e) => {
                log_summarization_failure(&e);
                (
                    prompt::empty_results_fallback(&query),
                    Some(ErrorKind::SummarizationFailure),
                )
            }
        };
        Reply {
            text,
            places: Vec::new(),
            query: Some(query),
            executed: true,
            fields: None,
            intent: Some(kind),
            error,
        }
    }
}

fn reply_failed(err: LlmError, intent: Option<IntentKind>) -> Reply {
    log_summarization_failure(&err);
    Reply::text(
        prompt::REPLY_APOLOGY.to_string(),
        intent,
        Some(ErrorKind::SummarizationFailure),
    )
}

fn log_summarization_failure(err: &LlmError) {
    tracing::error!(
        error_kind = %ErrorKind::SummarizationFailure,
        error = %err,
        "Reply generation failed"
    );
}
