//! Client-side controller for the word-edit modal.
//!
//! The modal is an explicit component instance owning its own
//! [`ModalState`]. Each UI trigger is an async method returning a result
//! (`show` loads the edit fragment, `save` submits the form to its own
//! action, `delete` submits the same form to a configured delete route),
//! and the UI layer subscribes to [`ModalEvent`]s instead of mutating
//! shared state from callbacks.
//!
//! Failures never close the modal: non-2xx statuses, network errors and
//! explicit `{"success": false}` acks leave it open with the error
//! recorded inline so the user can retry or dismiss.

use std::{fmt, sync::Arc};

use reqwest::Client;
use serde::Deserialize;
use shared::{
    domain::{FormMethod, Fragment, WordForm},
    fragment::{extract_form, FormParseError},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Route the delete submission is posted to. The two deployed variants
/// differ only in this path, so it is configuration rather than code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRoute(String);

impl DeleteRoute {
    /// Variant A: `/delete_word`.
    pub fn delete_word() -> Self {
        Self("/delete_word".to_string())
    }

    /// Variant B: `/word/delete`.
    pub fn word_delete() -> Self {
        Self("/word/delete".to_string())
    }

    pub fn custom(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl Default for DeleteRoute {
    fn default() -> Self {
        Self::word_delete()
    }
}

#[derive(Debug, Clone)]
pub struct ModalConfig {
    /// Base URL the trigger hrefs, form actions and delete route resolve
    /// against.
    pub server_url: String,
    pub delete_route: DeleteRoute,
}

impl ModalConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            delete_route: DeleteRoute::default(),
        }
    }

    pub fn with_delete_route(mut self, route: DeleteRoute) -> Self {
        self.delete_route = route;
        self
    }
}

/// Why a request did not count as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Non-2xx HTTP status.
    Status(u16),
    /// The request produced no usable response.
    Network(String),
    /// 2xx response whose ack payload said `success: false`.
    Rejected,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {status}"),
            Self::Network(reason) => write!(f, "network error: {reason}"),
            Self::Rejected => write!(f, "server rejected the submission"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModalError {
    #[error("failed to load edit form from {url}: {reason}")]
    FragmentLoad { url: String, reason: FailureReason },
    #[error("failed to save word via {url}: {reason}")]
    Save { url: String, reason: FailureReason },
    #[error("failed to delete word via {url}: {reason}")]
    Delete { url: String, reason: FailureReason },
    #[error("loaded fragment has no usable form: {0}")]
    MalformedFragment(#[from] FormParseError),
    #[error("no edit form is loaded")]
    FormNotLoaded,
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    Loading {
        source: String,
    },
    Open {
        body: Fragment,
        error: Option<String>,
    },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

/// Which mutation closed the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Save,
    Delete,
}

/// State transitions broadcast to the subscribing UI layer.
#[derive(Debug, Clone)]
pub enum ModalEvent {
    Loading { url: String },
    Opened { body: Fragment },
    Closed { after: Mutation },
    Dismissed,
    Error(String),
}

#[derive(Debug, Deserialize)]
struct MutationAck {
    success: bool,
}

struct ControllerState {
    modal: ModalState,
    /// Form parsed out of the most recently loaded fragment. Kept across a
    /// close so a repeated trigger re-submits the same fields, the way the
    /// form element outlives the modal's visibility.
    form: Option<WordForm>,
}

pub struct WordModalController {
    http: Client,
    config: ModalConfig,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ModalEvent>,
}

impl WordModalController {
    pub fn new(config: ModalConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            http: Client::new(),
            config,
            inner: Mutex::new(ControllerState {
                modal: ModalState::Closed,
                form: None,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ModalEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> ModalState {
        self.inner.lock().await.modal.clone()
    }

    pub async fn loaded_form(&self) -> Option<WordForm> {
        self.inner.lock().await.form.clone()
    }

    /// Open the modal from a trigger element's href: transition to
    /// `Loading`, fetch the fragment, and on success inject it as the
    /// modal body with its form parsed for later submission.
    ///
    /// Any failure leaves the modal open with the error surfaced inline.
    pub async fn show(&self, href: &str) -> Result<(), ModalError> {
        let url = self.resolve(href)?;
        {
            let mut inner = self.inner.lock().await;
            inner.modal = ModalState::Loading {
                source: url.to_string(),
            };
            inner.form = None;
        }
        self.emit(ModalEvent::Loading {
            url: url.to_string(),
        });
        info!(%url, "loading word edit fragment");

        let fetched = match self.http.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    response
                        .text()
                        .await
                        .map_err(|err| FailureReason::Network(err.to_string()))
                } else {
                    Err(FailureReason::Status(status.as_u16()))
                }
            }
            Err(err) => Err(FailureReason::Network(err.to_string())),
        };

        let body = match fetched {
            Ok(body) => body,
            Err(reason) => {
                let err = ModalError::FragmentLoad {
                    url: url.to_string(),
                    reason,
                };
                warn!(error = %err, "fragment load failed");
                self.open_with_error(Fragment::default(), err.to_string())
                    .await;
                return Err(err);
            }
        };

        let fragment = Fragment::new(body);
        match extract_form(fragment.as_str()) {
            Ok(form) => {
                debug!(action = %form.action, fields = form.fields.len(), "edit form parsed");
                let mut inner = self.inner.lock().await;
                inner.modal = ModalState::Open {
                    body: fragment.clone(),
                    error: None,
                };
                inner.form = Some(form);
                drop(inner);
                self.emit(ModalEvent::Opened { body: fragment });
                Ok(())
            }
            Err(parse_err) => {
                warn!(error = %parse_err, "fragment loaded but contains no usable form");
                let err = ModalError::MalformedFragment(parse_err);
                {
                    let mut inner = self.inner.lock().await;
                    inner.modal = ModalState::Open {
                        body: fragment.clone(),
                        error: Some(err.to_string()),
                    };
                }
                self.emit(ModalEvent::Opened { body: fragment });
                self.emit(ModalEvent::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Submit the loaded form to its own action URL. A 2xx response (that
    /// is not an explicit rejection ack) closes the modal.
    pub async fn save(&self) -> Result<(), ModalError> {
        let form = self.require_form().await?;
        let url = self.resolve(&form.action)?;
        info!(%url, "saving word");
        let outcome = self
            .submit(&form, url.clone())
            .await
            .map_err(|reason| ModalError::Save {
                url: url.to_string(),
                reason,
            });
        self.finish_mutation(Mutation::Save, outcome).await
    }

    /// Submit the loaded form — same method, same serialized fields — to
    /// the configured delete route instead of the form's action.
    pub async fn delete(&self) -> Result<(), ModalError> {
        let form = self.require_form().await?;
        let url = self.resolve(self.config.delete_route.path())?;
        info!(%url, "deleting word");
        let outcome = self
            .submit(&form, url.clone())
            .await
            .map_err(|reason| ModalError::Delete {
                url: url.to_string(),
                reason,
            });
        self.finish_mutation(Mutation::Delete, outcome).await
    }

    /// User cancel: close without touching the backend. The loaded form is
    /// kept, matching a hidden-but-present form element.
    pub async fn dismiss(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.modal == ModalState::Closed {
                return;
            }
            inner.modal = ModalState::Closed;
        }
        self.emit(ModalEvent::Dismissed);
    }

    fn resolve(&self, path: &str) -> Result<Url, ModalError> {
        let base = Url::parse(&self.config.server_url).map_err(|source| ModalError::InvalidUrl {
            url: self.config.server_url.clone(),
            source,
        })?;
        base.join(path).map_err(|source| ModalError::InvalidUrl {
            url: path.to_string(),
            source,
        })
    }

    async fn require_form(&self) -> Result<WordForm, ModalError> {
        self.inner
            .lock()
            .await
            .form
            .clone()
            .ok_or(ModalError::FormNotLoaded)
    }

    /// One request per trigger: the form's declared method decides where
    /// the serialized fields travel (query string for GET, urlencoded body
    /// for POST).
    async fn submit(&self, form: &WordForm, url: Url) -> Result<(), FailureReason> {
        let fields = form.serialized_fields();
        let request = match form.method {
            FormMethod::Get => self.http.get(url).query(&fields),
            FormMethod::Post => self.http.post(url).form(&fields),
        };
        let response = request
            .send()
            .await
            .map_err(|err| FailureReason::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }

        // The backend acks mutations with `{"success": bool}` inside a
        // 2xx. Anything that is not an explicit rejection is success.
        let body = response.text().await.unwrap_or_default();
        if let Ok(ack) = serde_json::from_str::<MutationAck>(&body) {
            if !ack.success {
                return Err(FailureReason::Rejected);
            }
        }
        Ok(())
    }

    async fn finish_mutation(
        &self,
        mutation: Mutation,
        outcome: Result<(), ModalError>,
    ) -> Result<(), ModalError> {
        match outcome {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.modal = ModalState::Closed;
                }
                info!(?mutation, "submission succeeded; modal closed");
                self.emit(ModalEvent::Closed { after: mutation });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, ?mutation, "submission failed; modal stays open");
                let message = err.to_string();
                {
                    let mut inner = self.inner.lock().await;
                    if let ModalState::Open { error, .. } = &mut inner.modal {
                        *error = Some(message.clone());
                    }
                }
                self.emit(ModalEvent::Error(message));
                Err(err)
            }
        }
    }

    async fn open_with_error(&self, body: Fragment, message: String) {
        {
            let mut inner = self.inner.lock().await;
            inner.modal = ModalState::Open {
                body,
                error: Some(message.clone()),
            };
        }
        self.emit(ModalEvent::Error(message));
    }

    fn emit(&self, event: ModalEvent) {
        // Nobody subscribed is fine; the controller never depends on the
        // UI listening.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
