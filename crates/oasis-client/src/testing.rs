//! In-process doubles for the REST client and the view.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use oasis_shared::Envelope;
use oasis_store::Record;
use tokio::sync::Notify;

use crate::api::RestClient;
use crate::error::ApiError;
use crate::requests::Request;
use crate::view::View;

/// Answers requests from a queue of canned responses, in order.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Envelope, ApiError>>>,
    sent: Mutex<Vec<Request>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, envelope: Envelope) {
        self.responses.lock().unwrap().push_back(Ok(envelope));
    }

    pub fn push_err(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Make the next request wait until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }
}

impl RestClient for ScriptedClient {
    async fn send(&self, request: &Request) -> Result<Envelope, ApiError> {
        self.sent.lock().unwrap().push(request.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ApiError::Transport("no scripted response".into())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Loading,
    Reload {
        ids: Vec<String>,
        empty_message: Option<String>,
    },
    Error(String),
}

/// Records every call; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
    last_records: Arc<Mutex<Vec<Record>>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_reload(&self) -> Vec<Record> {
        self.last_records.lock().unwrap().clone()
    }

    pub fn last_reload_ids(&self) -> Vec<String> {
        self.last_reload()
            .into_iter()
            .map(|r| r.id.as_str().to_string())
            .collect()
    }
}

impl View for RecordingView {
    fn show_loading(&self) {
        self.events.lock().unwrap().push(ViewEvent::Loading);
    }

    fn reload(&self, records: &[Record], empty_message: Option<&str>) {
        *self.last_records.lock().unwrap() = records.to_vec();
        self.events.lock().unwrap().push(ViewEvent::Reload {
            ids: records.iter().map(|r| r.id.as_str().to_string()).collect(),
            empty_message: empty_message.map(str::to_string),
        });
    }

    fn show_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Error(message.to_string()));
    }
}
