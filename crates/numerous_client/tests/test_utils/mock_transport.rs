//! Scripted transport for client tests.
//!
//! Responses are served in order from a queue. Once the queue runs dry the
//! fallback response (if any) is repeated; without one, the transport
//! reports a connection failure. Clones share the queue and the request
//! log, so a test keeps one clone and hands the other to the connection.

use numerous_client::Transport;
use numerous_core::{Outcome, RequestDescriptor};
use numerous_error::{HttpError, NumerousResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted exchange.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The server answers with this outcome
    Reply(Outcome),
    /// No response is obtained
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    fallback: Option<Outcome>,
    requests: Vec<RequestDescriptor>,
}

/// Transport that replays scripted responses and records requests.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// A transport replying with `outcomes` in order.
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let transport = Self::default();
        for outcome in outcomes {
            transport.push(MockResponse::Reply(outcome));
        }
        transport
    }

    /// A transport replying with `outcome` forever.
    pub fn repeating(outcome: Outcome) -> Self {
        let transport = Self::default();
        transport.state().fallback = Some(outcome);
        transport
    }

    /// Queue another scripted exchange.
    pub fn push(&self, response: MockResponse) {
        self.state().script.push_back(response);
    }

    /// Number of exchanges performed.
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Every request sent, in order.
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.state().requests.clone()
    }

    /// URLs of every request sent, in order.
    pub fn urls(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .map(|request| request.url().clone())
            .collect()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &RequestDescriptor) -> NumerousResult<Outcome> {
        let mut state = self.state();
        state.requests.push(request.clone());

        match state.script.pop_front() {
            Some(MockResponse::Reply(outcome)) => Ok(outcome),
            Some(MockResponse::Fail(message)) => Err(HttpError::new(message).into()),
            None => match &state.fallback {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(HttpError::new("Mock transport script exhausted").into()),
            },
        }
    }
}
