//! Recording transport and response helpers for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::client::Client;
use crate::config::{ClientConfig, Environment};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued responses in order and records every request it sees.
/// With nothing queued it fails like a dead network.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn push(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("connection refused".into()))
    }
}

pub(crate) fn client(transport: FakeTransport) -> Client<FakeTransport> {
    Client::with_transport(ClientConfig::new("test-api-key", Environment::Local), transport)
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}

pub(crate) fn ok(body: &str) -> HttpResponse {
    response(200, body)
}

pub(crate) fn created(body: &str) -> HttpResponse {
    response(201, body)
}

pub(crate) trait ResponseExt {
    fn with_cookie(self, cookie: &str) -> Self;
}

impl ResponseExt for HttpResponse {
    fn with_cookie(mut self, cookie: &str) -> Self {
        self.headers.push(("set-cookie".to_string(), format!("{cookie}; Path=/; HttpOnly")));
        self
    }
}
