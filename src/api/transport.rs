//! The wire boundary of the client.
//!
//! `ApiClient` describes requests as plain data and hands them to a
//! `Transport`; only `HttpTransport` talks to the network. Tests script
//! responses through `mock::MockTransport` instead.

use std::time::Duration;

use reqwest::Method;

use crate::errors::TodoError;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: String, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body,
        }
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new<T: Into<String>>(status: u16, body: T) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TodoError>;
}

/// Blocking reqwest transport
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TodoError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TodoError> {
        let mut builder = self.client.request(request.method, request.url.as_str());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send()?;

        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
pub mod mock {
    use std::{cell::RefCell, collections::VecDeque};

    use super::{ApiRequest, ApiResponse, Transport};
    use crate::errors::TodoError;

    /// Replays scripted responses in order and records every request
    #[derive(Default)]
    pub struct MockTransport {
        responses: RefCell<VecDeque<Result<ApiResponse, TodoError>>>,
        requests: RefCell<Vec<ApiRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond<T: Into<String>>(&self, status: u16, body: T) -> &Self {
            self.responses
                .borrow_mut()
                .push_back(Ok(ApiResponse::new(status, body)));
            self
        }

        pub fn fail(&self, error: TodoError) -> &Self {
            self.responses.borrow_mut().push_back(Err(error));
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.borrow().clone()
        }

        pub fn last_request(&self) -> Option<ApiRequest> {
            self.requests.borrow().last().cloned()
        }

        pub fn pending(&self) -> usize {
            self.responses.borrow().len()
        }
    }

    impl Transport for MockTransport {
        fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TodoError> {
            self.requests.borrow_mut().push(request);

            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TodoError::Network(String::from("no response scripted"))))
        }
    }
}
