// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Generic code for REST handlers.
//!
//! Services declare their APIs as route groups (see the `router` module) whose handlers operate on
//! engine-independent `HttpRequest` and `HttpResponse` envelopes.  The `server` module provides the
//! glue to serve those handlers with axum.
//!
//! Every API should be put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This
//! may seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API should define a `route` method that
//! returns the HTTP method and the API path under test.  All integration tests within the module
//! then rely on `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::DriverError;
use async_trait::async_trait;
use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub mod router;
pub mod server;

/// Message returned to clients on any unexpected failure.  The real cause only goes to the logs.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "internal server error";

/// Engine-independent representation of an incoming request.
#[derive(Debug, Default)]
pub struct HttpRequest {
    /// Parameters extracted from the path, keyed by their name in the route.
    pub params: HashMap<String, String>,

    /// Parameters extracted from the query string.
    pub query: HashMap<String, String>,

    /// The parsed JSON body, if the request carried any content.
    pub body: Option<Value>,

    /// Request headers with lowercase names.  Headers with non-textual values are dropped.
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Creates a request that only carries `body`.
    pub fn with_body(body: Value) -> Self {
        Self { body: Some(body), ..Default::default() }
    }

    /// Returns the payload stored in the `data` field of the body envelope.
    ///
    /// A payload that is missing, null, or one of the "empty" scalars (`false`, `0` and `""`) is
    /// considered absent.
    pub fn payload(&self) -> Option<&Value> {
        let data = self.body.as_ref()?.get("data")?;
        let present = match data {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        };
        if present { Some(data) } else { None }
    }
}

/// Envelope for the body of all responses.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResponseBody {
    /// Payload of a successful response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Textual representation of the error message of a failed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Engine-independent representation of an outgoing response.
#[derive(Debug)]
pub struct HttpResponse {
    /// The status code to return.
    pub status: StatusCode,

    /// The body to return.  `None` produces a response without content.
    pub body: Option<ResponseBody>,

    /// Extra headers to attach to the response.
    pub headers: HashMap<String, String>,
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("Dropping invalid response header {}: {}", name, value),
            }
        }

        match self.body {
            Some(body) => (self.status, headers, Json(body)).into_response(),
            None => (self.status, headers).into_response(),
        }
    }
}

/// Handler for a single API, invoked with the normalized request.
///
/// Handlers never fail: every error must have been converted into a response by the time the
/// handler returns.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Processes `request` and returns the response to send back to the client.
    async fn handle(&self, request: HttpRequest) -> HttpResponse;
}

/// Adapter to use a plain async function as a `RouteHandler`.
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HttpResponse> + Send,
{
    async fn handle(&self, request: HttpRequest) -> HttpResponse {
        (self.0)(request).await
    }
}

/// Wraps an async function `f` into a shareable `RouteHandler`.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Errors raised by the business logic.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Indicates that the request did not carry the payload the API needs.
    #[error("Required fields were not filled in")]
    EmptyRequestBody,

    /// Indicates an error in the format of the request.
    #[error("{0}")]
    InvalidRequest(String),
}

impl RestError {
    /// Returns the name of the error kind, used to classify failures in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RestError::Driver(e) => e.kind(),
            RestError::EmptyRequestBody => "EmptyRequestBodyError",
            RestError::InvalidRequest(_) => "InvalidRequestError",
        }
    }

    /// Returns the HTTP status code for classified errors, or `None` if the error is unexpected.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RestError::Driver(e) => e.status(),
            RestError::EmptyRequestBody => Some(StatusCode::UNPROCESSABLE_ENTITY),
            RestError::InvalidRequest(_) => Some(StatusCode::BAD_REQUEST),
        }
    }

    /// Converts the error into the response to send to the client.
    ///
    /// Classified errors expose their message and status.  Anything else becomes a generic 500
    /// and the details are only logged.
    pub fn into_http_response(self) -> HttpResponse {
        match self.status() {
            Some(status) => {
                warn!("Request failed with {}: {}", self.kind(), self);
                responses::client_error(status, self.to_string())
            }
            None => responses::server_error(&self),
        }
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Constructors for the responses that handlers return.
pub mod responses {
    use super::*;

    /// Builds a response with `status` and an optional `body`.
    fn build(status: StatusCode, body: Option<ResponseBody>) -> HttpResponse {
        HttpResponse { status, body, headers: HashMap::default() }
    }

    /// Response for a successfully created entity.  Carries no content.
    pub fn created() -> HttpResponse {
        build(StatusCode::CREATED, None)
    }

    /// Response for a successful operation that returns `data`.
    pub fn success(data: Value) -> HttpResponse {
        build(StatusCode::OK, Some(ResponseBody { data: Some(data), error: None }))
    }

    /// Response for a failed operation whose `message` can be shown to the client.
    pub fn client_error<M: Into<String>>(status: StatusCode, message: M) -> HttpResponse {
        build(status, Some(ResponseBody { data: None, error: Some(message.into()) }))
    }

    /// Response for an unexpected failure.  Logs `cause` and hides it from the client.
    pub fn server_error(cause: &dyn fmt::Display) -> HttpResponse {
        error!("Internal server error: {}", cause);
        client_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_MESSAGE)
    }
}

/// Common test code for the REST server.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use crate::rest::server::{HttpServer, ServerResult};
    use axum::Router;
    use axum::extract::Request;
    use axum::http;
    use serde::de::DeserializeOwned;
    use std::net::SocketAddr;
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 4096;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
                .body(axum::body::Body::from(text.into()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }
    }

    /// Type alias for the response type returned by the `oneshot` function.
    type OneShotResponse = axum::response::Response;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: OneShotResponse,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<OneShotResponse> for ResponseChecker {
        fn from(response: OneShotResponse) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Performs common validation operations on the response.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Finishes checking the response and expects it to contain an empty body.
        pub async fn expect_empty(self) {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(body.is_empty(), "Body not empty; got {}", body);
        }

        /// Finishes checking the response and expects its body to be a `ResponseBody` with an
        /// error that matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            assert!(!exp_re.is_empty(), "Error messages are never empty");

            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let response: ResponseBody = match serde_json::from_slice(&body) {
                Ok(response) => response,
                Err(e) => {
                    let body = String::from_utf8(body.to_vec()).unwrap();
                    panic!("Invalid error response due to {}; content was {}", e, body);
                }
            };
            let message = match response.error.as_ref() {
                Some(message) => message,
                None => panic!("Response '{:?}' does not contain an error", response),
            };
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(message),
                "Response content '{:?}' does not match re '{}'",
                response,
                exp_re
            );
        }

        /// Finishes checking the response and expects it to contain a `ResponseBody` whose
        /// `data` is a valid JSON object of type `T`.
        pub async fn expect_data<T: DeserializeOwned>(self) -> T {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let response: ResponseBody = serde_json::from_slice(&body).unwrap();
            assert_eq!(None, response.error, "Unexpected error in successful response");
            serde_json::from_value::<T>(response.data.expect("Response lacks data")).unwrap()
        }
    }

    /// An `HttpServer` that records the routes it receives instead of serving them.
    #[derive(Default)]
    pub struct RecordingHttpServer {
        /// Routes registered so far, in registration order.
        routes: Vec<(http::Method, String, Arc<dyn RouteHandler>)>,
    }

    impl RecordingHttpServer {
        /// Records a registration of `handler` for `method` and `path`.
        fn record(&mut self, method: http::Method, path: &str, handler: Arc<dyn RouteHandler>) {
            self.routes.push((method, path.to_owned(), handler));
        }

        /// Returns the method/path pairs registered so far, in registration order.
        pub fn routes(&self) -> Vec<(http::Method, String)> {
            self.routes.iter().map(|(method, path, _)| (method.clone(), path.clone())).collect()
        }

        /// Invokes the handler registered for `method` and `path` with `request`.
        pub async fn call(
            &self,
            method: http::Method,
            path: &str,
            request: HttpRequest,
        ) -> HttpResponse {
            let handler = self
                .routes
                .iter()
                .find(|(m, p, _)| *m == method && p == path)
                .map(|(_, _, handler)| handler.clone())
                .unwrap_or_else(|| panic!("No handler for {} {}", method, path));
            handler.handle(request).await
        }
    }

    #[async_trait]
    impl HttpServer for RecordingHttpServer {
        fn get(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
            self.record(http::Method::GET, path, handler);
        }

        fn post(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
            self.record(http::Method::POST, path, handler);
        }

        fn put(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
            self.record(http::Method::PUT, path, handler);
        }

        fn delete(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
            self.record(http::Method::DELETE, path, handler);
        }

        async fn start(&mut self, addr: SocketAddr) -> ServerResult<SocketAddr> {
            Ok(addr)
        }

        async fn stop(&mut self) -> ServerResult<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_present() {
        let request = HttpRequest::with_body(json!({"data": {"abbreviation": "Cel"}}));
        assert_eq!(Some(&json!({"abbreviation": "Cel"})), request.payload());

        let request = HttpRequest::with_body(json!({"data": "text"}));
        assert_eq!(Some(&json!("text")), request.payload());
    }

    #[test]
    fn test_payload_absent() {
        assert_eq!(None, HttpRequest::default().payload());
        assert_eq!(None, HttpRequest::with_body(json!({})).payload());
        assert_eq!(None, HttpRequest::with_body(json!([1, 2])).payload());
        for data in [json!(null), json!(false), json!(0), json!(""), json!(0.0)] {
            assert_eq!(None, HttpRequest::with_body(json!({ "data": data })).payload());
        }
    }

    #[test]
    fn test_response_body_skips_missing_fields() {
        let body = ResponseBody { data: None, error: Some("oops".to_owned()) };
        assert_eq!(r#"{"error":"oops"}"#, serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn test_rest_error_classified() {
        let response = RestError::EmptyRequestBody.into_http_response();
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status);
        assert_eq!(
            Some("Required fields were not filled in".to_owned()),
            response.body.unwrap().error
        );

        let response =
            RestError::from(DriverError::DuplicatedKey("Ordem hierárquica".to_owned()))
                .into_http_response();
        assert_eq!(StatusCode::CONFLICT, response.status);
        assert_eq!(
            Some("A Ordem hierárquica with this value already exists".to_owned()),
            response.body.unwrap().error
        );
    }

    #[test]
    fn test_rest_error_unexpected_hides_details() {
        let response =
            RestError::from(DriverError::BackendError("disk on fire".to_owned()))
                .into_http_response();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status);
        assert_eq!(Some(INTERNAL_SERVER_ERROR_MESSAGE.to_owned()), response.body.unwrap().error);
    }

    #[test]
    fn test_http_response_into_response() {
        let mut response = responses::created();
        response.headers.insert("x-request-id".to_owned(), "abc".to_owned());
        response.headers.insert("not a header".to_owned(), "x".to_owned());

        let response = response.into_response();
        assert_eq!(StatusCode::CREATED, response.status());
        assert_eq!("abc", response.headers().get("x-request-id").unwrap());
        assert!(!response.headers().keys().any(|name| name.as_str().contains(' ')));
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|request: HttpRequest| async move {
            responses::success(request.body.unwrap_or(Value::Null))
        });
        let response = handler.handle(HttpRequest::with_body(json!({"a": 1}))).await;
        assert_eq!(StatusCode::OK, response.status);
        assert_eq!(Some(json!({"a": 1})), response.body.unwrap().data);
    }
}
