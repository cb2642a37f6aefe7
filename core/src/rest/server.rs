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

//! HTTP server abstraction and its axum-based implementation.

use crate::rest::{HttpRequest, RestError, RouteHandler};
use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, RawPathParams};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, on};
use log::{debug, info};
use std::collections::HashMap;
use std::io;
use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Indicates that `start` was called on a running server.
    #[error("Server is already running")]
    AlreadyRunning,

    /// Indicates a failure to set up or run the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Indicates that `stop` was called on a server that is not running.
    #[error("Server is not running")]
    NotRunning,

    /// Indicates that the serving task terminated abnormally.
    #[error("Server task failed: {0}")]
    Task(String),
}

/// Result type for this module.
pub type ServerResult<T> = Result<T, ServerError>;

/// Capability to serve HTTP routes, implemented on top of a concrete HTTP engine.
#[async_trait]
pub trait HttpServer: Send {
    /// Registers `handler` to serve GET requests on `path`.
    fn get(&mut self, path: &str, handler: Arc<dyn RouteHandler>);

    /// Registers `handler` to serve POST requests on `path`.
    fn post(&mut self, path: &str, handler: Arc<dyn RouteHandler>);

    /// Registers `handler` to serve PUT requests on `path`.
    fn put(&mut self, path: &str, handler: Arc<dyn RouteHandler>);

    /// Registers `handler` to serve DELETE requests on `path`.
    fn delete(&mut self, path: &str, handler: Arc<dyn RouteHandler>);

    /// Starts serving on `addr` and returns the address actually bound.
    ///
    /// Returns as soon as the server is accepting connections.
    async fn start(&mut self, addr: SocketAddr) -> ServerResult<SocketAddr>;

    /// Stops a server previously started with `start`, waiting for in-flight requests.
    async fn stop(&mut self) -> ServerResult<()>;
}

/// State of a server that has been started.
struct RunningServer {
    /// Channel to request a graceful shutdown.
    shutdown: oneshot::Sender<()>,

    /// Task running the serving loop.
    task: JoinHandle<io::Result<()>>,
}

/// An `HttpServer` backed by axum.
#[derive(Default)]
pub struct AxumHttpServer {
    /// Router with all the routes registered so far.
    router: Router,

    /// Serving state, if the server has been started.
    running: Option<RunningServer>,
}

/// Converts the raw body of a request into JSON.  Empty bodies are valid and yield `None`.
fn parse_body(body: &Bytes) -> Result<Option<serde_json::Value>, RestError> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| RestError::InvalidRequest(format!("Invalid JSON payload: {}", e)))
}

/// Converts `headers` into a plain map, dropping those with non-textual values.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

/// Builds the normalized request for `handler`, invokes it, and logs the outcome.
async fn dispatch(
    handler: &dyn RouteHandler,
    method: Method,
    uri: Uri,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let response = match parse_body(&body) {
        Ok(body) => {
            let request = HttpRequest { params, query, body, headers: flatten_headers(headers) };
            handler.handle(request).await
        }
        Err(e) => e.into_http_response(),
    };
    info!(
        "{} {} -> {} in {} ms",
        method,
        uri,
        response.status.as_u16(),
        start.elapsed().as_millis()
    );
    response.into_response()
}

impl AxumHttpServer {
    /// Creates a server with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the router with all the routes registered so far.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Registers `handler` for the `verb` requests selected by `filter` on `path`.
    fn add_route(
        &mut self,
        verb: &'static str,
        filter: MethodFilter,
        path: &str,
        handler: Arc<dyn RouteHandler>,
    ) {
        let endpoint = move |method: Method,
                             uri: Uri,
                             params: RawPathParams,
                             Query(query): Query<HashMap<String, String>>,
                             headers: HeaderMap,
                             body: Bytes| {
            let handler = handler.clone();
            let params: HashMap<String, String> =
                params.iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
            async move { dispatch(handler.as_ref(), method, uri, params, query, &headers, body).await }
        };

        debug!("Registering route {} {}", verb, path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, on(filter, endpoint));
    }
}

#[async_trait]
impl HttpServer for AxumHttpServer {
    fn get(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
        self.add_route("GET", MethodFilter::GET, path, handler);
    }

    fn post(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
        self.add_route("POST", MethodFilter::POST, path, handler);
    }

    fn put(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
        self.add_route("PUT", MethodFilter::PUT, path, handler);
    }

    fn delete(&mut self, path: &str, handler: Arc<dyn RouteHandler>) {
        self.add_route("DELETE", MethodFilter::DELETE, path, handler);
    }

    async fn start(&mut self, addr: SocketAddr) -> ServerResult<SocketAddr> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let app = self.router.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped sender also means that we have to stop.
                    let _result = shutdown_rx.await;
                })
                .await
        });

        info!("Listening on {}", local_addr);
        self.running = Some(RunningServer { shutdown, task });
        Ok(local_addr)
    }

    async fn stop(&mut self) -> ServerResult<()> {
        let running = self.running.take().ok_or(ServerError::NotRunning)?;

        // The receiver is only gone if the serving loop already exited, which we learn below.
        let _result = running.shutdown.send(());
        running.task.await.map_err(|e| ServerError::Task(e.to_string()))??;

        info!("Server stopped");
        Ok(())
    }
}
