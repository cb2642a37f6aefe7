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

//! Route composition independent of the HTTP engine.
//!
//! APIs are declared by route groups, which register their method/path/handler triples with a
//! `RouteRegistry` relative to the prefix under which the group is mounted.  The `RouteAdapter`
//! accumulates all of them and, once the app is fully assembled, pushes them to an `HttpServer`.

use crate::rest::RouteHandler;
use crate::rest::server::HttpServer;
use http::Method;
use log::{debug, info};
use std::sync::Arc;

/// Routing errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RouterError {
    /// Indicates that a route was registered with a method the servers do not know how to serve.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),
}

/// Result type for this module.
pub type RouterResult<T> = Result<T, RouterError>;

/// A single route pending application to a server.
pub struct RouteDefinition {
    /// The HTTP method the route responds to.
    method: Method,

    /// The full path of the route, including the prefixes of all enclosing groups.
    path: String,

    /// The handler for the route.
    handler: Arc<dyn RouteHandler>,
}

impl RouteDefinition {
    /// Returns the HTTP method the route responds to.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full path of the route.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Capability to register routes, handed to route groups so that they can declare their APIs.
pub trait RouteRegistry {
    /// Registers `handler` to serve `method` requests on `path`.
    fn register_route(&mut self, method: Method, path: &str, handler: Arc<dyn RouteHandler>);

    /// Registers all routes defined by `group` under `prefix`.
    fn register_group(&mut self, prefix: &str, group: &dyn RouteGroup);
}

/// A cohesive set of APIs that are mounted together under a shared prefix.
pub trait RouteGroup {
    /// Registers all the routes of this group into `routes`, using paths relative to the group.
    fn define_routes(&self, routes: &mut dyn RouteRegistry);
}

/// Joins a group `prefix` with a group-relative `path`.
///
/// Only one trailing slash is removed from the prefix, and a `/` path refers to the prefix
/// itself, so `("/api/", "/")` yields `/api` and `("/", "/health")` yields `/health`.
pub fn combine_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    let path = if path.starts_with('/') { path.to_owned() } else { format!("/{}", path) };

    if path == "/" && !prefix.is_empty() {
        prefix.to_owned()
    } else if prefix.is_empty() {
        path
    } else {
        format!("{}{}", prefix, path)
    }
}

/// Registry scoped to a group mounted under `prefix`.  Writes straight into the root's list so
/// that registration order is preserved across nesting levels.
struct ScopedRegistry<'a> {
    /// Effective prefix, accumulated through all enclosing groups.
    prefix: String,

    /// Routes of the root adapter.
    routes: &'a mut Vec<RouteDefinition>,
}

impl RouteRegistry for ScopedRegistry<'_> {
    fn register_route(&mut self, method: Method, path: &str, handler: Arc<dyn RouteHandler>) {
        let path = combine_paths(&self.prefix, path);
        self.routes.push(RouteDefinition { method, path, handler });
    }

    fn register_group(&mut self, prefix: &str, group: &dyn RouteGroup) {
        let prefix = combine_paths(&self.prefix, prefix);
        let mut scoped = ScopedRegistry { prefix, routes: &mut *self.routes };
        group.define_routes(&mut scoped);
    }
}

/// Accumulates the routes of the whole app and applies them to a server.
///
/// The adapter starts accepting registrations and stops doing so once the routes have been
/// applied.  Applying them again pushes the same set of routes one more time.
#[derive(Default)]
pub struct RouteAdapter {
    /// Routes in registration order.
    routes: Vec<RouteDefinition>,

    /// Whether `apply_routes` has been called.
    applied: bool,
}

impl RouteAdapter {
    /// Creates an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the routes registered so far, in registration order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Pushes all routes to `server` in registration order.
    ///
    /// Fails on the first route whose method the server cannot serve.  This is a programming
    /// error and the caller should not try to recover from it.
    pub fn apply_routes(&mut self, server: &mut dyn HttpServer) -> RouterResult<()> {
        self.applied = true;
        for route in &self.routes {
            let handler = route.handler.clone();
            match route.method {
                Method::GET => server.get(&route.path, handler),
                Method::POST => server.post(&route.path, handler),
                Method::PUT => server.put(&route.path, handler),
                Method::DELETE => server.delete(&route.path, handler),
                ref method => return Err(RouterError::UnsupportedMethod(method.clone())),
            }
            debug!("Applied route {} {}", route.method, route.path);
        }
        info!("Applied {} routes", self.routes.len());
        Ok(())
    }
}

impl RouteRegistry for RouteAdapter {
    fn register_route(&mut self, method: Method, path: &str, handler: Arc<dyn RouteHandler>) {
        assert!(!self.applied, "Cannot register routes after applying them");
        self.routes.push(RouteDefinition { method, path: path.to_owned(), handler });
    }

    fn register_group(&mut self, prefix: &str, group: &dyn RouteGroup) {
        assert!(!self.applied, "Cannot register routes after applying them");
        let mut scoped = ScopedRegistry { prefix: prefix.to_owned(), routes: &mut self.routes };
        group.define_routes(&mut scoped);
    }
}
