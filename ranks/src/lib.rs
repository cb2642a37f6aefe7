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

//! REST service that manages the military ranks of the Forcemap API.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use forcemap_core::clocks::SystemClock;
use forcemap_core::db::sqlite;
use forcemap_core::env::get_optional_var;
use forcemap_core::rest::router::RouteAdapter;
use forcemap_core::rest::server::{AxumHttpServer, HttpServer};
use log::{info, warn};
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

mod db;
use db::sqlite::SqliteMilitaryRankRepository;
mod driver;
use driver::Driver;
mod model;
mod rest;

/// Default port to listen on when none is configured.
const DEFAULT_PORT: u16 = 3000;

/// Default database when none is configured.
const DEFAULT_DATABASE: &str = "sqlite::memory:";

/// Configuration of the service.
#[derive(Debug, PartialEq)]
pub struct ServeOptions {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// Connection string of the SQLite database.
    pub database: String,
}

impl ServeOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with
    /// `prefix`.
    ///
    /// The variables read are `<prefix>_HOST`, `<prefix>_PORT` and `<prefix>_DATABASE`, all of
    /// which are optional.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let host: IpAddr =
            get_optional_var(prefix, "HOST")?.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port: u16 = get_optional_var(prefix, "PORT")?.unwrap_or(DEFAULT_PORT);
        let database = get_optional_var::<String>(prefix, "DATABASE")?
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        Ok(Self { bind_addr: SocketAddr::new(host, port), database })
    }
}

/// Instantiates all resources to serve the application as configured by `opts` and serves it
/// until a termination request arrives.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(opts: ServeOptions) -> Result<(), Box<dyn Error>> {
    if opts.database.contains(":memory:") {
        warn!("Using an in-memory database; all data will be lost on exit");
    }
    let pool = sqlite::connect(&opts.database).await?;
    let repository =
        SqliteMilitaryRankRepository::attach(pool, Arc::new(SystemClock::default())).await?;
    let driver = Driver::new(Arc::new(repository));

    let mut routes = RouteAdapter::new();
    rest::register_routes(&mut routes, driver, Arc::new(SystemClock::default()));

    let mut server = AxumHttpServer::new();
    routes.apply_routes(&mut server)?;
    let addr = server.start(opts.bind_addr).await?;
    info!("Forcemap military rank service ready at http://{}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Termination requested; shutting down");
    server.stop().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_options_defaults() {
        temp_env::with_vars_unset(["TEST_HOST", "TEST_PORT", "TEST_DATABASE"], || {
            let opts = ServeOptions::from_env("TEST").unwrap();
            assert_eq!(
                ServeOptions {
                    bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
                    database: "sqlite::memory:".to_owned(),
                },
                opts
            );
        });
    }

    #[test]
    fn test_serve_options_overrides() {
        let vars = [
            ("TEST_HOST", Some("127.0.0.1")),
            ("TEST_PORT", Some("8080")),
            ("TEST_DATABASE", Some("sqlite:///var/lib/forcemap/ranks.db")),
        ];
        temp_env::with_vars(vars, || {
            let opts = ServeOptions::from_env("TEST").unwrap();
            assert_eq!(
                ServeOptions {
                    bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
                    database: "sqlite:///var/lib/forcemap/ranks.db".to_owned(),
                },
                opts
            );
        });
    }

    #[test]
    fn test_serve_options_bad_port() {
        temp_env::with_vars([("TEST_PORT", Some("http")), ("TEST_HOST", None)], || {
            let err = ServeOptions::from_env("TEST").unwrap_err();
            assert!(err.contains("TEST_PORT"), "Unexpected error: {}", err);
        });
    }
}
