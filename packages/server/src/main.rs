#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the quake map application.
//!
//! Reads `BIND_ADDR`, `PORT`, and `FETCH_TIMEOUT_SECS` from the
//! environment and serves the `/api` routes against the USGS feeds.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    quake_map_server::run_server().await
}
