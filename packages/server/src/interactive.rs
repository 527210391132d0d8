//! Interactive mode for the server.
//!
//! Prompts the user for bind address, port, and fetch timeout before
//! starting the server.

use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a bind address, port, and upstream fetch timeout,
/// sets the corresponding environment variables (`BIND_ADDR`, `PORT`,
/// `FETCH_TIMEOUT_SECS`), and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Quake Map Server");
    println!();

    let defaults = super::ServerConfig::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or(defaults.bind_addr);

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(defaults.port.to_string())
        .interact_text()
        .unwrap_or_else(|_| defaults.port.to_string());

    let default_timeout = defaults
        .fetch_timeout
        .map_or(0, |timeout| timeout.as_secs())
        .to_string();
    let timeout_str: String = Input::new()
        .with_prompt("Upstream fetch timeout in seconds (0 disables)")
        .default(default_timeout.clone())
        .interact_text()
        .unwrap_or(default_timeout);

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
        std::env::set_var("FETCH_TIMEOUT_SECS", &timeout_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
