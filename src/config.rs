use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "Geolens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "geolens=info,tower_http=warn"
}

/// Origins allowed to call the API from a browser.
/// The local React dev server by default.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

/// Env var naming the socket address the API server binds to.
pub const BIND_ENV: &str = "GEOLENS_BIND";

/// Bind address when `GEOLENS_BIND` is not set.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Resolve the bind address from the environment.
pub fn bind_addr() -> Result<SocketAddr, std::net::AddrParseError> {
    std::env::var(BIND_ENV)
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()
}
