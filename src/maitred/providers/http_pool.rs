//! Shared HTTP clients, one per provider base URL.
//!
//! Keeping a singleton `reqwest::Client` per base URL means connections, DNS
//! lookups, and TLS handshakes are reused across tool invocations instead of
//! being re-established on every provider round trip.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create the shared HTTP client for the given base URL.
///
/// The client keeps idle connections alive for 90 seconds, allows up to 10 idle
/// connections per host, sends TCP keepalive probes every 60 seconds, and caps
/// any single request at 120 seconds (LLM completions can be slow, but not that
/// slow).
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    let mut pool = HTTP_CLIENT_POOL.lock().unwrap();

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client");

    pool.insert(base_url.to_string(), client.clone());
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reuses_clients_per_base_url() {
        let _a = get_http_client("https://api.mistral.ai");
        let _b = get_http_client("https://api.mistral.ai");
        let _c = get_http_client("https://api.bland.ai");

        let pool = HTTP_CLIENT_POOL.lock().unwrap();
        assert!(pool.contains_key("https://api.mistral.ai"));
        assert!(pool.contains_key("https://api.bland.ai"));
    }
}
