use std::env;

/// Runtime configuration, read once at startup and passed through state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin clients reach this server at; resolved image URLs are formed
    /// against it.
    pub public_base_url: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Self {
            public_base_url,
            port,
        }
    }
}
