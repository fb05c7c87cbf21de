use secrecy::SecretString;

/// Runtime configuration, read from the environment. `.env` files are
/// honored by the binary before this is called.
pub struct Config {
    /// REST base URL, without the trailing slash.
    pub api_url: String,
    /// Realtime stream endpoint.
    pub ws_url: String,
    /// Session bearer token. Absent means the viewer is unauthenticated.
    pub token: Option<SecretString>,
    /// Application name shown in the window title.
    pub app_title: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            api_url: var_or("NOTIFEED_API_URL", "http://localhost:8000/api")
                .trim_end_matches('/')
                .to_string(),
            ws_url: var_or("NOTIFEED_WS_URL", "ws://localhost:8000/ws/notifications/"),
            token: std::env::var("NOTIFEED_TOKEN").ok().map(Into::into),
            app_title: var_or("NOTIFEED_APP_TITLE", "notifeed"),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
