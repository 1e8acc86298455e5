use std::env;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::Error;

/// Model used when the client does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Number of trailing history messages transmitted upstream.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Client-side upper bound on waiting for the request or the next event.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature used for every generation call.
pub const TEMPERATURE: f32 = 0.7;

/// Process configuration for the relay server.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub port: u16,
    pub default_model: String,
    pub retry: RetryPolicy,
    pub history_window: usize,
}

impl RelayConfig {
    /// Read configuration from environment variables. `GEMINI_API_KEY` is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| Error::config("GEMINI_API_KEY environment variable is required"))?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("invalid PORT value '{raw}'")))?,
            Err(_) => 3000,
        };

        let default_model =
            env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            port,
            default_model,
            retry: RetryPolicy::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        })
    }
}
