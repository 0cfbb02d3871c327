use std::fmt;
use std::path::PathBuf;

use scheme_common::groq::GroqClientConfig;

use crate::error::AppError;

/// Proxy configuration, read once from the environment at startup.
#[derive(Clone)]
pub struct Config {
    /// `None` keeps the server up but makes every `/api/chat` call fail.
    pub api_key: Option<String>,
    pub port: u16,
    /// Directory holding `index.html`, `selector.html` and static assets.
    pub static_root: PathBuf,
    pub groq: GroqClientConfig,
}

impl Config {
    /// Optional:
    /// - `GROQ_API_KEY`
    /// - `PORT` (default: 3000)
    /// - `STATIC_ROOT` (default: "web")
    /// - `GROQ_BASE_URL`, `GROQ_MODEL`, `GROQ_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let port = parse_port(std::env::var("PORT").ok())?;
        let static_root = std::env::var("STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("web"));

        Ok(Self {
            api_key,
            port,
            static_root,
            groq: GroqClientConfig::from_env(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .field("static_root", &self.static_root)
            .field("groq", &self.groq)
            .finish()
    }
}

fn parse_port(raw: Option<String>) -> Result<u16, AppError> {
    match raw {
        None => Ok(3000),
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| AppError::Config(format!("PORT must be a port number, got {raw:?}"))),
    }
}
