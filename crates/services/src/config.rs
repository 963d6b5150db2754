use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const BACKEND_URL_VAR: &str = "QUEST_BACKEND_URL";
pub const DIALECT_VAR: &str = "QUEST_DIALECT";
pub const CONTINUITY_VAR: &str = "QUEST_CONTINUITY";
pub const TIMEOUT_VAR: &str = "QUEST_REQUEST_TIMEOUT_SECS";
pub const FEEDBACK_DWELL_VAR: &str = "QUEST_FEEDBACK_DWELL_MS";
pub const MAX_ATTEMPTS_VAR: &str = "QUEST_MAX_ATTEMPTS";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FEEDBACK_DWELL_MS: u64 = 1800;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Which family of endpoints the backend exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendDialect {
    /// `/api/intro`, `/api/generate-story`, `/api/progress-story`.
    #[default]
    Story,
    /// `/start`, `/continue`.
    Quiz,
}

impl BackendDialect {
    #[must_use]
    pub fn default_origin(self) -> &'static str {
        match self {
            BackendDialect::Story => "http://localhost:5000",
            BackendDialect::Quiz => "http://127.0.0.1:8000",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendDialect::Story => "story",
            BackendDialect::Quiz => "quiz",
        }
    }
}

impl FromStr for BackendDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "story" => Ok(BackendDialect::Story),
            "quiz" => Ok(BackendDialect::Quiz),
            other => Err(format!("expected `story` or `quiz`, got `{other}`")),
        }
    }
}

impl fmt::Display for BackendDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the story dialect identifies the session on each turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContinuityMode {
    /// Echo the `sessionId` returned by the previous response.
    #[default]
    SessionId,
    /// Send the whole current scene back with the learner profile.
    SceneEcho,
}

impl ContinuityMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContinuityMode::SessionId => "session-id",
            ContinuityMode::SceneEcho => "scene-echo",
        }
    }
}

impl FromStr for ContinuityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session-id" | "session" => Ok(ContinuityMode::SessionId),
            "scene-echo" | "scene" => Ok(ContinuityMode::SceneEcho),
            other => Err(format!("expected `session-id` or `scene-echo`, got `{other}`")),
        }
    }
}

impl fmt::Display for ContinuityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to talk to a story backend and pace the quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestConfig {
    pub backend_url: Url,
    pub dialect: BackendDialect,
    pub continuity: ContinuityMode,
    pub request_timeout: Duration,
    pub feedback_dwell: Duration,
    pub max_attempts: u32,
}

impl QuestConfig {
    /// Defaults for a dialect, pointing at its usual local origin.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in origins; the `Result` mirrors `from_env`.
    pub fn for_dialect(dialect: BackendDialect) -> Result<Self, ConfigError> {
        let backend_url = parse_url(dialect.default_origin())?;
        Ok(Self {
            backend_url,
            dialect,
            continuity: ContinuityMode::default(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            feedback_dwell: Duration::from_millis(DEFAULT_FEEDBACK_DWELL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Load configuration from `QUEST_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for values that do not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dialect = match var(DIALECT_VAR) {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue(DIALECT_VAR, e))?,
            None => BackendDialect::default(),
        };
        let mut config = Self::for_dialect(dialect)?;

        if let Some(raw) = var(BACKEND_URL_VAR) {
            config.backend_url = parse_url(&raw)?;
        }
        if let Some(raw) = var(CONTINUITY_VAR) {
            config.continuity = raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue(CONTINUITY_VAR, e))?;
        }
        if let Some(raw) = var(TIMEOUT_VAR) {
            let secs = parse_positive(TIMEOUT_VAR, &raw)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = var(FEEDBACK_DWELL_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue(FEEDBACK_DWELL_VAR, e.to_string()))?;
            config.feedback_dwell = Duration::from_millis(millis);
        }
        if let Some(raw) = var(MAX_ATTEMPTS_VAR) {
            let attempts = parse_positive(MAX_ATTEMPTS_VAR, &raw)?;
            config.max_attempts = u32::try_from(attempts)
                .map_err(|e| ConfigError::InvalidValue(MAX_ATTEMPTS_VAR, e.to_string()))?;
        }

        Ok(config)
    }

    /// Replace the backend origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `raw` is not an http(s) URL.
    pub fn with_backend_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.backend_url = parse_url(raw)?;
        Ok(self)
    }

    /// Switch dialect. The origin follows unless it was set explicitly.
    #[must_use]
    pub fn with_dialect(mut self, dialect: BackendDialect) -> Self {
        if self.backend_url.as_str().trim_end_matches('/')
            == self.dialect.default_origin().trim_end_matches('/')
        {
            if let Ok(url) = parse_url(dialect.default_origin()) {
                self.backend_url = url;
            }
        }
        self.dialect = dialect;
        self
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue(BACKEND_URL_VAR, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(
            BACKEND_URL_VAR,
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(var, "must be greater than zero".into())),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::InvalidValue(var, e.to_string())),
    }
}
