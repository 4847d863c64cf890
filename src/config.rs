use clap::{ArgAction, Parser};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::api::client::DEFAULT_BASE_URL;
use crate::error::{PostError, PostResult};

pub const API_KEY_ENV: &str = "YEETPOST_API_KEY";

/// Файлы, из которых CLI дочитывает ключ, в порядке приоритета
pub const ENV_FILES: [&str; 2] = [".env", ".env.local"];

const EXAMPLES: &str = "\
Configuration via environment variable:
  YEETPOST_API_KEY=your-api-key yeetpost <connection> <text>

Configuration via .env or .env.local file:
  Place your API key in the .env or .env.local file:
  YEETPOST_API_KEY=your-api-key

Examples:
  yeetpost linkedin \"Hello, world!\"
  yeetpost x \"Hello, world!\"
  yeetpost sms \"Hello, world!\"
  yeetpost email \"Hello, world!\"
  yeetpost slack \"Hello, world!\"";

/// Снимок окружения процесса, из которого берётся ключ по умолчанию
#[derive(Clone, Default)]
pub struct Ambient {
    api_key: Option<String>,
}

impl Ambient {
    pub fn from_env() -> Self {
        Ambient {
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Ambient {
            api_key: Some(api_key.into()),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl fmt::Debug for Ambient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ambient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Явный ключ важнее окружения, даже если он пустой
pub fn resolve_api_key(explicit: Option<&str>, ambient: &Ambient) -> PostResult<String> {
    match explicit.or(ambient.api_key()) {
        Some(key) if !key.is_empty() => Ok(key.to_owned()),
        _ => Err(PostError::MissingCredential),
    }
}

/// Ищет `key` в файле формата `KEY=VALUE`. Нет файла или ключа = None
pub fn read_env_file(path: impl AsRef<Path>, key: &str) -> Option<String> {
    let path = path.as_ref();
    let entries = match dotenvy::from_filename_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping env file {}: {}", path.display(), e);
            return None;
        }
    };

    entries
        .filter_map(Result::ok)
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "yeetpost")]
#[command(version)]
#[command(about = "Post text to a connected platform via the yeetpost API")]
#[command(disable_version_flag = true)]
#[command(arg_required_else_help = true)]
#[command(after_help = EXAMPLES)]
pub struct Config {
    /// Слаг подключения: linkedin, x, sms, email, slack
    pub connection: Option<String>,

    /// Текст поста
    pub text: Option<String>,

    /// API ключ yeetpost
    /// env: YEETPOST_API_KEY
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Базовый URL API (для тестовых стендов)
    #[arg(long, env = "YEETPOST_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// Таймаут запроса в секундах, по умолчанию без ограничения
    /// env: YEETPOST_TIMEOUT
    #[arg(long, env = "YEETPOST_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version, value_parser = clap::value_parser!(bool))]
    version: (),
}

impl Config {
    /// connection и text, если оба непустые
    pub fn target(&self) -> Option<(&str, &str)> {
        let connection = self.connection.as_deref().filter(|c| !c.is_empty())?;
        let text = self.text.as_deref().filter(|t| !t.is_empty())?;
        Some((connection, text))
    }

    /// Ключ из флага/окружения, затем из .env и .env.local
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                ENV_FILES.iter().find_map(|path| {
                    read_env_file(path, API_KEY_ENV).filter(|key| !key.is_empty())
                })
            })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
