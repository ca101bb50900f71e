use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::pacing::DelayRange;

const ENV_PREFIX: &str = "CB";

/// What to do with a record that fails normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Log the record, count it as consumed and keep paging.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

/// Runtime settings, read from `CB_*` environment variables (and `.env`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub login_url: String,
    pub login_referer: String,
    pub api_base: String,
    pub search_url: Option<String>,
    pub headers_file: PathBuf,
    pub cookies_file: PathBuf,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    pub proxy_url: Option<String>,
    pub min_delay_login: i64,
    pub max_delay_login: i64,
    pub min_delay_extract: i64,
    pub max_delay_extract: i64,
    pub login_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub page_size: usize,
    pub on_parse_error: ParsePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            login_url: "https://www.crunchbase.com/v4/cb/sessions".into(),
            login_referer: "https://www.crunchbase.com/login".into(),
            api_base: "https://www.crunchbase.com/v4/".into(),
            search_url: None,
            headers_file: "cb-custom-http-headers.json".into(),
            cookies_file: "cookies.json".into(),
            output_dir: ".".into(),
            db_path: "data/cb.sqlite".into(),
            proxy_url: None,
            min_delay_login: 60,
            max_delay_login: 120,
            min_delay_extract: 120,
            max_delay_extract: 420,
            login_timeout_secs: 45,
            page_timeout_secs: 120,
            page_size: 1000,
            on_parse_error: ParsePolicy::Skip,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("login_url", &self.login_url)
            .field("api_base", &self.api_base)
            .field("search_url", &self.search_url)
            .field("headers_file", &self.headers_file)
            .field("output_dir", &self.output_dir)
            .field("db_path", &self.db_path)
            .field("proxy_url", &self.proxy_url.as_ref().map(|_| "<set>"))
            .field("page_size", &self.page_size)
            .field("on_parse_error", &self.on_parse_error)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Load `.env` (if present), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    pub fn from_environment(env: config::Environment) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;
        if settings.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be at least 1".into(),
            });
        }
        Ok(settings)
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let email = non_empty(&self.username).ok_or(ConfigError::Missing("CB_USERNAME"))?;
        let password = non_empty(&self.password).ok_or(ConfigError::Missing("CB_PASSWORD"))?;
        Ok(Credentials::new(email, password))
    }

    pub fn login_delay(&self) -> Result<DelayRange, ConfigError> {
        DelayRange::new(self.min_delay_login, self.max_delay_login)
    }

    pub fn extract_delay(&self) -> Result<DelayRange, ConfigError> {
        DelayRange::new(self.min_delay_extract, self.max_delay_extract)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn login_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.login_url)
    }

    pub fn api_base(&self) -> Result<Url, ConfigError> {
        parse_url(&self.api_base)
    }

    /// Explicit search endpoint; `None` means "post to the chosen referer".
    pub fn search_url(&self) -> Result<Option<Url>, ConfigError> {
        non_empty(&self.search_url).map(|u| parse_url(&u)).transpose()
    }

    pub fn proxy_url(&self) -> Option<String> {
        non_empty(&self.proxy_url)
    }
}

/// Account used for the login request. The password is never printed.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::Url {
        value: value.to_string(),
        source,
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_environment(config::Environment::with_prefix(ENV_PREFIX).source(Some(map)))
    }

    #[test]
    fn defaults_without_environment() {
        let s = from_pairs(&[]).unwrap();
        assert_eq!(s.page_size, 1000);
        assert_eq!(s.login_timeout(), Duration::from_secs(45));
        assert_eq!(s.page_timeout(), Duration::from_secs(120));
        assert_eq!(s.on_parse_error, ParsePolicy::Skip);
        assert!(s.search_url().unwrap().is_none());
        assert_eq!(s.api_base().unwrap().path(), "/v4/");
    }

    #[test]
    fn reads_prefixed_variables() {
        let s = from_pairs(&[
            ("CB_USERNAME", "ops@example.com"),
            ("CB_PASSWORD", "hunter2"),
            ("CB_MIN_DELAY_EXTRACT", "5"),
            ("CB_MAX_DELAY_EXTRACT", "9"),
            ("CB_ON_PARSE_ERROR", "abort"),
            ("CB_SEARCH_URL", "https://api.example.com/search"),
        ])
        .unwrap();
        let creds = s.credentials().unwrap();
        assert_eq!(creds.email, "ops@example.com");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(s.min_delay_extract, 5);
        assert_eq!(s.max_delay_extract, 9);
        assert_eq!(s.on_parse_error, ParsePolicy::Abort);
        assert_eq!(
            s.search_url().unwrap().unwrap().as_str(),
            "https://api.example.com/search"
        );
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let s = from_pairs(&[("CB_USERNAME", "ops@example.com"), ("CB_PASSWORD", "  ")]).unwrap();
        assert!(matches!(s.credentials(), Err(ConfigError::Missing("CB_PASSWORD"))));
    }

    #[test]
    fn numeric_looking_credentials_stay_verbatim() {
        let s = from_pairs(&[
            ("CB_USERNAME", "0042"),
            ("CB_PASSWORD", "007"),
            ("CB_PAGE_SIZE", "250"),
        ])
        .unwrap();
        let creds = s.credentials().unwrap();
        assert_eq!(creds.email, "0042");
        assert_eq!(creds.password(), "007");
        assert_eq!(s.page_size, 250);

        let s = from_pairs(&[("CB_USERNAME", "u"), ("CB_PASSWORD", "1e5")]).unwrap();
        assert_eq!(s.credentials().unwrap().password(), "1e5");
    }

    #[test]
    fn zero_page_size_rejected() {
        assert!(matches!(
            from_pairs(&[("CB_PAGE_SIZE", "0")]),
            Err(ConfigError::Invalid { key: "page_size", .. })
        ));
    }

    #[test]
    fn inverted_delay_rejected() {
        let s = from_pairs(&[("CB_MIN_DELAY_LOGIN", "10"), ("CB_MAX_DELAY_LOGIN", "10")]).unwrap();
        assert!(s.login_delay().is_err());
        assert!(s.extract_delay().is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("a@b.c", "secret-pw");
        assert!(!format!("{:?}", creds).contains("secret-pw"));
        let s = Settings {
            password: Some("secret-pw".into()),
            ..Settings::default()
        };
        assert!(!format!("{:?}", s).contains("secret-pw"));
    }
}
