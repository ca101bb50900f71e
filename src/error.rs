use reqwest::StatusCode;
use thiserror::Error;

/// Startup configuration problems. Always fatal, raised before any request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid delay range [{min}, {max}): need 0 < min < max")]
    InvalidDelay { min: i64, max: i64 },
    #[error("fingerprint pool '{0}' is empty")]
    EmptyPool(&'static str),
    #[error("failed to read fingerprint file {path}: {source}")]
    FingerprintFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode fingerprint file {path}: {source}")]
    FingerprintJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid url '{value}': {source}")]
    Url {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("login returned {0}, expected 201 Created")]
    UnexpectedStatus(StatusCode),
    #[error("login succeeded but the response carried no session cookies")]
    NoCookies,
}

/// Failure of a single page request. Scoped to that call only.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search returned {0}, expected 200 OK")]
    Status(StatusCode),
    #[error("undecodable page envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("cursor did not advance past '{0}'")]
    CursorStalled(String),
}

/// One record could not be normalized.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected record shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("record has no uuid")]
    MissingUuid,
    #[error("field {field}: '{value}' is not a YYYY-MM-DD date")]
    Date { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("probe request failed: {0}")]
    Probe(#[source] TransportError),
    #[error("no data extracted before the first failure: {0}")]
    NothingExtracted(#[source] TransportError),
    #[error("record {uuid} could not be normalized: {source}")]
    Record {
        uuid: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("nothing to persist")]
    Empty,
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode documents: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no persisted session")]
    Empty,
}
