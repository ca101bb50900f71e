use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ParsePolicy;
use crate::context::RunContext;
use crate::error::{ExtractError, TransportError};
use crate::normalize;
use crate::pacing::DelayRange;
use crate::query;
use crate::raw::Page;
use crate::session::Fingerprint;
use crate::sink::ResultSink;

/// Identifier of the last record consumed; empty means "from the start".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of search results after `cursor`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &Cursor, limit: usize) -> Result<Page, TransportError>;
}

/// Search endpoint reached with the session's client and fingerprint.
pub struct HttpPageSource {
    http: Client,
    endpoint: Url,
    fingerprint: Fingerprint,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(http: Client, endpoint: Url, fingerprint: Fingerprint, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            fingerprint,
            timeout,
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, cursor: &Cursor, limit: usize) -> Result<Page, TransportError> {
        debug!("POST {} limit={} after_id='{}'", self.endpoint, limit, cursor);
        let response = self
            .http
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .header(USER_AGENT, self.fingerprint.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, self.fingerprint.accept_language.as_str())
            .header(REFERER, self.fingerprint.referer.as_str())
            .json(&query::search_body(cursor.as_str(), limit))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(TransportError::Status(response.status()));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(TransportError::Envelope)
    }
}

/// What a run produced. `aborted` holds the failure that ended it early.
#[derive(Debug)]
pub struct RunOutcome {
    pub sink: ResultSink,
    pub pages: usize,
    pub skipped: usize,
    pub cursor: Cursor,
    pub aborted: Option<TransportError>,
}

pub struct PaginatedExtractor<S> {
    source: S,
    page_size: usize,
    delay: DelayRange,
    policy: ParsePolicy,
}

impl<S: PageSource> PaginatedExtractor<S> {
    pub fn new(source: S, page_size: usize, delay: DelayRange, policy: ParsePolicy) -> Self {
        Self {
            source,
            page_size,
            delay,
            policy,
        }
    }

    /// Server-reported size of the result set.
    pub async fn probe(&self) -> Result<usize, ExtractError> {
        let page = self
            .source
            .fetch_page(&Cursor::default(), 1)
            .await
            .map_err(ExtractError::Probe)?;
        info!("Probe reports {} organizations", page.count);
        Ok(page.count)
    }

    /// Page through `total` records.
    ///
    /// A failed page ends the run; it is an error only if nothing has been
    /// collected yet, otherwise the collected documents are returned with the
    /// failure in `aborted`.
    pub async fn run(&self, total: usize, ctx: &mut RunContext) -> Result<RunOutcome, ExtractError> {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut outcome = RunOutcome {
            sink: ResultSink::new(),
            pages: 0,
            skipped: 0,
            cursor: Cursor::default(),
            aborted: None,
        };
        let mut consumed = 0usize;

        while consumed < total {
            let fetched = self
                .source
                .fetch_page(&outcome.cursor, self.page_size)
                .await
                .and_then(|page| {
                    let take = page.entities.len().min(total - consumed);
                    let next = next_cursor(&outcome.cursor, &page.entities[..take])?;
                    Ok((page, take, next))
                });

            let (page, take, next) = match fetched {
                Ok(fetched) => fetched,
                Err(e) if outcome.sink.is_empty() => {
                    pb.abandon();
                    return Err(ExtractError::NothingExtracted(e));
                }
                Err(e) => {
                    warn!(
                        "Extraction stopped early after {} organizations: {}",
                        outcome.sink.len(),
                        e
                    );
                    outcome.aborted = Some(e);
                    break;
                }
            };

            let Some(next) = next else {
                warn!(
                    "Server returned an empty page at {} of {}, stopping",
                    consumed, total
                );
                break;
            };

            for entity in &page.entities[..take] {
                match normalize::parse(entity) {
                    Ok(doc) => {
                        outcome.sink.append(doc);
                    }
                    Err(e) => {
                        let uuid = Page::entity_uuid(entity).unwrap_or("<none>").to_string();
                        match self.policy {
                            ParsePolicy::Skip => {
                                warn!("Skipping organization {}: {}", uuid, e);
                                outcome.skipped += 1;
                            }
                            ParsePolicy::Abort => {
                                pb.abandon();
                                return Err(ExtractError::Record { uuid, source: e });
                            }
                        }
                    }
                }
            }

            consumed += take;
            outcome.pages += 1;
            outcome.cursor = next;
            pb.inc(take as u64);
            info!("Extracted {} of {} organizations", consumed, total);

            if consumed < total {
                ctx.pause(self.delay, "Delay until next API request").await;
            }
        }

        pb.finish_and_clear();
        Ok(outcome)
    }
}

/// Cursor after `entities`, or `None` for an empty page. The cursor has to
/// move forward, so a missing or repeated identifier is a protocol failure.
fn next_cursor(current: &Cursor, entities: &[serde_json::Value]) -> Result<Option<Cursor>, TransportError> {
    let Some(last) = entities.last() else {
        return Ok(None);
    };
    match Page::entity_uuid(last) {
        Some(id) if id != current.as_str() => Ok(Some(Cursor::new(id))),
        _ => Err(TransportError::CursorStalled(current.to_string())),
    }
}
