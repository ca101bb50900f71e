use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::cookie::Jar;
use reqwest::Client;
use tracing::info;

use crate::config::Settings;
use crate::error::ConfigError;
use crate::pacing::{DelayRange, Sleeper, TokioSleeper};

/// Everything a run shares: one HTTP client with its cookie jar, one RNG and
/// the sleeper used for pacing. Built once, passed by reference.
pub struct RunContext {
    pub http: Client,
    pub jar: Arc<Jar>,
    pub rng: StdRng,
    sleeper: Arc<dyn Sleeper>,
}

impl RunContext {
    /// Production context. With `use_proxy`, `CB_PROXY_URL` must be set.
    pub fn new(settings: &Settings, use_proxy: bool) -> Result<Self, ConfigError> {
        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .gzip(true)
            .brotli(true);

        if use_proxy {
            let proxy_url = settings
                .proxy_url()
                .ok_or(ConfigError::Missing("CB_PROXY_URL"))?;
            let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| ConfigError::Invalid {
                key: "proxy_url",
                reason: e.to_string(),
            })?;
            info!("[PROXY] Routing all requests through the configured proxy");
            builder = builder.proxy(proxy);
        } else {
            info!("[NO PROXY] Running the extraction without a proxy");
            builder = builder.no_proxy();
        }

        let http = builder.build().map_err(ConfigError::HttpClient)?;
        Ok(Self::with_parts(
            http,
            jar,
            StdRng::from_entropy(),
            Arc::new(TokioSleeper),
        ))
    }

    pub fn with_parts(http: Client, jar: Arc<Jar>, rng: StdRng, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            http,
            jar,
            rng,
            sleeper,
        }
    }

    /// Sleep a random whole number of seconds from `range`; returns the seconds.
    pub async fn pause(&mut self, range: DelayRange, reason: &str) -> u64 {
        let secs = range.sample(&mut self.rng);
        info!("{}: {}s", reason, secs);
        self.sleeper.sleep(Duration::from_secs(secs)).await;
        secs
    }
}
