pub mod fingerprint;
pub mod store;

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::{Credentials, Settings};
use crate::context::RunContext;
use crate::error::{AuthError, ConfigError};
use crate::pacing::DelayRange;
pub use fingerprint::{Fingerprint, FingerprintPools};
pub use store::{FileSessionStore, SessionStore, StoredCookie};

/// Endpoints and budgets for logging in.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub login_url: Url,
    pub login_referer: String,
    /// Cookies are bound under this url, so they go out with every `v4` request.
    pub api_base: Url,
    pub login_timeout: Duration,
    pub login_delay: DelayRange,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            login_url: settings.login_url()?,
            login_referer: settings.login_referer.clone(),
            api_base: settings.api_base()?,
            login_timeout: settings.login_timeout(),
            login_delay: settings.login_delay()?,
        })
    }
}

#[derive(Debug)]
pub struct Session {
    pub credentials: Credentials,
    pub fingerprint: Fingerprint,
    pub cookies: Vec<StoredCookie>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Owns the run's session: fingerprint, credentials and cookies.
pub struct SessionManager {
    session: Session,
    config: SessionConfig,
    store: Option<Box<dyn SessionStore>>,
}

impl SessionManager {
    /// Picks the fingerprint for the whole process lifetime.
    pub fn new(
        credentials: Credentials,
        pools: &FingerprintPools,
        config: SessionConfig,
        store: Option<Box<dyn SessionStore>>,
        ctx: &mut RunContext,
    ) -> Result<Self, ConfigError> {
        let fingerprint = Fingerprint::randomize(pools, &mut ctx.rng)?;
        info!(
            referer = %fingerprint.referer,
            accept_language = %fingerprint.accept_language,
            "Fingerprint chosen for this run"
        );
        Ok(Self {
            session: Session {
                credentials,
                fingerprint,
                cookies: Vec::new(),
            },
            config,
            store,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reuse a persisted session if one loads, otherwise log in, store the
    /// cookies and wait out the post-login delay.
    pub async fn establish(&mut self, ctx: &mut RunContext) -> Result<(), AuthError> {
        if let Some(loaded) = self.store.as_ref().map(|s| s.load()) {
            match loaded {
                Ok(cookies) => {
                    info!("Reusing persisted session ({} cookies)", cookies.len());
                    self.bind(ctx, cookies);
                    return Ok(());
                }
                Err(e) => warn!("Unable to load persisted session, logging in: {}", e),
            }
        }

        self.authenticate(ctx).await?;
        info!("Received new session cookies");

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.session.cookies) {
                warn!("Unable to persist session cookies: {}", e);
            }
        }

        ctx.pause(self.config.login_delay, "Delay after login").await;
        Ok(())
    }

    /// POST the credentials; anything but `201 Created` is fatal.
    pub async fn authenticate(&mut self, ctx: &RunContext) -> Result<&Session, AuthError> {
        let fp = &self.session.fingerprint;
        info!("Requesting new session cookies from {}", self.config.login_url);

        let response = ctx
            .http
            .post(self.config.login_url.clone())
            .timeout(self.config.login_timeout)
            .header(USER_AGENT, fp.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, fp.accept_language.as_str())
            .header(REFERER, self.config.login_referer.as_str())
            .json(&LoginRequest {
                email: &self.session.credentials.email,
                password: self.session.credentials.password(),
            })
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(AuthError::UnexpectedStatus(response.status()));
        }

        let cookies: Vec<StoredCookie> = response.cookies().map(StoredCookie::from).collect();
        if cookies.is_empty() {
            return Err(AuthError::NoCookies);
        }
        self.bind(ctx, cookies);
        Ok(&self.session)
    }

    fn bind(&mut self, ctx: &RunContext, cookies: Vec<StoredCookie>) {
        for cookie in &cookies {
            ctx.jar.add_cookie_str(&cookie.pair(), &self.config.api_base);
        }
        self.session.cookies = cookies;
    }
}
