//! Sign-in flows that populate the [`SessionStore`].
//!
//! Two independent flows are supported:
//! - redirect: an external auth server runs the OAuth dance and redirects back
//!   to a callback URL carrying the user profile as URL-encoded JSON;
//! - token: a client-side widget hands over a signed identity token whose
//!   payload is decoded locally.
//!
//! Both flows only ever write the store on success.

use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{
    config::Config,
    session::{Identity, Provider, SessionStore},
};

pub mod redirect;
pub mod token;

/// Path the auth server redirects to after a successful login.
pub const CALLBACK_PATH: &str = "/codeeditor";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("could not decode identity token: {0}")]
    TokenDecode(String),

    #[error("sign-in was denied or the callback carried no user")]
    Denied,

    #[error("malformed sign-in callback: {0}")]
    MalformedCallback(String),

    #[error("sign-in callback listener failed: {0}")]
    Listener(String),

    #[error("timed out waiting for the sign-in callback")]
    Timeout,

    #[error("could not persist identity: {0}")]
    Storage(String),
}

pub struct AuthGateway {
    store: Arc<dyn SessionStore>,
    auth_server_url: String,
    callback_addr: String,
    callback_timeout: Duration,
}

impl AuthGateway {
    pub fn from_config(cfg: &Config, store: Arc<dyn SessionStore>) -> Self {
        let auth_server_url = cfg
            .get("AUTH_SERVER_URL")
            .unwrap_or_else(|| "http://localhost:3000".into());
        let callback_addr = cfg
            .get("AUTH_CALLBACK_ADDR")
            .unwrap_or_else(|| "127.0.0.1:5173".into());
        let timeout = cfg.get_u64("AUTH_TIMEOUT").unwrap_or(300);
        Self::new(store, auth_server_url, callback_addr, Duration::from_secs(timeout))
    }

    pub fn new(
        store: Arc<dyn SessionStore>,
        auth_server_url: impl Into<String>,
        callback_addr: impl Into<String>,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            store,
            auth_server_url: auth_server_url.into(),
            callback_addr: callback_addr.into(),
            callback_timeout,
        }
    }

    /// Where the browser must be sent to start the redirect flow.
    pub fn authorize_url(&self, provider: Provider) -> String {
        format!("{}/auth/{}", self.auth_server_url.trim_end_matches('/'), provider)
    }

    pub fn callback_addr(&self) -> &str {
        &self.callback_addr
    }

    /// Finishes the redirect flow from the URL the provider sent the browser to.
    pub fn complete_redirect(&self, callback_url: &str) -> Result<Identity, AuthError> {
        let identity = redirect::parse_callback(callback_url).map_err(|e| {
            warn!(error = %e, "redirect sign-in failed");
            e
        })?;
        self.persist(identity)
    }

    /// Waits on the loopback listener for the provider callback, then finishes the flow.
    pub async fn await_redirect(&self) -> Result<Identity, AuthError> {
        let url = tokio::time::timeout(
            self.callback_timeout,
            redirect::listen_for_callback(&self.callback_addr, CALLBACK_PATH),
        )
        .await
        .map_err(|_| AuthError::Timeout)??;
        self.complete_redirect(&url)
    }

    /// Finishes the token flow from the credential the widget produced.
    pub fn complete_token(&self, credential: &str) -> Result<Identity, AuthError> {
        let identity = token::decode_identity(credential).map_err(|e| {
            warn!(error = %e, "token sign-in failed");
            e
        })?;
        self.persist(identity)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.store.get_identity()
    }

    pub fn sign_out(&self) -> anyhow::Result<()> {
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    fn persist(&self, identity: Identity) -> Result<Identity, AuthError> {
        self.store
            .set_identity(identity.clone())
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        info!(
            provider = %identity.provider,
            subject = %identity.provider_subject_id,
            "signed in as {}",
            identity.display_name
        );
        Ok(identity)
    }
}
