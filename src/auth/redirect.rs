//! Redirect flow: callback parsing and the one-shot loopback listener.

use std::sync::{Arc, Mutex};

use axum::{http::Uri, response::Html, routing::get, Router};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{debug, info};
use url::Url;

use super::AuthError;
use crate::session::{Identity, Provider};

/// Profile as serialized by the auth server (passport profile shape).
#[derive(Debug, Deserialize)]
struct Profile {
    id: serde_json::Value,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    username: Option<String>,
    provider: Option<String>,
    #[serde(default)]
    photos: Vec<Photo>,
    #[serde(rename = "_json")]
    raw: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    login: Option<String>,
    avatar_url: Option<String>,
}

/// Extracts the identity from the `user` query parameter of a callback URL.
///
/// The payload is trusted as-is: it was produced by the auth server.
pub fn parse_callback(callback_url: &str) -> Result<Identity, AuthError> {
    let url = Url::parse(callback_url).map_err(|e| AuthError::MalformedCallback(e.to_string()))?;
    let user = url
        .query_pairs()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::Denied)?;

    let profile: Profile =
        serde_json::from_str(&user).map_err(|e| AuthError::MalformedCallback(e.to_string()))?;
    profile.into_identity()
}

impl Profile {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let subject = match self.id {
            serde_json::Value::String(s) if !s.is_empty() => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => return Err(AuthError::MalformedCallback("profile has no id".into())),
        };
        let raw_login = self.raw.as_ref().and_then(|r| r.login.clone());
        let display_name = self
            .display_name
            .filter(|n| !n.trim().is_empty())
            .or(self.username)
            .or(raw_login)
            .unwrap_or_else(|| subject.clone());
        let avatar_url = self
            .photos
            .into_iter()
            .next()
            .map(|p| p.value)
            .or_else(|| self.raw.and_then(|r| r.avatar_url));
        let provider = match self.provider.as_deref() {
            Some("google") => Provider::Google,
            _ => Provider::GitHub,
        };

        Ok(Identity { display_name, avatar_url, provider_subject_id: subject, provider })
    }
}

/// Serves `path` on `addr` until the first request arrives, returning its full URL.
pub async fn listen_for_callback(addr: &str, path: &str) -> Result<String, AuthError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AuthError::Listener(e.to_string()))?;
    let local = listener
        .local_addr()
        .map_err(|e| AuthError::Listener(e.to_string()))?;
    info!("waiting for sign-in callback on http://{}{}", local, path);

    serve_until_callback(listener, path).await
}

async fn serve_until_callback(listener: TcpListener, path: &str) -> Result<String, AuthError> {
    let local = listener
        .local_addr()
        .map_err(|e| AuthError::Listener(e.to_string()))?;
    let base = format!("http://{}", local);

    let (url_tx, url_rx) = oneshot::channel::<String>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let slot = Arc::new(Mutex::new(Some(url_tx)));

    let app = Router::new().route(
        path,
        get(move |uri: Uri| {
            let slot = slot.clone();
            let full = format!("{}{}", base, uri);
            async move {
                debug!(url = %full, "callback received");
                if let Some(tx) = slot.lock().ok().and_then(|mut g| g.take()) {
                    let _ = tx.send(full);
                }
                Html("<p>Signed in. You can return to codepad.</p>")
            }
        }),
    );

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let url = url_rx
        .await
        .map_err(|_| AuthError::Listener("listener closed before a callback arrived".into()));
    let _ = stop_tx.send(());
    let _ = server.await;
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_with(json: &str) -> String {
        let mut url = Url::parse("http://localhost:5173/codeeditor").unwrap();
        url.query_pairs_mut().append_pair("user", json);
        url.to_string()
    }

    #[test]
    fn test_parse_github_profile() {
        let json = r#"{"id":"583231","displayName":"The Octocat","username":"octocat","provider":"github","photos":[{"value":"https://avatars.githubusercontent.com/u/583231?v=4"}]}"#;
        let identity = parse_callback(&callback_with(json)).unwrap();
        assert_eq!(identity.display_name, "The Octocat");
        assert_eq!(identity.provider_subject_id, "583231");
        assert_eq!(identity.provider, Provider::GitHub);
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://avatars.githubusercontent.com/u/583231?v=4")
        );
    }

    #[test]
    fn test_parse_profile_falls_back_to_username_and_raw_avatar() {
        let json = r#"{"id":7,"displayName":null,"username":"octocat","_json":{"login":"octocat","avatar_url":"https://a.example/7"}}"#;
        let identity = parse_callback(&callback_with(json)).unwrap();
        assert_eq!(identity.display_name, "octocat");
        assert_eq!(identity.provider_subject_id, "7");
        assert_eq!(identity.avatar_url.as_deref(), Some("https://a.example/7"));
    }

    #[test]
    fn test_missing_user_is_denied() {
        assert!(matches!(parse_callback("http://localhost:5173/"), Err(AuthError::Denied)));
        assert!(matches!(parse_callback("http://localhost:5173/codeeditor?user="), Err(AuthError::Denied)));
    }

    #[test]
    fn test_bad_payloads_are_malformed() {
        assert!(matches!(parse_callback("not a url"), Err(AuthError::MalformedCallback(_))));
        assert!(matches!(
            parse_callback(&callback_with("{oops")),
            Err(AuthError::MalformedCallback(_))
        ));
        assert!(matches!(
            parse_callback(&callback_with(r#"{"displayName":"no id"}"#)),
            Err(AuthError::MalformedCallback(_))
        ));
    }

    #[tokio::test]
    async fn test_listener_captures_first_callback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(async move { serve_until_callback(listener, "/codeeditor").await });

        let body = reqwest::get(format!("http://{}/codeeditor?user=%7B%22id%22%3A1%7D", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Signed in"));

        let url = waiter.await.unwrap().unwrap();
        assert_eq!(url, format!("http://{}/codeeditor?user=%7B%22id%22%3A1%7D", addr));
        assert_eq!(parse_callback(&url).unwrap().provider_subject_id, "1");
    }
}
