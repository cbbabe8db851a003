//! Sign-in, sign-out and identity display.

use std::{
    io::{self, Read},
    sync::Arc,
};

use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::{
    auth::AuthGateway,
    config::Config,
    session::{FileSessionStore, Identity, Provider},
};

fn gateway(cfg: &Config) -> AuthGateway {
    AuthGateway::from_config(cfg, Arc::new(FileSessionStore::from_config(cfg)))
}

pub async fn login(
    cfg: &Config,
    provider: Provider,
    credential: Option<&str>,
    callback_url: Option<&str>,
) -> Result<()> {
    let gw = gateway(cfg);
    let identity = match provider {
        Provider::GitHub => match callback_url {
            Some(url) => gw.complete_redirect(url)?,
            None => {
                println!("Open this URL in your browser to sign in:");
                println!("  {}", gw.authorize_url(provider).cyan());
                println!("Waiting for the callback on http://{} ...", gw.callback_addr());
                gw.await_redirect().await?
            }
        },
        Provider::Google => {
            let token = match credential {
                Some(t) => t.to_string(),
                None => read_credential_from_stdin()?,
            };
            gw.complete_token(&token)?
        }
    };

    println!("Signed in as {}", describe(&identity).green());
    Ok(())
}

pub fn logout(cfg: &Config) -> Result<()> {
    gateway(cfg).sign_out()?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(cfg: &Config) -> Result<()> {
    match gateway(cfg).current_identity() {
        Some(identity) => println!("{}", describe(&identity)),
        None => println!("Not signed in"),
    }
    Ok(())
}

fn read_credential_from_stdin() -> Result<String> {
    if io::stdin().is_terminal() {
        bail!("Pass the identity token with --credential or pipe it on stdin");
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn describe(identity: &Identity) -> String {
    match &identity.avatar_url {
        Some(avatar) => format!(
            "{} ({} #{}, avatar: {})",
            identity.display_name, identity.provider, identity.provider_subject_id, avatar
        ),
        None => format!(
            "{} ({} #{})",
            identity.display_name, identity.provider, identity.provider_subject_id
        ),
    }
}
