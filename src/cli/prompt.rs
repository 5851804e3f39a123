//! Operator prompts
//!
//! dialoguer blocks on the terminal, so every prompt runs on the blocking pool.

use action_flow::{Credentials, FlowError, Operator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use dialoguer::{Confirm, Input, Password, Select};
use tracing::info;

use crate::config::LoginChoice;
use crate::errors::PilotError;

const LOGIN_CHOICES: [&str; 2] = ["Automatic (EMAIL / PASSWORD)", "Manual, in the browser"];

async fn blocking<T, F>(prompt: F) -> Result<T, PilotError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PilotError> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|err| PilotError::Prompt(err.to_string()))?
}

/// Operator backed by the controlling terminal
pub struct ConsoleOperator;

#[async_trait]
impl Operator for ConsoleOperator {
    async fn await_manual_login(&self) -> Result<(), FlowError> {
        info!("Waiting for the operator to log in");
        blocking(|| {
            Input::<String>::new()
                .with_prompt("Log in in the browser window, then press Enter")
                .allow_empty(true)
                .interact_text()?;
            Ok(())
        })
        .await
        .map_err(|err| FlowError::LoginFailed(err.to_string()))
    }
}

pub async fn select_login_mode() -> Result<LoginChoice> {
    let choice = blocking(|| {
        let picked = Select::new()
            .with_prompt("How do you want to log in?")
            .items(&LOGIN_CHOICES[..])
            .default(0)
            .interact()?;
        Ok(if picked == 0 {
            LoginChoice::Auto
        } else {
            LoginChoice::Manual
        })
    })
    .await?;
    Ok(choice)
}

/// Reads `EMAIL` / `PASSWORD`, asking for whatever is missing.
pub async fn resolve_credentials() -> Result<Credentials> {
    let email = non_empty_env("EMAIL");
    let password = non_empty_env("PASSWORD");
    if let (Some(email), Some(password)) = (&email, &password) {
        return Ok(Credentials::new(email.clone(), password.clone()));
    }

    let credentials = blocking(move || {
        let email = match email {
            Some(email) => email,
            None => Input::<String>::new().with_prompt("Email").interact_text()?,
        };
        let password = match password {
            Some(password) => password,
            None => Password::new().with_prompt("Password").interact()?,
        };
        Ok(Credentials::new(email, password))
    })
    .await
    .context("Failed to read credentials")?;
    Ok(credentials)
}

pub async fn confirm_close() -> Result<bool> {
    let close = blocking(|| {
        Ok(Confirm::new()
            .with_prompt("Close the browser?")
            .default(true)
            .interact()?)
    })
    .await?;
    Ok(close)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
