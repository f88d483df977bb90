use super::load_config;
use super::prompts::{prompt_string, prompt_yes_no};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use diary_sync_config::TokenStore;
use diary_sync_sources::TokenManager;
use std::path::Path;

/// Interactive authorization-code exchange
pub async fn run_auth(config_path: Option<&Path>, code: Option<String>, output: &Output) -> Result<()> {
    let (config, paths) = load_config(config_path)?;
    config.validate_trakt()?;

    let store = TokenStore::new(config.token_file(&paths));
    if store.exists() && code.is_none() {
        let replace = prompt_yes_no(
            &format!("A Trakt token already exists at {}. Replace it?", store.path().display()),
            false,
        )?;
        if !replace {
            output.info("Keeping the existing token.");
            return Ok(());
        }
    }

    let manager = TokenManager::new(&config.trakt, store);
    let code = match code {
        Some(code) => code,
        None => {
            output.info("Please visit the following URL to authorize this application:");
            output.info(manager.authorize_url());
            prompt_string("Authorization code")?
        }
    };

    let token = manager
        .exchange_code(&code)
        .await
        .map_err(|e| eyre!("Failed to exchange authorization code: {}", e))?;

    output.success(format!("Trakt token saved to {}", manager.store().path().display()));
    if let Some(expiry) = token.expiry() {
        output.info(format!("Token expires at {}", expiry.format("%Y-%m-%d %H:%M UTC")));
    }
    Ok(())
}
