//! config command - Get, set, or list configuration values

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, FileConfig, KEYS};
use crate::ui::output;

/// Print the effective value of one key.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = ctx.load_config()?;
    if let Some(value) = config.get(key)? {
        output::print(value);
    }
    Ok(())
}

/// Set one key and write the config file.
///
/// Writes to the file the configuration was loaded from, or to
/// `~/.bugsift/config.toml` when none exists yet.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let (path, mut file) = target(ctx)?;
    file.set(key, value)?;
    Config::write(&path, &file).context("Failed to write config")?;

    output::success(
        format!("Set {} = {} in {}", key, value.trim(), path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List every key with its effective value.
pub fn list(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    match config.loaded_from() {
        Some(path) => output::print(format!("# {}", path.display())),
        None => output::print("# defaults (no config file)"),
    }
    for key in KEYS {
        let value = config.get(key)?.unwrap_or_else(|| "(not set)".to_string());
        output::print(format!("{} = {}", key, value));
    }
    Ok(())
}

/// The file to write and its current contents.
fn target(ctx: &Context) -> Result<(PathBuf, FileConfig)> {
    if let Some(path) = &ctx.config_path {
        if !path.exists() {
            return Ok((path.clone(), FileConfig::default()));
        }
    }

    let config = ctx.load_config()?;
    let path = match config.loaded_from() {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    Ok((path, config.file))
}
