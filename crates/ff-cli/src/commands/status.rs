// SPDX-License-Identifier: MIT

//! `ffoundry status` - polls a running instance's `/api/status`.

use anyhow::{Context, Result};

pub async fn run(url: &str) -> Result<()> {
    let endpoint = format!("{}/api/status", url.trim_end_matches('/'));
    let body: serde_json::Value =
        reqwest::get(&endpoint).await.context("request failed")?.json().await.context("invalid response body")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
