// SPDX-License-Identifier: MIT

//! `ffoundry migrate` - applies pending migrations against `--database-url`
//! and exits; `ff_storage::connect` runs the embedded `sqlx::migrate!` set
//! as part of opening the pool, so there is nothing further to drive here.

use anyhow::Result;

pub async fn run(database_url: &str) -> Result<()> {
    ff_storage::connect(database_url).await?;
    println!("migrations applied to {database_url}");
    Ok(())
}
