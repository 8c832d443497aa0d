// SPDX-License-Identifier: MIT

//! `ffoundry serve` - runs the HTTP/WebSocket server in the foreground.

use anyhow::Result;
use ff_server::config::Config;

pub async fn run() -> Result<()> {
    ff_server::init_tracing();
    let config = Config::from_env();
    ff_server::serve(config).await
}
