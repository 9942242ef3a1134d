//! fetch: run one request through the manager.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use zakatek_client::{Served, Source, resolve};
use zakatek_core::{Error, Request, RequestMode};

use crate::host::Host;

pub async fn fetch(host: &Host, locator: &str, navigate: bool, method: &str, output: Option<&Path>) -> Result<()> {
    let request = build_request(host, locator, navigate, method)?;
    let served = host.manager.on_fetch(&request).await?;

    eprintln!("{}", describe(&served));

    match output {
        Some(path) => tokio::fs::write(path, &served.response.body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&served.response.body).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

fn build_request(host: &Host, locator: &str, navigate: bool, method: &str) -> Result<Request, Error> {
    let url = resolve(host.manager.origin(), locator)?;
    let mode = if navigate { RequestMode::Navigate } else { RequestMode::NoCors };
    Ok(Request::get(url).with_method(method).with_mode(mode))
}

fn describe(served: &Served) -> String {
    let source = match served.source {
        Source::Cache => "cache",
        Source::Network => "network",
        Source::OfflineFallback => "offline page",
    };
    format!(
        "{} {} ({}, {} bytes)",
        served.response.status,
        served.response.url,
        source,
        served.response.body.len()
    )
}
