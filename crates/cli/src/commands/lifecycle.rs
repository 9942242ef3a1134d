//! install / activate / update

use anyhow::Result;
use zakatek_client::{ActivationReport, InstallReport};

use crate::host::Host;

pub async fn install(host: &Host) -> Result<()> {
    let report = host.install().await?;
    println!("{}", describe_install(&report));
    Ok(())
}

pub async fn activate(host: &Host) -> Result<()> {
    let report = host.manager.on_activate().await?;
    for line in describe_activation(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn update(host: &Host) -> Result<()> {
    install(host).await?;
    activate(host).await
}

fn describe_install(report: &InstallReport) -> String {
    format!(
        "installed {}: {} entries, {} bytes",
        report.generation, report.entries, report.bytes
    )
}

fn describe_activation(report: &ActivationReport) -> Vec<String> {
    let mut lines = vec![if report.deleted.is_empty() {
        format!("activated {} (nothing to prune)", report.generation)
    } else {
        format!("activated {} (deleted: {})", report.generation, report.deleted.join(", "))
    }];

    lines.extend(
        report
            .failed
            .iter()
            .map(|f| format!("warning: could not delete {}: {}", f.bucket, f.reason)),
    );
    lines
}
