//! generations / entries

use anyhow::Result;
use serde::Serialize;
use zakatek_core::EntrySummary;

use crate::host::Host;

/// One stored bucket, flagged when it belongs to the configured generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct GenerationRow {
    name: String,
    current: bool,
}

pub async fn generations(host: &Host, json: bool) -> Result<()> {
    let keys = host.manager.storage().keys().await?;
    let rows = generation_rows(keys, host.manager.generation());

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", format_generations(&rows));
    }
    Ok(())
}

pub async fn entries(host: &Host, generation: Option<&str>, json: bool) -> Result<()> {
    let generation = generation.unwrap_or_else(|| host.manager.generation());
    let entries = host.manager.storage().entries(generation).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", format_entries(&entries));
    }
    Ok(())
}

fn generation_rows(keys: Vec<String>, current: &str) -> Vec<GenerationRow> {
    keys.into_iter()
        .map(|name| GenerationRow { current: name == current, name })
        .collect()
}

fn format_generations(rows: &[GenerationRow]) -> String {
    rows.iter()
        .map(|row| {
            let marker = if row.current { "*" } else { " " };
            format!("{marker} {}\n", row.name)
        })
        .collect()
}

fn format_entries(entries: &[EntrySummary]) -> String {
    entries
        .iter()
        .map(|e| format!("{:>3} {:<6} {:>9} {}\n", e.status, e.method, e.size, e.url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<GenerationRow> {
        let keys = vec!["wesoly-zakatek-v1.0".to_string(), "wesoly-zakatek-v1.1".to_string()];
        generation_rows(keys, "wesoly-zakatek-v1.1")
    }

    #[test]
    fn test_format_generations_marks_current() {
        assert_eq!(format_generations(&rows()), "  wesoly-zakatek-v1.0\n* wesoly-zakatek-v1.1\n");
    }

    #[test]
    fn test_generations_json_keeps_current_flag() {
        let json = serde_json::to_value(rows()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "wesoly-zakatek-v1.0", "current": false },
                { "name": "wesoly-zakatek-v1.1", "current": true },
            ])
        );
    }

    #[test]
    fn test_format_entries() {
        let entries = vec![EntrySummary {
            method: "GET".into(),
            url: "http://localhost:8080/style.css".into(),
            status: 200,
            size: 1234,
            stored_at: "2026-01-01T00:00:00+00:00".into(),
        }];
        assert_eq!(format_entries(&entries), "200 GET         1234 http://localhost:8080/style.css\n");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_generations(&generation_rows(Vec::new(), "v1")), "");
        assert_eq!(format_entries(&[]), "");
    }
}
