// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `commbot doctor` command implementation.
//!
//! Runs diagnostic checks against the configured object store and the VK
//! API, loads the catalog once and reports what it contains. With
//! `--dump-dir` the normalized catalog tables are written out as CSV.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use commbot_catalog::{CatalogCache, CatalogSettings, write_commands_csv, write_phrases_csv};
use commbot_config::model::CommbotConfig;
use commbot_core::{CommandKind, CommbotError, HealthStatus, ObjectStoreAdapter, PhraseKind, PluginAdapter};
use commbot_vk::VkClient;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs the `commbot doctor` command.
pub async fn run_doctor(
    config: &CommbotConfig,
    plain: bool,
    dump_dir: Option<&Path>,
) -> Result<(), CommbotError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![check_serve_settings(config)];

    match commbot_storage::open_store(&config.catalog) {
        Ok(store) => {
            results.push(check_adapter("Object store", store.as_ref()).await);
            let (result, catalog) = check_catalog(store, CatalogSettings::from(&config.catalog)).await;
            results.push(result);
            if let (Some(dir), Some(catalog)) = (dump_dir, catalog.as_ref()) {
                results.push(dump_catalog(catalog, dir).await);
            }
        }
        Err(e) => results.push(CheckResult::new(
            "Object store",
            CheckStatus::Fail,
            e.to_string(),
            Instant::now(),
        )),
    }

    results.push(check_vk(config).await);

    print_results(&results, use_color);
    Ok(())
}

fn check_serve_settings(config: &CommbotConfig) -> CheckResult {
    let start = Instant::now();
    match commbot_config::validate_for_serve(config) {
        Ok(()) => CheckResult::new("Configuration", CheckStatus::Pass, "ready to serve", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Warn,
            format!("{} setting(s) missing for serve", errors.len()),
            start,
        ),
    }
}

async fn check_adapter<A: PluginAdapter + ?Sized>(name: &str, adapter: &A) -> CheckResult {
    let start = Instant::now();
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "reachable", start),
        Ok(HealthStatus::Degraded(reason)) => CheckResult::new(name, CheckStatus::Warn, reason, start),
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult::new(name, CheckStatus::Fail, reason, start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

/// Loads both tables once and summarizes them.
async fn check_catalog(
    store: Arc<dyn ObjectStoreAdapter>,
    settings: CatalogSettings,
) -> (CheckResult, Option<CatalogCache>) {
    let start = Instant::now();
    let catalog = match CatalogCache::load(store, settings).await {
        Ok(catalog) => catalog,
        Err(e) => {
            return (
                CheckResult::new("Catalog", CheckStatus::Fail, e.to_string(), start),
                None,
            );
        }
    };

    let commands = catalog.find_all_commands().await;
    let content = commands
        .iter()
        .filter(|c| c.kind() == CommandKind::Content)
        .count();

    let mut missing = Vec::new();
    for kind in [PhraseKind::ContentResponse, PhraseKind::Retry] {
        if catalog.find_phrases_by_kind(kind).await.is_empty() {
            missing.push(kind.to_string());
        }
    }

    let snapshot = catalog.snapshot().await;
    let summary = format!(
        "{} commands ({content} content), {} phrases",
        commands.len(),
        snapshot.phrases.len()
    );
    let result = if missing.is_empty() {
        CheckResult::new("Catalog", CheckStatus::Pass, summary, start)
    } else {
        CheckResult::new(
            "Catalog",
            CheckStatus::Warn,
            format!("{summary}; no {} phrases", missing.join("/")),
            start,
        )
    };
    (result, Some(catalog))
}

/// Writes the normalized tables to `dir/phrases.csv` and `dir/commands.csv`.
async fn dump_catalog(catalog: &CatalogCache, dir: &Path) -> CheckResult {
    let start = Instant::now();
    let snapshot = catalog.snapshot().await;

    let mut phrases = Vec::new();
    for kind in [
        PhraseKind::Welcome,
        PhraseKind::Goodbye,
        PhraseKind::Info,
        PhraseKind::MembershipWarning,
        PhraseKind::ContentResponse,
        PhraseKind::Retry,
    ] {
        phrases.extend(snapshot.phrases.by_kind(kind).iter().cloned());
    }
    phrases.sort_by_key(|p| p.id);
    let commands = snapshot.commands.all();

    let encoded = write_phrases_csv(&phrases).and_then(|p| {
        write_commands_csv(commands.iter().map(|c| c.as_ref())).map(|c| (p, c))
    });
    let (phrases_csv, commands_csv) = match encoded {
        Ok(tables) => tables,
        Err(e) => return CheckResult::new("Catalog dump", CheckStatus::Fail, e.to_string(), start),
    };

    match write_tables(dir, phrases_csv, commands_csv).await {
        Ok(()) => CheckResult::new(
            "Catalog dump",
            CheckStatus::Pass,
            format!("written to {}", dir.display()),
            start,
        ),
        Err(e) => CheckResult::new("Catalog dump", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn write_tables(dir: &Path, phrases: String, commands: String) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join("phrases.csv"), phrases).await?;
    tokio::fs::write(dir.join("commands.csv"), commands).await
}

async fn check_vk(config: &CommbotConfig) -> CheckResult {
    let start = Instant::now();
    if config.vk.community_bot_token.is_none() {
        return CheckResult::new("VK API", CheckStatus::Warn, "no community token configured", start);
    }
    match VkClient::from_config(&config.vk) {
        Ok(client) => check_adapter("VK API", &client).await,
        Err(e) => CheckResult::new("VK API", CheckStatus::Fail, e.to_string(), start),
    }
}

fn print_results(results: &[CheckResult], use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  commbot doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in results {
        let duration_ms = result.duration.as_millis();
        let line = match (&result.status, use_color) {
            (CheckStatus::Pass, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✓".green(),
                result.name,
                result.message
            ),
            (CheckStatus::Pass, false) => format!(
                "    [OK]   {:<20} {} ({duration_ms}ms)",
                result.name, result.message
            ),
            (CheckStatus::Warn, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "!".yellow(),
                result.name,
                result.message.yellow()
            ),
            (CheckStatus::Warn, false) => format!(
                "    [WARN] {:<20} {} ({duration_ms}ms)",
                result.name, result.message
            ),
            (CheckStatus::Fail, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✗".red(),
                result.name,
                result.message.red()
            ),
            (CheckStatus::Fail, false) => format!(
                "    [FAIL] {:<20} {} ({duration_ms}ms)",
                result.name, result.message
            ),
        };
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{line}");
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
}
