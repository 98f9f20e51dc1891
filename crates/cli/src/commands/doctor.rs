use cartsim_core::catalog::CatalogSource;
use cartsim_core::config::{AppConfig, LoadOptions};
use cartsim_services::{HttpCatalogClient, HttpQuoteClient};
use serde::Serialize;

use crate::commands::{runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    run_with(LoadOptions::default(), json_output)
}

pub fn run_with(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            match runtime() {
                Ok(runtime) => {
                    checks.push(runtime.block_on(check_catalog(&config)));
                    checks.push(runtime.block_on(check_backend(&config)));
                }
                Err(error) => {
                    checks.push(DoctorCheck::fail("catalog_reachability", error.clone()));
                    checks.push(DoctorCheck::fail("backend_reachability", error));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("catalog_reachability"));
            checks.push(DoctorCheck::skipped("backend_reachability"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

async fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let client = match HttpCatalogClient::from_config(&config.catalog) {
        Ok(client) => client,
        Err(error) => return DoctorCheck::fail("catalog_reachability", error.to_string()),
    };

    match client.fetch_page(1, 0).await {
        Ok(page) => DoctorCheck::pass(
            "catalog_reachability",
            format!("`{}` lists {} products", config.catalog.base_url, page.total),
        ),
        Err(error) => DoctorCheck::fail(
            "catalog_reachability",
            format!("`{}`: {error}", config.catalog.base_url),
        ),
    }
}

async fn check_backend(config: &AppConfig) -> DoctorCheck {
    let client = match HttpQuoteClient::from_config(config) {
        Ok(client) => client,
        Err(error) => return DoctorCheck::fail("backend_reachability", error.to_string()),
    };

    match client.health().await {
        Ok(status) if (200..300).contains(&status) => DoctorCheck::pass(
            "backend_reachability",
            format!("`{}` is healthy", config.backend.base_url),
        ),
        Ok(status) => DoctorCheck::fail(
            "backend_reachability",
            format!("`{}` answered health check with HTTP {status}", config.backend.base_url),
        ),
        Err(error) => DoctorCheck::fail(
            "backend_reachability",
            format!("`{}`: {error}", config.backend.base_url),
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
