//! Test runner - executes tests grouped by service mode and reports results

use colored::Colorize;
use std::time::Instant;

use crate::types::{SharedBackendState, TestResult};

const RULE: &str = "═══════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────";

/// Service modes in run order; test names are prefixed with the mode
const MODES: &[&str] = &["graph", "direct", "bridge"];

/// A single test case
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    pub run: Box<
        dyn Fn(TestContext) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> + Send + Sync,
    >,
}

impl TestCase {
    /// Mode prefix of the test name (`graph/health` -> `graph`)
    fn mode(&self) -> &'static str {
        self.name.split('/').next().unwrap_or(self.name)
    }
}

/// Context passed to each test - relay addresses per mode and backend state
#[derive(Clone)]
pub struct TestContext {
    pub graph_addr: String,
    pub direct_addr: String,
    pub bridge_addr: String,
    pub backend_state: SharedBackendState,
    pub http_client: reqwest::Client,
}

impl TestContext {
    fn relay_addr(&self, mode: &str) -> &str {
        match mode {
            "graph" => &self.graph_addr,
            "direct" => &self.direct_addr,
            "bridge" => &self.bridge_addr,
            _ => "?",
        }
    }

    fn reset_backend(&self) {
        let mut state = self.backend_state.lock().unwrap();
        state.response_queue.clear();
        state.received_requests.clear();
    }
}

/// Per-mode pass/fail tally
struct ModeTally {
    mode: &'static str,
    passed: usize,
    failed: usize,
}

/// Run the selected test cases mode by mode and report results
pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> Vec<TestResult> {
    let selected: Vec<&TestCase> = cases
        .iter()
        .filter(|c| filter.map_or(true, |f| c.name.contains(f)))
        .collect();

    println!("\n{}", RULE.bright_blue());
    println!("{}", "  chat-relay End-to-End Tests".bright_white().bold());
    println!("{}", RULE.bright_blue());
    println!(
        "  {} test(s) across {} relays, mock provider shared\n",
        selected.len().to_string().bright_cyan(),
        MODES.len()
    );

    let mut results = Vec::new();
    let mut tallies = Vec::new();

    for mode in MODES {
        let mode_cases: Vec<&&TestCase> = selected.iter().filter(|c| c.mode() == *mode).collect();
        if mode_cases.is_empty() {
            continue;
        }

        println!(
            "  {} {} relay at {}",
            "■".bright_blue(),
            mode.bright_white().bold(),
            ctx.relay_addr(mode).bright_cyan()
        );

        let mut tally = ModeTally {
            mode: *mode,
            passed: 0,
            failed: 0,
        };
        for case in mode_cases {
            let result = run_case(case, &ctx).await;
            if result.passed {
                tally.passed += 1;
            } else {
                tally.failed += 1;
            }
            results.push(result);
        }
        println!();
        tallies.push(tally);
    }

    print_summary(&tallies);
    results
}

async fn run_case(case: &TestCase, ctx: &TestContext) -> TestResult {
    ctx.reset_backend();

    let start = Instant::now();
    print!("    {} ... ", case.name.bright_white());
    let outcome = (case.run)(ctx.clone()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => {
            println!("{} ({duration_ms}ms)", "PASS".bright_green().bold());
            TestResult {
                name: case.name.to_string(),
                passed: true,
                error: None,
                duration_ms,
            }
        }
        Err(e) => {
            println!("{} ({duration_ms}ms)", "FAIL".bright_red().bold());
            println!("      {} {}", "Error:".bright_red(), e);
            for cause in e.chain().skip(1) {
                println!("      {} {}", "Caused by:".yellow(), cause);
            }
            TestResult {
                name: case.name.to_string(),
                passed: false,
                error: Some(e.to_string()),
                duration_ms,
            }
        }
    }
}

fn print_summary(tallies: &[ModeTally]) {
    println!("{}", THIN_RULE.bright_blue());
    for tally in tallies {
        let line = format!("  {:<8} {} passed, {} failed", tally.mode, tally.passed, tally.failed);
        if tally.failed == 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }

    let passed: usize = tallies.iter().map(|t| t.passed).sum();
    let failed: usize = tallies.iter().map(|t| t.failed).sum();
    let summary = format!("  Total:   {} passed, {} failed", passed, failed);
    if failed == 0 {
        println!("{}", summary.bright_green().bold());
    } else {
        println!("{}", summary.bright_red().bold());
    }
    println!("{}\n", RULE.bright_blue());
}

/// List the registered tests grouped by service mode
pub fn list_tests(cases: &[TestCase]) {
    println!("\n{}", "Available tests:".bright_white().bold());
    for mode in MODES {
        println!("  {}", mode.bright_white().bold());
        for case in cases.iter().filter(|c| c.mode() == *mode) {
            println!("    {} - {}", case.name.bright_cyan(), case.description);
        }
    }
    println!();
}
