//! Terminal report. Everything here formats values into styled strings; the
//! caller decides where they are printed.

use crate::probe::ProbeResult;
use colored::Colorize;

const RULE_WIDTH: usize = 60;

/// Banner: a rule, the centered title, another rule.
pub fn header(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{}\n{}\n{}",
        rule.cyan().bold(),
        format!("{title:^width$}", width = RULE_WIDTH).cyan().bold(),
        rule.cyan()
    )
}

/// Fixed-width `Provider  [PASS]  (0.42s)` line, green or red.
pub fn status_line(result: &ProbeResult) -> String {
    let (status, details) = if result.success {
        ("PASS", format!("({:.2}s)", result.elapsed.as_secs_f64()))
    } else {
        (
            "FAIL",
            format!("Error: {}", result.error.as_deref().unwrap_or("unknown error")),
        )
    };
    let line = format!(
        "{:<12} {:<8} {}",
        result.provider.label(),
        format!("[{status}]"),
        details
    );

    if result.success {
        line.green().to_string()
    } else {
        line.red().to_string()
    }
}

/// Pretty-printed response body, if one was captured.
pub fn detailed_response(result: &ProbeResult) -> Option<String> {
    let body = result.response.as_ref()?;
    let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    Some(format!(
        "\n{}\n{}",
        format!("Detailed response for {}:", result.provider).yellow(),
        pretty
    ))
}

pub fn ok(text: &str) -> String {
    format!("✓ {text}").green().to_string()
}

pub fn fail(text: &str) -> String {
    format!("✗ {text}").red().to_string()
}

/// Pass/fail counts over every probe that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ProbeResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            if result.success {
                summary.passed += 1;
            }
        }
        summary.failed = summary.total - summary.passed;
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn render(&self) -> String {
        let failed = format!("Failed: {}", self.failed);
        let failed = if self.failed > 0 {
            failed.red()
        } else {
            failed.green()
        };
        format!(
            "{}\n{}\n{}",
            format!("Total Tests: {}", self.total).cyan(),
            format!("Passed: {}", self.passed).green(),
            failed
        )
    }
}
