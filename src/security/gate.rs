use colored::Colorize;
use dialoguer::Confirm;

use super::command::{RiskLevel, RiskVerdict};

/// Outcome of gating one proposed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Declined,
    Blocked { category: String, reason: String },
}

/// Confirmation source, injected so tools and tests never talk to a
/// terminal directly.
pub trait ConfirmPrompt {
    /// Ask the user to approve `message`. Returning `false` declines.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Terminal prompt backed by dialoguer. Cancellation (Ctrl-C, EOF, a closed
/// tty) counts as a decline, never as approval.
pub struct InteractivePrompt;

impl ConfirmPrompt for InteractivePrompt {
    fn confirm(&mut self, message: &str) -> bool {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Gate a classified command.
///
/// Blocked verdicts are refused with no override path. MEDIUM verdicts
/// prompt regardless of `auto_confirm`. Anything milder prompts only when
/// `auto_confirm` is off.
pub fn authorize(
    verdict: &RiskVerdict,
    auto_confirm: bool,
    prompt: &mut dyn ConfirmPrompt,
) -> GateDecision {
    if verdict.is_blocked() {
        return GateDecision::Blocked {
            category: verdict.category.to_string(),
            reason: verdict.reason.clone(),
        };
    }

    let must_ask = verdict.needs_confirmation() || !auto_confirm;
    if !must_ask {
        return GateDecision::Proceed;
    }

    let message = if verdict.level == RiskLevel::Safe {
        format!("Execute command: {} ?", verdict.subject)
    } else {
        format!(
            "{}\nExecute command: {} ?",
            format_risk_warning(verdict),
            verdict.subject
        )
    };
    if prompt.confirm(&message) {
        GateDecision::Proceed
    } else {
        GateDecision::Declined
    }
}

/// Gate a mutating action (file write, rename, upload) that carries no
/// command verdict. Prompts unless `auto_confirm` is on.
pub fn confirm_mutation(
    description: &str,
    auto_confirm: bool,
    prompt: &mut dyn ConfirmPrompt,
) -> GateDecision {
    if auto_confirm {
        return GateDecision::Proceed;
    }
    if prompt.confirm(&format!("{} ?", description)) {
        GateDecision::Proceed
    } else {
        GateDecision::Declined
    }
}

/// Render a risk verdict for the terminal.
pub fn format_risk_warning(verdict: &RiskVerdict) -> String {
    let level = match verdict.level {
        RiskLevel::Critical | RiskLevel::High => verdict.level.to_string().red().bold(),
        RiskLevel::Medium => verdict.level.to_string().yellow().bold(),
        RiskLevel::Low => verdict.level.to_string().yellow(),
        RiskLevel::Safe => verdict.level.to_string().green(),
    };
    format!(
        "{} risk level: {} [{}]\n  {}\n  {}",
        "⚠".yellow(),
        level,
        verdict.category,
        verdict.reason,
        verdict.recommendation.dimmed()
    )
}
