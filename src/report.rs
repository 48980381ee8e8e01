//! Human-readable summary of a dispatch.

use crate::core::{ChannelError, ChannelResult, Effect, Outcome};
use std::fmt;

/// Printed when the chat channel is enabled but has no usable webhook URL.
pub const WEBHOOK_SETUP_GUIDE: &str = "\
📝 To set up the chat notification:
1. Create a Feishu group chat
2. Add a custom bot to the group
3. Copy the bot's webhook URL
4. Export FEISHU_WEBHOOK_URL, pass --webhook, or set notification.feishu.webhook_url in notify.json";

/// Summary of one dispatch, ready to print.
///
/// Building a report only reads the results; it never touches the channels.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    lines: Vec<ReportLine>,
    needs_webhook_setup: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ReportLine {
    channel: String,
    effect: Effect,
    passed: bool,
    reason: Option<String>,
}

impl SummaryReport {
    pub fn new(results: &[ChannelResult]) -> Self {
        let lines = results
            .iter()
            .map(|result| ReportLine {
                channel: result.channel.clone(),
                effect: result.effect,
                passed: result.outcome.is_success(),
                reason: match &result.outcome {
                    Outcome::Success => None,
                    Outcome::Failure(e) => Some(e.to_string()),
                },
            })
            .collect();
        let needs_webhook_setup = results.iter().any(|result| {
            result.effect == Effect::ChatMessage
                && matches!(
                    result.outcome,
                    Outcome::Failure(ChannelError::Configuration(_))
                )
        });
        Self {
            lines,
            needs_webhook_setup,
        }
    }

    /// True when every enabled channel delivered, including when none were enabled.
    pub fn all_succeeded(&self) -> bool {
        self.lines.iter().all(|line| line.passed)
    }

    /// Effects the user should notice, one per distinct kind, in channel order.
    pub fn expected_effects(&self) -> Vec<Effect> {
        let mut effects = Vec::new();
        for line in self.lines.iter().filter(|line| line.passed) {
            if !effects.contains(&line.effect) {
                effects.push(line.effect);
            }
        }
        effects
    }

    /// True when the chat channel failed only because it was never set up.
    pub fn needs_webhook_setup(&self) -> bool {
        self.needs_webhook_setup
    }

    /// Process exit code: 0 when every channel delivered, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Notification summary:")?;
        if self.lines.is_empty() {
            return write!(f, "  (no notification channels enabled)");
        }
        for line in &self.lines {
            match &line.reason {
                None => writeln!(f, "  ✅ {} ({})", line.channel, line.effect)?,
                Some(reason) => writeln!(f, "  ❌ {}: {}", line.channel, reason)?,
            }
        }

        let effects = self.expected_effects();
        if effects.is_empty() {
            write!(f, "⚠️  No notification was delivered")
        } else {
            let effects: Vec<String> = effects.iter().map(|e| e.to_string()).collect();
            write!(f, "🎯 Expect: {}", effects.join(" + "))
        }
    }
}
