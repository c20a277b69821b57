//! Keyword classifier.
//!
//! Maps a (channel name, text) pair onto a category and a priority. Matching
//! is a case-insensitive substring search; no tokenisation is attempted, so
//! "shutdown" counts as "down".

use crate::message::{Category, Priority};

const HIGH_URGENCY: &[&str] = &["urgent", "asap", "blocker", "immediately"];

const ALERT: &[&str] = &[
    "alert", "incident", "outage", "critical", "down", "p0", "sev0", "sev1",
];

const SUPPORT_INTENT: &[&str] = &[
    "support request",
    "customer issue",
    "ticket",
    "bug report",
    "need help",
    "assistance",
];

const SUPPORT_CHANNEL_MARKERS: &[&str] = &["support", "customer", "help"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a message. Alert keywords always win over the channel default.
pub fn classify(channel_name: &str, text: &str) -> (Category, Priority) {
    let text = text.to_lowercase();
    let channel = channel_name.to_lowercase();

    let mut priority = Priority::LOW;
    if contains_any(&text, HIGH_URGENCY) {
        priority = Priority::HIGH;
    }

    if contains_any(&text, ALERT) {
        priority.raise_to(Priority::HIGH);
        return (Category::Alert, priority);
    }

    // A support channel and support wording in any channel land on the same
    // category and floor.
    if contains_any(&channel, SUPPORT_CHANNEL_MARKERS) || contains_any(&text, SUPPORT_INTENT) {
        priority.raise_to(Priority::MEDIUM);
        return (Category::Support, priority);
    }

    (Category::General, priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_general_low() {
        assert_eq!(
            classify("random", "lunch at noon?"),
            (Category::General, Priority::LOW)
        );
    }

    #[test]
    fn urgency_raises_general_priority() {
        assert_eq!(
            classify("random", "need the deck ASAP"),
            (Category::General, Priority::HIGH)
        );
    }

    #[test]
    fn alert_keyword_sets_alert_and_high() {
        assert_eq!(
            classify("eng", "Incident: payments degraded"),
            (Category::Alert, Priority::HIGH)
        );
        assert_eq!(classify("eng", "SEV1 opened"), (Category::Alert, Priority::HIGH));
    }

    #[test]
    fn alert_overrides_support_channel() {
        assert_eq!(
            classify("support-tier1", "customer site is down"),
            (Category::Alert, Priority::HIGH)
        );
    }

    #[test]
    fn support_channel_gets_medium_floor() {
        assert_eq!(
            classify("customer-success", "thanks all"),
            (Category::Support, Priority::MEDIUM)
        );
        assert_eq!(
            classify("Help-Desk", "opened a ticket"),
            (Category::Support, Priority::MEDIUM)
        );
    }

    #[test]
    fn support_channel_keeps_higher_urgency() {
        assert_eq!(
            classify("support", "urgent: refund stuck"),
            (Category::Support, Priority::HIGH)
        );
    }

    #[test]
    fn support_intent_in_any_channel() {
        assert_eq!(
            classify("general", "I need help with my login"),
            (Category::Support, Priority::MEDIUM)
        );
        assert_eq!(
            classify("eng", "filed a Bug Report for the exporter"),
            (Category::Support, Priority::MEDIUM)
        );
    }

    #[test]
    fn substring_match_is_literal() {
        assert_eq!(classify("eng", "scheduled shutdown").0, Category::Alert);
    }

    #[test]
    fn deterministic() {
        let a = classify("ops-help", "blocker on release, sev0?");
        let b = classify("ops-help", "blocker on release, sev0?");
        assert_eq!(a, b);
        assert_eq!(a, (Category::Alert, Priority::HIGH));
    }
}
