use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use shinbun_core::{Category, Focus, Message, Priority, PromptBundle};

use super::template::Template;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Upper bound on the estimated token count of the rendered message block.
    pub token_budget: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self { token_budget: 3800 }
    }
}

/// Whitespace-delimited word count; a cheap stand-in for a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Bucket {
    HighPriority,
    Alert,
    Support,
    General,
}

impl Bucket {
    const ORDER: [Bucket; 4] = [
        Bucket::HighPriority,
        Bucket::Alert,
        Bucket::Support,
        Bucket::General,
    ];

    fn of(message: &Message) -> Self {
        match message.category {
            Category::Alert => Self::Alert,
            _ if message.priority >= Priority::HIGH => Self::HighPriority,
            Category::Support => Self::Support,
            Category::General => Self::General,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::HighPriority => "### High Priority",
            Self::Alert => "### Alert",
            Self::Support => "### Support",
            Self::General => "### General",
        }
    }
}

fn normalize_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| *c != '*' && *c != '`').collect();
    stripped
        .trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// One bullet line: time, channel, category and priority, text, link.
///
/// `jst` is the pre-formatted timestamp. The permalink is reproduced as-is.
pub fn render_line(message: &Message, jst: &str) -> String {
    format!(
        "- [{jst}] #{} ({}, {}): {} Link: <{}>",
        message.channel_name,
        message.category,
        message.priority,
        normalize_text(&message.text),
        message.permalink,
    )
}

/// Sorts, buckets and renders messages into a template within a token budget.
#[derive(Clone, Debug, Default)]
pub struct PromptAssembler {
    config: AssemblerConfig,
}

impl PromptAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, messages: &[Message], focus: &str, now: DateTime<Utc>) -> PromptBundle {
        let focus = Focus::from_name(focus).unwrap_or_else(|| {
            warn!(focus, "unknown focus, using default template");
            Focus::Default
        });
        let template = Template::for_focus(focus);

        let mut renderable: Vec<(&Message, String)> = messages
            .iter()
            .filter_map(|m| match m.ts.format_jst() {
                Ok(jst) => Some((m, jst)),
                Err(e) => {
                    warn!(ts = %m.ts, channel = %m.channel_name, error = %e, "skipping message with bad timestamp");
                    None
                }
            })
            .collect();

        // Canonical order is (priority, ts) ascending; walk it backwards so the
        // highest priority and newest messages are considered first.
        renderable.sort_by(|(a, _), (b, _)| a.priority.cmp(&b.priority).then_with(|| a.ts.cmp(&b.ts)));
        renderable.reverse();

        // Select in canonical order so truncation always drops the least
        // important messages, then group the survivors into sections.
        let budget = self.config.token_budget;
        let mut used = 0usize;
        let mut truncated = false;
        let mut opened: HashSet<Bucket> = HashSet::new();
        let mut chosen: Vec<(Bucket, String)> = Vec::new();

        for (message, jst) in &renderable {
            let bucket = Bucket::of(message);
            let line = render_line(message, jst);
            let mut cost = estimate_tokens(&line);
            if !opened.contains(&bucket) {
                cost += estimate_tokens(bucket.header());
            }
            if used + cost > budget {
                info!(
                    included = chosen.len(),
                    total = renderable.len(),
                    used_tokens = used,
                    next_line_tokens = cost,
                    "token budget reached, dropping remaining messages"
                );
                truncated = true;
                break;
            }
            opened.insert(bucket);
            used += cost;
            chosen.push((bucket, line));
        }
        let included = chosen.len();

        let sections: Vec<String> = Bucket::ORDER
            .iter()
            .filter_map(|bucket| {
                let lines: Vec<&str> = chosen
                    .iter()
                    .filter(|(b, _)| b == bucket)
                    .map(|(_, line)| line.as_str())
                    .collect();
                if lines.is_empty() {
                    return None;
                }
                Some(format!("{}\n{}", bucket.header(), lines.join("\n")))
            })
            .collect();

        if included == 0 {
            return PromptBundle::nothing_renderable(focus, template.system.to_string(), truncated);
        }

        let block = sections.join("\n\n");
        debug!(%focus, included, used_tokens = used, truncated, "assembled prompt");
        PromptBundle {
            focus,
            system_message: template.system.to_string(),
            user_prompt: template.render(now, &block),
            included_message_count: included,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shinbun_core::{MessageTs, NOTHING_RENDERABLE};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_738_400_000, 0).unwrap()
    }

    fn msg(ts: &str, channel: &str, text: &str) -> Message {
        Message::classified(
            channel,
            MessageTs::from_raw(ts),
            text,
            format!("https://acme.slack.com/archives/C1/p{}", ts.replace('.', "")),
        )
    }

    fn block_of(prompt: &str) -> &str {
        let start = prompt.find("### ").unwrap();
        let end = prompt[start..]
            .find("\n\nPlease summarize")
            .map_or(prompt.len(), |i| start + i);
        &prompt[start..end]
    }

    #[test]
    fn render_line_shape() {
        let m = msg("1738387800.000100", "eng", "**Deploy** `v2`\n\n\n  done  ");
        let line = render_line(&m, &m.ts.format_jst().unwrap());
        assert_eq!(
            line,
            "- [2025-02-01 14:30:00 JST] #eng (general, p1): Deploy v2\n  done Link: <https://acme.slack.com/archives/C1/p1738387800000100>"
        );
    }

    #[test]
    fn budget_keeps_newest_that_fit() {
        // Each general line is 10 words; the header is 2.
        let messages: Vec<_> = (1..=5)
            .map(|i| msg(&format!("173838780{i}.000000"), "eng", "hello"))
            .collect();
        let line_cost = estimate_tokens(&render_line(&messages[0], &messages[0].ts.format_jst().unwrap()));
        assert_eq!(line_cost, 10);

        let assembler = PromptAssembler::new(AssemblerConfig { token_budget: 22 });
        let bundle = assembler.assemble(&messages, "default", now());

        assert_eq!(bundle.included_message_count, 2);
        assert!(bundle.truncated);
        assert!(bundle.user_prompt.contains("1738387805000000"));
        assert!(bundle.user_prompt.contains("1738387804000000"));
        assert!(!bundle.user_prompt.contains("1738387803000000"));
    }

    #[test]
    fn budget_keeps_highest_priority_over_newer_lines() {
        let messages = vec![
            msg("1738387801.000000", "eng", "urgent old"),
            msg("1738387802.000000", "eng", "urgent new"),
            msg("1738387803.000000", "random", "lunch on friday"),
            msg("1738387804.000000", "random", "new hire starts"),
            msg("1738387805.000000", "random", "coffee machine fixed"),
        ];
        let cost = |m: &Message| estimate_tokens(&render_line(m, &m.ts.format_jst().unwrap()));
        let budget = estimate_tokens("### High Priority") + cost(&messages[0]) + cost(&messages[1]);

        let bundle = PromptAssembler::new(AssemblerConfig { token_budget: budget })
            .assemble(&messages, "default", now());

        assert_eq!(bundle.included_message_count, 2);
        assert!(bundle.truncated);
        assert!(bundle.user_prompt.contains("urgent old"));
        assert!(bundle.user_prompt.contains("urgent new"));
        assert!(!bundle.user_prompt.contains("### General"));
        assert!(!bundle.user_prompt.contains("coffee machine fixed"));
    }

    #[test]
    fn block_never_exceeds_budget() {
        let messages = vec![
            msg("1738387801.000000", "eng", "site down for everyone"),
            msg("1738387802.000000", "support", "customer cannot log in"),
            msg("1738387803.000000", "eng", "urgent: rotate keys"),
            msg("1738387804.000000", "random", "lunch on friday"),
            msg("1738387805.000000", "random", "new hire starts monday"),
        ];
        for budget in [0, 5, 11, 12, 20, 30, 45, 60, 200] {
            let bundle = PromptAssembler::new(AssemblerConfig { token_budget: budget })
                .assemble(&messages, "default", now());
            if bundle.is_renderable() {
                assert!(estimate_tokens(block_of(&bundle.user_prompt)) <= budget, "budget {budget}");
            } else {
                assert_eq!(bundle.user_prompt, NOTHING_RENDERABLE);
            }
            assert_eq!(bundle.truncated, bundle.included_message_count < messages.len());
        }
    }

    #[test]
    fn buckets_in_fixed_order() {
        let messages = vec![
            msg("1738387801.000000", "random", "lunch on friday"),
            msg("1738387802.000000", "support", "customer cannot log in"),
            msg("1738387803.000000", "eng", "prod outage in eu"),
            msg("1738387804.000000", "eng", "urgent: rotate keys"),
        ];
        let bundle = PromptAssembler::default().assemble(&messages, "default", now());
        let p = &bundle.user_prompt;

        let high = p.find("### High Priority").unwrap();
        let alert = p.find("### Alert").unwrap();
        let support = p.find("### Support").unwrap();
        let general = p.find("### General").unwrap();
        assert!(high < alert && alert < support && support < general);

        assert!(p[high..alert].contains("rotate keys"));
        assert!(p[alert..support].contains("prod outage"));
        assert!(p[support..general].contains("cannot log in"));
        assert!(p[general..].contains("lunch"));
        assert_eq!(bundle.included_message_count, 4);
        assert!(!bundle.truncated);
    }

    #[test]
    fn truncation_keeps_priority_then_recency_across_buckets() {
        // Both are p3; the alert is newer, so it survives a one-line budget
        // even though High Priority renders before Alert.
        let messages = vec![
            msg("1738387801.000000", "eng", "urgent: rotate keys"),
            msg("1738387809.000000", "eng", "outage"),
            msg("1738387805.000000", "random", "lunch"),
        ];
        let alert_cost = estimate_tokens(&render_line(&messages[1], &messages[1].ts.format_jst().unwrap()))
            + estimate_tokens("### Alert");
        let bundle = PromptAssembler::new(AssemblerConfig { token_budget: alert_cost })
            .assemble(&messages, "default", now());

        assert_eq!(bundle.included_message_count, 1);
        assert!(bundle.truncated);
        assert!(bundle.user_prompt.contains("### Alert"));
        assert!(!bundle.user_prompt.contains("rotate keys"));
    }

    #[test]
    fn newest_first_within_bucket() {
        let messages = vec![
            msg("1738387801.000000", "random", "older note"),
            msg("1738387809.000000", "random", "newer note"),
        ];
        let bundle = PromptAssembler::default().assemble(&messages, "default", now());
        let p = &bundle.user_prompt;
        assert!(p.find("newer note").unwrap() < p.find("older note").unwrap());
    }

    #[test]
    fn unknown_focus_falls_back_to_default() {
        let messages = vec![msg("1738387801.000000", "eng", "hello")];
        let bundle = PromptAssembler::default().assemble(&messages, "unknown-value", now());
        assert_eq!(bundle.focus, Focus::Default);
        assert!(bundle.user_prompt.contains("Top highlights"));
    }

    #[test]
    fn support_focus_uses_support_template() {
        let messages = vec![msg("1738387801.000000", "support", "ticket opened")];
        let bundle = PromptAssembler::default().assemble(&messages, "support", now());
        assert_eq!(bundle.focus, Focus::Support);
        assert!(bundle.user_prompt.contains("New Support Requests"));
        assert_eq!(bundle.system_message, Template::for_focus(Focus::Support).system);
    }

    #[test]
    fn first_line_too_long_is_nothing_renderable() {
        let messages = vec![msg("1738387801.000000", "eng", "a b c d e f g h")];
        let bundle = PromptAssembler::new(AssemblerConfig { token_budget: 5 })
            .assemble(&messages, "default", now());
        assert!(!bundle.is_renderable());
        assert!(bundle.truncated);
        assert_eq!(bundle.user_prompt, NOTHING_RENDERABLE);
    }

    #[test]
    fn bad_timestamps_are_skipped_not_truncated() {
        let messages = vec![
            msg("not-a-ts", "eng", "broken"),
            msg("1738387801.000000", "eng", "fine"),
        ];
        let bundle = PromptAssembler::default().assemble(&messages, "default", now());
        assert_eq!(bundle.included_message_count, 1);
        assert!(!bundle.truncated);
        assert!(!bundle.user_prompt.contains("broken"));
    }

    #[test]
    fn empty_input_is_nothing_renderable() {
        let bundle = PromptAssembler::default().assemble(&[], "support", now());
        assert_eq!(bundle.user_prompt, NOTHING_RENDERABLE);
        assert!(!bundle.truncated);
        assert_eq!(bundle.focus, Focus::Support);
    }
}
