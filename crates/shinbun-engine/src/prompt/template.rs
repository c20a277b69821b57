use chrono::{DateTime, Utc};
use chrono_tz::Asia::Tokyo;

use shinbun_core::Focus;

/// Format of the "current time" stamp embedded in every prompt.
pub const CURRENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M JST";

const CURRENT_TIME: &str = "{current_time}";
const MESSAGES: &str = "{messages}";

/// A system role plus a user prompt body with two placeholders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    pub focus: Focus,
    pub system: &'static str,
    pub body: &'static str,
}

const DEFAULT: Template = Template {
    focus: Focus::Default,
    system: "You summarize Slack messages into markdown digests.",
    body: r#"You are an assistant that is providing me with important updates and information. You are going to give me key information for the week prior. I like my information presented
like a newspaper, with key information at the top, important highlights, and any urgent topics clearly called out. The remaining information should
be presented as a short summary with key highlights or takeaways that I should be aware of.

Each message includes a timestamp in JST (Japan Standard Time). Use these timestamps to provide accurate timing information in your summary.
For example, if a message is from "2025-02-01 14:30:00 JST", say "yesterday at 2:30 PM" or "on February 1st" as appropriate.
The current time is {current_time}.

Messages are grouped under "High Priority", "Alert", "Support" and "General" headings, and each line carries its category and priority.

Structure the summary in the following sections:

1. "Top highlights" - 3-5 bullet points of the most important items, with links to the relevant Slack messages.
2. "Urgent Incidents and Support Issues" - Bullet points of major support issues and incidents, with links to the relevant Slack message. Include any data in the information like when the incident started.
3. "General Updates" - Group and summarize other interesting topics and announcements, provide any takeaways.
4. "Support and Incident Summary" - Provide an overview of support requests and incidents, provide any takeaways and identify any follow up actions that I need.

IMPORTANT: Each message below includes a "Link:" field containing the exact Slack message URL. When referencing messages in your summary, you MUST use these exact URLs in your markdown links. Do not modify the URLs or use placeholders. Format your links as [description](url)

After you create your summary, review the above context to make sure the summary meets those expectations both in terms of format and content.
Also double-check that the links to the Slack messages are exactly the links provided in the "Link:" fields.

As for the tone, I want you to sound cheery and bright. Make it happy and fun to read with little jokes and fun comments.

Messages to summarize:
{messages}

Please summarize these messages, making sure to use the exact Slack message URLs provided in the Link: fields above."#,
};

const SUPPORT: Template = Template {
    focus: Focus::Support,
    system: "You summarize customer support activity from Slack into concise, actionable markdown reports.",
    body: r#"Summarize the following support-related messages. Structure the summary into these sections:

1.  **Critical/Urgent Issues:** Bullet points for any urgent matters needing immediate attention.
2.  **New Support Requests:** Briefly list new issues raised.
3.  **Updates & Resolutions:** Summarize progress on ongoing issues or confirmed resolutions.
4.  **Statistics:** Provide a brief statistical overview including: the total number of requests/messages summarized, a breakdown of request types (if possible), components frequently mentioned, and teams involved/mentioned.

IMPORTANT: Each message below includes a "Link:" field containing the exact Slack message URL. When referencing messages, you MUST use these exact URLs in markdown links: [Description](exact-slack-url). Do not modify the URLs or use placeholders.

Use a professional and direct tone. Focus on actionable information.

Current time for context: {current_time}.

Messages:
{messages}"#,
};

impl Template {
    pub fn for_focus(focus: Focus) -> &'static Template {
        match focus {
            Focus::Default => &DEFAULT,
            Focus::Support => &SUPPORT,
        }
    }

    /// Fill in the placeholders. The time goes in first so message text that
    /// happens to contain a placeholder is left alone.
    pub fn render(&self, now: DateTime<Utc>, messages: &str) -> String {
        let current_time = now.with_timezone(&Tokyo).format(CURRENT_TIME_FORMAT).to_string();
        self.body
            .replace(CURRENT_TIME, &current_time)
            .replace(MESSAGES, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // 2025-02-01 05:30 UTC
        DateTime::from_timestamp(1_738_387_800, 0).unwrap()
    }

    #[test]
    fn default_sections_present() {
        let t = Template::for_focus(Focus::Default);
        for section in [
            "Top highlights",
            "Urgent Incidents and Support Issues",
            "General Updates",
            "Support and Incident Summary",
        ] {
            assert!(t.body.contains(section), "missing {section}");
        }
    }

    #[test]
    fn support_sections_present() {
        let t = Template::for_focus(Focus::Support);
        for section in [
            "Critical/Urgent Issues",
            "New Support Requests",
            "Updates & Resolutions",
            "Statistics",
        ] {
            assert!(t.body.contains(section), "missing {section}");
        }
        assert_ne!(t.system, Template::for_focus(Focus::Default).system);
    }

    #[test]
    fn render_fills_both_placeholders() {
        for focus in [Focus::Default, Focus::Support] {
            let out = Template::for_focus(focus).render(now(), "- line one");
            assert!(out.contains("2025-02-01 14:30 JST"));
            assert!(out.contains("- line one"));
            assert!(!out.contains(CURRENT_TIME));
            assert!(!out.contains(MESSAGES));
            assert!(out.contains("Link:"));
        }
    }

    #[test]
    fn placeholder_inside_messages_is_not_expanded() {
        let out = Template::for_focus(Focus::Support).render(now(), "literal {current_time}");
        assert!(out.contains("literal {current_time}"));
    }
}
