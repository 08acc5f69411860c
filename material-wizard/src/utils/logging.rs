// Log line shaping for the fern dispatch in `lib.rs`
//
// Messages may carry `[PHASE: x]` and `[STEP: y]` tags. They are lifted out of the text into
// their own fields so the JSON file can be filtered by phase.

use log::Level;
use serde::Serialize;

/// Keep the first and last four chars of a secret; short values are hidden completely.
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Split `[PHASE: ..]` and `[STEP: ..]` off a message: `(phase, step, remaining text)`.
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, rest) = extract_tag(message, "[PHASE:");
    let (step, cleaned) = extract_tag(&rest, "[STEP:");
    (phase, step, cleaned)
}

fn extract_tag(message: &str, open: &str) -> (Option<String>, String) {
    let Some(start) = message.find(open) else {
        return (None, message.to_string());
    };
    let Some(end) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + open.len()..start + end].trim().to_string();
    let cleaned = format!("{} {}", &message[..start], &message[start + end + 1..])
        .trim()
        .to_string();
    (Some(value), cleaned)
}

/// One log record with its tags already separated.
#[derive(Debug, Serialize)]
pub struct LogLine<'a> {
    pub timestamp: &'a str,
    pub level: &'static str,
    pub target: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'a str>,
}

impl<'a> LogLine<'a> {
    pub fn new(
        timestamp: &'a str,
        level: Level,
        target: &'a str,
        message: &'a str,
        phase: Option<&'a str>,
        step: Option<&'a str>,
    ) -> Self {
        Self {
            timestamp,
            level: level.as_str(),
            target,
            message,
            phase,
            step,
        }
    }

    /// Single-line JSON object for the `.log` file.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// `[ts] [LEVEL] [PHASE: p] [STEP: s] [target] message`
    pub fn to_text(&self) -> String {
        let mut out = format!("[{}] [{}]", self.timestamp, self.level);
        if let Some(phase) = self.phase {
            out.push_str(&format!(" [PHASE: {}]", phase));
        }
        if let Some(step) = self.step {
            out.push_str(&format!(" [STEP: {}]", step));
        }
        out.push_str(&format!(" [{}] {}", self.target, self.message));
        out
    }
}
