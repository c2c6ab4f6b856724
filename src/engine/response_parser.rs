//! Turns raw model text into something the engine can use.
//!
//! Two independent passes:
//! - [`ResponseParser::clean`] strips reasoning spans before display.
//! - [`ResponseParser::parse`] pulls a state delta out of free text, falling
//!   back to [`Resolution::Fallback`] instead of failing.

use serde_json::Value;

use crate::config::{default_reasoning_markers, ReasoningMarker};
use crate::model::state_delta::{Resolution, StateDelta};

const DELTA_FIELDS: [&str; 4] = ["health", "vitality", "inventory", "location"];

#[derive(Debug, Clone)]
pub struct ResponseParser {
    markers: Vec<ReasoningMarker>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(default_reasoning_markers())
    }
}

impl ResponseParser {
    pub fn new(markers: Vec<ReasoningMarker>) -> Self {
        let markers = markers
            .into_iter()
            .filter(|m| !m.open.is_empty() && !m.close.is_empty())
            .collect();
        Self { markers }
    }

    /// Removes reasoning spans and surrounding whitespace.
    ///
    /// Runs until nothing changes, so `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, text: &str) -> String {
        let mut current = text.to_string();
        while let Some(next) = self.strip_first_span(&current) {
            current = next;
        }
        current.trim().to_string()
    }

    /// Never fails: anything undecodable becomes `Resolution::Fallback`.
    ///
    /// Spans outside reasoning are tried first. The raw reply is tried after
    /// that, since a marker inside a JSON string gets cut up by cleaning.
    pub fn parse(&self, raw: &str) -> Resolution {
        let cleaned = self.clean(raw);
        let mut sources = vec![cleaned.as_str()];
        if cleaned != raw.trim() {
            sources.push(raw);
        }

        for source in sources {
            for span in extract_json_spans(source) {
                if let Some(resolution) = decode_span(span) {
                    return resolution;
                }
            }
        }

        tracing::debug!(chars = raw.len(), "no decodable state delta in reply");
        Resolution::Fallback
    }

    /// Removes the earliest marker-delimited span, or returns `None` when
    /// the text holds no marker at all.
    fn strip_first_span(&self, text: &str) -> Option<String> {
        let (pos, marker, is_open) = self
            .markers
            .iter()
            .flat_map(|m| {
                let open = text.find(&m.open).map(|p| (p, m, true));
                let close = text.find(&m.close).map(|p| (p, m, false));
                open.into_iter().chain(close)
            })
            .min_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| marker_len(b.1, b.2).cmp(&marker_len(a.1, a.2)))
            })?;

        let mut out = String::with_capacity(text.len());

        if is_open {
            out.push_str(&text[..pos]);
            let body_start = pos + marker.open.len();
            if let Some(rel) = text[body_start..].find(&marker.close) {
                out.push_str(&text[body_start + rel + marker.close.len()..]);
            }
        } else {
            // Closing marker with no opener: the reply began mid-reasoning.
            out.push_str(&text[pos + marker.close.len()..]);
        }

        Some(out)
    }
}

fn marker_len(marker: &ReasoningMarker, is_open: bool) -> usize {
    if is_open {
        marker.open.len()
    } else {
        marker.close.len()
    }
}

/// Balanced `{...}` spans, ordered by where they open.
///
/// Braces inside JSON string literals do not count. A brace that never
/// closes yields no span, but braces nested inside it are still tried.
/// One pass over the text.
pub fn extract_json_spans(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            // Quotes in prose around the JSON are not string literals.
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    ranges.push((start, i));
                }
            }
            _ => {}
        }
    }

    ranges.sort_unstable_by_key(|&(start, _)| start);
    ranges.into_iter().map(|(start, end)| &text[start..=end]).collect()
}

fn decode_span(span: &str) -> Option<Resolution> {
    let value: Value = serde_json::from_str(span).ok()?;
    let object = value.as_object()?;

    let update_value = object.get("state_update");
    let outcome_value = object.get("outcome_description");
    if update_value.is_none() && outcome_value.is_none() {
        return None;
    }

    let update = match update_value {
        None | Some(Value::Null) => StateDelta::default(),
        Some(Value::Object(fields)) => {
            for key in fields.keys().filter(|k| !DELTA_FIELDS.contains(&k.as_str())) {
                tracing::debug!(field = %key, "ignoring unknown state_update field");
            }
            serde_json::from_value(Value::Object(fields.clone())).ok()?
        }
        Some(_) => return None,
    };

    let outcome = match outcome_value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(_) => return None,
    };

    Some(Resolution::Delta { update, outcome })
}
