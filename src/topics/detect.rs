//! `DetectIntention` and `ExplicitIntention` (§4.6): turning an agent's
//! free-text thought or message into a topic proposal.

use chrono::{DateTime, Utc};

use super::keywords::{ALL_KEYWORD_KINDS, keywords_for, urgency_priority};
use super::types::{Topic, TopicKind, TopicPriority, new_topic};

const MIN_MATCHES: usize = 2;
const TITLE_MAX_CHARS: usize = 50;
const DESCRIPTION_MAX_CHARS: usize = 500;

fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    let count = s.chars().count();
    if count <= max {
        (s.to_string(), false)
    } else {
        (s.chars().take(max).collect(), true)
    }
}

fn kind_tag(kind: TopicKind) -> &'static str {
    match kind {
        TopicKind::Risk => "[risk]",
        TopicKind::Strategy => "[proposal]",
        TopicKind::Process => "[process]",
        TopicKind::Emergency => "[urgent]",
        TopicKind::Data => "[data]",
        TopicKind::Trading => "[trading]",
        TopicKind::Governance => "[governance]",
        TopicKind::Organization => "[org]",
    }
}

fn extract_title(text: &str, kind: TopicKind) -> String {
    let first_sentence = text
        .split(['。', '\n'])
        .next()
        .unwrap_or(text);
    let (truncated, was_truncated) = truncate_chars(first_sentence, TITLE_MAX_CHARS);
    let body = if was_truncated { format!("{truncated}...") } else { truncated };
    format!("{} {}", kind_tag(kind), body)
}

/// Scans `text` against the keyword table and, if some kind crosses the
/// 2-match threshold, produces a proposed topic. Returns `None` below
/// threshold, matching the original detector's "too low a match rate,
/// don't create a topic" behavior.
pub fn detect_intention(
    agent_id: &str,
    department: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Option<Topic> {
    let text_lower = text.to_lowercase();

    let mut best: Option<(TopicKind, usize)> = None;
    for &kind in ALL_KEYWORD_KINDS {
        let matches = keywords_for(kind).iter().filter(|kw| text_lower.contains(*kw)).count();
        let is_better = match &best {
            Some((_, best_matches)) => matches > *best_matches,
            None => true,
        };
        if is_better {
            best = Some((kind, matches));
        }
    }

    let (kind, matches) = best?;
    if matches < MIN_MATCHES {
        return None;
    }

    let priority = urgency_priority(&text_lower);
    let (description, _) = truncate_chars(text, DESCRIPTION_MAX_CHARS);

    Some(new_topic(
        agent_id,
        department,
        extract_title(text, kind),
        description,
        kind,
        priority,
        None,
        now,
    ))
}

#[derive(Debug, Clone, Default)]
pub struct ExplicitTopicRequest {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub participants: Option<String>,
    pub urgency: Option<String>,
}

/// Parses a `[PROPOSE_TOPIC]`-marked message for `key: value` lines. Only
/// fires when the marker is present; a message with no marker is left to
/// `detect_intention`'s keyword scan instead.
pub fn explicit_intention(text: &str) -> Option<ExplicitTopicRequest> {
    if !text.contains("[PROPOSE_TOPIC]") && !text.contains("[提议讨论]") {
        return None;
    }

    let mut req = ExplicitTopicRequest::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':').or_else(|| line.split_once('：')) else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key {
            "kind" | "topic_type" | "议题类型" => req.kind = Some(value),
            "title" | "议题标题" => req.title = Some(value),
            "description" | "议题描述" => req.description = Some(value),
            "participants" | "建议参与者" => req.participants = Some(value),
            "urgency" | "紧急程度" => req.urgency = Some(value),
            _ => {}
        }
    }

    req.title.is_some().then_some(req)
}

pub fn parse_topic_kind(s: &str) -> Option<TopicKind> {
    match s.to_lowercase().as_str() {
        "strategy" => Some(TopicKind::Strategy),
        "risk" => Some(TopicKind::Risk),
        "data" => Some(TopicKind::Data),
        "trading" => Some(TopicKind::Trading),
        "governance" => Some(TopicKind::Governance),
        "process" => Some(TopicKind::Process),
        "organization" => Some(TopicKind::Organization),
        "emergency" => Some(TopicKind::Emergency),
        _ => None,
    }
}

pub fn parse_priority(s: &str) -> Option<TopicPriority> {
    match s.to_lowercase().as_str() {
        "low" => Some(TopicPriority::Low),
        "normal" | "medium" => Some(TopicPriority::Normal),
        "high" => Some(TopicPriority::High),
        "urgent" => Some(TopicPriority::Urgent),
        "critical" => Some(TopicPriority::Critical),
        _ => None,
    }
}
