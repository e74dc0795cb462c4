//! `TopicManager` (§4.6): seconding, auto-escalation, and scheduling a
//! meeting once a topic crosses its required-seconds threshold.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use super::types::{Topic, TopicPriority, TopicSecond, TopicStatus};

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("no such topic: {0}")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondOutcome {
    /// Rejected: the supporter is the topic's own proposer.
    ProposerForbidden,
    /// No-op: this agent already seconded the topic.
    AlreadySeconded,
    /// Accepted, threshold not yet reached.
    Accepted,
    /// Accepted and the topic just crossed its required-seconds threshold.
    Scheduled,
}

/// Seconding roles that can auto-escalate a topic's priority (§4.6's
/// auto-escalation rule). Derived from the `role=lead`/`role=director`
/// distinction in the original seconding API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeconderLevel {
    Regular,
    Lead,
    Director,
}

pub struct TopicManager {
    topics: DashMap<Uuid, Topic>,
}

impl Default for TopicManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicManager {
    pub fn new() -> Self {
        Self { topics: DashMap::new() }
    }

    pub fn propose(&self, topic: Topic) -> Uuid {
        let id = topic.id;
        self.topics.insert(id, topic);
        id
    }

    pub fn get(&self, topic_id: Uuid) -> Option<Topic> {
        self.topics.get(&topic_id).map(|t| t.clone())
    }

    /// Per §4.6: fails (no-op) if the supporter is the proposer, fails
    /// (no-op) if already seconded; otherwise appends, checks for
    /// auto-escalation, and schedules a meeting once the threshold is
    /// crossed. Serialized per-topic by `DashMap`'s per-entry locking, so
    /// the first `AddSecond` to cross the threshold is the one that
    /// performs the SCHEDULED transition.
    pub fn add_second(
        &self,
        topic_id: Uuid,
        supporter_id: &str,
        reason: &str,
        level: SeconderLevel,
        now: DateTime<Utc>,
    ) -> Result<SecondOutcome, TopicError> {
        let mut entry = self.topics.get_mut(&topic_id).ok_or(TopicError::NotFound(topic_id))?;

        if supporter_id == entry.proposer_id {
            return Ok(SecondOutcome::ProposerForbidden);
        }
        if entry.seconds.iter().any(|s| s.agent_id == supporter_id) {
            return Ok(SecondOutcome::AlreadySeconded);
        }

        entry.seconds.push(TopicSecond {
            agent_id: supporter_id.to_string(),
            reason: reason.to_string(),
            timestamp: now,
        });
        entry.updated_at = now;

        Self::check_auto_escalation(&mut entry, level, now);

        if entry.is_seconded()
            && matches!(entry.status, TopicStatus::Seconding | TopicStatus::Proposed)
        {
            Self::schedule_meeting(&mut entry, now);
            return Ok(SecondOutcome::Scheduled);
        }

        Ok(SecondOutcome::Accepted)
    }

    fn check_auto_escalation(topic: &mut Topic, level: SeconderLevel, now: DateTime<Utc>) {
        if level == SeconderLevel::Lead && topic.priority == TopicPriority::Normal {
            let lead_seconds = topic.seconds.iter().filter(|s| s.agent_id.to_lowercase().contains("lead")).count();
            if lead_seconds >= 2 {
                topic.priority = TopicPriority::High;
                topic.expires_at = Some(now + Duration::hours(TopicPriority::High.expiry_hours()));
            }
        }

        if level == SeconderLevel::Director
            && matches!(topic.priority, TopicPriority::Normal | TopicPriority::High)
        {
            topic.priority = TopicPriority::Urgent;
            topic.expires_at = Some(now + Duration::hours(TopicPriority::Urgent.expiry_hours()));
        }
    }

    fn schedule_meeting(topic: &mut Topic, now: DateTime<Utc>) {
        topic.status = TopicStatus::Scheduled;
        topic.scheduled_at = Some(
            now + match topic.priority {
                TopicPriority::Critical => Duration::minutes(15),
                TopicPriority::Urgent => Duration::hours(1),
                TopicPriority::High => Duration::hours(4),
                _ => Duration::hours(24),
            },
        );

        let mut participants: HashSet<String> = topic.suggested_participants.iter().cloned().collect();
        participants.insert(topic.proposer_id.clone());
        for second in &topic.seconds {
            participants.insert(second.agent_id.clone());
        }
        topic.actual_participants = participants.into_iter().collect();
    }

    pub fn resolve(&self, topic_id: Uuid, resolution: impl Into<String>, now: DateTime<Utc>) -> Result<(), TopicError> {
        let mut entry = self.topics.get_mut(&topic_id).ok_or(TopicError::NotFound(topic_id))?;
        entry.status = TopicStatus::Resolved;
        entry.resolution = Some(resolution.into());
        entry.updated_at = now;
        Ok(())
    }

    pub fn reject(&self, topic_id: Uuid, rejector_id: &str, reason: &str, now: DateTime<Utc>) -> Result<(), TopicError> {
        let mut entry = self.topics.get_mut(&topic_id).ok_or(TopicError::NotFound(topic_id))?;
        entry.status = TopicStatus::Rejected;
        entry.resolution = Some(format!("rejected by {rejector_id}: {reason}"));
        entry.updated_at = now;
        Ok(())
    }

    /// Expires any `Seconding`/`Proposed` topic whose `expires_at` has
    /// passed, returning the topics that were just expired.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Vec<Topic> {
        let overdue: Vec<Uuid> = self
            .topics
            .iter()
            .filter(|e| {
                matches!(e.status, TopicStatus::Seconding | TopicStatus::Proposed)
                    && e.expires_at.is_some_and(|t| t < now)
            })
            .map(|e| *e.key())
            .collect();
        overdue
            .into_iter()
            .filter_map(|id| {
                let mut entry = self.topics.get_mut(&id)?;
                entry.status = TopicStatus::Expired;
                Some(entry.clone())
            })
            .collect()
    }

    pub fn active_topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.iter().map(|e| e.clone()).collect();
        topics.sort_by_key(|t| (priority_rank(t.priority), t.created_at));
        topics
    }
}

fn priority_rank(p: TopicPriority) -> u8 {
    match p {
        TopicPriority::Critical => 0,
        TopicPriority::Urgent => 1,
        TopicPriority::High => 2,
        TopicPriority::Normal => 3,
        TopicPriority::Low => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::types::{TopicKind, new_topic};

    fn topic(proposer: &str, kind: TopicKind, now: DateTime<Utc>) -> Topic {
        new_topic(proposer, "research", "t", "d", kind, TopicPriority::Normal, None, now)
    }

    #[test]
    fn proposer_cannot_second_own_topic() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Strategy, now));
        let outcome = mgr.add_second(id, "r1", "agree", SeconderLevel::Regular, now).unwrap();
        assert_eq!(outcome, SecondOutcome::ProposerForbidden);
    }

    #[test]
    fn duplicate_second_is_idempotent() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Strategy, now));
        mgr.add_second(id, "r2", "agree", SeconderLevel::Regular, now).unwrap();
        let outcome = mgr.add_second(id, "r2", "agree again", SeconderLevel::Regular, now).unwrap();
        assert_eq!(outcome, SecondOutcome::AlreadySeconded);
        assert_eq!(mgr.get(id).unwrap().second_count(), 1);
    }

    #[test]
    fn crossing_threshold_schedules_meeting() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Strategy, now)); // requires 2 seconds
        mgr.add_second(id, "r2", "agree", SeconderLevel::Regular, now).unwrap();
        let outcome = mgr.add_second(id, "r3", "agree", SeconderLevel::Regular, now).unwrap();
        assert_eq!(outcome, SecondOutcome::Scheduled);
        let t = mgr.get(id).unwrap();
        assert_eq!(t.status, TopicStatus::Scheduled);
        assert!(t.scheduled_at.is_some());
        assert!(t.actual_participants.contains(&"r1".to_string()));
    }

    #[test]
    fn further_seconds_after_scheduled_are_still_accepted_but_do_not_revert_status() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Risk, now)); // requires 1 second
        mgr.add_second(id, "r2", "agree", SeconderLevel::Regular, now).unwrap();
        assert_eq!(mgr.get(id).unwrap().status, TopicStatus::Scheduled);
    }

    #[test]
    fn two_lead_seconds_escalate_to_high() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Governance, now)); // requires 3 seconds
        mgr.add_second(id, "lead_alpha", "agree", SeconderLevel::Lead, now).unwrap();
        mgr.add_second(id, "lead_beta", "agree", SeconderLevel::Lead, now).unwrap();
        assert_eq!(mgr.get(id).unwrap().priority, TopicPriority::High);
    }

    #[test]
    fn director_second_escalates_to_urgent() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let id = mgr.propose(topic("r1", TopicKind::Governance, now));
        mgr.add_second(id, "director_alpha", "agree", SeconderLevel::Director, now).unwrap();
        assert_eq!(mgr.get(id).unwrap().priority, TopicPriority::Urgent);
    }

    #[test]
    fn expire_overdue_marks_expired() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let mut t = topic("r1", TopicKind::Strategy, now - Duration::hours(100));
        t.expires_at = Some(now - Duration::hours(1));
        let id = mgr.propose(t);
        let expired = mgr.expire_overdue(now);
        assert_eq!(expired.len(), 1);
        assert_eq!(mgr.get(id).unwrap().status, TopicStatus::Expired);
    }

    #[test]
    fn emergency_topic_needs_no_seconds() {
        let mgr = TopicManager::new();
        let now = Utc::now();
        let t = topic("r1", TopicKind::Emergency, now);
        assert_eq!(t.status, TopicStatus::Scheduled);
        mgr.propose(t);
    }
}
