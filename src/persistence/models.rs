//! Row structs for the tables in `persistence::schema`, each paired with a
//! conversion to/from its domain type.
//!
//! Grounded in `scheduler/tokio_scheduler.rs`'s `ScheduledJobRow` idiom:
//! a `Queryable + Insertable` struct with a `from_x`/`into_x` pair, enum and
//! struct fields round-tripped through `serde_json` rather than hand-mapped
//! column by column. A handful of tables (`events`, `agent_memory`,
//! `memory_approvals`, and the `agent_freezes`/`hiring_proposals`/
//! `termination_proposals` trio) have no existing domain type elsewhere in
//! the crate to convert from — those are defined here directly, per
//! SPEC_FULL.md §3/§3.1's description of the aggregate.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::types::{ArtifactKind, ChannelKind, Message, MeetingArtifact, MeetingRoom, MessageKind};
use crate::feedback::types::{CapabilityGapReport, FeedbackEntry, ToolRequest};
use crate::governance::types::GovernanceDecision;
use crate::identity::types::{AgentDefinition, RoleKind};
use crate::performance::types::AgentScorecard;
use crate::research::types::{ResearchCycle, ResearchState};
use crate::toolrouter::budget::{AccountType, BudgetAccount};
use crate::toolrouter::router::ToolCall;

use super::schema::*;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn from_json<T: for<'de> Deserialize<'de> + Default>(text: &str) -> T {
    serde_json::from_str(text).unwrap_or_default()
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_rfc3339(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

// ─── agents ──────────────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub department: String,
    pub team: Option<String>,
    pub reports_to: Option<String>,
    pub role: String,
    pub is_lead: i32,
    pub capability_tier: i32,
    pub veto_power: i32,
    pub can_force_retest: i32,
    pub status: String,
    pub reputation_score: f64,
    pub remaining_budget: f64,
    pub created_at: String,
}

impl AgentRow {
    pub fn from_definition(
        id: &str,
        def: &AgentDefinition,
        status: &str,
        reputation_score: f64,
        remaining_budget: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: def.name.clone(),
            name_en: def.name_en.clone(),
            department: def.department.clone(),
            team: def.team.clone(),
            reports_to: def.reports_to.clone(),
            role: to_json(&def.role),
            is_lead: def.is_lead as i32,
            capability_tier: def.capability_tier as i32,
            veto_power: def.veto_power as i32,
            can_force_retest: def.can_force_retest as i32,
            status: status.to_string(),
            reputation_score,
            remaining_budget,
            created_at: rfc3339(created_at),
        }
    }

    pub fn into_definition(self) -> (String, AgentDefinition) {
        let role: RoleKind = from_json::<Option<RoleKind>>(&self.role).unwrap_or(RoleKind::Researcher);
        let def = AgentDefinition {
            name: self.name,
            name_en: self.name_en,
            department: self.department,
            team: self.team,
            reports_to: self.reports_to,
            is_lead: self.is_lead != 0,
            capability_tier: self.capability_tier as u8,
            veto_power: self.veto_power != 0,
            can_force_retest: self.can_force_retest != 0,
            persona_traits: Vec::new(),
            role,
        };
        (self.id, def)
    }
}

// ─── research_cycles ─────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = research_cycles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResearchCycleRow {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub current_state: String,
    pub payload_json: String,
    pub rejections: i32,
    pub history_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ResearchCycleRow {
    pub fn from_cycle(cycle: &ResearchCycle) -> Self {
        Self {
            id: cycle.id.to_string(),
            title: cycle.title.clone(),
            owner: cycle.owner.clone(),
            current_state: to_json(&cycle.current_state),
            payload_json: to_json(&cycle.payload),
            rejections: cycle.rejections as i32,
            history_json: to_json(&cycle.history),
            created_at: rfc3339(cycle.created_at),
            updated_at: rfc3339(cycle.updated_at),
        }
    }

    pub fn into_cycle(self) -> Option<ResearchCycle> {
        Some(ResearchCycle {
            id: Uuid::parse_str(&self.id).ok()?,
            title: self.title,
            owner: self.owner,
            current_state: from_json::<Option<ResearchState>>(&self.current_state)?,
            payload: from_json(&self.payload_json),
            rejections: self.rejections as u32,
            history: from_json(&self.history_json),
            created_at: parse_rfc3339(&self.created_at),
            updated_at: parse_rfc3339(&self.updated_at),
        })
    }
}

// ─── tool_calls ──────────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = tool_calls)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ToolCallRow {
    pub id: String,
    pub agent: String,
    pub tool: String,
    pub args_json: String,
    pub estimated_cost: f64,
    pub actual_cost: Option<f64>,
    pub status: String,
    pub result_json: Option<String>,
    pub error: Option<String>,
    pub data_version_hash: Option<String>,
    pub experiment_id: Option<String>,
    pub timestamp: String,
}

impl ToolCallRow {
    pub fn from_call(call: &ToolCall) -> Self {
        Self {
            id: call.id.to_string(),
            agent: call.agent.clone(),
            tool: call.tool.clone(),
            args_json: to_json(&call.args),
            estimated_cost: call.estimated_cost,
            actual_cost: call.actual_cost,
            status: to_json(&call.status),
            result_json: call.result.as_ref().map(to_json),
            error: call.error.clone(),
            data_version_hash: call.data_version_hash.clone(),
            experiment_id: call.experiment_id.clone(),
            timestamp: rfc3339(call.timestamp),
        }
    }
}

// ─── events (ambient audit trail, no existing domain type) ──────────────

#[derive(Debug, Clone)]
pub struct DomainEvent {
    pub id: Uuid,
    pub kind: String,
    pub agent_id: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: String,
    pub kind: String,
    pub agent_id: Option<String>,
    pub payload_json: String,
    pub created_at: String,
}

impl EventRow {
    pub fn from_event(event: &DomainEvent) -> Self {
        Self {
            id: event.id.to_string(),
            kind: event.kind.clone(),
            agent_id: event.agent_id.clone(),
            payload_json: to_json(&event.payload),
            created_at: rfc3339(event.created_at),
        }
    }
}

// ─── budget_accounts ─────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = budget_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetAccountRow {
    pub id: String,
    pub account_type: String,
    pub base_weekly_points: f64,
    pub current_period_start: String,
    pub current_period_points: f64,
    pub points_spent: f64,
}

impl BudgetAccountRow {
    pub fn from_account(account: &BudgetAccount) -> Self {
        Self {
            id: account.id.clone(),
            account_type: to_json(&account.account_type),
            base_weekly_points: account.base_weekly_points,
            current_period_start: rfc3339(account.current_period_start),
            current_period_points: account.current_period_points,
            points_spent: account.points_spent,
        }
    }

    pub fn into_account(self) -> BudgetAccount {
        BudgetAccount {
            id: self.id,
            account_type: from_json::<Option<AccountType>>(&self.account_type).unwrap_or(AccountType::Agent),
            base_weekly_points: self.base_weekly_points,
            current_period_start: parse_rfc3339(&self.current_period_start),
            current_period_points: self.current_period_points,
            points_spent: self.points_spent,
        }
    }
}

// ─── messages ────────────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MessageRow {
    pub id: String,
    pub channel_kind: String,
    pub channel_id: Option<String>,
    pub from_agent: String,
    pub to_agent: Option<String>,
    pub subject: String,
    pub content: String,
    pub kind: String,
    pub metadata_json: String,
    pub priority: i32,
    pub requires_ack: i32,
    pub created_at: String,
}

impl MessageRow {
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            channel_kind: to_json(&message.channel_kind),
            channel_id: message.channel_id.clone(),
            from_agent: message.from.clone(),
            to_agent: message.to.clone(),
            subject: message.subject.clone(),
            content: message.content.clone(),
            kind: to_json(&message.kind),
            metadata_json: to_json(&message.metadata),
            priority: message.priority,
            requires_ack: message.requires_ack as i32,
            created_at: rfc3339(message.created_at),
        }
    }

    pub fn into_message(self) -> Option<Message> {
        Some(Message {
            id: Uuid::parse_str(&self.id).ok()?,
            channel_kind: from_json::<Option<ChannelKind>>(&self.channel_kind)?,
            channel_id: self.channel_id,
            from: self.from_agent,
            to: self.to_agent,
            subject: self.subject,
            content: self.content,
            kind: from_json::<Option<MessageKind>>(&self.kind)?,
            metadata: from_json(&self.metadata_json),
            priority: self.priority,
            requires_ack: self.requires_ack != 0,
            created_at: parse_rfc3339(&self.created_at),
        })
    }
}

// ─── meeting_requests / meeting_artifacts ────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = meeting_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MeetingRequestRow {
    pub id: String,
    pub title: String,
    pub host: String,
    pub participants_json: String,
    pub started_at: String,
    pub ended_at: Option<String>,
}

impl MeetingRequestRow {
    pub fn from_room(room: &MeetingRoom) -> Self {
        Self {
            id: room.id.clone(),
            title: room.title.clone(),
            host: room.host.clone(),
            participants_json: to_json(&room.participants),
            started_at: rfc3339(room.started_at),
            ended_at: room.ended_at.map(rfc3339),
        }
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = meeting_artifacts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MeetingArtifactRow {
    pub id: String,
    pub room_id: String,
    pub kind: String,
    pub title: Option<String>,
    pub data_json: String,
    pub presenter: String,
    pub created_at: String,
}

impl MeetingArtifactRow {
    pub fn from_artifact(artifact: &MeetingArtifact) -> Self {
        Self {
            id: artifact.id.to_string(),
            room_id: artifact.room_id.clone(),
            kind: to_json(&artifact.kind),
            title: artifact.title.clone(),
            data_json: to_json(&artifact.data),
            presenter: artifact.presenter.clone(),
            created_at: rfc3339(artifact.created_at),
        }
    }

    pub fn into_artifact(self) -> Option<MeetingArtifact> {
        Some(MeetingArtifact {
            id: Uuid::parse_str(&self.id).ok()?,
            room_id: self.room_id,
            kind: from_json::<Option<ArtifactKind>>(&self.kind)?,
            title: self.title,
            data: from_json(&self.data_json),
            presenter: self.presenter,
            created_at: parse_rfc3339(&self.created_at),
        })
    }
}

// ─── reputation_scores ───────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = reputation_scores)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReputationScoreRow {
    pub id: String,
    pub agent_id: String,
    pub period_start: String,
    pub period_end: String,
    pub job_level: String,
    pub kpis_json: String,
    pub qualitative_feedback_json: String,
    pub overall_score: f64,
    pub rating: String,
    pub promotion_eligible: i32,
    pub demotion_risk: i32,
}

impl ReputationScoreRow {
    pub fn from_scorecard(card: &AgentScorecard) -> Self {
        Self {
            id: format!("{}:{}", card.agent_id, card.period_start.to_rfc3339()),
            agent_id: card.agent_id.clone(),
            period_start: rfc3339(card.period_start),
            period_end: rfc3339(card.period_end),
            job_level: to_json(&card.job_level),
            kpis_json: to_json(&card.kpis),
            qualitative_feedback_json: to_json(&card.qualitative_feedback),
            overall_score: card.overall_score,
            rating: to_json(&card.rating),
            promotion_eligible: card.promotion_eligible as i32,
            demotion_risk: card.demotion_risk as i32,
        }
    }
}

// ─── feedback_entries ────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = feedback_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedbackEntryRow {
    pub id: String,
    pub submitted_by: String,
    pub category: String,
    pub title: Option<String>,
    pub content: String,
    pub urgency: String,
    pub refs_json: String,
    pub source: String,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

impl FeedbackEntryRow {
    pub fn from_entry(entry: &FeedbackEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            submitted_by: entry.submitted_by.clone(),
            category: to_json(&entry.category),
            title: entry.title.clone(),
            content: entry.content.clone(),
            urgency: to_json(&entry.urgency),
            refs_json: to_json(&entry.refs),
            source: to_json(&entry.source),
            status: to_json(&entry.status),
            reviewed_by: entry.reviewed_by.clone(),
            review_notes: entry.review_notes.clone(),
            created_at: rfc3339(entry.created_at),
            reviewed_at: entry.reviewed_at.map(rfc3339),
        }
    }
}

// ─── tool_requests ───────────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tool_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ToolRequestRow {
    pub id: String,
    pub tool_name: String,
    pub reason: String,
    pub expected_benefit: String,
    pub request_count: i32,
    pub urgency: String,
    pub feasibility_score: Option<f64>,
    pub priority_score: f64,
    pub created_at: String,
}

impl ToolRequestRow {
    pub fn from_request(request: &ToolRequest) -> Self {
        Self {
            id: request.id.to_string(),
            tool_name: request.tool_name.clone(),
            reason: request.reason.clone(),
            expected_benefit: request.expected_benefit.clone(),
            request_count: request.request_count as i32,
            urgency: to_json(&request.urgency),
            feasibility_score: request.feasibility_score,
            priority_score: request.priority_score,
            created_at: rfc3339(request.created_at),
        }
    }
}

// ─── governance_alerts ───────────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = governance_alerts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GovernanceAlertRow {
    pub id: String,
    pub rule_id: String,
    pub decision_type: String,
    pub participants_json: String,
    pub summary: String,
    pub rationale: String,
    pub decided_at: String,
}

impl GovernanceAlertRow {
    pub fn from_decision(decision: &GovernanceDecision) -> Self {
        Self {
            id: decision.id.to_string(),
            rule_id: decision.rule_id.to_string(),
            decision_type: decision.decision_type.clone(),
            participants_json: to_json(&decision.participants),
            summary: decision.summary.clone(),
            rationale: decision.rationale.clone(),
            decided_at: rfc3339(decision.decided_at),
        }
    }
}

// ─── agent_freezes / hiring_proposals / termination_proposals ───────────
//
// Modeled uniformly as a single `GovernanceProposal` shape (no behavior
// beyond the row's semantic label), each persisted to its own table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalKind {
    Freeze,
    Hiring,
    Termination,
}

#[derive(Debug, Clone)]
pub struct GovernanceProposal {
    pub id: Uuid,
    pub kind: ProposalKind,
    /// Agent id for a freeze/termination, proposed role for a hiring proposal.
    pub subject: String,
    pub reason: String,
    pub proposed_by: String,
    pub status: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

macro_rules! proposal_row {
    ($row:ident, $table:ident) => {
        #[derive(Queryable, Selectable, Insertable)]
        #[diesel(table_name = $table)]
        #[diesel(check_for_backend(diesel::sqlite::Sqlite))]
        pub struct $row {
            pub id: String,
            pub subject: String,
            pub reason: String,
            pub proposed_by: String,
            pub status: String,
            pub decided_by: Option<String>,
            pub decided_at: Option<String>,
            pub created_at: String,
        }

        impl $row {
            pub fn from_proposal(proposal: &GovernanceProposal) -> Self {
                Self {
                    id: proposal.id.to_string(),
                    subject: proposal.subject.clone(),
                    reason: proposal.reason.clone(),
                    proposed_by: proposal.proposed_by.clone(),
                    status: proposal.status.clone(),
                    decided_by: proposal.decided_by.clone(),
                    decided_at: proposal.decided_at.map(rfc3339),
                    created_at: rfc3339(proposal.created_at),
                }
            }
        }
    };
}

proposal_row!(AgentFreezeRow, agent_freezes);
proposal_row!(HiringProposalRow, hiring_proposals);
proposal_row!(TerminationProposalRow, termination_proposals);

// ─── capability_gap_reports ──────────────────────────────────────────────

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = capability_gap_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CapabilityGapReportRow {
    pub id: String,
    pub period_start: String,
    pub period_end: String,
    pub capability_gaps_json: String,
    pub deprecation_candidates_json: String,
    pub development_priorities_json: String,
    pub generated_at: String,
}

impl CapabilityGapReportRow {
    pub fn from_report(report: &CapabilityGapReport) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            period_start: rfc3339(report.period_start),
            period_end: rfc3339(report.period_end),
            capability_gaps_json: to_json(&report.capability_gaps),
            deprecation_candidates_json: to_json(&report.deprecation_candidates),
            development_priorities_json: to_json(&report.development_priorities),
            generated_at: rfc3339(report.generated_at),
        }
    }
}

// ─── agent_memory / memory_approvals (no existing domain type) ─────────

/// §3's `Memory` entity: an agent-authored note with mandatory
/// provenance refs and scope-gated approval. No typed equivalent exists
/// elsewhere in the crate yet — `toolrouter::handlers::memory`'s
/// `memory.write` handler validates the same shape but returns a loose
/// `serde_json::Value`, since it has no persistence to hand the typed
/// form to until now.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub agent_id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub scope: String,
    pub confidence: f64,
    pub refs: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub approval_status: String,
    pub ttl_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = agent_memory)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AgentMemoryRow {
    pub id: String,
    pub agent_id: String,
    pub content: String,
    pub tags_json: String,
    pub scope: String,
    pub confidence: f64,
    pub refs_json: String,
    pub embedding_json: Option<String>,
    pub approval_status: String,
    pub ttl_seconds: Option<i32>,
    pub created_at: String,
}

impl AgentMemoryRow {
    pub fn from_record(record: &MemoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            agent_id: record.agent_id.clone(),
            content: record.content.clone(),
            tags_json: to_json(&record.tags),
            scope: record.scope.clone(),
            confidence: record.confidence,
            refs_json: to_json(&record.refs),
            embedding_json: record.embedding.as_ref().map(to_json),
            approval_status: record.approval_status.clone(),
            ttl_seconds: record.ttl_seconds.map(|t| t as i32),
            created_at: rfc3339(record.created_at),
        }
    }

    pub fn into_record(self) -> Option<MemoryRecord> {
        Some(MemoryRecord {
            id: Uuid::parse_str(&self.id).ok()?,
            agent_id: self.agent_id,
            content: self.content,
            tags: from_json(&self.tags_json),
            scope: self.scope,
            confidence: self.confidence,
            refs: from_json(&self.refs_json),
            embedding: self.embedding_json.as_deref().map(from_json),
            approval_status: self.approval_status,
            ttl_seconds: self.ttl_seconds.map(|t| t as i64),
            created_at: parse_rfc3339(&self.created_at),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryApproval {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub approver_id: String,
    pub approved: bool,
    pub reason: Option<String>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = memory_approvals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MemoryApprovalRow {
    pub id: String,
    pub memory_id: String,
    pub approver_id: String,
    pub approved: i32,
    pub reason: Option<String>,
    pub decided_at: String,
}

impl MemoryApprovalRow {
    pub fn from_approval(approval: &MemoryApproval) -> Self {
        Self {
            id: approval.id.to_string(),
            memory_id: approval.memory_id.to_string(),
            approver_id: approval.approver_id.clone(),
            approved: approval.approved as i32,
            reason: approval.reason.clone(),
            decided_at: rfc3339(approval.decided_at),
        }
    }
}
