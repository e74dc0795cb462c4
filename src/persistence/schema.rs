//! Diesel table definitions mirroring `migrations/2024-01-01-000000_initial_schema`.
//!
//! Hand-written rather than `diesel print-schema`-generated, since this
//! crate's migration is hand-written too; kept in lockstep with it.

diesel::table! {
    agents (id) {
        id -> Text,
        name -> Text,
        name_en -> Text,
        department -> Text,
        team -> Nullable<Text>,
        reports_to -> Nullable<Text>,
        role -> Text,
        is_lead -> Integer,
        capability_tier -> Integer,
        veto_power -> Integer,
        can_force_retest -> Integer,
        status -> Text,
        reputation_score -> Double,
        remaining_budget -> Double,
        created_at -> Text,
    }
}

diesel::table! {
    research_cycles (id) {
        id -> Text,
        title -> Text,
        owner -> Text,
        current_state -> Text,
        payload_json -> Text,
        rejections -> Integer,
        history_json -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tool_calls (id) {
        id -> Text,
        agent -> Text,
        tool -> Text,
        args_json -> Text,
        estimated_cost -> Double,
        actual_cost -> Nullable<Double>,
        status -> Text,
        result_json -> Nullable<Text>,
        error -> Nullable<Text>,
        data_version_hash -> Nullable<Text>,
        experiment_id -> Nullable<Text>,
        timestamp -> Text,
    }
}

diesel::table! {
    events (id) {
        id -> Text,
        kind -> Text,
        agent_id -> Nullable<Text>,
        payload_json -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    budget_accounts (id) {
        id -> Text,
        account_type -> Text,
        base_weekly_points -> Double,
        current_period_start -> Text,
        current_period_points -> Double,
        points_spent -> Double,
    }
}

diesel::table! {
    messages (id) {
        id -> Text,
        channel_kind -> Text,
        channel_id -> Nullable<Text>,
        from_agent -> Text,
        to_agent -> Nullable<Text>,
        subject -> Text,
        content -> Text,
        kind -> Text,
        metadata_json -> Text,
        priority -> Integer,
        requires_ack -> Integer,
        created_at -> Text,
    }
}

diesel::table! {
    meeting_requests (id) {
        id -> Text,
        title -> Text,
        host -> Text,
        participants_json -> Text,
        started_at -> Text,
        ended_at -> Nullable<Text>,
    }
}

diesel::table! {
    meeting_artifacts (id) {
        id -> Text,
        room_id -> Text,
        kind -> Text,
        title -> Nullable<Text>,
        data_json -> Text,
        presenter -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    reputation_scores (id) {
        id -> Text,
        agent_id -> Text,
        period_start -> Text,
        period_end -> Text,
        job_level -> Text,
        kpis_json -> Text,
        qualitative_feedback_json -> Text,
        overall_score -> Double,
        rating -> Text,
        promotion_eligible -> Integer,
        demotion_risk -> Integer,
    }
}

diesel::table! {
    feedback_entries (id) {
        id -> Text,
        submitted_by -> Text,
        category -> Text,
        title -> Nullable<Text>,
        content -> Text,
        urgency -> Text,
        refs_json -> Text,
        source -> Text,
        status -> Text,
        reviewed_by -> Nullable<Text>,
        review_notes -> Nullable<Text>,
        created_at -> Text,
        reviewed_at -> Nullable<Text>,
    }
}

diesel::table! {
    tool_requests (id) {
        id -> Text,
        tool_name -> Text,
        reason -> Text,
        expected_benefit -> Text,
        request_count -> Integer,
        urgency -> Text,
        feasibility_score -> Nullable<Double>,
        priority_score -> Double,
        created_at -> Text,
    }
}

diesel::table! {
    governance_alerts (id) {
        id -> Text,
        rule_id -> Text,
        decision_type -> Text,
        participants_json -> Text,
        summary -> Text,
        rationale -> Text,
        decided_at -> Text,
    }
}

diesel::table! {
    agent_freezes (id) {
        id -> Text,
        subject -> Text,
        reason -> Text,
        proposed_by -> Text,
        status -> Text,
        decided_by -> Nullable<Text>,
        decided_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    hiring_proposals (id) {
        id -> Text,
        subject -> Text,
        reason -> Text,
        proposed_by -> Text,
        status -> Text,
        decided_by -> Nullable<Text>,
        decided_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    termination_proposals (id) {
        id -> Text,
        subject -> Text,
        reason -> Text,
        proposed_by -> Text,
        status -> Text,
        decided_by -> Nullable<Text>,
        decided_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    capability_gap_reports (id) {
        id -> Text,
        period_start -> Text,
        period_end -> Text,
        capability_gaps_json -> Text,
        deprecation_candidates_json -> Text,
        development_priorities_json -> Text,
        generated_at -> Text,
    }
}

diesel::table! {
    agent_memory (id) {
        id -> Text,
        agent_id -> Text,
        content -> Text,
        tags_json -> Text,
        scope -> Text,
        confidence -> Double,
        refs_json -> Text,
        embedding_json -> Nullable<Text>,
        approval_status -> Text,
        ttl_seconds -> Nullable<Integer>,
        created_at -> Text,
    }
}

diesel::table! {
    memory_approvals (id) {
        id -> Text,
        memory_id -> Text,
        approver_id -> Text,
        approved -> Integer,
        reason -> Nullable<Text>,
        decided_at -> Text,
    }
}
