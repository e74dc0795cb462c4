//! [`ToolRouter`]: permission checks, budget accounting, and audit logging
//! around dispatch to a category [`ToolHandler`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::budget::{BudgetError, BudgetLedger};
use super::handler::{ToolContext, ToolResult};
use super::permissions::PermissionsFile;
use super::registry::ToolRegistry;
#[cfg(feature = "persistence")]
use crate::persistence::{DbPool, repo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Requested,
    Rejected,
    Executing,
    Completed,
    Failed,
}

/// Append-only audit record for a single tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub id: Uuid,
    pub agent: String,
    pub tool: String,
    pub args: Value,
    pub estimated_cost: f64,
    pub actual_cost: Option<f64>,
    pub status: ToolCallStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub data_version_hash: Option<String>,
    pub experiment_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("no handler registered for tool '{0}'s category")]
    ToolNotInitialized(String),
    #[error("agent '{agent}' may not invoke '{tool}' from department '{department}'")]
    PermissionDenied {
        agent: String,
        tool: String,
        department: String,
    },
    #[error("parameter cap exceeded for '{tool}': {detail}")]
    ParameterCapExceeded { tool: String, detail: String },
    #[error("insufficient budget: {0}")]
    InsufficientBudget(#[from] BudgetErrorWrapper),
    #[error("'{tool}' requires approval (cost {cost} > threshold); approvers: {approvers:?}")]
    ApprovalRequired {
        tool: String,
        cost: f64,
        approvers: Vec<String>,
    },
}

/// Wraps [`BudgetError`] so `RouterError` can derive `#[from]` without
/// taking on budget-ledger-specific variants it doesn't need (`NoAccount`
/// is surfaced as-is; only the message is carried through).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BudgetErrorWrapper(pub String);

impl From<BudgetError> for BudgetErrorWrapper {
    fn from(e: BudgetError) -> Self {
        BudgetErrorWrapper(e.to_string())
    }
}

pub struct ToolRouter {
    registry: Arc<ToolRegistry>,
    permissions: PermissionsFile,
    ledger: Arc<BudgetLedger>,
    audit_log: Mutex<Vec<ToolCall>>,
    #[cfg(feature = "persistence")]
    pool: Option<Arc<DbPool>>,
}

impl ToolRouter {
    pub fn new(registry: Arc<ToolRegistry>, permissions: PermissionsFile, ledger: Arc<BudgetLedger>) -> Self {
        Self {
            registry,
            permissions,
            ledger,
            audit_log: Mutex::new(Vec::new()),
            #[cfg(feature = "persistence")]
            pool: None,
        }
    }

    /// Mirrors every audit-log row onto `pool`'s `tool_calls` table, the
    /// append-only record SPEC_FULL.md §4.13 requires durable before
    /// `execute` returns.
    #[cfg(feature = "persistence")]
    pub fn new_with_persistence(
        registry: Arc<ToolRegistry>,
        permissions: PermissionsFile,
        ledger: Arc<BudgetLedger>,
        pool: Option<Arc<DbPool>>,
    ) -> Self {
        Self {
            registry,
            permissions,
            ledger,
            audit_log: Mutex::new(Vec::new()),
            pool,
        }
    }

    pub fn audit_log(&self) -> Vec<ToolCall> {
        self.audit_log.lock().clone()
    }

    fn push_audit(&self, call: ToolCall) {
        #[cfg(feature = "persistence")]
        if let Some(pool) = &self.pool {
            repo::insert_tool_call(pool, &call);
        }
        self.audit_log.lock().push(call);
    }

    /// Writes the `rejected` audit row §7 requires for `PermissionDenied`
    /// and `InsufficientBudget` before the error is returned to the caller.
    fn push_rejected(
        &self,
        agent_id: &str,
        tool_name: &str,
        args: &Value,
        cost: f64,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.push_audit(ToolCall {
            id: Uuid::new_v4(),
            agent: agent_id.to_string(),
            tool: tool_name.to_string(),
            args: args.clone(),
            estimated_cost: cost,
            actual_cost: None,
            status: ToolCallStatus::Rejected,
            result: None,
            error: Some(error.into()),
            data_version_hash: None,
            experiment_id: None,
            timestamp: now,
        });
    }

    /// Steps 1-7 of the router's execute flow: lookup, permission/cap check,
    /// cost estimation, approval-threshold check, dispatch, and
    /// deduct-iff-success.
    pub async fn execute(
        &self,
        agent_id: &str,
        department: &str,
        tool_name: &str,
        args: Value,
        meeting_room_id: Option<String>,
        research_cycle_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ToolResult, RouterError> {
        let schema = self
            .registry
            .schema(tool_name)
            .ok_or_else(|| RouterError::UnknownTool(tool_name.to_string()))?
            .clone();

        if let Some(allowed) = &schema.allowed_departments
            && !allowed.iter().any(|d| d == department)
        {
            self.push_rejected(agent_id, tool_name, &args, 0.0, "department not permitted", now);
            return Err(RouterError::PermissionDenied {
                agent: agent_id.to_string(),
                tool: tool_name.to_string(),
                department: department.to_string(),
            });
        }

        if let Some(perm) = self.permissions.get(tool_name) {
            if !perm.permits(agent_id, department) {
                self.push_rejected(agent_id, tool_name, &args, 0.0, "permission denied", now);
                return Err(RouterError::PermissionDenied {
                    agent: agent_id.to_string(),
                    tool: tool_name.to_string(),
                    department: department.to_string(),
                });
            }
            if let Some(max_limit) = perm.max_limit
                && let Some(limit) = args.get("limit").and_then(Value::as_u64)
                && limit > max_limit
            {
                let detail = format!("limit {limit} exceeds max_limit {max_limit}");
                self.push_rejected(agent_id, tool_name, &args, 0.0, detail.clone(), now);
                return Err(RouterError::ParameterCapExceeded { tool: tool_name.to_string(), detail });
            }
            if !perm.allowed_timeframes.is_empty()
                && let Some(timeframe) = args.get("timeframe").and_then(Value::as_str)
                && !perm.allowed_timeframes.iter().any(|t| t == timeframe)
            {
                let detail = format!("timeframe '{timeframe}' not in allowed_timeframes");
                self.push_rejected(agent_id, tool_name, &args, 0.0, detail.clone(), now);
                return Err(RouterError::ParameterCapExceeded { tool: tool_name.to_string(), detail });
            }
        }

        let cost = schema.estimate_cost(&args);

        let remaining = self
            .ledger
            .remaining(agent_id, now)
            .map_err(|e| RouterError::InsufficientBudget(e.into()))?;
        if remaining < cost {
            self.push_rejected(
                agent_id,
                tool_name,
                &args,
                cost,
                format!("insufficient budget: remaining {remaining} < cost {cost}"),
                now,
            );
            return Err(RouterError::InsufficientBudget(
                BudgetError::InsufficientBudget {
                    account: agent_id.to_string(),
                    remaining,
                    cost,
                }
                .into(),
            ));
        }

        let approval_threshold = schema
            .requires_approval_above
            .or_else(|| self.permissions.get(tool_name).and_then(|p| p.requires_approval_above));
        if let Some(threshold) = approval_threshold
            && cost > threshold
        {
            let approvers = self
                .permissions
                .get(tool_name)
                .map(|p| p.approvers.clone())
                .unwrap_or_default();
            self.push_audit(ToolCall {
                id: Uuid::new_v4(),
                agent: agent_id.to_string(),
                tool: tool_name.to_string(),
                args,
                estimated_cost: cost,
                actual_cost: None,
                status: ToolCallStatus::Requested,
                result: None,
                error: None,
                data_version_hash: None,
                experiment_id: None,
                timestamp: now,
            });
            return Err(RouterError::ApprovalRequired {
                tool: tool_name.to_string(),
                cost,
                approvers,
            });
        }

        let call_id = Uuid::new_v4();
        self.push_audit(ToolCall {
            id: call_id,
            agent: agent_id.to_string(),
            tool: tool_name.to_string(),
            args: args.clone(),
            estimated_cost: cost,
            actual_cost: None,
            status: ToolCallStatus::Requested,
            result: None,
            error: None,
            data_version_hash: None,
            experiment_id: None,
            timestamp: now,
        });

        let handler = self
            .registry
            .handler_for(schema.category)
            .ok_or_else(|| RouterError::ToolNotInitialized(tool_name.to_string()))?;

        let ctx = ToolContext {
            agent_id: agent_id.to_string(),
            department: department.to_string(),
            meeting_room_id,
            research_cycle_id,
            now,
        };
        let result = handler.handle(tool_name, args, &ctx).await;

        if result.success {
            if let Err(e) = self.ledger.deduct(agent_id, cost, now) {
                warn!(agent_id, tool = tool_name, "budget deduction failed after successful execution: {e}");
            }
            self.push_audit(ToolCall {
                id: Uuid::new_v4(),
                agent: agent_id.to_string(),
                tool: tool_name.to_string(),
                args: Value::Null,
                estimated_cost: cost,
                actual_cost: Some(cost),
                status: ToolCallStatus::Completed,
                result: result.data.clone(),
                error: None,
                data_version_hash: result.data_version_hash.clone(),
                experiment_id: result.experiment_id.clone(),
                timestamp: result.completed_at,
            });
            info!(agent_id, tool = tool_name, cost, "tool call completed");
        } else {
            self.push_audit(ToolCall {
                id: Uuid::new_v4(),
                agent: agent_id.to_string(),
                tool: tool_name.to_string(),
                args: Value::Null,
                estimated_cost: cost,
                actual_cost: None,
                status: ToolCallStatus::Failed,
                result: None,
                error: result.error.clone(),
                data_version_hash: None,
                experiment_id: None,
                timestamp: result.completed_at,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolrouter::budget::{AccountType, BudgetAccount};
    use crate::toolrouter::handler::ToolHandler;
    use crate::toolrouter::schema::{CostUnit, ToolCategory, ToolSchema};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct AlwaysOk;
    #[async_trait]
    impl ToolHandler for AlwaysOk {
        async fn handle(&self, _tool_name: &str, _args: Value, ctx: &ToolContext) -> ToolResult {
            ToolResult::ok(json!({"echo": true}), ctx.now, ctx.now)
        }
    }

    struct AlwaysFail;
    #[async_trait]
    impl ToolHandler for AlwaysFail {
        async fn handle(&self, _tool_name: &str, _args: Value, ctx: &ToolContext) -> ToolResult {
            ToolResult::err("boom", ctx.now, ctx.now)
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn router_with(schema: ToolSchema, handler: Arc<dyn ToolHandler>, perms: PermissionsFile) -> ToolRouter {
        let mut registry = ToolRegistry::new();
        let category = schema.category;
        registry.register_schema(schema);
        registry.register_handler(category, handler);

        let ledger = Arc::new(BudgetLedger::new(HashMap::new()));
        ledger.open_account(BudgetAccount::new("r1", AccountType::Agent, 100.0, now()));

        ToolRouter::new(Arc::new(registry), perms, ledger)
    }

    fn schema(name: &str) -> ToolSchema {
        ToolSchema {
            name: name.to_string(),
            description: "test".into(),
            category: ToolCategory::Market,
            parameters: json!({}),
            base_cost: 5.0,
            cost_per_unit: 0.0,
            cost_unit: CostUnit::Nil,
            requires_approval_above: None,
            allowed_departments: None,
        }
    }

    #[tokio::test]
    async fn unknown_tool_rejected() {
        let router = router_with(schema("known"), Arc::new(AlwaysOk), PermissionsFile::default());
        let err = router
            .execute("r1", "research", "ghost", json!({}), None, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn success_deducts_budget_exactly_once() {
        let router = router_with(schema("t"), Arc::new(AlwaysOk), PermissionsFile::default());
        let result = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap();
        assert!(result.success);

        let calls = router.audit_log();
        assert_eq!(
            calls.iter().filter(|c| c.status == ToolCallStatus::Completed).count(),
            1
        );
    }

    #[tokio::test]
    async fn failure_does_not_deduct_budget() {
        let router = router_with(schema("t"), Arc::new(AlwaysFail), PermissionsFile::default());
        let result = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap();
        assert!(!result.success);

        let calls = router.audit_log();
        assert!(calls.iter().any(|c| c.status == ToolCallStatus::Failed));
        assert!(!calls.iter().any(|c| c.status == ToolCallStatus::Completed));
    }

    #[tokio::test]
    async fn department_mismatch_is_permission_denied() {
        let mut s = schema("t");
        s.allowed_departments = Some(vec!["trading".to_string()]);
        let router = router_with(s, Arc::new(AlwaysOk), PermissionsFile::default());
        let err = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn cost_above_threshold_requires_approval() {
        let mut s = schema("t");
        s.requires_approval_above = Some(1.0);
        let router = router_with(s, Arc::new(AlwaysOk), PermissionsFile::default());
        let err = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::ApprovalRequired { .. }));
    }

    #[tokio::test]
    async fn insufficient_budget_is_rejected_without_dispatch() {
        let mut s = schema("t");
        s.base_cost = 1000.0;
        let router = router_with(s, Arc::new(AlwaysOk), PermissionsFile::default());
        let err = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::InsufficientBudget(_)));
        let calls = router.audit_log();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].status, ToolCallStatus::Rejected);
    }

    #[tokio::test]
    async fn permission_denied_is_logged_rejected() {
        let mut s = schema("t");
        s.allowed_departments = Some(vec!["trading".to_string()]);
        let router = router_with(s, Arc::new(AlwaysOk), PermissionsFile::default());
        let err = router
            .execute("r1", "research", "t", json!({}), None, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::PermissionDenied { .. }));
        let calls = router.audit_log();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].status, ToolCallStatus::Rejected);
    }
}
