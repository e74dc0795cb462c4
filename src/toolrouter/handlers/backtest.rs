//! `backtest.run` side-constraint: a deterministic `experiment_id` derived
//! from the run's provenance, giving a reproducible handle for artifacts.

use async_trait::async_trait;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::toolrouter::handler::{ToolContext, ToolHandler, ToolResult};

pub struct BacktestHandler;

#[async_trait]
impl ToolHandler for BacktestHandler {
    async fn handle(&self, tool_name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        match tool_name {
            "backtest.run" => self.run(args, ctx),
            other => ToolResult::err(format!("backtest handler has no method '{other}'"), ctx.now, ctx.now),
        }
    }
}

impl BacktestHandler {
    fn run(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let config = args.get("config").cloned().unwrap_or(Value::Null);
        let data_version = args.get("data_version_hash").and_then(Value::as_str).unwrap_or("unknown");
        let code_commit = args.get("code_commit").and_then(Value::as_str).unwrap_or("unknown");

        let experiment_id = experiment_id(&config, data_version, code_commit);
        let artifact_dir = format!("experiments/{experiment_id}");

        let mut result = ToolResult::ok(
            json!({
                "experiment_id": experiment_id,
                "artifact_dir": artifact_dir,
                "config": config,
            }),
            ctx.now,
            ctx.now,
        );
        result.data_version_hash = Some(data_version.to_string());
        result.experiment_id = Some(experiment_id);
        result
    }
}

/// `hash(strategy_spec ∥ data_version_hash ∥ code_commit)`, hex-encoded.
fn experiment_id(config: &Value, data_version: &str, code_commit: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(data_version.as_bytes());
    hasher.update(b"\0");
    hasher.update(code_commit.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext {
            agent_id: "r1".into(),
            department: "research".into(),
            meeting_room_id: None,
            research_cycle_id: None,
            now: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn experiment_id_is_deterministic() {
        let args = json!({"config": {"strategy": "mean_reversion"}, "data_version_hash": "dv1", "code_commit": "c1"});
        let a = BacktestHandler.handle("backtest.run", args.clone(), &ctx()).await;
        let b = BacktestHandler.handle("backtest.run", args, &ctx()).await;
        assert_eq!(a.experiment_id, b.experiment_id);
    }

    #[tokio::test]
    async fn different_config_yields_different_experiment_id() {
        let a = BacktestHandler
            .handle(
                "backtest.run",
                json!({"config": {"strategy": "a"}, "data_version_hash": "dv1", "code_commit": "c1"}),
                &ctx(),
            )
            .await;
        let b = BacktestHandler
            .handle(
                "backtest.run",
                json!({"config": {"strategy": "b"}, "data_version_hash": "dv1", "code_commit": "c1"}),
                &ctx(),
            )
            .await;
        assert_ne!(a.experiment_id, b.experiment_id);
    }
}
