//! [`BudgetAccount`] and the ledger that resolves an agent to its spending
//! account and serializes deduction.

use std::collections::HashMap;
#[cfg(feature = "persistence")]
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "persistence")]
use crate::persistence::{DbPool, repo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Agent,
    Team,
    Department,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAccount {
    pub id: String,
    pub account_type: AccountType,
    pub base_weekly_points: f64,
    pub current_period_start: DateTime<Utc>,
    pub current_period_points: f64,
    pub points_spent: f64,
}

impl BudgetAccount {
    pub fn new(id: impl Into<String>, account_type: AccountType, base_weekly_points: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            account_type,
            base_weekly_points,
            current_period_start: now,
            current_period_points: base_weekly_points,
            points_spent: 0.0,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.current_period_points - self.points_spent
    }

    /// Rolls the account onto a fresh period if `now` is at least a week
    /// past `current_period_start`. Called lazily on every access rather
    /// than via a background timer.
    pub fn maybe_reset_period(&mut self, now: DateTime<Utc>) {
        if now - self.current_period_start >= chrono::Duration::weeks(1) {
            self.current_period_start = now;
            self.current_period_points = self.base_weekly_points;
            self.points_spent = 0.0;
        }
    }

    fn deduct(&mut self, cost: f64) -> Result<(), BudgetError> {
        if self.remaining() < cost {
            return Err(BudgetError::InsufficientBudget {
                account: self.id.clone(),
                remaining: self.remaining(),
                cost,
            });
        }
        self.points_spent += cost;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("no budget account resolves for agent '{0}'")]
    NoAccount(String),
    #[error("account '{account}' has {remaining} points remaining, needs {cost}")]
    InsufficientBudget {
        account: String,
        remaining: f64,
        cost: f64,
    },
}

/// Accounts keyed by id, plus an agent→team mapping used for fallback
/// resolution when an agent has no account of its own.
pub struct BudgetLedger {
    accounts: DashMap<String, BudgetAccount>,
    agent_team: HashMap<String, String>,
    #[cfg(feature = "persistence")]
    pool: Option<Arc<DbPool>>,
}

impl BudgetLedger {
    #[cfg(feature = "persistence")]
    pub fn new(agent_team: HashMap<String, String>) -> Self {
        Self::new_with_persistence(agent_team, None)
    }

    #[cfg(not(feature = "persistence"))]
    pub fn new(agent_team: HashMap<String, String>) -> Self {
        Self { accounts: DashMap::new(), agent_team }
    }

    /// Builds a ledger that mirrors every open/deduct onto `pool`'s
    /// `budget_accounts` table, loading any previously-persisted accounts
    /// into memory first. `pool` of `None` behaves exactly like `new`.
    #[cfg(feature = "persistence")]
    pub fn new_with_persistence(agent_team: HashMap<String, String>, pool: Option<Arc<DbPool>>) -> Self {
        let accounts = DashMap::new();
        if let Some(pool) = &pool {
            for account in repo::load_budget_accounts(pool) {
                accounts.insert(account.id.clone(), account);
            }
        }
        Self { accounts, agent_team, pool }
    }

    pub fn open_account(&self, account: BudgetAccount) {
        #[cfg(feature = "persistence")]
        if let Some(pool) = &self.pool {
            repo::upsert_budget_account(pool, &account);
        }
        self.accounts.insert(account.id.clone(), account);
    }

    /// Resolves `agent_id` to the account id that should be charged: the
    /// agent's own account if one exists, else its team's.
    pub fn resolve(&self, agent_id: &str) -> Option<String> {
        if self.accounts.contains_key(agent_id) {
            return Some(agent_id.to_string());
        }
        self.agent_team.get(agent_id).cloned()
    }

    pub fn remaining(&self, agent_id: &str, now: DateTime<Utc>) -> Result<f64, BudgetError> {
        let account_id = self
            .resolve(agent_id)
            .ok_or_else(|| BudgetError::NoAccount(agent_id.to_string()))?;
        let mut account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| BudgetError::NoAccount(agent_id.to_string()))?;
        account.maybe_reset_period(now);
        Ok(account.remaining())
    }

    /// Atomically deducts `cost` from the account `agent_id` resolves to.
    /// `DashMap`'s per-shard locking plus the single `get_mut` call is what
    /// serializes concurrent deductions against the same account.
    pub fn deduct(&self, agent_id: &str, cost: f64, now: DateTime<Utc>) -> Result<(), BudgetError> {
        let account_id = self
            .resolve(agent_id)
            .ok_or_else(|| BudgetError::NoAccount(agent_id.to_string()))?;
        let mut account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| BudgetError::NoAccount(agent_id.to_string()))?;
        account.maybe_reset_period(now);
        account.deduct(cost)?;

        #[cfg(feature = "persistence")]
        if let Some(pool) = &self.pool {
            repo::upsert_budget_account(pool, &account);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn deducts_when_sufficient() {
        let ledger = BudgetLedger::new(HashMap::new());
        ledger.open_account(BudgetAccount::new("r1", AccountType::Agent, 100.0, now()));
        ledger.deduct("r1", 30.0, now()).unwrap();
        assert_eq!(ledger.remaining("r1", now()).unwrap(), 70.0);
    }

    #[test]
    fn rejects_when_insufficient() {
        let ledger = BudgetLedger::new(HashMap::new());
        ledger.open_account(BudgetAccount::new("r1", AccountType::Agent, 10.0, now()));
        let err = ledger.deduct("r1", 30.0, now()).unwrap_err();
        assert!(matches!(err, BudgetError::InsufficientBudget { .. }));
    }

    #[test]
    fn falls_back_to_team_account() {
        let mut mapping = HashMap::new();
        mapping.insert("r1".to_string(), "team_alpha".to_string());
        let ledger = BudgetLedger::new(mapping);
        ledger.open_account(BudgetAccount::new("team_alpha", AccountType::Team, 100.0, now()));
        ledger.deduct("r1", 40.0, now()).unwrap();
        assert_eq!(ledger.remaining("r1", now()).unwrap(), 60.0);
    }

    #[test]
    fn unknown_agent_has_no_account() {
        let ledger = BudgetLedger::new(HashMap::new());
        assert!(matches!(
            ledger.deduct("ghost", 1.0, now()),
            Err(BudgetError::NoAccount(_))
        ));
    }

    #[test]
    fn period_resets_after_a_week() {
        let ledger = BudgetLedger::new(HashMap::new());
        ledger.open_account(BudgetAccount::new("r1", AccountType::Agent, 100.0, now()));
        ledger.deduct("r1", 100.0, now()).unwrap();
        assert_eq!(ledger.remaining("r1", now()).unwrap(), 0.0);

        let later = now() + chrono::Duration::weeks(1);
        assert_eq!(ledger.remaining("r1", later).unwrap(), 100.0);
    }
}
