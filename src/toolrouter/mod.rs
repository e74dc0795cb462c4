//! Tool contracts, permissions, budget accounting, and the router that ties
//! them together with an append-only audit log.

pub mod budget;
pub mod handler;
pub mod handlers;
pub mod permissions;
pub mod registry;
pub mod router;
pub mod schema;

pub use budget::{AccountType, BudgetAccount, BudgetError, BudgetLedger};
pub use handler::{ToolContext, ToolHandler, ToolResult};
pub use permissions::{PermissionsFile, ToolPermission, load_permissions, parse_permissions};
pub use registry::ToolRegistry;
pub use router::{RouterError, ToolCall, ToolCallStatus, ToolRouter};
pub use schema::{CostUnit, ToolCategory, ToolSchema};
