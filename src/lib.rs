//! # Policy Desk
//!
//! Tool-callable back end for an insurance assistant: resolve a policy
//! category to its conditions PDF, load and chunk that PDF, search it for
//! clauses, and keep a small book of insurance policies.
//!
//! An external orchestrator (typically a language model with function
//! calling) picks which tool to run; Policy Desk never interprets natural
//! language itself.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │ Orchestrator │──▶│ ToolRegistry  │──▶│ ConditionsSession │
//! │  (external)  │   │  (tools.rs)   │   │  chunks + search  │
//! └──────────────┘   └──────┬────────┘   └──────────────────┘
//!                           │
//!                           ▼
//!                    ┌─────────────┐   ┌──────────┐
//!                    │ SqliteStore │   │ PDF file │
//!                    │ conditions  │   │ (extract)│
//!                    │ + policies  │   └──────────┘
//!                    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pdesk init
//! pdesk conditions add --category Car --name CarSafe26.1 --reference car_safe_26_1.pdf
//! pdesk tools list
//! pdesk shell
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite condition and policy stores |
//! | [`extract`] | PDF loading |
//! | [`tools`] | Capability registry |
//! | [`shell`] | Line-oriented tool shell |

pub mod config;
pub mod db;
pub mod extract;
pub mod migrate;
pub mod shell;
pub mod sqlite_store;
pub mod tools;
