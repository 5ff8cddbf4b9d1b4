//! Capability registry: the operations an orchestration layer may call.
//!
//! Every operation is a [`Tool`] with a name, a one-line description, and
//! an OpenAI function-calling JSON Schema for its parameters. The
//! orchestrator decides *which* tool to call; this module only validates
//! arguments, runs the operation, and returns JSON.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolRegistry                 │
//! │  ┌────────────────┐   ┌───────────────────┐  │
//! │  │  Conditions    │   │   Policy book     │  │
//! │  │  resolve/load  │   │   add/list/next   │  │
//! │  │  search/info   │   │   status          │  │
//! │  └───────┬────────┘   └─────────┬─────────┘  │
//! └──────────┼──────────────────────┼────────────┘
//!            ▼                      ▼
//!   ConditionsSession        ConditionStore / PolicyStore
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! # use policy_desk::tools::{ToolContext, ToolRegistry};
//! # async fn example(ctx: &ToolContext) {
//! let tools = ToolRegistry::with_builtins();
//! let descriptors = tools.descriptors(); // hand these to the orchestrator
//! let reply = tools
//!     .invoke("load_conditions_by_category", serde_json::json!({ "category": "car" }), ctx)
//!     .await;
//! # }
//! ```

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use policy_desk_core::error::Error;
use policy_desk_core::models::{ChunkingParams, NewPolicy};
use policy_desk_core::policy;
use policy_desk_core::resolve::resolve;
use policy_desk_core::search::SearchMode;
use policy_desk_core::session::ConditionsSession;
use policy_desk_core::store::{ConditionStore, PolicyStore};

use crate::config::Config;
use crate::extract::{default_name, load_document};

/// Failure of a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error(transparent)]
    Core(#[from] Error),

    /// Reported with kind `internal`.
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    /// Stable identifier the orchestrator can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Core(e) => e.kind(),
            ToolError::Encode(_) => "internal",
        }
    }

    /// `{ "error": { "kind": ..., "message": ... } }`
    pub fn to_json(&self) -> Value {
        json!({ "error": { "kind": self.kind(), "message": self.to_string() } })
    }
}

pub type ToolResult = std::result::Result<Value, ToolError>;

/// A named operation with a JSON parameter schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, e.g. `"get_pdf_info"`.
    fn name(&self) -> &str;

    /// One-line description the orchestrator uses to pick a tool.
    fn description(&self) -> &str;

    /// JSON Schema object with `type: "object"`, `properties`, and
    /// optionally `required`.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` is always a JSON object (possibly empty).
    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Everything a tool may touch: config, both stores, and the session
/// holding the currently loaded conditions document.
///
/// One context serves one conversation. The session sits behind an async
/// mutex because tools run through `&self` on the tokio runtime.
pub struct ToolContext {
    config: Arc<Config>,
    conditions: Arc<dyn ConditionStore>,
    policies: Arc<dyn PolicyStore>,
    session: Mutex<ConditionsSession>,
}

impl ToolContext {
    pub fn new(
        config: Arc<Config>,
        conditions: Arc<dyn ConditionStore>,
        policies: Arc<dyn PolicyStore>,
        chunking: ChunkingParams,
    ) -> Self {
        Self {
            config,
            conditions,
            policies,
            session: Mutex::new(ConditionsSession::new(chunking)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn conditions(&self) -> &dyn ConditionStore {
        self.conditions.as_ref()
    }

    pub fn policies(&self) -> &dyn PolicyStore {
        self.policies.as_ref()
    }

    pub fn session(&self) -> &Mutex<ConditionsSession> {
        &self.session
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// Load the PDF behind `reference` and make it the session's document.
    async fn load_into_session(&self, reference: &str, name: &str) -> ToolResult {
        let chunking = self.session.lock().await.chunking();
        let path = self.config.resolve_reference(reference);
        let doc = load_document(&path, reference, name, chunking)?;

        let mut session = self.session.lock().await;
        let info = session.install(doc).info();
        Ok(serde_json::to_value(info)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter helpers
// ═══════════════════════════════════════════════════════════════════════

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, Error> {
    match params.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(Error::invalid_argument(format!(
            "'{}' is required and must be a non-empty string",
            key
        ))),
    }
}

fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn optional_count(params: &Value, key: &str) -> Result<Option<usize>, Error> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => Ok(Some(n as usize)),
            _ => Err(Error::invalid_argument(format!(
                "'{}' must be a positive integer",
                key
            ))),
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Conditions tools
// ═══════════════════════════════════════════════════════════════════════

/// Look up which conditions document covers a policy category.
pub struct ResolveConditionsTool;

#[async_trait]
impl Tool for ResolveConditionsTool {
    fn name(&self) -> &str {
        "resolve_conditions_category"
    }

    fn description(&self) -> &str {
        "Finds the policy conditions edition and document reference for an insurance category (e.g. Car, Home, Injuries) without loading it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "The insurance policy category (e.g. Car, Injuries, Home)" }
            },
            "required": ["category"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult {
        let category = required_str(&params, "category")?;
        let record = resolve(ctx.conditions(), category).await?;
        Ok(serde_json::to_value(record)?)
    }
}

pub struct LoadConditionsByCategoryTool;

#[async_trait]
impl Tool for LoadConditionsByCategoryTool {
    fn name(&self) -> &str {
        "load_conditions_by_category"
    }

    fn description(&self) -> &str {
        "Loads the insurance policy conditions PDF for a policy category (e.g. Car, Home, Injuries) and prepares it for searching. Replaces any previously loaded document."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "The insurance policy category (e.g. Car, Injuries, Home)" }
            },
            "required": ["category"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult {
        let category = required_str(&params, "category")?;
        let record = resolve(ctx.conditions(), category).await?;
        let mut loaded = ctx
            .load_into_session(&record.storage_reference, &record.name)
            .await?;
        loaded["category"] = json!(record.category);
        Ok(loaded)
    }
}

pub struct LoadConditionsDocumentTool;

#[async_trait]
impl Tool for LoadConditionsDocumentTool {
    fn name(&self) -> &str {
        "load_conditions_document"
    }

    fn description(&self) -> &str {
        "Loads a conditions PDF directly by its storage reference (file path) and prepares it for searching. Replaces any previously loaded document."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "storage_reference": { "type": "string", "description": "Path of the PDF, absolute or relative to the conditions root" },
                "name": { "type": "string", "description": "Display name for the document (defaults to the file name)" }
            },
            "required": ["storage_reference"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult {
        let reference = required_str(&params, "storage_reference")?;
        let name = optional_str(&params, "name")
            .map(str::to_string)
            .unwrap_or_else(|| default_name(reference));
        ctx.load_into_session(reference, &name).await
    }
}

pub struct SearchPdfContentTool;

#[async_trait]
impl Tool for SearchPdfContentTool {
    fn name(&self) -> &str {
        "search_pdf_content"
    }

    fn description(&self) -> &str {
        "Searches the loaded conditions PDF and returns only the matching sections, not the whole document. Use this to find specific clauses efficiently."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Phrase or keywords to search for in the PDF" },
                "max_results": { "type": "integer", "minimum": 1, "description": "Maximum number of sections to return" },
                "mode": {
                    "type": "string",
                    "enum": ["phrase", "keywords"],
                    "default": "phrase",
                    "description": "phrase: exact case-insensitive substring, in document order; keywords: rank sections by how many query words they contain"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult {
        let query = optional_str(&params, "query").unwrap_or("");
        let max_results =
            optional_count(&params, "max_results")?.unwrap_or(ctx.config().search.max_results);
        let mode: SearchMode = optional_str(&params, "mode").unwrap_or("phrase").parse()?;

        let session = ctx.session().lock().await;
        let hits = session.search(query, max_results, mode)?;
        let document = session.document().map(|d| d.name.clone());

        Ok(json!({
            "document": document,
            "query": query,
            "mode": mode,
            "results": hits,
        }))
    }
}

pub struct GetPdfInfoTool;

#[async_trait]
impl Tool for GetPdfInfoTool {
    fn name(&self) -> &str {
        "get_pdf_info"
    }

    fn description(&self) -> &str {
        "Returns information about the currently loaded conditions PDF (name, pages, chunks, characters)."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> ToolResult {
        let info = ctx.session().lock().await.info()?;
        Ok(serde_json::to_value(info)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Policy book tools
// ═══════════════════════════════════════════════════════════════════════

pub struct AddInsuranceTool;

#[async_trait]
impl Tool for AddInsuranceTool {
    fn name(&self) -> &str {
        "add_insurance"
    }

    fn description(&self) -> &str {
        "Adds a new insurance policy. Requires policy holder, type, provider, guarantees and expiration date (YYYY-MM-DD)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "policy_holder": { "type": "string", "description": "Name of the insurance policy holder" },
                "policy_type": { "type": "string", "description": "Type of insurance (e.g. Car, Injuries, Home)" },
                "provider": { "type": "string", "description": "Insurance provider/company name" },
                "guarantees": { "type": "string", "description": "Policy guarantees" },
                "expiration_date": { "type": "string", "description": "Expiration date in YYYY-MM-DD format" }
            },
            "required": ["policy_holder", "policy_type", "provider", "guarantees", "expiration_date"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> ToolResult {
        let field = |key: &str| optional_str(&params, key).unwrap_or("").to_string();
        let input = NewPolicy {
            policy_holder: field("policy_holder"),
            policy_type: field("policy_type"),
            provider: field("provider"),
            guarantees: field("guarantees"),
            expiration_date: field("expiration_date"),
        };
        let record = policy::add_policy(ctx.conditions(), ctx.policies(), input, Utc::now()).await?;
        tracing::info!(id = %record.id, policy_type = %record.policy_type, "policy added");
        Ok(serde_json::to_value(record)?)
    }
}

pub struct ListAllInsurancesTool;

#[async_trait]
impl Tool for ListAllInsurancesTool {
    fn name(&self) -> &str {
        "list_all_insurances"
    }

    fn description(&self) -> &str {
        "Lists all insurance policies with their guarantees, expiration dates and days left."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> ToolResult {
        let entries = policy::list_policies(ctx.policies(), ctx.today()).await?;
        Ok(json!({ "count": entries.len(), "policies": entries }))
    }
}

pub struct GetNextPolicyExpTool;

#[async_trait]
impl Tool for GetNextPolicyExpTool {
    fn name(&self) -> &str {
        "get_next_policy_exp"
    }

    fn description(&self) -> &str {
        "Gets the insurance policy that will expire soonest (today or later)."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> ToolResult {
        let next = policy::next_expiring(ctx.policies(), ctx.today()).await?;
        Ok(json!({ "policy": next }))
    }
}

pub struct GetDbStatusTool;

#[async_trait]
impl Tool for GetDbStatusTool {
    fn name(&self) -> &str {
        "get_db_status"
    }

    fn description(&self) -> &str {
        "Returns the connection status of the insurance database and how many policies and condition documents it holds."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> ToolResult {
        let status = policy::store_status(ctx.conditions(), ctx.policies()).await?;
        Ok(json!({
            "connected": true,
            "database": ctx.config().db.path.display().to_string(),
            "policy_count": status.policy_count,
            "condition_count": status.condition_count,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Ordered collection of tools, looked up by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with every conditions and policy-book tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ResolveConditionsTool));
        registry.register(Box::new(LoadConditionsByCategoryTool));
        registry.register(Box::new(LoadConditionsDocumentTool));
        registry.register(Box::new(SearchPdfContentTool));
        registry.register(Box::new(GetPdfInfoTool));
        registry.register(Box::new(AddInsuranceTool));
        registry.register(Box::new(ListAllInsurancesTool));
        registry.register(Box::new(GetNextPolicyExpTool));
        registry.register(Box::new(GetDbStatusTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tool descriptors in OpenAI function-calling shape.
    pub fn descriptors(&self) -> Value {
        Value::Array(
            self.tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name(),
                            "description": t.description(),
                            "parameters": t.parameters_schema(),
                        }
                    })
                })
                .collect(),
        )
    }

    /// Look up `name` and run it. A `null` params value is treated as `{}`.
    pub async fn invoke(&self, name: &str, params: Value, ctx: &ToolContext) -> ToolResult {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let params = if params.is_null() { json!({}) } else { params };
        if !params.is_object() {
            return Err(Error::invalid_argument("parameters must be a JSON object").into());
        }

        tracing::debug!(tool = name, %params, "invoking tool");
        let result = tool.execute(params, ctx).await;
        if let Err(e) = &result {
            tracing::info!(tool = name, kind = e.kind(), error = %e, "tool call failed");
        }
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
