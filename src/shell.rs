//! Line-oriented tool shell.
//!
//! Reads `<tool_name> [json-params]` lines and writes one JSON object per
//! line back. All calls share one [`ToolContext`], so a document loaded by
//! one line is searchable by the next. `exit` or end of input stops the
//! loop; a failing call never does.
//!
//! ```text
//! > load_conditions_by_category {"category": "car"}
//! < {"tool":"load_conditions_by_category","result":{"name":"CarSafe26.1",...}}
//! > search_pdf_content {"query": "deductible"}
//! < {"tool":"search_pdf_content","result":{"results":[...]}}
//! ```

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use policy_desk_core::error::Error;

use crate::tools::{ToolContext, ToolError, ToolRegistry};

/// Parse one request line into a tool name and its parameters.
pub fn parse_line(line: &str) -> std::result::Result<(&str, Value), ToolError> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    if rest.is_empty() {
        return Ok((name, json!({})));
    }
    let params = serde_json::from_str(rest).map_err(|e| {
        ToolError::from(Error::invalid_argument(format!(
            "parameters are not valid JSON: {}",
            e
        )))
    })?;
    Ok((name, params))
}

/// Handle a single line, returning the response object.
pub async fn handle_line(registry: &ToolRegistry, ctx: &ToolContext, line: &str) -> Value {
    let (name, params) = match parse_line(line) {
        Ok(parsed) => parsed,
        Err(e) => return e.to_json(),
    };
    match registry.invoke(name, params, ctx).await {
        Ok(result) => json!({ "tool": name, "result": result }),
        Err(e) => {
            let mut out = e.to_json();
            out["tool"] = json!(name);
            out
        }
    }
}

/// Run the shell until `exit` or end of input.
pub async fn run_shell<R, W>(
    registry: &ToolRegistry,
    ctx: &ToolContext,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        let response = handle_line(registry, ctx, trimmed).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        output.write_all(encoded.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
