//! Function tools offered to the completion model

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::providers::ToolDefinition;

/// Name of the knowledge lookup tool
pub const SEARCH_TOOL: &str = "search_aau_knowledge";

/// Knowledge lookup tool definition
pub fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL.to_string(),
        description: "البحث في قاعدة معرفة جامعة عمان العربية".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "الاستعلام المراد البحث عنه"
                }
            },
            "required": ["query"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Extract `query` from the model's JSON-encoded arguments
pub fn parse_search_args(arguments: &str) -> Result<String> {
    let args: SearchArgs = serde_json::from_str(arguments).map_err(|e| {
        Error::malformed(format!("invalid {} arguments: {}", SEARCH_TOOL, e))
    })?;
    Ok(args.query)
}
