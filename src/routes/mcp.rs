/// JSON-RPC 2.0 tool endpoint, so assistants can drive search and folder
/// exploration as tools.
///
/// Tool failures are reported inside the result (`isError: true`); only
/// protocol problems become JSON-RPC errors.
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    models::{CatalogEntry, EntryKind, SearchQuery},
    state::AppState,
};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    search_term: String,
    media_type: Option<String>,
    match_type: Option<String>,
    #[serde(default)]
    excluded_providers: Vec<String>,
    server: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerArgs {
    server: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FolderArgs {
    href: String,
    name: String,
    provider: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    server: Option<String>,
}

/// POST /mcp
pub async fn handle(State(state): State<AppState>, body: String) -> Json<RpcResponse> {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => return Json(RpcResponse::err(None, PARSE_ERROR, format!("Parse error: {e}"))),
    };
    tracing::debug!("JSON-RPC {}", request.method);

    let params = request.params.unwrap_or(Value::Null);
    let response = match request.method.as_str() {
        "initialize" => RpcResponse::ok(request.id, initialize()),
        "tools/list" => RpcResponse::ok(request.id, json!({ "tools": tools() })),
        "tools/call" => match serde_json::from_value::<ToolCall>(params) {
            Ok(call) => RpcResponse::ok(request.id, call_tool(&state, call).await),
            Err(e) => RpcResponse::err(request.id, INVALID_PARAMS, format!("Invalid params: {e}")),
        },
        other => RpcResponse::err(
            request.id,
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    };

    Json(response)
}

fn initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn tools() -> Value {
    let server = json!({ "type": "string", "description": "Media server host" });
    json!([
        {
            "name": "search_media",
            "description": "Search for media (movies or TV shows) across multiple providers",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "search_term": { "type": "string", "description": "The media title to search for" },
                    "media_type": { "type": "string", "enum": ["show", "movie"], "default": "show" },
                    "match_type": { "type": "string", "enum": ["partial", "exact"], "default": "partial" },
                    "excluded_providers": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Provider names to leave out",
                        "default": []
                    },
                    "server": server,
                },
                "required": ["search_term"]
            }
        },
        {
            "name": "list_providers",
            "description": "Get a list of all available media providers",
            "inputSchema": {
                "type": "object",
                "properties": { "server": server },
                "required": []
            }
        },
        {
            "name": "trace_media_folder",
            "description": "Explore the contents of a media folder to find video files",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "href": { "type": "string", "description": "The href path of the folder to explore" },
                    "name": { "type": "string", "description": "The name of the folder" },
                    "provider": { "type": "string", "description": "The provider id" },
                    "type": { "type": "string", "description": "The type of the item (should be 'folder')" },
                    "server": server,
                },
                "required": ["href", "name", "provider", "type"]
            }
        }
    ])
}

fn text_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

async fn call_tool(state: &AppState, call: ToolCall) -> Value {
    let outcome = match call.name.as_str() {
        "search_media" => search_media(state, call.arguments).await,
        "list_providers" => list_providers(state, call.arguments).await,
        "trace_media_folder" => trace_media_folder(state, call.arguments).await,
        other => Err(format!("Unknown tool: {other}")),
    };

    match outcome {
        Ok(text) => text_result(text, false),
        Err(e) => {
            tracing::warn!("Tool {} failed: {e}", call.name);
            text_result(format!("Error executing tool '{}': {e}", call.name), true)
        }
    }
}

fn args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, String> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| format!("invalid arguments: {e}"))
}

async fn search_media(state: &AppState, arguments: Value) -> Result<String, String> {
    let a: SearchArgs = args(arguments)?;
    let query = SearchQuery::parse(
        &a.search_term,
        a.media_type.as_deref(),
        a.match_type.as_deref(),
        a.excluded_providers,
    )
    .map_err(|e| e.to_string())?;
    let server = state.server(a.server.as_deref());

    let results = state
        .search
        .search_within(&query, &server, state.config.search_timeout())
        .await
        .map_err(|e| e.to_string())?;

    let lines: Vec<String> = results
        .iter()
        .map(|r| format!("• {} ({}) - {}", r.entry.name, r.entry.kind, r.provider_name))
        .collect();
    Ok(format!(
        "Found {} results for '{}':\n\n{}",
        results.len(),
        query.term,
        lines.join("\n")
    ))
}

async fn list_providers(state: &AppState, arguments: Value) -> Result<String, String> {
    let a: ServerArgs = args(arguments)?;
    let server = state.server(a.server.as_deref());
    let directory = state
        .search
        .list_providers(&server)
        .await
        .map_err(|e| e.to_string())?;

    let lines: Vec<String> = directory
        .iter()
        .map(|p| format!("• {}: {}", p.name, p.id))
        .collect();
    Ok(format!(
        "Available providers ({}):\n\n{}",
        directory.len(),
        lines.join("\n")
    ))
}

async fn trace_media_folder(state: &AppState, arguments: Value) -> Result<String, String> {
    let a: FolderArgs = args(arguments)?;
    let kind = match a.kind.as_deref() {
        Some("video") => EntryKind::Video,
        _ => EntryKind::Folder {
            child_count: Some(0),
        },
    };
    let entry = CatalogEntry {
        href: a.href,
        name: a.name,
        kind,
        provider: a.provider,
    };
    let server = state.server(a.server.as_deref());

    let leaves = state.search.resolve_folder(&entry, &server).await;
    let lines: Vec<String> = leaves
        .iter()
        .map(|l| format!("• {} ({})", l.name, l.kind))
        .collect();
    Ok(format!(
        "Contents of folder '{}':\n\n{}",
        entry.name,
        lines.join("\n")
    ))
}
