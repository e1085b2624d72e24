use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
    },
    serde::Deserialize,
    tower_http::cors::{Any, CorsLayer},
    tracing::{error, info, warn},
};

use {
    steward_approvals::{ApprovalStore, Decision},
    steward_config::StewardConfig,
    steward_storage::FileKvStore,
    steward_tools::{CommandPolicy, SafeExecTool, ToolGate, ToolRegistry},
};

use crate::state::GatewayState;

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tools", get(list_tools_handler))
        .route("/api/approve", post(create_approval_handler))
        .route("/api/approve/{id}", get(get_approval_handler))
        .route("/api/approve/{id}/decide", post(decide_approval_handler))
        .layer(cors)
        .with_state(state)
}

/// Wire state from config and start the gateway HTTP server.
pub async fn start_gateway(config: &StewardConfig) -> anyhow::Result<()> {
    let kv = Arc::new(FileKvStore::new());
    let approvals = ApprovalStore::new(kv);

    let command_policy = CommandPolicy::new(
        &config.tools.exec.allowlist,
        &config.tools.exec.blocked_patterns,
    )?;
    let mut registry = ToolRegistry::new();
    let mut exec_tool = SafeExecTool::new(command_policy);
    exec_tool.default_timeout = Duration::from_secs(config.tools.exec.timeout_secs);
    exec_tool.max_output_bytes = config.tools.exec.max_output_bytes;
    registry.register(Box::new(exec_tool))?;

    let gate = ToolGate::new(registry, config.tools.rules.clone());
    let state = GatewayState::new(approvals, gate);

    // Expiry sweep. Clients never rely on this having run; they enforce
    // their own deadlines.
    let sweep_state = Arc::clone(&state);
    let max_age_ms = config.approvals.max_age_ms;
    let sweep_interval = Duration::from_secs(config.approvals.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_state.approvals.expire_older_than(max_age_ms) {
                error!(error = %e, "approval expiry sweep failed");
            }
        }
    });

    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("steward gateway v{}", state.version),
        format!("listening on {addr}"),
        format!("{} tools registered", state.gate.registry().len()),
        format!("{} pending approvals", state.approvals.list_pending().map(|p| p.len()).unwrap_or(0)),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

type ApiResponse = (StatusCode, Json<serde_json::Value>);

fn internal_error(e: anyhow::Error) -> ApiResponse {
    error!(error = %e, "store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal error" })),
    )
}

fn not_found(id: &str) -> ApiResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("no approval request with id {id}") })),
    )
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
    }))
}

#[derive(Debug, Deserialize)]
struct ToolsQuery {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    sender: String,
}

async fn list_tools_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ToolsQuery>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "tools": state.gate.schemas_for_context(&query.channel, &query.sender),
    }))
}

#[derive(Debug, Deserialize)]
struct CreateApprovalBody {
    tool: String,
    #[serde(default)]
    input: String,
    #[serde(default)]
    session: String,
    #[serde(default)]
    requester: String,
}

async fn create_approval_handler(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<CreateApprovalBody>,
) -> ApiResponse {
    match state.approvals.request_approval(
        &body.tool,
        &body.input,
        &body.session,
        &body.requester,
    ) {
        Ok(id) => {
            notify_pending_approval(&state, &id, &body);
            (StatusCode::OK, Json(serde_json::json!({ "id": id })))
        },
        Err(e) => internal_error(e),
    }
}

/// Announce a new pending request on the configured channel, if any.
/// A failed notification is only logged, never surfaced to the requester;
/// the request is already durable and decidable via the CLI.
fn notify_pending_approval(state: &GatewayState, id: &str, body: &CreateApprovalBody) {
    let Some(ref notifier) = state.notifier else {
        return;
    };

    let text = format!(
        "Approval needed: {} from {} — {}\nReply \"/allow {id}\" or \"/deny {id}\"",
        body.tool, body.requester, body.input,
    );
    let outbound = Arc::clone(&notifier.outbound);
    let account_id = notifier.account_id.clone();
    let to = notifier.to.clone();
    let id = id.to_string();
    tokio::spawn(async move {
        if let Err(e) = outbound.send_text(&account_id, &to, &text).await {
            warn!(id, error = %e, "approval notification failed");
        }
    });
}

async fn get_approval_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResponse {
    match state.approvals.get(&id) {
        Ok(Some(record)) => match serde_json::to_value(&record) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => internal_error(e.into()),
        },
        Ok(None) => not_found(&id),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct DecideBody {
    decision: String,
}

async fn decide_approval_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    Json(body): Json<DecideBody>,
) -> ApiResponse {
    let decision = match body.decision.as_str() {
        "allow" => Decision::Allow,
        "deny" => Decision::Deny,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("decision must be \"allow\" or \"deny\", got \"{other}\"")
                })),
            );
        },
    };

    match state.approvals.get(&id) {
        Ok(None) => return not_found(&id),
        Err(e) => return internal_error(e),
        Ok(Some(_)) => {},
    }

    match state.approvals.decide(&id, decision) {
        // `applied: false` means the record was already terminal — the
        // submission is acknowledged but changed nothing.
        Ok(applied) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "applied": applied })),
        ),
        Err(e) => internal_error(e),
    }
}
