//! HTTP-level tests for the approval API: the poll-based rendezvous an
//! external automation client drives against the gateway.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    steward_approvals::ApprovalStore,
    steward_channels::ChannelOutbound,
    steward_gateway::{
        build_gateway_app,
        state::{ApprovalNotifier, GatewayState},
    },
    steward_storage::FileKvStore,
    steward_tools::{CommandPolicy, PolicyEffect, PolicyRule, SafeExecTool, ToolGate, ToolRegistry},
};

/// Test double capturing outbound channel messages.
#[derive(Default)]
struct RecordingOutbound {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_text(&self, _account_id: &str, _to: &str, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn test_gate(rules: Vec<PolicyRule>) -> ToolGate {
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(SafeExecTool::new(
            CommandPolicy::new(&["ls".to_string()], &[]).unwrap(),
        )))
        .unwrap();
    ToolGate::new(registry, rules)
}

async fn serve(state: Arc<GatewayState>) -> String {
    let app = build_gateway_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_app(rules: Vec<PolicyRule>) -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let kv = Arc::new(FileKvStore::with_dir(dir.path().to_path_buf()));
    let approvals = ApprovalStore::new(kv);

    let state = GatewayState::new(approvals, test_gate(rules));
    let base = serve(state).await;
    (base, dir)
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, _dir) = spawn_app(Vec::new()).await;
    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn end_to_end_deny_rendezvous() {
    let (base, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    // The automation client files a request...
    let created: serde_json::Value = client
        .post(format!("{base}/api/approve"))
        .json(&serde_json::json!({
            "tool": "Bash",
            "input": "git push origin main",
            "session": "sess-1",
            "requester": "coder",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // ...and sees it pending.
    let record: serde_json::Value = client
        .get(format!("{base}/api/approve/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["status"], "pending");
    assert_eq!(record["tool"], "Bash");

    // A poller that started before the decision...
    let poll_base = base.clone();
    let poll_id = id.clone();
    let poller = tokio::spawn(async move {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            let record: serde_json::Value = client
                .get(format!("{poll_base}/api/approve/{poll_id}"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if record["status"] != "pending" {
                return record["status"].as_str().unwrap().to_string();
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        "timeout".to_string()
    });

    // ...observes the human's deny within one interval.
    let ack: serde_json::Value = client
        .post(format!("{base}/api/approve/{id}/decide"))
        .json(&serde_json::json!({ "decision": "deny" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ack["ok"], true);
    assert_eq!(ack["applied"], true);

    assert_eq!(poller.await.unwrap(), "deny");
}

#[tokio::test]
async fn unknown_id_is_404() {
    let (base, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/approve/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{base}/api/approve/ghost/decide"))
        .json(&serde_json::json!({ "decision": "allow" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_decision_is_400() {
    let (base, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/api/approve"))
        .json(&serde_json::json!({ "tool": "Bash" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/approve/{id}/decide"))
        .json(&serde_json::json!({ "decision": "maybe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn late_decision_is_acknowledged_but_not_applied() {
    let (base, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/api/approve"))
        .json(&serde_json::json!({ "tool": "Bash", "input": "x" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    for _ in 0..2 {
        client
            .post(format!("{base}/api/approve/{id}/decide"))
            .json(&serde_json::json!({ "decision": "allow" }))
            .send()
            .await
            .unwrap();
    }
    let ack: serde_json::Value = client
        .post(format!("{base}/api/approve/{id}/decide"))
        .json(&serde_json::json!({ "decision": "deny" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ack["applied"], false);

    // The first decision stands.
    let record: serde_json::Value = client
        .get(format!("{base}/api/approve/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["status"], "allow");
}

#[tokio::test]
async fn tool_listing_respects_policy() {
    let rules = vec![PolicyRule {
        tool: "exec".into(),
        effect: PolicyEffect::Deny,
        channels: vec!["telegram".into()],
        users: Vec::new(),
    }];
    let (base, _dir) = spawn_app(rules).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{base}/api/tools?channel=telegram&sender=alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["tools"].as_array().unwrap().len(), 0);

    let body: serde_json::Value = client
        .get(format!("{base}/api/tools?channel=web&sender=alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["tools"].as_array().unwrap().len(), 1);
    assert_eq!(body["tools"][0]["name"], "exec");
}

#[tokio::test]
async fn new_request_notifies_channel() {
    let dir = tempfile::tempdir().unwrap();
    let kv = Arc::new(FileKvStore::with_dir(dir.path().to_path_buf()));
    let approvals = ApprovalStore::new(kv);

    let outbound = Arc::new(RecordingOutbound::default());
    let notifier = ApprovalNotifier {
        outbound: outbound.clone(),
        account_id: "default".into(),
        to: "owner".into(),
    };
    let state = GatewayState::with_notifier(approvals, test_gate(Vec::new()), Some(notifier));
    let base = serve(state).await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .post(format!("{base}/api/approve"))
        .json(&serde_json::json!({
            "tool": "exec",
            "input": "ls -la /tmp",
            "requester": "agent",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    // The notification is sent from a spawned task; poll until it lands.
    let mut notified = None;
    for _ in 0..50 {
        let messages = outbound.messages.lock().unwrap().clone();
        if let Some(text) = messages.into_iter().find(|m| m.contains(&id)) {
            notified = Some(text);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let text = notified.expect("no notification delivered");
    assert!(text.contains(&format!("/allow {id}")));
    assert!(text.contains(&format!("/deny {id}")));
    assert!(text.contains("ls -la /tmp"));
}
