//! Node resource integration tests.
//!
//! Exercises the full facade end to end: merge against an in-memory node
//! store, and dispatch through a scripted commander that records every
//! executor call and can be told to fail per host. Everything runs
//! in-process — no real SSH or WinRM connections.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use tiller_core::{CommandOutput, DesiredChange, NodeRecord, SshOptions};
use tiller_node::{
    BootstrapOptions, DispatchConfig, InMemoryNodeStore, NodeError, NodeResource,
    NodeStore,
};
use tiller_transport::{HostCommander, TransportOptions, TransportResult};

/// Commander that records calls and fails on the hosts it is told to.
#[derive(Default)]
struct ScriptedCommander {
    calls: Mutex<Vec<String>>,
    /// host → exit status for `run`/`chef_client` on that host.
    failures: HashMap<String, i32>,
}

impl ScriptedCommander {
    fn failing_on(host: &str, exit_status: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: HashMap::from([(host.to_string(), exit_status)]),
        }
    }

    fn record(&self, line: String) {
        self.calls.lock().unwrap().push(line);
    }

    fn respond(&self, host: &str) -> TransportResult<CommandOutput> {
        match self.failures.get(host) {
            Some(&exit_status) => Ok(CommandOutput {
                host: host.to_string(),
                exit_status,
                stdout: String::new(),
                stderr: "provisioning failed".to_string(),
            }),
            None => Ok(CommandOutput::ok(host)),
        }
    }
}

#[async_trait]
impl HostCommander for ScriptedCommander {
    async fn chef_client(
        &self,
        host: &str,
        _options: &TransportOptions,
    ) -> TransportResult<CommandOutput> {
        self.record(format!("chef_client {host}"));
        self.respond(host)
    }

    async fn put_secret(
        &self,
        host: &str,
        secret: &str,
        _options: &TransportOptions,
    ) -> TransportResult<CommandOutput> {
        self.record(format!("put_secret {host} {secret}"));
        Ok(CommandOutput::ok(host))
    }

    async fn ruby_script(
        &self,
        host: &str,
        command_lines: &[String],
        _options: &TransportOptions,
    ) -> TransportResult<CommandOutput> {
        self.record(format!("ruby_script {host} {}", command_lines.join("; ")));
        self.respond(host)
    }

    async fn run(
        &self,
        host: &str,
        command: &str,
        _options: &TransportOptions,
    ) -> TransportResult<CommandOutput> {
        self.record(format!("run {host} {command}"));
        self.respond(host)
    }
}

/// Route `tracing` output through the test harness when RUST_LOG is set.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ssh_dispatch() -> DispatchConfig {
    DispatchConfig {
        ssh: Some(SshOptions {
            user: "vagrant".to_string(),
            password: None,
            keys: vec![PathBuf::from("/home/vagrant/.ssh/id_rsa")],
            port: 22,
            sudo: true,
        }),
        ..DispatchConfig::default()
    }
}

fn attributes(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

async fn seeded_store() -> Arc<InMemoryNodeStore> {
    let store = Arc::new(InMemoryNodeStore::new());
    let mut node = NodeRecord::new("app-01");
    node.run_list = vec!["recipe[one]".to_string(), "recipe[three]".to_string()];
    node.normal = attributes(json!({ "deep": { "one": "val" } }));
    node.extra
        .insert("chef_type".to_string(), json!("node"));
    store.insert(node).await;
    store
}

#[tokio::test]
async fn merge_data_unions_run_list_and_deep_merges_attributes() {
    init_logging();
    let store = seeded_store().await;
    let resource = NodeResource::new(
        Arc::clone(&store) as Arc<dyn NodeStore>,
        Arc::new(ScriptedCommander::default()),
        ssh_dispatch(),
    );

    let change = DesiredChange {
        run_list: vec!["recipe[one]".to_string(), "recipe[two]".to_string()],
        attributes: attributes(json!({ "deep": { "two": "val" } })),
    };

    let merged = resource.merge_data("app-01", &change).await.unwrap();
    assert_eq!(
        merged.run_list,
        vec!["recipe[one]", "recipe[three]", "recipe[two]"]
    );
    assert_eq!(
        serde_json::Value::Object(merged.normal.clone()),
        json!({ "deep": { "one": "val", "two": "val" } })
    );
    // Server-managed metadata passes through untouched.
    assert_eq!(merged.extra.get("chef_type"), Some(&json!("node")));
}

#[tokio::test]
async fn merge_data_twice_yields_identical_results() {
    let store = seeded_store().await;
    let resource = NodeResource::new(
        store as Arc<dyn NodeStore>,
        Arc::new(ScriptedCommander::default()),
        ssh_dispatch(),
    );

    let change = DesiredChange {
        run_list: vec!["recipe[two]".to_string()],
        attributes: attributes(json!({ "deep": { "two": "val" } })),
    };

    let first = resource.merge_data("app-01", &change).await.unwrap();
    let second = resource.merge_data("app-01", &change).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn merge_data_on_unknown_node_fails_without_mutation() {
    let store = seeded_store().await;
    let resource = NodeResource::new(
        Arc::clone(&store) as Arc<dyn NodeStore>,
        Arc::new(ScriptedCommander::default()),
        ssh_dispatch(),
    );

    let err = resource
        .merge_data("does_not_exist", &DesiredChange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::NotFound(_)));

    // The seeded node is unchanged.
    let stored = store.fetch("app-01").await.unwrap().unwrap();
    assert_eq!(stored.run_list, vec!["recipe[one]", "recipe[three]"]);
}

#[tokio::test]
async fn bootstrap_partial_failure_keeps_the_successful_host() {
    init_logging();
    let commander = Arc::new(ScriptedCommander::failing_on("192.168.1.3", 1));
    let resource = NodeResource::new(
        Arc::new(InMemoryNodeStore::new()),
        commander,
        ssh_dispatch(),
    );

    let err = resource
        .bootstrap(
            &["192.168.1.2", "192.168.1.3"],
            BootstrapOptions {
                validator_path: PathBuf::from("/tmp/reset.pem"),
                encrypted_data_bag_secret: None,
                run_list: vec![],
            },
        )
        .await
        .unwrap_err();

    match err {
        NodeError::Bootstrap(failure) => {
            let succeeded: Vec<&str> =
                failure.succeeded().map(|o| o.host.as_str()).collect();
            let failed: Vec<&str> =
                failure.failed().map(|o| o.host.as_str()).collect();
            assert_eq!(succeeded, vec!["192.168.1.2"]);
            assert_eq!(failed, vec!["192.168.1.3"]);
        }
        other => panic!("expected Bootstrap, got {other:?}"),
    }
}

#[tokio::test]
async fn bootstrap_distributes_the_resource_secret_first() {
    let commander = Arc::new(ScriptedCommander::default());
    let resource = NodeResource::new(
        Arc::new(InMemoryNodeStore::new()),
        Arc::clone(&commander) as Arc<dyn HostCommander>,
        ssh_dispatch(),
    )
    .with_secret("super_secret");

    resource
        .bootstrap(
            &["192.168.1.2"],
            BootstrapOptions {
                validator_path: PathBuf::from("/tmp/reset.pem"),
                encrypted_data_bag_secret: None,
                run_list: vec!["recipe[base]".to_string()],
            },
        )
        .await
        .unwrap();

    let calls = commander.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            "put_secret 192.168.1.2 super_secret".to_string(),
            "run 192.168.1.2 chef-client --validation-key /tmp/reset.pem --runlist recipe[base]"
                .to_string(),
        ]
    );
}

#[tokio::test]
async fn execute_command_reaches_the_executor_verbatim() {
    let commander = Arc::new(ScriptedCommander::default());
    let resource = NodeResource::new(
        Arc::new(InMemoryNodeStore::new()),
        Arc::clone(&commander) as Arc<dyn HostCommander>,
        ssh_dispatch(),
    );

    resource
        .execute_command("33.33.33.10", "echo 'hello world'")
        .await
        .unwrap();

    let calls = commander.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["run 33.33.33.10 echo 'hello world'".to_string()]);
}

#[tokio::test]
async fn single_host_command_failure_carries_status_and_output() {
    let commander = Arc::new(ScriptedCommander::failing_on("33.33.33.10", 2));
    let resource = NodeResource::new(
        Arc::new(InMemoryNodeStore::new()),
        commander,
        ssh_dispatch(),
    );

    let err = resource.chef_run("33.33.33.10").await.unwrap_err();
    match err {
        NodeError::Transport(tiller_transport::TransportError::CommandFailed {
            host,
            exit_status,
            stderr,
            ..
        }) => {
            assert_eq!(host, "33.33.33.10");
            assert_eq!(exit_status, 2);
            assert_eq!(stderr, "provisioning failed");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}
