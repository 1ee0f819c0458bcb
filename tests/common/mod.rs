use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    _child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}/api", port);

        // Assumes the debug profile binary is already built
        let mut cmd = Command::new("target/debug/duval-api");
        cmd.env("DUVAL_API_PORT", port.to_string())
            .env("PUBLIC_BASE_URL", format!("http://127.0.0.1:{}", port))
            .env("BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        Ok(Self { port, base_url, _child: child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// `None` when no database is configured; callers skip in that case.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").map(|v| v.is_empty()).unwrap_or(true) {
        eprintln!("DATABASE_URL not set, skipping end-to-end test");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(Some(server))
}

pub fn unique_email(tag: &str) -> String {
    format!("{}-{}@duval.test", tag, uuid::Uuid::new_v4().simple())
}

/// Registers a fresh account and returns the access token.
pub async fn register(client: &reqwest::Client, server: &TestServer, role: u8, tag: &str) -> Result<String> {
    let res = client
        .post(format!("{}/register/{}", server.base_url, role))
        .json(&json!({ "email": unique_email(tag) }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let body: Value = res.json().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("registration response carries no token")
}

pub async fn profile(client: &reqwest::Client, server: &TestServer, token: &str) -> Result<Value> {
    let res = client
        .get(format!("{}/profile", server.base_url))
        .bearer_auth(token)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "profile failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}
