use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::Rng as _;
use reqwest::header;
use snapspot_dal::user::{CreateUser, UserRepositoryImpl};
use snapspot_server::{
    build_state,
    config::{Parser, ServerConfig},
    run::run_graceful_with_state,
};
use tempfile::TempDir;
use tracing::debug;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";
pub const TEST_PASSWORD: &str = "verysecret123";

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "snapspot-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

#[derive(Debug, Clone, Copy)]
pub enum TestUser {
    Admin,
    User,
}

impl TestUser {
    fn email(&self) -> &'static str {
        match self {
            TestUser::Admin => ADMIN_EMAIL,
            TestUser::User => USER_EMAIL,
        }
    }
}

/// Stops the server on drop.
pub struct ServerGuard {
    stop: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Builds the server state in the temp environment, registers an admin and a
/// regular user, starts the server and returns a client authenticated as the
/// chosen user.
pub async fn launch_env(args: ServerConfig, user: TestUser) -> Result<(reqwest::Client, ServerGuard)> {
    let state = build_state(&args).await?;

    let users = UserRepositoryImpl::new(state.pool().clone());
    users
        .create(CreateUser {
            email: ADMIN_EMAIL.parse().map_err(|e| anyhow!("{e}"))?,
            name: "Admin".to_string(),
            password: Some(TEST_PASSWORD.to_string()),
            profile_picture: None,
            roles: Some(vec!["admin".to_string(), "user".to_string()]),
        })
        .await?;
    users
        .create(CreateUser {
            email: USER_EMAIL.parse().map_err(|e| anyhow!("{e}"))?,
            name: "Regular User".to_string(),
            password: Some(TEST_PASSWORD.to_string()),
            profile_picture: None,
            roles: Some(vec!["user".to_string()]),
        })
        .await?;

    let base_url = args.base_url.clone();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(run_graceful_with_state(args, state, async move {
        let _ = stop_rx.await;
    }));

    wait_for_server(&base_url).await?;

    let token = login(&base_url, user.email(), TEST_PASSWORD).await?;
    debug!("Logged in as {}", user.email());

    let mut headers = header::HeaderMap::new();
    headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse()?);
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    Ok((client, ServerGuard { stop: Some(stop_tx) }))
}

async fn wait_for_server(base_url: &url::Url) -> Result<()> {
    let client = reqwest::Client::new();
    let health_url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not come up"))
}

pub async fn login(base_url: &url::Url, email: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let response = client
        .post(base_url.join("auth/login")?)
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(anyhow!("Login failed with status {}", response.status()));
    }
    let body: serde_json::Value = response.json().await?;
    body.get("token")
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| anyhow!("No token in login response"))
}

pub fn extend_url(url: &url::Url, segment: impl ToString) -> url::Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("URL must have a path")
        .push(&segment.to_string());
    url
}
