use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;
use tower_http::normalize_path::NormalizePath;
use users_api::{
    app::build_app,
    health::services::{HealthService, Pingable},
    state::AppState,
    users::{
        repo::UsersRepo,
        repo_types::UserRow,
        services::UsersServiceImpl,
    },
};

struct Stored {
    name: String,
    email: String,
    password: String,
}

/// `users` table stand-in with SERIAL-style ids starting at 1.
pub struct MemoryUsersRepo {
    rows: Mutex<(i32, BTreeMap<i32, Stored>)>,
    calls: AtomicUsize,
    reachable: AtomicBool,
    broken: AtomicBool,
    stalled: AtomicBool,
}

impl MemoryUsersRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new((0, BTreeMap::new())),
            calls: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
            broken: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_reachable(&self, up: bool) {
        self.reachable.store(up, Ordering::SeqCst);
    }

    pub fn stored_password(&self, id: i32) -> Option<String> {
        self.rows.lock().unwrap().1.get(&id).map(|s| s.password.clone())
    }

    /// Every query fails the way an exhausted pool does.
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    /// Every query hangs until the request is cut off.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    async fn touch(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut).context("acquire connection");
        }
        Ok(())
    }
}

fn to_row(id: i32, s: &Stored) -> UserRow {
    UserRow {
        id,
        name: s.name.clone(),
        email: s.email.clone(),
    }
}

fn no_rows<T>(what: &str) -> anyhow::Result<T> {
    Err(sqlx::Error::RowNotFound).context(what.to_string())
}

#[async_trait]
impl UsersRepo for MemoryUsersRepo {
    async fn list(&self) -> anyhow::Result<Vec<UserRow>> {
        self.touch().await?;
        let guard = self.rows.lock().unwrap();
        if guard.1.is_empty() {
            return no_rows("no users found");
        }
        Ok(guard.1.iter().map(|(id, s)| to_row(*id, s)).collect())
    }

    async fn get(&self, id: i32) -> anyhow::Result<UserRow> {
        self.touch().await?;
        let guard = self.rows.lock().unwrap();
        match guard.1.get(&id) {
            Some(s) => Ok(to_row(id, s)),
            None => no_rows("get user"),
        }
    }

    async fn create(&self, name: &str, email: &str, password: &str) -> anyhow::Result<UserRow> {
        self.touch().await?;
        let mut guard = self.rows.lock().unwrap();
        guard.0 += 1;
        let id = guard.0;
        let stored = Stored {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        let row = to_row(id, &stored);
        guard.1.insert(id, stored);
        Ok(row)
    }

    async fn update(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserRow> {
        self.touch().await?;
        let mut guard = self.rows.lock().unwrap();
        match guard.1.get_mut(&id) {
            Some(s) => {
                s.name = name.into();
                s.email = email.into();
                s.password = password.into();
                Ok(to_row(id, s))
            }
            None => no_rows("update user"),
        }
    }

    async fn delete(&self, id: i32) -> anyhow::Result<UserRow> {
        self.touch().await?;
        let mut guard = self.rows.lock().unwrap();
        match guard.1.remove(&id) {
            Some(s) => Ok(to_row(id, &s)),
            None => no_rows("delete user"),
        }
    }
}

#[async_trait]
impl Pingable for MemoryUsersRepo {
    fn name(&self) -> &str {
        "Users"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }
}

pub fn test_app(repo: Arc<MemoryUsersRepo>) -> NormalizePath<Router> {
    test_app_with_timeout(repo, Duration::from_secs(15))
}

pub fn test_app_with_timeout(
    repo: Arc<MemoryUsersRepo>,
    request_timeout: Duration,
) -> NormalizePath<Router> {
    let users = Arc::new(UsersServiceImpl::new(repo.clone() as Arc<dyn UsersRepo>));
    let health = Arc::new(HealthService::new(
        vec![repo as Arc<dyn Pingable>],
        Duration::from_millis(500),
    ));
    build_app(AppState::from_parts(users, health), request_timeout)
}

pub async fn send_raw(
    app: &NormalizePath<Router>,
    method: Method,
    uri: &str,
) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub async fn send(app: &NormalizePath<Router>, method: Method, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
