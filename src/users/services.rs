use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::error;

use super::dto::{UserRequest, UserResponse};
use super::password::hash_password;
use super::repo::UsersRepo;

#[async_trait]
pub trait UsersService: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<UserResponse>>;
    async fn get(&self, request: UserRequest) -> anyhow::Result<UserResponse>;
    async fn create(&self, request: UserRequest) -> anyhow::Result<UserResponse>;
    async fn update(&self, request: UserRequest) -> anyhow::Result<UserResponse>;
    async fn delete(&self, request: UserRequest) -> anyhow::Result<UserResponse>;
}

/// Maps repo rows to responses and logs failures; errors pass through as-is.
pub struct UsersServiceImpl {
    repo: Arc<dyn UsersRepo>,
}

impl UsersServiceImpl {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UsersService for UsersServiceImpl {
    async fn list(&self) -> anyhow::Result<Vec<UserResponse>> {
        let rows = self.repo.list().await.inspect_err(|e| {
            error!(error = %e, "could not list users");
        })?;
        Ok(rows.into_iter().map(UserResponse::from).collect())
    }

    async fn get(&self, request: UserRequest) -> anyhow::Result<UserResponse> {
        let id = request.id.context("user id is required")?;
        let row = self.repo.get(id).await.inspect_err(|e| {
            error!(error = %e, id, "could not get user");
        })?;
        Ok(row.into())
    }

    async fn create(&self, request: UserRequest) -> anyhow::Result<UserResponse> {
        let (name, email, password) = fields(request)?;
        let hash = hash_password(&password).await?;
        let row = self
            .repo
            .create(&name, &email, &hash)
            .await
            .inspect_err(|e| {
                error!(error = %e, "could not create user");
            })?;
        Ok(row.into())
    }

    async fn update(&self, request: UserRequest) -> anyhow::Result<UserResponse> {
        let id = request.id.context("user id is required")?;
        let (name, email, password) = fields(request)?;
        let hash = hash_password(&password).await?;
        let row = self
            .repo
            .update(id, &name, &email, &hash)
            .await
            .inspect_err(|e| {
                error!(error = %e, id, "could not update user");
            })?;
        Ok(row.into())
    }

    async fn delete(&self, request: UserRequest) -> anyhow::Result<UserResponse> {
        let id = request.id.context("user id is required")?;
        let row = self.repo.delete(id).await.inspect_err(|e| {
            error!(error = %e, id, "could not delete user");
        })?;
        Ok(row.into())
    }
}

fn fields(request: UserRequest) -> anyhow::Result<(String, String, String)> {
    Ok((
        request.name.context("user name is required")?,
        request.email.context("user email is required")?,
        request.password.context("user password is required")?,
    ))
}
