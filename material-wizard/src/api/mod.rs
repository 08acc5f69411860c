// Backend collaborators
//
// The wizard only talks to the backend through these traits so tests (and the TUI smoke mode)
// can substitute in-memory fakes. `ApiClient` is the production implementation.

pub mod cache;
pub mod client;

use crate::error::ApiError;
use crate::models::requests::MaterialPayload;
use crate::models::responses::{Category, CreatedMaterial, CurrentUser, Floor, Phase, Project};
use async_trait::async_trait;

pub use cache::CachedReferenceData;
pub use client::ApiClient;

/// Read-only lookups the wizard needs.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// GET `/api/categories`
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    /// GET `/api/projects`
    async fn projects(&self) -> Result<Vec<Project>, ApiError>;

    /// GET `/api/floors?projectId=`
    async fn floors(&self, project_id: &str) -> Result<Vec<Floor>, ApiError>;

    /// GET `/api/phases?projectId=`
    async fn phases(&self, project_id: &str) -> Result<Vec<Phase>, ApiError>;

    /// GET `/api/auth/me`
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
}

/// Write side: material creation.
#[async_trait]
pub trait MaterialGateway: Send + Sync {
    /// POST `/api/materials`
    async fn create_material(&self, payload: &MaterialPayload) -> Result<CreatedMaterial, ApiError>;
}
