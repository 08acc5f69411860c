// Session-scoped cache for reference data
//
// Categories, projects and the current user are fetched at most once per wizard session.
// Floors and phases always go to the source because they must be refetched whenever the selected
// project changes. Failed fetches are not cached, so a later call retries.

use crate::error::ApiError;
use crate::models::responses::{Category, CurrentUser, Floor, Phase, Project};
use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::ReferenceData;

pub struct CachedReferenceData<S> {
    source: S,
    categories: OnceCell<Vec<Category>>,
    projects: OnceCell<Vec<Project>>,
    current_user: OnceCell<CurrentUser>,
}

impl<S: ReferenceData> CachedReferenceData<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            categories: OnceCell::new(),
            projects: OnceCell::new(),
            current_user: OnceCell::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: ReferenceData> ReferenceData for CachedReferenceData<S> {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.categories
            .get_or_try_init(|| self.source.categories())
            .await
            .cloned()
    }

    async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.projects
            .get_or_try_init(|| self.source.projects())
            .await
            .cloned()
    }

    async fn floors(&self, project_id: &str) -> Result<Vec<Floor>, ApiError> {
        self.source.floors(project_id).await
    }

    async fn phases(&self, project_id: &str) -> Result<Vec<Phase>, ApiError> {
        self.source.phases(project_id).await
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.current_user
            .get_or_try_init(|| self.source.current_user())
            .await
            .cloned()
    }
}
