// Async orchestration around the pure state machine
//
// Read failures never block the wizard: they are logged and degrade to empty lists.
// Submit failures are returned with the server's wording and are never retried here.

use crate::api::{MaterialGateway, ReferenceData};
use crate::config::WizardSettings;
use crate::error::SubmitError;
use crate::models::draft::EntryType;
use crate::models::responses::{Category, Floor, Phase, Project};
use crate::wizard::payload::build_payload;
use crate::wizard::state::WizardState;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lists that do not depend on the selected project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    pub categories: Vec<Category>,
    pub projects: Vec<Project>,
}

/// Lists scoped to one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectScope {
    pub project_id: String,
    pub floors: Vec<Floor>,
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub material_id: String,
    pub capital_warning: Option<String>,
    /// Where the new material can be viewed in the web app.
    pub detail_path: String,
}

pub async fn load_lookups<R: ReferenceData + ?Sized>(source: &R) -> Lookups {
    let (categories, projects) = futures::future::join(source.categories(), source.projects()).await;

    let categories = categories.unwrap_or_else(|e| {
        error!(
            "[PHASE: lookups] [STEP: categories] Failed to load categories: {}",
            e
        );
        Vec::new()
    });
    let projects = projects.unwrap_or_else(|e| {
        error!(
            "[PHASE: lookups] [STEP: projects] Failed to load projects: {}",
            e
        );
        Vec::new()
    });

    info!(
        "[PHASE: lookups] [STEP: loaded] categories={} projects={}",
        categories.len(),
        projects.len()
    );
    Lookups {
        categories,
        projects,
    }
}

/// Fetch floors, then phases, for `project_id`. `None` means the token fired first.
pub async fn load_project_scope<R: ReferenceData + ?Sized>(
    source: &R,
    project_id: &str,
    cancel: &CancellationToken,
) -> Option<ProjectScope> {
    let floors = tokio::select! {
        _ = cancel.cancelled() => {
            info!("[PHASE: lookups] [STEP: scope] Scope fetch for project {} cancelled", project_id);
            return None;
        }
        res = source.floors(project_id) => res.unwrap_or_else(|e| {
            error!("[PHASE: lookups] [STEP: floors] Failed to load floors for {}: {}", project_id, e);
            Vec::new()
        }),
    };

    let phases = tokio::select! {
        _ = cancel.cancelled() => {
            info!("[PHASE: lookups] [STEP: scope] Scope fetch for project {} cancelled", project_id);
            return None;
        }
        res = source.phases(project_id) => res.unwrap_or_else(|e| {
            error!("[PHASE: lookups] [STEP: phases] Failed to load phases for {}: {}", project_id, e);
            Vec::new()
        }),
    };

    Some(ProjectScope {
        project_id: project_id.to_string(),
        floors,
        phases,
    })
}

/// Entry type to preselect for the signed-in user, if their role has a default.
pub async fn default_entry_type<R: ReferenceData + ?Sized>(
    source: &R,
    settings: &WizardSettings,
) -> Option<EntryType> {
    let user = match source.current_user().await {
        Ok(u) => u,
        Err(e) => {
            warn!(
                "[PHASE: lookups] [STEP: current_user] Could not load current user: {}",
                e
            );
            return None;
        }
    };

    let role = user.role.trim().to_ascii_lowercase();
    let retroactive = settings
        .retroactive_roles
        .iter()
        .any(|r| r.trim().eq_ignore_ascii_case(&role));

    info!(
        "[PHASE: lookups] [STEP: current_user] role={} default_entry_type={}",
        role,
        if retroactive { "retroactive_entry" } else { "<chooser>" }
    );
    retroactive.then_some(EntryType::RetroactiveEntry)
}

pub async fn submit<G: MaterialGateway + ?Sized>(
    gateway: &G,
    state: &WizardState,
    categories: &[Category],
) -> Result<SubmitOutcome, SubmitError> {
    let correlation_id = Uuid::new_v4().simple().to_string();

    let payload = match build_payload(state, categories) {
        Ok(p) => p,
        Err(e) => {
            warn!(
                "[PHASE: submit] [STEP: validate] Submit blocked (correlation_id={}): {}",
                correlation_id, e
            );
            return Err(e.into());
        }
    };

    info!(
        "[PHASE: submit] [STEP: post] Creating material '{}' for project {} (correlation_id={}, cost_status={:?})",
        payload.name, payload.project_id, correlation_id, payload.cost_status
    );

    match gateway.create_material(&payload).await {
        Ok(created) => {
            let capital_warning = created
                .capital_warning
                .as_ref()
                .map(|w| w.message().trim().to_string())
                .filter(|m| !m.is_empty());
            if let Some(w) = &capital_warning {
                warn!(
                    "[PHASE: submit] [STEP: capital] Capital warning for material {}: {}",
                    created.id, w
                );
            }
            info!(
                "[PHASE: submit] [STEP: done] Material {} created (correlation_id={})",
                created.id, correlation_id
            );
            Ok(SubmitOutcome {
                detail_path: format!("/items/{}", created.id),
                material_id: created.id,
                capital_warning,
            })
        }
        Err(e) => {
            error!(
                "[PHASE: submit] [STEP: post] Create material failed (correlation_id={}): {}",
                correlation_id, e
            );
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ValidationError};
    use crate::models::draft::MaterialDraft;
    use crate::models::requests::MaterialPayload;
    use crate::models::responses::{CapitalWarning, CreatedMaterial, CurrentUser};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    // -------------------------------------------------------------------------
    // Fakes
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct FakeReference {
        fail_categories: bool,
        fail_floors: bool,
        hang_phases: bool,
        role: Option<String>,
        floor_requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReferenceData for FakeReference {
        async fn categories(&self) -> Result<Vec<Category>, ApiError> {
            if self.fail_categories {
                return Err(ApiError::Status {
                    status: 500,
                    message: "db down".to_string(),
                });
            }
            Ok(vec![Category {
                id: "c1".to_string(),
                name: "Tiling".to_string(),
            }])
        }

        async fn projects(&self) -> Result<Vec<Project>, ApiError> {
            Ok(vec![Project {
                id: "P1".to_string(),
                name: "Lekki Towers".to_string(),
            }])
        }

        async fn floors(&self, project_id: &str) -> Result<Vec<Floor>, ApiError> {
            self.floor_requests
                .lock()
                .unwrap()
                .push(project_id.to_string());
            if self.fail_floors {
                return Err(ApiError::Rejected("no floors".to_string()));
            }
            Ok(vec![Floor {
                id: format!("{}-F1", project_id),
                name: "First".to_string(),
                floor_number: Some(1),
            }])
        }

        async fn phases(&self, project_id: &str) -> Result<Vec<Phase>, ApiError> {
            if self.hang_phases {
                std::future::pending::<()>().await;
            }
            Ok(vec![Phase {
                id: format!("{}-PH1", project_id),
                name: "Superstructure".to_string(),
                project_id: Some(project_id.to_string()),
            }])
        }

        async fn current_user(&self) -> Result<CurrentUser, ApiError> {
            match &self.role {
                Some(role) => Ok(CurrentUser {
                    id: "u1".to_string(),
                    name: "Ngozi".to_string(),
                    email: "ngozi@example.com".to_string(),
                    role: role.clone(),
                }),
                None => Err(ApiError::Status {
                    status: 401,
                    message: "Unauthorized".to_string(),
                }),
            }
        }
    }

    struct FakeGateway {
        result: Mutex<Option<Result<CreatedMaterial, ApiError>>>,
        received: Mutex<Vec<MaterialPayload>>,
    }

    impl FakeGateway {
        fn returning(result: Result<CreatedMaterial, ApiError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                received: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MaterialGateway for FakeGateway {
        async fn create_material(&self, payload: &MaterialPayload) -> Result<CreatedMaterial, ApiError> {
            self.received.lock().unwrap().push(payload.clone());
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ApiError::Rejected("called twice".to_string())))
        }
    }

    fn ready_state() -> WizardState {
        let mut s = WizardState::new();
        s.choose_entry_type(EntryType::RetroactiveEntry);
        s.draft = MaterialDraft {
            project_id: "P1".to_string(),
            name: "Cement".to_string(),
            phase_id: "PH1".to_string(),
            quantity: Some(50.0),
            unit: "bag".to_string(),
            ..Default::default()
        };
        s
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn lookup_failures_degrade_to_empty_lists() {
        let source = FakeReference {
            fail_categories: true,
            ..Default::default()
        };
        let lookups = load_lookups(&source).await;
        assert!(lookups.categories.is_empty());
        assert_eq!(lookups.projects.len(), 1);
    }

    #[tokio::test]
    async fn project_scope_is_fetched_for_the_given_project() {
        let source = FakeReference::default();
        let scope = load_project_scope(&source, "P2", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(scope.project_id, "P2");
        assert_eq!(scope.floors[0].id, "P2-F1");
        assert_eq!(scope.phases[0].id, "P2-PH1");
        assert_eq!(*source.floor_requests.lock().unwrap(), vec!["P2"]);
    }

    #[tokio::test]
    async fn floor_failure_still_loads_phases() {
        let source = FakeReference {
            fail_floors: true,
            ..Default::default()
        };
        let scope = load_project_scope(&source, "P1", &CancellationToken::new())
            .await
            .unwrap();
        assert!(scope.floors.is_empty());
        assert_eq!(scope.phases.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_scope_fetch_returns_none() {
        let source = FakeReference {
            hang_phases: true,
            ..Default::default()
        };
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });
        let scope = tokio::time::timeout(
            Duration::from_secs(5),
            load_project_scope(&source, "P1", &token),
        )
        .await
        .expect("cancellation should end the fetch");
        assert!(scope.is_none());
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_fetch() {
        let source = FakeReference::default();
        let token = CancellationToken::new();
        token.cancel();
        assert!(load_project_scope(&source, "P1", &token).await.is_none());
        assert!(source.floor_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scope_result_reconciles_state() {
        let source = FakeReference::default();
        let mut state = ready_state();
        state.draft.floor = Some("gone".to_string());
        let scope = load_project_scope(&source, "P1", &CancellationToken::new())
            .await
            .unwrap();
        assert!(state.apply_project_scope(&scope.project_id, &scope.floors, &scope.phases));
        assert!(state.draft.floor.is_none());
        assert!(state.draft.phase_id.is_empty(), "PH1 is not in P1's phase list");
    }

    // -------------------------------------------------------------------------
    // Default entry type
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn configured_role_defaults_to_retroactive() {
        let settings = WizardSettings {
            retroactive_roles: vec!["Site_Engineer".to_string()],
            ..Default::default()
        };
        let source = FakeReference {
            role: Some("site_engineer".to_string()),
            ..Default::default()
        };
        assert_eq!(
            default_entry_type(&source, &settings).await,
            Some(EntryType::RetroactiveEntry)
        );

        let owner = FakeReference {
            role: Some("owner".to_string()),
            ..Default::default()
        };
        assert_eq!(default_entry_type(&owner, &settings).await, None);
    }

    #[tokio::test]
    async fn unknown_user_leaves_chooser() {
        let source = FakeReference::default();
        assert_eq!(
            default_entry_type(&source, &WizardSettings::default()).await,
            None
        );
    }

    // -------------------------------------------------------------------------
    // Submit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn submit_posts_payload_and_returns_detail_path() {
        let gateway = FakeGateway::returning(Ok(CreatedMaterial {
            id: "m42".to_string(),
            capital_warning: None,
        }));
        let outcome = submit(&gateway, &ready_state(), &[]).await.unwrap();
        assert_eq!(outcome.material_id, "m42");
        assert_eq!(outcome.detail_path, "/items/m42");
        assert!(outcome.capital_warning.is_none());

        let sent = gateway.received.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "Cement");
        assert!(sent[0].unit_cost.is_none());
    }

    #[tokio::test]
    async fn submit_surfaces_capital_warning() {
        let gateway = FakeGateway::returning(Ok(CreatedMaterial {
            id: "m1".to_string(),
            capital_warning: Some(CapitalWarning::Text(
                "Material cost exceeds available capital".to_string(),
            )),
        }));
        let outcome = submit(&gateway, &ready_state(), &[]).await.unwrap();
        assert_eq!(
            outcome.capital_warning.as_deref(),
            Some("Material cost exceeds available capital")
        );
    }

    #[tokio::test]
    async fn submit_error_keeps_server_message() {
        let gateway = FakeGateway::returning(Err(ApiError::Status {
            status: 403,
            message: "You do not have access to this project".to_string(),
        }));
        let err = submit(&gateway, &ready_state(), &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "You do not have access to this project");
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_gateway() {
        let gateway = FakeGateway::returning(Err(ApiError::Rejected("unused".to_string())));
        let mut state = ready_state();
        state.draft.name.clear();
        let err = submit(&gateway, &state, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::NameRequired)
        ));
        assert!(gateway.received.lock().unwrap().is_empty());
    }
}
