// HTTP client for the materials backend
//
// Every endpoint answers with the `{ success, data, error }` envelope. Non-2xx responses surface
// the envelope's error string when present so the user sees the server's own wording.

use crate::config::ApiSettings;
use crate::error::ApiError;
use crate::models::requests::MaterialPayload;
use crate::models::responses::{
    ApiResponse, Category, CreatedMaterial, CurrentUser, Floor, Phase, Project,
};
use crate::utils::logging::mask_sensitive;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::{MaterialGateway, ReferenceData};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(settings.timeout()).build()?;

        // A trailing slash keeps `join` from dropping the last path segment of the base.
        let mut base = settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let auth_token = settings
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        debug!(
            "[PHASE: api] [STEP: init] API client ready (base_url={}, timeout={:?}, token={})",
            base_url,
            settings.timeout(),
            auth_token
                .as_deref()
                .map(mask_sensitive)
                .unwrap_or_else(|| "<none>".to_string())
        );

        Ok(Self {
            http,
            base_url,
            auth_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        debug!("[PHASE: api] [STEP: get] GET {}", url);
        let resp = self.authorize(self.http.get(url)).send().await?;
        unwrap_envelope(path, resp).await
    }

    async fn post_data<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &[])?;
        debug!("[PHASE: api] [STEP: post] POST {}", url);
        let resp = self.authorize(self.http.post(url)).json(body).send().await?;
        unwrap_envelope(path, resp).await
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let parsed = serde_json::from_slice::<ApiResponse<T>>(&bytes);

    if !status.is_success() {
        let message = match &parsed {
            Ok(env) => env.error_text(&format!("HTTP {}", status)),
            Err(_) => error_text_from_raw(&bytes).unwrap_or_else(|| format!("HTTP {}", status)),
        };
        warn!(
            "[PHASE: api] [STEP: response] {} failed with HTTP {}: {}",
            path, status, message
        );
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let envelope = match parsed {
        Ok(env) => env,
        Err(e) => {
            warn!(
                "[PHASE: api] [STEP: response] {} returned an unreadable body: {}",
                path, e
            );
            return Err(ApiError::MissingData(path.to_string()));
        }
    };

    if !envelope.success {
        return Err(ApiError::Rejected(envelope.error_text("Request failed")));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::MissingData(path.to_string()))
}

/// Error string from a body whose `data` did not match the expected type.
fn error_text_from_raw(bytes: &[u8]) -> Option<String> {
    let env = serde_json::from_slice::<ApiResponse<serde_json::Value>>(bytes).ok()?;
    env.error.or(env.message).filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl ReferenceData for ApiClient {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_data("/api/categories", &[]).await
    }

    async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_data("/api/projects", &[]).await
    }

    async fn floors(&self, project_id: &str) -> Result<Vec<Floor>, ApiError> {
        self.get_data("/api/floors", &[("projectId", project_id)])
            .await
    }

    async fn phases(&self, project_id: &str) -> Result<Vec<Phase>, ApiError> {
        self.get_data("/api/phases", &[("projectId", project_id)])
            .await
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_data("/api/auth/me", &[]).await
    }
}

#[async_trait]
impl MaterialGateway for ApiClient {
    async fn create_material(&self, payload: &MaterialPayload) -> Result<CreatedMaterial, ApiError> {
        self.post_data("/api/materials", payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base: &str) -> ApiSettings {
        ApiSettings {
            base_url: base.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_query() {
        let client = ApiClient::new(&settings("https://example.com/site")).unwrap();
        let url = client
            .endpoint("/api/floors", &[("projectId", "P 1&x")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/site/api/floors?projectId=P+1%26x"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new(&settings("not a url")),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn blank_token_is_ignored() {
        let mut s = settings("http://localhost:3000");
        s.auth_token = Some("   ".to_string());
        let client = ApiClient::new(&s).unwrap();
        assert!(client.auth_token.is_none());
    }
}
