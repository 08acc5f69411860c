// API response models
// Shapes returned by the `/api/*` backend. Identifiers may arrive as `id` or `_id`.

use serde::{Deserialize, Serialize};

// =========================
// Generic wrapper ({ success, data, error })
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }

    /// Error text to show the user: `error`, then `message`, then the fallback.
    pub fn error_text(&self, fallback: &str) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

// =========================
// Reference data
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "projectName")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub floor_number: Option<i32>,
}

impl Floor {
    pub fn display_name(&self) -> String {
        match (self.name.trim().is_empty(), self.floor_number) {
            (false, _) => self.name.clone(),
            (true, Some(0)) => "Ground Floor".to_string(),
            (true, Some(n)) if n < 0 => format!("Basement {}", -n),
            (true, Some(n)) => format!("Floor {}", n),
            (true, None) => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "phaseName")]
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

// =========================
// Materials
// =========================

/// Advisory returned when a material's cost exceeds the project's available capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapitalWarning {
    Text(String),
    Detail {
        message: String,
        #[serde(default, rename = "availableCapital")]
        available_capital: Option<f64>,
        #[serde(default, rename = "materialCost")]
        material_cost: Option<f64>,
    },
}

impl CapitalWarning {
    pub fn message(&self) -> &str {
        match self {
            CapitalWarning::Text(s) => s,
            CapitalWarning::Detail { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMaterial {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_warning: Option<CapitalWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accepts_mongo_style_ids() {
        let raw = r#"{"success":true,"data":[{"_id":"c1","name":"Electrical"}]}"#;
        let parsed: ApiResponse<Vec<Category>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data.unwrap()[0].id, "c1");
    }

    #[test]
    fn error_text_prefers_error_then_message() {
        let mut r: ApiResponse<()> = ApiResponse::fail("boom");
        assert_eq!(r.error_text("fallback"), "boom");
        r.error = None;
        r.message = Some("from message".to_string());
        assert_eq!(r.error_text("fallback"), "from message");
        r.message = Some("   ".to_string());
        assert_eq!(r.error_text("fallback"), "fallback");
    }

    #[test]
    fn capital_warning_accepts_text_or_object() {
        let text: CreatedMaterial =
            serde_json::from_str(r#"{"id":"m1","capitalWarning":"Low funds"}"#).unwrap();
        assert_eq!(text.capital_warning.unwrap().message(), "Low funds");

        let detail: CreatedMaterial = serde_json::from_str(
            r#"{"_id":"m2","capitalWarning":{"message":"Exceeds capital","availableCapital":100.0}}"#,
        )
        .unwrap();
        assert_eq!(detail.id, "m2");
        assert_eq!(detail.capital_warning.unwrap().message(), "Exceeds capital");
    }

    #[test]
    fn floor_display_name_falls_back_to_number() {
        let ground = Floor {
            id: "f0".to_string(),
            name: String::new(),
            floor_number: Some(0),
        };
        assert_eq!(ground.display_name(), "Ground Floor");
        let basement = Floor {
            id: "b1".to_string(),
            name: String::new(),
            floor_number: Some(-1),
        };
        assert_eq!(basement.display_name(), "Basement 1");
    }
}
