use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The submission form as the UI holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub title: String,
    pub body: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub poll_enabled: bool,
    pub poll_options: Vec<String>,
}

/// Form fields as persisted. Absent fields leave the form untouched on restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_options: Option<Vec<String>>,
}

/// A persisted draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(flatten)]
    pub fields: DraftFields,
    pub saved_at: DateTime<Utc>,
}

impl From<&FormState> for DraftFields {
    fn from(form: &FormState) -> Self {
        Self {
            title: Some(form.title.clone()),
            body: Some(form.body.clone()),
            category: Some(form.category.clone()),
            subcategory: form.subcategory.clone(),
            poll_enabled: Some(form.poll_enabled),
            poll_options: Some(form.poll_options.clone()),
        }
    }
}

impl DraftFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every present field onto `form`. Returns the names applied.
    pub fn apply_to(&self, form: &mut FormState) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(title) = &self.title {
            form.title = title.clone();
            applied.push("title");
        }
        if let Some(body) = &self.body {
            form.body = body.clone();
            applied.push("body");
        }
        if let Some(category) = &self.category {
            form.category = category.clone();
            applied.push("category");
        }
        if let Some(subcategory) = &self.subcategory {
            form.subcategory = Some(subcategory.clone());
            applied.push("subcategory");
        }
        if let Some(poll_enabled) = self.poll_enabled {
            form.poll_enabled = poll_enabled;
            applied.push("pollEnabled");
        }
        if let Some(options) = &self.poll_options {
            form.poll_options = options.clone();
            applied.push("pollOptions");
        }
        applied
    }
}
