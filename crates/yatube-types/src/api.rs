use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AuthorCard, Comment, Group, Post};
use crate::pagination::Page;

// -- JWT Claims --

/// Bearer token claims. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

// -- Forms --

/// Body of `POST /new/` and `POST /{username}/{post_id}/edit/`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    pub group: Option<i64>,
    /// Base64-encoded image bytes.
    pub image: Option<String>,
    /// Drop the current image on edit.
    #[serde(default)]
    pub image_clear: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupForm {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormErrors(pub BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Describes a form the client should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Choice { choices: Vec<Choice> },
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: i64,
    pub label: String,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// -- Page contexts --

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPage {
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupPage {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePage {
    pub author: AuthorCard,
    pub page: Page<Post>,
    pub is_following: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostPage {
    pub post: Post,
    pub author: AuthorCard,
    pub comments: Vec<Comment>,
    pub form: FormSchema,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostFormPage {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    pub form: FormSchema,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowPage {
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPage {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FormErrors>,
}
