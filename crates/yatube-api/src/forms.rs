use serde_json::json;

use yatube_types::api::{Choice, FieldKind, FormErrors, FormField, FormSchema, GroupForm, PostForm};
use yatube_types::models::{Group, Post};

use crate::media::{self, ImageUpload};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 50;

/// What a post form submission asks the image to become.
#[derive(Debug)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ImageUpload),
}

/// A post form that passed every check not needing the database.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group: Option<i64>,
    pub image: ImageChange,
}

/// Field-level checks for the post form. Whether `group` exists is checked
/// later against the database and reported into the same error map.
pub fn clean_post(form: PostForm) -> (CleanPost, FormErrors) {
    let mut errors = FormErrors::default();

    let text = form.text.trim().to_string();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }

    let image = match (form.image.as_deref(), form.image_clear) {
        (Some(_), true) => {
            errors.add(
                "image",
                "Please either submit a file or check the clear checkbox, not both.",
            );
            ImageChange::Keep
        }
        (Some(encoded), false) => match media::decode_image(encoded) {
            Ok(upload) => ImageChange::Replace(upload),
            Err(message) => {
                errors.add("image", message);
                ImageChange::Keep
            }
        },
        (None, true) => ImageChange::Clear,
        (None, false) => ImageChange::Keep,
    };

    (
        CleanPost {
            text,
            group: form.group,
            image,
        },
        errors,
    )
}

pub fn clean_group(form: &GroupForm) -> FormErrors {
    let mut errors = FormErrors::default();

    let title = form.title.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", "Ensure this value has at most 200 characters.");
    }

    let slug = form.slug.as_str();
    if slug.is_empty() {
        errors.add("slug", REQUIRED);
    } else if slug.len() > MAX_SLUG_LEN {
        errors.add("slug", "Ensure this value has at most 50 characters.");
    } else if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        errors.add(
            "slug",
            "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.",
        );
    }

    if form.description.trim().is_empty() {
        errors.add("description", REQUIRED);
    }

    errors
}

/// The post form, optionally pre-filled from an existing post.
pub fn post_form_schema(groups: &[Group], initial: Option<&Post>) -> FormSchema {
    let choices = groups
        .iter()
        .map(|g| Choice {
            value: g.id,
            label: g.title.clone(),
        })
        .collect();

    FormSchema {
        fields: vec![
            FormField {
                name: "text".into(),
                required: true,
                kind: FieldKind::Text,
                initial: initial.map(|p| json!(p.text)),
            },
            FormField {
                name: "group".into(),
                required: false,
                kind: FieldKind::Choice { choices },
                initial: initial.and_then(|p| p.group.as_ref()).map(|g| json!(g.id)),
            },
            FormField {
                name: "image".into(),
                required: false,
                kind: FieldKind::Image,
                initial: initial.and_then(|p| p.image.as_ref()).map(|i| json!(i)),
            },
        ],
    }
}

pub fn comment_form_schema() -> FormSchema {
    FormSchema {
        fields: vec![FormField {
            name: "text".into(),
            required: true,
            kind: FieldKind::Text,
            initial: None,
        }],
    }
}
