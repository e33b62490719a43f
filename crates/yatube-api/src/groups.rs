use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use yatube_types::api::{Claims, GroupForm};
use yatube_types::models::Group;

use crate::error::ApiError;
use crate::forms;
use crate::state::{AppState, with_db};

/// POST /group/
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(form), _): WithRejection<Json<GroupForm>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = forms::clean_group(&form);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let title = form.title.trim().to_string();
    let description = form.description.trim().to_string();
    let slug = form.slug;

    let created = with_db(&state, move |db| {
        let id = db.create_group(&title, &slug, &description)?;
        Ok(id.map(|id| Group {
            id,
            title,
            slug,
            description,
        }))
    })
    .await?;
    let Some(group) = created else {
        errors.add("slug", "Group with this Slug already exists.");
        return Err(ApiError::Validation(errors));
    };

    info!("Group {} ({}) created by {}", group.slug, group.id, claims.username);
    Ok((StatusCode::CREATED, Json(group)))
}
