use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::Response,
};
use tracing::{debug, info};

use yatube_db::PostScope;
use yatube_types::api::{Claims, FollowPage};

use crate::error::{ApiError, found};
use crate::posts::{PageQuery, load_posts};
use crate::routes::profile_url;
use crate::state::{AppState, with_db};

/// GET /follow/: posts of every author the user follows.
pub async fn follow_index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FollowPage>, ApiError> {
    let page = load_posts(&state, PostScope::Feed(claims.sub), query.page).await?;
    Ok(Json(FollowPage { page }))
}

async fn author_id(state: &AppState, username: String) -> Result<i64, ApiError> {
    with_db(state, move |db| db.get_user_by_username(&username))
        .await?
        .map(|user| user.id)
        .ok_or(ApiError::NotFound)
}

/// /{username}/follow/: idempotent; following yourself is a no-op.
pub async fn profile_follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let author = author_id(&state, username.clone()).await?;

    if author == claims.sub {
        debug!("{} tried to follow themselves", claims.username);
    } else {
        let user = claims.sub;
        if with_db(&state, move |db| db.follow(user, author)).await? {
            info!("{} now follows {}", claims.username, username);
        }
    }

    Ok(found(&profile_url(&username)))
}

/// /{username}/unfollow/: 404 when there is no such follow edge.
pub async fn profile_unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let author = author_id(&state, username.clone()).await?;

    let user = claims.sub;
    if !with_db(&state, move |db| db.unfollow(user, author)).await? {
        return Err(ApiError::NotFound);
    }
    info!("{} unfollowed {}", claims.username, username);

    Ok(found(&profile_url(&username)))
}
