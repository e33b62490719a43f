use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{debug, info};

use yatube_db::PostScope;
use yatube_types::api::{
    Claims, CommentForm, GroupPage, IndexPage, PostForm, PostFormPage, PostPage,
    ProfilePage,
};
use yatube_types::models::Post;
use yatube_types::pagination::{POSTS_PER_PAGE, Page, PageWindow, Paginator};

use crate::convert::{author_card, comment_from_row, group_from_row, post_from_row};
use crate::error::{ApiError, found};
use crate::forms::{self, INVALID_CHOICE, ImageChange};
use crate::routes::post_url;
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Post ids in URLs are integers; anything else is simply not a page.
pub(crate) fn parse_post_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// Counts the scope and resolves the requested page against it.
async fn resolve_page(
    state: &AppState,
    scope: PostScope,
    page: Option<String>,
) -> Result<(Paginator, PageWindow), ApiError> {
    with_db(state, move |db| {
        let paginator = Paginator::new(db.count_posts(scope)?, POSTS_PER_PAGE);
        Ok((paginator, paginator.get_page(page.as_deref())))
    })
    .await
}

async fn load_window(
    state: &AppState,
    scope: PostScope,
    paginator: Paginator,
    window: PageWindow,
) -> Result<Page<Post>, ApiError> {
    let rows = with_db(state, move |db| db.list_posts(scope, window.limit, window.offset)).await?;
    let items = rows.into_iter().map(post_from_row).collect();
    Ok(Page::new(items, window, &paginator))
}

pub(crate) async fn load_posts(
    state: &AppState,
    scope: PostScope,
    page: Option<String>,
) -> Result<Page<Post>, ApiError> {
    let (paginator, window) = resolve_page(state, scope, page).await?;
    load_window(state, scope, paginator, window).await
}

async fn find_post(state: &AppState, username: String, post_id: i64) -> Result<Post, ApiError> {
    with_db(state, move |db| db.get_post(&username, post_id))
        .await?
        .map(post_from_row)
        .ok_or(ApiError::NotFound)
}

fn json_body(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// GET /: every post, newest first. Served from the index cache when warm.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let (paginator, window) = resolve_page(&state, PostScope::All, query.page).await?;
    if let Some(body) = state.index_cache.get(window.number).await {
        return Ok(json_body(body));
    }

    let page = load_window(&state, PostScope::All, paginator, window).await?;
    let body = serde_json::to_vec(&IndexPage { page }).map_err(anyhow::Error::from)?;
    let body = Bytes::from(body);
    state.index_cache.insert(window.number, body.clone()).await;

    Ok(json_body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupPage>, ApiError> {
    let group = with_db(&state, move |db| db.get_group_by_slug(&slug))
        .await?
        .map(group_from_row)
        .ok_or(ApiError::NotFound)?;

    let page = load_posts(&state, PostScope::Group(group.id), query.page).await?;
    Ok(Json(GroupPage { group, page }))
}

/// GET /{username}/
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    viewer: Option<Extension<Claims>>,
) -> Result<Json<ProfilePage>, ApiError> {
    let viewer_id = viewer.map(|Extension(claims)| claims.sub);

    let (author, is_following) = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_username(&username)? else {
            return Ok(None);
        };
        let stats = db.author_stats(user.id)?;
        let is_following = match viewer_id {
            Some(viewer_id) => db.is_following(viewer_id, user.id)?,
            None => false,
        };
        Ok(Some((author_card(&user, stats), is_following)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let page = load_posts(&state, PostScope::Author(author.id), query.page).await?;
    Ok(Json(ProfilePage {
        author,
        page,
        is_following,
    }))
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Json<PostPage>, ApiError> {
    let post_id = parse_post_id(&post_id)?;

    let context = with_db(&state, move |db| {
        let Some(row) = db.get_post(&username, post_id)? else {
            return Ok(None);
        };
        let Some(user) = db.get_user_by_id(row.author_id)? else {
            return Ok(None);
        };
        let stats = db.author_stats(user.id)?;
        let comments = db.list_comments(post_id)?;

        Ok(Some(PostPage {
            post: post_from_row(row),
            author: author_card(&user, stats),
            comments: comments.into_iter().map(comment_from_row).collect(),
            form: forms::comment_form_schema(),
        }))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(context))
}

/// Validates a post form against the database and persists it, creating a
/// post when `existing` is `None`. Returns the post id.
async fn save_post_form(
    state: &AppState,
    author_id: i64,
    existing: Option<&Post>,
    form: PostForm,
) -> Result<i64, ApiError> {
    let (clean, mut errors) = forms::clean_post(form);

    if let Some(group_id) = clean.group {
        let exists = with_db(state, move |db| db.get_group_by_id(group_id))
            .await?
            .is_some();
        if !exists {
            errors.add("group", INVALID_CHOICE);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let image = match clean.image {
        ImageChange::Keep => existing.and_then(|p| p.image.clone()),
        ImageChange::Clear => None,
        ImageChange::Replace(upload) => Some(state.media.save_post_image(&upload).await?),
    };

    let text = clean.text;
    let group = clean.group;
    match existing {
        Some(post) => {
            let id = post.id;
            with_db(state, move |db| db.update_post(id, &text, group, image.as_deref())).await?;
            Ok(id)
        }
        None => {
            with_db(state, move |db| {
                db.create_post(author_id, &text, group, image.as_deref())
            })
            .await
        }
    }
}

async fn post_form_page(state: &AppState, post: Option<Post>) -> Result<PostFormPage, ApiError> {
    let groups = with_db(state, |db| db.list_groups()).await?;
    let groups: Vec<_> = groups.into_iter().map(group_from_row).collect();

    Ok(PostFormPage {
        is_edit: post.is_some(),
        form: forms::post_form_schema(&groups, post.as_ref()),
        post,
    })
}

/// GET /new/
pub async fn new_post_form(State(state): State<AppState>) -> Result<Json<PostFormPage>, ApiError> {
    Ok(Json(post_form_page(&state, None).await?))
}

/// POST /new/
pub async fn new_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(form), _): WithRejection<Json<PostForm>, ApiError>,
) -> Result<Response, ApiError> {
    let post_id = save_post_form(&state, claims.sub, None, form).await?;
    info!("Post {} created by {}", post_id, claims.username);
    Ok(found("/"))
}

/// GET /{username}/{post_id}/edit/: only the author gets the form.
pub async fn post_edit_form(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = find_post(&state, username, post_id).await?;

    if post.author.id != claims.sub {
        return Ok(found(&post_url(&post.author.username, post.id)));
    }

    Ok(Json(post_form_page(&state, Some(post)).await?).into_response())
}

/// POST /{username}/{post_id}/edit/
pub async fn post_edit(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
    form: Result<Json<PostForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = find_post(&state, username, post_id).await?;
    let target = post_url(&post.author.username, post.id);

    if post.author.id != claims.sub {
        debug!("{} tried to edit post {} of {}", claims.username, post.id, post.author.username);
        return Ok(found(&target));
    }

    let Json(form) = form?;
    save_post_form(&state, claims.sub, Some(&post), form).await?;
    info!("Post {} edited by {}", post.id, claims.username);
    Ok(found(&target))
}

/// POST /{username}/{post_id}/comment/: an invalid comment is dropped and
/// the user lands back on the post either way.
pub async fn add_comment(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
    form: Result<Json<CommentForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = find_post(&state, username, post_id).await?;

    let text = match form {
        Ok(Json(form)) => form.text.trim().to_string(),
        Err(rejection) => {
            debug!("Unreadable comment body on post {}: {}", post.id, rejection.body_text());
            String::new()
        }
    };
    if text.is_empty() {
        debug!("Dropped empty comment on post {} from {}", post.id, claims.username);
    } else {
        let author_id = claims.sub;
        let comment_id =
            with_db(&state, move |db| db.create_comment(post_id, author_id, &text)).await?;
        info!("Comment {} on post {} by {}", comment_id, post.id, claims.username);
    }

    Ok(found(&post_url(&post.author.username, post.id)))
}

/// GET /{username}/{post_id}/comment/: nothing to submit, back to the post.
pub async fn comment_redirect(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = find_post(&state, username, post_id).await?;
    Ok(found(&post_url(&post.author.username, post.id)))
}
