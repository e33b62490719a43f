use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use yatube_types::api::ErrorPage;

use crate::middleware::{optional_auth, require_auth};
use crate::state::AppState;
use crate::{auth, follow, groups, posts};

pub fn profile_url(username: &str) -> String {
    format!("/{username}/")
}

pub fn post_url(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

/// The whole site. Static first segments (`new`, `follow`, `group`, `auth`)
/// take precedence over `{username}`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", post(auth::login));

    let browsing_routes = Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/{username}/", get(posts::profile))
        .route("/{username}/{post_id}/", get(posts::post_view))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected_routes = Router::new()
        .route("/new/", get(posts::new_post_form).post(posts::new_post))
        .route("/group/", post(groups::create_group))
        .route("/follow/", get(follow::follow_index))
        .route(
            "/{username}/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route(
            "/{username}/{post_id}/comment/",
            get(posts::comment_redirect).post(posts::add_comment),
        )
        .route(
            "/{username}/follow/",
            get(follow::profile_follow).post(follow::profile_follow),
        )
        .route(
            "/{username}/unfollow/",
            get(follow::profile_unfollow).post(follow::profile_unfollow),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(browsing_routes)
        .merge(protected_routes)
        .fallback(page_not_found)
        .with_state(state)
}

async fn page_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorPage {
            error: "not found".into(),
            path: Some(uri.path().to_string()),
            errors: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use yatube_db::{Database, PostScope};
    use yatube_types::api::{
        FieldKind, FollowPage, GroupPage, IndexPage, NON_FIELD_ERRORS, PostFormPage, PostPage,
        ProfilePage,
    };

    use super::*;
    use crate::cache::IndexCache;
    use crate::media::MediaStore;
    use crate::middleware::create_token;
    use crate::state::AppStateInner;

    const SECRET: &str = "test-secret";

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    struct TestApp {
        state: AppState,
        router: Router,
        _media: TempDir,
    }

    struct Reply {
        status: StatusCode,
        location: Option<String>,
        body: Value,
    }

    impl Reply {
        fn json<T: serde::de::DeserializeOwned>(&self) -> T {
            serde_json::from_value(self.body.clone()).unwrap()
        }
    }

    fn setup() -> TestApp {
        let media = tempfile::tempdir().unwrap();
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            media: MediaStore::new(media.path()),
            index_cache: IndexCache::new(Duration::from_secs(60)),
        });
        TestApp {
            router: router(state.clone()),
            state,
            _media: media,
        }
    }

    impl TestApp {
        fn db(&self) -> &Database {
            &self.state.db
        }

        /// Creates a user and returns (id, bearer token).
        fn user(&self, username: &str) -> (i64, String) {
            let id = self.db().create_user(username, "unused").unwrap().unwrap();
            (id, create_token(SECRET, id, username).unwrap())
        }

        fn group(&self, slug: &str) -> i64 {
            self.db()
                .create_group(&format!("Title {slug}"), slug, "Description")
                .unwrap()
                .unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> Reply {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(serde_json::to_vec(&v).unwrap())
                }
                None => Body::empty(),
            };

            let resp = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
            let status = resp.status();
            let location = resp
                .headers()
                .get(header::LOCATION)
                .map(|v| v.to_str().unwrap().to_string());
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            Reply { status, location, body }
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
            self.send("GET", uri, token, None).await
        }

        async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
            self.send("POST", uri, token, Some(body)).await
        }
    }

    /// An author with one post in `test-group`, plus a second user.
    struct Fixture {
        app: TestApp,
        author_token: String,
        other_token: String,
        group_id: i64,
        post_id: i64,
    }

    fn fixture() -> Fixture {
        let app = setup();
        let (author_id, author_token) = app.user("test_name");
        let (_, other_token) = app.user("other_name");
        let group_id = app.group("test-group");
        let post_id = app
            .db()
            .create_post(author_id, "Test text", Some(group_id), None)
            .unwrap();
        Fixture {
            app,
            author_token,
            other_token,
            group_id,
            post_id,
        }
    }

    #[tokio::test]
    async fn guest_status_codes() {
        let f = fixture();
        let id = f.post_id;
        let cases = [
            ("/".to_string(), StatusCode::OK),
            ("/group/test-group/".to_string(), StatusCode::OK),
            ("/new/".to_string(), StatusCode::FOUND),
            ("/follow/".to_string(), StatusCode::FOUND),
            ("/test_name/follow/".to_string(), StatusCode::FOUND),
            ("/test_name/unfollow/".to_string(), StatusCode::FOUND),
            ("/test_name/".to_string(), StatusCode::OK),
            (format!("/test_name/{id}/"), StatusCode::OK),
            (format!("/test_name/{id}/edit/"), StatusCode::FOUND),
            (format!("/test_name/{id}/comment/"), StatusCode::FOUND),
            ("/404/".to_string(), StatusCode::NOT_FOUND),
            ("/no/such/page/here/".to_string(), StatusCode::NOT_FOUND),
        ];
        for (uri, expected) in cases {
            assert_eq!(f.app.get(&uri, None).await.status, expected, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn guest_is_sent_to_login_with_next() {
        let f = fixture();
        let reply = f.app.get("/new/", None).await;
        assert_eq!(reply.location.as_deref(), Some("/auth/login/?next=/new/"));

        let reply = f.app.get("/follow/?page=2&x=1", None).await;
        assert_eq!(
            reply.location.as_deref(),
            Some("/auth/login/?next=/follow/%3Fpage%3D2%26x%3D1")
        );
    }

    #[tokio::test]
    async fn author_status_codes() {
        let f = fixture();
        let token = Some(f.author_token.as_str());
        let id = f.post_id;
        for uri in [
            "/".to_string(),
            "/group/test-group/".to_string(),
            "/new/".to_string(),
            "/follow/".to_string(),
            "/test_name/".to_string(),
            format!("/test_name/{id}/"),
            format!("/test_name/{id}/edit/"),
        ] {
            assert_eq!(f.app.get(&uri, token).await.status, StatusCode::OK, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn non_author_edit_redirects_to_post() {
        let f = fixture();
        let uri = format!("/test_name/{}/edit/", f.post_id);
        let post_page = format!("/test_name/{}/", f.post_id);

        let reply = f.app.get(&uri, Some(&f.other_token)).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some(post_page.as_str()));

        let reply = f
            .app
            .post(&uri, Some(&f.other_token), json!({ "text": "hijacked" }))
            .await;
        assert_eq!(reply.status, StatusCode::FOUND);

        let reply = f
            .app
            .post(&uri, Some(&f.other_token), json!({ "text": "x", "group": "abc" }))
            .await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some(post_page.as_str()));

        let row = f.app.db().get_post_by_id(f.post_id).unwrap().unwrap();
        assert_eq!(row.text, "Test text");
    }

    #[tokio::test]
    async fn post_owned_by_someone_else_is_not_found_under_wrong_name() {
        let f = fixture();
        let reply = f.app.get(&format!("/other_name/{}/", f.post_id), None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let reply = f.app.get("/test_name/abc/", None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_path_reports_itself() {
        let f = fixture();
        let reply = f.app.get("/a/b/c/d/", None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["path"], "/a/b/c/d/");
    }

    #[tokio::test]
    async fn new_post_form_lists_groups() {
        let f = fixture();
        let page: PostFormPage = f.app.get("/new/", Some(&f.author_token)).await.json();

        assert!(!page.is_edit);
        assert!(page.post.is_none());
        assert_eq!(page.form.field("text").unwrap().kind, FieldKind::Text);
        assert_eq!(page.form.field("image").unwrap().kind, FieldKind::Image);
        match &page.form.field("group").unwrap().kind {
            FieldKind::Choice { choices } => {
                assert_eq!(choices.len(), 1);
                assert_eq!(choices[0].value, f.group_id);
            }
            other => panic!("group should be a choice field, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let f = fixture();
        let uri = format!("/test_name/{}/edit/", f.post_id);
        let page: PostFormPage = f.app.get(&uri, Some(&f.author_token)).await.json();

        assert!(page.is_edit);
        assert_eq!(page.post.unwrap().id, f.post_id);
        assert_eq!(page.form.field("text").unwrap().initial, Some(json!("Test text")));
        assert_eq!(page.form.field("group").unwrap().initial, Some(json!(f.group_id)));
    }

    #[tokio::test]
    async fn new_post_persists_with_image() {
        let f = fixture();
        let before = f.app.db().count_posts(PostScope::All).unwrap();

        let reply = f
            .app
            .post(
                "/new/",
                Some(&f.author_token),
                json!({
                    "text": "Текст",
                    "group": f.group_id,
                    "image": B64.encode(SMALL_GIF),
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some("/"));
        assert_eq!(f.app.db().count_posts(PostScope::All).unwrap(), before + 1);

        let newest = &f.app.db().list_posts(PostScope::All, 1, 0).unwrap()[0];
        assert_eq!(newest.text, "Текст");
        assert_eq!(newest.group_id, Some(f.group_id));
        let image = newest.image.as_deref().unwrap();
        assert!(image.starts_with("posts/") && image.ends_with(".gif"));
        assert!(f.app.state.media.root().join(image).exists());
    }

    #[tokio::test]
    async fn mistyped_form_body_is_a_form_error() {
        let f = fixture();
        let before = f.app.db().count_posts(PostScope::All).unwrap();

        let bad_group = json!({ "text": "hi", "group": "abc" });
        let reply = f.app.post("/new/", Some(&f.author_token), bad_group.clone()).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"][NON_FIELD_ERRORS].is_array());
        assert_eq!(f.app.db().count_posts(PostScope::All).unwrap(), before);

        let edit = format!("/test_name/{}/edit/", f.post_id);
        let reply = f.app.post(&edit, Some(&f.author_token), bad_group).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"].is_object());

        let reply = f.app.send("POST", "/new/", Some(&f.author_token), None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = f
            .app
            .post("/group/", Some(&f.author_token), json!({ "title": 1, "slug": "dogs" }))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"][NON_FIELD_ERRORS].is_array());
    }

    #[tokio::test]
    async fn invalid_post_form_reports_fields() {
        let f = fixture();
        let before = f.app.db().count_posts(PostScope::All).unwrap();

        let reply = f
            .app
            .post("/new/", Some(&f.author_token), json!({ "text": "  ", "group": 999 }))
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"]["text"].is_array());
        assert!(reply.body["errors"]["group"].is_array());
        assert_eq!(f.app.db().count_posts(PostScope::All).unwrap(), before);

        let reply = f
            .app
            .post(
                "/new/",
                Some(&f.author_token),
                json!({ "text": "ok", "image": B64.encode(b"not an image") }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"]["image"].is_array());
    }

    #[tokio::test]
    async fn edit_updates_post_in_place() {
        let f = fixture();
        let other_group = f.app.group("other-group");
        let before = f.app.db().count_posts(PostScope::All).unwrap();
        let original = f.app.db().get_post_by_id(f.post_id).unwrap().unwrap();

        let reply = f
            .app
            .post(
                &format!("/test_name/{}/edit/", f.post_id),
                Some(&f.author_token),
                json!({ "text": "Текст1", "group": other_group }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location, Some(format!("/test_name/{}/", f.post_id)));

        let row = f.app.db().get_post_by_id(f.post_id).unwrap().unwrap();
        assert_eq!(row.text, "Текст1");
        assert_eq!(row.group_id, Some(other_group));
        assert_eq!(row.pub_date, original.pub_date);
        assert_eq!(f.app.db().count_posts(PostScope::All).unwrap(), before);
    }

    #[tokio::test]
    async fn edit_keeps_or_clears_image() {
        let f = fixture();
        let (author, token) = f.app.user("painter");
        let id = f
            .app
            .db()
            .create_post(author, "with picture", None, Some("posts/old.gif"))
            .unwrap();
        let uri = format!("/painter/{id}/edit/");

        f.app.post(&uri, Some(&token), json!({ "text": "still here" })).await;
        let row = f.app.db().get_post_by_id(id).unwrap().unwrap();
        assert_eq!(row.image.as_deref(), Some("posts/old.gif"));

        f.app
            .post(&uri, Some(&token), json!({ "text": "gone", "image_clear": true }))
            .await;
        let row = f.app.db().get_post_by_id(id).unwrap().unwrap();
        assert_eq!(row.image, None);
    }

    #[tokio::test]
    async fn index_paginates_ten_per_page() {
        let app = setup();
        let (author, _) = app.user("Test_user");
        let group = app.group("test-slug");
        for i in 0..13 {
            app.db().create_post(author, &i.to_string(), Some(group), None).unwrap();
        }

        let first: IndexPage = app.get("/", None).await.json();
        assert_eq!(first.page.items.len(), 10);
        assert_eq!(first.page.num_pages, 2);
        assert_eq!(first.page.items[0].text, "12");

        let second: IndexPage = app.get("/?page=2", None).await.json();
        assert_eq!(second.page.items.len(), 3);
        assert!(!second.page.has_next);

        let fallback: IndexPage = app.get("/?page=oops", None).await.json();
        assert_eq!(fallback.page.number, 1);
    }

    #[tokio::test]
    async fn group_page_shows_only_its_posts() {
        let f = fixture();
        f.app.group("test-slug-1");

        let own: GroupPage = f.app.get("/group/test-group/", None).await.json();
        assert_eq!(own.group.slug, "test-group");
        assert_eq!(own.group.description, "Description");
        assert_eq!(own.page.items.len(), 1);
        assert_eq!(own.page.items[0].id, f.post_id);

        let other: GroupPage = f.app.get("/group/test-slug-1/", None).await.json();
        assert!(other.page.items.iter().all(|p| p.id != f.post_id));

        assert_eq!(f.app.get("/group/missing/", None).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_lists_author_posts() {
        let f = fixture();
        let page: ProfilePage = f.app.get("/test_name/", Some(&f.other_token)).await.json();

        assert_eq!(page.author.username, "test_name");
        assert_eq!(page.author.posts_count, 1);
        assert_eq!(page.page.items[0].text, "Test text");
        assert_eq!(page.page.items[0].author.username, "test_name");
        assert!(!page.is_following);
    }

    #[tokio::test]
    async fn post_page_shows_comments() {
        let f = fixture();
        let uri = format!("/test_name/{}/comment/", f.post_id);

        let reply = f.app.post(&uri, Some(&f.other_token), json!({ "text": "Nice post" })).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location, Some(format!("/test_name/{}/", f.post_id)));

        let page: PostPage = f.app.get(&format!("/test_name/{}/", f.post_id), None).await.json();
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].text, "Nice post");
        assert_eq!(page.comments[0].author.username, "other_name");
        assert_eq!(page.post.comments_count, 1);
        assert_eq!(page.author.username, "test_name");
        assert!(page.form.field("text").is_some());
    }

    #[tokio::test]
    async fn guest_and_empty_comments_are_not_saved() {
        let f = fixture();
        let uri = format!("/test_name/{}/comment/", f.post_id);

        let reply = f.app.post(&uri, None, json!({ "text": "anonymous" })).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert!(reply.location.unwrap().starts_with("/auth/login/"));

        let reply = f.app.post(&uri, Some(&f.other_token), json!({ "text": "   " })).await;
        assert_eq!(reply.status, StatusCode::FOUND);

        let post_page = format!("/test_name/{}/", f.post_id);
        let reply = f.app.send("POST", &uri, Some(&f.other_token), None).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some(post_page.as_str()));

        let reply = f.app.post(&uri, Some(&f.other_token), json!({ "text": 5 })).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some(post_page.as_str()));

        assert!(f.app.db().list_comments(f.post_id).unwrap().is_empty());

        let missing = f
            .app
            .post("/test_name/9999/comment/", Some(&f.other_token), json!({ "text": "x" }))
            .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn follow_and_unfollow() {
        let f = fixture();
        let token = Some(f.other_token.as_str());

        let feed: FollowPage = f.app.get("/follow/", token).await.json();
        assert!(feed.page.is_empty());

        let reply = f.app.get("/test_name/follow/", token).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.location.as_deref(), Some("/test_name/"));
        // second follow must not create a second edge
        f.app.send("POST", "/test_name/follow/", token, None).await;

        let page: ProfilePage = f.app.get("/test_name/", token).await.json();
        assert!(page.is_following);
        assert_eq!(page.author.followers_count, 1);

        let feed: FollowPage = f.app.get("/follow/", token).await.json();
        assert_eq!(feed.page.items.len(), 1);
        assert_eq!(feed.page.items[0].id, f.post_id);

        let reply = f.app.get("/test_name/unfollow/", token).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        let feed: FollowPage = f.app.get("/follow/", token).await.json();
        assert!(feed.page.is_empty());

        assert_eq!(f.app.get("/test_name/unfollow/", token).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cannot_follow_yourself_or_ghosts() {
        let f = fixture();
        let token = Some(f.author_token.as_str());

        let author = f.app.db().get_user_by_username("test_name").unwrap().unwrap().id;

        let reply = f.app.get("/test_name/follow/", token).await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(f.app.db().author_stats(author).unwrap().followers, 0);

        assert_eq!(f.app.get("/nobody/follow/", token).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn index_is_cached_until_cleared() {
        let f = fixture();
        let author = f.app.db().get_user_by_username("test_name").unwrap().unwrap().id;

        let first = f.app.get("/", None).await;
        f.app.db().create_post(author, "fresh", None, None).unwrap();

        let cached = f.app.get("/", None).await;
        assert_eq!(cached.body, first.body);
        for uri in ["/?page=1", "/?page=abc", "/?page=0"] {
            assert_eq!(f.app.get(uri, None).await.body, first.body, "GET {uri}");
        }

        f.app.state.index_cache.clear();
        let fresh: IndexPage = f.app.get("/", None).await.json();
        assert_eq!(fresh.page.items[0].text, "fresh");
        assert_eq!(fresh.page.count, 2);
    }

    #[tokio::test]
    async fn bad_token_is_rejected_or_ignored() {
        let f = fixture();
        assert_eq!(f.app.get("/new/", Some("garbage")).await.status, StatusCode::UNAUTHORIZED);
        assert_eq!(f.app.get("/test_name/", Some("garbage")).await.status, StatusCode::OK);

        let stale = create_token(SECRET, 4242, "ghost").unwrap();
        assert_eq!(f.app.get("/new/", Some(&stale)).await.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn groups_can_be_created_once() {
        let f = fixture();
        let body = json!({ "title": "Cats", "slug": "cats", "description": "About cats" });

        let reply = f.app.post("/group/", Some(&f.author_token), body.clone()).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["slug"], "cats");
        assert!(f.app.db().get_group_by_slug("cats").unwrap().is_some());

        let reply = f.app.post("/group/", Some(&f.author_token), body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["errors"]["slug"].is_array());
    }

    #[tokio::test]
    async fn signup_then_login() {
        let app = setup();
        let creds = json!({ "username": "leo", "password": "war-and-peace" });

        let reply = app.post("/auth/signup/", None, creds.clone()).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let token = reply.body["token"].as_str().unwrap().to_string();
        assert_eq!(app.get("/new/", Some(&token)).await.status, StatusCode::OK);

        let again = app.post("/auth/signup/", None, creds.clone()).await;
        assert_eq!(again.status, StatusCode::CONFLICT);

        let wrong = json!({ "username": "leo", "password": "anna-karenina" });
        assert_eq!(app.post("/auth/login/", None, wrong).await.status, StatusCode::UNAUTHORIZED);

        let reply = app.post("/auth/login/", None, creds).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["username"], "leo");

        let reserved = json!({ "username": "follow", "password": "long enough" });
        assert_eq!(app.post("/auth/signup/", None, reserved).await.status, StatusCode::BAD_REQUEST);
    }
}
