use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::blog::{
        BlogCategory, CreateCategoryRequest, CreateCommentRequest, CreatePostRequest, PostDetail,
        PostList, PostQuery,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Post, PostComment},
    response::ApiResponse,
    services::blog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{slug}", get(get_post))
        .route("/posts/{slug}/comments", post(add_comment))
        .route("/categories", get(list_categories))
}

/// Editorial endpoints, nested under `/admin/blog`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}/publish", post(publish_post))
        .route("/comments/{id}/approve", post(approve_comment))
        .route("/categories", post(create_category))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Category slug"),
    ),
    responses(
        (status = 200, description = "Published posts, newest first", body = ApiResponse<PostList>)
    ),
    tag = "Blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<ApiResponse<PostList>>> {
    let resp = blog_service::list_posts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post with approved comments", body = ApiResponse<PostDetail>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Blog"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<PostDetail>>> {
    let resp = blog_service::get_post(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/blog/posts/{slug}/comments",
    params(("slug" = String, Path, description = "Post slug")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment stored, awaiting approval", body = ApiResponse<PostComment>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<Json<ApiResponse<PostComment>>> {
    let resp = blog_service::add_comment(&state, &user, &slug, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/categories",
    responses(
        (status = 200, description = "Blog categories", body = ApiResponse<Vec<BlogCategory>>)
    ),
    tag = "Blog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<BlogCategory>>>> {
    let resp = blog_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Create post (admin only)", body = ApiResponse<Post>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let resp = blog_service::create_post(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/posts/{id}/publish",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Publish post (admin only)", body = ApiResponse<Post>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn publish_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let resp = blog_service::publish_post(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/comments/{id}/approve",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Approve comment (admin only)", body = ApiResponse<PostComment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PostComment>>> {
    let resp = blog_service::approve_comment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Create category (admin only)", body = ApiResponse<BlogCategory>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<BlogCategory>>> {
    let resp = blog_service::create_category(&state, &user, payload).await?;
    Ok(Json(resp))
}
