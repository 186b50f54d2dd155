use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::slug::{numbered, slugify},
    dto::blog::{
        BlogCategory, CreateCategoryRequest, CreateCommentRequest, CreatePostRequest, PostDetail,
        PostList, PostQuery, PostStatus,
    },
    entity::{
        blog_categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as BlogCategories},
        post_comments::{ActiveModel as CommentActive, Column as CommentCol, Entity as PostComments},
        posts::{ActiveModel as PostActive, Column as PostCol, Entity as Posts},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Post, PostComment},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_posts(state: &AppState, query: PostQuery) -> AppResult<ApiResponse<PostList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Posts::find().filter(PostCol::Status.eq(PostStatus::Published.as_str()));
    if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let category = BlogCategories::find()
            .filter(CategoryCol::Slug.eq(slug))
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        finder = finder.filter(PostCol::CategoryId.eq(category.id));
    }
    let finder = finder.order_by_desc(PostCol::PublishedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Post::from)
        .collect();

    Ok(ApiResponse::success(
        "Posts",
        PostList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_post(state: &AppState, slug: &str) -> AppResult<ApiResponse<PostDetail>> {
    let post = published_post(state, slug).await?;

    Posts::update_many()
        .col_expr(PostCol::Views, Expr::col(PostCol::Views).add(1))
        .filter(PostCol::Id.eq(post.id))
        .exec(&state.orm)
        .await?;

    let comments = PostComments::find()
        .filter(CommentCol::PostId.eq(post.id))
        .filter(CommentCol::IsApproved.eq(true))
        .order_by_asc(CommentCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PostComment::from)
        .collect();

    let mut post = Post::from(post);
    post.views += 1;
    Ok(ApiResponse::success(
        "Post",
        PostDetail { post, comments },
        Some(Meta::empty()),
    ))
}

/// Comments wait for admin approval before they show up.
pub async fn add_comment(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    payload: CreateCommentRequest,
) -> AppResult<ApiResponse<PostComment>> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("content is required".into()));
    }
    let post = published_post(state, slug).await?;

    let comment = CommentActive {
        id: Set(Uuid::new_v4()),
        post_id: Set(post.id),
        author_id: Set(user.user_id),
        content: Set(content.to_string()),
        is_approved: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Comment submitted for review",
        PostComment::from(comment),
        Some(Meta::empty()),
    ))
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePostRequest,
) -> AppResult<ApiResponse<Post>> {
    ensure_admin(user)?;
    let title = payload.title.trim();
    if title.is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("title and content are required".into()));
    }

    let txn = state.orm.begin().await?;
    if let Some(category_id) = payload.category_id
        && BlogCategories::find_by_id(category_id).one(&txn).await?.is_none()
    {
        return Err(AppError::BadRequest("unknown category".into()));
    }

    let slug = unique_post_slug(&txn, title).await?;
    let published_at = match payload.status {
        PostStatus::Published => Set(Some(Utc::now().into())),
        PostStatus::Draft => Set(None),
    };
    let post = PostActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        slug: Set(slug),
        content: Set(payload.content),
        excerpt: Set(payload.excerpt),
        author_id: Set(Some(user.user_id)),
        category_id: Set(payload.category_id),
        status: Set(payload.status.as_str().to_string()),
        views: Set(0),
        published_at,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "post_create",
        "posts",
        serde_json::json!({ "post_id": post.id }),
    )
    .await;

    Ok(ApiResponse::success("Post created", Post::from(post), Some(Meta::empty())))
}

/// Publishes a draft; `published_at` is only set the first time.
pub async fn publish_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Post>> {
    ensure_admin(user)?;
    let post = Posts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let first_publication = post.published_at.is_none();
    let mut active: PostActive = post.into();
    active.status = Set(PostStatus::Published.as_str().to_string());
    if first_publication {
        active.published_at = Set(Some(Utc::now().into()));
    }
    active.updated_at = Set(Utc::now().into());
    let post = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Post published", Post::from(post), Some(Meta::empty())))
}

pub async fn approve_comment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PostComment>> {
    ensure_admin(user)?;
    let comment = PostComments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CommentActive = comment.into();
    active.is_approved = Set(true);
    let comment = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Comment approved",
        PostComment::from(comment),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<Vec<BlogCategory>>> {
    let items = BlogCategories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| BlogCategory {
            id: c.id,
            name: c.name,
            slug: c.slug,
        })
        .collect();
    Ok(ApiResponse::success("Categories", items, Some(Meta::empty())))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<BlogCategory>> {
    ensure_admin(user)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let base = slugify(name);
    let mut counter = 0;
    let slug = loop {
        let candidate = numbered(&base, counter);
        let taken = BlogCategories::find()
            .filter(CategoryCol::Slug.eq(candidate.as_str()))
            .count(&state.orm)
            .await?;
        if taken == 0 {
            break candidate;
        }
        counter += 1;
    };

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Category created",
        BlogCategory {
            id: category.id,
            name: category.name,
            slug: category.slug,
        },
        Some(Meta::empty()),
    ))
}

async fn published_post(
    state: &AppState,
    slug: &str,
) -> AppResult<crate::entity::posts::Model> {
    Posts::find()
        .filter(PostCol::Slug.eq(slug))
        .filter(PostCol::Status.eq(PostStatus::Published.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn unique_post_slug<C: ConnectionTrait>(conn: &C, title: &str) -> AppResult<String> {
    let base = slugify(title);
    let mut counter = 0;
    loop {
        let candidate = numbered(&base, counter);
        let taken = Posts::find()
            .filter(PostCol::Slug.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        counter += 1;
    }
}
