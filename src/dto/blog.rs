use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Post, PostComment},
    routes::params::Pagination,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PostQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Category slug.
    pub category: Option<String>,
}

impl PostQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PostList {
    #[schema(value_type = Vec<Post>)]
    pub items: Vec<Post>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<PostComment>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub status: PostStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
