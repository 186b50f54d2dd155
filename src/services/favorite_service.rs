use uuid::Uuid;

use crate::{
    audit,
    dto::{
        favorites::{FavoriteToggle, ToggleFavoriteRequest},
        products::ProductList,
    },
    entity::{
        favorites::{Column as FavCol, Entity as Favorites},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find()
        .join(
            JoinType::InnerJoin,
            crate::entity::products::Relation::Favorites.def(),
        )
        .filter(FavCol::UserId.eq(user.user_id));

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .order_by_desc(FavCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = product_service::with_colors(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", ProductList { items }, Some(meta)))
}

/// Adds the product to the user's favorites, or removes it when already there.
pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleFavoriteRequest,
) -> AppResult<ApiResponse<FavoriteToggle>> {
    let product_exists = Products::find()
        .filter(ProdCol::Id.eq(payload.product_id))
        .count(&state.orm)
        .await?;
    if product_exists == 0 {
        return Err(AppError::BadRequest("Product not found".into()));
    }

    let removed = Favorites::delete_many()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::ProductId.eq(payload.product_id))
        .exec(&state.orm)
        .await?;

    let is_favorite = if removed.rows_affected > 0 {
        false
    } else {
        sqlx::query(
            r#"
            INSERT INTO favorites (id, user_id, product_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .execute(&state.pool)
        .await?;
        true
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        if is_favorite { "favorite_add" } else { "favorite_remove" },
        "favorites",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        if is_favorite { "Added to favorites" } else { "Removed from favorites" },
        FavoriteToggle {
            product_id: payload.product_id,
            is_favorite,
        },
        Some(Meta::empty()),
    ))
}
