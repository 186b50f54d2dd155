use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    domain::slug::{numbered, slugify},
    dto::products::{
        ColorList, CreateColorRequest, CreateProductRequest, ProductList, UpdateProductRequest,
    },
    entity::{
        colors::{ActiveModel as ColorActive, Column as ColorCol, Entity as Colors},
        product_colors::{ActiveModel as ProductColorActive, Column as ProductColorCol, Entity as ProductColors},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Color, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(amazing) = query.amazing {
        condition = condition.add(Column::IsAmazing.eq(amazing));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Title => Column::Title,
        ProductSortBy::Sales => Column::Sales,
        ProductSortBy::Views => Column::Views,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_colors(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// Product page by slug; every read counts as a view.
pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let model = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Products::update_many()
        .col_expr(Column::Views, Expr::col(Column::Views).add(1))
        .filter(Column::Id.eq(model.id))
        .exec(&state.orm)
        .await?;

    let mut product = load_product(&state.orm, model).await?;
    product.views += 1;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_product(&payload.title, payload.price, payload.stock)?;

    let txn = state.orm.begin().await?;
    let slug = unique_slug(&txn, &payload.title).await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        sales: Set(0),
        views: Set(0),
        is_amazing: Set(payload.is_amazing),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    replace_colors(&txn, product.id, &payload.color_ids).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = load_product(&state.orm, product).await?;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_product(
        payload.title.as_deref().unwrap_or(&existing.title),
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
    )?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(is_amazing) = payload.is_amazing {
        active.is_amazing = Set(is_amazing);
    }
    let product = active.update(&txn).await?;

    if let Some(color_ids) = payload.color_ids.as_deref() {
        replace_colors(&txn, product.id, color_ids).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = load_product(&state.orm, product).await?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_colors(state: &AppState) -> AppResult<ApiResponse<ColorList>> {
    let items = Colors::find()
        .order_by_asc(ColorCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Color::from)
        .collect();
    Ok(ApiResponse::success("Colors", ColorList { items }, Some(Meta::empty())))
}

pub async fn create_color(
    state: &AppState,
    user: &AuthUser,
    payload: CreateColorRequest,
) -> AppResult<ApiResponse<Color>> {
    ensure_admin(user)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let hex_code = payload.hex_code.trim().to_ascii_uppercase();
    if !is_hex_color(&hex_code) {
        return Err(AppError::BadRequest("hex_code must look like #RRGGBB".into()));
    }

    let color = ColorActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        hex_code: Set(hex_code),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Color created",
        Color::from(color),
        Some(Meta::empty()),
    ))
}

pub async fn load_product<C: ConnectionTrait>(conn: &C, model: ProductModel) -> AppResult<Product> {
    let colors = model
        .find_related(Colors)
        .order_by_asc(ColorCol::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(Color::from)
        .collect();
    Ok(Product::from_entity(model, colors))
}

pub async fn with_colors<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let mut products = Vec::with_capacity(models.len());
    for model in models {
        products.push(load_product(conn, model).await?);
    }
    Ok(products)
}

/// Slug derived from the title, suffixed `-1`, `-2`, ... until unused.
async fn unique_slug<C: ConnectionTrait>(conn: &C, title: &str) -> AppResult<String> {
    let base = slugify(title);
    let mut counter = 0;
    loop {
        let candidate = numbered(&base, counter);
        let taken = Products::find()
            .filter(Column::Slug.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        counter += 1;
    }
}

async fn replace_colors<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    color_ids: &[Uuid],
) -> AppResult<()> {
    ProductColors::delete_many()
        .filter(ProductColorCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    if color_ids.is_empty() {
        return Ok(());
    }

    let known = Colors::find()
        .filter(ColorCol::Id.is_in(color_ids.iter().copied()))
        .count(conn)
        .await?;
    let mut unique = color_ids.to_vec();
    unique.sort();
    unique.dedup();
    if known as usize != unique.len() {
        return Err(AppError::BadRequest("unknown color id".into()));
    }

    for color_id in unique {
        ProductColorActive {
            product_id: Set(product_id),
            color_id: Set(color_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn validate_product(title: &str, price: i64, stock: i32) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#FF00AA"));
        assert!(!is_hex_color("FF00AA"));
        assert!(!is_hex_color("#FF00AZ"));
    }

    #[test]
    fn product_validation() {
        assert!(validate_product("Mug", 1000, 3).is_ok());
        assert!(validate_product("  ", 1000, 3).is_err());
        assert!(validate_product("Mug", -1, 3).is_err());
        assert!(validate_product("Mug", 1, -3).is_err());
    }
}
