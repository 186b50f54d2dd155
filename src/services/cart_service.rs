//! Guest carts live in the session; signed-in users have a `carts` row.
//! Both expose the same view and the same line operations.

use std::collections::{HashMap, HashSet};

use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::{
        cart::{
            CatalogSnapshot, MergeAction, SessionCart, SessionCartLine, StoredCartLine,
            clamp_added_quantity, line_key, merge_cart,
        },
        order::line_total,
    },
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartLineRequest},
    error::{AppError, AppResult},
    models::Color,
    response::{ApiResponse, Meta},
    session,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    User(Uuid),
    Guest(Uuid),
}

#[derive(FromRow)]
struct UserCartRow {
    id: Uuid,
    product_id: Uuid,
    color_id: Option<Uuid>,
    quantity: i32,
    title: String,
    slug: String,
    price: i64,
    stock: i32,
    color_name: Option<String>,
    color_hex: Option<String>,
}

#[derive(FromRow)]
struct ProductStockRow {
    id: Uuid,
    title: String,
    slug: String,
    price: i64,
    stock: i32,
}

pub async fn view_cart(state: &AppState, owner: CartOwner) -> AppResult<ApiResponse<CartView>> {
    let view = load_view(&state.pool, owner).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    owner: CartOwner,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = find_product(&state.pool, payload.product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    if let Some(color_id) = payload.color_id {
        ensure_color_offered(&state.pool, product.id, color_id).await?;
    }
    if product.stock < payload.quantity {
        return Err(AppError::InsufficientStock(product.title));
    }

    match owner {
        CartOwner::User(user_id) => {
            let cart_id = ensure_user_cart(&state.pool, user_id).await?;
            let existing: Option<(Uuid, i32)> = sqlx::query_as(
                r#"
                SELECT id, quantity FROM cart_items
                WHERE cart_id = $1 AND product_id = $2 AND color_id IS NOT DISTINCT FROM $3
                "#,
            )
            .bind(cart_id)
            .bind(product.id)
            .bind(payload.color_id)
            .fetch_optional(&state.pool)
            .await?;

            match existing {
                Some((item_id, quantity)) => {
                    let merged = clamp_added_quantity(quantity, payload.quantity, product.stock);
                    sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                        .bind(item_id)
                        .bind(merged)
                        .execute(&state.pool)
                        .await?;
                }
                None => {
                    insert_line(&state.pool, cart_id, product.id, payload.color_id, payload.quantity)
                        .await?;
                }
            }

            audit::record(
                &state.pool,
                Some(user_id),
                "cart_update",
                "cart_items",
                serde_json::json!({ "product_id": product.id, "quantity": payload.quantity }),
            )
            .await;
        }
        CartOwner::Guest(session_id) => {
            let mut cart = session::load_cart(&state.pool, session_id).await?;
            let key = line_key(product.id, payload.color_id);
            let line = cart.entry(key).or_insert(SessionCartLine {
                product_id: product.id,
                color_id: payload.color_id,
                quantity: 0,
            });
            line.quantity = clamp_added_quantity(line.quantity, payload.quantity, product.stock);
            session::save_cart(&state.pool, session_id, &cart).await?;
        }
    }

    let view = load_view(&state.pool, owner).await?;
    Ok(ApiResponse::success("Added to cart", view, Some(Meta::empty())))
}

pub async fn update_line(
    state: &AppState,
    owner: CartOwner,
    key: &str,
    payload: UpdateCartLineRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return remove_line(state, owner, key).await;
    }

    match owner {
        CartOwner::User(user_id) => {
            let item_id = parse_item_id(key)?;
            let row: Option<(String, i32)> = sqlx::query_as(
                r#"
                SELECT p.title, p.stock
                FROM cart_items ci
                JOIN carts c ON c.id = ci.cart_id
                JOIN products p ON p.id = ci.product_id
                WHERE ci.id = $1 AND c.user_id = $2
                "#,
            )
            .bind(item_id)
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?;
            let (title, stock) = row.ok_or(AppError::NotFound)?;
            if payload.quantity > stock {
                return Err(AppError::InsufficientStock(title));
            }
            sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                .bind(item_id)
                .bind(payload.quantity)
                .execute(&state.pool)
                .await?;
        }
        CartOwner::Guest(session_id) => {
            let mut cart = session::load_cart(&state.pool, session_id).await?;
            let line = cart.get_mut(key).ok_or(AppError::NotFound)?;
            let product = find_product(&state.pool, line.product_id)
                .await?
                .ok_or(AppError::NotFound)?;
            if payload.quantity > product.stock {
                return Err(AppError::InsufficientStock(product.title));
            }
            line.quantity = payload.quantity;
            session::save_cart(&state.pool, session_id, &cart).await?;
        }
    }

    let view = load_view(&state.pool, owner).await?;
    Ok(ApiResponse::success("Cart updated", view, Some(Meta::empty())))
}

pub async fn remove_line(
    state: &AppState,
    owner: CartOwner,
    key: &str,
) -> AppResult<ApiResponse<CartView>> {
    match owner {
        CartOwner::User(user_id) => {
            let item_id = parse_item_id(key)?;
            let result = sqlx::query(
                r#"
                DELETE FROM cart_items ci
                USING carts c
                WHERE ci.cart_id = c.id AND ci.id = $1 AND c.user_id = $2
                "#,
            )
            .bind(item_id)
            .bind(user_id)
            .execute(&state.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }

            audit::record(
                &state.pool,
                Some(user_id),
                "cart_remove",
                "cart_items",
                serde_json::json!({ "item_id": item_id }),
            )
            .await;
        }
        CartOwner::Guest(session_id) => {
            let mut cart = session::load_cart(&state.pool, session_id).await?;
            if cart.remove(key).is_none() {
                return Err(AppError::NotFound);
            }
            session::save_cart(&state.pool, session_id, &cart).await?;
        }
    }

    let view = load_view(&state.pool, owner).await?;
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, owner: CartOwner) -> AppResult<ApiResponse<CartView>> {
    match owner {
        CartOwner::User(user_id) => {
            sqlx::query(
                "DELETE FROM cart_items ci USING carts c WHERE ci.cart_id = c.id AND c.user_id = $1",
            )
            .bind(user_id)
            .execute(&state.pool)
            .await?;
        }
        CartOwner::Guest(session_id) => {
            session::save_cart(&state.pool, session_id, &SessionCart::new()).await?;
        }
    }

    let view = load_view(&state.pool, owner).await?;
    Ok(ApiResponse::success("Cart cleared", view, Some(Meta::empty())))
}

/// Folds the session's guest cart into the user's stored cart. The session
/// cart is emptied whether or not the merge succeeds.
pub async fn merge_session_cart(
    pool: &DbPool,
    session_id: Uuid,
    user_id: Uuid,
) -> AppResult<usize> {
    let session_cart = session::load_cart(pool, session_id).await?;
    if session_cart.is_empty() {
        return Ok(0);
    }

    let applied = apply_merge(pool, &session_cart, user_id).await;
    session::save_cart(pool, session_id, &SessionCart::new()).await?;
    let applied = applied?;

    tracing::debug!(%user_id, %session_id, applied, "guest cart merged");
    Ok(applied)
}

async fn apply_merge(pool: &DbPool, session_cart: &SessionCart, user_id: Uuid) -> AppResult<usize> {
    let cart_id = ensure_user_cart(pool, user_id).await?;

    let stored: Vec<StoredCartLine> = sqlx::query_as::<_, (Uuid, Uuid, Option<Uuid>, i32)>(
        "SELECT id, product_id, color_id, quantity FROM cart_items WHERE cart_id = $1",
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(id, product_id, color_id, quantity)| StoredCartLine {
        id,
        product_id,
        color_id,
        quantity,
    })
    .collect();

    let product_ids: Vec<Uuid> = session_cart.values().map(|l| l.product_id).collect();
    let color_ids: Vec<Uuid> = session_cart.values().filter_map(|l| l.color_id).collect();

    let stock: HashMap<Uuid, i32> =
        sqlx::query_as::<_, (Uuid, i32)>("SELECT id, stock FROM products WHERE id = ANY($1)")
            .bind(&product_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();
    let colors: HashSet<Uuid> =
        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM colors WHERE id = ANY($1)")
            .bind(&color_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|(id,)| id)
            .collect();

    let plan = merge_cart(session_cart, &stored, &CatalogSnapshot { stock, colors });

    let mut tx = pool.begin().await?;
    let mut applied = 0;
    for action in plan {
        match action {
            MergeAction::Update { item_id, quantity } => {
                sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                    .bind(item_id)
                    .bind(quantity)
                    .execute(&mut *tx)
                    .await?;
                applied += 1;
            }
            MergeAction::Insert {
                product_id,
                color_id,
                quantity,
            } => {
                sqlx::query(
                    "INSERT INTO cart_items (cart_id, product_id, color_id, quantity) VALUES ($1, $2, $3, $4)",
                )
                .bind(cart_id)
                .bind(product_id)
                .bind(color_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
                applied += 1;
            }
            MergeAction::Drop { product_id, reason } => {
                tracing::debug!(%product_id, ?reason, "guest cart line dropped");
            }
        }
    }
    tx.commit().await?;

    Ok(applied)
}

async fn load_view(pool: &DbPool, owner: CartOwner) -> AppResult<CartView> {
    let items = match owner {
        CartOwner::User(user_id) => user_lines(pool, user_id).await?,
        CartOwner::Guest(session_id) => guest_lines(pool, session_id).await?,
    };

    let total_price = items.iter().map(|l| l.line_total).sum();
    let item_count = items.iter().map(|l| i64::from(l.quantity)).sum();
    Ok(CartView {
        items,
        total_price,
        item_count,
    })
}

async fn user_lines(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, UserCartRow>(
        r#"
        SELECT ci.id, ci.product_id, ci.color_id, ci.quantity,
               p.title, p.slug, p.price, p.stock,
               co.name AS color_name, co.hex_code AS color_hex
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN colors co ON co.id = ci.color_id
        WHERE c.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let color = match (row.color_id, row.color_name, row.color_hex) {
                (Some(id), Some(name), Some(hex_code)) => Some(Color { id, name, hex_code }),
                _ => None,
            };
            CartLine {
                key: row.id.to_string(),
                product_id: row.product_id,
                title: row.title,
                slug: row.slug,
                unit_price: row.price,
                stock: row.stock,
                color,
                quantity: row.quantity,
                line_total: line_total(row.price, row.quantity),
            }
        })
        .collect())
}

async fn guest_lines(pool: &DbPool, session_id: Uuid) -> AppResult<Vec<CartLine>> {
    let cart = session::load_cart(pool, session_id).await?;
    if cart.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = cart.values().map(|l| l.product_id).collect();
    let color_ids: Vec<Uuid> = cart.values().filter_map(|l| l.color_id).collect();

    let products: HashMap<Uuid, ProductStockRow> = sqlx::query_as::<_, ProductStockRow>(
        "SELECT id, title, slug, price, stock FROM products WHERE id = ANY($1)",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();
    let colors: HashMap<Uuid, Color> =
        sqlx::query_as::<_, Color>("SELECT id, name, hex_code FROM colors WHERE id = ANY($1)")
            .bind(&color_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

    // Lines whose product has been deleted are skipped.
    Ok(cart
        .iter()
        .filter_map(|(key, line)| {
            let product = products.get(&line.product_id)?;
            Some(CartLine {
                key: key.clone(),
                product_id: product.id,
                title: product.title.clone(),
                slug: product.slug.clone(),
                unit_price: product.price,
                stock: product.stock,
                color: line.color_id.and_then(|id| colors.get(&id).cloned()),
                quantity: line.quantity,
                line_total: line_total(product.price, line.quantity),
            })
        })
        .collect())
}

async fn find_product(pool: &DbPool, product_id: Uuid) -> AppResult<Option<ProductStockRow>> {
    let product = sqlx::query_as::<_, ProductStockRow>(
        "SELECT id, title, slug, price, stock FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

async fn ensure_color_offered(pool: &DbPool, product_id: Uuid, color_id: Uuid) -> AppResult<()> {
    let offered: Option<(Uuid,)> = sqlx::query_as(
        "SELECT color_id FROM product_colors WHERE product_id = $1 AND color_id = $2",
    )
    .bind(product_id)
    .bind(color_id)
    .fetch_optional(pool)
    .await?;
    if offered.is_none() {
        return Err(AppError::BadRequest(
            "color is not available for this product".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_user_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Uuid> {
    let (cart_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(cart_id)
}

async fn insert_line(
    pool: &DbPool,
    cart_id: Uuid,
    product_id: Uuid,
    color_id: Option<Uuid>,
    quantity: i32,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, color_id, quantity) VALUES ($1, $2, $3, $4)",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(color_id)
    .bind(quantity)
    .execute(pool)
    .await?;
    Ok(())
}

fn parse_item_id(key: &str) -> AppResult<Uuid> {
    Uuid::parse_str(key).map_err(|_| AppError::BadRequest("invalid cart line".into()))
}
