use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use digito_store::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    domain::slug::slugify,
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
};
use uuid::Uuid;

const COLORS: &[(&str, &str)] = &[("مشکی", "#000000"), ("سفید", "#FFFFFF"), ("آبی", "#1E40AF")];

const PRODUCTS: &[(&str, &str, i64, i32, bool)] = &[
    ("گوشی موبایل سامسونگ گلکسی A55", "حافظه ۲۵۶ گیگابایت، رم ۸ گیگابایت", 185_000_000, 12, true),
    ("هدفون بی سیم شیائومی", "بلوتوث ۵.۳ با حذف نویز", 24_500_000, 30, false),
    ("لپ تاپ لنوو IdeaPad Slim 3", "پردازنده Core i5 نسل ۱۲", 420_000_000, 4, false),
    ("ساعت هوشمند امیزفیت", "صفحه نمایش AMOLED", 68_000_000, 0, true),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user_with_role(&pool, "09120000000", "مدیر سایت", Some("admin123"), ROLE_ADMIN).await?;
    let user_id = ensure_user_with_role(&pool, "09121111111", "کاربر نمونه", None, ROLE_USER).await?;
    let color_ids = seed_colors(&pool).await?;
    seed_products(&pool, &color_ids).await?;
    seed_settings(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    phone: &str,
    fullname: &str,
    password: Option<&str>,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = match password {
        Some(password) => {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?
                .to_string();
            Some(hash)
        }
        None => None,
    };

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, phone, fullname, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (phone) DO UPDATE
            SET role = EXCLUDED.role,
                password_hash = COALESCE(EXCLUDED.password_hash, users.password_hash)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(phone)
    .bind(fullname)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_colors(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(COLORS.len());
    for (name, hex) in COLORS {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM colors WHERE hex_code = $1")
            .bind(hex)
            .fetch_optional(pool)
            .await?;
        let id = match existing {
            Some((id,)) => id,
            None => {
                let (id,): (Uuid,) = sqlx::query_as(
                    "INSERT INTO colors (id, name, hex_code) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(hex)
                .fetch_one(pool)
                .await?;
                id
            }
        };
        ids.push(id);
    }
    Ok(ids)
}

async fn seed_products(pool: &sqlx::PgPool, color_ids: &[Uuid]) -> anyhow::Result<()> {
    for (title, description, price, stock, is_amazing) in PRODUCTS {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, title, slug, description, price, stock, is_amazing)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE SET stock = EXCLUDED.stock
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slugify(title))
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(is_amazing)
        .fetch_one(pool)
        .await?;

        for color_id in color_ids.iter().take(2) {
            sqlx::query(
                "INSERT INTO product_colors (product_id, color_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(product_id)
            .bind(color_id)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO site_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
        .execute(pool)
        .await?;
    Ok(())
}
