//! The admin settings row. There is exactly one, with id 1; the table's
//! `CHECK (id = 1)` backs up the check in [`create_settings`].

use crate::{
    db::DbPool,
    dto::admin::UpdateSettingsRequest,
    error::{AppError, AppResult},
    models::SiteSettings,
};

const SETTINGS_ID: i16 = 1;

const SELECT_SETTINGS: &str = r#"
    SELECT use_jalali_date, site_title, site_header, site_index_title,
           show_hidden_models, updated_at
    FROM site_settings
    WHERE id = $1
"#;

/// Returns the settings, creating the row with defaults on first read.
pub async fn load_settings(pool: &DbPool) -> AppResult<SiteSettings> {
    sqlx::query("INSERT INTO site_settings (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(SETTINGS_ID)
        .execute(pool)
        .await?;

    let settings = sqlx::query_as::<_, SiteSettings>(SELECT_SETTINGS)
        .bind(SETTINGS_ID)
        .fetch_one(pool)
        .await?;
    Ok(settings)
}

/// Explicit creation is refused once the row exists.
pub async fn create_settings(
    pool: &DbPool,
    payload: UpdateSettingsRequest,
) -> AppResult<SiteSettings> {
    let inserted = sqlx::query("INSERT INTO site_settings (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(SETTINGS_ID)
        .execute(pool)
        .await?;
    if inserted.rows_affected() == 0 {
        return Err(AppError::BadRequest("site settings already exist".into()));
    }
    update_settings(pool, payload).await
}

pub async fn update_settings(
    pool: &DbPool,
    payload: UpdateSettingsRequest,
) -> AppResult<SiteSettings> {
    load_settings(pool).await?;

    for title in [
        &payload.site_title,
        &payload.site_header,
        &payload.site_index_title,
    ]
    .into_iter()
    .flatten()
    {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("titles cannot be empty".into()));
        }
    }

    let settings = sqlx::query_as::<_, SiteSettings>(
        r#"
        UPDATE site_settings SET
            use_jalali_date = COALESCE($2, use_jalali_date),
            site_title = COALESCE($3, site_title),
            site_header = COALESCE($4, site_header),
            site_index_title = COALESCE($5, site_index_title),
            show_hidden_models = COALESCE($6, show_hidden_models),
            updated_at = NOW()
        WHERE id = $1
        RETURNING use_jalali_date, site_title, site_header, site_index_title,
                  show_hidden_models, updated_at
        "#,
    )
    .bind(SETTINGS_ID)
    .bind(payload.use_jalali_date)
    .bind(payload.site_title.map(|s| s.trim().to_string()))
    .bind(payload.site_header.map(|s| s.trim().to_string()))
    .bind(payload.site_index_title.map(|s| s.trim().to_string()))
    .bind(payload.show_hidden_models)
    .fetch_one(pool)
    .await?;
    Ok(settings)
}
