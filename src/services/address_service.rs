use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, AddressRequest},
    entity::addresses::{ActiveModel, Column, Entity as Addresses},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success("OK", AddressList { items }, Some(Meta::empty())))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let payload = validate(payload)?;
    let address = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        subject: Set(payload.subject),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        province: Set(payload.province),
        city: Set(payload.city),
        address_details: Set(payload.address_details),
        phone_number: Set(payload.phone_number),
        postal_code: Set(payload.postal_code),
        additional_info: Set(payload.additional_info),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let payload = validate(payload)?;
    let existing = Addresses::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.subject = Set(payload.subject);
    active.first_name = Set(payload.first_name);
    active.last_name = Set(payload.last_name);
    active.province = Set(payload.province);
    active.city = Set(payload.city);
    active.address_details = Set(payload.address_details);
    active.phone_number = Set(payload.phone_number);
    active.postal_code = Set(payload.postal_code);
    active.additional_info = Set(payload.additional_info);
    let address = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

/// Orders keep their row; their `address_id` is cleared by the foreign key.
pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate(mut payload: AddressRequest) -> AppResult<AddressRequest> {
    let required = [
        ("first_name", &mut payload.first_name),
        ("last_name", &mut payload.last_name),
        ("province", &mut payload.province),
        ("city", &mut payload.city),
        ("address_details", &mut payload.address_details),
        ("phone_number", &mut payload.phone_number),
        ("postal_code", &mut payload.postal_code),
    ];
    for (field, value) in required {
        *value = value.trim().to_string();
        if value.is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }
    payload.subject = payload
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    payload.additional_info = payload.additional_info.trim().to_string();
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AddressRequest {
        AddressRequest {
            subject: Some("  ".into()),
            first_name: " Sara ".into(),
            last_name: "Ahmadi".into(),
            province: "Tehran".into(),
            city: "Tehran".into(),
            address_details: "Valiasr St.".into(),
            phone_number: "09121234567".into(),
            postal_code: "1234567890".into(),
            additional_info: String::new(),
        }
    }

    #[test]
    fn trims_and_requires_fields() {
        let cleaned = validate(sample()).unwrap();
        assert_eq!(cleaned.first_name, "Sara");
        assert_eq!(cleaned.subject, None);

        let mut missing = sample();
        missing.city = "   ".into();
        assert!(matches!(validate(missing), Err(AppError::BadRequest(_))));
    }
}
