use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminEntity {
    Products,
    Colors,
    Users,
    Addresses,
    Favorites,
    BlogCategories,
    Posts,
    PostComments,
    SiteSettings,
    Orders,
    Carts,
    PhoneOtps,
    OrderItems,
    CartItems,
}

/// Entities that only appear in the admin panel in advanced mode.
const HIDDEN: [AdminEntity; 3] = [
    AdminEntity::PhoneOtps,
    AdminEntity::OrderItems,
    AdminEntity::CartItems,
];

const ALL: [AdminEntity; 14] = [
    AdminEntity::Products,
    AdminEntity::Colors,
    AdminEntity::Users,
    AdminEntity::Addresses,
    AdminEntity::Favorites,
    AdminEntity::BlogCategories,
    AdminEntity::Posts,
    AdminEntity::PostComments,
    AdminEntity::SiteSettings,
    AdminEntity::Orders,
    AdminEntity::Carts,
    AdminEntity::PhoneOtps,
    AdminEntity::OrderItems,
    AdminEntity::CartItems,
];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Capability {
    pub entity: AdminEntity,
    pub advanced: bool,
    pub visible: bool,
}

pub fn is_visible(entity: AdminEntity, show_hidden_models: bool) -> bool {
    show_hidden_models || !HIDDEN.contains(&entity)
}

/// Recomputed from the settings row on every read.
pub fn capability_table(show_hidden_models: bool) -> Vec<Capability> {
    ALL.iter()
        .map(|&entity| Capability {
            entity,
            advanced: HIDDEN.contains(&entity),
            visible: is_visible(entity, show_hidden_models),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_entities_follow_the_flag() {
        let table = capability_table(false);
        let visible: Vec<_> = table.iter().filter(|c| c.visible).collect();
        assert_eq!(visible.len(), ALL.len() - HIDDEN.len());
        assert!(!is_visible(AdminEntity::PhoneOtps, false));
        assert!(is_visible(AdminEntity::PhoneOtps, true));
        assert!(capability_table(true).iter().all(|c| c.visible));
    }
}
