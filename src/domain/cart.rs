use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One line of a guest cart, stored in the session under [`line_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionCartLine {
    pub product_id: Uuid,
    pub color_id: Option<Uuid>,
    pub quantity: i32,
}

pub type SessionCart = BTreeMap<String, SessionCartLine>;

/// Persistent cart row as seen by the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    Update { item_id: Uuid, quantity: i32 },
    Insert { product_id: Uuid, color_id: Option<Uuid>, quantity: i32 },
    Drop { product_id: Uuid, reason: DropReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    ProductMissing,
    ColorMissing,
    OutOfStock,
}

/// What the catalog currently holds: stock per product and the known colors.
#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    pub stock: HashMap<Uuid, i32>,
    pub colors: HashSet<Uuid>,
}

pub fn line_key(product_id: Uuid, color_id: Option<Uuid>) -> String {
    match color_id {
        Some(color) => format!("{product_id}_{color}"),
        None => format!("{product_id}_none"),
    }
}

/// Adds `add` to `current`, never exceeding `stock`.
pub fn clamp_added_quantity(current: i32, add: i32, stock: i32) -> i32 {
    current.saturating_add(add).min(stock)
}

/// Reconciles a guest cart with the user's stored cart.
///
/// Matching (product, color) lines add up and clamp to stock, new lines are
/// clamped to stock, and lines whose product or color disappeared are dropped.
/// The caller clears the session cart afterwards regardless of the outcome.
pub fn merge_cart(
    session: &SessionCart,
    stored: &[StoredCartLine],
    catalog: &CatalogSnapshot,
) -> Vec<MergeAction> {
    let existing: HashMap<(Uuid, Option<Uuid>), &StoredCartLine> = stored
        .iter()
        .map(|line| ((line.product_id, line.color_id), line))
        .collect();

    let mut plan = Vec::with_capacity(session.len());
    for line in session.values() {
        let Some(&stock) = catalog.stock.get(&line.product_id) else {
            plan.push(MergeAction::Drop {
                product_id: line.product_id,
                reason: DropReason::ProductMissing,
            });
            continue;
        };
        if let Some(color) = line.color_id
            && !catalog.colors.contains(&color)
        {
            plan.push(MergeAction::Drop {
                product_id: line.product_id,
                reason: DropReason::ColorMissing,
            });
            continue;
        }

        let quantity = line.quantity.max(1);
        match existing.get(&(line.product_id, line.color_id)) {
            Some(current) => {
                let merged = clamp_added_quantity(current.quantity, quantity, stock);
                if merged >= 1 {
                    plan.push(MergeAction::Update {
                        item_id: current.id,
                        quantity: merged,
                    });
                } else {
                    plan.push(MergeAction::Drop {
                        product_id: line.product_id,
                        reason: DropReason::OutOfStock,
                    });
                }
            }
            None => {
                let clamped = quantity.min(stock);
                if clamped >= 1 {
                    plan.push(MergeAction::Insert {
                        product_id: line.product_id,
                        color_id: line.color_id,
                        quantity: clamped,
                    });
                } else {
                    plan.push(MergeAction::Drop {
                        product_id: line.product_id,
                        reason: DropReason::OutOfStock,
                    });
                }
            }
        }
    }
    plan
}
