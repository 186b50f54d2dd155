use std::collections::{HashMap, HashSet};

use digito_store::domain::cart::{
    CatalogSnapshot, DropReason, MergeAction, SessionCart, SessionCartLine, StoredCartLine,
    clamp_added_quantity, line_key, merge_cart,
};
use uuid::Uuid;

fn session_with(lines: &[(Uuid, Option<Uuid>, i32)]) -> SessionCart {
    lines
        .iter()
        .map(|&(product_id, color_id, quantity)| {
            (
                line_key(product_id, color_id),
                SessionCartLine {
                    product_id,
                    color_id,
                    quantity,
                },
            )
        })
        .collect()
}

fn catalog(stock: &[(Uuid, i32)], colors: &[Uuid]) -> CatalogSnapshot {
    CatalogSnapshot {
        stock: stock.iter().copied().collect::<HashMap<_, _>>(),
        colors: colors.iter().copied().collect::<HashSet<_>>(),
    }
}

#[test]
fn matching_lines_add_up() {
    let product = Uuid::new_v4();
    let color = Uuid::new_v4();
    let item_id = Uuid::new_v4();

    let session = session_with(&[(product, Some(color), 3)]);
    let stored = vec![StoredCartLine {
        id: item_id,
        product_id: product,
        color_id: Some(color),
        quantity: 1,
    }];

    let plan = merge_cart(&session, &stored, &catalog(&[(product, 10)], &[color]));
    assert_eq!(
        plan,
        vec![MergeAction::Update {
            item_id,
            quantity: 4
        }]
    );
}

#[test]
fn merged_quantity_is_clamped_to_stock() {
    let product = Uuid::new_v4();
    let item_id = Uuid::new_v4();

    let session = session_with(&[(product, None, 10)]);
    let stored = vec![StoredCartLine {
        id: item_id,
        product_id: product,
        color_id: None,
        quantity: 1,
    }];

    let plan = merge_cart(&session, &stored, &catalog(&[(product, 5)], &[]));
    assert_eq!(
        plan,
        vec![MergeAction::Update {
            item_id,
            quantity: 5
        }]
    );
}

#[test]
fn different_color_is_a_separate_line() {
    let product = Uuid::new_v4();
    let red = Uuid::new_v4();
    let blue = Uuid::new_v4();

    let session = session_with(&[(product, Some(blue), 2)]);
    let stored = vec![StoredCartLine {
        id: Uuid::new_v4(),
        product_id: product,
        color_id: Some(red),
        quantity: 1,
    }];

    let plan = merge_cart(&session, &stored, &catalog(&[(product, 10)], &[red, blue]));
    assert_eq!(
        plan,
        vec![MergeAction::Insert {
            product_id: product,
            color_id: Some(blue),
            quantity: 2
        }]
    );
}

#[test]
fn new_lines_are_clamped_and_out_of_stock_dropped() {
    let plenty = Uuid::new_v4();
    let sold_out = Uuid::new_v4();

    let session = session_with(&[(plenty, None, 7), (sold_out, None, 1)]);
    let plan = merge_cart(&session, &[], &catalog(&[(plenty, 3), (sold_out, 0)], &[]));

    assert_eq!(plan.len(), 2);
    assert!(plan.contains(&MergeAction::Insert {
        product_id: plenty,
        color_id: None,
        quantity: 3
    }));
    assert!(plan.contains(&MergeAction::Drop {
        product_id: sold_out,
        reason: DropReason::OutOfStock
    }));
}

#[test]
fn vanished_products_and_colors_are_dropped() {
    let gone = Uuid::new_v4();
    let product = Uuid::new_v4();
    let deleted_color = Uuid::new_v4();

    let session = session_with(&[(gone, None, 1), (product, Some(deleted_color), 2)]);
    let plan = merge_cart(&session, &[], &catalog(&[(product, 10)], &[]));

    assert!(plan.contains(&MergeAction::Drop {
        product_id: gone,
        reason: DropReason::ProductMissing
    }));
    assert!(plan.contains(&MergeAction::Drop {
        product_id: product,
        reason: DropReason::ColorMissing
    }));
}

#[test]
fn empty_session_cart_plans_nothing() {
    let plan = merge_cart(&SessionCart::new(), &[], &CatalogSnapshot::default());
    assert!(plan.is_empty());
}

#[test]
fn clamp_never_exceeds_stock() {
    assert_eq!(clamp_added_quantity(1, 3, 10), 4);
    assert_eq!(clamp_added_quantity(4, 3, 5), 5);
    assert_eq!(clamp_added_quantity(i32::MAX, 1, 8), 8);
}

#[test]
fn line_keys_distinguish_colorless_lines() {
    let product = Uuid::new_v4();
    let color = Uuid::new_v4();
    assert_eq!(line_key(product, None), format!("{product}_none"));
    assert_eq!(line_key(product, Some(color)), format!("{product}_{color}"));
}
