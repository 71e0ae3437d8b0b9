//! Base elements every game starts with.

use combo_core::{Item, ItemId};
use db::DbError;
use db::repositories::ItemRepository;

/// `(id, emoji, text)` of the starting items.
pub const BASE_ELEMENTS: [(i64, &str, &str); 4] = [
    (1, "💧", "Water"),
    (2, "🔥", "Fire"),
    (3, "🌍", "Earth"),
    (4, "🌬️", "Wind"),
];

/// Insert any missing base element. Returns how many were added.
pub async fn prepopulate(store: &ItemRepository) -> Result<usize, DbError> {
    let mut added = 0;
    for (id, emoji, text) in BASE_ELEMENTS {
        let item = Item::new(emoji, text).with_id(ItemId(id));
        if store.seed(&item).await? {
            added += 1;
        }
    }

    if added > 0 {
        tracing::info!("Seeded {} base element(s)", added);
    }
    Ok(added)
}
