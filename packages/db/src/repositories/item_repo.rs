//! Item repository: items and the parent pairs that produce them.

use std::time::Duration;

use combo_core::{Item, ItemId, ParentPair};
use serde::Deserialize;

use crate::connection::check;
use crate::{Database, DbError};

/// Attempts for a write that keeps losing transaction conflicts.
const WRITE_ATTEMPTS: u32 = 16;

/// Repository for item persistence operations.
///
/// Every operation runs as its own query batch; writes that touch more
/// than one record are wrapped in a single transaction.
#[derive(Clone)]
pub struct ItemRepository {
    db: Database,
}

/// Internal row type for item reads.
#[derive(Debug, Deserialize)]
struct ItemRecord {
    id: i64,
    emoji: String,
    text: String,
}

/// Internal row type for parent pair reads.
#[derive(Debug, Deserialize)]
struct PairRecord {
    first: i64,
    second: i64,
}

impl PairRecord {
    fn into_pair(self) -> ParentPair {
        ParentPair::new(ItemId(self.first), ItemId(self.second))
    }
}

impl ItemRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Persist a new item with all of its parent pairs.
    ///
    /// Fails with `ConstraintViolation` if any pair already belongs to an
    /// item; nothing is written in that case.
    pub async fn add_item(
        &self,
        emoji: &str,
        text: &str,
        parents: &[ParentPair],
    ) -> Result<ItemId, DbError> {
        let mut parents = parents.to_vec();
        parents.sort();
        parents.dedup();

        let item = Item::new(emoji, text).with_parents(parents);
        item.validate()?;

        for pair in &item.parents {
            if let Some(owner) = self.owner_of(*pair).await? {
                return Err(DbError::ConstraintViolation(format!(
                    "pair {} already produces item {}",
                    pair, owner
                )));
            }
        }

        let id = self.insert(None, &item).await?;

        tracing::debug!("Stored item {} {} {}", id, item.emoji, item.text);
        Ok(id)
    }

    /// Seed an item under its own id if no item has that id yet.
    ///
    /// Returns false when the id is already taken. The id sequence is moved
    /// past the seeded id so later items never collide with it.
    pub async fn seed(&self, item: &Item) -> Result<bool, DbError> {
        let Some(id) = item.id else {
            return Err(DbError::Query("Seed items need an explicit id".into()));
        };
        item.validate()?;

        if self.exists(id).await? {
            return Ok(false);
        }

        self.insert(Some(id), item).await?;
        Ok(true)
    }

    /// Add another pair that produces an existing item.
    ///
    /// Returns false if the item does not exist. Adding a pair the item
    /// already owns is a no-op; a pair owned by a different item fails with
    /// `ConstraintViolation`.
    pub async fn add_parent_pair(
        &self,
        item_id: ItemId,
        first: ItemId,
        second: ItemId,
    ) -> Result<bool, DbError> {
        let pair = ParentPair::new(first, second);
        pair.validate()?;

        match self.owner_of(pair).await? {
            Some(owner) if owner == item_id => return Ok(true),
            Some(owner) => {
                return Err(DbError::ConstraintViolation(format!(
                    "pair {} already produces item {}",
                    pair, owner
                )));
            }
            None => {}
        }

        if !self.exists(item_id).await? {
            return Ok(false);
        }

        let response = self
            .db
            .client()
            .query("CREATE parent SET first = $first, second = $second, item_id = $item_id")
            .bind(("first", pair.first.get()))
            .bind(("second", pair.second.get()))
            .bind(("item_id", item_id.get()))
            .await?;

        match check(response) {
            Ok(_) => Ok(true),
            // Lost a race with a concurrent insert of the same pair.
            Err(DbError::ConstraintViolation(message)) => match self.owner_of(pair).await? {
                Some(owner) if owner == item_id => Ok(true),
                _ => Err(DbError::ConstraintViolation(message)),
            },
            Err(e) => Err(e),
        }
    }

    /// Get an item by id, with its parent pairs.
    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        let response = self
            .db
            .client()
            .query(
                r#"
                SELECT record::id(id) AS id, emoji, text FROM type::thing('item', $id);
                SELECT first, second FROM parent WHERE item_id = $id ORDER BY first, second;
                "#,
            )
            .bind(("id", id.get()))
            .await?;
        let mut response = check(response)?;

        let records: Vec<ItemRecord> = response.take(0)?;
        let Some(record) = records.into_iter().next() else {
            return Ok(None);
        };
        let pairs: Vec<PairRecord> = response.take(1)?;

        Ok(Some(Item {
            id: Some(ItemId(record.id)),
            emoji: record.emoji,
            text: record.text,
            parents: pairs.into_iter().map(PairRecord::into_pair).collect(),
        }))
    }

    /// Get the item a pair produces, in either order.
    pub async fn get_item_by_pair(
        &self,
        first: ItemId,
        second: ItemId,
    ) -> Result<Option<Item>, DbError> {
        let pair = ParentPair::new(first, second);
        match self.owner_of(pair).await? {
            Some(owner) => self.get_item(owner).await,
            None => Ok(None),
        }
    }

    /// Check if an item exists.
    pub async fn exists(&self, id: ItemId) -> Result<bool, DbError> {
        let response = self
            .db
            .client()
            .query("SELECT VALUE record::id(id) FROM type::thing('item', $id)")
            .bind(("id", id.get()))
            .await?;
        let mut response = check(response)?;

        let ids: Vec<i64> = response.take(0)?;
        Ok(!ids.is_empty())
    }

    /// Count stored items.
    pub async fn count(&self) -> Result<u64, DbError> {
        let response = self
            .db
            .client()
            .query("SELECT count() FROM item GROUP ALL")
            .await?;
        let mut response = check(response)?;

        #[derive(Deserialize)]
        struct CountResult {
            count: i64,
        }

        let counts: Vec<CountResult> = response.take(0)?;
        Ok(counts.first().map_or(0, |c| c.count.max(0) as u64))
    }

    /// Id of the item a canonical pair belongs to.
    async fn owner_of(&self, pair: ParentPair) -> Result<Option<ItemId>, DbError> {
        let response = self
            .db
            .client()
            .query("SELECT VALUE item_id FROM parent WHERE first = $first AND second = $second LIMIT 1")
            .bind(("first", pair.first.get()))
            .bind(("second", pair.second.get()))
            .await?;
        let mut response = check(response)?;

        let owners: Vec<i64> = response.take(0)?;
        Ok(owners.into_iter().next().map(ItemId))
    }

    /// Write an item and its pairs, retrying on transaction conflicts.
    ///
    /// Without an explicit id the next one is taken from the sequence in
    /// the same transaction, so concurrent writers never share an id.
    async fn insert(&self, id: Option<ItemId>, item: &Item) -> Result<ItemId, DbError> {
        let mut attempt = 1;
        loop {
            match self.try_insert(id, item).await {
                Err(DbError::Conflict(message)) if attempt < WRITE_ATTEMPTS => {
                    tracing::debug!(
                        "Write of {} conflicted (attempt {}): {}",
                        item.text,
                        attempt,
                        message
                    );
                    tokio::time::sleep(backoff(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_insert(&self, id: Option<ItemId>, item: &Item) -> Result<ItemId, DbError> {
        let mut sql = String::from("BEGIN TRANSACTION;\n");
        match id {
            Some(_) => sql.push_str(
                "LET $id = $seed_id;\n\
                 UPSERT counter:item SET value = math::max([(value OR 0), $id]);\n",
            ),
            None => sql.push_str(
                "LET $id = (UPSERT counter:item SET value = (value OR 0) + 1 RETURN VALUE value)[0];\n",
            ),
        }
        sql.push_str("CREATE type::thing('item', $id) SET emoji = $emoji, text = $text;\n");
        for idx in 0..item.parents.len() {
            sql.push_str(&format!(
                "CREATE parent SET first = $first_{idx}, second = $second_{idx}, item_id = $id;\n"
            ));
        }
        sql.push_str("SELECT VALUE record::id(id) FROM type::thing('item', $id);\n");
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = self
            .db
            .client()
            .query(sql)
            .bind(("seed_id", id.map(ItemId::get)))
            .bind(("emoji", item.emoji.clone()))
            .bind(("text", item.text.clone()));

        for (idx, pair) in item.parents.iter().enumerate() {
            query = query
                .bind((format!("first_{idx}"), pair.first.get()))
                .bind((format!("second_{idx}"), pair.second.get()));
        }

        let mut response = check(query.await?)?;
        let last = response.num_statements().saturating_sub(1);
        let ids: Vec<i64> = response.take(last)?;
        ids.into_iter()
            .next()
            .map(ItemId)
            .ok_or_else(|| DbError::Query("Failed to allocate item id".into()))
    }
}

/// Growing pause between conflicting attempts, spread so that writers
/// that collided once do not collide again in lockstep.
fn backoff(attempt: u32) -> Duration {
    let base = 2 * u64::from(attempt.min(8));
    let spread = (ulid::Ulid::new().random() % 5) as u64;
    Duration::from_millis(base + spread)
}
