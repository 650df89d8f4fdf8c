// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::SocialResult;
use crate::models::edit_history::{EditHistory, EntityKind, NewEditHistory};
use crate::store::HistoryStore;

/// Append-only ledger of content edits.
#[derive(Clone)]
pub struct EditLedger {
    store: Arc<dyn HistoryStore>,
}

impl EditLedger {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Append one transition. Identical old and new content is still recorded.
    pub async fn record(
        &self,
        kind: EntityKind,
        entity_id: &str,
        old_content: &str,
        new_content: &str,
    ) -> SocialResult<EditHistory> {
        let entry = self
            .store
            .append_history(NewEditHistory {
                entity_kind: kind,
                entity_id: entity_id.to_string(),
                old_content: old_content.to_string(),
                new_content: new_content.to_string(),
                created_at: Utc::now().naive_utc(),
            })
            .await?;
        debug!("Recorded edit {} for {} {}", entry.id, kind, entity_id);
        Ok(entry)
    }

    /// Record after a content update has already succeeded. Ledger failures
    /// are logged and swallowed.
    pub async fn record_best_effort(&self, kind: EntityKind, entity_id: &str, old_content: &str, new_content: &str) {
        if let Err(err) = self.record(kind, entity_id, old_content, new_content).await {
            warn!("Failed to record edit history for {} {}: {}", kind, entity_id, err);
        }
    }

    /// Entries for one entity, newest first.
    pub async fn history(&self, kind: EntityKind, entity_id: &str) -> SocialResult<Vec<EditHistory>> {
        Ok(self.store.history(kind, entity_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use tracing_test::traced_test;

    struct FailingLedger;

    #[async_trait]
    impl HistoryStore for FailingLedger {
        async fn append_history(&self, _entry: NewEditHistory) -> StoreResult<EditHistory> {
            Err(StoreError::Pool("no connections available".into()))
        }

        async fn history(&self, _kind: EntityKind, _entity_id: &str) -> StoreResult<Vec<EditHistory>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn history_is_newest_first_and_scoped_by_kind() {
        let ledger = EditLedger::new(Arc::new(MemoryStore::new()));
        ledger.record(EntityKind::Post, "42", "a", "b").await.unwrap();
        ledger.record(EntityKind::Post, "42", "b", "b").await.unwrap();
        ledger.record(EntityKind::Comment, "42", "x", "y").await.unwrap();

        let entries = ledger.history(EntityKind::Post, "42").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].old_content, "b");
        assert_eq!(entries[1].old_content, "a");
        assert_eq!(ledger.history(EntityKind::Comment, "42").await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn best_effort_record_swallows_failures() {
        let ledger = EditLedger::new(Arc::new(FailingLedger));
        ledger.record_best_effort(EntityKind::Comment, "7", "old", "new").await;
        assert!(logs_contain("Failed to record edit history for comment 7"));
    }
}
