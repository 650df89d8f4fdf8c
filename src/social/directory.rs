// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{SocialError, SocialResult};
use crate::models::profile::{IdentitySummary, NewProfile, Profile};
use crate::store::ProfileStore;

/// Profile records and display data for identities.
#[derive(Clone)]
pub struct IdentityDirectory {
    store: Arc<dyn ProfileStore>,
}

impl IdentityDirectory {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Register or update the caller's own profile.
    pub async fn register(
        &self,
        identity: &str,
        handle: &str,
        display_name: Option<&str>,
    ) -> SocialResult<Profile> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(SocialError::InvalidInput("handle must not be empty"));
        }
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let now = Utc::now().naive_utc();
        let profile = NewProfile {
            identity_id: identity.to_string(),
            handle: handle.to_string(),
            display_name,
            created_at: now,
            updated_at: now,
        };

        match self.store.upsert_profile(profile).await {
            Ok(stored) => {
                info!("Registered profile {} as @{}", stored.identity_id, stored.handle);
                Ok(stored)
            }
            Err(err) if err.is_conflict() => {
                debug!("Handle @{} requested by {} is taken", handle, identity);
                Err(SocialError::HandleTaken)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn profile(&self, identity: &str) -> SocialResult<Option<Profile>> {
        Ok(self.store.profile(identity).await?)
    }

    /// Summaries in the order of `identities`. Identities without a profile
    /// get a summary carrying only their id.
    pub async fn summaries(&self, identities: &[String]) -> SocialResult<Vec<IdentitySummary>> {
        let mut by_id: HashMap<String, Profile> = self
            .store
            .profiles(identities)
            .await?
            .into_iter()
            .map(|profile| (profile.identity_id.clone(), profile))
            .collect();

        Ok(identities
            .iter()
            .map(|id| match by_id.remove(id) {
                Some(profile) => IdentitySummary::from(profile),
                None => IdentitySummary::bare(id.as_str()),
            })
            .collect())
    }

    pub async fn summary(&self, identity: &str) -> SocialResult<IdentitySummary> {
        Ok(self
            .store
            .profile(identity)
            .await?
            .map(IdentitySummary::from)
            .unwrap_or_else(|| IdentitySummary::bare(identity)))
    }

    pub(crate) async fn search(&self, query: &str, viewer: &str, limit: i64) -> SocialResult<Vec<Profile>> {
        Ok(self.store.search_profiles(query, viewer, limit).await?)
    }
}
