// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

//! Relationship and messaging engines wired over a single store.

pub mod blocking;
pub mod conversations;
pub mod directory;
pub mod edit_history;
pub mod friend_graph;
pub mod messaging;
pub mod reactions;

use std::sync::Arc;

pub use blocking::BlockList;
pub use conversations::ConversationResolver;
pub use directory::IdentityDirectory;
pub use edit_history::EditLedger;
pub use friend_graph::FriendGraph;
pub use messaging::Messenger;
pub use reactions::ReactionToggle;

use crate::error::SocialResult;
use crate::metrics::SocialMetrics;
use crate::store::{MemoryStore, Store};

/// Entry point to every engine.
#[derive(Clone)]
pub struct SocialCore {
    store: Arc<dyn Store>,
    metrics: SocialMetrics,
    directory: IdentityDirectory,
    friends: FriendGraph,
    blocks: BlockList,
    conversations: ConversationResolver,
    messenger: Messenger,
    reactions: ReactionToggle,
    history: EditLedger,
}

impl SocialCore {
    pub fn new<S: Store + 'static>(store: Arc<S>, metrics: SocialMetrics) -> Self {
        let directory = IdentityDirectory::new(store.clone());
        let friends = FriendGraph::new(store.clone(), directory.clone(), metrics.clone());
        let blocks = BlockList::new(store.clone(), directory.clone(), metrics.clone());
        let conversations = ConversationResolver::new(store.clone(), friends.clone(), directory.clone());
        let messenger = Messenger::new(store.clone(), store.clone(), directory.clone(), metrics.clone());
        let reactions = ReactionToggle::new(store.clone(), metrics.clone());
        let history = EditLedger::new(store.clone());

        Self {
            store,
            metrics,
            directory,
            friends,
            blocks,
            conversations,
            messenger,
            reactions,
            history,
        }
    }

    /// A core backed by [`MemoryStore`].
    pub fn in_memory() -> prometheus::Result<Self> {
        Ok(Self::new(Arc::new(MemoryStore::new()), SocialMetrics::new()?))
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    pub fn friends(&self) -> &FriendGraph {
        &self.friends
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    pub fn conversations(&self) -> &ConversationResolver {
        &self.conversations
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    pub fn reactions(&self) -> &ReactionToggle {
        &self.reactions
    }

    pub fn history(&self) -> &EditLedger {
        &self.history
    }

    pub fn metrics(&self) -> &SocialMetrics {
        &self.metrics
    }

    /// Store liveness.
    pub async fn ping(&self) -> SocialResult<()> {
        Ok(self.store.ping().await?)
    }
}
