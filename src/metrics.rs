// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters for relationship and messaging activity.
#[derive(Clone)]
pub struct SocialMetrics {
    registry: Registry,
    pub friend_requests: IntCounterVec,
    pub blocks: IntCounterVec,
    pub messages_sent: IntCounter,
    pub reactions: IntCounterVec,
}

impl SocialMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("social_feed".to_string()), None)?;

        let friend_requests = IntCounterVec::new(
            Opts::new("friend_request_transitions_total", "Friend request state transitions"),
            &["transition"],
        )?;
        let blocks = IntCounterVec::new(
            Opts::new("block_changes_total", "Block and unblock calls that changed state"),
            &["change"],
        )?;
        let messages_sent = IntCounter::new("messages_sent_total", "Messages appended to conversations")?;
        let reactions = IntCounterVec::new(
            Opts::new("reaction_toggles_total", "Reaction toggles by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(friend_requests.clone()))?;
        registry.register(Box::new(blocks.clone()))?;
        registry.register(Box::new(messages_sent.clone()))?;
        registry.register(Box::new(reactions.clone()))?;

        Ok(Self {
            registry,
            friend_requests,
            blocks,
            messages_sent,
            reactions,
        })
    }

    /// Prometheus text exposition of every registered counter.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
