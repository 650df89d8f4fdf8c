// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

table! {
    profiles (identity_id) {
        identity_id -> Text,
        handle -> Text,
        display_name -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    friend_requests (id) {
        id -> Integer,
        requester_id -> Text,
        receiver_id -> Text,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    profile_blocks (id) {
        id -> Integer,
        blocker_id -> Text,
        blocked_id -> Text,
        created_at -> Timestamp,
    }
}

table! {
    conversations (id) {
        id -> Integer,
        participant_low -> Text,
        participant_high -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    messages (id) {
        id -> Integer,
        conversation_id -> Integer,
        sender_id -> Text,
        content -> Text,
        is_read -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    post_reactions (post_id, identity_id) {
        post_id -> Text,
        identity_id -> Text,
        kind -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    edit_history (id) {
        id -> Integer,
        entity_kind -> Varchar,
        entity_id -> Text,
        old_content -> Text,
        new_content -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(messages -> conversations (conversation_id));

allow_tables_to_appear_in_same_query!(
    profiles,
    friend_requests,
    profile_blocks,
    conversations,
    messages,
    post_reactions,
    edit_history,
);
