// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod social;
pub mod store;

pub use error::{SocialError, SocialResult, StoreError};
pub use social::SocialCore;
