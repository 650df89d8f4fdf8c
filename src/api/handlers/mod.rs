// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

pub mod blocks;
pub mod conversations;
pub mod friends;
pub mod health;
pub mod history;
pub mod profiles;
pub mod reactions;
