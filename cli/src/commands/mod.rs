// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod account;
pub mod serve;
pub mod transfer;

pub use account::AccountCommand;
pub use transfer::TransferCommand;
