// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Shared helper utilities reused by UI and business logic.

pub mod phone;

/// Strip punctuation from a phone number.
pub use phone::digits_only;
/// Build the international number used by the messaging service.
pub use phone::international_number;
