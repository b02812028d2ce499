// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Domain layer: pure data types shared between the backend client and the UI.

pub mod registration;
pub mod session;
