// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! UI-independent application logic: routing decisions, record derivations
//! and the registration repository.

pub mod registration;
pub mod repository;
pub mod routes;
