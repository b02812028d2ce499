// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Reusable egui components structured for MVU-style updates.

pub mod auth_form;
pub mod dashboard;
pub mod registration_card;
