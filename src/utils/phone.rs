// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Phone number normalization for outbound messaging links.

/// Keep only ASCII digits, dropping spaces, dashes, parentheses and the like.
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Prefix the digits of a local number with `country_code` (e.g. `55` + `11988887777`).
///
/// No attempt is made to detect numbers that already carry the country code.
pub fn international_number(phone: &str, country_code: &str) -> String {
    format!("{}{}", digits_only(country_code), digits_only(phone))
}
