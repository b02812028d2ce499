// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Display values derived from a [`Registration`]: submission date, image-use
//! label and the outbound WhatsApp confirmation link.

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, TimeZone};

use crate::config::MessagingConfig;
use crate::models::registration::Registration;
use crate::utils::international_number;

pub const AUTHORIZED_LABEL: &str = "Autorizado";
pub const NOT_AUTHORIZED_LABEL: &str = "Não autorizado";

/// `dd/MM/yyyy às HH:mm`
const DISPLAY_FORMAT: &str = "%d/%m/%Y às %H:%M";

/// Only the exact string `"true"` counts as consent.
pub fn is_image_use_authorized(flag: Option<&str>) -> bool {
    flag == Some("true")
}

pub fn image_use_label(flag: Option<&str>) -> &'static str {
    if is_image_use_authorized(flag) {
        AUTHORIZED_LABEL
    } else {
        NOT_AUTHORIZED_LABEL
    }
}

/// Format a stored timestamp in `tz`.
///
/// Offset-less timestamps are taken as wall-clock time and shown unchanged.
/// Anything unparseable is returned verbatim rather than hidden.
pub fn format_submitted_at<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(tz).format(DISPLAY_FORMAT).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(DISPLAY_FORMAT).to_string();
    }
    raw.to_string()
}

/// Templated confirmation text sent to the registrant.
pub fn confirmation_message(registration: &Registration, signature: &str) -> String {
    format!(
        "Olá! Seu pagamento de inscrição foi verificado e sua inscrição foi confirmada com sucesso! 🎉\n\n\
         Categoria: {}\n\
         Atletas: {} e {}\n\n\
         {}",
        registration.category, registration.athlete1_name, registration.athlete2_name, signature
    )
}

/// `{base_url}/{country code + digits}?text={percent-encoded message}`
pub fn confirmation_link(registration: &Registration, messaging: &MessagingConfig) -> String {
    let number = international_number(&registration.phone, &messaging.country_code);
    let message = confirmation_message(registration, &messaging.signature);
    format!(
        "{}/{}?text={}",
        messaging.base_url.trim_end_matches('/'),
        number,
        urlencoding::encode(&message)
    )
}
