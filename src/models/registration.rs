// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Registration ("inscrição") record as stored in the `inscricoes` table.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Opaque row identifier. The table uses numeric ids, but strings are accepted too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct RegistrationId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for RegistrationId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl RegistrationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One submitted entry pairing two athletes for a category.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    #[serde(rename = "athlete1Name")]
    pub athlete1_name: String,
    #[serde(rename = "athlete1CPF")]
    pub athlete1_cpf: String,
    #[serde(rename = "athlete2Name")]
    pub athlete2_name: String,
    #[serde(rename = "athlete2CPF")]
    pub athlete2_cpf: String,
    pub category: String,
    /// Contact phone as typed by the registrant (digits plus punctuation).
    #[serde(rename = "telefone")]
    pub phone: String,
    /// Image-use consent. Only the literal string `"true"` means authorized.
    #[serde(
        rename = "authorizeImageUse",
        default,
        deserialize_with = "string_or_none"
    )]
    pub authorize_image_use: Option<String>,
    /// Submission timestamp, ISO-8601 as sent by the form backend.
    #[serde(rename = "data_inscricao")]
    pub submitted_at: String,
    /// Photo of the athlete pair.
    pub photo: String,
    /// Proof of payment image.
    #[serde(rename = "paymentProof")]
    pub payment_proof: String,
}

/// Keep string values as-is; booleans, numbers and nulls collapse to `None`.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": 1,
            "athlete1Name": "Ana",
            "athlete1CPF": "111.111.111-11",
            "athlete2Name": "Bia",
            "athlete2CPF": "222.222.222-22",
            "category": "Feminina",
            "telefone": "11988887777",
            "authorizeImageUse": "true",
            "data_inscricao": "2024-03-01T10:00:00Z",
            "photo": "p.jpg",
            "paymentProof": "c.jpg"
        })
    }

    #[test]
    fn deserializes_wire_names() {
        let reg: Registration = serde_json::from_value(row()).unwrap();

        assert_eq!(reg.id.as_str(), "1");
        assert_eq!(reg.athlete1_name, "Ana");
        assert_eq!(reg.athlete2_cpf, "222.222.222-22");
        assert_eq!(reg.phone, "11988887777");
        assert_eq!(reg.authorize_image_use.as_deref(), Some("true"));
        assert_eq!(reg.payment_proof, "c.jpg");
    }

    #[test]
    fn string_ids_are_kept_verbatim() {
        let mut value = row();
        value["id"] = json!("a1b2");

        let reg: Registration = serde_json::from_value(value).unwrap();

        assert_eq!(reg.id.to_string(), "a1b2");
    }

    #[test]
    fn non_string_image_flag_is_none() {
        let mut value = row();
        value["authorizeImageUse"] = json!(true);
        let reg: Registration = serde_json::from_value(value).unwrap();
        assert_eq!(reg.authorize_image_use, None);

        let mut value = row();
        value.as_object_mut().unwrap().remove("authorizeImageUse");
        let reg: Registration = serde_json::from_value(value).unwrap();
        assert_eq!(reg.authorize_image_use, None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut value = row();
        value.as_object_mut().unwrap().remove("category");

        assert!(serde_json::from_value::<Registration>(value).is_err());
    }
}
