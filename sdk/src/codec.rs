//! Serde adapters for the ledger's JSON conventions.
//!
//! Byte fields travel as standard base64 strings and token amounts as the
//! base64 of their minimal big-endian encoding (zero is the empty string).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Minimal big-endian encoding of an amount. Zero encodes as no bytes.
pub fn amount_to_bytes(amount: u64) -> Vec<u8> {
    let raw = amount.to_be_bytes();
    let first = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
    raw[first..].to_vec()
}

/// Inverse of [`amount_to_bytes`]. Fails on more than eight bytes.
pub fn amount_from_bytes(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

pub(crate) fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

pub(crate) fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

pub(crate) fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// `#[serde(with = "base64_bytes")]` for `Vec<u8>` fields.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_base64(bytes))
    }

    /// `null` decodes as empty, matching how the ledger encodes nil slices.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        super::decode_base64(&text).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "amount_bytes")]` for `u64` amounts.
pub mod amount_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_base64(&super::amount_to_bytes(*amount)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = super::decode_base64(&text).map_err(serde::de::Error::custom)?;
        super::amount_from_bytes(&bytes)
            .ok_or_else(|| serde::de::Error::custom("amount exceeds 64 bits"))
    }
}

/// `#[serde(with = "base64_map")]` for `BTreeMap<String, Vec<u8>>` fields.
pub mod base64_map {
    use std::collections::BTreeMap;

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            out.serialize_entry(key, &super::encode_base64(value))?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| {
                super::decode_base64(&v)
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_encoding_is_minimal_big_endian() {
        assert_eq!(amount_to_bytes(0), Vec::<u8>::new());
        assert_eq!(amount_to_bytes(1), vec![1]);
        assert_eq!(amount_to_bytes(256), vec![1, 0]);
        assert_eq!(amount_to_bytes(u64::MAX), vec![0xff; 8]);
    }

    #[test]
    fn amount_decoding_rejects_oversized_input() {
        assert_eq!(amount_from_bytes(&[]), Some(0));
        assert_eq!(amount_from_bytes(&[1, 0]), Some(256));
        assert_eq!(amount_from_bytes(&[1; 9]), None);
    }

    #[test]
    fn base64_adapters_serialize_as_strings() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Sample {
            #[serde(with = "base64_bytes")]
            data: Vec<u8>,
            #[serde(with = "amount_bytes")]
            amount: u64,
        }

        let sample = Sample {
            data: b"hi".to_vec(),
            amount: 1000,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["data"], "aGk=");
        assert_eq!(json["amount"], "A+g=");

        let back: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample);
    }
}
