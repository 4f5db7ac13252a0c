//! Canonical digest and transaction identifier.
//!
//! Both values hash the same line-oriented encoding: each field is written
//! as one compact JSON value followed by `\n`, in the ledger's fixed field
//! order. The encoding reproduces what the node computes over a
//! transaction decoded from its wire form:
//!
//! - byte fields (addresses included) are base64 strings, amounts are
//!   base64 big-endian;
//! - empty repeated fields encode as `null`;
//! - empty scalar byte fields on inputs and ext records are skipped;
//! - `<`, `>`, `&`, U+2028 and U+2029 are escaped as `\uXXXX`.
//!
//! ```text
//! per input:       ref_txid?, ref_offset, from_addr?, amount?, frozen_height
//! outputs:         the whole output array
//! desc:            only when non-empty
//! header:          nonce, timestamp, version
//! per input_ext:   bucket, key?, ref_txid?, ref_offset
//! per output_ext:  bucket, key?, value?
//! authorization:   contract_requests, initiator, auth_require
//! signatures:      initiator_signs, auth_require_signs   (txid only)
//! flags:           coinbase, autogen
//! hd info:         always null, version 3 and above
//! ```
//!
//! `digest = double_sha256(encoding without signatures)` is what every
//! party signs. `txid = double_sha256(encoding with signatures)` names the
//! fully signed transaction.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{InvokeRequest, ResourceType, SignatureInfo, TxBody, TxOutput};
use crate::codec::{amount_to_bytes, encode_base64, is_zero_i32, is_zero_i64};
use crate::crypto::double_sha256;
use crate::error::Result;

/// Accumulates newline-terminated JSON values.
struct LineEncoder {
    buf: Vec<u8>,
}

impl LineEncoder {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
        }
    }

    fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        escape_html_into(&json, &mut self.buf);
        self.buf.push(b'\n');
        Ok(())
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.put(&encode_base64(bytes))
    }

    /// Skips the field entirely when `bytes` is empty.
    fn put_nonempty(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.put_bytes(bytes)
    }
}

/// Applies the node encoder's HTML-safe escaping. These characters only
/// ever occur inside JSON strings, so a byte-level pass is exact.
fn escape_html_into(json: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < json.len() {
        match json[i] {
            b'<' => out.extend_from_slice(b"\\u003c"),
            b'>' => out.extend_from_slice(b"\\u003e"),
            b'&' => out.extend_from_slice(b"\\u0026"),
            // U+2028 and U+2029 are E2 80 A8 and E2 80 A9 in UTF-8.
            0xE2 if json.get(i + 1) == Some(&0x80)
                && matches!(json.get(i + 2), Some(&(0xA8 | 0xA9))) =>
            {
                let escaped: &[u8] = if json[i + 2] == 0xA8 {
                    b"\\u2028"
                } else {
                    b"\\u2029"
                };
                out.extend_from_slice(escaped);
                i += 3;
                continue;
            }
            b => out.push(b),
        }
        i += 1;
    }
}

/// A repeated field: `null` when empty.
fn repeated<T>(items: &[T]) -> Option<&[T]> {
    (!items.is_empty()).then_some(items)
}

fn nonempty_base64(bytes: &[u8]) -> Option<String> {
    (!bytes.is_empty()).then(|| encode_base64(bytes))
}

#[derive(Serialize)]
struct OutputView {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_addr: Option<String>,
    #[serde(skip_serializing_if = "is_zero_i64")]
    frozen_height: i64,
}

impl From<&TxOutput> for OutputView {
    fn from(output: &TxOutput) -> Self {
        Self {
            amount: nonempty_base64(&amount_to_bytes(output.amount)),
            to_addr: nonempty_base64(output.to_addr.as_bytes()),
            frozen_height: output.frozen_height,
        }
    }
}

#[derive(Serialize)]
struct LimitView {
    #[serde(rename = "type", skip_serializing_if = "is_zero_i32")]
    kind: i32,
    #[serde(skip_serializing_if = "is_zero_i64")]
    limit: i64,
}

fn resource_code(kind: ResourceType) -> i32 {
    match kind {
        ResourceType::Cpu => 0,
        ResourceType::Memory => 1,
        ResourceType::Disk => 2,
        ResourceType::XfeeCount => 3,
    }
}

#[derive(Serialize)]
struct RequestView<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    module_name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    contract_name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    method_name: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    args: BTreeMap<&'a str, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resource_limits: Vec<LimitView>,
    #[serde(skip_serializing_if = "str::is_empty")]
    amount: &'a str,
}

impl<'a> From<&'a InvokeRequest> for RequestView<'a> {
    fn from(req: &'a InvokeRequest) -> Self {
        Self {
            module_name: &req.module_name,
            contract_name: &req.contract_name,
            method_name: &req.method_name,
            args: req
                .args
                .iter()
                .map(|(k, v)| (k.as_str(), encode_base64(v)))
                .collect(),
            resource_limits: req
                .resource_limits
                .iter()
                .map(|l| LimitView {
                    kind: resource_code(l.kind),
                    limit: l.limit,
                })
                .collect(),
            amount: &req.amount,
        }
    }
}

#[derive(Serialize)]
struct SignView<'a> {
    #[serde(rename = "PublicKey", skip_serializing_if = "str::is_empty")]
    public_key: &'a str,
    #[serde(rename = "Sign", skip_serializing_if = "Option::is_none")]
    sign: Option<String>,
}

fn sign_views(signs: &[SignatureInfo]) -> Option<Vec<SignView<'_>>> {
    repeated(signs).map(|signs| {
        signs
            .iter()
            .map(|s| SignView {
                public_key: &s.public_key,
                sign: nonempty_base64(&s.sign),
            })
            .collect()
    })
}

fn encode(body: &TxBody, signs: Option<(&[SignatureInfo], &[SignatureInfo])>) -> Result<Vec<u8>> {
    let mut enc = LineEncoder::new();

    for input in &body.inputs {
        enc.put_nonempty(&input.ref_txid)?;
        enc.put(&input.ref_offset)?;
        enc.put_nonempty(input.from_addr.as_bytes())?;
        enc.put_nonempty(&amount_to_bytes(input.amount))?;
        enc.put(&input.frozen_height)?;
    }
    let outputs: Vec<OutputView> = body.outputs.iter().map(OutputView::from).collect();
    enc.put(&repeated(&outputs))?;
    enc.put_nonempty(&body.desc)?;
    enc.put(&body.nonce)?;
    enc.put(&body.timestamp)?;
    enc.put(&body.version)?;

    for input in &body.inputs_ext {
        enc.put(&input.bucket)?;
        enc.put_nonempty(&input.key)?;
        enc.put_nonempty(&input.ref_txid)?;
        enc.put(&input.ref_offset)?;
    }
    for output in &body.outputs_ext {
        enc.put(&output.bucket)?;
        enc.put_nonempty(&output.key)?;
        enc.put_nonempty(&output.value)?;
    }

    let requests: Vec<RequestView> = body
        .contract_requests
        .iter()
        .map(RequestView::from)
        .collect();
    enc.put(&repeated(&requests))?;
    enc.put(&body.initiator)?;
    enc.put(&repeated(&body.auth_require))?;

    if let Some((initiator_signs, auth_require_signs)) = signs {
        enc.put(&sign_views(initiator_signs))?;
        enc.put(&sign_views(auth_require_signs))?;
    }

    enc.put(&body.coinbase)?;
    enc.put(&body.autogen)?;
    if body.version >= 3 {
        enc.put(&())?;
    }

    Ok(enc.buf)
}

/// The hash every authorizer signs. Excludes all signatures.
pub fn digest(body: &TxBody) -> Result<Vec<u8>> {
    Ok(double_sha256(&encode(body, None)?))
}

/// The identifier of a signed transaction. Covers the signature lists.
pub fn transaction_id(
    body: &TxBody,
    initiator_signs: &[SignatureInfo],
    auth_require_signs: &[SignatureInfo],
) -> Result<Vec<u8>> {
    Ok(double_sha256(&encode(
        body,
        Some((initiator_signs, auth_require_signs)),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::{ResourceLimit, TxInputExt, TxOutputExt, Utxo};

    fn body() -> TxBody {
        TxBody {
            inputs: vec![Utxo {
                ref_txid: vec![0x11; 32],
                ref_offset: 0,
                to_addr: "alice".into(),
                amount: 100,
            }
            .to_input()],
            outputs: vec![TxOutput::new("bob", 60), TxOutput::new("alice", 40)],
            nonce: "nonce-1".into(),
            timestamp: 1_700_000_000_000_000_000,
            version: 1,
            initiator: "alice".into(),
            auth_require: vec!["alice".into()],
            ..TxBody::default()
        }
    }

    /// A transfer small enough to write its encoding out by hand.
    fn small_body() -> TxBody {
        TxBody {
            inputs: vec![Utxo {
                ref_txid: vec![1, 2, 3],
                ref_offset: 0,
                to_addr: "alice".into(),
                amount: 100,
            }
            .to_input()],
            ..body()
        }
    }

    const SMALL_BODY_ENCODING: &str = concat!(
        "\"AQID\"\n",
        "0\n",
        "\"YWxpY2U=\"\n",
        "\"ZA==\"\n",
        "0\n",
        "[{\"amount\":\"PA==\",\"to_addr\":\"Ym9i\"},{\"amount\":\"KA==\",\"to_addr\":\"YWxpY2U=\"}]\n",
        "\"nonce-1\"\n",
        "1700000000000000000\n",
        "1\n",
        "null\n",
        "\"alice\"\n",
        "[\"alice\"]\n",
        "false\n",
        "false\n",
    );

    fn sig(byte: u8) -> SignatureInfo {
        SignatureInfo {
            public_key: "pk".into(),
            sign: vec![byte; 64],
        }
    }

    fn text(body: &TxBody) -> String {
        String::from_utf8(encode(body, None).unwrap()).unwrap()
    }

    fn signed_text(body: &TxBody, initiator: &[SignatureInfo], auth: &[SignatureInfo]) -> String {
        String::from_utf8(encode(body, Some((initiator, auth))).unwrap()).unwrap()
    }

    #[test]
    fn digest_is_deterministic() {
        let a = digest(&body()).unwrap();
        let b = digest(&body()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn every_meaningful_field_changes_the_digest() {
        let base = digest(&body()).unwrap();
        let mutations: Vec<Box<dyn Fn(&mut TxBody)>> = vec![
            Box::new(|b: &mut TxBody| b.outputs[0].amount += 1),
            Box::new(|b: &mut TxBody| b.inputs[0].ref_offset = 1),
            Box::new(|b: &mut TxBody| b.nonce.push('x')),
            Box::new(|b: &mut TxBody| b.timestamp += 1),
            Box::new(|b: &mut TxBody| b.auth_require.push("carol".into())),
            Box::new(|b: &mut TxBody| b.initiator = "mallory".into()),
            Box::new(|b: &mut TxBody| b.desc = b"memo".to_vec()),
            Box::new(|b: &mut TxBody| {
                b.inputs_ext.push(TxInputExt {
                    bucket: "XCAccount".into(),
                    key: b"k".to_vec(),
                    ref_txid: vec![],
                    ref_offset: 0,
                })
            }),
        ];
        for mutate in mutations {
            let mut changed = body();
            mutate(&mut changed);
            assert_ne!(digest(&changed).unwrap(), base);
        }
    }

    #[test]
    fn signatures_affect_txid_but_not_digest() {
        let body = body();
        let unsigned_id = transaction_id(&body, &[], &[]).unwrap();
        let signed_id = transaction_id(&body, &[sig(1)], &[sig(1)]).unwrap();
        let other_id = transaction_id(&body, &[sig(2)], &[sig(2)]).unwrap();

        assert_ne!(unsigned_id, signed_id);
        assert_ne!(signed_id, other_id);
        assert_ne!(digest(&body).unwrap(), signed_id);
    }

    #[test]
    fn small_transfer_matches_known_encoding() {
        let body = small_body();
        assert_eq!(text(&body), SMALL_BODY_ENCODING);
        assert_eq!(
            hex::encode(digest(&body).unwrap()),
            "1573e38976cf81e65d28dce9594948adb66ff768df6bdbe4e57efbc9567562f6"
        );
    }

    #[test]
    fn unsigned_txid_encodes_null_signature_lists() {
        let body = small_body();
        let encoded = signed_text(&body, &[], &[]);
        assert!(encoded.contains("[\"alice\"]\nnull\nnull\nfalse\nfalse\n"));
        assert_eq!(
            hex::encode(transaction_id(&body, &[], &[]).unwrap()),
            "f86e6b0090d1cc17916a58ca926e6bd627531370a13732a5559a750a08d8a654"
        );
    }

    #[test]
    fn empty_byte_fields_are_skipped() {
        let mut body = small_body();
        body.inputs[0].ref_txid.clear();
        body.inputs_ext.push(TxInputExt {
            bucket: "b".into(),
            key: vec![],
            ref_txid: vec![],
            ref_offset: 2,
        });
        body.outputs_ext.push(TxOutputExt {
            bucket: "b".into(),
            key: b"k".to_vec(),
            value: vec![],
        });
        let text = text(&body);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0");
        assert_eq!(lines[1], "\"YWxpY2U=\"");
        let ext = lines.iter().position(|l| *l == "\"b\"").unwrap();
        assert_eq!(&lines[ext..ext + 4], &["\"b\"", "2", "\"b\"", "\"aw==\""]);
        assert_eq!(lines[ext + 4], "null");
    }

    #[test]
    fn empty_outputs_and_auth_require_encode_as_null() {
        let mut body = small_body();
        body.outputs.clear();
        body.auth_require.clear();
        let text = text(&body);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[5], "null");
        assert_eq!(lines[lines.len() - 3], "null");
    }

    #[test]
    fn contract_requests_use_node_field_rules() {
        let mut body = small_body();
        let mut request = InvokeRequest::new("wasm", "counter", "increase").arg("key", "a<b");
        request.resource_limits = vec![
            ResourceLimit {
                kind: ResourceType::Cpu,
                limit: 0,
            },
            ResourceLimit {
                kind: ResourceType::XfeeCount,
                limit: 9,
            },
        ];
        body.contract_requests.push(request);
        body.contract_requests
            .push(InvokeRequest::new("xkernel", "", "NewAccount"));

        let text = text(&body);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[9],
            concat!(
                "[{\"module_name\":\"wasm\",\"contract_name\":\"counter\",",
                "\"method_name\":\"increase\",\"args\":{\"key\":\"YTxi\"},",
                "\"resource_limits\":[{},{\"type\":3,\"limit\":9}]},",
                "{\"module_name\":\"xkernel\",\"method_name\":\"NewAccount\"}]"
            )
        );
    }

    #[test]
    fn html_sensitive_characters_are_escaped() {
        let mut body = small_body();
        body.initiator = "a&b<c>\u{2028}".into();
        let text = text(&body);
        assert!(text.contains("\"a\\u0026b\\u003cc\\u003e\\u2028\"\n"));
    }

    #[test]
    fn signatures_encode_with_base64_sign() {
        let body = small_body();
        let encoded = signed_text(&body, &[sig(0)], &[]);
        let expected = format!(
            "[{{\"PublicKey\":\"pk\",\"Sign\":\"{}\"}}]\nnull\n",
            encode_base64(&[0; 64])
        );
        assert!(encoded.contains(&expected));
    }

    #[test]
    fn hd_info_slot_follows_version_three() {
        let mut body = small_body();
        body.version = 3;
        assert!(text(&body).ends_with("false\nfalse\nnull\n"));
    }
}
