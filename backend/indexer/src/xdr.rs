//! Conversion of base64 XDR `ScVal`s into JSON.
//!
//! Soroban RPC returns event topics and values as base64 XDR unless the
//! client asks for JSON. Parsing is done by `stellar-xdr`; this module maps
//! the subset of `ScVal` the crowdfund contract emits onto
//! [`serde_json::Value`], so the rest of the decoder handles both encodings
//! the same way:
//!
//! | ScVal                    | JSON                                   |
//! |--------------------------|----------------------------------------|
//! | bool / void              | bool / null                            |
//! | u32, i32, u64, i64       | number                                 |
//! | timepoint, duration      | number                                 |
//! | u128, i128               | decimal string                         |
//! | symbol, string           | string                                 |
//! | bytes                    | hex string                             |
//! | address                  | `"account:<hex>"` / `"contract:<hex>"` |
//! | vec / map (symbol keys)  | array / object                         |
//!
//! Anything else yields `None`.

use serde_json::{Map, Value};
use stellar_xdr::curr::{
    AccountId, Hash, Limits, PublicKey, ReadXdr, ScAddress, ScVal, Uint256,
};

/// Limits for untrusted RPC payloads.
const XDR_LIMITS: Limits = Limits {
    depth: 32,
    len: 64 * 1024,
};

/// Decode one base64 XDR `ScVal`. Trailing bytes are rejected.
pub fn decode_base64(encoded: &str) -> Option<Value> {
    let value = ScVal::from_xdr_base64(encoded.trim(), XDR_LIMITS).ok()?;
    to_json(&value)
}

fn to_json(value: &ScVal) -> Option<Value> {
    let json = match value {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::Void => Value::Null,
        ScVal::U32(v) => Value::from(*v),
        ScVal::I32(v) => Value::from(*v),
        ScVal::U64(v) => Value::from(*v),
        ScVal::I64(v) => Value::from(*v),
        ScVal::Timepoint(t) => Value::from(t.0),
        ScVal::Duration(d) => Value::from(d.0),
        ScVal::U128(parts) => {
            let v = (u128::from(parts.hi) << 64) | u128::from(parts.lo);
            Value::String(v.to_string())
        }
        ScVal::I128(parts) => {
            let v = (i128::from(parts.hi) << 64) | i128::from(parts.lo);
            Value::String(v.to_string())
        }
        ScVal::Bytes(bytes) => Value::String(hex::encode(bytes.0.as_slice())),
        ScVal::String(s) => Value::String(String::from_utf8(s.0.to_vec()).ok()?),
        ScVal::Symbol(s) => Value::String(String::from_utf8(s.0.to_vec()).ok()?),
        ScVal::Vec(None) | ScVal::Map(None) => Value::Null,
        ScVal::Vec(Some(items)) => Value::Array(
            items
                .0
                .iter()
                .map(to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        ScVal::Map(Some(entries)) => {
            let mut map = Map::new();
            for entry in entries.0.iter() {
                let key = match &entry.key {
                    ScVal::Symbol(s) => String::from_utf8(s.0.to_vec()).ok()?,
                    _ => return None,
                };
                map.insert(key, to_json(&entry.val)?);
            }
            Value::Object(map)
        }
        ScVal::Address(address) => Value::String(address_string(address)),
        _ => return None,
    };
    Some(json)
}

fn address_string(address: &ScAddress) -> String {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))) => {
            format!("account:{}", hex::encode(key))
        }
        ScAddress::Contract(Hash(id)) => format!("contract:{}", hex::encode(id)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use stellar_xdr::curr::{Int128Parts, ScMap, ScMapEntry, ScSymbol, WriteXdr};

    use super::*;

    pub(crate) fn symbol(s: &str) -> ScVal {
        ScVal::Symbol(ScSymbol(s.try_into().unwrap()))
    }

    pub(crate) fn u64_val(v: u64) -> ScVal {
        ScVal::U64(v)
    }

    pub(crate) fn i128_val(v: i128) -> ScVal {
        ScVal::I128(Int128Parts {
            hi: (v >> 64) as i64,
            lo: v as u64,
        })
    }

    pub(crate) fn contract_address(byte: u8) -> ScVal {
        ScVal::Address(ScAddress::Contract(Hash([byte; 32])))
    }

    pub(crate) fn map(entries: &[(&str, ScVal)]) -> ScVal {
        let entries: Vec<ScMapEntry> = entries
            .iter()
            .map(|(key, val)| ScMapEntry {
                key: symbol(key),
                val: val.clone(),
            })
            .collect();
        ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
    }

    pub(crate) fn b64(value: &ScVal) -> String {
        value.to_xdr_base64(Limits::none()).unwrap()
    }

    #[test]
    fn decodes_symbol_with_padding() {
        assert_eq!(decode_base64(&b64(&symbol("backed"))), Some(Value::from("backed")));
        assert_eq!(
            decode_base64(&b64(&symbol("finalised"))),
            Some(Value::from("finalised"))
        );
    }

    #[test]
    fn decodes_integers() {
        assert_eq!(decode_base64(&b64(&u64_val(42))), Some(Value::from(42u64)));
        assert_eq!(
            decode_base64(&b64(&i128_val(-5))),
            Some(Value::from("-5"))
        );
        let big = 170_141_183_460_469_231_731_687_303_715_884_105_727i128;
        assert_eq!(
            decode_base64(&b64(&i128_val(big))),
            Some(Value::from(big.to_string()))
        );
    }

    #[test]
    fn decodes_struct_map() {
        let value = map(&[
            ("amount", i128_val(20_000_000)),
            ("backer", contract_address(0xab)),
            ("project_id", u64_val(7)),
        ]);
        let value = decode_base64(&b64(&value)).unwrap();
        assert_eq!(value["amount"], "20000000");
        assert_eq!(value["project_id"], 7);
        assert_eq!(
            value["backer"],
            format!("contract:{}", "ab".repeat(32)).as_str()
        );
    }

    #[test]
    fn rejects_truncated_and_trailing_input() {
        let bytes = STANDARD.decode(b64(&u64_val(1))).unwrap();

        let truncated = STANDARD.encode(&bytes[..bytes.len() - 1]);
        assert_eq!(decode_base64(&truncated), None);

        let mut padded = bytes.clone();
        padded.extend([0u8; 4]);
        assert_eq!(decode_base64(&STANDARD.encode(&padded)), None);
        assert_eq!(decode_base64("not base64!"), None);
    }

    #[test]
    fn non_symbol_map_keys_are_rejected() {
        let value = ScVal::Map(Some(ScMap(
            vec![ScMapEntry {
                key: u64_val(1),
                val: u64_val(2),
            }]
            .try_into()
            .unwrap(),
        )));
        assert_eq!(decode_base64(&b64(&value)), None);
    }
}
