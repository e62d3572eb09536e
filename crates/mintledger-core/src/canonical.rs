//! Canonical CBOR encoding for records and operations.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! Records are stored in this form, and operations are signed in this form,
//! so the same value always produces the same bytes on every platform.

use ciborium::value::{Integer, Value};

use crate::crypto::Principal;
use crate::error::CoreError;
use crate::operation::{Operation, OperationKind};
use crate::record::{AccountRecord, MintRecord};
use crate::types::{AccountAddress, MintAddress};

/// Map keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const TAG: u64 = 0;

    // Mint records
    pub const MINT_ADDRESS: u64 = 1;
    pub const AUTHORITY: u64 = 2;
    pub const DECIMALS: u64 = 3;
    pub const TOTAL_SUPPLY: u64 = 4;

    // Account records
    pub const ACCOUNT_ADDRESS: u64 = 1;
    pub const OWNER: u64 = 2;
    pub const MINT: u64 = 3;
    pub const AMOUNT: u64 = 4;

    // Operations; TAG holds the operation kind
    pub const OP_MINT: u64 = 1;
    pub const OP_ACCOUNT: u64 = 2;
    pub const OP_FROM: u64 = 3;
    pub const OP_TO: u64 = 4;
    pub const OP_OWNER: u64 = 5;
    pub const OP_AMOUNT: u64 = 6;
    pub const OP_DECIMALS: u64 = 7;
}

/// Record type tags.
const MINT_TAG: u64 = 1;
const ACCOUNT_TAG: u64 = 2;

/// Encode a mint record to canonical CBOR bytes.
pub fn canonical_mint_bytes(mint: &MintRecord) -> Vec<u8> {
    let value = Value::Map(vec![
        entry(keys::TAG, Value::Integer(MINT_TAG.into())),
        entry(keys::MINT_ADDRESS, bytes(mint.address().as_bytes())),
        entry(keys::AUTHORITY, bytes(mint.authority().as_bytes())),
        entry(keys::DECIMALS, Value::Integer(mint.decimals().into())),
        entry(keys::TOTAL_SUPPLY, Value::Integer(mint.total_supply().into())),
    ]);
    encode_cbor_value_canonical(&value)
}

/// Encode an account record to canonical CBOR bytes.
pub fn canonical_account_bytes(account: &AccountRecord) -> Vec<u8> {
    let value = Value::Map(vec![
        entry(keys::TAG, Value::Integer(ACCOUNT_TAG.into())),
        entry(keys::ACCOUNT_ADDRESS, bytes(account.address().as_bytes())),
        entry(keys::OWNER, bytes(account.owner().as_bytes())),
        entry(keys::MINT, bytes(account.mint().as_bytes())),
        entry(keys::AMOUNT, Value::Integer(account.amount().into())),
    ]);
    encode_cbor_value_canonical(&value)
}

/// Encode an operation to canonical CBOR bytes.
pub fn canonical_operation_bytes(op: &Operation) -> Vec<u8> {
    let mut entries = vec![entry(keys::TAG, Value::Integer(op.kind().to_u8().into()))];

    match op {
        Operation::Initialize { mint, decimals } => {
            entries.push(entry(keys::OP_MINT, bytes(mint.as_bytes())));
            entries.push(entry(keys::OP_DECIMALS, Value::Integer((*decimals).into())));
        }
        Operation::CreateTokenAccount { mint, owner } => {
            entries.push(entry(keys::OP_MINT, bytes(mint.as_bytes())));
            entries.push(entry(keys::OP_OWNER, bytes(owner.as_bytes())));
        }
        Operation::Issue {
            mint,
            account,
            amount,
        }
        | Operation::Burn {
            mint,
            account,
            amount,
        } => {
            entries.push(entry(keys::OP_MINT, bytes(mint.as_bytes())));
            entries.push(entry(keys::OP_ACCOUNT, bytes(account.as_bytes())));
            entries.push(entry(keys::OP_AMOUNT, Value::Integer((*amount).into())));
        }
        Operation::Transfer { from, to, amount } => {
            entries.push(entry(keys::OP_FROM, bytes(from.as_bytes())));
            entries.push(entry(keys::OP_TO, bytes(to.as_bytes())));
            entries.push(entry(keys::OP_AMOUNT, Value::Integer((*amount).into())));
        }
    }

    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Decode a mint record from canonical bytes.
pub fn decode_mint(data: &[u8]) -> Result<MintRecord, CoreError> {
    let map = decode_canonical_map(data)?;
    expect_tag(&map, MINT_TAG)?;

    let decimals = get_uint(&map, keys::DECIMALS, "decimals")?;
    let decimals = u8::try_from(decimals)
        .map_err(|_| CoreError::MalformedRecord(format!("decimals out of range: {}", decimals)))?;

    Ok(MintRecord::from_parts(
        MintAddress(get_bytes32(&map, keys::MINT_ADDRESS, "mint address")?),
        Principal(get_bytes32(&map, keys::AUTHORITY, "authority")?),
        decimals,
        get_uint(&map, keys::TOTAL_SUPPLY, "total supply")?,
    ))
}

/// Decode an account record from canonical bytes.
pub fn decode_account(data: &[u8]) -> Result<AccountRecord, CoreError> {
    let map = decode_canonical_map(data)?;
    expect_tag(&map, ACCOUNT_TAG)?;

    Ok(AccountRecord::from_parts(
        AccountAddress(get_bytes32(&map, keys::ACCOUNT_ADDRESS, "account address")?),
        Principal(get_bytes32(&map, keys::OWNER, "owner")?),
        MintAddress(get_bytes32(&map, keys::MINT, "mint")?),
        get_uint(&map, keys::AMOUNT, "amount")?,
    ))
}

/// Decode an operation from canonical bytes.
pub fn decode_operation(data: &[u8]) -> Result<Operation, CoreError> {
    let map = decode_canonical_map(data)?;
    let tag = get_uint(&map, keys::TAG, "operation kind")?;
    let kind = u8::try_from(tag)
        .ok()
        .and_then(OperationKind::from_u8)
        .ok_or_else(|| CoreError::MalformedRecord(format!("invalid operation kind: {}", tag)))?;

    let mint = || get_bytes32(&map, keys::OP_MINT, "mint").map(MintAddress);
    let account = || get_bytes32(&map, keys::OP_ACCOUNT, "account").map(AccountAddress);
    let amount = || get_uint(&map, keys::OP_AMOUNT, "amount");

    let op = match kind {
        OperationKind::Initialize => {
            let decimals = get_uint(&map, keys::OP_DECIMALS, "decimals")?;
            Operation::Initialize {
                mint: mint()?,
                decimals: u8::try_from(decimals).map_err(|_| {
                    CoreError::MalformedRecord(format!("decimals out of range: {}", decimals))
                })?,
            }
        }
        OperationKind::CreateTokenAccount => Operation::CreateTokenAccount {
            mint: mint()?,
            owner: Principal(get_bytes32(&map, keys::OP_OWNER, "owner")?),
        },
        OperationKind::Issue => Operation::Issue {
            mint: mint()?,
            account: account()?,
            amount: amount()?,
        },
        OperationKind::Transfer => Operation::Transfer {
            from: AccountAddress(get_bytes32(&map, keys::OP_FROM, "from")?),
            to: AccountAddress(get_bytes32(&map, keys::OP_TO, "to")?),
            amount: amount()?,
        },
        OperationKind::Burn => Operation::Burn {
            mint: mint()?,
            account: account()?,
            amount: amount()?,
        },
    };
    Ok(op)
}

fn entry(key: u64, value: Value) -> (Value, Value) {
    (Value::Integer(key.into()), value)
}

fn bytes(b: &[u8; 32]) -> Value {
    Value::Bytes(b.to_vec())
}

/// Parse `data` as a CBOR map and require that it is canonically encoded.
fn decode_canonical_map(data: &[u8]) -> Result<Vec<(Value, Value)>, CoreError> {
    let value: Value =
        ciborium::from_reader(data).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if encode_cbor_value_canonical(&value) != data {
        return Err(CoreError::MalformedRecord("non-canonical encoding".into()));
    }

    match value {
        Value::Map(m) => Ok(m),
        _ => Err(CoreError::MalformedRecord("expected map".into())),
    }
}

fn lookup(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

fn expect_tag(map: &[(Value, Value)], tag: u64) -> Result<(), CoreError> {
    let found = get_uint(map, keys::TAG, "record tag")?;
    if found == tag {
        Ok(())
    } else {
        Err(CoreError::MalformedRecord(format!(
            "wrong record tag: expected {}, got {}",
            tag, found
        )))
    }
}

fn get_uint(map: &[(Value, Value)], key: u64, what: &str) -> Result<u64, CoreError> {
    match lookup(map, key) {
        Some(Value::Integer(i)) => u64::try_from(*i)
            .map_err(|_| CoreError::MalformedRecord(format!("invalid {}", what))),
        _ => Err(CoreError::MalformedRecord(format!("missing {}", what))),
    }
}

fn get_bytes32(map: &[(Value, Value)], key: u64, what: &str) -> Result<[u8; 32], CoreError> {
    match lookup(map, key) {
        Some(Value::Bytes(b)) => b
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::MalformedRecord(format!("invalid {}", what))),
        _ => Err(CoreError::MalformedRecord(format!("missing {}", what))),
    }
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only the value shapes this module builds are supported; anything else in
/// decoded input is written as `undefined` so the canonical check rejects it.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        _ => buf.push(0xf7),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
