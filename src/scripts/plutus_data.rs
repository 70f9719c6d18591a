use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

mod pallas_interop;


/// Constructor index that needs the general `102` form past this value
const MAX_COMPACT_CONSTR_INDEX: u64 = 127;

/// Data as understood by Plutus validators
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(BTreeMap<PlutusData, PlutusData>),
    BigInt(BigInt),
    BoundedBytes(Vec<u8>),
    Array(Vec<PlutusData>),
}

/// Tagged constructor. `tag` is the CBOR tag; `any_constructor` is only set for tag `102`.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Constr<T> {
    pub tag: u64,
    pub any_constructor: Option<u64>,
    pub fields: Vec<T>,
}

#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum BigInt {
    /// `-val` when `neg`, otherwise `val`
    Int { neg: bool, val: u64 },
    BigUInt(Vec<u8>),
    BigNInt(Vec<u8>),
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlutusDataError {
    #[error("Failed to encode PlutusData: {0}")]
    Encode(String),
    #[error("Failed to decode PlutusData: {0}")]
    Decode(String),
    #[error("Expected {expected}, found {found:?}")]
    UnexpectedShape { expected: String, found: PlutusData },
}

#[allow(missing_docs)]
pub type PlutusDataResult<T> = Result<T, PlutusDataError>;

impl<T> Constr<T> {
    /// Constructor with the `index`-th alternative, picking the compact CBOR tag when possible
    pub fn new(index: u64, fields: Vec<T>) -> Self {
        match index {
            0..=6 => Constr {
                tag: 121 + index,
                any_constructor: None,
                fields,
            },
            7..=MAX_COMPACT_CONSTR_INDEX => Constr {
                tag: 1280 + index - 7,
                any_constructor: None,
                fields,
            },
            _ => Constr {
                tag: 102,
                any_constructor: Some(index),
                fields,
            },
        }
    }

    /// Index of the alternative, if the tag is a valid constructor tag
    pub fn index(&self) -> Option<u64> {
        match self.tag {
            121..=127 => Some(self.tag - 121),
            1280..=1400 => Some(self.tag - 1280 + 7),
            102 => self.any_constructor,
            _ => None,
        }
    }
}

impl PlutusData {
    /// Shorthand for a constructor value
    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr(Constr::new(index, fields))
    }

    /// Shorthand for a byte string
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PlutusData::BoundedBytes(bytes.into())
    }

    /// Hex of [`PlutusData::to_cbor`]
    pub fn to_cbor_hex(&self) -> PlutusDataResult<String> {
        self.to_cbor().map(hex::encode)
    }

    /// Decode from a CBOR hex string
    pub fn from_cbor_hex(cbor_hex: &str) -> PlutusDataResult<Self> {
        let bytes = hex::decode(cbor_hex).map_err(|e| PlutusDataError::Decode(e.to_string()))?;
        Self::from_cbor(&bytes)
    }

    /// Fields of a constructor with the given index
    pub fn expect_constr(self, index: u64) -> PlutusDataResult<Vec<PlutusData>> {
        match self {
            PlutusData::Constr(constr) if constr.index() == Some(index) => Ok(constr.fields),
            other => Err(PlutusDataError::UnexpectedShape {
                expected: format!("constructor {index}"),
                found: other,
            }),
        }
    }

    /// Bytes of a byte string
    pub fn expect_bytes(self) -> PlutusDataResult<Vec<u8>> {
        match self {
            PlutusData::BoundedBytes(bytes) => Ok(bytes),
            other => Err(PlutusDataError::UnexpectedShape {
                expected: "bytes".to_string(),
                found: other,
            }),
        }
    }
}

impl From<i64> for BigInt {
    fn from(num: i64) -> Self {
        BigInt::Int {
            neg: num.is_negative(),
            val: num.unsigned_abs(),
        }
    }
}

impl TryFrom<BigInt> for i64 {
    type Error = PlutusDataError;

    fn try_from(big_int: BigInt) -> Result<Self, Self::Error> {
        let out_of_range = |b: BigInt| PlutusDataError::UnexpectedShape {
            expected: "64-bit integer".to_string(),
            found: PlutusData::BigInt(b),
        };
        match big_int {
            BigInt::Int { neg: false, val } => {
                i64::try_from(val).map_err(|_| out_of_range(BigInt::Int { neg: false, val }))
            }
            BigInt::Int { neg: true, val } => i64::try_from(-(val as i128))
                .map_err(|_| out_of_range(BigInt::Int { neg: true, val })),
            other => Err(out_of_range(other)),
        }
    }
}

impl From<i64> for PlutusData {
    fn from(num: i64) -> Self {
        PlutusData::BigInt(num.into())
    }
}

impl TryFrom<PlutusData> for i64 {
    type Error = PlutusDataError;

    fn try_from(value: PlutusData) -> Result<Self, Self::Error> {
        match value {
            PlutusData::BigInt(big_int) => big_int.try_into(),
            other => Err(PlutusDataError::UnexpectedShape {
                expected: "integer".to_string(),
                found: other,
            }),
        }
    }
}

impl From<Vec<u8>> for PlutusData {
    fn from(bytes: Vec<u8>) -> Self {
        PlutusData::BoundedBytes(bytes)
    }
}

/// Unit is `Constr 0 []`, the same shape Aiken uses for `Void`
impl From<()> for PlutusData {
    fn from(_: ()) -> Self {
        PlutusData::constr(0, Vec::new())
    }
}

impl TryFrom<PlutusData> for () {
    type Error = PlutusDataError;

    fn try_from(value: PlutusData) -> Result<Self, Self::Error> {
        let fields = value.expect_constr(0)?;
        if fields.is_empty() {
            Ok(())
        } else {
            Err(PlutusDataError::UnexpectedShape {
                expected: "constructor 0 without fields".to_string(),
                found: PlutusData::Array(fields),
            })
        }
    }
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cbor_hex = self.to_cbor_hex().map_err(ser::Error::custom)?;
        serializer.serialize_str(&cbor_hex)
    }
}

impl<'de> Deserialize<'de> for PlutusData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cbor_hex = String::deserialize(deserializer)?;
        PlutusData::from_cbor_hex(&cbor_hex).map_err(de::Error::custom)
    }
}
