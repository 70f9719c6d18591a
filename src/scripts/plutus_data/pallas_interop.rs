//! Conversions between [`PlutusData`] and the `pallas-primitives` model, which owns the wire
//! format: tags 121-127, 1280-1400 and 102 for constructors, 64 byte chunks for long byte
//! strings and tag 2/3 bignums past the CBOR integer range.

use super::{BigInt, Constr, PlutusData, PlutusDataError, PlutusDataResult};
use pallas_codec::utils::{KeyValuePairs, MaybeIndefArray};
use pallas_primitives::alonzo::{
    BigInt as PallasBigInt, Constr as PallasConstr, PlutusData as PallasPlutusData,
};

/// Lists are written indefinite-length unless empty, the same as the Haskell `Data` encoder
trait PlutusList: Sized {
    fn from_items(items: Vec<PallasPlutusData>) -> Self;
}

impl PlutusList for Vec<PallasPlutusData> {
    fn from_items(items: Vec<PallasPlutusData>) -> Self {
        items
    }
}

impl PlutusList for MaybeIndefArray<PallasPlutusData> {
    fn from_items(items: Vec<PallasPlutusData>) -> Self {
        if items.is_empty() {
            MaybeIndefArray::Def(items)
        } else {
            MaybeIndefArray::Indef(items)
        }
    }
}

fn to_pallas_list(items: &[PlutusData]) -> PlutusDataResult<Vec<PallasPlutusData>> {
    items.iter().map(PallasPlutusData::try_from).collect()
}

impl TryFrom<&PlutusData> for PallasPlutusData {
    type Error = PlutusDataError;

    fn try_from(data: &PlutusData) -> PlutusDataResult<Self> {
        let pallas_data = match data {
            PlutusData::Constr(constr) => PallasPlutusData::Constr(PallasConstr {
                tag: constr.tag,
                any_constructor: constr.any_constructor,
                fields: PlutusList::from_items(to_pallas_list(&constr.fields)?),
            }),
            PlutusData::Map(map) => {
                let mut pairs: Vec<(PallasPlutusData, PallasPlutusData)> =
                    Vec::with_capacity(map.len());
                for (key, value) in map {
                    pairs.push((
                        PallasPlutusData::try_from(key)?,
                        PallasPlutusData::try_from(value)?,
                    ));
                }
                PallasPlutusData::Map(KeyValuePairs::Def(pairs))
            }
            PlutusData::BigInt(big_int) => {
                PallasPlutusData::BigInt(PallasBigInt::try_from(big_int)?)
            }
            PlutusData::BoundedBytes(bytes) => {
                PallasPlutusData::BoundedBytes(bytes.clone().into())
            }
            PlutusData::Array(items) => {
                PallasPlutusData::Array(PlutusList::from_items(to_pallas_list(items)?))
            }
        };
        Ok(pallas_data)
    }
}

impl TryFrom<&BigInt> for PallasBigInt {
    type Error = PlutusDataError;

    fn try_from(big_int: &BigInt) -> PlutusDataResult<Self> {
        match big_int {
            BigInt::Int { neg, val } => {
                let value = if *neg {
                    -i128::from(*val)
                } else {
                    i128::from(*val)
                };
                let int = match value.try_into() {
                    Ok(int) => int,
                    Err(_) => {
                        return Err(PlutusDataError::Encode(format!(
                            "{value} is outside the CBOR integer range"
                        )))
                    }
                };
                Ok(PallasBigInt::Int(int))
            }
            BigInt::BigUInt(bytes) => Ok(PallasBigInt::BigUInt(bytes.clone().into())),
            BigInt::BigNInt(bytes) => Ok(PallasBigInt::BigNInt(bytes.clone().into())),
        }
    }
}

impl From<PallasPlutusData> for PlutusData {
    fn from(data: PallasPlutusData) -> Self {
        match data {
            PallasPlutusData::Constr(constr) => PlutusData::Constr(Constr {
                tag: constr.tag,
                any_constructor: constr.any_constructor,
                fields: Vec::from(constr.fields)
                    .into_iter()
                    .map(PlutusData::from)
                    .collect(),
            }),
            PallasPlutusData::Map(pairs) => PlutusData::Map(
                Vec::from(pairs)
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            PallasPlutusData::BigInt(big_int) => PlutusData::BigInt(big_int.into()),
            PallasPlutusData::BoundedBytes(bytes) => PlutusData::BoundedBytes(Vec::from(bytes)),
            PallasPlutusData::Array(items) => PlutusData::Array(
                Vec::from(items)
                    .into_iter()
                    .map(PlutusData::from)
                    .collect(),
            ),
        }
    }
}

impl From<PallasBigInt> for BigInt {
    fn from(big_int: PallasBigInt) -> Self {
        match big_int {
            PallasBigInt::Int(int) => {
                let value = i128::from(int);
                match u64::try_from(value.unsigned_abs()) {
                    Ok(val) => BigInt::Int {
                        neg: value < 0,
                        val,
                    },
                    // only -2^64 has no u64 magnitude; as a bignum its payload is 2^64 - 1
                    Err(_) => BigInt::BigNInt(u64::MAX.to_be_bytes().to_vec()),
                }
            }
            PallasBigInt::BigUInt(bytes) => BigInt::BigUInt(Vec::from(bytes)),
            PallasBigInt::BigNInt(bytes) => BigInt::BigNInt(Vec::from(bytes)),
        }
    }
}

impl PlutusData {
    /// Canonical CBOR encoding
    pub fn to_cbor(&self) -> PlutusDataResult<Vec<u8>> {
        let pallas_data = PallasPlutusData::try_from(self)?;
        minicbor::to_vec(&pallas_data).map_err(|e| PlutusDataError::Encode(e.to_string()))
    }

    /// Decode from CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> PlutusDataResult<Self> {
        let pallas_data: PallasPlutusData =
            minicbor::decode(bytes).map_err(|e| PlutusDataError::Decode(e.to_string()))?;
        Ok(pallas_data.into())
    }
}
