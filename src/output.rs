use crate::{scripts::plutus_data::PlutusData, values::Values};
use pallas_addresses::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Representation of an UTxO that does not exist yet. This can be used inside the
/// [`SCLogic`](crate::logic::SCLogic) to represent outputs that will be created when the
/// transaction is submitted.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum UnbuiltOutput<Datum> {
    /// An output owned by a wallet
    Wallet {
        /// Address of the wallet
        owner: Address,
        /// Values of the output
        values: Values,
    },
    /// An output owned by a validator script. Always carries an inline datum.
    Validator {
        /// Address of the validator script
        script_address: Address,
        /// Values of the output
        values: Values,
        /// Datum of the output
        datum: Datum,
    },
}

impl<Datum> UnbuiltOutput<Datum> {
    /// Constructor for wallet output
    pub fn new_wallet(owner: Address, values: Values) -> Self {
        UnbuiltOutput::Wallet { owner, values }
    }

    /// Constructor for validator output
    pub fn new_validator(script_address: Address, values: Values, datum: Datum) -> Self {
        UnbuiltOutput::Validator {
            script_address,
            values,
            datum,
        }
    }

    /// Getter for owner of output
    pub fn owner(&self) -> &Address {
        match self {
            UnbuiltOutput::Wallet { owner, .. } => owner,
            UnbuiltOutput::Validator { script_address, .. } => script_address,
        }
    }

    /// Getter for values of output
    pub fn values(&self) -> &Values {
        match self {
            UnbuiltOutput::Wallet { values, .. } => values,
            UnbuiltOutput::Validator { values, .. } => values,
        }
    }

    /// Getter for (optional) datum of output
    pub fn datum(&self) -> Option<&Datum> {
        match self {
            UnbuiltOutput::Wallet { .. } => None,
            UnbuiltOutput::Validator { datum, .. } => Some(datum),
        }
    }

    /// Give the output its on-chain identity
    pub fn into_output(self, tx_hash: Vec<u8>, index: u64) -> Output<Datum> {
        match self {
            UnbuiltOutput::Wallet { owner, values } => {
                Output::new_wallet(tx_hash, index, owner, values)
            }
            UnbuiltOutput::Validator {
                script_address,
                values,
                datum,
            } => Output::new_validator(tx_hash, index, script_address, values, datum),
        }
    }
}

/// Representation of an on-chain datum
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum DatumKind<Datum> {
    /// A typed datum
    Typed(Datum),
    /// An untyped datum
    UnTyped(PlutusData),
    /// No datum
    None,
}

impl<Datum> DatumKind<Datum> {
    /// Whether a datum of any kind is present
    pub fn is_some(&self) -> bool {
        !matches!(self, DatumKind::None)
    }
}

impl<Datum> From<DatumKind<Datum>> for Option<Datum> {
    fn from(value: DatumKind<Datum>) -> Self {
        match value {
            DatumKind::Typed(datum) => Some(datum),
            _ => None,
        }
    }
}

/// Domain specific representation of an on-chain UTxO
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Output<Datum> {
    id: OutputId,
    owner: Address,
    values: Values,
    datum: DatumKind<Datum>,
}

/// Unique identifier for specific UTxO
#[derive(Clone, PartialEq, Debug, Eq, Hash, Deserialize, Serialize)]
pub struct OutputId {
    tx_hash: Vec<u8>,
    index: u64,
}

impl OutputId {
    /// Constructor for OutputId
    pub fn new(tx_hash: Vec<u8>, index: u64) -> Self {
        OutputId { tx_hash, index }
    }

    /// Getter for id's tx_hash
    pub fn tx_hash(&self) -> &[u8] {
        &self.tx_hash
    }

    /// Getter for id's index
    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", hex::encode(&self.tx_hash), self.index)
    }
}

impl<Datum> Output<Datum> {
    /// Constructor for wallet output
    pub fn new_wallet(tx_hash: Vec<u8>, index: u64, owner: Address, values: Values) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::None,
        }
    }

    /// Constructor for validator output
    pub fn new_validator(
        tx_hash: Vec<u8>,
        index: u64,
        owner: Address,
        values: Values,
        datum: Datum,
    ) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::Typed(datum),
        }
    }

    /// Constructor for validator output with untyped datum
    pub fn new_untyped_validator(
        tx_hash: Vec<u8>,
        index: u64,
        owner: Address,
        values: Values,
        datum: PlutusData,
    ) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::UnTyped(datum),
        }
    }

    /// Getter for Output's id
    pub fn id(&self) -> &OutputId {
        &self.id
    }

    /// Getter for Output's owner address
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Getter for Output's values
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Getter for Output's datum
    pub fn datum(&self) -> &DatumKind<Datum> {
        &self.datum
    }
}

impl<Datum: Clone> Output<Datum> {
    /// Getter for Output's datum, if it is typed.
    /// Returns `None` if datum is untyped or non-existent
    pub fn typed_datum(&self) -> Option<Datum> {
        match &self.datum {
            DatumKind::Typed(datum) => Some(datum.to_owned()),
            _ => None,
        }
    }
}

impl<Datum: Clone + Into<PlutusData>> Output<Datum> {
    /// Getter for `Output`'s datum as `PlutusData`. Returns `None` if datum is non-existent
    pub fn datum_plutus_data(&self) -> Option<PlutusData> {
        match &self.datum {
            DatumKind::Typed(datum) => Some(datum.to_owned().into()),
            DatumKind::UnTyped(data) => Some(data.to_owned()),
            DatumKind::None => None,
        }
    }
}

impl<Datum: Clone + TryFrom<PlutusData>> Output<Datum> {
    /// Converts `Output` to have a typed datum, if it is untyped and can be converted. Returns the
    /// same `Output` if datum is typed, it can't convert, or non-existent
    pub fn with_typed_datum_if_possible(self) -> Output<Datum> {
        let datum = match self.datum {
            DatumKind::UnTyped(data) => match Datum::try_from(data.clone()) {
                Ok(datum) => DatumKind::Typed(datum),
                Err(_) => DatumKind::UnTyped(data),
            },
            other => other,
        };
        Output { datum, ..self }
    }
}
