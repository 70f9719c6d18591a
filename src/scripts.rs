use crate::{address::enterprise_script_address, transaction::TransactionVersion};
use pallas_addresses::{Address, Network};
use thiserror::Error;

pub mod plutus_data;
pub mod raw_script;
pub mod raw_validator_script;

/// Interface for a compiled Plutus validator guarding script outputs with a given `Datum` and
/// spent with a given `Redeemer`. The validator itself runs on-chain; offchain we only need its
/// identity and serialized form.
pub trait ValidatorCode<D, R>: Send + Sync {
    /// Plutus language version of the script
    fn version(&self) -> TransactionVersion;

    /// Hex of the CBOR-wrapped script as it is attached to transactions
    fn script_hex(&self) -> ScriptResult<String>;

    /// Blake2b-224 hash identifying the script on-chain
    fn script_hash(&self) -> ScriptResult<Vec<u8>>;

    /// Enterprise address locked by this script on the given network
    fn address(&self, network: Network) -> ScriptResult<Address> {
        let hash = self.script_hash()?;
        enterprise_script_address(&hash, network).ok_or_else(|| {
            ScriptError::IdRetrieval(format!("Bad script hash: {}", hex::encode(&hash)))
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to construct: {0:?}")]
    FailedToConstruct(String),
    #[error("Failed to retrieve script ID: {0:?}")]
    IdRetrieval(String),
    #[error("Validator {title:?} hashes to {actual} but the blueprint lists {expected}")]
    HashMismatch {
        title: String,
        expected: String,
        actual: String,
    },
}

#[allow(missing_docs)]
pub type ScriptResult<T> = Result<T, ScriptError>;
