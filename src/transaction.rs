use crate::{
    address::{pub_key_hash_from_address_if_available, script_hash_from_address_if_available},
    output::{Output, OutputId, UnbuiltOutput},
    scripts::{plutus_data::PlutusData, ScriptError, ValidatorCode},
    values::Values,
};
use pallas_addresses::Address;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, sync::Arc};
use thiserror::Error;


/// Plutus language version of the scripts in a transaction
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TransactionVersion {
    V1,
    V2,
}

impl TransactionVersion {
    /// Prefix byte hashed in front of a script of this version
    pub fn script_tag(&self) -> u8 {
        match self {
            TransactionVersion::V1 => 1,
            TransactionVersion::V2 => 2,
        }
    }
}

/// Transaction builder. Collects everything the user wants to happen; the
/// [`LedgerClient`](crate::ledger_client::LedgerClient) takes care of balancing and fees.
pub struct TxActions<Datum, Redeemer> {
    script_inputs: Vec<(Output<Datum>, Redeemer)>,
    specific_wallet_inputs: Vec<Output<Datum>>,
    validators: Vec<Arc<dyn ValidatorCode<Datum, Redeemer>>>,
    outputs: Vec<UnbuiltOutput<Datum>>,
    required_signers: Vec<Address>,
}

impl<Datum, Redeemer> Default for TxActions<Datum, Redeemer> {
    fn default() -> Self {
        TxActions {
            script_inputs: Vec::new(),
            specific_wallet_inputs: Vec::new(),
            validators: Vec::new(),
            outputs: Vec::new(),
            required_signers: Vec::new(),
        }
    }
}

impl<Datum, Redeemer> TxActions<Datum, Redeemer> {
    /// Lock `values` at a script `address` with an inline `datum`
    pub fn pay_to_contract(mut self, address: &Address, datum: Datum, values: Values) -> Self {
        let output = UnbuiltOutput::new_validator(address.clone(), values, datum);
        self.outputs.push(output);
        self
    }

    /// Send `values` to a wallet address
    pub fn pay_to_address(mut self, address: &Address, values: Values) -> Self {
        let output = UnbuiltOutput::new_wallet(address.clone(), values);
        self.outputs.push(output);
        self
    }

    /// Require the key behind `address` to sign the transaction
    pub fn add_signer(mut self, address: &Address) -> Self {
        if !self.required_signers.contains(address) {
            self.required_signers.push(address.clone());
        }
        self
    }

    /// Make a validator available for the script inputs it guards
    pub fn attach_spending_validator<V>(mut self, validator: V) -> Self
    where
        V: ValidatorCode<Datum, Redeemer> + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Outputs the transaction will create, in order
    pub fn outputs(&self) -> &[UnbuiltOutput<Datum>] {
        &self.outputs
    }

    /// Addresses that must sign
    pub fn required_signers(&self) -> &[Address] {
        &self.required_signers
    }

    /// Pair every script input with the attached validator guarding it
    pub fn to_unbuilt_tx(self) -> Result<UnbuiltTransaction<Datum, Redeemer>, TxBuildError> {
        let TxActions {
            script_inputs,
            specific_wallet_inputs,
            validators,
            outputs,
            required_signers,
        } = self;

        let mut seen = HashSet::new();
        let all_ids = script_inputs
            .iter()
            .map(|(input, _)| input.id())
            .chain(specific_wallet_inputs.iter().map(|input| input.id()));
        for id in all_ids {
            if !seen.insert(id.clone()) {
                return Err(TxBuildError::DuplicateInput(id.clone()));
            }
        }

        for signer in &required_signers {
            if pub_key_hash_from_address_if_available(signer).is_none() {
                return Err(TxBuildError::InvalidSigner(signer.to_hex()));
            }
        }

        let mut validator_hashes = Vec::with_capacity(validators.len());
        for validator in validators {
            let hash = validator.script_hash()?;
            validator_hashes.push((hash, validator));
        }

        let mut paired_inputs = Vec::with_capacity(script_inputs.len());
        for (input, redeemer) in script_inputs {
            let script_hash = script_hash_from_address_if_available(input.owner())
                .unwrap_or_default();
            let validator = validator_hashes
                .iter()
                .find(|(hash, _)| hash == &script_hash)
                .map(|(_, validator)| validator.clone())
                .ok_or_else(|| TxBuildError::MissingValidator {
                    input: input.id().clone(),
                    script_hash: hex::encode(&script_hash),
                })?;
            paired_inputs.push((input, redeemer, validator));
        }

        Ok(UnbuiltTransaction {
            script_inputs: paired_inputs,
            specific_wallet_inputs,
            unbuilt_outputs: outputs,
            required_signers,
        })
    }
}

impl<Datum, Redeemer: Clone> TxActions<Datum, Redeemer> {
    /// Spend `utxos`. Outputs at script addresses are redeemed with `redeemer`; wallet outputs are
    /// spent as plain inputs.
    pub fn collect_from(mut self, utxos: Vec<Output<Datum>>, redeemer: Redeemer) -> Self {
        for utxo in utxos {
            if script_hash_from_address_if_available(utxo.owner()).is_some() {
                self.script_inputs.push((utxo, redeemer.clone()));
            } else {
                self.specific_wallet_inputs.push(utxo);
            }
        }
        self
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TxBuildError {
    #[error("Output {0} is collected more than once")]
    DuplicateInput(OutputId),
    #[error("No validator attached for script input {input} (script hash {script_hash:?})")]
    MissingValidator { input: OutputId, script_hash: String },
    #[error("Signer {0} has no payment key")]
    InvalidSigner(String),
    #[error("Attached validator is broken: {0}")]
    Script(#[from] ScriptError),
}

/// Script input together with its redeemer and validator
pub type ScriptInput<Datum, Redeemer> = (
    Output<Datum>,
    Redeemer,
    Arc<dyn ValidatorCode<Datum, Redeemer>>,
);

/// Everything the user asked for, checked but not yet balanced
pub struct UnbuiltTransaction<Datum, Redeemer> {
    #[allow(missing_docs)]
    pub script_inputs: Vec<ScriptInput<Datum, Redeemer>>,
    #[allow(missing_docs)]
    pub specific_wallet_inputs: Vec<Output<Datum>>,
    #[allow(missing_docs)]
    pub unbuilt_outputs: Vec<UnbuiltOutput<Datum>>,
    #[allow(missing_docs)]
    pub required_signers: Vec<Address>,
}

impl<Datum, Redeemer> Default for UnbuiltTransaction<Datum, Redeemer> {
    fn default() -> Self {
        UnbuiltTransaction {
            script_inputs: Vec::new(),
            specific_wallet_inputs: Vec::new(),
            unbuilt_outputs: Vec::new(),
            required_signers: Vec::new(),
        }
    }
}

impl<Datum, Redeemer> UnbuiltTransaction<Datum, Redeemer> {
    #[allow(missing_docs)]
    pub fn script_inputs(&self) -> &[ScriptInput<Datum, Redeemer>] {
        &self.script_inputs
    }

    #[allow(missing_docs)]
    pub fn unbuilt_outputs(&self) -> &[UnbuiltOutput<Datum>] {
        &self.unbuilt_outputs
    }
}

/// Balanced transaction with its fee, not yet signed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltTransaction<Datum> {
    /// Blake2b-256 of the body
    pub tx_hash: Vec<u8>,
    /// Every consumed output, wallet and script alike
    pub inputs: Vec<Output<Datum>>,
    /// Wallet output put up in case a script fails
    pub collateral: Option<Output<Datum>>,
    /// Outputs in order, with ids under `tx_hash`. Change, if any, comes last.
    pub outputs: Vec<Output<Datum>>,
    /// Redeemer for each spent script output
    pub redeemers: Vec<(OutputId, PlutusData)>,
    /// Hex of every attached script
    pub scripts: Vec<String>,
    /// Payment key hashes that must sign
    pub required_signers: Vec<Vec<u8>>,
    /// Lovelace paid in fees
    pub fee: u64,
}

impl<Datum> BuiltTransaction<Datum> {
    /// Fee in lovelace
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Id the transaction will have on-chain
    pub fn tx_id(&self) -> TxId {
        TxId::new(&hex::encode(&self.tx_hash))
    }
}

/// Signature from one key over the transaction hash
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyWitness {
    /// Payment key hash of the signer
    pub key_hash: Vec<u8>,
    #[allow(missing_docs)]
    pub signature: Vec<u8>,
}

/// Built transaction plus witnesses, ready to submit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction<Datum> {
    #[allow(missing_docs)]
    pub built: BuiltTransaction<Datum>,
    #[allow(missing_docs)]
    pub witnesses: Vec<KeyWitness>,
}

impl<Datum> SignedTransaction<Datum> {
    /// Whether a witness for `key_hash` is present
    pub fn is_signed_by(&self, key_hash: &[u8]) -> bool {
        self.witnesses.iter().any(|w| w.key_hash == key_hash)
    }

    #[allow(missing_docs)]
    pub fn tx_id(&self) -> TxId {
        self.built.tx_id()
    }
}

/// Hex encoded transaction hash
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    #[allow(missing_docs)]
    pub fn new(id: &str) -> Self {
        TxId(id.to_string())
    }

    #[allow(missing_docs)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
