use crate::{
    output::{Output, OutputId, UnbuiltOutput},
    scripts::plutus_data::PlutusData,
    transaction::BuiltTransaction,
    values::Values,
    PolicyId,
};
use pallas_addresses::Address;
use pallas_codec::utils::{CborWrap, KeyValuePairs};
use pallas_crypto::hash::{Hash, Hasher};
use pallas_primitives::{
    alonzo::{Multiasset, PlutusData as PallasPlutusData},
    babbage::{
        DatumOption, PostAlonzoTransactionOutput, TransactionBody, TransactionInput,
        TransactionOutput, Value,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Bytes taken by one vkey witness (key, signature and framing)
const VKEY_WITNESS_SIZE: u64 = 101;
const MAX_FEE_ROUNDS: usize = 10;

/// Fee and collateral settings of the mocked ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Lovelace per byte
    pub min_fee_a: u64,
    /// Constant lovelace per transaction
    pub min_fee_b: u64,
    /// Flat lovelace charged per redeemer, standing in for execution units
    pub redeemer_fee: u64,
    /// Smallest pure-ADA output accepted as collateral
    pub collateral_lovelace: u64,
    /// Smallest Lovelace amount a change output may hold
    pub min_utxo_lovelace: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        ProtocolParams {
            min_fee_a: 44,
            min_fee_b: 155_381,
            redeemer_fee: 250_000,
            collateral_lovelace: 5_000_000,
            min_utxo_lovelace: 1_000_000,
        }
    }
}

impl ProtocolParams {
    /// `min_fee_a * size + min_fee_b + redeemer_fee * redeemers`
    pub fn fee_for(&self, tx_size: u64, redeemer_count: u64) -> u64 {
        self.min_fee_a * tx_size + self.min_fee_b + self.redeemer_fee * redeemer_count
    }
}

#[derive(Debug, Error)]
pub(crate) enum BalanceError {
    #[error("Not enough input value available for outputs and fee: {0}")]
    NotEnoughInputs(String),
    #[error("Fee did not settle after {0} rounds")]
    FeeDidNotSettle(usize),
    #[error("Failed to encode transaction body: {0}")]
    Encode(String),
}

/// Everything needed to turn requested inputs and outputs into a balanced transaction
pub(crate) struct BalanceRequest<Datum> {
    pub mandatory_inputs: Vec<Output<Datum>>,
    pub wallet_utxos: Vec<Output<Datum>>,
    pub outputs: Vec<UnbuiltOutput<Datum>>,
    pub change_address: Address,
    pub collateral: Option<Output<Datum>>,
    pub redeemers: Vec<(OutputId, PlutusData)>,
    pub scripts: Vec<String>,
    pub required_signers: Vec<Vec<u8>>,
    pub witness_count: u64,
}

pub(crate) struct Selection<Datum> {
    pub inputs: Vec<Output<Datum>>,
    pub change: Option<Values>,
}

/// Adds wallet UTxOs, largest Lovelace amount first, on top of `mandatory` until `required` is
/// covered
pub(crate) fn select_inputs<Datum: Clone>(
    mandatory: &[Output<Datum>],
    wallet: &[Output<Datum>],
    required: &Values,
) -> Result<Selection<Datum>, BalanceError> {
    let mut candidates: Vec<&Output<Datum>> = wallet
        .iter()
        .filter(|utxo| !mandatory.iter().any(|m| m.id() == utxo.id()))
        .collect();
    candidates.sort_by(|a, b| b.values().lovelace().cmp(&a.values().lovelace()));
    let mut candidates = candidates.into_iter();

    let mut inputs = mandatory.to_vec();
    let mut total = Values::from_outputs(&inputs);
    loop {
        match total.try_subtract(required) {
            Ok(change) => {
                let change = (!change.is_empty()).then_some(change);
                return Ok(Selection { inputs, change });
            }
            Err(e) => match candidates.next() {
                Some(next) => {
                    total.add_values(next.values());
                    inputs.push(next.clone());
                }
                None => return Err(BalanceError::NotEnoughInputs(e.to_string())),
            },
        }
    }
}

/// Like [`select_inputs`], but a change output below `min_change` Lovelace pulls in more inputs
/// until the change reaches it
pub(crate) fn select_inputs_with_change_floor<Datum: Clone>(
    mandatory: &[Output<Datum>],
    wallet: &[Output<Datum>],
    required: &Values,
    min_change: u64,
) -> Result<Selection<Datum>, BalanceError> {
    let selection = select_inputs(mandatory, wallet, required)?;
    match &selection.change {
        Some(change) if change.lovelace() < min_change => {
            let mut with_floor = required.clone();
            with_floor.add_one_value(&PolicyId::Lovelace, min_change);
            let Selection { inputs, change } = select_inputs(mandatory, wallet, &with_floor)
                .map_err(|e| {
                    BalanceError::NotEnoughInputs(format!(
                        "change would be below {min_change} Lovelace: {e}"
                    ))
                })?;
            let mut change = change.unwrap_or_default();
            change.add_one_value(&PolicyId::Lovelace, min_change);
            Ok(Selection {
                inputs,
                change: Some(change),
            })
        }
        _ => Ok(selection),
    }
}

/// Select inputs for outputs plus fee, recomputing the fee until it no longer grows
pub(crate) fn balance<Datum>(
    request: BalanceRequest<Datum>,
    params: &ProtocolParams,
) -> Result<BuiltTransaction<Datum>, BalanceError>
where
    Datum: Clone + Into<PlutusData>,
{
    let BalanceRequest {
        mandatory_inputs,
        wallet_utxos,
        outputs,
        change_address,
        collateral,
        redeemers,
        scripts,
        required_signers,
        witness_count,
    } = request;

    let requested = outputs.iter().fold(Values::default(), |mut acc, output| {
        acc.add_values(output.values());
        acc
    });
    let witness_size = witness_count * VKEY_WITNESS_SIZE
        + scripts.iter().map(|s| s.len() as u64 / 2).sum::<u64>()
        + redeemers
            .iter()
            .map(|(_, r)| r.to_cbor().map(|c| c.len() as u64).unwrap_or_default())
            .sum::<u64>();
    let requested_outputs = outputs
        .iter()
        .map(to_body_output)
        .collect::<Result<Vec<_>, _>>()?;

    let mut fee = 0;
    for _ in 0..MAX_FEE_ROUNDS {
        let mut required = requested.clone();
        required.add_one_value(&PolicyId::Lovelace, fee);
        let Selection { inputs, change } = select_inputs_with_change_floor(
            &mandatory_inputs,
            &wallet_utxos,
            &required,
            params.min_utxo_lovelace,
        )?;

        let mut body_outputs = requested_outputs.clone();
        if let Some(change) = &change {
            body_outputs.push(to_transaction_output(&change_address, change, None)?);
        }
        let input_ids: Vec<&OutputId> = inputs.iter().map(|i| i.id()).collect();
        let body = encode_body(
            &input_ids,
            body_outputs,
            fee,
            collateral.as_ref().map(|c| c.id()),
            &required_signers,
        )?;

        let needed = params.fee_for(body.len() as u64 + witness_size, redeemers.len() as u64);
        if needed <= fee {
            let tx_hash = Hasher::<256>::hash(&body).to_vec();
            let change_index = outputs.len() as u64;
            let mut built_outputs: Vec<Output<Datum>> = outputs
                .into_iter()
                .zip(0u64..)
                .map(|(output, index)| output.into_output(tx_hash.clone(), index))
                .collect();
            if let Some(change) = change {
                built_outputs.push(Output::new_wallet(
                    tx_hash.clone(),
                    change_index,
                    change_address,
                    change,
                ));
            }
            return Ok(BuiltTransaction {
                tx_hash,
                inputs,
                collateral,
                outputs: built_outputs,
                redeemers,
                scripts,
                required_signers,
                fee,
            });
        }
        fee = needed;
    }
    Err(BalanceError::FeeDidNotSettle(MAX_FEE_ROUNDS))
}

fn encode_error(e: impl std::fmt::Display) -> BalanceError {
    BalanceError::Encode(e.to_string())
}

fn to_hash<const BYTES: usize>(bytes: &[u8]) -> Result<Hash<BYTES>, BalanceError> {
    let array: [u8; BYTES] = bytes.try_into().map_err(|_| {
        encode_error(format!(
            "expected a {BYTES} byte hash, found {}",
            hex::encode(bytes)
        ))
    })?;
    Ok(Hash::new(array))
}

fn to_input(id: &OutputId) -> Result<TransactionInput, BalanceError> {
    Ok(TransactionInput {
        transaction_id: to_hash::<32>(id.tx_hash())?,
        index: id.index(),
    })
}

fn to_body_output<Datum: Clone + Into<PlutusData>>(
    output: &UnbuiltOutput<Datum>,
) -> Result<TransactionOutput, BalanceError> {
    let datum = output.datum().cloned().map(Into::into);
    to_transaction_output(output.owner(), output.values(), datum)
}

/// Post-Alonzo output, with the datum inlined
fn to_transaction_output(
    address: &Address,
    values: &Values,
    datum: Option<PlutusData>,
) -> Result<TransactionOutput, BalanceError> {
    let datum_option = match datum {
        Some(datum) => {
            let pallas_datum = PallasPlutusData::try_from(&datum).map_err(encode_error)?;
            Some(DatumOption::Data(CborWrap(pallas_datum)))
        }
        None => None,
    };
    Ok(TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
        address: address.to_vec().into(),
        value: to_value(values)?,
        datum_option,
        script_ref: None,
    }))
}

fn to_value(values: &Values) -> Result<Value, BalanceError> {
    let mut assets: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, u64>> = BTreeMap::new();
    for (policy, amount) in values.as_iter() {
        if let PolicyId::NativeToken(id, asset_name) = policy {
            if *amount == 0 {
                continue;
            }
            let policy_bytes = hex::decode(id).map_err(encode_error)?;
            let name = asset_name
                .as_deref()
                .map(|n| n.as_bytes().to_vec())
                .unwrap_or_default();
            *assets.entry(policy_bytes).or_default().entry(name).or_insert(0) += amount;
        }
    }
    if assets.is_empty() {
        return Ok(Value::Coin(values.lovelace()));
    }
    let mut multiasset = Vec::with_capacity(assets.len());
    for (policy, tokens) in assets {
        let tokens = tokens
            .into_iter()
            .map(|(name, amount)| (name.into(), amount))
            .collect();
        multiasset.push((to_hash::<28>(&policy)?, KeyValuePairs::Def(tokens)));
    }
    let multiasset: Multiasset<u64> = KeyValuePairs::Def(multiasset);
    Ok(Value::Multiasset(values.lovelace(), multiasset))
}

/// Babbage body with inputs, outputs, fee, collateral and required signers. Inputs are sorted
/// the way the ledger stores them.
pub(crate) fn encode_body(
    inputs: &[&OutputId],
    outputs: Vec<TransactionOutput>,
    fee: u64,
    collateral: Option<&OutputId>,
    required_signers: &[Vec<u8>],
) -> Result<Vec<u8>, BalanceError> {
    let mut inputs = inputs.to_vec();
    inputs.sort_by(|a, b| (a.tx_hash(), a.index()).cmp(&(b.tx_hash(), b.index())));
    let inputs = inputs
        .into_iter()
        .map(to_input)
        .collect::<Result<Vec<_>, _>>()?;
    let collateral = match collateral {
        Some(id) => Some(vec![to_input(id)?]),
        None => None,
    };
    let required_signers = if required_signers.is_empty() {
        None
    } else {
        let hashes = required_signers
            .iter()
            .map(|key_hash| to_hash::<28>(key_hash))
            .collect::<Result<Vec<_>, _>>()?;
        Some(hashes)
    };

    let body = TransactionBody {
        inputs,
        outputs,
        fee,
        ttl: None,
        certificates: None,
        withdrawals: None,
        update: None,
        auxiliary_data_hash: None,
        validity_interval_start: None,
        mint: None,
        script_data_hash: None,
        collateral,
        required_signers,
        network_id: None,
        collateral_return: None,
        total_collateral: None,
        reference_inputs: None,
    };
    minicbor::to_vec(&body).map_err(encode_error)
}
