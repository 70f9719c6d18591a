use thiserror::Error;

/// Test ledger client module
pub mod test_ledger_client;

use async_trait::async_trait;

use crate::{
    output::{Output, OutputId},
    transaction::{BuiltTransaction, SignedTransaction, TxId, UnbuiltTransaction},
    PolicyId,
};
use pallas_addresses::{Address, Network};
use std::error;

/// Interface defining interactions with your specific ledger--AKA the Cardano blockchain. The
/// abstraction allows the concept of fake and mock ledgers to be used in tests and simulations.
///
/// A transaction goes through three steps: [`build`](LedgerClient::build) balances it and
/// computes the fee, [`sign`](LedgerClient::sign) adds the witness of the owned key and
/// [`submit`](LedgerClient::submit) hands it to the ledger. [`issue`](LedgerClient::issue) does
/// all three.
#[async_trait]
pub trait LedgerClient<Datum, Redeemer>: Send + Sync {
    /// Get the base address for the signer key owned by instance of the `LedgerClient`
    async fn signer_base_address(&self) -> LedgerClientResult<Address>;

    /// Get list of UTxOs owned by a given address limited by `count`
    async fn outputs_at_address(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;

    /// Get complete list of UTxOs owned by a given address
    async fn all_outputs_at_address(
        &self,
        address: &Address,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;

    /// Get the balance for a specific policy at a given address
    async fn balance_at_address(
        &self,
        address: &Address,
        policy: &PolicyId,
    ) -> LedgerClientResult<u64> {
        let bal = self
            .all_outputs_at_address(address)
            .await?
            .iter()
            .fold(0, |acc, o| {
                if let Some(val) = o.values().get(policy) {
                    acc + val
                } else {
                    acc
                }
            });
        Ok(bal)
    }

    /// Select wallet inputs and collateral, add change and compute the fee
    async fn build(
        &self,
        tx: UnbuiltTransaction<Datum, Redeemer>,
    ) -> LedgerClientResult<BuiltTransaction<Datum>>;

    /// Sign a built transaction with the key owned by the instance of `LedgerClient`
    async fn sign(
        &self,
        tx: BuiltTransaction<Datum>,
    ) -> LedgerClientResult<SignedTransaction<Datum>>;

    /// Submit a signed transaction to the ledger
    async fn submit(&self, tx: SignedTransaction<Datum>) -> LedgerClientResult<TxId>;

    /// Build, sign and submit in one go
    async fn issue(&self, tx: UnbuiltTransaction<Datum, Redeemer>) -> LedgerClientResult<TxId>;

    /// Get the network identifier for the ledger
    async fn network(&self) -> LedgerClientResult<Network>;
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("Couldn't retrieve base address")]
    BaseAddress(Box<dyn error::Error + Send + Sync>),
    #[error("Failed to retrieve UTXO with ID {0:?}: {1:?}.")]
    FailedToRetrieveOutputWithId(OutputId, Box<dyn error::Error + Send + Sync>),
    #[error("Failed to build transaction: {0}")]
    FailedToBuildTx(Box<dyn error::Error + Send + Sync>),
    #[error("Failed to submit transaction: {0}")]
    FailedToSubmitTx(Box<dyn error::Error + Send + Sync>),
    #[error("There isn't a single utxo big enough for collateral")]
    NoBigEnoughCollateralUTxO,
    #[error("The script input you're trying to spend doesn't have a datum")]
    NoDatumOnScriptInput,
    #[error("Ledger storage: {0}")]
    Storage(Box<dyn error::Error + Send + Sync>),
}

#[allow(missing_docs)]
pub type LedgerClientResult<T> = Result<T, LedgerClientError>;
