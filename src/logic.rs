use crate::{ledger_client::LedgerClient, transaction::TxActions};
use async_trait::async_trait;
use std::fmt::Debug;

pub use error::*;

/// Smart contract logic errors
pub mod error;

/// Offchain behaviour of one contract: endpoints turn requests into [`TxActions`], lookups
/// answer questions about the ledger. Implementors may carry state such as a loaded validator.
#[async_trait]
pub trait SCLogic: Send + Sync {
    /// Requests that produce a transaction
    type Endpoints: Send + Sync;
    /// Read-only queries
    type Lookups: Send + Sync;
    /// Answers to [`SCLogic::Lookups`]
    type LookupResponses: Send + Sync;
    /// Datum of the contract's outputs
    type Datums: Clone + Eq + Debug + Send + Sync;
    /// Redeemer used to spend the contract's outputs
    type Redeemers: Clone + Eq + Debug + Send + Sync;

    /// Turn an endpoint request into transaction actions
    async fn handle_endpoint<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        &self,
        endpoint: Self::Endpoints,
        ledger_client: &LC,
    ) -> SCLogicResult<TxActions<Self::Datums, Self::Redeemers>>;

    /// Answer a query against the ledger
    async fn lookup<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        &self,
        query: Self::Lookups,
        ledger_client: &LC,
    ) -> SCLogicResult<Self::LookupResponses>;
}
