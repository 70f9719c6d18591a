//! Drive an [`SCLogic`] through a [`Backend`]

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    backend::Backend,
    error::Result,
    ledger_client::LedgerClient,
    logic::SCLogic,
    transaction::{BuiltTransaction, TxId},
};

/// Interface for hitting a contract's endpoints and lookups
#[async_trait]
pub trait SmartContractTrait {
    #[allow(missing_docs)]
    type Endpoint;
    #[allow(missing_docs)]
    type Lookup;
    #[allow(missing_docs)]
    type LookupResponse;
    #[allow(missing_docs)]
    type Datum;

    /// Build, sign and submit the transaction for `endpoint`
    async fn hit_endpoint(&self, endpoint: Self::Endpoint) -> Result<TxId>;
    /// Only build the transaction for `endpoint`, e.g. to inspect its fee
    async fn build_endpoint(&self, endpoint: Self::Endpoint)
        -> Result<BuiltTransaction<Self::Datum>>;
    #[allow(missing_docs)]
    async fn lookup(&self, lookup: Self::Lookup) -> Result<Self::LookupResponse>;
}

/// A contract's logic paired with the backend it runs against
#[derive(Debug)]
pub struct SmartContract<'a, Logic, LC>
where
    Logic: SCLogic,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers>,
{
    #[allow(missing_docs)]
    pub smart_contract: &'a Logic,
    #[allow(missing_docs)]
    pub backend: &'a Backend<Logic::Datums, Logic::Redeemers, LC>,
}

impl<'a, Logic, LC> SmartContract<'a, Logic, LC>
where
    Logic: SCLogic,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers>,
{
    #[allow(missing_docs)]
    pub fn new(
        smart_contract: &'a Logic,
        backend: &'a Backend<Logic::Datums, Logic::Redeemers, LC>,
    ) -> Self {
        SmartContract {
            smart_contract,
            backend,
        }
    }
}

#[async_trait]
impl<'a, Logic, LC> SmartContractTrait for SmartContract<'a, Logic, LC>
where
    Logic: SCLogic + Debug,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers>,
{
    type Endpoint = Logic::Endpoints;
    type Lookup = Logic::Lookups;
    type LookupResponse = Logic::LookupResponses;
    type Datum = Logic::Datums;

    async fn hit_endpoint(&self, endpoint: Logic::Endpoints) -> Result<TxId> {
        let tx_actions = self
            .smart_contract
            .handle_endpoint(endpoint, self.backend.ledger_client())
            .await?;
        let tx_id = self.backend.process(tx_actions).await?;
        Ok(tx_id)
    }

    async fn build_endpoint(
        &self,
        endpoint: Logic::Endpoints,
    ) -> Result<BuiltTransaction<Logic::Datums>> {
        let tx_actions = self
            .smart_contract
            .handle_endpoint(endpoint, self.backend.ledger_client())
            .await?;
        self.backend.build(tx_actions).await
    }

    async fn lookup(&self, lookup: Self::Lookup) -> Result<Self::LookupResponse> {
        Ok(self
            .smart_contract
            .lookup(lookup, self.backend.ledger_client())
            .await?)
    }
}
