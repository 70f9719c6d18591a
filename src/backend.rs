use crate::{
    error::Result,
    ledger_client::LedgerClient,
    transaction::{BuiltTransaction, TxActions, TxId},
};
use pallas_addresses::Address;
use std::marker::PhantomData;
use tracing::debug;


/// Glue between transaction builders and a [`LedgerClient`]
#[derive(Debug)]
pub struct Backend<Datum, Redeemer, LC>
where
    LC: LedgerClient<Datum, Redeemer>,
{
    #[allow(missing_docs)]
    pub _datum: PhantomData<Datum>,
    #[allow(missing_docs)]
    pub _redeemer: PhantomData<Redeemer>,
    #[allow(missing_docs)]
    pub ledger_client: LC,
}

impl<Datum, Redeemer, LC> Backend<Datum, Redeemer, LC>
where
    Datum: Send + Sync,
    Redeemer: Send + Sync,
    LC: LedgerClient<Datum, Redeemer>,
{
    #[allow(missing_docs)]
    pub fn new(ledger_client: LC) -> Self {
        Backend {
            _datum: PhantomData,
            _redeemer: PhantomData,
            ledger_client,
        }
    }

    #[allow(missing_docs)]
    pub fn ledger_client(&self) -> &LC {
        &self.ledger_client
    }

    /// Address of the key the ledger client signs with
    pub async fn signer(&self) -> Result<Address> {
        let addr = self.ledger_client.signer_base_address().await?;
        Ok(addr)
    }

    /// Balance the actions into a transaction without signing or submitting it
    pub async fn build(
        &self,
        tx_actions: TxActions<Datum, Redeemer>,
    ) -> Result<BuiltTransaction<Datum>> {
        let tx = tx_actions.to_unbuilt_tx()?;
        let built = self.ledger_client.build(tx).await?;
        debug!(fee = built.fee(), "Transaction built");
        Ok(built)
    }

    /// Build, sign and submit the actions
    pub async fn process(&self, tx_actions: TxActions<Datum, Redeemer>) -> Result<TxId> {
        let tx = tx_actions.to_unbuilt_tx()?;
        let tx_id = self.ledger_client.issue(tx).await?;
        Ok(tx_id)
    }
}
