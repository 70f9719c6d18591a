use crate::{
    ledger_client::{
        test_ledger_client::{TestLCError, TestLedgerStorage},
        LedgerClientError, LedgerClientResult,
    },
    output::{Output, OutputId},
};
use pallas_addresses::{Address, Network};
use std::sync::{Arc, Mutex, MutexGuard};

type MutableData<Datum> = Arc<Mutex<Vec<Output<Datum>>>>;

/// UTxO set kept in memory for the lifetime of the client
#[derive(Debug)]
pub struct InMemoryStorage<Datum> {
    pub(crate) signer: Address,
    pub(crate) outputs: MutableData<Datum>,
}

impl<Datum> InMemoryStorage<Datum> {
    pub(crate) fn new(signer: Address, outputs: Vec<Output<Datum>>) -> Self {
        InMemoryStorage {
            signer,
            outputs: Arc::new(Mutex::new(outputs)),
        }
    }

    fn lock(&self) -> LedgerClientResult<MutexGuard<'_, Vec<Output<Datum>>>> {
        self.outputs
            .lock()
            .map_err(|e| TestLCError::Mutex(format! {"{:?}", e}))
            .map_err(|e| LedgerClientError::Storage(Box::new(e)))
    }
}

#[async_trait::async_trait]
impl<Datum: Clone + Send + Sync> TestLedgerStorage<Datum> for InMemoryStorage<Datum> {
    async fn signer(&self) -> LedgerClientResult<Address> {
        Ok(self.signer.clone())
    }

    async fn outputs_by_count(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        let outputs = self
            .lock()?
            .iter()
            .filter(|o| o.owner() == address)
            .take(count)
            .cloned()
            .collect();
        Ok(outputs)
    }

    async fn all_outputs(&self, address: &Address) -> LedgerClientResult<Vec<Output<Datum>>> {
        let outputs = self
            .lock()?
            .iter()
            .filter(|o| o.owner() == address)
            .cloned()
            .collect();
        Ok(outputs)
    }

    async fn contains_output(&self, id: &OutputId) -> LedgerClientResult<bool> {
        Ok(self.lock()?.iter().any(|o| o.id() == id))
    }

    async fn apply(&self, spent: &[OutputId], created: &[Output<Datum>]) -> LedgerClientResult<()> {
        let mut ledger_utxos = self.lock()?;
        if let Some(missing) = spent
            .iter()
            .find(|id| !ledger_utxos.iter().any(|o| o.id() == *id))
        {
            return Err(LedgerClientError::FailedToRetrieveOutputWithId(
                missing.clone(),
                Box::new(TestLCError::InputNotFound(missing.clone())),
            ));
        }
        ledger_utxos.retain(|o| !spent.contains(o.id()));
        ledger_utxos.extend(created.iter().cloned());
        Ok(())
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        self.signer
            .network()
            .ok_or_else(|| LedgerClientError::BaseAddress(Box::new(TestLCError::InvalidAddress)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::{address::random_base_address, values::Values};

    #[tokio::test]
    async fn apply__replaces_spent_outputs() {
        let signer = random_base_address(Network::Testnet);
        let first = Output::new_wallet(vec![1; 32], 0, signer.clone(), Values::from_lovelace(5));
        let second = Output::new_wallet(vec![2; 32], 0, signer.clone(), Values::from_lovelace(7));
        let created = Output::new_wallet(vec![3; 32], 0, signer.clone(), Values::from_lovelace(4));
        let storage =
            InMemoryStorage::<()>::new(signer.clone(), vec![first.clone(), second.clone()]);

        storage
            .apply(&[first.id().clone()], &[created.clone()])
            .await
            .unwrap();

        assert_eq!(
            storage.all_outputs(&signer).await.unwrap(),
            vec![second, created]
        );
    }

    #[tokio::test]
    async fn apply__with_unknown_input_changes_nothing() {
        let signer = random_base_address(Network::Testnet);
        let first = Output::new_wallet(vec![1; 32], 0, signer.clone(), Values::from_lovelace(5));
        let created = Output::new_wallet(vec![3; 32], 0, signer.clone(), Values::from_lovelace(4));
        let storage = InMemoryStorage::<()>::new(signer.clone(), vec![first.clone()]);
        let unknown = OutputId::new(vec![9; 32], 1);

        let error = storage
            .apply(&[first.id().clone(), unknown], &[created])
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            LedgerClientError::FailedToRetrieveOutputWithId(..)
        ));
        assert_eq!(storage.all_outputs(&signer).await.unwrap(), vec![first]);
    }
}
