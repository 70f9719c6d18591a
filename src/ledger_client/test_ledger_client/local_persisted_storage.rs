use crate::{
    address::bech32_serde,
    ledger_client::{
        test_ledger_client::{TestLCError, TestLedgerStorage},
        LedgerClientError, LedgerClientResult,
    },
    output::{Output, OutputId},
    scripts::plutus_data::PlutusData,
    values::Values,
};
use pallas_addresses::{Address, Network};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, marker::PhantomData, path::Path};
use thiserror::Error;

const DATA: &str = "data";
const STAGING: &str = "data.staging";

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct LedgerData {
    #[serde(with = "bech32_serde")]
    signer: Address,
    outputs: Vec<PersistedOutput>,
}

/// On-disk form of an [`Output`]. Datums are stored as CBOR hex so any `Datum` type can be
/// persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct PersistedOutput {
    tx_hash: String,
    index: u64,
    #[serde(with = "bech32_serde")]
    owner: Address,
    values: Values,
    datum: Option<PlutusData>,
}

impl PersistedOutput {
    fn id(&self) -> LedgerClientResult<OutputId> {
        let tx_hash = hex::decode(&self.tx_hash).map_err(|e| storage_error(e.into()))?;
        Ok(OutputId::new(tx_hash, self.index))
    }

    fn from_output<Datum: Clone + Into<PlutusData>>(output: &Output<Datum>) -> Self {
        PersistedOutput {
            tx_hash: hex::encode(output.id().tx_hash()),
            index: output.id().index(),
            owner: output.owner().clone(),
            values: output.values().clone(),
            datum: output.datum_plutus_data(),
        }
    }

    fn into_output<Datum: Clone + TryFrom<PlutusData>>(self) -> LedgerClientResult<Output<Datum>> {
        let tx_hash = hex::decode(&self.tx_hash).map_err(|e| storage_error(e.into()))?;
        let output = match self.datum {
            Some(datum) => {
                Output::new_untyped_validator(tx_hash, self.index, self.owner, self.values, datum)
                    .with_typed_datum_if_possible()
            }
            None => Output::new_wallet(tx_hash, self.index, self.owner, self.values),
        };
        Ok(output)
    }
}

#[derive(Debug, Error)]
enum LocalPersistedLCError {
    #[error("IO error on ledger file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed ledger file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed transaction hash: {0}")]
    TxHash(#[from] hex::FromHexError),
}

fn storage_error(e: LocalPersistedLCError) -> LedgerClientError {
    LedgerClientError::Storage(Box::new(e))
}

/// UTxO set persisted as JSON in a directory, so a mocked ledger survives between runs
#[derive(Debug)]
pub struct LocalPersistedStorage<T: AsRef<Path>, Datum> {
    dir: T,
    _datum: PhantomData<Datum>,
}

impl<T: AsRef<Path>, Datum> LocalPersistedStorage<T, Datum> {
    /// Create the ledger file with one output of `starting_amount` Lovelace owned by `signer`,
    /// unless a ledger already exists in `dir`
    pub async fn init(dir: T, signer: &Address, starting_amount: u64) -> LedgerClientResult<Self> {
        let storage = LocalPersistedStorage {
            dir,
            _datum: PhantomData,
        };
        let path = storage.dir.as_ref().join(DATA);
        if tokio::fs::metadata(&path).await.is_err() {
            tokio::fs::create_dir_all(storage.dir.as_ref())
                .await
                .map_err(|e| storage_error(e.into()))?;
            let output = starting_output::<()>(signer, starting_amount);
            let data = LedgerData {
                signer: signer.clone(),
                outputs: vec![PersistedOutput::from_output(&output)],
            };
            storage.write_data(&data).await?;
        }
        Ok(storage)
    }

    /// Use an existing ledger in `dir`
    pub fn load(dir: T) -> Self {
        LocalPersistedStorage {
            dir,
            _datum: PhantomData,
        }
    }

    pub(crate) async fn get_data(&self) -> LedgerClientResult<LedgerData> {
        let path = self.dir.as_ref().join(DATA);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| storage_error(e.into()))?;
        serde_json::from_str(&contents).map_err(|e| storage_error(e.into()))
    }

    /// Writes beside the ledger file and renames over it, so readers never see half a ledger
    async fn write_data(&self, data: &LedgerData) -> LedgerClientResult<()> {
        let path = self.dir.as_ref().join(DATA);
        let staging = self.dir.as_ref().join(STAGING);
        let serialized = serde_json::to_string_pretty(data).map_err(|e| storage_error(e.into()))?;
        tokio::fs::write(&staging, serialized)
            .await
            .map_err(|e| storage_error(e.into()))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| storage_error(e.into()))
    }
}

/// Wallet output with a random transaction hash, used to fund fresh ledgers
pub fn starting_output<Datum>(owner: &Address, amount: u64) -> Output<Datum> {
    let tx_hash = super::arbitrary_tx_id().to_vec();
    Output::new_wallet(tx_hash, 0, owner.clone(), Values::from_lovelace(amount))
}

#[async_trait::async_trait]
impl<T, Datum> TestLedgerStorage<Datum> for LocalPersistedStorage<T, Datum>
where
    T: AsRef<Path> + Send + Sync,
    Datum: Clone + Send + Sync + Into<PlutusData> + TryFrom<PlutusData>,
{
    async fn signer(&self) -> LedgerClientResult<Address> {
        Ok(self.get_data().await?.signer)
    }

    async fn outputs_by_count(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.get_data()
            .await?
            .outputs
            .into_iter()
            .filter(|o| &o.owner == address)
            .take(count)
            .map(PersistedOutput::into_output)
            .collect()
    }

    async fn all_outputs(&self, address: &Address) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.get_data()
            .await?
            .outputs
            .into_iter()
            .filter(|o| &o.owner == address)
            .map(PersistedOutput::into_output)
            .collect()
    }

    async fn contains_output(&self, id: &OutputId) -> LedgerClientResult<bool> {
        for output in self.get_data().await?.outputs {
            if &output.id()? == id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn apply(&self, spent: &[OutputId], created: &[Output<Datum>]) -> LedgerClientResult<()> {
        let mut data = self.get_data().await?;
        let ids = data
            .outputs
            .iter()
            .map(PersistedOutput::id)
            .collect::<LedgerClientResult<Vec<_>>>()?;
        if let Some(missing) = spent.iter().find(|id| !ids.contains(*id)) {
            return Err(LedgerClientError::FailedToRetrieveOutputWithId(
                missing.clone(),
                Box::new(TestLCError::InputNotFound(missing.clone())),
            ));
        }
        data.outputs = data
            .outputs
            .into_iter()
            .zip(ids)
            .filter(|(_, id)| !spent.contains(id))
            .map(|(output, _)| output)
            .chain(created.iter().map(PersistedOutput::from_output))
            .collect();
        self.write_data(&data).await
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        self.signer()
            .await?
            .network()
            .ok_or_else(|| LedgerClientError::BaseAddress(Box::new(TestLCError::InvalidAddress)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::{
        address::random_base_address,
        ledger_client::{test_ledger_client::TestLedgerClient, LedgerClient},
        transaction::TxActions,
        PolicyId,
    };
    use tempfile::TempDir;

    #[tokio::test]
    async fn outputs_at_address() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let starting_amount = 10_000_000;
        let record: TestLedgerClient<(), (), _> =
            TestLedgerClient::init_local_persisted(tmp_dir.path(), &signer, starting_amount)
                .await
                .unwrap();
        let mut outputs = record.all_outputs_at_address(&signer).await.unwrap();
        assert_eq!(outputs.len(), 1);
        let first_output = outputs.pop().unwrap();
        let expected = starting_amount;
        let actual = first_output.values().get(&PolicyId::Lovelace).unwrap();
        assert_eq!(expected, actual);
    }

    #[tokio::test]
    async fn init__keeps_existing_ledger() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let first: TestLedgerClient<(), (), _> =
            TestLedgerClient::init_local_persisted(tmp_dir.path(), &signer, 10_000_000)
                .await
                .unwrap();
        let before = first.all_outputs_at_address(&signer).await.unwrap();

        let second: TestLedgerClient<(), (), _> =
            TestLedgerClient::init_local_persisted(tmp_dir.path(), &signer, 99)
                .await
                .unwrap();
        let after = second.all_outputs_at_address(&signer).await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn issue__persists_transfer() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let starting_amount = 10_000_000;
        let transfer_amount = 3_000_000;
        let record: TestLedgerClient<(), (), _> =
            TestLedgerClient::init_local_persisted(tmp_dir.path(), &signer, starting_amount)
                .await
                .unwrap();
        let owner = random_base_address(Network::Testnet);
        let tx = TxActions::default()
            .pay_to_address(&owner, Values::from_lovelace(transfer_amount))
            .to_unbuilt_tx()
            .unwrap();
        record.issue(tx).await.unwrap();

        let reloaded: TestLedgerClient<(), (), _> =
            TestLedgerClient::load_local_persisted(tmp_dir.path());
        let actual_bob = reloaded
            .balance_at_address(&owner, &PolicyId::Lovelace)
            .await
            .unwrap();
        assert_eq!(actual_bob, transfer_amount);

        let actual_alice = reloaded
            .balance_at_address(&signer, &PolicyId::Lovelace)
            .await
            .unwrap();
        assert!(actual_alice < starting_amount - transfer_amount);
    }

    #[tokio::test]
    async fn datums_survive_the_round_trip() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let storage: LocalPersistedStorage<_, i64> =
            LocalPersistedStorage::init(tmp_dir.path(), &signer, 1).await.unwrap();
        let script_owner = random_base_address(Network::Testnet);
        let output = Output::new_validator(
            vec![9; 32],
            2,
            script_owner.clone(),
            Values::from_lovelace(5),
            -42i64,
        );

        storage.apply(&[], &[output.clone()]).await.unwrap();

        let stored = storage.all_outputs(&script_owner).await.unwrap();
        assert_eq!(stored, vec![output]);
    }

    #[tokio::test]
    async fn apply__with_unknown_input_changes_nothing() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let storage: LocalPersistedStorage<_, ()> =
            LocalPersistedStorage::init(tmp_dir.path(), &signer, 10_000_000)
                .await
                .unwrap();
        let before = storage.all_outputs(&signer).await.unwrap();
        let unknown = OutputId::new(vec![3; 32], 0);
        let created = Output::new_wallet(vec![4; 32], 0, signer.clone(), Values::from_lovelace(1));

        let error = storage
            .apply(&[before[0].id().clone(), unknown], &[created])
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            LedgerClientError::FailedToRetrieveOutputWithId(..)
        ));
        assert_eq!(storage.all_outputs(&signer).await.unwrap(), before);
    }

    #[tokio::test]
    async fn apply__failed_write_keeps_previous_ledger() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let storage: LocalPersistedStorage<_, ()> =
            LocalPersistedStorage::init(tmp_dir.path(), &signer, 10_000_000)
                .await
                .unwrap();
        let before = storage.all_outputs(&signer).await.unwrap();
        std::fs::create_dir(tmp_dir.path().join(STAGING)).unwrap();

        let result = storage.apply(&[before[0].id().clone()], &[]).await;

        assert!(result.is_err());
        assert_eq!(storage.all_outputs(&signer).await.unwrap(), before);
    }
}
