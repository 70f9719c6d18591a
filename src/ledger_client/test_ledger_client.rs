use std::{fmt::Debug, marker::PhantomData, path::Path};

use crate::{
    address::pub_key_hash_from_address_if_available,
    backend::Backend,
    ledger_client::{
        test_ledger_client::in_memory_storage::InMemoryStorage, LedgerClient, LedgerClientError,
        LedgerClientResult,
    },
    output::{Output, OutputId},
    scripts::plutus_data::PlutusData,
    transaction::{BuiltTransaction, KeyWitness, SignedTransaction, TxId},
    values::Values,
    PolicyId, UnbuiltTransaction,
};
use async_trait::async_trait;
use balancing::{BalanceRequest, ProtocolParams};
use local_persisted_storage::LocalPersistedStorage;
use pallas_addresses::{Address, Network};
use pallas_crypto::hash::Hasher;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

pub mod balancing;
pub mod in_memory_storage;
pub mod local_persisted_storage;

#[cfg(test)]
mod tests;

/// Builder for a [`Backend`] over an in-memory ledger with a chosen starting UTxO set
pub struct TestBackendsBuilder<Datum, Redeemer> {
    signer: Address,
    outputs: Vec<Output<Datum>>,
    protocol: ProtocolParams,
    _redeemer: PhantomData<Redeemer>,
}

impl<Datum, Redeemer> TestBackendsBuilder<Datum, Redeemer>
where
    Datum: Clone + PartialEq + Debug + Send + Sync + Into<PlutusData>,
    Redeemer: Clone + Send + Sync + Into<PlutusData>,
{
    #[allow(missing_docs)]
    pub fn new(signer: &Address) -> TestBackendsBuilder<Datum, Redeemer> {
        TestBackendsBuilder {
            signer: signer.clone(),
            outputs: Vec::new(),
            protocol: ProtocolParams::default(),
            _redeemer: PhantomData,
        }
    }

    /// Begin describing an output owned by `owner`
    pub fn start_output(self, owner: &Address) -> OutputBuilder<Datum, Redeemer> {
        OutputBuilder {
            inner: self,
            owner: owner.clone(),
            values: Values::default(),
            datum: None,
        }
    }

    /// Use other fee and collateral settings than the defaults
    pub fn with_protocol(mut self, protocol: ProtocolParams) -> Self {
        self.protocol = protocol;
        self
    }

    fn add_output(&mut self, output: Output<Datum>) {
        self.outputs.push(output)
    }

    #[allow(missing_docs)]
    pub fn build_in_memory(
        &self,
    ) -> Backend<Datum, Redeemer, TestLedgerClient<Datum, Redeemer, InMemoryStorage<Datum>>> {
        let ledger_client = TestLedgerClient::new_in_memory(
            self.signer.clone(),
            self.outputs.clone(),
            self.protocol.clone(),
        );
        Backend::new(ledger_client)
    }
}

/// Describes one output of a [`TestBackendsBuilder`]
pub struct OutputBuilder<Datum, Redeemer> {
    inner: TestBackendsBuilder<Datum, Redeemer>,
    owner: Address,
    values: Values,
    datum: Option<Datum>,
}

impl<Datum, Redeemer> OutputBuilder<Datum, Redeemer>
where
    Datum: Clone + PartialEq + Debug + Send + Sync + Into<PlutusData>,
    Redeemer: Clone + Send + Sync + Into<PlutusData>,
{
    #[allow(missing_docs)]
    pub fn with_value(mut self, policy: PolicyId, amount: u64) -> OutputBuilder<Datum, Redeemer> {
        self.values.add_one_value(&policy, amount);
        self
    }

    #[allow(missing_docs)]
    pub fn with_datum(mut self, datum: Datum) -> OutputBuilder<Datum, Redeemer> {
        self.datum = Some(datum);
        self
    }

    #[allow(missing_docs)]
    pub fn finish_output(self) -> TestBackendsBuilder<Datum, Redeemer> {
        let OutputBuilder {
            mut inner,
            owner,
            values,
            datum,
        } = self;
        let tx_hash = arbitrary_tx_id().to_vec();
        let index = 0;
        let output = if let Some(datum) = datum {
            Output::new_validator(tx_hash, index, owner, values, datum)
        } else {
            Output::new_wallet(tx_hash, index, owner, values)
        };
        inner.add_output(output);
        inner
    }
}

#[derive(Debug, Error)]
pub(crate) enum TestLCError {
    #[error("Mutex lock error: {0:?}")]
    Mutex(String),
    #[error("Input {0} is not in the ledger, it may have been spent already")]
    InputNotFound(OutputId),
    #[error("Missing signature from key {0}")]
    MissingSignature(String),
    #[error("Not a valid signer address")]
    InvalidAddress,
}

/// Where a [`TestLedgerClient`] keeps its UTxO set
#[async_trait::async_trait]
pub trait TestLedgerStorage<Datum> {
    /// Address of the owned key
    async fn signer(&self) -> LedgerClientResult<Address>;
    /// At most `count` outputs at `address`
    async fn outputs_by_count(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;
    /// Every output at `address`
    async fn all_outputs(&self, address: &Address) -> LedgerClientResult<Vec<Output<Datum>>>;
    /// Whether the output is still unspent
    async fn contains_output(&self, id: &OutputId) -> LedgerClientResult<bool>;
    /// Spend every output in `spent` and create `created`, all or nothing
    async fn apply(&self, spent: &[OutputId], created: &[Output<Datum>]) -> LedgerClientResult<()>;
    /// Network of the signer address
    async fn network(&self) -> LedgerClientResult<Network>;
}

/// Mocked ledger that balances, signs and applies transactions against its own UTxO set.
/// Scripts are not evaluated; a spend only needs the matching validator attached.
#[derive(Debug)]
pub struct TestLedgerClient<Datum, Redeemer, Storage: TestLedgerStorage<Datum>> {
    storage: Storage,
    protocol: ProtocolParams,
    _datum: PhantomData<Datum>, // This is useless but makes calling it's functions easier
    _redeemer: PhantomData<Redeemer>, // This is useless but makes calling it's functions easier
}

impl<Datum, Redeemer> TestLedgerClient<Datum, Redeemer, InMemoryStorage<Datum>>
where
    Datum: Clone + Send + Sync,
{
    #[allow(missing_docs)]
    pub fn new_in_memory(
        signer: Address,
        outputs: Vec<Output<Datum>>,
        protocol: ProtocolParams,
    ) -> Self {
        TestLedgerClient {
            storage: InMemoryStorage::new(signer, outputs),
            protocol,
            _datum: Default::default(),
            _redeemer: Default::default(),
        }
    }
}

impl<T, Datum, Redeemer> TestLedgerClient<Datum, Redeemer, LocalPersistedStorage<T, Datum>>
where
    Datum: Clone + Send + Sync + Into<PlutusData> + TryFrom<PlutusData>,
    T: AsRef<Path> + Send + Sync,
{
    /// Ledger in `dir`, created with `starting_amount` Lovelace for `signer` if it doesn't exist
    pub async fn init_local_persisted(
        dir: T,
        signer: &Address,
        starting_amount: u64,
    ) -> LedgerClientResult<Self> {
        let storage = LocalPersistedStorage::init(dir, signer, starting_amount).await?;
        Ok(TestLedgerClient {
            storage,
            protocol: ProtocolParams::default(),
            _datum: Default::default(),
            _redeemer: Default::default(),
        })
    }

    /// Ledger previously created in `dir`
    pub fn load_local_persisted(dir: T) -> Self {
        TestLedgerClient {
            storage: LocalPersistedStorage::load(dir),
            protocol: ProtocolParams::default(),
            _datum: Default::default(),
            _redeemer: Default::default(),
        }
    }
}

impl<Datum, Redeemer, Storage> TestLedgerClient<Datum, Redeemer, Storage>
where
    Storage: TestLedgerStorage<Datum>,
{
    /// Use other fee and collateral settings than the defaults
    pub fn with_protocol(mut self, protocol: ProtocolParams) -> Self {
        self.protocol = protocol;
        self
    }

    #[allow(missing_docs)]
    pub fn protocol(&self) -> &ProtocolParams {
        &self.protocol
    }
}

impl<Datum, Redeemer, Storage> TestLedgerClient<Datum, Redeemer, Storage>
where
    Datum: Clone + PartialEq + Debug + Send + Sync + Into<PlutusData>,
    Redeemer: Clone + Send + Sync + Into<PlutusData>,
    Storage: TestLedgerStorage<Datum> + Send + Sync,
{
    async fn signer_key_hash(&self) -> LedgerClientResult<Vec<u8>> {
        let signer = self.storage.signer().await?;
        pub_key_hash_from_address_if_available(&signer)
            .ok_or_else(|| LedgerClientError::BaseAddress(Box::new(TestLCError::InvalidAddress)))
    }

    async fn ensure_unspent(
        &self,
        id: &OutputId,
        to_error: fn(Box<dyn std::error::Error + Send + Sync>) -> LedgerClientError,
    ) -> LedgerClientResult<()> {
        if self.storage.contains_output(id).await? {
            Ok(())
        } else {
            Err(to_error(Box::new(TestLCError::InputNotFound(id.clone()))))
        }
    }

    fn pick_collateral(&self, wallet: &[Output<Datum>]) -> LedgerClientResult<Output<Datum>> {
        wallet
            .iter()
            .filter(|utxo| {
                utxo.values().only_lovelace()
                    && utxo.values().lovelace() >= self.protocol.collateral_lovelace
            })
            .min_by_key(|utxo| utxo.values().lovelace())
            .cloned()
            .ok_or(LedgerClientError::NoBigEnoughCollateralUTxO)
    }
}

#[async_trait]
impl<Datum, Redeemer, Storage> LedgerClient<Datum, Redeemer>
    for TestLedgerClient<Datum, Redeemer, Storage>
where
    Datum: Clone + PartialEq + Debug + Send + Sync + Into<PlutusData>,
    Redeemer: Clone + Send + Sync + Into<PlutusData>,
    Storage: TestLedgerStorage<Datum> + Send + Sync,
{
    async fn signer_base_address(&self) -> LedgerClientResult<Address> {
        self.storage.signer().await
    }

    async fn outputs_at_address(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.storage.outputs_by_count(address, count).await
    }

    async fn all_outputs_at_address(
        &self,
        address: &Address,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.storage.all_outputs(address).await
    }

    async fn build(
        &self,
        tx: UnbuiltTransaction<Datum, Redeemer>,
    ) -> LedgerClientResult<BuiltTransaction<Datum>> {
        let signer = self.signer_base_address().await?;
        let signer_hash = self.signer_key_hash().await?;

        let mut mandatory_inputs = Vec::new();
        let mut redeemers: Vec<(OutputId, PlutusData)> = Vec::new();
        let mut scripts: Vec<String> = Vec::new();
        for (input, redeemer, validator) in tx.script_inputs {
            if !input.datum().is_some() {
                return Err(LedgerClientError::NoDatumOnScriptInput);
            }
            self.ensure_unspent(input.id(), LedgerClientError::FailedToBuildTx)
                .await?;
            let script = validator
                .script_hex()
                .map_err(|e| LedgerClientError::FailedToBuildTx(Box::new(e)))?;
            if !scripts.contains(&script) {
                scripts.push(script);
            }
            redeemers.push((input.id().clone(), redeemer.into()));
            mandatory_inputs.push(input);
        }
        for input in tx.specific_wallet_inputs {
            self.ensure_unspent(input.id(), LedgerClientError::FailedToBuildTx)
                .await?;
            mandatory_inputs.push(input);
        }

        let wallet_utxos = self.storage.all_outputs(&signer).await?;
        let collateral = if redeemers.is_empty() {
            None
        } else {
            Some(self.pick_collateral(&wallet_utxos)?)
        };

        let mut required_signers = Vec::new();
        for address in &tx.required_signers {
            let hash = pub_key_hash_from_address_if_available(address).ok_or_else(|| {
                LedgerClientError::FailedToBuildTx(Box::new(TestLCError::InvalidAddress))
            })?;
            if !required_signers.contains(&hash) {
                required_signers.push(hash);
            }
        }
        let mut witness_count = required_signers.len() as u64;
        if !required_signers.contains(&signer_hash) {
            witness_count += 1;
        }

        let request = BalanceRequest {
            mandatory_inputs,
            wallet_utxos,
            outputs: tx.unbuilt_outputs,
            change_address: signer,
            collateral,
            redeemers,
            scripts,
            required_signers,
            witness_count,
        };
        let built = balancing::balance(request, &self.protocol)
            .map_err(|e| LedgerClientError::FailedToBuildTx(Box::new(e)))?;
        debug!(
            tx_hash = %hex::encode(&built.tx_hash),
            inputs = built.inputs.len(),
            outputs = built.outputs.len(),
            fee = built.fee,
            "Built transaction"
        );
        Ok(built)
    }

    async fn sign(
        &self,
        tx: BuiltTransaction<Datum>,
    ) -> LedgerClientResult<SignedTransaction<Datum>> {
        let key_hash = self.signer_key_hash().await?;
        let signature = mock_signature(&key_hash, &tx.tx_hash);
        let witness = KeyWitness {
            key_hash,
            signature,
        };
        Ok(SignedTransaction {
            built: tx,
            witnesses: vec![witness],
        })
    }

    async fn submit(&self, tx: SignedTransaction<Datum>) -> LedgerClientResult<TxId> {
        let built = &tx.built;
        let spent_key_hashes = built
            .inputs
            .iter()
            .filter_map(|input| pub_key_hash_from_address_if_available(input.owner()));
        for key_hash in built.required_signers.iter().cloned().chain(spent_key_hashes) {
            let expected = mock_signature(&key_hash, &built.tx_hash);
            let valid = tx
                .witnesses
                .iter()
                .any(|w| w.key_hash == key_hash && w.signature == expected);
            if !valid {
                return Err(LedgerClientError::FailedToSubmitTx(Box::new(
                    TestLCError::MissingSignature(hex::encode(&key_hash)),
                )));
            }
        }

        for input in built.inputs.iter().chain(built.collateral.iter()) {
            self.ensure_unspent(input.id(), LedgerClientError::FailedToSubmitTx)
                .await?;
        }

        let spent: Vec<OutputId> = built.inputs.iter().map(|i| i.id().clone()).collect();
        self.storage.apply(&spent, &built.outputs).await?;

        let tx_id = built.tx_id();
        info!(%tx_id, fee = built.fee, "Submitted transaction");
        Ok(tx_id)
    }

    async fn issue(&self, tx: UnbuiltTransaction<Datum, Redeemer>) -> LedgerClientResult<TxId> {
        let built = self.build(tx).await?;
        let signed = self.sign(built).await?;
        self.submit(signed).await
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        self.storage.network().await
    }
}

/// Stand-in for an ed25519 signature: binds the key hash to the transaction hash
fn mock_signature(key_hash: &[u8], tx_hash: &[u8]) -> Vec<u8> {
    let mut preimage = key_hash.to_vec();
    preimage.extend_from_slice(tx_hash);
    Hasher::<256>::hash(&preimage).to_vec()
}

fn arbitrary_tx_id() -> [u8; 32] {
    rand::thread_rng().gen()
}
