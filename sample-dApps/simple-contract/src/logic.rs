use crate::datum::{SimpleDatum, SimpleRedeemer};
use async_trait::async_trait;
use cardamove::{
    contract::ContractHandle,
    error::Result,
    ledger_client::LedgerClient,
    logic::{SCLogic, SCLogicResult},
    output::Output,
    transaction::{BuiltTransaction, TxActions, TxId},
    values::Values,
    Address,
};
use tracing::info;


/// 100 ADA
pub const FUND_LOVELACE: u64 = 100_000_000;
/// 1000 ADA
pub const RELOCK_LOVELACE: u64 = 1_000_000_000;
pub const FIRST_IDENTIFIER: &str = "12345678";
pub const SECOND_IDENTIFIER: &str = "987654321";

pub type SimpleContract = ContractHandle<SimpleDatum, SimpleRedeemer>;

/// Lock 100 ADA at the contract under the datum for [`FIRST_IDENTIFIER`]
pub fn fund_actions(contract: &SimpleContract) -> TxActions<SimpleDatum, SimpleRedeemer> {
    TxActions::default().pay_to_contract(
        contract.address(),
        SimpleDatum::new(FIRST_IDENTIFIER),
        Values::from_lovelace(FUND_LOVELACE),
    )
}

/// Consume `contract_utxos` with the trivial redeemer and lock two fresh 1000 ADA outputs back
/// at the contract
pub fn spend_actions(
    contract: &SimpleContract,
    contract_utxos: Vec<Output<SimpleDatum>>,
    signer: &Address,
) -> TxActions<SimpleDatum, SimpleRedeemer> {
    TxActions::default()
        .collect_from(contract_utxos, SimpleRedeemer)
        .add_signer(signer)
        .pay_to_contract(
            contract.address(),
            SimpleDatum::new(FIRST_IDENTIFIER),
            Values::from_lovelace(RELOCK_LOVELACE),
        )
        .pay_to_contract(
            contract.address(),
            SimpleDatum::new(SECOND_IDENTIFIER),
            Values::from_lovelace(RELOCK_LOVELACE),
        )
        .attach_spending_validator(contract.script().clone())
}

/// Build, sign and submit [`fund_actions`]
pub async fn fund_contract<LC>(chain_client: &LC, contract: &SimpleContract) -> Result<TxId>
where
    LC: LedgerClient<SimpleDatum, SimpleRedeemer>,
{
    let tx = fund_actions(contract).to_unbuilt_tx()?;
    let tx_id = chain_client.issue(tx).await?;
    info!(%tx_id, "Funded contract");
    Ok(tx_id)
}

/// Build, without signing, a transaction respending every output currently at the contract
pub async fn spend_two_utxos<LC>(
    chain_client: &LC,
    contract: &SimpleContract,
) -> Result<BuiltTransaction<SimpleDatum>>
where
    LC: LedgerClient<SimpleDatum, SimpleRedeemer>,
{
    let contract_utxos = chain_client
        .all_outputs_at_address(contract.address())
        .await?;
    let signer = chain_client.signer_base_address().await?;
    info!(inputs = contract_utxos.len(), "Collecting contract outputs");
    let tx = spend_actions(contract, contract_utxos, &signer).to_unbuilt_tx()?;
    let built = chain_client.build(tx).await?;
    Ok(built)
}

/// Endpoint-style access to the same operations
#[derive(Debug, Clone)]
pub struct SimpleLogic {
    contract: SimpleContract,
}

impl SimpleLogic {
    pub fn new(contract: SimpleContract) -> Self {
        SimpleLogic { contract }
    }

    pub fn contract(&self) -> &SimpleContract {
        &self.contract
    }
}

pub enum SimpleEndpoints {
    /// Lock 100 ADA at the contract
    Fund,
    /// Respend every contract output into two new ones
    SpendAll,
}

pub enum SimpleLookups {
    ListUtxos,
}

pub enum SimpleLookupResponses {
    Utxos(Vec<Output<SimpleDatum>>),
}

#[async_trait]
impl SCLogic for SimpleLogic {
    type Endpoints = SimpleEndpoints;
    type Lookups = SimpleLookups;
    type LookupResponses = SimpleLookupResponses;
    type Datums = SimpleDatum;
    type Redeemers = SimpleRedeemer;

    async fn handle_endpoint<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        &self,
        endpoint: Self::Endpoints,
        ledger_client: &LC,
    ) -> SCLogicResult<TxActions<Self::Datums, Self::Redeemers>> {
        match endpoint {
            SimpleEndpoints::Fund => Ok(fund_actions(&self.contract)),
            SimpleEndpoints::SpendAll => impl_spend_all(&self.contract, ledger_client).await,
        }
    }

    async fn lookup<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        &self,
        query: Self::Lookups,
        ledger_client: &LC,
    ) -> SCLogicResult<Self::LookupResponses> {
        match query {
            SimpleLookups::ListUtxos => {
                let outputs = ledger_client
                    .all_outputs_at_address(self.contract.address())
                    .await?;
                Ok(SimpleLookupResponses::Utxos(outputs))
            }
        }
    }
}

async fn impl_spend_all<LC: LedgerClient<SimpleDatum, SimpleRedeemer>>(
    contract: &SimpleContract,
    ledger_client: &LC,
) -> SCLogicResult<TxActions<SimpleDatum, SimpleRedeemer>> {
    let contract_utxos = ledger_client
        .all_outputs_at_address(contract.address())
        .await?;
    let signer = ledger_client.signer_base_address().await?;
    Ok(spend_actions(contract, contract_utxos, &signer))
}
