use cardamove::{
    config::{get_ledger_client_from_dir, init_local_env_in, LocalLedgerClient},
    contract::ContractHandle,
    ledger_client::LedgerClient,
    policy_id::PolicyId,
};
use simple_contract::{
    datum::{SimpleDatum, SimpleRedeemer},
    logic::{fund_contract, spend_two_utxos, FUND_LOVELACE, RELOCK_LOVELACE},
};
use std::path::PathBuf;
use tempfile::TempDir;

fn blueprint_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("plutus.json")
}

async fn client(config_dir: &TempDir) -> LocalLedgerClient<SimpleDatum, SimpleRedeemer> {
    get_ledger_client_from_dir(config_dir.path()).await.unwrap()
}

#[tokio::test]
async fn fund_then_spend_persists_between_clients() {
    let config_dir = TempDir::new().unwrap();
    let signer = init_local_env_in(config_dir.path(), "local", 10_000_000_000)
        .await
        .unwrap();

    let ledger_client = client(&config_dir).await;
    let contract: ContractHandle<SimpleDatum, SimpleRedeemer> =
        ContractHandle::load(&ledger_client, blueprint_path(), "examples/auction.run")
            .await
            .unwrap();
    fund_contract(&ledger_client, &contract).await.unwrap();

    let reopened = client(&config_dir).await;
    let locked = reopened
        .all_outputs_at_address(contract.address())
        .await
        .unwrap();
    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].values().lovelace(), FUND_LOVELACE);
    assert_eq!(locked[0].typed_datum(), Some(SimpleDatum::new("12345678")));

    let built = spend_two_utxos(&reopened, &contract).await.unwrap();
    let fee = built.fee();
    assert!(fee > 0);
    let signed = reopened.sign(built).await.unwrap();
    reopened.submit(signed).await.unwrap();

    let after = client(&config_dir)
        .await
        .all_outputs_at_address(contract.address())
        .await
        .unwrap();
    assert_eq!(after.len(), 2);
    let mut ids: Vec<_> = after
        .iter()
        .map(|o| {
            assert_eq!(o.values().lovelace(), RELOCK_LOVELACE);
            o.typed_datum().unwrap().identifier()
        })
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["12345678".to_string(), "987654321".to_string()]);

    let wallet = reopened
        .balance_at_address(&signer, &PolicyId::Lovelace)
        .await
        .unwrap();
    assert!(wallet < 10_000_000_000 - 2 * RELOCK_LOVELACE + FUND_LOVELACE);
}

#[tokio::test]
async fn spending_an_empty_contract_still_builds() {
    let config_dir = TempDir::new().unwrap();
    init_local_env_in(config_dir.path(), "local", 10_000_000_000)
        .await
        .unwrap();
    let ledger_client = client(&config_dir).await;
    let contract: ContractHandle<SimpleDatum, SimpleRedeemer> =
        ContractHandle::load(&ledger_client, blueprint_path(), "examples/auction.run")
            .await
            .unwrap();

    let built = spend_two_utxos(&ledger_client, &contract).await.unwrap();

    assert!(built.fee() > 0);
    assert!(built.redeemers.is_empty());
    assert!(built.collateral.is_none());
}
