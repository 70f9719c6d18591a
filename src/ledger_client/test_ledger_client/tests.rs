#![allow(non_snake_case)]

use super::*;
use crate::{
    address::random_base_address,
    ledger_client::test_ledger_client::local_persisted_storage::starting_output,
    scripts::{raw_validator_script::RawPlutusValidator, ValidatorCode},
    transaction::TxActions,
};

const ALWAYS_TRUE: &str = "4d01000033222220051200120011";

fn script() -> RawPlutusValidator<(), ()> {
    RawPlutusValidator::v2_from_cbor(ALWAYS_TRUE).unwrap()
}

fn in_memory(
    signer: &Address,
    outputs: Vec<Output<()>>,
) -> TestLedgerClient<(), (), InMemoryStorage<()>> {
    TestLedgerClient::new_in_memory(signer.clone(), outputs, ProtocolParams::default())
}

fn transfer(recipient: &Address, amount: u64) -> UnbuiltTransaction<(), ()> {
    TxActions::default()
        .pay_to_address(recipient, Values::from_lovelace(amount))
        .to_unbuilt_tx()
        .unwrap()
}

#[tokio::test]
async fn outputs_at_address() {
    let signer = random_base_address(Network::Testnet);
    let starting_amount = 10_000_000;
    let output = starting_output::<()>(&signer, starting_amount);
    let record = in_memory(&signer, vec![output]);
    let mut outputs = record.all_outputs_at_address(&signer).await.unwrap();
    assert_eq!(outputs.len(), 1);
    let first_output = outputs.pop().unwrap();
    let expected = starting_amount;
    let actual = first_output.values().get(&PolicyId::Lovelace).unwrap();
    assert_eq!(expected, actual);
}

#[tokio::test]
async fn outputs_at_address__respects_count() {
    let signer = random_base_address(Network::Testnet);
    let outputs = (0..5)
        .map(|_| starting_output::<()>(&signer, 1_000_000))
        .collect();
    let record = in_memory(&signer, outputs);

    let actual = record.outputs_at_address(&signer, 3).await.unwrap();

    assert_eq!(actual.len(), 3);
}

#[tokio::test]
async fn balance_at_address() {
    let signer = random_base_address(Network::Testnet);
    let starting_amount = 10_000_000;
    let outputs = vec![
        starting_output::<()>(&signer, starting_amount),
        starting_output::<()>(&signer, starting_amount),
    ];
    let record = in_memory(&signer, outputs);
    let expected = 2 * starting_amount;
    let actual = record
        .balance_at_address(&signer, &PolicyId::Lovelace)
        .await
        .unwrap();
    assert_eq!(expected, actual);
}

#[tokio::test]
async fn issue_transfer() {
    let sender = random_base_address(Network::Testnet);
    let starting_amount = 10_000_000;
    let transfer_amount = 3_000_000;
    let output = starting_output::<()>(&sender, starting_amount);
    let record = in_memory(&sender, vec![output]);
    let recipient = random_base_address(Network::Testnet);

    let built = record.build(transfer(&recipient, transfer_amount)).await.unwrap();
    let fee = built.fee();
    let signed = record.sign(built).await.unwrap();
    let tx_id = record.submit(signed).await.unwrap();

    let actual_bob = record
        .all_outputs_at_address(&recipient)
        .await
        .unwrap()
        .pop()
        .unwrap();
    assert_eq!(actual_bob.values().lovelace(), transfer_amount);
    assert_eq!(hex::encode(actual_bob.id().tx_hash()), tx_id.as_str());

    let actual_alice = record
        .all_outputs_at_address(&sender)
        .await
        .unwrap()
        .pop()
        .unwrap();
    assert_eq!(
        actual_alice.values().lovelace(),
        starting_amount - transfer_amount - fee
    );
    assert_eq!(actual_alice.id().tx_hash(), actual_bob.id().tx_hash());
}

#[tokio::test]
async fn build__fee_follows_protocol_params() {
    let sender = random_base_address(Network::Testnet);
    let output = starting_output::<()>(&sender, 10_000_000);
    let expensive = ProtocolParams {
        min_fee_b: 1_000_000,
        ..ProtocolParams::default()
    };
    let record = in_memory(&sender, vec![output.clone()]);
    let expensive_record = in_memory(&sender, vec![output]).with_protocol(expensive);
    let recipient = random_base_address(Network::Testnet);

    let cheap = record.build(transfer(&recipient, 1_000_000)).await.unwrap();
    let pricey = expensive_record
        .build(transfer(&recipient, 1_000_000))
        .await
        .unwrap();

    assert!(cheap.fee() > ProtocolParams::default().min_fee_b);
    assert_eq!(pricey.fee() - cheap.fee(), 1_000_000 - 155_381);
}

#[tokio::test]
async fn errors_if_spending_more_than_you_own() {
    let sender = random_base_address(Network::Testnet);
    let record = in_memory(&sender, vec![]);
    let recipient = random_base_address(Network::Testnet);

    let error = record
        .issue(transfer(&recipient, 3_000_000))
        .await
        .unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToBuildTx(_)));
}

#[tokio::test]
async fn submit__rejects_unsigned_transaction() {
    let sender = random_base_address(Network::Testnet);
    let output = starting_output::<()>(&sender, 10_000_000);
    let record = in_memory(&sender, vec![output]);
    let recipient = random_base_address(Network::Testnet);
    let built = record.build(transfer(&recipient, 1_000_000)).await.unwrap();
    let unsigned = SignedTransaction {
        built,
        witnesses: vec![],
    };

    let error = record.submit(unsigned).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToSubmitTx(_)));
}

#[tokio::test]
async fn submit__rejects_missing_required_signer() {
    let sender = random_base_address(Network::Testnet);
    let someone_else = random_base_address(Network::Testnet);
    let output = starting_output::<()>(&sender, 10_000_000);
    let record = in_memory(&sender, vec![output]);
    let tx = TxActions::<(), ()>::default()
        .pay_to_address(&someone_else, Values::from_lovelace(1_000_000))
        .add_signer(&someone_else)
        .to_unbuilt_tx()
        .unwrap();

    let error = record.issue(tx).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToSubmitTx(_)));
}

#[tokio::test]
async fn submit__rejects_spent_inputs() {
    let sender = random_base_address(Network::Testnet);
    let output = starting_output::<()>(&sender, 10_000_000);
    let record = in_memory(&sender, vec![output]);
    let recipient = random_base_address(Network::Testnet);
    let built = record.build(transfer(&recipient, 1_000_000)).await.unwrap();
    let signed = record.sign(built).await.unwrap();

    record.submit(signed.clone()).await.unwrap();
    let error = record.submit(signed).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToSubmitTx(_)));
}

#[tokio::test]
async fn spend_script_output__uses_collateral_and_charges_redeemer() {
    let me = random_base_address(Network::Testnet);
    let validator = script();
    let script_address = validator.address(Network::Testnet).unwrap();
    let locked = Output::new_validator(
        vec![7; 32],
        0,
        script_address.clone(),
        Values::from_lovelace(20_000_000),
        (),
    );
    let outputs = vec![starting_output::<()>(&me, 50_000_000), locked.clone()];
    let record = in_memory(&me, outputs);

    let tx = TxActions::default()
        .collect_from(vec![locked], ())
        .add_signer(&me)
        .pay_to_contract(&script_address, (), Values::from_lovelace(15_000_000))
        .attach_spending_validator(validator)
        .to_unbuilt_tx()
        .unwrap();
    let built = record.build(tx).await.unwrap();

    assert!(built.collateral.is_some());
    assert_eq!(built.redeemers.len(), 1);
    assert_eq!(built.scripts, vec![ALWAYS_TRUE.to_string()]);
    let params = ProtocolParams::default();
    assert!(built.fee() > params.min_fee_b + params.redeemer_fee);

    let signed = record.sign(built).await.unwrap();
    record.submit(signed).await.unwrap();
    let at_script = record.all_outputs_at_address(&script_address).await.unwrap();
    assert_eq!(at_script.len(), 1);
    assert_eq!(at_script[0].values().lovelace(), 15_000_000);
}

#[tokio::test]
async fn spend_script_output__needs_collateral() {
    let me = random_base_address(Network::Testnet);
    let validator = script();
    let script_address = validator.address(Network::Testnet).unwrap();
    let locked = Output::new_validator(
        vec![7; 32],
        0,
        script_address.clone(),
        Values::from_lovelace(20_000_000),
        (),
    );
    let record = in_memory(&me, vec![starting_output(&me, 1_000_000), locked.clone()]);

    let tx = TxActions::default()
        .collect_from(vec![locked], ())
        .attach_spending_validator(validator)
        .to_unbuilt_tx()
        .unwrap();
    let error = record.build(tx).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::NoBigEnoughCollateralUTxO));
}

#[tokio::test]
async fn spend_script_output__needs_datum() {
    let me = random_base_address(Network::Testnet);
    let validator = script();
    let script_address = validator.address(Network::Testnet).unwrap();
    let no_datum = Output::new_wallet(
        vec![7; 32],
        0,
        script_address,
        Values::from_lovelace(20_000_000),
    );
    let record = in_memory(&me, vec![starting_output(&me, 50_000_000), no_datum.clone()]);

    let tx = TxActions::default()
        .collect_from(vec![no_datum], ())
        .attach_spending_validator(validator)
        .to_unbuilt_tx()
        .unwrap();
    let error = record.build(tx).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::NoDatumOnScriptInput));
}

#[tokio::test]
async fn network__comes_from_signer() {
    let me = random_base_address(Network::Mainnet);
    let record = in_memory(&me, vec![]);

    assert_eq!(record.network().await.unwrap(), Network::Mainnet);
}
