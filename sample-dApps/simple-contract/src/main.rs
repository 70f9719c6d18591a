use anyhow::{anyhow, Result};
use cardamove::{
    backend::Backend,
    config::{init_local_env, LocalLedgerClient},
    contract::ContractHandle,
    ledger_client::LedgerClient,
    output::Output,
    smart_contract::{SmartContract, SmartContractTrait},
};
use clap::Parser;
use simple_contract::{
    datum::{SimpleDatum, SimpleRedeemer},
    logic::{
        spend_two_utxos, SimpleEndpoints, SimpleLogic, SimpleLookupResponses, SimpleLookups,
    },
    setup,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Blueprint the validator is compiled into
    #[clap(long, default_value = "plutus.json")]
    blueprint: PathBuf,
    /// Title of the validator inside the blueprint
    #[clap(long, default_value = "examples/auction.run")]
    validator: String,
    /// Without a subcommand: show the contract, then build the respend and print its fee
    #[clap(subcommand)]
    action: Option<ActionParams>,
}

#[derive(clap::Subcommand, Debug)]
enum ActionParams {
    /// Create a local mocked ledger with a funded wallet and make it current
    Init {
        #[clap(long, default_value = "local")]
        name: String,
        /// Starting wallet balance in ADA
        #[clap(long, default_value_t = 10_000)]
        ada: u64,
    },
    /// List outputs locked at the contract
    List,
    /// Lock 100 ADA at the contract
    Fund,
    /// Build the transaction respending every contract output into two new ones
    Spend {
        /// Also sign and submit it
        #[clap(long)]
        submit: bool,
    },
}

type LocalBackend =
    Backend<SimpleDatum, SimpleRedeemer, LocalLedgerClient<SimpleDatum, SimpleRedeemer>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    match args.action {
        Some(ActionParams::Init { name, ada }) => {
            let signer = init_local_env(&name, lovelace_from_ada(ada)?).await?;
            println!("Initialized environment {name:?}");
            println!("Wallet: {}", signer.to_bech32()?);
        }
        None => {
            let (logic, backend) = load(&args.blueprint, &args.validator).await?;
            print_contract(&logic, &backend).await?;
            let built = spend_two_utxos(backend.ledger_client(), logic.contract()).await?;
            println!("Fee: {} lovelace", built.fee());
        }
        Some(ActionParams::List) => {
            let (logic, backend) = load(&args.blueprint, &args.validator).await?;
            print_contract(&logic, &backend).await?;
        }
        Some(ActionParams::Fund) => {
            let (logic, backend) = load(&args.blueprint, &args.validator).await?;
            let contract = SmartContract::new(&logic, &backend);
            let tx_id = contract.hit_endpoint(SimpleEndpoints::Fund).await?;
            println!("Funded contract: {tx_id}");
        }
        Some(ActionParams::Spend { submit }) => {
            let (logic, backend) = load(&args.blueprint, &args.validator).await?;
            let contract = SmartContract::new(&logic, &backend);
            let built = contract.build_endpoint(SimpleEndpoints::SpendAll).await?;
            println!("Fee: {} lovelace", built.fee());
            if submit {
                let ledger_client = backend.ledger_client();
                let signed = ledger_client.sign(built).await?;
                let tx_id = ledger_client.submit(signed).await?;
                println!("Submitted: {tx_id}");
            }
        }
    }
    Ok(())
}

fn lovelace_from_ada(ada: u64) -> Result<u64> {
    ada.checked_mul(1_000_000)
        .ok_or_else(|| anyhow!("{ada} ADA does not fit in a lovelace amount"))
}

async fn load(blueprint: &Path, validator: &str) -> Result<(SimpleLogic, LocalBackend)> {
    let ledger_client = setup().await?;
    let handle = ContractHandle::load(&ledger_client, blueprint, validator).await?;
    Ok((SimpleLogic::new(handle), Backend::new(ledger_client)))
}

async fn print_contract(logic: &SimpleLogic, backend: &LocalBackend) -> Result<()> {
    println!("Contract address: {}", logic.contract().address().to_bech32()?);
    let contract = SmartContract::new(logic, backend);
    let SimpleLookupResponses::Utxos(outputs) = contract.lookup(SimpleLookups::ListUtxos).await?;
    println!("Contract outputs: {}", outputs.len());
    for output in &outputs {
        print_output(output);
    }
    Ok(())
}

fn print_output(output: &Output<SimpleDatum>) {
    println!("-------------------------------------");
    println!("{}", output.id());
    println!("{} lovelace", output.values().lovelace());
    match output.typed_datum() {
        Some(datum) => println!("datum: {:?}", datum.identifier()),
        None => println!("datum: {:?}", output.datum()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ada_converts_to_lovelace() {
        assert_eq!(lovelace_from_ada(100).unwrap(), 100_000_000);
    }

    #[test]
    fn oversized_ada_amount_is_an_error() {
        assert!(lovelace_from_ada(u64::MAX).is_err());
    }
}
