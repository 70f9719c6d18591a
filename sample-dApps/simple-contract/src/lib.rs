//! Demo dApp for a single Plutus validator: lock 100 ADA at it, then respend everything it holds
//! into two 1000 ADA outputs.

use cardamove::{
    config::{get_ledger_client_from_file, LocalLedgerClient},
    error::Result,
};
use datum::{SimpleDatum, SimpleRedeemer};

pub mod datum;
pub mod logic;

/// Ledger client of the current local environment, see `simple-cli init`
pub async fn setup() -> Result<LocalLedgerClient<SimpleDatum, SimpleRedeemer>> {
    get_ledger_client_from_file().await
}
