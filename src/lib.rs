#![warn(missing_docs)]

//! Cardamove offchain toolkit: ledger clients, Plutus data, validator blueprints and the
//! transaction builder used to drive Plutus contracts from Rust.

use crate::{policy_id::PolicyId, transaction::UnbuiltTransaction};

pub use pallas_addresses::{Address, Network};

/// Address helpers (script/key hashes, enterprise addresses)
pub mod address;
/// Backend gluing offchain logic to a ledger client
pub mod backend;
/// Local environment configuration
pub mod config;
/// Handle for a validator loaded from a blueprint
pub mod contract;
/// Crate-wide error type
pub mod error;
/// Ledger client module
pub mod ledger_client;
/// Smart contract logic module
pub mod logic;
/// UTxOs and their datums
pub mod output;
/// `PolicyId` type module
pub mod policy_id;
/// Plutus scripts and Plutus data
pub mod scripts;
/// Endpoints of a contract's logic run against a backend
pub mod smart_contract;
/// Transaction builder and the staged transaction types
pub mod transaction;
/// Lovelace and native token amounts
pub mod values;
