#![allow(missing_docs)]

use crate::{
    ledger_client::LedgerClientError, logic::SCLogicError, scripts::ScriptError,
    transaction::TxBuildError, PolicyId,
};
use std::error;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error: Insufficient amount of {0:?}.")]
    InsufficientAmountOf(PolicyId),
    #[error("LedgerClient Error: {0}")]
    LedgerClient(#[from] LedgerClientError),
    #[error("Script Error: {0}")]
    Script(#[from] ScriptError),
    #[error("Error building transaction: {0}")]
    TxBuild(#[from] TxBuildError),
    #[error("Smart Contract Logic Error: {0}")]
    SCLogic(#[from] SCLogicError),
    #[error("Environment Error: {0}")]
    Environment(String),
    #[error("TOML Error: {0:?}")]
    TOML(Box<dyn error::Error + Send + Sync>),
}
