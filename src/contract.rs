use crate::{
    error::Result,
    ledger_client::LedgerClient,
    scripts::{
        raw_script::BlueprintFile, raw_validator_script::RawPlutusValidator, ScriptError,
        ValidatorCode,
    },
};
use pallas_addresses::{Address, Network};
use std::path::Path;
use tracing::debug;

/// A validator loaded from a compiled blueprint together with its address on one network.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ContractHandle<Datum, Redeemer> {
    script: RawPlutusValidator<Datum, Redeemer>,
    address: Address,
}

impl<Datum, Redeemer> ContractHandle<Datum, Redeemer>
where
    Datum: Send + Sync,
    Redeemer: Send + Sync,
{
    /// Load validator `script_name` from the blueprint at `artifact_path` and place it on the
    /// network of `chain_client`
    pub async fn load<LC, P>(chain_client: &LC, artifact_path: P, script_name: &str) -> Result<Self>
    where
        LC: LedgerClient<Datum, Redeemer>,
        P: AsRef<Path>,
    {
        let blueprint = BlueprintFile::from_file(artifact_path).await?;
        let network = chain_client.network().await?;
        Self::from_blueprint(&blueprint, script_name, network)
    }

    #[allow(missing_docs)]
    pub fn from_blueprint(
        blueprint: &BlueprintFile,
        script_name: &str,
        network: Network,
    ) -> Result<Self> {
        let validator = blueprint.get_validator(script_name).ok_or_else(|| {
            ScriptError::FailedToConstruct(format!("No validator named {script_name:?}"))
        })?;
        let script = RawPlutusValidator::from_blueprint(validator, blueprint.plutus_version()?)?;
        let address = script.address(network)?;
        debug!(script_name, address = %address.to_hex(), "Loaded contract");
        Ok(ContractHandle { script, address })
    }

    /// Script address, where outputs locked by this validator live
    pub fn address(&self) -> &Address {
        &self.address
    }

    #[allow(missing_docs)]
    pub fn script(&self) -> &RawPlutusValidator<Datum, Redeemer> {
        &self.script
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::{
        address::{random_base_address, script_hash_from_address_if_available},
        error::Error,
        ledger_client::test_ledger_client::TestBackendsBuilder,
    };
    use tempfile::TempDir;

    const BLUEPRINT: &str = r#"{
        "preamble": { "title": "test/contracts", "plutusVersion": "v2" },
        "validators": [
            {
                "title": "examples/auction.run",
                "compiledCode": "4d01000033222220051200120011",
                "hash": "793f8c8cffba081b2a56462fc219cc8fe652d6a338b62c7b134876e7"
            }
        ]
    }"#;

    #[tokio::test]
    async fn load__address_is_on_client_network() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("plutus.json");
        tokio::fs::write(&path, BLUEPRINT).await.unwrap();
        let signer = random_base_address(Network::Testnet);
        let backend = TestBackendsBuilder::<(), ()>::new(&signer).build_in_memory();

        let handle: ContractHandle<(), ()> =
            ContractHandle::load(backend.ledger_client(), &path, "examples/auction.run")
                .await
                .unwrap();

        assert_eq!(handle.address().network(), Some(Network::Testnet));
        let hash = script_hash_from_address_if_available(handle.address()).unwrap();
        assert_eq!(hex::encode(hash), "793f8c8cffba081b2a56462fc219cc8fe652d6a338b62c7b134876e7");
        assert_eq!(handle.script().script_hex().unwrap(), "4d01000033222220051200120011");
    }

    #[tokio::test]
    async fn load__unknown_validator_fails() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("plutus.json");
        tokio::fs::write(&path, BLUEPRINT).await.unwrap();
        let signer = random_base_address(Network::Testnet);
        let backend = TestBackendsBuilder::<(), ()>::new(&signer).build_in_memory();

        let error = ContractHandle::<(), ()>::load(backend.ledger_client(), &path, "nope.spend")
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Script(ScriptError::FailedToConstruct(_))));
    }

    #[tokio::test]
    async fn load__missing_file_fails() {
        let tmp_dir = TempDir::new().unwrap();
        let signer = random_base_address(Network::Testnet);
        let backend = TestBackendsBuilder::<(), ()>::new(&signer).build_in_memory();

        let result = ContractHandle::<(), ()>::load(
            backend.ledger_client(),
            tmp_dir.path().join("missing.json"),
            "examples/auction.run",
        )
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn same_blueprint_gives_same_address() {
        let blueprint = BlueprintFile::from_json(BLUEPRINT).unwrap();
        let handle =
            |name| ContractHandle::<(), ()>::from_blueprint(&blueprint, name, Network::Mainnet);

        let first = handle("examples/auction.run").unwrap();
        let second = handle("examples/auction.run").unwrap();

        assert_eq!(first.address(), second.address());
    }
}
