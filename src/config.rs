//! Local environments: `~/.cardamove/config.toml` names the environments and the current one,
//! `~/.cardamove/<env>/config.toml` says how to build that environment's ledger client.

use crate::{
    address::random_base_address,
    error::{Error, Result},
    ledger_client::{
        test_ledger_client::{
            balancing::ProtocolParams, local_persisted_storage::LocalPersistedStorage,
            TestLedgerClient,
        },
        LedgerClient,
    },
    scripts::plutus_data::PlutusData,
};
use dirs::home_dir;
use pallas_addresses::{Address, Network};
use serde::{de::DeserializeOwned, ser, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;

pub const CONFIG_FOLDER: &str = ".cardamove";
pub const CONFIG_FILE: &str = "config.toml";
pub const CLIENT_CONFIG_FILE: &str = "config.toml";
const DATA_FOLDER: &str = "ledger";

/// Ledger client backed by a local persisted environment
pub type LocalLedgerClient<Datum, Redeemer> =
    TestLedgerClient<Datum, Redeemer, LocalPersistedStorage<PathBuf, Datum>>;

#[allow(missing_docs)]
pub fn path_to_config_dir() -> Result<PathBuf> {
    let mut dir = home_dir()
        .ok_or_else(|| Error::Environment("Could not find home directory".to_string()))?;
    dir.push(CONFIG_FOLDER);
    Ok(dir)
}

fn config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

fn client_config_file(config_dir: &Path, env_name: &str) -> PathBuf {
    config_dir.join(env_name).join(CLIENT_CONFIG_FILE)
}

/// Known environments and the one in use
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CardamoveConfig {
    current_env: Option<String>,
    envs: Vec<String>,
}

impl CardamoveConfig {
    #[allow(missing_docs)]
    pub fn new(current_env: &str) -> Self {
        CardamoveConfig {
            current_env: Some(current_env.to_string()),
            envs: vec![current_env.to_string()],
        }
    }

    /// Add an environment and make it current
    pub fn set_new_env(&mut self, new_env_name: &str) -> Result<()> {
        if self.envs.iter().any(|env| env == new_env_name) {
            Err(Error::Environment(format!(
                "Environment {new_env_name:?} already exists"
            )))
        } else {
            self.current_env = Some(new_env_name.to_string());
            self.envs.push(new_env_name.to_string());
            Ok(())
        }
    }

    #[allow(missing_docs)]
    pub fn switch_env(&mut self, env_name: &str) -> Result<()> {
        if self.envs.iter().any(|env| env == env_name) {
            self.current_env = Some(env_name.to_string());
            Ok(())
        } else {
            Err(Error::Environment(format!(
                "Environment {env_name:?} doesn't exist"
            )))
        }
    }

    /// Forget an environment. Its files stay on disk.
    pub fn remove_env(&mut self, env_name: &str) -> Result<()> {
        if self.envs.iter().any(|env| env == env_name) {
            self.envs.retain(|env| env != env_name);
            if self.current_env.as_deref() == Some(env_name) {
                self.current_env = None;
            }
            Ok(())
        } else {
            Err(Error::Environment(format!(
                "Environment {env_name:?} doesn't exist"
            )))
        }
    }

    #[allow(missing_docs)]
    pub fn current_env(&self) -> Option<&str> {
        self.current_env.as_deref()
    }

    #[allow(missing_docs)]
    pub fn envs(&self) -> &[String] {
        &self.envs
    }
}

/// How one environment's ledger client is built
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    name: String,
    variant: ClientVariant,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientVariant {
    Test(TestClientConfig),
}

/// Mocked ledger persisted in `data_path`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestClientConfig {
    data_path: PathBuf,
    #[serde(default)]
    protocol: ProtocolParams,
}

impl TestClientConfig {
    #[allow(missing_docs)]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[allow(missing_docs)]
    pub fn protocol(&self) -> &ProtocolParams {
        &self.protocol
    }
}

impl ClientConfig {
    #[allow(missing_docs)]
    pub fn new_test(name: &str, data_path: &Path, protocol: ProtocolParams) -> Self {
        let inner = TestClientConfig {
            data_path: data_path.to_owned(),
            protocol,
        };
        ClientConfig {
            name: name.to_string(),
            variant: ClientVariant::Test(inner),
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn variant(&self) -> &ClientVariant {
        &self.variant
    }

    /// Open the ledger client this config describes
    pub fn to_client<Datum, Redeemer>(&self) -> LocalLedgerClient<Datum, Redeemer>
    where
        Datum: Clone + Send + Sync + Into<PlutusData> + TryFrom<PlutusData>,
    {
        match &self.variant {
            ClientVariant::Test(test_config) => {
                TestLedgerClient::load_local_persisted(test_config.data_path.clone())
                    .with_protocol(test_config.protocol.clone())
            }
        }
    }
}

/// Create (or reuse) environment `name` under `~/.cardamove` and make it current.
/// Returns the environment's signer address.
pub async fn init_local_env(name: &str, starting_amount: u64) -> Result<Address> {
    let config_dir = path_to_config_dir()?;
    init_local_env_in(&config_dir, name, starting_amount).await
}

/// [`init_local_env`] rooted at `config_dir`
pub async fn init_local_env_in(
    config_dir: &Path,
    name: &str,
    starting_amount: u64,
) -> Result<Address> {
    let data_path = config_dir.join(name).join(DATA_FOLDER);
    let signer = random_base_address(Network::Testnet);
    let ledger_client: LocalLedgerClient<(), ()> =
        TestLedgerClient::init_local_persisted(data_path.clone(), &signer, starting_amount)
            .await?;
    let signer = ledger_client.signer_base_address().await?;

    let client_config = ClientConfig::new_test(name, &data_path, ProtocolParams::default());
    write_toml_struct_to_file(&client_config_file(config_dir, name), &client_config).await?;

    let config_path = config_file(config_dir);
    let config = match read_toml_struct_from_file::<CardamoveConfig>(&config_path).await? {
        Some(mut config) => {
            if config.envs().iter().any(|env| env == name) {
                config.switch_env(name)?;
            } else {
                config.set_new_env(name)?;
            }
            config
        }
        None => CardamoveConfig::new(name),
    };
    write_toml_struct_to_file(&config_path, &config).await?;
    info!(env = name, data_path = ?data_path, "Initialized local environment");
    Ok(signer)
}

/// Ledger client of the current environment under `~/.cardamove`
pub async fn get_ledger_client_from_file<Datum, Redeemer>(
) -> Result<LocalLedgerClient<Datum, Redeemer>>
where
    Datum: Clone + Send + Sync + Into<PlutusData> + TryFrom<PlutusData>,
{
    let config_dir = path_to_config_dir()?;
    get_ledger_client_from_dir(&config_dir).await
}

/// [`get_ledger_client_from_file`] rooted at `config_dir`
pub async fn get_ledger_client_from_dir<Datum, Redeemer>(
    config_dir: &Path,
) -> Result<LocalLedgerClient<Datum, Redeemer>>
where
    Datum: Clone + Send + Sync + Into<PlutusData> + TryFrom<PlutusData>,
{
    let config = read_toml_struct_from_file::<CardamoveConfig>(&config_file(config_dir))
        .await?
        .ok_or_else(|| Error::Environment("Not initialized (config not found)".to_string()))?;
    let env = config
        .current_env()
        .ok_or_else(|| Error::Environment("No environment selected".to_string()))?;
    let client_config =
        read_toml_struct_from_file::<ClientConfig>(&client_config_file(config_dir, env))
            .await?
            .ok_or_else(|| {
                Error::Environment(format!("Config for environment {env:?} not found"))
            })?;
    Ok(client_config.to_client())
}

#[derive(Debug, Error)]
pub enum TomlError {
    #[error("No config directory for file: {0:?}")]
    NoParentDir(String),
}

#[allow(missing_docs)]
pub async fn write_toml_struct_to_file<Toml: ser::Serialize>(
    file_path: &Path,
    toml_struct: &Toml,
) -> Result<()> {
    let serialized = toml::to_string(&toml_struct).map_err(|e| Error::TOML(Box::new(e)))?;
    let parent_dir = file_path
        .parent()
        .ok_or_else(|| TomlError::NoParentDir(format!("{file_path:?}")))
        .map_err(|e| Error::TOML(Box::new(e)))?;
    fs::create_dir_all(&parent_dir)
        .await
        .map_err(|e| Error::TOML(Box::new(e)))?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(&file_path)
        .await
        .map_err(|e| Error::TOML(Box::new(e)))?;
    file.write_all(serialized.as_bytes())
        .await
        .map_err(|e| Error::TOML(Box::new(e)))?;
    Ok(())
}

/// `None` if the file doesn't exist
pub async fn read_toml_struct_from_file<Toml: DeserializeOwned>(
    file_path: &Path,
) -> Result<Option<Toml>> {
    if fs::metadata(file_path).await.is_err() {
        return Ok(None);
    }
    let contents = fs::read_to_string(file_path)
        .await
        .map_err(|e| Error::TOML(Box::new(e)))?;
    let toml_struct = toml::from_str(&contents).map_err(|e| Error::TOML(Box::new(e)))?;
    Ok(Some(toml_struct))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::PolicyId;
    use tempfile::TempDir;

    #[test]
    fn set_new_env__rejects_duplicates() {
        let mut config = CardamoveConfig::new("local");

        assert!(config.set_new_env("local").is_err());
        config.set_new_env("other").unwrap();
        assert_eq!(config.current_env(), Some("other"));
        assert_eq!(config.envs().len(), 2);
    }

    #[test]
    fn remove_env__clears_current() {
        let mut config = CardamoveConfig::new("local");

        config.remove_env("local").unwrap();

        assert_eq!(config.current_env(), None);
        assert!(config.switch_env("local").is_err());
    }

    #[tokio::test]
    async fn client_config__survives_toml() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("env").join(CLIENT_CONFIG_FILE);
        let config =
            ClientConfig::new_test("env", Path::new("/tmp/data"), ProtocolParams::default());

        write_toml_struct_to_file(&path, &config).await.unwrap();
        let read: ClientConfig = read_toml_struct_from_file(&path).await.unwrap().unwrap();

        assert_eq!(read, config);
    }

    #[tokio::test]
    async fn read_toml__missing_file_is_none() {
        let tmp_dir = TempDir::new().unwrap();

        let read: Option<CardamoveConfig> =
            read_toml_struct_from_file(&tmp_dir.path().join(CONFIG_FILE))
                .await
                .unwrap();

        assert!(read.is_none());
    }

    #[tokio::test]
    async fn init_local_env__client_sees_funded_signer() {
        let tmp_dir = TempDir::new().unwrap();
        let amount = 1_500_000_000;

        let signer = init_local_env_in(tmp_dir.path(), "local", amount).await.unwrap();
        let client: LocalLedgerClient<(), ()> =
            get_ledger_client_from_dir(tmp_dir.path()).await.unwrap();

        assert_eq!(client.signer_base_address().await.unwrap(), signer);
        let balance = client
            .balance_at_address(&signer, &PolicyId::Lovelace)
            .await
            .unwrap();
        assert_eq!(balance, amount);
        assert_eq!(client.network().await.unwrap(), Network::Testnet);
    }

    #[tokio::test]
    async fn init_local_env__twice_keeps_ledger() {
        let tmp_dir = TempDir::new().unwrap();

        let first = init_local_env_in(tmp_dir.path(), "local", 10_000_000).await.unwrap();
        let second = init_local_env_in(tmp_dir.path(), "local", 99).await.unwrap();

        assert_eq!(first, second);
        let config: CardamoveConfig = read_toml_struct_from_file(&config_file(tmp_dir.path()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.envs(), ["local".to_string()]);
    }

    #[tokio::test]
    async fn get_ledger_client__uninitialized_fails() {
        let tmp_dir = TempDir::new().unwrap();

        let result = get_ledger_client_from_dir::<(), ()>(tmp_dir.path()).await;

        assert!(matches!(result, Err(Error::Environment(_))));
    }
}
