use crate::{scripts::ScriptError, transaction::TransactionVersion};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Subset of a CIP-57 `plutus.json` blueprint as written by the Aiken compiler
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct BlueprintFile {
    preamble: Preamble,
    validators: Vec<ValidatorBlueprint>,
}

#[allow(missing_docs)]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preamble {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub plutus_version: Option<String>,
}

/// One compiled validator listed in a blueprint
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorBlueprint {
    title: String,
    #[serde(default)]
    datum: Option<serde_json::Value>,
    #[serde(default)]
    redeemer: Option<serde_json::Value>,
    compiled_code: String,
    #[serde(default)]
    hash: Option<String>,
}

impl BlueprintFile {
    /// Read and parse a blueprint from disk
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScriptError::FailedToConstruct(format!("Can't read blueprint {path:?}: {e}"))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a blueprint from its JSON text
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::FailedToConstruct(e.to_string()))
    }

    #[allow(missing_docs)]
    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    #[allow(missing_docs)]
    pub fn validators(&self) -> &[ValidatorBlueprint] {
        &self.validators
    }

    /// Look up a validator by its title, e.g. `"examples/auction.run"`
    pub fn get_validator(&self, title: &str) -> Option<ValidatorBlueprint> {
        self.validators.iter().find(|v| v.title == title).cloned()
    }

    /// Plutus language of the compiled validators. Aiken only emits V2 unless told otherwise.
    pub fn plutus_version(&self) -> Result<TransactionVersion, ScriptError> {
        match self.preamble.plutus_version.as_deref() {
            None | Some("v2") => Ok(TransactionVersion::V2),
            Some("v1") => Ok(TransactionVersion::V1),
            Some(other) => Err(ScriptError::FailedToConstruct(format!(
                "Unsupported plutus version: {other:?}"
            ))),
        }
    }
}

impl ValidatorBlueprint {
    #[allow(missing_docs)]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Schema of the datum, if the blueprint declares one
    pub fn datum(&self) -> Option<&serde_json::Value> {
        self.datum.as_ref()
    }

    /// Schema of the redeemer, if the blueprint declares one
    pub fn redeemer(&self) -> Option<&serde_json::Value> {
        self.redeemer.as_ref()
    }

    /// Hex of the flat-encoded program wrapped in a CBOR byte string
    pub fn compiled_code(&self) -> &str {
        &self.compiled_code
    }

    /// Script hash as listed by the compiler
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }
}
