use crate::{
    scripts::{raw_script::ValidatorBlueprint, ScriptError, ScriptResult, ValidatorCode},
    transaction::TransactionVersion,
};
use pallas_crypto::hash::Hasher;
use std::marker::PhantomData;

/// Compiled Plutus validator as found in a blueprint, typed by the `Datum` and `Redeemer` it
/// expects. `cbor` is the program wrapped once in a CBOR byte string, which is the form both
/// hashed for the address and attached to transactions.
pub struct RawPlutusValidator<Datum, Redeemer> {
    version: TransactionVersion,
    cbor: Vec<u8>,
    _datum: PhantomData<Datum>,
    _redeemer: PhantomData<Redeemer>,
}

impl<D, R> Clone for RawPlutusValidator<D, R> {
    fn clone(&self) -> Self {
        RawPlutusValidator {
            version: self.version.clone(),
            cbor: self.cbor.clone(),
            _datum: PhantomData,
            _redeemer: PhantomData,
        }
    }
}

impl<D, R> std::fmt::Debug for RawPlutusValidator<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawPlutusValidator")
            .field("version", &self.version)
            .field("cbor", &hex::encode(&self.cbor))
            .finish()
    }
}

impl<D, R> RawPlutusValidator<D, R> {
    /// Validator of the given language version from a blueprint entry. If the blueprint lists a
    /// hash it must match the hash of the compiled code.
    pub fn from_blueprint(
        blueprint: ValidatorBlueprint,
        version: TransactionVersion,
    ) -> ScriptResult<Self> {
        let cbor = hex::decode(blueprint.compiled_code())
            .map_err(|e| ScriptError::FailedToConstruct(e.to_string()))?;
        let validator = RawPlutusValidator {
            version,
            cbor,
            _datum: Default::default(),
            _redeemer: Default::default(),
        };
        if let Some(expected) = blueprint.hash() {
            let actual = hex::encode(validator.hash());
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(ScriptError::HashMismatch {
                    title: blueprint.title().to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(validator)
    }

    /// V2 validator straight from the hex of its CBOR-wrapped program
    pub fn v2_from_cbor(cbor: &str) -> ScriptResult<Self> {
        let cbor = hex::decode(cbor).map_err(|e| ScriptError::FailedToConstruct(e.to_string()))?;
        Ok(RawPlutusValidator {
            version: TransactionVersion::V2,
            cbor,
            _datum: Default::default(),
            _redeemer: Default::default(),
        })
    }

    fn hash(&self) -> Vec<u8> {
        Hasher::<224>::hash_tagged(&self.cbor, self.version.script_tag()).to_vec()
    }
}

impl<D: Send + Sync, R: Send + Sync> ValidatorCode<D, R> for RawPlutusValidator<D, R> {
    fn version(&self) -> TransactionVersion {
        self.version.clone()
    }

    fn script_hex(&self) -> ScriptResult<String> {
        Ok(hex::encode(&self.cbor))
    }

    fn script_hash(&self) -> ScriptResult<Vec<u8>> {
        Ok(self.hash())
    }
}
