use cardamove::scripts::plutus_data::{PlutusData, PlutusDataError};

/// Datum locked with every output of the contract: `Constr 0 [owner, Constr 0 []]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleDatum {
    owner: Vec<u8>,
}

impl SimpleDatum {
    /// Datum whose owner field is the UTF-8 bytes of `identifier`
    pub fn new(identifier: &str) -> Self {
        SimpleDatum {
            owner: identifier.as_bytes().to_vec(),
        }
    }

    pub fn owner(&self) -> &[u8] {
        &self.owner
    }

    /// Owner field read back as text
    pub fn identifier(&self) -> String {
        String::from_utf8_lossy(&self.owner).into_owned()
    }
}

impl From<SimpleDatum> for PlutusData {
    fn from(datum: SimpleDatum) -> Self {
        PlutusData::constr(0, vec![PlutusData::bytes(datum.owner), ().into()])
    }
}

impl TryFrom<PlutusData> for SimpleDatum {
    type Error = PlutusDataError;

    fn try_from(data: PlutusData) -> Result<Self, Self::Error> {
        let fields = data.expect_constr(0)?;
        let [owner, nested]: [PlutusData; 2] = fields
            .try_into()
            .map_err(|fields| PlutusDataError::UnexpectedShape {
                expected: "constructor 0 with two fields".to_string(),
                found: PlutusData::Array(fields),
            })?;
        let owner = owner.expect_bytes()?;
        <()>::try_from(nested)?;
        Ok(SimpleDatum { owner })
    }
}

/// Trivial redeemer: `Constr 0 [Constr 0 []]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimpleRedeemer;

impl From<SimpleRedeemer> for PlutusData {
    fn from(_: SimpleRedeemer) -> Self {
        PlutusData::constr(0, vec![().into()])
    }
}

impl TryFrom<PlutusData> for SimpleRedeemer {
    type Error = PlutusDataError;

    fn try_from(data: PlutusData) -> Result<Self, Self::Error> {
        let [nested]: [PlutusData; 1] =
            data.expect_constr(0)?
                .try_into()
                .map_err(|fields| PlutusDataError::UnexpectedShape {
                    expected: "constructor 0 with one field".to_string(),
                    found: PlutusData::Array(fields),
                })?;
        <()>::try_from(nested)?;
        Ok(SimpleRedeemer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datum_encoding_is_fixed() {
        let data: PlutusData = SimpleDatum::new("12345678").into();

        assert_eq!(
            data.to_cbor_hex().unwrap(),
            "d8799f483132333435363738d87980ff"
        );
    }

    #[test]
    fn second_datum_encoding_is_fixed() {
        let data: PlutusData = SimpleDatum::new("987654321").into();

        assert_eq!(
            data.to_cbor_hex().unwrap(),
            "d8799f49393837363534333231d87980ff"
        );
    }

    #[test]
    fn redeemer_encoding_is_fixed() {
        let data: PlutusData = SimpleRedeemer.into();

        assert_eq!(data.to_cbor_hex().unwrap(), "d8799fd87980ff");
    }

    #[test]
    fn datum_decodes_from_cbor() {
        let data = PlutusData::from_cbor_hex("d8799f483132333435363738d87980ff").unwrap();

        let datum = SimpleDatum::try_from(data).unwrap();

        assert_eq!(datum.identifier(), "12345678");
    }

    #[test]
    fn redeemer_is_not_a_datum() {
        let data: PlutusData = SimpleRedeemer.into();

        assert!(SimpleDatum::try_from(data).is_err());
    }

    #[test]
    fn datum_with_non_unit_tail_is_rejected() {
        let data = PlutusData::constr(
            0,
            vec![PlutusData::bytes(b"abc".to_vec()), PlutusData::from(7i64)],
        );

        assert!(SimpleDatum::try_from(data).is_err());
    }
}
