use pallas_addresses::{
    Address, Network, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
};
use pallas_crypto::hash::Hash;
use rand::Rng;

/// Length in bytes of payment key hashes and script hashes
pub const HASH_28_LEN: usize = 28;

/// Payment key hash of an address, if its payment part is a key
pub fn pub_key_hash_from_address_if_available(address: &Address) -> Option<Vec<u8>> {
    match address {
        Address::Shelley(shelley) => match shelley.payment() {
            ShelleyPaymentPart::Key(hash) => Some(hash.to_vec()),
            ShelleyPaymentPart::Script(_) => None,
        },
        _ => None,
    }
}

/// Script hash of an address, if its payment part is a script
pub fn script_hash_from_address_if_available(address: &Address) -> Option<Vec<u8>> {
    match address {
        Address::Shelley(shelley) => match shelley.payment() {
            ShelleyPaymentPart::Script(hash) => Some(hash.to_vec()),
            ShelleyPaymentPart::Key(_) => None,
        },
        _ => None,
    }
}

/// Enterprise (no stake part) address locked by the script with `script_hash`
pub fn enterprise_script_address(script_hash: &[u8], network: Network) -> Option<Address> {
    let hash = hash_28(script_hash)?;
    let shelley = ShelleyAddress::new(
        network,
        ShelleyPaymentPart::Script(hash),
        ShelleyDelegationPart::Null,
    );
    Some(Address::Shelley(shelley))
}

/// Base address for a payment key hash and stake key hash
pub fn base_key_address(
    payment_hash: &[u8],
    stake_hash: &[u8],
    network: Network,
) -> Option<Address> {
    let payment = hash_28(payment_hash)?;
    let stake = hash_28(stake_hash)?;
    let shelley = ShelleyAddress::new(
        network,
        ShelleyPaymentPart::Key(payment),
        ShelleyDelegationPart::Key(stake),
    );
    Some(Address::Shelley(shelley))
}

/// Fresh base address with random key hashes. Only good for mocked ledgers.
pub fn random_base_address(network: Network) -> Address {
    let mut rng = rand::thread_rng();
    let payment: [u8; HASH_28_LEN] = rng.gen();
    let stake: [u8; HASH_28_LEN] = rng.gen();
    let shelley = ShelleyAddress::new(
        network,
        ShelleyPaymentPart::Key(Hash::new(payment)),
        ShelleyDelegationPart::Key(Hash::new(stake)),
    );
    Address::Shelley(shelley)
}

fn hash_28(bytes: &[u8]) -> Option<Hash<HASH_28_LEN>> {
    let arr: [u8; HASH_28_LEN] = bytes.try_into().ok()?;
    Some(Hash::new(arr))
}

/// Serde adapter storing an [`Address`] as its bech32 string
pub mod bech32_serde {
    use pallas_addresses::Address;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    /// Serialize as bech32
    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        let bech32 = address.to_bech32().map_err(ser::Error::custom)?;
        serializer.serialize_str(&bech32)
    }

    /// Deserialize from bech32
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let bech32 = String::deserialize(deserializer)?;
        Address::from_bech32(&bech32).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_address_round_trips_hash() {
        let hash = [7u8; HASH_28_LEN];
        let address = enterprise_script_address(&hash, Network::Testnet).unwrap();

        assert_eq!(script_hash_from_address_if_available(&address), Some(hash.to_vec()));
        assert_eq!(pub_key_hash_from_address_if_available(&address), None);
        assert!(address.to_bech32().unwrap().starts_with("addr_test"));
    }

    #[test]
    fn wrong_hash_length_is_rejected() {
        assert!(enterprise_script_address(&[1, 2, 3], Network::Testnet).is_none());
    }

    #[test]
    fn random_addresses_have_key_payment_part() {
        let address = random_base_address(Network::Testnet);
        let other = random_base_address(Network::Testnet);

        assert!(pub_key_hash_from_address_if_available(&address).is_some());
        assert_ne!(address, other);
    }
}
