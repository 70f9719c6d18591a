use crate::{
    error::{Error, Result},
    output::Output,
    PolicyId,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap};

/// Domain representation of value on the Cardano blockchain
#[serde_with::serde_as]
#[derive(Clone, PartialEq, Debug, Eq, Deserialize, Serialize, Default)]
pub struct Values {
    #[serde_as(as = "HashMap<serde_with::json::JsonString, _>")]
    values: HashMap<PolicyId, u64>,
}

impl Values {
    /// `Values` holding only the given amount of Lovelace
    pub fn from_lovelace(amount: u64) -> Self {
        let mut values = Values::default();
        values.add_one_value(&PolicyId::Lovelace, amount);
        values
    }

    /// Construct a `Values` from a list of `Output`s
    pub fn from_outputs<D>(outputs: &[Output<D>]) -> Self {
        outputs.iter().fold(Values::default(), |mut acc, output| {
            acc.add_values(output.values());
            acc
        })
    }

    /// Try to remove the `other` `Values` from `self`. Policies that end up at zero are dropped
    /// from the result.
    pub fn try_subtract(&self, other: &Values) -> Result<Values> {
        let mut remaining = self.values.clone();
        for (policy, amt) in other.as_iter() {
            if *amt == 0 {
                continue;
            }
            let available = remaining
                .remove(policy)
                .ok_or_else(|| Error::InsufficientAmountOf(policy.to_owned()))?;
            match amt.cmp(&available) {
                Ordering::Less => {
                    remaining.insert(policy.clone(), available - amt);
                }
                Ordering::Equal => {}
                Ordering::Greater => return Err(Error::InsufficientAmountOf(policy.to_owned())),
            }
        }
        remaining.retain(|_, amt| *amt > 0);
        Ok(Values { values: remaining })
    }

    /// Add one value to the `self`
    pub fn add_one_value(&mut self, policy: &PolicyId, amount: u64) {
        add_to_map(&mut self.values, policy.clone(), amount)
    }

    /// Add a `Values` to the `self`
    pub fn add_values(&mut self, values: &Values) {
        for (policy, amt) in values.as_iter() {
            self.add_one_value(policy, *amt)
        }
    }

    /// Convert the `Values` to an iterator of [`PolicyId`]s and amounts
    pub fn as_iter(&self) -> std::collections::hash_map::Iter<'_, PolicyId, u64> {
        self.values.iter()
    }

    /// Convert the `Values` to a `Vec` of [`PolicyId`]s and amounts, sorted by policy
    pub fn vec(&self) -> Vec<(PolicyId, u64)> {
        let mut vec: Vec<_> = self.values.clone().into_iter().collect();
        vec.sort();
        vec
    }

    /// Get the amount for a given [`PolicyId`]
    pub fn get(&self, policy: &PolicyId) -> Option<u64> {
        self.values.get(policy).copied()
    }

    /// Amount of Lovelace, zero if none
    pub fn lovelace(&self) -> u64 {
        self.get(&PolicyId::Lovelace).unwrap_or_default()
    }

    /// True if there is nothing but Lovelace
    pub fn only_lovelace(&self) -> bool {
        self.values
            .iter()
            .all(|(policy, amt)| policy.is_lovelace() || *amt == 0)
    }

    /// Remove all values for a given [`PolicyId`] and return the amount
    pub fn take(&mut self, policy: &PolicyId) -> Option<u64> {
        self.values.remove(policy)
    }

    /// Get the number of [`PolicyId`]s in the `Values`
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the `Values` is empty
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|amt| *amt == 0)
    }
}

pub(crate) fn add_to_map(h_map: &mut HashMap<PolicyId, u64>, policy: PolicyId, amount: u64) {
    *h_map.entry(policy).or_insert(0) += amount;
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    fn token(name: &str) -> PolicyId {
        PolicyId::native_token("abcdef", &Some(name.to_string()))
    }

    #[test]
    fn try_subtract__leaves_remainder() {
        let mut mine = Values::from_lovelace(10_000_000);
        mine.add_one_value(&token("apple"), 5);
        let mut other = Values::from_lovelace(4_000_000);
        other.add_one_value(&token("apple"), 5);

        let remainder = mine.try_subtract(&other).unwrap();

        assert_eq!(remainder.lovelace(), 6_000_000);
        assert_eq!(remainder.get(&token("apple")), None);
        assert_eq!(remainder.len(), 1);
    }

    #[test]
    fn try_subtract__fails_when_short() {
        let mine = Values::from_lovelace(1_000_000);
        let other = Values::from_lovelace(1_000_001);

        let error = mine.try_subtract(&other).unwrap_err();

        assert!(matches!(error, Error::InsufficientAmountOf(PolicyId::Lovelace)));
    }

    #[test]
    fn try_subtract__fails_on_missing_token() {
        let mine = Values::from_lovelace(1_000_000);
        let mut other = Values::default();
        other.add_one_value(&token("pear"), 1);

        assert!(mine.try_subtract(&other).is_err());
    }

    #[test]
    fn only_lovelace__false_with_tokens() {
        let mut values = Values::from_lovelace(2_000_000);
        assert!(values.only_lovelace());
        values.add_one_value(&token("fig"), 1);
        assert!(!values.only_lovelace());
    }

    #[test]
    fn serializes_with_policy_keys() {
        let mut values = Values::from_lovelace(3);
        values.add_one_value(&token("kiwi"), 7);

        let json = serde_json::to_string(&values).unwrap();
        let back: Values = serde_json::from_str(&json).unwrap();

        assert_eq!(values, back);
    }
}
