//! Field wrapper for partial updates.
//!
//! `Option<T>` is not used for update requests because "not supplied" and
//! "supplied" must never be conflated, in particular for `events`, where a
//! supplied empty list clears the membership set.

use serde::{Deserialize, Deserializer};

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field absent from the request; the stored value is kept.
    Omitted,
    /// Field present; the stored value is replaced wholesale.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Omitted => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Set(value) => Patch::Set(f(value)),
            Self::Omitted => Patch::Omitted,
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Omitted
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Omitted, Self::Set)
    }
}

/// A present key always deserializes to `Set`; pair with `#[serde(default)]`
/// so a missing key becomes `Omitted`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::Patch;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default)]
        events: Patch<Vec<i64>>,
        #[serde(default)]
        pinned: Patch<bool>,
    }

    #[test]
    fn missing_key_is_omitted_and_empty_list_is_set() {
        let probe: Probe = serde_json::from_str(r#"{"events": []}"#).unwrap();
        assert_eq!(probe.events, Patch::Set(Vec::new()));
        assert_eq!(probe.pinned, Patch::Omitted);
    }

    #[test]
    fn option_conversion_keeps_presence() {
        assert_eq!(Patch::from(Some(true)), Patch::Set(true));
        assert_eq!(Patch::<bool>::from(None), Patch::Omitted);
        assert!(Patch::Set(1).map(|v| v + 1).is_set());
    }
}
