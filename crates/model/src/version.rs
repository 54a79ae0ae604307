//! Bag version type.

use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A bag version.
///
/// Versions are positive integers rendered as `v{N}` both in the storage
/// service API and in the virtual directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BagVersion(NonZeroU32);

impl BagVersion {
    /// The first version of every bag.
    pub const FIRST: BagVersion = BagVersion(NonZeroU32::MIN);

    /// Create a version from its number.
    ///
    /// # Returns
    /// `None` for zero.
    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(BagVersion)
    }

    /// Get the version number.
    pub fn number(&self) -> u32 {
        self.0.get()
    }

    /// Iterate `v1..=latest` in numeric order.
    ///
    /// Versions are assumed to be dense; a backend with gaps in its version
    /// history will list versions that do not resolve.
    ///
    /// # Arguments
    /// * `latest` - Latest version reported for the bag
    pub fn up_to(latest: BagVersion) -> impl Iterator<Item = BagVersion> {
        (1..=latest.number()).filter_map(BagVersion::new)
    }

    /// Parse a `v{N}` directory name.
    ///
    /// # Arguments
    /// * `name` - Name such as `v3`
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        let digits: &str = name
            .strip_prefix('v')
            .ok_or_else(|| ModelError::InvalidVersion(name.to_string()))?;

        // `u32::from_str` accepts a leading '+', which would make "v+1" an alias of "v1".
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidVersion(name.to_string()));
        }

        digits
            .parse::<u32>()
            .ok()
            .and_then(BagVersion::new)
            .ok_or_else(|| ModelError::InvalidVersion(name.to_string()))
    }
}

impl std::fmt::Display for BagVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for BagVersion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BagVersion::parse(s)
    }
}

impl TryFrom<String> for BagVersion {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BagVersion::parse(&value)
    }
}

impl From<BagVersion> for String {
    fn from(version: BagVersion) -> Self {
        version.to_string()
    }
}
