//! The three model variants and their fixed feature layouts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the three independently trained model configurations.
///
/// - `A`: stage + region → disease (with confidence when available)
/// - `B`: stage + region → disease and cause (two classifiers)
/// - `C`: stage + region + cause → disease (with confidence when available)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
    C,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown model variant: {0:?} (expected A, B, or C)")]
pub struct ParseVariantError(pub String);

impl Variant {
    /// Every known variant, in load order.
    pub const ALL: [Variant; 3] = [Variant::A, Variant::B, Variant::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Position in [`Variant::ALL`], usable as a fixed slot index.
    pub fn index(&self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Names of the input features, in feature-vector order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            Self::A | Self::B => &["stage", "region"],
            Self::C => &["stage", "region", "cause"],
        }
    }

    /// Width of the feature vector the variant's classifiers expect.
    pub fn feature_count(&self) -> usize {
        self.feature_names().len()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            other => Err(ParseVariantError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_layouts() {
        assert_eq!(Variant::A.feature_names(), &["stage", "region"]);
        assert_eq!(Variant::B.feature_count(), 2);
        assert_eq!(Variant::C.feature_names(), &["stage", "region", "cause"]);
    }

    #[test]
    fn indices_follow_load_order() {
        for (i, v) in Variant::ALL.iter().enumerate() {
            assert_eq!(v.index(), i);
        }
    }

    #[test]
    fn parse_accepts_either_case() {
        assert_eq!("a".parse::<Variant>(), Ok(Variant::A));
        assert_eq!(" C ".parse::<Variant>(), Ok(Variant::C));
        assert!("D".parse::<Variant>().is_err());
    }

    #[test]
    fn serializes_as_bare_letter() {
        assert_eq!(serde_json::to_string(&Variant::B).unwrap(), "\"B\"");
    }
}
