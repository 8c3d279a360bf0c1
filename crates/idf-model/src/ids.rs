//! Row identifiers
//!
//! Every table uses a serial integer key. Path segments arrive as strings, so
//! each id also parses from text: digits only, no sign, strictly positive and
//! within `i32`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Failure to read an id out of a path segment or body field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// Empty input
    #[error("empty id")]
    Empty,

    /// Something other than ASCII digits
    #[error("id contains non-digit characters: '{0}'")]
    NotDigits(String),

    /// Zero is never issued by a serial column
    #[error("id must be positive")]
    Zero,

    /// Does not fit the column type
    #[error("id out of range: '{0}'")]
    OutOfRange(String),
}

fn parse_positive(input: &str) -> Result<i32, IdParseError> {
    if input.is_empty() {
        return Err(IdParseError::Empty);
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdParseError::NotDigits(input.to_string()));
    }
    let value: i32 = input
        .parse()
        .map_err(|_| IdParseError::OutOfRange(input.to_string()))?;
    if value == 0 {
        return Err(IdParseError::Zero);
    }
    Ok(value)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Raw column value
            #[inline]
            #[must_use]
            pub fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_positive(s).map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Workspace primary key
    WorkspaceId
);
define_id!(
    /// View primary key
    ViewId
);
define_id!(
    /// User visualisation primary key
    UserVisId
);
define_id!(
    /// Location primary key
    LocationId
);
define_id!(
    /// Measurement primary key
    MeasurementId
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_plain_digits() {
        assert_eq!("42".parse::<WorkspaceId>(), Ok(WorkspaceId(42)));
        assert_eq!("007".parse::<ViewId>(), Ok(ViewId(7)));
    }

    #[test]
    fn rejects_signs_and_whitespace() {
        assert!(matches!("-1".parse::<WorkspaceId>(), Err(IdParseError::NotDigits(_))));
        assert!(matches!("+1".parse::<WorkspaceId>(), Err(IdParseError::NotDigits(_))));
        assert!(matches!(" 1".parse::<WorkspaceId>(), Err(IdParseError::NotDigits(_))));
        assert!(matches!("1.0".parse::<WorkspaceId>(), Err(IdParseError::NotDigits(_))));
    }

    #[test]
    fn rejects_zero_and_empty() {
        assert_eq!("0".parse::<UserVisId>(), Err(IdParseError::Zero));
        assert_eq!("000".parse::<UserVisId>(), Err(IdParseError::Zero));
        assert_eq!("".parse::<UserVisId>(), Err(IdParseError::Empty));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            "2147483648".parse::<LocationId>(),
            Err(IdParseError::OutOfRange(_))
        ));
        assert_eq!("2147483647".parse::<LocationId>(), Ok(LocationId(i32::MAX)));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&MeasurementId(9)).unwrap();
        assert_eq!(json, "9");
    }

    proptest! {
        #[test]
        fn prop_positive_ints_roundtrip(n in 1..=i32::MAX) {
            let parsed: WorkspaceId = n.to_string().parse().unwrap();
            prop_assert_eq!(parsed, WorkspaceId(n));
        }

        #[test]
        fn prop_non_digit_input_rejected(s in "[a-zA-Z_ -]{1,12}") {
            prop_assert!(s.parse::<WorkspaceId>().is_err());
        }
    }
}
