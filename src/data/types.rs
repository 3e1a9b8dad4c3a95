use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types a value can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExprType {
    Integer,
    Long,
    Float,
    Double,
    String,
    Boolean,
    Date,
    Time,
    Datetime,
    Timestamp,
    Struct,
    Array,
    Null,
    Undefined,
}

impl ExprType {
    /// Every type, in declaration order
    pub const ALL: [ExprType; 14] = [
        ExprType::Integer,
        ExprType::Long,
        ExprType::Float,
        ExprType::Double,
        ExprType::String,
        ExprType::Boolean,
        ExprType::Date,
        ExprType::Time,
        ExprType::Datetime,
        ExprType::Timestamp,
        ExprType::Struct,
        ExprType::Array,
        ExprType::Null,
        ExprType::Undefined,
    ];

    /// Numeric types ordered by the widening chain INTEGER -> LONG -> FLOAT -> DOUBLE
    pub const NUMBERS: [ExprType; 4] = [
        ExprType::Integer,
        ExprType::Long,
        ExprType::Float,
        ExprType::Double,
    ];

    /// Scalar types a column or literal can be declared with
    pub const SCALARS: [ExprType; 10] = [
        ExprType::Integer,
        ExprType::Long,
        ExprType::Float,
        ExprType::Double,
        ExprType::String,
        ExprType::Boolean,
        ExprType::Date,
        ExprType::Time,
        ExprType::Datetime,
        ExprType::Timestamp,
    ];

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ExprType::Date | ExprType::Time | ExprType::Datetime | ExprType::Timestamp
        )
    }

    fn numeric_rank(&self) -> Option<u32> {
        match self {
            ExprType::Integer => Some(0),
            ExprType::Long => Some(1),
            ExprType::Float => Some(2),
            ExprType::Double => Some(3),
            _ => None,
        }
    }

    /// Number of widening steps needed to pass a value of this type where
    /// `target` is expected, or `None` if no implicit conversion exists.
    ///
    /// Numeric types widen along INTEGER -> LONG -> FLOAT -> DOUBLE, one step
    /// per link. Every other concrete type only widens to itself. The type of
    /// an untyped NULL literal (`Null`/`Undefined`) converts to anything; its
    /// cost grows with the target's position in [`ExprType::ALL`], so distinct
    /// targets never cost the same and INTEGER is the cheapest.
    pub fn widening_distance(&self, target: ExprType) -> Option<u32> {
        if *self == target {
            return Some(0);
        }
        match (self, target) {
            (ExprType::Null | ExprType::Undefined, _) => Some(1 + target as u32),
            _ => match (self.numeric_rank(), target.numeric_rank()) {
                (Some(from), Some(to)) if from < to => Some(to - from),
                _ => None,
            },
        }
    }

    /// Check whether a value of this type can be passed where `target` is expected
    pub fn widens_to(&self, target: ExprType) -> bool {
        self.widening_distance(target).is_some()
    }

    /// Get the display name of this type
    pub fn name(&self) -> &'static str {
        match self {
            ExprType::Integer => "INTEGER",
            ExprType::Long => "LONG",
            ExprType::Float => "FLOAT",
            ExprType::Double => "DOUBLE",
            ExprType::String => "STRING",
            ExprType::Boolean => "BOOLEAN",
            ExprType::Date => "DATE",
            ExprType::Time => "TIME",
            ExprType::Datetime => "DATETIME",
            ExprType::Timestamp => "TIMESTAMP",
            ExprType::Struct => "STRUCT",
            ExprType::Array => "ARRAY",
            ExprType::Null => "NULL",
            ExprType::Undefined => "UNDEFINED",
        }
    }

    /// Parse a type name, case-insensitively
    pub fn parse(name: &str) -> Result<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match ExprType::ALL.iter().find(|ty| ty.name() == upper) {
            Some(ty) => Ok(*ty),
            None => bail!("Unknown type: {}", name),
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening_chain() {
        assert_eq!(ExprType::Integer.widening_distance(ExprType::Integer), Some(0));
        assert_eq!(ExprType::Integer.widening_distance(ExprType::Long), Some(1));
        assert_eq!(ExprType::Integer.widening_distance(ExprType::Float), Some(2));
        assert_eq!(ExprType::Integer.widening_distance(ExprType::Double), Some(3));
        assert_eq!(ExprType::Float.widening_distance(ExprType::Double), Some(1));

        // Never narrows
        assert_eq!(ExprType::Double.widening_distance(ExprType::Long), None);
        assert_eq!(ExprType::Long.widening_distance(ExprType::Integer), None);
    }

    #[test]
    fn test_non_numeric_types_only_widen_to_themselves() {
        for ty in [
            ExprType::String,
            ExprType::Boolean,
            ExprType::Date,
            ExprType::Time,
            ExprType::Datetime,
            ExprType::Timestamp,
        ] {
            for target in ExprType::SCALARS {
                assert_eq!(ty.widens_to(target), ty == target, "{} -> {}", ty, target);
            }
        }
        assert!(!ExprType::Integer.widens_to(ExprType::String));
        assert!(!ExprType::Date.widens_to(ExprType::Datetime));
    }

    #[test]
    fn test_null_type_prefers_narrowest_number() {
        let to_int = ExprType::Undefined.widening_distance(ExprType::Integer);
        let to_double = ExprType::Undefined.widening_distance(ExprType::Double);
        let to_string = ExprType::Undefined.widening_distance(ExprType::String);
        assert!(to_int < to_double);
        assert!(to_double < to_string);
        assert!(ExprType::Null.widens_to(ExprType::Date));
    }

    #[test]
    fn test_parse_type_names() -> Result<()> {
        assert_eq!(ExprType::parse("integer")?, ExprType::Integer);
        assert_eq!(ExprType::parse(" Timestamp ")?, ExprType::Timestamp);
        assert!(ExprType::parse("varchar").is_err());
        assert_eq!(ExprType::Datetime.to_string(), "DATETIME");
        Ok(())
    }
}
