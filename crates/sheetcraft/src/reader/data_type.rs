//! Declared column types for typed reads

use std::fmt;
use std::str::FromStr;

use crate::error::ExcelIoError;

/// The type a column's cells are converted to.
///
/// Parses from a short name (`i32`, `decimal`, ...) or the equivalent
/// Java class name (`java.lang.Integer`, `java.math.BigDecimal`, ...) so
/// metadata sheets written for JVM tooling load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Boolean,
    Integer,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        DataType::String,
        DataType::Boolean,
        DataType::Integer,
        DataType::Long,
        DataType::Short,
        DataType::Byte,
        DataType::Float,
        DataType::Double,
        DataType::Decimal,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Boolean => "bool",
            DataType::Integer => "i32",
            DataType::Long => "i64",
            DataType::Short => "i16",
            DataType::Byte => "i8",
            DataType::Float => "f32",
            DataType::Double => "f64",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "datetime",
        }
    }

    pub fn java_name(&self) -> &'static str {
        match self {
            DataType::String => "java.lang.String",
            DataType::Boolean => "java.lang.Boolean",
            DataType::Integer => "java.lang.Integer",
            DataType::Long => "java.lang.Long",
            DataType::Short => "java.lang.Short",
            DataType::Byte => "java.lang.Byte",
            DataType::Float => "java.lang.Float",
            DataType::Double => "java.lang.Double",
            DataType::Decimal => "java.math.BigDecimal",
            DataType::Date => "java.time.LocalDate",
            DataType::Time => "java.time.LocalTime",
            DataType::DateTime => "java.time.LocalDateTime",
        }
    }

    fn supported() -> String {
        DataType::ALL
            .iter()
            .map(|t| format!("{} ({})", t.name(), t.java_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = ExcelIoError;

    /// Surrounding whitespace is ignored; names are case-sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        DataType::ALL
            .into_iter()
            .find(|t| t.name() == name || t.java_name() == name)
            .ok_or_else(|| {
                ExcelIoError::new(format!(
                    "Unsupported data type: '{}'. Supported types are: {}",
                    name,
                    DataType::supported()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_java_names() {
        assert_eq!("i32".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!(
            " java.math.BigDecimal ".parse::<DataType>().unwrap(),
            DataType::Decimal
        );
        assert_eq!(
            "java.time.LocalDateTime".parse::<DataType>().unwrap(),
            DataType::DateTime
        );
        for t in DataType::ALL {
            assert_eq!(t.name().parse::<DataType>().unwrap(), t);
            assert_eq!(t.java_name().parse::<DataType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unsupported_lists_every_type() {
        let err = "java.util.UUID".parse::<DataType>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Unsupported data type: 'java.util.UUID'. Supported types are: "));
        assert!(msg.contains("string (java.lang.String)"));
        assert!(msg.ends_with("datetime (java.time.LocalDateTime)"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!("I32".parse::<DataType>().is_err());
        assert!("java.lang.integer".parse::<DataType>().is_err());
    }
}
