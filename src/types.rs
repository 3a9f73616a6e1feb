//! Closed vocabularies for column types.
//!
//! [`RawType`] is the primitive type the decoding layer observes for a loaded
//! column; [`StorageType`] is the type a relational storage engine declares
//! for it. Both are closed enumerations, so every mapping over them is checked
//! for exhaustiveness at compile time.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageType {
    String,
    Unicode,
    DateTime,
    Integer,
    Float,
    Numeric,
    Boolean,
}

impl StorageType {
    /// Every storage type, in the order the interactive resolver lists them.
    pub const ALL: [StorageType; 7] = [
        StorageType::String,
        StorageType::Unicode,
        StorageType::DateTime,
        StorageType::Integer,
        StorageType::Float,
        StorageType::Numeric,
        StorageType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::String => "String",
            StorageType::Unicode => "Unicode",
            StorageType::DateTime => "DateTime",
            StorageType::Integer => "Integer",
            StorageType::Float => "Float",
            StorageType::Numeric => "Numeric",
            StorageType::Boolean => "Boolean",
        }
    }

    /// SQL column type used when rendering `CREATE TABLE` statements.
    pub fn sql_type(&self) -> &'static str {
        match self {
            StorageType::String => "VARCHAR",
            StorageType::Unicode => "NVARCHAR",
            StorageType::DateTime => "TIMESTAMP",
            StorageType::Integer => "INTEGER",
            StorageType::Float => "FLOAT",
            StorageType::Numeric => "NUMERIC",
            StorageType::Boolean => "BOOLEAN",
        }
    }

    pub fn variants() -> Vec<&'static str> {
        Self::ALL.iter().map(StorageType::as_str).collect()
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StorageType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == value.trim())
            .ok_or_else(|| SchemaError::UnknownStorageType {
                tag: value.to_string(),
            })
    }
}

impl Serialize for StorageType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StorageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        StorageType::from_str(&token).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawType {
    Boolean,
    DateTime,
    Duration,
    Integer,
    Float,
    Categorical,
    Object,
}

impl RawType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawType::Boolean => "boolean",
            RawType::DateTime => "datetime",
            RawType::Duration => "duration",
            RawType::Integer => "integer",
            RawType::Float => "float",
            RawType::Categorical => "categorical",
            RawType::Object => "object",
        }
    }

    /// Default storage type for a column observed with this raw type.
    pub fn default_storage_type(&self) -> StorageType {
        match self {
            RawType::Boolean => StorageType::Boolean,
            RawType::DateTime | RawType::Duration => StorageType::DateTime,
            RawType::Integer => StorageType::Integer,
            RawType::Float => StorageType::Float,
            RawType::Categorical | RawType::Object => StorageType::String,
        }
    }

    /// Parses a raw tag for `column`, reporting unknown tags against that column.
    pub fn parse_for_column(column: &str, tag: &str) -> Result<Self, SchemaError> {
        RawType::from_str(tag).map_err(|_| SchemaError::UnsupportedRawType {
            column: column.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RawType {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "boolean" | "bool" => Ok(RawType::Boolean),
            "datetime" | "datetime64" | "datetime64[ns]" => Ok(RawType::DateTime),
            "duration" | "timedelta" | "timedelta64" | "timedelta64[ns]" => Ok(RawType::Duration),
            "integer" | "int64" => Ok(RawType::Integer),
            "float" | "float64" => Ok(RawType::Float),
            "categorical" | "category" => Ok(RawType::Categorical),
            "object" | "generic-object" => Ok(RawType::Object),
            _ => Err(SchemaError::UnsupportedRawType {
                column: String::new(),
                tag: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_every_raw_type() {
        let expected = [
            (RawType::Boolean, StorageType::Boolean),
            (RawType::DateTime, StorageType::DateTime),
            (RawType::Duration, StorageType::DateTime),
            (RawType::Integer, StorageType::Integer),
            (RawType::Float, StorageType::Float),
            (RawType::Categorical, StorageType::String),
            (RawType::Object, StorageType::String),
        ];
        for (raw, storage) in expected {
            assert_eq!(raw.default_storage_type(), storage, "raw type {raw}");
        }
    }

    #[test]
    fn raw_type_accepts_columnar_library_spellings() {
        assert_eq!(RawType::from_str("int64").unwrap(), RawType::Integer);
        assert_eq!(RawType::from_str("timedelta64").unwrap(), RawType::Duration);
        assert_eq!(RawType::from_str("category").unwrap(), RawType::Categorical);
        assert_eq!(RawType::from_str("generic-object").unwrap(), RawType::Object);
    }

    #[test]
    fn unknown_raw_tag_names_the_column() {
        let err = RawType::parse_for_column("Amount", "complex128").unwrap_err();
        match err {
            SchemaError::UnsupportedRawType { column, tag } => {
                assert_eq!(column, "Amount");
                assert_eq!(tag, "complex128");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn storage_type_tags_are_case_sensitive() {
        assert_eq!(StorageType::from_str("Numeric").unwrap(), StorageType::Numeric);
        assert!(StorageType::from_str("numeric").is_err());
    }

    #[test]
    fn storage_type_serializes_as_bare_tag() {
        let json = serde_json::to_string(&StorageType::DateTime).unwrap();
        assert_eq!(json, "\"DateTime\"");
        let parsed: StorageType = serde_json::from_str("\"Unicode\"").unwrap();
        assert_eq!(parsed, StorageType::Unicode);
        assert!(serde_json::from_str::<StorageType>("\"Text\"").is_err());
    }
}
