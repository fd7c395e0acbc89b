//! Driver-reported SQL type codes.
//!
//! Drivers report column types as integer codes from an open set (the
//! standard codes plus vendor extensions). [`SqlType`] wraps the raw code
//! so unknown vendor codes survive unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A driver type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlType(pub i32);

impl SqlType {
    pub const BIT: SqlType = SqlType(-7);
    pub const TINYINT: SqlType = SqlType(-6);
    pub const SMALLINT: SqlType = SqlType(5);
    pub const INTEGER: SqlType = SqlType(4);
    pub const BIGINT: SqlType = SqlType(-5);
    pub const FLOAT: SqlType = SqlType(6);
    pub const REAL: SqlType = SqlType(7);
    pub const DOUBLE: SqlType = SqlType(8);
    pub const NUMERIC: SqlType = SqlType(2);
    pub const DECIMAL: SqlType = SqlType(3);
    pub const CHAR: SqlType = SqlType(1);
    pub const VARCHAR: SqlType = SqlType(12);
    pub const LONGVARCHAR: SqlType = SqlType(-1);
    pub const DATE: SqlType = SqlType(91);
    pub const TIME: SqlType = SqlType(92);
    pub const TIMESTAMP: SqlType = SqlType(93);
    pub const BINARY: SqlType = SqlType(-2);
    pub const VARBINARY: SqlType = SqlType(-3);
    pub const LONGVARBINARY: SqlType = SqlType(-4);
    pub const NULL: SqlType = SqlType(0);
    pub const OTHER: SqlType = SqlType(1111);
    pub const JAVA_OBJECT: SqlType = SqlType(2000);
    pub const DISTINCT: SqlType = SqlType(2001);
    pub const STRUCT: SqlType = SqlType(2002);
    pub const ARRAY: SqlType = SqlType(2003);
    pub const BLOB: SqlType = SqlType(2004);
    pub const CLOB: SqlType = SqlType(2005);
    pub const REF: SqlType = SqlType(2006);
    pub const BOOLEAN: SqlType = SqlType(16);
    pub const ROWID: SqlType = SqlType(-8);
    pub const NCHAR: SqlType = SqlType(-15);
    pub const NVARCHAR: SqlType = SqlType(-9);
    pub const LONGNVARCHAR: SqlType = SqlType(-16);
    pub const NCLOB: SqlType = SqlType(2011);
    pub const SQLXML: SqlType = SqlType(2009);
    pub const TIME_WITH_TIMEZONE: SqlType = SqlType(2013);
    pub const TIMESTAMP_WITH_TIMEZONE: SqlType = SqlType(2014);

    /// Raw driver code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Whether the column holds raw byte payloads.
    ///
    /// This is the binary-kind set used for `has_binary` and for wrapping
    /// values in [`BinaryData`](crate::types::BinaryData).
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self.0, 2004 | -2 | -3 | -4)
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self.0, -6 | 5 | 4 | -5)
    }

    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self.0, 6 | 7 | 8)
    }

    #[must_use]
    pub const fn is_decimal(self) -> bool {
        matches!(self.0, 2 | 3)
    }

    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self.0, -7 | 16)
    }

    /// Character and character-large-object types.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(self.0, 1 | 12 | -1 | -15 | -9 | -16 | 2005 | 2011 | 2009 | -8)
    }

    #[must_use]
    pub const fn is_timestamp(self) -> bool {
        matches!(self.0, 93 | 2014)
    }

    #[must_use]
    pub const fn is_time(self) -> bool {
        matches!(self.0, 92 | 2013)
    }

    /// Standard name of the type code, if it is one of the standard codes.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::BIT => "BIT",
            Self::TINYINT => "TINYINT",
            Self::SMALLINT => "SMALLINT",
            Self::INTEGER => "INTEGER",
            Self::BIGINT => "BIGINT",
            Self::FLOAT => "FLOAT",
            Self::REAL => "REAL",
            Self::DOUBLE => "DOUBLE",
            Self::NUMERIC => "NUMERIC",
            Self::DECIMAL => "DECIMAL",
            Self::CHAR => "CHAR",
            Self::VARCHAR => "VARCHAR",
            Self::LONGVARCHAR => "LONGVARCHAR",
            Self::DATE => "DATE",
            Self::TIME => "TIME",
            Self::TIMESTAMP => "TIMESTAMP",
            Self::BINARY => "BINARY",
            Self::VARBINARY => "VARBINARY",
            Self::LONGVARBINARY => "LONGVARBINARY",
            Self::NULL => "NULL",
            Self::OTHER => "OTHER",
            Self::JAVA_OBJECT => "JAVA_OBJECT",
            Self::DISTINCT => "DISTINCT",
            Self::STRUCT => "STRUCT",
            Self::ARRAY => "ARRAY",
            Self::BLOB => "BLOB",
            Self::CLOB => "CLOB",
            Self::REF => "REF",
            Self::BOOLEAN => "BOOLEAN",
            Self::ROWID => "ROWID",
            Self::NCHAR => "NCHAR",
            Self::NVARCHAR => "NVARCHAR",
            Self::LONGNVARCHAR => "LONGNVARCHAR",
            Self::NCLOB => "NCLOB",
            Self::SQLXML => "SQLXML",
            Self::TIME_WITH_TIMEZONE => "TIME_WITH_TIMEZONE",
            Self::TIMESTAMP_WITH_TIMEZONE => "TIMESTAMP_WITH_TIMEZONE",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<i32> for SqlType {
    fn from(code: i32) -> Self {
        SqlType(code)
    }
}
