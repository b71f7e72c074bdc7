//! File attributes as reported through the provider chain.
//!
//! Attributes travel as a name → value map so individual layers can add or
//! remove entries without knowing about the others.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

pub const SIZE: &str = "size";
pub const LAST_MODIFIED_TIME: &str = "lastModifiedTime";
pub const IS_DIRECTORY: &str = "isDirectory";
pub const IS_REGULAR_FILE: &str = "isRegularFile";
pub const E_TAG: &str = "eTag";
/// POSIX permission bits; object storage has no native notion of these
pub const PERMISSIONS: &str = "permissions";

pub type AttributeMap = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Size(u64),
    Time(DateTime<Utc>),
    Bool(bool),
    Text(String),
    Permissions(PosixPermissions),
}

impl AttributeValue {
    pub fn as_size(&self) -> Option<u64> {
        match self {
            AttributeValue::Size(size) => Some(*size),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Time(time) => Some(*time),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Size(size) => write!(f, "{}", size),
            AttributeValue::Time(time) => write!(f, "{}", time.to_rfc3339()),
            AttributeValue::Bool(value) => write!(f, "{}", value),
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::Permissions(perms) => write!(f, "{}", perms),
        }
    }
}

/// Owner/group/other read-write-execute bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosixPermissions(u32);

impl PosixPermissions {
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o777)
    }

    /// `rw-rw----`, reported for every object
    pub const fn owner_group_read_write() -> Self {
        Self(0o660)
    }

    pub fn mode(&self) -> u32 {
        self.0
    }
}

const FLAGS: [char; 3] = ['r', 'w', 'x'];

impl fmt::Display for PosixPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..9).rev() {
            let flag = FLAGS[(8 - bit) % 3];
            if self.0 & (1 << bit) != 0 {
                write!(f, "{}", flag)?;
            } else {
                f.write_str("-")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid permission string: {0}")]
pub struct PermissionsParseError(String);

impl FromStr for PosixPermissions {
    type Err = PermissionsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(PermissionsParseError(s.to_string()));
        }
        let mut mode = 0;
        for (i, c) in chars.iter().enumerate() {
            let bit = 8 - i;
            match *c {
                '-' => {}
                c if c == FLAGS[i % 3] => mode |= 1 << bit,
                _ => return Err(PermissionsParseError(s.to_string())),
            }
        }
        Ok(Self(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_display() {
        assert_eq!(PosixPermissions::owner_group_read_write().to_string(), "rw-rw----");
        assert_eq!(PosixPermissions::from_mode(0o755).to_string(), "rwxr-xr-x");
        assert_eq!(PosixPermissions::from_mode(0).to_string(), "---------");
    }

    #[test]
    fn test_permissions_parse() {
        let perms: PosixPermissions = "rw-rw----".parse().unwrap();
        assert_eq!(perms, PosixPermissions::owner_group_read_write());
        assert_eq!("rwxr-x--x".parse::<PosixPermissions>().unwrap().mode(), 0o751);
        assert!("rw-".parse::<PosixPermissions>().is_err());
        assert!("wr-rw----".parse::<PosixPermissions>().is_err());
    }
}
