use crate::error::RotateKeyError;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde_derive::{Deserialize, Serialize};

/// Access level granted by an SNMP community.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Permission {
    #[default]
    #[serde(rename = "ro", alias = "RO")]
    ReadOnly,
    #[serde(rename = "rw", alias = "RW")]
    ReadWrite,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadOnly => "ro",
            Permission::ReadWrite => "rw",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = RotateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ro" => Ok(Permission::ReadOnly),
            "rw" => Ok(Permission::ReadWrite),
            _ => Err(RotateKeyError::UnknownPermission(s.to_string())),
        }
    }
}

/// A community string configured on a device.
///
/// Devices without an explicit permission on an entry treat it as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Community {
    pub name: String,
    #[serde(default)]
    pub permission: Permission,
}

impl Community {
    pub fn new(name: impl Into<String>, permission: Permission) -> Community {
        Community {
            name: name.into(),
            permission,
        }
    }
}

/// Community names travel verbatim into CLI lines and RESTCONF keys; one
/// with whitespace or control characters would address something else.
pub fn check_name(name: &str) -> Result<(), RotateKeyError> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(RotateKeyError::InvalidCommunityName(name.to_string()));
    }
    Ok(())
}

/// Outcome of a mutating backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success,
    Failure(String),
}

impl OperationResult {
    /// Builds a failure, substituting a generic reason if `reason` is blank
    /// so a failure never reaches a report without one.
    pub fn failure(reason: impl Into<String>) -> OperationResult {
        let reason = reason.into();
        if reason.trim().is_empty() {
            OperationResult::Failure("unknown error".to_string())
        } else {
            OperationResult::Failure(reason)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            OperationResult::Success => None,
            OperationResult::Failure(reason) => Some(reason),
        }
    }
}

impl<E: Display> From<Result<(), E>> for OperationResult {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => OperationResult::Success,
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }
}

impl Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Success => write!(f, "success"),
            OperationResult::Failure(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::from_str("RO").unwrap(), Permission::ReadOnly);
        assert_eq!(Permission::from_str("rw").unwrap(), Permission::ReadWrite);
        assert!(Permission::from_str("view").is_err());
        assert_eq!(Permission::ReadWrite.to_string(), "rw");
    }

    #[test]
    fn test_community_json() {
        let entries: Vec<Community> = serde_json::from_str(
            r#"[{"name": "public", "permission": "ro"}, {"name": "private", "permission": "rw"}, {"name": "legacy"}]"#,
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![
                Community::new("public", Permission::ReadOnly),
                Community::new("private", Permission::ReadWrite),
                Community::new("legacy", Permission::ReadOnly),
            ]
        );
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("pub1").is_ok());
        assert!(check_name("p@ss,w=rd").is_ok());
        for name in ["", "a b", "a\tb", "pub1\nsnmp-server community x rw", "x\u{7f}"] {
            assert!(
                matches!(check_name(name), Err(RotateKeyError::InvalidCommunityName(_))),
                "{:?} accepted",
                name
            );
        }
    }

    #[test]
    fn test_failure_never_blank() {
        assert_eq!(
            OperationResult::failure(""),
            OperationResult::Failure("unknown error".to_string())
        );
        let result: OperationResult = Err::<(), _>("boom").into();
        assert_eq!(result.reason(), Some("boom"));
        assert!(!result.is_success());
    }
}
