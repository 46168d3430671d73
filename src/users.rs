//! User registry for HTTP Basic authentication.
//!
//! The registry is read once at startup from a JSON users file and never
//! mutated afterwards; request handlers share it behind an `Arc`.
//!
//! ```json
//! [
//!   { "userName": "admin", "password": "s3cret", "accessLevel": "all" },
//!   { "userName": "alice", "password": "pw", "accessLevel": { "allow": ["vacation"] } },
//!   { "userName": "bob",   "password": "pw", "accessLevel": { "deny": ["work/hr"] } }
//! ]
//! ```
//!
//! `accessLevel` is either the string `"all"` or an object with optional
//! `allow`/`deny` lists. Any other value, or a missing field, grants nothing.

use crate::access::{AccessPolicy, AccessProfile};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read users file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse users file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate user '{0}' in users file")]
    DuplicateUser(String),
}

/// One record of the users file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
}

/// Raw `accessLevel` value before it is resolved to an [`AccessProfile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccessLevel {
    Named(String),
    Policy(AccessPolicy),
    Other(serde_json::Value),
}

impl AccessLevel {
    pub fn to_profile(&self) -> AccessProfile {
        match self {
            AccessLevel::Named(name) if name == "all" => AccessProfile::All,
            AccessLevel::Policy(policy) => AccessProfile::Policy(policy.clone()),
            AccessLevel::Named(_) | AccessLevel::Other(_) => AccessProfile::None,
        }
    }
}

#[derive(Debug, Clone)]
struct UserEntry {
    password_digest: [u8; 32],
    profile: AccessProfile,
}

/// Immutable identity → credentials/profile table.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: HashMap<String, UserEntry>,
}

impl UserRegistry {
    /// Load and parse a users file. Any failure is fatal to startup.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<UserRecord> =
            serde_json::from_str(&content).map_err(|source| RegistryError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<UserRecord>) -> Result<Self, RegistryError> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            let profile = record
                .access_level
                .as_ref()
                .map(AccessLevel::to_profile)
                .unwrap_or(AccessProfile::None);
            let entry = UserEntry {
                password_digest: digest(&record.password),
                profile,
            };
            if users.insert(record.user_name.clone(), entry).is_some() {
                return Err(RegistryError::DuplicateUser(record.user_name));
            }
        }
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Sorted user names, for diagnostics.
    pub fn user_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check a username/password pair.
    ///
    /// Unknown users still pay for a digest comparison so response timing
    /// does not reveal which names exist.
    pub fn verify(&self, user: &str, password: &str) -> bool {
        let supplied = digest(password);
        match self.users.get(user) {
            Some(entry) => constant_time_eq(&entry.password_digest, &supplied),
            None => {
                let _ = constant_time_eq(&[0u8; 32], &supplied);
                false
            }
        }
    }

    /// Profile for an identity; unknown identities get [`AccessProfile::None`].
    pub fn profile_for(&self, user: &str) -> AccessProfile {
        self.users
            .get(user)
            .map(|e| e.profile.clone())
            .unwrap_or(AccessProfile::None)
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
