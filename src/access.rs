//! Path-based access policies.
//!
//! Every identity maps to an [`AccessProfile`]: unrestricted, a structured
//! allow/deny policy, or nothing at all. [`PolicyEvaluator::is_allowed`] answers
//! whether a [`ResourcePath`] is visible under a profile. Evaluation is pure:
//! no I/O, and the same (profile, path) pair always yields the same answer.
//!
//! ## Matching modes
//!
//! - [`MatchMode::Substring`]: the path and each entry are flattened to one
//!   percent-encoded token, with slashes stripped and the HTML route base
//!   prepended. An entry matches when its token is a substring of the path
//!   token.
//! - [`MatchMode::Prefix`]: entries match whole leading segments of the
//!   path. Allow entries also admit their ancestors so the user can navigate
//!   down to them.
//!
//! Substring is the default. It treats `vacation2` as matching a rule for
//! `vacation`, which existing users-files may rely on. Prefix mode gives
//! strict directory-subtree semantics.
//!
//! In both modes deny wins over allow, and an empty allow-list admits
//! everything that was not denied.

use crate::types::{ResourcePath, encode_component};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured allow/deny policy as written in the users file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessPolicy {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

/// Authorization profile attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessProfile {
    /// Unrestricted.
    All,
    /// Allow/deny lists evaluated by [`PolicyEvaluator`].
    Policy(AccessPolicy),
    /// No access. Unknown identities and unrecognized access levels land here.
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Prefix,
}

/// Evaluates profiles against paths.
///
/// Holds the HTML route base because substring tokens are anchored on it: a
/// deny rule for `work` becomes the token for `/gallery/work`.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    html_base: String,
    mode: MatchMode,
}

impl PolicyEvaluator {
    pub fn new(html_base: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            html_base: html_base.into(),
            mode,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn is_allowed(&self, profile: &AccessProfile, path: &ResourcePath) -> bool {
        let policy = match profile {
            AccessProfile::All => return true,
            AccessProfile::None => return false,
            AccessProfile::Policy(policy) => policy,
        };
        let allowed = match self.mode {
            MatchMode::Substring => self.substring_allows(policy, path),
            MatchMode::Prefix => prefix_allows(policy, path),
        };
        debug!(path = %path, allowed, mode = ?self.mode, "policy evaluated");
        allowed
    }

    /// Flatten `html_base + path` into the opaque token substring mode compares.
    pub fn token(&self, path: &str) -> String {
        let joined = format!("{}{}", self.html_base, path);
        let stripped: String = joined.chars().filter(|c| *c != '/').collect();
        encode_component(&stripped)
    }

    fn substring_allows(&self, policy: &AccessPolicy, path: &ResourcePath) -> bool {
        let requested = self.token(&path.to_string());

        if let Some(rule) = policy
            .deny
            .iter()
            .find(|entry| requested.contains(&self.token(entry)))
        {
            debug!(path = %path, rule = %rule, "denied by rule");
            return false;
        }
        if policy.allow.is_empty() {
            return true;
        }
        policy
            .allow
            .iter()
            .any(|entry| requested.contains(&self.token(entry)))
    }
}

fn prefix_allows(policy: &AccessPolicy, path: &ResourcePath) -> bool {
    let rules = |entries: &[String]| -> Vec<ResourcePath> {
        // Malformed entries (e.g. containing `..`) can never match.
        entries
            .iter()
            .filter_map(|e| ResourcePath::parse(e).ok())
            .collect()
    };

    let deny = rules(&policy.deny);
    if let Some(rule) = deny.iter().find(|rule| path.starts_with(rule)) {
        debug!(path = %path, rule = %rule, "denied by rule");
        return false;
    }
    if policy.allow.is_empty() {
        return true;
    }
    rules(&policy.allow)
        .iter()
        .any(|rule| path.starts_with(rule) || rule.starts_with(path))
}
