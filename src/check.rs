//! Startup diagnostics for the `check` command.
//!
//! Inspects the resolved configuration and the filesystem it points at
//! without binding a socket. [`inspect`] never fails: every problem becomes
//! a [`Finding`] so the whole report can be shown at once.

use crate::access::{AccessProfile, MatchMode};
use crate::config::{GalleryConfig, effective_threads};
use crate::users::UserRegistry;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

/// One line per user in the users file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub name: String,
    pub profile: AccessProfile,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub photos_root: PathBuf,
    /// Visible top-level entries, when the root could be read.
    pub photo_entries: Option<usize>,
    pub previews_root: PathBuf,
    pub persist: bool,
    pub routes: [String; 3],
    pub match_mode: MatchMode,
    pub enforce_on_media: bool,
    pub workers: usize,
    /// `None` when authentication is disabled.
    pub users: Option<Vec<UserSummary>>,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

fn count_visible_entries(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        if !entry?.file_name().to_string_lossy().starts_with('.') {
            count += 1;
        }
    }
    Ok(count)
}

/// Build a report for `config` and the (already loaded) users.
pub fn inspect(config: &GalleryConfig, users: Option<&UserRegistry>) -> CheckReport {
    let mut findings = Vec::new();
    let mut error = |message: String| {
        findings.push(Finding {
            severity: Severity::Error,
            message,
        })
    };

    let photos_root = config.paths.photos_root.clone();
    let photo_entries = match count_visible_entries(&photos_root) {
        Ok(n) => Some(n),
        Err(e) => {
            error(format!("photos root {} is not readable: {e}", photos_root.display()));
            None
        }
    };

    let previews_root = config.paths.previews_root.clone();
    if config.previews.persist && !previews_root.is_dir() {
        error(format!(
            "previews root {} does not exist but previews.persist is enabled",
            previews_root.display()
        ));
    }

    let users = users.map(|registry| {
        registry
            .user_names()
            .into_iter()
            .map(|name| UserSummary {
                name: name.to_string(),
                profile: registry.profile_for(name),
            })
            .collect::<Vec<_>>()
    });

    if let Some(summaries) = &users {
        if summaries.is_empty() {
            findings.push(Finding {
                severity: Severity::Warning,
                message: "users file is empty, every request will be rejected".to_string(),
            });
        }
        let unassigned = summaries
            .iter()
            .filter(|u| u.profile == AccessProfile::None);
        for user in unassigned {
            let name = &user.name;
            findings.push(Finding {
                severity: Severity::Warning,
                message: format!("user '{name}' has no access level and can see nothing"),
            });
        }
    }

    CheckReport {
        photos_root,
        photo_entries,
        previews_root,
        persist: config.previews.persist,
        routes: [
            config.routes.html_base.clone(),
            config.routes.files_base.clone(),
            config.routes.previews_base.clone(),
        ],
        match_mode: config.access.match_mode,
        enforce_on_media: config.access.enforce_on_media,
        workers: effective_threads(&config.processing),
        users,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::registry;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(tmp: &TempDir) -> GalleryConfig {
        let mut config = GalleryConfig::default();
        config.paths.photos_root = tmp.path().join("photos");
        config.paths.previews_root = tmp.path().join("previews");
        config
    }

    #[test]
    fn healthy_setup_has_no_errors() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("photos/vacation")).unwrap();
        fs::create_dir_all(tmp.path().join("photos/.cache")).unwrap();

        let report = inspect(&config_for(&tmp), None);
        assert!(!report.has_errors(), "{:?}", report.findings);
        assert_eq!(report.photo_entries, Some(1));
        assert!(report.users.is_none());
    }

    #[test]
    fn missing_photos_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let report = inspect(&config_for(&tmp), None);
        assert!(report.has_errors());
        assert_eq!(report.photo_entries, None);
    }

    #[test]
    fn persist_without_previews_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("photos")).unwrap();
        let mut config = config_for(&tmp);
        config.previews.persist = true;

        let report = inspect(&config, None);
        assert!(report.has_errors());
    }

    #[test]
    fn users_are_summarized_in_name_order() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("photos")).unwrap();
        let users = registry();

        let report = inspect(&config_for(&tmp), Some(&users));
        let names: Vec<&str> = report
            .users
            .as_ref()
            .unwrap()
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["admin", "alice", "bob", "mallory"]);
    }

    #[test]
    fn users_without_access_are_warned_about() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("photos")).unwrap();

        let report = inspect(&config_for(&tmp), Some(&registry()));
        assert!(!report.has_errors());
        assert!(
            report
                .findings
                .iter()
                .any(|f| f.severity == Severity::Warning && f.message.contains("mallory"))
        );
    }
}
