//! CLI output formatting for the `check` command.
//!
//! Output is grouped into sections (`Config`, `Users`, `Findings`), each a
//! header line followed by indented `Label: value` context lines:
//!
//! ```text
//! Config
//!     Photos:   /srv/photos (12 entries)
//!     Previews: /srv/previews (persistent)
//!     Routes:   /gallery/ /galleryfiles/ /gallerypreviews/
//!     Matching: substring, media unchecked
//!     Workers:  8
//!
//! Users
//!     admin: all
//!     alice: allow vacation
//!
//! Findings
//!     error: photos root /srv/photos is not readable: ...
//! ```
//!
//! [`format_check_output`] is pure for testability; [`print_check_output`]
//! writes it to stdout.

use crate::access::{AccessProfile, MatchMode};
use crate::check::{CheckReport, Severity};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `Label:` padded so values in a section line up.
fn context_line(label: &str, value: &str) -> String {
    format!("{}{:<10}{}", indent(1), format!("{label}:"), value)
}

/// One-line summary of an access profile.
///
/// ```text
/// all
/// allow vacation, family; deny family/private
/// none
/// ```
fn profile_summary(profile: &AccessProfile) -> String {
    match profile {
        AccessProfile::All => "all".to_string(),
        AccessProfile::None => "none".to_string(),
        AccessProfile::Policy(policy) => {
            let mut parts = Vec::new();
            if !policy.allow.is_empty() {
                parts.push(format!("allow {}", policy.allow.join(", ")));
            }
            if !policy.deny.is_empty() {
                parts.push(format!("deny {}", policy.deny.join(", ")));
            }
            if parts.is_empty() {
                "everything (empty policy)".to_string()
            } else {
                parts.join("; ")
            }
        }
    }
}

fn match_mode_name(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Substring => "substring",
        MatchMode::Prefix => "prefix",
    }
}

// ============================================================================
// Check output
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Config".to_string());
    let photos = match report.photo_entries {
        Some(n) => format!("{} ({} entries)", report.photos_root.display(), n),
        None => format!("{} (unreadable)", report.photos_root.display()),
    };
    lines.push(context_line("Photos", &photos));
    let mode = if report.persist {
        "persistent"
    } else {
        "in-memory"
    };
    lines.push(context_line(
        "Previews",
        &format!("{} ({})", report.previews_root.display(), mode),
    ));
    lines.push(context_line("Routes", &report.routes.join(" ")));
    let media = if report.enforce_on_media {
        "media checked"
    } else {
        "media unchecked"
    };
    lines.push(context_line(
        "Matching",
        &format!("{}, {}", match_mode_name(report.match_mode), media),
    ));
    lines.push(context_line("Workers", &report.workers.to_string()));

    lines.push(String::new());
    lines.push("Users".to_string());
    match &report.users {
        None => lines.push(format!("{}authentication disabled", indent(1))),
        Some(users) if users.is_empty() => lines.push(format!("{}(none)", indent(1))),
        Some(users) => {
            for user in users {
                lines.push(format!(
                    "{}{}: {}",
                    indent(1),
                    user.name,
                    profile_summary(&user.profile)
                ));
            }
        }
    }

    if !report.findings.is_empty() {
        lines.push(String::new());
        lines.push("Findings".to_string());
        for finding in &report.findings {
            let level = match finding.severity {
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            lines.push(format!("{}{}: {}", indent(1), level, finding.message));
        }
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessPolicy;
    use crate::check::{Finding, UserSummary};
    use std::path::PathBuf;

    fn report() -> CheckReport {
        CheckReport {
            photos_root: PathBuf::from("/srv/photos"),
            photo_entries: Some(12),
            previews_root: PathBuf::from("/srv/previews"),
            persist: true,
            routes: [
                "/gallery/".to_string(),
                "/galleryfiles/".to_string(),
                "/gallerypreviews/".to_string(),
            ],
            match_mode: MatchMode::Substring,
            enforce_on_media: false,
            workers: 8,
            users: None,
            findings: vec![],
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn context_lines_align_values() {
        assert_eq!(context_line("Photos", "/p"), "    Photos:   /p");
        assert_eq!(context_line("Previews", "/q"), "    Previews: /q");
    }

    #[test]
    fn profile_summary_shapes() {
        assert_eq!(profile_summary(&AccessProfile::All), "all");
        assert_eq!(profile_summary(&AccessProfile::None), "none");
        let policy = AccessPolicy {
            allow: vec!["vacation".into(), "family".into()],
            deny: vec!["family/private".into()],
        };
        assert_eq!(
            profile_summary(&AccessProfile::Policy(policy)),
            "allow vacation, family; deny family/private"
        );
        assert_eq!(
            profile_summary(&AccessProfile::Policy(AccessPolicy::default())),
            "everything (empty policy)"
        );
    }

    // =========================================================================
    // Check output tests
    // =========================================================================

    #[test]
    fn config_section() {
        let lines = format_check_output(&report());
        assert_eq!(lines[0], "Config");
        assert_eq!(lines[1], "    Photos:   /srv/photos (12 entries)");
        assert_eq!(lines[2], "    Previews: /srv/previews (persistent)");
        assert_eq!(
            lines[3],
            "    Routes:   /gallery/ /galleryfiles/ /gallerypreviews/"
        );
        assert_eq!(lines[4], "    Matching: substring, media unchecked");
        assert_eq!(lines[5], "    Workers:  8");
    }

    #[test]
    fn auth_disabled_is_stated() {
        let lines = format_check_output(&report());
        assert!(lines.contains(&"    authentication disabled".to_string()));
        assert!(!lines.contains(&"Findings".to_string()));
    }

    #[test]
    fn users_and_findings_are_listed() {
        let mut report = report();
        report.photo_entries = None;
        report.users = Some(vec![
            UserSummary {
                name: "admin".into(),
                profile: AccessProfile::All,
            },
            UserSummary {
                name: "mallory".into(),
                profile: AccessProfile::None,
            },
        ]);
        report.findings.push(Finding {
            severity: Severity::Error,
            message: "photos root missing".into(),
        });

        let lines = format_check_output(&report);
        assert_eq!(lines[1], "    Photos:   /srv/photos (unreadable)");
        assert!(lines.contains(&"    admin: all".to_string()));
        assert!(lines.contains(&"    mallory: none".to_string()));
        assert_eq!(lines.last().unwrap(), "    error: photos root missing");
    }
}
