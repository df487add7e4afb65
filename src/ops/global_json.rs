//! `global.json` SDK pin reconciliation.
//!
//! A pin naming the wrong major would make `dotnet` refuse to build (or
//! silently roll to an SDK that cannot target the framework). When a
//! compatible SDK is installed the pin is moved to the highest one; anything
//! else leaves the file alone.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::core::Target;
use crate::toolchain::{major_of, InstalledSdks};
use crate::util::fs::write_string;

pub const GLOBAL_JSON: &str = "global.json";

/// What reconciliation did to the pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    /// No `global.json` in the root.
    Absent,
    /// The file has no `sdk.version`.
    Unpinned,
    /// The pin already has the target's major.
    AlreadyCompatible { version: String },
    /// The pin was rewritten.
    Switched { from: String, to: String },
    /// The pin disagrees but nothing compatible is installed.
    NoCompatibleSdk { pinned: String },
    /// The file could not be understood; it was left untouched.
    Skipped { reason: String },
}

impl PinOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, PinOutcome::Switched { .. })
    }
}

impl fmt::Display for PinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinOutcome::Absent => write!(f, "no global.json"),
            PinOutcome::Unpinned => write!(f, "global.json does not pin an SDK"),
            PinOutcome::AlreadyCompatible { version } => {
                write!(f, "global.json pin {} is compatible", version)
            }
            PinOutcome::Switched { from, to } => {
                write!(f, "global.json pinned to {}; switched to {}", from, to)
            }
            PinOutcome::NoCompatibleSdk { pinned } => write!(
                f,
                "global.json pins {} and no compatible SDK is installed; left as is",
                pinned
            ),
            PinOutcome::Skipped { reason } => write!(f, "global.json skipped: {}", reason),
        }
    }
}

/// Reconcile a parsed `global.json` document in place.
pub fn reconcile_pin(doc: &mut Value, target: Target, sdks: &InstalledSdks) -> PinOutcome {
    let pinned = match doc.pointer("/sdk/version") {
        None | Some(Value::Null) => return PinOutcome::Unpinned,
        Some(Value::String(v)) if v.trim().is_empty() => return PinOutcome::Unpinned,
        Some(Value::String(v)) => v.clone(),
        Some(other) => {
            return PinOutcome::Skipped {
                reason: format!("sdk.version is not a string: {}", other),
            }
        }
    };

    let want = target.sdk_major();
    if major_of(&pinned) == Some(want) {
        return PinOutcome::AlreadyCompatible { version: pinned };
    }

    let Some(best) = sdks.highest_for_major(want) else {
        return PinOutcome::NoCompatibleSdk { pinned };
    };

    if let Some(version) = doc.pointer_mut("/sdk/version") {
        *version = Value::String(best.to_string());
    }
    PinOutcome::Switched {
        from: pinned,
        to: best.to_string(),
    }
}

/// Reconcile `<root>/global.json` against the installed SDKs.
///
/// Read and parse failures are reported as [`PinOutcome::Skipped`]; only a
/// failure to write the reconciled file is an error.
pub fn reconcile_global_json(root: &Path, target: Target, sdks: &InstalledSdks) -> Result<PinOutcome> {
    let path = root.join(GLOBAL_JSON);
    if !path.is_file() {
        return Ok(PinOutcome::Absent);
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            return Ok(PinOutcome::Skipped {
                reason: e.to_string(),
            })
        }
    };
    let mut doc: Value = match serde_json::from_str(text.trim_start_matches('\u{feff}')) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("failed to parse {}: {}", path.display(), e);
            return Ok(PinOutcome::Skipped {
                reason: e.to_string(),
            });
        }
    };

    let outcome = reconcile_pin(&mut doc, target, sdks);
    if outcome.changed() {
        let mut json = serde_json::to_string_pretty(&doc)?;
        json.push('\n');
        write_string(&path, &json)?;
    }
    tracing::debug!("{}", outcome);

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sdks() -> InstalledSdks {
        InstalledSdks::parse("8.0.404 [sdk]\n9.0.99 [sdk]\n9.0.301 [sdk]\n")
    }

    #[test]
    fn test_pin_switches_to_highest_compatible() {
        let mut doc = json!({ "sdk": { "version": "8.0.100", "rollForward": "latestFeature" } });
        let outcome = reconcile_pin(&mut doc, Target::Net9, &sdks());

        assert_eq!(
            outcome,
            PinOutcome::Switched {
                from: "8.0.100".to_string(),
                to: "9.0.301".to_string(),
            }
        );
        assert_eq!(doc["sdk"]["version"], "9.0.301");
        assert_eq!(doc["sdk"]["rollForward"], "latestFeature");
    }

    #[test]
    fn test_pin_left_alone() {
        let only8 = InstalledSdks::parse("8.0.404 [sdk]\n");

        let mut doc = json!({ "sdk": { "version": "8.0.100" } });
        assert_eq!(
            reconcile_pin(&mut doc, Target::Net9, &only8),
            PinOutcome::NoCompatibleSdk {
                pinned: "8.0.100".to_string()
            }
        );
        assert_eq!(doc["sdk"]["version"], "8.0.100");

        assert!(matches!(
            reconcile_pin(&mut doc, Target::Net8, &sdks()),
            PinOutcome::AlreadyCompatible { .. }
        ));

        let mut unpinned = json!({ "msbuild-sdks": {} });
        assert_eq!(
            reconcile_pin(&mut unpinned, Target::Net9, &sdks()),
            PinOutcome::Unpinned
        );

        let mut odd = json!({ "sdk": { "version": 9 } });
        assert!(matches!(
            reconcile_pin(&mut odd, Target::Net9, &sdks()),
            PinOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn test_global_json_file_rewritten_with_key_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(GLOBAL_JSON);
        fs::write(
            &path,
            r#"{"sdk":{"version":"8.0.100","rollForward":"disable"},"msbuild-sdks":{}}"#,
        )
        .unwrap();

        let outcome = reconcile_global_json(tmp.path(), Target::Net9, &sdks()).unwrap();
        assert!(outcome.changed());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\n  \"sdk\": {\n    \"version\": \"9.0.301\",\n    \"rollForward\": \"disable\"\n  },\n  \"msbuild-sdks\": {}\n}\n"
        );
    }

    #[test]
    fn test_global_json_parse_failure_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(GLOBAL_JSON);
        fs::write(&path, "{ not json").unwrap();

        let outcome = reconcile_global_json(tmp.path(), Target::Net9, &sdks()).unwrap();
        assert!(matches!(outcome, PinOutcome::Skipped { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");

        let empty = TempDir::new().unwrap();
        assert_eq!(
            reconcile_global_json(empty.path(), Target::Net9, &sdks()).unwrap(),
            PinOutcome::Absent
        );
    }
}
