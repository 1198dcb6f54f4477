//! # Calibration Store
//!
//! Durable storage for the [`CalibrationProfile`].
//!
//! Stored profiles are merged over the compiled-in defaults one field at a
//! time, so a profile written by an older build (missing fields) or edited by
//! hand (a field with the wrong type) still loads: the bad or missing fields
//! take their defaults, the rest survive.
//!
//! Values are only coerced to their field's type here. Range checks happen
//! where the profile is used (see [`CalibrationProfile::sanitized`]), so an
//! out-of-range value survives a save/load round trip unchanged.
//!
//! Loss of persistence never blocks printing. `load` cannot fail and `save`
//! only logs.
//!
//! ## Example
//!
//! ```
//! use etiqueta::printer::{CalibrationStore, MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::default();
//! let patch = json!({ "dpi": "300", "header_layout": "column" });
//! let profile = store.update(patch.as_object().unwrap());
//! assert_eq!(profile.dpi, 300);
//! assert_eq!(store.load(), profile);
//! ```

use serde_json::{Map, Number, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::config::CalibrationProfile;

/// A partial profile: JSON object keyed by profile field names.
pub type CalibrationPatch = Map<String, Value>;

/// Persistence for the calibration profile.
///
/// Implementors provide raw string storage; the profile semantics
/// (`load`/`save`/`update`) are shared.
pub trait CalibrationStore: Send + Sync {
    /// Read the persisted document, `None` when nothing is stored.
    fn read_raw(&self) -> Option<String>;

    /// Replace the persisted document.
    fn write_raw(&self, raw: &str) -> io::Result<()>;

    /// Load the profile, merging stored values over defaults.
    fn load(&self) -> CalibrationProfile {
        let defaults = CalibrationProfile::default();
        let Some(raw) = self.read_raw() else {
            return defaults;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(stored)) => merge_fields(&defaults, &stored),
            Ok(_) => {
                tracing::warn!("stored calibration is not a JSON object, using defaults");
                defaults
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored calibration is corrupt, using defaults");
                defaults
            }
        }
    }

    /// Persist the profile. Failures are logged and swallowed.
    fn save(&self, profile: &CalibrationProfile) {
        let raw = match serde_json::to_string_pretty(profile) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize calibration");
                return;
            }
        };
        if let Err(e) = self.write_raw(&raw) {
            tracing::warn!(error = %e, "failed to persist calibration");
        }
    }

    /// Shallow-merge `patch` over the current profile, persist and return it.
    fn update(&self, patch: &CalibrationPatch) -> CalibrationProfile {
        let profile = merge_fields(&self.load(), patch);
        self.save(&profile);
        profile
    }
}

/// Merge `patch` over `base` one field at a time.
///
/// Unknown keys are ignored. A value that cannot be coerced to the field's
/// type leaves the base value in place.
pub fn merge_fields(base: &CalibrationProfile, patch: &CalibrationPatch) -> CalibrationProfile {
    let mut fields = match serde_json::to_value(base) {
        Ok(Value::Object(fields)) => fields,
        _ => return base.clone(),
    };

    for (key, value) in patch {
        let Some(current) = fields.get(key) else {
            tracing::debug!(field = %key, "ignoring unknown calibration field");
            continue;
        };
        let Some(coerced) = coerce(current, value) else {
            tracing::warn!(field = %key, value = %value, "ignoring malformed calibration value");
            continue;
        };

        let previous = fields.insert(key.clone(), coerced);
        if serde_json::from_value::<CalibrationProfile>(Value::Object(fields.clone())).is_err() {
            tracing::warn!(field = %key, value = %value, "ignoring malformed calibration value");
            if let Some(previous) = previous {
                fields.insert(key.clone(), previous);
            }
        }
    }

    serde_json::from_value(Value::Object(fields)).unwrap_or_else(|_| base.clone())
}

/// Coerce `value` to the JSON kind of `current`.
///
/// Numbers accept numeric strings, booleans accept `"true"`/`"false"` and
/// 0/1. Integer fields only accept whole, non-negative values.
fn coerce(current: &Value, value: &Value) -> Option<Value> {
    match current {
        Value::Number(n) => {
            let parsed = match value {
                Value::Number(v) => v.as_f64()?,
                Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            if !parsed.is_finite() {
                return None;
            }
            if n.is_u64() {
                if parsed < 0.0 || parsed.fract() != 0.0 || parsed > u32::MAX as f64 {
                    return None;
                }
                Some(Value::Number(Number::from(parsed as u64)))
            } else {
                Number::from_f64(parsed).map(Value::Number)
            }
        }
        Value::Bool(_) => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        },
        Value::String(_) => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================================
// BACKENDS
// ============================================================================

/// Calibration persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JsonFileStore {
    fn read_raw(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read calibration");
                None
            }
        }
    }

    fn write_raw(&self, raw: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)
    }
}

/// In-process calibration storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    /// A store pre-filled with a raw document (which may be malformed).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }
}

impl CalibrationStore for MemoryStore {
    fn read_raw(&self) -> Option<String> {
        self.slot.lock().ok()?.clone()
    }

    fn write_raw(&self, raw: &str) -> io::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| io::Error::other("calibration slot poisoned"))?;
        *slot = Some(raw.to_string());
        Ok(())
    }
}
