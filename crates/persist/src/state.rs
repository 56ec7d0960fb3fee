//! Text-backed program state.
//!
//! File layout, one value per line:
//! ```text
//! clear_color.r
//! clear_color.g
//! clear_color.b
//! overlay_enabled (0 or 1)
//! camera_position.x
//! camera_position.y
//! camera_position.z
//! camera_front.x
//! camera_front.y
//! camera_front.z
//! ```
//! Any whitespace separates values on read.

use glam::Vec3;
use std::fmt::Write as _;
use std::path::Path;

/// Number of whitespace-separated values in a state file.
pub const FIELD_COUNT: usize = 10;

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "clear_color.r",
    "clear_color.g",
    "clear_color.b",
    "overlay_enabled",
    "camera_position.x",
    "camera_position.y",
    "camera_position.z",
    "camera_front.x",
    "camera_front.y",
    "camera_front.z",
];

/// Errors from reading or writing the state file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("expected 10 values, found {0}")]
    FieldCount(usize),
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// The subset of viewer state that survives across runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedState {
    pub clear_color: Vec3,
    pub overlay_enabled: bool,
    pub camera_position: Vec3,
    pub camera_front: Vec3,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            clear_color: Vec3::ZERO,
            overlay_enabled: false,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            camera_front: Vec3::NEG_Z,
        }
    }
}

impl PersistedState {
    /// Parse the text form. Either every field parses or an error is returned.
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != FIELD_COUNT {
            return Err(PersistError::FieldCount(tokens.len()));
        }

        let mut floats = [0.0f32; FIELD_COUNT];
        for (i, token) in tokens.iter().enumerate() {
            if i == 3 {
                continue;
            }
            floats[i] = parse_float(FIELD_NAMES[i], token)?;
        }

        let overlay_enabled = match tokens[3] {
            "0" => false,
            "1" => true,
            other => {
                return Err(PersistError::InvalidValue {
                    field: FIELD_NAMES[3],
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            clear_color: Vec3::new(floats[0], floats[1], floats[2]),
            overlay_enabled,
            camera_position: Vec3::new(floats[4], floats[5], floats[6]),
            camera_front: Vec3::new(floats[7], floats[8], floats[9]),
        })
    }

    /// Render the text form. `f32` Display is shortest round-trip, so a
    /// parse of this output reproduces every value exactly.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let c = self.clear_color;
        let p = self.camera_position;
        let f = self.camera_front;
        for v in [c.x, c.y, c.z] {
            let _ = writeln!(out, "{v}");
        }
        let _ = writeln!(out, "{}", u8::from(self.overlay_enabled));
        for v in [p.x, p.y, p.z, f.x, f.y, f.z] {
            let _ = writeln!(out, "{v}");
        }
        out
    }

    /// Read a state file. A missing file is `Ok(None)`.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<Self>, PersistError> {
        let text = match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text).map(Some)
    }

    /// Replace `self` with the file contents if the file exists and is
    /// well formed. Returns whether anything was loaded; on error `self`
    /// is untouched.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<bool, PersistError> {
        match Self::read(path)? {
            Some(loaded) => {
                *self = loaded;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load from `path`, falling back to defaults on a missing or malformed
    /// file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut state = Self::default();
        match state.load_from_file(path) {
            Ok(true) => tracing::info!("loaded program state from {}", path.display()),
            Ok(false) => tracing::info!("no program state at {}, using defaults", path.display()),
            Err(e) => tracing::warn!(
                "ignoring program state at {}: {e}; using defaults",
                path.display()
            ),
        }
        state
    }

    /// Write the state file, creating parent directories. The file is
    /// written next to its destination and renamed into place.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text())?;
        std::fs::rename(&tmp, path)?;
        tracing::info!("saved program state to {}", path.display());
        Ok(())
    }
}

fn parse_float(field: &'static str, token: &str) -> Result<f32, PersistError> {
    token
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PersistError::InvalidValue {
            field,
            value: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        PersistedState {
            clear_color: Vec3::new(0.1, 0.25, 0.333),
            overlay_enabled: true,
            camera_position: Vec3::new(-12.5, 3.75, 40.125),
            camera_front: Vec3::new(0.6, -0.0, -0.8),
        }
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program_state.txt");
        let state = sample();
        state.save_to_file(&path).unwrap();

        let mut loaded = PersistedState::default();
        assert!(loaded.load_from_file(&path).unwrap());

        let pairs = [
            (state.clear_color, loaded.clear_color),
            (state.camera_position, loaded.camera_position),
            (state.camera_front, loaded.camera_front),
        ];
        for (a, b) in pairs {
            assert!(a.abs_diff_eq(b, 1e-6), "{a} vs {b}");
        }
        assert_eq!(loaded.overlay_enabled, state.overlay_enabled);
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = PersistedState::default();
        let loaded = state
            .load_from_file(dir.path().join("does_not_exist.txt"))
            .unwrap();
        assert!(!loaded);
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn text_layout_is_one_value_per_line() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), FIELD_COUNT);
        assert_eq!(lines[3], "1");
    }

    #[test]
    fn parse_accepts_any_whitespace() {
        let state = PersistedState::parse("0.5 0.5 0.5 0\n1 2 3\t0 0 -1").unwrap();
        assert_eq!(state.clear_color, Vec3::splat(0.5));
        assert!(!state.overlay_enabled);
        assert_eq!(state.camera_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.camera_front, Vec3::NEG_Z);
    }

    #[test]
    fn truncated_file_is_rejected_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        std::fs::write(&path, "0.2\n0.3\n0.4\n1\n5\n").unwrap();

        let mut state = PersistedState::default();
        let err = state.load_from_file(&path).unwrap_err();
        assert!(matches!(err, PersistError::FieldCount(5)));
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn garbage_value_is_rejected() {
        let err = PersistedState::parse("0 0 0 0 1 2 x 0 0 -1").unwrap_err();
        assert!(matches!(
            err,
            PersistError::InvalidValue {
                field: "camera_position.z",
                ..
            }
        ));
    }

    #[test]
    fn flag_must_be_zero_or_one() {
        assert!(PersistedState::parse("0 0 0 2 0 0 3 0 0 -1").is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(PersistedState::parse("NaN 0 0 0 0 0 3 0 0 -1").is_err());
        assert!(PersistedState::parse("0 0 0 0 inf 0 3 0 0 -1").is_err());
    }

    #[test]
    fn load_or_default_survives_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        std::fs::write(&path, "not a state file").unwrap();
        assert_eq!(
            PersistedState::load_or_default(&path),
            PersistedState::default()
        );
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.txt");
        PersistedState::default().save_to_file(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
