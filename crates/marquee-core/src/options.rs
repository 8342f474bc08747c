//! Instance and per-region configuration options.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constraint::AspectRatio;

/// Step applied by arrow keys when no binding resolves.
pub const DEFAULT_KEY_STEP: f64 = 10.0;

/// Default resize margin in pixels.
pub const DEFAULT_RESIZE_MARGIN: f64 = 10.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which resize handles the render surface should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleMode {
    /// No handles.
    #[default]
    None,
    /// Corner handles only.
    Corners,
    /// Corner and edge-midpoint handles.
    All,
}

/// What an arrow key does under a given modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyBinding {
    /// Move the selection by this many pixels.
    Step(f64),
    /// Resize the selection instead of moving it.
    Resize,
}

impl Serialize for KeyBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyBinding::Step(v) => serializer.serialize_f64(*v),
            KeyBinding::Resize => serializer.serialize_str("resize"),
        }
    }
}

impl<'de> Deserialize<'de> for KeyBinding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Step(f64),
            Named(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Step(v) => Ok(KeyBinding::Step(v)),
            Raw::Named(s) if s == "resize" => Ok(KeyBinding::Resize),
            Raw::Named(s) => Err(serde::de::Error::custom(format!(
                "unknown key binding {s:?} (expected a number or \"resize\")"
            ))),
        }
    }
}

/// Arrow-key bindings per held modifier.
///
/// The step resolves through alt, ctrl, shift, then the bare arrows binding,
/// taking the first numeric binding whose modifier is held; a `Resize` binding
/// under a held modifier switches arrows from moving to resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub arrows: Option<KeyBinding>,
    pub shift: Option<KeyBinding>,
    pub ctrl: Option<KeyBinding>,
    pub alt: Option<KeyBinding>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            arrows: None,
            shift: Some(KeyBinding::Step(1.0)),
            ctrl: Some(KeyBinding::Resize),
            alt: None,
        }
    }
}

/// Recognized options. Min/max sizes and the logical image size are declared
/// in logical image pixels; `resize_margin` is in displayed pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub min_width: f64,
    pub min_height: f64,
    /// Zero means unbounded (the image size still applies).
    pub max_width: f64,
    pub max_height: f64,
    /// Parsed from a `"W:H"` string; malformed values degrade to `None`.
    #[serde(deserialize_with = "lenient_aspect_ratio")]
    pub aspect_ratio: Option<AspectRatio>,
    /// Logical image width; `None` leaves the x scale factor at 1.
    pub image_width: Option<f64>,
    /// Logical image height; `None` leaves the y scale factor at 1.
    pub image_height: Option<f64>,
    pub handles: HandleMode,
    pub resizable: bool,
    pub movable: bool,
    /// Suppress starting a new selection on background pointer-down.
    pub persistent: bool,
    /// Insert a fresh region on each background pointer-down.
    pub auto_add: bool,
    /// Hide the selection when a gesture ends.
    pub auto_hide: bool,
    /// Let the delete key remove the active region.
    pub key_delete: bool,
    /// Distance from a region edge within which a pointer-down resizes.
    pub resize_margin: f64,
    /// Keyboard support; `None` disables it.
    pub keys: Option<KeyConfig>,
    /// Reveal the selection box immediately.
    pub show: bool,
    /// Master switch for pointer/keyboard input.
    pub enabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_width: 0.0,
            min_height: 0.0,
            max_width: 0.0,
            max_height: 0.0,
            aspect_ratio: None,
            image_width: None,
            image_height: None,
            handles: HandleMode::None,
            resizable: true,
            movable: true,
            persistent: false,
            auto_add: false,
            auto_hide: false,
            key_delete: false,
            resize_margin: DEFAULT_RESIZE_MARGIN,
            keys: None,
            show: false,
            enabled: true,
        }
    }
}

impl Options {
    /// Deserialize options from JSON.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize options to JSON.
    pub fn to_json(&self) -> Result<String, OptionsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Accept a `"W:H"` string, degrading malformed or empty values to `None`
/// instead of failing the whole configuration.
fn lenient_aspect_ratio<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AspectRatio>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        if s.is_empty() {
            return None;
        }
        match s.parse::<AspectRatio>() {
            Ok(ar) => Some(ar),
            Err(err) => {
                log::warn!("ignoring aspect ratio option: {err}");
                None
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.resizable);
        assert!(options.movable);
        assert!(!options.persistent);
        assert!(options.enabled);
        assert!((options.resize_margin - 10.0).abs() < f64::EPSILON);
        assert!(options.aspect_ratio.is_none());
        assert!(options.keys.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut options = Options::default();
        options.min_width = 50.0;
        options.aspect_ratio = Some(AspectRatio::new(2.0, 1.0));
        options.keys = Some(KeyConfig::default());

        let json = options.to_json().unwrap();
        let back = Options::from_json(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_aspect_ratio_from_json() {
        let options = Options::from_json(r#"{ "aspectRatio": "4:3" }"#).unwrap();
        let ar = options.aspect_ratio.unwrap();
        assert!((ar.ratio() - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_aspect_ratio_degrades_to_none() {
        let options = Options::from_json(r#"{ "aspectRatio": "wide" }"#).unwrap();
        assert!(options.aspect_ratio.is_none());

        let options = Options::from_json(r#"{ "aspectRatio": "" }"#).unwrap();
        assert!(options.aspect_ratio.is_none());
    }

    #[test]
    fn test_key_binding_serde() {
        let config: KeyConfig =
            serde_json::from_str(r#"{ "arrows": 5, "ctrl": "resize" }"#).unwrap();
        assert_eq!(config.arrows, Some(KeyBinding::Step(5.0)));
        assert_eq!(config.ctrl, Some(KeyBinding::Resize));
        // Unspecified slots keep their defaults.
        assert_eq!(config.shift, Some(KeyBinding::Step(1.0)));

        let json = serde_json::to_string(&config).unwrap();
        let back: KeyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_key_binding_is_an_error() {
        assert!(serde_json::from_str::<KeyConfig>(r#"{ "arrows": "jump" }"#).is_err());
    }

    #[test]
    fn test_invalid_json_surfaces_error() {
        assert!(matches!(
            Options::from_json("{ not json"),
            Err(OptionsError::Json(_))
        ));
    }
}
