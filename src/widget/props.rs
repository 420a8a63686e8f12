//! Declarative avatar prop set.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::config::WidgetConfig;
use crate::resolver::AvatarInput;

/// Props accepted by [`AvatarWidget`](super::AvatarWidget).
///
/// Only `name`, `gender`, `width`, `height` and `custom_text` are watched;
/// changing `is_round` or `img_src` does not re-run resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarProps {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub width: f64,
    pub height: f64,
    pub is_round: bool,
    pub img_src: Option<String>,
    pub custom_text: Option<String>,
}

impl Default for AvatarProps {
    fn default() -> Self {
        Self::from_config(&WidgetConfig::default())
    }
}

impl AvatarProps {
    /// Empty props carrying the configured default dimensions and shape.
    #[must_use]
    pub fn from_config(cfg: &WidgetConfig) -> Self {
        Self {
            name: None,
            gender: None,
            width: cfg.width,
            height: cfg.height,
            is_round: cfg.is_round,
            img_src: None,
            custom_text: None,
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The resolver input derived from the watched props.
    #[must_use]
    pub fn input(&self) -> AvatarInput {
        AvatarInput {
            name: self.name.clone(),
            custom_text: self.custom_text.clone(),
            gender: self.gender.clone(),
            width: self.width,
            height: self.height,
        }
    }

    /// Whether any watched prop differs from `other`.
    #[must_use]
    pub fn watched_differs(&self, other: &Self) -> bool {
        self.name != other.name
            || self.gender != other.gender
            || self.custom_text != other.custom_text
            || self.width.to_bits() != other.width.to_bits()
            || self.height.to_bits() != other.height.to_bits()
    }

    /// Image source, ignoring an empty string.
    #[must_use]
    pub fn image_source(&self) -> Option<&str> {
        self.img_src.as_deref().filter(|src| !src.is_empty())
    }
}
