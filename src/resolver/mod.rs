//! Display name resolution: turns avatar props into badge text, a colour
//! class and a font size.
//!
//! [`resolve`] is a pure function of its input. Gender is validated first,
//! so an invalid gender fails even when no name is supplied.

pub mod color;
pub mod initials;

use serde::{Deserialize, Serialize};

use crate::core::config::ResolverConfig;
use crate::core::errors::Result;

use self::color::{ColorCode, Gender};

/// Default avatar width and height in pixels.
pub const DEFAULT_SIDE: f64 = 36.0;

/// Inputs to one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarInput {
    pub name: Option<String>,
    pub custom_text: Option<String>,
    pub gender: Option<String>,
    pub width: f64,
    pub height: f64,
}

impl Default for AvatarInput {
    fn default() -> Self {
        Self {
            name: None,
            custom_text: None,
            gender: None,
            width: DEFAULT_SIDE,
            height: DEFAULT_SIDE,
        }
    }
}

impl AvatarInput {
    /// Input with a name and default dimensions.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_custom_text(mut self, text: impl Into<String>) -> Self {
        self.custom_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Shorter of the two sides.
    #[must_use]
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Result of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayResult {
    /// Badge text; empty for the placeholder and empty-name cases.
    pub text: String,
    pub color_code: ColorCode,
    pub font_size: f64,
    /// Name was supplied but empty: render the "no display name" icon.
    pub is_empty: bool,
    /// No name at all: render the generic silhouette.
    pub show_placeholder: bool,
}

impl DisplayResult {
    fn placeholder(font_size: f64) -> Self {
        Self {
            text: String::new(),
            color_code: ColorCode::Zero,
            font_size,
            is_empty: false,
            show_placeholder: true,
        }
    }

    fn empty(font_size: f64) -> Self {
        Self {
            text: String::new(),
            color_code: ColorCode::Zero,
            font_size,
            is_empty: true,
            show_placeholder: false,
        }
    }

    fn text(text: String, color_code: ColorCode, font_size: f64) -> Self {
        Self {
            text,
            color_code,
            font_size,
            is_empty: false,
            show_placeholder: false,
        }
    }
}

/// Font size for an avatar whose shorter side is `min_side` pixels.
#[must_use]
pub fn font_size_for(min_side: f64) -> f64 {
    min_side / 4.0 + 3.0
}

/// Resolver with tunable thresholds and colour rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the display text and colour for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarError::InvalidGender`](crate::core::errors::AvatarError::InvalidGender)
    /// when `gender` is set to anything but "male"/"female" (any case).
    pub fn resolve(&self, input: &AvatarInput) -> Result<DisplayResult> {
        let gender = input.gender.as_deref().map(Gender::parse).transpose()?;
        let min_side = input.min_side();
        let font_size = font_size_for(min_side);

        if let Some(custom) = input.custom_text.as_deref().filter(|t| !t.is_empty()) {
            let code = self.config.color_rule.select(gender, custom);
            return Ok(DisplayResult::text(custom.to_string(), code, font_size));
        }

        match input.name.as_deref() {
            None => Ok(DisplayResult::placeholder(font_size)),
            Some("") => Ok(DisplayResult::empty(font_size)),
            Some(name) => {
                let small = min_side < self.config.small_size_threshold;
                let text = initials::derive(name, small);
                let code = self.config.color_rule.select(gender, name);
                Ok(DisplayResult::text(text, code, font_size))
            }
        }
    }
}

/// Resolve with default settings.
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn resolve(input: &AvatarInput) -> Result<DisplayResult> {
    Resolver::default().resolve(input)
}
