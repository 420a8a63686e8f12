//! Background colour-class selection: gender parsing and character parity.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AvatarError, Result};

/// Binary background class, rendered as `devui-avatar-background-{0|1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ColorCode {
    #[default]
    Zero,
    One,
}

impl ColorCode {
    /// Code for the parity of a UTF-16 code unit.
    #[must_use]
    pub const fn from_parity(unit: u16) -> Self {
        if unit % 2 == 0 { Self::Zero } else { Self::One }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// CSS class carrying this code.
    #[must_use]
    pub fn css_class(self) -> String {
        format!("devui-avatar-background-{}", self.value())
    }
}

impl From<ColorCode> for u8 {
    fn from(code: ColorCode) -> Self {
        code.value()
    }
}

impl TryFrom<u8> for ColorCode {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(format!("color code must be 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Validated gender prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Case-insensitive parse; anything but "male"/"female" is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(AvatarError::InvalidGender {
                value: raw.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn color_code(self) -> ColorCode {
        match self {
            Self::Male => ColorCode::One,
            Self::Female => ColorCode::Zero,
        }
    }
}

/// How the background class is chosen once gender has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRule {
    /// Parity of the first character always wins, even over a valid gender.
    #[default]
    CharParity,
    /// A valid gender decides; parity is used only without one.
    GenderPreferred,
}

impl ColorRule {
    /// Pick the colour code for `source`, the string the display text was
    /// derived from (custom text or name).
    #[must_use]
    pub fn select(self, gender: Option<Gender>, source: &str) -> ColorCode {
        let parity = parity_code(source);
        match (self, gender) {
            (Self::GenderPreferred, Some(gender)) => gender.color_code(),
            // The gender code is discarded here; a valid gender only passes
            // validation and never decides the class under this rule.
            (Self::CharParity, _) | (Self::GenderPreferred, None) => parity,
        }
    }
}

impl std::str::FromStr for ColorRule {
    type Err = AvatarError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "char_parity" | "char-parity" => Ok(Self::CharParity),
            "gender_preferred" | "gender-preferred" => Ok(Self::GenderPreferred),
            other => Err(AvatarError::ConfigParse {
                context: "color_rule",
                details: format!("unknown color rule {other:?}"),
            }),
        }
    }
}

/// Parity of the first UTF-16 code unit of `source`.
///
/// Characters outside the BMP contribute their high surrogate. An empty
/// source maps to [`ColorCode::Zero`].
#[must_use]
pub fn parity_code(source: &str) -> ColorCode {
    let mut buf = [0u16; 2];
    source
        .chars()
        .next()
        .map_or(ColorCode::Zero, |c| {
            ColorCode::from_parity(c.encode_utf16(&mut buf)[0])
        })
}
