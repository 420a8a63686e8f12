//! Which of the four avatar variants to draw, with the style values a
//! renderer needs.

#![allow(missing_docs)]

use serde::Serialize;

use super::props::AvatarProps;
use crate::resolver::DisplayResult;

/// Box dimensions and corner rounding shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarStyle {
    pub width: f64,
    pub height: f64,
    /// `"100%"` for round avatars, `"0"` otherwise.
    pub border_radius: &'static str,
}

impl AvatarStyle {
    #[must_use]
    pub fn from_props(props: &AvatarProps) -> Self {
        Self {
            width: props.width,
            height: props.height,
            border_radius: if props.is_round { "100%" } else { "0" },
        }
    }
}

/// The variant to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvatarView {
    /// The user's image.
    Image { src: String, style: AvatarStyle },
    /// Initials badge.
    Initials {
        text: String,
        class: String,
        font_size: f64,
        line_height: f64,
        style: AvatarStyle,
    },
    /// Name supplied but empty.
    NoDisplayName { style: AvatarStyle },
    /// No name, or the image failed to load.
    Nobody { style: AvatarStyle },
}

impl AvatarView {
    /// Pick the variant for the current props, result and image state.
    #[must_use]
    pub fn select(props: &AvatarProps, result: &DisplayResult, image_failed: bool) -> Self {
        let style = AvatarStyle::from_props(props);
        if image_failed {
            return Self::Nobody { style };
        }
        if let Some(src) = props.image_source() {
            return Self::Image {
                src: src.to_string(),
                style,
            };
        }
        if result.show_placeholder {
            Self::Nobody { style }
        } else if result.text.is_empty() {
            Self::NoDisplayName { style }
        } else {
            Self::Initials {
                text: result.text.clone(),
                class: format!("devui-avatar-style {}", result.color_code.css_class()),
                font_size: result.font_size,
                line_height: props.height,
                style,
            }
        }
    }

    /// Short machine-readable variant name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Initials { .. } => "initials",
            Self::NoDisplayName { .. } => "no_display_name",
            Self::Nobody { .. } => "nobody",
        }
    }

    #[must_use]
    pub const fn style(&self) -> &AvatarStyle {
        match self {
            Self::Image { style, .. }
            | Self::Initials { style, .. }
            | Self::NoDisplayName { style }
            | Self::Nobody { style } => style,
        }
    }
}
