//! Convenience re-exports for library consumers.
//!
//! ```rust
//! use avatar_badge::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, ResolverConfig, WidgetConfig};
pub use crate::core::errors::{AvatarError, Result};

// Resolver
pub use crate::resolver::color::{ColorCode, ColorRule, Gender};
pub use crate::resolver::{AvatarInput, DisplayResult, Resolver, resolve};

// Widget
pub use crate::widget::{AvatarProps, AvatarStyle, AvatarView, AvatarWidget, ObserverId};

// Logging
pub use crate::logger::jsonl::{JsonlConfig, JsonlWriter, LogEntry};
