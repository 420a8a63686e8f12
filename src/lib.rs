#![forbid(unsafe_code)]

//! Avatar badge: decides what an avatar widget shows: the user's image, an
//! initials badge, an "empty name" body icon, or a generic silhouette.
//!
//! The core is [`resolver::resolve`], a pure function from name, custom
//! text, gender and dimensions to badge text, a binary colour class and a
//! font size. [`widget::AvatarWidget`] wraps it with prop defaults,
//! recompute-on-change and view selection for renderers.
//!
//! # Library usage
//!
//! ```rust
//! use avatar_badge::prelude::*;
//!
//! let result = resolve(&AvatarInput::named("欧阳锋")).unwrap();
//! assert_eq!(result.text, "阳锋");
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod resolver;
pub mod widget;
