//! Stateful avatar widget: owns the props and the latest [`DisplayResult`],
//! re-resolving whenever a watched prop changes.
//!
//! ```rust
//! use avatar_badge::widget::{AvatarProps, AvatarWidget};
//!
//! let mut widget = AvatarWidget::new(AvatarProps::named("Grace Hopper")).unwrap();
//! assert_eq!(widget.result().text, "GH");
//! widget.set_width(24.0).unwrap();
//! assert_eq!(widget.result().text, "G");
//! ```

pub mod props;
pub mod view;

pub use props::AvatarProps;
pub use view::{AvatarStyle, AvatarView};

use crate::core::errors::Result;
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::resolver::{DisplayResult, Resolver};

/// Handle returned by [`AvatarWidget::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&DisplayResult)>;

/// One avatar instance.
pub struct AvatarWidget {
    props: AvatarProps,
    resolver: Resolver,
    current: DisplayResult,
    image_failed: bool,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    activity: Option<JsonlWriter>,
}

impl std::fmt::Debug for AvatarWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarWidget")
            .field("props", &self.props)
            .field("current", &self.current)
            .field("image_failed", &self.image_failed)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl AvatarWidget {
    /// Build a widget with the default resolver.
    ///
    /// # Errors
    ///
    /// Fails when the initial props carry an invalid gender.
    pub fn new(props: AvatarProps) -> Result<Self> {
        Self::with_resolver(props, Resolver::default())
    }

    /// Build a widget with a configured resolver.
    ///
    /// # Errors
    ///
    /// Fails when the initial props carry an invalid gender.
    pub fn with_resolver(props: AvatarProps, resolver: Resolver) -> Result<Self> {
        let current = resolver.resolve(&props.input())?;
        Ok(Self {
            props,
            resolver,
            current,
            image_failed: false,
            observers: Vec::new(),
            next_observer: 0,
            activity: None,
        })
    }

    /// Attach an activity log; the current state is recorded immediately.
    #[must_use]
    pub fn with_activity_log(mut self, writer: JsonlWriter) -> Self {
        self.activity = Some(writer);
        self.log(LogEntry::for_result(&self.current).with_view(self.view().kind()));
        self
    }

    #[must_use]
    pub const fn props(&self) -> &AvatarProps {
        &self.props
    }

    /// The latest resolution.
    #[must_use]
    pub const fn result(&self) -> &DisplayResult {
        &self.current
    }

    #[must_use]
    pub const fn image_failed(&self) -> bool {
        self.image_failed
    }

    /// The variant a renderer should draw right now.
    #[must_use]
    pub fn view(&self) -> AvatarView {
        AvatarView::select(&self.props, &self.current, self.image_failed)
    }

    /// Register a callback run after every successful re-resolution.
    pub fn subscribe(&mut self, observer: impl FnMut(&DisplayResult) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a callback. Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Apply a prop change.
    ///
    /// A change to a watched prop re-resolves first; if resolution fails the
    /// widget keeps its previous props and result and the error is returned.
    /// A new image source clears the image-failure flag.
    ///
    /// # Errors
    ///
    /// Propagates [`Resolver::resolve`] errors.
    pub fn update(&mut self, change: impl FnOnce(&mut AvatarProps)) -> Result<&DisplayResult> {
        let mut candidate = self.props.clone();
        change(&mut candidate);

        let recompute = candidate.watched_differs(&self.props);
        let next = if recompute {
            match self.resolver.resolve(&candidate.input()) {
                Ok(result) => Some(result),
                Err(err) => {
                    self.log(LogEntry::for_error(&err));
                    return Err(err);
                }
            }
        } else {
            None
        };

        if candidate.img_src != self.props.img_src {
            self.image_failed = false;
        }
        self.props = candidate;

        if let Some(result) = next {
            self.current = result;
            for (_, observer) in &mut self.observers {
                observer(&self.current);
            }
            self.log(LogEntry::for_result(&self.current).with_view(self.view().kind()));
        }
        Ok(&self.current)
    }

    /// # Errors
    ///
    /// See [`AvatarWidget::update`].
    pub fn set_name(&mut self, name: Option<String>) -> Result<&DisplayResult> {
        self.update(|p| p.name = name)
    }

    /// # Errors
    ///
    /// Fails on a gender other than "male"/"female".
    pub fn set_gender(&mut self, gender: Option<String>) -> Result<&DisplayResult> {
        self.update(|p| p.gender = gender)
    }

    /// # Errors
    ///
    /// See [`AvatarWidget::update`].
    pub fn set_width(&mut self, width: f64) -> Result<&DisplayResult> {
        self.update(|p| p.width = width)
    }

    /// # Errors
    ///
    /// See [`AvatarWidget::update`].
    pub fn set_height(&mut self, height: f64) -> Result<&DisplayResult> {
        self.update(|p| p.height = height)
    }

    /// # Errors
    ///
    /// See [`AvatarWidget::update`].
    pub fn set_custom_text(&mut self, text: Option<String>) -> Result<&DisplayResult> {
        self.update(|p| p.custom_text = text)
    }

    pub fn set_is_round(&mut self, is_round: bool) {
        self.props.is_round = is_round;
    }

    pub fn set_img_src(&mut self, src: Option<String>) {
        if src != self.props.img_src {
            self.image_failed = false;
        }
        self.props.img_src = src;
    }

    /// Record that the image could not be loaded; the view drops to the
    /// silhouette until the source changes.
    pub fn mark_image_failed(&mut self) {
        if self.image_failed {
            return;
        }
        self.image_failed = true;
        if self.activity.is_some() {
            let mut entry = LogEntry::new(EventType::ImageLoadFailed, Severity::Warning)
                .with_view(self.view().kind());
            entry.img_src = self.props.img_src.clone();
            self.log(entry);
        }
    }

    fn log(&mut self, entry: LogEntry) {
        if let Some(writer) = self.activity.as_mut() {
            writer.write_entry(&entry);
        }
    }
}

impl Drop for AvatarWidget {
    fn drop(&mut self) {
        if let Some(writer) = self.activity.as_mut() {
            writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::resolver::color::ColorCode;

    #[test]
    fn construction_resolves_immediately() {
        let widget = AvatarWidget::new(AvatarProps::named("John_Smith")).unwrap();
        assert_eq!(widget.result().text, "JS");
        assert_eq!(widget.view().kind(), "initials");
    }

    #[test]
    fn invalid_gender_fails_construction() {
        let props = AvatarProps {
            gender: Some("Other".into()),
            ..AvatarProps::default()
        };
        assert_eq!(AvatarWidget::new(props).unwrap_err().code(), "AVB-2001");
    }

    #[test]
    fn watched_change_recomputes_and_notifies() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        widget.subscribe(move |result| sink.borrow_mut().push(result.text.clone()));

        widget.set_name(Some("Bob".into())).unwrap();
        widget.set_width(20.0).unwrap();

        assert_eq!(*seen.borrow(), vec!["BO".to_string(), "B".to_string()]);
        assert_eq!(widget.result().text, "B");
    }

    #[test]
    fn unwatched_change_does_not_notify() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        widget.subscribe(move |_| *counter.borrow_mut() += 1);

        widget.set_is_round(false);
        widget.set_img_src(Some("a.png".into()));
        widget.update(|p| p.is_round = true).unwrap();

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(widget.view().kind(), "image");
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        let before = widget.result().clone();

        let err = widget.set_gender(Some("robot".into())).unwrap_err();
        assert_eq!(err.code(), "AVB-2001");
        assert_eq!(widget.result(), &before);
        assert!(widget.props().gender.is_none());

        widget.set_gender(Some("Female".into())).unwrap();
        assert_eq!(widget.props().gender.as_deref(), Some("Female"));
        // Parity of 'a' still decides.
        assert_eq!(widget.result().color_code, ColorCode::One);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let id = widget.subscribe(move |_| *counter.borrow_mut() += 1);

        widget.set_name(Some("Bob".into())).unwrap();
        assert!(widget.unsubscribe(id));
        assert!(!widget.unsubscribe(id));
        widget.set_name(Some("Carol".into())).unwrap();

        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn image_failure_is_sticky_until_source_changes() {
        let mut props = AvatarProps::named("alice");
        props.img_src = Some("broken.png".into());
        let mut widget = AvatarWidget::new(props).unwrap();
        assert_eq!(widget.view().kind(), "image");

        widget.mark_image_failed();
        assert!(widget.image_failed());
        assert_eq!(widget.view().kind(), "nobody");

        widget.set_name(Some("Bob".into())).unwrap();
        assert_eq!(widget.view().kind(), "nobody");

        widget.set_img_src(Some("fixed.png".into()));
        assert!(!widget.image_failed());
        assert_eq!(widget.view().kind(), "image");

        widget.mark_image_failed();
        widget.set_img_src(None);
        assert_eq!(widget.view().kind(), "initials");
    }

    #[test]
    fn clearing_name_switches_views() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        widget.set_name(Some(String::new())).unwrap();
        assert!(widget.result().is_empty);
        assert_eq!(widget.view().kind(), "no_display_name");

        widget.set_name(None).unwrap();
        assert!(widget.result().show_placeholder);
        assert_eq!(widget.view().kind(), "nobody");
    }

    #[test]
    fn custom_text_takes_over_and_releases() {
        let mut widget = AvatarWidget::new(AvatarProps::named("alice")).unwrap();
        widget.set_custom_text(Some("VIP".into())).unwrap();
        assert_eq!(widget.result().text, "VIP");
        widget.set_custom_text(None).unwrap();
        assert_eq!(widget.result().text, "AL");
    }

    #[test]
    fn activity_log_records_lifecycle() {
        use crate::logger::jsonl::JsonlConfig;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.jsonl");
        let writer = JsonlWriter::open(JsonlConfig {
            path: path.clone(),
            fallback_path: None,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 2,
        });

        {
            let mut widget = AvatarWidget::new(AvatarProps::named("alice"))
                .unwrap()
                .with_activity_log(writer);
            widget.set_name(None).unwrap();
            let _ = widget.set_gender(Some("nope".into()));
            widget.set_img_src(Some("x.png".into()));
            widget.mark_image_failed();
        }

        let events: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            events,
            vec![
                "resolved",
                "placeholder_shown",
                "invalid_gender",
                "image_load_failed"
            ]
        );
    }
}
