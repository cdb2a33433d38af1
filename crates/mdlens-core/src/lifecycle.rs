//! Timed lifecycle of temporary highlight markers.
//!
//! A marker is active as soon as it is armed, starts fading once the hold
//! duration has elapsed and loses every highlight trace after the fade. Both
//! timers are fixed when the marker is armed and are never cancelled. A
//! reload of the document turns their target into a stale id, which every
//! transition below treats as a no-op.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::dom::{Document, NodeId};
use crate::highlight::MARKER_CLASS;

pub const FADING_CLASS: &str = "fading";
const TRANSITION_PROPERTY: &str = "transition";

pub type SharedDocument = Rc<RefCell<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightTiming {
    pub hold: Duration,
    pub fade: Duration,
}

impl HighlightTiming {
    #[must_use]
    pub const fn from_millis(hold_ms: u64, fade_ms: u64) -> Self {
        Self {
            hold: Duration::from_millis(hold_ms),
            fade: Duration::from_millis(fade_ms),
        }
    }

    /// Total time from arming until removal.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.hold.saturating_add(self.fade)
    }

    /// Transition hint applied while the marker is on screen.
    #[must_use]
    pub fn transition(&self) -> String {
        let fade_ms = self.fade.as_millis();
        format!("background {fade_ms}ms, box-shadow {fade_ms}ms")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPhase {
    Active,
    Fading,
    Removed,
}

impl MarkerPhase {
    /// Phase of a marker `elapsed` after it was armed.
    #[must_use]
    pub fn at(elapsed: Duration, timing: HighlightTiming) -> Self {
        if elapsed < timing.hold {
            Self::Active
        } else if elapsed < timing.total() {
            Self::Fading
        } else {
            Self::Removed
        }
    }

    /// Phase read back from the node's classes. `None` for a stale id.
    #[must_use]
    pub fn observe(document: &Document, marker: NodeId) -> Option<Self> {
        if !document.contains(marker) {
            return None;
        }
        let phase = match (
            document.has_class(marker, MARKER_CLASS),
            document.has_class(marker, FADING_CLASS),
        ) {
            (true, true) => Self::Fading,
            (true, false) => Self::Active,
            (false, _) => Self::Removed,
        };
        Some(phase)
    }
}

/// Puts `marker` into its active look. Returns `false` when the id is stale.
pub fn apply_active(document: &mut Document, marker: NodeId, timing: HighlightTiming) -> bool {
    if !document.contains(marker) {
        return false;
    }
    document.add_class(marker, MARKER_CLASS);
    document.set_style(marker, TRANSITION_PROPERTY, &timing.transition());
    true
}

pub fn enter_fading(document: &mut Document, marker: NodeId) -> bool {
    if !document.has_class(marker, MARKER_CLASS) {
        return false;
    }
    document.add_class(marker, FADING_CLASS);
    true
}

/// Strips every highlight trace from `marker`. Safe to call any number of
/// times, including after the node was replaced by a later render.
pub fn remove(document: &mut Document, marker: NodeId) -> bool {
    if !document.contains(marker) {
        return false;
    }
    document.remove_class(marker, MARKER_CLASS);
    document.remove_class(marker, FADING_CLASS);
    document.set_style(marker, TRANSITION_PROPERTY, "");
    true
}

/// Activates `marker` now and schedules its fade and removal on the current
/// `LocalSet`.
pub fn arm(document: &SharedDocument, marker: NodeId, timing: HighlightTiming) {
    apply_active(&mut document.borrow_mut(), marker, timing);
    let armed_at = Instant::now();

    let fade_target = Rc::clone(document);
    tokio::task::spawn_local(async move {
        sleep_until(armed_at + timing.hold).await;
        if !enter_fading(&mut fade_target.borrow_mut(), marker) {
            tracing::trace!(?marker, "fade skipped for a marker that is gone");
        }
    });

    let remove_target = Rc::clone(document);
    tokio::task::spawn_local(async move {
        sleep_until(armed_at + timing.total()).await;
        remove(&mut remove_target.borrow_mut(), marker);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Markup;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    const TIMING: HighlightTiming = HighlightTiming::from_millis(400, 100);

    fn marked_document() -> (SharedDocument, NodeId) {
        let mut doc = Document::from_markup(
            "div",
            None,
            &[Markup::element("p", vec![Markup::text("hello")])],
        );
        let paragraph = doc.children(doc.root())[0];
        let marker = doc.create_element("span");
        doc.add_class(marker, MARKER_CLASS);
        doc.append_child(paragraph, marker);
        (Rc::new(RefCell::new(doc)), marker)
    }

    fn observed(doc: &SharedDocument, marker: NodeId) -> Option<MarkerPhase> {
        MarkerPhase::observe(&doc.borrow(), marker)
    }

    #[test]
    fn phase_boundaries_are_half_open() {
        let ms = Duration::from_millis;
        assert_eq!(MarkerPhase::at(ms(0), TIMING), MarkerPhase::Active);
        assert_eq!(MarkerPhase::at(ms(399), TIMING), MarkerPhase::Active);
        assert_eq!(MarkerPhase::at(ms(400), TIMING), MarkerPhase::Fading);
        assert_eq!(MarkerPhase::at(ms(499), TIMING), MarkerPhase::Fading);
        assert_eq!(MarkerPhase::at(ms(500), TIMING), MarkerPhase::Removed);
        assert_eq!(MarkerPhase::at(ms(10_000), TIMING), MarkerPhase::Removed);
    }

    #[test]
    fn transition_hint_uses_fade_duration() {
        assert_eq!(
            HighlightTiming::from_millis(4000, 700).transition(),
            "background 700ms, box-shadow 700ms"
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let (doc, marker) = marked_document();
        let mut doc = doc.borrow_mut();
        apply_active(&mut doc, marker, TIMING);
        enter_fading(&mut doc, marker);

        assert!(remove(&mut doc, marker));
        let once = doc.outer_html(marker);
        assert!(remove(&mut doc, marker));
        assert_eq!(doc.outer_html(marker), once);
        assert_eq!(once, "<span></span>");
        assert_eq!(MarkerPhase::observe(&doc, marker), Some(MarkerPhase::Removed));
    }

    #[test]
    fn transitions_on_stale_ids_are_no_ops() {
        let (doc, marker) = marked_document();
        let mut doc = doc.borrow_mut();
        doc.load(&[Markup::element("p", vec![Markup::text("fresh")])]);
        let before = doc.inner_html(doc.root());

        assert!(!apply_active(&mut doc, marker, TIMING));
        assert!(!enter_fading(&mut doc, marker));
        assert!(!remove(&mut doc, marker));
        assert_eq!(doc.inner_html(doc.root()), before);
        assert_eq!(MarkerPhase::observe(&doc, marker), None);
    }

    #[test]
    fn fading_requires_an_active_marker() {
        let (doc, marker) = marked_document();
        let mut doc = doc.borrow_mut();
        remove(&mut doc, marker);
        assert!(!enter_fading(&mut doc, marker));
        assert!(!doc.has_class(marker, FADING_CLASS));
    }

    /// Lets timers due at the current instant run before the next check.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn armed_marker_walks_through_every_phase() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let (doc, marker) = marked_document();
                arm(&doc, marker, TIMING);
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Active));
                assert_eq!(
                    doc.borrow().style(marker, "transition"),
                    Some("background 100ms, box-shadow 100ms")
                );

                sleep(Duration::from_millis(399)).await;
                settle().await;
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Active));

                sleep(Duration::from_millis(1)).await;
                settle().await;
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Fading));

                sleep(Duration::from_millis(1)).await;
                settle().await;
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Fading));

                sleep(Duration::from_millis(98)).await;
                settle().await;
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Fading));

                sleep(Duration::from_millis(1)).await;
                settle().await;
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Removed));
                assert_eq!(doc.borrow().style(marker, "transition"), None);

                remove(&mut doc.borrow_mut(), marker);
                assert_eq!(observed(&doc, marker), Some(MarkerPhase::Removed));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn timers_fire_harmlessly_after_reload() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let (doc, marker) = marked_document();
                arm(&doc, marker, TIMING);
                doc.borrow_mut()
                    .load(&[Markup::element("p", vec![Markup::text("next page")])]);
                let reloaded = doc.borrow().inner_html(doc.borrow().root());

                sleep(TIMING.total() + Duration::from_millis(10)).await;
                assert_eq!(doc.borrow().inner_html(doc.borrow().root()), reloaded);
                assert_eq!(observed(&doc, marker), None);
            })
            .await;
    }
}
