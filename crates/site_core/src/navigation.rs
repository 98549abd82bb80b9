//! Scroll-driven section highlighting.
//!
//! The tracker maps the probe point (scroll offset plus half the viewport)
//! to the first section, in list order, whose extent contains it. Activation
//! is scoped: [`NavigationTracker::activate`] takes one scroll subscription
//! and one recompute task, and [`ActiveNavigation`] releases both.

use std::sync::Arc;

use site_shared::domain::SectionId;
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::debug;

pub const DEFAULT_SCROLL_THRESHOLD: f64 = 300.0;
const SCROLL_BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBounds {
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Lower bound inclusive, upper bound exclusive.
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

pub fn probe_point(scroll_offset: f64, viewport_height: f64) -> f64 {
    scroll_offset + viewport_height / 2.0
}

/// Live geometry of the hosting window.
pub trait PageLayout: Send + Sync {
    fn scroll_offset(&self) -> f64;
    fn viewport_height(&self) -> f64;
    /// `None` when the section has not been rendered yet.
    fn section_bounds(&self, section: &SectionId) -> Option<SectionBounds>;
    /// Brings the section into view. Returns false if it is not on the page.
    fn scroll_into_view(&self, section: &SectionId) -> bool;
    fn scroll_to_offset(&self, offset: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub active_section: SectionId,
    pub scroll_threshold_crossed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("navigation needs at least one section")]
    NoSections,
}

#[derive(Debug, Clone)]
pub struct NavigationTracker {
    sections: Vec<SectionId>,
    scroll_threshold: f64,
    state: NavigationState,
}

impl Default for NavigationTracker {
    fn default() -> Self {
        let sections = SectionId::default_sequence();
        Self {
            state: NavigationState {
                active_section: sections[0].clone(),
                scroll_threshold_crossed: false,
            },
            sections,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }
}

impl NavigationTracker {
    /// `sections` is the priority order; the first one starts out active.
    pub fn new(sections: Vec<SectionId>, scroll_threshold: f64) -> Result<Self, NavigationError> {
        let first = sections.first().cloned().ok_or(NavigationError::NoSections)?;
        Ok(Self {
            sections,
            scroll_threshold,
            state: NavigationState {
                active_section: first,
                scroll_threshold_crossed: false,
            },
        })
    }

    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn active_section(&self) -> &SectionId {
        &self.state.active_section
    }

    pub fn scroll_threshold_crossed(&self) -> bool {
        self.state.scroll_threshold_crossed
    }

    /// Re-reads the layout. Sections missing from the page are skipped, and
    /// when no section holds the probe point the previous one stays active.
    pub fn recompute(&mut self, layout: &dyn PageLayout) -> &NavigationState {
        let offset = layout.scroll_offset();
        let probe = probe_point(offset, layout.viewport_height());
        self.state.scroll_threshold_crossed = offset > self.scroll_threshold;

        let hit = self.sections.iter().find(|section| {
            layout
                .section_bounds(section)
                .is_some_and(|bounds| bounds.contains(probe))
        });
        if let Some(section) = hit {
            if *section != self.state.active_section {
                debug!(from = %self.state.active_section, to = %section, probe, "active section changed");
                self.state.active_section = section.clone();
            }
        }
        &self.state
    }

    /// Scrolls to a section. Highlighting still follows the resulting scroll.
    pub fn navigate_to(&self, layout: &dyn PageLayout, section: &SectionId) -> bool {
        let moved = layout.scroll_into_view(section);
        if !moved {
            debug!(%section, "navigation target not on page");
        }
        moved
    }

    /// Back to the top of the page. The host fires a scroll event afterwards,
    /// which clears the threshold flag.
    pub fn scroll_to_top(&self, layout: &dyn PageLayout) {
        debug!("scrolling to top");
        layout.scroll_to_offset(0.0);
    }

    /// Same as [`NavigationTracker::navigate_to`] for a URL fragment like `#skills`.
    pub fn navigate_to_hash(&self, layout: &dyn PageLayout, hash: &str) -> bool {
        match SectionId::from_hash(hash) {
            Some(section) => self.navigate_to(layout, &section),
            None => false,
        }
    }

    /// Subscribes to `bus` and keeps the state current until the returned
    /// guard is deactivated or dropped. Must be called inside a tokio runtime.
    pub fn activate(mut self, layout: Arc<dyn PageLayout>, bus: &ScrollBus) -> ActiveNavigation {
        let mut events = BroadcastStream::new(bus.subscribe());
        let (tx, rx) = watch::channel(self.recompute(layout.as_ref()).clone());

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "scroll events coalesced");
                }
                let state = self.recompute(layout.as_ref()).clone();
                tx.send_replace(state);
            }
        });

        ActiveNavigation {
            state: rx,
            task: Some(task),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent;

/// Scroll notifications fired by the hosting window.
#[derive(Debug, Clone)]
pub struct ScrollBus {
    tx: broadcast::Sender<ScrollEvent>,
}

impl Default for ScrollBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SCROLL_BUS_CAPACITY);
        Self { tx }
    }

    /// Fires one scroll event and returns how many listeners saw it.
    pub fn notify(&self) -> usize {
        self.tx.send(ScrollEvent).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScrollEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A mounted tracker. Dropping it aborts the recompute task, which releases
/// the scroll subscription.
pub struct ActiveNavigation {
    state: watch::Receiver<NavigationState>,
    task: Option<JoinHandle<()>>,
}

impl ActiveNavigation {
    pub fn state(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.clone()
    }

    /// Waits for the next recompute. `None` once the tracker has stopped.
    pub async fn next_update(&mut self) -> Option<NavigationState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Stops tracking and waits until the scroll subscription is released.
    pub async fn deactivate(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ActiveNavigation {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
