#![forbid(unsafe_code)]

//! Slide transition between two content panels.
//!
//! The transition is a small state machine advanced by the host:
//!
//! ```text
//! Idle → SlidingOut → SlidingIn → Settled
//! ```
//!
//! - `begin` stages both panels (outgoing centered, incoming on the leading
//!   edge) and enters `SlidingOut`. The host schedules a step after
//!   [`TransitionConfig::start_delay`].
//! - The first step moves the outgoing panel to the trailing edge and the
//!   incoming panel to the center (`SlidingIn`). The host schedules a second
//!   step after [`TransitionConfig::settle_time`].
//! - The second step hides the outgoing panel and clears both slots
//!   (`Settled`).
//!
//! # Invariants
//!
//! - Every `begin` mints a fresh [`TransitionTicket`]; steps carrying any
//!   other ticket are ignored, so timers from a superseded transition can
//!   never mutate a panel that is no longer in view.
//! - `interrupt` settles an in-flight transition immediately and returns the
//!   panels that need their slots cleared.

use std::time::Duration;

use crate::panel::PanelKey;

// ============================================================================
// Phase / Direction / Slot
// ============================================================================

/// Phase of the slide transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    /// No transition has run yet.
    #[default]
    Idle,
    /// Panels staged; waiting for the start delay.
    SlidingOut,
    /// Incoming panel sliding to the center.
    SlidingIn,
    /// Last transition completed (or was interrupted).
    Settled,
}

impl TransitionPhase {
    /// Whether a transition is in flight.
    #[inline]
    pub fn is_animating(self) -> bool {
        matches!(self, Self::SlidingOut | Self::SlidingIn)
    }
}

/// Paging direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideDirection {
    /// Paging forward; new content enters from the leading edge.
    #[default]
    Forward,
    /// Paging backward; the slot classes are mirrored.
    Backward,
}

impl SlideDirection {
    /// Direction for a boolean "animate forward" flag.
    pub fn from_forward(forward: bool) -> Self {
        if forward { Self::Forward } else { Self::Backward }
    }
}

/// Horizontal slot a panel occupies while sliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideSlot {
    /// Where the incoming panel starts.
    Leading,
    /// Fully in view.
    Center,
    /// Where the outgoing panel ends.
    Trailing,
}

impl SlideSlot {
    /// All slots.
    pub const ALL: [SlideSlot; 3] = [Self::Leading, Self::Center, Self::Trailing];

    /// CSS class for this slot when sliding in `direction`.
    pub fn class_name(self, direction: SlideDirection) -> &'static str {
        match (direction, self) {
            (SlideDirection::Forward, Self::Trailing) => "slide-a",
            (SlideDirection::Forward, Self::Center) => "slide-b",
            (SlideDirection::Forward, Self::Leading) => "slide-c",
            (SlideDirection::Backward, Self::Trailing) => "slide-c",
            (SlideDirection::Backward, Self::Center) => "slide-b",
            (SlideDirection::Backward, Self::Leading) => "slide-a",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Timing of the slide transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionConfig {
    /// Delay between staging the panels and starting the slide.
    pub start_delay: Duration,
    /// Duration of the slide itself.
    pub settle_time: Duration,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(10),
            settle_time: Duration::from_millis(500),
        }
    }
}

impl TransitionConfig {
    /// Set the start delay.
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Set the settle time.
    pub fn settle_time(mut self, time: Duration) -> Self {
        self.settle_time = time;
        self
    }
}

// ============================================================================
// State
// ============================================================================

/// Identifies one `begin` call. Timers carry it back into [`SlideTransition::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionTicket(u64);

impl TransitionTicket {
    /// Raw generation number, for hosts that round-trip it through JS.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Rebuild a ticket from its raw generation number.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Side effect requested by a transition step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionStep {
    /// Move `outgoing` to the trailing slot and `incoming` to the center.
    Slide {
        outgoing: PanelKey,
        incoming: PanelKey,
        direction: SlideDirection,
    },
    /// Hide `outgoing` and clear the slot of both panels.
    Settle {
        outgoing: PanelKey,
        incoming: PanelKey,
        direction: SlideDirection,
    },
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: TransitionTicket,
    outgoing: PanelKey,
    incoming: PanelKey,
    direction: SlideDirection,
}

/// Panels left behind by an interrupted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupted {
    pub outgoing: PanelKey,
    pub incoming: PanelKey,
    pub direction: SlideDirection,
}

/// Slide transition state.
#[derive(Debug, Clone, Default)]
pub struct SlideTransition {
    phase: TransitionPhase,
    generation: u64,
    active: Option<InFlight>,
}

impl SlideTransition {
    /// Create an idle transition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Whether a transition is in flight.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.phase.is_animating()
    }

    /// Ticket of the in-flight transition, if any.
    pub fn current_ticket(&self) -> Option<TransitionTicket> {
        self.active.as_ref().map(|active| active.ticket)
    }

    /// Panel sliding in, if a transition is in flight.
    pub fn incoming(&self) -> Option<&PanelKey> {
        self.active.as_ref().map(|active| &active.incoming)
    }

    /// Start sliding from `outgoing` to `incoming`.
    ///
    /// Callers must [`interrupt`](Self::interrupt) any in-flight transition
    /// first; an unfinished one is dropped here and its ticket invalidated.
    pub fn begin(
        &mut self,
        outgoing: PanelKey,
        incoming: PanelKey,
        direction: SlideDirection,
    ) -> TransitionTicket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = TransitionTicket(self.generation);
        self.active = Some(InFlight {
            ticket,
            outgoing,
            incoming,
            direction,
        });
        self.phase = TransitionPhase::SlidingOut;
        ticket
    }

    /// Settle the in-flight transition immediately.
    pub fn interrupt(&mut self) -> Option<Interrupted> {
        let active = self.active.take()?;
        self.phase = TransitionPhase::Settled;
        Some(Interrupted {
            outgoing: active.outgoing,
            incoming: active.incoming,
            direction: active.direction,
        })
    }

    /// Advance the transition when a timer carrying `ticket` fires.
    ///
    /// Returns `None` for stale tickets and when nothing is in flight.
    pub fn step(&mut self, ticket: TransitionTicket) -> Option<TransitionStep> {
        let active = self.active.as_ref()?;
        if active.ticket != ticket {
            tracing::trace!(
                message = "overlay.transition.stale",
                ticket = ticket.0,
                current = active.ticket.0
            );
            return None;
        }
        match self.phase {
            TransitionPhase::SlidingOut => {
                self.phase = TransitionPhase::SlidingIn;
                Some(TransitionStep::Slide {
                    outgoing: active.outgoing.clone(),
                    incoming: active.incoming.clone(),
                    direction: active.direction,
                })
            }
            TransitionPhase::SlidingIn => {
                let active = self.active.take()?;
                self.phase = TransitionPhase::Settled;
                Some(TransitionStep::Settle {
                    outgoing: active.outgoing,
                    incoming: active.incoming,
                    direction: active.direction,
                })
            }
            TransitionPhase::Idle | TransitionPhase::Settled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (PanelKey, PanelKey) {
        (PanelKey::new("old"), PanelKey::new("new"))
    }

    #[test]
    fn phases_advance_in_order() {
        let (old, new) = keys();
        let mut t = SlideTransition::new();
        assert_eq!(t.phase(), TransitionPhase::Idle);

        let ticket = t.begin(old.clone(), new.clone(), SlideDirection::Forward);
        assert_eq!(t.phase(), TransitionPhase::SlidingOut);
        assert!(t.is_animating());

        assert_eq!(
            t.step(ticket),
            Some(TransitionStep::Slide {
                outgoing: old.clone(),
                incoming: new.clone(),
                direction: SlideDirection::Forward,
            })
        );
        assert_eq!(t.phase(), TransitionPhase::SlidingIn);

        assert!(matches!(t.step(ticket), Some(TransitionStep::Settle { .. })));
        assert_eq!(t.phase(), TransitionPhase::Settled);
        assert!(!t.is_animating());
        assert_eq!(t.step(ticket), None);
    }

    #[test]
    fn superseded_tickets_are_ignored() {
        let (old, new) = keys();
        let mut t = SlideTransition::new();
        let first = t.begin(old.clone(), new.clone(), SlideDirection::Forward);
        assert!(t.interrupt().is_some());
        let second = t.begin(new, old, SlideDirection::Backward);
        assert_ne!(first, second);

        assert_eq!(t.step(first), None);
        assert_eq!(t.phase(), TransitionPhase::SlidingOut);
        assert!(t.step(second).is_some());
    }

    #[test]
    fn interrupt_without_flight_is_none() {
        let mut t = SlideTransition::new();
        assert!(t.interrupt().is_none());
        assert_eq!(t.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn slot_classes_mirror_for_backward_paging() {
        assert_eq!(SlideSlot::Leading.class_name(SlideDirection::Forward), "slide-c");
        assert_eq!(SlideSlot::Leading.class_name(SlideDirection::Backward), "slide-a");
        assert_eq!(SlideSlot::Center.class_name(SlideDirection::Backward), "slide-b");
    }

    #[test]
    fn default_timings() {
        let config = TransitionConfig::default();
        assert_eq!(config.start_delay, Duration::from_millis(10));
        assert_eq!(config.settle_time, Duration::from_millis(500));
    }
}
