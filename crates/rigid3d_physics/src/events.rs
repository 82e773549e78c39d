//! Simulation events, queued for the application to drain

use bitflags::bitflags;

use crate::body::BodyKey;
use crate::collision::CollisionInfo;

/// Something that happened inside the world
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhysicsEvent {
    BodyAdded(BodyKey),
    BodyRemoved(BodyKey),
    /// A solid contact, reported after solving with its accumulated impulse
    ///
    /// Contacts between two static or kinematic bodies are reported as well,
    /// with zero impulse.
    Collision(CollisionInfo),
    /// A contact involving a trigger collider; never resolved
    Trigger(CollisionInfo),
    /// Fraction of a fixed step left in the accumulator after `step`
    Interpolate(f32),
}

impl PhysicsEvent {
    /// The mask bit this event is filtered by
    pub fn mask(&self) -> EventMask {
        match self {
            PhysicsEvent::BodyAdded(_) => EventMask::BODY_ADDED,
            PhysicsEvent::BodyRemoved(_) => EventMask::BODY_REMOVED,
            PhysicsEvent::Collision(_) => EventMask::COLLISION,
            PhysicsEvent::Trigger(_) => EventMask::TRIGGER,
            PhysicsEvent::Interpolate(_) => EventMask::INTERPOLATE,
        }
    }
}

bitflags! {
    /// Event kinds the world queues
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const BODY_ADDED = 1 << 0;
        const BODY_REMOVED = 1 << 1;
        const COLLISION = 1 << 2;
        const TRIGGER = 1 << 3;
        const INTERPOLATE = 1 << 4;
        const ALL = Self::BODY_ADDED.bits()
            | Self::BODY_REMOVED.bits()
            | Self::COLLISION.bits()
            | Self::TRIGGER.bits()
            | Self::INTERPOLATE.bits();
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// FIFO of events filtered by a subscription mask
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<PhysicsEvent>,
    mask: EventMask,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event if its kind is subscribed
    pub fn push(&mut self, event: PhysicsEvent) {
        if self.mask.contains(event.mask()) {
            self.events.push(event);
        }
    }

    /// Take all queued events in emission order
    pub fn drain(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn subscribe(&mut self, kinds: EventMask) {
        self.mask |= kinds;
    }

    /// Stop queueing `kinds`; already queued events are kept
    pub fn unsubscribe(&mut self, kinds: EventMask) {
        self.mask &= !kinds;
    }

    pub fn mask(&self) -> EventMask {
        self.mask
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
