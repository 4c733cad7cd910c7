//! Bounded, newest-first stack of transient notifications.
//!
//! Each record walks `Entering -> Resident -> Exiting -> Removed`, every step
//! driven by a timer from a [`TimerService`]. The scheduler is single-writer:
//! it is owned by one task and mutated only through `post` and `handle_timer`.
//! Layout changes are reported as [`NotificationEvent`]s for the caller to
//! render.

use super::timer::{
    ManualTimer, NotificationId, TimerFired, TimerHandle, TimerPhase, TimerService, TimerToken,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and layout of the notification stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub capacity: usize,
    pub display_ms: u64,
    pub slide_in_ms: u64,
    pub slide_out_ms: u64,
    /// Slide-out time for a record pushed out by a newer one.
    pub evict_slide_out_ms: u64,
    pub height: u32,
    pub gap: u32,
    pub margin: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            capacity: 5,
            display_ms: 3000,
            slide_in_ms: 300,
            slide_out_ms: 300,
            evict_slide_out_ms: 200,
            height: 50,
            gap: 10,
            margin: 20,
        }
    }
}

impl NotificationSettings {
    /// Vertical offset of a slot, measured from the top edge.
    pub fn offset_for(&self, slot: usize) -> u32 {
        self.margin + slot as u32 * (self.height + self.gap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Entering,
    Resident,
    Exiting,
    Removed,
}

#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub phase: Phase,
    /// Rank in the stack, 0 = newest. `None` once force-evicted.
    pub slot: Option<usize>,
    timer: Option<TimerHandle>,
}

impl NotificationRecord {
    /// The one live timer of this record, if any.
    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }
}

/// Layout changes for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationEvent {
    Entered {
        id: NotificationId,
        message: String,
        severity: Severity,
        slot: usize,
        offset: u32,
    },
    Moved {
        id: NotificationId,
        slot: usize,
        offset: u32,
    },
    Exiting {
        id: NotificationId,
        duration_ms: u64,
    },
    Removed {
        id: NotificationId,
    },
}

#[derive(Debug, Clone, Copy)]
enum Location {
    Stack(usize),
    Departing(usize),
}

pub struct NotificationScheduler<T: TimerService> {
    settings: NotificationSettings,
    timer: T,
    /// Slotted records, newest first; index == slot.
    stack: Vec<NotificationRecord>,
    /// Force-evicted records still sliding out.
    departing: Vec<NotificationRecord>,
    events: Vec<NotificationEvent>,
    next_id: NotificationId,
}

impl<T: TimerService> NotificationScheduler<T> {
    pub fn new(settings: NotificationSettings, timer: T) -> Self {
        Self {
            settings,
            timer,
            stack: Vec::new(),
            departing: Vec::new(),
            events: Vec::new(),
            next_id: 0,
        }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Records that hold a slot, newest first.
    pub fn live(&self) -> &[NotificationRecord] {
        &self.stack
    }

    pub fn departing(&self) -> &[NotificationRecord] {
        &self.departing
    }

    pub fn phase_of(&self, id: NotificationId) -> Phase {
        match self.locate(id) {
            Some(loc) => self.record(loc).phase,
            None => Phase::Removed,
        }
    }

    /// Drains the layout events produced since the last call.
    pub fn take_events(&mut self) -> Vec<NotificationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shows a new message in the top slot, evicting the oldest at capacity.
    pub fn post(&mut self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let message = message.into();
        if self.stack.len() >= self.settings.capacity.max(1) {
            self.evict_oldest();
        }

        self.next_id += 1;
        let id = self.next_id;
        let slide_in = self.timer.schedule_after(
            Duration::from_millis(self.settings.slide_in_ms),
            TimerToken {
                id,
                phase: TimerPhase::SlideIn,
            },
        );
        self.stack.insert(
            0,
            NotificationRecord {
                id,
                message: message.clone(),
                severity,
                phase: Phase::Entering,
                slot: Some(0),
                timer: Some(slide_in),
            },
        );
        self.reslot_from(1);
        self.events.push(NotificationEvent::Entered {
            id,
            message: message.clone(),
            severity,
            slot: 0,
            offset: self.settings.offset_for(0),
        });
        tracing::debug!("Notification {} posted ({:?}): {}", id, severity, message);
        id
    }

    /// Advances a record's lifecycle. Timers that are no longer the record's
    /// current one are stale and ignored.
    pub fn handle_timer(&mut self, fired: TimerFired) {
        let TimerToken { id, phase } = fired.token;
        let Some(loc) = self.locate(id) else {
            tracing::trace!("Timer for removed notification {} ignored", id);
            return;
        };
        if self.record(loc).timer != Some(fired.handle) {
            tracing::trace!("Stale {:?} timer for notification {} ignored", phase, id);
            return;
        }

        match (phase, self.record(loc).phase) {
            (TimerPhase::SlideIn, Phase::Entering) => {
                let handle = self.schedule(id, self.settings.display_ms, TimerPhase::Dismiss);
                let record = self.record_mut(loc);
                record.phase = Phase::Resident;
                record.timer = Some(handle);
            }
            (TimerPhase::Dismiss, Phase::Resident) => {
                let duration_ms = self.settings.slide_out_ms;
                let handle = self.schedule(id, duration_ms, TimerPhase::SlideOut);
                let record = self.record_mut(loc);
                record.phase = Phase::Exiting;
                record.timer = Some(handle);
                self.events.push(NotificationEvent::Exiting { id, duration_ms });
            }
            (TimerPhase::SlideOut, Phase::Exiting) => self.remove(loc),
            (phase, current) => {
                tracing::warn!(
                    "Notification {} got {:?} timer while {:?}",
                    id,
                    phase,
                    current
                );
            }
        }
    }

    /// Cancels every timer and drops all records.
    pub fn clear(&mut self) {
        for record in self.stack.drain(..).chain(self.departing.drain(..)) {
            if let Some(handle) = record.timer {
                self.timer.cancel(handle);
            }
            self.events.push(NotificationEvent::Removed { id: record.id });
        }
    }

    fn evict_oldest(&mut self) {
        let Some(mut record) = self.stack.pop() else {
            return;
        };
        if record.phase != Phase::Exiting {
            if let Some(handle) = record.timer.take() {
                self.timer.cancel(handle);
            }
            let duration_ms = self.settings.evict_slide_out_ms;
            record.timer = Some(self.schedule(record.id, duration_ms, TimerPhase::SlideOut));
            record.phase = Phase::Exiting;
            self.events.push(NotificationEvent::Exiting {
                id: record.id,
                duration_ms,
            });
        }
        tracing::debug!("Notification {} evicted at capacity", record.id);
        record.slot = None;
        self.departing.push(record);
    }

    fn remove(&mut self, loc: Location) {
        let record = match loc {
            Location::Stack(index) => {
                let record = self.stack.remove(index);
                self.reslot_from(index);
                record
            }
            Location::Departing(index) => self.departing.remove(index),
        };
        self.events.push(NotificationEvent::Removed { id: record.id });
    }

    /// Renumbers slots from `start` down and reports each move.
    fn reslot_from(&mut self, start: usize) {
        for (slot, record) in self.stack.iter_mut().enumerate().skip(start) {
            if record.slot != Some(slot) {
                record.slot = Some(slot);
                self.events.push(NotificationEvent::Moved {
                    id: record.id,
                    slot,
                    offset: self.settings.offset_for(slot),
                });
            }
        }
    }

    fn schedule(&mut self, id: NotificationId, millis: u64, phase: TimerPhase) -> TimerHandle {
        self.timer
            .schedule_after(Duration::from_millis(millis), TimerToken { id, phase })
    }

    fn locate(&self, id: NotificationId) -> Option<Location> {
        if let Some(index) = self.stack.iter().position(|r| r.id == id) {
            return Some(Location::Stack(index));
        }
        self.departing
            .iter()
            .position(|r| r.id == id)
            .map(Location::Departing)
    }

    fn record(&self, loc: Location) -> &NotificationRecord {
        match loc {
            Location::Stack(i) => &self.stack[i],
            Location::Departing(i) => &self.departing[i],
        }
    }

    fn record_mut(&mut self, loc: Location) -> &mut NotificationRecord {
        match loc {
            Location::Stack(i) => &mut self.stack[i],
            Location::Departing(i) => &mut self.departing[i],
        }
    }
}

impl NotificationScheduler<ManualTimer> {
    /// Moves the virtual clock forward, firing everything that comes due,
    /// including timers scheduled along the way.
    pub fn advance(&mut self, by: Duration) {
        let until = self.timer.now() + by;
        while let Some(fired) = self.timer.next_due(until) {
            self.handle_timer(fired);
        }
        self.timer.set_now(until);
    }
}
