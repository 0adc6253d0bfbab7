//! Synthetic input events and the nodes that receive them.
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The kinds of synthetic events this crate dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Move,
    Click,
}

impl EventKind {
    /// Name of the event type in the DOM.
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::Move => "mousemove",
            EventKind::Click => "click",
        }
    }
}

/// A position in client (viewport) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The bounding box of a node, in client coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }
}

/// A programmatically constructed input event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyntheticEvent {
    /// The pointer moved to `client`. Does not bubble.
    Move { client: Point },
    /// A primary button click, originating from the global view.
    Click { bubbles: bool, cancelable: bool },
}

impl SyntheticEvent {
    pub fn move_to(client: Point) -> Self {
        SyntheticEvent::Move { client }
    }

    /// A click that bubbles and may be cancelled.
    pub fn click() -> Self {
        SyntheticEvent::Click {
            bubbles: true,
            cancelable: true,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            SyntheticEvent::Move { .. } => EventKind::Move,
            SyntheticEvent::Click { .. } => EventKind::Click,
        }
    }

    pub fn bubbles(&self) -> bool {
        match self {
            SyntheticEvent::Move { .. } => false,
            SyntheticEvent::Click { bubbles, .. } => *bubbles,
        }
    }
}

/// A document element that can be clicked.
pub trait Target: Clone + 'static {
    /// The element's bounding box.
    fn bounding_rect(&self) -> Rect;

    /// Deliver `event` to this element, synchronously running its listeners.
    fn dispatch(&self, event: &SyntheticEvent) -> Result<()>;

    /// Run `callback` the first time an event of `kind` is delivered here.
    fn observe_once(&self, kind: EventKind, callback: impl FnOnce() + 'static) -> Result<()>;
}
