//! Pointer input for direct manipulation on the canvas.

use serde::{Deserialize, Serialize};

use crate::ElementId;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved while a gesture may be active.
    Move,
    /// Button released.
    Up,
    /// Gesture aborted (pointer left the window, focus lost).
    Cancel,
}

/// What the pointer landed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum PointerTarget {
    /// A foreground element's box.
    Element(ElementId),
    /// The corner resize handle of an element.
    ResizeHandle(ElementId),
    /// The background image.
    Background,
    /// Empty canvas area outside any element.
    Canvas,
}

/// A pointer event in post coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in post coordinates.
    pub x: f32,
    /// Y position in post coordinates.
    pub y: f32,
    /// Hit target; only consulted on `Down`.
    pub target: PointerTarget,
}

impl PointerEvent {
    /// Pointer pressed on a target.
    #[must_use]
    pub const fn down(target: PointerTarget, x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            target,
        }
    }

    /// Pointer moved.
    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            target: PointerTarget::Canvas,
        }
    }

    /// Pointer released.
    #[must_use]
    pub const fn up(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            target: PointerTarget::Canvas,
        }
    }
}
