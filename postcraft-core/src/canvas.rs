//! Direct manipulation: selection, drag and resize.
//!
//! ```text
//!   Down(element) ──▶ select ──▶ Drag     ──Move──▶ update x/y
//!   Down(handle)  ──▶ select ──▶ Resize   ──Move──▶ update width/height
//!   Down(background) ─▶ select background
//!   Down(canvas)  ──▶ deselect
//!   Up / Cancel   ──▶ gesture ends
//! ```
//!
//! Only one gesture is active at a time; a new `Down` ends the previous one.

use crate::element::MIN_ELEMENT_SIZE;
use crate::{
    EditorResult, EditorSession, Element, ElementId, ElementPatch, PointerEvent, PointerPhase,
    PointerTarget, PostId,
};

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Drag {
        element: ElementId,
        pointer_start: (f32, f32),
        origin: (f32, f32),
    },
    Resize {
        element: ElementId,
        pointer_start: (f32, f32),
        start_size: (f32, f32),
    },
}

/// Width/height after a resize drag, floored at [`MIN_ELEMENT_SIZE`].
///
/// There is no upper bound; elements may extend past the canvas.
#[must_use]
pub fn resized(start_size: (f32, f32), delta: (f32, f32)) -> (f32, f32) {
    (
        (start_size.0 + delta.0).max(MIN_ELEMENT_SIZE),
        (start_size.1 + delta.1).max(MIN_ELEMENT_SIZE),
    )
}

/// Pointer gesture state for the interactive canvas of one post.
#[derive(Debug, Default)]
pub struct CanvasInteraction {
    gesture: Option<Gesture>,
}

impl CanvasInteraction {
    /// Idle interaction state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag or resize is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Whether an element is being resized.
    #[must_use]
    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Resize { .. }))
    }

    /// Feed one pointer event, committing changes through the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if a position/size update cannot be applied.
    pub fn handle(
        &mut self,
        session: &mut EditorSession,
        post_id: &PostId,
        event: &PointerEvent,
    ) -> EditorResult<()> {
        match event.phase {
            PointerPhase::Down => {
                self.gesture = None;
                self.pointer_down(session, post_id, event);
                Ok(())
            }
            PointerPhase::Move => self.pointer_move(session, post_id, event),
            PointerPhase::Up | PointerPhase::Cancel => {
                self.gesture = None;
                Ok(())
            }
        }
    }

    fn pointer_down(&mut self, session: &mut EditorSession, post_id: &PostId, event: &PointerEvent) {
        match &event.target {
            PointerTarget::Canvas => session.deselect(),
            PointerTarget::Background => {
                if let Some(bg) = session.post(post_id).map(|p| p.background().id.clone()) {
                    session.select(post_id, &bg);
                }
            }
            PointerTarget::Element(id) | PointerTarget::ResizeHandle(id) => {
                let Some(frame) = session
                    .post(post_id)
                    .and_then(|p| p.get(id))
                    .and_then(Element::frame)
                    .cloned()
                else {
                    return;
                };
                // Hidden elements take no pointer input at all.
                if !frame.visible {
                    return;
                }
                session.select(post_id, id);
                // Locked elements can be selected but not manipulated.
                if frame.locked {
                    return;
                }
                let pointer_start = (event.x, event.y);
                self.gesture = Some(if matches!(event.target, PointerTarget::ResizeHandle(_)) {
                    Gesture::Resize {
                        element: id.clone(),
                        pointer_start,
                        start_size: (frame.width, frame.height),
                    }
                } else {
                    Gesture::Drag {
                        element: id.clone(),
                        pointer_start,
                        origin: (frame.x, frame.y),
                    }
                });
                tracing::debug!("Gesture started on {id}");
            }
        }
    }

    fn pointer_move(
        &mut self,
        session: &mut EditorSession,
        post_id: &PostId,
        event: &PointerEvent,
    ) -> EditorResult<()> {
        let Some(gesture) = &self.gesture else {
            return Ok(());
        };
        let (element, patch) = match gesture {
            Gesture::Drag {
                element,
                pointer_start,
                origin,
            } => {
                let x = (origin.0 + event.x - pointer_start.0).round();
                let y = (origin.1 + event.y - pointer_start.1).round();
                (element, ElementPatch::position(x, y))
            }
            Gesture::Resize {
                element,
                pointer_start,
                start_size,
            } => {
                let (width, height) = resized(
                    *start_size,
                    (event.x - pointer_start.0, event.y - pointer_start.1),
                );
                (element, ElementPatch::size(width, height))
            }
        };

        let still_editable = session
            .post(post_id)
            .and_then(|p| p.get(element))
            .is_some_and(|e| !e.is_locked());
        if !still_editable {
            self.gesture = None;
            return Ok(());
        }
        let element = element.clone();
        session.update_element(post_id, &element, &patch)
    }
}
