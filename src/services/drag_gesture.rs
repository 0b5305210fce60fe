use serde::Serialize;
use tracing::trace;

use crate::services::itinerary_gateway::ItineraryEdit;

/// Where a drag-and-drop gesture over an activity list currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        day: usize,
        source: usize,
    },
    Hovering {
        day: usize,
        source: usize,
        target: usize,
    },
}

#[derive(Debug, Default)]
pub struct DragGesture {
    state: DragState,
}

impl DragGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn start(&mut self, day: usize, index: usize) {
        self.transition(DragState::Dragging { day, source: index });
    }

    /// Highlights `index` as a drop target. Ignored when nothing is being dragged.
    pub fn hover(&mut self, index: usize) {
        let next = match self.state {
            DragState::Idle => return,
            DragState::Dragging { day, source } | DragState::Hovering { day, source, .. } => {
                DragState::Hovering {
                    day,
                    source,
                    target: index,
                }
            }
        };
        self.transition(next);
    }

    pub fn leave(&mut self) {
        if let DragState::Hovering { day, source, .. } = self.state {
            self.transition(DragState::Dragging { day, source });
        }
    }

    /// Finishes the gesture over `target` in `day`. Yields a reorder only when
    /// the drop lands in the dragged item's own day on a different slot.
    pub fn drop(&mut self, day: usize, target: usize) -> Option<ItineraryEdit> {
        let edit = match self.state {
            DragState::Dragging {
                day: source_day,
                source,
            }
            | DragState::Hovering {
                day: source_day,
                source,
                ..
            } if source_day == day && source != target => Some(ItineraryEdit::Reorder {
                day,
                from: source,
                to: target,
            }),
            _ => None,
        };
        self.transition(DragState::Idle);
        edit
    }

    pub fn end(&mut self) {
        self.transition(DragState::Idle);
    }

    pub fn cancel(&mut self) {
        self.transition(DragState::Idle);
    }

    fn transition(&mut self, next: DragState) {
        trace!(target: "app::planner::drag", from = ?self.state, to = ?next, "drag transition");
        self.state = next;
    }
}
