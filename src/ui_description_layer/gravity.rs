/*
 * Anchor-based repositioning of dialog controls.
 *
 * Each entry anchors one control to edges of its parent's client area. The
 * control's rectangle and the client size are captured once, when the dialog
 * initializes; on every resize the controls are laid out again from those
 * originals, so rounding never accumulates.
 *
 * Per axis: anchored to both edges, the control stretches; anchored only to the
 * far edge (right or bottom), it moves with it; otherwise it stays put.
 */

use crate::platform_layer::error::Result as FacadeResult;
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::types::{ControlId, Handle, Rect, Size};

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Anchor: u8 {
        const LEFT = 0b0001;
        const TOP = 0b0010;
        const RIGHT = 0b0100;
        const BOTTOM = 0b1000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravityEntry {
    pub control_id: ControlId,
    pub anchor: Anchor,
    /// Rectangle in parent client coordinates at capture time.
    pub original: Option<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GravityTable {
    entries: Vec<GravityEntry>,
    original_client: Option<Size>,
}

impl GravityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(mut self, control_id: ControlId, anchor: Anchor) -> Self {
        self.entries.push(GravityEntry {
            control_id,
            anchor,
            original: None,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GravityEntry] {
        &self.entries
    }

    pub fn is_captured(&self) -> bool {
        self.original_client.is_some()
    }

    /// Records the client size of `parent` and the rectangle of every anchored control.
    pub fn capture(
        &mut self,
        native: &dyn NativeWindowOperations,
        parent: Handle,
    ) -> FacadeResult<()> {
        self.original_client = Some(native.client_rect(parent)?.size());
        for entry in &mut self.entries {
            entry.original = match native.dlg_item(parent, entry.control_id) {
                Some(child) => Some(native.window_rect(child)?),
                None => {
                    log::warn!(
                        "GravityTable: Control {:?} not found in {parent:?}; it will not be moved.",
                        entry.control_id
                    );
                    None
                }
            };
        }
        Ok(())
    }

    /// New rectangles for a client area of `new_client`. Empty until captured.
    pub fn arrange(&self, new_client: Size) -> Vec<(ControlId, Rect)> {
        let Some(original_client) = self.original_client else {
            return Vec::new();
        };
        let dx = new_client.width - original_client.width;
        let dy = new_client.height - original_client.height;

        self.entries
            .iter()
            .filter_map(|entry| {
                let original = entry.original?;
                let (left, right) = shift_axis(
                    original.left,
                    original.right,
                    dx,
                    entry.anchor.contains(Anchor::LEFT),
                    entry.anchor.contains(Anchor::RIGHT),
                );
                let (top, bottom) = shift_axis(
                    original.top,
                    original.bottom,
                    dy,
                    entry.anchor.contains(Anchor::TOP),
                    entry.anchor.contains(Anchor::BOTTOM),
                );
                Some((entry.control_id, Rect::new(left, top, right, bottom)))
            })
            .collect()
    }

    pub fn apply(
        &self,
        native: &dyn NativeWindowOperations,
        parent: Handle,
        new_client: Size,
    ) -> FacadeResult<()> {
        apply_layout(native, parent, &self.arrange(new_client))
    }
}

fn shift_axis(near: i32, far: i32, delta: i32, near_anchor: bool, far_anchor: bool) -> (i32, i32) {
    match (near_anchor, far_anchor) {
        (true, true) => (near, far + delta),
        (false, true) => (near + delta, far + delta),
        _ => (near, far),
    }
}

/// Moves each control of `parent` to its computed rectangle.
pub fn apply_layout(
    native: &dyn NativeWindowOperations,
    parent: Handle,
    layout: &[(ControlId, Rect)],
) -> FacadeResult<()> {
    for (control_id, rect) in layout {
        if let Some(child) = native.dlg_item(parent, *control_id) {
            native.set_window_rect(child, *rect)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured_table() -> GravityTable {
        let mut table = GravityTable::new()
            .anchor(ControlId::new(1), Anchor::LEFT | Anchor::TOP)
            .anchor(ControlId::new(2), Anchor::RIGHT | Anchor::BOTTOM)
            .anchor(ControlId::new(3), Anchor::LEFT | Anchor::TOP | Anchor::RIGHT | Anchor::BOTTOM)
            .anchor(ControlId::new(4), Anchor::LEFT | Anchor::RIGHT | Anchor::BOTTOM);
        table.original_client = Some(Size::new(200, 100));
        let originals = [
            Rect::new(10, 10, 50, 30),
            Rect::new(150, 70, 190, 90),
            Rect::new(10, 40, 190, 60),
            Rect::new(10, 70, 140, 90),
        ];
        for (entry, original) in table.entries.iter_mut().zip(originals) {
            entry.original = Some(original);
        }
        table
    }

    #[test]
    fn arrange_moves_and_stretches_by_anchor() {
        // Arrange
        let table = captured_table();

        // Act
        let layout = table.arrange(Size::new(260, 140));

        // Assert
        assert_eq!(
            layout,
            vec![
                (ControlId::new(1), Rect::new(10, 10, 50, 30)),
                (ControlId::new(2), Rect::new(210, 110, 250, 130)),
                (ControlId::new(3), Rect::new(10, 40, 250, 100)),
                (ControlId::new(4), Rect::new(10, 110, 200, 130)),
            ]
        );
    }

    #[test]
    fn arrange_is_empty_until_captured() {
        let table = GravityTable::new().anchor(ControlId::new(1), Anchor::RIGHT);
        assert!(table.arrange(Size::new(10, 10)).is_empty());
    }
}
