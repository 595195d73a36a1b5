/// Screen positions for one frame, derived from the surface size and the
/// number of answer slots. Pure geometry so it can be checked without a font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    width: f32,
    height: f32,
    slots: usize,
    slot_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl SlotBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }
}

pub const SLOT_MAX_WIDTH: f32 = 72.0;
pub const SLOT_HEIGHT: f32 = 56.0;
pub const SLOT_GAP: f32 = 14.0;
pub const SIDE_MARGIN: f32 = 40.0;
pub const MARK_OFFSET: f32 = 58.0;

impl Layout {
    pub fn new(width: u32, height: u32, slots: usize) -> Self {
        let width = width as f32;
        let height = height as f32;
        let slot_width = if slots == 0 {
            SLOT_MAX_WIDTH
        } else {
            let usable = width - 2.0 * SIDE_MARGIN - SLOT_GAP * (slots as f32 - 1.0);
            (usable / slots as f32).clamp(8.0, SLOT_MAX_WIDTH)
        };
        Self {
            width,
            height,
            slots,
            slot_width,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.width * 0.5
    }

    pub fn hint_pos(&self) -> (f32, f32) {
        (self.center_x(), 30.0)
    }

    pub fn sequence_pos(&self) -> (f32, f32) {
        (self.center_x(), self.height * 0.28)
    }

    pub fn prompt_pos(&self) -> (f32, f32) {
        (self.center_x(), self.height * 0.28 + 56.0)
    }

    pub fn slot(&self, index: usize) -> Option<SlotBox> {
        if index >= self.slots {
            return None;
        }
        let row_width =
            self.slots as f32 * self.slot_width + (self.slots as f32 - 1.0) * SLOT_GAP;
        let left = self.center_x() - row_width * 0.5;
        Some(SlotBox {
            x: left + index as f32 * (self.slot_width + SLOT_GAP),
            y: self.height * 0.5 - SLOT_HEIGHT * 0.5,
            w: self.slot_width,
            h: SLOT_HEIGHT,
        })
    }

    /// Where the correct/incorrect mark for a slot is drawn.
    pub fn mark_center(&self, index: usize) -> Option<(f32, f32)> {
        self.slot(index).map(|slot| {
            let (cx, cy) = slot.center();
            (cx, cy + MARK_OFFSET)
        })
    }

    pub fn mark_radius(&self) -> f32 {
        (self.slot_width * 0.3).min(16.0)
    }

    pub fn timer_pos(&self) -> (f32, f32) {
        (self.center_x(), self.height * 0.74)
    }

    pub fn status_pos(&self) -> (f32, f32) {
        (self.center_x(), self.height - 36.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_fit_inside_the_surface_without_overlap() {
        for slots in [4, 6, 14] {
            let layout = Layout::new(800, 600, slots);
            let boxes: Vec<SlotBox> = (0..slots).map(|i| layout.slot(i).unwrap()).collect();
            assert!(boxes[0].x >= SIDE_MARGIN - 0.5);
            let last = boxes[slots - 1];
            assert!(last.x + last.w <= 800.0 - SIDE_MARGIN + 0.5);
            for pair in boxes.windows(2) {
                assert!(pair[0].x + pair[0].w < pair[1].x);
            }
        }
    }

    #[test]
    fn slot_row_is_centered() {
        let layout = Layout::new(1280, 720, 6);
        let first = layout.slot(0).unwrap();
        let last = layout.slot(5).unwrap();
        let left_gap = first.x;
        let right_gap = 1280.0 - (last.x + last.w);
        assert!((left_gap - right_gap).abs() < 0.01);
    }

    #[test]
    fn out_of_range_slot_has_no_box() {
        let layout = Layout::new(800, 600, 4);
        assert!(layout.slot(4).is_none());
        assert!(layout.mark_center(4).is_none());
    }

    #[test]
    fn wide_surfaces_cap_slot_width() {
        let layout = Layout::new(4000, 1000, 4);
        assert_eq!(layout.slot(0).unwrap().w, SLOT_MAX_WIDTH);
    }

    #[test]
    fn marks_sit_below_their_slot() {
        let layout = Layout::new(1280, 720, 6);
        let slot = layout.slot(2).unwrap();
        let (mx, my) = layout.mark_center(2).unwrap();
        assert_eq!(mx, slot.center().0);
        assert!(my > slot.y + slot.h);
    }
}
