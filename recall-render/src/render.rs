use std::sync::Arc;
use std::time::Duration;

use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use bytemuck::{cast_slice, cast_slice_mut};
use recall_core::{SlotOutcome, TrialPhase};
use recall_timing::{HighPrecisionTimer, Timer};
use recall_trial::{AnswerWindow, TrialConfig, TrialView};
use tiny_skia::{Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::layout::{Layout, SlotBox};
use crate::text::TextCache;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const DIM: [u8; 4] = [120, 120, 120, 255];
const FAINT: [u8; 4] = [70, 70, 70, 255];
const GREEN: [u8; 4] = [76, 175, 80, 255];
const RED: [u8; 4] = [244, 67, 54, 255];
const ACCENT: [u8; 4] = [92, 107, 192, 255];

const HINT_SIZE: f32 = 18.0;
const SEQUENCE_SIZE: f32 = 48.0;
const BODY_SIZE: f32 = 26.0;
const ENTRY_SIZE: f32 = 28.0;

pub const HINT_TEXT: &str =
    "G new   R reveal   M mode   [ ] length   , . range   - = time   Esc quit";

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

pub trait TrialRenderer {
    fn render_view(&mut self, view: Option<&TrialView>, focus: Option<usize>) -> Result<()>;
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    text_cache: TextCache,
    canvas: Pixmap,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontVec) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width: width.max(1),
            height: height.max(1),
            text_cache: TextCache::new(font, 256),
            canvas,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width.max(1), new_height.max(1))
            .ok_or_else(|| anyhow!("invalid canvas size {new_width}x{new_height}"))?;
        self.width = new_width.max(1);
        self.height = new_height.max(1);
        Ok(())
    }

    /// Draws one frame and copies it into `frame_buffer` (RGBA8, same size
    /// as the canvas).
    pub fn render_frame(
        &mut self,
        view: Option<&TrialView>,
        focus: Option<usize>,
        frame_buffer: &mut [u8],
        timer: &HighPrecisionTimer,
    ) -> Result<FrameStats> {
        let expected = self.canvas.data().len();
        if frame_buffer.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas needs {expected}",
                frame_buffer.len()
            ));
        }

        let t = timer.now();
        self.canvas.fill(Color::BLACK);
        let clear = timer.elapsed(t);

        let t = timer.now();
        self.render_view(view, focus)?;
        let draw = timer.elapsed(t);

        let t = timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = timer.elapsed(t);

        Ok(FrameStats {
            clear,
            draw,
            copy,
            total: clear + draw + copy,
        })
    }

    fn draw_text(&mut self, text: &str, size: f32, color: [u8; 4], center: (f32, f32)) {
        if let Some(pm) = self.text_cache.get_or_render(text, size, color) {
            self.blit_centered(&pm, center);
        }
    }

    /// Alpha-blends a premultiplied pixmap onto the canvas, centered on `pos`.
    fn blit_centered(&mut self, pm: &Arc<Pixmap>, pos: (f32, f32)) {
        let (w, h) = (pm.width(), pm.height());
        let (cw, ch) = (self.width as usize, self.height as usize);

        let x = (pos.0 - w as f32 * 0.5) as i32;
        let y = (pos.1 - h as f32 * 0.5) as i32;

        // Cull fully off-screen
        if x + w as i32 <= 0 || y + h as i32 <= 0 || x >= cw as i32 || y >= ch as i32 {
            return;
        }

        let dst_x = x.max(0) as usize;
        let dst_y = y.max(0) as usize;
        let src_x_offset = (-x).max(0) as usize;
        let src_y_offset = (-y).max(0) as usize;
        let copy_w = (w as usize - src_x_offset).min(cw - dst_x);
        let copy_h = (h as usize - src_y_offset).min(ch - dst_y);

        let src_u32: &[u32] = cast_slice(pm.data());
        let dst_u32: &mut [u32] = cast_slice_mut(self.canvas.data_mut());

        for row in 0..copy_h {
            let src_row_start = (src_y_offset + row) * w as usize + src_x_offset;
            let dst_row_start = (dst_y + row) * cw + dst_x;

            for i in 0..copy_w {
                let s = src_u32[src_row_start + i];
                let sa = (s >> 24) & 0xFF;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    dst_u32[dst_row_start + i] = s;
                    continue;
                }
                let d = dst_u32[dst_row_start + i];
                let inv = 255 - sa;

                let r = (s & 0xFF) + ((d & 0xFF) * inv + 127) / 255;
                let g = ((s >> 8) & 0xFF) + (((d >> 8) & 0xFF) * inv + 127) / 255;
                let b = ((s >> 16) & 0xFF) + (((d >> 16) & 0xFF) * inv + 127) / 255;
                let a = sa + (((d >> 24) & 0xFF) * inv + 127) / 255;

                dst_u32[dst_row_start + i] = (a << 24) | (b << 16) | (g << 8) | r;
            }
        }
    }

    fn stroke_slot(&mut self, slot: SlotBox, color: [u8; 4], width: f32) {
        let Some(rect) = Rect::from_xywh(slot.x, slot.y, slot.w, slot.h) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    fn draw_check(&mut self, center: (f32, f32), radius: f32) {
        let (cx, cy) = center;
        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy, radius);
        if let Some(circle) = pb.finish() {
            self.canvas
                .stroke_path(&circle, &paint(GREEN), &mark_stroke(radius), Transform::identity(), None);
        }
        let mut pb = PathBuilder::new();
        pb.move_to(cx - radius * 0.45, cy);
        pb.line_to(cx - radius * 0.1, cy + radius * 0.4);
        pb.line_to(cx + radius * 0.5, cy - radius * 0.35);
        if let Some(tick) = pb.finish() {
            self.canvas
                .stroke_path(&tick, &paint(GREEN), &mark_stroke(radius), Transform::identity(), None);
        }
    }

    fn draw_cross(&mut self, center: (f32, f32), radius: f32) {
        let (cx, cy) = center;
        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy, radius);
        if let Some(circle) = pb.finish() {
            self.canvas
                .stroke_path(&circle, &paint(RED), &mark_stroke(radius), Transform::identity(), None);
        }
        let arm = radius * 0.4;
        let mut pb = PathBuilder::new();
        pb.move_to(cx - arm, cy - arm);
        pb.line_to(cx + arm, cy + arm);
        pb.move_to(cx + arm, cy - arm);
        pb.line_to(cx - arm, cy + arm);
        if let Some(cross) = pb.finish() {
            self.canvas
                .stroke_path(&cross, &paint(RED), &mark_stroke(radius), Transform::identity(), None);
        }
    }

    fn fill_focus_bar(&mut self, slot: SlotBox) {
        let Some(rect) = Rect::from_xywh(slot.x, slot.y + slot.h + 4.0, slot.w, 3.0) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        self.canvas
            .fill_path(&path, &paint(ACCENT), FillRule::Winding, Transform::identity(), None);
    }
}

impl TrialRenderer for SkiaRenderer {
    fn render_view(&mut self, view: Option<&TrialView>, focus: Option<usize>) -> Result<()> {
        let slots = view.map_or(0, TrialView::len);
        let layout = Layout::new(self.width, self.height, slots);

        self.draw_text(HINT_TEXT, HINT_SIZE, DIM, layout.hint_pos());

        let Some(view) = view else {
            self.draw_text("Press G to generate a sequence", BODY_SIZE, WHITE, layout.sequence_pos());
            return Ok(());
        };

        if view.speaking {
            self.draw_text("Listening...", SEQUENCE_SIZE, WHITE, layout.sequence_pos());
        } else {
            let label = view.sequence_label();
            self.draw_text(&label, SEQUENCE_SIZE, WHITE, layout.sequence_pos());
        }
        if let Some(prompt) = prompt_text(view) {
            self.draw_text(prompt, BODY_SIZE - 4.0, DIM, layout.prompt_pos());
        }

        for index in 0..slots {
            let Some(slot) = layout.slot(index) else {
                continue;
            };
            let focused = view.input_enabled && focus == Some(index);
            let outline = match (view.input_enabled, focused) {
                (true, true) => ACCENT,
                (true, false) => WHITE,
                (false, _) => FAINT,
            };
            self.stroke_slot(slot, outline, if focused { 3.0 } else { 1.5 });
            if focused {
                self.fill_focus_bar(slot);
            }

            if let Some(entry) = view.entries.get(index).filter(|e| !e.is_empty()) {
                let color = if view.input_enabled { WHITE } else { DIM };
                self.draw_text(entry, ENTRY_SIZE, color, slot.center());
            }

            let mark = view.outcomes.as_ref().and_then(|o| o.get(index).copied());
            if let (Some(outcome), Some(center)) = (mark, layout.mark_center(index)) {
                match outcome {
                    SlotOutcome::Correct => self.draw_check(center, layout.mark_radius()),
                    SlotOutcome::Incorrect => self.draw_cross(center, layout.mark_radius()),
                }
            }
        }

        if let Some(line) = timer_text(view) {
            self.draw_text(&line, BODY_SIZE, WHITE, layout.timer_pos());
        }
        self.draw_text(&status_text(&view.next_config), HINT_SIZE, DIM, layout.status_pos());
        Ok(())
    }
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    p.anti_alias = true;
    p
}

fn mark_stroke(radius: f32) -> Stroke {
    Stroke {
        width: (radius * 0.18).max(2.0),
        line_cap: LineCap::Round,
        ..Stroke::default()
    }
}

/// Secondary line under the sequence.
pub fn prompt_text(view: &TrialView) -> Option<&'static str> {
    match view.phase {
        TrialPhase::Presenting if view.speaking => None,
        TrialPhase::Presenting => Some("Memorize the sequence"),
        TrialPhase::Hidden => Some("Type what you remember"),
        TrialPhase::Revealed => None,
    }
}

/// Countdown or score line.
pub fn timer_text(view: &TrialView) -> Option<String> {
    match view.phase {
        TrialPhase::Presenting if view.speaking => None,
        TrialPhase::Revealed => view
            .correct_count()
            .map(|correct| format!("{correct} / {} correct", view.len())),
        TrialPhase::Hidden if !view.countdown_running => Some("Press R to reveal".to_string()),
        _ => Some(format!("Time remaining: {}", view.time_remaining)),
    }
}

/// Summary of the configuration the next trial will use.
pub fn status_text(config: &TrialConfig) -> String {
    let window = match config.answer_window() {
        AnswerWindow::Timed => "timed answers",
        AnswerWindow::Untimed => "untimed answers",
    };
    format!(
        "next: {} items   0-{}   {}s   {}   {}",
        config.sequence_length(),
        config.max_value(),
        config.allowed_time_secs(),
        config.mode(),
        window
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use recall_core::PresentationMode;
    use recall_timing::ManualTimer;
    use recall_trial::testing::ScriptedSpeech;
    use recall_trial::{SilentSpeech, TrialController};

    fn visual_view_after(secs: u64, config: TrialConfig) -> TrialView {
        let timer = ManualTimer::new();
        let mut c =
            TrialController::new(config, timer.clone(), StdRng::seed_from_u64(3), SilentSpeech);
        c.generate();
        for _ in 0..secs {
            timer.advance_secs(1);
            c.update();
        }
        c.view().unwrap()
    }

    #[test]
    fn presenting_shows_countdown() {
        let view = visual_view_after(2, TrialConfig::default());
        assert_eq!(prompt_text(&view), Some("Memorize the sequence"));
        assert_eq!(timer_text(&view).as_deref(), Some("Time remaining: 3"));
    }

    #[test]
    fn untimed_answer_window_asks_for_reveal() {
        let config = TrialConfig::default().with_answer_window(AnswerWindow::Untimed);
        let view = visual_view_after(5, config);
        assert_eq!(timer_text(&view).as_deref(), Some("Press R to reveal"));
    }

    #[test]
    fn revealed_shows_score_line() {
        let view = visual_view_after(10, TrialConfig::default());
        assert_eq!(timer_text(&view).as_deref(), Some("0 / 6 correct"));
        assert_eq!(prompt_text(&view), None);
    }

    #[test]
    fn speaking_hides_countdown_line() {
        let speech = ScriptedSpeech::new();
        let config = TrialConfig::default().with_mode(PresentationMode::Spoken);
        let mut c =
            TrialController::new(config, ManualTimer::new(), StdRng::seed_from_u64(3), speech);
        c.generate();
        let view = c.view().unwrap();
        assert!(view.speaking);
        assert_eq!(timer_text(&view), None);
        assert_eq!(prompt_text(&view), None);
    }

    #[test]
    fn status_line_describes_next_trial() {
        let config = TrialConfig::default()
            .with_sequence_length(8)
            .with_mode(PresentationMode::Spoken);
        assert_eq!(
            status_text(&config),
            "next: 8 items   0-99   5s   spoken   timed answers"
        );
    }

    #[test]
    fn frame_buffer_size_mismatch_is_reported() {
        let Ok(font) = crate::load_font(None) else {
            return;
        };
        let mut renderer = SkiaRenderer::new(64, 32, font).unwrap();
        let mut fb = vec![0u8; 10];
        let result = renderer.render_frame(None, None, &mut fb, &HighPrecisionTimer::new());
        assert!(result.is_err());
    }

    #[test]
    fn renders_every_phase_into_an_opaque_frame() {
        let Ok(font) = crate::load_font(None) else {
            return;
        };
        let mut renderer = SkiaRenderer::new(640, 360, font).unwrap();
        let mut fb = vec![0u8; 640 * 360 * 4];
        let timer = HighPrecisionTimer::new();
        for secs in [0, 5, 10] {
            let view = visual_view_after(secs, TrialConfig::default());
            renderer
                .render_frame(Some(&view), Some(0), &mut fb, &timer)
                .unwrap();
            assert!(fb.chunks_exact(4).all(|px| px[3] == 255));
            assert!(fb.chunks_exact(4).any(|px| px[0] > 0));
        }
    }
}
