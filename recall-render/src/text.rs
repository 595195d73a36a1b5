use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Fonts tried in order when none is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the configured font, or the first candidate that exists.
pub fn load_font(explicit: Option<&Path>) -> Result<FontVec> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or_else(|| anyhow!("no usable font found; pass one with --font"))?,
    };
    let bytes =
        std::fs::read(&path).with_context(|| format!("reading font {}", path.display()))?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| anyhow!("parsing font {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "font loaded");
    Ok(font)
}

/// Rasterizes a single line of text into a tightly cropped, premultiplied
/// pixmap. Returns `None` for text without visible glyphs.
pub fn render_text_pixmap(text: &str, font_size: f32, font: &FontVec, color: [u8; 4]) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // 1) Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // 2) Union pixel bounds from outlined glyphs
    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let bounds = out.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    // 3) Rasterize with premultiplied alpha, Porter-Duff over
    let stride = w as usize;
    let dst = pm.pixels_mut();
    for out in &outlines {
        let bounds = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + bounds.min.x - min_x).floor() as i32;
            let iy = (y as f32 + bounds.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let sr = (color[0] as f32 * a_lin) as u8;
            let sg = (color[1] as f32 * a_lin) as u8;
            let sb = (color[2] as f32 * a_lin) as u8;

            let bg = dst[i];
            let inv = 1.0 - (sa as f32 / 255.0);
            let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            let r = sr.saturating_add((bg.red() as f32 * inv) as u8).min(a);
            let g = sg.saturating_add((bg.green() as f32 * inv) as u8).min(a);
            let b = sb.saturating_add((bg.blue() as f32 * inv) as u8).min(a);

            if let Some(px) = PremultipliedColorU8::from_rgba(r, g, b, a) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_bits: u32,
    color: [u8; 4],
}

/// Rendered text by content, size and color. Labels repeat every frame, so
/// rasterizing once per distinct string is enough.
pub struct TextCache {
    font: FontVec,
    map: HashMap<TextKey, Arc<Pixmap>>,
    capacity: usize,
}

impl TextCache {
    pub fn new(font: FontVec, capacity: usize) -> Self {
        Self {
            font,
            map: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, color: [u8; 4]) -> Option<Arc<Pixmap>> {
        let key = TextKey {
            text: text.to_string(),
            size_bits: size.to_bits(),
            color,
        };
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size, &self.font, color)?);
        if self.map.len() >= self.capacity {
            self.map.clear();
        }
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_explicit_font_is_an_error() {
        let err = load_font(Some(Path::new("/definitely/not/a/font.ttf"))).unwrap_err();
        assert!(err.to_string().contains("reading font"));
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a font").unwrap();
        let err = load_font(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("parsing font"));
    }

    #[test]
    fn cache_reuses_rendered_text_when_a_font_exists() {
        let Ok(font) = load_font(None) else {
            return;
        };
        let mut cache = TextCache::new(font, 4);
        let a = cache.get_or_render("12", 24.0, [255; 4]).unwrap();
        let b = cache.get_or_render("12", 24.0, [255; 4]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_render("   ", 24.0, [255; 4]).is_none());

        for s in ["1", "2", "3", "4"] {
            cache.get_or_render(s, 24.0, [255; 4]);
        }
        assert!(cache.len() <= 4);
    }
}
