pub mod layout;
pub mod render;
pub mod text;

pub use layout::{Layout, SlotBox};
pub use render::{FrameStats, SkiaRenderer, TrialRenderer};
pub use text::load_font;
