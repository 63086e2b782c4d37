// imagent - poster image compositing
// Renders styled text layers onto generated ad images

mod color;
mod compositor;
mod font;
mod layer;

pub mod error;

pub use color::{is_light, outline_for, parse_color, try_parse_color, Outline, OUTLINE_DIRECTIONS};
pub use compositor::{place_text, scaled_font_px, Compositor, EDGE_MARGIN, MIN_FONT_PX};
pub use error::{ImagentError, Result};
pub use font::{Face, FontResolver};
pub use layer::{FontStyle, FontWeight, LayerKind, TextAlign, TextLayer};

use std::path::{Path, PathBuf};

/// Bake `layers` into the encoded image `image_bytes` and write a JPEG to `output_path`
pub fn bake_text_layers(
    image_bytes: &[u8],
    layers: &[TextLayer],
    output_path: &Path,
    fonts: FontResolver,
) -> Result<PathBuf> {
    Compositor::new(fonts).bake(image_bytes, layers, output_path)
}
