// Compositor - rasterizes text layers onto a poster image

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::color::{outline_for, parse_color, OUTLINE_DIRECTIONS};
use crate::error::{ImagentError, Result};
use crate::font::FontResolver;
use crate::layer::{TextAlign, TextLayer};

/// Image dimension the nominal font sizes are authored against
pub const REFERENCE_DIMENSION: u32 = 800;

/// Smallest rendered font size in pixels
pub const MIN_FONT_PX: u32 = 20;

/// Text never comes closer than this to an image edge
pub const EDGE_MARGIN: i32 = 5;

const JPEG_QUALITY: u8 = 95;

/// Scale a nominal font size to the shorter image side
pub fn scaled_font_px(nominal: u32, width: u32, height: u32) -> u32 {
    let scale = width.min(height) as f64 / REFERENCE_DIMENSION as f64;
    ((nominal as f64 * scale).floor() as u32).max(MIN_FONT_PX)
}

/// Pixel origin for a measured text box, clamped inside the margins
///
/// When the box is larger than the image minus both margins the
/// leading margin wins.
pub fn place_text(
    layer: &TextLayer,
    text_width: u32,
    text_height: u32,
    width: u32,
    height: u32,
) -> (i32, i32) {
    let left = layer.left.clamp(0.0, 100.0) as f64 / 100.0;
    let top = layer.top.clamp(0.0, 100.0) as f64 / 100.0;

    let mut x = (left * width as f64) as i64;
    let y = (top * height as f64) as i64;

    match layer.text_align {
        TextAlign::Left => {}
        TextAlign::Center => x -= text_width as i64 / 2,
        TextAlign::Right => x -= text_width as i64,
    }

    (
        clamp_axis(x, text_width, width),
        clamp_axis(y, text_height, height),
    )
}

fn clamp_axis(pos: i64, extent: u32, limit: u32) -> i32 {
    let margin = EDGE_MARGIN as i64;
    let max = limit as i64 - extent as i64 - margin;
    if max < margin {
        return EDGE_MARGIN;
    }
    pos.clamp(margin, max) as i32
}

/// Draws text layers using fonts from a `FontResolver`
pub struct Compositor {
    fonts: FontResolver,
}

impl Compositor {
    pub fn new(fonts: FontResolver) -> Self {
        Self { fonts }
    }

    /// Render every non-empty layer in order, returning how many were drawn
    pub fn render(&self, canvas: &mut RgbImage, layers: &[TextLayer]) -> usize {
        let mut drawn = 0;
        for (index, layer) in layers.iter().enumerate() {
            if layer.text.trim().is_empty() {
                continue;
            }
            match self.render_layer(canvas, layer) {
                Ok(()) => drawn += 1,
                Err(e) => {
                    tracing::warn!(layer = index, kind = ?layer.kind, "Skipping text layer: {}", e);
                }
            }
        }
        drawn
    }

    fn render_layer(&self, canvas: &mut RgbImage, layer: &TextLayer) -> Result<()> {
        let (width, height) = canvas.dimensions();
        let px = scaled_font_px(layer.font_size, width, height);
        let face = self
            .fonts
            .resolve(&layer.font_family, layer.font_weight, layer.font_style);

        let text = layer.text.trim();
        let (text_width, text_height) = face.measure(px, text);
        if text_width == 0 || text_height == 0 {
            return Err(ImagentError::Layer(format!(
                "text {:?} has no renderable glyphs",
                text
            )));
        }

        let (x, y) = place_text(layer, text_width, text_height, width, height);
        let fill = parse_color(&layer.fill);
        let outline = outline_for(fill, px);

        for (dx, dy) in OUTLINE_DIRECTIONS {
            face.draw(
                canvas,
                outline.color,
                x + dx * outline.offset,
                y + dy * outline.offset,
                px,
                text,
            );
        }
        face.draw(canvas, fill, x, y, px, text);

        tracing::debug!(kind = ?layer.kind, px, x, y, builtin = face.is_builtin(), "Rendered text layer");
        Ok(())
    }

    /// Decode `image_bytes`, render `layers`, write a JPEG to `output_path`
    pub fn bake(
        &self,
        image_bytes: &[u8],
        layers: &[TextLayer],
        output_path: &Path,
    ) -> Result<PathBuf> {
        let mut canvas = image::load_from_memory(image_bytes)
            .map_err(|e| ImagentError::Decode(e.to_string()))?
            .to_rgb8();

        let drawn = self.render(&mut canvas, layers);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = BufWriter::new(File::create(output_path)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        encoder.encode_image(&canvas)?;

        tracing::info!(
            output = %output_path.display(),
            layers = drawn,
            "Baked text layers"
        );
        Ok(output_path.to_path_buf())
    }
}
