// Font resolution with a built-in bitmap fallback
//
// System fonts are looked up by file name in a list of font directories.
// When nothing usable is found the 8x8 glyphs from font8x8 are scaled up
// to the requested size instead.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use font8x8::UnicodeFonts;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::layer::{FontStyle, FontWeight};

/// How deep below each font directory to look for files
const MAX_SEARCH_DEPTH: usize = 3;

/// Native size of a builtin glyph cell
const BUILTIN_GLYPH: u32 = 8;

/// A resolved face, ready to measure and draw
pub enum Face {
    TrueType(FontVec),
    Builtin,
}

impl Face {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin)
    }

    /// Rendered `(width, height)` of `text` at `px`
    pub fn measure(&self, px: u32, text: &str) -> (u32, u32) {
        match self {
            Face::TrueType(font) => text_size(PxScale::from(px as f32), font, text),
            Face::Builtin => {
                let cell = builtin_cell(px);
                let chars = text.chars().count() as u32;
                (chars * BUILTIN_GLYPH * cell, BUILTIN_GLYPH * cell)
            }
        }
    }

    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: u32, text: &str) {
        match self {
            Face::TrueType(font) => {
                draw_text_mut(canvas, color, x, y, PxScale::from(px as f32), font, text);
            }
            Face::Builtin => draw_builtin(canvas, color, x, y, px, text),
        }
    }
}

fn builtin_cell(px: u32) -> u32 {
    (px / BUILTIN_GLYPH).max(1)
}

fn draw_builtin(canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: u32, text: &str) {
    let cell = builtin_cell(px);
    let advance = (BUILTIN_GLYPH * cell) as i32;

    for (index, ch) in text.chars().enumerate() {
        let glyph = font8x8::BASIC_FONTS
            .get(ch)
            .or_else(|| font8x8::LATIN_FONTS.get(ch))
            .or_else(|| font8x8::BASIC_FONTS.get('?'));
        let Some(rows) = glyph else { continue };

        let origin_x = x + index as i32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..BUILTIN_GLYPH {
                // bit 0 is the leftmost pixel
                if bits & (1 << col) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    origin_x + (col * cell) as i32,
                    y + (row as u32 * cell) as i32,
                )
                .of_size(cell, cell);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}

/// Maps a family/weight/style request onto font files in `dirs`
#[derive(Debug, Clone, Default)]
pub struct FontResolver {
    dirs: Vec<PathBuf>,
}

impl FontResolver {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Common system font locations
    pub fn system() -> Self {
        Self::new(
            [
                "/usr/share/fonts",
                "/usr/local/share/fonts",
                "/Library/Fonts",
                "/System/Library/Fonts",
                "C:\\Windows\\Fonts",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        )
    }

    /// Never touches the filesystem
    pub fn builtin_only() -> Self {
        Self::default()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Best-effort lookup; any failure yields `Face::Builtin`
    pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Face {
        for name in candidate_files(family, weight, style) {
            for dir in &self.dirs {
                let Some(path) = find_file(dir, &name, MAX_SEARCH_DEPTH) else {
                    continue;
                };
                match load_font(&path) {
                    Some(font) => {
                        tracing::debug!(font = %path.display(), family, "Resolved font");
                        return Face::TrueType(font);
                    }
                    None => {
                        tracing::warn!(font = %path.display(), "Unreadable font file, skipping");
                    }
                }
            }
        }

        tracing::debug!(family, "No system font found, using builtin glyphs");
        Face::Builtin
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

fn find_file(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }

    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .find_map(|sub| find_file(&sub, name, depth - 1))
}

/// Font file names to try, most specific first
pub(crate) fn candidate_files(family: &str, weight: FontWeight, style: FontStyle) -> Vec<String> {
    let family = family.to_lowercase();
    let (liberation, dejavu) = if family.contains("mono") || family.contains("courier") {
        ("LiberationMono", "DejaVuSansMono")
    } else if (family.contains("serif") && !family.contains("sans")) || family.contains("times") {
        ("LiberationSerif", "DejaVuSerif")
    } else {
        ("LiberationSans", "DejaVuSans")
    };

    let bold = weight == FontWeight::Bold;
    let italic = style == FontStyle::Italic;
    let dejavu_slant = if dejavu == "DejaVuSerif" { "Italic" } else { "Oblique" };

    let liberation_suffix = match (bold, italic) {
        (true, true) => "BoldItalic",
        (true, false) => "Bold",
        (false, true) => "Italic",
        (false, false) => "Regular",
    };
    let dejavu_name = match (bold, italic) {
        (true, true) => format!("{dejavu}-Bold{dejavu_slant}.ttf"),
        (true, false) => format!("{dejavu}-Bold.ttf"),
        (false, true) => format!("{dejavu}-{dejavu_slant}.ttf"),
        (false, false) => format!("{dejavu}.ttf"),
    };

    let mut names = vec![
        format!("{liberation}-{liberation_suffix}.ttf"),
        dejavu_name,
    ];
    if bold || italic {
        names.push(format!("{liberation}-Regular.ttf"));
        names.push(format!("{dejavu}.ttf"));
    }
    names
}
