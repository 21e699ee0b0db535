use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::error::LayoutError;
use crate::types::Pt;

/// Contract the layout engine measures text through. Widths and vertical
/// metrics are exact for registered fonts; an unresolvable font is an error
/// the caller degrades from (the wrap engine falls back to a character-count
/// heuristic rather than aborting the render).
pub trait FontMetrics: Send + Sync {
    fn text_width(&self, font: &str, size: Pt, text: &str) -> Result<Pt, MetricsError>;

    /// Distance the font extends above the baseline at `size`.
    fn ascent(&self, font: &str, size: Pt) -> Result<Pt, MetricsError>;

    /// Distance the font descends below the baseline at `size`, as a
    /// positive length.
    fn descent(&self, font: &str, size: Pt) -> Result<Pt, MetricsError>;
}

#[derive(Debug)]
pub enum MetricsError {
    UnknownFont(String),
    InvalidFontData(String),
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::UnknownFont(name) => write!(f, "unknown font: {}", name),
            MetricsError::InvalidFontData(source) => {
                write!(f, "invalid font data: {}", source)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

impl From<MetricsError> for LayoutError {
    fn from(value: MetricsError) -> Self {
        LayoutError::Font(value.to_string())
    }
}

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 126;

struct LoadedFont {
    name: String,
    // Advance widths for the printable ASCII range, in 1000-unit em space.
    widths: [u16; (LAST_CHAR - FIRST_CHAR + 1) as usize],
    missing_width: u16,
    ascent: i32,
    descent: i32,
}

impl LoadedFont {
    fn advance_units(&self, ch: char) -> i64 {
        let code = ch as u32;
        if (FIRST_CHAR as u32..=LAST_CHAR as u32).contains(&code) {
            self.widths[(code - FIRST_CHAR as u32) as usize] as i64
        } else {
            self.missing_width as i64
        }
    }
}

#[derive(Hash, PartialEq, Eq)]
struct WidthKey {
    font_index: usize,
    size_milli: i64,
    text: String,
}

/// Font metrics backed by parsed TTF/OTF files. Shareable across renders;
/// the width cache is interior-mutex state, matching the single-writer
/// drawing model (measurement is the only concurrent-safe operation).
pub struct FontRegistry {
    fonts: Vec<LoadedFont>,
    lookup: HashMap<String, usize>,
    width_cache: Mutex<HashMap<WidthKey, Pt>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            lookup: HashMap::new(),
            width_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let Ok(entries) = fs::read_dir(path) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                let _ = self.register_file(&path);
            }
        }
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<String, LayoutError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|v| v.to_str())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();
        if ext != "ttf" && ext != "otf" {
            return Err(LayoutError::Font(format!(
                "unsupported font file: {}",
                path.display()
            )));
        }
        let data = fs::read(path)?;
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("font")
            .to_string();
        self.register_bytes(&data, &stem)
    }

    pub fn register_bytes(&mut self, data: &[u8], fallback_name: &str) -> Result<String, LayoutError> {
        let face = ttf_parser::Face::parse(data, 0).map_err(|_| {
            LayoutError::Font(format!("invalid font data for {fallback_name}"))
        })?;

        let units_per_em = face.units_per_em().max(1) as i64;
        let scale = |value: i64| -> i64 { (value * 1000 + units_per_em / 2) / units_per_em };

        let mut widths = [0u16; (LAST_CHAR - FIRST_CHAR + 1) as usize];
        for code in FIRST_CHAR..=LAST_CHAR {
            let ch = code as char;
            let advance = face
                .glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| scale(adv as i64))
                .unwrap_or(0);
            widths[(code - FIRST_CHAR) as usize] = advance.clamp(0, u16::MAX as i64) as u16;
        }
        // 'x' advance stands in for characters outside the table.
        let missing_width = widths[(b'x' - FIRST_CHAR) as usize].max(250);
        let ascent = scale(face.ascender() as i64) as i32;
        let descent = scale(face.descender() as i64) as i32;

        let name = face_full_name(&face).unwrap_or_else(|| fallback_name.to_string());
        let index = self.fonts.len();
        self.fonts.push(LoadedFont {
            name: name.clone(),
            widths,
            missing_width,
            ascent,
            descent,
        });

        for alias in [name.as_str(), fallback_name] {
            let key = normalize_name(alias);
            if key.is_empty() || self.lookup.contains_key(&key) {
                continue;
            }
            self.lookup.insert(key, index);
        }

        Ok(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn font_names(&self) -> Vec<&str> {
        self.fonts.iter().map(|font| font.name.as_str()).collect()
    }

    fn resolve(&self, name: &str) -> Result<(usize, &LoadedFont), MetricsError> {
        let key = normalize_name(name);
        let index = self
            .lookup
            .get(&key)
            .copied()
            .ok_or_else(|| MetricsError::UnknownFont(name.to_string()))?;
        Ok((index, &self.fonts[index]))
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontMetrics for FontRegistry {
    fn text_width(&self, font: &str, size: Pt, text: &str) -> Result<Pt, MetricsError> {
        let (index, loaded) = self.resolve(font)?;
        let key = WidthKey {
            font_index: index,
            size_milli: size.to_milli_i64(),
            text: text.to_string(),
        };
        if let Ok(cache) = self.width_cache.lock() {
            if let Some(value) = cache.get(&key) {
                return Ok(*value);
            }
        }
        let units: i64 = text.chars().map(|ch| loaded.advance_units(ch)).sum();
        let value = scale_units(size, units);
        if let Ok(mut cache) = self.width_cache.lock() {
            cache.insert(key, value);
        }
        Ok(value)
    }

    fn ascent(&self, font: &str, size: Pt) -> Result<Pt, MetricsError> {
        let (_, loaded) = self.resolve(font)?;
        Ok(scale_units(size, loaded.ascent.max(0) as i64))
    }

    fn descent(&self, font: &str, size: Pt) -> Result<Pt, MetricsError> {
        let (_, loaded) = self.resolve(font)?;
        Ok(scale_units(size, (-loaded.descent).max(0) as i64))
    }
}

/// Every character advances the same fraction of the em. Deterministic
/// substitute metrics for environments with no font files, and the standard
/// test double.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetrics {
    advance: u16,
    ascent: u16,
    descent: u16,
}

impl FixedMetrics {
    pub fn new(advance_per_mille: u16) -> Self {
        Self {
            advance: advance_per_mille,
            ascent: 800,
            descent: 200,
        }
    }
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self::new(500)
    }
}

impl FontMetrics for FixedMetrics {
    fn text_width(&self, _font: &str, size: Pt, text: &str) -> Result<Pt, MetricsError> {
        let units = self.advance as i64 * text.chars().count() as i64;
        Ok(scale_units(size, units))
    }

    fn ascent(&self, _font: &str, size: Pt) -> Result<Pt, MetricsError> {
        Ok(scale_units(size, self.ascent as i64))
    }

    fn descent(&self, _font: &str, size: Pt) -> Result<Pt, MetricsError> {
        Ok(scale_units(size, self.descent as i64))
    }
}

fn scale_units(size: Pt, units_per_mille: i64) -> Pt {
    let milli = size.to_milli_i64() as i128 * units_per_mille as i128;
    let adj = if milli >= 0 { 500 } else { -500 };
    let milli = (milli + adj) / 1000;
    Pt::from_milli_i64(milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

fn face_full_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;
    for record in face.names() {
        let Some(name) = record.to_string() else {
            continue;
        };
        if record.name_id == name_id::FULL_NAME && !name.trim().is_empty() {
            return Some(name);
        }
    }
    None
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
