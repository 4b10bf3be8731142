// QR-code labels for asset ids

use std::fmt::Write as _;

use qrcode::render::{Renderer, svg, unicode::Dense1x2};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Modules of light border required around a printed code
const QUIET_ZONE: usize = 4;

/// Narrower border for terminal output, where space is tight
const TERMINAL_QUIET_ZONE: usize = 2;

/// Labels per row on a print sheet
const SHEET_COLUMNS: usize = 4;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode {id:?} as a QR code: {reason}")]
    Encode { id: String, reason: String },
}

/// QR error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    #[default]
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Rendering size (pixels, edge length) and error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrOptions {
    pub size: u32,
    pub ec_level: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 200,
            ec_level: ErrorCorrection::H,
        }
    }
}

/// What goes on one printed label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A QR symbol for one id, independent of where it is rendered
#[derive(Debug, Clone, PartialEq)]
pub struct ScannableCode {
    data: String,
    options: QrOptions,
    width: usize,
    modules: Vec<Color>,
}

impl ScannableCode {
    /// The text encoded in the symbol
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn options(&self) -> QrOptions {
        self.options
    }

    /// Modules per side, excluding the quiet zone
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x] == Color::Dark
    }

    /// Standalone SVG document, at least the configured pixel size
    ///
    /// Modules are whole pixels, so the edge rounds up to a multiple of the
    /// symbol width plus its quiet zone.
    pub fn to_svg(&self) -> String {
        Renderer::<svg::Color>::new(&self.modules, self.width, QUIET_ZONE as u32)
            .min_dimensions(self.options.size, self.options.size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build()
    }

    /// Half-block rendering for a dark-background terminal
    ///
    /// Light modules are drawn, dark modules are left blank, so the code
    /// scans as dark-on-light.
    pub fn to_terminal(&self) -> String {
        Renderer::<Dense1x2>::new(&self.modules, self.width, TERMINAL_QUIET_ZONE as u32)
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .build()
    }

    /// SVG path data for the dark modules, offset by `margin` modules
    fn module_path(&self, margin: usize) -> String {
        let mut d = String::new();
        for y in 0..self.width {
            for x in 0..self.width {
                if self.is_dark(x, y) {
                    let _ = write!(d, "M{} {}h1v1h-1z", x + margin, y + margin);
                }
            }
        }
        d
    }
}

/// Encode one id. The id is treated as opaque bytes; the same id and
/// options always yield the same symbol.
pub fn encode(id: &str, options: QrOptions) -> Result<ScannableCode, EncodeError> {
    let code = QrCode::with_error_correction_level(id.as_bytes(), options.ec_level.into()).map_err(|e| {
        EncodeError::Encode {
            id: id.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(ScannableCode {
        data: id.to_string(),
        options,
        width: code.width(),
        modules: code.to_colors(),
    })
}

/// Encode each label on its own; no state is shared between records
pub fn encode_batch(labels: &[Label], options: QrOptions) -> Result<Vec<(Label, ScannableCode)>, EncodeError> {
    labels
        .iter()
        .map(|label| encode(&label.id, options).map(|code| (label.clone(), code)))
        .collect()
}

/// One printable SVG page with a grid of labelled codes
///
/// Each cell holds the code at `options.size` pixels, the asset name and
/// the first eight characters of the id.
pub fn print_sheet(labels: &[Label], options: QrOptions) -> Result<String, EncodeError> {
    let codes = encode_batch(labels, options)?;

    let size = options.size as usize;
    let cell_w = size + 40;
    let cell_h = size + 70;
    let columns = SHEET_COLUMNS.min(codes.len().max(1));
    let rows = codes.len().div_ceil(SHEET_COLUMNS).max(1);
    let page_w = columns * cell_w;
    let page_h = rows * cell_h;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{page_w}" height="{page_h}" viewBox="0 0 {page_w} {page_h}" font-family="sans-serif">"#
    );
    let _ = write!(svg, r##"<rect width="{page_w}" height="{page_h}" fill="#ffffff"/>"##);

    for (i, (label, code)) in codes.iter().enumerate() {
        let col = i % SHEET_COLUMNS;
        let row = i / SHEET_COLUMNS;
        let x = col * cell_w + 20;
        let y = row * cell_h + 10;
        let span = code.width() + 2 * QUIET_ZONE;
        let scale = size as f64 / span as f64;

        let _ = write!(
            svg,
            r##"<g transform="translate({x} {y}) scale({scale:.4})" shape-rendering="crispEdges"><path fill="#000000" d="{}"/></g>"##,
            code.module_path(QUIET_ZONE),
        );

        let center = x + size / 2;
        let _ = write!(
            svg,
            r#"<text x="{center}" y="{}" font-size="14" font-weight="bold" text-anchor="middle">{}</text>"#,
            y + size + 20,
            escape_xml(&label.name),
        );
        let _ = write!(
            svg,
            r##"<text x="{center}" y="{}" font-size="10" fill="#666666" text-anchor="middle" font-family="monospace">{}</text>"##,
            y + size + 38,
            escape_xml(&short_id(&label.id)),
        );
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// First eight characters of an id, as shown under printed codes
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
