//! Screenshot payload lookup and cropping.
//!
//! Screenshots are attached after the report body as MIME parts:
//!
//! ```text
//! --=_NextPart_SMP_1d4d...
//! Content-Type: image/jpeg
//! Content-Transfer-Encoding: base64
//! Content-Location: screenshot0001.JPEG
//!
//! /9j/4AAQSkZJRgABAQEAYABgAAD...
//! --=_NextPart_SMP_1d4d...
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use image::ImageFormat;
use std::io::Cursor;

use super::actions::{ActionRecord, HighlightRect};
use super::error::{ReportError, ReportResult};

const LOCATION_HEADER: &str = "Content-Location:";
const BOUNDARY: &str = "--";

/// The recorder draws a border around the highlighted element; this inset
/// keeps the element and drops the border.
const BORDER_OFFSET: i32 = 3;
const BORDER_TRIM: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Returns `None` when the highlight is too small to leave any pixels.
    pub fn from_highlight(rect: HighlightRect) -> Option<Self> {
        let width = rect.width - BORDER_TRIM;
        let height = rect.height - BORDER_TRIM;
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            x: (rect.x + BORDER_OFFSET).max(0) as u32,
            y: (rect.y + BORDER_OFFSET).max(0) as u32,
            width: width as u32,
            height: height as u32,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Screenshot {
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Crops the highlighted region out of the action's screenshot.
///
/// Actions without a highlight legitimately have no screenshot.
pub fn extract_screenshot(raw: &str, action: &ActionRecord) -> ReportResult<Option<Screenshot>> {
    let Some(anchor) = &action.anchor else {
        return Ok(None);
    };

    let payload = locate_payload(raw, &anchor.reference).ok_or_else(|| {
        ReportError::ScreenshotNotFound {
            action: action.action_number,
            reference: anchor.reference.clone(),
        }
    })?;

    let decoded = STANDARD
        .decode(payload.as_bytes())
        .map_err(|err| ReportError::ImageProcessing {
            action: action.action_number,
            message: format!("invalid base64 payload: {err}"),
        })?;

    let crop = CropBox::from_highlight(anchor.rect).ok_or(ReportError::InvalidHighlight {
        action: action.action_number,
        width: anchor.rect.width,
        height: anchor.rect.height,
    })?;

    crop_image(&decoded, crop)
        .map(Some)
        .map_err(|message| ReportError::ImageProcessing {
            action: action.action_number,
            message,
        })
}

/// Finds the base64 body of the part whose `Content-Location` is `reference`,
/// with line breaks removed.
pub fn locate_payload(raw: &str, reference: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(found) = raw[search_from..].find(LOCATION_HEADER) {
        let header_start = search_from + found;
        let value_start = header_start + LOCATION_HEADER.len();
        let line_end = raw[value_start..]
            .find('\n')
            .map_or(raw.len(), |pos| value_start + pos);
        search_from = line_end;

        if raw[value_start..line_end].trim() != reference {
            continue;
        }

        let mut lines = raw[line_end..].split('\n').skip(1);
        // Remaining part headers end at the first blank line.
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
        }

        let mut body = String::new();
        for line in lines {
            let line = line.trim();
            if line.starts_with(BOUNDARY) {
                break;
            }
            body.push_str(line);
        }

        return if body.is_empty() { None } else { Some(body) };
    }
    None
}

fn crop_image(bytes: &[u8], crop: CropBox) -> Result<Screenshot, String> {
    let format = image::guess_format(bytes).map_err(|e| format!("unknown image format: {e}"))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| format!("failed to decode image: {e}"))?;

    if crop.x >= img.width() || crop.y >= img.height() {
        return Err(format!(
            "crop origin {}x{} lies outside the {}x{} screenshot",
            crop.x,
            crop.y,
            img.width(),
            img.height()
        ));
    }

    let cropped = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, format)
        .map_err(|e| format!("failed to encode cropped image: {e}"))?;

    Ok(Screenshot {
        bytes: buffer.into_inner(),
        format,
    })
}
