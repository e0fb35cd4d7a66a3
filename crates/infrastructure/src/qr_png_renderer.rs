//! PNG rendering of specimen QR labels.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use herbarium_application::QrRenderer;
use herbarium_core::{AppError, AppResult};
use herbarium_domain::{QrErrorCorrection, QrResolution};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// [`QrRenderer`] that encodes with `qrcode` and paints modules with `image`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrPngRenderer;

impl QrPngRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn ec_level(error_correction: QrErrorCorrection) -> EcLevel {
    match error_correction {
        QrErrorCorrection::L => EcLevel::L,
        QrErrorCorrection::M => EcLevel::M,
        QrErrorCorrection::Q => EcLevel::Q,
        QrErrorCorrection::H => EcLevel::H,
    }
}

impl QrRenderer for QrPngRenderer {
    fn render(
        &self,
        payload: &str,
        error_correction: QrErrorCorrection,
        resolution: QrResolution,
        border: i32,
    ) -> AppResult<Vec<u8>> {
        let border = u32::try_from(border)
            .map_err(|_| AppError::Validation(format!("border {border} must not be negative")))?;
        let code = QrCode::with_error_correction_level(payload.as_bytes(), ec_level(error_correction))
            .map_err(|error| AppError::Validation(format!("payload cannot be encoded: {error}")))?;

        let width = code.width();
        let colors = code.to_colors();
        let modules = u32::try_from(width).unwrap_or(u32::MAX).saturating_add(2 * border);
        let side = resolution.pixels();

        // Nearest-module sampling keeps the output exactly `side` pixels wide.
        let canvas = GrayImage::from_fn(side, side, |x, y| {
            let column = (x * modules / side).checked_sub(border);
            let row = (y * modules / side).checked_sub(border);
            match (column, row) {
                (Some(column), Some(row)) => {
                    let (column, row) = (column as usize, row as usize);
                    if column < width && row < width && colors[row * width + column] == Color::Dark {
                        DARK
                    } else {
                        LIGHT
                    }
                }
                _ => LIGHT,
            }
        });

        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(canvas)
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|error| AppError::Internal(format!("failed to encode QR image: {error}")))?;

        Ok(encoded.into_inner())
    }
}
