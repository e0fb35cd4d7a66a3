//! Image decoding, thumbnails and EXIF extraction for taxon uploads.

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, In, Tag, Value};
use image::{DynamicImage, ImageFormat};

use herbarium_application::{ImageInspector, InspectedImage};
use herbarium_core::{AppError, AppResult};
use herbarium_domain::ImageVariant;

/// [`ImageInspector`] backed by the `image` and `kamadak-exif` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterImageInspector;

impl RasterImageInspector {
    /// Creates an inspector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ImageInspector for RasterImageInspector {
    fn inspect(&self, bytes: &[u8]) -> AppResult<InspectedImage> {
        let format = image::guess_format(bytes)
            .map_err(|error| AppError::Validation(format!("unrecognised image: {error}")))?;
        let (mime_type, extension) = media_type(format)?;

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|error| AppError::Validation(format!("image cannot be decoded: {error}")))?;

        let exif = read_exif(bytes);
        let camera = exif.as_ref().and_then(camera);
        let captured_at = exif.as_ref().and_then(captured_at);

        Ok(InspectedImage {
            width: dimension(decoded.width())?,
            height: dimension(decoded.height())?,
            mime_type: mime_type.to_owned(),
            extension: extension.to_owned(),
            thumbnail_small: thumbnail(&decoded, ImageVariant::Small)?,
            thumbnail_medium: thumbnail(&decoded, ImageVariant::Medium)?,
            camera,
            captured_at,
        })
    }
}

fn media_type(format: ImageFormat) -> AppResult<(&'static str, &'static str)> {
    match format {
        ImageFormat::Png => Ok(("image/png", "png")),
        ImageFormat::Jpeg => Ok(("image/jpeg", "jpg")),
        ImageFormat::Gif => Ok(("image/gif", "gif")),
        ImageFormat::WebP => Ok(("image/webp", "webp")),
        ImageFormat::Bmp => Ok(("image/bmp", "bmp")),
        ImageFormat::Tiff => Ok(("image/tiff", "tiff")),
        other => Err(AppError::Validation(format!(
            "image format {other:?} is not accepted"
        ))),
    }
}

fn dimension(value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("image dimension {value} is too large")))
}

fn thumbnail(image: &DynamicImage, variant: ImageVariant) -> AppResult<Vec<u8>> {
    let size = variant.thumbnail_size().unwrap_or(200);
    let mut encoded = Cursor::new(Vec::new());
    image
        .thumbnail(size, size)
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|error| AppError::Internal(format!("failed to encode thumbnail: {error}")))?;

    Ok(encoded.into_inner())
}

fn read_exif(bytes: &[u8]) -> Option<Exif> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Some(exif),
        Err(error) => {
            tracing::debug!(error = %error, "upload carries no readable EXIF data");
            None
        }
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(ref values) = field.value else {
        return None;
    };

    values
        .first()
        .map(|value| String::from_utf8_lossy(value).trim_matches(['\0', ' ']).to_owned())
        .filter(|value| !value.is_empty())
}

/// `Make Model`, or whichever of the two is present.
fn camera(exif: &Exif) -> Option<String> {
    let parts: Vec<String> = [Tag::Make, Tag::Model]
        .into_iter()
        .filter_map(|tag| ascii_field(exif, tag))
        .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

/// `DateTimeOriginal`, falling back to `DateTime`.
fn captured_at(exif: &Exif) -> Option<NaiveDateTime> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| {
            let field = exif.get_field(tag, In::PRIMARY)?;
            let Value::Ascii(ref values) = field.value else {
                return None;
            };
            let stamp = exif::DateTime::from_ascii(values.first()?).ok()?;

            NaiveDate::from_ymd_opt(
                i32::from(stamp.year),
                u32::from(stamp.month),
                u32::from(stamp.day),
            )?
            .and_hms_opt(
                u32::from(stamp.hour),
                u32::from(stamp.minute),
                u32::from(stamp.second),
            )
        })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use herbarium_application::ImageInspector;
    use herbarium_core::AppError;

    use super::RasterImageInspector;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let picture = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
        let mut bytes = Cursor::new(Vec::new());
        picture
            .write_to(&mut bytes, format)
            .unwrap_or_else(|_| unreachable!());
        bytes.into_inner()
    }

    #[test]
    fn png_upload_is_measured_and_thumbnailed() {
        let inspected = RasterImageInspector::new()
            .inspect(&encoded(640, 480, ImageFormat::Png))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!((inspected.width, inspected.height), (640, 480));
        assert_eq!(inspected.mime_type, "image/png");
        assert_eq!(inspected.extension, "png");
        assert!(inspected.camera.is_none());
        assert!(inspected.captured_at.is_none());

        let small = image::load_from_memory(&inspected.thumbnail_small)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!((small.width(), small.height()), (80, 60));
        let medium = image::load_from_memory(&inspected.thumbnail_medium)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(medium.width(), 200);
    }

    #[test]
    fn jpeg_upload_reports_its_media_type() {
        let inspected = RasterImageInspector::new()
            .inspect(&encoded(120, 90, ImageFormat::Jpeg))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(inspected.mime_type, "image/jpeg");
        assert_eq!(inspected.extension, "jpg");
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let result = RasterImageInspector::new().inspect(b"definitely not an image");
        assert!(matches!(result, Err(AppError::Validation(_))));

        let mut truncated = encoded(64, 64, ImageFormat::Png);
        truncated.truncate(40);
        let result = RasterImageInspector::new().inspect(&truncated);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
