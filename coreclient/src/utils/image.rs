// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::io::Cursor;

use exif::{Exif, Tag};
use image::{
    DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgba, RgbaImage,
    codecs::jpeg::JpegEncoder, imageops::FilterType,
};
use tracing::{debug, info};

const MAX_UPLOAD_IMAGE_WIDTH: u32 = 4096;
const MAX_UPLOAD_IMAGE_HEIGHT: u32 = 4096;

const DEFAULT_AVATAR_COLOR: Rgba<u8> = Rgba([0x9e, 0x9e, 0x9e, 0xff]);

/// Renders a sender's profile image as a circular avatar.
///
/// The image is rotated according to its EXIF orientation, cropped to a centered square,
/// resized to `diameter` and masked with a circle. Returns PNG bytes.
pub(crate) fn circular_avatar(image_bytes: &[u8], diameter: u32) -> anyhow::Result<Vec<u8>> {
    let image = image::load_from_memory(image_bytes)?;
    let image = rotate(read_exif(image_bytes), image);

    let (width, height) = image.dimensions();
    let side = width.min(height);
    let image = image
        .crop_imm((width - side) / 2, (height - side) / 2, side, side)
        .resize_exact(diameter, diameter, FilterType::Lanczos3);

    let mut avatar = image.to_rgba8();
    apply_circle_mask(&mut avatar);
    let png = encode_png(avatar)?;
    debug!(
        from_bytes = image_bytes.len(),
        to_bytes = png.len(),
        diameter,
        "Rendered avatar"
    );
    Ok(png)
}

/// Renders the built-in avatar shown for senders without a profile image.
pub fn render_default_avatar(diameter: u32) -> anyhow::Result<Vec<u8>> {
    let mut avatar = RgbaImage::from_pixel(diameter, diameter, DEFAULT_AVATAR_COLOR);
    apply_circle_mask(&mut avatar);
    encode_png(avatar)
}

/// Reencodes a photo as JPEG for upload.
///
/// Rotates and flips the image according to the EXIF orientation and limits its size to
/// 4096x4096.
pub(crate) fn reencode_jpeg(image_bytes: &[u8], quality: u8) -> anyhow::Result<Vec<u8>> {
    let image = image::load_from_memory(image_bytes)?;
    let image = rotate(read_exif(image_bytes), image);
    let image = resize(image);

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&DynamicImage::ImageRgb8(image.to_rgb8()))?;
    info!(
        from_bytes = image_bytes.len(),
        to_bytes = buf.len(),
        quality,
        "Reencoded photo as JPEG",
    );
    Ok(buf)
}

/// Width and height of an encoded image without decoding its pixels
pub(crate) fn dimensions(image_bytes: &[u8]) -> anyhow::Result<(u32, u32)> {
    let dimensions = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(dimensions)
}

fn read_exif(image_bytes: &[u8]) -> Option<Exif> {
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(image_bytes))
        .ok()
}

// Rotate/flip the image according to the orientation if necessary
fn rotate(exif: Option<Exif>, image: DynamicImage) -> DynamicImage {
    let Some(exif) = exif else {
        return image;
    };
    let orientation = exif
        .get_field(Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(1);
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

fn resize(image: DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();

    if width <= MAX_UPLOAD_IMAGE_WIDTH && height <= MAX_UPLOAD_IMAGE_HEIGHT {
        return image;
    }

    let scale_x = MAX_UPLOAD_IMAGE_WIDTH as f32 / width as f32;
    let scale_y = MAX_UPLOAD_IMAGE_HEIGHT as f32 / height as f32;
    let scale = scale_x.min(scale_y);

    let new_width = (width as f32 * scale).round() as u32;
    let new_height = (height as f32 * scale).round() as u32;

    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Makes everything outside the inscribed circle transparent, with a one pixel soft edge.
fn apply_circle_mask(image: &mut RgbaImage) {
    let (width, height) = image.dimensions();
    let radius = width.min(height) as f32 / 2.0;
    let (center_x, center_y) = (width as f32 / 2.0, height as f32 / 2.0);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center_x;
        let dy = y as f32 + 0.5 - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
        pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
    }
}

fn encode_png(image: RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([0x20, 0x80, 0xe0]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn circular_avatar_is_square_and_masked() {
        let png = circular_avatar(&png_bytes(80, 40), 30).unwrap();
        let avatar = image::load_from_memory(&png).unwrap().to_rgba8();

        assert_eq!(avatar.dimensions(), (30, 30));
        assert_eq!(avatar.get_pixel(0, 0)[3], 0);
        assert_eq!(avatar.get_pixel(29, 29)[3], 0);
        assert_eq!(avatar.get_pixel(15, 15)[3], 0xff);
    }

    #[test]
    fn default_avatar() {
        let png = render_default_avatar(30).unwrap();
        let avatar = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(avatar.dimensions(), (30, 30));
        assert_eq!(avatar.get_pixel(0, 0)[3], 0);
        assert_eq!(*avatar.get_pixel(15, 15), DEFAULT_AVATAR_COLOR);
    }

    #[test]
    fn reencoded_photo_is_jpeg() {
        let jpeg = reencode_jpeg(&png_bytes(64, 48), 80).unwrap();
        assert_eq!(&jpeg[..3], &[0xff, 0xd8, 0xff]);
        assert_eq!(dimensions(&jpeg).unwrap(), (64, 48));
    }

    #[test]
    fn garbage_is_not_an_image() {
        assert!(circular_avatar(b"not an image", 30).is_err());
        assert!(reencode_jpeg(b"not an image", 80).is_err());
        assert!(dimensions(b"not an image").is_err());
    }
}
