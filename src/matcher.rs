//! Template matching against full-screen captures
//!
//! Pure image-buffer code with no desktop dependency: callers hand in a
//! capture and a reference image and get back the best matching region, if
//! any clears the confidence threshold. Matching uses normalized cross
//! correlation; grayscale is the default, color mode matches each RGB
//! channel separately and scores a position by its worst channel.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, Luma, RgbaImage};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};
use thiserror::Error;

use crate::desktop::Region;

/// Errors from a match attempt. A reference that simply is not on screen is
/// not an error; that case is `Ok(None)` from [`locate`].
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("failed to load reference image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("reference image is {0}x{1} but the screen capture is only {2}x{3}")]
    ReferenceTooLarge(u32, u32, u32, u32),
}

/// Locate a reference image file on a screen capture.
pub fn locate(
    screen: &RgbaImage,
    reference: &Path,
    confidence: f32,
    grayscale: bool,
) -> Result<Option<Region>, MatchError> {
    let loaded = image::open(reference)
        .map_err(|source| MatchError::Load { path: reference.to_path_buf(), source })?
        .to_rgba8();
    locate_template(screen, &loaded, confidence, grayscale)
}

/// Locate an already-loaded reference image on a screen capture.
pub fn locate_template(
    screen: &RgbaImage,
    reference: &RgbaImage,
    confidence: f32,
    grayscale: bool,
) -> Result<Option<Region>, MatchError> {
    if reference.width() > screen.width() || reference.height() > screen.height() {
        return Err(MatchError::ReferenceTooLarge(
            reference.width(),
            reference.height(),
            screen.width(),
            screen.height(),
        ));
    }

    let (x, y, score) = if grayscale {
        best_grayscale_match(screen, reference)
    } else {
        best_color_match(screen, reference)
    };

    if score >= confidence {
        Ok(Some(Region {
            x,
            y,
            width: reference.width(),
            height: reference.height(),
        }))
    } else {
        Ok(None)
    }
}

fn best_grayscale_match(screen: &RgbaImage, reference: &RgbaImage) -> (u32, u32, f32) {
    let screen_gray = image::imageops::grayscale(screen);
    let reference_gray = image::imageops::grayscale(reference);

    let scores = match_template(
        &screen_gray,
        &reference_gray,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    let extremes = find_extremes(&scores);
    let (x, y) = extremes.max_value_location;
    (x, y, extremes.max_value)
}

/// Color matching: correlate each RGB channel on its own, then score every
/// position by its weakest channel so a hit must agree in all three.
fn best_color_match(screen: &RgbaImage, reference: &RgbaImage) -> (u32, u32, f32) {
    let planes: Vec<ImageBuffer<Luma<f32>, Vec<f32>>> = (0..3)
        .map(|channel| {
            match_template(
                &channel_plane(screen, channel),
                &channel_plane(reference, channel),
                MatchTemplateMethod::CrossCorrelationNormalized,
            )
        })
        .collect();

    let (width, height) = planes[0].dimensions();
    let mut best = (0u32, 0u32, f32::MIN);
    for y in 0..height {
        for x in 0..width {
            let score = planes
                .iter()
                .map(|plane| plane.get_pixel(x, y)[0])
                .fold(f32::INFINITY, f32::min);
            if score > best.2 {
                best = (x, y, score);
            }
        }
    }
    best
}

fn channel_plane(image: &RgbaImage, channel: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[channel]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    // Textured screen with no repeating blocks, so a crop matches in
    // exactly one place.
    fn textured_screen(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * y + 3 * x + 5 * y) % 251) as u8;
            Rgba([v, v, v, 255])
        })
    }

    fn crop(source: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
        image::imageops::crop_imm(source, x, y, width, height).to_image()
    }

    #[test]
    fn finds_embedded_reference_at_exact_region() {
        let screen = textured_screen(64, 48);
        let reference = crop(&screen, 20, 17, 8, 8);

        let region = locate_template(&screen, &reference, 0.99, true)
            .unwrap()
            .expect("embedded reference should be found");
        assert_eq!(region, Region { x: 20, y: 17, width: 8, height: 8 });
    }

    #[test]
    fn color_mode_finds_embedded_reference() {
        let screen = textured_screen(48, 48);
        let reference = crop(&screen, 11, 29, 6, 6);

        let region = locate_template(&screen, &reference, 0.99, false)
            .unwrap()
            .expect("embedded reference should be found");
        assert_eq!(region, Region { x: 11, y: 29, width: 6, height: 6 });
    }

    #[test]
    fn absent_reference_is_a_miss_not_an_error() {
        let screen = textured_screen(64, 48);
        // Inverting the texture guarantees no region is proportional to it.
        let reference = RgbaImage::from_fn(8, 8, |x, y| {
            let v = 255 - ((x * y + 3 * x + 5 * y) % 251) as u8;
            Rgba([v, v, v, 255])
        });

        let found = locate_template(&screen, &reference, 0.95, true).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn oversized_reference_is_an_error() {
        let screen = textured_screen(16, 16);
        let reference = textured_screen(32, 8);

        let err = locate_template(&screen, &reference, 0.8, true).unwrap_err();
        assert!(matches!(err, MatchError::ReferenceTooLarge(32, 8, 16, 16)));
    }

    #[test]
    fn unreadable_reference_file_is_a_load_error() {
        let screen = textured_screen(16, 16);
        let missing = Path::new("/nonexistent/close_button.png");

        let err = locate(&screen, missing, 0.8, true).unwrap_err();
        assert!(matches!(err, MatchError::Load { .. }));
    }

    #[test]
    fn reference_loaded_from_disk_matches() {
        let dir = tempfile::tempdir().unwrap();
        let screen = textured_screen(40, 40);
        let reference = crop(&screen, 9, 13, 7, 7);
        let path = dir.path().join("close_button.png");
        reference.save(&path).unwrap();

        let region = locate(&screen, &path, 0.99, true).unwrap().unwrap();
        assert_eq!(region, Region { x: 9, y: 13, width: 7, height: 7 });
    }
}
