// SPDX-License-Identifier: MPL-2.0
//! Presentation adapter backed by the `image` crate.
//!
//! Works directly on RGBA buffers, so it runs anywhere (no window, no GPU).
//! Hosts drawing through a real graphics stack swap in their own
//! [`Presenter`].

use crate::application::port::Presenter;
use crate::domain::media::{Point, RawImage, Size};
use crate::domain::video::Alpha;
use image_rs::{imageops, imageops::FilterType, RgbaImage};

/// CPU presenter: bilinear scaling, alpha multiply, alpha-blended blits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePresenter;

impl ImagePresenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Converts a domain image into an `image` buffer.
///
/// `RawImage` guarantees its buffer length, so the conversion only fails on
/// zero-sized images.
pub(crate) fn to_rgba_image(image: &RawImage) -> Option<RgbaImage> {
    RgbaImage::from_raw(image.width(), image.height(), image.rgba_bytes().to_vec())
}

pub(crate) fn from_rgba_image(image: RgbaImage) -> RawImage {
    let (width, height) = image.dimensions();
    RawImage::from_rgba(width, height, image.into_raw())
}

impl Presenter for ImagePresenter {
    fn scale(&self, image: &RawImage, size: Size) -> RawImage {
        if image.size() == size {
            return image.clone();
        }
        if size.is_empty() {
            return RawImage::from_rgba(size.width, size.height, Vec::new());
        }
        match to_rgba_image(image) {
            Some(buffer) => from_rgba_image(imageops::resize(
                &buffer,
                size.width,
                size.height,
                FilterType::Triangle,
            )),
            None => RawImage::blank(size),
        }
    }

    fn set_alpha(&self, image: &RawImage, alpha: Alpha) -> RawImage {
        if alpha.is_opaque() {
            return image.clone();
        }
        let factor = u16::from(alpha.value());
        let mut pixels = image.rgba_bytes().to_vec();
        for px in pixels.chunks_exact_mut(4) {
            // factor and px[3] are both <= 255, so the quotient fits in u8
            px[3] = ((u16::from(px[3]) * factor) / 255) as u8;
        }
        RawImage::from_rgba(image.width(), image.height(), pixels)
    }

    fn blit(&self, target: &mut RawImage, image: &RawImage, position: Point) {
        let (Some(mut bottom), Some(top)) = (to_rgba_image(target), to_rgba_image(image)) else {
            return;
        };
        imageops::overlay(&mut bottom, &top, position.x, position.y);
        *target = from_rgba_image(bottom);
    }
}
