// SPDX-License-Identifier: MPL-2.0
//! Presentation surface port: the pixel primitives the engine needs to turn a
//! decoded frame into what the host draws.

use crate::domain::media::{Point, RawImage, Size};
use crate::domain::video::Alpha;

pub trait Presenter: Send + Sync {
    /// Returns `image` resampled to `size`.
    fn scale(&self, image: &RawImage, size: Size) -> RawImage;

    /// Returns `image` with its opacity multiplied by `alpha`.
    fn set_alpha(&self, image: &RawImage, alpha: Alpha) -> RawImage;

    /// Composites `image` onto `target` with its top-left corner at `position`.
    /// Parts falling outside `target` are clipped.
    fn blit(&self, target: &mut RawImage, image: &RawImage, position: Point);
}
