//! Grayscale image containers and views.
//!
//! - [`ImageU8`]: borrowed 8-bit view with stride, the usual camera input.
//! - [`ImageF32`]: owned float buffer, used for float inputs and for the
//!   Harris strength map.
//! - [`ImageSample`]: clamped and bilinear reads shared by the detector and
//!   the matcher.
pub mod f32;
pub mod io;
pub mod sample;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::sample::ImageSample;
pub use self::traits::{ImageView, ImageViewMut, Rows, RowsMut};
pub use self::u8::ImageU8;
