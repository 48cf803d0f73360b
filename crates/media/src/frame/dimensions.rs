//! Declares the [Dimensions] type.

use std::fmt::{self, Display, Formatter};
use std::num::NonZeroU32;

/// A width and a height in pixels, both guaranteed to be non-zero.
///
/// # Example
///
/// [From<(u32, u32)>] is implemented for [Dimensions]. If either side is `0`,
/// the thread will panic. [Into::into] should really only be used if you're
/// providing the side lengths as literals (e.g. `(1920, 1080).into()`).
///
/// ```
/// use media::frame::Dimensions;
///
/// let d: Dimensions = (1920, 1080).into();
/// assert_eq!(d.width(), 1920);
/// assert_eq!(d.height(), 1080);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl Dimensions {
    /// Construct from a width and a height.
    ///
    /// This function will return [None] if the width or height are 0. Also see
    /// [Self::from_non_zero].
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        let Some(width) = NonZeroU32::new(width) else {
            return None;
        };
        let Some(height) = NonZeroU32::new(height) else {
            return None;
        };

        Some(Self::from_non_zero(width, height))
    }

    /// Construct from a non-zero width and a height.
    ///
    /// Unlike [Self::new], this function will always succeed (since
    /// [NonZeroU32] ensures the sides are both non-zero at compile time).
    pub const fn from_non_zero(width: NonZeroU32, height: NonZeroU32) -> Self {
        Self { width, height }
    }

    /// The dimensions' width.
    ///
    /// This will never be `0`.
    pub const fn width(&self) -> u32 {
        self.width.get()
    }

    /// The dimensions' height.
    ///
    /// This will never be `0`.
    pub const fn height(&self) -> u32 {
        self.height.get()
    }

    /// The dimensions of a chroma plane when both directions are subsampled by
    /// 2 (the 4:2:0 layout). Odd sides round up so the last column/row still
    /// has chroma samples.
    ///
    /// # Example
    ///
    /// ```
    /// use media::frame::Dimensions;
    ///
    /// let d: Dimensions = (1281, 721).into();
    /// assert_eq!(d.chroma_420(), (641, 361).into());
    /// ```
    pub const fn chroma_420(&self) -> Self {
        // SAFETY: Both sides are non-zero, and rounding a non-zero side up
        // after halving it can never produce 0.
        unsafe {
            Self::from_non_zero(
                NonZeroU32::new_unchecked(self.width.get().div_ceil(2)),
                NonZeroU32::new_unchecked(self.height.get().div_ceil(2)),
            )
        }
    }
}

/// When displayed, [Dimensions] will look like `WxH` (e.g. `1920x1080`).
impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// If either side is `0`, the thread will panic. [Into::into] should really
/// only be used if you're providing the side lengths as literals (e.g.
/// `(1920, 1080).into()`).
impl From<(u32, u32)> for Dimensions {
    fn from(dimensions: (u32, u32)) -> Self {
        Self::new(dimensions.0, dimensions.1).expect("Both sides must be non-zero.")
    }
}

impl From<Dimensions> for (u32, u32) {
    fn from(dimensions: Dimensions) -> Self {
        (dimensions.width(), dimensions.height())
    }
}
