//! Declares [YuvPlanes], a borrowed view of a planar YUV 4:2:0 picture.

use super::Dimensions;

/// One plane of a planar picture: its rows of bytes and the distance (in
/// bytes) between the start of one row and the start of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Checks that this plane can hold `dimensions` worth of 1-byte samples.
    fn check(&self, dimensions: Dimensions, plane: PlaneKind) -> Result<(), PlaneError> {
        let width = dimensions.width() as usize;
        let height = dimensions.height() as usize;

        if self.stride < width {
            return Err(PlaneError::StrideTooSmall {
                plane,
                stride: self.stride,
                width,
            });
        }

        // The last row doesn't need any padding after it.
        let needed = self.stride * (height - 1) + width;
        if self.data.len() < needed {
            return Err(PlaneError::TooShort {
                plane,
                expected: needed,
                actual: self.data.len(),
            });
        }

        Ok(())
    }
}

/// A planar YUV 4:2:0 picture: one full-size luma (Y) plane followed by two
/// chroma (U and V) planes with half the width and half the height.
///
/// Constructing one checks that each plane is big enough for the picture's
/// [Dimensions], so consumers (e.g. a texture upload) can index rows without
/// re-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YuvPlanes<'a> {
    dimensions: Dimensions,
    y: Plane<'a>,
    u: Plane<'a>,
    v: Plane<'a>,
}

impl<'a> YuvPlanes<'a> {
    pub fn new(
        dimensions: Dimensions,
        y: Plane<'a>,
        u: Plane<'a>,
        v: Plane<'a>,
    ) -> Result<Self, PlaneError> {
        y.check(dimensions, PlaneKind::Y)?;
        u.check(dimensions.chroma_420(), PlaneKind::U)?;
        v.check(dimensions.chroma_420(), PlaneKind::V)?;

        Ok(Self { dimensions, y, u, v })
    }

    /// The dimensions of the luma plane (the picture's dimensions).
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The dimensions of each chroma plane.
    pub fn chroma_dimensions(&self) -> Dimensions {
        self.dimensions.chroma_420()
    }

    pub fn y(&self) -> Plane<'a> {
        self.y
    }

    pub fn u(&self) -> Plane<'a> {
        self.u
    }

    pub fn v(&self) -> Plane<'a> {
        self.v
    }
}

/// Which plane of a [YuvPlanes] picture an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneKind {
    Y,
    U,
    V,
}

/// Indicates that a plane couldn't hold the picture it was supposed to.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneError {
    #[error("The {plane:?} plane's stride ({stride}) is smaller than its width ({width}).")]
    StrideTooSmall {
        plane: PlaneKind,
        stride: usize,
        width: usize,
    },
    #[error(
        "The {plane:?} plane should be at least {expected} bytes long \
        but is actually {actual} bytes long."
    )]
    TooShort {
        plane: PlaneKind,
        expected: usize,
        actual: usize,
    },
}
