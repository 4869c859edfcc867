//! Plain row-major buffers used by the working image and its accumulators.
//!
//! Hand-rolled `Vec`-backed buffers with a handful of accessors, rather
//! than a numeric-array crate dependency, since nothing else in this
//! crate needs more than 2D indexing and edge-replicated lookups.

use nalgebra::Vector3;

/// H×W×3 scalar buffer in the working color space.
#[derive(Clone, Debug)]
pub struct Image3f {
    width: usize,
    height: usize,
    data: Vec<Vector3<f32>>,
}

impl Image3f {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Vector3::zeros(); width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Vector3<f32> {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: Vector3<f32>) {
        let i = self.index(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn add_at(&mut self, x: usize, y: usize, v: Vector3<f32>) {
        let i = self.index(x, y);
        self.data[i] += v;
    }

    /// Edge-replicated read: out-of-range coordinates clamp to the border.
    /// Used by every stencil in this crate (Laplacian, box filter,
    /// dilation/erosion) so none of them ever wrap around the image.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> Vector3<f32> {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cy)
    }

    pub fn map<F: Fn(Vector3<f32>) -> Vector3<f32>>(&self, f: F) -> Image3f {
        let mut out = Image3f::zeros(self.width, self.height);
        for (dst, src) in out.data.iter_mut().zip(self.data.iter()) {
            *dst = f(*src);
        }
        out
    }
}

/// H×W scalar buffer (weight accumulator, alpha, luminance, ...).
#[derive(Clone, Debug)]
pub struct Image1f {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Image1f {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.index(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn add_at(&mut self, x: usize, y: usize, v: f32) {
        let i = self.index(x, y);
        self.data[i] += v;
    }

    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cy)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// H×W boolean buffer (seam-selection mask, hit region).
#[derive(Clone, Debug)]
pub struct MaskBuf {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl MaskBuf {
    pub fn filled(width: usize, height: usize, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        let i = self.index(x, y);
        self.data[i] = v;
    }

    /// Edge-replicated read, consistent with the numeric buffers: no
    /// implicit "false outside the image" padding, the border pixel's own
    /// value is reused instead. See spec §9's "explicit edge-replicated
    /// padding" requirement, which this crate applies uniformly to every
    /// stencil including the morphological ones.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> bool {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cy)
    }

    pub fn any(&self) -> bool {
        self.data.iter().any(|&b| b)
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }
}
