use nalgebra::Point2;

/// Borrowed single-channel 8-bit image.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned single-channel 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Borrowed interleaved BGR image (3 bytes per pixel, blue first).
#[derive(Clone, Copy, Debug)]
pub struct BgrImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = 3*w*h
}

/// Owned interleaved BGR image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgrImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap an existing buffer; `None` if the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width.checked_mul(height)?).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.view().get(x, y)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = v;
        }
    }
}

impl<'a> GrayImageView<'a> {
    /// Bounds-checked pixel read.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// Pixel read with coordinates clamped to the image (replicated border).
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32) -> u8 {
        let xc = x.clamp(0, self.width as i32 - 1) as usize;
        let yc = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[yc * self.width + xc]
    }

    /// Copy out a `w × h` window with top-left `(x, y)`.
    ///
    /// Returns `None` if any part of the window lies outside the image.
    pub fn roi(&self, x: i32, y: i32, w: usize, h: usize) -> Option<GrayImage> {
        if x < 0 || y < 0 || w == 0 || h == 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x + w > self.width || y + h > self.height {
            return None;
        }
        let mut data = Vec::with_capacity(w * h);
        for row in y..y + h {
            let start = row * self.width + x;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Some(GrayImage {
            width: w,
            height: h,
            data,
        })
    }

    /// Square `dim × dim` window centred on `center` (`dim` odd).
    pub fn roi_centered(&self, center: Point2<i32>, dim: usize) -> Option<GrayImage> {
        let half = (dim / 2) as i32;
        self.roi(center.x - half, center.y - half, dim, dim)
    }

    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl BgrImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; 3 * width * height],
        }
    }

    /// Image filled with a single BGR value.
    pub fn filled(width: usize, height: usize, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(3 * width * height);
        for _ in 0..width * height {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width.checked_mul(height)?.checked_mul(3)?).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> BgrImageView<'_> {
        BgrImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        self.view().get(x, y)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, bgr: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = 3 * (y * self.width + x);
            self.data[i..i + 3].copy_from_slice(&bgr);
        }
    }

    /// Paste `src` with its top-left corner at `(x, y)`, clipping at the borders.
    pub fn blit(&mut self, src: &BgrImage, x: i32, y: i32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let dx = x + sx as i32;
                let dy = y + sy as i32;
                if dx < 0 || dy < 0 {
                    continue;
                }
                if let Some(px) = src.get(sx as i32, sy as i32) {
                    self.set(dx as usize, dy as usize, px);
                }
            }
        }
    }
}

impl<'a> BgrImageView<'a> {
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let i = 3 * (y as usize * self.width + x as usize);
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Extract one channel (0 = blue, 1 = green, 2 = red) as a gray image.
    pub fn channel(&self, c: usize) -> GrayImage {
        let c = c.min(2);
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.chunks_exact(3).map(|px| px[c]).collect(),
        }
    }

    #[inline]
    pub fn same_size(&self, gray: &GrayImageView<'_>) -> bool {
        self.width == gray.width && self.height == gray.height
    }
}

/// Luminance conversion with the usual `0.114 B + 0.587 G + 0.299 R` weights.
pub fn bgr_to_gray(src: &BgrImageView<'_>) -> GrayImage {
    let data = src
        .data
        .chunks_exact(3)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

#[inline]
fn luma(b: u8, g: u8, r: u8) -> u8 {
    let y = 0.114 * b as f32 + 0.587 * g as f32 + 0.299 * r as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Rotate a quarter turn counter-clockwise (upper-right corner moves to upper-left).
pub fn rotate90_ccw(src: &GrayImageView<'_>) -> GrayImage {
    let (w, h) = (src.width, src.height);
    // dst(u, v) = src(w - 1 - v, u); dst is h wide and w tall
    GrayImage::from_fn(h, w, |u, v| src.data[u * w + (w - 1 - v)])
}

/// Rotate a quarter turn clockwise; inverse of [`rotate90_ccw`].
pub fn rotate90_cw(src: &GrayImageView<'_>) -> GrayImage {
    let (w, h) = (src.width, src.height);
    // dst(u, v) = src(v, h - 1 - u)
    GrayImage::from_fn(h, w, |u, v| src.data[(h - 1 - u) * w + v])
}
