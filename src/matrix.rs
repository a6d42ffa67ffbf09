/// A 2D grid of values stored row-major.
///
/// Lookups wrap around both axes, so the grid tiles the plane. This backs the
/// density texture loaded from an image asset.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix2D<T> {
    pub width: usize,
    pub height: usize,
    values: Vec<T>,
}

impl<T: Copy + Default> Matrix2D<T> {
    /// Creates a `width` by `height` grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Matrix2D<T> {
        Matrix2D {
            width,
            height,
            values: vec![T::default(); width * height],
        }
    }

    /// Builds a grid from row-major values.
    ///
    /// Returns `None` if `values` doesn't hold exactly `width * height` items
    /// or the grid would be empty.
    pub fn from_values(width: usize, height: usize, values: Vec<T>)
        -> Option<Matrix2D<T>> {
        if width == 0 || height == 0 || values.len() != width * height {
            return None;
        }

        Some(Matrix2D { width, height, values })
    }

    fn index(&self, x: i64, y: i64) -> usize {
        let ix = x.rem_euclid(self.width as i64) as usize;
        let iy = y.rem_euclid(self.height as i64) as usize;
        iy * self.width + ix
    }

    pub fn set_wrap(&mut self, value: T, x: i64, y: i64) {
        let i = self.index(x, y);
        self.values[i] = value;
    }

    pub fn get_wrap(&self, x: i64, y: i64) -> T {
        self.values[self.index(x, y)]
    }
}

/// A 3D grid of values with wrapping lookups on every axis.
///
/// Memory layout is y-major, then x, then z, so a run of z values for a fixed
/// `(x, y)` is contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix3D<T> {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    values: Vec<T>,
}

impl<T: Copy + Default> Matrix3D<T> {
    pub fn new(width: usize, height: usize, depth: usize) -> Matrix3D<T> {
        Matrix3D {
            width,
            height,
            depth,
            values: vec![T::default(); width * height * depth],
        }
    }

    fn index(&self, x: i64, y: i64, z: i64) -> usize {
        let ix = x.rem_euclid(self.width as i64) as usize;
        let iy = y.rem_euclid(self.height as i64) as usize;
        let iz = z.rem_euclid(self.depth as i64) as usize;
        iy * self.width * self.depth + ix * self.depth + iz
    }

    pub fn set(&mut self, value: T, x: i64, y: i64, z: i64) {
        let i = self.index(x, y, z);
        self.values[i] = value;
    }

    pub fn get(&self, x: i64, y: i64, z: i64) -> T {
        self.values[self.index(x, y, z)]
    }

    /// Looks up the cell containing a continuous coordinate.
    ///
    /// The unit cube `[0, 1)³` spans the whole grid; coordinates outside it,
    /// negative ones included, wrap around, making the grid tileable.
    ///
    /// ```
    /// # use cloud_marcher::matrix::Matrix3D;
    /// let mut m: Matrix3D<f64> = Matrix3D::new(4, 4, 4);
    /// m.set(1.0, 1, 2, 3);
    /// assert_eq!(m.get_from_floats_wrap(0.25, 0.5, 0.75), 1.0);
    /// assert_eq!(m.get_from_floats_wrap(1.25, -0.5, 2.75), 1.0);
    /// ```
    pub fn get_from_floats_wrap(&self, x: f64, y: f64, z: f64) -> T {
        let ix = (x * self.width as f64).floor() as i64;
        let iy = (y * self.height as f64).floor() as i64;
        let iz = (z * self.depth as f64).floor() as i64;
        self.get(ix, iy, iz)
    }
}

#[test]
fn matrix2d_wraps_both_axes() {
    let mut m: Matrix2D<f64> = Matrix2D::new(3, 2);
    m.set_wrap(0.5, 1, 1);

    assert_eq!(m.get_wrap(1, 1), 0.5);
    assert_eq!(m.get_wrap(4, 3), 0.5);
    assert_eq!(m.get_wrap(-2, -1), 0.5);
    assert_eq!(m.get_wrap(0, 0), 0.0);
}

#[test]
fn matrix2d_from_values_checks_size() {
    assert!(Matrix2D::from_values(2, 2, vec![0u8; 3]).is_none());
    assert!(Matrix2D::<u8>::from_values(0, 2, vec![]).is_none());

    let m = Matrix2D::from_values(2, 2, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(m.get_wrap(1, 0), 2);
    assert_eq!(m.get_wrap(0, 1), 3);
}

#[test]
fn matrix3d_set_get_wraps() {
    let mut m: Matrix3D<i32> = Matrix3D::new(2, 3, 4);
    m.set(7, 1, 2, 3);

    assert_eq!(m.get(1, 2, 3), 7);
    assert_eq!(m.get(3, 5, 7), 7);
    assert_eq!(m.get(-1, -1, -1), 7);
    assert_eq!(m.get(0, 0, 0), 0);
}

#[test]
fn matrix3d_cells_are_distinct() {
    let mut m: Matrix3D<usize> = Matrix3D::new(3, 4, 5);
    let mut n = 0;
    for y in 0..4 {
        for x in 0..3 {
            for z in 0..5 {
                m.set(n, x, y, z);
                n += 1;
            }
        }
    }

    assert_eq!(m.get(2, 3, 4), 3 * 4 * 5 - 1);
    assert_eq!(m.get(0, 1, 0), 3 * 5);
    assert_eq!(m.get(1, 0, 0), 5);
}

#[test]
fn matrix3d_float_lookup_tiles() {
    let mut m: Matrix3D<f64> = Matrix3D::new(8, 8, 8);
    m.set(0.75, 0, 0, 0);

    assert_eq!(m.get_from_floats_wrap(0.01, 0.01, 0.01), 0.75);
    assert_eq!(m.get_from_floats_wrap(1.01, 2.01, -0.99), 0.75);
    assert_eq!(m.get_from_floats_wrap(-0.01, 0.01, 0.01), 0.0);
}
