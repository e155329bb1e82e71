use std::ops::{Add, Index, Mul, Neg};

/// 3-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const ZERO: Float3 = Float3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Float3 {
    type Output = Float3;

    fn add(self, b: Float3) -> Float3 {
        Float3::new(self.x + b.x, self.y + b.y, self.z + b.z)
    }
}

impl Mul<f32> for Float3 {
    type Output = Float3;

    fn mul(self, s: f32) -> Float3 {
        Float3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Float3 {
    type Output = Float3;

    fn neg(self) -> Float3 {
        self * -1.0
    }
}

impl Index<usize> for Float3 {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Float3 index {} out of range", i),
        }
    }
}

/// 3x3 matrix stored as three columns.
///
/// `at(i, j)` is row `i`, column `j`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Float3x3 {
    pub x: Float3,
    pub y: Float3,
    pub z: Float3,
}

impl Float3x3 {
    pub const IDENTITY: Float3x3 = Float3x3::from_cols(
        Float3::new(1.0, 0.0, 0.0),
        Float3::new(0.0, 1.0, 0.0),
        Float3::new(0.0, 0.0, 1.0),
    );

    pub const fn from_cols(x: Float3, y: Float3, z: Float3) -> Self {
        Self { x, y, z }
    }

    pub fn from_rows(r0: [f32; 3], r1: [f32; 3], r2: [f32; 3]) -> Self {
        Self::from_cols(
            Float3::new(r0[0], r1[0], r2[0]),
            Float3::new(r0[1], r1[1], r2[1]),
            Float3::new(r0[2], r1[2], r2[2]),
        )
    }

    fn col(&self, j: usize) -> Float3 {
        match j {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("Float3x3 column {} out of range", j),
        }
    }

    /// Element at row `i`, column `j`. Panics if either is out of range,
    /// like indexing.
    pub fn at(&self, i: usize, j: usize) -> f32 {
        self.col(j)[i]
    }

    pub fn transpose(&self) -> Float3x3 {
        Float3x3::from_cols(
            Float3::new(self.x.x, self.y.x, self.z.x),
            Float3::new(self.x.y, self.y.y, self.z.y),
            Float3::new(self.x.z, self.y.z, self.z.z),
        )
    }

    /// Flattened column-major elements.
    pub fn to_cols_array(&self) -> [f32; 9] {
        [
            self.x.x, self.x.y, self.x.z, self.y.x, self.y.y, self.y.z, self.z.x, self.z.y,
            self.z.z,
        ]
    }
}

impl Mul<Float3> for Float3x3 {
    type Output = Float3;

    fn mul(self, b: Float3) -> Float3 {
        self.x * b.x + self.y * b.y + self.z * b.z
    }
}

impl Mul for Float3x3 {
    type Output = Float3x3;

    fn mul(self, b: Float3x3) -> Float3x3 {
        Float3x3::from_cols(self * b.x, self * b.y, self * b.z)
    }
}

/// Rigid transform between two coordinate frames.
///
/// `orientation` must be orthonormal: `inverse()` relies on its transpose
/// being its inverse and performs no validation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub orientation: Float3x3,
    pub position: Float3,
}

impl Pose {
    pub const IDENTITY: Pose = Pose::new(Float3x3::IDENTITY, Float3::ZERO);

    pub const fn new(orientation: Float3x3, position: Float3) -> Self {
        Self {
            orientation,
            position,
        }
    }

    pub fn inverse(&self) -> Pose {
        let inv = self.orientation.transpose();
        Pose::new(inv, -(inv * self.position))
    }
}

impl Mul<Float3> for Pose {
    type Output = Float3;

    fn mul(self, point: Float3) -> Float3 {
        self.orientation * point + self.position
    }
}

impl Mul for Pose {
    type Output = Pose;

    /// Applies `b` inside the frame of `self`.
    fn mul(self, b: Pose) -> Pose {
        Pose::new(self.orientation * b.orientation, self * b.position)
    }
}
