use strata_blocks::FaceKind;
use strata_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face on `axis` (0 = x, 1 = y, 2 = z) pointing toward `+axis` when `positive`.
    #[inline]
    pub fn from_axis_sign(axis: usize, positive: bool) -> Face {
        match (axis, positive) {
            (0, true) => Face::PosX,
            (0, false) => Face::NegX,
            (1, true) => Face::PosY,
            (1, false) => Face::NegY,
            (_, true) => Face::PosZ,
            (_, false) => Face::NegZ,
        }
    }

    #[inline]
    pub fn axis(self) -> usize {
        match self {
            Face::PosX | Face::NegX => 0,
            Face::PosY | Face::NegY => 1,
            Face::PosZ | Face::NegZ => 2,
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Face::PosX | Face::PosY | Face::PosZ)
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Atlas tile role: +Y top, -Y bottom, the rest side.
    #[inline]
    pub fn kind(self) -> FaceKind {
        FaceKind::from_axis_sign(self.axis(), self.is_positive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_sign_roundtrip() {
        for f in Face::ALL {
            assert_eq!(Face::from_axis_sign(f.axis(), f.is_positive()), f);
            assert_eq!(f.normal().axis(f.axis()).abs(), 1.0);
        }
        assert_eq!(Face::PosY.kind(), FaceKind::Top);
        assert_eq!(Face::NegY.kind(), FaceKind::Bottom);
        assert_eq!(Face::NegZ.kind(), FaceKind::Side);
    }
}
