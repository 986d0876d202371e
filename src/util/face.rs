use glam::IVec3;

/// One of the six axis directions a chunk or block face can point in.
///
/// Indices follow the fixed enumeration `front=+Z(0), back=-Z(1), right=+X(2),
/// left=-X(3), top=+Y(4), bottom=-Y(5)` so that `opposite` is a single XOR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceIndex(pub usize);

impl FaceIndex {
    pub const FRONT: FaceIndex = FaceIndex(0);
    pub const BACK: FaceIndex = FaceIndex(1);
    pub const RIGHT: FaceIndex = FaceIndex(2);
    pub const LEFT: FaceIndex = FaceIndex(3);
    pub const TOP: FaceIndex = FaceIndex(4);
    pub const BOTTOM: FaceIndex = FaceIndex(5);

    pub const ALL: [FaceIndex; 6] = [
        Self::FRONT,
        Self::BACK,
        Self::RIGHT,
        Self::LEFT,
        Self::TOP,
        Self::BOTTOM,
    ];

    /// Returns the index of the opposite face, e.g. front -> back
    pub fn opposite(self) -> Self {
        Self(self.0 ^ 1)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Axis-unit normal for each `FaceIndex`, in the same order.
pub const FACE_NORMALS: [IVec3; 6] = [
    IVec3::Z,
    IVec3::NEG_Z,
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for face in FaceIndex::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert_ne!(face.opposite(), face);
        }
    }

    #[test]
    fn opposite_pairs_match_spec_enumeration() {
        assert_eq!(FaceIndex::FRONT.opposite(), FaceIndex::BACK);
        assert_eq!(FaceIndex::RIGHT.opposite(), FaceIndex::LEFT);
        assert_eq!(FaceIndex::TOP.opposite(), FaceIndex::BOTTOM);
    }
}
