//! ARM NEON capability provider
//!
//! 128-bit registers where `tbl`/`ext`/`rev` reach every lane, so no stage is
//! ever classed as cross-lane. There is no 64-bit integer min/max, so only
//! 32-bit types and doubles are generated. Residual lanes go through an
//! aligned scratch buffer prefilled with the sentinel.

use crate::constants::{
    NEON_MAX_BITONIC_SORT_VECTORS, NEON_REGISTER_COUNT, NEON_VECTOR_WIDTH_BYTES,
};
use crate::error::GenResult;

use super::{BitonicIsa, ElementType, PartialVector, VectorIsa};

static NEON_TYPES: [ElementType; 4] = [
    ElementType::I32,
    ElementType::U32,
    ElementType::F32,
    ElementType::F64,
];

/// NEON provider
#[derive(Debug)]
pub struct NeonIsa;

/// Shared NEON provider instance
pub static NEON: NeonIsa = NeonIsa;

impl BitonicIsa for NeonIsa {
    fn isa(&self) -> VectorIsa {
        VectorIsa::Neon
    }

    fn supported_types(&self) -> &'static [ElementType] {
        &NEON_TYPES
    }

    fn vector_bytes(&self) -> usize {
        NEON_VECTOR_WIDTH_BYTES
    }

    fn register_count(&self) -> usize {
        NEON_REGISTER_COUNT
    }

    fn max_bitonic_sort_vectors(&self, ty: ElementType) -> GenResult<usize> {
        self.check_type(ty)?;
        Ok(NEON_MAX_BITONIC_SORT_VECTORS)
    }

    fn partial_vector(&self, ty: ElementType) -> GenResult<PartialVector> {
        self.check_type(ty)?;
        Ok(PartialVector::ScratchCopy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::isa::ShuffleClass;
    use crate::network::Direction;

    #[test]
    fn test_neon_geometry() {
        assert_eq!(NEON.native_width(ElementType::I32).unwrap(), 4);
        assert_eq!(NEON.native_width(ElementType::F64).unwrap(), 2);
        assert_eq!(NEON.partial_vector(ElementType::F32).unwrap(), PartialVector::ScratchCopy);
    }

    #[test]
    fn test_neon_rejects_64bit_integers() {
        for ty in [ElementType::I64, ElementType::U64] {
            match NEON.native_width(ty) {
                Err(GenError::UnsupportedType { isa, element }) => {
                    assert_eq!(isa, VectorIsa::Neon);
                    assert_eq!(element, ty);
                }
                other => panic!("expected UnsupportedType, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_neon_never_crosses_lanes() {
        let stages = NEON
            .single_vector_sort(ElementType::F32, Direction::Ascending)
            .unwrap();
        assert!(stages.iter().all(|s| s.shuffle == ShuffleClass::InLane));
    }
}
