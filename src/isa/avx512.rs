//! AVX-512 capability provider
//!
//! 512-bit registers, four 128-bit shuffle lanes, and predicate registers on
//! every load and store, so residual lanes need no mask vector.

use crate::constants::{
    AVX512_MAX_BITONIC_SORT_VECTORS, AVX512_REGISTER_COUNT, AVX512_VECTOR_WIDTH_BYTES,
    X86_LANE_GROUP_BYTES,
};
use crate::error::GenResult;

use super::{BitonicIsa, ElementType, PartialVector, VectorIsa};

static AVX512_TYPES: [ElementType; 6] = [
    ElementType::I32,
    ElementType::U32,
    ElementType::F32,
    ElementType::I64,
    ElementType::U64,
    ElementType::F64,
];

/// AVX-512 provider (F + DQ + VL)
#[derive(Debug)]
pub struct Avx512Isa;

/// Shared AVX-512 provider instance
pub static AVX512: Avx512Isa = Avx512Isa;

impl BitonicIsa for Avx512Isa {
    fn isa(&self) -> VectorIsa {
        VectorIsa::Avx512
    }

    fn supported_types(&self) -> &'static [ElementType] {
        &AVX512_TYPES
    }

    fn vector_bytes(&self) -> usize {
        AVX512_VECTOR_WIDTH_BYTES
    }

    fn lane_group_bytes(&self) -> usize {
        X86_LANE_GROUP_BYTES
    }

    fn register_count(&self) -> usize {
        AVX512_REGISTER_COUNT
    }

    fn max_bitonic_sort_vectors(&self, ty: ElementType) -> GenResult<usize> {
        self.check_type(ty)?;
        Ok(AVX512_MAX_BITONIC_SORT_VECTORS)
    }

    fn partial_vector(&self, ty: ElementType) -> GenResult<PartialVector> {
        self.check_type(ty)?;
        Ok(PartialVector::NativeMask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avx512_geometry() {
        assert_eq!(AVX512.native_width(ElementType::F32).unwrap(), 16);
        assert_eq!(AVX512.native_width(ElementType::I64).unwrap(), 8);
        assert_eq!(AVX512.partial_vector(ElementType::U32).unwrap(), PartialVector::NativeMask);
        assert!(AVX512.native_min_max(ElementType::U64).unwrap());
        assert_eq!(AVX512.largest_merge_variant_needed(ElementType::F64).unwrap(), 8);
    }
}
