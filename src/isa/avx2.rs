//! AVX2 capability provider
//!
//! 256-bit registers split into two 128-bit lanes. Shuffles that stay inside
//! a 128-bit lane (`vpshufd`, `vshufps`) are cheaper than the cross-lane
//! permutes (`vpermd`, `vperm2i128`), which is what the stage shuffle class
//! records. AVX2 has no 64-bit integer min/max, so those types fall back to
//! compare + blend.

use crate::constants::{
    AVX2_MAX_BITONIC_SORT_VECTORS, AVX2_REGISTER_COUNT, AVX2_VECTOR_WIDTH_BYTES,
    X86_LANE_GROUP_BYTES,
};
use crate::error::GenResult;

use super::{BitonicIsa, ElementType, PartialVector, VectorIsa};

static AVX2_TYPES: [ElementType; 6] = [
    ElementType::I32,
    ElementType::U32,
    ElementType::F32,
    ElementType::I64,
    ElementType::U64,
    ElementType::F64,
];

/// AVX2 provider
#[derive(Debug)]
pub struct Avx2Isa;

/// Shared AVX2 provider instance
pub static AVX2: Avx2Isa = Avx2Isa;

impl BitonicIsa for Avx2Isa {
    fn isa(&self) -> VectorIsa {
        VectorIsa::Avx2
    }

    fn supported_types(&self) -> &'static [ElementType] {
        &AVX2_TYPES
    }

    fn vector_bytes(&self) -> usize {
        AVX2_VECTOR_WIDTH_BYTES
    }

    fn lane_group_bytes(&self) -> usize {
        X86_LANE_GROUP_BYTES
    }

    fn register_count(&self) -> usize {
        AVX2_REGISTER_COUNT
    }

    fn max_bitonic_sort_vectors(&self, ty: ElementType) -> GenResult<usize> {
        self.check_type(ty)?;
        Ok(AVX2_MAX_BITONIC_SORT_VECTORS)
    }

    fn partial_vector(&self, ty: ElementType) -> GenResult<PartialVector> {
        // vpmaskmov{d,q} / vmaskmov{ps,pd} cover all six types
        self.check_type(ty)?;
        Ok(PartialVector::MaskedLoad)
    }

    fn native_min_max(&self, ty: ElementType) -> GenResult<bool> {
        self.check_type(ty)?;
        Ok(!matches!(ty, ElementType::I64 | ElementType::U64))
    }
}
