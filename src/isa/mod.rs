//! Vector ISA capability providers
//!
//! Each supported instruction set implements [`BitonicIsa`] once. The
//! network builder only talks to this trait: it asks which element types an
//! ISA handles, how many lanes fit in a register, and how to express one
//! compare-exchange stage. The set of ISAs is closed and listed in
//! [`VectorIsa::ALL`].

pub mod avx2;
pub mod avx512;
pub mod neon;
pub mod pattern;

use std::fmt;
use std::str::FromStr;

use crate::error::{GenError, GenResult};
use crate::network::{split_width, Direction, NetworkStage};

pub use pattern::{LaneExchange, LaneMask, LanePattern, ShuffleClass};

/// Element types the generator can build networks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    I32,
    U32,
    F32,
    I64,
    U64,
    F64,
}

impl ElementType {
    /// Every element type, in generation order
    pub const ALL: [ElementType; 6] = [
        ElementType::I32,
        ElementType::U32,
        ElementType::F32,
        ElementType::I64,
        ElementType::U64,
        ElementType::F64,
    ];

    /// Size of one element in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 => 8,
        }
    }

    /// Stable name used in routine listings and file names
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::I32 => "int32",
            ElementType::U32 => "uint32",
            ElementType::F32 => "float",
            ElementType::I64 => "int64",
            ElementType::U64 => "uint64",
            ElementType::F64 => "double",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int32" | "i32" => Ok(ElementType::I32),
            "uint32" | "u32" => Ok(ElementType::U32),
            "float" | "f32" => Ok(ElementType::F32),
            "int64" | "i64" => Ok(ElementType::I64),
            "uint64" | "u64" => Ok(ElementType::U64),
            "double" | "f64" => Ok(ElementType::F64),
            other => Err(GenError::configuration(format!(
                "unknown element type '{}'",
                other
            ))),
        }
    }
}

/// The closed set of vector ISAs the generator knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VectorIsa {
    /// Intel/AMD x86_64 with 256-bit AVX2
    Avx2,
    /// Intel/AMD x86_64 with 512-bit AVX-512 (F + DQ + VL)
    Avx512,
    /// ARM AArch64 Advanced SIMD
    Neon,
}

impl VectorIsa {
    /// Every ISA, in generation order
    pub const ALL: [VectorIsa; 3] = [VectorIsa::Avx2, VectorIsa::Avx512, VectorIsa::Neon];

    /// Stable name used in listings and file names
    pub fn name(&self) -> &'static str {
        match self {
            VectorIsa::Avx2 => "AVX2",
            VectorIsa::Avx512 => "AVX512",
            VectorIsa::Neon => "NEON",
        }
    }

    /// The capability provider for this ISA
    pub fn provider(&self) -> &'static dyn BitonicIsa {
        match self {
            VectorIsa::Avx2 => &avx2::AVX2,
            VectorIsa::Avx512 => &avx512::AVX512,
            VectorIsa::Neon => &neon::NEON,
        }
    }
}

impl fmt::Display for VectorIsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VectorIsa {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "avx2" => Ok(VectorIsa::Avx2),
            "avx512" => Ok(VectorIsa::Avx512),
            "neon" => Ok(VectorIsa::Neon),
            other => Err(GenError::configuration(format!(
                "unknown vector ISA '{}' (expected one of AVX2, AVX512, NEON)",
                other
            ))),
        }
    }
}

/// How an entry point loads and stores the residual lanes of a partial vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartialVector {
    /// Masked load/store instructions driven by a lane mask vector
    MaskedLoad,
    /// Predicate (k) registers on every memory operation
    NativeMask,
    /// Copy through an aligned scratch buffer prefilled with the sentinel
    ScratchCopy,
}

impl PartialVector {
    pub fn name(&self) -> &'static str {
        match self {
            PartialVector::MaskedLoad => "masked-load",
            PartialVector::NativeMask => "native-mask",
            PartialVector::ScratchCopy => "scratch-copy",
        }
    }
}

/// Capabilities a vector ISA exposes to the network builder
///
/// Implementors only describe register geometry and ceilings; the stage
/// construction below is shared. Providers are static and read-only, so one
/// instance serves every element type and every worker thread.
pub trait BitonicIsa: Send + Sync + fmt::Debug {
    /// Which ISA this provider describes
    fn isa(&self) -> VectorIsa;

    /// Element types this ISA generates routines for (never empty)
    fn supported_types(&self) -> &'static [ElementType];

    /// Register width in bytes
    fn vector_bytes(&self) -> usize;

    /// Granularity of the cheap in-lane shuffles, in bytes
    fn lane_group_bytes(&self) -> usize {
        self.vector_bytes()
    }

    /// Number of architectural vector registers
    fn register_count(&self) -> usize;

    /// Largest compounded width the register budget allows for `ty`
    fn max_bitonic_sort_vectors(&self, ty: ElementType) -> GenResult<usize>;

    /// Partial-vector strategy used by entry points for `ty`
    fn partial_vector(&self, ty: ElementType) -> GenResult<PartialVector>;

    /// Whether lane-wise min/max is a single instruction for `ty`
    fn native_min_max(&self, ty: ElementType) -> GenResult<bool> {
        self.check_type(ty)?;
        Ok(true)
    }

    fn supports(&self, ty: ElementType) -> bool {
        self.supported_types().contains(&ty)
    }

    /// Fail with [`GenError::UnsupportedType`] unless `ty` is supported
    fn check_type(&self, ty: ElementType) -> GenResult<()> {
        if self.supports(ty) {
            Ok(())
        } else {
            Err(GenError::UnsupportedType {
                isa: self.isa(),
                element: ty,
            })
        }
    }

    /// Lanes of `ty` held by one register
    fn native_width(&self, ty: ElementType) -> GenResult<usize> {
        self.check_type(ty)?;
        Ok(self.vector_bytes() / ty.size_bytes())
    }

    /// Largest compounded merger width the register budget allows for `ty`
    ///
    /// Compounded sorters never need a merger wider than half their width
    /// rounded up to a power of two.
    fn largest_merge_variant_needed(&self, ty: ElementType) -> GenResult<usize> {
        Ok(split_width(self.max_bitonic_sort_vectors(ty)?))
    }

    /// Build one intra-register compare-exchange stage
    ///
    /// `pattern` must cover exactly one register of `ty` and be an involution.
    fn compare_exchange(
        &self,
        ty: ElementType,
        pattern: &LanePattern,
        direction: Direction,
    ) -> GenResult<LaneExchange> {
        let lanes = self.native_width(ty)?;
        if pattern.len() != lanes {
            return Err(GenError::configuration(format!(
                "{} pattern {} has {} lanes, {} registers hold {}",
                self.isa(),
                pattern,
                pattern.len(),
                ty,
                lanes
            )));
        }
        if !pattern.is_involution() {
            return Err(GenError::configuration(format!(
                "compare-exchange pattern {} is not self-inverse",
                pattern
            )));
        }
        let group_lanes = (self.lane_group_bytes() / ty.size_bytes()).max(1);
        let shuffle = if pattern.crosses_groups(group_lanes) {
            ShuffleClass::CrossLane
        } else {
            ShuffleClass::InLane
        };
        Ok(LaneExchange {
            pattern: pattern.clone(),
            low_lanes: pattern.low_lanes(),
            direction,
            shuffle,
        })
    }

    /// Full-register lane reversal for `ty`
    fn reverse_pattern(&self, ty: ElementType) -> GenResult<LanePattern> {
        Ok(LanePattern::reverse(self.native_width(ty)?))
    }

    /// Lane-wise min/max between two registers
    fn cross_exchange(&self, low: usize, high: usize, direction: Direction) -> NetworkStage {
        NetworkStage::Vectors {
            low,
            high,
            direction,
        }
    }

    /// Stages sorting the lanes of a single register
    ///
    /// Canonical bitonic order: every doubling block first folds onto itself
    /// through a mirror exchange, then is cleaned with shrinking xor distances.
    fn single_vector_sort(
        &self,
        ty: ElementType,
        direction: Direction,
    ) -> GenResult<Vec<LaneExchange>> {
        let lanes = self.native_width(ty)?;
        let mut stages = Vec::new();
        let mut block = 2;
        while block <= lanes {
            let pattern = if block == lanes {
                self.reverse_pattern(ty)?
            } else {
                LanePattern::mirror(lanes, block)
            };
            stages.push(self.compare_exchange(ty, &pattern, direction)?);
            let mut distance = block / 4;
            while distance > 0 {
                stages.push(self.compare_exchange(ty, &LanePattern::xor(lanes, distance), direction)?);
                distance /= 2;
            }
            block *= 2;
        }
        Ok(stages)
    }

    /// Stages merging a single register that already holds a bitonic sequence
    fn single_vector_merge(
        &self,
        ty: ElementType,
        direction: Direction,
    ) -> GenResult<Vec<LaneExchange>> {
        let lanes = self.native_width(ty)?;
        let mut stages = Vec::new();
        let mut distance = lanes / 2;
        while distance > 0 {
            stages.push(self.compare_exchange(ty, &LanePattern::xor(lanes, distance), direction)?);
            distance /= 2;
        }
        Ok(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isa_names_round_trip() {
        for isa in VectorIsa::ALL {
            assert_eq!(isa.name().parse::<VectorIsa>().unwrap(), isa);
            assert_eq!(isa.provider().isa(), isa);
        }
        assert_eq!("avx-512".parse::<VectorIsa>().unwrap(), VectorIsa::Avx512);
        assert!("sve".parse::<VectorIsa>().is_err());
    }

    #[test]
    fn test_element_type_names() {
        for ty in ElementType::ALL {
            assert_eq!(ty.name().parse::<ElementType>().unwrap(), ty);
        }
        assert_eq!("f64".parse::<ElementType>().unwrap(), ElementType::F64);
        assert!("int16".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_single_vector_stage_counts() {
        let avx2 = VectorIsa::Avx2.provider();

        // 8 lanes: log2(8) * (log2(8) + 1) / 2 = 6 stages
        let sort = avx2.single_vector_sort(ElementType::I32, Direction::Ascending).unwrap();
        assert_eq!(sort.len(), 6);
        let merge = avx2.single_vector_merge(ElementType::I32, Direction::Ascending).unwrap();
        assert_eq!(merge.len(), 3);

        // 4 lanes: 3 stages
        let sort = avx2.single_vector_sort(ElementType::F64, Direction::Descending).unwrap();
        assert_eq!(sort.len(), 3);
        assert!(sort.iter().all(|s| s.direction == Direction::Descending));
    }

    #[test]
    fn test_compare_exchange_validation() {
        let avx2 = VectorIsa::Avx2.provider();
        let short = LanePattern::xor(4, 1);
        assert!(avx2
            .compare_exchange(ElementType::I32, &short, Direction::Ascending)
            .is_err());

        let cycle = LanePattern::from_targets(&[1, 2, 3, 0, 4, 5, 6, 7]).unwrap();
        assert!(avx2
            .compare_exchange(ElementType::I32, &cycle, Direction::Ascending)
            .is_err());

        let swap = LanePattern::xor(8, 1);
        let stage = avx2
            .compare_exchange(ElementType::I32, &swap, Direction::Ascending)
            .unwrap();
        assert_eq!(stage.low_lanes, LaneMask(0x55));
        assert_eq!(stage.shuffle, ShuffleClass::InLane);
    }
}
