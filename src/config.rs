//! Configuration for network generation
//!
//! A [`GeneratorConfig`] is built once per invocation and never mutated while
//! generation runs. Per-unit limits are resolved against the ISA provider by
//! [`GeneratorConfig::resolve`], which is where every ceiling is checked.

use std::collections::BTreeMap;

use crate::constants::{DEFAULT_BREAK_INLINE, DEFAULT_UNROLL_BITONIC_SORTERS};
use crate::error::{GenError, GenResult};
use crate::isa::{BitonicIsa, ElementType, VectorIsa};
use crate::network::split_width;

/// Code-shaping knobs and ISA selection for one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Compounded routines narrower than this are unrolled into their callers
    /// instead of being emitted; base routines are emitted only when this is 0
    pub unroll_bitonic_sorters: usize,

    /// Every routine whose width is a multiple of this is not force-inlined
    /// (0 keeps the whole chain inline)
    pub break_inline: usize,

    /// Largest compounded width to generate
    /// If None, the ISA's register-budget ceiling is used
    pub max_bitonic_sort_vectors: Option<usize>,

    /// Per-ISA override of the largest compounded merger to emit
    pub largest_merge_variant_needed: BTreeMap<VectorIsa, usize>,

    /// Generate for every ISA in [`VectorIsa::ALL`]
    pub all_isas: bool,

    /// Explicit ISA selection, used when `all_isas` is false
    pub isas: Vec<VectorIsa>,

    /// Number of worker threads used to plan units
    pub jobs: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            unroll_bitonic_sorters: DEFAULT_UNROLL_BITONIC_SORTERS,
            break_inline: DEFAULT_BREAK_INLINE,
            max_bitonic_sort_vectors: None,
            largest_merge_variant_needed: BTreeMap::new(),
            all_isas: true,
            isas: Vec::new(),
            jobs: num_cpus::get(),
        }
    }
}

impl GeneratorConfig {
    /// Create a config restricted to the given ISAs
    pub fn for_isas(isas: &[VectorIsa]) -> Self {
        Self {
            all_isas: false,
            isas: isas.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_unroll_bitonic_sorters(mut self, unroll: usize) -> Self {
        self.unroll_bitonic_sorters = unroll;
        self
    }

    pub fn with_break_inline(mut self, period: usize) -> Self {
        self.break_inline = period;
        self
    }

    pub fn with_max_bitonic_sort_vectors(mut self, max: usize) -> Self {
        self.max_bitonic_sort_vectors = Some(max);
        self
    }

    pub fn with_largest_merge_variant(mut self, isa: VectorIsa, width: usize) -> Self {
        self.largest_merge_variant_needed.insert(isa, width);
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// The ISAs this run generates for, in generation order
    pub fn selected_isas(&self) -> Vec<VectorIsa> {
        if self.all_isas {
            VectorIsa::ALL.to_vec()
        } else {
            self.isas.clone()
        }
    }

    /// Check the run-wide settings
    pub fn validate(&self) -> GenResult<()> {
        if self.jobs == 0 {
            return Err(GenError::configuration("jobs must be at least 1"));
        }
        if !self.all_isas {
            if self.isas.is_empty() {
                return Err(GenError::configuration("no vector ISA selected"));
            }
            for (i, isa) in self.isas.iter().enumerate() {
                if self.isas[..i].contains(isa) {
                    return Err(GenError::configuration(format!(
                        "vector ISA {} selected twice",
                        isa
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the limits for one (ISA, type) unit
    ///
    /// Fails if the provider advertises no types, if `ty` is unsupported, or
    /// if any configured ceiling exceeds what the ISA allows.
    pub fn resolve(&self, isa: &dyn BitonicIsa, ty: ElementType) -> GenResult<UnitPolicy> {
        if isa.supported_types().is_empty() {
            return Err(GenError::configuration(format!(
                "{} advertises no element types",
                isa.isa()
            )));
        }
        let lanes = isa.native_width(ty)?;

        let isa_max = isa.max_bitonic_sort_vectors(ty)?;
        let max_vectors = self.max_bitonic_sort_vectors.unwrap_or(isa_max);
        if max_vectors == 0 {
            return Err(GenError::configuration(
                "max_bitonic_sort_vectors must be at least 1",
            ));
        }
        if max_vectors > isa_max {
            return Err(GenError::configuration(format!(
                "max_bitonic_sort_vectors {} exceeds the {} ceiling of {} for {}",
                max_vectors,
                isa.isa(),
                isa_max,
                ty
            )));
        }

        let isa_ceiling = isa.largest_merge_variant_needed(ty)?;
        let merge_ceiling = match self.largest_merge_variant_needed.get(&isa.isa()) {
            Some(&ceiling) => {
                if ceiling > isa_ceiling {
                    return Err(GenError::configuration(format!(
                        "largest_merge_variant_needed {} exceeds the {} ceiling of {} for {}",
                        ceiling,
                        isa.isa(),
                        isa_ceiling,
                        ty
                    )));
                }
                if ceiling > max_vectors {
                    return Err(GenError::configuration(format!(
                        "largest_merge_variant_needed {} is wider than max_bitonic_sort_vectors {}",
                        ceiling, max_vectors
                    )));
                }
                ceiling
            }
            None => split_width(max_vectors).min(isa_ceiling),
        };

        Ok(UnitPolicy {
            isa: isa.isa(),
            element: ty,
            lanes,
            max_vectors,
            merge_ceiling,
            unroll_bitonic_sorters: self.unroll_bitonic_sorters,
            break_inline: self.break_inline,
        })
    }
}

/// Limits resolved for one (ISA, type) unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPolicy {
    pub isa: VectorIsa,
    pub element: ElementType,
    /// Lanes per register
    pub lanes: usize,
    /// Largest compounded width
    pub max_vectors: usize,
    /// Largest compounded merger width that may be emitted
    pub merge_ceiling: usize,
    pub unroll_bitonic_sorters: usize,
    pub break_inline: usize,
}

impl UnitPolicy {
    /// Inlining decision for a routine of `width` vectors
    pub fn inline_for(&self, width: usize) -> bool {
        self.break_inline == 0 || width % self.break_inline != 0
    }

    /// Longest array (in elements) the generated routines sort
    pub fn coverage(&self) -> usize {
        self.max_vectors * self.lanes
    }
}
