//! Recursive construction of bitonic sorters and mergers
//!
//! All networks are built from the same two recursions, parameterized by
//! width and direction:
//!
//! - `sort(W, D)`: sort the first `split(W)` vectors in the reverse of `D`,
//!   sort the rest in `D`, then `merge(W, D)`.
//! - `merge(W, D)`: lane-wise min/max of vector `i` against `i + split(W)`,
//!   then merge both halves independently.
//!
//! Width 1 bottoms out in the single-register networks of the ISA provider.
//! The first half is always the power-of-two one, so the sorted run sits at
//! the end and sentinel padding up to the next power of two keeps the input
//! to every merge bitonic. That makes non-power-of-two widths exact.
//!
//! Whether a sub-network is called or inlined is decided by
//! [`NetworkBuilder::is_emitted`].

use log::debug;

use crate::config::{GeneratorConfig, UnitPolicy};
use crate::error::{GenError, GenResult};
use crate::isa::{BitonicIsa, ElementType};

use super::{split_width, Direction, NetworkKind, NetworkStage, Routine, RoutineKey, RoutineKind, Step};

/// Builds the sorter and merger routines of one (ISA, element type) unit
#[derive(Debug, Clone, Copy)]
pub struct NetworkBuilder<'a> {
    isa: &'a dyn BitonicIsa,
    policy: UnitPolicy,
}

impl<'a> NetworkBuilder<'a> {
    /// Create a builder, resolving `config` against the ISA's ceilings
    ///
    /// # Arguments
    /// * `isa` - Capability provider
    /// * `ty` - Element type of the unit
    /// * `config` - Code-shaping knobs for the run
    ///
    /// # Returns
    /// A builder, or the configuration / unsupported-type error
    pub fn new(isa: &'a dyn BitonicIsa, ty: ElementType, config: &GeneratorConfig) -> GenResult<Self> {
        let policy = config.resolve(isa, ty)?;
        Ok(Self { isa, policy })
    }

    pub fn isa(&self) -> &'a dyn BitonicIsa {
        self.isa
    }

    pub fn policy(&self) -> &UnitPolicy {
        &self.policy
    }

    /// Whether `key` becomes a routine of its own rather than being inlined
    ///
    /// Single-register routines are emitted only when unrolling is off.
    /// Wider sorters are emitted from `unroll_bitonic_sorters` up to the max,
    /// wider mergers only up to the merge ceiling.
    pub fn is_emitted(&self, key: RoutineKey) -> bool {
        let p = &self.policy;
        if key.width == 0 || key.width > p.max_vectors {
            return false;
        }
        if key.width == 1 {
            return p.unroll_bitonic_sorters < 1;
        }
        if key.width < p.unroll_bitonic_sorters {
            return false;
        }
        match key.network {
            NetworkKind::Sort => true,
            NetworkKind::Merge => key.width <= p.merge_ceiling,
        }
    }

    /// Check that a routine for `key` may be requested at all
    fn check_request(&self, key: RoutineKey) -> GenResult<()> {
        let p = &self.policy;
        if key.width == 0 || key.width > p.max_vectors {
            return Err(GenError::configuration(format!(
                "{} requested, widths for {}.{} are 1..={}",
                key, p.isa, p.element, p.max_vectors
            )));
        }
        if key.network == NetworkKind::Merge && key.width > 1 && key.width > p.merge_ceiling {
            return Err(GenError::configuration(format!(
                "{} requested, the merge ceiling for {}.{} is {}",
                key, p.isa, p.element, p.merge_ceiling
            )));
        }
        Ok(())
    }

    /// Build the routine for `key`, whether or not it would be emitted
    pub fn routine(&self, key: RoutineKey) -> GenResult<Routine> {
        self.check_request(key)?;
        let body = self.body(key)?;
        let kind = match (key.network, key.width) {
            (_, 1) => RoutineKind::BaseSorter,
            (NetworkKind::Sort, _) => RoutineKind::CompoundedSorter,
            (NetworkKind::Merge, _) => RoutineKind::CompoundedMerger,
        };
        debug!(
            "{}.{}: {} with {} steps",
            self.policy.isa,
            self.policy.element,
            key,
            body.len()
        );
        Ok(Routine {
            name: key.name(),
            kind,
            key: Some(key),
            width: key.width,
            direction: Some(key.direction),
            inline: self.policy.inline_for(key.width),
            body,
        })
    }

    /// Single-register sorter
    pub fn base_sorter(&self, direction: Direction) -> GenResult<Routine> {
        self.routine(RoutineKey::sort(1, direction))
    }

    /// Single-register merger of a bitonic register
    pub fn base_merger(&self, direction: Direction) -> GenResult<Routine> {
        self.routine(RoutineKey::merge(1, direction))
    }

    pub fn compounded_sorter(&self, width: usize, direction: Direction) -> GenResult<Routine> {
        self.routine(RoutineKey::sort(width, direction))
    }

    pub fn compounded_merger(&self, width: usize, direction: Direction) -> GenResult<Routine> {
        self.routine(RoutineKey::merge(width, direction))
    }

    /// Body of the network `key`, relative to register 0
    ///
    /// Sub-networks are called when emitted and inlined otherwise, so the
    /// body never references a routine that is missing from the plan.
    pub fn body(&self, key: RoutineKey) -> GenResult<Vec<Step>> {
        let ty = self.policy.element;
        let d = key.direction;
        let mut body = Vec::new();

        match (key.network, key.width) {
            (_, 0) => {
                return Err(GenError::configuration(format!(
                    "{} has no vectors",
                    network_label(key.network)
                )))
            }
            (NetworkKind::Sort, 1) => {
                for exchange in self.isa.single_vector_sort(ty, d)? {
                    body.push(Step::Stage(NetworkStage::Lanes {
                        register: 0,
                        exchange,
                    }));
                }
            }
            (NetworkKind::Merge, 1) => {
                for exchange in self.isa.single_vector_merge(ty, d)? {
                    body.push(Step::Stage(NetworkStage::Lanes {
                        register: 0,
                        exchange,
                    }));
                }
            }
            (NetworkKind::Sort, w) => {
                let first = split_width(w);
                self.invoke(RoutineKey::sort(first, d.reverse()), 0, &mut body)?;
                self.invoke(RoutineKey::sort(w - first, d), first, &mut body)?;
                self.invoke(RoutineKey::merge(w, d), 0, &mut body)?;
            }
            (NetworkKind::Merge, w) => {
                let half = split_width(w);
                for low in 0..w - half {
                    body.push(Step::Stage(self.isa.cross_exchange(low, low + half, d)));
                }
                self.invoke(RoutineKey::merge(half, d), 0, &mut body)?;
                self.invoke(RoutineKey::merge(w - half, d), half, &mut body)?;
            }
        }
        Ok(body)
    }

    /// Append an invocation of `key` on registers starting at `first`
    ///
    /// Emits a [`Step::Call`] when `key` is emitted, otherwise splices in
    /// its body shifted by `first`.
    pub fn invoke(&self, key: RoutineKey, first: usize, out: &mut Vec<Step>) -> GenResult<()> {
        if self.is_emitted(key) {
            out.push(Step::Call { callee: key, first });
        } else {
            out.extend(self.body(key)?.iter().map(|step| step.shifted(first)));
        }
        Ok(())
    }

    /// All emitted sorters and mergers, in emission order
    ///
    /// Base routines first (sorter then merger, ascending then descending),
    /// then for each width both sorters followed by both mergers.
    pub fn network_routines(&self) -> GenResult<Vec<Routine>> {
        let mut routines = Vec::new();
        if self.policy.unroll_bitonic_sorters < 1 {
            for d in Direction::BOTH {
                routines.push(self.base_sorter(d)?);
                routines.push(self.base_merger(d)?);
            }
        }
        for width in 2..=self.policy.max_vectors {
            for network in [NetworkKind::Sort, NetworkKind::Merge] {
                for d in Direction::BOTH {
                    let key = RoutineKey {
                        network,
                        width,
                        direction: d,
                    };
                    if self.is_emitted(key) {
                        routines.push(self.routine(key)?);
                    }
                }
            }
        }
        Ok(routines)
    }
}

fn network_label(network: NetworkKind) -> &'static str {
    match network {
        NetworkKind::Sort => "sorter",
        NetworkKind::Merge => "merger",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::VectorIsa;

    fn builder(config: &GeneratorConfig, isa: VectorIsa, ty: ElementType) -> NetworkBuilder<'static> {
        NetworkBuilder::new(isa.provider(), ty, config).unwrap()
    }

    #[test]
    fn test_default_emission_set() {
        let config = GeneratorConfig::default();
        let b = builder(&config, VectorIsa::Avx2, ElementType::I32);
        let routines = b.network_routines().unwrap();

        // 4 base routines, 15 widths x 2 sorters, 7 widths (2..=8) x 2 mergers
        assert_eq!(routines.len(), 4 + 30 + 14);
        assert_eq!(routines[0].name, "sort_01v_ascending");
        assert_eq!(routines[1].name, "sort_01v_merge_ascending");
        assert_eq!(routines[2].name, "sort_01v_descending");
        assert_eq!(routines[4].name, "sort_02v_ascending");
        assert_eq!(routines[5].name, "sort_02v_descending");
        assert_eq!(routines[6].name, "merge_02v_ascending");
        assert_eq!(routines[7].name, "merge_02v_descending");
        assert!(routines
            .iter()
            .all(|r| r.kind != RoutineKind::CompoundedMerger || r.width <= 8));
    }

    #[test]
    fn test_sorter_structure() {
        let config = GeneratorConfig::default();
        let b = builder(&config, VectorIsa::Avx2, ElementType::I64);
        let sorter = b.compounded_sorter(3, Direction::Ascending).unwrap();
        let calls: Vec<_> = sorter.callees().collect();
        assert_eq!(
            calls,
            vec![
                RoutineKey::sort(2, Direction::Descending),
                RoutineKey::sort(1, Direction::Ascending),
                RoutineKey::merge(3, Direction::Ascending),
            ]
        );
        match &sorter.body[1] {
            Step::Call { first, .. } => assert_eq!(*first, 2),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_merger_structure() {
        let config = GeneratorConfig::default();
        let b = builder(&config, VectorIsa::Avx2, ElementType::I32);
        let merger = b.compounded_merger(6, Direction::Descending).unwrap();
        // 6 vectors split as 4 + 2: two cross exchanges, then two calls
        assert_eq!(merger.stage_count(), 2);
        assert_eq!(
            merger.body[0],
            Step::Stage(NetworkStage::Vectors {
                low: 0,
                high: 4,
                direction: Direction::Descending
            })
        );
        let calls: Vec<_> = merger.callees().collect();
        assert_eq!(
            calls,
            vec![
                RoutineKey::merge(4, Direction::Descending),
                RoutineKey::merge(2, Direction::Descending),
            ]
        );
    }

    #[test]
    fn test_wide_sorter_inlines_top_merge() {
        let config = GeneratorConfig::default();
        let b = builder(&config, VectorIsa::Avx512, ElementType::F32);
        let sorter = b.compounded_sorter(16, Direction::Ascending).unwrap();
        // merge_16v is above the ceiling: its 8 cross exchanges are inlined
        // and the two halves go to the largest emitted merger
        assert_eq!(sorter.stage_count(), 8);
        let calls: Vec<_> = sorter.callees().collect();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], RoutineKey::merge(8, Direction::Ascending));
        assert_eq!(calls[3], RoutineKey::merge(8, Direction::Ascending));
    }

    #[test]
    fn test_unrolled_widths_are_inlined() {
        let config = GeneratorConfig::default().with_unroll_bitonic_sorters(4);
        let b = builder(&config, VectorIsa::Avx2, ElementType::I64);
        assert!(!b.is_emitted(RoutineKey::sort(1, Direction::Ascending)));
        assert!(!b.is_emitted(RoutineKey::sort(2, Direction::Ascending)));
        assert!(!b.is_emitted(RoutineKey::merge(3, Direction::Ascending)));
        assert!(b.is_emitted(RoutineKey::sort(4, Direction::Ascending)));

        let sorter = b.compounded_sorter(4, Direction::Ascending).unwrap();
        let calls: Vec<_> = sorter.callees().collect();
        assert_eq!(calls, vec![RoutineKey::merge(4, Direction::Ascending)]);
        assert!(sorter.stage_count() > 0);

        let routines = b.network_routines().unwrap();
        assert!(routines.iter().all(|r| r.width >= 4));
    }

    #[test]
    fn test_requests_outside_limits() {
        let config = GeneratorConfig::default();
        let b = builder(&config, VectorIsa::Neon, ElementType::F64);
        assert!(b.compounded_sorter(0, Direction::Ascending).is_err());
        assert!(b.compounded_sorter(17, Direction::Ascending).is_err());
        let err = b.compounded_merger(9, Direction::Ascending).unwrap_err();
        assert!(err.is_configuration());
        assert!(b.compounded_merger(8, Direction::Ascending).is_ok());
    }

    #[test]
    fn test_inline_flags() {
        let config = GeneratorConfig::default().with_break_inline(3);
        let b = builder(&config, VectorIsa::Avx2, ElementType::F32);
        for r in b.network_routines().unwrap() {
            assert_eq!(r.inline, r.width % 3 != 0, "{}", r.name);
        }
    }
}
