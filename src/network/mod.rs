//! Bitonic network data model
//!
//! A generation run produces one [`GenerationPlan`] per unit: an ordered list
//! of [`Routine`]s whose bodies are [`Step`]s. Steps are either comparator
//! stages on registers, calls into other emitted routines, or the entry-point
//! and dispatch plumbing around them. Plans are plain values; the emission
//! backend decides how they become source text.

pub mod builder;

pub use builder::NetworkBuilder;

use std::fmt;

use crate::config::UnitPolicy;
use crate::dispatch::DispatchTable;
use crate::isa::{ElementType, LaneExchange, PartialVector, VectorIsa};

/// Sort direction of a routine or stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Both directions, in emission order
    pub const BOTH: [Direction; 2] = [Direction::Ascending, Direction::Descending];

    pub fn reverse(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }

    /// Value used to pad residual lanes so they sort to the end
    pub fn sentinel(&self) -> Sentinel {
        match self {
            Direction::Ascending => Sentinel::Max,
            Direction::Descending => Sentinel::Min,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Padding value for the residual lanes of a partial vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Largest representable value of the element type
    Max,
    /// Smallest representable value of the element type
    Min,
}

impl Sentinel {
    pub fn name(&self) -> &'static str {
        match self {
            Sentinel::Max => "max",
            Sentinel::Min => "min",
        }
    }
}

/// Half of `width` rounded up to a power of two
///
/// This is where a compounded network of `width` vectors splits: the first
/// `split_width(width)` vectors form the power-of-two half, the rest the
/// remainder. Returns 0 for widths below 2.
pub fn split_width(width: usize) -> usize {
    if width < 2 {
        0
    } else {
        width.next_power_of_two() / 2
    }
}

/// One comparator stage of a network
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NetworkStage {
    /// Compare-exchange between the lanes of one register
    Lanes {
        register: usize,
        exchange: LaneExchange,
    },
    /// Lane-wise min/max between two registers
    Vectors {
        low: usize,
        high: usize,
        direction: Direction,
    },
}

impl NetworkStage {
    /// The same stage applied `offset` registers further along
    pub fn shifted(&self, offset: usize) -> Self {
        match self {
            NetworkStage::Lanes { register, exchange } => NetworkStage::Lanes {
                register: register + offset,
                exchange: exchange.clone(),
            },
            NetworkStage::Vectors {
                low,
                high,
                direction,
            } => NetworkStage::Vectors {
                low: low + offset,
                high: high + offset,
                direction: *direction,
            },
        }
    }

    /// Highest register index the stage touches
    pub fn max_register(&self) -> usize {
        match self {
            NetworkStage::Lanes { register, .. } => *register,
            NetworkStage::Vectors { low, high, .. } => (*low).max(*high),
        }
    }
}

/// Per-type target of an ISA-level dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTarget {
    pub element: ElementType,
    pub routine: String,
}

/// One element of a routine body
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Stage(NetworkStage),
    /// Call an emitted routine on registers `first..first + callee.width`
    Call { callee: RoutineKey, first: usize },
    /// Load `vectors` registers from the input, padding the residual lanes
    Load {
        vectors: usize,
        partial: PartialVector,
        pad: Sentinel,
    },
    /// Store `vectors` registers back, skipping the residual lanes
    Store {
        vectors: usize,
        partial: PartialVector,
    },
    /// Length-based selection of an entry point
    Dispatch(DispatchTable),
    /// Element-type based selection of a master dispatch
    SelectType(Vec<TypeTarget>),
}

impl Step {
    /// Move register references `offset` registers further along
    ///
    /// Only stages and calls name registers; the other steps are unchanged.
    pub fn shifted(&self, offset: usize) -> Self {
        match self {
            Step::Stage(stage) => Step::Stage(stage.shifted(offset)),
            Step::Call { callee, first } => Step::Call {
                callee: *callee,
                first: first + offset,
            },
            other => other.clone(),
        }
    }
}

/// Which of the two recursive networks a routine implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetworkKind {
    Sort,
    Merge,
}

/// Identity of a sorter or merger network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineKey {
    pub network: NetworkKind,
    pub width: usize,
    pub direction: Direction,
}

impl RoutineKey {
    pub fn sort(width: usize, direction: Direction) -> Self {
        RoutineKey {
            network: NetworkKind::Sort,
            width,
            direction,
        }
    }

    pub fn merge(width: usize, direction: Direction) -> Self {
        RoutineKey {
            network: NetworkKind::Merge,
            width,
            direction,
        }
    }

    /// Stable routine name, e.g. `sort_04v_ascending` or `merge_08v_descending`
    ///
    /// The single-register merger is named after the sorter it belongs to.
    pub fn name(&self) -> String {
        match (self.network, self.width) {
            (NetworkKind::Merge, 1) => format!("sort_01v_merge_{}", self.direction),
            (NetworkKind::Sort, w) => format!("sort_{:02}v_{}", w, self.direction),
            (NetworkKind::Merge, w) => format!("merge_{:02}v_{}", w, self.direction),
        }
    }
}

impl fmt::Display for RoutineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Role of a routine inside its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    /// Single-register sorter or merger
    BaseSorter,
    CompoundedSorter,
    CompoundedMerger,
    /// Sorts arrays whose length lies in `min_len..=max_len`
    EntryPoint { min_len: usize, max_len: usize },
    /// Per-type length dispatch
    MasterDispatch,
    /// Per-ISA element-type dispatch
    IsaDispatch,
}

impl RoutineKind {
    pub fn name(&self) -> &'static str {
        match self {
            RoutineKind::BaseSorter => "base-sorter",
            RoutineKind::CompoundedSorter => "compounded-sorter",
            RoutineKind::CompoundedMerger => "compounded-merger",
            RoutineKind::EntryPoint { .. } => "entry-point",
            RoutineKind::MasterDispatch => "master-dispatch",
            RoutineKind::IsaDispatch => "isa-dispatch",
        }
    }
}

/// One generated routine
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub kind: RoutineKind,
    /// Set for sorters and mergers
    pub key: Option<RoutineKey>,
    /// Width in vectors
    pub width: usize,
    pub direction: Option<Direction>,
    /// Whether the backend should force-inline the routine
    pub inline: bool,
    pub body: Vec<Step>,
}

impl Routine {
    /// Number of comparator stages in the body, not counting callees
    pub fn stage_count(&self) -> usize {
        self.body
            .iter()
            .filter(|step| matches!(step, Step::Stage(_)))
            .count()
    }

    /// Routines this one calls, in body order
    pub fn callees(&self) -> impl Iterator<Item = RoutineKey> + '_ {
        self.body.iter().filter_map(|step| match step {
            Step::Call { callee, .. } => Some(*callee),
            _ => None,
        })
    }
}

/// Setup information a backend needs before emitting the routines
#[derive(Debug, Clone, PartialEq)]
pub enum PlanHeader {
    /// One (ISA, element type) unit
    Unit {
        policy: UnitPolicy,
        partial: PartialVector,
        native_min_max: bool,
        fallback_above: usize,
    },
    /// The ISA-level dispatch over every supported type
    Isa {
        isa: VectorIsa,
        elements: Vec<ElementType>,
    },
}

/// Ordered routines of one generation unit
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPlan {
    pub header: PlanHeader,
    pub routines: Vec<Routine>,
}

impl GenerationPlan {
    pub fn isa(&self) -> VectorIsa {
        match &self.header {
            PlanHeader::Unit { policy, .. } => policy.isa,
            PlanHeader::Isa { isa, .. } => *isa,
        }
    }

    /// Element type of a per-type plan
    pub fn element(&self) -> Option<ElementType> {
        match &self.header {
            PlanHeader::Unit { policy, .. } => Some(policy.element),
            PlanHeader::Isa { .. } => None,
        }
    }

    /// Resolved limits of a per-type plan
    pub fn policy(&self) -> Option<&UnitPolicy> {
        match &self.header {
            PlanHeader::Unit { policy, .. } => Some(policy),
            PlanHeader::Isa { .. } => None,
        }
    }

    /// Unit name, `AVX2.int32` or `AVX2`
    pub fn unit_name(&self) -> String {
        match self.element() {
            Some(ty) => format!("{}.{}", self.isa(), ty),
            None => self.isa().to_string(),
        }
    }

    /// Find the emitted sorter or merger for `key`
    pub fn find(&self, key: &RoutineKey) -> Option<&Routine> {
        self.routines.iter().find(|r| r.key.as_ref() == Some(key))
    }

    pub fn find_named(&self, name: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name)
    }

    /// The length dispatch table of a per-type plan
    pub fn dispatch_table(&self) -> Option<&DispatchTable> {
        self.routines
            .iter()
            .filter(|r| r.kind == RoutineKind::MasterDispatch)
            .flat_map(|r| r.body.iter())
            .find_map(|step| match step {
                Step::Dispatch(table) => Some(table),
                _ => None,
            })
    }

    /// Emitted sorters and mergers, in plan order
    pub fn networks(&self) -> impl Iterator<Item = &Routine> + '_ {
        self.routines.iter().filter(|r| r.key.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_width() {
        assert_eq!(split_width(0), 0);
        assert_eq!(split_width(1), 0);
        assert_eq!(split_width(2), 1);
        assert_eq!(split_width(3), 2);
        assert_eq!(split_width(4), 2);
        assert_eq!(split_width(5), 4);
        assert_eq!(split_width(8), 4);
        assert_eq!(split_width(9), 8);
        assert_eq!(split_width(16), 8);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::Ascending.reverse(), Direction::Descending);
        assert_eq!(Direction::Descending.reverse().reverse(), Direction::Descending);
        assert_eq!(Direction::Ascending.sentinel(), Sentinel::Max);
        assert_eq!(Direction::Descending.sentinel(), Sentinel::Min);
    }

    #[test]
    fn test_routine_names() {
        assert_eq!(RoutineKey::sort(1, Direction::Ascending).name(), "sort_01v_ascending");
        assert_eq!(
            RoutineKey::merge(1, Direction::Descending).name(),
            "sort_01v_merge_descending"
        );
        assert_eq!(RoutineKey::sort(12, Direction::Descending).name(), "sort_12v_descending");
        assert_eq!(RoutineKey::merge(4, Direction::Ascending).name(), "merge_04v_ascending");
    }

    #[test]
    fn test_shifted_steps() {
        let stage = NetworkStage::Vectors {
            low: 0,
            high: 2,
            direction: Direction::Ascending,
        };
        assert_eq!(stage.shifted(3).max_register(), 5);

        let call = Step::Call {
            callee: RoutineKey::merge(2, Direction::Ascending),
            first: 1,
        };
        match call.shifted(4) {
            Step::Call { first, .. } => assert_eq!(first, 5),
            other => panic!("unexpected step {:?}", other),
        }
    }
}
