//! Lane permutation patterns used by compare-exchange stages
//!
//! A pattern maps every lane of a vector register to the lane it is compared
//! against. Bitonic stages only ever pair lanes, so a pattern that takes part
//! in a compare-exchange must be an involution: applying it twice is the
//! identity.

use std::fmt;

use crate::network::Direction;

/// A permutation of the lanes of one vector register
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanePattern {
    targets: Vec<u8>,
}

impl LanePattern {
    /// Create a pattern from explicit targets
    ///
    /// Returns None unless `targets` is a permutation of `0..targets.len()`.
    pub fn from_targets(targets: &[usize]) -> Option<Self> {
        let n = targets.len();
        if n == 0 || n > u8::MAX as usize {
            return None;
        }
        let mut seen = vec![false; n];
        for &t in targets {
            if t >= n || seen[t] {
                return None;
            }
            seen[t] = true;
        }
        Some(LanePattern {
            targets: targets.iter().map(|&t| t as u8).collect(),
        })
    }

    /// The identity pattern over `lanes` lanes
    pub fn identity(lanes: usize) -> Self {
        LanePattern {
            targets: (0..lanes).map(|i| i as u8).collect(),
        }
    }

    /// Pair lane `i` with lane `i ^ distance`
    ///
    /// # Panics
    ///
    /// If `lanes` or `distance` is not a power of two, or `distance >= lanes`.
    pub fn xor(lanes: usize, distance: usize) -> Self {
        assert!(lanes.is_power_of_two(), "lane count must be a power of two");
        assert!(
            distance.is_power_of_two() && distance < lanes,
            "xor distance {} out of range for {} lanes",
            distance,
            lanes
        );
        LanePattern {
            targets: (0..lanes).map(|i| (i ^ distance) as u8).collect(),
        }
    }

    /// Pair each lane with its mirror image inside blocks of `block` lanes
    ///
    /// # Panics
    ///
    /// If `lanes` or `block` is not a power of two, or `block` is outside
    /// `2..=lanes`.
    pub fn mirror(lanes: usize, block: usize) -> Self {
        assert!(lanes.is_power_of_two(), "lane count must be a power of two");
        assert!(
            block.is_power_of_two() && block >= 2 && block <= lanes,
            "mirror block {} out of range for {} lanes",
            block,
            lanes
        );
        LanePattern {
            targets: (0..lanes).map(|i| (i ^ (block - 1)) as u8).collect(),
        }
    }

    /// Reverse the whole register
    pub fn reverse(lanes: usize) -> Self {
        Self::mirror(lanes, lanes)
    }

    /// Number of lanes covered by the pattern
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The lane that `lane` is compared against
    pub fn partner(&self, lane: usize) -> usize {
        self.targets[lane] as usize
    }

    /// Iterate over the partner of every lane, in lane order
    pub fn partners(&self) -> impl Iterator<Item = usize> + '_ {
        self.targets.iter().map(|&t| t as usize)
    }

    /// Check the self-inverse property required by bitonic stages
    pub fn is_involution(&self) -> bool {
        self.partners()
            .enumerate()
            .all(|(lane, partner)| self.partner(partner) == lane)
    }

    /// Gather `lanes` through the pattern: `out[i] = lanes[partner(i)]`
    pub fn apply<T: Copy>(&self, lanes: &[T]) -> Vec<T> {
        debug_assert_eq!(lanes.len(), self.len());
        self.partners().map(|p| lanes[p]).collect()
    }

    /// Lanes that receive the first value of each pair (the lower lane index)
    pub fn low_lanes(&self) -> LaneMask {
        let bits = self
            .partners()
            .enumerate()
            .filter(|&(lane, partner)| lane < partner)
            .fold(0u64, |mask, (lane, _)| mask | (1 << lane));
        LaneMask(bits)
    }

    /// Whether any lane is paired with a lane from a different group
    ///
    /// Groups are consecutive runs of `group_lanes` lanes; x86 shuffles that
    /// stay inside a 128-bit group are cheaper than full permutes.
    pub fn crosses_groups(&self, group_lanes: usize) -> bool {
        let group_lanes = group_lanes.max(1);
        self.partners()
            .enumerate()
            .any(|(lane, partner)| lane / group_lanes != partner / group_lanes)
    }
}

impl fmt::Display for LanePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.partners().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

/// Bit set over the lanes of one register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneMask(pub u64);

impl LaneMask {
    pub fn contains(&self, lane: usize) -> bool {
        lane < 64 && (self.0 >> lane) & 1 == 1
    }
}

impl fmt::Display for LaneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// How the permutation of a stage maps onto the ISA's shuffle instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShuffleClass {
    /// Every pair stays inside one in-lane shuffle group
    InLane,
    /// At least one pair crosses a shuffle group and needs a full permute
    CrossLane,
}

impl ShuffleClass {
    pub fn name(&self) -> &'static str {
        match self {
            ShuffleClass::InLane => "in-lane",
            ShuffleClass::CrossLane => "cross-lane",
        }
    }
}

/// One intra-register compare-exchange, as produced by an ISA provider
///
/// After the exchange, for each lane pair of `pattern`, the lane in
/// `low_lanes` holds the value that comes first in `direction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaneExchange {
    pub pattern: LanePattern,
    pub low_lanes: LaneMask,
    pub direction: Direction,
    pub shuffle: ShuffleClass,
}
