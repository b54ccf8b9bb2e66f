//! Entry points and length dispatch
//!
//! Every width `W` in `1..=max` gets an entry point per direction that loads
//! `W` registers (padding the residual lanes of the last one with the
//! direction's sentinel), sorts them and stores them back. The master
//! dispatch maps an array length to the narrowest entry point that holds it
//! and hands anything longer to the fallback sort.

use crate::error::GenResult;
use crate::network::{Direction, NetworkBuilder, Routine, RoutineKey, RoutineKind, Step};

/// One row of a length dispatch table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    /// Registers loaded by the entry point
    pub width: usize,
    /// Shortest length routed here (inclusive)
    pub min_len: usize,
    /// Longest length routed here (inclusive)
    pub max_len: usize,
    pub ascending: String,
    pub descending: String,
}

impl DispatchEntry {
    /// Entry point name for `direction`
    pub fn routine(&self, direction: Direction) -> &str {
        match direction {
            Direction::Ascending => &self.ascending,
            Direction::Descending => &self.descending,
        }
    }

    pub fn covers(&self, len: usize) -> bool {
        self.min_len <= len && len <= self.max_len
    }
}

/// Outcome of a length lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'t> {
    Entry(&'t DispatchEntry),
    /// Longer than any generated routine covers
    Fallback,
}

/// Length to entry-point mapping of one (ISA, type) unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    /// Lanes per register
    pub lanes: usize,
    /// Entries ordered by ascending length
    pub entries: Vec<DispatchEntry>,
    /// Lengths above this go to the fallback sort
    pub fallback_above: usize,
}

impl DispatchTable {
    /// Select the routine for an array of `len` elements
    ///
    /// Length 0 goes to the single-register entry point, which loads nothing
    /// but sentinels.
    pub fn select(&self, len: usize) -> Selection<'_> {
        if len > self.fallback_above {
            return Selection::Fallback;
        }
        let width = len.div_ceil(self.lanes).max(1);
        match self.entries.get(width - 1) {
            Some(entry) => Selection::Entry(entry),
            None => Selection::Fallback,
        }
    }
}

/// Builds the entry points and the master dispatch of one unit
#[derive(Debug, Clone, Copy)]
pub struct EntryPointDispatcher<'b, 'a> {
    builder: &'b NetworkBuilder<'a>,
}

impl<'b, 'a> EntryPointDispatcher<'b, 'a> {
    pub fn new(builder: &'b NetworkBuilder<'a>) -> Self {
        Self { builder }
    }

    /// Entry point name for `width` registers sorted in `direction`
    pub fn entry_name(width: usize, direction: Direction) -> String {
        format!("sort_{:02}v_alt_{}", width, direction)
    }

    /// Master dispatch name for the unit's element type
    pub fn master_name(&self) -> String {
        format!("sort_{}", self.builder.policy().element)
    }

    /// The length dispatch table of the unit
    pub fn table(&self) -> DispatchTable {
        let policy = self.builder.policy();
        let lanes = policy.lanes;
        let entries = (1..=policy.max_vectors)
            .map(|width| DispatchEntry {
                width,
                min_len: if width == 1 { 0 } else { (width - 1) * lanes + 1 },
                max_len: width * lanes,
                ascending: Self::entry_name(width, Direction::Ascending),
                descending: Self::entry_name(width, Direction::Descending),
            })
            .collect();
        DispatchTable {
            lanes,
            entries,
            fallback_above: policy.coverage(),
        }
    }

    /// Entry point for `width` registers sorted in `direction`
    pub fn entry_point(&self, width: usize, direction: Direction) -> GenResult<Routine> {
        let policy = self.builder.policy();
        let partial = self.builder.isa().partial_vector(policy.element)?;
        let lanes = policy.lanes;

        let mut body = vec![Step::Load {
            vectors: width,
            partial,
            pad: direction.sentinel(),
        }];
        self.builder
            .invoke(RoutineKey::sort(width, direction), 0, &mut body)?;
        body.push(Step::Store {
            vectors: width,
            partial,
        });

        Ok(Routine {
            name: Self::entry_name(width, direction),
            kind: RoutineKind::EntryPoint {
                min_len: if width == 1 { 0 } else { (width - 1) * lanes + 1 },
                max_len: width * lanes,
            },
            key: None,
            width,
            direction: Some(direction),
            inline: policy.inline_for(width),
            body,
        })
    }

    /// Every entry point, width ascending and ascending before descending
    pub fn entry_points(&self) -> GenResult<Vec<Routine>> {
        let mut routines = Vec::with_capacity(self.builder.policy().max_vectors * 2);
        for width in 1..=self.builder.policy().max_vectors {
            for d in Direction::BOTH {
                routines.push(self.entry_point(width, d)?);
            }
        }
        Ok(routines)
    }

    /// The per-type master dispatch routine
    pub fn master_dispatch(&self) -> Routine {
        Routine {
            name: self.master_name(),
            kind: RoutineKind::MasterDispatch,
            key: None,
            width: self.builder.policy().max_vectors,
            direction: None,
            inline: false,
            body: vec![Step::Dispatch(self.table())],
        }
    }
}
