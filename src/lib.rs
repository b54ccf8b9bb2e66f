//! # bitonic-gen: SIMD bitonic network generator
//!
//! Generates, at design time, the routines that sort small fixed-size arrays
//! with bitonic sort/merge networks expressed as vector operations.
//!
//! ## Overview
//!
//! Every routine is derived from a few capabilities each vector ISA exposes:
//!
//! - Compare-exchange of the lanes of one register under a lane permutation
//! - Full-register lane reversal
//! - Lane-wise min/max between two registers
//!
//! ## Components
//!
//! 1. **ISA providers** ([`isa`]): AVX2, AVX-512 and NEON register geometry,
//!    supported element types and ceilings.
//!
//! 2. **Network builder** ([`network`]): single-register sorters and mergers,
//!    and the compounded sorters and mergers built on top of them.
//!
//! 3. **Entry points** ([`dispatch`]): one routine per vector count and
//!    direction, plus the length dispatch that falls back to a generic sort.
//!
//! 4. **Driver** ([`driver`]): sequences generation per (ISA, type) unit and
//!    writes each plan through a [`PlanSink`].
//!
//! ## Usage
//!
//! ```
//! use bitonic_gen::{generate_for_type, ElementType, GeneratorConfig, Simulator, VectorIsa, Direction};
//!
//! let config = GeneratorConfig::default();
//! let plan = generate_for_type(ElementType::I32, VectorIsa::Avx2.provider(), &config).unwrap();
//!
//! let mut data = vec![9, -4, 17, 3, 0, 8, 2, 11, 5, -1];
//! Simulator::new(&plan).unwrap().sort(Direction::Ascending, &mut data).unwrap();
//! assert_eq!(data, vec![-4, -1, 0, 2, 3, 5, 8, 9, 11, 17]);
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod driver;
pub mod emit;
pub mod error;
pub mod isa;
pub mod network;
pub mod simulate;

// Re-export primary components
pub use config::{GeneratorConfig, UnitPolicy};
pub use dispatch::{DispatchTable, EntryPointDispatcher, Selection};
pub use driver::{generate_entry_dispatch, generate_for_type, Driver, RunSummary};
pub use emit::{output_file_name, render_listing, ListingSink, PlanSink};
pub use error::{GenError, GenResult};
pub use isa::{BitonicIsa, ElementType, PartialVector, VectorIsa};
pub use network::{Direction, GenerationPlan, NetworkBuilder, Routine, RoutineKey, RoutineKind, Step};
pub use simulate::{verify_plan, LaneValue, Simulator, SortPath, VerifyReport};

/// Version information for the generator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
