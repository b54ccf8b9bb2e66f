//! Centralized constants for the bitonic network generator
//!
//! This module contains all hardcoded constants used throughout the codebase.
//! All new constants should be added here rather than scattered throughout the code.
//! Constants are organized by category for easy reference and maintenance.

// ============================================================================
// ARCHITECTURE-SPECIFIC CONSTANTS
// ============================================================================

/// Vector width in bytes for AVX-512 architecture
pub const AVX512_VECTOR_WIDTH_BYTES: usize = 64;

/// Vector width in bytes for AVX2 architecture
pub const AVX2_VECTOR_WIDTH_BYTES: usize = 32;

/// Vector width in bytes for ARM NEON architecture
pub const NEON_VECTOR_WIDTH_BYTES: usize = 16;

/// In-lane shuffle granularity for the x86 vector extensions (128-bit lanes)
pub const X86_LANE_GROUP_BYTES: usize = 16;

/// Architectural vector registers available on AVX2
pub const AVX2_REGISTER_COUNT: usize = 16;

/// Architectural vector registers available on AVX-512
pub const AVX512_REGISTER_COUNT: usize = 32;

/// Architectural vector registers available on ARM NEON (AArch64)
pub const NEON_REGISTER_COUNT: usize = 32;

// ============================================================================
// NETWORK CEILINGS
// ============================================================================

/// Largest compounded width generated for AVX2 (one vector per register)
pub const AVX2_MAX_BITONIC_SORT_VECTORS: usize = 16;

/// Largest compounded width generated for AVX-512
///
/// Half the register file, leaving room for permutation temporaries.
pub const AVX512_MAX_BITONIC_SORT_VECTORS: usize = 16;

/// Largest compounded width generated for ARM NEON
pub const NEON_MAX_BITONIC_SORT_VECTORS: usize = 16;

// ============================================================================
// CODE-SHAPING DEFAULTS
// ============================================================================

/// Default width below which compounded routines are unrolled into callers
pub const DEFAULT_UNROLL_BITONIC_SORTERS: usize = 0;

/// Default inline-break period (0 never breaks the inline chain)
pub const DEFAULT_BREAK_INLINE: usize = 0;

// ============================================================================
// OUTPUT NAMING
// ============================================================================

/// Prefix shared by every generated file
pub const OUTPUT_FILE_PREFIX: &str = "BitonicSort";

/// Marker placed between the unit name and the extension
pub const OUTPUT_FILE_MARKER: &str = "generated";

/// Extension used by the reference listing sink
pub const LISTING_EXTENSION: &str = "lst";

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "..";

// ============================================================================
// VERIFICATION
// ============================================================================

/// Seed for the deterministic noise pattern used by plan verification
pub const VERIFY_NOISE_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Upper bound (exclusive) on generated verification values
///
/// Small enough to be exact in every supported element type.
pub const VERIFY_VALUE_RANGE: u64 = 1 << 20;
