//! Centralized constants for the Cosmic Connection engine.
//!
//! The FNV parameters and the narrative text are part of the replay
//! contract: changing any of them changes every existing session's picks,
//! codes, or narratives.

// Hashing ------------------------------------------------------------------
pub const FNV32_OFFSET_BASIS: u32 = 2_166_136_261;
pub const FNV32_PRIME: u32 = 16_777_619;
/// 2^32, the normaliser that maps a 32-bit digest into [0, 1).
pub const RNG_NORMALIZER: f64 = 4_294_967_296.0;

// Timing -------------------------------------------------------------------
pub const MS_PER_MINUTE: i64 = 60_000;

// Picks --------------------------------------------------------------------
pub const PICK_ID_PREFIX: &str = "pick";

// Summary ------------------------------------------------------------------
pub const DEFAULT_TOP_TAG_LIMIT: usize = 3;
pub const DEFAULT_CODE_SEED_LEN: usize = 3;
pub const DEFAULT_CODE_TAG_LEN: usize = 2;
pub const DEFAULT_CODE_PLACEHOLDER: &str = "XX";
pub const CODE_SEPARATOR: &str = "-";

pub const PATTERN_REPEATED_ACTIVITIES: &str = "repeated_activities";
pub const PATTERN_TAG_RESONANCE: &str = "tag_resonance";

pub const NARRATIVE_TEMPLATE_COUNT: usize = 3;
pub const NARRATIVE_CLOSING: &str = " The connection deepens.";

// Snapshots ----------------------------------------------------------------
pub const SNAPSHOT_VERSION: u32 = 1;
