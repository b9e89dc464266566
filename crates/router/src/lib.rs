//! Maps a request and its conversation context to a `Route`

pub mod intent_router;
pub mod table;

pub use intent_router::{
    apply_continuity, IntentRouter, RouteRequest, CONTINUITY_SUFFIX, DEFAULT_REASON,
    EXPLICIT_REASON,
};
pub use table::{default_overrides, default_table, DomainOverride, KeywordRule};
