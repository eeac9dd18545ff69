//! Spatial batch mutation engine.
//!
//! The tool layer sends a `BatchMutationRequest` naming a selection scope,
//! an age-override set and/or a prefab-replacement set. Every matched
//! instance draws uniformly from those sets with its own deterministic
//! stream and the resulting writes go through the `MutationQueue`. Prefab
//! replacement strips classification tags, so replaced trees are
//! reclassified by later classification passes.
//!
//! Requesting `Stump` for a prefab with too few mesh variants shows the
//! fully grown dead model instead.

pub mod preview;
pub mod resolve;
pub mod sampling;
pub mod systems;
pub mod types;


pub use preview::emit_radius_preview;
pub use resolve::{true_tree, BatchPlan, Planned};
pub use sampling::{pick, resolve_age, AgeResolution};
pub use systems::{apply_batch_mutations, in_radius, BatchMutationPlugin};
pub use types::{
    BatchMutationLog, BatchMutationReport, BatchMutationRequest, OverlayCircle, PreviewCircle,
    RadiusPreview, ScopeKind, SelectionScope, SkipReason, SkipTally,
};
