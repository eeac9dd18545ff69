//! Request, report and overlay types of the batch mutation engine.

use std::fmt;

use bevy::prelude::*;

use crate::catalog::SelectionSet;
use crate::components::LifeStage;

/// Spatial extent of one batch mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionScope {
    /// The object under the cursor.
    Single { hit: Entity },
    /// Every sub-object of a building or network segment.
    WholeBuildingOrNetwork { owner: Entity },
    /// Every instance whose position lies within `radius` of `center` on the
    /// ground plane.
    Radius { center: Vec3, radius: f32 },
    WholeMap,
}

impl SelectionScope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            SelectionScope::Single { .. } => ScopeKind::Single,
            SelectionScope::WholeBuildingOrNetwork { .. } => ScopeKind::WholeBuildingOrNetwork,
            SelectionScope::Radius { .. } => ScopeKind::Radius,
            SelectionScope::WholeMap => ScopeKind::WholeMap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Single,
    WholeBuildingOrNetwork,
    Radius,
    WholeMap,
}

impl ScopeKind {
    pub fn name(self) -> &'static str {
        match self {
            ScopeKind::Single => "single",
            ScopeKind::WholeBuildingOrNetwork => "owner",
            ScopeKind::Radius => "radius",
            ScopeKind::WholeMap => "map",
        }
    }
}

/// Tool request: rewrite the age and/or prefab of every instance in scope.
///
/// An empty `ages` set and a missing or empty `prefabs` set make the request
/// a no-op.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BatchMutationRequest {
    pub scope: SelectionScope,
    pub ages: Vec<LifeStage>,
    pub prefabs: Option<SelectionSet>,
}

impl BatchMutationRequest {
    pub fn ages(scope: SelectionScope, ages: impl IntoIterator<Item = LifeStage>) -> Self {
        Self {
            scope,
            ages: ages.into_iter().collect(),
            prefabs: None,
        }
    }

    pub fn replace(scope: SelectionScope, prefabs: SelectionSet) -> Self {
        Self {
            scope,
            ages: Vec::new(),
            prefabs: Some(prefabs),
        }
    }

    pub fn with_ages(mut self, ages: impl IntoIterator<Item = LifeStage>) -> Self {
        self.ages = ages.into_iter().collect();
        self
    }

    /// Prefab replacement was asked for with a non-empty pool.
    pub fn replaces_prefabs(&self) -> bool {
        self.prefabs.as_ref().is_some_and(|set| !set.is_empty())
    }

    pub fn is_noop(&self) -> bool {
        self.ages.is_empty() && !self.replaces_prefabs()
    }
}

/// Why an instance in scope was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The instance's own prefab is not in the catalog.
    MissingCatalogEntry,
    /// The target entity exists but is not an eligible vegetation instance.
    NotVegetation,
    /// The drawn replacement prefab is not in the catalog.
    UnknownTarget,
    /// Both sampling pools were empty.
    EmptySelection,
    /// The entity was despawned before it could be processed.
    EntityGone,
}

impl SkipReason {
    pub const ALL: [SkipReason; 5] = [
        SkipReason::MissingCatalogEntry,
        SkipReason::NotVegetation,
        SkipReason::UnknownTarget,
        SkipReason::EmptySelection,
        SkipReason::EntityGone,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            SkipReason::MissingCatalogEntry => 0,
            SkipReason::NotVegetation => 1,
            SkipReason::UnknownTarget => 2,
            SkipReason::EmptySelection => 3,
            SkipReason::EntityGone => 4,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingCatalogEntry => "missing catalog entry",
            SkipReason::NotVegetation => "not vegetation",
            SkipReason::UnknownTarget => "unknown replacement prefab",
            SkipReason::EmptySelection => "empty selection",
            SkipReason::EntityGone => "entity gone",
        };
        f.write_str(text)
    }
}

/// Skip counts per reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipTally([usize; 5]);

impl SkipTally {
    pub fn add(&mut self, reason: SkipReason, count: usize) {
        self.0[reason.index()] += count;
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.0[reason.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn merge(&mut self, other: &SkipTally) {
        for reason in SkipReason::ALL {
            self.add(reason, other.get(reason));
        }
    }
}

impl fmt::Display for SkipTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for reason in SkipReason::ALL {
            let count = self.get(reason);
            if count == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", reason, count)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Outcome of one processed request.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct BatchMutationReport {
    pub scope: ScopeKind,
    pub matched: usize,
    pub changed: usize,
    pub skipped: SkipTally,
    /// Stump requests served with the dead model instead.
    pub stump_fallbacks: usize,
}

/// Totals over every processed request, plus the most recent report.
#[derive(Resource, Debug, Default)]
pub struct BatchMutationLog {
    pub requests: u64,
    pub changed: u64,
    pub skipped: SkipTally,
    pub last: Option<BatchMutationReport>,
}

/// Circle the tool layer wants previewed while picking a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewCircle {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct RadiusPreview {
    pub circle: Option<PreviewCircle>,
}

/// Overlay draw request for the rendering layer. Fire-and-forget.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct OverlayCircle {
    pub center: Vec3,
    pub radius: f32,
}
