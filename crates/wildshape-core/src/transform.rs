//! Applying a library shape onto existing tokens.
//!
//! The first transform snapshots the token; later ones only swap the look
//! and the recorded state. Sizing follows one of two policies: keep the
//! cells the token occupies now, or force the shape's own cell size.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wildshape_geometry::{centered_offset, forced_size_dpi, keep_footprint_dpi, Vec2};

use crate::error::{Result, WildshapeError};
use crate::ids::TokenId;
use crate::library::LibraryShape;
use crate::naming::{base_name, decorate};
use crate::notify::Severity;
use crate::probe::{DimensionCache, DimensionProbe};
use crate::scene::SceneStore;
use crate::snapshot::snapshot_of;
use crate::token::{ImageToken, Token, TransformState, Transformed};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizingPolicy {
    /// Keep the number of cells the token covers right now
    KeepFootprint,
    /// Cover exactly this many cells at scale 1
    ForcedSize(f64),
}

impl SizingPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            SizingPolicy::KeepFootprint => "keep footprint",
            SizingPolicy::ForcedSize(_) => "forced size",
        }
    }
}

/// Per-call knobs that come from the session and preferences
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions<'a> {
    /// Acting player's display name, used when the token had no label
    pub player_name: Option<&'a str>,
    pub label_indicator: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    pub transformed: usize,
    pub shape_name: String,
}

impl TransformReport {
    pub fn notification(&self) -> (String, Severity) {
        (format!("Transformed into {}", self.shape_name), Severity::Info)
    }
}

/// Give `token` the look of `shape` whose image is `dims` pixels
pub fn transform_token(
    token: &mut ImageToken,
    shape: &LibraryShape,
    dims: (f64, f64),
    policy: SizingPolicy,
    opts: TransformOptions<'_>,
    now: u64,
) {
    let (width, height) = dims;
    let cells_before = token.cells();

    let original = match token.ext.transform.take() {
        Some(existing) => existing.original,
        None => snapshot_of(token, now),
    };

    let scale_x = token.scale.x;
    token.grid.dpi = match policy {
        SizingPolicy::KeepFootprint => {
            let kept = keep_footprint_dpi(width, scale_x, cells_before)
                .or_else(|| keep_footprint_dpi(width, scale_x, shape.size));
            match kept {
                Some(dpi) => dpi,
                // Scale itself is unusable
                None => {
                    token.scale = Vec2::ONE;
                    forced_size_dpi(width, shape.size)
                }
            }
        }
        SizingPolicy::ForcedSize(cells) => {
            token.scale = Vec2::ONE;
            forced_size_dpi(width, cells)
        }
    };

    token.image.url = shape.url.clone();
    token.image.width = width;
    token.image.height = height;
    token.image.offset = None;
    token.grid.offset = centered_offset(width, height);
    token.rotation = original.rotation;

    let base = base_name(&original.label, opts.player_name, &token.label).to_string();
    token.label = decorate(&base, opts.label_indicator);

    debug!(id = %token.id, shape = %shape.id, dpi = token.grid.dpi, mode = policy.label(), "transformed token");
    token.ext.transform = Some(Transformed {
        original,
        state: TransformState {
            shape_id: shape.id.clone(),
            shape_name: shape.name.clone(),
            transformed_at: now,
            mode: policy,
        },
    });
}

/// Transform every image token among `ids` into `shape` in one batch
///
/// Nothing is written if the selection is empty, the shape's image size
/// cannot be read, or no selected token carries an image.
pub fn apply_shape<P: DimensionProbe>(
    store: &mut dyn SceneStore,
    dimensions: &mut DimensionCache<P>,
    ids: &[TokenId],
    shape: &LibraryShape,
    policy: SizingPolicy,
    opts: TransformOptions<'_>,
) -> Result<TransformReport> {
    if ids.is_empty() {
        return Err(WildshapeError::NoSelection);
    }
    let dims = dimensions.shape_dimensions(shape)?;

    let eligible: Vec<TokenId> = store
        .get_tokens(ids)?
        .iter()
        .filter_map(Token::as_image)
        .map(|t| t.id.clone())
        .collect();
    if eligible.is_empty() {
        return Err(WildshapeError::NoEligibleTokens);
    }

    let now = crate::now_ms();
    let mut transformed = 0;
    store.update_tokens(&eligible, &mut |tokens: &mut [Token]| {
        for token in tokens.iter_mut().filter_map(Token::as_image_mut) {
            transform_token(token, shape, dims, policy, opts, now);
            transformed += 1;
        }
    })?;
    if transformed == 0 {
        return Err(WildshapeError::NoEligibleTokens);
    }

    info!(count = transformed, shape = %shape.name, mode = policy.label(), "applied shape");
    Ok(TransformReport {
        transformed,
        shape_name: shape.name.clone(),
    })
}
