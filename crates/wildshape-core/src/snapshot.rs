//! Capture and restore of a token's original look.
//!
//! The snapshot is taken once, before the first transform, and is never
//! touched again until revert consumes it. Revert is best-effort per token:
//! a token whose snapshot fails validation is skipped and counted, the rest
//! of the batch still goes through.

use thiserror::Error;
use tracing::{debug, info, warn};
use wildshape_geometry::{centered_offset, Vec2};

use crate::error::Result;
use crate::ids::TokenId;
use crate::notify::Severity;
use crate::scene::SceneStore;
use crate::token::{ImageToken, OriginalSnapshot, Token};

/// Why a stored snapshot cannot be restored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotDefect {
    #[error("missing image url")]
    MissingUrl,
    #[error("width is not a positive number")]
    Width,
    #[error("height is not a positive number")]
    Height,
    #[error("grid dpi is not a positive number")]
    GridDpi,
    #[error("scale is missing or not numeric")]
    Scale,
}

fn positive(n: f64) -> bool {
    n.is_finite() && n > 0.0
}

/// Copy the token's current look; `None` if it already carries a snapshot
pub fn capture(token: &ImageToken, now: u64) -> Option<OriginalSnapshot> {
    (!token.is_transformed()).then(|| snapshot_of(token, now))
}

/// Copy the token's current look unconditionally
pub(crate) fn snapshot_of(token: &ImageToken, now: u64) -> OriginalSnapshot {
    let scale = if token.scale.is_finite() { token.scale } else { Vec2::ONE };
    OriginalSnapshot {
        url: token.image.url.clone(),
        width: token.image.width,
        height: token.image.height,
        grid_dpi: token.grid.dpi,
        grid_offset: Some(token.grid.offset),
        image_offset: token.image.offset,
        scale: Some(scale),
        rotation: token.rotation,
        label: token.label.clone(),
        captured_at: now,
    }
}

pub fn validate(snapshot: &OriginalSnapshot) -> Result<(), SnapshotDefect> {
    if snapshot.url.trim().is_empty() {
        return Err(SnapshotDefect::MissingUrl);
    }
    if !positive(snapshot.width) {
        return Err(SnapshotDefect::Width);
    }
    if !positive(snapshot.height) {
        return Err(SnapshotDefect::Height);
    }
    if !positive(snapshot.grid_dpi) {
        return Err(SnapshotDefect::GridDpi);
    }
    match snapshot.scale {
        Some(scale) if scale.is_finite() => Ok(()),
        _ => Err(SnapshotDefect::Scale),
    }
}

/// Put the snapshot back onto the token and drop all transform metadata
///
/// Leaves the token untouched when it has no snapshot or the snapshot is invalid.
pub fn restore_token(token: &mut ImageToken) -> Result<bool, SnapshotDefect> {
    let Some(original) = token.original() else {
        return Ok(false);
    };
    validate(original)?;
    let original = original.clone();

    token.image.url = original.url;
    token.image.width = original.width;
    token.image.height = original.height;
    token.image.offset = original.image_offset;
    token.grid.dpi = original.grid_dpi;
    token.grid.offset = original
        .grid_offset
        .unwrap_or_else(|| centered_offset(original.width, original.height));
    token.scale = original.scale.unwrap_or(Vec2::ONE);
    token.rotation = original.rotation;
    token.label = original.label;
    token.ext.transform = None;
    Ok(true)
}

/// Outcome of a revert batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevertReport {
    pub restored: usize,
    pub skipped: usize,
}

impl RevertReport {
    /// Toast for this outcome; nothing when no token was eligible
    pub fn notification(&self) -> Option<(String, Severity)> {
        match (self.restored, self.skipped) {
            (0, 0) => None,
            (_, 0) => Some(("Reverted to original form".to_string(), Severity::Info)),
            (restored, skipped) => Some((
                format!("Reverted {}, skipped {} (invalid original data)", restored, skipped),
                Severity::Warning,
            )),
        }
    }
}

/// Revert every transformed image token among `ids` in one batch
pub fn restore(store: &mut dyn SceneStore, ids: &[TokenId]) -> Result<RevertReport> {
    if ids.is_empty() {
        return Ok(RevertReport::default());
    }

    let eligible: Vec<TokenId> = store
        .get_tokens(ids)?
        .iter()
        .filter(|t| t.is_transformed())
        .map(|t| t.id().clone())
        .collect();
    if eligible.is_empty() {
        debug!("nothing to revert");
        return Ok(RevertReport::default());
    }

    let mut report = RevertReport::default();
    store.update_tokens(&eligible, &mut |tokens: &mut [Token]| {
        for token in tokens.iter_mut().filter_map(Token::as_image_mut) {
            match restore_token(token) {
                Ok(true) => report.restored += 1,
                Ok(false) => {}
                Err(defect) => {
                    warn!(id = %token.id, %defect, "skipping revert");
                    report.skipped += 1;
                }
            }
        }
    })?;

    info!(restored = report.restored, skipped = report.skipped, "reverted tokens");
    Ok(report)
}
