//! The shared shape library.
//!
//! The library lives in room-level storage shared by every client, so it is
//! read as loosely-typed [`RawShapeEntry`] values and normalized on every
//! load. Writers always write the normalized form back.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, WildshapeError};
use crate::ids::{ShapeId, TokenId};
use crate::scene::SceneStore;
use crate::token::Token;

/// Name given to entries saved without one
pub const DEFAULT_SHAPE_NAME: &str = "Unnamed";

/// A library entry as found in shared storage; any field may be missing or malformed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawShapeEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Older clients stored the form input verbatim, so this may be a string
    pub size: Option<serde_json::Value>,
    pub url: Option<String>,
    /// Pixels; some hosts record fractional sizes
    pub img_width: Option<f64>,
    pub img_height: Option<f64>,
    pub summonable: Option<bool>,
}

/// A normalized library entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryShape {
    pub id: ShapeId,
    pub name: String,
    /// Footprint in grid cells, always > 0
    pub size: f64,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_height: Option<u32>,
    pub summonable: bool,
}

impl LibraryShape {
    /// Pixel size recorded at save time, if both dimensions are known
    pub fn known_dimensions(&self) -> Option<(u32, u32)> {
        match (self.img_width, self.img_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    pub fn to_raw(&self) -> RawShapeEntry {
        RawShapeEntry {
            id: Some(self.id.0.clone()),
            name: Some(self.name.clone()),
            size: serde_json::Number::from_f64(self.size).map(serde_json::Value::Number),
            url: Some(self.url.clone()),
            img_width: self.img_width.map(f64::from),
            img_height: self.img_height.map(f64::from),
            summonable: Some(self.summonable),
        }
    }
}

fn parse_size(value: Option<&serde_json::Value>) -> f64 {
    let size = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    size.map_or(1.0, positive_or_one)
}

fn positive_or_one(size: f64) -> f64 {
    if size.is_finite() && size > 0.0 { size } else { 1.0 }
}

/// Whole pixels, or `None` for anything below one pixel or not finite
fn pixel_dim(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 1.0).then(|| value.round() as u32)
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Drop entries without id or url, coerce bad sizes to 1, keep the first of each id
pub fn normalize(raw: &[RawShapeEntry]) -> Vec<LibraryShape> {
    let mut seen = HashSet::new();
    let mut shapes = Vec::with_capacity(raw.len());

    for entry in raw {
        let (Some(id), Some(url)) = (non_blank(entry.id.as_ref()), non_blank(entry.url.as_ref())) else {
            debug!(id = ?entry.id, "dropping library entry without id or url");
            continue;
        };
        if !seen.insert(id.to_string()) {
            debug!(id, "dropping duplicate library entry");
            continue;
        }
        shapes.push(LibraryShape {
            id: ShapeId::from(id),
            name: non_blank(entry.name.as_ref())
                .unwrap_or(DEFAULT_SHAPE_NAME)
                .to_string(),
            size: parse_size(entry.size.as_ref()),
            url: url.to_string(),
            img_width: entry.img_width.and_then(pixel_dim),
            img_height: entry.img_height.and_then(pixel_dim),
            summonable: entry.summonable.unwrap_or(true),
        });
    }

    shapes
}

/// Fetch and normalize the room library
pub fn load(store: &dyn SceneStore) -> Result<Vec<LibraryShape>> {
    let raw = store.shared_library()?;
    Ok(normalize(&raw))
}

pub fn find<'a>(shapes: &'a [LibraryShape], id: &ShapeId) -> Option<&'a LibraryShape> {
    shapes.iter().find(|s| &s.id == id)
}

/// One row of the batch-add wizard
#[derive(Debug, Clone, PartialEq)]
pub struct NewShape {
    pub token: TokenId,
    pub name: String,
    pub size: f64,
    pub summonable: bool,
}

impl NewShape {
    pub fn new(token: TokenId, name: impl Into<String>, size: f64) -> Self {
        Self {
            token,
            name: name.into(),
            size,
            summonable: true,
        }
    }
}

/// Outcome of a batch add
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub added: usize,
    pub skipped: usize,
}

/// Build a library entry from a token, enforcing the save-form checks
fn shape_from_token(token: Option<&Token>, request: &NewShape) -> Result<LibraryShape> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(WildshapeError::InvalidName);
    }
    let image = token
        .and_then(Token::as_image)
        .filter(|t| !t.image.url.is_empty())
        .ok_or(WildshapeError::NoImage)?;
    if image.is_transformed() {
        return Err(WildshapeError::AlreadyTransformed);
    }

    Ok(LibraryShape {
        id: ShapeId::new(),
        name: name.to_string(),
        size: positive_or_one(request.size),
        url: image.image.url.clone(),
        img_width: pixel_dim(image.image.width),
        img_height: pixel_dim(image.image.height),
        summonable: request.summonable,
    })
}

/// Save one token's image as a new library shape
pub fn save_to_library(store: &mut dyn SceneStore, request: &NewShape) -> Result<LibraryShape> {
    let tokens = store.get_tokens(std::slice::from_ref(&request.token))?;
    let shape = shape_from_token(tokens.first(), request)?;

    let mut shapes = load(store)?;
    shapes.push(shape.clone());
    store.set_shared_library(&shapes)?;

    info!(id = %shape.id, name = %shape.name, "saved shape to library");
    Ok(shape)
}

/// Save several tokens at once; invalid rows are skipped, the rest land in one write
pub fn save_batch(store: &mut dyn SceneStore, requests: &[NewShape]) -> Result<BatchReport> {
    let ids: Vec<TokenId> = requests.iter().map(|r| r.token.clone()).collect();
    let tokens = store.get_tokens(&ids)?;

    let mut report = BatchReport::default();
    let mut added = Vec::new();
    for request in requests {
        let token = tokens.iter().find(|t| t.id() == &request.token);
        match shape_from_token(token, request) {
            Ok(shape) => added.push(shape),
            Err(err) => {
                warn!(token = %request.token, %err, "skipping batch entry");
                report.skipped += 1;
            }
        }
    }

    if !added.is_empty() {
        report.added = added.len();
        let mut shapes = load(store)?;
        shapes.extend(added);
        store.set_shared_library(&shapes)?;
    }

    info!(added = report.added, skipped = report.skipped, "batch add finished");
    Ok(report)
}

/// Remove a shape by id; unknown ids leave the library untouched
pub fn delete_shape(store: &mut dyn SceneStore, id: &ShapeId) -> Result<bool> {
    let mut shapes = load(store)?;
    let before = shapes.len();
    shapes.retain(|s| &s.id != id);
    if shapes.len() == before {
        return Ok(false);
    }
    store.set_shared_library(&shapes)?;
    info!(%id, "deleted library shape");
    Ok(true)
}
