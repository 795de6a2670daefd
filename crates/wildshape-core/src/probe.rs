//! Image dimension lookup.
//!
//! Applying or summoning a shape needs its pixel size. Lookups are cached by
//! URL for the cache's lifetime; a URL's dimensions are assumed never to
//! change, so entries are never invalidated. Failures are not cached.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::error::WildshapeError;
use crate::library::LibraryShape;

pub trait DimensionProbe {
    /// Pixel `(width, height)` of the image at `url`
    fn probe(&self, url: &str) -> Result<(u32, u32)>;
}

/// Reads image headers from local paths and `file://` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileProbe;

impl DimensionProbe for ImageFileProbe {
    fn probe(&self, url: &str) -> Result<(u32, u32)> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        if url.contains("://") && !url.starts_with("file://") {
            return Err(anyhow!("cannot fetch remote image {}", url));
        }
        image::image_dimensions(Path::new(path)).with_context(|| format!("reading image header of {}", path))
    }
}

/// Fixed table of known sizes, for hosts that already know them
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    sizes: HashMap<String, (u32, u32)>,
}

impl FixedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, width: u32, height: u32) -> Self {
        self.sizes.insert(url.into(), (width, height));
        self
    }
}

impl DimensionProbe for FixedProbe {
    fn probe(&self, url: &str) -> Result<(u32, u32)> {
        self.sizes
            .get(url)
            .copied()
            .ok_or_else(|| anyhow!("no size known for {}", url))
    }
}

/// Memoises a probe by URL
#[derive(Debug)]
pub struct DimensionCache<P> {
    probe: P,
    cache: HashMap<String, (u32, u32)>,
    /// Number of times the underlying probe ran
    misses: usize,
}

impl<P: DimensionProbe> DimensionCache<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            cache: HashMap::new(),
            misses: 0,
        }
    }

    pub fn lookup(&mut self, url: &str) -> Result<(u32, u32)> {
        if let Some(&dims) = self.cache.get(url) {
            return Ok(dims);
        }
        self.misses += 1;
        let dims = self.probe.probe(url)?;
        if dims.0 == 0 || dims.1 == 0 {
            return Err(anyhow!("image {} has no area", url));
        }
        debug!(url, width = dims.0, height = dims.1, "probed image size");
        self.cache.insert(url.to_string(), dims);
        Ok(dims)
    }

    /// Record dimensions learned elsewhere (library metadata)
    pub fn seed(&mut self, url: &str, dims: (u32, u32)) {
        self.cache.entry(url.to_string()).or_insert(dims);
    }

    /// Pixel size of a library shape, preferring what the library recorded
    pub fn shape_dimensions(&mut self, shape: &LibraryShape) -> Result<(f64, f64), WildshapeError> {
        if let Some(dims) = shape.known_dimensions() {
            self.seed(&shape.url, dims);
            return Ok((dims.0 as f64, dims.1 as f64));
        }
        self.lookup(&shape.url)
            .map(|(w, h)| (w as f64, h as f64))
            .map_err(|source| WildshapeError::DimensionProbe {
                url: shape.url.clone(),
                source,
            })
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
