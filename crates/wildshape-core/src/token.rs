//! Token records as seen by the kernel.
//!
//! The host owns tokens; we only read them and write fields back. A token
//! is either an image token (carries image + grid data and can be
//! transformed, reverted and summoned) or anything else.

use serde::{Deserialize, Serialize};
use wildshape_geometry::{cell_count, centered_offset, Bounds, Vec2};

use crate::ids::{ShapeId, TokenId};
use crate::transform::SizingPolicy;

/// Scene layer a token lives on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layer {
    Map,
    Prop,
    Mount,
    #[default]
    Character,
    Other(String),
}

impl Layer {
    pub fn as_str(&self) -> &str {
        match self {
            Layer::Map => "MAP",
            Layer::Prop => "PROP",
            Layer::Mount => "MOUNT",
            Layer::Character => "CHARACTER",
            Layer::Other(name) => name.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "MAP" => Layer::Map,
            "PROP" => Layer::Prop,
            "MOUNT" => Layer::Mount,
            "CHARACTER" => Layer::Character,
            _ => Layer::Other(s.to_string()),
        }
    }
}

/// The image currently shown by a token
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub url: String,
    pub width: f64,
    pub height: f64,
    /// Legacy per-image pixel offset, superseded by the grid offset
    pub offset: Option<Vec2>,
}

/// How the image maps onto the scene grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Image pixels per grid cell
    pub dpi: f64,
    /// Anchor point inside the image, in image pixels
    pub offset: Vec2,
}

/// Pre-transform copy of a token's look.
///
/// Every field defaults so that partially corrupted metadata still decodes;
/// [`crate::snapshot::validate`] decides whether it is usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginalSnapshot {
    pub url: String,
    pub width: f64,
    pub height: f64,
    pub grid_dpi: f64,
    pub grid_offset: Option<Vec2>,
    /// Legacy image offset, cleared by transform
    pub image_offset: Option<Vec2>,
    pub scale: Option<Vec2>,
    pub rotation: f64,
    pub label: String,
    pub captured_at: u64,
}

/// Which library shape is applied and how it was sized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub shape_id: ShapeId,
    pub shape_name: String,
    pub transformed_at: u64,
    pub mode: SizingPolicy,
}

/// Snapshot and state travel together: one exists iff the other does
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub original: OriginalSnapshot,
    pub state: TransformState,
}

/// Marks a token created by summon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonTag {
    pub created_by: String,
    pub summon_id: String,
    pub shape_id: ShapeId,
    pub summoner_id: Option<TokenId>,
    pub summoner_name: Option<String>,
    pub created_at: u64,
}

/// Extension data this crate attaches to tokens
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenExt {
    pub transform: Option<Transformed>,
    pub summon: Option<SummonTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageToken {
    pub id: TokenId,
    pub layer: Layer,
    pub position: Vec2,
    pub rotation: f64,
    pub scale: Vec2,
    pub image: ImageRef,
    pub grid: Grid,
    /// Empty when the token has no label
    pub label: String,
    pub ext: TokenExt,
}

impl ImageToken {
    /// Character-layer token showing `url`, one cell wide at `dpi`
    pub fn new(id: TokenId, url: impl Into<String>, width: f64, height: f64, dpi: f64) -> Self {
        Self {
            id,
            layer: Layer::Character,
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            image: ImageRef {
                url: url.into(),
                width,
                height,
                offset: None,
            },
            grid: Grid {
                dpi,
                offset: centered_offset(width, height),
            },
            label: String::new(),
            ext: TokenExt::default(),
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn on_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Cells currently occupied horizontally
    pub fn cells(&self) -> f64 {
        cell_count(self.image.width, self.grid.dpi, self.scale.x)
    }

    /// Pixel footprint centred on the token position
    pub fn bounds(&self) -> Bounds {
        Bounds::centered(
            self.position,
            self.image.width * self.scale.x,
            self.image.height * self.scale.y,
        )
    }

    pub fn is_transformed(&self) -> bool {
        self.ext.transform.is_some()
    }

    pub fn original(&self) -> Option<&OriginalSnapshot> {
        self.ext.transform.as_ref().map(|t| &t.original)
    }
}

/// A token without image data (shapes, text, drawings)
#[derive(Debug, Clone, PartialEq)]
pub struct OtherToken {
    pub id: TokenId,
    pub layer: Layer,
    pub position: Vec2,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Image(ImageToken),
    Other(OtherToken),
}

impl Token {
    pub fn id(&self) -> &TokenId {
        match self {
            Token::Image(t) => &t.id,
            Token::Other(t) => &t.id,
        }
    }

    pub fn layer(&self) -> &Layer {
        match self {
            Token::Image(t) => &t.layer,
            Token::Other(t) => &t.layer,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Token::Image(t) => &t.label,
            Token::Other(t) => &t.label,
        }
    }

    pub fn as_image(&self) -> Option<&ImageToken> {
        match self {
            Token::Image(t) => Some(t),
            Token::Other(_) => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageToken> {
        match self {
            Token::Image(t) => Some(t),
            Token::Other(_) => None,
        }
    }

    pub fn is_transformed(&self) -> bool {
        self.as_image().is_some_and(ImageToken::is_transformed)
    }

    pub fn summon_tag(&self) -> Option<&SummonTag> {
        self.as_image().and_then(|t| t.ext.summon.as_ref())
    }
}

impl From<ImageToken> for Token {
    fn from(t: ImageToken) -> Self {
        Token::Image(t)
    }
}

impl From<OtherToken> for Token {
    fn from(t: OtherToken) -> Self {
        Token::Other(t)
    }
}
