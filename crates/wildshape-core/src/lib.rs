//! Core of the wildshape tabletop panel.
//!
//! Tokens are turned into library shapes and back, and shapes are summoned
//! as new tokens. All scene access goes through [`scene::SceneStore`];
//! [`panel::Panel`] wires the operations to user notifications.

pub mod error;
pub mod ids;
pub mod library;
pub mod naming;
pub mod notify;
pub mod panel;
pub mod prefs;
pub mod probe;
pub mod scene;
pub mod session;
pub mod snapshot;
pub mod summon;
pub mod token;
pub mod transform;

pub use error::{Result, WildshapeError};
pub use ids::{ShapeId, TokenId};
pub use library::{LibraryShape, NewShape, RawShapeEntry};
pub use notify::{Notification, Notifier, RecordingNotifier, Severity};
pub use panel::Panel;
pub use prefs::Preferences;
pub use probe::{DimensionCache, DimensionProbe, FixedProbe, ImageFileProbe};
pub use scene::{MemoryScene, SceneDocument, SceneStore};
pub use session::{Role, SelectionStatus, Session, Tab};
pub use summon::Anchor;
pub use token::{ImageToken, Layer, OtherToken, Token};
pub use transform::SizingPolicy;
pub use wildshape_geometry::Vec2;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
