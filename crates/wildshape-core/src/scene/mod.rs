//! The host scene as the kernel sees it.
//!
//! [`SceneStore`] is the whole contract with the tabletop: token reads,
//! batched token writes, the room library and the local selection. The
//! host is responsible for making each call atomic with respect to other
//! clients; nothing here retries or locks.

pub mod document;
pub mod memory;

pub use document::{default_storage_path, SceneDocument};
pub use memory::MemoryScene;

use anyhow::Result;

use crate::ids::TokenId;
use crate::library::{LibraryShape, RawShapeEntry};
use crate::token::Token;

/// Fixed metadata keys under which stores persist our data
pub mod keys {
    pub const LIBRARY: &str = "com.wildshape/library";
    pub const ORIGINAL: &str = "com.wildshape/original";
    pub const STATE: &str = "com.wildshape/state";
    pub const SUMMON: &str = "com.wildshape/summon";
}

pub trait SceneStore {
    /// Tokens for `ids`, in scene order; unknown ids are ignored
    fn get_tokens(&self, ids: &[TokenId]) -> Result<Vec<Token>>;

    /// Every token in the scene
    fn all_tokens(&self) -> Result<Vec<Token>>;

    /// Apply `apply` to the live records for `ids` and commit them as one batch
    fn update_tokens(&mut self, ids: &[TokenId], apply: &mut dyn FnMut(&mut [Token])) -> Result<()>;

    fn create_token(&mut self, token: Token) -> Result<Token>;

    fn delete_tokens(&mut self, ids: &[TokenId]) -> Result<()>;

    /// Raw library entries from room storage
    fn shared_library(&self) -> Result<Vec<RawShapeEntry>>;

    fn set_shared_library(&mut self, shapes: &[LibraryShape]) -> Result<()>;

    fn selection(&self) -> Result<Vec<TokenId>>;

    fn select(&mut self, ids: &[TokenId]) -> Result<()>;
}
