use anyhow::{bail, Result};

use super::SceneStore;
use crate::ids::TokenId;
use crate::library::{LibraryShape, RawShapeEntry};
use crate::token::Token;

/// Ordered in-memory scene, for tests and embedders without a real host
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    tokens: Vec<Token>,
    library: Vec<RawShapeEntry>,
    selection: Vec<TokenId>,
    /// Number of committed token batches (updates, creates, deletes)
    pub batches: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token directly, bypassing batch accounting
    pub fn insert(&mut self, token: impl Into<Token>) -> TokenId {
        let token = token.into();
        let id = token.id().clone();
        self.tokens.push(token);
        id
    }

    /// Replace the raw library, malformed entries included
    pub fn set_raw_library(&mut self, raw: Vec<RawShapeEntry>) {
        self.library = raw;
    }

    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id() == id)
    }

    pub fn token_mut(&mut self, id: &TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl SceneStore for MemoryScene {
    fn get_tokens(&self, ids: &[TokenId]) -> Result<Vec<Token>> {
        Ok(self
            .tokens
            .iter()
            .filter(|t| ids.contains(t.id()))
            .cloned()
            .collect())
    }

    fn all_tokens(&self) -> Result<Vec<Token>> {
        Ok(self.tokens.clone())
    }

    fn update_tokens(&mut self, ids: &[TokenId], apply: &mut dyn FnMut(&mut [Token])) -> Result<()> {
        let mut batch = self.get_tokens(ids)?;
        apply(&mut batch);
        for updated in batch {
            if let Some(slot) = self.tokens.iter_mut().find(|t| t.id() == updated.id()) {
                *slot = updated;
            }
        }
        self.batches += 1;
        Ok(())
    }

    fn create_token(&mut self, token: Token) -> Result<Token> {
        if self.token(token.id()).is_some() {
            bail!("token {} already exists", token.id());
        }
        self.tokens.push(token.clone());
        self.batches += 1;
        Ok(token)
    }

    fn delete_tokens(&mut self, ids: &[TokenId]) -> Result<()> {
        self.tokens.retain(|t| !ids.contains(t.id()));
        self.selection.retain(|id| !ids.contains(id));
        self.batches += 1;
        Ok(())
    }

    fn shared_library(&self) -> Result<Vec<RawShapeEntry>> {
        Ok(self.library.clone())
    }

    fn set_shared_library(&mut self, shapes: &[LibraryShape]) -> Result<()> {
        self.library = shapes.iter().map(LibraryShape::to_raw).collect();
        Ok(())
    }

    fn selection(&self) -> Result<Vec<TokenId>> {
        Ok(self.selection.clone())
    }

    fn select(&mut self, ids: &[TokenId]) -> Result<()> {
        self.selection = ids.to_vec();
        Ok(())
    }
}
