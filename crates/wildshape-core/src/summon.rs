//! Summoning library shapes as new tokens, and dismissing them again.

use tracing::{debug, info, warn};
use wildshape_geometry::{adjacent_candidates, first_free, forced_size_dpi, Bounds, Vec2};

use crate::error::{Result, WildshapeError};
use crate::ids::TokenId;
use crate::library::LibraryShape;
use crate::naming::{strip_indicator, unique_name};
use crate::probe::{DimensionCache, DimensionProbe};
use crate::scene::SceneStore;
use crate::token::{ImageToken, Layer, SummonTag, Token};

/// Value of [`SummonTag::created_by`] on tokens we create
pub const CREATED_BY: &str = "wildshape";

/// Where a summoned token goes
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// Exactly this world position (map right-click)
    At(Vec2),
    /// Next to an existing token
    Adjacent(TokenId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummonReport {
    pub token: TokenId,
    pub name: String,
    pub position: Vec2,
}

impl SummonReport {
    pub fn message(&self) -> String {
        format!("Summoned {}", self.name)
    }
}

/// Image tokens on the character layer, other than `except`, as obstacles
fn obstacles(tokens: &[Token], except: &TokenId) -> Vec<Bounds> {
    tokens
        .iter()
        .filter_map(Token::as_image)
        .filter(|t| t.layer == Layer::Character && &t.id != except)
        .map(ImageToken::bounds)
        .collect()
}

/// Create a token for `shape` at `anchor` and select it
pub fn summon<P: DimensionProbe>(
    store: &mut dyn SceneStore,
    dimensions: &mut DimensionCache<P>,
    shape: &LibraryShape,
    anchor: &Anchor,
) -> Result<SummonReport> {
    if !shape.summonable {
        return Err(WildshapeError::NotSummonable(shape.name.clone()));
    }
    let (width, height) = dimensions.shape_dimensions(shape)?;
    let tokens = store.all_tokens()?;

    let (position, summoner) = match anchor {
        Anchor::At(position) => (*position, None),
        Anchor::Adjacent(id) => {
            let summoner = tokens
                .iter()
                .find(|t| t.id() == id)
                .and_then(Token::as_image)
                .ok_or(WildshapeError::SummonerMissing)?;
            let candidates = adjacent_candidates(summoner.position, summoner.grid.dpi);
            let position = first_free(&candidates, width, height, &obstacles(&tokens, id))
                .ok_or(WildshapeError::NoSpaceAdjacent)?;
            (position, Some(summoner))
        }
    };

    let name = unique_name(strip_indicator(&shape.name), tokens.iter().map(Token::label));
    let now = crate::now_ms();

    let mut token = ImageToken::new(TokenId::new(), shape.url.clone(), width, height, forced_size_dpi(width, shape.size))
        .at(position)
        .labelled(name.clone());
    token.ext.summon = Some(SummonTag {
        created_by: CREATED_BY.to_string(),
        summon_id: uuid::Uuid::new_v4().to_string(),
        shape_id: shape.id.clone(),
        summoner_id: summoner.map(|s| s.id.clone()),
        summoner_name: summoner.map(|s| s.label.clone()).filter(|l| !l.is_empty()),
        created_at: now,
    });

    let created = store.create_token(token.into())?;
    let id = created.id().clone();
    if let Err(err) = store.select(std::slice::from_ref(&id)) {
        warn!(%id, error = %err, "could not select summoned token");
    }

    info!(%id, name = %name, %position, "summoned");
    Ok(SummonReport {
        token: id,
        name,
        position,
    })
}

/// Tokens created by summon, in scene order
pub fn summoned(store: &dyn SceneStore) -> Result<Vec<Token>> {
    Ok(store
        .all_tokens()?
        .into_iter()
        .filter(|t| t.summon_tag().is_some())
        .collect())
}

/// Delete one summoned token; anything else is left alone
pub fn unsummon(store: &mut dyn SceneStore, id: &TokenId) -> Result<bool> {
    let tokens = store.get_tokens(std::slice::from_ref(id))?;
    if !tokens.iter().any(|t| t.summon_tag().is_some()) {
        debug!(%id, "not a summoned token");
        return Ok(false);
    }
    store.delete_tokens(std::slice::from_ref(id))?;
    info!(%id, "dismissed summon");
    Ok(true)
}

/// Delete every summoned token in one batch; returns how many went away
pub fn unsummon_all(store: &mut dyn SceneStore) -> Result<usize> {
    let ids: Vec<TokenId> = summoned(store)?.iter().map(|t| t.id().clone()).collect();
    if ids.is_empty() {
        return Ok(0);
    }
    store.delete_tokens(&ids)?;
    info!(count = ids.len(), "dismissed all summons");
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;
    use crate::scene::MemoryScene;

    fn wolf() -> LibraryShape {
        LibraryShape {
            id: "wolf".into(),
            name: "Wolf".into(),
            size: 1.0,
            url: "wolf.png".into(),
            img_width: Some(100),
            img_height: Some(100),
            summonable: true,
        }
    }

    fn cache() -> DimensionCache<FixedProbe> {
        DimensionCache::new(FixedProbe::new())
    }

    #[test]
    fn summon_at_point_creates_tagged_token() {
        let mut scene = MemoryScene::new();
        let report = summon(&mut scene, &mut cache(), &wolf(), &Anchor::At(Vec2::new(5.0, 7.0))).unwrap();
        let token = scene.token(&report.token).unwrap().as_image().unwrap().clone();
        assert_eq!(token.position, Vec2::new(5.0, 7.0));
        assert_eq!(token.grid.dpi, 100.0);
        assert_eq!(token.grid.offset, Vec2::new(50.0, 50.0));
        assert_eq!(token.label, "Wolf");
        let tag = token.ext.summon.unwrap();
        assert_eq!(tag.created_by, CREATED_BY);
        assert_eq!(tag.summoner_id, None);
        assert_eq!(scene.selection().unwrap(), vec![report.token]);
    }

    #[test]
    fn unsummonable_shape_is_refused() {
        let mut scene = MemoryScene::new();
        let shape = LibraryShape { summonable: false, ..wolf() };
        let err = summon(&mut scene, &mut cache(), &shape, &Anchor::At(Vec2::ZERO)).unwrap_err();
        assert!(matches!(err, WildshapeError::NotSummonable(_)));
        assert!(scene.is_empty());
    }

    #[test]
    fn adjacent_needs_an_image_summoner() {
        let mut scene = MemoryScene::new();
        let err = summon(&mut scene, &mut cache(), &wolf(), &Anchor::Adjacent("nobody".into())).unwrap_err();
        assert!(matches!(err, WildshapeError::SummonerMissing));
    }

    #[test]
    fn summoner_is_not_an_obstacle() {
        let mut scene = MemoryScene::new();
        let druid = scene.insert(ImageToken::new("druid".into(), "d.png", 300.0, 300.0, 100.0).labelled("Aria"));
        let report = summon(&mut scene, &mut cache(), &wolf(), &Anchor::Adjacent(druid.clone())).unwrap();
        assert_eq!(report.position, Vec2::new(100.0, 0.0));
        let tag = scene.token(&report.token).unwrap().summon_tag().unwrap().clone();
        assert_eq!(tag.summoner_id, Some(druid));
        assert_eq!(tag.summoner_name.as_deref(), Some("Aria"));
    }

    #[test]
    fn unsummon_ignores_untagged_tokens() {
        let mut scene = MemoryScene::new();
        let plain = scene.insert(ImageToken::new("p".into(), "p.png", 10.0, 10.0, 10.0));
        assert!(!unsummon(&mut scene, &plain).unwrap());
        assert!(!unsummon(&mut scene, &"missing".into()).unwrap());
        assert_eq!(scene.len(), 1);
        assert_eq!(unsummon_all(&mut scene).unwrap(), 0);
        assert_eq!(scene.batches, 0);
    }
}
