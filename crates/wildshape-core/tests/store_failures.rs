//! Behaviour when the host scene rejects calls

use anyhow::{bail, Result};
use wildshape_core::library::{LibraryShape, RawShapeEntry};
use wildshape_core::probe::{DimensionCache, FixedProbe};
use wildshape_core::summon::{self, Anchor};
use wildshape_core::{
    ImageToken, MemoryScene, Panel, RecordingNotifier, SceneStore, Severity, Token, TokenId, Vec2, WildshapeError,
};

/// Delegates to a `MemoryScene` but can be told to reject some calls
#[derive(Default)]
struct FlakyScene {
    inner: MemoryScene,
    fail_select: bool,
    fail_writes: bool,
}

impl SceneStore for FlakyScene {
    fn get_tokens(&self, ids: &[TokenId]) -> Result<Vec<Token>> {
        self.inner.get_tokens(ids)
    }

    fn all_tokens(&self) -> Result<Vec<Token>> {
        self.inner.all_tokens()
    }

    fn update_tokens(&mut self, ids: &[TokenId], apply: &mut dyn FnMut(&mut [Token])) -> Result<()> {
        if self.fail_writes {
            bail!("scene is read-only");
        }
        self.inner.update_tokens(ids, apply)
    }

    fn create_token(&mut self, token: Token) -> Result<Token> {
        if self.fail_writes {
            bail!("scene is read-only");
        }
        self.inner.create_token(token)
    }

    fn delete_tokens(&mut self, ids: &[TokenId]) -> Result<()> {
        if self.fail_writes {
            bail!("scene is read-only");
        }
        self.inner.delete_tokens(ids)
    }

    fn shared_library(&self) -> Result<Vec<RawShapeEntry>> {
        self.inner.shared_library()
    }

    fn set_shared_library(&mut self, shapes: &[LibraryShape]) -> Result<()> {
        if self.fail_writes {
            bail!("scene is read-only");
        }
        self.inner.set_shared_library(shapes)
    }

    fn selection(&self) -> Result<Vec<TokenId>> {
        self.inner.selection()
    }

    fn select(&mut self, ids: &[TokenId]) -> Result<()> {
        if self.fail_select {
            bail!("selection belongs to another client");
        }
        self.inner.select(ids)
    }
}

fn wolf(dims: Option<(u32, u32)>) -> LibraryShape {
    LibraryShape {
        id: "wolf".into(),
        name: "Wolf".into(),
        size: 1.0,
        url: "wolf.png".into(),
        img_width: dims.map(|d| d.0),
        img_height: dims.map(|d| d.1),
        summonable: true,
    }
}

fn cache() -> DimensionCache<FixedProbe> {
    DimensionCache::new(FixedProbe::new())
}

#[test]
fn summon_survives_a_rejected_selection() {
    let mut scene = FlakyScene {
        fail_select: true,
        ..Default::default()
    };
    let report = summon::summon(&mut scene, &mut cache(), &wolf(Some((50, 50))), &Anchor::At(Vec2::new(5.0, 5.0))).unwrap();

    assert_eq!(report.name, "Wolf");
    assert!(scene.inner.token(&report.token).is_some());
    assert!(scene.selection().unwrap().is_empty());
}

#[test]
fn unreadable_shape_size_creates_nothing() {
    let mut scene = MemoryScene::new();
    let err = summon::summon(&mut scene, &mut cache(), &wolf(None), &Anchor::At(Vec2::ZERO)).unwrap_err();

    assert!(matches!(err, WildshapeError::DimensionProbe { ref url, .. } if url == "wolf.png"));
    assert!(scene.is_empty());
    assert_eq!(scene.batches, 0);
    assert!(scene.selection().unwrap().is_empty());
}

#[test]
fn panel_reports_unreadable_size_on_summon() {
    let mut scene = MemoryScene::new();
    scene.set_shared_library(&[wolf(None)]).unwrap();
    let mut panel = Panel::new(scene, FixedProbe::new(), RecordingNotifier::new());

    assert!(panel.summon_at(&"wolf".into(), Vec2::ZERO).is_none());
    let last = panel.notifier().last().unwrap();
    assert_eq!(last.message, "Could not read image size for wolf.png.");
    assert_eq!(last.severity, Severity::Error);
    assert!(panel.store().is_empty());
}

#[test]
fn panel_shows_generic_message_for_store_failures() {
    let mut scene = FlakyScene::default();
    scene.inner.set_shared_library(&[wolf(Some((50, 50)))]).unwrap();
    let id = scene.inner.insert(ImageToken::new("druid".into(), "druid.png", 100.0, 100.0, 100.0));
    let before = scene.inner.token(&id).cloned();
    scene.fail_writes = true;
    let mut panel = Panel::new(scene, FixedProbe::new(), RecordingNotifier::new());

    assert!(panel.transform(&[id.clone()], &"wolf".into()).is_none());
    assert_eq!(panel.notifier().seen.len(), 1);
    let last = panel.notifier().last().unwrap();
    assert_eq!(last.message, "Operation failed.");
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(panel.store().inner.token(&id).cloned(), before);

    assert!(panel.summon_at(&"wolf".into(), Vec2::ZERO).is_none());
    assert_eq!(panel.notifier().last().unwrap().message, "Operation failed.");
    assert_eq!(panel.store().inner.len(), 1);
}
