//! Transform and revert against an in-memory scene.

use proptest::prelude::*;
use wildshape_core::library::LibraryShape;
use wildshape_core::probe::{DimensionCache, FixedProbe};
use wildshape_core::snapshot::{self, RevertReport};
use wildshape_core::transform::{self, apply_shape, SizingPolicy, TransformOptions};
use wildshape_core::{ImageToken, Layer, MemoryScene, OtherToken, Severity, Token, TokenId, Vec2, WildshapeError};

fn shape(id: &str, url: &str, size: f64, dims: Option<(u32, u32)>) -> LibraryShape {
    LibraryShape {
        id: id.into(),
        name: id.to_uppercase(),
        size,
        url: url.into(),
        img_width: dims.map(|d| d.0),
        img_height: dims.map(|d| d.1),
        summonable: true,
    }
}

fn bear() -> LibraryShape {
    shape("bear", "bear.png", 2.0, Some((400, 300)))
}

fn wolf() -> LibraryShape {
    shape("wolf", "wolf.png", 1.0, Some((100, 100)))
}

fn druid(id: &str) -> ImageToken {
    let mut token = ImageToken::new(id.into(), "druid.png", 150.0, 120.0, 150.0)
        .at(Vec2::new(40.0, 80.0))
        .labelled("Aria");
    token.rotation = 45.0;
    token.scale = Vec2::new(1.5, 1.25);
    token.grid.offset = Vec2::new(70.0, 55.0);
    token
}

fn cache() -> DimensionCache<FixedProbe> {
    DimensionCache::new(FixedProbe::new())
}

fn image(scene: &MemoryScene, id: &TokenId) -> ImageToken {
    scene.token(id).and_then(Token::as_image).cloned().unwrap()
}

fn with_indicator() -> TransformOptions<'static> {
    TransformOptions {
        player_name: None,
        label_indicator: true,
    }
}

#[test]
fn second_transform_keeps_first_snapshot() {
    let mut scene = MemoryScene::new();
    let id = scene.insert(druid("d"));
    let mut dims = cache();

    apply_shape(&mut scene, &mut dims, &[id.clone()], &bear(), SizingPolicy::KeepFootprint, with_indicator()).unwrap();
    let first = image(&scene, &id).original().cloned().unwrap();

    apply_shape(&mut scene, &mut dims, &[id.clone()], &wolf(), SizingPolicy::KeepFootprint, with_indicator()).unwrap();
    let token = image(&scene, &id);
    let transformed = token.ext.transform.unwrap();
    assert_eq!(transformed.original, first);
    assert_eq!(transformed.original.url, "druid.png");
    assert_eq!(transformed.state.shape_id, wolf().id);
    assert_eq!(transformed.state.shape_name, "WOLF");
    assert_eq!(token.image.url, "wolf.png");
}

#[test]
fn transform_then_revert_restores_everything() {
    let mut scene = MemoryScene::new();
    let before = druid("d");
    let id = scene.insert(before.clone());

    let policy = SizingPolicy::ForcedSize(3.0);
    apply_shape(&mut scene, &mut cache(), &[id.clone()], &bear(), policy, with_indicator()).unwrap();
    let changed = image(&scene, &id);
    assert_eq!(changed.label, "🐾 Aria");
    assert_eq!(changed.scale, Vec2::ONE);
    assert_eq!(changed.grid.offset, Vec2::new(200.0, 150.0));

    let report = snapshot::restore(&mut scene, &[id.clone()]).unwrap();
    assert_eq!(report, RevertReport { restored: 1, skipped: 0 });
    assert_eq!(image(&scene, &id), before);
}

#[test]
fn legacy_image_offset_survives_round_trip() {
    let mut scene = MemoryScene::new();
    let mut before = druid("d");
    before.image.offset = Some(Vec2::new(7.0, 9.0));
    let id = scene.insert(before.clone());

    apply_shape(&mut scene, &mut cache(), &[id.clone()], &bear(), SizingPolicy::KeepFootprint, Default::default()).unwrap();
    assert_eq!(image(&scene, &id).image.offset, None);

    snapshot::restore(&mut scene, &[id.clone()]).unwrap();
    assert_eq!(image(&scene, &id), before);
}

#[test]
fn keep_footprint_preserves_cells() {
    let mut scene = MemoryScene::new();
    let id = scene.insert(druid("d"));
    let cells = image(&scene, &id).cells();

    apply_shape(&mut scene, &mut cache(), &[id.clone()], &bear(), SizingPolicy::KeepFootprint, Default::default()).unwrap();
    let token = image(&scene, &id);
    assert_eq!(token.scale, Vec2::new(1.5, 1.25));
    assert!((token.cells() - cells).abs() < 1e-9);
    assert_eq!(token.rotation, 45.0);
    assert_eq!(token.label, "Aria");
}

#[test]
fn whole_selection_is_one_batch() {
    let mut scene = MemoryScene::new();
    let ids: Vec<TokenId> = ["a", "b", "c"].into_iter().map(|id| scene.insert(druid(id))).collect();

    let report = apply_shape(&mut scene, &mut cache(), &ids, &bear(), SizingPolicy::KeepFootprint, Default::default()).unwrap();
    assert_eq!(report.transformed, 3);
    assert_eq!(scene.batches, 1);
    assert_eq!(report.notification(), ("Transformed into BEAR".to_string(), Severity::Info));
}

#[test]
fn non_image_tokens_are_skipped() {
    let mut scene = MemoryScene::new();
    let note = scene.insert(OtherToken {
        id: "note".into(),
        layer: Layer::Other("TEXT".into()),
        position: Vec2::ZERO,
        label: "Trap".into(),
    });

    let err = apply_shape(&mut scene, &mut cache(), &[note.clone()], &bear(), SizingPolicy::KeepFootprint, Default::default())
        .unwrap_err();
    assert!(matches!(err, WildshapeError::NoEligibleTokens));

    let image_id = scene.insert(druid("d"));
    let report = apply_shape(&mut scene, &mut cache(), &[note, image_id], &bear(), SizingPolicy::KeepFootprint, Default::default())
        .unwrap();
    assert_eq!(report.transformed, 1);
}

#[test]
fn empty_selection_is_refused() {
    let mut scene = MemoryScene::new();
    let err = apply_shape(&mut scene, &mut cache(), &[], &bear(), SizingPolicy::KeepFootprint, Default::default()).unwrap_err();
    assert!(matches!(err, WildshapeError::NoSelection));
    assert_eq!(err.severity(), Severity::Warning);
}

#[test]
fn failed_probe_changes_nothing() {
    let mut scene = MemoryScene::new();
    let before = druid("d");
    let id = scene.insert(before.clone());
    let unknown = shape("ghost", "ghost.png", 1.0, None);

    let err = apply_shape(&mut scene, &mut cache(), &[id.clone()], &unknown, SizingPolicy::KeepFootprint, Default::default())
        .unwrap_err();
    assert!(matches!(err, WildshapeError::DimensionProbe { .. }));
    assert_eq!(image(&scene, &id), before);
    assert_eq!(scene.batches, 0);
}

#[test]
fn probed_dimensions_are_used_when_library_lacks_them() {
    let mut scene = MemoryScene::new();
    let id = scene.insert(druid("d"));
    let mut dims = DimensionCache::new(FixedProbe::new().with("owl.png", 80, 60));
    let owl = shape("owl", "owl.png", 1.0, None);

    apply_shape(&mut scene, &mut dims, &[id.clone()], &owl, SizingPolicy::ForcedSize(1.0), Default::default()).unwrap();
    apply_shape(&mut scene, &mut dims, &[id.clone()], &owl, SizingPolicy::ForcedSize(1.0), Default::default()).unwrap();
    let token = image(&scene, &id);
    assert_eq!((token.image.width, token.image.height), (80.0, 60.0));
    assert_eq!(token.grid.dpi, 80.0);
    assert_eq!(dims.misses(), 1);
}

#[test]
fn partial_revert_counts_invalid_snapshots() {
    let mut scene = MemoryScene::new();
    let ids: Vec<TokenId> = ["a", "b", "c"].into_iter().map(|id| scene.insert(druid(id))).collect();
    apply_shape(&mut scene, &mut cache(), &ids, &bear(), SizingPolicy::KeepFootprint, Default::default()).unwrap();

    let broken = scene.token_mut(&ids[1]).and_then(Token::as_image_mut).unwrap();
    if let Some(transformed) = broken.ext.transform.as_mut() {
        transformed.original.grid_dpi = 0.0;
    }

    let report = snapshot::restore(&mut scene, &ids).unwrap();
    assert_eq!(report, RevertReport { restored: 2, skipped: 1 });
    assert_eq!(
        report.notification(),
        Some((
            "Reverted 2, skipped 1 (invalid original data)".to_string(),
            Severity::Warning
        ))
    );
    assert!(!image(&scene, &ids[0]).is_transformed());
    assert!(image(&scene, &ids[1]).is_transformed());
    assert_eq!(image(&scene, &ids[1]).image.url, "bear.png");
}

#[test]
fn revert_of_pristine_token_is_silent() {
    let mut scene = MemoryScene::new();
    let id = scene.insert(druid("d"));
    let report = snapshot::restore(&mut scene, &[id]).unwrap();
    assert_eq!(report.notification(), None);
    assert_eq!(scene.batches, 0);
}

fn footprint_token(width: f64, dpi: f64, scale: f64) -> ImageToken {
    let mut token = ImageToken::new("p".into(), "p.png", width, width, dpi);
    token.scale = Vec2::new(scale, scale);
    token
}

proptest! {
    #[test]
    fn keep_footprint_invariant(
        width in 1.0f64..4000.0,
        dpi in 1.0f64..500.0,
        scale in 0.1f64..5.0,
        new_width in 1.0f64..4000.0,
    ) {
        let mut token = footprint_token(width, dpi, scale);
        let cells = token.cells();
        transform::transform_token(&mut token, &bear(), (new_width, new_width), SizingPolicy::KeepFootprint, Default::default(), 0);
        prop_assert_eq!(token.scale, Vec2::new(scale, scale));
        prop_assert!((token.image.width / token.grid.dpi * token.scale.x - cells).abs() <= cells * 1e-9);
    }

    #[test]
    fn forced_size_is_exact(
        width in 1.0f64..4000.0,
        scale in 0.1f64..5.0,
        cells in 1u32..12,
        new_width in 1.0f64..4000.0,
    ) {
        let mut token = footprint_token(width, 100.0, scale);
        let cells = cells as f64;
        transform::transform_token(&mut token, &bear(), (new_width, new_width), SizingPolicy::ForcedSize(cells), Default::default(), 0);
        prop_assert_eq!(token.scale, Vec2::ONE);
        prop_assert!((token.image.width / token.grid.dpi - cells).abs() <= cells * 1e-9);
    }
}
