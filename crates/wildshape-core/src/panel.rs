//! The panel controller.
//!
//! One method per user action. Each runs the matching kernel operation and
//! turns the outcome into exactly one notification; failures never escape.

use tracing::{error, warn};
use wildshape_geometry::Vec2;

use crate::error::{Result, WildshapeError};
use crate::ids::{ShapeId, TokenId};
use crate::library::{self, BatchReport, LibraryShape, NewShape};
use crate::notify::{Notifier, Severity};
use crate::prefs::Preferences;
use crate::probe::{DimensionCache, DimensionProbe};
use crate::scene::SceneStore;
use crate::session::{SelectionStatus, Session};
use crate::snapshot::{self, RevertReport};
use crate::summon::{self, Anchor, SummonReport};
use crate::token::Token;
use crate::transform::{self, SizingPolicy, TransformOptions, TransformReport};

pub struct Panel<S, P, N> {
    store: S,
    dimensions: DimensionCache<P>,
    prefs: Preferences,
    session: Session,
    notifier: N,
}

impl<S: SceneStore, P: DimensionProbe, N: Notifier> Panel<S, P, N> {
    pub fn new(store: S, probe: P, notifier: N) -> Self {
        Self {
            store,
            dimensions: DimensionCache::new(probe),
            prefs: Preferences::default(),
            session: Session::default(),
            notifier,
        }
    }

    pub fn with_prefs(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn set_prefs(&mut self, prefs: Preferences) {
        self.prefs = prefs;
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn dimensions(&self) -> &DimensionCache<P> {
        &self.dimensions
    }

    pub fn into_parts(self) -> (S, N) {
        (self.store, self.notifier)
    }

    /// Show `message`, or the error's notification on failure
    fn settle<T>(&mut self, result: Result<T>, message: impl FnOnce(&T) -> Option<(String, Severity)>) -> Option<T> {
        match result {
            Ok(value) => {
                if let Some((text, severity)) = message(&value) {
                    self.notifier.notify(&text, severity);
                }
                Some(value)
            }
            Err(err) => {
                self.fail(&err);
                None
            }
        }
    }

    fn fail(&mut self, err: &WildshapeError) {
        match err {
            WildshapeError::Store(source) => error!(error = ?source, "store operation failed"),
            WildshapeError::DimensionProbe { url, source } => warn!(url = %url, error = %source, "dimension lookup failed"),
            other => warn!(error = %other, "action refused"),
        }
        self.notifier.notify(&err.to_string(), err.severity());
    }

    fn find_shape(&self, id: &ShapeId) -> Result<LibraryShape> {
        let shapes = library::load(&self.store)?;
        library::find(&shapes, id)
            .cloned()
            .ok_or_else(|| WildshapeError::ShapeNotFound(id.to_string()))
    }

    fn selected_ids(&self) -> Result<Vec<TokenId>> {
        Ok(self.store.selection()?)
    }

    /// Normalized library; empty (with an error shown) if it cannot be read
    pub fn library(&mut self) -> Vec<LibraryShape> {
        let result = library::load(&self.store);
        self.settle(result, |_| None).unwrap_or_default()
    }

    /// Classification of the current selection, for enabling actions
    pub fn selection_status(&mut self) -> SelectionStatus {
        let result = self
            .selected_ids()
            .and_then(|ids| Ok(self.store.get_tokens(&ids)?))
            .map(|tokens| SelectionStatus::classify(&tokens));
        self.settle(result, |_| None).unwrap_or(SelectionStatus::Nothing)
    }

    fn policy_for(&self, shape: &LibraryShape) -> SizingPolicy {
        if self.prefs.use_library_size {
            SizingPolicy::ForcedSize(shape.size)
        } else {
            SizingPolicy::KeepFootprint
        }
    }

    /// Transform the selected tokens into `shape`
    pub fn transform_selection(&mut self, shape: &ShapeId) -> Option<TransformReport> {
        match self.selected_ids() {
            Ok(ids) => self.transform(&ids, shape),
            Err(err) => {
                self.fail(&err);
                None
            }
        }
    }

    pub fn transform(&mut self, ids: &[TokenId], shape: &ShapeId) -> Option<TransformReport> {
        let result = self.run_transform(ids, shape);
        self.settle(result, |report| Some(report.notification()))
    }

    fn run_transform(&mut self, ids: &[TokenId], shape: &ShapeId) -> Result<TransformReport> {
        if ids.is_empty() {
            return Err(WildshapeError::NoSelection);
        }
        let shape = self.find_shape(shape)?;
        let policy = self.policy_for(&shape);
        let opts = TransformOptions {
            player_name: self.session.player_name.as_deref(),
            label_indicator: self.prefs.label_indicator,
        };
        transform::apply_shape(&mut self.store, &mut self.dimensions, ids, &shape, policy, opts)
    }

    pub fn revert_selection(&mut self) -> Option<RevertReport> {
        match self.selected_ids() {
            Ok(ids) => self.revert(&ids),
            Err(err) => {
                self.fail(&err);
                None
            }
        }
    }

    pub fn revert(&mut self, ids: &[TokenId]) -> Option<RevertReport> {
        let result = snapshot::restore(&mut self.store, ids);
        self.settle(result, RevertReport::notification)
    }

    /// Summon at the pending map position if there is one, else next to the selection
    pub fn summon_pending(&mut self, shape: &ShapeId) -> Option<SummonReport> {
        let anchor = match self.session.take_pending_summon() {
            Some(position) => Ok(Anchor::At(position)),
            None => self.selected_ids().and_then(|ids| {
                ids.into_iter()
                    .next()
                    .map(Anchor::Adjacent)
                    .ok_or(WildshapeError::SummonerMissing)
            }),
        };
        match anchor {
            Ok(anchor) => self.summon(shape, &anchor),
            Err(err) => {
                self.fail(&err);
                None
            }
        }
    }

    pub fn summon_at(&mut self, shape: &ShapeId, position: Vec2) -> Option<SummonReport> {
        self.summon(shape, &Anchor::At(position))
    }

    pub fn summon_adjacent(&mut self, shape: &ShapeId, summoner: &TokenId) -> Option<SummonReport> {
        self.summon(shape, &Anchor::Adjacent(summoner.clone()))
    }

    fn summon(&mut self, shape: &ShapeId, anchor: &Anchor) -> Option<SummonReport> {
        let result = self
            .find_shape(shape)
            .and_then(|shape| summon::summon(&mut self.store, &mut self.dimensions, &shape, anchor));
        self.settle(result, |report| Some((report.message(), Severity::Info)))
    }

    /// Tokens listed under "active summons"
    pub fn summons(&mut self) -> Vec<Token> {
        let result = summon::summoned(&self.store);
        self.settle(result, |_| None).unwrap_or_default()
    }

    pub fn unsummon(&mut self, id: &TokenId) -> bool {
        let result = summon::unsummon(&mut self.store, id);
        self.settle(result, |removed| removed.then(|| ("Summon dismissed".to_string(), Severity::Info)))
            .unwrap_or(false)
    }

    pub fn unsummon_all(&mut self) -> usize {
        let result = summon::unsummon_all(&mut self.store);
        self.settle(result, |&count| {
            (count > 0).then(|| (format!("Dismissed {} summons", count), Severity::Info))
        })
        .unwrap_or(0)
    }

    /// Save the first selected token's image as a library shape
    pub fn save_selection_to_library(&mut self, name: &str, size: f64, summonable: bool) -> Option<LibraryShape> {
        let result = self.selected_ids().and_then(|ids| {
            let token = ids.into_iter().next().ok_or(WildshapeError::NoImage)?;
            let request = NewShape {
                summonable,
                ..NewShape::new(token, name, size)
            };
            library::save_to_library(&mut self.store, &request)
        });
        self.settle(result, |shape| Some((format!("Added {} to library", shape.name), Severity::Info)))
    }

    pub fn save_batch(&mut self, requests: &[NewShape]) -> Option<BatchReport> {
        let result = library::save_batch(&mut self.store, requests);
        self.settle(result, |report| {
            let severity = if report.skipped > 0 {
                Severity::Warning
            } else {
                Severity::Info
            };
            Some((
                format!("Added {} shapes, skipped {}", report.added, report.skipped),
                severity,
            ))
        })
    }

    pub fn delete_shape(&mut self, id: &ShapeId) -> bool {
        let result = library::delete_shape(&mut self.store, id);
        self.settle(result, |removed| removed.then(|| ("Shape removed from library".to_string(), Severity::Info)))
            .unwrap_or(false)
    }
}
