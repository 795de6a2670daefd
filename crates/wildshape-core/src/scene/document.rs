//! Automerge-backed scene document.
//!
//! Stands in for the host's shared scene when running outside a browser:
//! tokens, their extension metadata and the room library live in one
//! automerge document that is saved to and loaded from disk.
//! Every `SceneStore` write is a single automerge transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use automerge::{transaction::Transactable, Automerge, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};
use tracing::warn;
use uuid::Uuid;
use wildshape_geometry::Vec2;

use super::{keys, SceneStore};
use crate::ids::{ShapeId, TokenId};
use crate::library::{LibraryShape, RawShapeEntry};
use crate::token::{
    Grid, ImageRef, ImageToken, Layer, OriginalSnapshot, OtherToken, Token, TokenExt, TransformState,
    Transformed,
};
use crate::transform::SizingPolicy;

/// Get the default storage path for the scene document
pub fn default_storage_path() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("wildshape").join("scene.automerge")
}

/// Unique identifier for a scene document (for sharing/sync)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct SceneDocument {
    doc: Automerge,
    id: DocumentId,
    storage_path: Option<PathBuf>,
    dirty: bool,
    /// Local selection; never written to the shared document
    selection: Vec<TokenId>,
}

impl SceneDocument {
    /// Create a new empty scene
    pub fn new() -> Result<Self> {
        let id = DocumentId::new();
        let mut doc = Automerge::new();

        let mut tx = doc.transaction();
        tx.put(ROOT, "id", id.0.to_string())?;
        tx.put(ROOT, "next_seq", 0i64)?;
        tx.put_object(ROOT, "tokens", ObjType::Map)?;
        tx.put_object(ROOT, "room", ObjType::Map)?;
        tx.commit();

        Ok(Self::from_automerge(doc, id))
    }

    pub fn from_automerge(doc: Automerge, id: DocumentId) -> Self {
        Self {
            doc,
            id,
            storage_path: None,
            dirty: false,
            selection: Vec::new(),
        }
    }

    /// Load from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let doc = Automerge::load(&bytes).with_context(|| format!("decoding {}", path.display()))?;

        let id = match doc.get(ROOT, "id")? {
            Some((Value::Scalar(s), _)) => match s.as_ref() {
                ScalarValue::Str(text) => Uuid::parse_str(text).unwrap_or_else(|_| Uuid::new_v4()),
                _ => Uuid::new_v4(),
            },
            _ => Uuid::new_v4(),
        };

        let mut scene = Self::from_automerge(doc, DocumentId(id));
        scene.storage_path = Some(path.to_path_buf());
        Ok(scene)
    }

    /// Load `path` if it exists, otherwise start a fresh scene that saves there
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut scene = Self::new()?;
        scene.storage_path = Some(path.to_path_buf());
        Ok(scene)
    }

    /// Save to the storage path, if one is set
    pub fn save(&mut self) -> Result<()> {
        if let Some(path) = self.storage_path.clone() {
            self.write_to(&path)?;
        }
        Ok(())
    }

    /// Save to a specific path and remember it
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        self.storage_path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.doc.save()).with_context(|| format!("writing {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // --- Token reads ---

    fn tokens_map(&self) -> Result<Option<ObjId>> {
        Ok(self.doc.get(ROOT, "tokens")?.map(|(_, obj)| obj))
    }

    /// All tokens with their sequence numbers, in creation order
    fn read_tokens(&self) -> Result<Vec<(i64, Token)>> {
        let Some(tokens_obj) = self.tokens_map()? else {
            return Ok(Vec::new());
        };

        let mut tokens = Vec::new();
        for key in self.doc.keys(&tokens_obj) {
            if let Some((_, token_obj)) = self.doc.get(&tokens_obj, key.as_str())? {
                match read_token(&self.doc, &token_obj, &key) {
                    Ok(Some(token)) => tokens.push((get_i64(&self.doc, &token_obj, "seq")?.unwrap_or(0), token)),
                    Ok(None) => {}
                    Err(err) => warn!(id = %key, %err, "skipping unreadable token"),
                }
            }
        }
        tokens.sort_by_key(|(seq, _)| *seq);
        Ok(tokens)
    }
}

impl SceneStore for SceneDocument {
    fn get_tokens(&self, ids: &[TokenId]) -> Result<Vec<Token>> {
        Ok(self
            .read_tokens()?
            .into_iter()
            .map(|(_, t)| t)
            .filter(|t| ids.contains(t.id()))
            .collect())
    }

    fn all_tokens(&self) -> Result<Vec<Token>> {
        Ok(self.read_tokens()?.into_iter().map(|(_, t)| t).collect())
    }

    fn update_tokens(&mut self, ids: &[TokenId], apply: &mut dyn FnMut(&mut [Token])) -> Result<()> {
        let (seqs, mut batch): (Vec<i64>, Vec<Token>) = self
            .read_tokens()?
            .into_iter()
            .filter(|(_, t)| ids.contains(t.id()))
            .unzip();
        if batch.is_empty() {
            return Ok(());
        }
        let seq_by_id: HashMap<TokenId, i64> = batch.iter().map(|t| t.id().clone()).zip(seqs).collect();

        apply(&mut batch);

        let tokens_obj = self.tokens_map()?.ok_or_else(|| anyhow!("No tokens map in document"))?;
        let mut tx = self.doc.transaction();
        for token in &batch {
            // Tokens whose id changed under the mutator are not ours to write
            let Some(seq) = seq_by_id.get(token.id()) else {
                continue;
            };
            let key = token.id().as_str();
            tx.delete(&tokens_obj, key)?;
            let token_obj = tx.put_object(&tokens_obj, key, ObjType::Map)?;
            tx.put(&token_obj, "seq", *seq)?;
            write_token(&mut tx, &token_obj, token)?;
        }
        tx.commit();

        self.dirty = true;
        Ok(())
    }

    fn create_token(&mut self, token: Token) -> Result<Token> {
        let mut tx = self.doc.transaction();

        let tokens_obj = match tx.get(ROOT, "tokens")? {
            Some((_, obj_id)) => obj_id,
            None => tx.put_object(ROOT, "tokens", ObjType::Map)?,
        };
        if tx.get(&tokens_obj, token.id().as_str())?.is_some() {
            return Err(anyhow!("token {} already exists", token.id()));
        }
        let seq = get_i64(&tx, &ROOT, "next_seq")?.unwrap_or(0);
        tx.put(ROOT, "next_seq", seq + 1)?;

        let token_obj = tx.put_object(&tokens_obj, token.id().as_str(), ObjType::Map)?;
        tx.put(&token_obj, "seq", seq)?;
        write_token(&mut tx, &token_obj, &token)?;
        tx.commit();

        self.dirty = true;
        Ok(token)
    }

    fn delete_tokens(&mut self, ids: &[TokenId]) -> Result<()> {
        let Some(tokens_obj) = self.tokens_map()? else {
            return Ok(());
        };
        let existing: Vec<String> = self.doc.keys(&tokens_obj).collect();

        let mut tx = self.doc.transaction();
        for id in ids {
            if existing.iter().any(|k| k == id.as_str()) {
                tx.delete(&tokens_obj, id.as_str())?;
            }
        }
        tx.commit();

        self.selection.retain(|id| !ids.contains(id));
        self.dirty = true;
        Ok(())
    }

    fn shared_library(&self) -> Result<Vec<RawShapeEntry>> {
        let Some((_, room)) = self.doc.get(ROOT, "room")? else {
            return Ok(Vec::new());
        };
        let Some(json) = get_opt_string(&self.doc, &room, keys::LIBRARY)? else {
            return Ok(Vec::new());
        };

        let values: Vec<serde_json::Value> = serde_json::from_str(&json).context("library is not a JSON array")?;
        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawShapeEntry>(value) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(%err, "ignoring undecodable library entry");
                    None
                }
            })
            .collect())
    }

    fn set_shared_library(&mut self, shapes: &[LibraryShape]) -> Result<()> {
        let json = serde_json::to_string(shapes)?;

        let mut tx = self.doc.transaction();
        let room = match tx.get(ROOT, "room")? {
            Some((_, obj_id)) => obj_id,
            None => tx.put_object(ROOT, "room", ObjType::Map)?,
        };
        tx.put(&room, keys::LIBRARY, json)?;
        tx.commit();

        self.dirty = true;
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

// --- Serialization helpers ---

fn write_token<T: Transactable>(tx: &mut T, obj: &ObjId, token: &Token) -> Result<()> {
    match token {
        Token::Image(t) => {
            tx.put(obj, "kind", "Image")?;
            tx.put(obj, "layer", t.layer.as_str())?;
            tx.put(obj, "x", t.position.x)?;
            tx.put(obj, "y", t.position.y)?;
            tx.put(obj, "rotation", t.rotation)?;
            tx.put(obj, "scale_x", t.scale.x)?;
            tx.put(obj, "scale_y", t.scale.y)?;
            tx.put(obj, "url", t.image.url.as_str())?;
            tx.put(obj, "width", t.image.width)?;
            tx.put(obj, "height", t.image.height)?;
            if let Some(offset) = t.image.offset {
                tx.put(obj, "image_offset_x", offset.x)?;
                tx.put(obj, "image_offset_y", offset.y)?;
            }
            tx.put(obj, "dpi", t.grid.dpi)?;
            tx.put(obj, "grid_offset_x", t.grid.offset.x)?;
            tx.put(obj, "grid_offset_y", t.grid.offset.y)?;
            tx.put(obj, "label", t.label.as_str())?;
            write_ext(tx, obj, &t.ext)?;
        }
        Token::Other(t) => {
            tx.put(obj, "kind", "Other")?;
            tx.put(obj, "layer", t.layer.as_str())?;
            tx.put(obj, "x", t.position.x)?;
            tx.put(obj, "y", t.position.y)?;
            tx.put(obj, "label", t.label.as_str())?;
        }
    }
    Ok(())
}

fn write_ext<T: Transactable>(tx: &mut T, obj: &ObjId, ext: &TokenExt) -> Result<()> {
    if ext.transform.is_none() && ext.summon.is_none() {
        return Ok(());
    }
    let metadata = tx.put_object(obj, "metadata", ObjType::Map)?;
    if let Some(transformed) = &ext.transform {
        tx.put(&metadata, keys::ORIGINAL, rmp_serde::to_vec_named(&transformed.original)?)?;
        tx.put(&metadata, keys::STATE, rmp_serde::to_vec_named(&transformed.state)?)?;
    }
    if let Some(tag) = &ext.summon {
        tx.put(&metadata, keys::SUMMON, rmp_serde::to_vec_named(tag)?)?;
    }
    Ok(())
}

fn read_token<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<Token>> {
    let id = TokenId::from(key);
    let layer = Layer::parse(&get_string(doc, obj, "layer")?);
    let position = Vec2::new(get_f64(doc, obj, "x")?, get_f64(doc, obj, "y")?);
    let label = get_opt_string(doc, obj, "label")?.unwrap_or_default();

    let token = match get_string(doc, obj, "kind")?.as_str() {
        "Image" => {
            let image_offset = match (
                get_opt_f64(doc, obj, "image_offset_x")?,
                get_opt_f64(doc, obj, "image_offset_y")?,
            ) {
                (Some(x), Some(y)) => Some(Vec2::new(x, y)),
                _ => None,
            };
            Token::Image(ImageToken {
                id,
                layer,
                position,
                rotation: get_f64(doc, obj, "rotation")?,
                scale: Vec2::new(get_f64(doc, obj, "scale_x")?, get_f64(doc, obj, "scale_y")?),
                image: ImageRef {
                    url: get_string(doc, obj, "url")?,
                    width: get_f64(doc, obj, "width")?,
                    height: get_f64(doc, obj, "height")?,
                    offset: image_offset,
                },
                grid: Grid {
                    dpi: get_f64(doc, obj, "dpi")?,
                    offset: Vec2::new(get_f64(doc, obj, "grid_offset_x")?, get_f64(doc, obj, "grid_offset_y")?),
                },
                label,
                ext: read_ext(doc, obj, key)?,
            })
        }
        "Other" => Token::Other(OtherToken {
            id,
            layer,
            position,
            label,
        }),
        _ => return Ok(None),
    };

    Ok(Some(token))
}

fn read_ext<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<TokenExt> {
    let Some((_, metadata)) = doc.get(obj, "metadata")? else {
        return Ok(TokenExt::default());
    };

    let original = get_opt_bytes(doc, &metadata, keys::ORIGINAL)?.map(|bytes| {
        rmp_serde::from_slice::<OriginalSnapshot>(&bytes).unwrap_or_else(|err| {
            // An empty snapshot fails validation, so revert skips this token
            warn!(id = key, %err, "original snapshot is corrupt");
            OriginalSnapshot::default()
        })
    });
    let state = get_opt_bytes(doc, &metadata, keys::STATE)?
        .and_then(|bytes| rmp_serde::from_slice::<TransformState>(&bytes).ok());

    let transform = match (original, state) {
        (Some(original), Some(state)) => Some(Transformed { original, state }),
        (Some(original), None) => {
            warn!(id = key, "snapshot without transform state");
            Some(Transformed {
                original,
                state: TransformState {
                    shape_id: ShapeId::from(""),
                    shape_name: String::new(),
                    transformed_at: 0,
                    mode: SizingPolicy::KeepFootprint,
                },
            })
        }
        (None, Some(_)) => {
            warn!(id = key, "dropping transform state without snapshot");
            None
        }
        (None, None) => None,
    };

    let summon = get_opt_bytes(doc, &metadata, keys::SUMMON)?.and_then(|bytes| match rmp_serde::from_slice(&bytes) {
        Ok(tag) => Some(tag),
        Err(err) => {
            warn!(id = key, %err, "summon tag is corrupt");
            None
        }
    });

    Ok(TokenExt { transform, summon })
}

fn scalar<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<ScalarValue>> {
    match doc.get(obj, key)? {
        Some((Value::Scalar(s), _)) => Ok(Some(s.into_owned())),
        _ => Ok(None),
    }
}

fn get_opt_f64<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<f64>> {
    Ok(match scalar(doc, obj, key)? {
        Some(ScalarValue::F64(n)) => Some(n),
        Some(ScalarValue::Int(n)) => Some(n as f64),
        Some(ScalarValue::Uint(n)) => Some(n as f64),
        _ => None,
    })
}

fn get_f64<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<f64> {
    get_opt_f64(doc, obj, key)?.ok_or_else(|| anyhow!("Missing number {}", key))
}

fn get_i64<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<i64>> {
    Ok(match scalar(doc, obj, key)? {
        Some(ScalarValue::Int(n)) => Some(n),
        Some(ScalarValue::Uint(n)) => i64::try_from(n).ok(),
        _ => None,
    })
}

fn get_opt_string<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<String>> {
    Ok(match scalar(doc, obj, key)? {
        Some(ScalarValue::Str(text)) => Some(text.to_string()),
        _ => None,
    })
}

fn get_string<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<String> {
    get_opt_string(doc, obj, key)?.ok_or_else(|| anyhow!("Missing key {}", key))
}

fn get_opt_bytes<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(match scalar(doc, obj, key)? {
        Some(ScalarValue::Bytes(bytes)) => Some(bytes),
        _ => None,
    })
}
