use std::{collections::BTreeMap, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};
use shakmaty::{Piece, Square};

use crate::{error::DecodeError, grid::IdGrid, oracle::RulesOracle};

/// Binding from tag id to the piece carrying it.
///
/// Serialized as a JSON object from id to FEN piece letter, for example
/// `{"5": "P", "21": "n"}`. Ids absent from the map are unknown; scoring
/// treats them as carrying no type information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<u32, char>", try_from = "BTreeMap<u32, char>")]
pub struct IdMap(BTreeMap<u32, Piece>);

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u32) -> Option<Piece> {
        self.0.get(&id).copied()
    }

    /// Bind `id` unless it is 0 or already bound. Returns whether the
    /// binding was added.
    pub fn insert(&mut self, id: u32, piece: Piece) -> bool {
        if id == 0 || self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, piece);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl From<IdMap> for BTreeMap<u32, char> {
    fn from(map: IdMap) -> Self {
        map.0.into_iter().map(|(id, piece)| (id, piece.char())).collect()
    }
}

impl TryFrom<BTreeMap<u32, char>> for IdMap {
    type Error = String;

    fn try_from(raw: BTreeMap<u32, char>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(id, c)| {
                if id == 0 {
                    return Err("tag id 0 is reserved for \"no tag\"".to_owned());
                }
                Piece::from_char(c)
                    .map(|piece| (id, piece))
                    .ok_or_else(|| format!("'{c}' is not a FEN piece letter (tag id {id})"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(IdMap)
    }
}

/// Bind the tags visible in the first frame to the pieces standing on
/// those squares in `position`, which is taken to be the true starting
/// arrangement. Squares without a tag and tags on empty squares are
/// skipped.
pub fn infer_mapping<P: RulesOracle>(first: &IdGrid, position: &P) -> IdMap {
    let mut map = IdMap::new();
    for sq in Square::ALL {
        let id = first[sq];
        if id == 0 {
            continue;
        }
        let Some(piece) = position.piece_on(sq) else {
            continue;
        };
        if !map.insert(id, piece) {
            warn!("tag {id} seen again on {sq}; keeping its first binding");
        }
    }
    map
}
