use std::ops::{Index, IndexMut};

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use shakmaty::{File, Rank, Square};

use crate::error::DecodeError;

/// Classification of a single square in an occupancy observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Occupancy {
    #[default]
    Empty = 0,
    /// A light (white) piece.
    Light = 1,
    /// A dark (black) piece.
    Dark = 2,
}

impl Occupancy {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Occupancy::Empty),
            1 => Some(Occupancy::Light),
            2 => Some(Occupancy::Dark),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// True when both sides see a piece but disagree on its colour.
    pub fn is_color_confusion(self, other: Occupancy) -> bool {
        matches!(
            (self, other),
            (Occupancy::Light, Occupancy::Dark) | (Occupancy::Dark, Occupancy::Light)
        )
    }
}

/// Which scorer a run uses. Chosen once per run from the observation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    Occupancy,
    Tags,
}

/// Grid cell `[row, col]` for a square. Row 0 is rank 8, col 0 is file a.
pub fn cell_of(sq: Square) -> [usize; 2] {
    [7 - sq.rank() as usize, sq.file() as usize]
}

/// Inverse of [`cell_of`]. `row` and `col` must be below 8.
pub fn square_at(row: usize, col: usize) -> Square {
    Square::from_coords(File::new(col as u32), Rank::new((7 - row) as u32))
}

/// 8x8 empty/light/dark observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid(Array2<Occupancy>);

impl OccupancyGrid {
    pub fn empty() -> Self {
        OccupancyGrid(Array2::from_elem((8, 8), Occupancy::Empty))
    }

    /// Validate raw cell codes taken from frame number `frame`.
    pub fn from_codes(frame: usize, rows: &[Vec<i64>]) -> Result<Self, DecodeError> {
        let codes = rows_to_array(frame, rows)?;
        let mut grid = Self::empty();
        for ((row, col), &code) in codes.indexed_iter() {
            grid.0[[row, col]] = Occupancy::from_code(code).ok_or_else(|| {
                DecodeError::malformed(
                    frame,
                    format!("occupancy value {code} at {} is not 0, 1 or 2", square_at(row, col)),
                )
            })?;
        }
        Ok(grid)
    }

    pub fn cells(&self) -> &Array2<Occupancy> {
        &self.0
    }
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<Square> for OccupancyGrid {
    type Output = Occupancy;

    fn index(&self, sq: Square) -> &Occupancy {
        &self.0[cell_of(sq)]
    }
}

impl IndexMut<Square> for OccupancyGrid {
    fn index_mut(&mut self, sq: Square) -> &mut Occupancy {
        &mut self.0[cell_of(sq)]
    }
}

/// 8x8 grid of tag identifiers. 0 means no tag was seen on the square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGrid(Array2<u32>);

impl IdGrid {
    pub fn empty() -> Self {
        IdGrid(Array2::zeros((8, 8)))
    }

    pub fn from_codes(frame: usize, rows: &[Vec<i64>]) -> Result<Self, DecodeError> {
        let codes = rows_to_array(frame, rows)?;
        let mut grid = Self::empty();
        for ((row, col), &code) in codes.indexed_iter() {
            grid.0[[row, col]] = u32::try_from(code).map_err(|_| {
                DecodeError::malformed(
                    frame,
                    format!("tag id {code} at {} is not a non-negative 32-bit integer", square_at(row, col)),
                )
            })?;
        }
        Ok(grid)
    }

    pub fn cells(&self) -> &Array2<u32> {
        &self.0
    }
}

impl Default for IdGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<Square> for IdGrid {
    type Output = u32;

    fn index(&self, sq: Square) -> &u32 {
        &self.0[cell_of(sq)]
    }
}

impl IndexMut<Square> for IdGrid {
    fn index_mut(&mut self, sq: Square) -> &mut u32 {
        &mut self.0[cell_of(sq)]
    }
}

/// Mask of cells whose value differs between two grids.
pub fn changed_squares(prev: &OccupancyGrid, curr: &OccupancyGrid) -> Array2<bool> {
    Zip::from(&prev.0).and(&curr.0).map_collect(|a, b| a != b)
}

fn rows_to_array(frame: usize, rows: &[Vec<i64>]) -> Result<Array2<i64>, DecodeError> {
    if rows.len() != 8 {
        return Err(DecodeError::malformed(
            frame,
            format!("expected 8 rows, found {}", rows.len()),
        ));
    }
    if let Some((row, cols)) = rows.iter().enumerate().find(|(_, r)| r.len() != 8) {
        return Err(DecodeError::malformed(
            frame,
            format!("row {row} has {} columns, expected 8", cols.len()),
        ));
    }
    let flat: Vec<i64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((8, 8), flat).map_err(|e| DecodeError::malformed(frame, e.to_string()))
}

/// One frame as produced by the upstream recognizer. Exactly one of the
/// two grids must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<Vec<Vec<i64>>>,
    #[serde(default, alias = "board_ids", skip_serializing_if = "Option::is_none")]
    pub piece_ids: Option<Vec<Vec<i64>>>,
}

/// The validated observation sequence for a run. The sum type keeps a
/// run from mixing occupancy and tag frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observations {
    Occupancy(Vec<OccupancyGrid>),
    Tags(Vec<IdGrid>),
}

impl Observations {
    pub fn from_frames(frames: &[RawFrame]) -> Result<Self, DecodeError> {
        let Some(first) = frames.first() else {
            return Err(DecodeError::InsufficientData { frames: 0 });
        };
        let (mode, _) = frame_grid(0, first)?;

        let mut occupancy = Vec::new();
        let mut tags = Vec::new();
        for (i, frame) in frames.iter().enumerate() {
            match frame_grid(i, frame)? {
                (m, _) if m != mode => return Err(DecodeError::MixedModes { frame: i }),
                (DecodeMode::Occupancy, rows) => occupancy.push(OccupancyGrid::from_codes(i, rows)?),
                (DecodeMode::Tags, rows) => tags.push(IdGrid::from_codes(i, rows)?),
            }
        }

        Ok(match mode {
            DecodeMode::Occupancy => Observations::Occupancy(occupancy),
            DecodeMode::Tags => Observations::Tags(tags),
        })
    }

    /// Parse a JSON array of [`RawFrame`] records. A record that does not
    /// fit the frame shape is reported with its index.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let frames = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                serde_json::from_value::<RawFrame>(record)
                    .map_err(|e| DecodeError::malformed(i, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_frames(&frames)
    }

    pub fn mode(&self) -> DecodeMode {
        match self {
            Observations::Occupancy(_) => DecodeMode::Occupancy,
            Observations::Tags(_) => DecodeMode::Tags,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Observations::Occupancy(grids) => grids.len(),
            Observations::Tags(grids) => grids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single grid a frame carries, with its kind.
fn frame_grid(index: usize, frame: &RawFrame) -> Result<(DecodeMode, &[Vec<i64>]), DecodeError> {
    match (&frame.occupancy, &frame.piece_ids) {
        (Some(rows), None) => Ok((DecodeMode::Occupancy, rows)),
        (None, Some(rows)) => Ok((DecodeMode::Tags, rows)),
        (Some(_), Some(_)) => Err(DecodeError::malformed(
            index,
            "frame carries both an occupancy grid and an id grid",
        )),
        (None, None) => Err(DecodeError::malformed(index, "frame carries no grid")),
    }
}
