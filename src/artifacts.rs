use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use ndarray::{Array2, Array3, Axis, Zip, s};

use crate::grid::{Occupancy, OccupancyGrid};

/// Receiver for per-step debug renderings.
///
/// Errors are reported back to the decoder, which logs and ignores them;
/// a sink can never change the outcome of a run.
pub trait ArtifactSink: Send + Sync {
    fn record_frame(&self, index: usize, grid: &OccupancyGrid) -> io::Result<()>;

    fn record_diff(&self, index: usize, prev: &OccupancyGrid, curr: &OccupancyGrid)
    -> io::Result<()>;
}

const CELL_PX: usize = 100;

/// Writes binary PPM images under `occupancy_maps/` and `diff_heatmaps/`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    occupancy_dir: PathBuf,
    diff_dir: PathBuf,
}

impl DirectorySink {
    pub fn create(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let occupancy_dir = root.join("occupancy_maps");
        let diff_dir = root.join("diff_heatmaps");
        fs::create_dir_all(&occupancy_dir)?;
        fs::create_dir_all(&diff_dir)?;
        Ok(DirectorySink {
            occupancy_dir,
            diff_dir,
        })
    }
}

impl ArtifactSink for DirectorySink {
    fn record_frame(&self, index: usize, grid: &OccupancyGrid) -> io::Result<()> {
        let colors = grid.cells().map(|&cell| match cell {
            Occupancy::Empty => [128, 128, 128],
            Occupancy::Light => [255, 255, 255],
            Occupancy::Dark => [0, 0, 0],
        });
        write_ppm(
            &self.occupancy_dir.join(format!("occupancy_map_{index:04}.ppm")),
            &render(&colors),
        )
    }

    fn record_diff(
        &self,
        index: usize,
        prev: &OccupancyGrid,
        curr: &OccupancyGrid,
    ) -> io::Result<()> {
        // Changed squares in red; the rest dimmed by their current state.
        let colors = Zip::from(prev.cells())
            .and(curr.cells())
            .map_collect(|&p, &c| match (p == c, c) {
                (false, _) => [255, 0, 0],
                (true, Occupancy::Empty) => [64, 64, 64],
                (true, Occupancy::Light) => [200, 200, 200],
                (true, Occupancy::Dark) => [20, 20, 20],
            });
        write_ppm(
            &self.diff_dir.join(format!("diff_heatmap_{index:04}.ppm")),
            &render(&colors),
        )
    }
}

fn render(colors: &Array2<[u8; 3]>) -> Array3<u8> {
    let mut image = Array3::<u8>::zeros((8 * CELL_PX, 8 * CELL_PX, 3));
    for ((row, col), rgb) in colors.indexed_iter() {
        let mut block = image.slice_mut(s![
            row * CELL_PX..(row + 1) * CELL_PX,
            col * CELL_PX..(col + 1) * CELL_PX,
            ..
        ]);
        for (channel, &value) in rgb.iter().enumerate() {
            block.index_axis_mut(Axis(2), channel).fill(value);
        }
    }
    image
}

fn write_ppm(path: &Path, image: &Array3<u8>) -> io::Result<()> {
    let (height, width, _) = image.dim();
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    write!(file, "P6\n{width} {height}\n255\n")?;
    let pixels: Vec<u8> = image.iter().copied().collect();
    file.write_all(&pixels)?;
    file.flush()
}
