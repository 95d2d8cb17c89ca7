use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Generation strategy that places every mine on a uniformly random free cell.
#[derive(Clone, Debug)]
pub struct RandomFieldGenerator<R = SmallRng> {
    rng: R,
}

impl RandomFieldGenerator<SmallRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomFieldGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> FieldGenerator for RandomFieldGenerator<R> {
    fn generate(mut self, config: GameConfig) -> Result<HintField> {
        generate_field(config, &mut self.rng)
    }
}

/// Places `config.mines` mines with `rng` and computes the hints around them.
pub fn generate_field<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Result<HintField> {
    // configs can arrive deserialized, so check again before looping on them
    let config = GameConfig::new(config.size, config.mines)?;
    log::debug!(
        "Generating {}x{} field with {} mines",
        config.width(),
        config.height(),
        config.mines
    );
    HintField::from_mine_mask(place_mines(config, rng))
}

/// Rejection sampling: a draw landing on an existing mine is simply drawn again, so the
/// mask ends up with exactly `config.mines` distinct mines.
fn place_mines<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Array2<bool> {
    let total_cells = usize::from(config.total_cells());
    let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
    let mut mines_placed: CellCount = 0;
    let mut draws: u32 = 0;

    while mines_placed < config.mines {
        let index = rng.random_range(0..total_cells);
        draws += 1;
        let Some(coords) = coords_of(index, config.size) else {
            continue;
        };
        let cell = &mut mine_mask[coords.to_nd_index()];
        if !*cell {
            *cell = true;
            mines_placed += 1;
        }
    }

    log::trace!("Placed {} mines in {} draws", mines_placed, draws);
    mine_mask
}
