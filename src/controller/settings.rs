use rand::Rng;

use crate::{
    error::{MazeError, MazeResult},
    generators::Generator,
    solvers::Solver,
};

/// Maze generation algorithm choice, with `Random` picking one per run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GenerationAlgorithm {
    #[default]
    Random,
    Prims,
    Wilsons,
    Backtracker,
}

impl GenerationAlgorithm {
    pub const ALL: [GenerationAlgorithm; 4] = [
        GenerationAlgorithm::Random,
        GenerationAlgorithm::Prims,
        GenerationAlgorithm::Wilsons,
        GenerationAlgorithm::Backtracker,
    ];

    /// The concrete algorithm to run, `Random` resolved uniformly.
    pub fn resolve(self, rng: &mut impl Rng) -> Generator {
        match self {
            GenerationAlgorithm::Random => Generator::ALL[rng.random_range(0..Generator::ALL.len())],
            GenerationAlgorithm::Prims => Generator::Prim,
            GenerationAlgorithm::Wilsons => Generator::Wilson,
            GenerationAlgorithm::Backtracker => Generator::Backtracker,
        }
    }
}

impl std::fmt::Display for GenerationAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationAlgorithm::Random => write!(f, "Random"),
            GenerationAlgorithm::Prims => write!(f, "{}", Generator::Prim),
            GenerationAlgorithm::Wilsons => write!(f, "{}", Generator::Wilson),
            GenerationAlgorithm::Backtracker => write!(f, "{}", Generator::Backtracker),
        }
    }
}

/// Maze solving algorithm choice, with `Random` picking one per run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SolveAlgorithm {
    #[default]
    Random,
    Bfs,
    Tremaux,
}

impl SolveAlgorithm {
    pub const ALL: [SolveAlgorithm; 3] = [
        SolveAlgorithm::Random,
        SolveAlgorithm::Bfs,
        SolveAlgorithm::Tremaux,
    ];

    pub fn resolve(self, rng: &mut impl Rng) -> Solver {
        match self {
            SolveAlgorithm::Random => Solver::ALL[rng.random_range(0..Solver::ALL.len())],
            SolveAlgorithm::Bfs => Solver::Bfs,
            SolveAlgorithm::Tremaux => Solver::Tremaux,
        }
    }
}

impl std::fmt::Display for SolveAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveAlgorithm::Random => write!(f, "Random"),
            SolveAlgorithm::Bfs => write!(f, "{}", Solver::Bfs),
            SolveAlgorithm::Tremaux => write!(f, "{}", Solver::Tremaux),
        }
    }
}

/// Size of the maze and how wide cells are drawn relative to walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub rows: u16,
    pub cols: u16,
    /// Cell width over wall width. 0.5 draws cells half as wide as walls.
    pub cell_wall_ratio: f64,
}

/// Inclusive limits accepted by [`Settings::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimsRange {
    pub min_size: u16,
    pub max_size: u16,
    pub min_ratio: f64,
    pub max_ratio: f64,
}

/// Everything a generate or solve request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rows: u16,
    pub cols: u16,
    pub cell_wall_ratio: f64,
    pub generation_algorithm: GenerationAlgorithm,
    pub animate_generating: bool,
    pub solve_algorithm: SolveAlgorithm,
    pub animate_solving: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rows: 20,
            cols: 20,
            cell_wall_ratio: 1.0,
            generation_algorithm: GenerationAlgorithm::Random,
            animate_generating: true,
            solve_algorithm: SolveAlgorithm::Random,
            animate_solving: true,
        }
    }
}

impl Settings {
    pub const DIMS_RANGE: DimsRange = DimsRange {
        min_size: 3,
        max_size: 800,
        min_ratio: 0.1,
        max_ratio: 5.0,
    };

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            rows: self.rows,
            cols: self.cols,
            cell_wall_ratio: self.cell_wall_ratio,
        }
    }

    /// Checks dimensions against [`Settings::DIMS_RANGE`].
    ///
    /// The controller accepts any dimensions, so this is up to whoever builds the settings.
    pub fn validate(&self) -> MazeResult<()> {
        let range = Settings::DIMS_RANGE;
        for (name, value) in [("rows", self.rows), ("cols", self.cols)] {
            if !(range.min_size..=range.max_size).contains(&value) {
                return Err(MazeError::InvalidSettings(format!(
                    "{name} must be between {} and {}, got {value}",
                    range.min_size, range.max_size
                )));
            }
        }
        if !(range.min_ratio..=range.max_ratio).contains(&self.cell_wall_ratio) {
            return Err(MazeError::InvalidSettings(format!(
                "cell/wall ratio must be between {} and {}, got {}",
                range.min_ratio, range.max_ratio, self.cell_wall_ratio
            )));
        }
        Ok(())
    }
}

/// Knobs of the controller itself, as opposed to per-request [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Seed for every random choice the controller makes. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Frames per second of animated runs.
    pub fps_cap: u32,
    /// Upper bound on generator steps batched into one frame.
    pub max_steps_per_tick: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            seed: None,
            fps_cap: 60,
            max_steps_per_tick: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::get_rng;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.dimensions().rows, 20);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let too_small = Settings {
            rows: 2,
            ..Settings::default()
        };
        assert!(matches!(
            too_small.validate(),
            Err(MazeError::InvalidSettings(msg)) if msg.contains("rows")
        ));
        let too_wide = Settings {
            cols: 801,
            ..Settings::default()
        };
        assert!(too_wide.validate().is_err());
        let bad_ratio = Settings {
            cell_wall_ratio: f64::NAN,
            ..Settings::default()
        };
        assert!(bad_ratio.validate().is_err());
        let edge = Settings {
            rows: 3,
            cols: 800,
            cell_wall_ratio: 5.0,
            ..Settings::default()
        };
        assert_eq!(edge.validate(), Ok(()));
    }

    #[test]
    fn test_random_resolves_to_every_algorithm() {
        let mut rng = get_rng(Some(9));
        let mut generators = Vec::new();
        let mut solvers = Vec::new();
        for _ in 0..200 {
            let generator = GenerationAlgorithm::Random.resolve(&mut rng);
            if !generators.contains(&generator) {
                generators.push(generator);
            }
            let solver = SolveAlgorithm::Random.resolve(&mut rng);
            if !solvers.contains(&solver) {
                solvers.push(solver);
            }
        }
        assert_eq!(generators.len(), Generator::ALL.len());
        assert_eq!(solvers.len(), Solver::ALL.len());
        assert_eq!(GenerationAlgorithm::Wilsons.resolve(&mut rng), Generator::Wilson);
        assert_eq!(SolveAlgorithm::Bfs.resolve(&mut rng), Solver::Bfs);
    }
}
