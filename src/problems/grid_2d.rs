//! A 4-connected unit-cost grid environment.
//!
//! The simplest world the engine can plan in, used by the tests and benches.
//! States pick up a time coordinate (`dt` per step) so the horizon cap is
//! exercisable, and edges can be blocked individually to drive incremental
//! replans.

use derive_more::Display;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::env::Action;
use crate::env::Coord;
use crate::env::Environment;
use crate::env::Key;
use crate::env::Successors;
use crate::float_cost::FloatCost;

const UNIT_COST: f64 = 1.0;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("({x},{y})")]
pub struct GridKey {
    pub x: u32,
    pub y: u32,
}

impl GridKey {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}
impl Key for GridKey {}

/// A cell plus the time it was reached at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
    pub t: f64,
}

impl GridCoord {
    #[must_use]
    pub fn key(&self) -> GridKey {
        GridKey::new(self.x, self.y)
    }
}
impl Coord for GridCoord {
    fn t(&self) -> f64 {
        self.t
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridAction {
    #[display("↑")]
    Up, // y--
    #[display("↓")]
    Down, // y++
    #[display("←")]
    Left, // x--
    #[display("→")]
    Right, // x++
}
impl Action for GridAction {}

impl GridAction {
    const ALL: [GridAction; 4] = [
        GridAction::Up,
        GridAction::Down,
        GridAction::Left,
        GridAction::Right,
    ];

    /// The cell one step in this direction, unless it walks off the edge of
    /// the coordinate space.
    #[inline(always)]
    #[must_use]
    pub fn apply(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        #[rustfmt::skip]
        let moved = match self {
            GridAction::Up    => (Some(x), y.checked_sub(1)),
            GridAction::Down  => (Some(x), y.checked_add(1)),
            GridAction::Left  => (x.checked_sub(1), Some(y)),
            GridAction::Right => (x.checked_add(1), Some(y)),
        };
        match moved {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridCell {
    #[display("░")]
    Empty,
    #[display("█")]
    Wall,
}

#[derive(Debug, Error)]
pub enum GridParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
    #[error("Row {0} has a different width than row 0.")]
    RaggedRow(usize),
    #[error("The map has no cells.")]
    EmptyMap,
}

impl std::convert::TryFrom<char> for GridCell {
    type Error = GridParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            ' ' | '.' => Ok(GridCell::Empty),
            '#' | '█' => Ok(GridCell::Wall),
            ch => Err(GridParseError::InvalidCharacter(ch)),
        }
    }
}

/// The motion primitive of a grid world: one step out of a cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridMotion {
    pub from: GridCoord,
    pub action: GridAction,
    pub dt: f64,
}

impl std::fmt::Display for GridMotion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{}){}", self.from.x, self.from.y, self.action)
    }
}

/// A 4-connected grid of empty and wall cells with one goal cell.
///
/// Edges into walls are reported blocked (+∞) rather than omitted, and
/// individual directed edges can be blocked on top of that; both are what
/// the incremental replanning scenarios poke at.
#[derive(Clone)]
pub struct Grid2D {
    cells: Vec<Vec<GridCell>>,
    goal: GridKey,
    dt: f64,
    blocked_edges: FxHashSet<(GridKey, GridKey)>,
}

impl Grid2D {
    /// Parses an ASCII map: `'.'`/`' '` empty, `'#'` wall, one row per line.
    pub fn from_ascii(map: &str, goal: GridKey) -> Result<Self, GridParseError> {
        let mut cells: Vec<Vec<GridCell>> = vec![];
        for (y, line) in map.lines().enumerate() {
            let row = line
                .chars()
                .map(GridCell::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            if y > 0 && row.len() != cells[0].len() {
                return Err(GridParseError::RaggedRow(y));
            }
            cells.push(row);
        }
        if cells.is_empty() || cells[0].is_empty() {
            return Err(GridParseError::EmptyMap);
        }

        Ok(Self {
            cells,
            goal,
            dt: 1.0,
            blocked_edges: FxHashSet::default(),
        })
    }

    /// An all-empty grid.
    #[must_use]
    pub fn open(width: u32, height: u32, goal: GridKey) -> Self {
        Self {
            cells: vec![vec![GridCell::Empty; width as usize]; height as usize],
            goal,
            dt: 1.0,
            blocked_edges: FxHashSet::default(),
        }
    }

    /// An empty grid with walls scattered at `density` (0..1), keeping the
    /// corners clear. Deterministic for a given rng seed.
    #[must_use]
    pub fn random<R: rand::Rng>(width: u32, height: u32, density: f64, r: &mut R) -> Self {
        let goal = GridKey::new(width - 1, height - 1);
        let mut grid = Self::open(width, height, goal);
        for y in 0..height {
            for x in 0..width {
                if (x == 0 && y == 0) || (x == width - 1 && y == height - 1) {
                    continue;
                }
                if r.random::<f64>() < density {
                    grid.cells[y as usize][x as usize] = GridCell::Wall;
                }
            }
        }
        grid
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.cells[0].len() as u32, self.cells.len() as u32)
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The coordinate of a cell at time zero; the usual start of a plan.
    #[must_use]
    pub fn coord(&self, x: u32, y: u32) -> GridCoord {
        GridCoord { x, y, t: 0.0 }
    }

    #[inline(always)]
    fn at(&self, key: &GridKey) -> GridCell {
        self.cells[key.y as usize][key.x as usize]
    }

    #[inline(always)]
    fn in_bounds(&self, x: u32, y: u32) -> bool {
        let (w, h) = self.dimensions();
        x < w && y < h
    }

    pub fn set_cell(&mut self, key: GridKey, cell: GridCell) {
        self.cells[key.y as usize][key.x as usize] = cell;
    }

    /// Blocks one directed edge on top of the wall layout.
    pub fn block_edge(&mut self, from: GridKey, to: GridKey) {
        self.blocked_edges.insert((from, to));
    }
}

impl std::fmt::Debug for Grid2D {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Grid2D{:?}", self.dimensions())
    }
}

impl std::fmt::Display for Grid2D {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        writeln!(f, "Grid2D({w}x{h}):")?;
        for row in &self.cells {
            for cell in row {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Environment<GridKey, GridCoord, GridAction, FloatCost> for Grid2D {
    type Primitive = GridMotion;

    fn is_goal(&self, coord: &GridCoord) -> bool {
        coord.key() == self.goal
    }

    /// Manhattan distance at unit cost; admissible and consistent here.
    fn get_heur(&self, coord: &GridCoord) -> FloatCost {
        let dx = coord.x.abs_diff(self.goal.x);
        let dy = coord.y.abs_diff(self.goal.y);
        FloatCost::new(UNIT_COST * f64::from(dx + dy))
    }

    fn get_succ(&self, coord: &GridCoord) -> Successors<GridKey, GridCoord, GridAction, FloatCost> {
        let mut succ = Successors::with_capacity(4);
        let from = coord.key();
        for action in GridAction::ALL {
            let Some((x, y)) = action.apply(coord.x, coord.y) else {
                continue;
            };
            if !self.in_bounds(x, y) {
                continue;
            }

            let key = GridKey::new(x, y);
            let blocked =
                self.at(&key) == GridCell::Wall || self.blocked_edges.contains(&(from, key));
            let cost = if blocked {
                FloatCost::infinity()
            } else {
                FloatCost::new(UNIT_COST)
            };
            let next = GridCoord {
                x,
                y,
                t: coord.t + self.dt,
            };
            succ.push(next, key, cost, action);
        }
        succ
    }

    fn forward_action(&self, coord: &GridCoord, action: GridAction) -> GridMotion {
        GridMotion {
            from: *coord,
            action,
            dt: self.dt,
        }
    }
}
