//! Toroidal grid with multi-occupancy cells.

use crate::agent::AgentId;
use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cell coordinate. Always wrapped into the grid when produced by [`TorusGrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which neighbor offsets a mover may pick from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 4-connected
    #[default]
    VonNeumann,
    /// 8-connected, diagonals included
    Moore,
    /// Never moves
    Still,
}

static VON_NEUMANN_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

static MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Neighborhood {
    /// Movement offsets for this mode. Empty for `Still`.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Self::VonNeumann => &VON_NEUMANN_OFFSETS,
            Self::Moore => &MOORE_OFFSETS,
            Self::Still => &[],
        }
    }
}

/// Spatial index mapping cells to the agents standing on them.
///
/// Keeps both directions (cell -> ids and id -> cell) and updates them
/// together, so a reader never sees an agent in two cells or in none.
#[derive(Clone, Debug)]
pub struct TorusGrid {
    width: i32,
    height: i32,
    /// cells[y * width + x] holds the ids at that position
    cells: Vec<Vec<AgentId>>,
    locations: HashMap<AgentId, Position>,
}

impl TorusGrid {
    /// Create an empty grid. Both dimensions must be positive and fit an `i32`.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(SimError::OutOfRange { width, height });
        }
        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells: vec![Vec::new(); width * height],
            locations: HashMap::new(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Number of cells
    #[inline]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Wrap an arbitrary coordinate onto the torus
    #[inline]
    pub fn wrap(&self, x: i64, y: i64) -> Position {
        Position {
            x: x.rem_euclid(self.width as i64) as i32,
            y: y.rem_euclid(self.height as i64) as i32,
        }
    }

    #[inline]
    fn wrap_pos(&self, pos: Position) -> Position {
        self.wrap(pos.x as i64, pos.y as i64)
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Register an agent at the (wrapped) position
    pub fn place(&mut self, id: AgentId, pos: Position) -> Result<Position> {
        if self.locations.contains_key(&id) {
            return Err(SimError::InvariantViolation(format!(
                "agent {id} placed twice"
            )));
        }
        let pos = self.wrap_pos(pos);
        let idx = self.index(pos);
        self.cells[idx].push(id);
        self.locations.insert(id, pos);
        Ok(pos)
    }

    /// Move an agent to a new (wrapped) position, returning where it landed
    pub fn move_agent(&mut self, id: AgentId, new_pos: Position) -> Result<Position> {
        let old = *self.locations.get(&id).ok_or(SimError::NotFound(id))?;
        let new_pos = self.wrap_pos(new_pos);
        if old == new_pos {
            return Ok(new_pos);
        }
        self.detach(id, old)?;
        let idx = self.index(new_pos);
        self.cells[idx].push(id);
        self.locations.insert(id, new_pos);
        Ok(new_pos)
    }

    /// Remove an agent, returning its last position
    pub fn remove(&mut self, id: AgentId) -> Result<Position> {
        let pos = self.locations.remove(&id).ok_or(SimError::NotFound(id))?;
        self.detach(id, pos)?;
        Ok(pos)
    }

    fn detach(&mut self, id: AgentId, pos: Position) -> Result<()> {
        let idx = self.index(pos);
        let cell = &mut self.cells[idx];
        match cell.iter().position(|&other| other == id) {
            // Order within a cell is not part of the contract
            Some(slot) => {
                cell.swap_remove(slot);
                Ok(())
            }
            None => Err(SimError::InvariantViolation(format!(
                "agent {id} indexed at {pos} but absent from that cell"
            ))),
        }
    }

    /// Ids occupying exactly this cell
    #[inline]
    pub fn agents_at(&self, pos: Position) -> &[AgentId] {
        let pos = self.wrap_pos(pos);
        &self.cells[self.index(pos)]
    }

    #[inline]
    pub fn position_of(&self, id: AgentId) -> Option<Position> {
        self.locations.get(&id).copied()
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.locations.contains_key(&id)
    }

    /// Number of agents on the grid
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.locations.keys().copied()
    }

    /// Pick a uniformly random neighbor cell for the given mode.
    ///
    /// Staying put is not one of the choices; `Still` always returns `pos`.
    pub fn random_step<R: Rng + ?Sized>(
        &self,
        pos: Position,
        neighborhood: Neighborhood,
        rng: &mut R,
    ) -> Position {
        let offsets = neighborhood.offsets();
        if offsets.is_empty() {
            return self.wrap_pos(pos);
        }
        let (dx, dy) = offsets[rng.gen_range(0..offsets.len())];
        self.wrap(pos.x as i64 + dx as i64, pos.y as i64 + dy as i64)
    }

    /// Uniformly random cell, used for seeding
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position {
            x: rng.gen_range(0..self.width),
            y: rng.gen_range(0..self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            TorusGrid::new(0, 5),
            Err(SimError::OutOfRange { width: 0, height: 5 })
        ));
        assert!(TorusGrid::new(5, 0).is_err());
        assert!(TorusGrid::new(1, 1).is_ok());
    }

    #[test]
    fn test_wrap_negative_and_overflow() {
        let grid = TorusGrid::new(10, 5).unwrap();
        assert_eq!(grid.wrap(-1, -1), Position::new(9, 4));
        assert_eq!(grid.wrap(10, 5), Position::new(0, 0));
        assert_eq!(grid.wrap(-21, 12), Position::new(9, 2));
    }

    #[test]
    fn test_multi_occupancy() {
        let mut grid = TorusGrid::new(10, 10).unwrap();
        grid.place(1, Position::new(3, 3)).unwrap();
        grid.place(2, Position::new(3, 3)).unwrap();
        grid.place(3, Position::new(4, 3)).unwrap();

        assert_eq!(grid.agents_at(Position::new(3, 3)).len(), 2);
        assert_eq!(grid.agents_at(Position::new(4, 3)), &[3]);
        assert!(grid.agents_at(Position::new(5, 3)).is_empty());
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_place_wraps_coordinates() {
        let mut grid = TorusGrid::new(4, 4).unwrap();
        let pos = grid.place(1, Position::new(-1, 6)).unwrap();
        assert_eq!(pos, Position::new(3, 2));
        assert_eq!(grid.position_of(1), Some(pos));
    }

    #[test]
    fn test_double_place_is_invariant_violation() {
        let mut grid = TorusGrid::new(4, 4).unwrap();
        grid.place(1, Position::new(0, 0)).unwrap();
        assert!(matches!(
            grid.place(1, Position::new(1, 1)),
            Err(SimError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_move_updates_both_sides() {
        let mut grid = TorusGrid::new(5, 5).unwrap();
        grid.place(1, Position::new(0, 0)).unwrap();
        let landed = grid.move_agent(1, Position::new(-1, 0)).unwrap();

        assert_eq!(landed, Position::new(4, 0));
        assert!(grid.agents_at(Position::new(0, 0)).is_empty());
        assert_eq!(grid.agents_at(Position::new(4, 0)), &[1]);
        assert_eq!(grid.position_of(1), Some(landed));
    }

    #[test]
    fn test_remove_and_missing() {
        let mut grid = TorusGrid::new(5, 5).unwrap();
        grid.place(1, Position::new(2, 2)).unwrap();
        assert_eq!(grid.remove(1).unwrap(), Position::new(2, 2));
        assert!(grid.is_empty());
        assert!(matches!(grid.remove(1), Err(SimError::NotFound(1))));
        assert!(matches!(
            grid.move_agent(1, Position::new(0, 0)),
            Err(SimError::NotFound(1))
        ));
    }

    #[test]
    fn test_random_step_respects_neighborhood() {
        let grid = TorusGrid::new(10, 10).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let origin = Position::new(5, 5);

        for _ in 0..200 {
            let p = grid.random_step(origin, Neighborhood::VonNeumann, &mut rng);
            let manhattan = (p.x - origin.x).abs() + (p.y - origin.y).abs();
            assert_eq!(manhattan, 1);

            let p = grid.random_step(origin, Neighborhood::Moore, &mut rng);
            let chebyshev = (p.x - origin.x).abs().max((p.y - origin.y).abs());
            assert_eq!(chebyshev, 1);
        }

        assert_eq!(grid.random_step(origin, Neighborhood::Still, &mut rng), origin);
    }

    #[test]
    fn test_random_step_wraps_at_edge() {
        let grid = TorusGrid::new(3, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            let p = grid.random_step(Position::new(0, 0), Neighborhood::Moore, &mut rng);
            assert!(grid.in_bounds(p));
        }
    }
}
