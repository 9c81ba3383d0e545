//! Property tests for torus wrapping and grid bookkeeping

use predprey::{Neighborhood, Position, TorusGrid};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    #[test]
    fn wrap_always_in_bounds(w in 1usize..64, h in 1usize..64, x in -10_000i64..10_000, y in -10_000i64..10_000) {
        let grid = TorusGrid::new(w, h).unwrap();
        let p = grid.wrap(x, y);
        prop_assert!(grid.in_bounds(p));
        prop_assert_eq!(p.x as i64, ((x % w as i64) + w as i64) % w as i64);
        prop_assert_eq!(p.y as i64, ((y % h as i64) + h as i64) % h as i64);
    }

    #[test]
    fn wrap_is_periodic(w in 1usize..32, h in 1usize..32, x in -500i64..500, y in -500i64..500, k in -5i64..5) {
        let grid = TorusGrid::new(w, h).unwrap();
        prop_assert_eq!(grid.wrap(x, y), grid.wrap(x + k * w as i64, y + k * h as i64));
    }

    #[test]
    fn random_walk_keeps_index_consistent(seed in any::<u64>(), moves in 1usize..200) {
        let mut grid = TorusGrid::new(7, 5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for id in 0..10u64 {
            grid.place(id, Position::new(id as i32, -(id as i32))).unwrap();
        }

        for step in 0..moves {
            let id = (step % 10) as u64;
            let from = grid.position_of(id).unwrap();
            let to = grid.random_step(from, Neighborhood::Moore, &mut rng);
            let landed = grid.move_agent(id, to).unwrap();
            prop_assert!(grid.in_bounds(landed));
        }

        let mut total = 0;
        for x in 0..7 {
            for y in 0..5 {
                let here = grid.agents_at(Position::new(x, y));
                for &id in here {
                    prop_assert_eq!(grid.position_of(id), Some(Position::new(x, y)));
                }
                total += here.len();
            }
        }
        prop_assert_eq!(total, 10);
        prop_assert_eq!(grid.len(), 10);
    }
}
