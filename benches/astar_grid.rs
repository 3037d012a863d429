use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use kinosearch::float_cost::FloatCost;
use kinosearch::problems::grid_2d::Grid2D;
use kinosearch::problems::grid_2d::GridKey;
use kinosearch::search::GraphSearch;
use kinosearch::search::Termination;
use kinosearch::state_space::Heuristic;
use kinosearch::state_space::StateSpace;

const WALL_DENSITY: f64 = 0.2;
const SEEDS: u64 = 3;

fn astar(grid: &Grid2D) -> usize {
    let mut ss = StateSpace::new(Heuristic::from_eps(FloatCost::new(1.0)), 1.0);
    let search = GraphSearch::new(grid);

    match search.astar(
        &mut ss,
        grid.coord(0, 0),
        GridKey::new(0, 0),
        &Termination::unbounded(),
    ) {
        Ok(traj) => traj.len(),
        // Unreachable goals still exercise the full frontier.
        Err(_) => ss.expansions(),
    }
}

fn grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid2D A*");

    for side in [32u32, 64, 128] {
        for seed in 0..SEEDS {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let grid = Grid2D::random(side, side, WALL_DENSITY, &mut rng);

            let name = format!("{side}x{side}:{seed}");
            group.bench_with_input(BenchmarkId::new("A*", &name), &grid, |b, g| {
                b.iter(|| astar(g))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, grid_search);
criterion_main!(benches);
