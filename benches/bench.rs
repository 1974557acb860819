use criterion::{criterion_group, criterion_main, Criterion};
use parsat::sat::cnf::Cnf;
use parsat::sat::config::SolverConf;
use parsat::sat::coordinator::ParallelSolver;
use parsat::sat::searcher::Searcher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn php_clauses(pigeons: i32, holes: i32) -> Vec<Vec<i32>> {
    let var = |p: i32, h: i32| p * holes + h + 1;
    let mut clauses = Vec::new();
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect());
    }
    for h in 0..holes {
        for p1 in 0..pigeons {
            for p2 in p1 + 1..pigeons {
                clauses.push(vec![-var(p1, h), -var(p2, h)]);
            }
        }
    }
    clauses
}

fn planted_3sat(num_vars: i32, num_clauses: usize, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let planted: Vec<bool> = (0..num_vars).map(|_| rng.gen_bool(0.5)).collect();
    let mut clauses = Vec::with_capacity(num_clauses);
    while clauses.len() < num_clauses {
        let mut vars = [0_i32; 3];
        for v in &mut vars {
            *v = rng.gen_range(1..=num_vars);
        }
        if vars[0] == vars[1] || vars[0] == vars[2] || vars[1] == vars[2] {
            continue;
        }
        let mut clause: Vec<i32> = vars
            .iter()
            .map(|&v| if rng.gen_bool(0.5) { v } else { -v })
            .collect();
        if !clause
            .iter()
            .any(|&l| planted[(l.abs() - 1) as usize] == l.is_positive())
        {
            let fix = rng.gen_range(0..3);
            let var = clause[fix].abs();
            clause[fix] = if planted[(var - 1) as usize] { var } else { -var };
        }
        clauses.push(clause);
    }
    clauses
}

fn bench_pigeonhole(c: &mut Criterion) {
    let cnf = Cnf::new(php_clauses(5, 4), 0);
    c.bench_function("pigeonhole 5-into-4, single worker", |b| {
        b.iter(|| {
            let mut searcher = Searcher::single(&cnf, SolverConf::default());
            black_box(searcher.solve(&[]));
        });
    });
}

fn bench_planted_3sat(c: &mut Criterion) {
    let cnf = Cnf::new(planted_3sat(100, 420, 1), 0);

    c.bench_function("planted 3-sat, single worker", |b| {
        b.iter(|| {
            let mut searcher = Searcher::single(&cnf, SolverConf::default());
            black_box(searcher.solve(&[]));
        });
    });

    c.bench_function("planted 3-sat, two workers", |b| {
        b.iter(|| {
            let mut solver = ParallelSolver::new(
                cnf.clone(),
                SolverConf {
                    num_workers: 2,
                    ..SolverConf::default()
                },
            );
            black_box(solver.solve());
        });
    });
}

criterion_group!(benches, bench_pigeonhole, bench_planted_3sat);
criterion_main!(benches);
