//! Benchmarks for tree building and completion rollup
//!
//! Run with: `cargo bench -p completionist-core`
//!
//! - Forest building from flat rows (wide and deep shapes)
//! - Pure rollup over an already built forest
//! - Batch milestone insertion through the store

use completionist_core::db::{DatabaseService, RecordStore, TursoStore};
use completionist_core::models::{Entry, Franchise, MediaType, Milestone, MilestoneType, Progress};
use completionist_core::services::{aggregator, build_forest, BatchCreateMilestones, CoreServices};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// `groups` root groups, each with `leaves` mixed leaves
fn wide_rows(groups: usize, leaves: usize) -> Vec<Milestone> {
    let mut rows = Vec::with_capacity(groups * (leaves + 1));
    for g in 0..groups {
        let group = Milestone::new("entry", None, format!("Group {}", g), Progress::checkbox(), g as i64 * 10);
        let group_id = group.id.clone();
        rows.push(group);
        for l in 0..leaves {
            let progress = if l % 2 == 0 {
                Progress::Checkbox { current: l % 4 == 0 }
            } else {
                Progress::Counter {
                    current: l as i64 % 7,
                    target: 6,
                }
            };
            rows.push(Milestone::new(
                "entry",
                Some(group_id.clone()),
                format!("Leaf {}", l),
                progress,
                l as i64 * 10,
            ));
        }
    }
    rows
}

/// Single chain of `depth` nodes
fn deep_rows(depth: usize) -> Vec<Milestone> {
    let mut rows: Vec<Milestone> = Vec::with_capacity(depth);
    for d in 0..depth {
        let parent = rows.last().map(|m| m.id.clone());
        rows.push(Milestone::new("entry", parent, format!("Level {}", d), Progress::checkbox(), 0));
    }
    rows
}

fn bench_build_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_forest");

    for &(groups, leaves) in &[(10usize, 100usize), (100, 100)] {
        let rows = wide_rows(groups, leaves);
        group.bench_with_input(
            BenchmarkId::new("wide", rows.len()),
            &rows,
            |b, rows| b.iter(|| black_box(build_forest(rows.clone()))),
        );
    }

    let rows = deep_rows(500);
    group.bench_with_input(BenchmarkId::new("deep", rows.len()), &rows, |b, rows| {
        b.iter(|| black_box(build_forest(rows.clone())))
    });

    group.finish();
}

fn bench_rollup(c: &mut Criterion) {
    let forest = build_forest(wide_rows(100, 100));
    c.bench_function("entry_completion_10k", |b| {
        b.iter(|| black_box(aggregator::entry_completion(&forest)))
    });

    let mut breakdown = Vec::with_capacity(10_100);
    c.bench_function("entry_completion_with_breakdown_10k", |b| {
        b.iter(|| {
            breakdown.clear();
            black_box(aggregator::entry_completion_with_breakdown(&forest, &mut breakdown))
        })
    });
}

/// Batch insert of 100 titles in one transaction
fn bench_batch_create(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let titles: Vec<String> = (0..100).map(|i| format!("Collectible {}", i)).collect();

    let mut group = c.benchmark_group("batch_create");
    group.sample_size(10);

    group.bench_function("100_titles", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let temp_dir = TempDir::new().unwrap();
                let db = DatabaseService::new(temp_dir.path().join("bench.db"))
                    .await
                    .unwrap();
                let store: Arc<dyn RecordStore> = Arc::new(TursoStore::new(Arc::new(db)));
                let franchise = store
                    .create_franchise(Franchise::new("Bench", "#000000").unwrap())
                    .await
                    .unwrap();
                let entry = store
                    .create_entry(Entry::new(&franchise.id, "Bench", MediaType::Game, false, 10), None)
                    .await
                    .unwrap();
                let services = CoreServices::new(store);

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    let created = services
                        .milestones
                        .batch_create(BatchCreateMilestones {
                            entry_id: entry.id.clone(),
                            parent_id: None,
                            titles: titles.clone(),
                            kind: MilestoneType::Checkbox,
                            target: None,
                        })
                        .await
                        .unwrap();
                    black_box(created);
                }
                start.elapsed()
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build_forest, bench_rollup, bench_batch_create);
criterion_main!(benches);
