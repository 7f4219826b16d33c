// Criterion benchmarks for Jury Match

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use jury_match::core::{calculate_match_score, reconcile, Category, SuggestionEngine, Taxonomy};
use jury_match::models::{
    AssignmentKey, AssignmentStatus, ExistingAssignment, Item, MatchConfig, Reviewer, RoundKind,
    RoundSnapshot,
};

const VERTICALS: [&str; 6] = ["fintech", "healthcare", "machine learning", "climate tech", "saas", "robotics"];
const STAGES: [&str; 4] = ["pre seed", "seed", "series-a", "growth"];
const REGIONS: [&str; 4] = ["eu", "usa", "apac", "latam"];

fn create_item(id: usize) -> Item {
    Item {
        id: format!("s{}", id),
        name: format!("Startup {}", id),
        verticals: vec![
            VERTICALS[id % VERTICALS.len()].to_string(),
            VERTICALS[(id / 3) % VERTICALS.len()].to_string(),
        ],
        stage: Some(STAGES[id % STAGES.len()].to_string()),
        regions: vec![REGIONS[id % REGIONS.len()].to_string()],
        description: Some("Platform for payments and machine learning workflows".to_string()),
    }
}

fn create_reviewer(id: usize) -> Reviewer {
    Reviewer {
        id: format!("r{}", id),
        name: format!("Juror {}", id),
        target_verticals: vec![
            VERTICALS[id % VERTICALS.len()].to_string(),
            VERTICALS[(id + 2) % VERTICALS.len()].to_string(),
        ],
        preferred_stages: vec![STAGES[id % STAGES.len()].to_string()],
        preferred_regions: vec![REGIONS[id % REGIONS.len()].to_string()],
        evaluation_limit: Some(5 + (id % 5) as u32),
        thesis_keywords: vec!["payments".to_string(), "hardware".to_string()],
    }
}

fn create_snapshot(reviewers: usize, items: usize) -> RoundSnapshot {
    RoundSnapshot {
        round: "screening".to_string(),
        items: (0..items).map(create_item).collect(),
        reviewers: (0..reviewers).map(create_reviewer).collect(),
        conflicts: vec![],
        assignments: (0..reviewers)
            .map(|i| ExistingAssignment {
                id: Some(format!("a{}", i)),
                reviewer_id: format!("r{}", i),
                item_id: format!("s{}", i % items.max(1)),
                round: "screening".to_string(),
                status: Some(AssignmentStatus::Pending),
                meeting_scheduled_at: None,
                created_at: None,
            })
            .collect(),
        config: MatchConfig::default(),
    }
}

fn bench_normalize(c: &mut Criterion) {
    let taxonomy = Taxonomy::standard();
    c.bench_function("taxonomy_normalize", |b| {
        b.iter(|| taxonomy.normalize(black_box(Category::Vertical), black_box("Machine Learning")))
    });
}

fn bench_score_pair(c: &mut Criterion) {
    let reviewer = create_reviewer(1);
    let item = create_item(1);
    let config = MatchConfig::default();

    c.bench_function("calculate_match_score", |b| {
        b.iter(|| calculate_match_score(black_box(&reviewer), black_box(&item), black_box(2), &config))
    });
}

fn bench_generate(c: &mut Criterion) {
    let engine = SuggestionEngine::default();

    let mut group = c.benchmark_group("generate");

    for (reviewers, items) in [(10, 50), (50, 200), (100, 500)].iter() {
        let snapshot = create_snapshot(*reviewers, *items);

        group.bench_with_input(
            BenchmarkId::new("suggestions", format!("{}x{}", reviewers, items)),
            &snapshot,
            |b, snapshot| b.iter(|| engine.generate(black_box(snapshot))),
        );
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let snapshot = create_snapshot(100, 500);
    let desired: Vec<AssignmentKey> = (0..100)
        .flat_map(|r| (0..3).map(move |k| AssignmentKey::new(&format!("s{}", (r + k) % 500), &format!("r{}", r))))
        .collect();

    c.bench_function("reconcile_300_desired", |b| {
        b.iter(|| reconcile(black_box(&desired), black_box(&snapshot.assignments), RoundKind::Pitching))
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_score_pair,
    bench_generate,
    bench_reconcile
);

criterion_main!(benches);
