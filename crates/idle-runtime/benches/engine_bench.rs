use criterion::{criterion_group, criterion_main, Criterion};
use idle_core::{Decimal, ResourceKind, UpgradeId};
use idle_runtime::{Engine, EngineConfig};

fn midgame_engine() -> Engine {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.set_developer_mode(true);
    engine
        .grant(ResourceKind::Tokens, &Decimal::from(1_000_000_000u64))
        .unwrap();
    engine
        .grant(ResourceKind::AstNodes, &Decimal::from(50_000u64))
        .unwrap();
    for id in ["lexer_daemon", "regex_engine", "recursive_descent", "lr_parser"] {
        engine.purchase(&UpgradeId::new(id), 40).unwrap();
    }
    engine
}

fn bench_ticks(c: &mut Criterion) {
    let mut engine = midgame_engine();
    let dt: Decimal = "0.1".parse().unwrap();
    c.bench_function("engine_tick", |b| {
        b.iter(|| {
            let _ = engine.tick(&dt);
        })
    });
}

fn bench_snapshot_and_save(c: &mut Criterion) {
    let mut engine = midgame_engine();
    engine.advance_offline(600).unwrap();
    c.bench_function("engine_snapshot", |b| b.iter(|| engine.snapshot()));
    c.bench_function("engine_save_json", |b| b.iter(|| engine.save_json()));
}

criterion_group!(benches, bench_ticks, bench_snapshot_and_save);
criterion_main!(benches);
