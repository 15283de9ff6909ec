//! Benchmarks for the interpolation engine
//!
//! Target: one full tick for 50 symbols well under a frame budget

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use price_ticker::core::{Easing, Symbol};
use price_ticker::hot_path::{InterpolationConfig, InterpolationEngine};

fn symbols(count: usize) -> Vec<Symbol> {
    (0..count).map(|i| Symbol::new(&format!("SYM{}", i))).collect()
}

fn bench_next_price(c: &mut Criterion) {
    let symbol = Symbol::new("BNOX");
    let mut engine = InterpolationEngine::with_seed(InterpolationConfig::default(), 7);
    engine.set_target(&symbol, 100.0);

    let mut flip = false;
    c.bench_function("next_price_with_retarget", |b| {
        b.iter(|| {
            flip = !flip;
            engine.set_target(&symbol, if flip { 110.0 } else { 100.0 });
            black_box(engine.next_price(black_box(&symbol)))
        })
    });
}

fn bench_local_price(c: &mut Criterion) {
    let symbol = Symbol::new("BNOX");
    let mut engine = InterpolationEngine::with_seed(InterpolationConfig::default(), 7);
    let mut price = 100.0;

    c.bench_function("generate_local_price", |b| {
        b.iter(|| {
            price = engine.generate_local_price(black_box(&symbol), price).price;
            black_box(price)
        })
    });
}

fn bench_easing(c: &mut Criterion) {
    c.bench_function("easing_all_curves", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for easing in Easing::ALL {
                total += easing.apply(black_box(0.37));
            }
            black_box(total)
        })
    });
}

fn bench_tick_many_symbols(c: &mut Criterion) {
    let symbols = symbols(50);
    let mut engine = InterpolationEngine::with_seed(InterpolationConfig::default(), 7);
    for (i, symbol) in symbols.iter().enumerate() {
        engine.set_target(symbol, 100.0 + i as f64);
    }

    c.bench_function("tick_50_symbols", |b| {
        b.iter(|| {
            for symbol in &symbols {
                black_box(engine.next_price(symbol));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_next_price,
    bench_local_price,
    bench_easing,
    bench_tick_many_symbols
);
criterion_main!(benches);
