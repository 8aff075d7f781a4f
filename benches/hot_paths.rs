use criterion::{black_box, criterion_group, criterion_main, Criterion};

use disaster_map::data::{Dataset, GeometryStore, ImpactRecord, Polygon, Region};
use disaster_map::map::{render, ColorScale, MapRenderer, Viewport};
use disaster_map::query::{
    aggregate, DecadeRange, ImpactMetric, QueryParams, ScenarioFilter, DECADES,
};

const DISASTERS: [&str; 4] = ["Droughts", "Floods", "Storms", "Wildfires"];
const SCENARIOS: [f64; 3] = [0.0, 4.5, 8.5];

/// 22 sub-regions laid out as an 11 x 2 grid of 30 degree squares
fn boundaries() -> GeometryStore {
    let regions = (0..22)
        .map(|i| {
            let lon = -165.0 + (i % 11) as f64 * 30.0;
            let lat = if i < 11 { -30.0 } else { 10.0 };
            let ring = vec![
                (lon, lat),
                (lon + 28.0, lat),
                (lon + 28.0, lat + 28.0),
                (lon, lat + 28.0),
                (lon, lat),
            ];
            Region::new(format!("Region {i}"), vec![Polygon { rings: vec![ring] }])
        })
        .collect();
    GeometryStore::from_regions(regions).expect("distinct keys")
}

fn dataset() -> Dataset {
    let mut records = Vec::new();
    for (d, &decade) in DECADES.iter().enumerate() {
        for region in 0..22 {
            for (k, disaster) in DISASTERS.iter().enumerate() {
                for &scenario in &SCENARIOS {
                    let seed = (d * 31 + region * 7 + k * 3) as f64;
                    records.push(ImpactRecord {
                        decade,
                        subregion: format!("Region {region}"),
                        disaster_type: disaster.to_string(),
                        scenario,
                        financial_impact: seed * 1_000.0,
                        human_impact: seed,
                        low_occurrences: 1,
                        medium_occurrences: 0,
                        high_occurrences: 0,
                        temperature_delta: 0.0,
                    });
                }
            }
        }
    }
    Dataset::new(records)
}

fn params() -> QueryParams {
    QueryParams {
        decades: DecadeRange::all(),
        disaster_type: "Droughts".to_string(),
        metric: ImpactMetric::Human,
        scenario: ScenarioFilter::default(),
    }
}

fn bench_aggregate(c: &mut Criterion) {
    let dataset = dataset();
    let params = params();
    c.bench_function("aggregate_full_range", |b| {
        b.iter(|| aggregate(black_box(dataset.records()), black_box(&params)))
    });
}

fn bench_descriptor(c: &mut Criterion) {
    let dataset = dataset();
    let geometry = boundaries();
    let aggregation = aggregate(dataset.records(), &params());
    c.bench_function("render_descriptor", |b| {
        b.iter(|| render(black_box(&aggregation), black_box(&geometry), ColorScale::Reds))
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let dataset = dataset();
    let geometry = boundaries();
    let aggregation = aggregate(dataset.records(), &params());
    let descriptor = render(&aggregation, &geometry, ColorScale::Reds);
    let renderer = MapRenderer::new();
    let viewport = Viewport::world(400, 200);

    c.bench_function("rasterize_200x50", |b| {
        b.iter(|| {
            renderer.render(
                black_box(&descriptor),
                black_box(&geometry),
                200,
                50,
                black_box(&viewport),
            )
        })
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let geometry = boundaries();
    c.bench_function("region_at_grid", |b| {
        b.iter(|| {
            let mut hits = 0;
            for lon in (-180..180).step_by(5) {
                for lat in (-40..50).step_by(5) {
                    if geometry.region_at(lon as f64, lat as f64).is_some() {
                        hits += 1;
                    }
                }
            }
            black_box(hits)
        })
    });
}

criterion_group!(
    benches,
    bench_aggregate,
    bench_descriptor,
    bench_rasterize,
    bench_hit_test
);
criterion_main!(benches);
