use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flatdict::{
    DirFileMapper, IndexedDictionary, Utf8Strategy, V1Reader, V1Writer, V2Reader, V2Writer,
    V2WriterOptions,
};

fn sorted_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{i:08}")).collect()
}

fn build_v1(keys: &[String]) -> V1Reader<Utf8Strategy> {
    let mut writer = V1Writer::new(Utf8Strategy);
    for k in keys {
        writer.write(Some(k.clone())).unwrap();
    }
    let window = writer.finish().unwrap();
    V1Reader::open(window, Utf8Strategy).unwrap()
}

fn build_v2(dir: &std::path::Path, keys: &[String]) -> V2Reader<Utf8Strategy, DirFileMapper> {
    let mut writer = V2Writer::new(
        Utf8Strategy,
        dir,
        "bench",
        V2WriterOptions { target_page_size: 1 << 16, codec_name: "utf8".to_string() },
    );
    for k in keys {
        writer.write(Some(k.clone())).unwrap();
    }
    writer.finish().unwrap();
    let mapper = DirFileMapper::new(dir);
    V2Reader::open(mapper, Utf8Strategy, "bench").unwrap()
}

fn bench_lookups(c: &mut Criterion) {
    let keys = sorted_keys(100_000);

    let v1 = build_v1(&keys);
    c.bench_function("v1_get_midpoint", |b| {
        b.iter(|| black_box(v1.get(black_box(50_000)).unwrap()))
    });
    c.bench_function("v1_index_of_midpoint", |b| {
        b.iter(|| {
            v1.index_of(&Utf8Strategy, black_box(&Some(keys[50_000].clone())))
                .unwrap()
        })
    });

    let dir = tempfile::tempdir().unwrap();
    let v2 = build_v2(dir.path(), &keys);
    c.bench_function("v2_get_midpoint", |b| {
        b.iter(|| black_box(v2.get(black_box(50_000)).unwrap()))
    });
    c.bench_function("v2_index_of_midpoint", |b| {
        b.iter(|| {
            v2.index_of(&Utf8Strategy, black_box(&Some(keys[50_000].clone())))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_lookups);
criterion_main!(benches);
