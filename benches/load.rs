use std::hint::black_box;
use std::path::Path;

use coobo_env::{Env, EnvLoader};
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_process(c: &mut Criterion) {
    let content = make_env_content(2_000);

    c.bench_function("process_interpolated", |b| {
        b.iter(|| {
            let mut env = Env::new();
            env.process(black_box(&content), true)
        });
    });
}

fn bench_load(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("failed to create temp dir");
    write_file(&dir.path().join(".env"), &make_env_content(2_000));

    c.bench_function("load_in_memory", |b| {
        b.iter(|| {
            let mut env = Env::new();
            EnvLoader::new()
                .app_root(dir.path())
                .load(&mut env)
                .expect("load should succeed")
        });
    });
}

/// Every other entry references its predecessor.
fn make_env_content(entries: usize) -> String {
    let mut content = String::with_capacity(entries * 24);
    for idx in 0..entries {
        if idx % 2 == 1 {
            content.push_str(&format!("KEY_{idx}=${{KEY_{}}}/suffix\n", idx - 1));
        } else {
            content.push_str(&format!("KEY_{idx}=value\n"));
        }
    }
    content
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).expect("failed to write test file");
}

criterion_group!(benches, bench_process, bench_load);
criterion_main!(benches);
