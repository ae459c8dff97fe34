//! Pipeline benchmark: one sample directory on disk → feature record.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use npm_features::config::AnalysisConfig;
use npm_features::corpus::{Label, PackageSample};
use npm_features::features::FeatureExtractor;
use std::fs;
use std::path::Path;

fn make_sample(dir: &Path, files: usize) {
    fs::create_dir_all(dir.join("lib")).unwrap();
    fs::write(
        dir.join("package.json"),
        r#"{"name": "bench-pkg", "version": "1.4.2",
            "dependencies": {"axios": "^1.6.0", "lodash": "^4.17.21"},
            "scripts": {"postinstall": "node lib/setup.js", "test": "jest"}}"#,
    )
    .unwrap();
    fs::write(dir.join("README.md"), "# bench-pkg\n".repeat(20)).unwrap();
    for i in 0..files {
        let src = format!(
            "const fs = require('fs');\nmodule.exports.f{i} = function (p) {{\n  return fs.readFileSync(p, 'utf8') + process.env.HOME;\n}};\n"
        );
        fs::write(dir.join("lib").join(format!("mod{i}.js")), src.repeat(10)).unwrap();
    }
}

fn bench_extract(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    let extractor = FeatureExtractor::new(&AnalysisConfig::default());

    let mut g = c.benchmark_group("extract_by_files");
    for n in [10, 50] {
        let dir = tmp.path().join("2024-01-01").join(format!("bench-pkg-{n}"));
        make_sample(&dir, n);
        let sample = PackageSample::new(dir, Label::Benign);
        g.bench_function(format!("files_{n}"), |b| b.iter(|| black_box(extractor.extract(&sample).ok())));
    }
    g.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
