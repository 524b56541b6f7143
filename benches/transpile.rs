//! Transpile latency on a synthetic source with many kernels.
//!
//! Measures:
//! 1. Parsing the whole translation unit
//! 2. Locating kernels
//! 3. Validate + rewrite + apply for every kernel, sequential and parallel

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tinycompute::syntax::parse_source;
use tinycompute::transpile::{locate_kernels, transpile_source, Options};
use tinycompute::SourceFile;

/// `n` kernels in the shape of the game-of-life step.
fn synthetic_source(n: usize) -> String {
    let mut src = String::from("#include \"computebackend.hpp\"\n\nnamespace bench {\n");
    for i in 0..n {
        src.push_str(&format!(
            r#"
struct [[clang::annotate("kernel")]] Step{i}
{{
    static constexpr char fileLocation[] = "step_{i}";
    static constexpr int N = {size};

    tc::uvec3 local_size{{8, 8, 1}};
    tc::BufferBinding<tc::uint, 0> inData;
    tc::BufferBinding<tc::uint, 1> outData;
    tc::Uniform<tc::integer, 2> width{{64}};

    int index(int x, int y) {{ return y * width + x; }}

    void main() {{
        tc::uvec2 c = gl_GlobalInvocationID["xy"_sw];
        tc::uint n = 0;
        for (int dy = -1; dy <= 1; ++dy) {{
            for (int dx = -1; dx <= 1; ++dx) {{
                if (dx || dy) {{
                    n += inData[index(c.x + dx, c.y + dy)];
                }}
            }}
        }}
        tc::vec4 color{{0.5f, 0.5f, 0.5f, 1.0f}};
        outData[index(c.x, c.y)] = n == 3 && color.x > 0.0f && N > 0;
    }}
}};
"#,
            i = i,
            size = i + 1
        ));
    }
    src.push_str("}\n");
    src
}

fn bench_parse(c: &mut Criterion) {
    let source = SourceFile::new("bench.h", synthetic_source(64));
    let mut group = c.benchmark_group("frontend");
    group.bench_function("parse_64_kernels", |b| {
        b.iter(|| parse_source(black_box(&source)))
    });
    group.bench_function("locate_64_kernels", |b| {
        let unit = parse_source(&source).unwrap();
        b.iter(|| locate_kernels(black_box(&unit), &source.text).len())
    });
    group.finish();
}

fn bench_transpile(c: &mut Criterion) {
    let text = synthetic_source(64);
    let sequential = Options {
        write: false,
        ..Options::default()
    };
    let parallel = Options {
        parallel: true,
        ..sequential.clone()
    };

    let mut group = c.benchmark_group("transpile");
    group.bench_function("sequential_64_kernels", |b| {
        b.iter(|| {
            let source = SourceFile::new("bench.h", text.clone());
            transpile_source(black_box(source), &sequential).unwrap()
        })
    });
    group.bench_function("parallel_64_kernels", |b| {
        b.iter(|| {
            let source = SourceFile::new("bench.h", text.clone());
            transpile_source(black_box(source), &parallel).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_transpile);
criterion_main!(benches);
