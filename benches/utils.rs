//! 工具函数性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ephemera::utils::url_validator::validate_url;
use ephemera::utils::{
    MAX_IDENTIFIER_LEN, file_extension, generate_random_code, validate_identifier,
};

// ============== validate_identifier 基准测试 ==============

fn bench_validate_identifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_identifier");

    group.bench_function("valid_plain", |b| {
        b.iter(|| {
            assert!(validate_identifier("aB3dE6gH"));
        });
    });

    group.bench_function("valid_with_extension", |b| {
        b.iter(|| {
            assert!(validate_identifier("aB3dE6gH.tar"));
        });
    });

    group.bench_function("invalid_traversal", |b| {
        b.iter(|| {
            assert!(!validate_identifier("../../etc/passwd"));
        });
    });

    let max_len = "a".repeat(MAX_IDENTIFIER_LEN);
    group.bench_function("valid_max_length", |b| {
        b.iter(|| {
            assert!(validate_identifier(&max_len));
        });
    });

    group.finish();
}

// ============== file_extension 基准测试 ==============

fn bench_file_extension(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/file_extension");

    for name in ["notes.txt", "README", "C:\\Users\\me\\photo.JPG", "weird.t x"] {
        group.bench_with_input(BenchmarkId::new("name", name), &name, |b, &name| {
            b.iter(|| file_extension(name));
        });
    }

    group.finish();
}

// ============== generate_random_code 基准测试 ==============

fn bench_generate_random_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_random_code");

    for length in [6, 8, 12, 20] {
        group.bench_with_input(BenchmarkId::new("length", length), &length, |b, &length| {
            b.iter(|| {
                let code = generate_random_code(length);
                assert_eq!(code.len(), length);
            });
        });
    }

    group.finish();
}

// ============== validate_url 基准测试 ==============

fn bench_validate_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_url");

    group.bench_function("valid_https", |b| {
        b.iter(|| {
            assert!(validate_url("https://example.com/path?query=1").is_ok());
        });
    });

    group.bench_function("invalid_dangerous_protocol", |b| {
        b.iter(|| {
            assert!(validate_url("javascript:alert(1)").is_err());
        });
    });

    let long_url = format!("https://example.com/{}", "a".repeat(1000));
    group.bench_function("valid_long_url", |b| {
        b.iter(|| {
            assert!(validate_url(&long_url).is_ok());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_validate_identifier,
    bench_file_extension,
    bench_generate_random_code,
    bench_validate_url,
);
criterion_main!(benches);
