use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use waymark::extractor::Arguments;
use waymark::router::builder::build_simple_router;
use waymark::router::mapping::parameter;
use waymark::router::Router;
use waymark::test::TestServer;

#[derive(Default)]
struct Resource;

impl Resource {
    fn show(&self, mut args: Arguments) -> anyhow::Result<u64> {
        Ok(args.take::<u64>(0).unwrap_or_default())
    }

    fn list(&self, _args: Arguments) -> anyhow::Result<Vec<u64>> {
        Ok(vec![1, 2, 3])
    }
}

fn router(classes: usize) -> Router {
    build_simple_router(|route| {
        for i in 0..classes {
            route
                .class::<Resource>(&format!("/api/v1/resource{}", i))
                .restful()
                .methods(|m| {
                    m.get("").to(Resource::list);
                    m.get("/{id}")
                        .param(parameter::path::<u64>("id"))
                        .to(Resource::show);
                });
        }
    })
    .unwrap()
}

fn resolve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for classes in [1usize, 10, 100].iter() {
        let router = router(*classes);
        let path = format!("/api/v1/resource{}/42", classes - 1);
        group.bench_with_input(BenchmarkId::from_parameter(classes), &path, |b, path| {
            b.iter(|| router.resolve(black_box(path)))
        });
    }
    group.finish();
}

fn build_benchmark(c: &mut Criterion) {
    c.bench_function("build 100 classes", |b| b.iter(|| router(black_box(100))));
}

fn dispatch_benchmark(c: &mut Criterion) {
    let server = TestServer::new(router(10)).unwrap();
    c.bench_function("dispatch", |b| {
        b.iter(|| {
            let response = server
                .client()
                .get("http://localhost/api/v1/resource9/42")
                .perform()
                .unwrap();
            black_box(response.read_body().unwrap())
        })
    });
}

criterion_group!(
    benches,
    resolve_benchmark,
    build_benchmark,
    dispatch_benchmark
);
criterion_main!(benches);
