use criterion::{criterion_group, criterion_main, Criterion};
use loxwalk::Lox;

const RECURSION: &str = r#"
    fun fib(n) {
        if (n < 2) return n;
        return fib(n - 2) + fib(n - 1);
    }
    print fib(22);
"#;

const CLOSURES: &str = r#"
    fun counter() {
        var n = 0;
        return fun () { n = n + 1; return n; };
    }
    var tick = counter();
    var last = 0;
    for (var i = 0; i < 20000; i = i + 1) {
        last = tick();
    }
    print last;
"#;

const DISPATCH: &str = r#"
    class Shape {
        init(size) { this.size = size; }
        area() { return this.size * this.size; }
    }
    class Square < Shape {
        area() { return super.area() + 0; }
    }
    var total = 0;
    var shape = Square(3);
    while (total < 90000) {
        total = total + shape.area();
    }
    print total;
"#;

const COLLECTIONS: &str = r#"
    var squares = range(0, 2000).map(fun (n) { return n * n; });
    var total = 0;
    for (var s in squares.filter(fun (n) { return n % 3 == 0; })) {
        total = total + s;
    }
    var index = {};
    for (var i = 0; i < 500; i = i + 1) {
        index[i] = squares[i];
    }
    print total + len(index);
"#;

fn run(src: &str) {
    let mut lox = Lox::new().with_output(std::io::sink());
    lox.run(src).unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter");
    group.sample_size(20);
    group.bench_function("recursion", |b| b.iter(|| run(RECURSION)));
    group.bench_function("closures", |b| b.iter(|| run(CLOSURES)));
    group.bench_function("dispatch", |b| b.iter(|| run(DISPATCH)));
    group.bench_function("collections", |b| b.iter(|| run(COLLECTIONS)));
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
