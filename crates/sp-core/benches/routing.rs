use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sp_core::{HostPattern, HostTracker, ProxyDirective, ProxyMode, RoutingPolicy};

fn build_policy(targets: usize, overrides: usize) -> RoutingPolicy {
    let targets = (0..targets)
        .filter_map(|i| {
            let raw = if i % 2 == 0 {
                format!("*.target{i}.com")
            } else {
                format!("host{i}.example.net")
            };
            HostPattern::parse(&raw)
        })
        .collect();
    let overrides: Vec<String> = (0..overrides).map(|i| format!("override{i}.org")).collect();

    RoutingPolicy::compile(
        ProxyMode::ProxyOnly,
        targets,
        ProxyDirective::new("SOCKS5 127.0.0.1:1080"),
        overrides,
    )
}

fn bench_decide(c: &mut Criterion) {
    let policy = build_policy(200, 50);
    let hosts = [
        "override25.org",
        "api.target100.com",
        "host101.example.net",
        "random.com",
        "deep.sub.target198.com",
    ];

    c.bench_function("decide_mixed_hosts", |b| {
        b.iter(|| {
            for host in hosts {
                black_box(policy.decide(black_box(host)));
            }
        })
    });

    c.bench_function("compile_policy", |b| b.iter(|| black_box(build_policy(200, 50))));
}

fn bench_tracker(c: &mut Criterion) {
    let hosts: Vec<String> = (0..64).map(|i| format!("site{i}.com")).collect();

    c.bench_function("tracker_churn", |b| {
        b.iter(|| {
            let mut tracker = HostTracker::new();
            for tab in 0..16 {
                for host in hosts.iter().skip(tab as usize).take(16) {
                    tracker.add_host(tab, host);
                }
            }
            for tab in 0..16 {
                black_box(tracker.clear(tab));
            }
        })
    });
}

criterion_group!(benches, bench_decide, bench_tracker);
criterion_main!(benches);
