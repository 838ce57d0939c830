use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nview_core::extract::{extract_all, ExtractOptions};
use nview_core::filter::Filter;
use nview_core::scan::parse_str;
use nview_core::table::build;
use nview_core::types::{Column, ScanHost, ServiceObservation};
use std::hint::black_box;

fn synthetic_hosts(count: usize, ports_per_host: u16) -> Vec<ScanHost> {
    (0..count)
        .map(|i| {
            let services = (1..=ports_per_host)
                .map(|port| {
                    let protocol = if port % 4 == 0 { "udp" } else { "tcp" };
                    let state = match port % 3 {
                        0 => "open",
                        1 => "closed",
                        _ => "filtered",
                    };
                    ServiceObservation::new(port, protocol, state).with_service("svc")
                })
                .collect();
            ScanHost::new(format!("10.0.{}.{}", i / 256, i % 256), services)
        })
        .collect()
}

fn synthetic_xml(count: usize, ports_per_host: u16) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<nmaprun scanner=\"nmap\">\n");
    for i in 0..count {
        xml.push_str(&format!(
            "<host><address addr=\"10.0.{}.{}\" addrtype=\"ipv4\"/><ports>\n",
            i / 256,
            i % 256
        ));
        for port in 1..=ports_per_host {
            xml.push_str(&format!(
                r#"<port protocol="tcp" portid="{}"><state state="open"/><service name="http" product="nginx" version="1.18.0" method="probed" conf="10"/></port>"#,
                port
            ));
            xml.push('\n');
        }
        xml.push_str("</ports></host>\n");
    }
    xml.push_str("</nmaprun>\n");
    xml
}

fn benchmark_parse(c: &mut Criterion) {
    let xml = synthetic_xml(50, 20);

    c.bench_function("parse_50_hosts_20_ports", |b| {
        b.iter(|| parse_str(black_box(&xml), "bench.xml"))
    });
}

fn benchmark_extract_modes(c: &mut Criterion) {
    let hosts = synthetic_hosts(100, 50);
    let expanded = ExtractOptions::default();
    let packed = ExtractOptions {
        pack_ports: true,
        ..Default::default()
    };

    c.bench_function("extract_expanded_100_hosts", |b| {
        b.iter(|| extract_all(black_box(&hosts), black_box(&expanded)))
    });

    c.bench_function("extract_packed_100_hosts", |b| {
        b.iter(|| extract_all(black_box(&hosts), black_box(&packed)))
    });
}

fn benchmark_build_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_scaling");
    let filter = Filter::parse(r#"status == "open" and port < 1024"#, &Column::ALL).unwrap();

    for size in [10, 50, 100, 500].iter() {
        let rows = extract_all(&synthetic_hosts(*size, 30), &ExtractOptions::default()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                build(
                    black_box(rows.clone()),
                    &Column::ALL,
                    &[Column::Address, Column::Protocol],
                    Some(&filter),
                    b'\t',
                )
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_extract_modes,
    benchmark_build_scaling
);
criterion_main!(benches);
