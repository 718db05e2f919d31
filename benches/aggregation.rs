use chat_report::{ChatRecord, ReportTables};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_records(n: usize) -> Vec<ChatRecord> {
    let base = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid base timestamp");
    let agents = ["System", "agentA", "agentB", "agentC", "agentD", "system"];

    (0..n)
        .map(|i| {
            let start = base + Duration::minutes((i * 17) as i64);
            ChatRecord {
                closed_by: Some(agents[i % agents.len()].to_string()),
                chat_start: Some(start),
                chat_end: (i % 11 != 0).then(|| start + Duration::seconds((i % 900) as i64 + 30)),
                first_response_secs: (i % 7 != 0).then_some((i % 300) as f64),
                csat_score: (i % 5 != 0).then_some((i % 5) as f64 + 1.0),
            }
        })
        .collect()
}

fn fmt_time(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn compute_benchmark(c: &mut Criterion) {
    let records = sample_records(50_000);

    c.bench_function("report_tables_50k_chats", |b| {
        b.iter(|| {
            let tables = ReportTables::compute(black_box(&records));
            black_box(tables.agents.len());
        });
    });
}

fn loader_benchmark(c: &mut Criterion) {
    let mut csv = String::from("ClosedBy,ChatStartTime,ChatEndTime,AgentFirstResponseTime,CSATScore\n");
    for r in sample_records(10_000) {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            r.closed_by.unwrap_or_default(),
            fmt_time(r.chat_start),
            fmt_time(r.chat_end),
            r.first_response_secs.map(|v| v.to_string()).unwrap_or_default(),
            r.csat_score.map(|v| v.to_string()).unwrap_or_default(),
        ));
    }
    let loader = chat_report::ChatLoader::new();

    c.bench_function("load_10k_rows", |b| {
        b.iter(|| {
            let records = loader.load_reader(black_box(csv.as_bytes())).expect("load");
            black_box(records.len());
        });
    });
}

criterion_group!(benches, compute_benchmark, loader_benchmark);
criterion_main!(benches);
