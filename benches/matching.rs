use criterion::{criterion_group, criterion_main, Criterion};

use slacksearch::model::message::MessageRecord;
use slacksearch::model::timestamp::Zone;
use slacksearch::model::user::UserTable;
use slacksearch::search::matcher::Matcher;
use slacksearch::search::query::parse_query;

const QUERY: &str =
    "in:#dev from:@alice -from:bob is:thread \"build broke\" -flaky after:2024-01-01 during:mar";

fn sample_records(n: usize) -> Vec<MessageRecord> {
    (0..n)
        .map(|i| MessageRecord {
            user: Some(format!("U{}", i % 50)),
            text: format!("message {i}: the build broke again, ping <@U{}>", i % 7),
            ts: Some(format!("{}.{:06}", 1_709_280_000 + i as i64 * 60, i % 1_000_000)),
            thread_ts: (i % 3 == 0).then(|| "1709280000.000000".to_string()),
            ..Default::default()
        })
        .collect()
}

fn bench_parse_query(c: &mut Criterion) {
    c.bench_function("parse_query", |b| b.iter(|| parse_query(QUERY).unwrap()));
}

fn bench_match_records(c: &mut Criterion) {
    let query = parse_query("\"build broke\" -flaky is:thread after:2024-01-01").unwrap();
    let mut users = UserTable::new();
    for i in 0..50 {
        users.insert(format!("U{i}"), format!("user{i}"));
    }
    let records = sample_records(10_000);
    let matcher = Matcher::new(&query, &users, Zone::Utc);

    c.bench_function("match_10k_records", |b| {
        b.iter(|| matcher.match_all("dev", &records).unwrap().len())
    });
}

criterion_group!(benches, bench_parse_query, bench_match_records);
criterion_main!(benches);
