use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use reqwest::StatusCode;

const SLOT_MINUTES: i64 = 30;

/// Lanes used by one run; successive runs against the same server shift past each other.
const LANES_PER_RUN: i64 = 40;

static RUN_LANE_OFFSET: OnceLock<i64> = OnceLock::new();

fn run_lane_offset() -> i64 {
    *RUN_LANE_OFFSET.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.subsec_nanos());
        (nanos % 150) as i64 * LANES_PER_RUN
    })
}

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid base date")
}

/// Non-overlapping half-hour slot `n` on the given lane (lanes are a year apart).
fn slot_times(lane: i64, n: i64) -> (String, String) {
    let lane = run_lane_offset() + lane;
    let start = base() + TimeDelta::days(365 * lane) + TimeDelta::minutes(n * SLOT_MINUTES);
    let end = start + TimeDelta::minutes(SLOT_MINUTES);
    (
        start.format("%Y-%m-%dT%H:%M").to_string(),
        end.format("%Y-%m-%dT%H:%M").to_string(),
    )
}

async fn submit(
    client: &reqwest::Client,
    url: &str,
    provider: &str,
    start: &str,
    end: &str,
) -> StatusCode {
    client
        .post(format!("{url}/api/slots"))
        .query(&[("providerName", provider), ("startTime", start), ("endTime", end)])
        .send()
        .await
        .expect("request failed")
        .status()
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().map_or(0.0, |d| d.as_secs_f64() * 1000.0),
    );
}

async fn phase1_sequential(client: &reqwest::Client, url: &str, run: &str) {
    let n = 1000;
    let provider = format!("seq-{run}");
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        // Every other slot is adjacent, so half the submissions touch without merging
        let (s, e) = slot_times(0, (i as i64) * 2);
        let t = Instant::now();
        let status = submit(client, url, &provider, &s, &e).await;
        latencies.push(t.elapsed());
        assert_eq!(status, StatusCode::CREATED);
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} submissions in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("write latency", &mut latencies);
}

async fn phase2_concurrent(client: &reqwest::Client, url: &str, run: &str) {
    let n_tasks = 10;
    let n_per_task = 200;

    let start = Instant::now();
    let mut handles = Vec::new();

    for task in 0..n_tasks {
        let client = client.clone();
        let url = url.to_string();
        let provider = format!("par-{run}-{task}");
        handles.push(tokio::spawn(async move {
            for j in 0..n_per_task {
                let (s, e) = slot_times(1 + task as i64, j as i64 * 2);
                let status = submit(&client, &url, &provider, &s, &e).await;
                assert_eq!(status, StatusCode::CREATED);
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} tasks x {n_per_task} submissions = {total} total in {:.2}s = {ops:.0} ops/sec",
        elapsed.as_secs_f64()
    );
}

async fn phase3_contention(client: &reqwest::Client, url: &str, run: &str) {
    let rounds = 50;
    let contenders = 8;
    let mut violations = 0usize;

    let start = Instant::now();
    for round in 0..rounds {
        let (s, e) = slot_times(20, round * 4);
        let mut handles = Vec::new();
        for c in 0..contenders {
            let client = client.clone();
            let url = url.to_string();
            let provider = format!("race-{run}-{c}");
            let (s, e) = (s.clone(), e.clone());
            handles.push(tokio::spawn(async move {
                submit(&client, &url, &provider, &s, &e).await
            }));
        }
        let mut created = 0;
        for h in handles {
            if h.await.unwrap() == StatusCode::CREATED {
                created += 1;
            }
        }
        if created != 1 {
            violations += 1;
        }
    }

    println!(
        "  {rounds} rounds x {contenders} contenders in {:.2}s, {violations} rounds without exactly one winner",
        start.elapsed().as_secs_f64()
    );
}

async fn phase4_read_under_load(client: &reqwest::Client, url: &str, run: &str) {
    let stop = Arc::new(AtomicBool::new(false));
    let writes = Arc::new(AtomicUsize::new(0));
    let mut writer_handles = Vec::new();
    for w in 0..5 {
        let client = client.clone();
        let url = url.to_string();
        let stop = stop.clone();
        let writes = writes.clone();
        let provider = format!("load-{run}-{w}");
        writer_handles.push(tokio::spawn(async move {
            let mut i = 0i64;
            while !stop.load(Ordering::Relaxed) {
                let (s, e) = slot_times(30 + w, i * 2);
                submit(&client, &url, &provider, &s, &e).await;
                writes.fetch_add(1, Ordering::Relaxed);
                i += 1;
            }
        }));
    }

    let n_readers = 10;
    let reads_per_reader = 100;
    let mut reader_handles = Vec::new();
    for _ in 0..n_readers {
        let client = client.clone();
        let url = url.to_string();
        reader_handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for _ in 0..reads_per_reader {
                let t = Instant::now();
                let resp = client
                    .get(format!("{url}/api/slots"))
                    .send()
                    .await
                    .expect("request failed");
                let _ = resp.bytes().await;
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    println!("  {} background writes", writes.load(Ordering::Relaxed));
    print_latency("list latency", &mut all_latencies);
}

#[tokio::main]
async fn main() {
    let url = std::env::var("SLOTBOOK_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
    let run = std::process::id().to_string();
    let client = reqwest::Client::new();

    println!("=== slotbook stress benchmark ===");
    println!("target: {url}\n");

    // Each phase uses its own providers and calendar years to avoid interference

    println!("[phase 1] sequential write throughput");
    phase1_sequential(&client, &url, &run).await;

    println!("\n[phase 2] concurrent write throughput");
    phase2_concurrent(&client, &url, &run).await;

    println!("\n[phase 3] cross-provider contention");
    phase3_contention(&client, &url, &run).await;

    println!("\n[phase 4] list latency under write load");
    phase4_read_under_load(&client, &url, &run).await;

    println!("\n=== benchmark complete ===");
}
