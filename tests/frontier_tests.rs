//! End-to-end frontier scenarios driving the full worker contract

use shiori::config::FrontierConfig;
use shiori::frontier::{parse_seeds, Frontier, FrontierState, ImportEntry};
use shiori::journal;
use shiori::seen::MemorySeenFilter;
use shiori::{CrawlURI, FetchStatus};
use std::time::Duration;
use tokio::time::Instant;

fn test_config() -> FrontierConfig {
    let mut config = FrontierConfig::default();
    config.journal.enabled = false;
    config
}

fn start_frontier(config: FrontierConfig) -> Frontier {
    Frontier::start(config, Box::new(MemorySeenFilter::new())).unwrap()
}

/// Marks a fetch outcome the way a worker would, including timing so the
/// politeness calculator has a duration to work from
fn complete_fetch(curi: &mut CrawlURI, status: FetchStatus, content_size: u64) {
    curi.mark_fetch_began();
    curi.mark_fetch_completed();
    curi.fetch_status = status;
    curi.content_size = content_size;
}

#[tokio::test(start_paused = true)]
async fn three_hosts_fetch_snooze_and_pause() {
    let frontier = start_frontier(test_config());

    for host in ["alpha.example.org", "beta.example.org", "gamma.example.org"] {
        frontier
            .schedule(CrawlURI::parse(&format!("https://{host}/")).unwrap())
            .await
            .unwrap();
    }
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    // Distinct class keys, no snooze: all three come out immediately
    let mut taken = Vec::new();
    for _ in 0..3 {
        taken.push(frontier.next().await.unwrap());
    }
    let mut hosts: Vec<_> = taken
        .iter()
        .map(|c| c.uri().host_str().unwrap().to_string())
        .collect();
    hosts.sort();
    assert_eq!(
        hosts,
        vec!["alpha.example.org", "beta.example.org", "gamma.example.org"]
    );

    for mut curi in taken {
        complete_fetch(&mut curi, FetchStatus::Success(200), 2048);
        frontier.finished(curi).await.unwrap();
    }

    // Every queue is snoozing and nothing is queued: the manager pauses
    frontier.wait_for_state(FrontierState::Pause).await.unwrap();
    assert_eq!(frontier.succeeded_fetch_count(), 3);
    assert_eq!(frontier.finished_uri_count(), 3);
    assert!(frontier.is_empty());
}

#[tokio::test(start_paused = true)]
async fn politeness_gates_same_host_dispatch() {
    let frontier = start_frontier(test_config());

    frontier
        .schedule(CrawlURI::parse("https://example.com/first").unwrap())
        .await
        .unwrap();
    frontier
        .schedule(CrawlURI::parse("https://example.com/second").unwrap())
        .await
        .unwrap();
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    let mut first = frontier.next().await.unwrap();
    assert_eq!(first.uri().path(), "/first");

    complete_fetch(&mut first, FetchStatus::Success(200), 1024);
    let finished_at = Instant::now();
    frontier.finished(first).await.unwrap();

    // A near-instant fetch still waits out the 3000ms politeness floor
    let second = frontier.next().await.unwrap();
    assert_eq!(second.uri().path(), "/second");
    assert!(finished_at.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn disregard_without_timing_releases_queue_immediately() {
    let frontier = start_frontier(test_config());

    frontier
        .schedule(CrawlURI::parse("https://example.com/blocked").unwrap())
        .await
        .unwrap();
    frontier
        .schedule(CrawlURI::parse("https://example.com/fine").unwrap())
        .await
        .unwrap();
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    // Decided before any network activity: no timestamps, no snooze
    let mut blocked = frontier.next().await.unwrap();
    blocked.fetch_status = FetchStatus::RobotsPrecluded;
    let finished_at = Instant::now();
    frontier.finished(blocked).await.unwrap();

    let fine = frontier.next().await.unwrap();
    assert_eq!(fine.uri().path(), "/fine");
    assert!(finished_at.elapsed() < Duration::from_millis(3000));
    assert_eq!(frontier.disregarded_uri_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn worker_pool_drains_mixed_outcomes() {
    let mut config = test_config();
    config.retry.max_retries = 2;
    config.retry.retry_delay_seconds = 1;
    let frontier = start_frontier(config);

    // Nine URIs across three hosts; /dead ones always fail to connect,
    // /skip ones are out of scope, the rest succeed
    for host in ["a.example.org", "b.example.org", "c.example.org"] {
        for path in ["ok", "dead", "skip"] {
            frontier
                .schedule(CrawlURI::parse(&format!("https://{host}/{path}")).unwrap())
                .await
                .unwrap();
        }
    }
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    let mut workers = Vec::new();
    for _ in 0..3 {
        let frontier = frontier.clone();
        workers.push(tokio::spawn(async move {
            while let Some(mut curi) = frontier.next().await {
                match curi.uri().path() {
                    "/dead" => complete_fetch(&mut curi, FetchStatus::ConnectFailed, 0),
                    "/skip" => curi.fetch_status = FetchStatus::OutOfScope,
                    _ => complete_fetch(&mut curi, FetchStatus::Success(200), 512),
                }
                frontier.finished(curi).await.unwrap();
            }
        }));
    }

    // All work settles: the manager pauses itself, then FINISH releases the
    // workers
    frontier.wait_for_state(FrontierState::Pause).await.unwrap();
    frontier.terminate().await.unwrap();
    frontier.wait_for_state(FrontierState::Finish).await.unwrap();
    for worker in workers {
        worker.await.unwrap();
    }

    assert_eq!(frontier.succeeded_fetch_count(), 3);
    assert_eq!(frontier.failed_fetch_count(), 3);
    assert_eq!(frontier.disregarded_uri_count(), 3);
    assert_eq!(frontier.finished_uri_count(), 9);
    assert!(frontier.is_empty());
}

#[tokio::test(start_paused = true)]
async fn journal_survives_crash_and_reseeds() {
    let dir = tempfile::TempDir::new().unwrap();
    let journal_path = dir.path().join("journal.jsonl");

    let mut config = test_config();
    config.journal.enabled = true;
    config.journal.path = journal_path.display().to_string();

    // First run: three scheduled, one finished, then the frontier goes away
    {
        let frontier = start_frontier(config.clone());
        for path in ["done", "pending-a", "pending-b"] {
            frontier
                .schedule(CrawlURI::parse(&format!("https://example.com/{path}")).unwrap())
                .await
                .unwrap();
        }
        frontier.unpause().await.unwrap();

        let mut curi = frontier.next().await.unwrap();
        assert_eq!(curi.uri().path(), "/done");
        complete_fetch(&mut curi, FetchStatus::Success(200), 100);
        frontier.finished(curi).await.unwrap();

        frontier.terminate().await.unwrap();
        frontier.wait_for_state(FrontierState::Finish).await.unwrap();
    }

    let pending = journal::replay(&journal_path).unwrap();
    assert_eq!(pending.len(), 2);

    // Second run: replay re-seeds the unfinished work through normal
    // admission against a fresh seen filter
    let mut config2 = test_config();
    config2.journal.enabled = false;
    let frontier = start_frontier(config2);
    let submitted = frontier.import_journal(&journal_path).await.unwrap();
    assert_eq!(submitted, 2);
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();
    assert_eq!(frontier.queued_uri_count(), 2);

    let mut paths = Vec::new();
    for _ in 0..2 {
        let mut curi = frontier.next().await.unwrap();
        paths.push(curi.uri().path().to_string());
        complete_fetch(&mut curi, FetchStatus::Success(200), 100);
        frontier.finished(curi).await.unwrap();
    }
    paths.sort();
    assert_eq!(paths, vec!["/pending-a", "/pending-b"]);

    frontier.wait_for_state(FrontierState::Pause).await.unwrap();
    assert!(frontier.is_empty());
}

#[tokio::test(start_paused = true)]
async fn bulk_import_respects_admission_unless_forced() {
    let frontier = start_frontier(test_config());

    let entries = parse_seeds(
        "https://example.com/a\n\
         https://example.com/b L https://example.com/a\n\
         https://example.com/a\n",
    );
    assert_eq!(entries.len(), 3);
    let submitted = frontier.import_entries(entries).await.unwrap();
    assert_eq!(submitted, 3);
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    // The duplicate /a was dropped by the seen filter
    assert_eq!(frontier.queued_uri_count(), 2);

    let mut forced = ImportEntry::new("https://example.com/a");
    forced.force = true;
    frontier.import_entries(vec![forced]).await.unwrap();
    frontier.pause().await.unwrap();
    frontier.wait_for_state(FrontierState::Pause).await.unwrap();
    assert_eq!(frontier.queued_uri_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn malformed_import_entries_are_skipped() {
    let frontier = start_frontier(test_config());

    let entries = vec![
        ImportEntry::new("https://example.com/ok"),
        ImportEntry::new("ftp://example.com/nope"),
        ImportEntry::new("not a uri at all"),
    ];
    let submitted = frontier.import_entries(entries).await.unwrap();
    assert_eq!(submitted, 1);
}

#[tokio::test(start_paused = true)]
async fn pause_quiesces_and_unpause_resumes() {
    let frontier = start_frontier(test_config());
    for host in ["a.example.org", "b.example.org"] {
        frontier
            .schedule(CrawlURI::parse(&format!("https://{host}/")).unwrap())
            .await
            .unwrap();
    }
    frontier.unpause().await.unwrap();
    frontier.wait_for_state(FrontierState::Run).await.unwrap();

    let mut held = frontier.next().await.unwrap();
    frontier.pause().await.unwrap();

    // Pause is announced only once the worker gives its URI back
    complete_fetch(&mut held, FetchStatus::Success(200), 64);
    frontier.finished(held).await.unwrap();
    frontier.wait_for_state(FrontierState::Pause).await.unwrap();

    // No dispatch while paused, even with work staged
    let blocked = tokio::time::timeout(Duration::from_secs(2), frontier.next()).await;
    assert!(blocked.is_err());

    frontier.unpause().await.unwrap();
    let mut resumed = frontier.next().await.unwrap();
    complete_fetch(&mut resumed, FetchStatus::Success(200), 64);
    frontier.finished(resumed).await.unwrap();

    frontier.wait_for_state(FrontierState::Pause).await.unwrap();
    assert_eq!(frontier.succeeded_fetch_count(), 2);
}
