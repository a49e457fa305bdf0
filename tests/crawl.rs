use std::{collections::HashSet, sync::Arc, time::Duration};

use crawl_tree::{CrawlEvent, Crawler, FakeFetcher, Page, VisitedRegistry};

fn no_links() -> Vec<String> {
    Vec::new()
}

/// A→{B,C}, B→{A,C}, C→{}, with D only reachable from nowhere.
fn small_graph() -> FakeFetcher {
    FakeFetcher::from_iter([
        ("A", Page::new("page a", ["B", "C"])),
        ("B", Page::new("page b", ["A", "C"])),
        ("C", Page::new("page c", no_links())),
        ("D", Page::new("page d", ["A"])),
    ])
}

/// 0 → 1 → 2 → 3 → 4 → 5, every page also linking back to 0.
fn chain() -> FakeFetcher {
    FakeFetcher::from_iter((0..6).map(|i| {
        let mut links = vec!["0".to_owned()];
        if i < 5 {
            links.push((i + 1).to_string());
        }
        (i.to_string(), Page::new(format!("page {i}"), links))
    }))
}

fn ids(report: &crawl_tree::CrawlReport) -> HashSet<String> {
    report.fetched.iter().map(|e| e.id.clone()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn small_graph_emits_each_page_once() {
    let fetcher = Arc::new(small_graph().with_delay(Duration::from_millis(5)));
    let crawler = Crawler::new(Arc::clone(&fetcher));

    let report = crawler.run("A", 3).await;

    assert_eq!(report.fetched.len(), 3);
    assert_eq!(
        ids(&report),
        HashSet::from(["A", "B", "C"].map(String::from))
    );
    assert!(report.failed.is_empty());
    assert!(fetcher.repeated().is_empty());
    assert_eq!(fetcher.calls("D"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cyclic_references_are_fetched_at_most_once() {
    for _ in 0..20 {
        let fetcher = Arc::new(FakeFetcher::go_tour());
        let crawler = Crawler::new(Arc::clone(&fetcher));

        crawler.run("https://golang.org/", 10).await;

        assert!(fetcher.repeated().is_empty());
        assert_eq!(fetcher.total_calls(), 5);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn depth_bounds_the_hop_distance() {
    for depth in 1..=6 {
        let fetcher = Arc::new(chain());
        let crawler = Crawler::new(Arc::clone(&fetcher));

        let report = crawler.run("0", depth).await;

        let expected = (0..depth).map(|i| i.to_string()).collect::<HashSet<_>>();
        assert_eq!(ids(&report), expected, "depth {depth}");
        assert_eq!(fetcher.total_calls(), depth as usize);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn nothing_is_emitted_after_completion() {
    let fetcher = Arc::new(chain().with_delay(Duration::from_millis(10)));
    let crawler = Crawler::new(fetcher);
    let events = crawler.events();

    crawler.spawn("0", 6);
    crawler.wait_for_completion().await;

    let emitted = events
        .try_iter()
        .map(|event| event.id().to_owned())
        .collect::<HashSet<_>>();
    assert_eq!(emitted, crawler.visited().snapshot().await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.is_empty());
    assert_eq!(crawler.outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_fetch_does_not_stop_siblings() {
    let fetcher = Arc::new(FakeFetcher::from_iter([
        ("root", Page::new("root", ["missing", "left", "right"])),
        ("left", Page::new("left", ["leaf"])),
        ("right", Page::new("right", no_links())),
        ("leaf", Page::new("leaf", no_links())),
    ]));
    let crawler = Crawler::new(Arc::clone(&fetcher));

    let report = crawler.run("root", 3).await;

    assert_eq!(
        ids(&report),
        HashSet::from(["root", "left", "right", "leaf"].map(String::from))
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "missing");
    assert_eq!(report.failed[0].to_string(), "not found: missing");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_claim_is_not_retried() {
    let fetcher = Arc::new(FakeFetcher::from_iter([
        ("a", Page::new("a", ["broken", "b"])),
        ("b", Page::new("b", ["broken"])),
    ]));
    let crawler = Crawler::new(Arc::clone(&fetcher));

    let report = crawler.run("a", 4).await;

    assert_eq!(fetcher.calls("broken"), 1);
    assert_eq!(report.failed.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_top_level_crawls_fetch_once() {
    let fetcher = Arc::new(small_graph().with_delay(Duration::from_millis(5)));
    let crawler = Crawler::new(Arc::clone(&fetcher));

    for _ in 0..16 {
        crawler.spawn("C", 1);
    }
    crawler.wait_for_completion().await;

    assert_eq!(fetcher.calls("C"), 1);
    let events = crawler.events().try_iter().collect::<Vec<_>>();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], CrawlEvent::Fetched(e) if e.id == "C" && e.count == 1));
}

#[tokio::test]
async fn shared_registry_carries_claims_between_crawls() {
    let registry = VisitedRegistry::new();
    let fetcher = Arc::new(small_graph());

    let first = Crawler::with_registry(Arc::clone(&fetcher), registry.clone());
    first.run("C", 1).await;

    let second = Crawler::with_registry(Arc::clone(&fetcher), registry.clone());
    let report = second.run("A", 3).await;

    assert_eq!(
        ids(&report),
        HashSet::from(["A", "B"].map(String::from))
    );
    assert_eq!(fetcher.calls("C"), 1);
    assert_eq!(registry.len().await, 3);
}

#[tokio::test]
async fn empty_identifier_is_a_leaf() {
    let fetcher = Arc::new(FakeFetcher::from_iter([("", Page::new("", no_links()))]));
    let crawler = Crawler::new(Arc::clone(&fetcher));

    let report = crawler.run("", 5).await;

    assert_eq!(report.fetched_ids(), vec![""]);
    assert_eq!(crawler.fetch_count(), 1);
}
