use std::{sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::eyre;
use crawl_tree::{CrawlEvent, Crawler, FakeFetcher, Fetcher, HttpFetcher};
use url::Url;

/// Given a starting URL, crawls every linked page up to a maximum depth,
/// fetching each page at most once, and prints each page found
#[derive(Parser, Debug)]
#[clap(name = "crawl-tree", author, version, about, long_about = None)]
pub struct Args {
    #[clap(value_parser, default_value = "https://golang.org/")]
    url: Url,

    /// Maximum number of hops from the starting URL, zero or less crawls nothing
    #[clap(short, long, default_value_t = 4, allow_hyphen_values = true)]
    depth: i64,

    /// HTTP request timeout in seconds
    #[clap(short, long, default_value_t = 10)]
    timeout: u64,

    /// Follow links to other hosts as well
    #[clap(long)]
    any_host: bool,

    /// Crawl the built-in golang.org tour pages instead of the network
    #[clap(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    let args = Args::parse();
    if args.demo {
        return crawl(Arc::new(FakeFetcher::go_tour()), &args).await;
    }

    let host = match args.url.host_str() {
        Some(host) => host.to_owned(),
        None => eyre::bail!("URL should have a valid host"),
    };
    let mut fetcher = HttpFetcher::new(Duration::from_secs(args.timeout))?;
    if !args.any_host {
        fetcher = fetcher.scoped_to(host);
    }
    crawl(Arc::new(fetcher), &args).await
}

async fn crawl<F: Fetcher + 'static>(fetcher: Arc<F>, args: &Args) -> eyre::Result<()> {
    let crawler = Crawler::new(fetcher);
    let events = crawler.events();

    let on_interrupt = crawler.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    crawler.spawn(args.url.as_str(), args.depth);

    let (mut found, mut failed) = (0, 0);
    let mut print = |event: CrawlEvent| {
        match &event {
            CrawlEvent::Fetched(_) => found += 1,
            CrawlEvent::Failed(_) => failed += 1,
        }
        println!("{}", event);
    };
    loop {
        tokio::select! {
            _ = crawler.wait_for_completion() => break,
            Ok(event) = events.recv_async() => print(event),
        }
    }
    events.try_iter().for_each(&mut print);

    log::info!("Crawl finished: {} found, {} failed", found, failed);
    Ok(())
}
