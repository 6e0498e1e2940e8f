mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{crawler, detail_page, FakePortal, InFlight, MemoryStore, BASE};
use regwatch_harvester::{scrape_regulation, NaturalKey, RateLimited, RelationKind};
use regwatch_pipeline::crawl::CANCELLED_MESSAGE;
use regwatch_pipeline::models::{CrawlParameters, JobStatus, NewCrawlJob};
use regwatch_pipeline::store::RegulationStore;

fn job(max_items: u32) -> NewCrawlJob {
    let parameters = CrawlParameters::default()
        .with_max_items(max_items)
        .with_rate(1000.0);
    NewCrawlJob::new("tester", parameters)
}

fn uu_5_2020() -> NaturalKey {
    NaturalKey {
        jenis: "UU".into(),
        nomor: "5".into(),
        tahun: 2020,
    }
}

#[tokio::test]
async fn test_crawl_persists_artifacts_metadata_and_relations() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/1/uu-no-5-tahun-2020"])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true))
            .with_pdf("/Download/5/UU.pdf", b"%PDF-1.4 fake"),
    );
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal, store.clone())
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 1);
    assert_eq!(job.items_skipped, 0);
    assert!(job.error_log.is_empty());
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());

    let (pdf, pdf_type) = store.blob("UU/2020/5.pdf").unwrap();
    assert_eq!(pdf, b"%PDF-1.4 fake");
    assert_eq!(pdf_type, "application/pdf");

    let (md, md_type) = store.blob("UU/2020/5.md").unwrap();
    let md = String::from_utf8(md).unwrap();
    assert_eq!(md_type, "text/markdown");
    assert!(md.starts_with("---\n"));
    assert!(md.contains("# Dokumen Peraturan\n\n## Halaman 1\n\nPasal 1\n\n---\n\n"));

    let regulations = store.regulations();
    assert_eq!(regulations.len(), 1);
    let stored = &regulations[0];
    assert_eq!(stored.record.natural_key(), Some(uu_5_2020()));
    assert_eq!(stored.artifacts.pdf_path, "UU/2020/5.pdf");
    assert_eq!(stored.artifacts.txt_path, "UU/2020/5.md");
    assert_eq!(
        stored.artifacts.pdf_sha256,
        regwatch_harvester::sha256_hex(b"%PDF-1.4 fake")
    );

    let relations = store.relations();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].0, stored.id);
    assert_eq!(relations[0].1, RelationKind::Mencabut);
    assert_eq!(relations[0].2.text, "UU No. 1 Tahun 1990");
    assert_eq!(
        relations[0].2.url.as_deref(),
        Some(format!("{BASE}/Details/1/uu-no-1-tahun-1990").as_str())
    );
}

#[tokio::test]
async fn test_existing_regulation_is_skipped_without_writes() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/1/uu-no-5-tahun-2020"])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true))
            .with_pdf("/Download/5/UU.pdf", b"%PDF"),
    );
    let store = Arc::new(MemoryStore::default());
    store.seed_regulation(&uu_5_2020());

    let job = crawler(portal.clone(), store.clone())
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 0);
    assert_eq!(job.items_skipped, 1);
    assert_eq!(store.blob_count(), 0);
    assert_eq!(store.regulations().len(), 1);
    assert!(store.relations().is_empty());
    assert!(
        !portal.requests().iter().any(|u| u.ends_with(".pdf")),
        "pdf fetched for a skipped regulation"
    );
}

#[tokio::test]
async fn test_missing_pdf_link_is_logged_and_crawl_continues() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&[
                "/Details/1/uu-no-5-tahun-2020",
                "/Details/2/pp-no-3-tahun-2021",
            ])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, false))
            .with_page("/Details/2/pp-no-3-tahun-2021", detail_page("PP", "3", 2021, true))
            .with_pdf("/Download/3/PP.pdf", b"%PDF"),
    );
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal, store.clone())
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 1);
    assert_eq!(job.error_log.len(), 1);
    assert_eq!(job.error_log[0].message, "No PDF URL found");
    assert_eq!(
        job.error_log[0].url.as_deref(),
        Some(format!("{BASE}/Details/1/uu-no-5-tahun-2020").as_str())
    );

    let regulations = store.regulations();
    assert_eq!(regulations.len(), 1);
    assert_eq!(regulations[0].record.jenis.as_deref(), Some("PP"));
}

#[tokio::test]
async fn test_page_without_key_is_logged_as_missing_fields() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/9/lampiran"])
            .with_page(
                "/Details/9/lampiran",
                "<html><body><p>nothing here</p></body></html>".to_string(),
            ),
    );
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal, store.clone())
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 0);
    assert_eq!(
        job.error_log[0].message,
        "Missing required fields (jenis, nomor, or tahun)"
    );
    assert!(store.regulations().is_empty());
}

#[tokio::test]
async fn test_failed_detail_fetch_is_logged_with_url() {
    let portal = Arc::new(FakePortal::default().with_search_page(&["/Details/404/gone"]));
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal, store)
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.error_log.len(), 1);
    assert_eq!(
        job.error_log[0].url.as_deref(),
        Some(format!("{BASE}/Details/404/gone").as_str())
    );
}

#[tokio::test]
async fn test_empty_search_page_stops_before_max_items() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/1/uu-no-5-tahun-2020"])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true))
            .with_pdf("/Download/5/UU.pdf", b"%PDF"),
    );
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal.clone(), store)
        .run(job(50), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 1);
    let search_requests = portal
        .requests()
        .iter()
        .filter(|u| u.contains("/Search"))
        .count();
    assert_eq!(search_requests, 2);
}

#[tokio::test]
async fn test_max_items_limits_processed_pages() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&[
                "/Details/1/uu-no-5-tahun-2020",
                "/Details/2/pp-no-3-tahun-2021",
            ])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true))
            .with_page("/Details/2/pp-no-3-tahun-2021", detail_page("PP", "3", 2021, true))
            .with_pdf("/Download/5/UU.pdf", b"%PDF")
            .with_pdf("/Download/3/PP.pdf", b"%PDF"),
    );
    let store = Arc::new(MemoryStore::default());

    let job = crawler(portal.clone(), store.clone())
        .run(job(1), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.total_items, 1);
    assert_eq!(job.items_crawled, 1);
    assert!(!portal.requests().iter().any(|u| u.contains("/Details/2/")));
}

#[tokio::test]
async fn test_cancelled_crawl_is_marked_failed() {
    let portal = Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/1/uu-no-5-tahun-2020"])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true)),
    );
    let store = Arc::new(MemoryStore::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let job = crawler(portal.clone(), store.clone())
        .run(job(5), cancel)
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.completed_at.is_some());
    assert_eq!(job.error_log.len(), 1);
    assert_eq!(job.error_log[0].message, CANCELLED_MESSAGE);
    assert_eq!(job.error_log[0].url, None);
    assert!(portal.requests().is_empty());
    assert!(store.regulations().is_empty());
}

#[tokio::test]
async fn test_job_store_failure_marks_job_failed() {
    let portal = Arc::new(FakePortal::default());
    let store = Arc::new(MemoryStore::with_failing_job_updates());

    let job = crawler(portal, store)
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_log[0].message.starts_with("Crawl failed: "));
}

fn one_regulation_portal() -> Arc<FakePortal> {
    Arc::new(
        FakePortal::default()
            .with_search_page(&["/Details/1/uu-no-5-tahun-2020"])
            .with_page("/Details/1/uu-no-5-tahun-2020", detail_page("UU", "5", 2020, true))
            .with_pdf("/Download/5/UU.pdf", b"%PDF"),
    )
}

#[tokio::test]
async fn test_failed_relation_insert_leaves_no_partial_regulation() {
    let store = Arc::new(MemoryStore::with_failing_relations());

    let job = crawler(one_regulation_portal(), store.clone())
        .run(job(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_crawled, 0);
    assert_eq!(job.error_log.len(), 1);
    assert_eq!(job.error_log[0].message, "configuration error: relation insert failed");
    assert_eq!(
        job.error_log[0].url.as_deref(),
        Some(format!("{BASE}/Details/1/uu-no-5-tahun-2020").as_str())
    );

    assert!(store.regulations().is_empty());
    assert!(store.relations().is_empty());
    // a later crawl must not skip it
    assert!(!store.exists_by_natural_key(&uu_5_2020()).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_jobs_and_ingest_never_overlap_portal_requests() {
    let portal = Arc::new(InFlight::new(one_regulation_portal()));
    let store = Arc::new(MemoryStore::default());
    let crawler = Arc::new(crawler(portal.clone(), store.clone()));
    let ingest = RateLimited::new(portal.clone(), 1000.0).with_throttle(crawler.throttle().clone());

    let detail_url = format!("{BASE}/Details/1/uu-no-5-tahun-2020");
    let (first, second, record) = tokio::join!(
        crawler.run(job(5), CancellationToken::new()),
        crawler.run(job(5), CancellationToken::new()),
        scrape_regulation(&ingest, &detail_url),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(portal.max(), 1);
    assert_eq!(record.unwrap().natural_key(), Some(uu_5_2020()));

    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!((first.items_crawled, first.items_skipped), (1, 0));
    assert_eq!((second.items_crawled, second.items_skipped), (0, 1));
    assert!(second.started_at.unwrap() >= first.completed_at.unwrap());
    assert_eq!(store.regulations().len(), 1);
}

#[tokio::test]
async fn test_job_cancelled_while_waiting_never_starts() {
    let portal = Arc::new(InFlight::new(one_regulation_portal()));
    let store = Arc::new(MemoryStore::default());
    let crawler = Arc::new(crawler(portal, store));
    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let (first, second) = tokio::join!(
        crawler.run(job(5), CancellationToken::new()),
        crawler.run(job(5), cancelled),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(first.items_crawled, 1);
    assert_eq!(second.status, JobStatus::Failed);
    assert_eq!(second.started_at, None);
    assert_eq!(second.error_log[0].message, CANCELLED_MESSAGE);
}
