mod common;

use anti_judol::config::SortOrder;
use anti_judol::workflow::{CollectOnly, HarvestOptions, HarvestSession, TerminationReason};
use common::{config, scheme, FakePage};
use tokio_util::sync::CancellationToken;

const SCROLL: &str = "script:window.scrollBy(0, 500);";

fn session_with(max_fails: u32, sort_by: SortOrder, cancel: CancellationToken) -> HarvestSession {
    let config = anti_judol::Config {
        max_fails,
        sort_by,
        ..config()
    };
    HarvestSession::new(scheme(), HarvestOptions::from_config(&config), cancel)
}

#[tokio::test(start_paused = true)]
async fn test_exhausts_budget_without_advancing() {
    let page = FakePage::new(&[("@a", "satu"), ("@b", "dua")]);
    let outcome = session_with(3, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;

    assert_eq!(outcome.reason, TerminationReason::Exhausted);
    assert_eq!(outcome.comments.len(), 2);
    assert_eq!(outcome.state.index, 3);
    assert_eq!(outcome.state.fail_count, 3);
    // 同一位置探测三次，从未越过
    assert_eq!(page.count_calls("visible:list/item[3]"), 3);
    assert_eq!(page.count_calls("visible:list/item[4]"), 0);
    assert_eq!(page.count_calls(SCROLL), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fail_count_resets_after_each_record() {
    let page = FakePage::new(&[("@a", "satu"), ("@b", "dua"), ("@c", "tiga")]).lazy(1, 1);
    let outcome = session_with(2, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;

    assert_eq!(outcome.reason, TerminationReason::Exhausted);
    let bodies: Vec<&str> = outcome.comments.iter().map(|c| c.raw_text.as_str()).collect();
    assert_eq!(bodies, ["satu", "dua", "tiga"]);
    assert_eq!(page.count_calls(SCROLL), 3);
}

#[tokio::test(start_paused = true)]
async fn test_newest_sort_is_selected_first() {
    let page = FakePage::new(&[("@a", "satu")]);
    session_with(1, SortOrder::Newest, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;
    let calls = page.calls();
    let menu = calls.iter().position(|c| c == "click:sort").unwrap();
    let newest = calls.iter().position(|c| c == "click:sort/newest").unwrap();
    let first_item = calls
        .iter()
        .position(|c| c == "visible:list/item[1]")
        .unwrap();
    assert!(menu < newest && newest < first_item);

    let page = FakePage::new(&[("@a", "satu")]);
    session_with(1, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;
    assert_eq!(page.count_calls("click:sort"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_keeps_partial_results() {
    let page = FakePage::new(&[("@a", "satu"), ("@b", "dua"), ("@c", "tiga")])
        .fatal_on("list/item[3]");
    let outcome = session_with(3, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;

    assert!(matches!(outcome.reason, TerminationReason::Fatal(_)));
    assert_eq!(outcome.comments.len(), 2);
    // 非预期错误不消耗重试预算
    assert_eq!(page.count_calls(SCROLL), 0);
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_retries_same_index() {
    let page = FakePage::new(&[("@a", "satu"), ("@b", "dua"), ("@c", "tiga")])
        .flaky_read("list/item[2]/author", 1);
    let outcome = session_with(3, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;

    assert_eq!(outcome.reason, TerminationReason::Exhausted);
    let bodies: Vec<&str> = outcome.comments.iter().map(|c| c.raw_text.as_str()).collect();
    assert_eq!(bodies, ["satu", "dua", "tiga"]);
    // 读取失败后回到同一位置重新定位，不会跳过第 2 条
    assert_eq!(page.count_calls("visible:list/item[2]"), 2);
    assert_eq!(page.count_calls("read:list/item[2]/author"), 2);
    // 1 次读取失败 + 末尾 2 次
    assert_eq!(page.count_calls(SCROLL), 3);
}

#[tokio::test(start_paused = true)]
async fn test_browser_fault_on_first_probe_is_fatal() {
    let page = FakePage::new(&[("@a", "satu")]).fatal_on("list/item[1]");
    let outcome = session_with(1, SortOrder::Top, CancellationToken::new())
        .run(&page, &mut CollectOnly)
        .await;

    assert!(matches!(outcome.reason, TerminationReason::Fatal(_)));
    assert!(outcome.comments.is_empty());
    assert_eq!(outcome.state.fail_count, 0);
    assert_eq!(page.count_calls(SCROLL), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_at_next_boundary() {
    let cancel = CancellationToken::new();
    let page = FakePage::new(&[("@a", "satu"), ("@b", "dua"), ("@c", "tiga")])
        .cancel_after_reads(2, cancel.clone());
    let outcome = session_with(3, SortOrder::Top, cancel)
        .run(&page, &mut CollectOnly)
        .await;

    assert_eq!(outcome.reason, TerminationReason::Interrupted);
    assert_eq!(outcome.comments.len(), 2);
    assert_eq!(page.count_calls("visible:list/item[3]"), 0);
}

#[tokio::test]
async fn test_already_cancelled_touches_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let page = FakePage::new(&[("@a", "satu")]);
    let outcome = session_with(3, SortOrder::Newest, cancel)
        .run(&page, &mut CollectOnly)
        .await;

    assert_eq!(outcome.reason, TerminationReason::Interrupted);
    assert!(outcome.comments.is_empty());
    assert!(page.calls().is_empty());
}
