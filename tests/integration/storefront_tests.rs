use std::time::Duration;

use disc_watcher::{DispatchOutcome, SnapshotStore, Watcher};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

struct Fixture {
    dir: TempDir,
    shop: MockServer,
    discord: MockServer,
}

impl Fixture {
    async fn new(discord_status: u16) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let shop = MockServer::start().await;
        let discord = discord_channel(discord_status).await;

        write_sources(
            &dir,
            &format!(
                "[discraft]\nledgestone = \"{0}/collections/ledgestone\"\nesp = \"{0}/collections/esp\"\n",
                shop.uri()
            ),
        );

        Self { dir, shop, discord }
    }

    fn watcher(&self) -> Watcher {
        Watcher::from_config(&get_test_config(self.dir.path(), &self.discord.uri())).unwrap()
    }

    fn store(&self) -> SnapshotStore {
        SnapshotStore::new(self.dir.path().join("discs.json"))
    }
}

#[tokio::test]
async fn test_cold_start_then_announce_new_disc() {
    let fixture = Fixture::new(200).await;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;

    let first = fixture.watcher().run().await.unwrap();
    assert_eq!(first.dispatch, DispatchOutcome::SkippedColdStart);
    assert!(first.deltas.is_empty());
    assert!(posted_messages(&fixture.discord).await.is_empty());

    serve_pages(
        &fixture.shop,
        &[
            (
                "/collections/ledgestone",
                storefront_page(&[("Buzzz SS", "In stock", "21.99"), ("Luna", "In stock", "19.99")]),
            ),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;

    let second = fixture.watcher().run().await.unwrap();
    assert_eq!(second.dispatch, DispatchOutcome::Sent { messages: 1 });
    assert_eq!(second.deltas.len(), 1);

    let posts = posted_messages(&fixture.discord).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "NEW DISCS IN STOCK");
    let embed = &posts[0]["embeds"][0];
    assert_eq!(embed["title"], "[discraft] Luna");
    assert_eq!(embed["description"], "$19.99");
    assert_eq!(embed["url"], format!("{}/products/luna", fixture.shop.uri()));
    assert_eq!(embed["image"]["url"], format!("{}/cdn/luna.jpg", fixture.shop.uri()));

    // A third identical run has nothing new to say
    let third = fixture.watcher().run().await.unwrap();
    assert_eq!(third.dispatch, DispatchOutcome::NothingNew);
    assert_eq!(posted_messages(&fixture.discord).await.len(), 1);
}

#[tokio::test]
async fn test_out_of_stock_disc_is_never_announced() {
    let fixture = Fixture::new(200).await;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;
    fixture.watcher().run().await.unwrap();

    serve_pages(
        &fixture.shop,
        &[
            (
                "/collections/ledgestone",
                storefront_page(&[("Buzzz SS", "In stock", "21.99"), ("Luna", "Out of stock", "19.99")]),
            ),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;

    let summary = fixture.watcher().run().await.unwrap();
    assert!(summary.deltas.is_empty());
    assert!(posted_messages(&fixture.discord).await.is_empty());

    let saved = fixture.store().load().await.unwrap();
    assert!(!saved["discraft"]["ledgestone"].contains_key("Luna"));
}

#[tokio::test]
async fn test_dispatch_failure_still_saves_snapshot() {
    let fixture = Fixture::new(500).await;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;
    fixture.watcher().run().await.unwrap();

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            (
                "/collections/esp",
                storefront_page(&[("Zone", "In stock", "18.99"), ("Thrasher", "In stock", "17.99")]),
            ),
        ],
    )
    .await;

    let summary = fixture.watcher().run().await.unwrap();
    assert!(matches!(summary.dispatch, DispatchOutcome::Failed { .. }));
    assert_eq!(posted_messages(&fixture.discord).await.len(), 1);

    let saved = fixture.store().load().await.unwrap();
    assert!(saved["discraft"]["esp"].contains_key("Thrasher"));

    // The failed announcement is not retried on the next run
    let next = fixture.watcher().run().await.unwrap();
    assert_eq!(next.dispatch, DispatchOutcome::NothingNew);
}

#[tokio::test]
async fn test_broken_page_is_saved_empty_and_reannounced_on_recovery() {
    let fixture = Fixture::new(200).await;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;
    fixture.watcher().run().await.unwrap();

    // ledgestone now 404s; esp gains a disc
    serve_pages(
        &fixture.shop,
        &[(
            "/collections/esp",
            storefront_page(&[("Zone", "In stock", "18.99"), ("Heat", "In stock", "16.99")]),
        )],
    )
    .await;

    let summary = fixture.watcher().run().await.unwrap();
    assert_eq!(summary.sources_failed, 1);
    assert_eq!(summary.deltas.len(), 1);
    assert_eq!(summary.deltas[0].title, "Heat");

    let posts = posted_messages(&fixture.discord).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["embeds"][0]["title"], "[discraft] Heat");

    let saved = fixture.store().load().await.unwrap();
    assert!(saved["discraft"]["ledgestone"].is_empty());

    // The empty category makes the recovered page look new
    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            (
                "/collections/esp",
                storefront_page(&[("Zone", "In stock", "18.99"), ("Heat", "In stock", "16.99")]),
            ),
        ],
    )
    .await;

    let recovered = fixture.watcher().run().await.unwrap();
    assert_eq!(recovered.sources_failed, 0);
    assert_eq!(recovered.deltas.len(), 1);
    assert_eq!(recovered.deltas[0].title, "Buzzz SS");
}

#[tokio::test]
async fn test_stalled_discord_still_saves_snapshot() {
    let fixture = Fixture::new(200).await;
    let stalled = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&stalled)
        .await;

    let mut config = get_test_config(fixture.dir.path(), &stalled.uri());
    config.notifications.discord.request_timeout = 1;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;
    Watcher::from_config(&config).unwrap().run().await.unwrap();

    serve_pages(
        &fixture.shop,
        &[
            (
                "/collections/ledgestone",
                storefront_page(&[("Buzzz SS", "In stock", "21.99"), ("Luna", "In stock", "19.99")]),
            ),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
        ],
    )
    .await;

    let summary = tokio::time::timeout(Duration::from_secs(8), Watcher::from_config(&config).unwrap().run())
        .await
        .expect("run should not hang on a stalled Discord")
        .unwrap();

    assert!(matches!(summary.dispatch, DispatchOutcome::Failed { .. }));
    let saved = fixture.store().load().await.unwrap();
    assert!(saved["discraft"]["ledgestone"].contains_key("Luna"));
}

#[tokio::test]
async fn test_newly_configured_category_is_quiet() {
    let fixture = Fixture::new(200).await;

    serve_pages(
        &fixture.shop,
        &[
            ("/collections/ledgestone", storefront_page(&[("Buzzz SS", "In stock", "21.99")])),
            ("/collections/esp", storefront_page(&[("Zone", "In stock", "18.99")])),
            ("/collections/z-line", storefront_page(&[("Nuke", "In stock", "19.99")])),
        ],
    )
    .await;
    fixture.watcher().run().await.unwrap();

    write_sources(
        &fixture.dir,
        &format!(
            "[discraft]\nledgestone = \"{0}/collections/ledgestone\"\nesp = \"{0}/collections/esp\"\nz-line = \"{0}/collections/z-line\"\n",
            fixture.shop.uri()
        ),
    );

    let summary = fixture.watcher().run().await.unwrap();
    assert!(summary.deltas.is_empty());
    assert_eq!(summary.dispatch, DispatchOutcome::NothingNew);
    assert!(posted_messages(&fixture.discord).await.is_empty());

    let saved = fixture.store().load().await.unwrap();
    assert!(saved["discraft"]["z-line"].contains_key("Nuke"));
}
