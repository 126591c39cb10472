//! End-to-end panel flows against a mocked CMS API
//!
//! Commands produced by a panel are run with `execute` against wiremock and
//! their completions fed back, the same way the page shell does it.

use serde_json::json;
use std::time::Duration;
use tcms::api::CmsClient;
use tcms::app::{ActivePanel, App, Mode, Tab};
use tcms::config::Config;
use tcms::panel::{execute, settle_unmounted, Panel, PanelId, PanelState};
use tcms::resource::{BlockFilter, ContentBlock, EmailTemplate, Resource};
use tcms::store::ResourceStore;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn block_json(id: i64, key: &str, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "key": key,
        "category": category,
        "title": key,
        "html_content": "<p>hi</p>",
        "variables": []
    })
}

async fn mount_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Panel with its first list applied
async fn loaded_panel(client: &CmsClient, store: &mut ResourceStore) -> Panel<ContentBlock> {
    let mut panel = Panel::new(PanelId(1));
    let command = panel.load(store).expect("cold cache lists");
    let completion = execute(client, command).await;
    panel.apply(completion, store);
    panel
}

fn fill(panel: &mut Panel<ContentBlock>, values: &[(&str, &str)]) {
    let form = panel.form.as_mut().expect("form is open");
    for (key, value) in values {
        form.values.set_text(key, *value);
    }
}

#[tokio::test]
async fn test_search_narrows_loaded_blocks() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            block_json(1, "intro", "content"),
            block_json(2, "tour_step1", "product_tour")
        ]),
    )
    .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;
    assert_eq!(panel.state, PanelState::Loaded);

    panel.search_text = "tour".to_string();
    panel.apply_filter();
    let keys: Vec<_> = panel.visible_items().map(|(b, _)| b.key.clone()).collect();
    assert_eq!(keys, vec!["tour_step1"]);
}

#[tokio::test]
async fn test_create_success_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/cms/blocks"))
        .and(body_json(json!({
            "key": "faq_1",
            "category": "content",
            "title": "FAQ",
            "html_content": "<p>?</p>",
            "variables": ["user_name", "accept_url"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(block_json(3, "faq_1", "content")))
        .expect(1)
        .mount(&server)
        .await;

    // First list is empty, the refetch sees the new block
    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_list(&server, json!([block_json(3, "faq_1", "content")])).await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;
    assert_eq!(panel.visible_len(), 0);

    panel.open_create();
    fill(
        &mut panel,
        &[
            ("key", "faq_1"),
            ("title", "FAQ"),
            ("html_content", "<p>?</p>"),
            ("variables", "user_name, accept_url"),
        ],
    );
    let command = panel.submit().expect("valid form submits");
    let generation = store.generation::<ContentBlock>();

    let applied = panel.apply(execute(&client, command).await, &mut store);
    assert_eq!(applied.mutation, Some(Ok("Created faq_1".to_string())));
    assert!(panel.form.is_none());
    assert!(store.generation::<ContentBlock>() > generation);

    let follow_up = applied.follow_up.expect("mutation refetches");
    panel.apply(execute(&client, follow_up).await, &mut store);
    assert_eq!(panel.visible_len(), 1);
    assert_eq!(
        store.get::<ContentBlock>(&BlockFilter::default()).map(|b| b.len()),
        Some(1)
    );
}

#[tokio::test]
async fn test_failed_create_keeps_form_and_cache() {
    let server = MockServer::start().await;
    mount_list(&server, json!([block_json(1, "intro", "content")])).await;

    Mock::given(method("POST"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Block with key 'intro' already exists"
        })))
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;

    panel.open_create();
    fill(
        &mut panel,
        &[("key", "intro"), ("title", "Again"), ("html_content", "<p/>")],
    );
    let command = panel.submit().unwrap();
    let generation = store.generation::<ContentBlock>();

    let applied = panel.apply(execute(&client, command).await, &mut store);
    assert_eq!(
        applied.mutation,
        Some(Err("Block with key 'intro' already exists".to_string()))
    );
    assert!(applied.follow_up.is_none());

    let form = panel.form.as_ref().expect("form stays open");
    assert!(!form.submitting);
    assert_eq!(form.values.text("title"), "Again");
    assert_eq!(store.generation::<ContentBlock>(), generation);
    assert!(store.get::<ContentBlock>(&BlockFilter::default()).is_some());
}

#[tokio::test]
async fn test_superseded_list_is_dropped() {
    let server = MockServer::start().await;
    mount_list(&server, json!([block_json(1, "intro", "content")])).await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel: Panel<ContentBlock> = Panel::new(PanelId(1));

    let older = panel.refresh(&store);
    let newer = panel.refresh(&store);

    let newer_done = execute(&client, newer).await;
    let mut older_done = execute(&client, older).await;
    // Pretend the slow response carried stale data
    if let Ok(tcms::panel::Outcome::Listed { items, .. }) = &mut older_done.result {
        items.clear();
    }

    panel.apply(newer_done, &mut store);
    panel.apply(older_done, &mut store);
    assert_eq!(panel.visible_len(), 1);
    assert_eq!(panel.state, PanelState::Loaded);
}

#[tokio::test]
async fn test_delete_then_list_excludes_entity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            block_json(1, "intro", "content"),
            block_json(2, "outro", "content")
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_list(&server, json!([block_json(2, "outro", "content")])).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/cms/blocks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;
    assert_eq!(panel.visible_len(), 2);

    let command = panel.delete(1);
    let applied = panel.apply(execute(&client, command).await, &mut store);
    assert_eq!(applied.mutation, Some(Ok("Deleted #1".to_string())));

    panel.apply(execute(&client, applied.follow_up.unwrap()).await, &mut store);
    assert!(panel.items().iter().all(|b| b.id != 1));
}

#[tokio::test]
async fn test_import_twice_reports_each_result() {
    let server = MockServer::start().await;
    mount_list(&server, json!([block_json(1, "intro", "content")])).await;

    Mock::given(method("POST"))
        .and(path("/admin/cms/blocks/import-missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            block_json(5, "terms", "legal"),
            block_json(6, "privacy", "legal")
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/cms/blocks/import-missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;

    let first = panel.import("import-missing").unwrap();
    let applied = panel.apply(execute(&client, first).await, &mut store);
    assert_eq!(
        applied.mutation,
        Some(Ok("Import missing defaults: 2 returned".to_string()))
    );
    assert!(applied.follow_up.is_some());

    let second = panel.import("import-missing").unwrap();
    let applied = panel.apply(execute(&client, second).await, &mut store);
    assert_eq!(
        applied.mutation,
        Some(Ok("Import missing defaults: 0 returned".to_string()))
    );
}

#[tokio::test]
async fn test_unmounted_completion_only_invalidates() {
    let server = MockServer::start().await;
    mount_list(&server, json!([block_json(1, "intro", "content")])).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/cms/blocks/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;

    let delete = panel.delete(1);
    let late_list = panel.refresh(&store);
    drop(panel);

    // Remounted panel is served from cache until the mutation lands
    let mut remounted: Panel<ContentBlock> = Panel::new(PanelId(2));
    assert!(remounted.load(&store).is_none());

    let list_done = execute(&client, late_list).await;
    assert_eq!(settle_unmounted(list_done, &mut store), None);

    let delete_done = execute(&client, delete).await;
    assert_eq!(
        settle_unmounted(delete_done, &mut store),
        Some(Ok("Deleted #1".to_string()))
    );
    assert!(remounted.load(&store).is_some());
}

fn email_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "category": "invites",
        "subject_template": "Join {{org}}",
        "body_html": "<p/>",
        "variables": ["org"]
    })
}

#[tokio::test]
async fn test_email_paging_requests_next_offset() {
    let server = MockServer::start().await;

    let full_page: Vec<_> = (1..=100)
        .map(|id| email_json(id, &format!("template_{}", id)))
        .collect();
    Mock::given(method("GET"))
        .and(path("/admin/cms/email-templates"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/cms/email-templates"))
        .and(query_param("skip", "100"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([email_json(101, "invite")])))
        .expect(1)
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel: Panel<EmailTemplate> = Panel::new(PanelId(1));

    let first = panel.load(&store).expect("cold cache lists");
    panel.apply(execute(&client, first).await, &mut store);
    assert_eq!(panel.items().len(), 100);

    let command = panel.turn_page(true, &store).expect("second page is fetched");
    panel.apply(execute(&client, command).await, &mut store);
    assert_eq!(EmailTemplate::page_number(panel.filter()), Some(2));
    assert_eq!(panel.items()[0].name, "invite");
    assert!(panel.items()[0].is_active);

    // One row on this page: it is the last
    assert!(panel.turn_page(true, &store).is_none());
    assert_eq!(EmailTemplate::page_number(panel.filter()), Some(2));
}

#[tokio::test]
async fn test_concurrent_mutations_render_last_refetch() {
    let server = MockServer::start().await;

    let titled = |id: i64, key: &str, title: &str| {
        json!({
            "id": id,
            "key": key,
            "category": "content",
            "title": title,
            "html_content": "<p/>",
            "variables": []
        })
    };

    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([titled(1, "intro", "Old"), titled(2, "outro", "Bye")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([titled(1, "intro", "New")])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/cms/blocks/1"))
        .and(body_json(json!({"title": "New"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(titled(1, "intro", "New")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/cms/blocks/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut store = ResourceStore::default();
    let mut panel = loaded_panel(&client, &mut store).await;
    assert_eq!(panel.visible_len(), 2);

    panel.selected = 0;
    assert!(panel.open_edit());
    fill(&mut panel, &[("title", "New")]);
    let update = panel.submit().expect("changed title submits");
    let delete = panel.delete(2);

    let (updated, deleted) = tokio::join!(execute(&client, update), execute(&client, delete));

    let after_update = panel.apply(updated, &mut store);
    assert_eq!(after_update.mutation, Some(Ok("Updated intro".to_string())));
    let after_delete = panel.apply(deleted, &mut store);
    assert_eq!(after_delete.mutation, Some(Ok("Deleted #2".to_string())));

    let older = after_update.follow_up.expect("update refetches");
    let newer = after_delete.follow_up.expect("delete refetches");
    assert!(newer.seq > older.seq);

    let newer_done = execute(&client, newer).await;
    let mut older_done = execute(&client, older).await;
    // The earlier refetch raced the delete and still saw both rows
    if let Ok(tcms::panel::Outcome::Listed { items, .. }) = &mut older_done.result {
        items.push(ContentBlock {
            id: 2,
            key: "outro".to_string(),
            category: "content".to_string(),
            title: "Bye".to_string(),
            html_content: "<p/>".to_string(),
            description: None,
            variables: Vec::new(),
            created_at: None,
            updated_at: None,
        });
    }

    panel.apply(newer_done, &mut store);
    panel.apply(older_done, &mut store);

    let shown: Vec<_> = panel
        .items()
        .iter()
        .map(|b| (b.id, b.title.clone()))
        .collect();
    assert_eq!(shown, vec![(1, "New".to_string())]);
    assert_eq!(panel.state, PanelState::Loaded);
    assert_eq!(
        store.get::<ContentBlock>(&BlockFilter::default()).map(|b| b.len()),
        Some(1)
    );
}

/// Drain completions until `done` holds or a second passes
async fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
    for _ in 0..100 {
        app.drain_completions();
        if done(app) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("app did not settle");
}

fn block_count(app: &App) -> Option<usize> {
    match &app.active {
        ActivePanel::ContentBlocks(panel) if panel.state == PanelState::Loaded => {
            Some(panel.items().len())
        },
        _ => None,
    }
}

#[tokio::test]
async fn test_app_create_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_list(&server, json!([block_json(3, "faq_1", "content")])).await;

    Mock::given(method("POST"))
        .and(path("/admin/cms/blocks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(block_json(3, "faq_1", "content")))
        .mount(&server)
        .await;

    let client = CmsClient::new(&server.uri(), None).unwrap();
    let mut app = App::new(client, Config::default(), Tab::ContentBlocks, false);
    settle(&mut app, |app| block_count(app) == Some(0)).await;

    app.open_create();
    assert_eq!(app.mode, Mode::Form);
    if let ActivePanel::ContentBlocks(panel) = &mut app.active {
        fill(
            panel,
            &[("key", "faq_1"), ("title", "FAQ"), ("html_content", "<p>?</p>")],
        );
    }
    app.submit_form();

    settle(&mut app, |app| block_count(app) == Some(1)).await;
    assert_eq!(app.mode, Mode::Normal);

    let notification = app.session.notifications.notifications.front().unwrap();
    assert_eq!(notification.subject, "faq_1");
    assert_eq!(notification.message.as_deref(), Some("Created faq_1"));
}
