//! Monster resource integration tests
//!
//! List, detail and create through the query cache: request parameters,
//! deduplication, next-page prefetch, invalidation and stale fallback.

use crate::common::{monster_json, monsters_page_json, TestApi};
use aidex::client::resources::{monster_keys, monsters, user};
use aidex::client::{ApiError, MonsterListParams, NotificationSource, TypeFilter};
use aidex::shared::monster::{MonsterType, MonstersResponse};
use aidex::shared::pagination::{showing_range, visible_pages, PageItem};
use aidex::shared::rarity::{calculate_rarity, Rarity};
use aidex::shared::validation::CreateMonsterForm;
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_page(api: &TestApi, page: u32, total_items: u64, expect: u64) {
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(monsters_page_json(page, 10, total_items)))
        .expect(expect)
        .mount(&api.server)
        .await;
}

#[tokio::test]
async fn test_last_page_of_ninety_five() {
    let api = TestApi::start().await;
    mount_page(&api, 10, 95, 1).await;

    let session = api.session();
    let cache = api.cache(&session);
    let params = MonsterListParams::new(10).page(10);

    let data = monsters::monsters(&session, &cache, &params).await.unwrap();
    assert_eq!(data.monsters.len(), 5);
    assert_eq!(data.pagination.total_pages(), 10);
    assert_eq!(
        showing_range(data.pagination.page, data.pagination.page_size, data.pagination.total_items),
        Some((91, 95))
    );
    assert_eq!(visible_pages(10, 10).last(), Some(&PageItem::Page(10)));

    // No page 11 exists, so nothing is prefetched
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!cache.is_fetching(&monster_keys::list(&params.next_page())));
}

#[tokio::test]
async fn test_next_page_is_prefetched() {
    let api = TestApi::start().await;
    mount_page(&api, 1, 95, 1).await;
    mount_page(&api, 2, 95, 1).await;

    let session = api.session();
    let cache = api.cache(&session);
    let params = MonsterListParams::new(10);

    monsters::monsters(&session, &cache, &params).await.unwrap();

    let next = monster_keys::list(&params.next_page());
    cache.wait_for(&next).await;
    let prefetched = cache.get_cached::<MonstersResponse>(&next).unwrap();
    assert_eq!(prefetched.pagination.page, 2);

    // Served from the cache without another request
    monsters::monsters(&session, &cache, &params.next_page()).await.unwrap();
}

#[tokio::test]
async fn test_list_request_parameters() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(monsters_page_json(1, 10, 3)))
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);
    let types: TypeFilter = [MonsterType::Water, MonsterType::Fire].into_iter().collect();
    let params = MonsterListParams::new(10).types(types).search("drag");

    monsters::monsters(&session, &cache, &params).await.unwrap();

    let requests = api.requests_to("/monsters").await;
    assert_eq!(requests.len(), 1);
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("page".to_string(), "1".to_string()),
            ("pageSize".to_string(), "10".to_string()),
            ("types".to_string(), "FIRE".to_string()),
            ("types".to_string(), "WATER".to_string()),
            ("search".to_string(), "drag".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_queries_share_one_request() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(monsters_page_json(1, 10, 5))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);
    let params = MonsterListParams::new(10);

    let (a, b, c) = tokio::join!(
        monsters::monsters(&session, &cache, &params),
        monsters::monsters(&session, &cache, &params),
        monsters::monsters(&session, &cache, &params),
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
}

#[tokio::test]
async fn test_create_monster_invalidates_lists() {
    let api = TestApi::start().await;
    mount_page(&api, 1, 5, 2).await;
    Mock::given(method("POST"))
        .and(path("/monsters/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 42 })))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    session.set_token(Some("T1".to_string()));
    let cache = api.cache(&session);
    let params = MonsterListParams::new(10);
    let key = monster_keys::list(&params);

    monsters::monsters(&session, &cache, &params).await.unwrap();
    assert!(cache.is_fresh(&key));

    let form = CreateMonsterForm {
        name: "Voltorb".to_string(),
        description: "Rolls around".to_string(),
        story: String::new(),
        types: vec![MonsterType::Electric],
    };
    let created = monsters::create_monster(&session, &cache, &form).await.unwrap();
    assert_eq!(created.id, "42");
    assert!(!cache.is_fresh(&key));

    let body: serde_json::Value = api.requests_to("/monsters/create").await[0].body_json().unwrap();
    assert_eq!(body["types"], serde_json::json!(["ELECTRIC"]));
    assert!(body.get("story").is_none());

    // Next read goes back to the server
    monsters::monsters(&session, &cache, &params).await.unwrap();

    let notes = session.notifier().drain();
    assert!(notes.iter().any(|n| n.source == NotificationSource::Mutation));
}

#[tokio::test]
async fn test_create_monster_with_three_types_is_rejected() {
    let api = TestApi::start().await;
    let session = api.session();
    let cache = api.cache(&session);
    let form = CreateMonsterForm {
        name: "Chimera".to_string(),
        description: "Too many types".to_string(),
        story: String::new(),
        types: vec![MonsterType::Fire, MonsterType::Water, MonsterType::Grass],
    };

    let result = monsters::create_monster(&session, &cache, &form).await;
    assert_matches!(result, Err(ApiError::Validation { .. }));
    assert!(api.requests_to("/monsters/create").await.is_empty());
}

#[tokio::test]
async fn test_monster_detail_and_rarity() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monster/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "monster": monster_json(7, "Mewtwo", 680) })),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);

    let monster = monsters::monster(&session, &cache, "7").await.unwrap();
    assert_eq!(monster.name, "Mewtwo");
    assert_eq!(monster.stats.total(), 680);
    assert_eq!(calculate_rarity(&monster), Rarity::Legendary);

    let again = monsters::monster(&session, &cache, "7").await.unwrap();
    assert!(Arc::ptr_eq(&monster, &again));
}

#[tokio::test]
async fn test_missing_monster_is_an_error() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monster/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "message": "Monster not found" })),
        )
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);

    let result = monsters::monster(&session, &cache, "404").await;
    assert_matches!(result, Err(ApiError::Server { status: 404, ref message }) if message == "Monster not found");
}

#[tokio::test]
async fn test_stale_data_served_when_refetch_fails() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(monsters_page_json(1, 10, 3)))
        .up_to_n_times(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monsters"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);
    let params = MonsterListParams::new(10);

    let first = monsters::monsters(&session, &cache, &params).await.unwrap();
    cache.invalidate(&monster_keys::all());

    let second = monsters::monsters(&session, &cache, &params).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let notes = session.notifier().drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].source, NotificationSource::Query);
}

#[tokio::test]
async fn test_current_user_needs_a_session() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crate::common::user_json("Ash", "ash@example.com")))
        .expect(1)
        .mount(&api.server)
        .await;

    let session = api.session();
    let cache = api.cache(&session);

    assert!(user::current_user(&session, &cache).await.unwrap().is_none());

    session.set_token(Some("T1".to_string()));
    let me = user::current_user(&session, &cache).await.unwrap().unwrap();
    assert_eq!(me.initials(), "A");
}
