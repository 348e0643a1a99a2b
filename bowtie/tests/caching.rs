//! Cache interception around invocations.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bowtie::{
    AdapterConfig, Arguments, BowtieError, CacheStatus, InvocationState, MethodSpec, Param, Proxy,
    RestAdapter, ReturnShape,
};
use bowtie_backend::{CacheStore, InvalidateStatus};
use bowtie_core::{RestCachingPolicy, derive_key};
use bowtie_moka::MokaStore;
use common::{BrokenStore, FakeUser, FakeUserAddress, MockTransport, json, json_cached};
use http::{Method, StatusCode};

const SESSION: &str = "55892d6d-77df-4617-b728-6f5de97f5752";

fn user_specs() -> Vec<MethodSpec> {
    vec![
        MethodSpec::get("getCachedUser", "/user/{username}")
            .header("X-SESSION-ID", SESSION)
            .param(Param::path("username"))
            .cache("userCache"),
        MethodSpec::get("getCachedUserResponse", "/user/{username}")
            .header("X-SESSION-ID", SESSION)
            .param(Param::path("username"))
            .cache("userCache")
            .returns(ReturnShape::Response),
        MethodSpec::get("getUserAddress", "/user/{type}/{username}")
            .header("Cache-Control", "no-cache")
            .param(Param::path("username"))
            .param(Param::path("type"))
            .cache("userCache"),
        MethodSpec::get("listUsers", "/users")
            .param(Param::query("page"))
            .cache("listCache")
            .returns(ReturnShape::Response),
        MethodSpec::post("emailUser", "/user/email")
            .param(Param::body("user"))
            .cache("userCache")
            .returns(ReturnShape::Response),
    ]
}

fn setup(transport: Arc<MockTransport>, store: MokaStore) -> Proxy {
    let config = AdapterConfig::builder().store(store).build();
    RestAdapter::new("http://localhost:9090", config, transport)
        .unwrap()
        .proxy(user_specs())
        .unwrap()
}

fn bdoe() -> Arguments {
    Arguments::new().with("username", "bdoe")
}

#[tokio::test]
async fn test_cached_user_is_fetched_once() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(
            r#"{ "name" : "Bob Doe" }"#,
            "no-transform,public,max-age=300,s-maxage=900",
        ),
    );
    let store = MokaStore::builder().max_entries(100).build();
    let proxy = setup(transport.clone(), store.clone());

    let user: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(user.name, "Bob Doe");
    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.last_request().headers()["x-session-id"], SESSION);

    let key = derive_key("userCache", "/user/bdoe", Vec::<(&str, &str)>::new()).unwrap();
    assert_eq!(key.as_str(), "userCache:/user/bdoe");
    let entry = store.get(&key).await.unwrap().expect("entry stored");
    let cached: FakeUser = serde_json::from_slice(entry.cached_bytes()).unwrap();
    assert_eq!(cached.name, "Bob Doe");
    assert!(entry.expires_at().is_some());

    let user: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(user.name, "Bob Doe");
    assert_eq!(transport.calls(), 1, "second call must be served from cache");

    let response = proxy.response("getCachedUserResponse", bdoe()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: FakeUser = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(user.name, "Bob Doe");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_exchange_reports_cache_status() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=300"),
    );
    let proxy = setup(transport, MokaStore::builder().max_entries(100).build());

    let first = proxy.exchange("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(first.cache_status, CacheStatus::Miss);
    assert_eq!(first.state, InvocationState::Complete);
    assert_eq!(first.key.unwrap().as_str(), "userCache:/user/bdoe");

    let second = proxy.exchange("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(second.cache_status, CacheStatus::Hit);
    assert_eq!(second.state, InvocationState::CacheHit);
    assert_eq!(second.response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_cache_request_never_populates_cache() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/address/jdoe",
        json_cached(
            r#"{ "address" : "1060 W Addison St, Chicago, IL 60613" }"#,
            "public, max-age=300",
        ),
    );
    let store = MokaStore::builder().max_entries(100).build();
    let proxy = setup(transport.clone(), store.clone());
    let args = || {
        Arguments::new()
            .with("username", "jdoe")
            .with("type", "address")
    };

    for _ in 0..2 {
        let address: FakeUserAddress = proxy.call("getUserAddress", args()).await.unwrap();
        assert_eq!(address.address, "1060 W Addison St, Chicago, IL 60613");
    }
    assert_eq!(transport.calls(), 2);

    let exchange = proxy.exchange("getUserAddress", args()).await.unwrap();
    assert_eq!(exchange.cache_status, CacheStatus::Bypass);

    let key = proxy.cache_key("getUserAddress", &args()).unwrap().unwrap();
    assert_eq!(key.as_str(), "userCache:/user/address/jdoe");
    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_response_without_cache_control_is_not_stored() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/jdoe",
        json(StatusCode::OK, r#"{"name":"John Doe"}"#),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());

    for _ in 0..2 {
        let user: FakeUser = proxy
            .call("getCachedUser", Arguments::new().with("username", "jdoe"))
            .await
            .unwrap();
        assert_eq!(user.name, "John Doe");
    }
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_zero_max_age_is_not_stored() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=0"),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());

    let _: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    let exchange = proxy.exchange("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(exchange.cache_status, CacheStatus::Miss);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_post_bypasses_cache() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::POST,
        "/user/email",
        json_cached("", "public, max-age=300"),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());
    let args = || {
        Arguments::new().with_body(FakeUser {
            name: "John Doe".to_owned(),
        })
    };

    for _ in 0..2 {
        let exchange = proxy.exchange("emailUser", args()).await.unwrap();
        assert_eq!(exchange.cache_status, CacheStatus::Bypass);
        assert_eq!(exchange.response.status(), StatusCode::OK);
        assert!(exchange.key.is_none());
    }
    assert_eq!(transport.calls(), 2);
    assert_eq!(&transport.last_request().body()[..], br#"{"name":"John Doe"}"#);
}

#[tokio::test]
async fn test_query_parameters_discriminate_keys() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/users",
        json_cached(r#"{"users":[]}"#, "public, max-age=300"),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());

    let page = |n: u32| Arguments::new().with("page", n);
    assert_eq!(
        proxy.cache_key("listUsers", &page(1)).unwrap().unwrap().as_str(),
        "listCache:/users?page=1"
    );

    proxy.response("listUsers", page(1)).await.unwrap();
    proxy.response("listUsers", page(2)).await.unwrap();
    proxy.response("listUsers", page(1)).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=300"),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());

    let _: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(
        proxy.invalidate("getCachedUser", bdoe()).await.unwrap(),
        InvalidateStatus::Removed
    );
    assert_eq!(
        proxy.invalidate("getCachedUser", bdoe()).await.unwrap(),
        InvalidateStatus::Missing
    );

    let _: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_store_failures_fall_back_to_network() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=300"),
    );
    let store = Arc::new(BrokenStore::default());
    let config = AdapterConfig::builder()
        .shared_store(store.clone())
        .build();
    let proxy = RestAdapter::new("http://localhost:9090", config, transport.clone())
        .unwrap()
    .proxy(user_specs())
    .unwrap();

    for _ in 0..2 {
        let user: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
        assert_eq!(user.name, "Bob Doe");
    }
    assert_eq!(transport.calls(), 2);
    assert_eq!(store.gets.load(Ordering::SeqCst), 2);
    assert_eq!(store.puts.load(Ordering::SeqCst), 2);

    // Explicit invalidation reports the failure.
    assert!(matches!(
        proxy.invalidate("getCachedUser", bdoe()).await,
        Err(BowtieError::Store(_))
    ));
}

#[tokio::test]
async fn test_without_store_everything_is_fetched() {
    let transport = Arc::new(MockTransport::new());
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=300"),
    );
    let proxy = RestAdapter::new(
        "http://localhost:9090",
        AdapterConfig::default(),
        transport.clone(),
    )
    .unwrap()
    .proxy(user_specs())
    .unwrap();

    let exchange = proxy.exchange("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(exchange.cache_status, CacheStatus::Bypass);
    let _ = proxy.exchange("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(transport.calls(), 2);
    assert_eq!(
        proxy.invalidate("getCachedUser", bdoe()).await.unwrap(),
        InvalidateStatus::Missing
    );
}

#[tokio::test]
async fn test_lenient_policy_caches_uncommon_status() {
    let transport = Arc::new(MockTransport::new());
    transport.route(Method::GET, "/users", json(StatusCode::NOT_FOUND, ""));
    let config = AdapterConfig::builder()
        .store(MokaStore::builder().max_entries(100).build())
        .policy(RestCachingPolicy::lenient())
        .build();
    let proxy = RestAdapter::new("http://localhost:9090", config, transport.clone())
        .unwrap()
    .proxy(user_specs())
    .unwrap();

    let args = || Arguments::new().with("page", 1);
    let first = proxy.exchange("listUsers", args()).await.unwrap();
    assert_eq!(first.response.status(), StatusCode::NOT_FOUND);
    let second = proxy.exchange("listUsers", args()).await.unwrap();
    assert_eq!(second.cache_status, CacheStatus::Hit);
    assert_eq!(second.response.status(), StatusCode::NOT_FOUND);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_each_fetch() {
    let transport = Arc::new(MockTransport::delayed(Duration::from_millis(50)));
    transport.route(
        Method::GET,
        "/user/bdoe",
        json_cached(r#"{"name":"Bob Doe"}"#, "public, max-age=300"),
    );
    let proxy = setup(transport.clone(), MokaStore::builder().max_entries(100).build());

    let calls = (0..3).map(|_| proxy.call::<FakeUser>("getCachedUser", bdoe()));
    let users = futures::future::join_all(calls).await;
    assert!(users.iter().all(|user| user.as_ref().unwrap().name == "Bob Doe"));
    assert_eq!(transport.calls(), 3);

    let _: FakeUser = proxy.call("getCachedUser", bdoe()).await.unwrap();
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_reserved_characters_in_path_values_get_distinct_keys() {
    let transport = Arc::new(MockTransport::new());
    let routes = [
        ("/item/x%2Fy/z", r#"{"name":"A"}"#),
        ("/item/x/y%2Fz", r#"{"name":"B"}"#),
        ("/item/j%20doe/z", r#"{"name":"C"}"#),
        ("/item/j%2520doe/z", r#"{"name":"D"}"#),
        ("/item/a%3Fb/z", r#"{"name":"E"}"#),
    ];
    for (path, body) in routes {
        transport.route(Method::GET, path, json_cached(body, "public, max-age=300"));
    }
    let config = AdapterConfig::builder()
        .store(MokaStore::builder().max_entries(100).build())
        .build();
    let proxy = RestAdapter::new("http://localhost:9090", config, transport.clone())
        .unwrap()
        .proxy(vec![
            MethodSpec::get("getItem", "/item/{a}/{b}")
                .param(Param::path("a"))
                .param(Param::path("b"))
                .cache("items"),
        ])
        .unwrap();

    let cases = [
        ("x/y", "z", "A"),
        ("x", "y/z", "B"),
        ("j doe", "z", "C"),
        ("j%20doe", "z", "D"),
        ("a?b", "z", "E"),
    ];
    let item = |a: &str, b: &str| Arguments::new().with("a", a).with("b", b);

    let mut keys = Vec::new();
    for (a, b, expected) in cases {
        let exchange = proxy.exchange("getItem", item(a, b)).await.unwrap();
        assert_eq!(exchange.cache_status, CacheStatus::Miss, "{a}/{b}");
        let user: FakeUser = serde_json::from_slice(exchange.response.body()).unwrap();
        assert_eq!(user.name, expected);

        let key = exchange.key.unwrap();
        assert_eq!(
            format!("items:{}", transport.last_request().url().path()),
            key.as_str()
        );
        keys.push(key);
    }
    assert_eq!(transport.calls(), cases.len());
    for (i, key) in keys.iter().enumerate() {
        assert!(keys[i + 1..].iter().all(|other| other != key));
    }

    // Each argument set is now served from its own entry.
    for (a, b, expected) in cases {
        let user: FakeUser = proxy.call("getItem", item(a, b)).await.unwrap();
        assert_eq!(user.name, expected);
    }
    assert_eq!(transport.calls(), cases.len());
}
