mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use catalog::application::repos::{
    CategoriesWriteRepo, CreateCategoryParams, CreateProductParams, ProductsWriteRepo,
};
use catalog::cache::CacheTag;
use catalog::domain::price::Price;
use serde_json::json;

use common::app;

#[tokio::test]
async fn create_category_assigns_first_id() {
    let app = app();

    let response = app
        .post("/categories/", json!({ "name": "Test Category" }))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(response.body, @r#"
        {
          "description": null,
          "id": 1,
          "name": "Test Category"
        }
        "#);
    });
}

#[tokio::test]
async fn category_list_is_served_from_cache_until_invalidated() {
    let app = app();
    app.create_category("Test Category").await;

    let first = app.get("/categories/").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.cache_status(), "miss");
    assert_eq!(
        first.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        app.cache.tracked_keys(CacheTag::CategoryList).await,
        vec!["store:categories".to_string()]
    );

    // Bypass the service so no invalidation runs.
    app.store
        .create_category(CreateCategoryParams {
            name: "Hidden".into(),
            description: None,
        })
        .await
        .unwrap();

    let second = app.get("/categories/").await;
    assert_eq!(second.cache_status(), "hit");
    assert_eq!(second.body, first.body);
    assert_eq!(second.names(), vec!["Test Category"]);

    app.create_category("Another").await;

    let third = app.get("/categories/").await;
    assert_eq!(third.cache_status(), "miss");
    assert_eq!(third.names(), vec!["Test Category", "Hidden", "Another"]);
}

#[tokio::test]
async fn empty_list_is_cached_too() {
    let app = app();

    let first = app.get("/products/").await;
    assert_eq!(first.body, json!([]));
    assert_eq!(first.cache_status(), "miss");

    let second = app.get("/products/").await;
    assert_eq!(second.body, json!([]));
    assert_eq!(second.cache_status(), "hit");
}

#[tokio::test]
async fn filtered_product_list_is_keyed_and_invalidated_by_product_writes() {
    let app = app();
    let category_id = app.create_category("Test Category").await;

    let uri = "/products/?category_name=Test%20Category";
    assert_eq!(app.get(uri).await.cache_status(), "miss");
    assert_eq!(app.get(uri).await.cache_status(), "hit");
    assert_eq!(
        app.cache.tracked_keys(CacheTag::ProductList).await,
        vec!["store:products:category_name=Test+Category".to_string()]
    );

    app.create_product("Test Product", "100.00", category_id)
        .await;

    let after = app.get(uri).await;
    assert_eq!(after.cache_status(), "miss");
    assert_eq!(after.names(), vec!["Test Product"]);
    assert_eq!(after.body[0]["price"], "100.00");
    assert_eq!(after.body[0]["category"], category_id);
}

#[tokio::test]
async fn product_writes_leave_category_list_cached() {
    let app = app();
    let category_id = app.create_category("Test Category").await;

    assert_eq!(app.get("/categories/").await.cache_status(), "miss");
    assert_eq!(app.get("/products/").await.cache_status(), "miss");

    let product_id = app.create_product("Pen", "1.50", category_id).await;
    assert_eq!(app.get("/categories/").await.cache_status(), "hit");
    assert_eq!(app.get("/products/").await.cache_status(), "miss");

    let patched = app
        .send(
            Method::PATCH,
            &format!("/products/{product_id}/"),
            Some(json!({ "price": 2 })),
        )
        .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(app.get("/categories/").await.cache_status(), "hit");

    let deleted = app
        .send(Method::DELETE, &format!("/products/{product_id}/"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/categories/").await.cache_status(), "hit");
    assert_eq!(app.get("/products/").await.body, json!([]));
}

#[tokio::test]
async fn category_writes_clear_product_lists() {
    let app = app();
    let category_id = app.create_category("Books").await;
    app.create_product("Novel", "12.00", category_id).await;

    assert_eq!(app.get("/products/").await.cache_status(), "miss");
    assert_eq!(app.get("/products/?ordering=name").await.cache_status(), "miss");

    let updated = app
        .send(
            Method::PATCH,
            &format!("/categories/{category_id}/"),
            Some(json!({ "description": "Printed matter" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Books");
    assert_eq!(updated.body["description"], "Printed matter");

    assert!(app.cache.tracked_keys(CacheTag::ProductList).await.is_empty());
    assert_eq!(app.get("/products/").await.cache_status(), "miss");
    assert_eq!(app.get("/products/?ordering=name").await.cache_status(), "miss");
}

#[tokio::test]
async fn equivalent_queries_share_one_entry() {
    let app = app();
    let category_id = app.create_category("Test Category").await;
    app.create_product("Cheap", "5.00", category_id).await;
    app.create_product("Mid", "15.00", category_id).await;
    app.create_product("Dear", "25.00", category_id).await;

    let first = app
        .get("/products/?price_gte=10&ordering=-price&category_name=Test+Category")
        .await;
    assert_eq!(first.cache_status(), "miss");
    assert_eq!(first.names(), vec!["Dear", "Mid"]);

    let second = app
        .get("/products/?category__name=Test%20Category&utm=1&ordering=-price&price__gte=10.00")
        .await;
    assert_eq!(second.cache_status(), "hit");
    assert_eq!(second.body, first.body);
}

#[tokio::test]
async fn price_range_and_ordering_filter_the_list() {
    let app = app();
    let books = app.create_category("Books").await;
    let toys = app.create_category("Toys").await;
    app.create_product("b", "9.99", books).await;
    app.create_product("a", "20.00", books).await;
    app.create_product("c", "15.00", toys).await;

    let by_name = app.get("/products/?ordering=name").await;
    assert_eq!(by_name.names(), vec!["a", "b", "c"]);

    let ranged = app
        .get("/products/?price_gte=10&price_lte=20&ordering=price")
        .await;
    assert_eq!(ranged.names(), vec!["c", "a"]);

    let books_only = app.get("/products/?category_name=Books&ordering=-name").await;
    assert_eq!(books_only.names(), vec!["b", "a"]);
}

#[tokio::test]
async fn price_filters_accept_any_decimal_bound() {
    let app = app();
    let books = app.create_category("Books").await;
    app.create_product("b", "9.99", books).await;
    app.create_product("a", "10.00", books).await;

    let below = app.get("/products/?price_lte=9.999&ordering=name").await;
    assert_eq!(below.status, StatusCode::OK);
    assert_eq!(below.names(), vec!["b"]);

    let everything = app.get("/products/?price_gte=-1&ordering=name").await;
    assert_eq!(everything.status, StatusCode::OK);
    assert_eq!(everything.names(), vec!["a", "b"]);

    let huge = app.get("/products/?price_lte=123456789&ordering=name").await;
    assert_eq!(huge.status, StatusCode::OK);
    assert_eq!(huge.names(), vec!["a", "b"]);

    let same_cents = app.get("/products/?price_lte=9.99&ordering=name").await;
    assert_eq!(same_cents.cache_status(), "hit");
    assert_eq!(
        app.cache.tracked_keys(CacheTag::ProductList).await.len(),
        3
    );
}

#[tokio::test]
async fn invalid_price_filter_is_rejected() {
    let app = app();

    let response = app.get("/products/?price_gte=cheap").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "invalid_input");
    assert_eq!(response.body["error"]["fields"][0]["field"], "price_gte");
    assert!(app.cache.tracked_keys(CacheTag::ProductList).await.is_empty());
}

#[tokio::test]
async fn update_then_fetch_reflects_new_state() {
    let app = app();
    let category_id = app.create_category("Books").await;
    let product_id = app.create_product("Novel", "12.00", category_id).await;

    let replaced = app
        .send(
            Method::PUT,
            &format!("/products/{product_id}/"),
            Some(json!({
                "name": "Paperback",
                "price": "8.5",
                "category_id": category_id,
                "description": "Pocket size"
            })),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK);

    let fetched = app.get(&format!("/products/{product_id}/")).await;
    assert_eq!(fetched.body["name"], "Paperback");
    assert_eq!(fetched.body["price"], "8.50");
    assert_eq!(fetched.body["description"], "Pocket size");

    let cleared = app
        .send(
            Method::PATCH,
            &format!("/products/{product_id}/"),
            Some(json!({ "description": null })),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["description"], serde_json::Value::Null);
    assert_eq!(cleared.body["name"], "Paperback");
}

#[tokio::test]
async fn missing_resources_return_not_found() {
    let app = app();

    for uri in ["/categories/42/", "/products/42/", "/products/abc/"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response.error_code(), "not_found");
    }

    let deleted = app.send(Method::DELETE, "/categories/42/", None).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);

    let deleted = app.send(Method::DELETE, "/products/42/", None).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);

    let patched = app
        .send(Method::PATCH, "/categories/42/", Some(json!({ "name": "x" })))
        .await;
    assert_eq!(patched.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_category_is_gone() {
    let app = app();
    let category_id = app.create_category("Temporary").await;

    let deleted = app
        .send(Method::DELETE, &format!("/categories/{category_id}/"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(deleted.body, serde_json::Value::Null);

    let fetched = app.get(&format!("/categories/{category_id}/")).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);

    // Ids are never reused.
    assert_eq!(app.create_category("Next").await, category_id + 1);
}

#[tokio::test]
async fn deleting_referenced_category_is_rejected_without_side_effects() {
    let app = app();
    let category_id = app.create_category("Books").await;
    app.create_product("Novel", "12.00", category_id).await;
    assert_eq!(app.get("/categories/").await.cache_status(), "miss");

    let response = app
        .send(Method::DELETE, &format!("/categories/{category_id}/"), None)
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(response.body, @r#"
        {
          "error": {
            "code": "category_in_use",
            "hint": "1 products reference this category",
            "message": "Category is referenced by products"
          }
        }
        "#);
    });
    assert_eq!(app.get(&format!("/categories/{category_id}/")).await.status, StatusCode::OK);
    assert_eq!(app.get("/categories/").await.cache_status(), "hit");
}

#[tokio::test]
async fn product_payload_errors_are_reported_per_field() {
    let app = app();

    let response = app.post("/products/", json!({})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(response.body, @r#"
        {
          "error": {
            "code": "invalid_input",
            "fields": [
              {
                "field": "name",
                "message": "this field is required"
              },
              {
                "field": "price",
                "message": "this field is required"
              },
              {
                "field": "category_id",
                "message": "this field is required"
              }
            ],
            "message": "Invalid product"
          }
        }
        "#);
    });
}

#[tokio::test]
async fn unknown_category_reference_is_a_field_error() {
    let app = app();

    let response = app
        .post(
            "/products/",
            json!({ "name": "Orphan", "price": "1.00", "category_id": 99 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["fields"][0]["field"], "category_id");
    assert_eq!(
        response.body["error"]["fields"][0]["message"],
        "invalid pk \"99\": object does not exist"
    );
}

#[tokio::test]
async fn invalid_writes_do_not_touch_cache() {
    let app = app();
    let category_id = app.create_category("Books").await;
    assert_eq!(app.get("/categories/").await.cache_status(), "miss");
    assert_eq!(app.get("/products/").await.cache_status(), "miss");

    let blank = app.post("/categories/", json!({ "name": "   " })).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        blank.body["error"]["fields"][0]["message"],
        "this field may not be blank"
    );

    let negative = app
        .post(
            "/products/",
            json!({ "name": "Pen", "price": "-1", "category_id": category_id }),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let replace = app
        .send(
            Method::PUT,
            &format!("/categories/{category_id}/"),
            Some(json!({ "description": "no name" })),
        )
        .await;
    assert_eq!(replace.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.get("/categories/").await.cache_status(), "hit");
    assert_eq!(app.get("/products/").await.cache_status(), "hit");
}

#[tokio::test]
async fn long_names_are_rejected() {
    let app = app();

    let response = app
        .post("/categories/", json!({ "name": "x".repeat(256) }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"]["fields"][0]["message"],
        "ensure this field has no more than 255 characters"
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/categories/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.send_request(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "bad_request");
}

#[tokio::test]
async fn direct_product_insert_is_hidden_by_cached_list() {
    let app = app();
    let category_id = app.create_category("Books").await;
    assert_eq!(app.get("/products/").await.body, json!([]));

    app.store
        .create_product(CreateProductParams {
            name: "Ghost".into(),
            description: None,
            price: Price::from_cents(100).unwrap(),
            category_id,
        })
        .await
        .unwrap();

    let cached = app.get("/products/").await;
    assert_eq!(cached.cache_status(), "hit");
    assert_eq!(cached.body, json!([]));

    app.cache.invalidate_tag(CacheTag::ProductList).await;
    assert_eq!(app.get("/products/").await.names(), vec!["Ghost"]);
}

#[tokio::test]
async fn health_reports_store_reachable() {
    let app = app();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
