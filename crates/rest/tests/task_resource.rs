//! Tasks resource tests.
//!
//! Exercises the HTTP contract of the resource:
//! - Status codes and error keys for every identity and validation rule
//! - Alert, Location and X-Total-Count headers
//! - Both stores after each write, with the index checked after the
//!   consistency window

mod common;

use axum::http::StatusCode;
use regex::Regex;
use serde_json::{Value, json};
use tasks_persistence::types::Task;

use common::assertions::*;
use common::fixtures::*;
use common::harness::*;

// =============================================================================
// Create
// =============================================================================

mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_task() {
        let app = TestApp::new();

        let response = app.server.post("/tasks").json(&default_task()).await;

        assert_status(&response, 201);
        let created = response.json::<Task>();
        let id = created.id.expect("created task has an id");
        assert_alert(&response, "created", id);

        let location = response.header("location");
        let pattern = Regex::new(r"^/tasks/\d+$").unwrap();
        assert!(pattern.is_match(location.to_str().unwrap()));
        assert_eq!(location, format!("/tasks/{}", id).as_str());

        assert_eq!(app.primary_count().await, 1);
        assert_eq!(app.stored(id).await, Some(default_task().with_id(id)));

        let app = &app;
        assert!(await_until(move || async move { app.index_count().await == 1 }).await);
        assert_eq!(app.indexed(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_create_with_existing_id_is_rejected() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/tasks")
            .json(&default_task().with_id(1))
            .await;

        assert_problem(&response, 400, "idexists");
        app.settle().await;
        assert_eq!(app.primary_count().await, 0);
        assert_eq!(app.index_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_requires_names() {
        let app = TestApp::new();

        for field in ["nameEn", "nameAr"] {
            let response = app.server.post("/tasks").json(&body_with_null(field)).await;
            assert_problem(&response, 400, "required");
            assert_eq!(response.json::<Value>()["detail"], format!("Missing required field: {}", field));
        }

        let response = app
            .server
            .post("/tasks")
            .json(&json!({ "nameEn": "  ", "nameAr": "ب" }))
            .await;
        assert_problem(&response, 400, "required");

        app.settle().await;
        assert_eq!(app.primary_count().await, 0);
        assert_eq!(app.index_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_with_malformed_json() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/tasks")
            .content_type("application/json")
            .bytes("{\"nameEn\": ".into())
            .await;

        assert_problem(&response, 400, "invalidjson");
        assert_eq!(app.primary_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_with_unsupported_media_type() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/tasks")
            .content_type("text/plain")
            .bytes("nameEn=A".into())
            .await;

        assert_problem(&response, 415, "http");
        assert_eq!(app.primary_count().await, 0);
    }
}

// =============================================================================
// Read and list
// =============================================================================

mod read {
    use super::*;

    #[tokio::test]
    async fn test_get_task() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;

        let response = app
            .server
            .get(&format!("/tasks/{}", created.id.unwrap()))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Task>(), created);
    }

    #[tokio::test]
    async fn test_get_unknown_task() {
        let app = TestApp::new();

        let response = app.server.get("/tasks/9999").await;

        assert_problem(&response, 404, "http");
    }

    #[tokio::test]
    async fn test_get_with_non_numeric_id() {
        let app = TestApp::new();

        let response = app.server.get("/tasks/abc").await;

        assert_problem(&response, 400, "idinvalid");
    }

    #[tokio::test]
    async fn test_list_all_tasks() {
        let app = TestApp::new();
        let mut created = Vec::new();
        for task in catalogue() {
            created.push(app.create(&task).await);
        }

        let response = app.server.get("/tasks").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Task>>(), created);
        assert_no_total_count(&response);
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let app = TestApp::new();
        for task in catalogue() {
            app.create(&task).await;
        }

        let response = app.server.get("/tasks?sort=nameEn,desc").await;
        response.assert_status_ok();
        let names: Vec<_> = response
            .json::<Vec<Task>>()
            .into_iter()
            .map(|t| t.name_en.unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Stock take", "Stock audit", "Payroll run", "Fleet check"]
        );

        let response = app
            .server
            .get("/tasks?sort=status,desc&sort=nameEn,asc")
            .await;
        let codes: Vec<_> = response
            .json::<Vec<Task>>()
            .into_iter()
            .map(|t| t.code.unwrap())
            .collect();
        assert_eq!(codes, vec!["OPS-1", "HR-1", "INV-2", "INV-1"]);
    }

    #[tokio::test]
    async fn test_list_with_unknown_sort_field() {
        let app = TestApp::new();

        let response = app.server.get("/tasks?sort=priority,asc").await;

        assert_problem(&response, 400, "badsort");
    }

    #[tokio::test]
    async fn test_list_paged() {
        let app = TestApp::new();
        for task in catalogue() {
            app.create(&task).await;
        }

        let response = app.server.get("/tasks?page=1&size=3").await;

        response.assert_status_ok();
        assert_total_count(&response, 4);
        let page = response.json::<Vec<Task>>();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].code.as_deref(), Some("OPS-1"));
    }

    #[tokio::test]
    async fn test_list_page_size_is_capped() {
        let app = TestApp::new();
        for task in catalogue() {
            app.create(&task).await;
        }

        let response = app.server.get("/tasks?size=100000").await;

        response.assert_status_ok();
        assert_total_count(&response, 4);
        assert_eq!(response.json::<Vec<Task>>().len(), 4);
    }

    #[tokio::test]
    async fn test_list_with_invalid_page() {
        let app = TestApp::new();

        assert_problem(&app.server.get("/tasks?page=-1").await, 400, "badpage");
        assert_problem(&app.server.get("/tasks?size=0").await, 400, "badpage");
    }
}

// =============================================================================
// Full update
// =============================================================================

mod update {
    use super::*;

    #[tokio::test]
    async fn test_update_task() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();
        app.settle().await;

        let replacement = updated_task().with_id(id);
        let response = app
            .server
            .put(&format!("/tasks/{}", id))
            .json(&replacement)
            .await;

        assert_status(&response, 200);
        assert_alert(&response, "updated", id);
        assert_eq!(response.json::<Task>(), replacement);
        assert_eq!(app.stored(id).await, Some(replacement.clone()));
        assert_eq!(app.primary_count().await, 1);

        let app = &app;
        let expected = replacement.clone();
        assert!(
            await_until(move || {
                let expected = expected.clone();
                async move { app.indexed(id).await == Some(expected) }
            })
            .await
        );
        assert_eq!(app.index_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_without_body_id() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .server
            .put(&format!("/tasks/{}", id))
            .json(&updated_task())
            .await;

        assert_problem(&response, 400, "idnull");
        assert_eq!(app.stored(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_update_with_mismatched_id() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .server
            .put(&format!("/tasks/{}", id))
            .json(&updated_task().with_id(id + 1))
            .await;

        assert_problem(&response, 400, "idinvalid");
        assert_eq!(app.stored(id).await, Some(created));
        assert_eq!(app.primary_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_an_upsert() {
        let app = TestApp::new();

        let response = app
            .server
            .put("/tasks/9999")
            .json(&updated_task().with_id(9999))
            .await;

        assert_problem(&response, 400, "idnotfound");
        app.settle().await;
        assert_eq!(app.primary_count().await, 0);
        assert_eq!(app.index_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_requires_names() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let mut body = body_with_null("nameAr");
        body["id"] = json!(id);
        let response = app.server.put(&format!("/tasks/{}", id)).json(&body).await;

        assert_problem(&response, 400, "required");
        assert_eq!(app.stored(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_put_without_id_is_not_allowed() {
        let app = TestApp::new();

        let response = app.server.put("/tasks").json(&updated_task()).await;

        assert_problem(&response, 405, "http");
        assert_eq!(app.primary_count().await, 0);
    }
}

// =============================================================================
// Partial update
// =============================================================================

mod patch {
    use super::*;

    #[tokio::test]
    async fn test_patch_overwrites_only_supplied_fields() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .merge_patch(
                &format!("/tasks/{}", id),
                &json!({ "id": id, "nameEn": "BBBBBBBBBB", "code": null }),
            )
            .await;

        assert_status(&response, 200);
        assert_alert(&response, "updated", id);
        let expected = Task::new()
            .with_id(id)
            .name_en("BBBBBBBBBB")
            .name_ar("ب")
            .status(1);
        assert_eq!(response.json::<Task>(), expected);
        assert_eq!(app.stored(id).await, Some(expected.clone()));

        // The index holds the full record, not the patch
        app.settle().await;
        assert_eq!(app.indexed(id).await, Some(expected));
    }

    #[tokio::test]
    async fn test_patch_accepts_plain_json() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .server
            .patch(&format!("/tasks/{}", id))
            .json(&json!({ "id": id, "status": 7 }))
            .await;

        assert_status(&response, 200);
        assert_eq!(response.json::<Task>().status, Some(7));
    }

    #[tokio::test]
    async fn test_patch_with_null_name_is_rejected() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();
        app.settle().await;

        let response = app
            .merge_patch(&format!("/tasks/{}", id), &patch_body(id, "nameEn", Value::Null))
            .await;

        assert_problem(&response, 400, "required");
        assert_eq!(app.stored(id).await, Some(created.clone()));
        app.settle().await;
        assert_eq!(app.indexed(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_patch_with_mismatched_id() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .merge_patch(
                &format!("/tasks/{}", id),
                &patch_body(id + 1, "nameAr", json!("ج")),
            )
            .await;

        assert_problem(&response, 400, "idinvalid");
        assert_eq!(app.stored(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_patch_without_body_id() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .merge_patch(&format!("/tasks/{}", id), &json!({ "nameAr": "ج" }))
            .await;

        assert_problem(&response, 400, "idnull");
        assert_eq!(app.stored(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_patch_unknown_id() {
        let app = TestApp::new();

        let response = app
            .merge_patch("/tasks/9999", &patch_body(9999, "nameAr", json!("ج")))
            .await;

        assert_problem(&response, 400, "idnotfound");
        assert_eq!(app.primary_count().await, 0);
    }

    #[tokio::test]
    async fn test_patch_with_unsupported_media_type() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .server
            .patch(&format!("/tasks/{}", id))
            .content_type("text/plain")
            .bytes(format!("{{\"id\": {}, \"nameAr\": \"ج\"}}", id).into())
            .await;

        assert_problem(&response, 415, "http");
        assert_eq!(app.stored(id).await, Some(created));
    }

    #[tokio::test]
    async fn test_patch_with_non_object_body() {
        let app = TestApp::new();
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();

        let response = app
            .merge_patch(&format!("/tasks/{}", id), &json!(["nameAr"]))
            .await;

        assert_problem(&response, 400, "invalidjson");
    }

    #[tokio::test]
    async fn test_patch_without_id_is_not_allowed() {
        let app = TestApp::new();

        let response = app
            .merge_patch("/tasks", &json!({ "nameAr": "ج" }))
            .await;

        assert_problem(&response, 405, "http");
    }
}

// =============================================================================
// Delete
// =============================================================================

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_task() {
        let app = TestApp::new();
        let kept = app.create(&updated_task()).await;
        let created = app.create(&default_task()).await;
        let id = created.id.unwrap();
        app.settle().await;
        assert_eq!(app.index_count().await, 2);

        let response = app.server.delete(&format!("/tasks/{}", id)).await;

        assert_status(&response, 204);
        assert_alert(&response, "deleted", id);
        assert_eq!(app.primary_count().await, 1);
        assert_eq!(app.stored(id).await, None);

        app.settle().await;
        assert_eq!(app.index_count().await, 1);
        assert_eq!(app.indexed(id).await, None);
        assert_eq!(app.indexed(kept.id.unwrap()).await, Some(kept));
    }

    #[tokio::test]
    async fn test_delete_unknown_task() {
        let app = TestApp::new();
        app.create(&default_task()).await;

        let response = app.server.delete("/tasks/9999").await;

        assert_status(&response, 204);
        assert_eq!(app.primary_count().await, 1);
    }
}

// =============================================================================
// End to end
// =============================================================================

mod scenario {
    use super::*;

    async fn run_lifecycle(app: &TestApp) {
        // Create
        let response = app.server.post("/tasks").json(&default_task()).await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Task>();
        let id = created.id.unwrap();
        assert_eq!(app.primary_count().await, 1);
        assert!(await_until(move || async move { app.index_count().await == 1 }).await);
        assert_eq!(app.indexed(id).await, Some(created));

        // Patch one field
        let response = app
            .merge_patch(&format!("/tasks/{}", id), &patch_body(id, "nameAr", json!("ج")))
            .await;
        response.assert_status_ok();
        let stored = app.stored(id).await.unwrap();
        assert_eq!(stored.name_en.as_deref(), Some("A"));
        assert_eq!(stored.name_ar.as_deref(), Some("ج"));
        let expected = stored.clone();
        assert!(
            await_until(move || {
                let expected = expected.clone();
                async move { app.indexed(id).await == Some(expected) }
            })
            .await
        );

        // Search sees the patched snapshot
        let response = app.server.get(&format!("/search/tasks?query=id:{}", id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Task>>(), vec![stored]);

        // Delete
        let response = app.server.delete(&format!("/tasks/{}", id)).await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(app.primary_count().await, 0);
        assert!(await_until(move || async move { app.index_count().await == 0 }).await);

        assert_problem(&app.server.get(&format!("/tasks/{}", id)).await, 404, "http");
    }

    #[tokio::test]
    async fn test_lifecycle_with_background_sync() {
        run_lifecycle(&TestApp::new()).await;
    }

    #[tokio::test]
    async fn test_lifecycle_with_inline_sync() {
        run_lifecycle(&TestApp::synchronous()).await;
    }

    #[tokio::test]
    async fn test_counts_converge_after_mixed_writes() {
        let app = TestApp::new();
        let mut ids = Vec::new();
        for task in catalogue() {
            ids.push(app.create(&task).await.id.unwrap());
        }
        app.server
            .delete(&format!("/tasks/{}", ids[1]))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.server
            .put(&format!("/tasks/{}", ids[2]))
            .json(&updated_task().with_id(ids[2]))
            .await
            .assert_status_ok();

        app.settle().await;
        assert_eq!(app.primary_count().await, 3);
        assert_eq!(app.index_count().await, 3);
        for id in [ids[0], ids[2], ids[3]] {
            assert_eq!(app.indexed(id).await, app.stored(id).await);
        }
    }
}
