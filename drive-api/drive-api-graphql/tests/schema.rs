use std::sync::Arc;

use async_graphql::{Request, Variables};
use drive_api_graphql::{AppSchema, ContextData, QueryDefaults, build_schema};
use drive_persistence::LedgerStateDb;
use serde_json::{Value, json};

async fn schema() -> AppSchema {
    let db = LedgerStateDb::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();

    build_schema(ContextData {
        db: Arc::new(db),
        defaults: QueryDefaults::default(),
    })
}

async fn execute(schema: &AppSchema, query: &str, variables: Value) -> Value {
    let request = Request::new(query).variables(Variables::from_json(variables));
    serde_json::to_value(schema.execute(request).await).unwrap()
}

fn error_code(response: &Value) -> &str {
    response["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_default()
}

fn new_run_input() -> Value {
    json!({
        "pipeline_name": "orders_daily",
        "pipeline_priority": 1.3,
        "dag_run_id": "scheduled__2025-07-24",
        "topology": {
            "source": {"name": "orders", "category": "db", "sub_type": "postgres"},
            "stage": {"name": "landing", "category": "object_store", "sub_type": "s3"},
            "target": {"name": "dwh", "category": "warehouse", "sub_type": "snowflake"}
        },
        "window": {
            "target_day": "2025-07-24",
            "start": "2025-07-24T00:00:00Z",
            "end": "2025-07-24T00:15:00Z"
        },
        "stages": {
            "src_stg_xfer": {"expected_duration_secs": "10m"},
            "stg_tgt_xfer": {"enabled": false},
            "src_stg_audit": {"enabled": false},
            "stg_tgt_audit": {"enabled": false}
        }
    })
}

const CREATE_RUN: &str = "mutation($input: JSON!) { createRun(input: $input) }";

const UPDATE_STAGE: &str = r#"
    mutation($runId: UUID!, $stage: String!, $update: JSON!) {
        updateStage(runId: $runId, stage: $stage, update: $update)
    }
"#;

#[tokio::test]
async fn test_run_lifecycle_over_graphql() {
    let schema = schema().await;

    let created = execute(&schema, CREATE_RUN, json!({ "input": new_run_input() })).await;
    let run_id = created["data"]["createRun"].as_str().unwrap().to_string();

    for status in ["IN_PROCESS", "COMPLETED"] {
        let updated = execute(
            &schema,
            UPDATE_STAGE,
            json!({ "runId": run_id, "stage": "src_stg_xfer", "update": {"status": status} }),
        )
        .await;
        assert_eq!(updated["data"]["updateStage"], json!(true), "{updated}");
    }

    let finalized = execute(
        &schema,
        "mutation($runId: UUID!, $counts: JSON) { finalizeRun(runId: $runId, counts: $counts) }",
        json!({ "runId": run_id, "counts": {"source_count": 50, "stage_count": 50} }),
    )
    .await;
    assert_eq!(finalized["data"]["finalizeRun"], json!("MATCHED"));

    let fetched = execute(
        &schema,
        "query($runId: UUID!) { run(runId: $runId) }",
        json!({ "runId": run_id }),
    )
    .await;
    let run = &fetched["data"]["run"];
    assert_eq!(run["pipeline_status"], json!("COMPLETED"));
    assert_eq!(run["phase_completed"], json!("PIPELINE"));
    assert_eq!(run["stages"]["src_stg_xfer"]["expected_duration_secs"], json!(600));
    assert_eq!(run["stages"]["stg_tgt_xfer"]["status"], json!("PENDING"));

    let synced = execute(
        &schema,
        "mutation { runSync(targetDay: \"2025-07-24\") }",
        json!({}),
    )
    .await;
    assert_eq!(synced["data"]["runSync"], json!({"outcome": "SYNCED", "rows": 1}));

    let again = execute(
        &schema,
        "mutation { runSync(targetDay: \"2025-07-24\") }",
        json!({}),
    )
    .await;
    assert_eq!(again["data"]["runSync"], json!({"outcome": "SKIPPED"}));
}

#[tokio::test]
async fn test_errors_carry_codes() {
    let schema = schema().await;

    let created = execute(&schema, CREATE_RUN, json!({ "input": new_run_input() })).await;
    let run_id = created["data"]["createRun"].as_str().unwrap().to_string();

    let duplicate = execute(&schema, CREATE_RUN, json!({ "input": new_run_input() })).await;
    assert_eq!(error_code(&duplicate), "CONFLICT");

    let unknown_stage = execute(
        &schema,
        UPDATE_STAGE,
        json!({ "runId": run_id, "stage": "nowhere", "update": {"status": "IN_PROCESS"} }),
    )
    .await;
    assert_eq!(error_code(&unknown_stage), "INVALID_INPUT");

    let disabled = execute(
        &schema,
        UPDATE_STAGE,
        json!({ "runId": run_id, "stage": "stg_tgt_xfer", "update": {"status": "IN_PROCESS"} }),
    )
    .await;
    assert_eq!(error_code(&disabled), "INVALID_TRANSITION");

    let missing = execute(
        &schema,
        "query($runId: UUID!) { run(runId: $runId) }",
        json!({ "runId": "00000000-0000-0000-0000-000000000000" }),
    )
    .await;
    assert_eq!(error_code(&missing), "NOT_FOUND");
}

#[tokio::test]
async fn test_capabilities_query() {
    let schema = schema().await;

    let response = execute(
        &schema,
        "query($health: JSON!) { capabilities(health: $health, dagRunId: \"dag\") }",
        json!({ "health": {"source": true, "stage": true, "target": false, "drive": true} }),
    )
    .await;

    let caps = &response["data"]["capabilities"];
    assert_eq!(caps["exit_run"], json!(false));
    assert_eq!(caps["can_process_source_to_stage"], json!(true));
    assert_eq!(caps["can_process_stage_to_target"], json!(false));
}
