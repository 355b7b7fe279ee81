//! Admin API integration tests
//!
//! Tests for the admin HTTP endpoints: agent roster CRUD, conversion
//! listing and workflow, reports, monthly settlement, notifications and
//! the health probes. Each test runs against its own SQLite database.

use std::sync::{Arc, Once};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Utc;
use serde_json::json;

use reftracker::api::admin::routes::admin_v1_routes;
use reftracker::api::admin::{AgentCreatedResponse, ApiResponse};
use reftracker::api::{AppStartTime, health_routes};
use reftracker::commission::CommissionPlan;
use reftracker::config::init_config;
use reftracker::services::{
    AgentService, CreateAgentRequest, RecordConversionRequest, ReportingService,
    SettlementService, TrackClickRequest, TrackingService,
};
use reftracker::storage::backend::SeaOrmStorage;
use reftracker::storage::{Agent, ConversionStatus};
use reftracker::system::event::EventBus;
use reftracker::utils::is_valid_code;

use tempfile::TempDir;

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

struct TestEnv {
    storage: Arc<SeaOrmStorage>,
    events: Arc<EventBus>,
    agents: Arc<AgentService>,
    tracking: Arc<TrackingService>,
    reporting: Arc<ReportingService>,
    settlements: Arc<SettlementService>,
    _dir: TempDir,
}

/// Fresh database and service stack per test.
async fn create_test_env() -> TestEnv {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("admin_api_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    let events = Arc::new(EventBus::new(64));

    TestEnv {
        agents: Arc::new(AgentService::new(storage.clone(), events.clone())),
        tracking: Arc::new(TrackingService::new(storage.clone(), events.clone())),
        reporting: Arc::new(ReportingService::new(storage.clone())),
        settlements: Arc::new(SettlementService::new(storage.clone(), events.clone())),
        storage,
        events,
        _dir: temp_dir,
    }
}

/// Create a test app with the admin envelope API and health probes.
macro_rules! admin_app {
    ($env:expr) => {{
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.storage.clone()))
                .app_data(web::Data::new($env.events.clone()))
                .app_data(web::Data::new($env.agents.clone()))
                .app_data(web::Data::new($env.reporting.clone()))
                .app_data(web::Data::new($env.settlements.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: Utc::now(),
                }))
                .service(admin_v1_routes())
                .service(web::scope("/health").service(health_routes())),
        )
        .await
    }};
}

async fn seed_agent(env: &TestEnv, code: &str, name: &str, plan: CommissionPlan) -> Agent {
    env.agents
        .create_agent(CreateAgentRequest {
            code: Some(code.to_string()),
            name: name.to_string(),
            memo: None,
            contact: None,
            plan,
        })
        .await
        .expect("Failed to seed agent")
        .agent
}

async fn seed_conversion(
    env: &TestEnv,
    agent_code: &str,
    session_code: &str,
    estimated_value: i64,
) -> i64 {
    env.tracking
        .record_conversion(RecordConversionRequest {
            agent_code: agent_code.to_string(),
            session_code: session_code.to_string(),
            form_data: json!({"name": "Sato"}),
            estimated_value: Some(estimated_value),
        })
        .await
        .expect("Failed to seed conversion")
        .conversion_id
}

fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

// =============================================================================
// Agent roster
// =============================================================================

#[tokio::test]
async fn test_create_agent_returns_created_envelope() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::post()
        .uri("/v1/agents")
        .set_json(json!({
            "code": "Ab3kM9",
            "name": "Kita Branch",
            "contact": "kita@example.com",
            "plan": {"type": "fixed", "amount": 10000}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: ApiResponse<AgentCreatedResponse> = test::read_body_json(resp).await;
    assert_eq!(body.code, 0);
    let created = body.data.expect("data should be present");
    assert_eq!(created.agent.code, "Ab3kM9");
    assert_eq!(created.agent.plan, CommissionPlan::Fixed { amount: 10000 });
    assert!(created.agent.active);
    assert!(!created.generated_code);
}

#[tokio::test]
async fn test_create_agent_generates_valid_code() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::post()
        .uri("/v1/agents")
        .set_json(json!({
            "name": "South Office",
            "plan": {"type": "percentage", "rate": 12.0}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: ApiResponse<AgentCreatedResponse> = test::read_body_json(resp).await;
    let created = body.data.expect("data should be present");
    assert!(created.generated_code);
    assert!(is_valid_code(&created.agent.code));
}

#[tokio::test]
async fn test_create_agent_rejects_bad_plans() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::post()
        .uri("/v1/agents")
        .set_json(json!({
            "name": "Bad Rate",
            "plan": {"type": "percentage", "rate": 150.0}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1000);

    let req = TestRequest::post()
        .uri("/v1/agents")
        .set_json(json!({
            "name": "Bad Amount",
            "plan": {"type": "fixed", "amount": -5}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_agent_rejects_duplicate_code() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let app = admin_app!(env);

    let req = TestRequest::post()
        .uri("/v1/agents")
        .set_json(json!({
            "code": "Ab3kM9",
            "name": "Impostor",
            "plan": {"type": "fixed", "amount": 1}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("already exists")
    );
}

#[tokio::test]
async fn test_create_agent_rejects_malformed_code() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    // Too short, and the confusable characters kept out of the alphabet.
    for code in ["ab", "O0Il1o"] {
        let req = TestRequest::post()
            .uri("/v1/agents")
            .set_json(json!({
                "code": code,
                "name": "Bad Code",
                "plan": {"type": "fixed", "amount": 100}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_get_agent_hides_internal_id() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let app = admin_app!(env);

    let req = TestRequest::get().uri("/v1/agents/Ab3kM9").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["code"], "Ab3kM9");
    assert!(body["data"].get("id").is_none());
}

#[tokio::test]
async fn test_get_unknown_agent_is_404() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::get().uri("/v1/agents/Qq5whB").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_list_agents_honors_include_inactive() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    seed_agent(
        &env,
        "Xy7nP2",
        "South Office",
        CommissionPlan::Percentage { rate: 12.0 },
    )
    .await;
    let app = admin_app!(env);

    let req = TestRequest::delete().uri("/v1/agents/Xy7nP2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/v1/agents").to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = TestRequest::get()
        .uri("/v1/agents?include_inactive=true")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_agent_is_partial() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let app = admin_app!(env);

    let req = TestRequest::put()
        .uri("/v1/agents/Ab3kM9")
        .set_json(json!({"plan": {"type": "percentage", "rate": 8.5}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], "Kita Branch");
    assert_eq!(body["data"]["plan"]["type"], "percentage");
    assert_eq!(body["data"]["plan"]["rate"], 8.5);

    // A later rename must not disturb the new plan.
    let req = TestRequest::put()
        .uri("/v1/agents/Ab3kM9")
        .set_json(json!({"name": "Minami Branch"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], "Minami Branch");
    assert_eq!(body["data"]["plan"]["type"], "percentage");
}

#[tokio::test]
async fn test_deactivate_agent_keeps_the_row() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let app = admin_app!(env);

    let req = TestRequest::delete().uri("/v1/agents/Ab3kM9").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["message"], "Agent deactivated");

    // The agent stays readable for attribution history.
    let req = TestRequest::get().uri("/v1/agents/Ab3kM9").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["active"], false);

    let req = TestRequest::delete().uri("/v1/agents/Qq5whB").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Conversions
// =============================================================================

#[tokio::test]
async fn test_list_conversions_resolves_agent_codes() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    seed_agent(
        &env,
        "Xy7nP2",
        "South Office",
        CommissionPlan::Percentage { rate: 12.0 },
    )
    .await;
    seed_conversion(&env, "Ab3kM9", "sess_1", 100).await;
    seed_conversion(&env, "Ab3kM9", "sess_2", 200).await;
    seed_conversion(&env, "Xy7nP2", "sess_3", 4_500_000).await;
    let app = admin_app!(env);

    let req = TestRequest::get().uri("/v1/conversions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 3);
    // Newest first, and rows speak in public codes.
    assert_eq!(body["data"][0]["agent_code"], "Xy7nP2");
    assert_eq!(body["data"][0]["commission_amount"], 540_000);
    assert_eq!(body["data"][0]["status"], "pending");

    let req = TestRequest::get()
        .uri("/v1/conversions?agent=Ab3kM9")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 2);
    for row in body["data"].as_array().unwrap() {
        assert_eq!(row["agent_code"], "Ab3kM9");
    }
}

#[tokio::test]
async fn test_list_conversions_paginates() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    for i in 0..3 {
        seed_conversion(&env, "Ab3kM9", &format!("sess_{}", i), 100).await;
    }
    let app = admin_app!(env);

    let req = TestRequest::get()
        .uri("/v1/conversions?page_size=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let req = TestRequest::get()
        .uri("/v1/conversions?page_size=2&page=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["page"], 2);
}

#[tokio::test]
async fn test_list_conversions_unknown_agent_is_404() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::get()
        .uri("/v1/conversions?agent=Qq5whB")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conversion_status_walks_forward() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let id = seed_conversion(&env, "Ab3kM9", "sess_1", 100).await;
    let app = admin_app!(env);

    let req = TestRequest::post()
        .uri(&format!("/v1/conversions/{}/status", id))
        .set_json(json!({"status": "contacted"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "contacted");
    assert!(!body["data"]["contacted_at"].is_null());
    assert!(body["data"]["settled_at"].is_null());

    let req = TestRequest::post()
        .uri(&format!("/v1/conversions/{}/status", id))
        .set_json(json!({"status": "settled"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "settled");
    assert!(!body["data"]["settled_at"].is_null());
}

#[tokio::test]
async fn test_conversion_status_rejects_backwards_and_garbage() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let id = seed_conversion(&env, "Ab3kM9", "sess_1", 100).await;
    env.storage
        .advance_conversion_status(id, ConversionStatus::Contacted)
        .await
        .expect("Failed to advance status");
    let app = admin_app!(env);

    // Re-applying the current status is an idempotent no-op.
    let req = TestRequest::post()
        .uri(&format!("/v1/conversions/{}/status", id))
        .set_json(json!({"status": "contacted"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::post()
        .uri(&format!("/v1/conversions/{}/status", id))
        .set_json(json!({"status": "pending"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri(&format!("/v1/conversions/{}/status", id))
        .set_json(json!({"status": "paid"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/v1/conversions/99999/status")
        .set_json(json!({"status": "contacted"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_summary_report_aggregates_activity() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    seed_agent(
        &env,
        "Xy7nP2",
        "South Office",
        CommissionPlan::Percentage { rate: 12.0 },
    )
    .await;
    env.tracking
        .record_click(TrackClickRequest {
            agent_code: "Ab3kM9".to_string(),
            session_code: "sess_1".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to record click");
    seed_conversion(&env, "Ab3kM9", "sess_1", 5_600_000).await;
    let app = admin_app!(env);

    let req = TestRequest::get()
        .uri("/v1/reports/summary?start=2000-01-01&end=2099-01-01")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);

    let data = &body["data"];
    assert_eq!(data["totals"]["clicks"], 1);
    assert_eq!(data["totals"]["conversions"], 1);
    assert_eq!(data["totals"]["commission"], 10000);
    assert_eq!(data["totals"]["conversion_rate"], 1.0);

    // The idle agent is skipped unless the full roster is requested.
    assert_eq!(data["agents"].as_array().unwrap().len(), 1);
    assert_eq!(data["agents"][0]["code"], "Ab3kM9");
    assert_eq!(data["timeline"].as_array().unwrap().len(), 1);
    assert_eq!(data["timeline"][0]["clicks"], 1);
    assert_eq!(data["timeline"][0]["conversions"], 1);

    let req = TestRequest::get()
        .uri("/v1/reports/summary?start=2000-01-01&end=2099-01-01&full_roster=true")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let agents = body["data"]["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 2);
    let idle = agents
        .iter()
        .find(|a| a["code"] == "Xy7nP2")
        .expect("idle agent should be listed");
    assert_eq!(idle["clicks"], 0);
    assert_eq!(idle["conversion_rate"], 0.0);
}

#[tokio::test]
async fn test_summary_report_rejects_bad_ranges() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    // One-sided range
    let req = TestRequest::get()
        .uri("/v1/reports/summary?start=2026-01-01")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1012);

    // Unparseable date
    let req = TestRequest::get()
        .uri("/v1/reports/summary?start=yesterday&end=2026-01-02")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Inverted range
    let req = TestRequest::get()
        .uri("/v1/reports/summary?start=2026-02-01&end=2026-01-01")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown granularity
    let req = TestRequest::get()
        .uri("/v1/reports/summary?granularity=week")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Settlements
// =============================================================================

#[tokio::test]
async fn test_settlement_preview_settle_and_resettle() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    for i in 0..2 {
        let id = seed_conversion(&env, "Ab3kM9", &format!("sess_{}", i), 100).await;
        env.storage
            .advance_conversion_status(id, ConversionStatus::Contacted)
            .await
            .expect("Failed to advance status");
    }
    let app = admin_app!(env);
    let month = current_month();

    let req = TestRequest::get()
        .uri(&format!("/v1/settlements/{}", month))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total_payable"], 20000);
    assert_eq!(body["data"]["total_settled"], 0);
    assert_eq!(body["data"]["rows"][0]["agent_code"], "Ab3kM9");
    assert_eq!(body["data"]["rows"][0]["contacted"], 2);

    let req = TestRequest::post()
        .uri(&format!("/v1/settlements/{}/settle", month))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["settled_count"], 2);
    assert_eq!(body["data"]["preview"]["total_settled"], 20000);
    assert_eq!(body["data"]["preview"]["total_payable"], 0);

    // Settling the same month again finds nothing left to pay.
    let req = TestRequest::post()
        .uri(&format!("/v1/settlements/{}/settle", month))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["settled_count"], 0);
    assert_eq!(body["data"]["preview"]["total_settled"], 20000);
}

#[tokio::test]
async fn test_settlement_leaves_pending_rows_alone() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let id = seed_conversion(&env, "Ab3kM9", "sess_1", 100).await;
    let app = admin_app!(env);
    let month = current_month();

    // An unverified lead is not payable yet.
    let req = TestRequest::get()
        .uri(&format!("/v1/settlements/{}", month))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["rows"][0]["pending"], 1);
    assert_eq!(body["data"]["total_payable"], 0);

    let req = TestRequest::post()
        .uri(&format!("/v1/settlements/{}/settle", month))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["settled_count"], 0);

    let conversion = env
        .storage
        .get_conversion(id)
        .await
        .expect("Failed to load conversion")
        .expect("Conversion should exist");
    assert_eq!(conversion.status, ConversionStatus::Pending);
}

#[tokio::test]
async fn test_settlement_export_is_csv() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    let id = seed_conversion(&env, "Ab3kM9", "sess_1", 100).await;
    env.storage
        .advance_conversion_status(id, ConversionStatus::Contacted)
        .await
        .expect("Failed to advance status");
    let app = admin_app!(env);
    let month = current_month();

    let req = TestRequest::get()
        .uri(&format!("/v1/settlements/{}/export", month))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("Content-Type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("settlement_{}.csv", month)));

    let bytes = test::read_body(resp).await;
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with("agent_code,agent_name"));
    assert!(csv.contains("Ab3kM9"));
    assert!(csv.contains("10000"));
}

#[tokio::test]
async fn test_settlement_rejects_bad_month() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    for month in ["2026-13", "march", "2026"] {
        let req = TestRequest::get()
            .uri(&format!("/v1/settlements/{}", month))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notifications_reflect_recent_activity() {
    let env = create_test_env().await;
    seed_agent(
        &env,
        "Ab3kM9",
        "Kita Branch",
        CommissionPlan::Fixed { amount: 10000 },
    )
    .await;
    seed_conversion(&env, "Ab3kM9", "sess_1", 5_600_000).await;
    let app = admin_app!(env);

    let req = TestRequest::get().uri("/v1/notifications").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let feed = body["data"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    // Newest first: the conversion landed after the agent creation.
    assert_eq!(feed[0]["event_type"], "conversion_recorded");
    assert!(feed[0]["message"].as_str().unwrap().contains("Ab3kM9"));
    assert_eq!(feed[1]["event_type"], "agent_created");

    let req = TestRequest::get()
        .uri("/v1/notifications?limit=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check_reports_storage() {
    let env = create_test_env().await;
    let app = admin_app!(env);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["data"]["checks"]["storage"]["backend"], "sqlite");
    assert_eq!(body["data"]["checks"]["storage"]["agents_count"], 0);

    let req = TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
