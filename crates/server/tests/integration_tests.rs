use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use compliance_core::Config;
use documents::{OcrEngine, PageLayout};
use embeddings::FallbackEmbeddingProvider;
use extraction::prompts;
use llm::{ChatMessage, ChatModel, CompletionParams, LlmError};
use serde_json::{json, Value};
use server::{create_app, ComplianceService};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;
use vector_store::InMemoryCollection;

const BOUNDARY: &str = "compliance-test-boundary";

const APPLICATION_RECORD: &str = r#"{
    "name": "Acme Steel",
    "square_feet": 1200,
    "number_of_employees": 57,
    "power_consumption": {"total": "6,000"},
    "water_source": "Borewell",
    "waste_disposal": "Licensed contractor"
}"#;

/// Holds requests with a given system prompt until released.
struct Gate {
    system: &'static str,
    entered: Notify,
    release: Notify,
}

/// Replies according to the system prompt of each request and records every call.
struct ScriptedModel {
    replies: HashMap<&'static str, String>,
    calls: Mutex<Vec<(Vec<ChatMessage>, CompletionParams)>>,
    gate: Option<Gate>,
}

impl ScriptedModel {
    fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(mut self, system: &'static str) -> Self {
        self.gate = Some(Gate {
            system,
            entered: Notify::new(),
            release: Notify::new(),
        });
        self
    }

    fn reply(mut self, system: &'static str, content: &str) -> Self {
        self.replies.insert(system, content.to_string());
        self
    }

    fn standard() -> Self {
        Self::new()
            .reply(prompts::FACILITY_SYSTEM, APPLICATION_RECORD)
            .reply(prompts::EMPLOYEE_SYSTEM, r#"{"employee_count": 55}"#)
            .reply(
                prompts::POWER_SYSTEM,
                r#"{"Total_consumption": "120,000", "details_of_machine": []}"#,
            )
            .reply(prompts::REPORT_SYSTEM, "Decision: Needs Review")
    }

    fn last_call(&self) -> (Vec<ChatMessage>, CompletionParams) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push((messages.clone(), params));

        let system = messages
            .iter()
            .find(|message| message.role == "system")
            .map(|message| message.content.clone());

        if let Some(gate) = &self.gate {
            if system.as_deref() == Some(gate.system) {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }

        let scripted = system.and_then(|system| self.replies.get(system.as_str()));
        match scripted {
            Some(reply) => Ok(reply.clone()),
            None => {
                let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
                Ok(format!("echo: {}", last))
            }
        }
    }
}

struct NoOcr;

#[async_trait]
impl OcrEngine for NoOcr {
    async fn recognize(&self, _image: &Path, _layout: PageLayout) -> Result<String> {
        anyhow::bail!("OCR unavailable")
    }

    async fn rasterize_pdf(
        &self,
        _pdf: &Path,
        _out_dir: &Path,
        _first_page_only: bool,
    ) -> Result<Vec<PathBuf>> {
        anyhow::bail!("OCR unavailable")
    }
}

struct TestApp {
    app: Router,
    service: Arc<ComplianceService>,
    model: Arc<ScriptedModel>,
    _documents: TempDir,
}

fn test_app(model: ScriptedModel) -> TestApp {
    let documents = TempDir::new().unwrap();
    std::fs::write(
        documents.path().join("groundwater.txt"),
        "Borewells require a groundwater extraction permit.",
    )
    .unwrap();
    std::fs::write(
        documents.path().join("factories_act.txt"),
        "Every factory shall provide adequate drainage.",
    )
    .unwrap();

    let mut config = Config::development();
    config.data.document_dir = documents.path().to_string_lossy().to_string();

    let model = Arc::new(model);
    let service = Arc::new(
        ComplianceService::with_clients(
            config,
            model.clone(),
            Box::new(FallbackEmbeddingProvider::with_standard_dimension()),
            Arc::new(InMemoryCollection::new("industrial-documents", Some(384))),
            Arc::new(NoOcr),
        )
        .unwrap(),
    );

    TestApp {
        app: create_app(service.clone()),
        service,
        model,
        _documents: documents,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload_request(uri: &str, file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).to_string()))
    };
    (status, json)
}

async fn start_session(app: &Router) -> String {
    let (status, snapshot) = send(
        app,
        upload_request("/analysis", "application.txt", "Application for Acme Steel"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    snapshot["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn should_return_ok_for_health_endpoint() {
    let test = test_app(ScriptedModel::standard());

    let (status, body) = send(&test.app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn should_return_404_for_unknown_endpoint() {
    let test = test_app(ScriptedModel::standard());
    let (status, _) = send(&test.app, empty_request("GET", "/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_generate_report_from_retrieved_rules() {
    let test = test_app(ScriptedModel::standard());
    let summary = test.service.ingest_documents().await.unwrap();
    assert_eq!(summary.inserted, 2);

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/generate_report",
            json!({
                "industry_name": "Acme Steel",
                "square_feet": "1200",
                "water_source": "Borewell",
                "stack_height": "30m"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["compliance_report"], "Decision: Needs Review");

    let (messages, params) = test.model.last_call();
    assert_eq!(params, CompletionParams::CONVERSATION);
    let prompt = &messages[1].content;
    assert!(prompt.contains("- **Industry Name:** Acme Steel"));
    assert!(prompt.contains("- **Drainage System:** N/A"));
    assert!(prompt.contains("- stack_height: 30m"));
    assert!(prompt.contains("Borewells require a groundwater extraction permit."));
    assert!(prompt.contains("Every factory shall provide adequate drainage."));
}

#[tokio::test]
async fn should_forward_chat_history() {
    let test = test_app(ScriptedModel::standard());

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/chat",
            json!({"messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"},
                {"role": "user", "content": "Is a borewell permitted?"}
            ]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "echo: Is a borewell permitted?");

    let (messages, params) = test.model.last_call();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, "assistant");
    assert_eq!(params, CompletionParams::CONVERSATION);
}

#[tokio::test]
async fn should_reject_malformed_chat_requests() {
    let test = test_app(ScriptedModel::standard());

    let (status, _) = send(
        &test.app,
        json_request("POST", "/chat", json!({"history": []})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/chat", json!({"messages": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("At least one message"));
}

#[tokio::test]
async fn should_walk_full_verification_workflow() {
    let test = test_app(ScriptedModel::standard());
    test.service.ingest_documents().await.unwrap();
    let app = &test.app;

    let (status, snapshot) = send(
        app,
        upload_request("/analysis", "application.txt", "Application for Acme Steel"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(snapshot["step"], "area_verification");
    assert_eq!(snapshot["progress"], 42);
    assert_eq!(snapshot["pending_field"], "square_feet");
    assert_eq!(snapshot["record"]["name"], "Acme Steel");
    let id = snapshot["session_id"].as_str().unwrap().to_string();

    let (status, snapshot) = send(app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "employee_verification");
    assert_eq!(snapshot["verifications"][0]["status"], "skipped");

    let (status, snapshot) = send(
        app,
        upload_request(
            &format!("/analysis/{id}/proof"),
            "payroll.txt",
            "Total Number of Employees: 55",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "energy_verification");
    assert_eq!(snapshot["verifications"][1]["field"], "number_of_employees");
    assert_eq!(snapshot["verifications"][1]["status"], "verified");

    let (status, snapshot) = send(
        app,
        upload_request(
            &format!("/analysis/{id}/proof"),
            "energy.txt",
            "Monthly consumption: 120,000 kWh",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "water_verification");
    assert_eq!(snapshot["verifications"][2]["status"], "mismatch");
    assert_eq!(snapshot["verifications"][2]["observed"], 120000.0);

    let (status, snapshot) = send(app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "report_generation");

    let (status, snapshot) = send(app, empty_request("POST", &format!("/analysis/{id}/report"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "complete");
    assert_eq!(snapshot["progress"], 100);
    assert_eq!(snapshot["report"], "Decision: Needs Review");

    let (messages, _) = test.model.last_call();
    assert!(messages[1].content.contains("- **Industry Name:** Acme Steel"));
    assert!(messages[1]
        .content
        .contains("- **Waste Management:** Licensed contractor"));

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/analysis/{id}/export")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"compliance_report.json\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let exported: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(exported["number_of_employees"], 57);

    let (status, _) = send(app, empty_request("DELETE", &format!("/analysis/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(app, empty_request("GET", &format!("/analysis/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn should_not_create_session_when_too_few_fields_are_extracted() {
    let model = ScriptedModel::new().reply(prompts::FACILITY_SYSTEM, r#"{"name": "Acme"}"#);
    let test = test_app(model);

    let (status, body) = send(
        &test.app,
        upload_request("/analysis", "application.txt", "Application for Acme"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("at least two"));
    assert_eq!(test.service.session_count().await, 0);
}

#[tokio::test]
async fn should_reject_empty_application_document() {
    let test = test_app(ScriptedModel::standard());

    let (status, body) = send(&test.app, upload_request("/analysis", "application.txt", "  ")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "No text could be extracted from the document");
}

#[tokio::test]
async fn should_reject_unsupported_upload_types() {
    let test = test_app(ScriptedModel::standard());

    let (status, body) = send(&test.app, upload_request("/analysis", "sheet.xlsx", "data")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unsupported file type"));
}

#[tokio::test]
async fn should_keep_step_when_proof_has_no_text() {
    let test = test_app(ScriptedModel::standard());
    let id = start_session(&test.app).await;
    send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;

    let (status, body) = send(
        &test.app,
        upload_request(&format!("/analysis/{id}/proof"), "payroll.txt", "   "),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "No text could be extracted from the document");

    let (status, snapshot) = send(&test.app, empty_request("GET", &format!("/analysis/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "employee_verification");
    let log = snapshot["log"].as_array().unwrap();
    assert!(log
        .iter()
        .any(|line| line.as_str().unwrap().contains("Verification of number_of_employees failed")));
}

#[tokio::test]
async fn should_refuse_report_before_verifications_finish() {
    let test = test_app(ScriptedModel::standard());
    let id = start_session(&test.app).await;

    let (status, _) = send(&test.app, empty_request("POST", &format!("/analysis/{id}/report"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn should_return_404_for_unknown_session() {
    let test = test_app(ScriptedModel::standard());

    let (status, _) = send(
        &test.app,
        empty_request("POST", "/analysis/00000000-0000-0000-0000-000000000000/skip"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_proof_result_when_session_changed_meanwhile() {
    let test = test_app(ScriptedModel::standard().gated(prompts::EMPLOYEE_SYSTEM));
    let id = start_session(&test.app).await;
    send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;

    let app = test.app.clone();
    let proof_uri = format!("/analysis/{id}/proof");
    let proof = tokio::spawn(async move {
        send(
            &app,
            upload_request(&proof_uri, "payroll.txt", "Total Number of Employees: 55"),
        )
        .await
    });

    let gate = test.model.gate.as_ref().unwrap();
    gate.entered.notified().await;
    let (status, snapshot) = send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "energy_verification");
    let (status, snapshot) = send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "water_verification");
    gate.release.notify_one();

    let (status, body) = proof.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("changed by another request"));

    let (_, snapshot) = send(&test.app, empty_request("GET", &format!("/analysis/{id}"))).await;
    assert_eq!(snapshot["step"], "water_verification");
    let statuses: Vec<(&str, &str)> = snapshot["verifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| (v["field"].as_str().unwrap(), v["status"].as_str().unwrap()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("square_feet", "skipped"),
            ("number_of_employees", "skipped"),
            ("power_consumption", "skipped"),
        ]
    );
}

#[tokio::test]
async fn should_verify_second_extracted_key_first() {
    let model = ScriptedModel::new().reply(
        prompts::FACILITY_SYSTEM,
        r#"{"name": "Acme Steel", "plot_area_sq_ft": 1500, "square_feet": 1200}"#,
    );
    let test = test_app(model);

    let (status, snapshot) = send(
        &test.app,
        upload_request("/analysis", "application.txt", "Application for Acme Steel"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(snapshot["step"], "area_verification");
    assert_eq!(snapshot["pending_field"], "plot_area_sq_ft");
}

#[tokio::test]
async fn should_restart_session_and_analyze_new_document() {
    let test = test_app(ScriptedModel::standard());
    let id = start_session(&test.app).await;
    send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;

    let (status, snapshot) = send(&test.app, empty_request("POST", &format!("/analysis/{id}/restart"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["session_id"], id.as_str());
    assert_eq!(snapshot["step"], "upload");
    assert_eq!(snapshot["record"], Value::Null);
    assert!(snapshot["verifications"].as_array().unwrap().is_empty());
    assert!(snapshot["log"]
        .as_array()
        .unwrap()
        .iter()
        .any(|line| *line == "Restarting process: session state reset."));

    let (status, _) = send(&test.app, empty_request("POST", &format!("/analysis/{id}/skip"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &test.app,
        upload_request(&format!("/analysis/{id}/document"), "application.txt", "  "),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "No text could be extracted from the document");

    let (_, snapshot) = send(&test.app, empty_request("GET", &format!("/analysis/{id}"))).await;
    assert_eq!(snapshot["step"], "upload");
    assert!(snapshot["log"]
        .as_array()
        .unwrap()
        .iter()
        .any(|line| line.as_str().unwrap().starts_with("Analysis failed:")));

    let (status, snapshot) = send(
        &test.app,
        upload_request(&format!("/analysis/{id}/document"), "application.txt", "Application for Acme Steel"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["step"], "area_verification");
    assert_eq!(snapshot["record"]["name"], "Acme Steel");

    let (status, _) = send(
        &test.app,
        upload_request(&format!("/analysis/{id}/document"), "application.txt", "Another application"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
