use crate::errors::ApiError;
use crate::ingest::{ingest_directory, IngestSummary};
use anyhow::{Context, Result};
use compliance_core::{
    AnalysisSession, Config, Message, SessionStore, SessionUpdate, VerificationOutcome,
    VerificationStatus, WorkflowStep,
};
use documents::{extract_text, DocumentKind, OcrEngine, TesseractCli};
use embeddings::{create_embedding_provider, EmbeddingProvider};
use extraction::{
    analyze_text, generate_compliance_report, render_application_query, IndustrialApplication,
};
use llm::{ChatMessage, ChatModel, CompletionParams, LocalLlmClient, ModelConfig};
use log::{info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;
use vector_store::{open_collection, Collection};
use verification::VerifierRegistry;

/// Rules retrieved for a report.
pub const REPORT_RULE_COUNT: usize = 5;

pub struct ComplianceService {
    config: Config,
    model: Arc<dyn ChatModel>,
    embedder: Box<dyn EmbeddingProvider>,
    collection: Arc<dyn Collection>,
    ocr: Arc<dyn OcrEngine>,
    verifiers: VerifierRegistry,
    sessions: RwLock<SessionStore>,
}

impl std::fmt::Debug for ComplianceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceService")
            .field("config", &self.config)
            .field("model", &"ChatModel<...>")
            .field("embedder", &"EmbeddingProvider<...>")
            .field("collection", &self.collection.name())
            .field("verifiers", &self.verifiers.list())
            .finish()
    }
}

/// An uploaded file copied to a private temporary directory.
struct Upload {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl Upload {
    async fn store(file_name: &str, bytes: &[u8]) -> Result<Self, ApiError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let stored_name = format!("upload.{}", extension);
        if DocumentKind::from_path(Path::new(&stored_name)).is_none() {
            return Err(ApiError::InvalidRequest(format!(
                "Unsupported file type: {}",
                file_name
            )));
        }

        let dir = tempfile::tempdir().context("Failed to create upload directory")?;
        let path = dir.path().join(stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .context("Failed to store upload")?;
        Ok(Self { _dir: dir, path })
    }
}

impl ComplianceService {
    pub async fn new(config: Config) -> Result<Self> {
        let model_config = ModelConfig::from(&config.llm);
        let model: Arc<dyn ChatModel> = Arc::new(
            LocalLlmClient::new(model_config).context("Failed to create language model client")?,
        );

        let embedder = create_embedding_provider(&config.embedding)
            .context("Failed to create embedding provider")?;

        info!(
            "Opening collection '{}' at {}",
            config.vector_store.collection, config.vector_store.url
        );
        let collection = open_collection(
            &config.vector_store.url,
            &config.vector_store.collection,
            Some(embedder.dimension()),
        )
        .await
        .context("Failed to open vector store collection")?;

        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractCli::new(&config.ocr));

        Self::with_clients(config, model, embedder, collection, ocr)
    }

    pub fn with_clients(
        config: Config,
        model: Arc<dyn ChatModel>,
        embedder: Box<dyn EmbeddingProvider>,
        collection: Arc<dyn Collection>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Result<Self> {
        let verifiers =
            VerifierRegistry::standard(model.clone(), ocr.clone(), config.verification.tolerance)
                .context("Failed to register verifiers")?;

        Ok(Self {
            config,
            model,
            embedder,
            collection,
            ocr,
            verifiers,
            sessions: RwLock::new(SessionStore::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn collection(&self) -> &dyn Collection {
        self.collection.as_ref()
    }

    pub async fn ingest_documents(&self) -> Result<IngestSummary> {
        let dir = Path::new(&self.config.data.document_dir);
        ingest_directory(
            dir,
            self.ocr.as_ref(),
            self.embedder.as_ref(),
            self.collection.as_ref(),
        )
        .await
    }

    /// Documents nearest to the query text, closest first.
    pub async fn retrieve_rules(&self, query: &str, n_results: usize) -> Result<Vec<String>> {
        let embedding = self
            .embedder
            .embed(vec![query.to_string()])
            .await
            .context("Failed to embed retrieval query")?
            .into_iter()
            .next()
            .context("No embedding generated for retrieval query")?;

        let results = self.collection.query(&[embedding], n_results).await?;
        Ok(results
            .into_iter()
            .next()
            .map(|result| result.documents)
            .unwrap_or_default())
    }

    pub async fn generate_report(&self, app: &IndustrialApplication) -> Result<String, ApiError> {
        let (_, report) = self.generate_report_with_rules(app).await?;
        Ok(report)
    }

    /// Retrieves the rules closest to the application and asks the model for
    /// a report over them. Returns the rules alongside the report.
    pub async fn generate_report_with_rules(
        &self,
        app: &IndustrialApplication,
    ) -> Result<(Vec<String>, String), ApiError> {
        let query = render_application_query(app);
        let rules = self.retrieve_rules(&query, REPORT_RULE_COUNT).await?;

        info!("Top relevant compliance rules:");
        for rule in &rules {
            info!("- {}", rule);
        }

        let report = generate_compliance_report(self.model.as_ref(), app, &rules).await?;
        Ok((rules, report))
    }

    /// Forwards the conversation history as-is.
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String, ApiError> {
        if messages.is_empty() {
            return Err(ApiError::InvalidRequest(
                "At least one message is required".to_string(),
            ));
        }
        let messages: Vec<ChatMessage> = messages.into_iter().map(ChatMessage::from).collect();
        Ok(self
            .model
            .complete(messages, CompletionParams::CONVERSATION)
            .await?)
    }

    /// Reads an application document and opens a session at the first
    /// verification step. Nothing is stored when the analysis fails.
    pub async fn start_analysis(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AnalysisSession, ApiError> {
        let mut session = AnalysisSession::new();
        self.analyze(&mut session, file_name, bytes).await?;

        info!("Created analysis session {}", session.id);
        self.sessions.write().await.insert(session.clone());
        Ok(session)
    }

    /// Runs the analysis of a new application document for a restarted session.
    /// A failed analysis leaves the session at the upload step with the error logged.
    pub async fn upload_document(
        &self,
        id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AnalysisSession, ApiError> {
        let mut session = self.session(id).await?;
        if session.step != WorkflowStep::Upload {
            return Err(ApiError::Conflict(format!(
                "Session is at step {:?}; restart it before uploading a new application",
                session.step
            )));
        }

        match self.analyze(&mut session, file_name, bytes).await {
            Ok(()) => self.save(session).await,
            Err(e) => {
                warn!("Analysis of {} failed: {}", file_name, e);
                session.log_debug(format!("Analysis failed: {}", e));
                session.reset_to_upload();
                self.save(session).await?;
                Err(e)
            }
        }
    }

    async fn analyze(
        &self,
        session: &mut AnalysisSession,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), ApiError> {
        let upload = Upload::store(file_name, bytes).await?;

        session.source_file = Some(file_name.to_string());
        session.log_debug(format!("File uploaded: {}", file_name));
        session.advance();

        let text = extract_text(&upload.path, self.ocr.as_ref())
            .await
            .map_err(|e| {
                ApiError::Unprocessable(format!("Failed to read {}: {:#}", file_name, e))
            })?;
        session.log_debug(format!("Extracted {} characters of text", text.len()));

        let record = analyze_text(self.model.as_ref(), &text).await?;
        if record.len() < 2 {
            return Err(ApiError::Unprocessable(format!(
                "Analysis returned {} field(s); at least two are required",
                record.len()
            )));
        }

        session.log_debug(format!("Analysis result fields: {:?}", record.keys()));
        session.extracted_text = Some(text);
        session.record = Some(record);
        session.advance();
        Ok(())
    }

    pub async fn session(&self, id: Uuid) -> Result<AnalysisSession, ApiError> {
        self.sessions
            .write()
            .await
            .touch(&id)
            .ok_or(ApiError::SessionNotFound(id))
    }

    /// Stores a session read earlier by `session`. Fails with a conflict when
    /// another request saved it in between, so no update is lost.
    async fn save(&self, session: AnalysisSession) -> Result<AnalysisSession, ApiError> {
        let id = session.id;
        let mut sessions = self.sessions.write().await;
        match sessions.update_if_unchanged(session) {
            SessionUpdate::Updated => sessions.get(&id).ok_or(ApiError::SessionNotFound(id)),
            SessionUpdate::Missing => Err(ApiError::SessionNotFound(id)),
            SessionUpdate::Stale => Err(ApiError::Conflict(format!(
                "Session {} was changed by another request; reload it and retry",
                id
            ))),
        }
    }

    fn verifier_field(session: &AnalysisSession) -> Result<&'static str, ApiError> {
        session.step.verified_field().ok_or_else(|| {
            ApiError::Conflict(format!(
                "Session is at step {:?}, which takes no proof document",
                session.step
            ))
        })
    }

    /// Checks the current step's field against a proof document. Verified and
    /// mismatched outcomes advance the workflow; inconclusive ones and errors
    /// keep the step so another proof can be uploaded.
    pub async fn submit_proof(
        &self,
        id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AnalysisSession, ApiError> {
        let mut session = self.session(id).await?;
        let field = Self::verifier_field(&session)?;
        let upload = Upload::store(file_name, bytes).await?;
        let key = session.pending_field().unwrap_or(field).to_string();
        session.log_debug(format!("Proof file uploaded for {}: {}", key, file_name));

        let claimed = session.claimed_value();
        match self.verifiers.verify(field, &claimed, &upload.path).await {
            Ok(outcome) => {
                session.log_debug(format!(
                    "Verification of {}: claimed {}, observed {}, {:?}",
                    key, outcome.claimed, outcome.observed, outcome.status
                ));
                let advances = matches!(
                    outcome.status,
                    VerificationStatus::Verified | VerificationStatus::Mismatch
                );
                session.record_verification(outcome);
                if advances {
                    session.advance();
                }
                self.save(session).await
            }
            Err(e) => {
                warn!("Verification of {} failed: {}", key, e);
                session.log_debug(format!("Verification of {} failed: {}", key, e));
                self.save(session).await?;
                Err(e.into())
            }
        }
    }

    pub async fn skip_step(&self, id: Uuid) -> Result<AnalysisSession, ApiError> {
        let mut session = self.session(id).await?;
        let field = Self::verifier_field(&session)?;

        session.record_verification(VerificationOutcome::skipped(field));
        session.log_debug(format!("Skipped verification of {}", field));
        session.advance();
        self.save(session).await
    }

    /// Generates the compliance report from the session's record and completes
    /// the workflow.
    pub async fn session_report(&self, id: Uuid) -> Result<AnalysisSession, ApiError> {
        let mut session = self.session(id).await?;
        if !matches!(
            session.step,
            WorkflowStep::ReportGeneration | WorkflowStep::Complete
        ) {
            return Err(ApiError::Conflict(format!(
                "Report generation is not available at step {:?}",
                session.step
            )));
        }
        let record = session
            .record
            .as_ref()
            .ok_or_else(|| ApiError::Conflict("Session has no analysis result".to_string()))?;

        let app = IndustrialApplication::from_record(record);
        let report = self.generate_report(&app).await?;

        session.log_debug("Compliance report generated");
        session.report = Some(report);
        session.step = WorkflowStep::Complete;
        self.save(session).await
    }

    /// Back to the upload step with every result cleared; the log is kept.
    pub async fn restart_session(&self, id: Uuid) -> Result<AnalysisSession, ApiError> {
        let mut session = self.session(id).await?;
        session.restart();
        info!("Restarted analysis session {}", id);
        self.save(session).await
    }

    pub async fn export_record(&self, id: Uuid) -> Result<Value, ApiError> {
        let session = self.session(id).await?;
        session
            .record
            .map(|record| record.to_json())
            .ok_or_else(|| ApiError::Conflict("Session has no analysis result".to_string()))
    }

    /// Drops the session and everything derived from it.
    pub async fn delete_session(&self, id: Uuid) -> Result<(), ApiError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("Restarting process: session {} removed", id);
                Ok(())
            }
            None => Err(ApiError::SessionNotFound(id)),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than the configured TTL.
    pub async fn gc_sessions(&self) -> usize {
        let ttl = Duration::from_secs(self.config.server.session_ttl_seconds);
        self.sessions.write().await.gc(ttl)
    }
}
