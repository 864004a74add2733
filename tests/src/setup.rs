//! Common test setup functions.

use api::{router, AppState};
use axum::Router;
use axum_test::TestServer;
use ledger::{Ledger, LedgerConfig};
use providers::{Completion, GeoLocator};
use std::sync::Arc;
use tempfile::TempDir;
use tracker_core::ExcludedNetworks;
use worker::{ChatConfig, ChatRelay, Notifier, SessionTracker, Summarizer, TrackerConfig};

use crate::fixtures;
use crate::mocks::{MockCompletion, MockGeo, MockMailer};

/// Test context wiring the real router to mock providers.
///
/// This provides the same production code paths by:
/// - Using the real Axum router with all layers
/// - Using mocks for the LLM, geolocation and SMTP traits
/// - Using a real ledger in a temporary data directory
pub struct TestContext {
    pub data_dir: TempDir,
    pub ledger: Arc<Ledger>,
    pub tracker: Arc<SessionTracker>,
    pub chat_llm: MockCompletion,
    pub analysis_llm: MockCompletion,
    pub geo: MockGeo,
    pub mailer: MockMailer,
    pub router: Router,
}

/// Knobs for [`TestContext::with_options`].
pub struct TestOptions {
    pub excluded_networks: Vec<String>,
    pub admin_code: Option<String>,
    pub geo: MockGeo,
    pub trust_proxy: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            excluded_networks: vec![fixtures::OFFICE_NETWORK.to_string()],
            admin_code: Some(fixtures::ADMIN_CODE.to_string()),
            geo: MockGeo::new(fixtures::toronto()),
            trust_proxy: true,
        }
    }
}

impl TestContext {
    /// Create a new test context with all components initialized.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let ledger = Arc::new(
            Ledger::open(LedgerConfig::new(data_dir.path()))
                .await
                .expect("Failed to open ledger"),
        );

        let chat_llm = MockCompletion::new(fixtures::IN_SCOPE_REPLY);
        let analysis_llm = MockCompletion::new(fixtures::ANALYSIS_REPLY);
        let mailer = MockMailer::new();
        let notifier = Arc::new(Notifier::new().with_mailer(Arc::new(mailer.clone())));

        let tracker = Arc::new(SessionTracker::new(
            TrackerConfig::default(),
            ledger.clone(),
            Arc::new(options.geo.clone()) as Arc<dyn GeoLocator>,
            Summarizer::new(Arc::new(analysis_llm.clone()) as Arc<dyn Completion>, 100),
            notifier.clone(),
            ExcludedNetworks::parse(&options.excluded_networks).expect("Invalid excluded networks"),
        ));

        let chat = Arc::new(ChatRelay::new(
            ChatConfig::default(),
            500,
            Arc::new(chat_llm.clone()) as Arc<dyn Completion>,
            ledger.clone(),
            tracker.clone(),
            notifier,
        ));

        let state = AppState::new(tracker.clone(), chat, ledger.clone(), options.admin_code)
            .with_trust_proxy(options.trust_proxy);
        let router = router(state);

        Self {
            data_dir,
            ledger,
            tracker,
            chat_llm,
            analysis_llm,
            geo: options.geo,
            mailer,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Registers a visit from [`fixtures::VISITOR_IP`] and returns the session id.
    pub async fn start_visit(&self, server: &TestServer) -> String {
        let response = server
            .post("/api/track/visit")
            .add_header("X-Forwarded-For", fixtures::VISITOR_IP)
            .json(&fixtures::visit_payload())
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["sessionId"]
            .as_str()
            .expect("visit should return a session id")
            .to_string()
    }

    /// Reads a persisted JSON document from the data directory.
    pub fn read_data_file(&self, name: &str) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.data_dir.path().join(name))
            .unwrap_or_else(|_| "null".to_string());
        serde_json::from_str(&raw).expect("data file should be valid JSON")
    }
}
