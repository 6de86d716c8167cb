//! Pipeline state machine.
//!
//! `Uninitialized → Initializing → Running → Stopping → Stopped`. Plugins are
//! resolved by name in [`Pipeline::new`], initialized by [`Pipeline::init`]
//! and driven round by round by [`Pipeline::run`]. Every plugin is closed
//! exactly once, whichever way the pipeline stops.

use tracing::Instrument;

use super::error::{PipelineError, RoundError, Stage};
use super::state::{PipelineState, StateStore};
use crate::plugins::{
    Exporter, Importer, InitProvider, PluginError, PluginRegistry, Processor,
};
use crate::shutdown::Shutdown;
use crate::types::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
}

pub struct Pipeline {
    config: PipelineConfig,
    importer: Box<dyn Importer>,
    processors: Vec<(String, Box<dyn Processor>)>,
    exporter: Box<dyn Exporter>,
    store: Box<dyn StateStore>,
    shutdown: Shutdown,
    status: PipelineStatus,
    state: PipelineState,
    closed: bool,
}

impl Pipeline {
    /// Resolve every configured plugin. Nothing is initialized yet.
    pub fn new(
        config: PipelineConfig,
        registry: &PluginRegistry,
        store: Box<dyn StateStore>,
        shutdown: Shutdown,
    ) -> Result<Self, PipelineError> {
        let unknown = |e: crate::plugins::RegistryError| PipelineError::Configuration(e.to_string());

        let importer = registry.importer(&config.importer.name).map_err(unknown)?;
        let processors = config
            .processors
            .iter()
            .map(|p| Ok((p.name.clone(), registry.processor(&p.name).map_err(unknown)?)))
            .collect::<Result<Vec<_>, PipelineError>>()?;
        let exporter = registry.exporter(&config.exporter.name).map_err(unknown)?;

        Ok(Self {
            config,
            importer,
            processors,
            exporter,
            store,
            shutdown,
            status: PipelineStatus::Uninitialized,
            state: PipelineState::default(),
            closed: false,
        })
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Round the pipeline will fetch next.
    pub fn next_round(&self) -> u64 {
        self.state.next_round
    }

    /// Load persisted state and initialize every plugin. On failure every
    /// plugin is closed and the pipeline ends up `Stopped`.
    pub async fn init(&mut self) -> Result<(), PipelineError> {
        if self.status != PipelineStatus::Uninitialized {
            return Err(PipelineError::Configuration(format!(
                "init called on a pipeline that is {:?}",
                self.status
            )));
        }
        self.status = PipelineStatus::Initializing;

        match self.init_plugins().await {
            Ok(()) => {
                self.status = PipelineStatus::Running;
                tracing::info!(
                    "Pipeline initialized: {} -> {} processor(s) -> {}, starting at round {}",
                    self.config.importer.name,
                    self.processors.len(),
                    self.config.exporter.name,
                    self.state.next_round
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Pipeline initialization failed: {}", e);
                self.stop().await;
                Err(e)
            }
        }
    }

    async fn init_plugins(&mut self) -> Result<(), PipelineError> {
        let stored = self.store.load()?;

        let importer_name = self.config.importer.name.clone();
        let genesis = self
            .importer
            .init(self.shutdown.clone(), &self.config.importer)
            .instrument(tracing::info_span!("importer", plugin = %importer_name))
            .await
            .map_err(|e| init_error("importer", &importer_name, e))?;

        if let Some(stored) = &stored {
            if !stored.genesis_hash.is_empty() && stored.genesis_hash != genesis.hash {
                return Err(PipelineError::GenesisMismatch {
                    stored: stored.genesis_hash.clone(),
                    actual: genesis.hash.clone(),
                });
            }
        }

        let round = match (self.config.next_round_override, &stored) {
            (Some(round), _) => {
                tracing::info!("Using next round override {}", round);
                round
            }
            (None, Some(stored)) => stored.next_round,
            (None, None) => 0,
        };

        let provider = InitProvider::new(genesis.clone(), round);

        for ((name, processor), cfg) in self.processors.iter_mut().zip(&self.config.processors) {
            processor
                .init(self.shutdown.clone(), &provider, cfg)
                .instrument(tracing::info_span!("processor", plugin = %name))
                .await
                .map_err(|e| init_error("processor", name.as_str(), e))?;
        }

        let exporter_name = self.config.exporter.name.clone();
        self.exporter
            .init(self.shutdown.clone(), &provider, &self.config.exporter)
            .instrument(tracing::info_span!("exporter", plugin = %exporter_name))
            .await
            .map_err(|e| init_error("exporter", &exporter_name, e))?;

        self.state = PipelineState {
            next_round: round,
            genesis_hash: genesis.hash,
            config: Some(self.config.clone()),
        };
        self.store.save(&self.state)?;

        Ok(())
    }

    /// Process rounds until cancelled or a round fails. Cancellation is a
    /// clean stop and returns `Ok`.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        if self.status != PipelineStatus::Running {
            return Err(PipelineError::Configuration(format!(
                "run called on a pipeline that is {:?}",
                self.status
            )));
        }

        let result = loop {
            if self.shutdown.is_cancelled() {
                break Ok(());
            }

            let round = self.state.next_round;
            match self.run_round(round).await {
                Ok(()) => {}
                Err(e) if e.is_cancellation() => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        match &result {
            Ok(()) => tracing::info!(
                "Pipeline stopping, next round is {}",
                self.state.next_round
            ),
            Err(e) => tracing::error!("Pipeline stopping on error: {}", e),
        }

        self.stop().await;
        result
    }

    async fn run_round(&mut self, round: u64) -> Result<(), PipelineError> {
        let importer_name = self.config.importer.name.clone();
        let mut block = self
            .importer
            .get_block(round)
            .instrument(tracing::debug_span!("importer", plugin = %importer_name, round))
            .await
            .map_err(|e| PipelineError::round(round, Stage::Fetch, e))?;
        check_round(round, block.round(), Stage::Fetch)?;

        for (index, (name, processor)) in self.processors.iter_mut().enumerate() {
            let stage = || Stage::Process {
                index,
                name: name.clone(),
            };
            block = processor
                .process(block)
                .instrument(tracing::debug_span!("processor", plugin = %name, round))
                .await
                .map_err(|e| PipelineError::round(round, stage(), e))?;
            check_round(round, block.round(), stage())?;
        }

        let exporter_name = self.config.exporter.name.clone();
        self.exporter
            .receive(&block)
            .instrument(tracing::debug_span!("exporter", plugin = %exporter_name, round))
            .await
            .map_err(|e| PipelineError::round(round, Stage::Export, e))?;

        self.importer
            .on_complete(&block)
            .instrument(tracing::debug_span!("importer", plugin = %importer_name, round))
            .await
            .map_err(|e| PipelineError::round(round, Stage::Complete, e))?;

        let mut next = self.state.clone();
        next.next_round = round + 1;
        self.store
            .save(&next)
            .map_err(|e| PipelineError::persist(round, e))?;
        self.state = next;

        tracing::debug!(
            "Round {} done with {} transaction(s)",
            round,
            block.payset.len()
        );
        Ok(())
    }

    /// Close every plugin once. Close errors are logged, not returned.
    async fn stop(&mut self) {
        if self.closed {
            return;
        }
        self.status = PipelineStatus::Stopping;
        self.closed = true;

        if let Err(e) = self.importer.close().await {
            tracing::warn!("Failed to close importer {}: {}", self.config.importer.name, e);
        }
        for (name, processor) in self.processors.iter_mut() {
            if let Err(e) = processor.close().await {
                tracing::warn!("Failed to close processor {}: {}", name, e);
            }
        }
        if let Err(e) = self.exporter.close().await {
            tracing::warn!("Failed to close exporter {}: {}", self.config.exporter.name, e);
        }

        self.status = PipelineStatus::Stopped;
    }
}

fn init_error(kind: &str, name: &str, e: PluginError) -> PipelineError {
    if e.is_cancelled() {
        return PipelineError::Cancelled;
    }
    PipelineError::Configuration(format!("{} '{}' failed to initialize: {}", kind, name, e))
}

fn check_round(expected: u64, actual: u64, stage: Stage) -> Result<(), PipelineError> {
    if expected == actual {
        return Ok(());
    }
    Err(PipelineError::FatalRound {
        round: expected,
        stage,
        source: RoundError::Plugin(PluginError::RoundMismatch { expected, actual }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::{MemoryStateStore, StateError};
    use crate::plugins::processors::filter;
    use crate::plugins::PluginMetadata;
    use crate::shutdown::{self, ShutdownTrigger};
    use crate::types::config::PluginConfig;
    use crate::types::data::{BlockData, Genesis};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const GENESIS_HASH: &str = "mock-genesis-hash";

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn matching(&self, prefix: &str) -> Vec<String> {
            self.events()
                .into_iter()
                .filter(|e| e.starts_with(prefix))
                .collect()
        }

        fn count(&self, event: &str) -> usize {
            self.events().iter().filter(|e| *e == event).count()
        }
    }

    fn metadata(name: &'static str) -> PluginMetadata {
        PluginMetadata {
            name,
            description: "test plugin",
            deprecated: false,
            sample_config: "{}",
        }
    }

    /// Serves rounds up to `last_round`, then cancels the pipeline.
    struct MockImporter {
        rec: Arc<Recorder>,
        last_round: u64,
        fail_complete_on: Option<u64>,
        trigger: ShutdownTrigger,
        shutdown: Option<Shutdown>,
    }

    #[async_trait]
    impl Importer for MockImporter {
        fn metadata(&self) -> PluginMetadata {
            metadata("mock_importer")
        }

        fn config(&self) -> String {
            "{}".to_string()
        }

        async fn init(
            &mut self,
            shutdown: Shutdown,
            _config: &PluginConfig,
        ) -> Result<Genesis, PluginError> {
            self.rec.push("init importer".to_string());
            self.shutdown = Some(shutdown);
            Ok(Genesis {
                id: "mock-v1".to_string(),
                network: "mock".to_string(),
                proto: "future".to_string(),
                hash: GENESIS_HASH.to_string(),
            })
        }

        async fn get_block(&mut self, round: u64) -> Result<BlockData, PluginError> {
            self.rec.push(format!("fetch {}", round));
            if round > self.last_round {
                self.trigger.cancel();
                if let Some(shutdown) = &self.shutdown {
                    shutdown.cancelled().await;
                }
                return Err(PluginError::Cancelled);
            }
            Ok(BlockData::empty(round))
        }

        async fn on_complete(&mut self, block: &BlockData) -> Result<(), PluginError> {
            self.rec.push(format!("complete {}", block.round()));
            if self.fail_complete_on == Some(block.round()) {
                return Err(PluginError::failed("mock_importer", "sync round rejected"));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), PluginError> {
            self.rec.push("close importer".to_string());
            Ok(())
        }
    }

    struct MockProcessor {
        rec: Arc<Recorder>,
        fail_on: Option<u64>,
        shift_round: bool,
    }

    #[async_trait]
    impl Processor for MockProcessor {
        fn metadata(&self) -> PluginMetadata {
            metadata("mock_processor")
        }

        fn config(&self) -> String {
            "{}".to_string()
        }

        async fn init(
            &mut self,
            _shutdown: Shutdown,
            provider: &InitProvider,
            _config: &PluginConfig,
        ) -> Result<(), PluginError> {
            self.rec.push(format!("init processor at {}", provider.next_round()));
            Ok(())
        }

        async fn process(&mut self, mut block: BlockData) -> Result<BlockData, PluginError> {
            self.rec.push(format!("process {}", block.round()));
            if self.fail_on == Some(block.round()) {
                return Err(PluginError::failed("mock_processor", "boom"));
            }
            if self.shift_round {
                block.header.round += 1;
            }
            Ok(block)
        }

        async fn close(&mut self) -> Result<(), PluginError> {
            self.rec.push("close processor".to_string());
            Ok(())
        }
    }

    struct MockExporter {
        rec: Arc<Recorder>,
        fail_on: Option<u64>,
    }

    #[async_trait]
    impl Exporter for MockExporter {
        fn metadata(&self) -> PluginMetadata {
            metadata("mock_exporter")
        }

        fn config(&self) -> String {
            "{}".to_string()
        }

        async fn init(
            &mut self,
            _shutdown: Shutdown,
            _provider: &InitProvider,
            _config: &PluginConfig,
        ) -> Result<(), PluginError> {
            self.rec.push("init exporter".to_string());
            Ok(())
        }

        async fn receive(&mut self, block: &BlockData) -> Result<(), PluginError> {
            self.rec.push(format!("export {}", block.round()));
            if self.fail_on == Some(block.round()) {
                return Err(PluginError::failed("mock_exporter", "disk full"));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), PluginError> {
            self.rec.push("close exporter".to_string());
            Ok(())
        }
    }

    fn registry(rec: &Arc<Recorder>, trigger: &ShutdownTrigger, last_round: u64) -> PluginRegistry {
        let mut registry = PluginRegistry::new();

        let importers: [(&str, Option<u64>); 2] =
            [("mock_importer", None), ("flaky_importer", Some(2))];
        for (name, fail_complete_on) in importers {
            let (r, t) = (rec.clone(), trigger.clone());
            registry
                .register_importer(name, move || {
                    Box::new(MockImporter {
                        rec: r.clone(),
                        last_round,
                        fail_complete_on,
                        trigger: t.clone(),
                        shutdown: None,
                    })
                })
                .unwrap();
        }

        let processors: [(&str, Option<u64>, bool); 3] = [
            ("mock_processor", None, false),
            ("failing_processor", Some(2), false),
            ("shifting_processor", None, true),
        ];
        for (name, fail_on, shift_round) in processors {
            let r = rec.clone();
            registry
                .register_processor(name, move || {
                    Box::new(MockProcessor {
                        rec: r.clone(),
                        fail_on,
                        shift_round,
                    })
                })
                .unwrap();
        }
        registry
            .register_processor(filter::PLUGIN_NAME, || Box::new(filter::FilterProcessor::new()))
            .unwrap();

        let exporters: [(&str, Option<u64>); 2] =
            [("mock_exporter", None), ("failing_exporter", Some(2))];
        for (name, fail_on) in exporters {
            let r = rec.clone();
            registry
                .register_exporter(name, move || {
                    Box::new(MockExporter {
                        rec: r.clone(),
                        fail_on,
                    })
                })
                .unwrap();
        }

        registry
    }

    fn config(processors: Vec<PluginConfig>, next_round_override: Option<u64>) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            PluginConfig::named("mock_importer"),
            processors,
            PluginConfig::named("mock_exporter"),
        );
        config.next_round_override = next_round_override;
        config
    }

    struct Harness {
        rec: Arc<Recorder>,
        pipeline: Pipeline,
    }

    fn harness(config: PipelineConfig, store: &MemoryStateStore, last_round: u64) -> Harness {
        let rec = Arc::new(Recorder::default());
        let (trigger, shutdown) = shutdown::channel();
        let registry = registry(&rec, &trigger, last_round);
        let pipeline = match Pipeline::new(config, &registry, Box::new(store.clone()), shutdown) {
            Ok(pipeline) => pipeline,
            Err(e) => panic!("failed to build pipeline: {}", e),
        };
        Harness { rec, pipeline }
    }

    fn assert_closed_once(rec: &Recorder) {
        assert_eq!(rec.count("close importer"), 1);
        assert_eq!(rec.count("close exporter"), 1);
    }

    #[tokio::test]
    async fn test_processes_rounds_in_order_and_persists_resume_round() {
        let store = MemoryStateStore::new();
        let config = config(vec![PluginConfig::named("mock_processor")], Some(1));
        let Harness { rec, mut pipeline } = harness(config, &store, 3);

        pipeline.init().await.unwrap();
        assert_eq!(pipeline.status(), PipelineStatus::Running);
        pipeline.run().await.unwrap();

        assert_eq!(pipeline.status(), PipelineStatus::Stopped);
        assert_eq!(rec.matching("complete"), vec!["complete 1", "complete 2", "complete 3"]);

        let round_one: Vec<String> = rec
            .events()
            .into_iter()
            .filter(|e| e.ends_with(" 1") && !e.starts_with("init"))
            .collect();
        assert_eq!(round_one, vec!["fetch 1", "process 1", "export 1", "complete 1"]);

        assert_eq!(store.snapshot().map(|s| s.next_round), Some(4));
        assert_eq!(rec.count("close processor"), 1);
        assert_closed_once(&rec);
    }

    #[tokio::test]
    async fn test_restart_resumes_after_last_completed_round() {
        let store = MemoryStateStore::new();

        let first = harness(config(Vec::new(), Some(1)), &store, 3);
        let mut pipeline = first.pipeline;
        pipeline.init().await.unwrap();
        pipeline.run().await.unwrap();

        let Harness { rec, mut pipeline } = harness(config(Vec::new(), None), &store, 5);
        pipeline.init().await.unwrap();
        assert_eq!(pipeline.next_round(), 4);
        pipeline.run().await.unwrap();

        assert_eq!(rec.matching("export"), vec!["export 4", "export 5"]);
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(6));
    }

    #[tokio::test]
    async fn test_processor_sees_start_round() {
        let store = MemoryStateStore::with_state(PipelineState {
            next_round: 9,
            genesis_hash: GENESIS_HASH.to_string(),
            config: None,
        });
        let Harness { rec, mut pipeline } =
            harness(config(vec![PluginConfig::named("mock_processor")], None), &store, 9);

        pipeline.init().await.unwrap();
        assert_eq!(rec.matching("init processor"), vec!["init processor at 9"]);
    }

    #[tokio::test]
    async fn test_fatal_round_does_not_advance_persisted_round() {
        let store = MemoryStateStore::new();
        let config = config(vec![PluginConfig::named("failing_processor")], Some(1));
        let Harness { rec, mut pipeline } = harness(config, &store, 5);

        pipeline.init().await.unwrap();
        let err = pipeline.run().await.unwrap_err();

        match err {
            PipelineError::FatalRound { round, stage, .. } => {
                assert_eq!(round, 2);
                assert_eq!(
                    stage,
                    Stage::Process {
                        index: 0,
                        name: "failing_processor".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(rec.matching("export"), vec!["export 1"]);
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(2));
        assert_eq!(pipeline.status(), PipelineStatus::Stopped);
        assert_closed_once(&rec);
    }

    #[tokio::test]
    async fn test_export_failure_is_fatal_and_skips_complete() {
        let store = MemoryStateStore::new();
        let mut config = config(Vec::new(), Some(1));
        config.exporter = PluginConfig::named("failing_exporter");
        let Harness { rec, mut pipeline } = harness(config, &store, 5);

        pipeline.init().await.unwrap();
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::FatalRound {
                round: 2,
                stage: Stage::Export,
                ..
            }
        ));
        assert_eq!(rec.matching("export"), vec!["export 1", "export 2"]);
        assert_eq!(rec.matching("complete"), vec!["complete 1"]);
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(2));
        assert_eq!(pipeline.status(), PipelineStatus::Stopped);
        assert_closed_once(&rec);
    }

    #[tokio::test]
    async fn test_on_complete_failure_is_fatal() {
        let store = MemoryStateStore::new();
        let mut config = config(Vec::new(), Some(1));
        config.importer = PluginConfig::named("flaky_importer");
        let Harness { rec, mut pipeline } = harness(config, &store, 5);

        pipeline.init().await.unwrap();
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::FatalRound {
                round: 2,
                stage: Stage::Complete,
                ..
            }
        ));
        assert_eq!(rec.matching("complete"), vec!["complete 1", "complete 2"]);
        assert!(rec.matching("fetch 3").is_empty());
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(2));
        assert_closed_once(&rec);
    }

    /// Accepts `saves_left` saves, then fails every later one.
    struct ExhaustedStore {
        inner: MemoryStateStore,
        saves_left: usize,
    }

    impl StateStore for ExhaustedStore {
        fn load(&self) -> Result<Option<PipelineState>, StateError> {
            self.inner.load()
        }

        fn save(&mut self, state: &PipelineState) -> Result<(), StateError> {
            if self.saves_left == 0 {
                return Err(StateError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no space left on device",
                )));
            }
            self.saves_left -= 1;
            self.inner.save(state)
        }
    }

    #[tokio::test]
    async fn test_persist_failure_reports_round_and_stage() {
        let observer = MemoryStateStore::new();
        let store = ExhaustedStore {
            inner: observer.clone(),
            saves_left: 1,
        };
        let rec = Arc::new(Recorder::default());
        let (trigger, shutdown) = shutdown::channel();
        let registry = registry(&rec, &trigger, 5);
        let mut pipeline =
            match Pipeline::new(config(Vec::new(), Some(1)), &registry, Box::new(store), shutdown) {
                Ok(pipeline) => pipeline,
                Err(e) => panic!("failed to build pipeline: {}", e),
            };

        pipeline.init().await.unwrap();
        let err = pipeline.run().await.unwrap_err();

        match err {
            PipelineError::FatalRound {
                round,
                stage,
                source,
            } => {
                assert_eq!(round, 1);
                assert_eq!(stage, Stage::Persist);
                assert!(matches!(source, RoundError::State(StateError::Io(_))));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(rec.matching("complete"), vec!["complete 1"]);
        assert!(rec.matching("fetch 2").is_empty());
        assert_eq!(pipeline.next_round(), 1);
        assert_eq!(observer.snapshot().map(|s| s.next_round), Some(1));
        assert_closed_once(&rec);
    }

    #[tokio::test]
    async fn test_processor_changing_round_is_fatal() {
        let store = MemoryStateStore::new();
        let config = config(vec![PluginConfig::named("shifting_processor")], Some(1));
        let Harness { rec, mut pipeline } = harness(config, &store, 5);

        pipeline.init().await.unwrap();
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FatalRound {
                round: 1,
                source: RoundError::Plugin(PluginError::RoundMismatch { expected: 1, actual: 2 }),
                ..
            }
        ));
        assert!(rec.matching("export").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_filter_field_never_reaches_running() {
        let store = MemoryStateStore::new();
        let filter_config = PluginConfig::new(
            filter::PLUGIN_NAME,
            json!({
                "filters": [
                    {"any": [{"tag": "txn.nope", "expression-type": "exact", "expression": "x"}]}
                ]
            }),
        );
        let Harness { rec, mut pipeline } = harness(config(vec![filter_config], None), &store, 3);

        let err = pipeline.init().await.unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(pipeline.status(), PipelineStatus::Stopped);
        assert!(pipeline.run().await.is_err());
        assert!(rec.matching("fetch").is_empty());
        assert!(store.snapshot().is_none());
        assert_closed_once(&rec);
    }

    #[tokio::test]
    async fn test_genesis_mismatch_fails_init() {
        let store = MemoryStateStore::with_state(PipelineState {
            next_round: 10,
            genesis_hash: "some-other-network".to_string(),
            config: None,
        });
        let Harness { rec, mut pipeline } = harness(config(Vec::new(), None), &store, 20);

        let err = pipeline.init().await.unwrap_err();
        assert!(matches!(err, PipelineError::GenesisMismatch { .. }));
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(10));
        assert_closed_once(&rec);
    }

    #[test]
    fn test_unknown_plugin_is_a_configuration_error() {
        let rec = Arc::new(Recorder::default());
        let (trigger, shutdown) = shutdown::channel();
        let registry = registry(&rec, &trigger, 1);
        let mut config = config(Vec::new(), None);
        config.exporter = PluginConfig::named("postgres");

        let result = Pipeline::new(config, &registry, Box::new(MemoryStateStore::new()), shutdown);
        assert!(matches!(result.err(), Some(PipelineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_run_stops_cleanly() {
        let store = MemoryStateStore::new();
        let rec = Arc::new(Recorder::default());
        let (trigger, shutdown) = shutdown::channel();
        let registry = registry(&rec, &trigger, 10);
        let mut pipeline =
            match Pipeline::new(config(Vec::new(), Some(1)), &registry, Box::new(store.clone()), shutdown) {
                Ok(pipeline) => pipeline,
                Err(e) => panic!("failed to build pipeline: {}", e),
            };

        pipeline.init().await.unwrap();
        trigger.cancel();
        pipeline.run().await.unwrap();

        assert!(rec.matching("fetch").is_empty());
        assert_eq!(store.snapshot().map(|s| s.next_round), Some(1));
        assert_closed_once(&rec);
    }
}
