//! Result aggregation across agents, summary and retrieval.

use crate::error::{CascadeError, InferenceError};
use crate::inference::{
    build_prompt, placeholder_result, AgentInference, TextGenerator, OFFLINE_SUMMARY,
};
use crate::models::{AgentDescriptor, AgentId, Registry, ResultRecord, ResultSet, ResultSource};
use crate::retrieval::{retrieve, RetrievalIndex};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning for a cascade run.
#[derive(Debug, Clone)]
pub struct CascadeOptions {
    /// Maximum number of agent calls in flight.
    pub concurrency: usize,
    /// Per-call timeout for agent requests.
    pub timeout_seconds: u64,
    /// Timeout for the text-generation request.
    pub summary_timeout_seconds: u64,
    /// Show a progress bar while agents run.
    pub show_progress: bool,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_seconds: 10,
            summary_timeout_seconds: 30,
            show_progress: false,
        }
    }
}

/// Runs the agent cascade against injected backends.
pub struct Cascade {
    inference: Arc<dyn AgentInference>,
    generator: Arc<dyn TextGenerator>,
    options: CascadeOptions,
}

impl Cascade {
    pub fn new(
        inference: Arc<dyn AgentInference>,
        generator: Arc<dyn TextGenerator>,
        options: CascadeOptions,
    ) -> Self {
        Self {
            inference,
            generator,
            options,
        }
    }

    /// Aggregates one result per registry agent plus the summary and retrieval snippet.
    pub async fn aggregate(
        &self,
        input: &str,
        registry: &Registry,
        retrieval: Option<&RetrievalIndex>,
    ) -> Result<ResultSet, CascadeError> {
        if !registry.primary_ready() {
            warn!("Primary agent is not ready; refusing to run cascade");
            return Err(CascadeError::AgentNotReady(AgentId::PRIMARY));
        }

        info!("Running cascade over {} agents", registry.len());

        let progress = self.progress_bar(registry.len() as u64);

        let mut agent_results: Vec<ResultRecord> = stream::iter(registry.iter())
            .map(|agent| self.run_agent(agent, input))
            .buffer_unordered(self.options.concurrency.max(1))
            .inspect(|_| progress.inc(1))
            .collect()
            .await;

        progress.finish_and_clear();

        // Completion order is arbitrary under concurrency.
        agent_results.sort_by_key(|r| r.agent_id);

        let placeholders = agent_results
            .iter()
            .filter(|r| r.source == ResultSource::Placeholder)
            .count();
        if placeholders > 0 {
            info!("{} of {} agents used placeholder results", placeholders, agent_results.len());
        }

        let summary = self.summarize(&agent_results).await;
        let retrieval = retrieve(input, retrieval);

        Ok(ResultSet {
            agent_results,
            summary,
            retrieval,
        })
    }

    /// Calls one agent, substituting a placeholder on any failure.
    async fn run_agent(&self, agent: &AgentDescriptor, input: &str) -> ResultRecord {
        let outcome = if agent.ready {
            let timeout = Duration::from_secs(self.options.timeout_seconds);
            match tokio::time::timeout(timeout, self.inference.predict(agent, input)).await {
                Ok(result) => result,
                Err(_) => Err(InferenceError::Timeout(self.options.timeout_seconds)),
            }
        } else {
            Err(InferenceError::Unconfigured)
        };

        match outcome {
            Ok(prediction) => ResultRecord {
                agent_id: agent.id,
                label: prediction.label,
                confidence: prediction.confidence.clamp(0.0, 1.0),
                source: ResultSource::Endpoint,
            },
            Err(e) => {
                debug!("Agent {} ({}) fell back to placeholder: {}", agent.id, agent.name, e);
                let prediction = placeholder_result(&mut rand::thread_rng());
                ResultRecord {
                    agent_id: agent.id,
                    label: prediction.label,
                    confidence: prediction.confidence,
                    source: ResultSource::Placeholder,
                }
            }
        }
    }

    /// Requests the free-text summary, returning [`OFFLINE_SUMMARY`] on failure.
    async fn summarize(&self, results: &[ResultRecord]) -> String {
        let prompt = build_prompt(results);
        let timeout = Duration::from_secs(self.options.summary_timeout_seconds);

        let outcome = match tokio::time::timeout(timeout, self.generator.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout(self.options.summary_timeout_seconds)),
        };

        match outcome {
            Ok(text) => text,
            Err(InferenceError::MissingCredential) => {
                info!("No text-generation credential configured; using offline summary");
                OFFLINE_SUMMARY.to_string()
            }
            Err(e) => {
                warn!("Summary generation failed: {}", e);
                OFFLINE_SUMMARY.to_string()
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} agents")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{HuggingFaceGenerator, Prediction, Unavailable};
    use crate::models::RetrievalRecord;
    use crate::source::http_client;
    use crate::test_support::StubServer;
    use async_trait::async_trait;

    /// Answers `Label{id}` with confidence `id / 100`, slower for lower ids.
    struct EchoInference;

    #[async_trait]
    impl AgentInference for EchoInference {
        async fn predict(
            &self,
            agent: &AgentDescriptor,
            _input: &str,
        ) -> Result<Prediction, InferenceError> {
            tokio::time::sleep(Duration::from_millis(50 / agent.id.0.max(1) as u64)).await;
            Ok(Prediction {
                label: format!("Label{}", agent.id),
                confidence: agent.id.0 as f64 / 100.0,
            })
        }
    }

    /// Fails for even ids.
    struct FlakyInference;

    #[async_trait]
    impl AgentInference for FlakyInference {
        async fn predict(
            &self,
            agent: &AgentDescriptor,
            _input: &str,
        ) -> Result<Prediction, InferenceError> {
            if agent.id.0 % 2 == 0 {
                Err(InferenceError::Status(500))
            } else {
                Ok(Prediction {
                    label: "Low Risk".to_string(),
                    confidence: 1.7,
                })
            }
        }
    }

    struct StalledInference;

    #[async_trait]
    impl AgentInference for StalledInference {
        async fn predict(
            &self,
            _agent: &AgentDescriptor,
            _input: &str,
        ) -> Result<Prediction, InferenceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(InferenceError::Unconfigured)
        }
    }

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
            Ok(self.0.to_string())
        }
    }

    fn registry(n: u32) -> Registry {
        Registry::from_descriptors(
            (1..=n).map(|i| AgentDescriptor::ready(AgentId(i), format!("Agent{}", i))),
        )
    }

    fn cascade(inference: Arc<dyn AgentInference>, generator: Arc<dyn TextGenerator>) -> Cascade {
        Cascade::new(
            inference,
            generator,
            CascadeOptions {
                concurrency: 4,
                timeout_seconds: 1,
                summary_timeout_seconds: 3,
                show_progress: false,
            },
        )
    }

    fn offline_generator(token: Option<&str>, url: &str) -> Arc<dyn TextGenerator> {
        Arc::new(HuggingFaceGenerator::new(
            url,
            token.map(String::from),
            http_client(5).unwrap(),
            5,
        ))
    }

    fn assert_placeholder(record: &ResultRecord) {
        assert_eq!(record.source, ResultSource::Placeholder);
        assert!(record.confidence >= 0.85 && record.confidence < 1.0);
        let risk: u32 = record
            .label
            .strip_prefix("Risk ")
            .and_then(|s| s.strip_suffix('%'))
            .and_then(|s| s.parse().ok())
            .expect("placeholder label");
        assert!(risk < 100);
    }

    #[tokio::test]
    async fn test_one_result_per_agent_in_id_order() {
        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("chest pain", &registry(10), None).await.unwrap();

        let ids: Vec<_> = results.agent_results.iter().map(|r| r.agent_id.0).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert_eq!(results.result_for(AgentId(7)).unwrap().label, "Label7");
        assert!(results.agent_results.iter().all(|r| r.source == ResultSource::Endpoint));
        assert_eq!(results.summary, "ok");
        assert_eq!(results.retrieval.len(), 1);
    }

    #[tokio::test]
    async fn test_primary_not_ready_blocks_cascade() {
        let mut agents: Vec<_> = registry(3).iter().cloned().collect();
        agents[0].ready = false;
        let registry = Registry::from_descriptors(agents);

        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        let err = cascade.aggregate("x", &registry, None).await.unwrap_err();
        assert_eq!(err, CascadeError::AgentNotReady(AgentId::PRIMARY));
    }

    #[tokio::test]
    async fn test_missing_primary_blocks_cascade() {
        let registry = Registry::from_descriptors(vec![AgentDescriptor::ready(AgentId(2), "Two")]);
        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        assert!(cascade.aggregate("x", &registry, None).await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_backend_uses_placeholders() {
        let cascade = cascade(Arc::new(Unavailable), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("x", &registry(10), None).await.unwrap();

        assert_eq!(results.agent_results.len(), 10);
        results.agent_results.iter().for_each(assert_placeholder);
    }

    #[tokio::test]
    async fn test_partial_failures_and_confidence_clamp() {
        let cascade = cascade(Arc::new(FlakyInference), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("x", &registry(4), None).await.unwrap();

        let first = results.result_for(AgentId(1)).unwrap();
        assert_eq!(first.source, ResultSource::Endpoint);
        assert_eq!(first.confidence, 1.0);
        assert_placeholder(results.result_for(AgentId(2)).unwrap());
        assert_placeholder(results.result_for(AgentId(4)).unwrap());
    }

    #[tokio::test]
    async fn test_unready_secondary_agent_gets_placeholder() {
        let mut agents: Vec<_> = registry(2).iter().cloned().collect();
        agents[1].ready = false;
        let registry = Registry::from_descriptors(agents);

        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("x", &registry, None).await.unwrap();
        assert_eq!(results.result_for(AgentId(1)).unwrap().source, ResultSource::Endpoint);
        assert_placeholder(results.result_for(AgentId(2)).unwrap());
    }

    #[tokio::test]
    async fn test_timeout_uses_placeholder() {
        let cascade = cascade(Arc::new(StalledInference), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("x", &registry(2), None).await.unwrap();
        results.agent_results.iter().for_each(assert_placeholder);
    }

    #[tokio::test]
    async fn test_summary_without_credential_is_offline() {
        let generator = offline_generator(None, "http://127.0.0.1:1/generate");
        let cascade = cascade(Arc::new(Unavailable), generator);
        let results = cascade.aggregate("x", &registry(3), None).await.unwrap();
        assert_eq!(results.summary, OFFLINE_SUMMARY);
    }

    #[tokio::test]
    async fn test_summary_failing_call_matches_no_credential_value() {
        let server = StubServer::start(500, r#"{"error": "boom"}"#).await;
        let with_token = cascade(Arc::new(Unavailable), offline_generator(Some("hf_x"), &server.url));
        let without_token = cascade(Arc::new(Unavailable), offline_generator(None, &server.url));

        let failing = with_token.aggregate("x", &registry(3), None).await.unwrap();
        let missing = without_token.aggregate("x", &registry(3), None).await.unwrap();

        assert_eq!(server.requests().len(), 1);
        assert_eq!(failing.summary, OFFLINE_SUMMARY);
        assert_eq!(failing.summary, missing.summary);
    }

    #[tokio::test]
    async fn test_summary_from_endpoint() {
        let server = StubServer::start(200, r#"[{"generated_text": "All agents agree."}]"#).await;
        let cascade = cascade(Arc::new(Unavailable), offline_generator(Some("hf_x"), &server.url));
        let results = cascade.aggregate("x", &registry(6), None).await.unwrap();

        assert_eq!(results.summary, "All agents agree.");
        assert!(server.requests()[0].contains("Analyze MedAI results"));
    }

    #[tokio::test]
    async fn test_summary_outlives_agent_timeout() {
        let server = StubServer::start_with_delay(
            200,
            r#"[{"generated_text": "Late but complete."}]"#,
            Duration::from_secs(2),
        )
        .await;
        let cascade = cascade(Arc::new(Unavailable), offline_generator(Some("hf_x"), &server.url));
        let results = cascade.aggregate("x", &registry(2), None).await.unwrap();

        assert_eq!(results.summary, "Late but complete.");
    }

    #[tokio::test]
    async fn test_summary_timeout_is_offline() {
        let server = StubServer::start_with_delay(
            200,
            r#"[{"generated_text": "Too late."}]"#,
            Duration::from_secs(5),
        )
        .await;
        let cascade = cascade(Arc::new(Unavailable), offline_generator(Some("hf_x"), &server.url));
        let results = cascade.aggregate("x", &registry(2), None).await.unwrap();

        assert_eq!(results.summary, OFFLINE_SUMMARY);
    }

    #[tokio::test]
    async fn test_agent_id_zero_is_handled() {
        let registry = Registry::from_descriptors(vec![
            AgentDescriptor::ready(AgentId(0), "Zero"),
            AgentDescriptor::ready(AgentId::PRIMARY, "One"),
        ]);
        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        let results = cascade.aggregate("x", &registry, None).await.unwrap();

        let ids: Vec<_> = results.agent_results.iter().map(|r| r.agent_id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(results.result_for(AgentId(0)).unwrap().label, "Label0");
    }

    #[tokio::test]
    async fn test_retrieval_match_and_default() {
        let index = RetrievalIndex::new(vec![RetrievalRecord {
            query: "vision".to_string(),
            text: "Retinopathy study 2024".to_string(),
        }]);
        let cascade = cascade(Arc::new(Unavailable), Arc::new(FixedGenerator("ok")));

        let hit = cascade
            .aggregate("Blurred VISION in left eye", &registry(2), Some(&index))
            .await
            .unwrap();
        assert_eq!(hit.retrieval, vec!["Retinopathy study 2024"]);

        let miss = cascade.aggregate("fever", &registry(2), Some(&index)).await.unwrap();
        assert_eq!(miss.retrieval, vec![crate::retrieval::DEFAULT_SNIPPET]);
    }

    #[tokio::test]
    async fn test_each_run_builds_a_fresh_result_set() {
        let cascade = cascade(Arc::new(EchoInference), Arc::new(FixedGenerator("ok")));
        let small = registry(2);
        let large = registry(5);

        let first = cascade.aggregate("x", &large, None).await.unwrap();
        let second = cascade.aggregate("x", &small, None).await.unwrap();
        assert_eq!(first.agent_results.len(), 5);
        assert_eq!(second.agent_results.len(), 2);
    }
}
