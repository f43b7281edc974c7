//! Core alignment judge

use crate::config::AlignmentConfig;
use crate::error::AlignmentError;
use crate::gate::GateDecision;
use crate::parser::parse_judgment;
use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;
use crate::window::ConversationWindow;
use minimem_domain::traits::{CompletionModel, CompletionRequest, DecisionCorpus, Embedder};
use minimem_domain::{AlignmentVerdict, ConversationTurn, RetrievalHit};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Checks a conversation against recorded decisions
///
/// Embeds the recent window, retrieves the nearest decisions, and asks the
/// LLM for a verdict only when the best match clears the similarity
/// threshold.
pub struct AlignmentJudge<E, C, L>
where
    E: Embedder,
    C: DecisionCorpus,
    L: CompletionModel,
{
    embedder: Arc<E>,
    retriever: Retriever<C>,
    llm: Arc<L>,
    config: AlignmentConfig,
}

impl<E, C, L> AlignmentJudge<E, C, L>
where
    E: Embedder,
    C: DecisionCorpus,
    L: CompletionModel,
{
    /// Create a judge; fails if the configuration is invalid
    pub fn new(
        embedder: E,
        corpus: Arc<C>,
        llm: L,
        config: AlignmentConfig,
    ) -> Result<Self, AlignmentError> {
        config.validate()?;

        Ok(Self {
            embedder: Arc::new(embedder),
            retriever: Retriever::new(corpus),
            llm: Arc::new(llm),
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Model used for adjudication
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Check the conversation, with per-stage timeouts from the configuration
    pub async fn check_alignment(
        &self,
        history: &[ConversationTurn],
    ) -> Result<AlignmentVerdict, AlignmentError> {
        self.run(history, None).await
    }

    /// Check the conversation, finishing within `deadline` overall
    ///
    /// Each stage still honours its own timeout; the deadline caps whatever
    /// is left of it.
    pub async fn check_alignment_within(
        &self,
        history: &[ConversationTurn],
        deadline: Duration,
    ) -> Result<AlignmentVerdict, AlignmentError> {
        self.run(history, Some(Instant::now() + deadline)).await
    }

    async fn run(
        &self,
        history: &[ConversationTurn],
        deadline: Option<Instant>,
    ) -> Result<AlignmentVerdict, AlignmentError> {
        let window = ConversationWindow::from_history(history, self.config.window_turns);

        if !window.has_content() {
            debug!("No text in the last {} turns; nothing to check", window.len());
            return Ok(AlignmentVerdict::no_contradiction(0.0));
        }

        let query = window.render();
        info!(
            "Checking alignment over {} turns ({} chars)",
            window.len(),
            query.len()
        );

        let vector = self.embed(&query, deadline).await?;
        let hits = self.retrieve(&vector, deadline).await?;

        let gate = GateDecision::evaluate(&hits, self.config.similarity_threshold);
        info!(
            "Best similarity {:.3} (threshold {:.2}): {}",
            gate.best(),
            self.config.similarity_threshold,
            if gate.should_judge() { "judging" } else { "aligned" }
        );

        let top = match (gate, hits.first()) {
            (GateDecision::Judge { .. }, Some(top)) => top,
            _ => return Ok(AlignmentVerdict::no_contradiction(gate.best())),
        };

        let raw = self.judge(&query, &hits, deadline).await?;
        let verdict = parse_judgment(&raw)
            .inspect_err(|e| warn!("Rejected model output: {}", e))?
            .with_retrieval_metadata(top.similarity, top.decision.meeting_date());

        match verdict.details() {
            Some(c) => info!(
                "Misaligned ({}): '{}' contradicts \"{}\"",
                c.severity, c.issue, c.relevant_decision
            ),
            None => info!("Aligned after adjudication"),
        }

        Ok(verdict)
    }

    async fn embed(
        &self,
        query: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<f32>, AlignmentError> {
        let limit = stage_limit(self.config.embedding_timeout(), deadline);

        timeout(limit, self.embedder.embed(query))
            .await
            .map_err(|_| {
                AlignmentError::EmbeddingUnavailable(format!("timed out after {:?}", limit))
            })?
            .map_err(|e| AlignmentError::EmbeddingUnavailable(e.to_string()))
    }

    async fn retrieve(
        &self,
        vector: &[f32],
        deadline: Option<Instant>,
    ) -> Result<Vec<RetrievalHit>, AlignmentError> {
        let limit = stage_limit(self.config.retrieval_timeout(), deadline);

        timeout(limit, self.retriever.retrieve(vector, self.config.top_k))
            .await
            .map_err(|_| AlignmentError::CorpusUnavailable(format!("timed out after {:?}", limit)))?
    }

    async fn judge(
        &self,
        query: &str,
        hits: &[RetrievalHit],
        deadline: Option<Instant>,
    ) -> Result<String, AlignmentError> {
        let prompt = PromptBuilder::new(query, hits).build();
        debug!("Prompt length: {} chars", prompt.len());

        let request = CompletionRequest::json(prompt).with_temperature(self.config.temperature);
        let limit = stage_limit(self.config.judgment_timeout(), deadline);

        let raw = timeout(limit, self.llm.complete(&request))
            .await
            .map_err(|_| {
                AlignmentError::JudgmentUnavailable(format!("timed out after {:?}", limit))
            })?
            .map_err(|e| AlignmentError::JudgmentUnavailable(e.to_string()))?;

        debug!("LLM response length: {} chars", raw.len());
        Ok(raw)
    }
}

/// The stage timeout, shortened to whatever remains before `deadline`
fn stage_limit(stage: Duration, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(deadline) => stage.min(deadline.saturating_duration_since(Instant::now())),
        None => stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_limit_without_deadline() {
        assert_eq!(stage_limit(Duration::from_secs(30), None), Duration::from_secs(30));
    }

    #[test]
    fn test_stage_limit_capped_by_deadline() {
        let deadline = Instant::now() + Duration::from_millis(50);
        assert!(stage_limit(Duration::from_secs(30), Some(deadline)) <= Duration::from_millis(50));
    }

    #[test]
    fn test_stage_limit_past_deadline_is_zero() {
        let deadline = Instant::now();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(stage_limit(Duration::from_secs(30), Some(deadline)), Duration::ZERO);
    }
}
