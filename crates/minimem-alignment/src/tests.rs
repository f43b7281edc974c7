//! Integration tests for the alignment judge

#[cfg(test)]
mod tests {
    use crate::{AlignmentConfig, AlignmentError, AlignmentJudge};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use minimem_domain::traits::{CorpusMatch, DecisionCorpus};
    use minimem_domain::{ConversationTurn, DecisionRecord, Severity};
    use minimem_llm::MockProvider;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const MISALIGNED: &str = r#"{
        "aligned": false,
        "issue": "Proposes relaunching the mobile app while it is on hold",
        "relevant_decision": "Mobile app is on hold",
        "meeting_title": "Q1 All-Hands: Strategic Pivot",
        "severity": "high"
    }"#;

    const ALIGNED: &str = r#"{"aligned": true, "issue": null, "relevant_decision": null, "meeting_title": null, "severity": null}"#;

    #[derive(Debug)]
    struct CorpusDown;

    impl fmt::Display for CorpusDown {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl std::error::Error for CorpusDown {}

    /// Corpus that answers every query with the same matches
    struct ScriptedCorpus {
        matches: Vec<CorpusMatch>,
        fail: bool,
        queries: AtomicUsize,
    }

    impl ScriptedCorpus {
        fn new(matches: Vec<CorpusMatch>) -> Arc<Self> {
            Arc::new(Self {
                matches,
                fail: false,
                queries: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                matches: Vec::new(),
                fail: true,
                queries: AtomicUsize::new(0),
            })
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DecisionCorpus for ScriptedCorpus {
        type Error = CorpusDown;

        async fn query_nearest(
            &self,
            _vector: &[f32],
            k: usize,
        ) -> Result<Vec<CorpusMatch>, Self::Error> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CorpusDown);
            }
            Ok(self.matches.iter().take(k).cloned().collect())
        }
    }

    /// Corpus whose lookups sit on the blocking pool for `stall`
    struct StalledCorpus {
        stall: Duration,
    }

    #[async_trait]
    impl DecisionCorpus for StalledCorpus {
        type Error = CorpusDown;

        async fn query_nearest(
            &self,
            _vector: &[f32],
            _k: usize,
        ) -> Result<Vec<CorpusMatch>, Self::Error> {
            let stall = self.stall;
            tokio::task::spawn_blocking(move || std::thread::sleep(stall))
                .await
                .map_err(|_| CorpusDown)?;
            Ok(Vec::new())
        }
    }

    fn jan_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn decision(text: &str, distance: f64) -> CorpusMatch {
        CorpusMatch {
            decision: DecisionRecord::new(text, "Q1 All-Hands: Strategic Pivot", jan_15(), Vec::new()),
            distance,
        }
    }

    fn judge(
        corpus: Arc<ScriptedCorpus>,
        llm: MockProvider,
    ) -> AlignmentJudge<MockProvider, ScriptedCorpus, MockProvider> {
        let embedder = MockProvider::default().with_embedding(vec![1.0, 0.0, 0.0]);
        AlignmentJudge::new(embedder, corpus, llm, AlignmentConfig::default()).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_relaunch_mobile_app_is_misaligned() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.09)]);
        let llm = MockProvider::new(MISALIGNED);
        let judge = judge(corpus, llm.clone());

        let history = vec![ConversationTurn::user("let's relaunch the old mobile app")];
        let verdict = judge.check_alignment(&history).await.unwrap();

        assert!(!verdict.aligned());
        assert_eq!(verdict.relevant_decision(), Some("Mobile app is on hold"));
        assert_eq!(verdict.meeting_title(), Some("Q1 All-Hands: Strategic Pivot"));
        assert_eq!(verdict.severity(), Some(Severity::High));
        assert!(verdict.issue().is_some());
        assert!(approx(verdict.similarity(), 0.91));
        assert_eq!(verdict.meeting_date(), Some(jan_15()));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_lunch_talk_skips_llm() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.88)]);
        let llm = MockProvider::new(MISALIGNED);
        let judge = judge(corpus, llm.clone());

        let history = vec![ConversationTurn::user("what's for lunch")];
        let verdict = judge.check_alignment(&history).await.unwrap();

        assert!(verdict.aligned());
        assert!(verdict.issue().is_none());
        assert!(verdict.meeting_date().is_none());
        assert!(approx(verdict.similarity(), 0.12));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_timeout_is_judgment_unavailable() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.09)]);
        let llm = MockProvider::new(MISALIGNED).with_delay(Duration::from_secs(5));
        let judge = judge(corpus, llm);

        let history = vec![ConversationTurn::user("let's relaunch the old mobile app")];
        let result = judge
            .check_alignment_within(&history, Duration::from_millis(100))
            .await;

        match result {
            Err(AlignmentError::JudgmentUnavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected JudgmentUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stalled_corpus_is_unavailable_within_deadline() {
        let corpus = Arc::new(StalledCorpus {
            stall: Duration::from_secs(2),
        });
        let config = AlignmentConfig {
            retrieval_timeout_secs: 1,
            ..AlignmentConfig::default()
        };
        let judge = AlignmentJudge::new(
            MockProvider::default().with_embedding(vec![1.0, 0.0, 0.0]),
            corpus,
            MockProvider::new(ALIGNED),
            config,
        )
        .unwrap();

        let history = vec![ConversationTurn::user("let's relaunch the old mobile app")];
        let started = Instant::now();
        let result = judge
            .check_alignment_within(&history, Duration::from_millis(100))
            .await;

        assert!(started.elapsed() < Duration::from_secs(1));
        match result {
            Err(AlignmentError::CorpusUnavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected CorpusUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_hits_is_aligned_with_zero() {
        let corpus = ScriptedCorpus::new(Vec::new());
        let llm = MockProvider::new(MISALIGNED);
        let judge = judge(corpus.clone(), llm.clone());

        let verdict = judge
            .check_alignment(&[ConversationTurn::user("anything")])
            .await
            .unwrap();

        assert!(verdict.aligned());
        assert_eq!(verdict.similarity(), 0.0);
        assert_eq!(corpus.queries(), 1);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_exact_threshold_triggers_adjudication() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.25)]);
        let llm = MockProvider::new(ALIGNED);
        let judge = judge(corpus, llm.clone());

        let verdict = judge
            .check_alignment(&[ConversationTurn::user("the mobile app stays paused")])
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 1);
        assert!(verdict.aligned());
        assert_eq!(verdict.similarity(), 0.75);
    }

    #[tokio::test]
    async fn test_judged_aligned_carries_meeting_date() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.1)]);
        let judge = judge(corpus, MockProvider::new(ALIGNED));

        let verdict = judge
            .check_alignment(&[ConversationTurn::user("as agreed, mobile is on hold")])
            .await
            .unwrap();

        assert!(verdict.aligned());
        assert!(verdict.severity().is_none());
        assert_eq!(verdict.meeting_date(), Some(jan_15()));
    }

    #[tokio::test]
    async fn test_retrieval_metadata_overrides_model() {
        let corpus = ScriptedCorpus::new(vec![
            decision("Mobile app is on hold", 0.2),
            decision("Pause all consumer features", 0.3),
        ]);
        let llm = MockProvider::new(
            r#"{
                "aligned": false,
                "issue": "x",
                "relevant_decision": "Pause all consumer features",
                "meeting_title": "Q1 All-Hands: Strategic Pivot",
                "meeting_date": "1999-12-31",
                "similarity": 0.01,
                "severity": "low"
            }"#,
        );
        let judge = judge(corpus, llm);

        let verdict = judge
            .check_alignment(&[ConversationTurn::user("build a consumer feature")])
            .await
            .unwrap();

        assert!(approx(verdict.similarity(), 0.8));
        assert_eq!(verdict.meeting_date(), Some(jan_15()));
    }

    #[tokio::test]
    async fn test_request_is_json_at_temperature_zero() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.05)]);
        let llm = MockProvider::new(ALIGNED);
        let judge = judge(corpus, llm.clone());

        judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await
            .unwrap();

        let request = llm.last_request().unwrap();
        assert_eq!(request.temperature, 0.0);
        assert!(request.json_response);
        assert!(request.prompt.contains("User: relaunch mobile"));
        assert!(request.prompt.contains("\"Mobile app is on hold\" (from \"Q1 All-Hands: Strategic Pivot\", 2025-01-15)"));
    }

    #[tokio::test]
    async fn test_prompt_uses_last_four_turns_and_top_k() {
        let corpus = ScriptedCorpus::new(
            (0..6)
                .map(|i| decision(&format!("Decision number {}", i), 0.05 + i as f64 * 0.01))
                .collect(),
        );
        let llm = MockProvider::new(ALIGNED);
        let judge = judge(corpus, llm.clone());

        let history = vec![
            ConversationTurn::user("turn one"),
            ConversationTurn::teammate("turn two"),
            ConversationTurn::user("turn three"),
            ConversationTurn::teammate("turn four"),
            ConversationTurn::system("turn five"),
        ];
        judge.check_alignment(&history).await.unwrap();

        let prompt = llm.last_request().unwrap().prompt;
        assert!(!prompt.contains("turn one"));
        assert!(prompt.contains(
            "Teammate: turn two\nUser: turn three\nTeammate: turn four\nSystem: turn five"
        ));
        assert!(prompt.contains("Decision number 3"));
        assert!(!prompt.contains("Decision number 4"));
    }

    #[tokio::test]
    async fn test_empty_history_makes_no_calls() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.0)]);
        let embedder = MockProvider::default();
        let llm = MockProvider::new(MISALIGNED);
        let judge = AlignmentJudge::new(
            embedder.clone(),
            corpus.clone(),
            llm.clone(),
            AlignmentConfig::default(),
        )
        .unwrap();

        let verdict = judge.check_alignment(&[]).await.unwrap();

        assert!(verdict.aligned());
        assert_eq!(verdict.similarity(), 0.0);
        assert_eq!(embedder.embed_count(), 0);
        assert_eq!(corpus.queries(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_window_makes_no_calls() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.0)]);
        let embedder = MockProvider::default();
        let judge = AlignmentJudge::new(
            embedder.clone(),
            corpus.clone(),
            MockProvider::new(MISALIGNED),
            AlignmentConfig::default(),
        )
        .unwrap();

        let history = vec![ConversationTurn::user("   "), ConversationTurn::teammate("")];
        let verdict = judge.check_alignment(&history).await.unwrap();

        assert!(verdict.aligned());
        assert_eq!(embedder.embed_count(), 0);
        assert_eq!(corpus.queries(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.1)]);
        let judge = judge(corpus, MockProvider::new("I think this is fine."));

        let result = judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await;
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[tokio::test]
    async fn test_partial_misaligned_is_error() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.1)]);
        let judge = judge(
            corpus,
            MockProvider::new(r#"{"aligned": false, "issue": "x", "severity": "high"}"#),
        );

        let result = judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await;
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[tokio::test]
    async fn test_llm_failure_is_judgment_unavailable() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.1)]);
        let mut llm = MockProvider::default();
        llm.add_error("Recent Conversation");
        let judge = judge(corpus, llm);

        let result = judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await;
        assert!(matches!(result, Err(AlignmentError::JudgmentUnavailable(_))));
    }

    #[tokio::test]
    async fn test_embedding_failure_stops_pipeline() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.1)]);
        let llm = MockProvider::new(MISALIGNED);
        let judge = AlignmentJudge::new(
            MockProvider::default().with_failing_embeddings(),
            corpus.clone(),
            llm.clone(),
            AlignmentConfig::default(),
        )
        .unwrap();

        let result = judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await;

        assert!(matches!(result, Err(AlignmentError::EmbeddingUnavailable(_))));
        assert_eq!(corpus.queries(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_corpus_failure_is_corpus_unavailable() {
        let llm = MockProvider::new(MISALIGNED);
        let judge = judge(ScriptedCorpus::failing(), llm.clone());

        let result = judge
            .check_alignment(&[ConversationTurn::user("relaunch mobile")])
            .await;

        match result {
            Err(AlignmentError::CorpusUnavailable(msg)) => {
                assert!(msg.contains("connection refused"))
            }
            other => panic!("Expected CorpusUnavailable, got {:?}", other),
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = AlignmentConfig {
            top_k: 0,
            ..AlignmentConfig::default()
        };
        let result = AlignmentJudge::new(
            MockProvider::default(),
            ScriptedCorpus::new(Vec::new()),
            MockProvider::default(),
            config,
        );
        assert!(matches!(result, Err(AlignmentError::Config(_))));
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let corpus = ScriptedCorpus::new(vec![decision("Mobile app is on hold", 0.2)]);
        let llm = MockProvider::new(ALIGNED);
        let config = AlignmentConfig {
            similarity_threshold: 0.9,
            ..AlignmentConfig::default()
        };
        let judge = AlignmentJudge::new(
            MockProvider::default(),
            corpus,
            llm.clone(),
            config,
        )
        .unwrap();

        let verdict = judge
            .check_alignment(&[ConversationTurn::user("mobile")])
            .await
            .unwrap();

        assert!(verdict.aligned());
        assert!(approx(verdict.similarity(), 0.8));
        assert_eq!(llm.call_count(), 0);
    }
}
