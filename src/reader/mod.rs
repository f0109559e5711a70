pub mod prompts;
pub mod template;

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PaperError;
use crate::llm::{ChatClient, TokenUsage};

use template::{format_template, PipelineState};

/// Fixed stage order. Each stage's template may interpolate the outputs of
/// any earlier stage, so execution is strictly sequential.
const STAGES: &[(&str, &str)] = &[
    ("Step 1: Quick Scan", prompts::QUICK_SCAN),
    ("Step 2: Deep Dive", prompts::DEEP_DIVE),
    ("Step 3: Critical Thinking", prompts::CRITICAL_THINKING),
];

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

pub struct ReaderEngine {
    llm: Arc<dyn ChatClient>,
}

impl ReaderEngine {
    pub fn new(llm: Arc<dyn ChatClient>) -> Self {
        Self { llm }
    }

    /// Read a paper. A custom prompt selects freeform mode (one call); no
    /// prompt runs the structured 3-stage pipeline.
    pub async fn read(
        &self,
        markdown: &str,
        prompt: Option<&str>,
    ) -> Result<String, PaperError> {
        match prompt {
            Some(p) => self.read_freeform(markdown, p).await,
            None => self.read_structured(markdown).await,
        }
    }

    async fn read_freeform(&self, markdown: &str, prompt: &str) -> Result<String, PaperError> {
        let user = format!("{}{}{}", prompt, SECTION_SEPARATOR, markdown);
        let completion = self.llm.send(Some(prompts::SYSTEM_PROMPT), &user).await?;
        info!(
            response_len = completion.text.len(),
            total_tokens = completion.usage.total_tokens,
            "freeform reading complete"
        );
        Ok(completion.text)
    }

    /// Quick Scan -> Deep Dive -> Critical Thinking. Any stage failure aborts
    /// the whole pipeline; no partial result is returned.
    async fn read_structured(&self, markdown: &str) -> Result<String, PaperError> {
        let mut state = PipelineState {
            markdown: markdown.to_string(),
            responses: Vec::new(),
        };
        let mut usage = TokenUsage::default();

        for (label, stage_template) in STAGES {
            let user = format_template(stage_template, &state);
            debug!(stage = label, prompt_len = user.len(), "running stage");
            let completion = self.llm.send(Some(prompts::SYSTEM_PROMPT), &user).await?;
            info!(
                stage = label,
                response_len = completion.text.len(),
                total_tokens = completion.usage.total_tokens,
                "stage complete"
            );
            usage.add(&completion.usage);
            state.responses.push(completion.text);
        }

        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "pipeline complete"
        );

        let sections: Vec<String> = STAGES
            .iter()
            .zip(&state.responses)
            .map(|((label, _), response)| format!("## {}\n\n{}", label, response))
            .collect();
        Ok(sections.join(SECTION_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Completion;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted chat client that records every prompt it receives.
    struct ScriptedChat {
        outputs: Vec<Result<String, ()>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(outputs: Vec<Result<String, ()>>) -> Arc<Self> {
            Arc::new(Self {
                outputs,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn send(&self, system: Option<&str>, user: &str) -> Result<Completion, PaperError> {
            assert_eq!(system, Some(prompts::SYSTEM_PROMPT));
            let mut prompts = self.prompts.lock().unwrap();
            let call = prompts.len();
            prompts.push(user.to_string());
            match self.outputs.get(call) {
                Some(Ok(text)) => Ok(Completion {
                    text: text.clone(),
                    usage: TokenUsage::default(),
                }),
                Some(Err(())) => Err(PaperError::CompletionService("scripted failure".into())),
                None => panic!("unexpected extra completion call"),
            }
        }
    }

    #[tokio::test]
    async fn test_structured_stage_ordering() {
        let chat = ScriptedChat::new(vec![
            Ok("SCAN_OUT".to_string()),
            Ok("DIVE_OUT".to_string()),
            Ok("CRIT_OUT".to_string()),
        ]);
        let engine = ReaderEngine::new(chat.clone());

        let out = engine.read("PAPER_MD", None).await.unwrap();
        let sent = chat.prompts();
        assert_eq!(sent.len(), 3);

        // every stage sees the paper
        assert!(sent.iter().all(|p| p.contains("PAPER_MD")));
        // stage 1 has no prior responses available
        assert!(!sent[0].contains("SCAN_OUT"));
        // Deep Dive sees the Quick Scan output verbatim, never later output
        assert!(sent[1].contains("SCAN_OUT"));
        assert!(!sent[1].contains("CRIT_OUT"));
        // Critical Thinking sees both prior outputs
        assert!(sent[2].contains("SCAN_OUT"));
        assert!(sent[2].contains("DIVE_OUT"));

        // labeled three-part concatenation
        assert!(out.contains("## Step 1: Quick Scan\n\nSCAN_OUT"));
        assert!(out.contains("## Step 2: Deep Dive\n\nDIVE_OUT"));
        assert!(out.contains("## Step 3: Critical Thinking\n\nCRIT_OUT"));
        assert_eq!(out.matches("\n\n---\n\n").count(), 2);
    }

    #[tokio::test]
    async fn test_freeform_bypasses_pipeline() {
        let chat = ScriptedChat::new(vec![Ok("ANSWER".to_string())]);
        let engine = ReaderEngine::new(chat.clone());

        let out = engine
            .read("PAPER_MD", Some("Summarize the limitations"))
            .await
            .unwrap();
        assert_eq!(out, "ANSWER");

        let sent = chat.prompts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Summarize the limitations\n\n---\n\nPAPER_MD"));
        // structured templates never invoked
        assert!(!sent[0].contains("quick first-pass scan"));
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_pipeline() {
        let chat = ScriptedChat::new(vec![Ok("SCAN_OUT".to_string()), Err(())]);
        let engine = ReaderEngine::new(chat.clone());

        let err = engine.read("PAPER_MD", None).await.unwrap_err();
        assert!(matches!(err, PaperError::CompletionService(_)));
        // no third call was issued after the failure
        assert_eq!(chat.prompts().len(), 2);
    }
}
