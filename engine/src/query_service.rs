use crate::document_fetcher::DocumentSource;
use crate::error::Result;
use crate::perplexity_service::AnswerSynthesizer;
use futures::future::try_join_all;
use std::sync::Arc;
use url::Url;

/// Fetches a document once and answers every question against it.
pub struct QueryService {
    documents: Arc<dyn DocumentSource>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl QueryService {
    pub fn new(documents: Arc<dyn DocumentSource>, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            documents,
            synthesizer,
        }
    }

    pub async fn run(&self, document_url: &Url, questions: &[String]) -> Result<Vec<String>> {
        let start_time = std::time::Instant::now();

        let context = self.documents.fetch_text(document_url).await?;
        let answers = self.answer_all(&context, questions).await?;

        log::info!(
            "Answered {} questions in {} ms",
            answers.len(),
            start_time.elapsed().as_millis()
        );
        Ok(answers)
    }

    /// Answers every question concurrently against the same context.
    ///
    /// `try_join_all` keeps results in question order and stops at the first
    /// error; the futures still pending are dropped, which cancels their
    /// in-flight provider calls.
    pub async fn answer_all(&self, context: &str, questions: &[String]) -> Result<Vec<String>> {
        log::info!("Querying provider with {} questions", questions.len());

        let futures: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(index, question)| async move {
                self.synthesizer
                    .answer(question, context)
                    .await
                    .inspect_err(|e| log::warn!("Question {} failed: {}", index, e))
            })
            .collect();

        try_join_all(futures).await
    }
}
