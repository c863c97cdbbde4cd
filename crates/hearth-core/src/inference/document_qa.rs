//! Question answering over OCR'd document pages

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::document::{PageRange, TextExtractor};
use crate::error::{Error, Result};
use crate::inference::chat::{ChatClient, ChatMessage};
use crate::inference::{InferenceTask, TaskContext};

/// Build the conversation sent to the chat model
pub fn build_messages(manual: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are a helpful assistant. Answer questions based on the following manual:\n\n{}",
            manual
        )),
        ChatMessage::user(question),
    ]
}

/// Answer a question about a range of pages in a PDF
pub struct DocumentQaTask {
    pdf_path: PathBuf,
    pages: PageRange,
    question: String,
    extractor: TextExtractor,
    chat: Box<dyn ChatClient>,
}

impl DocumentQaTask {
    pub fn new(
        pdf_path: impl Into<PathBuf>,
        pages: PageRange,
        question: impl Into<String>,
        extractor: TextExtractor,
        chat: Box<dyn ChatClient>,
    ) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            pages,
            question: question.into(),
            extractor,
            chat,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

#[async_trait]
impl InferenceTask for DocumentQaTask {
    fn name(&self) -> &str {
        "document-qa"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<String> {
        if ctx.web.is_none() {
            return Err(Error::ChatCompletionError(
                "document Q&A needs the web service; set [web] urls".to_string(),
            ));
        }

        info!("Extracting text from {:?} pages {}", self.pdf_path, self.pages);
        let extracted = self.extractor.extract(&self.pdf_path, self.pages).await?;
        let manual = extracted.to_manual();
        info!(
            "Extracted {} characters from {} pages",
            manual.chars().count(),
            extracted.pages.len()
        );

        info!("Question: {}", self.question);
        let messages = build_messages(&manual, &self.question);
        self.chat.complete(ctx.model.id(), &messages).await
    }
}
