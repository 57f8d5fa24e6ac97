//! Data-driven prompt template
//!
//! The generation request is built from typed fields and rendered last, so
//! rule ordering and required sections are enforced by structure rather than
//! ad hoc string concatenation. Section order is fixed: role and behavioral
//! rules, conversation history, retrieved context, the question, and a final
//! directive restating the output-language constraint.

use crate::providers::ScoredChunk;
use crate::types::{Role, Turn};

/// Marker injected when retrieval finds nothing, so the model can answer
/// "not found in the documents" instead of hallucinating from silence.
pub const NO_CONTEXT_MARKER: &str = "(관련 문서를 찾지 못했습니다)";

const SYSTEM_ROLE: &str =
    "당신은 대한민국 '전기, 소방, 통신 공무 행정 전문가'입니다. \
     아래 제공되는 [참고 문서]의 내용을 바탕으로 사용자의 질문에 답변하십시오.";

const RULES: &[&str] = &[
    "반드시 한국어(Korean)로만 답변하십시오.",
    "참고 문서의 내용이 영어라도, 반드시 한국어로 번역하여 설명하십시오.",
    "문서에 없는 내용은 지어내지 마십시오. 관련 문서가 없으면 \"문서에 내용이 없습니다.\"라고 답하십시오.",
    "답변은 논리적이고 정중한 존댓말을 사용하십시오.",
];

const FINAL_DIRECTIVE: &str = "위 원칙을 지켜 반드시 한국어로 답변하십시오.";

/// Messages handed to the chat model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System instruction block (role + rules)
    pub system: String,
    /// Data block: history, context, question, final directive
    pub user: String,
}

/// A generation request built from typed fields
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    history: Vec<Turn>,
    context: Vec<String>,
    question: String,
}

impl ChatPrompt {
    /// Assemble a prompt from recent history, retrieved context, and the
    /// question
    pub fn assemble(history: &[Turn], retrieved: &[ScoredChunk], question: &str) -> Self {
        Self {
            history: history.to_vec(),
            context: retrieved.iter().map(|r| r.chunk.content.clone()).collect(),
            question: question.to_string(),
        }
    }

    /// Whether retrieval produced any context
    pub fn has_context(&self) -> bool {
        !self.context.is_empty()
    }

    /// Render the prompt into the system/user message pair
    pub fn render(&self) -> RenderedPrompt {
        let mut system = String::from(SYSTEM_ROLE);
        system.push_str("\n\n[답변 원칙]\n");
        for (i, rule) in RULES.iter().enumerate() {
            system.push_str(&format!("{}. {}\n", i + 1, rule));
        }

        let mut user = String::new();

        user.push_str("[대화 내역]\n");
        if self.history.is_empty() {
            user.push_str("(이전 대화 없음)\n");
        } else {
            for turn in &self.history {
                let speaker = match turn.role {
                    Role::User => "사용자",
                    Role::Assistant => "AI",
                };
                user.push_str(&format!("{}: {}\n", speaker, turn.content));
            }
        }

        user.push_str("\n[참고 문서]\n");
        if self.context.is_empty() {
            user.push_str(NO_CONTEXT_MARKER);
            user.push('\n');
        } else {
            for (i, fragment) in self.context.iter().enumerate() {
                user.push_str(&format!("[{}] {}\n\n---\n\n", i + 1, fragment));
            }
        }

        user.push_str(&format!("\n[질문]\n{}\n", self.question));
        user.push_str(&format!("\n{}", FINAL_DIRECTIVE));

        RenderedPrompt { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use uuid::Uuid;

    fn scored(content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(Uuid::new_v4(), content.to_string(), 0)
                .with_embedding(vec![0.0; 4]),
            similarity: 0.9,
        }
    }

    #[test]
    fn section_order_is_fixed() {
        let history = vec![Turn::user("이전 질문"), Turn::assistant("이전 답변")];
        let retrieved = vec![scored("제1조 목적")];
        let prompt = ChatPrompt::assemble(&history, &retrieved, "핵심 내용은?");
        let rendered = prompt.render();

        let history_pos = rendered.user.find("[대화 내역]").unwrap();
        let context_pos = rendered.user.find("[참고 문서]").unwrap();
        let question_pos = rendered.user.find("[질문]").unwrap();
        let directive_pos = rendered.user.find("반드시 한국어로 답변").unwrap();

        assert!(history_pos < context_pos);
        assert!(context_pos < question_pos);
        assert!(question_pos < directive_pos);

        assert!(rendered.system.contains("전기, 소방, 통신 공무 행정 전문가"));
        assert!(rendered.user.contains("제1조 목적"));
        assert!(rendered.user.contains("핵심 내용은?"));
    }

    #[test]
    fn empty_retrieval_injects_no_context_marker() {
        let prompt = ChatPrompt::assemble(&[], &[], "이 문서의 핵심 내용은?");
        assert!(!prompt.has_context());

        let rendered = prompt.render();
        assert!(rendered.user.contains(NO_CONTEXT_MARKER));
    }

    #[test]
    fn history_turns_appear_in_original_order() {
        let history = vec![
            Turn::user("첫 질문"),
            Turn::assistant("첫 답변"),
            Turn::user("둘째 질문"),
        ];
        let prompt = ChatPrompt::assemble(&history, &[], "셋째 질문");
        let rendered = prompt.render();

        let first = rendered.user.find("첫 질문").unwrap();
        let second = rendered.user.find("첫 답변").unwrap();
        let third = rendered.user.find("둘째 질문").unwrap();
        assert!(first < second && second < third);
    }
}
