//! Supported answer languages and their immutable prompt/message packs.
//!
//! A [`Language`] is a closed set: an unknown tag fails while parsing
//! configuration or arguments, never in the middle of a request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Brazilian Portuguese
    #[default]
    Pt,
    /// English
    En,
}

/// Every prompt template and fixed message for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct LanguagePack {
    /// System instruction for rewriting a follow-up into a standalone question.
    pub reformulation_template: &'static str,
    /// Grounded answer prompt; contains `{context}` and `{input}` placeholders.
    pub answer_template: &'static str,
    /// Answer given when no context survives assembly.
    pub fallback_message: &'static str,
    /// First assistant message of a new conversation.
    pub welcome_message: &'static str,
    /// Reply to an empty or whitespace-only question.
    pub empty_question_message: &'static str,
    /// Reply to an over-long question; contains a `{max}` placeholder.
    pub question_too_long_message: &'static str,
    /// Reply when the request failed.
    pub error_message: &'static str,
    /// Heading for the retrieved-sources block.
    pub sources_title: &'static str,
    /// Label for the reformulated question in the sources block.
    pub reformulated_label: &'static str,
    /// Label for the excerpt previews in the sources block.
    pub excerpts_label: &'static str,
}

impl LanguagePack {
    /// The too-long message with the limit filled in.
    pub fn too_long_message(&self, max_chars: usize) -> String {
        self.question_too_long_message
            .replace("{max}", &max_chars.to_string())
    }
}

static PT: LanguagePack = LanguagePack {
    reformulation_template: "Dado o histórico da conversa a seguir e a pergunta de acompanhamento, que pode fazer referência ao contexto do histórico, formule uma pergunta independente que possa ser entendida sem o histórico. NÃO responda à pergunta; apenas reformule-a se necessário, caso contrário devolva-a como está.",
    answer_template: "Você é um assistente virtual profissional representando Thiago Milanez C Pinheiro.

INSTRUÇÕES CRÍTICAS:
1. Use EXCLUSIVAMENTE as informações encontradas no CONTEXTO abaixo
2. NÃO invente, suponha ou adicione informações que não estejam no contexto
3. Se a informação não estiver no contexto, responda: \"Essa informação específica não está disponível no meu currículo atual. Posso ajudar com outras questões sobre minha experiência profissional.\"
4. Seja objetivo, profissional e cite apenas fatos concretos do contexto
5. Para perguntas técnicas, mencione SOMENTE tecnologias e projetos listados no contexto
6. Responda em primeira pessoa como se fosse o próprio Thiago
7. Mantenha respostas concisas (máximo 5-7 linhas), focando no essencial

CONTEXTO DO CURRÍCULO:
{context}

PERGUNTA DO RECRUTADOR: {input}

RESPOSTA (baseada APENAS no contexto acima):",
    fallback_message: "Essa informação específica não está disponível no meu currículo atual. Posso ajudar com outras questões sobre minha experiência profissional.",
    welcome_message: "Olá! Sou o assistente virtual de Thiago Milanez. Posso responder perguntas sobre experiência profissional, projetos, habilidades técnicas e formação acadêmica. Como posso ajudar?",
    empty_question_message: "Por favor, digite uma pergunta.",
    question_too_long_message: "Pergunta muito longa. Por favor, seja mais conciso (máximo {max} caracteres).",
    error_message: "Desculpe, ocorreu um erro ao processar sua pergunta. Tente novamente.",
    sources_title: "Fontes do Currículo",
    reformulated_label: "Pergunta reformulada:",
    excerpts_label: "Trechos do currículo utilizados:",
};

static EN: LanguagePack = LanguagePack {
    reformulation_template: "Given the following chat history and the follow-up question which might reference context in the chat history, formulate a standalone question which can be understood without the chat history. Do NOT answer the question, only reformulate it if needed; otherwise return it as-is.",
    answer_template: "You are a professional virtual assistant representing Thiago Milanez C Pinheiro.

CRITICAL INSTRUCTIONS:
1. Use EXCLUSIVELY the information found in the CONTEXT below
2. DO NOT invent, assume or add information that is not in the context
3. If the information is not in the context, respond: \"This specific information is not available in my current resume. I can help with other questions about my professional experience.\"
4. Be objective, professional and cite only concrete facts from the context
5. For technical questions, mention ONLY technologies and projects listed in the context
6. Respond in first person as if you were Thiago himself
7. Keep answers concise (maximum 5-7 lines), focusing on essentials

RESUME CONTEXT:
{context}

RECRUITER QUESTION: {input}

ANSWER (based ONLY on the context above):",
    fallback_message: "This specific information is not available in my current resume. I can help with other questions about my professional experience.",
    welcome_message: "Hello! I'm Thiago Milanez's virtual assistant. I can answer questions about professional experience, projects, technical skills, and academic background. How can I help?",
    empty_question_message: "Please type a question.",
    question_too_long_message: "Question too long. Please be more concise (maximum {max} characters).",
    error_message: "Sorry, an error occurred while processing your question. Please try again.",
    sources_title: "Resume Sources",
    reformulated_label: "Reformulated question:",
    excerpts_label: "Resume excerpts used:",
};

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 2] = [Language::Pt, Language::En];

    /// The language's immutable pack.
    pub fn pack(self) -> &'static LanguagePack {
        match self {
            Language::Pt => &PT,
            Language::En => &EN,
        }
    }

    /// The short tag ("pt", "en").
    pub fn tag(self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when parsing an unsupported language tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language tag '{0}' (expected one of: pt, en)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" | "pt_br" => Ok(Language::Pt),
            "en" | "en-us" | "en_us" => Ok(Language::En),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}
