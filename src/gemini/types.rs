//! Tipos de dados para requisições e respostas da API Gemini.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato esperado pelo endpoint `generateContent` do Google.

use serde::{Deserialize, Serialize};

/// Corpo da requisição para o endpoint `models/{model}:generateContent`.
///
/// Contém a instrução de sistema opcional e a lista de conteúdos
/// que compõem a conversa.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Instrução de sistema aplicada a toda a conversa.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Conteúdos compondo a conversa (normalmente um único turno do usuário).
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// Monta uma requisição de turno único a partir de uma instrução de
    /// sistema e um prompt do usuário.
    pub fn from_prompt(system: &str, prompt: &str) -> Self {
        Self {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// Um bloco de conteúdo na conversa: um papel opcional e uma lista de partes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Papel do remetente: "user" ou "model". Ausente na instrução de sistema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Partes textuais deste conteúdo.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Uma parte textual de um conteúdo — atualmente apenas texto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Conteúdo textual desta parte.
    pub text: String,
}

/// Resposta retornada pelo endpoint `generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Candidatos gerados pelo modelo (normalmente um).
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Estatísticas de uso de tokens (entrada e saída).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Extrai o texto do primeiro candidato, concatenando as partes.
    /// Retorna `None` se a resposta não contiver texto algum.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        Some(
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(""),
        )
    }
}

/// Um candidato de resposta gerado pelo modelo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Conteúdo gerado. Pode estar ausente quando a geração é bloqueada.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Motivo da parada da geração (ex.: "STOP", "MAX_TOKENS").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Estatísticas de consumo de tokens para uma chamada à API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens consumidos no prompt.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Tokens gerados nos candidatos.
    #[serde(default)]
    pub candidates_token_count: u32,
}
