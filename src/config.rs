//! Configuração do triago carregada a partir de `triago.toml`.
//!
//! A struct [`TriagoConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `GEMINI_API_KEY` e `MAILTRAP_API_TOKEN`
//! têm precedência sobre o arquivo.

use std::path::Path;

use serde::Deserialize;

use crate::engine::RetryConfig;
use crate::error::TriagoError;
use crate::model::{Role, User};

/// Configuração de nível superior carregada de `triago.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriagoConfig {
    /// Chave da API Gemini. Vazia desabilita a análise por IA.
    #[serde(default)]
    pub gemini_api_key: String,

    /// Modelo Gemini usado na triagem.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Máximo de retentativas além da primeira tentativa de uma execução.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Caminho do arquivo de estado durável das execuções.
    #[serde(default = "default_run_store_path")]
    pub run_store_path: String,

    /// Configuração de envio de e-mail.
    #[serde(default)]
    pub mail: MailConfig,

    /// Equipe de atendimento (moderadores e administradores).
    #[serde(default)]
    pub staff: Vec<StaffMember>,
}

/// Credenciais e endereços para o envio de e-mail.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Token da API de envio. Vazio faz as notificações irem para o log.
    #[serde(default)]
    pub api_token: String,

    /// URL base da API de envio.
    #[serde(default = "default_mail_api_url")]
    pub api_url: String,

    /// Endereço remetente das notificações.
    #[serde(default = "default_mail_from")]
    pub from_email: String,
}

/// Um membro da equipe declarado em `[[staff]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffMember {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl StaffMember {
    /// Converte a entrada de configuração em um usuário do repositório.
    /// O e-mail serve como id estável, mantendo a seleção determinística.
    pub fn to_user(&self) -> User {
        User {
            id: self.email.clone(),
            email: self.email.clone(),
            role: self.role,
            skills: self.skills.clone(),
        }
    }
}

// Valor padrão para o modelo Gemini.
fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

// Valor padrão para retentativas máximas: 2.
fn default_max_retries() -> u32 {
    2
}

// Valor padrão para o atraso base: 1000ms.
fn default_base_delay_ms() -> u64 {
    1000
}

// Valor padrão para o arquivo de estado.
fn default_run_store_path() -> String {
    ".triago/runs.json".to_string()
}

// Valor padrão para a URL da API de e-mail.
fn default_mail_api_url() -> String {
    "https://send.api.mailtrap.io".to_string()
}

// Valor padrão para o remetente.
fn default_mail_from() -> String {
    "tickets@triago.local".to_string()
}

impl Default for TriagoConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: default_gemini_model(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            run_store_path: default_run_store_path(),
            mail: MailConfig::default(),
            staff: Vec::new(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_url: default_mail_api_url(),
            from_email: default_mail_from(),
        }
    }
}

impl TriagoConfig {
    /// Carrega a configuração de `triago.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, TriagoError> {
        let mut config = Self::load_from(Path::new("triago.toml"))?;

        // Variáveis de ambiente têm precedência sobre o arquivo.
        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !key.is_empty()
        {
            config.gemini_api_key = key;
        }
        if let Ok(token) = std::env::var("MAILTRAP_API_TOKEN")
            && !token.is_empty()
        {
            config.mail.api_token = token;
        }

        Ok(config)
    }

    /// Carrega a configuração de um caminho específico.
    pub fn load_from(path: &Path) -> Result<Self, TriagoError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<TriagoConfig>(&contents)?
        } else {
            Self::default()
        };
        if config.gemini_model.trim().is_empty() {
            return Err(TriagoError::Config("gemini_model must not be empty".into()));
        }
        if config.run_store_path.trim().is_empty() {
            return Err(TriagoError::Config("run_store_path must not be empty".into()));
        }
        Ok(config)
    }

    /// Parâmetros de retentativa derivados da configuração.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
        }
    }
}
