//! Interface de linha de comando do triago baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (submit, status,
//! demo) e a flag global `--verbose`.

use clap::{Parser, Subcommand};

/// triago — Serviço de triagem de tickets de suporte assistido por IA.
#[derive(Debug, Parser)]
#[command(name = "triago", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Abre um novo ticket e executa o pipeline de triagem.
    Submit {
        /// Título curto do problema.
        #[arg(long)]
        title: String,

        /// Descrição detalhada do problema.
        #[arg(long)]
        description: String,
    },

    /// Mostra o histórico de execuções persistido.
    Status,

    /// Executa a demonstração embutida do pipeline de triagem.
    Demo,
}
