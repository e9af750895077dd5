//! Interface de terminal do triago — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`RunProgress`] acompanha visualmente uma
//! execução de triagem no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{RunOutcome, RunRecord};

/// Indicador visual de progresso para uma execução de triagem no terminal.
///
/// Exibe um spinner animado durante o processamento e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e retentativa (amarelo).
pub struct RunProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    // Estilo verde para mensagens de sucesso.
    green: Style,
    // Estilo vermelho para mensagens de falha.
    red: Style,
    // Estilo amarelo para mensagens de retentativa.
    yellow: Style,
}

impl RunProgress {
    /// Inicia o spinner com o título do ticket e retorna a instância de progresso.
    pub fn start(title: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("TRIAGEM: {title}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a mensagem do spinner para refletir o passo atual.
    #[allow(dead_code)]
    pub fn step(&self, name: &str) {
        self.pb.set_message(name.to_string());
    }

    /// Exibe uma mensagem de retentativa com o número da tentativa e o motivo.
    #[allow(dead_code)]
    pub fn retry(&self, attempt: u32, max: u32, reason: &str) {
        self.pb.println(format!(
            "  {} Retry {attempt}/{max}: {reason}",
            self.yellow.apply_to("↻")
        ));
    }

    /// Finaliza o spinner e exibe o resultado final da execução.
    ///
    /// Sucesso é mostrado em verde com checkmark; falha em vermelho com X.
    pub fn complete(&self, outcome: &RunOutcome) {
        self.pb.finish_and_clear();
        if outcome.success {
            println!("  {} Triage run completed", self.green.apply_to("✓"));
        } else {
            let error = outcome.error.as_deref().unwrap_or("unknown error");
            println!("  {} Triage run failed: {error}", self.red.apply_to("✗"));
        }
    }

    /// Imprime o registro da execução formatado em JSON com estilo colorido.
    pub fn print_record(&self, record: &RunRecord) {
        let status_style = if record.outcome.success {
            &self.green
        } else {
            &self.red
        };
        println!();
        println!("{}", status_style.apply_to("─── Run Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_default()
        );
    }
}
