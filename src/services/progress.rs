use crate::models::ClientRecord;
use crate::utils::text::current_datetime;

/// Etapas exibidas na linha do tempo do atendimento.
pub const STEP_LABELS: [&str; 7] = [
    "Ordem Aberta",
    "Aguardando Fotos",
    "Peça Identificada",
    "Agendado",
    "Execução",
    "Inspeção",
    "Concluído",
];

/// Mapeamento fixo de status para (etapa ativa, percentual, classe CSS).
/// Status fora da tabela caem na etapa 0 com a classe "desconhecido".
pub fn progress_for_status(status: &str) -> (usize, &'static str, &'static str) {
    match status {
        "Ordem de Serviço Aberta" => (0, "0%", "aberta"),
        "Aguardando fotos para liberação da ordem" => (1, "14%", "aguardando"),
        "Fotos Recebidas" => (1, "28%", "recebidas"),
        "Peça Identificada" => (2, "42%", "identificada"),
        "Ordem de Serviço Liberada" => (3, "57%", "liberada"),
        "Serviço agendado com sucesso" => (3, "57%", "agendado"),
        "Em andamento" => (4, "71%", "andamento"),
        "Concluído" => (6, "100%", "concluido"),
        _ => (0, "0%", "desconhecido"),
    }
}

fn step_state(index: usize, active_step: usize) -> &'static str {
    if index < active_step {
        "completed"
    } else if index == active_step {
        "active"
    } else if index == active_step + 1 && active_step < STEP_LABELS.len() - 1 {
        "next"
    } else {
        "pending"
    }
}

/// Barra de progresso em HTML para o widget web.
pub fn progress_bar_html(record: &ClientRecord) -> String {
    let status = &record.status;
    let (active_step, percentage, status_class) = progress_for_status(status);
    let current_time = current_datetime();

    let mut steps_html = String::new();
    for (i, label) in STEP_LABELS.iter().enumerate() {
        let state = step_state(i, active_step);
        let next_highlight = if state == "next" {
            r#"<div class="step-highlight">Próxima etapa</div>"#
        } else {
            ""
        };
        steps_html.push_str(&format!(
            r#"
        <div class="timeline-step {state}">
            <div class="step-node"></div>
            <div class="step-label">{label}</div>
            {next_highlight}
        </div>
"#
        ));
    }

    format!(
        r#"
    <div class="status-progress-container">
        <div class="status-current">
            <span class="status-tag {status_class}">{status}</span>
            <span class="status-date">{current_time}</span>
        </div>
        <div class="progress-timeline">
            <div class="timeline-track" style="--progress-width: {percentage};">
                {steps_html}
            </div>
        </div>
    </div>
"#
    )
}

/// Linha do tempo em texto puro com emojis, para o WhatsApp.
pub fn progress_timeline_text(record: &ClientRecord) -> String {
    let (active_step, percentage, _) = progress_for_status(&record.status);

    let mut lines = Vec::with_capacity(STEP_LABELS.len() + 1);
    lines.push(format!("📊 Andamento: {}", percentage));
    for (i, label) in STEP_LABELS.iter().enumerate() {
        let marker = if i < active_step {
            "✅"
        } else if i == active_step {
            "🔵"
        } else {
            "⚪"
        };
        lines.push(format!("{} {}", marker, label));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Veiculo;

    fn record_with_status(status: &str) -> ClientRecord {
        ClientRecord {
            nome: "Carlos Silva".to_string(),
            cpf: "12345678900".to_string(),
            telefone: "11987654321".to_string(),
            ordem: "ORD12345".to_string(),
            status: status.to_string(),
            tipo_servico: "Troca de Parabrisa".to_string(),
            veiculo: Veiculo {
                modelo: "Honda Civic".to_string(),
                placa: "ABC1234".to_string(),
                ano: "2022".to_string(),
            },
        }
    }

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(progress_for_status("Ordem de Serviço Aberta"), (0, "0%", "aberta"));
        assert_eq!(progress_for_status("Fotos Recebidas"), (1, "28%", "recebidas"));
        assert_eq!(
            progress_for_status("Serviço agendado com sucesso"),
            (3, "57%", "agendado")
        );
        assert_eq!(progress_for_status("Em andamento"), (4, "71%", "andamento"));
        assert_eq!(progress_for_status("Concluído"), (6, "100%", "concluido"));
    }

    #[test]
    fn test_unknown_status_defaults_silently() {
        // Contrato: status desconhecido cai na etapa 0 sem erro
        assert_eq!(progress_for_status("Status Inventado"), (0, "0%", "desconhecido"));
        assert_eq!(progress_for_status(""), (0, "0%", "desconhecido"));
    }

    #[test]
    fn test_progress_bar_html_structure() {
        let html = progress_bar_html(&record_with_status("Em andamento"));

        assert!(html.contains(r#"<span class="status-tag andamento">Em andamento</span>"#));
        assert!(html.contains("--progress-width: 71%"));
        for label in STEP_LABELS {
            assert!(html.contains(label), "faltou a etapa {}", label);
        }
        // Etapa seguinte à ativa ganha o destaque
        assert!(html.contains("Próxima etapa"));
    }

    #[test]
    fn test_whatsapp_timeline_markers() {
        let text = progress_timeline_text(&record_with_status("Concluído"));

        assert!(text.contains("📊 Andamento: 100%"));
        assert!(text.contains("🔵 Concluído"));
        assert_eq!(text.matches('✅').count(), 6);

        let early = progress_timeline_text(&record_with_status("Ordem de Serviço Aberta"));
        assert!(early.contains("🔵 Ordem Aberta"));
        assert_eq!(early.matches('✅').count(), 0);
        assert_eq!(early.matches('⚪').count(), 6);
    }
}
