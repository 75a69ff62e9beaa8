use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::models::{ChatMessage, ClientRecord, LookupOutcome, Platform};
use crate::services::client_data::ClientDataService;
use crate::services::identifier::{self, IdentifierKind};
use crate::services::openai::OpenAiService;
use crate::services::progress::{progress_bar_html, progress_timeline_text};
use crate::services::session::SessionStore;
use crate::utils::logging::*;
use crate::utils::text::sanitize_input;
use crate::utils::{AppError, AppResult};

/// Pedido de identificador quando o texto não casa com nenhum formato.
pub const IDENTIFIER_PROMPT: &str = "Por favor, forneça um identificador válido:\n\n\
📋 **CPF** (11 dígitos)\n\
📱 **Telefone** (10 ou 11 dígitos)\n\
🚗 **Placa do veículo**\n\
🔢 **Número da ordem de serviço**";

const FALLBACK_TEMPLATES: &[&str] = &[
    "Entendi sua pergunta, {nome}. Para informações específicas, entre em contato: 📞 **0800-727-2327**",
    "Boa pergunta, {nome}! Nossa central consegue te ajudar com esse detalhe: 📞 **0800-727-2327**",
    "{nome}, essa informação eu ainda não tenho por aqui, mas a central resolve: 📞 **0800-727-2327**",
];

struct IntentRule {
    name: &'static str,
    keywords: &'static [&'static str],
    respond: fn(&ClientRecord, Platform) -> String,
}

/// Regras de intenção em ordem de prioridade; a primeira que casar responde.
/// "trocar loja" precisa vir antes do grupo genérico de lojas.
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        name: "trocar_loja",
        keywords: &["trocar loja", "trocar de loja", "mudar loja", "mudar de loja", "outra loja"],
        respond: respond_trocar_loja,
    },
    IntentRule {
        name: "lojas",
        keywords: &["loja", "local", "onde", "endereço", "endereco"],
        respond: respond_lojas,
    },
    IntentRule {
        name: "garantia",
        keywords: &["garantia", "seguro"],
        respond: respond_garantia,
    },
    IntentRule {
        name: "atendente",
        keywords: &["falar com pessoa", "atendente", "humano", "falar com alguém", "falar com alguem"],
        respond: respond_atendente,
    },
    IntentRule {
        name: "reclamacao",
        keywords: &["reclamação", "reclamacao", "péssimo", "pessimo", "absurdo", "cancelar"],
        respond: respond_reclamacao,
    },
    IntentRule {
        name: "status",
        keywords: &["status", "andamento", "progresso", "previsão", "previsao", "prazo"],
        respond: respond_status,
    },
];

fn respond_trocar_loja(_record: &ClientRecord, _platform: Platform) -> String {
    "🔁 **Troca de loja:**\n\n\
     A alteração do local de atendimento é feita pela nossa central.\n\n\
     📞 Ligue **0800-727-2327** com o número da sua ordem em mãos e o time \
     remarca para a unidade mais conveniente."
        .to_string()
}

fn respond_lojas(_record: &ClientRecord, _platform: Platform) -> String {
    "🏪 **Lojas CarGlass próximas:**\n\n\
     • **CarGlass Morumbi**: Av. Professor Francisco Morato, 2307 - Butantã\n\
     • **CarGlass Vila Mariana**: Rua Domingos de Morais, 1267 - Vila Mariana\n\
     • **CarGlass Santo André**: Av. Industrial, 600 - Santo André\n\n\
     📞 Para mudar local: **0800-727-2327**"
        .to_string()
}

fn respond_garantia(record: &ClientRecord, _platform: Platform) -> String {
    format!(
        "🛡️ **Garantia CarGlass** para {}:\n\n\
         ✅ **12 meses** a partir da conclusão\n\
         ✅ Cobre defeitos de instalação\n\
         ✅ Válida em qualquer unidade CarGlass\n\n\
         📞 Central: **0800-727-2327**",
        record.tipo_servico
    )
}

fn respond_atendente(_record: &ClientRecord, _platform: Platform) -> String {
    "👥 **Falar com nossa equipe:**\n\n\
     📞 **Central:** 0800-727-2327\n\
     📱 **WhatsApp:** (11) 4003-8070\n\n\
     ⏰ **Horário:**\n\
     • Segunda a Sexta: 8h às 20h\n\
     • Sábado: 8h às 16h"
        .to_string()
}

fn respond_reclamacao(record: &ClientRecord, _platform: Platform) -> String {
    format!(
        "😔 Sinto muito pelo transtorno, {}!\n\n\
         Já sinalizei nossa equipe para te atender com prioridade:\n\n\
         📞 **Central:** 0800-727-2327\n\
         📱 **WhatsApp:** (11) 4003-8070",
        record.nome
    )
}

fn respond_status(record: &ClientRecord, platform: Platform) -> String {
    match platform {
        Platform::Web => format!(
            "📍 **Status atual:** {}\n\n{}",
            record.status,
            progress_bar_html(record)
        ),
        Platform::Whatsapp => format!(
            "📍 Status atual: {}\n\n{}",
            record.status,
            progress_timeline_text(record)
        ),
    }
}

/// Compositor de respostas para sessões já identificadas: primeiro as regras
/// de intenção, depois a OpenAI, por fim as frases de fallback.
#[derive(Clone)]
pub struct Responder {
    openai: Option<OpenAiService>,
    fallback_cursor: Arc<AtomicUsize>,
}

impl Responder {
    pub fn new(openai: Option<OpenAiService>) -> Self {
        Self {
            openai,
            fallback_cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn answer_question(
        &self,
        pergunta: &str,
        record: &ClientRecord,
        platform: Platform,
    ) -> String {
        let pergunta_lower = pergunta.to_lowercase();

        for rule in INTENT_RULES {
            if rule.keywords.iter().any(|kw| pergunta_lower.contains(kw)) {
                log_intent_matched(rule.name);
                return (rule.respond)(record, platform);
            }
        }

        if let Some(ref openai) = self.openai {
            match openai.answer(pergunta, record).await {
                Ok(text) => return text,
                Err(e) => log_openai_fallback(&e.to_string()),
            }
        }

        self.canned_fallback(record)
    }

    /// Seleção determinística (round-robin) entre as frases de fallback.
    fn canned_fallback(&self, record: &ClientRecord) -> String {
        let idx = self.fallback_cursor.fetch_add(1, Ordering::Relaxed) % FALLBACK_TEMPLATES.len();
        FALLBACK_TEMPLATES[idx].replace("{nome}", &record.nome)
    }
}

/// Processa uma mensagem do usuário contra a sessão: fluxo de identificação
/// enquanto anônimo, perguntas livres depois. Devolve o histórico atualizado.
pub async fn process_user_message(
    responder: &Responder,
    sessions: &SessionStore,
    clients: &ClientDataService,
    session_id: &str,
    raw_input: &str,
) -> AppResult<Vec<ChatMessage>> {
    let input = sanitize_input(raw_input);

    let session = sessions
        .get_session(session_id)
        .await
        .ok_or_else(|| AppError::SessionError(format!("Sessão não encontrada: {}", session_id)))?;

    sessions.push_message(session_id, "user", &input).await;

    let reply = if session.client_identified {
        let record = session.client_record.as_ref().ok_or_else(|| {
            AppError::InternalError("sessão identificada sem registro de cliente".to_string())
        })?;
        responder.answer_question(&input, record, session.platform).await
    } else {
        identification_flow(sessions, clients, session_id, &input, session.platform).await
    };

    sessions.push_message(session_id, "assistant", &reply).await;
    Ok(sessions.messages(session_id).await)
}

async fn identification_flow(
    sessions: &SessionStore,
    clients: &ClientDataService,
    session_id: &str,
    input: &str,
    platform: Platform,
) -> String {
    let (tipo, valor) = identifier::classify(input);
    let Some(tipo) = tipo else {
        return IDENTIFIER_PROMPT.to_string();
    };
    log_identifier_detected(tipo.as_str());

    match clients.lookup(tipo, &valor).await {
        LookupOutcome::NotFound { .. } => not_found_message(tipo),
        LookupOutcome::Found(record) => {
            sessions.set_identified(session_id, record.clone()).await;
            identified_summary(&record, platform)
        }
    }
}

fn not_found_message(tipo: IdentifierKind) -> String {
    format!(
        "❌ **Não encontrei informações** com o {} fornecido.\n\n\
         **Você pode tentar:**\n\
         • Verificar se digitou corretamente\n\
         • Usar outro identificador\n\
         • Entrar em contato: **📞 0800-727-2327**",
        tipo
    )
}

fn identified_summary(record: &ClientRecord, platform: Platform) -> String {
    match platform {
        Platform::Web => {
            let status_class = if record.status.to_lowercase().contains("agendado") {
                "agendado"
            } else {
                "andamento"
            };
            format!(
                "👋 **Olá {nome}!** Encontrei suas informações.\n\n\
                 **Status:** <span class=\"status-tag {status_class}\">{status}</span>\n\n\
                 {progress_bar}\n\n\
                 📋 **Resumo:**\n\
                 • **Ordem:** {ordem}\n\
                 • **Serviço:** {tipo_servico}\n\
                 • **Veículo:** {modelo} ({ano})\n\
                 • **Placa:** {placa}\n\n\
                 💬 **Como posso ajudar?**",
                nome = record.nome,
                status_class = status_class,
                status = record.status,
                progress_bar = progress_bar_html(record),
                ordem = record.ordem,
                tipo_servico = record.tipo_servico,
                modelo = record.veiculo.modelo,
                ano = record.veiculo.ano,
                placa = record.veiculo.placa,
            )
        }
        Platform::Whatsapp => format!(
            "👋 Olá {nome}! Encontrei suas informações.\n\n\
             Status: {status}\n\n\
             {timeline}\n\n\
             📋 Resumo\n\
             • Ordem: {ordem}\n\
             • Serviço: {tipo_servico}\n\
             • Veículo: {modelo} ({ano})\n\
             • Placa: {placa}\n\n\
             💬 Como posso ajudar?",
            nome = record.nome,
            status = record.status,
            timeline = progress_timeline_text(record),
            ordem = record.ordem,
            tipo_servico = record.tipo_servico,
            modelo = record.veiculo.modelo,
            ano = record.veiculo.ano,
            placa = record.veiculo.placa,
        ),
    }
}
