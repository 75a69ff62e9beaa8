use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").expect("regex válida"));
static RE_JS_PROTOCOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("regex válida"));

/// Hora atual no formato exibido junto às mensagens (HH:MM).
pub fn current_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Data e hora atuais no formato da barra de status (dd/mm/aaaa - HH:MM).
pub fn current_datetime() -> String {
    Local::now().format("%d/%m/%Y - %H:%M").to_string()
}

/// Remove blocos `<script>` e prefixos `javascript:` da entrada do usuário.
pub fn sanitize_input(text: &str) -> String {
    let trimmed = text.trim();
    let without_script = RE_SCRIPT_TAG.replace_all(trimmed, "");
    RE_JS_PROTOCOL.replace_all(&without_script, "").to_string()
}
