use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::{ClientRecord, LookupOutcome, Veiculo};
use crate::services::identifier::IdentifierKind;

/// Base simulada usada quando a API real está desabilitada ou fora do ar.
/// Os registros são indexados por CPF; os demais identificadores chegam lá
/// pelos mapas auxiliares.
static MOCK_DATABASE: Lazy<HashMap<&'static str, ClientRecord>> = Lazy::new(|| {
    HashMap::from([
        (
            "12345678900",
            ClientRecord {
                nome: "Carlos Silva".to_string(),
                cpf: "12345678900".to_string(),
                telefone: "11987654321".to_string(),
                ordem: "ORD12345".to_string(),
                status: "Em andamento".to_string(),
                tipo_servico: "Troca de Parabrisa".to_string(),
                veiculo: Veiculo {
                    modelo: "Honda Civic".to_string(),
                    placa: "ABC1234".to_string(),
                    ano: "2022".to_string(),
                },
            },
        ),
        (
            "98765432100",
            ClientRecord {
                nome: "Maria Santos".to_string(),
                cpf: "98765432100".to_string(),
                telefone: "11976543210".to_string(),
                ordem: "ORD67890".to_string(),
                status: "Serviço agendado com sucesso".to_string(),
                tipo_servico: "Reparo de Trinca".to_string(),
                veiculo: Veiculo {
                    modelo: "Toyota Corolla".to_string(),
                    placa: "DEF5678".to_string(),
                    ano: "2021".to_string(),
                },
            },
        ),
        (
            "45678912300",
            ClientRecord {
                nome: "João Pereira".to_string(),
                cpf: "45678912300".to_string(),
                telefone: "11965432109".to_string(),
                ordem: "ORD54321".to_string(),
                status: "Concluído".to_string(),
                tipo_servico: "Troca de Vidro Lateral".to_string(),
                veiculo: Veiculo {
                    modelo: "Fiat Pulse".to_string(),
                    placa: "GHI9J01".to_string(),
                    ano: "2023".to_string(),
                },
            },
        ),
    ])
});

static ORDEM_PARA_CPF: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("123456", "12345678900"),
        ("ORD12345", "12345678900"),
        ("67890", "98765432100"),
        ("ORD67890", "98765432100"),
        ("54321", "45678912300"),
        ("ORD54321", "45678912300"),
    ])
});

static TELEFONE_PARA_CPF: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("11987654321", "12345678900"),
        ("11976543210", "98765432100"),
        ("11965432109", "45678912300"),
    ])
});

static PLACA_PARA_CPF: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ABC1234", "12345678900"),
        ("DEF5678", "98765432100"),
        ("GHI9J01", "45678912300"),
    ])
});

/// Resolve um identificador na base simulada.
pub fn lookup_mock(tipo: IdentifierKind, valor: &str) -> LookupOutcome {
    let cpf_key: Option<&str> = match tipo {
        IdentifierKind::Cpf => MOCK_DATABASE.contains_key(valor).then_some(valor),
        IdentifierKind::Ordem => ORDEM_PARA_CPF.get(valor).copied(),
        IdentifierKind::Telefone => TELEFONE_PARA_CPF.get(valor).copied(),
        IdentifierKind::Placa => PLACA_PARA_CPF.get(valor).copied(),
    };

    match cpf_key.and_then(|key| MOCK_DATABASE.get(key)) {
        Some(record) => LookupOutcome::Found(record.clone()),
        None => LookupOutcome::NotFound {
            mensagem: format!("Cliente não encontrado para {}", tipo),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_cpf() {
        match lookup_mock(IdentifierKind::Cpf, "12345678900") {
            LookupOutcome::Found(record) => {
                assert_eq!(record.nome, "Carlos Silva");
                assert_eq!(record.ordem, "ORD12345");
            }
            LookupOutcome::NotFound { .. } => panic!("cliente deveria existir"),
        }
    }

    #[test]
    fn test_indirect_lookups_resolve_to_same_record() {
        let direct = lookup_mock(IdentifierKind::Cpf, "12345678900");
        let by_phone = lookup_mock(IdentifierKind::Telefone, "11987654321");
        let by_plate = lookup_mock(IdentifierKind::Placa, "ABC1234");
        let by_order = lookup_mock(IdentifierKind::Ordem, "123456");

        for outcome in [direct, by_phone, by_plate, by_order] {
            match outcome {
                LookupOutcome::Found(record) => assert_eq!(record.cpf, "12345678900"),
                LookupOutcome::NotFound { .. } => panic!("cliente deveria existir"),
            }
        }
    }

    #[test]
    fn test_unknown_identifier_not_found() {
        let outcome = lookup_mock(IdentifierKind::Cpf, "00000000000");
        match outcome {
            LookupOutcome::NotFound { mensagem } => {
                assert!(mensagem.contains("cpf"));
            }
            LookupOutcome::Found(_) => panic!("cliente não deveria existir"),
        }
    }
}
