use serde::{Deserialize, Serialize};

/// Registro de cliente retornado pela API de status da CarGlass.
/// Os nomes de campo seguem o formato de wire da API.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientRecord {
    pub nome: String,
    pub cpf: String,
    pub telefone: String,
    pub ordem: String,
    pub status: String,
    pub tipo_servico: String,
    pub veiculo: Veiculo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Veiculo {
    pub modelo: String,
    pub placa: String,
    pub ano: String,
}

/// Envelope da API real: `{"sucesso": ..., "dados": ..., "mensagem": ...}`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub sucesso: bool,
    #[serde(default)]
    pub dados: Option<ClientRecord>,
    #[serde(default)]
    pub mensagem: Option<String>,
}

/// Resultado de uma consulta de cliente, real ou simulada.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(ClientRecord),
    NotFound { mensagem: String },
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }
}
