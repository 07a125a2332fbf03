//! Query DTOs - Parametri di query per gli endpoint

use serde::Deserialize;

/// Paginazione dei messaggi: la pagina 1 è sempre quella più recente
#[derive(Deserialize, Debug, Clone)]
pub struct MessagesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
