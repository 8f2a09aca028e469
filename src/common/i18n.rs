// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LANG: &str = "pt";

// Catálogo de mensagens por idioma: código do erro -> texto.
type Catalog = HashMap<&'static str, &'static str>;

#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, Catalog>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("pt", Self::portuguese());
        catalogs.insert("en", Self::english());
        Self { catalogs: Arc::new(catalogs) }
    }

    /// Traduz um código de erro. Idioma desconhecido cai no português,
    /// código desconhecido cai na mensagem genérica.
    pub fn translate(&self, lang: &str, code: &str) -> &'static str {
        let lookup = |lang: &str| {
            self.catalogs
                .get(lang)
                .and_then(|catalog| catalog.get(code).copied())
        };

        lookup(lang)
            .or_else(|| lookup(DEFAULT_LANG))
            .unwrap_or("Ocorreu um erro inesperado.")
    }

    fn portuguese() -> Catalog {
        HashMap::from([
            ("validation_error", "Um ou mais campos são inválidos."),
            ("email_already_exists", "Este e-mail já está em uso."),
            ("invalid_credentials", "E-mail ou senha inválidos."),
            ("invalid_token", "Token de autenticação inválido ou ausente."),
            ("user_not_found", "Usuário não encontrado."),
            ("forbidden", "Você não tem permissão para realizar esta ação."),
            ("license_expired", "A licença da empresa expirou. Renove para continuar."),
            ("not_found", "Registro não encontrado."),
            ("unique_violation", "Já existe um registro com esses dados."),
            ("slug_already_exists", "Este endereço de loja já está em uso."),
            ("account_has_sold_screens", "Não é possível excluir a conta pois existem telas já vendidas."),
            ("service_in_use", "Não é possível excluir o serviço pois ele ainda possui contas ou vendas."),
            ("operator_auth_unavailable", "Acesso de operador da plataforma não está configurado."),
            ("payment_config_missing", "Empresa sem configuração ativa do Mercado Pago."),
            ("gateway_request_error", "Falha ao comunicar com o gateway de pagamento."),
            ("gateway_timeout", "O gateway de pagamento não respondeu a tempo."),
            ("no_capacity_available", "Sem telas disponíveis para este serviço."),
            ("already_finalized", "Esta venda já foi finalizada."),
            ("already_cancelled", "Esta venda já está cancelada."),
            ("invalid_sale_transition", "Esta operação não é permitida no status atual da venda."),
            ("amount_mismatch", "O valor pago diverge do valor da venda."),
            ("missing_payment_id", "Notificação sem id de pagamento."),
            ("internal_error", "Ocorreu um erro inesperado."),
        ])
    }

    fn english() -> Catalog {
        HashMap::from([
            ("validation_error", "One or more fields are invalid."),
            ("email_already_exists", "This e-mail is already in use."),
            ("invalid_credentials", "Invalid e-mail or password."),
            ("invalid_token", "Missing or invalid authentication token."),
            ("user_not_found", "User not found."),
            ("forbidden", "You are not allowed to perform this action."),
            ("license_expired", "The company license has expired. Renew it to continue."),
            ("not_found", "Record not found."),
            ("unique_violation", "A record with this data already exists."),
            ("slug_already_exists", "This store address is already taken."),
            ("account_has_sold_screens", "The account cannot be deleted because some of its screens were sold."),
            ("service_in_use", "The service cannot be deleted while it still has accounts or sales."),
            ("operator_auth_unavailable", "Platform operator access is not configured."),
            ("payment_config_missing", "The company has no active payment gateway configuration."),
            ("gateway_request_error", "The payment gateway request failed."),
            ("gateway_timeout", "The payment gateway did not answer in time."),
            ("no_capacity_available", "No screens available for this service."),
            ("already_finalized", "This sale was already finalized."),
            ("already_cancelled", "This sale is already cancelled."),
            ("invalid_sale_transition", "This operation is not allowed in the sale's current status."),
            ("amount_mismatch", "The paid amount does not match the sale amount."),
            ("missing_payment_id", "Notification without a payment id."),
            ("internal_error", "An unexpected error occurred."),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("de", "no_capacity_available"),
            "Sem telas disponíveis para este serviço."
        );
    }

    #[test]
    fn english_catalog_is_used_when_requested() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "already_finalized"), "This sale was already finalized.");
    }

    #[test]
    fn both_catalogs_cover_the_same_codes() {
        let pt = I18nStore::portuguese();
        let en = I18nStore::english();
        for code in pt.keys() {
            assert!(en.contains_key(code), "faltando tradução em inglês para {code}");
        }
        assert_eq!(pt.len(), en.len());
    }
}
