use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::reconciliation::digits_only;

/// Prefix granularity for activity-code comparison: the 4-digit class of the
/// CNAE hierarchy.
const PREFIX_LEN: usize = 4;

/// Three-way compatibility verdict. `Unmapped` is deliberately distinct from
/// `Incompatible`: an unmapped service says nothing about the supplier and
/// must go to manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "reason")]
pub enum ServiceCompatibility {
    Compatible(String),
    Incompatible(String),
    Unmapped(String),
}

impl ServiceCompatibility {
    /// Boolean view: `None` when the service keyword has no rule.
    pub fn compatible(&self) -> Option<bool> {
        match self {
            ServiceCompatibility::Compatible(_) => Some(true),
            ServiceCompatibility::Incompatible(_) => Some(false),
            ServiceCompatibility::Unmapped(_) => None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ServiceCompatibility::Compatible(reason)
            | ServiceCompatibility::Incompatible(reason)
            | ServiceCompatibility::Unmapped(reason) => reason,
        }
    }
}

/// Static mapping from normalized service keywords to accepted
/// business-activity-code prefixes.
#[derive(Debug, Clone)]
pub struct CompatibilityRules {
    accepted: HashMap<String, Vec<String>>,
}

impl Default for CompatibilityRules {
    /// Rule table for the building-maintenance services condominiums buy.
    fn default() -> Self {
        let mut rules = Self::empty();
        rules.register("jardinagem", &["8130300"]);
        rules.register("paisagismo", &["8130300"]);
        rules.register("limpeza", &["8121400", "8129000"]);
        rules.register("conservacao", &["8121400"]);
        rules.register("seguranca", &["8011101", "8011102"]);
        rules.register("vigilancia", &["8011101"]);
        rules.register("portaria", &["8011101"]);
        rules.register("elevador", &["4329104"]);
        rules.register("manutencao_elevador", &["4329104"]);
        rules.register("eletrica", &["4321500"]);
        rules.register("instalacao_eletrica", &["4321500"]);
        rules.register("hidraulica", &["4322301", "4322302"]);
        rules.register("encanamento", &["4322301"]);
        rules.register("pintura", &["4330404", "4330405"]);
        rules.register("reforma", &["4330404"]);
        rules.register("construcao", &["4120400"]);
        rules.register("obra", &["4120400"]);
        rules
    }
}

impl CompatibilityRules {
    pub fn empty() -> Self {
        Self {
            accepted: HashMap::new(),
        }
    }

    pub fn register(&mut self, keyword: &str, code_prefixes: &[&str]) {
        self.accepted.insert(
            normalize_keyword(keyword),
            code_prefixes
                .iter()
                .map(|prefix| digits_only(prefix))
                .collect(),
        );
    }

    /// Judge whether any of the supplier's registered activity codes is
    /// compatible with the declared service.
    pub fn classify(
        &self,
        primary_code: &str,
        secondary_codes: &[String],
        service_keyword: &str,
    ) -> ServiceCompatibility {
        let normalized = normalize_keyword(service_keyword);
        let Some(accepted) = self.accepted.get(&normalized) else {
            return ServiceCompatibility::Unmapped(format!(
                "service '{service_keyword}' is not mapped; manual validation required"
            ));
        };

        let primary = digits_only(primary_code);
        let codes = std::iter::once(primary.clone())
            .chain(secondary_codes.iter().map(|code| digits_only(code)));

        for code in codes {
            for allowed in accepted {
                let prefix = &allowed[..allowed.len().min(PREFIX_LEN)];
                if !prefix.is_empty() && code.starts_with(prefix) {
                    return ServiceCompatibility::Compatible(format!(
                        "activity code {code} is compatible with service '{service_keyword}'"
                    ));
                }
            }
        }

        ServiceCompatibility::Incompatible(format!(
            "activity code {primary} is not compatible with service '{service_keyword}'; \
             possible diversion of funds"
        ))
    }
}

/// Lowercase, trim, and strip diacritics so "Manutenção" and "manutencao"
/// land on the same rule.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
