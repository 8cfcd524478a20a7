use std::collections::HashMap;

use crate::error::{LanguageRole, SyncError, SyncResult};

/// Uppercases `code` and turns `_` separators into `-` (`pt_br` -> `PT-BR`).
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase().replace('_', "-")
}

/// Maps a user supplied language code onto one of `supported`: exact match
/// first, then the primary subtag.
pub fn match_supported(code: &str, supported: &[&str]) -> Option<String> {
    let normalized = normalize_code(code);
    if supported.contains(&normalized.as_str()) {
        return Some(normalized);
    }
    let primary = normalized.split('-').next().unwrap_or(&normalized);
    supported
        .contains(&primary)
        .then(|| primary.to_string())
}

/// Memo of resolved codes for one provider instance.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    role: LanguageRole,
    supported: &'static [&'static str],
    resolved: HashMap<String, String>,
}

impl LanguageTable {
    pub fn new(role: LanguageRole, supported: &'static [&'static str]) -> Self {
        Self {
            role,
            supported,
            resolved: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, code: &str) -> SyncResult<String> {
        if let Some(existing) = self.resolved.get(code) {
            return Ok(existing.clone());
        }
        let formatted =
            match_supported(code, self.supported).ok_or_else(|| SyncError::UnsupportedLanguage {
                code: code.to_string(),
                role: self.role,
            })?;
        self.resolved.insert(code.to_string(), formatted.clone());
        Ok(formatted)
    }
}
