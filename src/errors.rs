use thiserror::Error;

/// Erros possíveis durante a conversão de um extrato em CSV
#[derive(Error, Debug)]
pub enum StatementParseError {
    // ── Erros de campo (texto da célula fora do formato esperado) ───────────────

    /// Percentual que não segue o formato `-?\d+%`
    #[error("Invalid percentage string '{0}'")]
    InvalidPercent(String),

    /// Percentual no formato certo, mas com valor que não cabe num inteiro
    #[error("Invalid percentage value '{0}'")]
    InvalidPercentValue(String),

    /// Valor monetário que não segue o formato `-?$\d+.\d+`
    #[error("Invalid amount string '{0}'")]
    InvalidAmount(String),

    /// Valor monetário no formato certo, mas não representável
    #[error("Invalid amount value '{0}'")]
    InvalidAmountValue(String),

    // ── Erros de sistema ────────────────────────────────────────────────────────

    /// Intervalo de páginas mal formado (páginas começam em 1)
    #[error("Invalid page range: first={first}, last={last:?}")]
    InvalidPageRange { first: usize, last: Option<usize> },

    /// Falha da biblioteca de PDF ao abrir o documento ou decodificar uma página
    #[error("PDF extraction failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Falha ao gravar o CSV
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Erro de leitura/escrita em disco
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatementParseError {
    /// `true` quando o erro vem de uma célula mal formada no extrato
    pub fn is_field_error(&self) -> bool {
        matches!(
            self,
            StatementParseError::InvalidPercent(_)
                | StatementParseError::InvalidPercentValue(_)
                | StatementParseError::InvalidAmount(_)
                | StatementParseError::InvalidAmountValue(_)
        )
    }
}

/// Alias conveniente para Result com nosso tipo de erro principal
pub type StatementResult<T> = Result<T, StatementParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatementParseError::InvalidPercent("abc".into()), true)]
    #[case(StatementParseError::InvalidPercentValue("99999999999999999999%".into()), true)]
    #[case(StatementParseError::InvalidAmount("12.34".into()), true)]
    #[case(StatementParseError::InvalidAmountValue("$1.0".into()), true)]
    #[case(StatementParseError::InvalidPageRange { first: 0, last: None }, false)]
    #[case(StatementParseError::Io(std::io::Error::other("disk full")), false)]
    fn test_is_field_error(#[case] error: StatementParseError, #[case] expected: bool) {
        assert_eq!(error.is_field_error(), expected);
    }

    #[test]
    fn test_field_error_message_carries_raw_text() {
        let error = StatementParseError::InvalidAmount("12.34".to_string());
        assert_eq!(error.to_string(), "Invalid amount string '12.34'");
    }
}
