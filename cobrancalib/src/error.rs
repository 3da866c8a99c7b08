//! Единый тип ошибок публичного API.

use std::fmt;

use thiserror::Error;

use crate::model::PaymentRecord;

#[derive(Debug, Error)]
pub enum CobrancaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Field {field} does not fit in {width} positions: {value:?}")]
    FieldTooLong {
        field: &'static str,
        width: usize,
        value: String,
    },

    #[error("Bank {bank} does not support carteira {carteira:?}")]
    UnsupportedWalletCode { bank: &'static str, carteira: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Invalid boleto: {0}")]
    InvalidBoleto(ValidationErrors),

    #[error("Invalid remittance, payment {}: {errors}", payment.nosso_numero)]
    InvalidRemittance {
        payment: Box<PaymentRecord>,
        errors: ValidationErrors,
    },

    #[error("Layout field {field} ends at {end} before it starts at {start}")]
    InvalidLayout {
        field: &'static str,
        start: usize,
        end: usize,
    },

    #[error("Line {line} is truncated: layout needs {expected} characters, got {actual}")]
    TruncatedRecord {
        line: usize,
        expected: usize,
        actual: usize,
    },

    // внутренняя ошибка сборки: поле не совпало с объявленной шириной
    #[error("Assembly invariant violated for {field}: expected width {expected}, got {actual}")]
    AssemblyInvariant {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Record {record} cannot be written while the file is {state}")]
    RecordOrder {
        record: &'static str,
        state: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CobrancaError {
    /// Накопленные ошибки полей, если это ошибка валидации любого уровня.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            CobrancaError::Validation(e) | CobrancaError::InvalidBoleto(e) => Some(e),
            CobrancaError::InvalidRemittance { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CobrancaError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    TooLong { max: usize },
    WrongLength { expected: usize },
    NotNumeric,
    OutOfRange,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Missing => write!(f, "{} is required", self.field),
            FieldErrorKind::TooLong { max } => {
                write!(f, "{} is too long (max {max})", self.field)
            }
            FieldErrorKind::WrongLength { expected } => {
                write!(f, "{} must have exactly {expected} characters", self.field)
            }
            FieldErrorKind::NotNumeric => write!(f, "{} must contain only digits", self.field),
            FieldErrorKind::OutOfRange => write!(f, "{} is out of range", self.field),
            FieldErrorKind::Invalid(msg) => write!(f, "{} {msg}", self.field),
        }
    }
}

/// Упорядоченный набор ошибок полей. Собирается целиком, а не до первой ошибки.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, kind: FieldErrorKind) {
        self.0.push(FieldError { field, kind });
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn kind_of(&self, field: &str) -> Option<&FieldErrorKind> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.kind)
    }

    /// `Ok(())` если ошибок нет, иначе сам набор.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
