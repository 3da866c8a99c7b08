//! Boleto: штрихкод из 44 цифр и «linha digitável» из 47.
//!
//! Раскладка штрихкода: банк(3) валюта(1) DV(1) фактор(4) сумма(10) campo livre(25).

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::bank::{BankProfile, Identifiers};
use crate::checksum::{mod10, Mod11};
use crate::config::{Config, Rollover};
use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};
use crate::fields::{self, digits_only};
use crate::model::{Beneficiary, Payer};

pub const BARCODE_LEN: usize = 44;
pub const CHECK_LINE_DIGITS: usize = 47;

const MAX_FACTOR: i64 = 9999;

/// «Fator de vencimento»: дни от базовой даты до срока, 4 цифры.
pub fn due_factor(due: NaiveDate, config: &Config) -> Result<u32> {
    let days = (due - config.due_factor_epoch).num_days();
    let out_of_range = || {
        let mut errors = ValidationErrors::new();
        errors.push("due_date", FieldErrorKind::OutOfRange);
        CobrancaError::Validation(errors)
    };
    if days < 0 {
        return Err(out_of_range());
    }
    let factor = if days <= MAX_FACTOR {
        days
    } else {
        match config.due_factor_rollover {
            // новый цикл: 10000 → 1000
            Rollover::Wrap => (days - 1000) % 9000 + 1000,
            Rollover::Reject => return Err(out_of_range()),
        }
    };
    u32::try_from(factor).map_err(|_| out_of_range())
}

/// Один платёжный документ: профиль банка, получатель, номер, сумма и сроки.
#[derive(Debug, Clone)]
pub struct Boleto {
    pub profile: BankProfile,
    pub beneficiary: Beneficiary,
    pub numero: String,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub document_date: NaiveDate,
    pub payer: Option<Payer>,
}

impl Boleto {
    pub fn new(profile: BankProfile, beneficiary: Beneficiary, numero: impl Into<String>) -> Self {
        Self {
            profile,
            beneficiary,
            numero: numero.into(),
            amount: None,
            due_date: None,
            document_date: chrono::Local::now().date_naive(),
            payer: None,
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn identifiers(&self) -> Identifiers<'_> {
        Identifiers {
            agencia: &self.beneficiary.agencia,
            conta: &self.beneficiary.conta,
            convenio: &self.beneficiary.convenio,
            numero: &self.numero,
            document: &self.beneficiary.document,
        }
    }

    pub fn campo_livre(&self) -> Result<String> {
        self.profile.campo_livre(&self.identifiers())
    }

    pub fn nosso_numero_display(&self) -> Result<String> {
        self.profile.nosso_numero_display(&self.identifiers())
    }

    pub fn agencia_conta_display(&self) -> Result<String> {
        self.profile.agencia_conta_display(&self.identifiers())
    }

    /// Собирает штрихкод. Ошибки полей копятся и возвращаются одним
    /// [`CobrancaError::InvalidBoleto`]; внутренние нарушения идут как есть.
    pub fn barcode(&self, config: &Config) -> Result<Barcode> {
        let mut errors = ValidationErrors::new();

        let amount = match self.amount {
            None => {
                errors.push("amount", FieldErrorKind::Missing);
                None
            }
            Some(v) => collect(&mut errors, fields::amount("amount", v, 10))?,
        };
        let factor = match self.due_date {
            None => {
                errors.push("due_date", FieldErrorKind::Missing);
                None
            }
            Some(d) => collect(&mut errors, due_factor(d, config))?,
        };
        let free = collect(&mut errors, self.campo_livre())?;

        let (Some(amount), Some(factor), Some(free)) = (amount, factor, free) else {
            return Err(CobrancaError::InvalidBoleto(errors));
        };

        let barcode = Barcode::assemble(
            self.profile.code(),
            config.currency_code,
            &format!("{factor:04}"),
            &amount,
            &free,
        )?;
        tracing::debug!(
            bank = self.profile.code(),
            barcode = barcode.digits(),
            "barcode built"
        );
        Ok(barcode)
    }
}

/// Переносит ошибку поля в общий список (`Ok(None)`); прочие ошибки пробрасываются.
fn collect<T>(errors: &mut ValidationErrors, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(CobrancaError::Validation(e)) => {
            errors.extend(e);
            Ok(None)
        }
        Err(CobrancaError::FieldTooLong { field, width, .. }) => {
            errors.push(field, FieldErrorKind::TooLong { max: width });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// 44 цифры штрихкода.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    digits: String,
}

impl Barcode {
    fn assemble(bank: &str, currency: char, factor: &str, amount: &str, free: &str) -> Result<Self> {
        let body = format!("{bank}{currency}{factor}{amount}{free}");
        if body.len() != BARCODE_LEN - 1 {
            return Err(CobrancaError::AssemblyInvariant {
                field: "barcode",
                expected: BARCODE_LEN - 1,
                actual: body.len(),
            });
        }
        let dv = general_check_digit(&body)?;
        let digits = format!("{}{dv}{}", &body[..4], &body[4..]);
        Ok(Self { digits })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Цифра в позиции 5.
    pub fn check_digit(&self) -> char {
        self.digits.as_bytes()[4] as char
    }

    pub fn bank_code(&self) -> &str {
        &self.digits[..3]
    }

    pub fn due_factor(&self) -> &str {
        &self.digits[5..9]
    }

    pub fn amount(&self) -> Decimal {
        let cents: i64 = self.digits[9..19].parse().unwrap_or_default();
        Decimal::new(cents, 2)
    }

    pub fn campo_livre(&self) -> &str {
        &self.digits[19..]
    }

    /// Linha digitável: `AAAAA.AAAAA BBBBB.BBBBBB CCCCC.CCCCCC D EEEEEEEEEEEEEE`.
    pub fn check_line(&self) -> String {
        let b = &self.digits;
        let f1 = with_mod10(&format!("{}{}", &b[..4], &b[19..24]));
        let f2 = with_mod10(&b[24..34]);
        let f3 = with_mod10(&b[34..44]);
        format!(
            "{}.{} {}.{} {}.{} {} {}",
            &f1[..5],
            &f1[5..],
            &f2[..5],
            &f2[5..],
            &f3[..5],
            &f3[5..],
            &b[4..5],
            &b[5..19]
        )
    }

    /// Восстанавливает штрихкод из linha digitável; разделители игнорируются.
    /// Проверяются три mod10 полей и общий DV.
    pub fn from_check_line(line: &str) -> Result<Self> {
        let d = digits_only(line);
        let mut errors = ValidationErrors::new();
        if d.len() != CHECK_LINE_DIGITS {
            errors.push(
                "check_line",
                FieldErrorKind::WrongLength {
                    expected: CHECK_LINE_DIGITS,
                },
            );
            return Err(CobrancaError::Validation(errors));
        }
        let fields = [("field1", &d[..10]), ("field2", &d[10..21]), ("field3", &d[21..32])];
        for (name, field) in fields {
            let (body, dv) = field.split_at(field.len() - 1);
            if mod10(body).to_string() != dv {
                errors.push(name, FieldErrorKind::Invalid("check digit mismatch".into()));
            }
        }
        // банк+валюта, DV, фактор+сумма, затем campo livre из трёх полей без их DV
        let digits = [&d[..4], &d[32..33], &d[33..47], &d[4..9], &d[10..20], &d[21..31]].concat();
        let body = format!("{}{}", &digits[..4], &digits[5..]);
        if general_check_digit(&body)? != digits.as_bytes()[4] as char {
            errors.push("barcode", FieldErrorKind::Invalid("check digit mismatch".into()));
        }
        errors
            .into_result()
            .map_err(CobrancaError::Validation)?;
        Ok(Self { digits })
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

/// Общий DV штрихкода по 43 цифрам без позиции 5.
pub fn general_check_digit(body: &str) -> Result<char> {
    Mod11::BARCODE
        .digit(body)
        .ok_or(CobrancaError::AssemblyInvariant {
            field: "barcode_dv",
            expected: 1,
            actual: 0,
        })
}

fn with_mod10(field: &str) -> String {
    format!("{field}{}", mod10(field))
}
