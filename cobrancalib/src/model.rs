//! Доменные модели: титул к оплате, плательщик, получатель.
//! Модели не знают о раскладке банка; её применяют `bank`, `boleto` и `remessa`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FieldErrorKind, ValidationErrors};
use crate::fields::digits_only;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub cep: String,
    pub city: String,
    pub state: String,
}

impl Address {
    /// «улица, номер, дополнение» без пустых частей.
    pub fn line(&self) -> String {
        [&self.street, &self.number, &self.complement]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Тип лица по документу: CPF (11 цифр) или CNPJ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Individual,
    Company,
}

impl PartyKind {
    pub fn of(document: &str) -> Self {
        if digits_only(document).len() <= 11 {
            PartyKind::Individual
        } else {
            PartyKind::Company
        }
    }

    pub fn code(self) -> char {
        match self {
            PartyKind::Individual => '1',
            PartyKind::Company => '2',
        }
    }

    /// Двузначная форма: "01" / "02".
    pub fn code2(self) -> &'static str {
        match self {
            PartyKind::Individual => "01",
            PartyKind::Company => "02",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payer {
    pub document: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
}

impl Payer {
    pub fn kind(&self) -> PartyKind {
        PartyKind::of(&self.document)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guarantor {
    pub document: String,
    pub name: String,
}

/// Скидка: код (0 — без скидки), дата-предел и сумма.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub code: char,
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
}

impl Default for Discount {
    fn default() -> Self {
        Self {
            code: '0',
            date: None,
            amount: Decimal::ZERO,
        }
    }
}

impl Discount {
    pub fn is_set(&self) -> bool {
        self.code != '0'
    }
}

/// Штраф (multa): код, дата начала, процент.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fine {
    pub code: char,
    pub date: Option<NaiveDate>,
    pub percentage: Decimal,
}

impl Default for Fine {
    fn default() -> Self {
        Self {
            code: '0',
            date: None,
            percentage: Decimal::ZERO,
        }
    }
}

/// Пеня (juros/mora): тип, дата начала, сумма в день.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interest {
    pub code: char,
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
}

impl Default for Interest {
    fn default() -> Self {
        Self {
            code: '3',
            date: None,
            amount: Decimal::ZERO,
        }
    }
}

/// Инструкция протеста или списания: код и число дней.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    pub code: char,
    pub days: u32,
}

impl Instruction {
    pub const NO_PROTEST: Instruction = Instruction { code: '3', days: 0 };
    pub const NO_WRITE_OFF: Instruction = Instruction { code: '0', days: 0 };
}

/// Один титул в файле ремессы.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub nosso_numero: String,
    /// «documento»: номер, которым получатель сам отслеживает титул.
    pub control_number: Option<String>,
    /// «numero»: номер документа-основания (дубликат, полис…).
    pub document_number: Option<String>,
    pub amount: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payer: Payer,
    pub guarantor: Option<Guarantor>,
    pub occurrence: String,
    pub title_kind: Option<String>,
    pub discount: Discount,
    pub second_discount: Discount,
    pub third_discount: Discount,
    pub fine: Fine,
    pub interest: Interest,
    pub iof: Decimal,
    pub rebate: Decimal,
    pub protest: Instruction,
    pub write_off: Instruction,
    pub instructions: String,
    pub require_payer_number: bool,
    pub address_exempt: bool,
}

impl PaymentRecord {
    /// Обязательные поля — аргументы; остальное по умолчанию:
    /// выпуск сегодня, суммы нулевые, протеста нет.
    pub fn new(
        nosso_numero: impl Into<String>,
        amount: Decimal,
        due_date: NaiveDate,
        payer: Payer,
    ) -> Self {
        Self {
            nosso_numero: nosso_numero.into(),
            control_number: None,
            document_number: None,
            amount,
            issue_date: chrono::Local::now().date_naive(),
            due_date: Some(due_date),
            payer,
            guarantor: None,
            occurrence: "01".into(),
            title_kind: None,
            discount: Discount::default(),
            second_discount: Discount::default(),
            third_discount: Discount::default(),
            fine: Fine::default(),
            interest: Interest::default(),
            iof: Decimal::ZERO,
            rebate: Decimal::ZERO,
            protest: Instruction::NO_PROTEST,
            write_off: Instruction::NO_WRITE_OFF,
            instructions: String::new(),
            require_payer_number: false,
            address_exempt: false,
        }
    }

    /// `control_number`, а если его нет — `document_number`.
    pub fn control_or_document_number(&self) -> &str {
        self.control_number
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.document_number.as_deref())
            .unwrap_or("")
    }

    pub fn guarantor_kind(&self) -> Option<PartyKind> {
        self.guarantor.as_ref().map(|g| PartyKind::of(&g.document))
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.nosso_numero.trim().is_empty() {
            errors.push("nosso_numero", FieldErrorKind::Missing);
        }
        if self.due_date.is_none() {
            errors.push("due_date", FieldErrorKind::Missing);
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            errors.push("amount", FieldErrorKind::OutOfRange);
        }

        check_document(&mut errors, "payer.document", &self.payer.document);
        if self.payer.name.trim().is_empty() {
            errors.push("payer.name", FieldErrorKind::Missing);
        }
        if !self.address_exempt {
            self.validate_address(&mut errors);
        } else if !self.payer.address.cep.trim().is_empty() {
            check_cep(&mut errors, &self.payer.address.cep);
        }
        if let Some(g) = &self.guarantor {
            if !g.document.trim().is_empty() {
                check_document(&mut errors, "guarantor.document", &g.document);
            }
        }

        if !self.occurrence.bytes().all(|b| b.is_ascii_digit()) {
            errors.push("occurrence", FieldErrorKind::NotNumeric);
        } else if self.occurrence.len() != 2 {
            errors.push("occurrence", FieldErrorKind::WrongLength { expected: 2 });
        }
        for (code_field, date_field, d) in [
            ("discount.code", "discount.date", &self.discount),
            ("second_discount.code", "second_discount.date", &self.second_discount),
            ("third_discount.code", "third_discount.date", &self.third_discount),
        ] {
            if !d.code.is_ascii_digit() {
                errors.push(code_field, FieldErrorKind::NotNumeric);
            } else if d.is_set() && d.date.is_none() {
                errors.push(date_field, FieldErrorKind::Missing);
            }
        }
        if !self.fine.code.is_ascii_digit() {
            errors.push("fine.code", FieldErrorKind::NotNumeric);
        }
        if !self.interest.code.is_ascii_digit() {
            errors.push("interest.code", FieldErrorKind::NotNumeric);
        }
        if !self.protest.code.is_ascii_digit() {
            errors.push("protest.code", FieldErrorKind::NotNumeric);
        }

        errors.into_result()
    }

    fn validate_address(&self, errors: &mut ValidationErrors) {
        let a = &self.payer.address;
        if a.street.trim().is_empty() {
            errors.push("payer.street", FieldErrorKind::Missing);
        }
        if self.require_payer_number && a.number.trim().is_empty() {
            errors.push("payer.number", FieldErrorKind::Missing);
        }
        if a.cep.trim().is_empty() {
            errors.push("payer.cep", FieldErrorKind::Missing);
        } else {
            check_cep(errors, &a.cep);
        }
        if a.city.trim().is_empty() {
            errors.push("payer.city", FieldErrorKind::Missing);
        }
        if a.state.trim().is_empty() {
            errors.push("payer.state", FieldErrorKind::Missing);
        } else if a.state.chars().count() != 2 {
            errors.push("payer.state", FieldErrorKind::WrongLength { expected: 2 });
        }
    }
}

fn check_cep(errors: &mut ValidationErrors, cep: &str) {
    let cep = cep.trim();
    if !cep.chars().all(|c| c.is_ascii_digit()) {
        errors.push("payer.cep", FieldErrorKind::NotNumeric);
    } else if cep.len() != 8 {
        errors.push("payer.cep", FieldErrorKind::WrongLength { expected: 8 });
    }
}

fn check_document(errors: &mut ValidationErrors, field: &'static str, document: &str) {
    let document = document.trim();
    if document.is_empty() {
        errors.push(field, FieldErrorKind::Missing);
    } else if !document.chars().all(|c| c.is_ascii_digit()) {
        errors.push(field, FieldErrorKind::NotNumeric);
    } else if !matches!(document.len(), 11 | 14) {
        errors.push(
            field,
            FieldErrorKind::Invalid("must be a CPF (11 digits) or CNPJ (14 digits)".into()),
        );
    }
}

/// Получатель (cedente): кто выставляет титулы и в каком отделении/счёте.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Beneficiary {
    pub name: String,
    pub document: String,
    pub agencia: String,
    pub conta: String,
    /// DV счёта, если банк не вычисляет его сам.
    pub conta_dv: Option<String>,
    pub convenio: String,
    pub address: Address,
}

impl Beneficiary {
    pub fn kind(&self) -> PartyKind {
        PartyKind::of(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment() -> PaymentRecord {
        PaymentRecord::new(
            "123",
            dec!(199.9),
            NaiveDate::from_ymd_opt(2015, 6, 25).unwrap(),
            Payer {
                document: "12345678901".into(),
                name: "PABLO DIEGO JOSÉ".into(),
                address: Address {
                    street: "RUA RIO GRANDE DO SUL".into(),
                    number: "999".into(),
                    complement: String::new(),
                    district: "São josé".into(),
                    cep: "12345678".into(),
                    city: "Santa rita de cássia".into(),
                    state: "SP".into(),
                },
            },
        )
    }

    #[test]
    fn defaults() {
        let p = payment();
        assert_eq!(p.issue_date, chrono::Local::now().date_naive());
        assert_eq!(p.iof, Decimal::ZERO);
        assert_eq!(p.rebate, Decimal::ZERO);
        assert_eq!(p.protest, Instruction::NO_PROTEST);
        assert_eq!(p.occurrence, "01");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut p = payment();
        p.due_date = None;
        p.payer.name.clear();
        p.payer.address.cep = "123456789".into();
        p.payer.address.state.clear();
        let errors = p.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains("due_date"));
        assert!(errors.contains("payer.name"));
        assert_eq!(
            errors.kind_of("payer.cep"),
            Some(&FieldErrorKind::WrongLength { expected: 8 })
        );
        assert!(errors.contains("payer.state"));
    }

    #[test]
    fn address_exemption() {
        let mut p = payment();
        p.payer.address = Address::default();
        assert!(p.validate().is_err());
        p.address_exempt = true;
        assert!(p.validate().is_ok());

        p.payer.address.cep = "1234é678".into();
        let errors = p.validate().unwrap_err();
        assert_eq!(errors.kind_of("payer.cep"), Some(&FieldErrorKind::NotNumeric));
    }

    #[test]
    fn payer_number_only_when_required() {
        let mut p = payment();
        p.payer.address.number.clear();
        assert!(p.validate().is_ok());
        p.require_payer_number = true;
        assert!(p.validate().unwrap_err().contains("payer.number"));
    }

    #[test]
    fn discount_code_requires_date() {
        let mut p = payment();
        p.second_discount.code = '1';
        assert!(p.validate().unwrap_err().contains("second_discount.date"));
        p.second_discount.date = NaiveDate::from_ymd_opt(2019, 9, 11);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn party_kinds() {
        let p = payment();
        assert_eq!(p.payer.kind().code2(), "01");
        assert_eq!(PartyKind::of("123456789101112").code2(), "02");
        assert_eq!(PartyKind::of("123456789101112").code(), '2');
    }

    #[test]
    fn address_line_skips_blanks() {
        let mut a = payment().payer.address;
        assert_eq!(a.line(), "RUA RIO GRANDE DO SUL, 999");
        a.complement = "apto 3".into();
        assert_eq!(a.line(), "RUA RIO GRANDE DO SUL, 999, apto 3");
    }
}
