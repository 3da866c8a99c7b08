//! Ремесса CNAB400 CrediSIS (097): заголовок, деталь типа 1 на титул,
//! необязательная деталь типа 2 (адрес получателя, инструкции, пени), трейлер.

use crate::bank::Identifiers;
use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};
use crate::fields::{alpha, amount, blanks, date, numeric, percentage, DateFormat};
use crate::model::{Discount, PaymentRecord};
use crate::remessa::builder::{check_digits, FileAssembler, Remittance, RemittanceFile};
use crate::traits::RemittanceFormat;

const BANK_CODE: &str = "097";

/// Вид титула → код CrediSIS; по умолчанию "02".
fn especie(title_kind: Option<&str>) -> &'static str {
    match title_kind.map(str::trim) {
        Some("DMI") => "03",
        Some("DSI") => "05",
        Some("NP") => "12",
        Some("RC") => "17",
        Some("ME") => "21",
        Some("NF") => "23",
        _ => "02",
    }
}

/// Тип пени: 3 — нет, 1 — фиксированная, 2 — процент.
fn interest_code(code: char) -> Option<char> {
    match code {
        '3' => Some('I'),
        '1' => Some('F'),
        '2' => Some('P'),
        _ => None,
    }
}

/// Коды штрафа и скидок: 0 — нет, 1 — фиксированный, 2 — процент.
fn fine_or_discount_code(code: char) -> Option<char> {
    match code {
        '0' => Some('I'),
        '1' => Some('F'),
        '2' => Some('P'),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credisis400 {
    pub parcela: String,
}

impl Default for Credisis400 {
    fn default() -> Self {
        Self {
            parcela: "01".into(),
        }
    }
}

impl Credisis400 {
    fn check(&self, r: &Remittance) -> Result<()> {
        if r.profile.code() != BANK_CODE {
            return Err(CobrancaError::Unsupported("CNAB400 CrediSIS layout needs bank 097"));
        }
        let b = &r.beneficiary;
        let mut errors = ValidationErrors::new();
        r.check_common(&mut errors);
        check_digits(&mut errors, "agencia", &b.agencia, 4);
        check_digits(&mut errors, "conta", &b.conta, 8);
        check_digits(&mut errors, "convenio", &b.convenio, 6);
        match b.conta_dv.as_deref().map(str::trim) {
            None | Some("") => errors.push("conta_dv", FieldErrorKind::Missing),
            Some(dv) if dv.chars().count() != 1 => {
                errors.push("conta_dv", FieldErrorKind::TooLong { max: 1 })
            }
            Some(_) => {}
        }
        if r.sequence > 9_999_999 {
            errors.push("sequence", FieldErrorKind::TooLong { max: 7 });
        }
        if self.parcela.trim().is_empty() {
            errors.push("parcela", FieldErrorKind::Missing);
        }
        let a = &b.address;
        for (field, value) in [
            ("beneficiary.street", &a.street),
            ("beneficiary.number", &a.number),
            ("beneficiary.district", &a.district),
            ("beneficiary.city", &a.city),
            ("beneficiary.state", &a.state),
            ("beneficiary.cep", &a.cep),
        ] {
            if value.trim().is_empty() {
                errors.push(field, FieldErrorKind::Missing);
            }
        }
        errors.into_result().map_err(CobrancaError::Validation)?;

        r.check_payments(true, r.profile.spec().widths.numero)?;
        for p in &r.payments {
            let errors = code_errors(p);
            if !errors.is_empty() {
                return Err(CobrancaError::InvalidRemittance {
                    payment: Box::new(p.clone()),
                    errors,
                });
            }
        }
        Ok(())
    }

    /// Агентство(4) пробел счёт(8) DV(1) пробелы(6).
    fn info_conta(&self, r: &Remittance) -> Result<String> {
        let b = &r.beneficiary;
        Ok(format!(
            "{} {}{}{}",
            numeric("agencia", &b.agencia, 4)?,
            numeric("conta", &b.conta, 8)?,
            b.conta_dv.as_deref().unwrap_or_default().trim(),
            blanks(6)
        ))
    }

    fn header(&self, r: &Remittance) -> Result<String> {
        let mut line = String::from("01REMESSA01");
        line.push_str(&alpha("COBRANCA", 15));
        line.push_str(&self.info_conta(r)?);
        line.push_str(&alpha(&r.beneficiary.name, 30));
        line.push_str(BANK_CODE);
        line.push_str(&alpha("CENTRALCREDI", 15));
        line.push_str(&date(Some(r.generated_at.date()), DateFormat::Short));
        line.push_str(&numeric("sequence", &r.sequence.to_string(), 7)?);
        line.push_str(&blanks(284));
        line.push_str("001");
        line.push_str("000001");
        Ok(line)
    }

    fn nosso_numero(&self, r: &Remittance, p: &PaymentRecord) -> Result<String> {
        let b = &r.beneficiary;
        r.profile.nosso_numero(&Identifiers {
            agencia: &b.agencia,
            conta: &b.conta,
            convenio: &b.convenio,
            numero: &p.nosso_numero,
            document: &b.document,
        })
    }

    fn detail(&self, r: &Remittance, p: &PaymentRecord, seq: usize) -> Result<String> {
        let b = &r.beneficiary;
        let payer = &p.payer;
        let mut line = String::from("1");
        line.push_str(b.kind().code2());
        line.push_str(&numeric("beneficiary.document", &b.document, 14)?);
        line.push_str(&numeric("agencia", &b.agencia, 4)?);
        line.push_str(&numeric("conta", &b.conta, 8)?);
        line.push_str(b.conta_dv.as_deref().unwrap_or_default().trim());
        line.push_str(&blanks(26));
        line.push_str(&self.nosso_numero(r, p)?);
        // 01 — включение титула
        line.push_str("01");
        line.push_str(&date(Some(r.generated_at.date()), DateFormat::Short));
        line.push_str(&blanks(6));
        line.push_str(&numeric("parcela", &self.parcela, 2)?);
        // не принимать и не получать сумму, отличную от указанной
        line.push_str("33");
        line.push_str(especie(p.title_kind.as_deref()));
        // дни протеста календарные, протест не отправляется
        line.push('2');
        line.push_str(&numeric("protest.days", &p.protest.days.to_string(), 2)?);
        line.push_str("03");
        line.push_str(&blanks(9));
        line.push_str(&alpha(p.control_or_document_number(), 10));
        line.push_str(&date(p.due_date, DateFormat::Short));
        line.push_str(&amount("amount", p.amount, 13)?);
        line.push_str(&date(p.due_date, DateFormat::Short));
        line.push_str(&blanks(5));
        line.push_str(&date(Some(p.issue_date), DateFormat::Short));
        line.push(' ');
        line.push_str(payer.kind().code2());
        line.push_str(&numeric("payer.document", &payer.document, 14)?);
        line.push_str(&alpha(&payer.name, 40));
        line.push_str(&blanks(25));
        line.push_str(&alpha(&payer.address.street, 35));
        line.push_str(&alpha(&payer.address.number, 6));
        line.push_str(&alpha(&payer.address.district, 25));
        line.push_str(&alpha(&payer.address.city, 25));
        line.push_str(&alpha(&payer.address.state, 2));
        line.push_str(&numeric("payer.cep", &payer.address.cep, 8)?);
        line.push_str(&blanks(11));
        line.push_str(&blanks(43));
        line.push(' ');
        line.push_str(&numeric("sequencial", &seq.to_string(), 6)?);
        Ok(line)
    }

    fn optional_detail(&self, r: &Remittance, p: &PaymentRecord, seq: usize) -> Result<String> {
        let b = &r.beneficiary;
        let a = &b.address;
        let mut line = String::from("2");
        line.push_str(b.kind().code2());
        line.push_str(&numeric("beneficiary.document", &b.document, 14)?);
        line.push_str(&alpha(&b.name, 40));
        line.push_str(&alpha(&a.street, 35));
        line.push_str(&alpha(&a.number, 6));
        line.push_str(&alpha(&a.complement, 25));
        line.push_str(&alpha(&a.district, 25));
        line.push_str(&alpha(&a.city, 25));
        line.push_str(&alpha(&a.state, 2));
        line.push_str(&alpha(&a.cep, 8));
        line.push(' ');
        line.push_str(&alpha(&p.instructions, 99));
        line.push(' ');
        line.push_str(&amount("interest.amount", p.interest.amount, 15)?);
        line.push(interest_code(p.interest.code).unwrap_or(' '));
        // карантин пени: календарные дни, 00
        line.push_str("200");
        line.push_str(&percentage("fine.percentage", p.fine.percentage, 15)?);
        line.push(fine_or_discount_code(p.fine.code).unwrap_or(' '));
        line.push_str("200");
        for (field, d) in [
            ("discount.amount", &p.discount),
            ("second_discount.amount", &p.second_discount),
            ("third_discount.amount", &p.third_discount),
        ] {
            line.push_str(&discount_group(field, d)?);
        }
        line.push_str(&blanks(12));
        line.push_str(&numeric("sequencial", &seq.to_string(), 6)?);
        Ok(line)
    }

    fn trailer(&self, seq: usize) -> Result<String> {
        Ok(format!("9{}{}", blanks(393), numeric("sequencial", &seq.to_string(), 6)?))
    }
}

fn discount_group(field: &'static str, d: &Discount) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        date(d.date, DateFormat::Short),
        amount(field, d.amount, 13)?,
        fine_or_discount_code(d.code).unwrap_or(' ')
    ))
}

/// Коды пени, штрафа и скидок, у которых нет буквы в таблицах CrediSIS.
fn code_errors(p: &PaymentRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let unmapped = || FieldErrorKind::Invalid("has no CrediSIS code".into());
    if interest_code(p.interest.code).is_none() {
        errors.push("interest.code", unmapped());
    }
    if fine_or_discount_code(p.fine.code).is_none() {
        errors.push("fine.code", unmapped());
    }
    for (field, d) in [
        ("discount.code", &p.discount),
        ("second_discount.code", &p.second_discount),
        ("third_discount.code", &p.third_discount),
    ] {
        if fine_or_discount_code(d.code).is_none() {
            errors.push(field, unmapped());
        }
    }
    errors
}

impl RemittanceFormat for Credisis400 {
    const LINE_WIDTH: usize = 400;

    fn build(&self, r: &Remittance) -> Result<RemittanceFile> {
        self.check(r)?;

        let mut file = FileAssembler::new(Self::LINE_WIDTH);
        file.header(self.header(r)?)?;
        for p in &r.payments {
            file.detail("detail", self.detail(r, p, file.next_line_number())?)?;
            if !p.instructions.trim().is_empty() {
                file.detail(
                    "optional detail",
                    self.optional_detail(r, p, file.next_line_number())?,
                )?;
            }
        }
        file.trailer(self.trailer(file.next_line_number())?)?;
        file.finish()
    }
}
