//! CSV-обмен. Титулы читаются по заголовкам:
//! nosso_numero,amount,due_date,issue_date,control_number,document_number,title_kind,occurrence,
//! payer_document,payer_name,payer_street,payer_number,payer_complement,payer_district,payer_cep,
//! payer_city,payer_state,guarantor_document,guarantor_name,discount_code,discount_date,
//! discount_amount,fine_code,fine_date,fine_percentage,interest_code,interest_date,interest_amount,
//! iof,rebate,protest_code,protest_days,write_off_code,write_off_days,instructions
//!
//! Обязательны только nosso_numero и amount; остальное пустое допустимо и
//! проверяется уже валидацией титула. Ретурн пишется в CSV с полями раскладки.

use crate::{
    error::{CobrancaError, Result},
    model::{Address, Discount, Fine, Guarantor, Instruction, Interest, Payer, PaymentRecord},
    retorno::layout::ReturnRecord,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};

#[derive(serde::Deserialize)]
struct CsvRow {
    nosso_numero: String,
    amount: String,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    issue_date: Option<String>,
    #[serde(default)]
    control_number: Option<String>,
    #[serde(default)]
    document_number: Option<String>,
    #[serde(default)]
    title_kind: Option<String>,
    #[serde(default)]
    occurrence: Option<String>,

    #[serde(default)]
    payer_document: String,
    #[serde(default)]
    payer_name: String,
    #[serde(default)]
    payer_street: String,
    #[serde(default)]
    payer_number: String,
    #[serde(default)]
    payer_complement: String,
    #[serde(default)]
    payer_district: String,
    #[serde(default)]
    payer_cep: String,
    #[serde(default)]
    payer_city: String,
    #[serde(default)]
    payer_state: String,

    #[serde(default)]
    guarantor_document: Option<String>,
    #[serde(default)]
    guarantor_name: Option<String>,

    #[serde(default)]
    discount_code: Option<String>,
    #[serde(default)]
    discount_date: Option<String>,
    #[serde(default)]
    discount_amount: Option<String>,
    #[serde(default)]
    fine_code: Option<String>,
    #[serde(default)]
    fine_date: Option<String>,
    #[serde(default)]
    fine_percentage: Option<String>,
    #[serde(default)]
    interest_code: Option<String>,
    #[serde(default)]
    interest_date: Option<String>,
    #[serde(default)]
    interest_amount: Option<String>,

    #[serde(default)]
    iof: Option<String>,
    #[serde(default)]
    rebate: Option<String>,
    #[serde(default)]
    protest_code: Option<String>,
    #[serde(default)]
    protest_days: Option<String>,
    #[serde(default)]
    write_off_code: Option<String>,
    #[serde(default)]
    write_off_days: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
}

fn filled(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn decimal(field: &str, v: Option<String>) -> Result<Decimal> {
    match filled(v) {
        Some(s) => s
            .parse::<Decimal>()
            .map_err(|e| CobrancaError::Parse(format!("{field}: {e}"))),
        None => Ok(Decimal::ZERO),
    }
}

fn iso_date(field: &str, v: Option<String>) -> Result<Option<NaiveDate>> {
    match filled(v) {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| CobrancaError::Parse(format!("{field}: {e}"))),
        None => Ok(None),
    }
}

fn code(v: Option<String>, default: char) -> char {
    filled(v).and_then(|s| s.chars().next()).unwrap_or(default)
}

fn days(field: &str, v: Option<String>) -> Result<u32> {
    match filled(v) {
        Some(s) => s
            .parse()
            .map_err(|e| CobrancaError::Parse(format!("{field}: {e}"))),
        None => Ok(0),
    }
}

impl CsvRow {
    fn into_payment(self) -> Result<PaymentRecord> {
        let payer = Payer {
            document: self.payer_document,
            name: self.payer_name,
            address: Address {
                street: self.payer_street,
                number: self.payer_number,
                complement: self.payer_complement,
                district: self.payer_district,
                cep: self.payer_cep,
                city: self.payer_city,
                state: self.payer_state,
            },
        };
        let amount = self
            .amount
            .trim()
            .parse::<Decimal>()
            .map_err(|e| CobrancaError::Parse(format!("amount: {e}")))?;
        let due_date = iso_date("due_date", self.due_date)?;

        // срок может отсутствовать: это ошибка валидации титула, а не разбора
        let mut p = PaymentRecord::new(self.nosso_numero.trim(), amount, NaiveDate::MIN, payer);
        p.due_date = due_date;
        if let Some(d) = iso_date("issue_date", self.issue_date)? {
            p.issue_date = d;
        }
        p.control_number = filled(self.control_number);
        p.document_number = filled(self.document_number);
        p.title_kind = filled(self.title_kind);
        if let Some(o) = filled(self.occurrence) {
            p.occurrence = o;
        }
        p.guarantor = match (filled(self.guarantor_document), filled(self.guarantor_name)) {
            (None, None) => None,
            (document, name) => Some(Guarantor {
                document: document.unwrap_or_default(),
                name: name.unwrap_or_default(),
            }),
        };
        p.discount = Discount {
            code: code(self.discount_code, '0'),
            date: iso_date("discount_date", self.discount_date)?,
            amount: decimal("discount_amount", self.discount_amount)?,
        };
        p.fine = Fine {
            code: code(self.fine_code, '0'),
            date: iso_date("fine_date", self.fine_date)?,
            percentage: decimal("fine_percentage", self.fine_percentage)?,
        };
        p.interest = Interest {
            code: code(self.interest_code, '3'),
            date: iso_date("interest_date", self.interest_date)?,
            amount: decimal("interest_amount", self.interest_amount)?,
        };
        p.iof = decimal("iof", self.iof)?;
        p.rebate = decimal("rebate", self.rebate)?;
        p.protest = Instruction {
            code: code(self.protest_code, Instruction::NO_PROTEST.code),
            days: days("protest_days", self.protest_days)?,
        };
        p.write_off = Instruction {
            code: code(self.write_off_code, Instruction::NO_WRITE_OFF.code),
            days: days("write_off_days", self.write_off_days)?,
        };
        p.instructions = filled(self.instructions).unwrap_or_default();
        Ok(p)
    }
}

pub struct Csv;

impl Csv {
    pub fn read_payments<R: BufRead>(r: R) -> Result<Vec<PaymentRecord>> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(r);
        let mut payments = Vec::new();
        for rec in rdr.deserialize::<CsvRow>() {
            payments.push(rec?.into_payment()?);
        }
        Ok(payments)
    }

    /// Колонка `line`, затем поля в порядке раскладки первой записи.
    pub fn write_returns<W: Write>(mut w: W, records: &[ReturnRecord]) -> Result<()> {
        let mut wrt = WriterBuilder::new().from_writer(&mut w);
        if let Some(first) = records.first() {
            let mut header = vec!["line"];
            header.extend(first.names());
            wrt.write_record(&header)?;
        }
        for rec in records {
            let mut row = vec![rec.line().to_string()];
            row.extend(rec.fields().map(|(_, v)| v.trim().to_string()));
            wrt.write_record(&row)?;
        }
        wrt.flush()?;
        Ok(())
    }
}
