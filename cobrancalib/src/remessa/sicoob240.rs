//! Ремесса CNAB240 Sicoob (756): заголовок файла, один лот с сегментами P/Q/R
//! на каждый титул, трейлер лота с итогами по портфелям, трейлер файла.

use rust_decimal::Decimal;

use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};
use crate::fields::{
    alpha, amount, blanks, date, digits_only, document_or_number, numeric, percentage, zeros,
    DateFormat,
};
use crate::model::PaymentRecord;
use crate::remessa::builder::{check_digits, FileAssembler, Remittance, RemittanceFile};
use crate::traits::RemittanceFormat;

const BANK_CODE: &str = "756";
const FILE_LAYOUT_VERSION: &str = "081";
const BATCH_LAYOUT_VERSION: &str = "040";
const MESSAGE_WIDTH: usize = 40;
const NOSSO_NUMERO_WIDTH: usize = 10;

/// Параметры раскладки, которые банк оставляет на выбор получателя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sicoob240 {
    pub modalidade: String,
    /// 1 — автокопия, 3 — автоконверт, 4 — A4, 6 — A4 в 3 экземплярах.
    pub tipo_formulario: char,
    pub parcela: String,
    /// 1 — печатает банк, 2 — получатель.
    pub emissao: char,
    /// 1 — рассылает банк, 2 — получатель.
    pub distribuicao: char,
    pub especie: String,
    pub forma_cadastramento: char,
    pub messages: [String; 2],
}

impl Default for Sicoob240 {
    fn default() -> Self {
        Self {
            modalidade: "01".into(),
            tipo_formulario: '4',
            parcela: "01".into(),
            emissao: '2',
            distribuicao: '2',
            especie: "02".into(),
            forma_cadastramento: '0',
            messages: [String::new(), String::new()],
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Total {
    pub count: u32,
    pub amount: Decimal,
}

impl Total {
    fn render(&self) -> Result<String> {
        Ok(format!(
            "{}{}",
            numeric("total.count", &self.count.to_string(), 6)?,
            amount("total.amount", self.amount, 17)?
        ))
    }
}

/// Итоги трейлера лота: простая, связанная, залоговая и дисконтная коллекции.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortfolioTotals {
    pub simple: Total,
    pub linked: Total,
    pub secured: Total,
    pub discounted: Total,
}

impl PortfolioTotals {
    pub fn add(&mut self, carteira: &str, value: Decimal) {
        let total = match carteira {
            "3" => &mut self.secured,
            _ => &mut self.simple,
        };
        total.count += 1;
        total.amount += value;
    }

    fn render(&self) -> Result<String> {
        let mut out = String::new();
        for total in [self.simple, self.linked, self.secured, self.discounted] {
            out.push_str(&total.render()?);
        }
        Ok(format!("{out:<217}"))
    }
}

impl Sicoob240 {
    fn check(&self, r: &Remittance) -> Result<()> {
        if r.profile.code() != BANK_CODE {
            return Err(CobrancaError::Unsupported("CNAB240 Sicoob layout needs bank 756"));
        }
        let mut errors = ValidationErrors::new();
        r.check_common(&mut errors);
        let agencia = r.beneficiary.agencia.trim();
        check_digits(&mut errors, "agencia", agencia, 4);
        if !agencia.is_empty() && agencia.len() < 4 {
            errors.push("agencia", FieldErrorKind::WrongLength { expected: 4 });
        }
        check_digits(&mut errors, "conta", &r.beneficiary.conta, 8);
        match r.beneficiary.conta_dv.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(dv) if dv.chars().count() != 1 => {
                errors.push("conta_dv", FieldErrorKind::TooLong { max: 1 })
            }
            Some(dv) if !dv.bytes().all(|b| b.is_ascii_digit()) => {
                errors.push("conta_dv", FieldErrorKind::NotNumeric)
            }
            Some(_) => {}
        }
        if self.modalidade.len() != 2 {
            errors.push("modalidade", FieldErrorKind::WrongLength { expected: 2 });
        }
        if self.parcela.len() != 2 {
            errors.push("parcela", FieldErrorKind::WrongLength { expected: 2 });
        }
        if !self.tipo_formulario.is_ascii_digit() {
            errors.push("tipo_formulario", FieldErrorKind::NotNumeric);
        }
        if r.sequence > 999_999 {
            errors.push("sequence", FieldErrorKind::TooLong { max: 6 });
        }
        errors.into_result().map_err(CobrancaError::Validation)?;
        r.check_payments(false, NOSSO_NUMERO_WIDTH)
    }

    fn conta_dv(&self, r: &Remittance) -> Result<String> {
        match r.beneficiary.conta_dv.as_deref().map(str::trim) {
            Some(dv) if !dv.is_empty() => Ok(dv.to_string()),
            _ => r
                .profile
                .spec()
                .conta_dv
                .compute("conta", &digits_only(&r.beneficiary.conta)),
        }
    }

    /// Агентство(5) DV(1) счёт(12) DV(1) пробел.
    fn info_conta(&self, r: &Remittance) -> Result<String> {
        let b = &r.beneficiary;
        Ok(format!(
            "{}{}{}{} ",
            numeric("agencia", &b.agencia, 5)?,
            r.profile.agencia_dv(&b.agencia)?,
            numeric("conta", &b.conta, 12)?,
            self.conta_dv(r)?
        ))
    }

    fn file_header(&self, r: &Remittance) -> Result<String> {
        let b = &r.beneficiary;
        let mut line = format!("{BANK_CODE}00000{}", blanks(9));
        line.push(b.kind().code());
        line.push_str(&numeric("beneficiary.document", &b.document, 14)?);
        line.push_str(&blanks(20));
        line.push_str(&self.info_conta(r)?);
        line.push_str(&alpha(&b.name, 30));
        line.push_str(&alpha("SICOOB", 30));
        line.push_str(&blanks(10));
        line.push('1');
        line.push_str(&r.generated_at.format("%d%m%Y%H%M%S").to_string());
        line.push_str(&numeric("sequence", &r.sequence.to_string(), 6)?);
        line.push_str(FILE_LAYOUT_VERSION);
        line.push_str("00000");
        line.push_str(&blanks(20));
        line.push_str(&blanks(20));
        line.push_str(&blanks(29));
        Ok(line)
    }

    fn batch_header(&self, r: &Remittance, lote: usize) -> Result<String> {
        let b = &r.beneficiary;
        let mut line = format!(
            "{BANK_CODE}{}1R01  {BATCH_LAYOUT_VERSION} ",
            numeric("lote", &lote.to_string(), 4)?
        );
        line.push(b.kind().code());
        line.push_str(&numeric("beneficiary.document", &b.document, 15)?);
        line.push_str(&blanks(20));
        line.push_str(&self.info_conta(r)?);
        line.push_str(&alpha(&b.name, 30));
        line.push_str(&alpha(&self.messages[0], MESSAGE_WIDTH));
        line.push_str(&alpha(&self.messages[1], MESSAGE_WIDTH));
        line.push_str(&numeric("sequence", &r.sequence.to_string(), 8)?);
        line.push_str(&date(Some(r.generated_at.date()), DateFormat::Long));
        line.push_str(&zeros(8));
        line.push_str(&blanks(33));
        Ok(line)
    }

    /// Общее начало сегментов: банк, лот, тип 3, номер, сегмент, код движения.
    fn segment_prefix(
        &self,
        lote: usize,
        seq: usize,
        segment: char,
        p: &PaymentRecord,
    ) -> Result<String> {
        Ok(format!(
            "{BANK_CODE}{}3{}{segment} {}",
            numeric("lote", &lote.to_string(), 4)?,
            numeric("sequencial", &seq.to_string(), 5)?,
            numeric("occurrence", &p.occurrence, 2)?
        ))
    }

    /// NumTitulo(10) parcela(2) modalidade(2) формуляр(1) пробелы(5).
    fn nosso_numero(&self, p: &PaymentRecord) -> Result<String> {
        Ok(format!(
            "{}{}{}{}{}",
            numeric("nosso_numero", &p.nosso_numero, NOSSO_NUMERO_WIDTH)?,
            self.parcela,
            self.modalidade,
            self.tipo_formulario,
            blanks(5)
        ))
    }

    fn segment_p(&self, r: &Remittance, p: &PaymentRecord, lote: usize, seq: usize) -> Result<String> {
        let b = &r.beneficiary;
        let mut line = self.segment_prefix(lote, seq, 'P', p)?;
        line.push_str(&numeric("agencia", &b.agencia, 5)?);
        line.push_str(&r.profile.agencia_dv(&b.agencia)?);
        line.push_str(&numeric("conta", &b.conta, 12)?);
        line.push_str(&self.conta_dv(r)?);
        line.push(' ');
        line.push_str(&self.nosso_numero(p)?);
        line.push_str(r.profile.carteira());
        line.push(self.forma_cadastramento);
        line.push(' ');
        line.push(self.emissao);
        line.push(self.distribuicao);
        line.push_str(&document_or_number(p.control_or_document_number(), 15, '0'));
        line.push_str(&date(p.due_date, DateFormat::Long));
        line.push_str(&amount("amount", p.amount, 15)?);
        line.push_str("00000 ");
        line.push_str(&numeric("especie", &self.especie, 2)?);
        line.push(r.aceite);
        line.push_str(&date(Some(p.issue_date), DateFormat::Long));
        // juros: код 0, без даты и суммы
        line.push('0');
        line.push_str(&zeros(8));
        line.push_str(&zeros(15));
        line.push(p.discount.code);
        line.push_str(&date(p.discount.date, DateFormat::Long));
        line.push_str(&amount("discount.amount", p.discount.amount, 15)?);
        line.push_str(&amount("iof", p.iof, 15)?);
        line.push_str(&amount("rebate", p.rebate, 15)?);
        line.push_str(&document_or_number(p.control_or_document_number(), 25, ' '));
        line.push(p.protest.code);
        line.push_str(&numeric("protest.days", &p.protest.days.to_string(), 2)?);
        line.push(p.write_off.code);
        line.push_str(&numeric("write_off.days", &p.write_off.days.to_string(), 3)?);
        line.push_str("09");
        line.push_str(&zeros(10));
        line.push(' ');
        Ok(line)
    }

    fn segment_q(&self, p: &PaymentRecord, lote: usize, seq: usize) -> Result<String> {
        let payer = &p.payer;
        let mut line = self.segment_prefix(lote, seq, 'Q', p)?;
        line.push(payer.kind().code());
        line.push_str(&numeric("payer.document", &payer.document, 15)?);
        line.push_str(&alpha(&payer.name, 40));
        line.push_str(&alpha(&payer.address.line(), 40));
        line.push_str(&alpha(&payer.address.district, 15));
        // CEP(5) и суффикс(3) идут подряд
        line.push_str(&numeric("payer.cep", &payer.address.cep, 8)?);
        line.push_str(&alpha(&payer.address.city, 15));
        line.push_str(&alpha(&payer.address.state, 2));
        match &p.guarantor {
            Some(g) => {
                line.push(p.guarantor_kind().map_or('0', |k| k.code()));
                line.push_str(&numeric("guarantor.document", &g.document, 15)?);
                line.push_str(&alpha(&g.name, 40));
            }
            None => {
                line.push('0');
                line.push_str(&zeros(15));
                line.push_str(&blanks(40));
            }
        }
        line.push_str("000");
        line.push_str(&blanks(20));
        line.push_str(&blanks(8));
        Ok(line)
    }

    fn segment_r(&self, p: &PaymentRecord, lote: usize, seq: usize) -> Result<String> {
        let mut line = self.segment_prefix(lote, seq, 'R', p)?;
        for (field, d) in [
            ("second_discount.amount", &p.second_discount),
            ("third_discount.amount", &p.third_discount),
        ] {
            line.push(d.code);
            line.push_str(&date(d.date, DateFormat::Long));
            line.push_str(&amount(field, d.amount, 15)?);
        }
        line.push(p.fine.code);
        line.push_str(&date(p.fine.date, DateFormat::Long));
        line.push_str(&percentage("fine.percentage", p.fine.percentage, 15)?);
        line.push_str(&blanks(10));
        line.push_str(&instruction_line(&p.instructions, 0));
        line.push_str(&instruction_line(&p.instructions, 1));
        line.push_str(&blanks(20));
        line.push_str(&zeros(8));
        // данные дебета в счёте: не используются
        line.push_str("000");
        line.push_str(&zeros(5));
        line.push('0');
        line.push_str(&zeros(12));
        line.push_str("000");
        line.push_str(&blanks(9));
        Ok(line)
    }

    fn batch_trailer(&self, lote: usize, records: usize, totals: &PortfolioTotals) -> Result<String> {
        Ok(format!(
            "{BANK_CODE}{}5{}{}{}",
            numeric("lote", &lote.to_string(), 4)?,
            blanks(9),
            numeric("batch.records", &records.to_string(), 6)?,
            totals.render()?
        ))
    }

    fn file_trailer(&self, batches: usize, lines: usize) -> Result<String> {
        Ok(format!(
            "{BANK_CODE}99999{}{}{}{}{}",
            blanks(9),
            numeric("file.batches", &batches.to_string(), 6)?,
            numeric("file.records", &lines.to_string(), 6)?,
            zeros(6),
            blanks(205)
        ))
    }
}

/// Строка `index` свободного текста по 40 символов.
fn instruction_line(text: &str, index: usize) -> String {
    let chunk: String = text
        .chars()
        .skip(index * MESSAGE_WIDTH)
        .take(MESSAGE_WIDTH)
        .collect();
    alpha(&chunk, MESSAGE_WIDTH)
}

impl RemittanceFormat for Sicoob240 {
    const LINE_WIDTH: usize = 240;

    fn build(&self, r: &Remittance) -> Result<RemittanceFile> {
        self.check(r)?;

        let mut file = FileAssembler::new(Self::LINE_WIDTH);
        file.header(self.file_header(r)?)?;

        let lote = 1;
        file.open_batch(self.batch_header(r, lote)?)?;
        let mut totals = PortfolioTotals::default();
        let mut seq = 1;
        for p in &r.payments {
            file.detail("segment p", self.segment_p(r, p, lote, seq)?)?;
            file.detail("segment q", self.segment_q(p, lote, seq + 1)?)?;
            file.detail("segment r", self.segment_r(p, lote, seq + 2)?)?;
            seq += 3;
            totals.add(r.profile.carteira(), p.amount);
        }
        let records = file.batch_line_count() + 1;
        file.close_batch(self.batch_trailer(lote, records, &totals)?)?;

        let lines = file.line_count() + 1;
        file.trailer(self.file_trailer(file.batch_count(), lines)?)?;
        file.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_render_four_groups() {
        let mut t = PortfolioTotals::default();
        t.add("1", dec!(50));
        let out = t.render().unwrap();
        assert_eq!(out.len(), 217);
        assert!(out.starts_with("00000100000000000005000"));
        assert_eq!(&out[23..92], "0".repeat(69));
        assert!(out[92..].chars().all(|c| c == ' '));

        t.add("3", dec!(10.5));
        assert_eq!(t.secured, Total { count: 1, amount: dec!(10.5) });
    }

    #[test]
    fn instructions_are_split_in_40_char_lines() {
        let text = "a".repeat(40) + "b";
        assert_eq!(instruction_line(&text, 0), "a".repeat(40));
        assert_eq!(instruction_line(&text, 1), format!("b{}", " ".repeat(39)));
        assert_eq!(instruction_line("", 1), " ".repeat(40));
    }
}
