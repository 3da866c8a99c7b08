//! Входные данные ремессы и сборщик файла фиксированной ширины.
//!
//! Порядок записей задаётся автоматом:
//! `Empty → HeaderWritten → (BatchOpen → BatchClosed)* → Complete`.
//! Плоские файлы (CNAB400) пишут детали сразу после заголовка.

use std::borrow::Cow;
use std::io::Write;

use chrono::NaiveDateTime;

use crate::bank::BankProfile;
use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};
use crate::fields::{digits_only, transliterate};
use crate::model::{Beneficiary, PaymentRecord};

pub const LINE_BREAK: &str = "\r\n";

/// Всё, что нужно для одного файла ремессы.
#[derive(Debug, Clone)]
pub struct Remittance {
    pub profile: BankProfile,
    pub beneficiary: Beneficiary,
    /// Порядковый номер файла у банка.
    pub sequence: u32,
    pub generated_at: NaiveDateTime,
    pub aceite: char,
    pub payments: Vec<PaymentRecord>,
}

impl Remittance {
    pub fn new(profile: BankProfile, beneficiary: Beneficiary, payments: Vec<PaymentRecord>) -> Self {
        Self {
            profile,
            beneficiary,
            sequence: 1,
            generated_at: chrono::Local::now().naive_local(),
            aceite: 'N',
            payments,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = at;
        self
    }

    /// Общие проверки файла: получатель и непустой список титулов.
    pub(crate) fn check_common(&self, errors: &mut ValidationErrors) {
        if self.beneficiary.name.trim().is_empty() {
            errors.push("beneficiary.name", FieldErrorKind::Missing);
        }
        let document = self.beneficiary.document.trim();
        if document.is_empty() {
            errors.push("beneficiary.document", FieldErrorKind::Missing);
        } else if digits_only(document).len() != document.len()
            || !matches!(document.len(), 11 | 14)
        {
            errors.push(
                "beneficiary.document",
                FieldErrorKind::Invalid("must be a CPF (11 digits) or CNPJ (14 digits)".into()),
            );
        }
        if self.payments.is_empty() {
            errors.push("payments", FieldErrorKind::Missing);
        }
    }

    /// Первый невалидный титул прерывает сборку целиком. Nosso número
    /// должен состоять из цифр и помещаться в `nosso_numero_width` раскладки.
    pub(crate) fn check_payments(
        &self,
        require_payer_number: bool,
        nosso_numero_width: usize,
    ) -> Result<()> {
        for payment in &self.payments {
            let mut checked = Cow::Borrowed(payment);
            if require_payer_number && !payment.require_payer_number {
                checked.to_mut().require_payer_number = true;
            }
            let mut errors = checked.validate().err().unwrap_or_default();
            let numero = checked.nosso_numero.trim();
            if !numero.is_empty() {
                if digits_only(numero).len() != numero.len() {
                    errors.push("nosso_numero", FieldErrorKind::NotNumeric);
                } else if numero.len() > nosso_numero_width {
                    errors.push("nosso_numero", FieldErrorKind::TooLong { max: nosso_numero_width });
                }
            }
            if !errors.is_empty() {
                return Err(CobrancaError::InvalidRemittance {
                    payment: Box::new(checked.into_owned()),
                    errors,
                });
            }
        }
        Ok(())
    }
}

/// Проверка ширины значения на уровне файла: не пусто, только цифры, не длиннее `max`.
pub(crate) fn check_digits(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, FieldErrorKind::Missing);
    } else if digits_only(value).len() != value.len() {
        errors.push(field, FieldErrorKind::NotNumeric);
    } else if value.len() > max {
        errors.push(field, FieldErrorKind::TooLong { max });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    HeaderWritten,
    BatchOpen,
    BatchClosed,
    Complete,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Empty => "empty",
            State::HeaderWritten => "after header",
            State::BatchOpen => "inside a batch",
            State::BatchClosed => "after a batch",
            State::Complete => "complete",
        }
    }
}

/// Накопитель строк файла. Каждая строка транслитерируется, переводится
/// в верхний регистр и сверяется с шириной записи.
#[derive(Debug)]
pub struct FileAssembler {
    width: usize,
    state: State,
    lines: Vec<String>,
    batches: usize,
    batch_lines: usize,
}

impl FileAssembler {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            state: State::Empty,
            lines: Vec::new(),
            batches: 0,
            batch_lines: 0,
        }
    }

    /// Номер следующей строки в файле, начиная с 1.
    pub fn next_line_number(&self) -> usize {
        self.lines.len() + 1
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches
    }

    /// Строк в текущем лоте, включая его заголовок.
    pub fn batch_line_count(&self) -> usize {
        self.batch_lines
    }

    pub fn header(&mut self, line: String) -> Result<()> {
        self.require_state("file header", &[State::Empty])?;
        self.push("file header", line)?;
        self.state = State::HeaderWritten;
        Ok(())
    }

    pub fn open_batch(&mut self, line: String) -> Result<()> {
        self.require_state("batch header", &[State::HeaderWritten, State::BatchClosed])?;
        self.push("batch header", line)?;
        self.batches += 1;
        self.batch_lines = 1;
        self.state = State::BatchOpen;
        Ok(())
    }

    pub fn detail(&mut self, record: &'static str, line: String) -> Result<()> {
        self.require_state(record, &[State::BatchOpen, State::HeaderWritten])?;
        self.push(record, line)?;
        if self.state == State::BatchOpen {
            self.batch_lines += 1;
        }
        Ok(())
    }

    pub fn close_batch(&mut self, line: String) -> Result<()> {
        self.require_state("batch trailer", &[State::BatchOpen])?;
        self.push("batch trailer", line)?;
        self.batch_lines += 1;
        self.state = State::BatchClosed;
        Ok(())
    }

    pub fn trailer(&mut self, line: String) -> Result<()> {
        self.require_state("file trailer", &[State::HeaderWritten, State::BatchClosed])?;
        self.push("file trailer", line)?;
        self.state = State::Complete;
        Ok(())
    }

    pub fn finish(self) -> Result<RemittanceFile> {
        self.require_state("end of file", &[State::Complete])?;
        tracing::debug!(
            lines = self.lines.len(),
            batches = self.batches,
            width = self.width,
            "remittance built"
        );
        Ok(RemittanceFile {
            width: self.width,
            lines: self.lines,
            batches: self.batches,
        })
    }

    fn require_state(&self, record: &'static str, allowed: &[State]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CobrancaError::RecordOrder {
                record,
                state: self.state.name(),
            })
        }
    }

    fn push(&mut self, record: &'static str, line: String) -> Result<()> {
        let line = transliterate(&line).to_uppercase();
        let actual = line.chars().count();
        if actual != self.width {
            return Err(CobrancaError::AssemblyInvariant {
                field: record,
                expected: self.width,
                actual,
            });
        }
        self.lines.push(line);
        Ok(())
    }
}

/// Готовый файл ремессы. После сборки не меняется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemittanceFile {
    width: usize,
    lines: Vec<String>,
    batches: usize,
}

impl RemittanceFile {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn batch_count(&self) -> usize {
        self.batches
    }

    /// Текст файла: строки через CRLF.
    pub fn to_text(&self) -> String {
        self.lines.join(LINE_BREAK)
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(self.to_text().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(c: char, width: usize) -> String {
        std::iter::repeat(c).take(width).collect()
    }

    #[test]
    fn batched_file_in_order() {
        let mut a = FileAssembler::new(10);
        a.header(line('0', 10)).unwrap();
        a.open_batch(line('1', 10)).unwrap();
        a.detail("segment p", line('3', 10)).unwrap();
        a.detail("segment q", line('3', 10)).unwrap();
        assert_eq!(a.batch_line_count(), 3);
        a.close_batch(line('5', 10)).unwrap();
        assert_eq!(a.batch_line_count(), 4);
        a.trailer(line('9', 10)).unwrap();
        let file = a.finish().unwrap();
        assert_eq!(file.lines().len(), 6);
        assert_eq!(file.batch_count(), 1);
        assert_eq!(file.to_text().matches("\r\n").count(), 5);
    }

    #[test]
    fn out_of_order_records_fail() {
        let mut a = FileAssembler::new(4);
        assert!(matches!(
            a.detail("detail", line('1', 4)),
            Err(CobrancaError::RecordOrder { state: "empty", .. })
        ));
        a.header(line('0', 4)).unwrap();
        assert!(a.close_batch(line('5', 4)).is_err());
        assert!(matches!(
            FileAssembler::new(4).finish(),
            Err(CobrancaError::RecordOrder { .. })
        ));
    }

    #[test]
    fn width_is_checked_after_transliteration() {
        let mut a = FileAssembler::new(6);
        a.header("josé  ".into()).unwrap();
        a.detail("detail", "ação  ".into()).unwrap();
        let err = a.detail("detail", "short".into()).unwrap_err();
        assert!(matches!(
            err,
            CobrancaError::AssemblyInvariant { field: "detail", expected: 6, actual: 5 }
        ));
        a.trailer(line('9', 6)).unwrap();
        let file = a.finish().unwrap();
        assert_eq!(file.lines()[0], "JOSE  ");
        assert_eq!(file.lines()[1], "ACAO  ");
    }
}
