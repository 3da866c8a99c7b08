//! Разбор строк фиксированной ширины по раскладке (имя, начало, конец).
//!
//! Смещения 0-based и включают оба конца: `(37, 56)` — 20 символов.
//! Содержимое полей не проверяется; короткая строка — [`CobrancaError::TruncatedRecord`].

use std::io::BufRead;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{CobrancaError, Result};
use crate::fields::{parse_cents, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
}

impl FieldSpec {
    /// Для постоянных таблиц: перевёрнутые границы ломают сборку константы.
    /// Раскладки, собираемые во время работы, идут через [`FieldSpec::try_new`].
    pub const fn new(name: &'static str, start: usize, end: usize) -> Self {
        assert!(start <= end, "field ends before it starts");
        Self { name, start, end }
    }

    pub fn try_new(name: &'static str, start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(CobrancaError::InvalidLayout {
                field: name,
                start,
                end,
            });
        }
        Ok(Self { name, start, end })
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Строка, которую нужно пропустить: `Head(0)` — первая, `Tail(0)` — последняя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Head(usize),
    Tail(usize),
}

impl LineRef {
    fn resolve(self, total: usize) -> Option<usize> {
        match self {
            LineRef::Head(i) => (i < total).then_some(i),
            LineRef::Tail(i) => total.checked_sub(i + 1),
        }
    }
}

/// Одна разобранная строка: поля в порядке раскладки.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnRecord {
    line: usize,
    fields: Vec<(&'static str, String)>,
}

impl ReturnRecord {
    /// Номер строки в файле, с 1.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(n, _)| *n).collect()
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| CobrancaError::Parse(format!("line {}: no field {name}", self.line)))
    }

    /// Сумма из поля в сотых.
    pub fn amount(&self, name: &str) -> Result<Decimal> {
        parse_cents(name, self.require(name)?)
    }

    /// Дата DDMMAA или DDMMAAAA; нули — `None`.
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>> {
        parse_date(name, self.require(name)?)
    }

    /// Добавляет поля другой записи (сегмент U к сегменту T); повторные имена пропускаются.
    pub(crate) fn merge(&mut self, other: ReturnRecord) {
        for (name, value) in other.fields {
            if self.get(name).is_none() {
                self.fields.push((name, value));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLayout {
    fields: Vec<FieldSpec>,
    skip: Vec<LineRef>,
}

impl LineLayout {
    pub fn new(fields: impl Into<Vec<FieldSpec>>) -> Self {
        Self {
            fields: fields.into(),
            skip: Vec::new(),
        }
    }

    pub fn skipping(mut self, lines: impl IntoIterator<Item = LineRef>) -> Self {
        self.skip.extend(lines);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Минимальная длина строки, которую покрывает раскладка.
    pub fn required_len(&self) -> usize {
        self.fields.iter().map(|f| f.end + 1).max().unwrap_or(0)
    }

    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<ReturnRecord> {
        let chars: Vec<char> = line.chars().collect();
        let expected = self.required_len();
        if chars.len() < expected {
            return Err(CobrancaError::TruncatedRecord {
                line: line_no,
                expected,
                actual: chars.len(),
            });
        }
        let fields = self
            .fields
            .iter()
            .map(|f| (f.name, chars[f.start..=f.end].iter().collect()))
            .collect();
        Ok(ReturnRecord {
            line: line_no,
            fields,
        })
    }

    /// Разбирает весь поток, пропуская пустые строки и строки из `skip`.
    pub fn parse<R: BufRead>(&self, r: R) -> Result<Vec<ReturnRecord>> {
        let lines = read_lines(r)?;
        let skipped: Vec<usize> = self
            .skip
            .iter()
            .filter_map(|s| s.resolve(lines.len()))
            .collect();
        let mut records = Vec::with_capacity(lines.len());
        for (i, (line_no, line)) in lines.iter().enumerate() {
            if skipped.contains(&i) {
                continue;
            }
            records.push(self.parse_line(*line_no, line)?);
        }
        tracing::debug!(records = records.len(), "return file parsed");
        Ok(records)
    }
}

/// Непустые строки с номерами (с 1), без `\r` в конце.
pub(crate) fn read_lines<R: BufRead>(r: R) -> Result<Vec<(usize, String)>> {
    let mut out = Vec::new();
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            out.push((i + 1, line.to_string()));
        }
    }
    Ok(out)
}
