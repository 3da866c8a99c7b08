//! Форматирование полей фиксированной ширины и транслитерация в 7-битный алфавит.
//!
//! Числовые идентификаторы дополняются нулями слева и не усекаются:
//! переполнение — [`CobrancaError::FieldTooLong`]. Текст дополняется пробелами
//! справа и обрезается до ширины.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};

static NOT_DOCUMENT_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z ]").expect("static regex"));

/// Формат даты в записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// DDMMAA
    Short,
    /// DDMMAAAA
    Long,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Short => "%d%m%y",
            DateFormat::Long => "%d%m%Y",
        }
    }

    fn width(self) -> usize {
        match self {
            DateFormat::Short => 6,
            DateFormat::Long => 8,
        }
    }
}

/// Транслитерация: диакритика снимается, символы вне печатного ASCII выбрасываются.
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dropped = 0usize;
    for c in s.chars() {
        if c == ' ' || c.is_ascii_graphic() {
            out.push(c);
        } else if let Some(folded) = fold(c) {
            out.push_str(folded);
        } else if c.is_whitespace() {
            out.push(' ');
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, input = s, "characters outside the file alphabet were dropped");
    }
    out
}

fn fold(c: char) -> Option<&'static str> {
    let s = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' | 'ª' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ð' | 'Ď' => "D",
        'ð' | 'ď' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' | 'º' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' | 'Ş' => "S",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        '‘' | '’' | '´' | '`' => "'",
        '“' | '”' => "\"",
        '–' | '—' => "-",
        _ => return None,
    };
    Some(s)
}

pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn blanks(width: usize) -> String {
    " ".repeat(width)
}

pub fn zeros(width: usize) -> String {
    "0".repeat(width)
}

/// Числовой идентификатор: ровно `width` цифр, нули слева. Пустое значение даёт нули.
pub fn numeric(field: &'static str, value: &str, width: usize) -> Result<String> {
    let value = value.trim();
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        let mut errors = ValidationErrors::new();
        errors.push(field, FieldErrorKind::NotNumeric);
        return Err(CobrancaError::Validation(errors));
    }
    let len = value.len();
    if len > width {
        return Err(CobrancaError::FieldTooLong {
            field,
            width,
            value: value.to_string(),
        });
    }
    Ok(format!("{}{value}", zeros(width - len)))
}

/// Текстовое поле: транслитерация, обрезка до ширины, пробелы справа.
pub fn alpha(value: &str, width: usize) -> String {
    let ascii = transliterate(value.trim());
    let len = ascii.chars().count();
    if len > width {
        tracing::warn!(width, len, "text field truncated");
        ascii.chars().take(width).collect()
    } else {
        format!("{ascii}{}", blanks(width - len))
    }
}

/// Номер документа: только `[0-9A-Za-z ]`, выравнивание вправо символом `fill`,
/// берутся первые `width` символов.
pub fn document_or_number(value: &str, width: usize, fill: char) -> String {
    let cleaned = NOT_DOCUMENT_CHAR.replace_all(value, "");
    let len = cleaned.chars().count();
    let padded: String = if len < width {
        std::iter::repeat(fill).take(width - len).chain(cleaned.chars()).collect()
    } else {
        cleaned.into_owned()
    };
    padded.chars().take(width).collect()
}

/// Денежная сумма в сотых, нули слева.
pub fn amount(field: &'static str, value: Decimal, width: usize) -> Result<String> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut errors = ValidationErrors::new();
        errors.push(field, FieldErrorKind::OutOfRange);
        return Err(CobrancaError::Validation(errors));
    }
    let mut cents = value.round_dp(2);
    cents.rescale(2);
    numeric(field, &cents.mantissa().to_string(), width)
}

/// Процент с двумя знаками после запятой, та же упаковка, что у суммы.
pub fn percentage(field: &'static str, value: Decimal, width: usize) -> Result<String> {
    amount(field, value, width)
}

/// Дата или нули нужной ширины, если даты нет.
pub fn date(value: Option<NaiveDate>, format: DateFormat) -> String {
    match value {
        Some(d) => d.format(format.pattern()).to_string(),
        None => zeros(format.width()),
    }
}

/// Разбор суммы в сотых из поля возврата.
pub fn parse_cents(field: &str, raw: &str) -> Result<Decimal> {
    let digits = raw.trim();
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let cents: i64 = digits
        .parse()
        .map_err(|e| CobrancaError::Parse(format!("{field}: {e}")))?;
    Ok(Decimal::new(cents, 2))
}

/// Разбор даты DDMMAA или DDMMAAAA; нули означают «даты нет».
pub fn parse_date(field: &str, raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().all(|c| c == '0') {
        return Ok(None);
    }
    let pattern = match raw.len() {
        6 => DateFormat::Short.pattern(),
        8 => DateFormat::Long.pattern(),
        n => return Err(CobrancaError::Parse(format!("{field}: unexpected date width {n}"))),
    };
    NaiveDate::parse_from_str(raw, pattern)
        .map(Some)
        .map_err(|e| CobrancaError::Parse(format!("{field}: {e}")))
}
