//! Профили банков: ширины полей, правила DV, раскладка «campo livre».
//!
//! Банк описывается значением [`BankSpec`], а не типом. Порядок полей в
//! campo livre и в nosso número задаётся таблицей [`Part`].

use crate::checksum::{
    dual_digit, eleven_minus, eleven_minus_or_invalid, mod10, remainder, Direction, Mod11,
    WEIGHTS_2_7, WEIGHTS_2_8, WEIGHTS_2_9, WEIGHTS_3_1_9_7, WEIGHTS_9_2,
};
use crate::error::{CobrancaError, FieldErrorKind, Result, ValidationErrors};
use crate::fields::{digits_only, numeric};

/// Ширина campo livre в штрихкоде.
pub const FREE_FIELD_WIDTH: usize = 25;

/// Правило контрольной цифры поля.
#[derive(Debug, Clone, Copy)]
pub enum DvRule {
    Mod10,
    Mod11(Mod11),
    /// Две цифры: mod10, затем mod11 поверх (см. [`dual_digit`]).
    Dual(Mod11),
}

impl DvRule {
    /// DV для `digits`. Если правило не даёт допустимой цифры — ошибка валидации поля.
    pub fn compute(&self, field: &'static str, digits: &str) -> Result<String> {
        let dv = match self {
            DvRule::Mod10 => Some(mod10(digits).to_string()),
            DvRule::Mod11(rule) => rule.digit(digits).map(String::from),
            DvRule::Dual(rule) => dual_digit(digits, rule),
        };
        dv.ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.push(field, FieldErrorKind::Invalid("has no valid check digit".into()));
            CobrancaError::Validation(errors)
        })
    }
}

/// Кусок раскладки: литерал или поле титула, уже выровненное по ширине банка.
#[derive(Debug, Clone, Copy)]
pub enum Part {
    Literal(&'static str),
    BankCode,
    Carteira,
    Agencia,
    Conta,
    Convenio,
    Numero,
    /// Вложенная часть, дополненная нулями до другой ширины.
    Wide(usize, &'static Part),
    ConvenioDv,
    NossoNumeroDv,
    /// DV документа получателя (CPF/CNPJ).
    DocumentDv,
}

/// Как собирается campo livre.
#[derive(Debug, Clone, Copy)]
pub enum FreeField {
    Concat(&'static [Part]),
    /// Части, за которыми следует DV по их же цифрам.
    Checked { parts: &'static [Part], check: DvRule },
}

/// Приведение введённого значения до выравнивания.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    AsIs,
    /// Длиннее `n` — берутся последние `n` символов.
    KeepLast(usize),
    /// Длиннее `keep` — отбросить `drop` символов справа и взять последние `keep`.
    DropThenKeepLast { drop: usize, keep: usize },
}

impl Normalize {
    fn apply(self, value: &str) -> String {
        let chars: Vec<char> = value.trim().chars().collect();
        match self {
            Normalize::KeepLast(n) if chars.len() > n => chars[chars.len() - n..].iter().collect(),
            Normalize::DropThenKeepLast { drop, keep } if chars.len() > keep => {
                let end = chars.len().saturating_sub(drop);
                let start = end.saturating_sub(keep);
                chars[start..end].iter().collect()
            }
            _ => chars.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidths {
    pub agencia: usize,
    pub conta: usize,
    pub convenio: usize,
    pub carteira: usize,
    pub numero: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct NossoNumeroRule {
    pub layout: &'static [Part],
    pub dv_input: &'static [Part],
    pub dv: DvRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NossoNumeroStyle {
    /// `NNN-D`
    Dashed,
    /// Номер без DV.
    Plain,
    /// `NNN-D   CC`
    DashedWithWallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgenciaContaStyle {
    /// `AAAA.DD / CCCCCCC-DD`
    AgenciaDvConvenioDv,
    /// `AAAA / CCCCCCC`
    AgenciaConvenio,
    /// `AAAA-D / CCCCCCC-D`
    AgenciaDvContaDv,
    /// `AAAA/CCCCCCC-D`
    AgenciaConvenioDv,
}

/// Постоянные банка. Один статический экземпляр на банк.
#[derive(Debug)]
pub struct BankSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub widths: FieldWidths,
    pub carteiras: &'static [&'static str],
    pub default_carteira: &'static str,
    pub agencia_input: Normalize,
    pub convenio_input: Normalize,
    pub agencia_dv: DvRule,
    pub conta_dv: DvRule,
    pub convenio_dv: DvRule,
    pub document_dv: Option<DvRule>,
    pub nosso_numero: NossoNumeroRule,
    pub free_field: FreeField,
    pub nosso_numero_style: NossoNumeroStyle,
    pub agencia_conta_style: AgenciaContaStyle,
}

const BANRISUL_SECOND: Mod11 = Mod11::new(WEIGHTS_2_7).with_transform(eleven_minus_or_invalid);
const ZERO_FOR_10_11: &[(u32, char)] = &[(10, '0'), (11, '0')];
// веса 9..2, остаток от деления на 11
const WEIGHTED_REMAINDER: Mod11 = Mod11::new(WEIGHTS_9_2).with_transform(remainder);
const WEIGHTED_REMAINDER_ZERO: Mod11 = WEIGHTED_REMAINDER.with_map(&[(10, '0')]);
const CREDISIS_MOD11: Mod11 = WEIGHTED_REMAINDER.with_map(&[(0, '1'), (10, '1'), (11, '1')]);
const BRB_MOD11: Mod11 = Mod11::new(WEIGHTS_2_9)
    .with_transform(eleven_minus)
    .with_map(ZERO_FOR_10_11);

pub static BANRISUL: BankSpec = BankSpec {
    code: "041",
    name: "BANRISUL",
    widths: FieldWidths {
        agencia: 4,
        conta: 8,
        convenio: 7,
        carteira: 1,
        numero: 8,
    },
    carteiras: &["1"],
    default_carteira: "1",
    agencia_input: Normalize::AsIs,
    convenio_input: Normalize::DropThenKeepLast { drop: 2, keep: 7 },
    agencia_dv: DvRule::Dual(BANRISUL_SECOND),
    conta_dv: DvRule::Dual(BANRISUL_SECOND),
    convenio_dv: DvRule::Dual(BANRISUL_SECOND),
    document_dv: None,
    nosso_numero: NossoNumeroRule {
        layout: &[Part::Numero],
        dv_input: &[Part::Numero],
        dv: DvRule::Dual(BANRISUL_SECOND),
    },
    // "2" — код продукта для carteira 1, "40" — постоянный хвост банка
    free_field: FreeField::Checked {
        parts: &[
            Part::Literal("2"),
            Part::Carteira,
            Part::Agencia,
            Part::Convenio,
            Part::Numero,
            Part::Literal("40"),
        ],
        check: DvRule::Dual(BANRISUL_SECOND),
    },
    nosso_numero_style: NossoNumeroStyle::Dashed,
    agencia_conta_style: AgenciaContaStyle::AgenciaDvConvenioDv,
};

pub static SICOOB: BankSpec = BankSpec {
    code: "756",
    name: "SICOOB",
    widths: FieldWidths {
        agencia: 4,
        conta: 7,
        convenio: 7,
        carteira: 1,
        numero: 7,
    },
    carteiras: &["1", "3"],
    default_carteira: "1",
    agencia_input: Normalize::AsIs,
    convenio_input: Normalize::AsIs,
    agencia_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    conta_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    convenio_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    document_dv: None,
    nosso_numero: NossoNumeroRule {
        layout: &[Part::Numero],
        dv_input: &[Part::Agencia, Part::Wide(10, &Part::Convenio), Part::Numero],
        dv: DvRule::Mod11(
            Mod11::new(WEIGHTS_3_1_9_7)
                .with_direction(Direction::LeftToRight)
                .with_map(ZERO_FOR_10_11),
        ),
    },
    // модалидаде "01", парцела "001"
    free_field: FreeField::Concat(&[
        Part::Carteira,
        Part::Agencia,
        Part::Literal("01"),
        Part::Convenio,
        Part::Numero,
        Part::NossoNumeroDv,
        Part::Literal("001"),
    ]),
    nosso_numero_style: NossoNumeroStyle::Dashed,
    agencia_conta_style: AgenciaContaStyle::AgenciaConvenio,
};

pub static CREDISIS: BankSpec = BankSpec {
    code: "097",
    name: "CENTRALCREDI",
    widths: FieldWidths {
        agencia: 4,
        conta: 7,
        convenio: 6,
        carteira: 2,
        numero: 6,
    },
    carteiras: &["18"],
    default_carteira: "18",
    agencia_input: Normalize::AsIs,
    convenio_input: Normalize::AsIs,
    agencia_dv: DvRule::Mod11(CREDISIS_MOD11),
    conta_dv: DvRule::Mod11(CREDISIS_MOD11),
    convenio_dv: DvRule::Mod11(CREDISIS_MOD11),
    document_dv: Some(DvRule::Mod11(CREDISIS_MOD11)),
    nosso_numero: NossoNumeroRule {
        layout: &[
            Part::BankCode,
            Part::DocumentDv,
            Part::Agencia,
            Part::Convenio,
            Part::Numero,
        ],
        dv_input: &[Part::Numero],
        dv: DvRule::Mod11(CREDISIS_MOD11),
    },
    free_field: FreeField::Concat(&[
        Part::Literal("00000"),
        Part::BankCode,
        Part::DocumentDv,
        Part::Agencia,
        Part::Convenio,
        Part::Numero,
    ]),
    nosso_numero_style: NossoNumeroStyle::Plain,
    agencia_conta_style: AgenciaContaStyle::AgenciaDvContaDv,
};

pub static BRB: BankSpec = BankSpec {
    code: "070",
    name: "BRB",
    widths: FieldWidths {
        agencia: 3,
        conta: 7,
        convenio: 7,
        carteira: 1,
        numero: 6,
    },
    carteiras: &["1", "2"],
    default_carteira: "2",
    agencia_input: Normalize::KeepLast(3),
    convenio_input: Normalize::AsIs,
    agencia_dv: DvRule::Mod11(BRB_MOD11),
    conta_dv: DvRule::Mod11(BRB_MOD11),
    convenio_dv: DvRule::Mod11(BRB_MOD11),
    document_dv: None,
    nosso_numero: NossoNumeroRule {
        layout: &[Part::Carteira, Part::Literal("00000"), Part::Numero],
        dv_input: &[Part::Carteira, Part::Literal("00000"), Part::Numero],
        dv: DvRule::Mod11(BRB_MOD11),
    },
    // "chave": 000 + agência + conta + carteira + número + banco, затем mod10 и mod11
    free_field: FreeField::Checked {
        parts: &[
            Part::Literal("000"),
            Part::Agencia,
            Part::Conta,
            Part::Carteira,
            Part::Numero,
            Part::BankCode,
        ],
        check: DvRule::Dual(Mod11::new(WEIGHTS_2_7).with_map(ZERO_FOR_10_11)),
    },
    nosso_numero_style: NossoNumeroStyle::Dashed,
    agencia_conta_style: AgenciaContaStyle::AgenciaConvenioDv,
};

pub static BANCO_DO_NORDESTE: BankSpec = BankSpec {
    code: "004",
    name: "BANCO DO NORDESTE",
    widths: FieldWidths {
        agencia: 4,
        conta: 7,
        convenio: 7,
        carteira: 2,
        numero: 7,
    },
    carteiras: &["21", "41", "51"],
    default_carteira: "21",
    agencia_input: Normalize::AsIs,
    convenio_input: Normalize::AsIs,
    agencia_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    conta_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    convenio_dv: DvRule::Mod11(WEIGHTED_REMAINDER_ZERO),
    document_dv: None,
    nosso_numero: NossoNumeroRule {
        layout: &[Part::Numero],
        dv_input: &[Part::Numero],
        dv: DvRule::Mod11(Mod11::new(WEIGHTS_2_8).with_map(ZERO_FOR_10_11)),
    },
    free_field: FreeField::Concat(&[
        Part::Agencia,
        Part::Convenio,
        Part::ConvenioDv,
        Part::Numero,
        Part::NossoNumeroDv,
        Part::Carteira,
        Part::Literal("000"),
    ]),
    nosso_numero_style: NossoNumeroStyle::DashedWithWallet,
    agencia_conta_style: AgenciaContaStyle::AgenciaConvenioDv,
};

pub static BANKS: &[&BankSpec] = &[&BANRISUL, &SICOOB, &CREDISIS, &BRB, &BANCO_DO_NORDESTE];

pub fn lookup(code: &str) -> Option<&'static BankSpec> {
    BANKS.iter().copied().find(|b| b.code == code.trim())
}

/// Идентификаторы одного титула, как их ввёл пользователь.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identifiers<'a> {
    pub agencia: &'a str,
    pub conta: &'a str,
    pub convenio: &'a str,
    pub numero: &'a str,
    /// CPF/CNPJ получателя.
    pub document: &'a str,
}

/// Банк + carteira. Carteira проверяется при создании и дальше не меняется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankProfile {
    spec: &'static BankSpec,
    carteira: String,
}

impl PartialEq for BankSpec {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for BankSpec {}

impl BankProfile {
    pub fn new(spec: &'static BankSpec, carteira: &str) -> Result<Self> {
        let carteira = carteira.trim();
        let padded = if carteira.len() < spec.widths.carteira {
            format!("{carteira:0>width$}", width = spec.widths.carteira)
        } else {
            carteira.to_string()
        };
        if !spec.carteiras.contains(&padded.as_str()) {
            return Err(CobrancaError::UnsupportedWalletCode {
                bank: spec.code,
                carteira: carteira.to_string(),
            });
        }
        Ok(Self {
            spec,
            carteira: padded,
        })
    }

    /// Профиль по коду банка; без carteira берётся carteira банка по умолчанию.
    pub fn for_code(code: &str, carteira: Option<&str>) -> Result<Self> {
        let spec = lookup(code).ok_or(CobrancaError::Unsupported("bank code"))?;
        Self::new(spec, carteira.unwrap_or(spec.default_carteira))
    }

    pub fn spec(&self) -> &'static BankSpec {
        self.spec
    }

    pub fn code(&self) -> &'static str {
        self.spec.code
    }

    pub fn carteira(&self) -> &str {
        &self.carteira
    }

    pub fn pad_agencia(&self, value: &str) -> Result<String> {
        pad("agencia", &self.spec.agencia_input.apply(value), self.spec.widths.agencia)
    }

    pub fn pad_conta(&self, value: &str) -> Result<String> {
        pad("conta", value, self.spec.widths.conta)
    }

    pub fn pad_convenio(&self, value: &str) -> Result<String> {
        pad("convenio", &self.spec.convenio_input.apply(value), self.spec.widths.convenio)
    }

    pub fn pad_numero(&self, value: &str) -> Result<String> {
        pad("numero", value, self.spec.widths.numero)
    }

    pub fn agencia_dv(&self, agencia: &str) -> Result<String> {
        self.spec.agencia_dv.compute("agencia", &self.pad_agencia(agencia)?)
    }

    pub fn conta_dv(&self, conta: &str) -> Result<String> {
        self.spec.conta_dv.compute("conta", &self.pad_conta(conta)?)
    }

    pub fn convenio_dv(&self, convenio: &str) -> Result<String> {
        self.spec.convenio_dv.compute("convenio", &self.pad_convenio(convenio)?)
    }

    /// Nosso número без DV, в раскладке банка.
    pub fn nosso_numero(&self, ids: &Identifiers<'_>) -> Result<String> {
        self.render_all(self.spec.nosso_numero.layout, ids)
    }

    pub fn nosso_numero_dv(&self, ids: &Identifiers<'_>) -> Result<String> {
        let input = self.render_all(self.spec.nosso_numero.dv_input, ids)?;
        self.spec.nosso_numero.dv.compute("numero", &input)
    }

    /// 25 цифр campo livre.
    pub fn campo_livre(&self, ids: &Identifiers<'_>) -> Result<String> {
        let field = match &self.spec.free_field {
            FreeField::Concat(parts) => self.render_all(parts, ids)?,
            FreeField::Checked { parts, check } => {
                let body = self.render_all(parts, ids)?;
                let dv = check.compute("campo_livre", &body)?;
                body + &dv
            }
        };
        if field.len() != FREE_FIELD_WIDTH {
            return Err(CobrancaError::AssemblyInvariant {
                field: "campo_livre",
                expected: FREE_FIELD_WIDTH,
                actual: field.len(),
            });
        }
        Ok(field)
    }

    pub fn nosso_numero_display(&self, ids: &Identifiers<'_>) -> Result<String> {
        let nn = self.nosso_numero(ids)?;
        Ok(match self.spec.nosso_numero_style {
            NossoNumeroStyle::Plain => nn,
            NossoNumeroStyle::Dashed => format!("{nn}-{}", self.nosso_numero_dv(ids)?),
            NossoNumeroStyle::DashedWithWallet => {
                format!("{nn}-{}   {}", self.nosso_numero_dv(ids)?, self.carteira)
            }
        })
    }

    pub fn agencia_conta_display(&self, ids: &Identifiers<'_>) -> Result<String> {
        let agencia = self.pad_agencia(ids.agencia)?;
        Ok(match self.spec.agencia_conta_style {
            AgenciaContaStyle::AgenciaDvConvenioDv => format!(
                "{agencia}.{} / {}-{}",
                self.agencia_dv(ids.agencia)?,
                self.pad_convenio(ids.convenio)?,
                self.convenio_dv(ids.convenio)?
            ),
            AgenciaContaStyle::AgenciaConvenio => {
                format!("{agencia} / {}", self.pad_convenio(ids.convenio)?)
            }
            AgenciaContaStyle::AgenciaDvContaDv => format!(
                "{agencia}-{} / {}-{}",
                self.agencia_dv(ids.agencia)?,
                self.pad_conta(ids.conta)?,
                self.conta_dv(ids.conta)?
            ),
            AgenciaContaStyle::AgenciaConvenioDv => format!(
                "{agencia}/{}-{}",
                self.pad_convenio(ids.convenio)?,
                self.convenio_dv(ids.convenio)?
            ),
        })
    }

    fn render_all(&self, parts: &[Part], ids: &Identifiers<'_>) -> Result<String> {
        let mut out = String::new();
        for part in parts {
            out.push_str(&self.render(part, ids)?);
        }
        Ok(out)
    }

    fn render(&self, part: &Part, ids: &Identifiers<'_>) -> Result<String> {
        Ok(match part {
            Part::Literal(s) => (*s).to_string(),
            Part::BankCode => self.spec.code.to_string(),
            Part::Carteira => self.carteira.clone(),
            Part::Agencia => self.pad_agencia(ids.agencia)?,
            Part::Conta => self.pad_conta(ids.conta)?,
            Part::Convenio => self.pad_convenio(ids.convenio)?,
            Part::Numero => self.pad_numero(ids.numero)?,
            Part::Wide(width, inner) => numeric("wide", &self.render(inner, ids)?, *width)?,
            Part::ConvenioDv => self.convenio_dv(ids.convenio)?,
            Part::NossoNumeroDv => self.nosso_numero_dv(ids)?,
            Part::DocumentDv => {
                let rule = self
                    .spec
                    .document_dv
                    .ok_or(CobrancaError::Unsupported("document check digit"))?;
                let document = digits_only(ids.document);
                if document.is_empty() {
                    let mut errors = ValidationErrors::new();
                    errors.push("document", FieldErrorKind::Missing);
                    return Err(CobrancaError::Validation(errors));
                }
                rule.compute("document", &document)?
            }
        })
    }
}

/// Цифровое поле банка: пустое или с не-цифрами — ошибка, иначе нули слева.
fn pad(field: &'static str, value: &str, width: usize) -> Result<String> {
    let value = value.trim();
    let mut errors = ValidationErrors::new();
    if value.is_empty() {
        errors.push(field, FieldErrorKind::Missing);
    } else if !value.chars().all(|c| c.is_ascii_digit()) {
        errors.push(field, FieldErrorKind::NotNumeric);
    }
    if !errors.is_empty() {
        return Err(CobrancaError::Validation(errors));
    }
    numeric(field, value, width)
}
