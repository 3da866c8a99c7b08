//! Ретурн CNAB240 Sicredi: сегменты T и U одного титула сливаются в одну запись,
//! заголовки и трейлеры файла и лота пропускаются.

use std::io::BufRead;

use crate::error::{CobrancaError, Result};
use crate::retorno::layout::{read_lines, FieldSpec, LineLayout, ReturnRecord};
use crate::traits::ReturnFormat;

const RECORD_TYPE_AT: usize = 7;
const SEGMENT_AT: usize = 13;
const DETAIL: char = '3';

pub const SEGMENT_T: &[FieldSpec] = &[
    FieldSpec::new("codigo_ocorrencia", 15, 16),
    FieldSpec::new("agencia_com_dv", 17, 22),
    FieldSpec::new("cedente_com_dv", 23, 35),
    FieldSpec::new("nosso_numero", 37, 56),
    FieldSpec::new("carteira", 57, 57),
    FieldSpec::new("data_vencimento", 73, 80),
    FieldSpec::new("valor_titulo", 81, 95),
    FieldSpec::new("banco_recebedor", 96, 98),
    FieldSpec::new("agencia_recebedora", 99, 104),
    FieldSpec::new("valor_tarifa", 198, 212),
];

pub const SEGMENT_U: &[FieldSpec] = &[
    FieldSpec::new("juros_mora", 17, 31),
    FieldSpec::new("desconto", 32, 46),
    FieldSpec::new("abatimento", 47, 61),
    FieldSpec::new("iof", 62, 76),
    FieldSpec::new("valor_pago", 77, 91),
    FieldSpec::new("valor_recebido", 92, 106),
    FieldSpec::new("outras_despesas", 107, 121),
    FieldSpec::new("outros_recebimentos", 122, 136),
    FieldSpec::new("data_ocorrencia", 137, 144),
    FieldSpec::new("data_credito", 145, 152),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Sicredi240;

/// Порядок полей в итоговой записи: сначала T, затем U.
pub fn field_names() -> Vec<&'static str> {
    SEGMENT_T.iter().chain(SEGMENT_U).map(|f| f.name).collect()
}

impl ReturnFormat for Sicredi240 {
    fn read<R: BufRead>(&self, r: R) -> Result<Vec<ReturnRecord>> {
        let t_layout = LineLayout::new(SEGMENT_T);
        let u_layout = LineLayout::new(SEGMENT_U);
        let mut records = Vec::new();
        let mut pending: Option<ReturnRecord> = None;

        for (line_no, line) in read_lines(r)? {
            if line.chars().nth(RECORD_TYPE_AT) != Some(DETAIL) {
                continue;
            }
            match line.chars().nth(SEGMENT_AT) {
                Some('T') => {
                    if let Some(t) = pending.take() {
                        tracing::warn!(line = t.line(), "segment T without segment U");
                        records.push(t);
                    }
                    pending = Some(t_layout.parse_line(line_no, &line)?);
                }
                Some('U') => {
                    let mut t = pending.take().ok_or_else(|| {
                        CobrancaError::Parse(format!("line {line_no}: segment U without segment T"))
                    })?;
                    t.merge(u_layout.parse_line(line_no, &line)?);
                    records.push(t);
                }
                _ => {}
            }
        }
        if let Some(t) = pending {
            tracing::warn!(line = t.line(), "segment T without segment U");
            records.push(t);
        }
        tracing::debug!(records = records.len(), "return file parsed");
        Ok(records)
    }
}
