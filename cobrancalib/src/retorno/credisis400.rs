//! Ретурн CNAB400 CrediSIS: первая строка — заголовок, остальные разбираются целиком.

use std::io::BufRead;

use crate::error::Result;
use crate::retorno::layout::{FieldSpec, LineLayout, LineRef, ReturnRecord};
use crate::traits::ReturnFormat;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("codigo_registro", 0, 0),
    FieldSpec::new("nosso_numero", 56, 75),
    FieldSpec::new("data_vencimento", 146, 151),
    FieldSpec::new("valor_titulo", 152, 164),
    FieldSpec::new("data_credito", 175, 180),
    FieldSpec::new("valor_recebido", 253, 265),
    FieldSpec::new("sequencial", 394, 399),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Credisis400;

impl Credisis400 {
    pub fn layout() -> LineLayout {
        LineLayout::new(FIELDS).skipping([LineRef::Head(0)])
    }
}

impl ReturnFormat for Credisis400 {
    fn read<R: BufRead>(&self, r: R) -> Result<Vec<ReturnRecord>> {
        Self::layout().parse(r)
    }
}
