//! Унифицированные трэйты раскладок на основе std::io::{BufRead, Write}.

use crate::{
    error::Result,
    remessa::builder::{Remittance, RemittanceFile},
    retorno::layout::ReturnRecord,
};
use std::io::{BufRead, Write};

pub trait RemittanceFormat {
    const LINE_WIDTH: usize;

    /// Собирает файл целиком; при ошибке не возвращается ничего.
    fn build(&self, remessa: &Remittance) -> Result<RemittanceFile>;

    fn write<W: Write>(&self, w: W, remessa: &Remittance) -> Result<()> {
        self.build(remessa)?.write_to(w)
    }
}

pub trait ReturnFormat {
    fn read<R: BufRead>(&self, r: R) -> Result<Vec<ReturnRecord>>;
}
