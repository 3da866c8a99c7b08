//! cobrancalib — бразильская банковская инкассация: штрихкод и линия оплаты боленто,
//! файлы ремессы CNAB240/CNAB400 и разбор файлов ретурна.

pub mod error;
pub mod config;
pub mod checksum;
pub mod fields;
pub mod model;
pub mod bank;
pub mod boleto;
pub mod traits;

pub mod remessa {
    pub mod builder;
    pub mod sicoob240;
    pub mod credisis400;
}

pub mod retorno {
    pub mod layout;
    pub mod credisis400;
    pub mod sicredi240;
}

pub mod formats {
    pub mod csv;
}
