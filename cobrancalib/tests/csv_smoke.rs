use chrono::NaiveDate;
use cobrancalib::{
    bank::BankProfile,
    error::CobrancaError,
    formats::csv::Csv,
    model::Beneficiary,
    remessa::{builder::Remittance, sicoob240::Sicoob240},
    traits::RemittanceFormat,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::io::Cursor;

const PAYMENTS: &str = "\
nosso_numero,amount,due_date,issue_date,document_number,payer_document,payer_name,payer_street,payer_number,payer_district,payer_cep,payer_city,payer_state,discount_code,discount_date,discount_amount
1,50.00,2016-02-18,2016-02-01,NF-1,12345678901,José da Silva,Rua das Flores,10,Centro,12345678,São Paulo,SP,1,2016-02-10,5.00
2,75.50,2016-03-18,2016-02-01,NF-2,12345678000190,Padaria Ltda,Av. Brasil,200,Jardim,87000000,Maringá,PR,,,
";

fn beneficiary() -> Beneficiary {
    Beneficiary {
        name: "Kivanio Barbosa".into(),
        document: "12345678912".into(),
        agencia: "4327".into(),
        conta: "417270".into(),
        convenio: "229385".into(),
        ..Beneficiary::default()
    }
}

#[test]
fn payments_from_csv_feed_a_remittance() {
    let payments = Csv::read_payments(Cursor::new(PAYMENTS)).unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].discount.code, '1');
    assert_eq!(payments[0].discount.amount, dec!(5.00));
    assert_eq!(payments[1].payer.document, "12345678000190");
    assert_eq!(payments[1].due_date, NaiveDate::from_ymd_opt(2016, 3, 18));

    let remessa = Remittance::new(
        BankProfile::for_code("756", None).unwrap(),
        beneficiary(),
        payments,
    );
    let file = Sicoob240::default().build(&remessa).unwrap();
    assert_eq!(file.lines().len(), 2 + 6 + 2);
    // сегмент Q второго титула: CNPJ
    assert_eq!(&file.lines()[6][17..18], "2");
}

#[test]
fn missing_due_date_survives_import_and_fails_validation() {
    let text = "nosso_numero,amount,payer_document,payer_name,payer_street,payer_cep,payer_city,payer_state\n\
                9,10.00,12345678901,Ana,Rua A,12345678,Recife,PE\n";
    let payments = Csv::read_payments(Cursor::new(text)).unwrap();
    assert_eq!(payments[0].due_date, None);

    let remessa = Remittance::new(
        BankProfile::for_code("756", None).unwrap(),
        beneficiary(),
        payments,
    );
    let err = Sicoob240::default().build(&remessa).unwrap_err();
    assert!(matches!(err, CobrancaError::InvalidRemittance { .. }));
    assert!(err.validation_errors().unwrap().contains("due_date"));
}

#[test]
fn bad_amount_is_a_parse_error() {
    let text = "nosso_numero,amount\n1,abc\n";
    let err = Csv::read_payments(Cursor::new(text)).unwrap_err();
    assert!(matches!(err, CobrancaError::Parse(ref m) if m.starts_with("amount:")));
}
