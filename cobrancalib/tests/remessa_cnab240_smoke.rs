use chrono::NaiveDate;
use cobrancalib::{
    bank::BankProfile,
    error::{CobrancaError, FieldErrorKind},
    model::{Address, Beneficiary, Payer, PaymentRecord},
    remessa::{builder::Remittance, sicoob240::Sicoob240},
    traits::RemittanceFormat,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn payment(nosso_numero: &str, name: &str) -> PaymentRecord {
    let payer = Payer {
        document: "12345678901".into(),
        name: name.into(),
        address: Address {
            street: "Rua das Flores".into(),
            number: "10".into(),
            district: "Centro".into(),
            cep: "12345678".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            ..Address::default()
        },
    };
    let mut p = PaymentRecord::new(nosso_numero, dec!(50), ymd(2016, 2, 18), payer);
    p.issue_date = ymd(2016, 2, 1);
    p.document_number = Some("NF-123".into());
    p
}

fn remittance(payments: Vec<PaymentRecord>) -> Remittance {
    let beneficiary = Beneficiary {
        name: "Kivanio Barbosa".into(),
        document: "12345678912".into(),
        agencia: "4327".into(),
        conta: "417270".into(),
        convenio: "229385".into(),
        ..Beneficiary::default()
    };
    Remittance::new(BankProfile::for_code("756", None).unwrap(), beneficiary, payments)
        .with_sequence(7)
        .with_generated_at(ymd(2016, 2, 1).and_hms_opt(8, 15, 0).unwrap())
}

#[test]
fn one_batch_with_three_segments_per_payment() {
    let file = Sicoob240::default()
        .build(&remittance(vec![payment("1", "José"), payment("2", "Maria")]))
        .unwrap();
    let lines = file.lines();
    assert_eq!(lines.len(), 10);
    assert_eq!(file.batch_count(), 1);
    assert!(lines.iter().all(|l| l.chars().count() == 240));

    let header = &lines[0];
    assert_eq!(&header[0..8], "75600000");
    assert_eq!(&header[17..18], "1");
    assert_eq!(&header[18..32], "00012345678912");
    assert_eq!(&header[52..72], "0432730000004172701 ");
    assert_eq!(&header[143..157], "01022016081500");
    assert_eq!(&header[157..163], "000007");

    let segments: Vec<&str> = lines[2..8].iter().map(|l| &l[13..14]).collect();
    assert_eq!(segments, vec!["P", "Q", "R", "P", "Q", "R"]);
    let numbers: Vec<&str> = lines[2..8].iter().map(|l| &l[8..13]).collect();
    assert_eq!(numbers, vec!["00001", "00002", "00003", "00004", "00005", "00006"]);

    let p = &lines[2];
    assert_eq!(&p[0..8], "75600013");
    assert_eq!(&p[37..47], "0000000001");

    let q = &lines[3];
    assert_eq!(&q[33..73], format!("{:<40}", "JOSE"));
    assert_eq!(&q[73..113], format!("{:<40}", "RUA DAS FLORES, 10"));
}

#[test]
fn trailer_counts() {
    let file = Sicoob240::default()
        .build(&remittance(vec![payment("1", "José"), payment("2", "Maria")]))
        .unwrap();
    let lines = file.lines();

    let batch_trailer = &lines[8];
    assert_eq!(&batch_trailer[0..8], "75600015");
    // заголовок лота + 6 сегментов + трейлер лота
    assert_eq!(&batch_trailer[17..23], "000008");
    assert_eq!(&batch_trailer[23..29], "000002");
    assert_eq!(&batch_trailer[29..46], "00000000000010000");

    let file_trailer = &lines[9];
    assert_eq!(&file_trailer[0..8], "75699999");
    assert_eq!(&file_trailer[17..23], "000001");
    assert_eq!(&file_trailer[23..29], "000010");

    // детали лота = счётчик трейлера лота без его заголовка и трейлера
    let details = lines.iter().filter(|l| &l[7..8] == "3").count();
    let batch_records: usize = batch_trailer[17..23].parse().unwrap();
    assert_eq!(details, 6);
    assert_eq!(details, batch_records - 2);
}

#[test]
fn text_uses_crlf_between_lines() {
    let file = Sicoob240::default()
        .build(&remittance(vec![payment("1", "José")]))
        .unwrap();
    let text = file.to_text();
    assert_eq!(text.matches("\r\n").count(), file.lines().len() - 1);
    assert!(!text.ends_with("\r\n"));

    let mut out = Vec::new();
    file.write_to(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), text);
}

#[test]
fn missing_due_date_fails_with_no_output() {
    let mut broken = payment("2", "Maria");
    broken.due_date = None;
    let mut out = Vec::new();
    let err = Sicoob240::default()
        .write(&mut out, &remittance(vec![payment("1", "José"), broken]))
        .unwrap_err();
    let CobrancaError::InvalidRemittance { payment, errors } = err else {
        panic!("expected InvalidRemittance, got {err:?}");
    };
    assert_eq!(payment.nosso_numero, "2");
    assert!(errors.contains("due_date"));
    assert!(out.is_empty());
}

#[test]
fn file_level_problems_are_collected() {
    let mut r = remittance(vec![]);
    r.beneficiary.name.clear();
    r.beneficiary.agencia = "43".into();
    let err = Sicoob240::default().build(&r).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.contains("beneficiary.name"));
    assert!(errors.contains("agencia"));
    assert!(errors.contains("payments"));
}

fn rejected_payment(r: &Remittance) -> (Box<PaymentRecord>, cobrancalib::error::ValidationErrors) {
    let mut out = Vec::new();
    let err = Sicoob240::default().write(&mut out, r).unwrap_err();
    assert!(out.is_empty());
    match err {
        CobrancaError::InvalidRemittance { payment, errors } => (payment, errors),
        other => panic!("expected InvalidRemittance, got {other:?}"),
    }
}

#[test]
fn nosso_numero_must_be_digits_within_ten_positions() {
    let (rejected, errors) = rejected_payment(&remittance(vec![payment("ABC", "José")]));
    assert_eq!(rejected.nosso_numero, "ABC");
    assert_eq!(errors.kind_of("nosso_numero"), Some(&FieldErrorKind::NotNumeric));

    let (rejected, errors) =
        rejected_payment(&remittance(vec![payment("1", "José"), payment("12345678901", "Maria")]));
    assert_eq!(rejected.nosso_numero, "12345678901");
    assert_eq!(errors.kind_of("nosso_numero"), Some(&FieldErrorKind::TooLong { max: 10 }));

    let file = Sicoob240::default()
        .build(&remittance(vec![payment("1234567890", "José")]))
        .unwrap();
    assert_eq!(&file.lines()[2][37..47], "1234567890");
}

#[test]
fn exempt_address_still_needs_a_numeric_cep() {
    let mut p = payment("1", "José");
    p.address_exempt = true;
    p.payer.address.cep = "1234é678".into();
    let (_, errors) = rejected_payment(&remittance(vec![p.clone()]));
    assert_eq!(errors.kind_of("payer.cep"), Some(&FieldErrorKind::NotNumeric));

    p.payer.address = Address::default();
    let file = Sicoob240::default().build(&remittance(vec![p])).unwrap();
    let q = &file.lines()[3];
    assert_eq!(&q[128..136], "00000000");
}

#[test]
fn conta_dv_override_is_one_digit() {
    let mut r = remittance(vec![payment("1", "José")]);
    r.beneficiary.conta_dv = Some("12".into());
    let err = Sicoob240::default().build(&r).unwrap_err();
    assert!(matches!(err, CobrancaError::Validation(_)));
    assert_eq!(
        err.validation_errors().unwrap().kind_of("conta_dv"),
        Some(&FieldErrorKind::TooLong { max: 1 })
    );

    r.beneficiary.conta_dv = Some("X".into());
    let err = Sicoob240::default().build(&r).unwrap_err();
    assert_eq!(
        err.validation_errors().unwrap().kind_of("conta_dv"),
        Some(&FieldErrorKind::NotNumeric)
    );

    r.beneficiary.conta_dv = Some("5".into());
    let file = Sicoob240::default().build(&r).unwrap();
    assert_eq!(&file.lines()[0][70..72], "5 ");
}
