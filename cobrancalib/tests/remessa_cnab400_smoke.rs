use chrono::NaiveDate;
use cobrancalib::{
    bank::BankProfile,
    error::{CobrancaError, FieldErrorKind},
    model::{Address, Beneficiary, Fine, Instruction, Interest, Payer, PaymentRecord},
    remessa::{builder::Remittance, credisis400::Credisis400},
    traits::RemittanceFormat,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn payment() -> PaymentRecord {
    let payer = Payer {
        document: "12345678901".into(),
        name: "PABLO DIEGO JOSÉ FRANCISCO DE PAULA JUAN NEPOMUCENO MARÍA DE LOS REMEDIOS CIPRIANO DE LA SANTÍSSIMA TRINIDAD RUIZ Y PICASSO".into(),
        address: Address {
            street: "RUA RIO GRANDE DO SUL".into(),
            number: "190".into(),
            district: "São josé dos quatro apostolos magros".into(),
            cep: "12345678".into(),
            city: "Santa rita de cássia maria da silva".into(),
            state: "SP".into(),
            ..Address::default()
        },
    };
    let mut p = PaymentRecord::new("123", dec!(199.9), ymd(2019, 9, 13), payer);
    p.issue_date = ymd(2019, 9, 10);
    p.control_number = Some("6969".into());
    p.protest = Instruction { code: '1', days: 6 };
    p.interest = Interest {
        code: '1',
        amount: dec!(8.00),
        ..Interest::default()
    };
    p.fine = Fine {
        code: '2',
        percentage: dec!(2.00),
        ..Fine::default()
    };
    p
}

fn remittance(payments: Vec<PaymentRecord>) -> Remittance {
    let beneficiary = Beneficiary {
        name: "Kivanio Barbosa".into(),
        document: "12345678901234".into(),
        agencia: "1".into(),
        conta: "2".into(),
        conta_dv: Some("7".into()),
        convenio: "0027".into(),
        address: Address {
            street: "Rua Bento Gonçalves".into(),
            number: "12".into(),
            district: "Centro".into(),
            cep: "87000000".into(),
            city: "Maringá".into(),
            state: "PR".into(),
            ..Address::default()
        },
    };
    Remittance::new(
        BankProfile::for_code("097", Some("18")).unwrap(),
        beneficiary,
        payments,
    )
    .with_sequence(3)
    .with_generated_at(ymd(2019, 9, 10).and_hms_opt(10, 30, 0).unwrap())
}

#[test]
fn header_detail_and_trailer() {
    let file = Credisis400::default().build(&remittance(vec![payment()])).unwrap();
    let lines = file.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.chars().count() == 400));

    let header = &lines[0];
    assert_eq!(&header[0..2], "01");
    assert_eq!(&header[2..9], "REMESSA");
    assert_eq!(&header[26..46], "0001 000000027      ");
    assert_eq!(&header[46..76], "KIVANIO BARBOSA               ");
    assert_eq!(&header[76..79], "097");
    assert_eq!(&header[100..107], "0000003");
    assert_eq!(&header[391..394], "001");
    assert_eq!(&header[394..400], "000001");

    let detail = &lines[1];
    assert_eq!(&detail[0..1], "1");
    assert_eq!(&detail[1..3], "02");
    assert_eq!(&detail[3..17], "12345678901234");
    assert_eq!(&detail[17..21], "0001");
    assert_eq!(&detail[21..29], "00000002");
    assert_eq!(&detail[29..30], "7");
    assert_eq!(&detail[56..76], "09710001000027000123");
    assert_eq!(&detail[76..78], "01");
    assert_eq!(&detail[78..84], "100919");
    assert_eq!(&detail[90..92], "01");
    assert_eq!(&detail[92..94], "33");
    assert_eq!(&detail[94..96], "02");
    assert_eq!(&detail[96..97], "2");
    assert_eq!(&detail[97..99], "06");
    assert_eq!(&detail[99..101], "03");
    assert_eq!(&detail[110..120], "6969      ");
    assert_eq!(&detail[120..126], "130919");
    assert_eq!(&detail[126..139], "0000000019990");
    assert_eq!(&detail[139..145], "130919");
    assert_eq!(&detail[150..156], "100919");
    assert_eq!(&detail[157..159], "01");
    assert_eq!(&detail[159..173], "00012345678901");
    assert_eq!(&detail[173..213], "PABLO DIEGO JOSE FRANCISCO DE PAULA JUAN");
    assert_eq!(&detail[238..273], format!("{:<35}", "RUA RIO GRANDE DO SUL"));
    assert_eq!(&detail[273..279], "190   ");
    assert_eq!(&detail[279..304], "SAO JOSE DOS QUATRO APOST");
    assert_eq!(&detail[304..329], "SANTA RITA DE CASSIA MARI");
    assert_eq!(&detail[329..331], "SP");
    assert_eq!(&detail[331..339], "12345678");
    assert_eq!(&detail[394..400], "000002");

    let trailer = &lines[2];
    assert_eq!(&trailer[0..1], "9");
    assert_eq!(&trailer[394..400], "000003");
}

#[test]
fn instructions_add_an_optional_record() {
    let mut p = payment();
    p.instructions = "Não receber após o vencimento".into();
    let file = Credisis400::default().build(&remittance(vec![p, payment()])).unwrap();
    let kinds: Vec<&str> = file.lines().iter().map(|l| &l[0..1]).collect();
    assert_eq!(kinds, vec!["0", "1", "2", "1", "9"]);

    let optional = &file.lines()[2];
    assert_eq!(optional.chars().count(), 400);
    assert_eq!(&optional[394..400], "000003");
    assert!(optional.contains("NAO RECEBER APOS O VENCIMENTO"));
    // пени фиксированная, штраф в процентах
    assert!(optional.contains("000000000000800F200"));
    assert!(optional.contains("000000000000200P200"));
    assert_eq!(&file.lines()[4][394..400], "000005");
}

#[test]
fn payer_number_is_required() {
    let mut p = payment();
    p.payer.address.number.clear();
    let mut out = Vec::new();
    let err = Credisis400::default()
        .write(&mut out, &remittance(vec![p]))
        .unwrap_err();
    let CobrancaError::InvalidRemittance { payment, errors } = err else {
        panic!("expected InvalidRemittance, got {err:?}");
    };
    assert_eq!(payment.nosso_numero, "123");
    assert!(errors.contains("payer.number"));
    assert!(out.is_empty());
}

#[test]
fn nosso_numero_must_be_digits_within_six_positions() {
    for (numero, kind) in [
        ("12A", FieldErrorKind::NotNumeric),
        ("1234567", FieldErrorKind::TooLong { max: 6 }),
    ] {
        let mut p = payment();
        p.nosso_numero = numero.into();
        let mut out = Vec::new();
        let err = Credisis400::default()
            .write(&mut out, &remittance(vec![payment(), p]))
            .unwrap_err();
        let CobrancaError::InvalidRemittance { payment, errors } = err else {
            panic!("expected InvalidRemittance, got {err:?}");
        };
        assert_eq!(payment.nosso_numero, numero);
        assert_eq!(errors.kind_of("nosso_numero"), Some(&kind));
        assert!(out.is_empty());
    }
}

#[test]
fn beneficiary_limits_are_checked_before_output() {
    let mut r = remittance(vec![payment()]);
    r.beneficiary.convenio = "1234567".into();
    r.beneficiary.conta_dv = None;
    r.sequence = 12_345_678;
    let err = Credisis400::default().build(&r).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.contains("convenio"));
    assert!(errors.contains("conta_dv"));
    assert!(errors.contains("sequence"));
}

#[test]
fn other_banks_are_rejected() {
    let mut r = remittance(vec![payment()]);
    r.profile = BankProfile::for_code("756", None).unwrap();
    assert!(matches!(
        Credisis400::default().build(&r),
        Err(CobrancaError::Unsupported(_))
    ));
}
