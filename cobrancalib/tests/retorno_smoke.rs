use chrono::NaiveDate;
use cobrancalib::{
    error::CobrancaError,
    formats::csv::Csv,
    retorno::{
        credisis400::Credisis400,
        layout::{FieldSpec, LineLayout},
        sicredi240::{field_names, Sicredi240},
    },
    traits::ReturnFormat,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::io::Cursor;

fn fixed(width: usize, prefix: &str, fill: &[(usize, &str)]) -> String {
    let mut line = vec![' '; width];
    for (i, c) in prefix.chars().enumerate() {
        line[i] = c;
    }
    for (at, s) in fill {
        for (i, c) in s.chars().enumerate() {
            line[at + i] = c;
        }
    }
    line.into_iter().collect()
}

#[test]
fn custom_layout_slices_inclusive_ranges() {
    let layout = LineLayout::new(vec![
        FieldSpec::new("field0", 0, 0),
        FieldSpec::new("field1", 1, 20),
        FieldSpec::new("field2", 21, 40),
    ]);
    let text = format!("3{}{}\n", "A".repeat(20), "B".repeat(20));
    let records = layout.parse(Cursor::new(text)).unwrap();
    assert_eq!(records.len(), 1);
    let fields: Vec<(&str, &str)> = records[0].fields().collect();
    assert_eq!(
        fields,
        vec![
            ("field0", "3"),
            ("field1", "AAAAAAAAAAAAAAAAAAAA"),
            ("field2", "BBBBBBBBBBBBBBBBBBBB"),
        ]
    );
}

#[test]
fn credisis_return_file() {
    let header = fixed(400, "02RETORNO01", &[]);
    let detail = |nn: &str, seq: &str| {
        fixed(
            400,
            "1",
            &[
                (56, nn),
                (146, "130919"),
                (152, "0000000019990"),
                (175, "160919"),
                (253, "0000000019990"),
                (394, seq),
            ],
        )
    };
    let text = [
        header,
        detail("09710001000027000123", "000002"),
        detail("09710001000027000124", "000003"),
    ]
    .join("\r\n");

    let records = Credisis400.read(Cursor::new(text)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].line(), 2);
    assert_eq!(records[0].get("nosso_numero"), Some("09710001000027000123"));
    assert_eq!(records[1].get("sequencial"), Some("000003"));
    assert_eq!(records[0].amount("valor_recebido").unwrap(), dec!(199.90));
    assert_eq!(
        records[0].date("data_vencimento").unwrap(),
        NaiveDate::from_ymd_opt(2019, 9, 13)
    );
}

#[test]
fn truncated_detail_reports_line() {
    let text = format!("{}\n1{}\n", "0".repeat(400), " ".repeat(100));
    let err = Credisis400.read(Cursor::new(text)).unwrap_err();
    assert!(matches!(
        err,
        CobrancaError::TruncatedRecord { line: 2, expected: 400, actual: 101 }
    ));
}

#[test]
fn sicredi_return_merges_segments_and_exports_csv() {
    let t = |nn: &str| {
        fixed(240, "74800013", &[(13, "T"), (15, "06"), (37, nn), (81, "000000000005000")])
    };
    let u = fixed(240, "74800013", &[(13, "U"), (77, "000000000005000"), (145, "19022016")]);
    let text = [
        fixed(240, "74800000", &[]),
        fixed(240, "74800011", &[]),
        t("00000000000000000001"),
        u.clone(),
        t("00000000000000000002"),
        u,
        fixed(240, "74800015", &[]),
        fixed(240, "74899999", &[]),
    ]
    .join("\n");

    let records = Sicredi240.read(Cursor::new(text)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("nosso_numero"), Some("00000000000000000002"));
    assert_eq!(records[1].amount("valor_pago").unwrap(), dec!(50));
    assert_eq!(records[0].names(), field_names());

    let mut out = Vec::new();
    Csv::write_returns(&mut out, &records).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let mut rows = csv.lines();
    let header = rows.next().unwrap();
    assert!(header.starts_with("line,codigo_ocorrencia,agencia_com_dv,"));
    assert!(header.ends_with(",data_ocorrencia,data_credito"));
    assert_eq!(rows.count(), 2);
}
