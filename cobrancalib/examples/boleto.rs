use chrono::NaiveDate;
use cobrancalib::{bank::BankProfile, boleto::Boleto, config::Config, model::Beneficiary};
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: боленто Sicoob на 50,00 со сроком 18.02.2016
    let beneficiary = Beneficiary {
        name: "Kivanio Barbosa".into(),
        document: "12345678912".into(),
        agencia: "4327".into(),
        conta: "417270".into(),
        convenio: "229385".into(),
        ..Beneficiary::default()
    };
    let boleto = Boleto::new(BankProfile::for_code("756", Some("1"))?, beneficiary, "2")
        .with_amount(Decimal::new(5000, 2))
        .with_due_date(NaiveDate::from_ymd_opt(2016, 2, 18).ok_or("bad date")?);

    let barcode = boleto.barcode(&Config::default())?;
    println!("{barcode}");
    println!("{}", barcode.check_line());
    println!("{}", boleto.nosso_numero_display()?);
    Ok(())
}
