use chrono::NaiveDate;
use cobrancalib::{
    boleto::due_factor,
    config::{Config, Rollover},
    error::CobrancaError,
};

#[test]
fn partial_json_keeps_defaults() {
    let cfg = Config::from_json(r#"{ "due_factor_rollover": "reject" }"#).unwrap();
    assert_eq!(cfg.due_factor_rollover, Rollover::Reject);
    assert_eq!(cfg.currency_code, '9');
    assert_eq!(cfg.due_factor_epoch, NaiveDate::from_ymd_opt(1997, 10, 7).unwrap());

    let due = NaiveDate::from_ymd_opt(2025, 2, 22).unwrap();
    assert!(due_factor(due, &cfg).is_err());
    assert_eq!(due_factor(due, &Config::default()).unwrap(), 1000);
}

#[test]
fn custom_epoch_moves_the_factor() {
    let cfg = Config::from_json(r#"{ "due_factor_epoch": "2000-07-03" }"#).unwrap();
    let due = NaiveDate::from_ymd_opt(2000, 7, 4).unwrap();
    assert_eq!(due_factor(due, &cfg).unwrap(), 1);
}

#[test]
fn malformed_config_is_rejected() {
    assert!(matches!(
        Config::from_json("{ not json"),
        Err(CobrancaError::Config(_))
    ));
    assert!(matches!(
        Config::from_json(r#"{ "currency_code": "R" }"#),
        Err(CobrancaError::Config(_))
    ));
}

#[test]
fn load_reads_a_file() {
    let path = std::env::temp_dir().join("cobrancalib_config_smoke.json");
    std::fs::write(&path, r#"{ "currency_code": "9" }"#).unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg, Config::default());
    std::fs::remove_file(&path).ok();
}
