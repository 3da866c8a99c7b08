use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use cobrancalib::{
    bank::BankProfile,
    boleto::Boleto,
    config::Config,
    error::{CobrancaError, Result},
    formats::csv::Csv,
    model::Beneficiary,
    remessa::{builder::Remittance, credisis400::Credisis400 as Credisis400Remessa, sicoob240::Sicoob240},
    retorno::{credisis400::Credisis400 as Credisis400Retorno, sicredi240::Sicredi240},
    traits::{RemittanceFormat, ReturnFormat},
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RemessaLayout {
    Sicoob240,
    Credisis400,
}

impl RemessaLayout {
    fn bank_code(self) -> &'static str {
        match self {
            RemessaLayout::Sicoob240 => "756",
            RemessaLayout::Credisis400 => "097",
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RetornoLayout {
    Credisis400,
    Sicredi240,
}

#[derive(Parser, Debug)]
#[command(name = "cobranca", version, about = "Боленто, ремесса и ретурн CNAB")]
struct Cli {
    /// JSON с настройками (по умолчанию встроенные)
    #[arg(long = "config", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Штрихкод и линия оплаты одного боленто
    Barcode {
        #[arg(long)]
        bank: String,
        #[arg(long)]
        carteira: Option<String>,
        #[arg(long)]
        agencia: String,
        #[arg(long)]
        conta: String,
        #[arg(long, default_value = "")]
        convenio: String,
        #[arg(long)]
        numero: String,
        /// Сумма, например 123.45
        #[arg(long)]
        amount: Option<Decimal>,
        /// Срок в формате ГГГГ-ММ-ДД
        #[arg(long)]
        due: Option<NaiveDate>,
        /// CPF/CNPJ получателя
        #[arg(long, default_value = "")]
        document: String,
    },
    /// Файл ремессы из CSV титулов
    Remessa {
        #[arg(long, value_enum)]
        layout: RemessaLayout,
        #[arg(long)]
        carteira: Option<String>,
        /// JSON получателя
        #[arg(long)]
        beneficiary: String,
        /// CSV титулов
        #[arg(long)]
        payments: String,
        #[arg(long, default_value_t = 1)]
        sequence: u32,
        /// Выходной файл (по умолчанию stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
    },
    /// Разбор файла ретурна в CSV
    Retorno {
        #[arg(long, value_enum)]
        layout: RetornoLayout,
        /// Входной файл (по умолчанию stdin)
        #[arg(short = 'i', long = "input")]
        input: Option<String>,
        /// Выходной файл (по умолчанию stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
    },
}

fn output(path: Option<String>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    })
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    tracing::debug!(?config, "config loaded");

    match cli.command {
        Command::Barcode {
            bank,
            carteira,
            agencia,
            conta,
            convenio,
            numero,
            amount,
            due,
            document,
        } => {
            let profile = BankProfile::for_code(&bank, carteira.as_deref())?;
            let beneficiary = Beneficiary {
                document,
                agencia,
                conta,
                convenio,
                ..Beneficiary::default()
            };
            let mut boleto = Boleto::new(profile, beneficiary, numero);
            if let Some(amount) = amount {
                boleto = boleto.with_amount(amount);
            }
            if let Some(due) = due {
                boleto = boleto.with_due_date(due);
            }
            let barcode = boleto.barcode(&config)?;
            let mut out = io::stdout();
            writeln!(out, "{barcode}")?;
            writeln!(out, "{}", barcode.check_line())?;
            writeln!(out, "{}", boleto.nosso_numero_display()?)?;
            writeln!(out, "{}", boleto.agencia_conta_display()?)?;
            out.flush()?;
        }
        Command::Remessa {
            layout,
            carteira,
            beneficiary,
            payments,
            sequence,
            output: path,
        } => {
            let beneficiary: Beneficiary =
                serde_json::from_reader(BufReader::new(File::open(beneficiary)?))
                    .map_err(|e| CobrancaError::Parse(format!("beneficiary: {e}")))?;
            let payments = Csv::read_payments(BufReader::new(File::open(payments)?))?;
            let profile = BankProfile::for_code(layout.bank_code(), carteira.as_deref())?;
            let remessa = Remittance::new(profile, beneficiary, payments).with_sequence(sequence);

            // файл собирается целиком до открытия вывода
            let file = match layout {
                RemessaLayout::Sicoob240 => Sicoob240::default().build(&remessa),
                RemessaLayout::Credisis400 => Credisis400Remessa::default().build(&remessa),
            }?;
            let mut writer = output(path)?;
            file.write_to(&mut writer)?;
            writer.flush()?;
        }
        Command::Retorno {
            layout,
            input,
            output: path,
        } => {
            let reader: Box<dyn io::Read> = match input {
                Some(path) => Box::new(File::open(path)?),
                None => Box::new(io::stdin()),
            };
            let br = BufReader::new(reader);
            let records = match layout {
                RetornoLayout::Credisis400 => Credisis400Retorno.read(br),
                RetornoLayout::Sicredi240 => Sicredi240.read(br),
            }?;
            let mut writer = output(path)?;
            Csv::write_returns(&mut writer, &records)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
