use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn rtool() -> Command {
    Command::cargo_bin("rtool").expect("binary exists")
}

#[test]
fn company_writes_to_stdout() {
    rtool()
        .args(["company", "--from", "01.01.2025", "--to", "01.01.2025"])
        .arg(fixture("rates.csv"))
        .assert()
        .success()
        .stdout(contains(
            "External ID,Symbol,Active,Date,Rate,Currency,Company\n",
        ))
        .stdout(contains("base.USD,$,TRUE,2025-01-01,0.2723,USD,AE00\n"))
        .stderr(contains("Saved 17 rows in 3 currency blocks to stdout"));
}

#[test]
fn consolidate_writes_to_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("usd.csv");
    rtool()
        .args(["consolidate", "--target", "USD", "--from", "31.12.2024", "--to", "02.01.2025", "-o"])
        .arg(&output)
        .arg(fixture("rates.csv"))
        .assert()
        .success();
    let written = std::fs::read_to_string(&output).expect("output written");
    assert!(written.starts_with("id,Symbol,Active,Date,Rate,Currency\nbase.AED,AED,TRUE,2025-01-02,0.2723,AED\n"));
    assert_eq!(written.lines().count(), 1 + 5);
}

#[test]
fn export_writes_all_tables_rounded() {
    let dir = tempfile::tempdir().expect("temp dir");
    rtool()
        .args(["export", "--from", "31.12.2024", "--to", "02.01.2025", "-t", "USD", "-t", "KES", "-O"])
        .arg(dir.path())
        .arg(fixture("rates.csv"))
        .assert()
        .success();
    for name in [
        "rates_per_company.csv",
        "rates_consolidation_USD.csv",
        "rates_consolidation_KES.csv",
    ] {
        assert!(dir.path().join(name).is_file(), "{name} was written");
    }
    let usd = std::fs::read_to_string(dir.path().join("rates_consolidation_USD.csv")).unwrap();
    assert!(usd.contains(",2025-01-02,0.27,AED\n"), "export rounds to two digits:\n{usd}");
}

#[test]
fn fatal_errors_leave_no_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("out.csv");
    rtool()
        .args(["company", "--from", "01.01.2030", "--to", "31.01.2030", "-o"])
        .arg(&output)
        .arg(fixture("rates.csv"))
        .assert()
        .failure()
        .stderr(contains("No date columns matched 01.01.2030 to 31.01.2030"));
    assert!(!output.exists());

    rtool()
        .args(["export", "--target", "EUR", "-O"])
        .arg(dir.path().join("export"))
        .arg(fixture("rates.csv"))
        .args(["--from", "01.01.2025", "--to", "01.01.2025"])
        .assert()
        .failure()
        .stderr(contains("EUR consolidation table"));
    assert!(!dir.path().join("export").exists());
}

#[test]
fn missing_columns_are_named() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("sheet.csv");
    std::fs::write(&input, "Land,From Currency,To Currency,01.01.2025\nKenya,KES,USD,1\n").unwrap();
    rtool()
        .arg("company")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("A country column could not be found, tried 'Country', 'SAP Country'"))
        .stderr(contains("'Land'"));
}

#[test]
fn default_config_can_be_passed_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = dir.path().join("rates.ron");
    let assert = rtool().arg("default-config").assert().success();
    let mut ron = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    ron = ron.replace("\"KE10\",", "");
    std::fs::write(&config, ron).unwrap();

    rtool()
        .args(["company", "--from", "01.01.2025", "--to", "01.01.2025", "-c"])
        .arg(&config)
        .arg(fixture("rates.csv"))
        .assert()
        .success()
        .stdout(contains(",KE20\n"))
        .stdout(contains(",KE10\n").not());
}

#[test]
fn normalize_headers_then_company() {
    let dir = tempfile::tempdir().expect("temp dir");
    let normalized = dir.path().join("normalized.csv");
    rtool()
        .args(["normalize-headers", "-o"])
        .arg(&normalized)
        .arg(fixture("raw-headers.csv"))
        .assert()
        .success()
        .stderr(contains("Normalized 4 headers into dates"));
    rtool()
        .args(["company", "--from", "09.09.2020", "--to", "09.09.2020"])
        .arg(&normalized)
        .assert()
        .success()
        .stdout(contains("base.USD,$,TRUE,2020-09-09,101.5,USD,KE10\n"));
}

#[test]
fn round_is_bounded() {
    rtool()
        .args(["company", "--round", "16"])
        .arg(fixture("rates.csv"))
        .assert()
        .failure()
        .stderr(contains("16"));
    rtool()
        .args(["company", "--from", "01.01.2025", "--to", "01.01.2025", "--round", "15"])
        .arg(fixture("rates.csv"))
        .assert()
        .success();
}
