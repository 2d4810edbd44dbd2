use super::*;
use clap::CommandFactory;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn api_error_displays_server_message_not_debug_form() {
    let err = CliError::from(ApiError::from(GatewayError::Unauthorized {
        path: "/login".into(),
        body: r#"{"message":"Invalid credentials"}"#.into(),
    }));
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[test]
fn api_error_without_server_message_falls_back_to_status_text() {
    let err = CliError::from(ApiError::from(GatewayError::Status {
        path: "/filter".into(),
        status: 404,
        body: "missing".into(),
    }));
    assert_eq!(err.to_string(), "request to /filter failed with status 404");
}

#[test]
fn transaction_add_accepts_negative_amount_flag() {
    let cli = Cli::try_parse_from([
        "moneymanager",
        "--session-file",
        "memory",
        "expense",
        "add",
        "Refund",
        "--amount=-12.5",
        "--date",
        "2026-10-01",
        "--category-id",
        "2",
    ])
    .unwrap();

    let Command::Expense(TransactionCommand { command: TransactionSubcommand::Add { amount, .. } }) = cli.command else {
        panic!("expected expense add");
    };
    assert!((amount + 12.5).abs() < f64::EPSILON);
}
