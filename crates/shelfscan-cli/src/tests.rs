use super::*;

#[test]
fn parses_keyword_with_defaults() {
    let cli = Cli::try_parse_from(["shelfscan", "fone de ouvido"]).expect("expected valid cli args");

    assert_eq!(cli.keyword, "fone de ouvido");
    assert_eq!(cli.output, PathBuf::from("results.html"));
    assert!(cli.max_attempts.is_none());
}

#[test]
fn parses_output_and_max_attempts() {
    let cli = Cli::try_parse_from([
        "shelfscan",
        "notebook",
        "--output",
        "/tmp/busca.html",
        "--max-attempts",
        "5",
    ])
    .expect("expected valid cli args");

    assert_eq!(cli.output, PathBuf::from("/tmp/busca.html"));
    assert_eq!(cli.max_attempts, Some(5));
}

#[test]
fn short_output_flag_is_accepted() {
    let cli = Cli::try_parse_from(["shelfscan", "livro", "-o", "out.html"]).expect("expected valid cli args");
    assert_eq!(cli.output, PathBuf::from("out.html"));
}

#[test]
fn missing_keyword_is_rejected() {
    assert!(Cli::try_parse_from(["shelfscan"]).is_err());
}

#[test]
fn zero_max_attempts_is_rejected() {
    assert!(Cli::try_parse_from(["shelfscan", "livro", "--max-attempts", "0"]).is_err());
}
