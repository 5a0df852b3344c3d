use life_organizer::AppError;

#[test]
fn display_prefixes_the_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Db("locked".into()), "db: locked"),
        (AppError::Slack("socket".into()), "slack: socket"),
        (AppError::Store("503".into()), "store: 503"),
        (
            AppError::Classifier("garbled".into()),
            "classifier: garbled",
        ),
        (
            AppError::Transcription("empty".into()),
            "transcription: empty",
        ),
        (AppError::Timeout("30s".into()), "timeout: 30s"),
        (AppError::NotFound("page".into()), "not found: page"),
        (AppError::Unauthorized("U9".into()), "unauthorized: U9"),
        (
            AppError::RateLimited("20/60s".into()),
            "rate limited: 20/60s",
        ),
        (AppError::Io("disk".into()), "io: disk"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn json_errors_become_classifier_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{oops")
        .unwrap_err()
        .into();

    assert!(matches!(err, AppError::Classifier(_)));
    assert!(err.to_string().contains("malformed json"));
}

#[test]
fn io_errors_convert() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();

    assert!(matches!(err, AppError::Io(ref msg) if msg == "gone"));
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();

    assert!(matches!(err, AppError::Config(_)));
}
