use dagrun::logging::{LogLevel, effective_level};

#[test]
fn level_names_parse_case_insensitively() {
    assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Error));
    assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!(" Debug ".parse::<LogLevel>(), Ok(LogLevel::Debug));
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn explicit_level_wins() {
    assert_eq!(effective_level(Some(LogLevel::Trace)), tracing::Level::TRACE);
    assert_eq!(effective_level(Some(LogLevel::Error)), tracing::Level::ERROR);
}
