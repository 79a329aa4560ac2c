/// How the tracing subscriber formats its output.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl TracingConfig {
    /// `LOG_FORMAT=json` overrides the caller's default, which is
    /// usually "JSON in production, pretty everywhere else".
    pub fn new(environment: impl Into<String>, json_default: bool) -> Self {
        let json_format = match std::env::var("LOG_FORMAT") {
            Ok(value) => value.eq_ignore_ascii_case("json"),
            Err(_) => json_default,
        };
        Self {
            environment: environment.into(),
            json_format,
        }
    }
}
