use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};
use std::borrow::Cow;
use strum_macros::{EnumString, IntoStaticStr};
use tracing_subscriber::EnvFilter;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Tracing {
    pub level: String,

    /// The format to use when printing traces to logs.
    pub format: Format,

    /// Filter directives to provide to the `tracing-subscriber`
    /// [EnvFilter](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html).
    ///
    /// Useful for filtering out noisy debug/trace logs from dev environments, or setting a
    /// different log level for a specific crate in all environments
    #[serde(default)]
    #[validate(custom(function = "validate_env_filter_str"))]
    pub trace_filters: Vec<String>,
}

fn validate_env_filter_str(trace_filters: &[String]) -> Result<(), ValidationError> {
    let invalid_filters = trace_filters
        .iter()
        .filter_map(|filter| {
            let parsed_filter: Result<EnvFilter, _> = filter.parse();
            parsed_filter.err().map(|err| (filter, err.to_string()))
        })
        .collect_vec();

    if invalid_filters.is_empty() {
        return Ok(());
    }

    let (filters, errors): (Vec<_>, Vec<_>) = invalid_filters.into_iter().unzip();
    let mut err = ValidationError::new("Invalid env filter(s)");
    err.add_param(Cow::from("filters"), &filters);
    err.add_param(Cow::from("errors"), &errors);

    Err(err)
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[non_exhaustive]
pub enum Format {
    None,
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::{Format, Tracing};
    use rstest::rstest;
    use validator::Validate;

    #[rstest]
    #[case(
        r#"
        level = "debug"
        format = "none"
        trace-filters = [ "foo=warn" ]
        "#,
        false
    )]
    #[case(
        r#"
        level = "debug"
        format = "none"
        trace-filters = [ "foo=warn", "invalid filter"  ]
        "#,
        true
    )]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn validation(#[case] config: &str, #[case] error: bool) {
        let tracing: Tracing = toml::from_str(config).unwrap();

        let validate_result = tracing.validate();

        assert_eq!(validate_result.is_err(), error);
    }

    #[rstest]
    #[case("none", Format::None)]
    #[case("pretty", Format::Pretty)]
    #[case("compact", Format::Compact)]
    #[case("json", Format::Json)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn format(#[case] value: &str, #[case] expected: Format) {
        let config = format!("level = \"info\"\nformat = \"{value}\"");
        let tracing: Tracing = toml::from_str(&config).unwrap();

        assert_eq!(tracing.format, expected);
    }
}
