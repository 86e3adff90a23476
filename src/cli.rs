// src/cli.rs

use crate::core::fields::{FieldList, Schema};
use crate::error::ConvertError;
use crate::output::bulk_sink::{DEFAULT_INDEX, DEFAULT_TYPE};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    /// Flat CSV report
    Csv,
    /// Elasticsearch bulk indexing
    Els,
}

/// vuls-log-converter: flattens Vuls scan results into CSV or Elasticsearch documents
#[derive(Parser, Debug)]
#[command(name = "vuls-log-converter", version, about = "Convert Vuls JSON results to CSV or Elasticsearch bulk documents")]
pub struct Args {
    /// Output as CSV or JSON for ElasticSearch
    #[arg(short = 't', long = "type", value_name = "csv|els")]
    pub output_type: OutputType,

    /// Vuls result dir (e.g. /opt/vuls/results/current/)
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input: PathBuf,

    /// Output file name, required with --type csv
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// ElasticSearch endpoint, required with --type els
    #[arg(short = 'e', long = "esEndPoint", value_name = "URL")]
    pub es_endpoint: Option<String>,

    /// Index name used for bulk submissions
    #[arg(long = "esIndex", default_value = DEFAULT_INDEX, value_name = "NAME")]
    pub es_index: String,

    /// Document type used for bulk submissions
    #[arg(long = "esType", default_value = DEFAULT_TYPE, value_name = "NAME")]
    pub es_type: String,

    /// JSON array of column names overriding the default field list
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Layout of the input documents
    #[arg(long = "schema", value_enum, default_value_t = Schema::Current)]
    pub schema: Schema,

    /// Increase verbosity level (use -v or -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Where the flattened rows go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Csv { path: PathBuf },
    Elasticsearch { endpoint: Url, index: String, doc_type: String },
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub schema: Schema,
    pub fields: FieldList,
    pub target: OutputTarget,
}

impl Settings {
    /// Checks the argument combinations and resolves the field list.
    ///
    /// Nothing is read from the input directory here; every error returned is a
    /// `ConvertError::Config`.
    pub fn from_args(args: Args) -> Result<Self, ConvertError> {
        let target = match args.output_type {
            OutputType::Csv => {
                let path = args.output.ok_or_else(|| ConvertError::config("output file not found."))?;
                OutputTarget::Csv { path }
            }
            OutputType::Els => {
                let raw = args.es_endpoint.ok_or_else(|| ConvertError::config("esEndPoint not found."))?;
                let endpoint = Url::parse(&raw)
                    .map_err(|e| ConvertError::config(format!("esEndPoint is not a valid URL [{raw}]: {e}")))?;
                OutputTarget::Elasticsearch { endpoint, index: args.es_index, doc_type: args.es_type }
            }
        };

        let fields = match &args.config {
            Some(path) => FieldList::load(path)?,
            None => FieldList::defaults(args.schema),
        };

        Ok(Self { input: args.input, schema: args.schema, fields, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("vuls-log-converter").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn csv_run_needs_an_output_file() {
        let err = Settings::from_args(parse(&["--type", "csv", "--input", "/tmp/results"])).unwrap_err();
        assert_eq!(err.to_string(), "output file not found.");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn els_run_needs_an_endpoint() {
        let err = Settings::from_args(parse(&["-t", "els", "-i", "/tmp/results"])).unwrap_err();
        assert_eq!(err.to_string(), "esEndPoint not found.");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = Settings::from_args(parse(&["-t", "els", "-i", "/tmp", "-e", "not a url"])).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn unknown_type_and_missing_input_fail_parsing() {
        let argv = ["vuls-log-converter", "--type", "xml", "--input", "/tmp"];
        assert!(Args::try_parse_from(argv).is_err());
        assert!(Args::try_parse_from(["vuls-log-converter", "--type", "csv"]).is_err());
    }

    #[test]
    fn csv_settings_use_schema_defaults() {
        let settings =
            Settings::from_args(parse(&["-t", "csv", "-i", "/tmp/results", "-o", "out.csv", "--schema", "legacy"]))
                .unwrap();
        assert_eq!(settings.schema, Schema::Legacy);
        assert_eq!(settings.fields, FieldList::defaults(Schema::Legacy));
        assert_eq!(settings.target, OutputTarget::Csv { path: PathBuf::from("out.csv") });
    }

    #[test]
    fn els_settings_carry_index_and_type() {
        let settings =
            Settings::from_args(parse(&["-t", "els", "-i", "/tmp", "--esEndPoint", "http://localhost:9200/"])).unwrap();
        match settings.target {
            OutputTarget::Elasticsearch { endpoint, index, doc_type } => {
                assert_eq!(endpoint.as_str(), "http://localhost:9200/");
                assert_eq!(index, "vuls_index");
                assert_eq!(doc_type, "vuls_type");
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn config_file_overrides_field_list() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"["ServerName", "CveID"]"#).unwrap();
        let config_path = config.path().to_str().unwrap().to_string();

        let settings = Settings::from_args(parse(&["-t", "csv", "-i", "/tmp", "-o", "o.csv", "-c", &config_path])).unwrap();
        assert_eq!(settings.fields.headers(), vec!["ServerName", "CveID"]);
    }
}
