use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Surveyor - survey definition tooling
#[derive(Parser, Debug, Clone)]
#[command(name = "surveyor", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SURVEYOR_CONFIG", default_value = "surveyor.toml")]
    pub config: PathBuf,

    /// Directory of survey documents
    #[arg(long, env = "SURVEYOR_SURVEY_DIR")]
    pub survey_dir: Option<PathBuf>,

    /// Directory of option-set documents
    #[arg(long, env = "SURVEYOR_OPTION_SET_DIR")]
    pub option_set_dir: Option<PathBuf>,

    /// Name recorded in label history for edits
    #[arg(long, env = "SURVEYOR_CHANGED_BY")]
    pub changed_by: Option<String>,

    /// Debounce window for edits, in milliseconds
    #[arg(long, env = "SURVEYOR_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate a survey document and report every problem
    Check {
        file: PathBuf,
    },
    /// Import a document and write it back as normalized JSON
    Normalize {
        file: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the descriptive response key of every field
    Keys {
        file: PathBuf,
    },
    /// Rename a field, recording the old label in its history
    Relabel {
        file: PathBuf,
        field_id: String,
        label: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate answers against a survey and print the stored responses
    Submit {
        file: PathBuf,
        /// JSON object of field id to answer
        answers: PathBuf,
        /// Survey instance the responses belong to
        #[arg(long, default_value = "local")]
        instance_id: String,
    },
    /// Print the JSON Schema of the survey document
    Schema,
    /// List the surveys in the survey directory
    List,
}
