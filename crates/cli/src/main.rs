use anyhow::Result;
use clap::{Parser, Subcommand};
use crushcheck::commands::{
    add_medication_command, clear_session_command, info_command, init_command,
    list_medications_command, report_command, show_medications_command, ReportArgs, ReportFormat,
};
use crushcheck::init_logging;
use crushcheck_core::model::Crushability;
use crushcheck_core::report::Locale;

/// Medication crushability review tool.
///
/// This CLI is a thin wrapper around `crushcheck-core` (exposed in code as
/// `crushcheck_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "crushcheck",
    version,
    about = "Medication crushability review: look up medications and generate reports",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a workspace at the given root.
    ///
    /// This will:
    /// - Create `.crushcheck`, `data`, `assets`, and `reports` directories.
    /// - Write a `.crushcheck/config.json` config file.
    Init {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional workspace name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show configuration, reference status, and session size.
    Info {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List medication names from the reference plus this session's additions.
    ListMedications {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Case-insensitive substring filter on the medication name.
        #[arg(long)]
        search: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Reference file (CSV or XLSX) to use instead of the configured ones.
        #[arg(long)]
        reference: Option<String>,
    },

    /// Show the full records for a selection of medications.
    ShowMedications {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Medication name; repeat for several (order is kept).
        #[arg(long = "drug", required = true)]
        drugs: Vec<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Reference file (CSV or XLSX) to use instead of the configured ones.
        #[arg(long)]
        reference: Option<String>,
    },

    /// Add a medication that is missing from the reference to this session.
    AddMedication {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Medication name (must not already exist).
        #[arg(long)]
        name: String,

        /// Whether the medication can be crushed: yes, no, or unknown.
        #[arg(long)]
        crushable: Crushability,

        /// Alternative formulation, if any.
        #[arg(long)]
        alternative: Option<String>,

        /// Recommendation text printed in the report.
        #[arg(long)]
        recommendation: Option<String>,

        /// Reference file (CSV or XLSX) to use instead of the configured ones.
        #[arg(long)]
        reference: Option<String>,
    },

    /// Discard every medication added this session.
    ClearSession {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Generate the crushability review report for a patient.
    ///
    /// Patient name, date of birth, and at least one medication are required,
    /// either as flags or in a `--request` file. Flags win over the file.
    Report {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        patient_name: Option<String>,

        /// Date of birth (YYYY-MM-DD).
        #[arg(long)]
        dob: Option<String>,

        /// Nursing home or facility.
        #[arg(long)]
        facility: Option<String>,

        /// Medication name; repeat for several (order is kept).
        #[arg(long = "drug")]
        drugs: Vec<String>,

        #[arg(long, value_enum, default_value_t = ReportFormat::Both)]
        format: ReportFormat,

        /// Output directory. Defaults to the workspace `reports` dir.
        #[arg(long)]
        out_dir: Option<String>,

        /// Report language: english or portuguese. Defaults to the config value.
        #[arg(long)]
        locale: Option<Locale>,

        /// Add Pharmacist/Nurse/Doctor signature lines.
        #[arg(long, default_value_t = false)]
        signatures: bool,

        /// YAML or JSON file with patient_name, date_of_birth, facility, medications.
        #[arg(long)]
        request: Option<String>,

        /// Reference file (CSV or XLSX) to use instead of the configured ones.
        #[arg(long)]
        reference: Option<String>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Init { root, name } => init_command(&root, name)?,
        Command::Info { root, json } => info_command(&root, json)?,
        Command::ListMedications { root, search, json, reference } => {
            list_medications_command(&root, search.as_deref(), json, reference.as_deref())?
        }
        Command::ShowMedications { root, drugs, json, reference } => {
            show_medications_command(&root, &drugs, json, reference.as_deref())?
        }
        Command::AddMedication {
            root,
            name,
            crushable,
            alternative,
            recommendation,
            reference,
        } => {
            add_medication_command(
                &root,
                &name,
                crushable,
                alternative,
                recommendation,
                reference.as_deref(),
            )?
        }
        Command::ClearSession { root } => clear_session_command(&root)?,
        Command::Report {
            root,
            patient_name,
            dob,
            facility,
            drugs,
            format,
            out_dir,
            locale,
            signatures,
            request,
            reference,
        } => {
            let args = ReportArgs {
                root,
                patient_name,
                dob,
                facility,
                drugs,
                format,
                out_dir,
                locale,
                signatures,
                request,
                reference,
            };
            report_command(&args)?;
        }
    }

    Ok(())
}
