use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language of the fixed report text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Portuguese,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::English => "english",
            Locale::Portuguese => "portuguese",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::English => &ENGLISH,
            Locale::Portuguese => &PORTUGUESE,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Locale::English),
            "portuguese" | "pt" => Ok(Locale::Portuguese),
            other => Err(format!("Unsupported locale '{other}'; expected english or portuguese")),
        }
    }
}

/// Fixed text for one locale.
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub patient: &'static str,
    pub date_of_birth: &'static str,
    pub facility: &'static str,
    pub report_date: &'static str,
    pub important: &'static str,
    pub disclaimer: &'static str,
    /// Table headers for the Word document.
    pub headers: [&'static str; 4],
    /// Shorter headers sized for the fixed PDF cells.
    pub short_headers: [&'static str; 4],
    pub signature_roles: [&'static str; 3],
    pub signature_date: &'static str,
}

static ENGLISH: Labels = Labels {
    title: "Medication Crushability Review Report",
    patient: "Patient",
    date_of_birth: "Date of Birth",
    facility: "Nursing Home",
    report_date: "Report Date",
    important: "IMPORTANT",
    disclaimer: "Crushing tablets renders the medication unlicensed. If a liquid formulation \
                 is available, this is always the preferred option.",
    headers: ["Medication", "Can Be Crushed?", "Alternative Form", "Recommendation"],
    short_headers: ["Medication", "Crushable?", "Alternative", "Recommendation"],
    signature_roles: ["Pharmacist", "Nurse", "Doctor"],
    signature_date: "Date",
};

static PORTUGUESE: Labels = Labels {
    title: "Relatório de Revisão de Trituração de Medicamentos",
    patient: "Paciente",
    date_of_birth: "Data de Nascimento",
    facility: "Instituição",
    report_date: "Data do Relatório",
    important: "IMPORTANTE",
    disclaimer: "Triturar comprimidos torna o uso do medicamento não licenciado. Se houver \
                 uma formulação líquida disponível, esta é sempre a opção preferida.",
    headers: ["Medicamento", "Pode Ser Triturado?", "Forma Alternativa", "Recomendação"],
    short_headers: ["Medicamento", "Triturável?", "Alternativa", "Recomendação"],
    signature_roles: ["Farmacêutico", "Enfermeiro", "Médico"],
    signature_date: "Data",
};

impl Labels {
    /// The disclaimer with its leading marker, as printed in both formats.
    pub fn disclaimer_line(&self) -> String {
        format!("{}: {}", self.important, self.disclaimer)
    }
}
