use thiserror::Error;

/// ExifTool's own confirmation line. When it shows up in captured diagnostics
/// it is hidden from the displayed detail; it never decides pass/fail.
pub const BENIGN_CONFIRMATION: &str = "1 image files updated";

/// Per-item failure. None of these abort a batch: each one is recorded
/// against its asset and processing moves on to the next item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("Ressource photo non trouvée.")]
    ResourceNotFound,

    #[error("L'export initial du fichier a échoué: {0}")]
    ExportFailed(String),

    #[error("La date source sélectionnée est introuvable pour cet élément.")]
    DateNotFound,

    #[error("L'outil ExifTool intégré n'a pas été trouvé.")]
    ExifToolNotFound,

    #[error("L'exécution d'ExifTool a échoué (code: {code}).{}", details_suffix(.details))]
    ExifToolExecutionFailed { code: i32, details: String },

    #[error("Le lancement d'ExifTool a échoué: {0}")]
    ExifToolLaunchFailed(String),
}

/// Drop the detail text when it is only ExifTool's normal confirmation.
pub fn suppress_benign(details: &str) -> &str {
    if details.contains(BENIGN_CONFIRMATION) {
        ""
    } else {
        details
    }
}

fn details_suffix(details: &str) -> String {
    match suppress_benign(details) {
        "" => String::new(),
        clean => format!(" Détails: {clean}"),
    }
}
