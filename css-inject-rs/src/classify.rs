use regex::Regex;

use crate::artifact::{ArtifactKind, ArtifactSet};

lazy_static! {
    static ref SCRIPT_FILE_RE: Regex = Regex::new(r"\.[cm]?js$").unwrap();
}

/// Artifact names split by role, each list in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub html: Vec<String>,
    pub css: Vec<String>,
    pub js: Vec<String>,
}

pub fn is_html_file(file_name: &str) -> bool {
    file_name.ends_with(".html")
}

pub fn is_css_file(file_name: &str) -> bool {
    file_name.ends_with(".css")
}

/// `.js`, `.cjs` and `.mjs` file names.
pub fn has_script_extension(file_name: &str) -> bool {
    SCRIPT_FILE_RE.is_match(file_name)
}

/// Script files that may receive injected CSS. Polyfill bundles are excluded
/// since they may load before, or instead of, the application.
pub fn is_script_file(file_name: &str) -> bool {
    has_script_extension(file_name) && !file_name.contains("polyfill")
}

pub fn classify(artifacts: &ArtifactSet) -> Classification {
    let mut classification = Classification::default();
    for (name, artifact) in artifacts.iter() {
        let file_name = artifact.file_name();
        if is_html_file(file_name) {
            classification.html.push(name.to_string());
        }
        match artifact.kind() {
            ArtifactKind::Asset if is_css_file(file_name) => {
                classification.css.push(name.to_string())
            }
            ArtifactKind::Chunk if is_script_file(file_name) => {
                classification.js.push(name.to_string())
            }
            _ => {}
        }
    }
    classification
}
