use log::debug;

use crate::artifact::{Artifact, ArtifactSet};
use crate::error::{CssInjectError, Result};

/// Concatenate the stylesheets named in `css_names`, in order, removing each
/// one from `artifacts`.
///
/// Every listed name is gone from the set when this returns, including on
/// error: a malformed entry does not stop the removal of the others, and the
/// first problem encountered is reported once all of them are removed.
pub fn aggregate_css(artifacts: &mut ArtifactSet, css_names: &[String]) -> Result<String> {
    let mut css = String::new();
    let mut first_error = None;

    for name in css_names {
        let appended = match artifacts.remove(name) {
            Some(Artifact::Asset { source, .. }) => match source.text() {
                Ok(text) => {
                    css.push_str(&text);
                    Ok(())
                }
                Err(err) => Err(CssInjectError::malformed(
                    name,
                    format!("stylesheet is not valid UTF-8: {err}"),
                )),
            },
            Some(Artifact::Chunk { .. }) => Err(CssInjectError::malformed(
                name,
                "expected a stylesheet asset, found a chunk",
            )),
            None => Err(CssInjectError::malformed(
                name,
                "stylesheet is missing from the bundle",
            )),
        };

        match appended {
            Ok(()) => debug!("Extracted stylesheet {name}"),
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => debug!("{err}"),
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(css),
    }
}
