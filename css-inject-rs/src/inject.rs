use log::{debug, warn};

use crate::artifact::{Artifact, ArtifactSet};
use crate::codegen::InjectionFragment;
use crate::error::{CssInjectError, Result};
use crate::options::ChunkPredicate;

/// The chunks selected to receive the injection fragment, in enumeration
/// order. Possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionTargets(pub Vec<String>);

impl InjectionTargets {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// Every chunk accepted by `predicate`, or just the first chunk when there is
/// no predicate.
pub fn select_target_chunks(
    js_names: &[String],
    predicate: Option<&ChunkPredicate>,
) -> InjectionTargets {
    match predicate {
        Some(predicate) => InjectionTargets(
            js_names
                .iter()
                .filter(|name| predicate(name.as_str()))
                .cloned()
                .collect(),
        ),
        None => InjectionTargets(js_names.iter().take(1).cloned().collect()),
    }
}

/// Splice `fragment` into each target chunk, before its code when
/// `top_execution_priority` is set and after it otherwise.
///
/// Returns the names of the chunks rewritten. Chunks already carrying the
/// fragment are skipped.
pub fn inject_into_chunks(
    artifacts: &mut ArtifactSet,
    targets: &InjectionTargets,
    fragment: Option<&InjectionFragment>,
    top_execution_priority: bool,
) -> Result<Vec<String>> {
    let Some(fragment) = fragment else {
        return Ok(Vec::new());
    };

    let mut injected = Vec::new();
    for name in targets.names() {
        let code = match artifacts.get_mut(name) {
            Some(Artifact::Chunk { code, .. }) => code,
            Some(Artifact::Asset { .. }) => {
                return Err(CssInjectError::malformed(
                    name,
                    "expected a chunk, found an asset",
                ))
            }
            None => {
                return Err(CssInjectError::malformed(
                    name,
                    "chunk is missing from the bundle",
                ))
            }
        };

        if code.contains(&fragment.code) {
            warn!("Chunk {name} already contains the injected CSS, skipping");
            continue;
        }

        *code = splice(code.as_str(), &fragment.code, top_execution_priority);
        injected.push(name.clone());
        debug!("Injected CSS into chunk {name}");
    }
    Ok(injected)
}

fn splice(app: &str, inject: &str, top_execution_priority: bool) -> String {
    let mut spliced = String::with_capacity(app.len() + inject.len() + 1);
    if top_execution_priority {
        spliced.push_str(inject);
        spliced.push_str(app);
    } else {
        spliced.push_str(app);
        if !app.is_empty() && !app.ends_with('\n') {
            spliced.push('\n');
        }
        spliced.push_str(inject);
    }
    spliced
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn js_names() -> Vec<String> {
        vec!["main.js".to_string(), "vendor.js".to_string()]
    }

    fn chunks() -> ArtifactSet {
        let mut artifacts = ArtifactSet::new();
        artifacts.insert("main.js", Artifact::chunk("main.js", "main();"));
        artifacts.insert("vendor.js", Artifact::chunk("vendor.js", "vendor();"));
        artifacts
    }

    fn fragment() -> InjectionFragment {
        InjectionFragment {
            code: ";inject();\n".to_string(),
        }
    }

    fn chunk_code<'a>(artifacts: &'a ArtifactSet, name: &str) -> &'a str {
        match artifacts.get(name) {
            Some(Artifact::Chunk { code, .. }) => code.as_str(),
            other => panic!("expected chunk, got {other:?}"),
        }
    }

    #[test]
    fn test_default_selects_first_chunk() {
        let targets = select_target_chunks(&js_names(), None);
        assert_eq!(targets.names(), ["main.js"]);
        assert!(select_target_chunks(&[], None).is_empty());
    }

    #[test]
    fn test_predicate_selects_all_matches() {
        let predicate: ChunkPredicate = Arc::new(|name: &str| name.starts_with('v'));
        let targets = select_target_chunks(&js_names(), Some(&predicate));
        assert_eq!(targets.names(), ["vendor.js"]);

        let none: ChunkPredicate = Arc::new(|_: &str| false);
        assert!(select_target_chunks(&js_names(), Some(&none)).is_empty());
    }

    #[test]
    fn test_injects_before_app_code() {
        let mut artifacts = chunks();
        let targets = select_target_chunks(&js_names(), None);
        let injected =
            inject_into_chunks(&mut artifacts, &targets, Some(&fragment()), true).unwrap();
        assert_eq!(injected, vec!["main.js"]);
        assert_eq!(chunk_code(&artifacts, "main.js"), ";inject();\nmain();");
        assert_eq!(chunk_code(&artifacts, "vendor.js"), "vendor();");
    }

    #[test]
    fn test_injects_after_app_code() {
        let mut artifacts = chunks();
        let targets = select_target_chunks(&js_names(), None);
        inject_into_chunks(&mut artifacts, &targets, Some(&fragment()), false).unwrap();
        assert_eq!(chunk_code(&artifacts, "main.js"), "main();\n;inject();\n");
    }

    #[test]
    fn test_no_fragment_is_a_noop() {
        let mut artifacts = chunks();
        let targets = select_target_chunks(&js_names(), None);
        let injected = inject_into_chunks(&mut artifacts, &targets, None, true).unwrap();
        assert!(injected.is_empty());
        assert_eq!(artifacts, chunks());
    }

    #[test]
    fn test_fragment_is_injected_once() {
        let mut artifacts = chunks();
        let targets = select_target_chunks(&js_names(), None);
        inject_into_chunks(&mut artifacts, &targets, Some(&fragment()), true).unwrap();
        let injected =
            inject_into_chunks(&mut artifacts, &targets, Some(&fragment()), true).unwrap();
        assert!(injected.is_empty());
        assert_eq!(chunk_code(&artifacts, "main.js").matches("inject()").count(), 1);
    }

    #[test]
    fn test_target_must_be_a_chunk() {
        let mut artifacts = ArtifactSet::new();
        artifacts.insert("main.js", Artifact::asset("main.js", ""));
        let targets = InjectionTargets(vec!["main.js".to_string()]);
        let err =
            inject_into_chunks(&mut artifacts, &targets, Some(&fragment()), true).unwrap_err();
        assert!(matches!(err, CssInjectError::MalformedArtifact { .. }));
    }
}
