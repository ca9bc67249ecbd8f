#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod artifact;
pub mod classify;
pub mod codegen;
pub mod dist;
pub mod error;
pub mod html;
pub mod inject;
pub mod options;
pub mod plugin;

#[macro_use]
extern crate lazy_static;

pub use artifact::{Artifact, ArtifactKind, ArtifactSet, AssetSource};
pub use codegen::{build_css_injection_code, InjectionFragment};
pub use error::{CssInjectError, Result};
pub use options::{ChunkPredicate, InjectionConfig, InjectionOptions};
pub use plugin::{BuildContext, BuildMode, CssInjectionPlugin, PassReport};
pub use serde_json;
