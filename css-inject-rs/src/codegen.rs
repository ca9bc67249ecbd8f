//! Generation of the JavaScript that re-creates the bundle's CSS at runtime.
//!
//! The emitted fragment is a self-contained IIFE:
//!
//! ```js
//! ;(function(){try{if(typeof document!="undefined"){
//!   if(document.getElementById("app-style"))return;      // only with a style id
//!   var elementStyle=document.createElement("style");
//!   elementStyle.id="app-style";                           // only with a style id
//!   elementStyle.appendChild(document.createTextNode("a{color:red}"));
//!   document.head.appendChild(elementStyle);
//! }}catch(e){console.error("css-inject",e);}})();
//! ```
//!
//! (shown wrapped; the real output is a single line followed by a newline).
//! The leading `;` keeps the fragment a separate statement when it is
//! appended after code that does not end with one.

use crate::error::{CssInjectError, Result};

/// Code to splice into a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionFragment {
    pub code: String,
}

/// Build the injection fragment for `css`, or `None` when there is no CSS to
/// inject. An empty `style_id` disables both the element id and the
/// duplicate check.
///
/// The output depends only on the arguments.
pub async fn build_css_injection_code(
    css: &str,
    style_id: &str,
) -> Result<Option<InjectionFragment>> {
    if css.is_empty() {
        return Ok(None);
    }

    let css_literal = js_string_literal(css, "stylesheet")?;
    let mut code = String::with_capacity(css_literal.len() + 256);
    code.push_str(r#";(function(){try{if(typeof document!="undefined"){"#);

    if style_id.is_empty() {
        code.push_str(r#"var elementStyle=document.createElement("style");"#);
    } else {
        let id_literal = js_string_literal(style_id, "style id")?;
        code.push_str(&format!(
            r#"if(document.getElementById({id_literal}))return;var elementStyle=document.createElement("style");elementStyle.id={id_literal};"#
        ));
    }

    code.push_str(&format!(
        r#"elementStyle.appendChild(document.createTextNode({css_literal}));document.head.appendChild(elementStyle);"#
    ));
    code.push_str(r#"}}catch(e){console.error("css-inject",e);}})();"#);
    code.push('\n');

    Ok(Some(InjectionFragment { code }))
}

/// Encode `value` as a double-quoted JavaScript string literal that is also
/// safe inside an inline `<script>` element.
///
/// JSON string syntax is a subset of JavaScript's, apart from the line and
/// paragraph separators which older engines reject unescaped. `<` is escaped
/// so that neither `</script>` nor `<!--` can appear in the output.
pub fn js_string_literal(value: &str, what: &'static str) -> Result<String> {
    let json =
        serde_json::to_string(value).map_err(|source| CssInjectError::Encoding { what, source })?;

    let mut literal = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => literal.push_str("\\u003c"),
            '\u{2028}' => literal.push_str("\\u2028"),
            '\u{2029}' => literal.push_str("\\u2029"),
            c => literal.push(c),
        }
    }
    Ok(literal)
}
