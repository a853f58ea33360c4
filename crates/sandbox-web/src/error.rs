use wasm_bindgen::{JsCast, JsValue};

/// Converts a thrown JavaScript value into an `anyhow` error.
pub(crate) fn js_error(value: JsValue) -> anyhow::Error {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return anyhow::anyhow!("{}", String::from(err.message()));
    }
    match value.as_string() {
        Some(s) => anyhow::anyhow!(s),
        None => anyhow::anyhow!("{value:?}"),
    }
}

/// Converts an `anyhow` error into a JavaScript `Error` carrying the full chain.
pub(crate) fn to_js(err: anyhow::Error) -> JsValue {
    js_sys::Error::new(&format!("{err:#}")).into()
}
