//! WebAssembly bindings for SelectProxy

mod bridge;

use std::rc::Rc;

use js_sys::{Array, Promise, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use sp_compiler::{load_profile, pac_for_profile, parse_targets};
use sp_core::{url::hostname, Engine, Message, Response};

use bridge::{JsHost, JsPolicySink, JsProfileStore};

type SharedEngine = Rc<Engine<JsProfileStore, JsPolicySink>>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// =============================================================================
// Engine
// =============================================================================

/// The override engine, driven by the extension background script.
#[wasm_bindgen]
pub struct ProxyEngine {
    engine: SharedEngine,
}

#[wasm_bindgen]
impl ProxyEngine {
    /// `host` must provide `getProfile(name)`, `activeProfile()`,
    /// `proxyEnabled()`, `installPolicy(pacText)` and `clearPolicy()`.
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue) -> Result<ProxyEngine, JsValue> {
        let host = JsHost::new(host)?;
        let engine = Engine::new(JsProfileStore(host.clone()), JsPolicySink(host));
        Ok(ProxyEngine {
            engine: Rc::new(engine),
        })
    }

    /// Restore the stored power state.
    pub fn startup(&self) -> Promise {
        let engine = Rc::clone(&self.engine);
        future_to_promise(async move {
            engine.startup().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Handle a control-channel message. Resolves to the response object, or
    /// `null` for messages without a response.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue, tab_id: Option<i32>) -> Promise {
        let engine = Rc::clone(&self.engine);
        future_to_promise(async move {
            let response = match decode_message(&message) {
                Some(message) => engine.handle(message, tab_id).await,
                None => Response::None,
            };
            Ok(response_to_js(response))
        })
    }

    #[wasm_bindgen(js_name = onNavigationCommitted)]
    pub fn on_navigation_committed(&self, tab_id: i32, frame_id: i32, url: String) -> Promise {
        let engine = Rc::clone(&self.engine);
        future_to_promise(async move {
            engine.on_navigation_committed(tab_id, frame_id, &url).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = onTabRemoved)]
    pub fn on_tab_removed(&self, tab_id: i32) -> Promise {
        let engine = Rc::clone(&self.engine);
        future_to_promise(async move {
            engine.on_tab_removed(tab_id).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Hosts currently forced through the proxy, sorted.
    #[wasm_bindgen(js_name = overrideHosts)]
    pub fn override_hosts(&self) -> Array {
        self.engine
            .override_hosts()
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    #[wasm_bindgen(js_name = isTabEnabled)]
    pub fn is_tab_enabled(&self, tab_id: i32) -> bool {
        self.engine.is_tab_enabled(tab_id)
    }

    /// Name of the applied profile, or undefined while powered off.
    #[wasm_bindgen(js_name = activeProfile)]
    pub fn active_profile(&self) -> Option<String> {
        self.engine.power().profile().map(str::to_string)
    }
}

fn decode_message(message: &JsValue) -> Option<Message> {
    let text = match JSON::stringify(message) {
        Ok(text) => String::from(text),
        Err(e) => {
            log::warn!("Ignoring control message: {e:?}");
            return None;
        }
    };

    match Message::from_json(&text) {
        Ok(message) => Some(message),
        Err(e) => {
            log::warn!("Ignoring control message: {e}");
            None
        }
    }
}

fn response_to_js(response: Response) -> JsValue {
    let result = js_sys::Object::new();
    match response {
        Response::None => return JsValue::NULL,
        Response::TabState { enabled } => {
            let _ = js_sys::Reflect::set(&result, &"enabled".into(), &JsValue::from(enabled));
        }
        Response::Toggled { enabled, reload } => {
            let _ = js_sys::Reflect::set(&result, &"enabled".into(), &JsValue::from(enabled));
            let _ = js_sys::Reflect::set(&result, &"reload".into(), &JsValue::from(reload));
        }
    }
    result.into()
}

// =============================================================================
// Helpers
// =============================================================================

/// Render the PAC script for a profile document and override hosts.
#[wasm_bindgen]
pub fn build_pac_script(profile_json: &str, overrides: JsValue) -> Result<String, JsValue> {
    let profile = load_profile(profile_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to load profile: {}", e)))?;
    let overrides: Vec<String> = Array::from(&overrides)
        .iter()
        .filter_map(|v| v.as_string())
        .collect();
    Ok(pac_for_profile(&profile, overrides))
}

/// Hostname of `url` as the proxy layer sees it (empty for non-network URLs).
#[wasm_bindgen]
pub fn extract_hostname(url: &str) -> String {
    hostname(url)
}

/// Target entries to add for the page at `url`, given the current target text.
#[wasm_bindgen]
pub fn suggest_targets(url: &str, targets_text: &str) -> Array {
    let existing = parse_targets(targets_text);
    sp_compiler::suggest_targets(url, &existing)
        .into_iter()
        .map(JsValue::from)
        .collect()
}

/// Clean the popup's target text into one entry per element.
#[wasm_bindgen]
pub fn clean_targets(targets_text: &str) -> Array {
    parse_targets(targets_text)
        .into_iter()
        .map(JsValue::from)
        .collect()
}
