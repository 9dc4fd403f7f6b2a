//! JS host object as engine collaborators
//!
//! The background script passes one object implementing the storage and
//! proxy-settings callbacks. Every callback may return a plain value or a
//! Promise.

use js_sys::{Function, Promise, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use sp_compiler::{load_profile, render_pac};
use sp_core::{PolicySink, Profile, ProfileStore, RoutingPolicy};

/// Callbacks the host object must provide.
const HOST_METHODS: &[&str] = &[
    "getProfile",
    "activeProfile",
    "proxyEnabled",
    "installPolicy",
    "clearPolicy",
];

#[derive(Clone)]
pub struct JsHost {
    host: JsValue,
}

impl JsHost {
    pub fn new(host: JsValue) -> Result<Self, JsValue> {
        for method in HOST_METHODS {
            if !Reflect::get(&host, &JsValue::from_str(method))?.is_function() {
                return Err(JsValue::from_str(&format!("Host object is missing {method}()")));
            }
        }
        Ok(Self { host })
    }

    /// Call `method` on the host object and await its result.
    async fn call(&self, method: &str, arg: Option<&JsValue>) -> Result<JsValue, JsValue> {
        let func: Function = Reflect::get(&self.host, &JsValue::from_str(method))?.dyn_into()?;
        let result = match arg {
            Some(arg) => func.call1(&self.host, arg)?,
            None => func.call0(&self.host)?,
        };
        JsFuture::from(Promise::resolve(&result)).await
    }
}

// =============================================================================
// Profile store
// =============================================================================

pub struct JsProfileStore(pub JsHost);

impl ProfileStore for JsProfileStore {
    async fn get_profile(&self, name: &str) -> Option<Profile> {
        let value = match self.0.call("getProfile", Some(&JsValue::from_str(name))).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("getProfile({name:?}) failed: {e:?}");
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }

        let json = match value.as_string() {
            Some(text) => text,
            None => match JSON::stringify(&value) {
                Ok(text) => String::from(text),
                Err(e) => {
                    log::warn!("Profile {name:?} is not serializable: {e:?}");
                    return None;
                }
            },
        };

        match load_profile(&json) {
            Ok(mut profile) => {
                if profile.name.is_empty() {
                    profile.name = name.to_string();
                }
                Some(profile)
            }
            Err(e) => {
                log::warn!("Profile {name:?} is invalid: {e}");
                None
            }
        }
    }

    async fn active_profile(&self) -> Option<String> {
        match self.0.call("activeProfile", None).await {
            Ok(value) => value.as_string().filter(|name| !name.is_empty()),
            Err(e) => {
                log::warn!("activeProfile() failed: {e:?}");
                None
            }
        }
    }

    async fn proxy_enabled(&self) -> bool {
        match self.0.call("proxyEnabled", None).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                log::warn!("proxyEnabled() failed: {e:?}");
                false
            }
        }
    }
}

// =============================================================================
// Policy sink
// =============================================================================

/// Renders policies to PAC text and hands them to `installPolicy`.
pub struct JsPolicySink(pub JsHost);

impl PolicySink for JsPolicySink {
    async fn install(&self, policy: RoutingPolicy) {
        let script = render_pac(&policy);
        if let Err(e) = self.0.call("installPolicy", Some(&JsValue::from_str(&script))).await {
            log::error!("installPolicy failed: {e:?}");
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.0.call("clearPolicy", None).await {
            log::error!("clearPolicy failed: {e:?}");
        }
    }
}
