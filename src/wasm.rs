//! WASM bindings for the host page.
//!
//! The page renders the form and forwards operator actions to [`SnapCheck`],
//! then redraws from [`SnapCheck::state_json`]. It should call
//! [`SnapCheck::poll`] from `requestAnimationFrame` (or after any image
//! event) so load outcomes reach the controller.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::app::SnapCheckApp;
use crate::config::AppConfig;
use crate::download::BrowserDownloader;
use crate::loader::web::BrowserImageLoader;
use crate::message::{LabelTarget, Message};
use crate::model::Label;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Vocabulary entry as handed to the page.
#[derive(Serialize)]
struct LabelInfo {
    id: &'static str,
    name: &'static str,
    color: [u8; 3],
}

/// Session handle owned by the host page.
#[wasm_bindgen]
pub struct SnapCheck {
    app: SnapCheckApp,
}

#[wasm_bindgen]
impl SnapCheck {
    /// Create a session. `config_json` may be omitted to use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SnapCheck, JsValue> {
        let config = match config_json {
            Some(json) => {
                AppConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => AppConfig::default(),
        };

        if let Err(e) = console_log::init_with_level(config.log_level.to_level()) {
            web_sys::console::log_1(&format!("Logger already initialized: {}", e).into());
        }
        log::info!("SnapCheck WASM starting...");

        let app = SnapCheckApp::new(
            config,
            Box::new(BrowserImageLoader::new()),
            Box::new(BrowserDownloader),
        );
        Ok(SnapCheck { app })
    }

    /// The label vocabulary as JSON: `[{id, name, color}]`.
    pub fn labels_json() -> Result<String, JsValue> {
        let labels: Vec<LabelInfo> = Label::ALL
            .iter()
            .map(|l| LabelInfo {
                id: l.id(),
                name: l.display_name(),
                color: l.color(),
            })
            .collect();
        serde_json::to_string(&labels).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_input(&mut self, text: String) {
        self.app.update(Message::InputChanged(text));
    }

    pub fn load(&mut self) {
        self.app.update(Message::LoadRequested);
    }

    /// Toggle a label on a stored record, or on the current selection when
    /// `record_id` is omitted.
    pub fn toggle_label(&mut self, label_id: &str, record_id: Option<u32>) -> Result<(), JsValue> {
        let label = Label::from_id(label_id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let target = match record_id {
            Some(id) => LabelTarget::Record(id),
            None => LabelTarget::Current,
        };
        self.app.update(Message::LabelToggled(target, label));
        Ok(())
    }

    pub fn next(&mut self) {
        self.app.update(Message::Next);
    }

    pub fn export(&mut self) {
        self.app.update(Message::ExportRequested);
    }

    pub fn dismiss_error(&mut self) {
        self.app.update(Message::DismissError);
    }

    /// Apply finished image loads. Returns `true` if the page should redraw.
    pub fn poll(&mut self) -> bool {
        self.app.tick()
    }

    /// The whole session state as JSON.
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.app.snapshot()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
