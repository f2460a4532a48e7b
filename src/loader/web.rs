//! Browser image loading (WASM only).
//!
//! Each request creates an `HtmlImageElement` whose `onload`/`onerror`
//! handlers push a [`LoadEvent`] into a shared queue. The controller drains
//! the queue from its tick, the same way pending files are polled.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use super::{ImageLoader, LoadEvent, LoadToken};

/// An in-flight request: the element plus its handlers, kept alive until polled.
struct InFlight {
    element: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

/// Loads images through the browser's native image fetch.
#[derive(Default)]
pub struct BrowserImageLoader {
    completed: Rc<RefCell<Vec<LoadEvent>>>,
    in_flight: HashMap<LoadToken, InFlight>,
}

impl BrowserImageLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageLoader for BrowserImageLoader {
    fn request(&mut self, token: LoadToken, reference: &str) {
        let element = match HtmlImageElement::new() {
            Ok(el) => el,
            Err(e) => {
                log::error!("Failed to create image element: {:?}", e);
                self.completed
                    .borrow_mut()
                    .push(LoadEvent::failed(token, "Image element unavailable"));
                return;
            }
        };

        let completed = Rc::clone(&self.completed);
        let loaded_el = element.clone();
        let onload = Closure::wrap(Box::new(move || {
            completed.borrow_mut().push(LoadEvent::loaded(
                token,
                loaded_el.natural_width(),
                loaded_el.natural_height(),
            ));
        }) as Box<dyn FnMut()>);

        let completed = Rc::clone(&self.completed);
        let failed_ref = reference.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            completed
                .borrow_mut()
                .push(LoadEvent::failed(token, format!("Failed to load {}", failed_ref)));
        }) as Box<dyn FnMut()>);

        element.set_onload(Some(onload.as_ref().unchecked_ref()));
        element.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        element.set_src(reference);
        log::debug!("Requested image {:?}: {}", token, reference);

        self.in_flight.insert(
            token,
            InFlight {
                element,
                _onload: onload,
                _onerror: onerror,
            },
        );
    }

    fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.completed.borrow_mut().drain(..).collect();
        for event in &events {
            if let Some(done) = self.in_flight.remove(&event.token) {
                done.element.set_onload(None);
                done.element.set_onerror(None);
            }
        }
        events
    }

    fn cancel(&mut self, token: LoadToken) {
        if let Some(cancelled) = self.in_flight.remove(&token) {
            cancelled.element.set_onload(None);
            cancelled.element.set_onerror(None);
            cancelled.element.remove_attribute("src").ok();
            log::debug!("Cancelled image {:?}", token);
        }
    }
}
