//! Browser capabilities, through web-sys.
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use crate::{
    error::{Error, Result},
    event::{EventKind, Rect, SyntheticEvent, Target},
    query::Query,
    time::{Timer, TimerHandle},
    truthy::Truthy,
    Poltergeist,
};

/// Return the DOM [`web_sys::Window`].
/// #### Panics
/// Panics when the window cannot be returned.
pub fn window() -> web_sys::Window {
    web_sys::window().expect("no global `window` exists")
}

/// Return the DOM [`web_sys::Document`]
/// #### Panics
/// Panics when the document cannot be returned.
pub fn document() -> web_sys::Document {
    window().document().expect("no global `document` exists")
}

/// Send `log` records to the browser console.
pub fn init_logging(level: log::Level) -> std::result::Result<(), log::SetLoggerError> {
    console_log::init_with_level(level)
}

fn js_error(value: JsValue) -> Error {
    Error::Dispatch(anyhow::anyhow!("{:?}", value))
}

/// A [`Timer`] on `window.setTimeout` and `performance.now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebTimer;

/// Handle to a pending `window.setTimeout`.
#[derive(Debug)]
pub struct WebTimeout {
    id: i32,
}

impl TimerHandle for WebTimeout {
    fn cancel(self) {
        // The closure given to `setTimeout` is leaked, since it never runs.
        window().clear_timeout_with_handle(self.id);
    }
}

impl Timer for WebTimer {
    type Handle = WebTimeout;

    fn now(&self) -> f64 {
        window()
            .performance()
            .expect("no performance object")
            .now()
    }

    /// ### Panics
    /// Panics when window.setTimeout is not available.
    fn after(&self, millis: u64, callback: impl FnOnce() + 'static) -> WebTimeout {
        let callback = Closure::once_into_js(callback);
        let millis = i32::try_from(millis).unwrap_or(i32::MAX);
        let id = window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            )
            .expect("should register `setTimeout` OK");
        WebTimeout { id }
    }
}

/// [`Query`] over a live [`web_sys::Document`].
#[derive(Clone, Debug)]
pub struct WebDocument {
    inner: web_sys::Document,
}

impl Default for WebDocument {
    fn default() -> Self {
        WebDocument { inner: document() }
    }
}

impl From<web_sys::Document> for WebDocument {
    fn from(inner: web_sys::Document) -> Self {
        WebDocument { inner }
    }
}

impl Query for WebDocument {
    type Node = web_sys::Element;

    fn find_first(&self, selector: &str) -> Result<Option<web_sys::Element>> {
        self.inner
            .query_selector(selector)
            .map_err(|_| Error::Selector(selector.to_string()))
    }

    fn find_all(&self, selector: &str) -> Result<Vec<web_sys::Element>> {
        let nodes = self
            .inner
            .query_selector_all(selector)
            .map_err(|_| Error::Selector(selector.to_string()))?;
        Ok((0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .collect())
    }
}

fn mouse_event(event: &SyntheticEvent) -> Result<web_sys::MouseEvent> {
    let init = web_sys::MouseEventInit::new();
    match event {
        SyntheticEvent::Move { client } => {
            init.set_client_x(client.x.round() as i32);
            init.set_client_y(client.y.round() as i32);
        }
        SyntheticEvent::Click {
            bubbles,
            cancelable,
        } => {
            init.set_bubbles(*bubbles);
            init.set_cancelable(*cancelable);
            init.set_view(Some(&window()));
        }
    }
    web_sys::MouseEvent::new_with_mouse_event_init_dict(event.kind().dom_name(), &init)
        .map_err(js_error)
}

impl Target for web_sys::Element {
    fn bounding_rect(&self) -> Rect {
        let rect = self.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn dispatch(&self, event: &SyntheticEvent) -> Result<()> {
        let mouse_event = mouse_event(event)?;
        log::trace!("dispatching {} on {:?}", event.kind().dom_name(), self);
        self.dispatch_event(&mouse_event).map(|_| ()).map_err(js_error)
    }

    fn observe_once(&self, kind: EventKind, callback: impl FnOnce() + 'static) -> Result<()> {
        let options = web_sys::AddEventListenerOptions::new();
        options.set_once(true);
        let listener = Closure::once_into_js(move |_: web_sys::Event| callback());
        self.add_event_listener_with_callback_and_add_event_listener_options(
            kind.dom_name(),
            listener.unchecked_ref(),
            &options,
        )
        .map_err(js_error)
    }
}

impl Truthy for web_sys::Element {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Poltergeist<WebTimer, WebDocument> {
    /// The toolkit over the page's own `window` and `document`.
    pub fn browser() -> Self {
        Poltergeist::new(WebTimer, WebDocument::default())
    }
}
