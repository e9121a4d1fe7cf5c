//! Browser adapters
//!
//! Every callback handed to the browser (timers, animation frames, the
//! intersection observer) forwards into a sink supplied by the entry point.
//! Sinks hold only weak references to the page, so a torn-down page is
//! dropped even if the browser still has a callback queued.

use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, Document, Element, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Navigator, Window,
};

use crate::haptics::{HapticPattern, Haptics};
use crate::sim::observer::Intersection;
use crate::sim::tilt::CardRect;
use crate::sim::timeline::{Cue, Scheduler, TimerHandle};
use crate::surface::{NodeId, NodeSpec, ObserverOptions, RenderSurface, Selector, Target, Viewport};

/// Receives fired timers
pub type CueSink = Rc<dyn Fn(TimerHandle, Cue)>;
/// Receives animation-frame timestamps (ms, `performance.now()` timebase)
pub type FrameSink = Rc<dyn Fn(f64)>;
/// Receives intersection batches
pub type IntersectionSink = Rc<dyn Fn(Vec<Intersection>)>;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// Monotonic clock shared with animation-frame timestamps
pub fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn resolve(document: &Document, target: Target) -> Option<Element> {
    match target.selector() {
        Selector::Id(id) => document.get_element_by_id(id),
        Selector::Query(query) => document.query_selector(query).ok().flatten(),
        Selector::Nth(query, index) => document
            .query_selector_all(query)
            .ok()?
            .item(index as u32)?
            .dyn_into::<Element>()
            .ok(),
    }
}

fn count(document: &Document, query: &str) -> usize {
    document
        .query_selector_all(query)
        .map(|list| list.length() as usize)
        .unwrap_or(0)
}

fn style_of(element: &Element) -> Option<CssStyleDeclaration> {
    element.dyn_ref::<HtmlElement>().map(|el| el.style())
}

/// DOM-backed render surface
///
/// Fixed elements are resolved once at construction; a missing element stays
/// missing and every write to it is dropped.
pub struct DomSurface {
    window: Window,
    document: Document,
    targets: HashMap<Target, Element>,
    nodes: HashMap<NodeId, Element>,
    on_intersect: IntersectionSink,
    observer: Option<(IntersectionObserver, ObserverCallback)>,
}

impl DomSurface {
    pub fn new(window: Window, document: Document, on_intersect: IntersectionSink) -> Self {
        let stat_count = count(&document, ".stat-item .stat-value");
        let skill_count = count(&document, ".skill-bar-item");
        let targets: HashMap<Target, Element> = Target::catalogue(stat_count, skill_count)
            .into_iter()
            .filter_map(|target| resolve(&document, target).map(|el| (target, el)))
            .collect();
        log::debug!(
            "Resolved {} page elements ({} stats, {} skill bars)",
            targets.len(),
            stat_count,
            skill_count
        );
        Self {
            window,
            document,
            targets,
            nodes: HashMap::new(),
            on_intersect,
            observer: None,
        }
    }

    pub fn element(&self, target: Target) -> Option<&Element> {
        self.targets.get(&target)
    }

    /// Current card bounds in client coordinates
    pub fn card_rect(&self) -> Option<CardRect> {
        let rect = self.targets.get(&Target::Card)?.get_bounding_client_rect();
        Some(CardRect {
            left: rect.left() as f32,
            top: rect.top() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        })
    }

    /// Stop intersection reporting
    pub fn disconnect(&mut self) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }
}

impl RenderSurface for DomSurface {
    fn exists(&self, target: Target) -> bool {
        self.targets.contains_key(&target)
    }

    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
        match (
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        ) {
            (Some(w), Some(h)) => Viewport {
                width: w as f32,
                height: h as f32,
            },
            _ => Viewport::default(),
        }
    }

    fn add_class(&mut self, target: Target, class: &str) {
        if let Some(el) = self.targets.get(&target) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, target: Target, class: &str) {
        if let Some(el) = self.targets.get(&target) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn set_style(&mut self, target: Target, property: &str, value: &str) {
        if let Some(style) = self.targets.get(&target).and_then(style_of) {
            let _ = style.set_property(property, value);
        }
    }

    fn set_text(&mut self, target: Target, text: &str) {
        if let Some(el) = self.targets.get(&target) {
            el.set_text_content(Some(text));
        }
    }

    fn set_attribute(&mut self, target: Target, name: &str, value: &str) {
        if let Some(el) = self.targets.get(&target) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn append_node(&mut self, parent: Target, node: NodeId, spec: &NodeSpec) {
        let Some(parent_el) = self.targets.get(&parent) else {
            return;
        };
        let el = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                log::warn!("Failed to create node: {:?}", e);
                return;
            }
        };
        el.set_class_name(spec.class);
        if let Some(style) = style_of(&el) {
            for (property, value) in &spec.styles {
                let _ = style.set_property(property, value);
            }
        }
        if parent_el.append_child(&el).is_ok() {
            self.nodes.insert(node, el);
        }
    }

    fn style_node(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(style) = self.nodes.get(&node).and_then(style_of) {
            let _ = style.set_property(property, value);
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(el) = self.nodes.remove(&node) {
            el.remove();
        }
    }

    fn observe_intersections(&mut self, targets: &[Target], options: &ObserverOptions) {
        self.disconnect();

        let watched: Vec<(Target, Element)> = targets
            .iter()
            .filter_map(|t| self.targets.get(t).map(|el| (*t, el.clone())))
            .collect();
        if watched.is_empty() {
            return;
        }

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        let sink = Rc::clone(&self.on_intersect);
        let lookup = watched.clone();
        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let batch: Vec<Intersection> = entries
                    .iter()
                    .filter_map(|v| v.dyn_into::<IntersectionObserverEntry>().ok())
                    .filter_map(|entry| {
                        let el = entry.target();
                        lookup
                            .iter()
                            .find(|(_, w)| js_sys::Object::is(w.as_ref(), el.as_ref()))
                            .map(|(target, _)| Intersection {
                                target: *target,
                                ratio: entry.intersection_ratio(),
                                intersecting: entry.is_intersecting(),
                            })
                    })
                    .collect();
                if !batch.is_empty() {
                    sink(batch);
                }
            },
        );

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                for (_, el) in &watched {
                    observer.observe(el);
                }
                self.observer = Some((observer, callback));
            }
            Err(e) => log::error!("IntersectionObserver unavailable: {:?}", e),
        }
    }
}

/// `setTimeout`-backed scheduler
pub struct WebScheduler {
    window: Window,
    sink: CueSink,
    next_id: u64,
    timeouts: HashMap<TimerHandle, i32>,
}

impl WebScheduler {
    pub fn new(window: Window, sink: CueSink) -> Self {
        Self {
            window,
            sink,
            next_id: 0,
            timeouts: HashMap::new(),
        }
    }

    /// Forget a timer the browser has already run
    pub fn fired(&mut self, handle: TimerHandle) {
        self.timeouts.remove(&handle);
    }
}

impl Scheduler for WebScheduler {
    fn schedule(&mut self, delay_ms: u32, cue: Cue) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let sink = Rc::clone(&self.sink);
        let callback = Closure::once_into_js(move || sink(handle, cue));
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            ) {
            Ok(id) => {
                self.timeouts.insert(handle, id);
            }
            Err(e) => log::error!("setTimeout failed for {:?}: {:?}", cue, e),
        }
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(id) = self.timeouts.remove(&handle) {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

/// On-demand `requestAnimationFrame` loop
///
/// At most one frame is requested at a time. The owner re-requests after each
/// frame while there is something to animate.
pub struct FrameLoop {
    window: Window,
    sink: FrameSink,
    pending: Option<i32>,
    stopped: bool,
}

impl FrameLoop {
    pub fn new(window: Window, sink: FrameSink) -> Self {
        Self {
            window,
            sink,
            pending: None,
            stopped: false,
        }
    }

    pub fn request(&mut self) {
        if self.stopped || self.pending.is_some() {
            return;
        }
        let sink = Rc::clone(&self.sink);
        let callback = Closure::once_into_js(move |time: f64| sink(time));
        match self.window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => self.pending = Some(id),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
    }

    /// The requested frame has been delivered
    pub fn fired(&mut self) {
        self.pending = None;
    }

    /// Cancel the outstanding frame and refuse further requests
    pub fn stop(&mut self) {
        self.stopped = true;
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }
}

/// `navigator.vibrate` haptics
pub struct Vibrator {
    navigator: Navigator,
    supported: bool,
}

impl Vibrator {
    pub fn new(window: &Window) -> Self {
        let navigator = window.navigator();
        let supported =
            js_sys::Reflect::has(navigator.as_ref(), &JsValue::from_str("vibrate")).unwrap_or(false);
        if !supported {
            log::debug!("Vibration API not available");
        }
        Self {
            navigator,
            supported,
        }
    }
}

impl Haptics for Vibrator {
    fn vibrate(&mut self, pattern: HapticPattern) -> bool {
        if !self.supported {
            return false;
        }
        let durations: js_sys::Array = pattern
            .durations()
            .iter()
            .map(|ms| JsValue::from(*ms))
            .collect();
        self.navigator.vibrate_with_pattern(&durations)
    }
}
