//! Icon Card entry point
//!
//! On the web this mounts the page and wires browser events into the
//! sequencer. Natively it runs a headless walkthrough of the whole reveal
//! against an in-memory surface and a virtual clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;
    use web_sys::{Event, KeyboardEvent, MouseEvent, Window};

    use icon_card::platform::web::{
        CueSink, DomSurface, FrameLoop, FrameSink, IntersectionSink, Vibrator, WebScheduler, now_ms,
    };
    use icon_card::sim::{Cue, Intersection, Ports, RevealSequencer, TimerHandle};
    use icon_card::surface::Target;
    use icon_card::PageConfig;

    /// Page instance holding all state
    struct Page {
        window: Window,
        sequencer: RevealSequencer,
        surface: DomSurface,
        scheduler: WebScheduler,
        haptics: Vibrator,
        frames: FrameLoop,
    }

    impl Page {
        fn with_ports<R>(&mut self, f: impl FnOnce(&mut RevealSequencer, &mut Ports<'_>) -> R) -> R {
            let mut ports = Ports {
                now_ms: now_ms(&self.window),
                scheduler: &mut self.scheduler,
                surface: &mut self.surface,
                haptics: &mut self.haptics,
            };
            let result = f(&mut self.sequencer, &mut ports);
            self.frames.request();
            result
        }

        fn on_cue(&mut self, handle: TimerHandle, cue: Cue) {
            self.scheduler.fired(handle);
            self.with_ports(|seq, ports| seq.on_cue(handle, cue, ports));
        }

        fn on_frame(&mut self, time: f64) {
            self.frames.fired();
            self.sequencer.frame(time, &mut self.surface);
            if self.sequencer.is_animating() {
                self.frames.request();
            }
        }

        fn on_intersections(&mut self, batch: Vec<Intersection>) {
            self.with_ports(|seq, ports| seq.on_intersections(&batch, ports));
        }

        fn teardown(&mut self) {
            self.sequencer.teardown(&mut self.scheduler);
            self.frames.stop();
            self.surface.disconnect();
        }
    }

    /// Run `f` against a live, unborrowed page
    fn with_page(page: &Weak<RefCell<Page>>, f: impl FnOnce(&mut Page)) {
        let Some(page) = page.upgrade() else {
            return;
        };
        match page.try_borrow_mut() {
            Ok(mut p) => f(&mut p),
            Err(_) => log::warn!("Page busy, dropped callback"),
        };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Icon Card starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let config = PageConfig::load();
        let seed = js_sys::Date::now() as u64;
        let sequencer = match RevealSequencer::new(config, seed) {
            Ok(seq) => seq,
            Err(e) => {
                log::error!("Invalid page config, using defaults: {}", e);
                RevealSequencer::new(PageConfig::default(), seed).expect("default config is valid")
            }
        };

        let page: Rc<RefCell<Page>> = Rc::new_cyclic(|weak: &Weak<RefCell<Page>>| {
            let cues: CueSink = {
                let weak = weak.clone();
                Rc::new(move |handle: TimerHandle, cue: Cue| with_page(&weak, |p| p.on_cue(handle, cue)))
            };
            let frames: FrameSink = {
                let weak = weak.clone();
                Rc::new(move |time: f64| with_page(&weak, |p| p.on_frame(time)))
            };
            let intersections: IntersectionSink = {
                let weak = weak.clone();
                Rc::new(move |batch: Vec<Intersection>| with_page(&weak, |p| p.on_intersections(batch)))
            };

            RefCell::new(Page {
                sequencer,
                surface: DomSurface::new(window.clone(), document.clone(), intersections),
                scheduler: WebScheduler::new(window.clone(), cues),
                haptics: Vibrator::new(&window),
                frames: FrameLoop::new(window.clone(), frames),
                window: window.clone(),
            })
        });

        setup_input_handlers(&page, &window);

        page.borrow_mut().with_ports(|seq, ports| seq.mount(ports));

        log::info!("Icon Card running!");
    }

    fn setup_input_handlers(page: &Rc<RefCell<Page>>, window: &Window) {
        let element = |target: Target| page.borrow().surface.element(target).cloned();

        // Football button
        if let Some(btn) = element(Target::EnterButton) {
            let weak = Rc::downgrade(page);
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                with_page(&weak, |p| p.with_ports(|seq, ports| seq.enter(ports)));
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pack, hint and wrapper all open the card
        for target in [Target::Pack, Target::ClickHint, Target::CardWrapper] {
            let Some(el) = element(target) else {
                continue;
            };
            let weak = Rc::downgrade(page);
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.stop_propagation();
                with_page(&weak, |p| p.with_ports(|seq, ports| seq.reveal_card(ports)));
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let weak = Rc::downgrade(page);
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                with_page(&weak, |p| {
                    p.with_ports(|seq, ports| seq.on_key(&code, ports));
                });
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Card tilt
        if let Some(card) = element(Target::Card) {
            {
                let weak = Rc::downgrade(page);
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    with_page(&weak, |p| p.sequencer.pointer_enter(&mut p.surface));
                });
                let _ = card
                    .add_event_listener_with_callback("mouseenter", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let weak = Rc::downgrade(page);
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    with_page(&weak, |p| {
                        if let Some(rect) = p.surface.card_rect() {
                            let (x, y) = (event.client_x() as f32, event.client_y() as f32);
                            p.sequencer.pointer_move(x, y, &rect, &mut p.surface);
                        }
                    });
                });
                let _ = card
                    .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let weak = Rc::downgrade(page);
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    with_page(&weak, |p| p.sequencer.pointer_leave(&mut p.surface));
                });
                let _ = card
                    .add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        // Leaving the page releases timers and the frame loop
        {
            let weak = Rc::downgrade(page);
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                with_page(&weak, |p| p.teardown());
            });
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Icon Card (native) starting...");
    log::info!("Native mode runs a headless walkthrough - build for wasm32 for the real page");

    walkthrough::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod walkthrough {
    use icon_card::PageConfig;
    use icon_card::haptics::RecordingHaptics;
    use icon_card::sim::{Intersection, Ports, RevealSequencer, Stage, VirtualScheduler};
    use icon_card::surface::{RecordingSurface, Section, Target};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const SEED: u64 = 42;

    struct Demo {
        sequencer: RevealSequencer,
        scheduler: VirtualScheduler,
        surface: RecordingSurface,
        haptics: RecordingHaptics,
        stage: Stage,
    }

    impl Demo {
        fn with_ports(&mut self, f: impl FnOnce(&mut RevealSequencer, &mut Ports<'_>)) {
            let mut ports = Ports {
                now_ms: self.scheduler.now_ms(),
                scheduler: &mut self.scheduler,
                surface: &mut self.surface,
                haptics: &mut self.haptics,
            };
            f(&mut self.sequencer, &mut ports);
            self.report();
        }

        fn report(&mut self) {
            let stage = self.sequencer.stage();
            if stage != self.stage {
                log::info!("{:>7.1}ms  {:?}", self.scheduler.now_ms(), stage);
                self.stage = stage;
            }
        }

        /// Fire timers and 60 Hz frames until `until_ms`
        fn run_until(&mut self, until_ms: f64) {
            let mut t = self.scheduler.now_ms();
            while t < until_ms {
                t = (t + FRAME_MS).min(until_ms);
                while let Some(fired) = self.scheduler.pop_due(t) {
                    self.with_ports(|seq, ports| seq.on_cue(fired.handle, fired.cue, ports));
                }
                self.scheduler.set_now(t);
                self.sequencer.frame(t, &mut self.surface);
            }
        }
    }

    pub fn run() {
        let config = PageConfig::load();
        let skill_bars = config.skill_bars;
        let stats = config.card.stats.len();
        let sequencer = match RevealSequencer::new(config, SEED) {
            Ok(seq) => seq,
            Err(e) => {
                log::error!("Invalid page config: {}", e);
                return;
            }
        };

        let mut demo = Demo {
            sequencer,
            scheduler: VirtualScheduler::new(),
            surface: RecordingSurface::new(stats, skill_bars),
            haptics: RecordingHaptics::default(),
            stage: Stage::Idle,
        };

        demo.with_ports(|seq, ports| seq.mount(ports));
        demo.run_until(2700.0);

        demo.with_ports(|seq, ports| {
            seq.on_key("Enter", ports);
        });
        demo.run_until(3200.0);

        let skills = Intersection {
            target: Target::Section(Section::Skills),
            ratio: 0.35,
            intersecting: true,
        };
        demo.with_ports(|seq, ports| seq.on_intersections(&[skills], ports));
        demo.with_ports(|seq, ports| seq.reveal_card(ports));
        demo.run_until(7000.0);

        log::info!(
            "Rating {} | stats {:?}",
            demo.surface.text_of(Target::RatingNumber).unwrap_or("--"),
            (0..stats)
                .map(|i| demo.surface.text_of(Target::StatValue(i)).unwrap_or("--"))
                .collect::<Vec<_>>()
        );
        log::info!(
            "{} nodes live, {} removed, {} haptic patterns played",
            demo.surface.nodes.len(),
            demo.surface.removed.len(),
            demo.haptics.played.len()
        );

        demo.sequencer.teardown(&mut demo.scheduler);
        log::info!("Walkthrough complete ({} surface writes)", demo.surface.writes);
    }
}
