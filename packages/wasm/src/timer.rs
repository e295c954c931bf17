//! `setTimeout` backed [`Scheduler`]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;
use twig_events::{Scheduler, TimerId};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

struct PendingTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct Timers {
    pending: HashMap<TimerId, PendingTimer>,
    /// Callbacks that already ran; freed on the next schedule so a closure is
    /// never dropped from inside its own invocation
    fired: Vec<PendingTimer>,
}

pub struct WindowScheduler {
    window: Window,
    next_id: u64,
    on_fire: Rc<dyn Fn(TimerId)>,
    timers: Rc<RefCell<Timers>>,
}

impl WindowScheduler {
    /// `on_fire` runs with the timer id once its delay has elapsed
    pub fn new(window: Window, on_fire: impl Fn(TimerId) + 'static) -> Self {
        Self {
            window,
            next_id: 0,
            on_fire: Rc::new(on_fire),
            timers: Rc::default(),
        }
    }
}

impl Scheduler for WindowScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let timer = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.borrow_mut().fired.clear();

        let timers = Rc::clone(&self.timers);
        let on_fire = Rc::clone(&self.on_fire);
        let callback = Closure::wrap(Box::new(move || {
            {
                let mut timers = timers.borrow_mut();
                if let Some(done) = timers.pending.remove(&timer) {
                    timers.fired.push(done);
                }
            }
            on_fire(timer);
        }) as Box<dyn FnMut()>);

        let millis = delay.as_millis().min(i32::MAX as u128) as i32;
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), millis)
        {
            Ok(handle) => {
                self.timers.borrow_mut().pending.insert(
                    timer,
                    PendingTimer {
                        handle,
                        _callback: callback,
                    },
                );
            }
            Err(err) => warn!(?err, "setTimeout failed; timer will never fire"),
        }
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(pending) = self.timers.borrow_mut().pending.remove(&timer) {
            self.window.clear_timeout_with_handle(pending.handle);
        }
    }
}

impl Drop for WindowScheduler {
    fn drop(&mut self) {
        for (_, pending) in self.timers.borrow_mut().pending.drain() {
            self.window.clear_timeout_with_handle(pending.handle);
        }
    }
}
