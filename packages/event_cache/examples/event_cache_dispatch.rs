//! Dispatching events from cached event data:
//!
//! * Declaring the event types of an emitter.
//! * Updating and dispatching the cached record per emission.
//! * Copying values out in a listener that needs to keep them.
//!
//! The example logs at trace level, which shows what the cache reports about itself.

use std::cell::RefCell;

use event_cache::{EventCache, EventData, Value};

type Listener = Box<dyn Fn(&EventData)>;

#[derive(Default)]
struct Dispatcher {
    listeners: RefCell<Vec<(String, Listener)>>,
}

impl Dispatcher {
    fn add_listener(&self, event_type: &str, listener: impl Fn(&EventData) + 'static) {
        self.listeners
            .borrow_mut()
            .push((event_type.to_string(), Box::new(listener)));
    }

    fn dispatch(&self, event: &EventData) {
        let event_type = event.event_type();

        for (listener_type, listener) in self.listeners.borrow().iter() {
            if event_type.as_deref() == Some(listener_type.as_str()) {
                listener(event);
            }
        }
    }
}

struct Car {
    events: EventCache,
    dispatcher: Dispatcher,
}

impl Car {
    fn new() -> Self {
        Self {
            events: EventCache::builder()
                .event("moved", [("x", 0.0), ("y", 0.0)])
                .event_without_fields("destroyed")
                .build(),
            dispatcher: Dispatcher::default(),
        }
    }

    fn moved(&self, x: f64, y: f64) {
        self.dispatcher
            .dispatch(self.events.use_event("moved").set("x", x).set("y", y));
    }

    fn destroy(&self) {
        self.dispatcher.dispatch(self.events.use_event("destroyed"));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let car = Car::new();

    println!("Car declares events: {:?}", car.events.payload());

    car.dispatcher.add_listener("moved", |event| {
        let x = event.get("x").as_ref().and_then(Value::as_float).unwrap_or_default();
        let y = event.get("y").as_ref().and_then(Value::as_float).unwrap_or_default();
        println!("Car moved to ({x}, {y})");
    });

    car.dispatcher.add_listener("destroyed", |event| {
        println!("Car emitted '{}'", event.name());
    });

    for step in 0..5 {
        let step = f64::from(step);
        car.moved(step * 10.0, step * 5.0);
    }

    car.destroy();

    // The record still holds the values of the most recent emission.
    let last = car.events.use_event("moved");
    assert_eq!(last.get("x"), Some(Value::Float(40.0)));
    println!("Last moved event: {last:?}");
}
