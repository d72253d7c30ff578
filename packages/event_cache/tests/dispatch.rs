//! Integration tests that hand cached event data to a dispatcher, the way the cache is meant
//! to be used by event-emitting types.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use event_cache::{EventCache, EventData, Value};

/// What a listener saw at the moment it was called, plus the identity of the record it got.
#[derive(Debug)]
struct Observed {
    record: *const EventData,
    event_type: Option<String>,
    x: Option<Value>,
    y: Option<Value>,
}

type Listener = Box<dyn Fn(&EventData)>;

/// Minimal listener registry standing in for an external event dispatcher.
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
    cache: Rc<EventCache>,
    dispatcher: Dispatcher,
}

impl Car {
    fn new(cache: Rc<EventCache>) -> Self {
        Self {
            cache,
            dispatcher: Dispatcher::default(),
        }
    }

    fn moved(&self, x: i64, y: i64) {
        self.dispatcher
            .dispatch(self.cache.use_event("moved").set("x", x).set("y", y));
    }

    fn destroy(&self) {
        self.dispatcher.dispatch(self.cache.use_event("destroyed"));
    }
}

fn shared_cache() -> Rc<EventCache> {
    Rc::new(
        EventCache::builder()
            .event("moved", [("x", 0), ("y", 0)])
            .event_without_fields("destroyed")
            .build(),
    )
}

fn recorder(log: &Rc<RefCell<Vec<Observed>>>) -> impl Fn(&EventData) + 'static {
    let log = Rc::clone(log);

    move |event: &EventData| {
        log.borrow_mut().push(Observed {
            record: event,
            event_type: event.event_type().map(|t| t.to_string()),
            x: event.get("x"),
            y: event.get("y"),
        });
    }
}

#[test]
fn listeners_receive_updated_record() {
    let car = Car::new(shared_cache());

    let moved_log = Rc::new(RefCell::new(Vec::new()));
    let destroyed_log = Rc::new(RefCell::new(Vec::new()));

    car.dispatcher.add_listener("moved", recorder(&moved_log));
    car.dispatcher.add_listener("destroyed", recorder(&destroyed_log));

    car.moved(10, 20);
    car.destroy();

    let moved_log = moved_log.borrow();
    assert_eq!(moved_log.len(), 1);

    let moved = moved_log.first().unwrap();
    assert_eq!(moved.event_type.as_deref(), Some("moved"));
    assert_eq!(moved.x, Some(Value::Int(10)));
    assert_eq!(moved.y, Some(Value::Int(20)));

    let destroyed_log = destroyed_log.borrow();
    assert_eq!(destroyed_log.len(), 1);

    let destroyed = destroyed_log.first().unwrap();
    assert_eq!(destroyed.event_type.as_deref(), Some("destroyed"));
    assert_eq!(destroyed.x, None);
}

#[test]
fn emitters_sharing_a_cache_reuse_one_record() {
    let cache = shared_cache();
    let car1 = Car::new(Rc::clone(&cache));
    let car2 = Car::new(Rc::clone(&cache));

    let moved_log = Rc::new(RefCell::new(Vec::new()));
    let destroyed_log = Rc::new(RefCell::new(Vec::new()));

    for car in [&car1, &car2] {
        car.dispatcher.add_listener("moved", recorder(&moved_log));
        car.dispatcher
            .add_listener("destroyed", recorder(&destroyed_log));
    }

    car1.moved(10, 20);
    car1.destroy();
    car2.moved(30, 40);
    car2.destroy();
    car1.moved(50, 60);
    car2.moved(70, 80);

    let moved_log = moved_log.borrow();
    let destroyed_log = destroyed_log.borrow();

    assert_eq!(moved_log.len(), 4);
    assert_eq!(destroyed_log.len(), 2);

    // Each listener call saw the values of its own emission...
    let seen = moved_log
        .iter()
        .map(|o| (o.x.clone(), o.y.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        seen,
        [
            (Some(Value::Int(10)), Some(Value::Int(20))),
            (Some(Value::Int(30)), Some(Value::Int(40))),
            (Some(Value::Int(50)), Some(Value::Int(60))),
            (Some(Value::Int(70)), Some(Value::Int(80))),
        ]
    );

    // ...but every emission of the same type delivered the very same record.
    let moved_record: *const EventData = cache.use_event("moved");
    assert!(moved_log.iter().all(|o| o.record == moved_record));

    let destroyed_record: *const EventData = cache.use_event("destroyed");
    assert!(destroyed_log.iter().all(|o| o.record == destroyed_record));

    // Anyone who kept the record now sees the most recent emission only.
    let kept = cache.use_event("moved");
    assert_eq!(kept.get("x"), Some(Value::Int(70)));
    assert_eq!(kept.get("y"), Some(Value::Int(80)));
}

#[test]
fn separate_caches_keep_separate_records() {
    let car1 = Car::new(shared_cache());
    let car2 = Car::new(shared_cache());

    car1.moved(1, 2);
    car2.moved(3, 4);

    assert_eq!(car1.cache.use_event("moved").get("x"), Some(Value::Int(1)));
    assert_eq!(car2.cache.use_event("moved").get("x"), Some(Value::Int(3)));
}

#[test]
fn dispatcher_can_fill_in_target() {
    let cache = shared_cache();
    let emitter: Rc<dyn Any> = Rc::new(String::from("car-1"));

    let moved = cache
        .use_event("moved")
        .set_target(Rc::clone(&emitter))
        .set("x", 5);

    assert_eq!(moved.target(), Value::Object(emitter));
    assert_eq!(
        moved.target().downcast_ref::<String>().map(String::as_str),
        Some("car-1")
    );

    // The cache itself never touches `target` again.
    cache.use_event("moved").set("x", 6);
    assert!(!cache.use_event("moved").target().is_null());
}

#[test]
fn payload_describes_listenable_events() {
    let cache = shared_cache();
    let dispatcher = Dispatcher::default();
    let calls = Rc::new(RefCell::new(Vec::new()));

    // Wire up one listener per declared event type, driven by the payload.
    for event_type in cache.payload().event_types() {
        let calls = Rc::clone(&calls);
        dispatcher.add_listener(event_type, move |event| {
            calls.borrow_mut().push(event.name().to_string());
        });
    }

    dispatcher.dispatch(cache.use_event("destroyed"));
    dispatcher.dispatch(cache.use_event("moved").set("x", 1));

    assert_eq!(*calls.borrow(), ["destroyed", "moved"]);
}
