//! Example that demonstrates the basic usage of `EventCache`.

use event_cache::{EventCache, Value};

fn main() {
    println!("=== Event Cache README Example ===");

    let cache = EventCache::builder()
        .event("moved", [("x", 0), ("y", 0)])
        .event_without_fields("destroyed")
        .build();

    // Every call hands out the same record, updated in place.
    let moved = cache.use_event("moved").set("x", 10).set("y", 20);
    println!("First emission: {moved:?}");

    cache.use_event("moved").set("x", 30).set("y", 40);
    println!("First emission after the second one: {moved:?}");
    assert_eq!(moved.get("x"), Some(Value::Int(30)));

    // Direct assignment only accepts declared fields.
    if let Err(e) = moved.assign("z", 1) {
        println!("Assignment rejected: {e}");
    }

    println!("README example completed successfully!");
}
